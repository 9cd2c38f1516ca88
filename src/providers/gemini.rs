//! Gemini-compatible provider strategy
//!
//! Builds a single multimodal `contents` payload: reference images become
//! ordered `inlineData` parts placed before the prompt's text part, under
//! role `user`. The requested size is translated to an aspect ratio, and
//! custom parameters merge into the image-specific config object rather
//! than the top-level generation config.
//!
//! `generate_text` follows the same construction without the image config
//! and returns the first text part found.

use async_trait::async_trait;
use serde_json::json;

use crate::error::GenError;
use crate::traits::{ImageGenerationCapability, ProviderAdapter, TextGenerationCapability};
use crate::transport::HttpTransport;
use crate::types::{ApiFormat, GeneratedImage, GenerationParams, ProviderConfig};
use crate::utils::mime;

const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_MIME: &str = "image/png";

/// Gemini-compatible generation strategy (`:generateContent` endpoint).
pub struct GeminiAdapter {
    transport: HttpTransport,
}

impl GeminiAdapter {
    /// Build an adapter bound to the given config snapshot.
    pub fn new(config: &ProviderConfig) -> Result<Self, GenError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    async fn generate_content(
        &self,
        params: &GenerationParams,
        with_image_config: bool,
    ) -> Result<serde_json::Value, GenError> {
        let endpoint = format!("/models/{}:generateContent", params.model);
        let body = build_request_body(params, with_image_config);
        self.transport.post_json(&endpoint, &body).await
    }
}

/// Reduce "widthxheight" to an aspect ratio string via GCD, e.g.
/// "1024x1792" becomes "4:7". Unparseable sizes fall back to "1:1".
pub fn size_to_aspect_ratio(size: &str) -> String {
    fn gcd(a: u32, b: u32) -> u32 {
        if b == 0 { a } else { gcd(b, a % b) }
    }

    let mut dims = size.split('x').map(|p| p.trim().parse::<u32>());
    match (dims.next(), dims.next()) {
        (Some(Ok(width)), Some(Ok(height))) if width > 0 && height > 0 => {
            let divisor = gcd(width, height);
            format!("{}:{}", width / divisor, height / divisor)
        }
        _ => "1:1".to_string(),
    }
}

/// Assemble the `generateContent` request body.
///
/// Part order matters: inline reference images first, prompt text last.
fn build_request_body(params: &GenerationParams, with_image_config: bool) -> serde_json::Value {
    let mut parts = Vec::new();

    for reference in &params.reference_images {
        if let Some(base64_data) = &reference.base64 {
            let (mime_type, payload) = match mime::parse_data_url(base64_data) {
                Some((mime_type, payload)) => (mime_type, payload),
                None => (DEFAULT_MIME.to_string(), base64_data.clone()),
            };
            parts.push(json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": payload,
                }
            }));
        }
    }

    if !params.prompt.is_empty() {
        parts.push(json!({ "text": params.prompt }));
    }

    let mut body = json!({
        "contents": [{
            "role": "user",
            "parts": parts,
        }],
    });

    if with_image_config {
        let mut image_config = serde_json::Map::new();
        image_config.insert(
            "aspectRatio".to_string(),
            json!(size_to_aspect_ratio(
                params.size.as_deref().unwrap_or(DEFAULT_SIZE)
            )),
        );
        // Custom parameters target the image config, not the top-level
        // generation config.
        for (key, value) in &params.custom_params {
            image_config.insert(key.clone(), value.clone());
        }
        body["generationConfig"] = json!({ "imageConfig": image_config });
    }

    body
}

/// The parts of the first candidate's content, if any.
fn candidate_parts(response: &serde_json::Value) -> Option<&Vec<serde_json::Value>> {
    response
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()
}

/// The first part carrying inline image data, as `(mime_type, data)`.
///
/// Text parts are skipped: image models routinely emit a leading text part
/// before the image itself.
fn first_inline_part(response: &serde_json::Value) -> Option<(String, String)> {
    for part in candidate_parts(response)? {
        if let Some(data) = part
            .get("inlineData")
            .and_then(|inline| inline.get("data"))
            .and_then(|d| d.as_str())
        {
            let mime_type = part
                .get("inlineData")
                .and_then(|inline| inline.get("mimeType"))
                .and_then(|m| m.as_str())
                .unwrap_or(DEFAULT_MIME);
            return Some((mime_type.to_string(), data.to_string()));
        }
    }
    None
}

/// The first text part; inline image parts are skipped.
fn first_text_part(response: &serde_json::Value) -> Option<String> {
    candidate_parts(response)?
        .iter()
        .find_map(|part| part.get("text").and_then(|t| t.as_str()))
        .map(|text| text.to_string())
}

#[async_trait]
impl ImageGenerationCapability for GeminiAdapter {
    async fn generate_image(
        &self,
        params: GenerationParams,
    ) -> Result<Vec<GeneratedImage>, GenError> {
        params.validate()?;

        let response = self.generate_content(&params, true).await?;

        match first_inline_part(&response) {
            Some((mime_type, data)) => {
                let url = format!("data:{mime_type};base64,{data}");
                Ok(vec![GeneratedImage {
                    base64: Some(url.clone()),
                    url,
                }])
            }
            None => Err(GenError::response_format(
                "No image data in generateContent response",
            )),
        }
    }
}

#[async_trait]
impl TextGenerationCapability for GeminiAdapter {
    async fn generate_text(&self, params: GenerationParams) -> Result<String, GenError> {
        params.validate()?;

        let response = self.generate_content(&params, false).await?;

        first_text_part(&response).ok_or_else(|| {
            GenError::response_format("No text in generateContent response")
        })
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn api_format(&self) -> ApiFormat {
        ApiFormat::Gemini
    }
}

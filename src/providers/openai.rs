//! OpenAI-compatible provider strategy
//!
//! Two request shapes behind one `generate_image`:
//!
//! - no reference images: JSON POST to `/images/generations`
//! - with reference images: multipart POST to `/images/edits`, one `image`
//!   part per reference
//!
//! When the edit call fails for any reason (unsupported feature, network,
//! server error) the strategy falls back to a plain text-to-image call with
//! an annotated prompt. The edit failure is logged, not surfaced; the
//! fallback result is returned as success.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::GenError;
use crate::traits::{ImageGenerationCapability, ProviderAdapter, TextGenerationCapability};
use crate::transport::HttpTransport;
use crate::types::{
    ApiFormat, GeneratedImage, GenerationParams, ProviderConfig, ReferenceImage,
};
use crate::utils::mime;

/// Suffix appended to the prompt when the edit call failed and the request
/// degraded to plain text-to-image.
pub const REFERENCE_FALLBACK_NOTE: &str =
    " (Note: reference image was provided but could not be used directly)";

const DEFAULT_SIZE: &str = "1024x1024";
const DEFAULT_QUALITY: &str = "standard";

/// Wire shape of `/images/generations`.
#[derive(Debug, Clone, Serialize)]
struct OpenAiImageRequest {
    model: String,
    prompt: String,
    n: u32,
    size: String,
    quality: String,
    response_format: String,
}

/// Wire shape of the image response (shared by generations and edits).
#[derive(Debug, Clone, Deserialize)]
struct OpenAiImageResponse {
    #[serde(default)]
    data: Vec<OpenAiImage>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiImage {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

/// OpenAI-compatible image generation strategy.
///
/// Also the factory default for unknown models and absent `apiFormat` tags.
pub struct OpenAiAdapter {
    transport: HttpTransport,
}

impl OpenAiAdapter {
    /// Build an adapter bound to the given config snapshot.
    pub fn new(config: &ProviderConfig) -> Result<Self, GenError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }

    /// Plain text-to-image request.
    async fn generate_from_text(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<GeneratedImage>, GenError> {
        let request = OpenAiImageRequest {
            model: params.model.clone(),
            prompt: prompt.to_string(),
            n: 1,
            size: params
                .size
                .clone()
                .unwrap_or_else(|| DEFAULT_SIZE.to_string()),
            quality: params
                .quality
                .clone()
                .unwrap_or_else(|| DEFAULT_QUALITY.to_string()),
            response_format: "url".to_string(),
        };

        let response = self.transport.post_json("/images/generations", &request).await?;
        project_image_response(response)
    }

    /// Reference-image edit request: multipart body with one `image` part
    /// per reference.
    async fn edit_with_references(
        &self,
        params: &GenerationParams,
    ) -> Result<Vec<GeneratedImage>, GenError> {
        let mut form = reqwest::multipart::Form::new()
            .text("model", params.model.clone())
            .text("prompt", params.prompt.clone())
            .text("response_format", "url".to_string());
        if let Some(size) = &params.size {
            form = form.text("size", size.clone());
        }

        for (i, reference) in params.reference_images.iter().enumerate() {
            let (bytes, mime_type) = self.resolve_reference(reference).await?;
            let extension = mime::extension_for_mime(&mime_type);
            let part = reqwest::multipart::Part::bytes(bytes)
                .file_name(format!("reference_{i}.{extension}"))
                .mime_str(&mime_type)
                .map_err(|e| GenError::validation(format!("Invalid MIME type: {e}")))?;
            form = form.part("image", part);
        }

        let response = self.transport.post_multipart("/images/edits", form).await?;
        project_image_response(response)
    }

    /// Decode a reference image to binary plus its MIME type.
    ///
    /// Base64 entries are decoded locally (MIME from the `data:` prefix);
    /// URL entries are fetched and the MIME taken from the response header,
    /// magic bytes, or the URL extension, in that order.
    async fn resolve_reference(
        &self,
        reference: &ReferenceImage,
    ) -> Result<(Vec<u8>, String), GenError> {
        if let Some(base64_data) = &reference.base64 {
            let (mime_type, payload) = match mime::parse_data_url(base64_data) {
                Some((mime_type, payload)) => (mime_type, payload),
                None => ("image/png".to_string(), base64_data.clone()),
            };
            let bytes = base64::engine::general_purpose::STANDARD
                .decode(payload.as_bytes())
                .map_err(|e| {
                    GenError::validation(format!("Invalid base64 reference image: {e}"))
                })?;
            return Ok((bytes, mime_type));
        }

        if let Some(url) = &reference.url {
            let (bytes, content_type) = self.transport.fetch_bytes(url).await?;
            let mime_type = content_type
                .filter(|ct| ct.starts_with("image/"))
                .or_else(|| mime::guess_mime_from_bytes(&bytes))
                .or_else(|| mime::guess_mime_from_path_or_url(url))
                .unwrap_or_else(|| "image/png".to_string());
            return Ok((bytes, mime_type));
        }

        Err(GenError::validation(
            "Reference image has neither a URL nor base64 data",
        ))
    }
}

/// Require a non-empty `data` array and project each element's URL.
fn project_image_response(
    response: serde_json::Value,
) -> Result<Vec<GeneratedImage>, GenError> {
    let response: OpenAiImageResponse = serde_json::from_value(response)
        .map_err(|e| GenError::Parse(format!("Failed to parse image response: {e}")))?;

    if response.data.is_empty() {
        return Err(GenError::response_format(
            "Image response contained no data entries",
        ));
    }

    let images: Vec<GeneratedImage> = response
        .data
        .into_iter()
        .filter_map(|img| match (img.url, img.b64_json) {
            (Some(url), _) => Some(GeneratedImage { url, base64: None }),
            (None, Some(b64)) => Some(GeneratedImage {
                url: format!("data:image/png;base64,{b64}"),
                base64: Some(b64),
            }),
            (None, None) => None,
        })
        .collect();

    if images.is_empty() {
        return Err(GenError::response_format(
            "Image response entries carried neither url nor b64_json",
        ));
    }

    Ok(images)
}

#[async_trait]
impl ImageGenerationCapability for OpenAiAdapter {
    async fn generate_image(
        &self,
        params: GenerationParams,
    ) -> Result<Vec<GeneratedImage>, GenError> {
        params.validate()?;

        if params.reference_images.is_empty() {
            return self.generate_from_text(&params.prompt, &params).await;
        }

        match self.edit_with_references(&params).await {
            Ok(images) => Ok(images),
            Err(e) => {
                // Intentionally swallowed: the caller gets a degraded but
                // successful result instead of the edit failure.
                tracing::warn!(
                    "Image edit request failed, falling back to text-to-image: {}",
                    e
                );
                let prompt = format!("{}{}", params.prompt, REFERENCE_FALLBACK_NOTE);
                self.generate_from_text(&prompt, &params).await
            }
        }
    }
}

impl TextGenerationCapability for OpenAiAdapter {}

impl ProviderAdapter for OpenAiAdapter {
    fn api_format(&self) -> ApiFormat {
        ApiFormat::OpenAi
    }
}

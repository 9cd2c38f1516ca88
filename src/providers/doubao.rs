//! Doubao-compatible provider strategy
//!
//! The simplest contract: a flat JSON body on `/images/generations`. At most
//! one reference image is forwarded as `image_url`, preferring a direct URL
//! over base64 when both are present.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::error::GenError;
use crate::traits::{ImageGenerationCapability, ProviderAdapter, TextGenerationCapability};
use crate::transport::HttpTransport;
use crate::types::{ApiFormat, GeneratedImage, GenerationParams, ProviderConfig};

const DEFAULT_SIZE: &str = "1024x1024";

#[derive(Debug, Clone, Deserialize)]
struct DoubaoImageResponse {
    #[serde(default)]
    data: Vec<DoubaoImage>,
}

#[derive(Debug, Clone, Deserialize)]
struct DoubaoImage {
    url: String,
}

/// Doubao-compatible image generation strategy.
pub struct DoubaoAdapter {
    transport: HttpTransport,
}

impl DoubaoAdapter {
    /// Build an adapter bound to the given config snapshot.
    pub fn new(config: &ProviderConfig) -> Result<Self, GenError> {
        Ok(Self {
            transport: HttpTransport::new(config)?,
        })
    }
}

/// Assemble the flat request body, spreading custom params at the top level.
fn build_request_body(params: &GenerationParams) -> serde_json::Value {
    let mut body = json!({
        "model": params.model,
        "prompt": params.prompt,
        "size": params.size.as_deref().unwrap_or(DEFAULT_SIZE),
        "n": 1,
    });

    // At most one reference image; a direct URL wins over base64.
    if let Some(reference) = params.reference_images.first() {
        if let Some(url) = &reference.url {
            body["image_url"] = json!(url);
        } else if let Some(base64_data) = &reference.base64 {
            body["image_url"] = json!(base64_data);
        }
    }

    for (key, value) in &params.custom_params {
        body[key.as_str()] = value.clone();
    }

    body
}

#[async_trait]
impl ImageGenerationCapability for DoubaoAdapter {
    async fn generate_image(
        &self,
        params: GenerationParams,
    ) -> Result<Vec<GeneratedImage>, GenError> {
        params.validate()?;

        let body = build_request_body(&params);
        let response = self.transport.post_json("/images/generations", &body).await?;

        let response: DoubaoImageResponse = serde_json::from_value(response)
            .map_err(|e| GenError::Parse(format!("Failed to parse image response: {e}")))?;

        if response.data.is_empty() {
            return Err(GenError::response_format(
                "Image response contained no data entries",
            ));
        }

        Ok(response
            .data
            .into_iter()
            .map(|img| GeneratedImage {
                url: img.url,
                base64: None,
            })
            .collect())
    }
}

impl TextGenerationCapability for DoubaoAdapter {}

impl ProviderAdapter for DoubaoAdapter {
    fn api_format(&self) -> ApiFormat {
        ApiFormat::Doubao
    }
}

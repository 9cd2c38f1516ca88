//! Capability traits implemented by provider strategies

use async_trait::async_trait;

use crate::error::GenError;
use crate::types::{ApiFormat, GeneratedImage, GenerationParams};

/// Image generation. The one mandatory capability of every strategy.
#[async_trait]
pub trait ImageGenerationCapability: Send + Sync {
    /// Generate one or more images.
    ///
    /// On success the result is non-empty; an empty provider response is
    /// surfaced as `GenError::ResponseFormat`.
    async fn generate_image(
        &self,
        params: GenerationParams,
    ) -> Result<Vec<GeneratedImage>, GenError>;
}

/// Text generation via the same multimodal request construction.
///
/// Optional; strategies without a text path keep the default implementation,
/// which fails explicitly rather than silently succeeding.
#[async_trait]
pub trait TextGenerationCapability: Send + Sync {
    async fn generate_text(&self, params: GenerationParams) -> Result<String, GenError> {
        let _ = params;
        Err(GenError::UnsupportedOperation(
            "Text generation is not supported by this provider strategy".to_string(),
        ))
    }
}

/// The full adapter contract handed out by the factory.
pub trait ProviderAdapter: ImageGenerationCapability + TextGenerationCapability {
    /// Which wire format this strategy speaks.
    fn api_format(&self) -> ApiFormat;
}

//! Core data types shared by all provider strategies
//!
//! Configuration values (`ProviderConfig`, `ModelConfig`) are long-lived and
//! owned by the caller; adapters receive an immutable snapshot per call and
//! never mutate it. `GenerationParams` is built per request and discarded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::GenError;

/// Wire format a model speaks; selects the provider strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiFormat {
    /// OpenAI-style JSON (`/images/generations`, `/images/edits`, `/chat/completions`)
    #[default]
    OpenAi,
    /// Gemini-style multimodal parts with inline base64 (`:generateContent`)
    Gemini,
    /// Doubao-style flat JSON (`/images/generations` with `image_url`)
    Doubao,
}

/// What a model produces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Text,
    #[default]
    Image,
    Video,
}

/// Per-model configuration within a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier as sent on the wire (e.g. "dall-e-3")
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Wire format; absent means OpenAI-compatible
    #[serde(default, rename = "apiFormat")]
    pub api_format: ApiFormat,
    /// Output modality
    #[serde(default, rename = "type")]
    pub model_type: ModelType,
    /// Whether the model is offered to callers
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Supported sizes ("widthxheight" strings), if the provider restricts them
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Provider-specific parameters merged into every request for this model
    #[serde(default, rename = "customParams")]
    pub custom_params: HashMap<String, serde_json::Value>,
}

fn default_enabled() -> bool {
    true
}

impl ModelConfig {
    /// A minimal image-model config with defaults everywhere else.
    pub fn image(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            api_format: ApiFormat::default(),
            model_type: ModelType::Image,
            enabled: true,
            sizes: Vec::new(),
            custom_params: HashMap::new(),
        }
    }
}

/// Provider connection settings plus its model list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Provider identifier (e.g. "openai", "doubao", "custom-...")
    pub id: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// API root, without a trailing slash (e.g. "https://api.openai.com/v1")
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    /// Bearer token sent on every request
    #[serde(rename = "apiKey")]
    pub api_key: String,
    /// Models this provider offers
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

impl ProviderConfig {
    /// Fail with `GenError::Config` if the API key or base URL is missing.
    pub fn validate(&self) -> Result<(), GenError> {
        if self.api_key.is_empty() {
            return Err(GenError::config("API key is required"));
        }
        if self.base_url.is_empty() {
            return Err(GenError::config("Base URL is required"));
        }
        Ok(())
    }

    /// Look up a model by id.
    pub fn model(&self, model_id: &str) -> Option<&ModelConfig> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// Models currently offered to callers.
    pub fn enabled_models(&self) -> impl Iterator<Item = &ModelConfig> {
        self.models.iter().filter(|m| m.enabled)
    }
}

/// A reference image supplied with a generation request.
///
/// Exactly one of `url` / `base64` is meaningful; `base64` may carry a
/// `data:<mime>;base64,` prefix which is stripped (and its MIME type used)
/// before transport-level encoding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceImage {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub base64: Option<String>,
}

impl ReferenceImage {
    /// A reference by URL.
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            base64: None,
        }
    }

    /// A reference by (possibly data-URL prefixed) base64 payload.
    pub fn from_base64(base64: impl Into<String>) -> Self {
        Self {
            url: None,
            base64: Some(base64.into()),
        }
    }
}

/// Parameters for one image generation call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Text prompt; may be empty only when reference images are present
    #[serde(default)]
    pub prompt: String,
    /// Model id, always required
    pub model: String,
    /// Requested size as "widthxheight"
    #[serde(default)]
    pub size: Option<String>,
    /// Quality setting, for providers that support one
    #[serde(default)]
    pub quality: Option<String>,
    /// Reference images, ordered
    #[serde(default, rename = "referenceImages")]
    pub reference_images: Vec<ReferenceImage>,
    /// Provider-specific extra parameters
    #[serde(default, rename = "customParams")]
    pub custom_params: HashMap<String, serde_json::Value>,
}

impl GenerationParams {
    /// A plain text-to-image request.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Prefix a system prompt onto the prompt as `"{system}\n\n{prompt}"`.
    ///
    /// For strategies whose text path carries a single prompt string
    /// (Gemini `generateContent`) instead of a separate system message;
    /// the chat path uses [`crate::ChatRequest::with_system_prompt`].
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.prompt = format!("{}\n\n{}", system_prompt.into(), self.prompt);
        self
    }

    /// Fail with `GenError::Validation` unless the invariant holds: a model
    /// is named, and either the prompt or the reference list is non-empty.
    pub fn validate(&self) -> Result<(), GenError> {
        if self.model.is_empty() {
            return Err(GenError::validation("Model is required"));
        }
        if self.prompt.is_empty() && self.reference_images.is_empty() {
            return Err(GenError::validation(
                "Either a prompt or at least one reference image is required",
            ));
        }
        Ok(())
    }
}

/// One generated image. Success results are never empty; an empty `data`
/// array from a provider is a response-format error, not an empty result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Image location: an https URL or a `data:` URL for inline results
    pub url: String,
    /// Base64 payload when the provider returned the image inline
    #[serde(default)]
    pub base64: Option<String>,
}

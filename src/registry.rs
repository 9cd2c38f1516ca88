//! Adapter factory
//!
//! Pure lookup: resolve the model within the provider's model list and
//! dispatch on its `apiFormat`. Unknown models and absent format tags fall
//! back to the OpenAI-compatible strategy. Nothing is cached; every call
//! constructs a fresh adapter bound to the config snapshot passed in.

use crate::error::GenError;
use crate::providers::{DoubaoAdapter, GeminiAdapter, OpenAiAdapter};
use crate::traits::ProviderAdapter;
use crate::types::{ApiFormat, ProviderConfig};

/// Build the strategy for `model_id` within `config`.
///
/// Fails with `GenError::Config` when the config is missing its API key or
/// base URL; never fails on an unknown model (the OpenAI-compatible default
/// applies).
pub fn create_adapter(
    config: &ProviderConfig,
    model_id: &str,
) -> Result<Box<dyn ProviderAdapter>, GenError> {
    let api_format = config
        .model(model_id)
        .map(|m| m.api_format)
        .unwrap_or_default();

    let adapter: Box<dyn ProviderAdapter> = match api_format {
        ApiFormat::OpenAi => Box::new(OpenAiAdapter::new(config)?),
        ApiFormat::Gemini => Box::new(GeminiAdapter::new(config)?),
        ApiFormat::Doubao => Box::new(DoubaoAdapter::new(config)?),
    };
    Ok(adapter)
}

//! Built-in provider presets
//!
//! Templates for the providers the application ships with. API keys are
//! left empty; the caller fills them in from its own configuration store.

use crate::types::{ApiFormat, ModelConfig, ModelType, ProviderConfig};

/// The built-in provider catalog.
pub fn preset_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig {
            id: "openai".to_string(),
            name: Some("OpenAI".to_string()),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: String::new(),
            models: vec![
                ModelConfig {
                    name: Some("DALL-E 3".to_string()),
                    ..ModelConfig::image("dall-e-3")
                },
                ModelConfig {
                    name: Some("DALL-E 2".to_string()),
                    enabled: false,
                    ..ModelConfig::image("dall-e-2")
                },
                ModelConfig {
                    name: Some("GPT-4o mini".to_string()),
                    model_type: ModelType::Text,
                    ..ModelConfig::image("gpt-4o-mini")
                },
            ],
        },
        ProviderConfig {
            id: "doubao".to_string(),
            name: Some("Doubao".to_string()),
            base_url: "https://ark.cn-beijing.volces.com/api/v3".to_string(),
            api_key: String::new(),
            models: vec![ModelConfig {
                name: Some("SeeDream 4.5".to_string()),
                api_format: ApiFormat::Doubao,
                ..ModelConfig::image("doubao-seedream-4-5-251128")
            }],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_have_models_and_no_keys() {
        let presets = preset_providers();
        assert!(presets.iter().all(|p| !p.models.is_empty()));
        assert!(presets.iter().all(|p| p.api_key.is_empty()));
    }

    #[test]
    fn doubao_models_carry_the_doubao_format() {
        let presets = preset_providers();
        let doubao = presets.iter().find(|p| p.id == "doubao").unwrap();
        assert!(doubao
            .models
            .iter()
            .all(|m| m.api_format == ApiFormat::Doubao));
    }

    #[test]
    fn disabled_models_are_filtered() {
        let presets = preset_providers();
        let openai = presets.iter().find(|p| p.id == "openai").unwrap();
        assert!(openai.enabled_models().all(|m| m.id != "dall-e-2"));
    }
}

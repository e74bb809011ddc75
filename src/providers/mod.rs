//! Provider module for Aura
//!
//! This module contains the chat model abstraction and the Azure OpenAI
//! and Ollama implementations.

pub mod azure;
pub mod base;
pub mod ollama;

pub use azure::AzureOpenAiProvider;
pub use base::{
    validate_message_sequence, CompletionResponse, FunctionCall, Message, Provider, TokenUsage,
    ToolCall,
};
pub use ollama::OllamaProvider;

use crate::config::ProviderConfig;
use crate::error::{AuraError, Result};

/// Create a provider instance based on configuration
///
/// # Arguments
///
/// * `provider_type` - Type of provider ("azure" or "ollama")
/// * `config` - Provider configuration
///
/// # Errors
///
/// Returns error if provider type is invalid or initialization fails,
/// including `AuraError::MissingCredentials` for an unconfigured Azure
/// resource
///
/// # Examples
///
/// ```
/// use aura::config::Config;
/// use aura::providers::create_provider;
///
/// let config = Config::default();
/// assert!(create_provider("ollama", &config.provider).is_ok());
/// assert!(create_provider("gemini", &config.provider).is_err());
/// ```
pub fn create_provider(provider_type: &str, config: &ProviderConfig) -> Result<Box<dyn Provider>> {
    match provider_type {
        "azure" => Ok(Box::new(AzureOpenAiProvider::new(config.azure.clone())?)),
        "ollama" => Ok(Box::new(OllamaProvider::new(config.ollama.clone())?)),
        _ => Err(AuraError::Provider(format!("Unknown provider type: {}", provider_type)).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AzureOpenAiConfig, OllamaConfig};

    fn provider_config() -> ProviderConfig {
        ProviderConfig {
            provider_type: "azure".to_string(),
            azure: AzureOpenAiConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }

    #[test]
    fn test_create_provider_invalid_type() {
        let result = create_provider("invalid", &provider_config());
        assert!(result.is_err());
    }

    #[test]
    fn test_create_provider_ollama() {
        let provider = create_provider("ollama", &provider_config()).unwrap();
        assert_eq!(provider.get_current_model().unwrap(), "llama3.2:latest");
    }

    #[test]
    fn test_create_provider_azure_without_credentials() {
        let err = create_provider("azure", &provider_config()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<AuraError>(),
            Some(AuraError::MissingCredentials(_))
        ));
    }

    #[test]
    fn test_create_provider_azure_with_credentials() {
        let mut config = provider_config();
        config.azure.endpoint = "https://example.openai.azure.com".to_string();
        config.azure.api_key = Some("key".to_string());
        config.azure.chat_deployment = "gpt-4o".to_string();

        let provider = create_provider("azure", &config).unwrap();
        assert_eq!(provider.get_current_model().unwrap(), "gpt-4o");
    }
}

//! Provider selection from configuration.
//!
//! Builds the one generation backend a session talks to, or nothing when no
//! credential is available (generation disabled).

use std::sync::Arc;
use std::time::Duration;

use docchat_config::AppConfig;
use docchat_core::provider::Provider;
use tracing::{debug, warn};

use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Providers that run locally and accept any key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "llamacpp", "llama.cpp"];

/// Build the configured default provider.
///
/// Returns `None` when the provider needs an API key and none is configured.
pub fn build_from_config(config: &AppConfig) -> Option<Arc<dyn Provider>> {
    let name = config.default_provider.as_str();
    let provider_config = config.providers.get(name);
    let custom_url = provider_config.and_then(|p| p.api_url.clone());
    let timeout = config.request_timeout_secs.map(Duration::from_secs);

    let api_key = match config.resolve_api_key(name) {
        Some(key) => key,
        None if KEYLESS_PROVIDERS.contains(&name) => name.to_string(),
        None => {
            warn!(provider = name, "No API key configured; generation disabled");
            return None;
        }
    };

    debug!(provider = name, custom_url = custom_url.is_some(), ?timeout, "Building provider");

    let provider: Arc<dyn Provider> = if name == "gemini" || name == "google" {
        let mut p = GeminiProvider::new(api_key);
        if let Some(url) = custom_url {
            p = p.with_base_url(url);
        }
        if let Some(t) = timeout {
            p = p.with_timeout(t);
        }
        Arc::new(p)
    } else {
        let base_url = custom_url.unwrap_or_else(|| default_base_url(name));
        let mut p = OpenAiCompatProvider::new(name, base_url, api_key);
        if let Some(t) = timeout {
            p = p.with_timeout(t);
        }
        Arc::new(p)
    };

    Some(provider)
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "gemini" | "google" => "https://generativelanguage.googleapis.com".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docchat_config::ProviderConfig;

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("gemini").contains("generativelanguage"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn no_key_disables_generation() {
        let config = AppConfig::default();
        assert!(build_from_config(&config).is_none());
    }

    #[test]
    fn gemini_with_key() {
        let config = AppConfig {
            api_key: Some("AIza-test".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn blank_key_disables_generation() {
        let config = AppConfig {
            api_key: Some("   ".into()),
            ..AppConfig::default()
        };
        assert!(build_from_config(&config).is_none());
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn per_provider_key_is_used() {
        let mut config = AppConfig {
            default_provider: "openai".into(),
            request_timeout_secs: Some(30),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openai".into(),
            ProviderConfig {
                api_key: Some("sk-test".into()),
                api_url: None,
                default_model: Some("gpt-4o-mini".into()),
            },
        );
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openai");
    }
}

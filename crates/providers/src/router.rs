//! Builds a `ProviderManager` from configuration.

use crate::manager::ProviderManager;
use crate::openai_compat::{LOCAL_PLACEHOLDER_KEY, OpenAiCompatProvider};
use safina_config::AppConfig;
use std::sync::Arc;
use tracing::warn;

/// Build providers from configuration.
///
/// Every enabled entry under `[providers]` is registered. The default
/// provider is always registered, even without an explicit entry, so a bare
/// config with only an API key still works.
pub fn build_from_config(config: &AppConfig) -> ProviderManager {
    let mut manager = ProviderManager::new();

    for (name, provider_config) in &config.providers {
        if !provider_config.enabled {
            continue;
        }

        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));
        let model = provider_config
            .model
            .clone()
            .unwrap_or_else(|| default_model(name).to_string());
        let api_key = resolve_api_key(config, name);

        let provider = OpenAiCompatProvider::new(name, base_url, api_key, model)
            .with_timeout(provider_config.timeout_secs);
        manager.register(name.clone(), Arc::new(provider));
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if manager.get(&config.default_provider).is_none()
        && !config.providers.contains_key(&config.default_provider)
    {
        let name = &config.default_provider;
        let provider = OpenAiCompatProvider::new(
            name,
            default_base_url(name),
            resolve_api_key(config, name),
            default_model(name),
        );
        manager.register(name.clone(), Arc::new(provider));
    }

    if let Err(e) = manager.set_default(&config.default_provider) {
        warn!(error = %e, "Default provider is disabled");
    }
    manager.set_fallback_order(config.fallback_order.clone());

    manager
}

/// Configured key, else a placeholder for keyless local backends, else empty.
fn resolve_api_key(config: &AppConfig, provider_name: &str) -> String {
    config.api_key_for(provider_name).unwrap_or_else(|| {
        if is_local(provider_name) {
            LOCAL_PLACEHOLDER_KEY.to_string()
        } else {
            String::new()
        }
    })
}

fn is_local(provider_name: &str) -> bool {
    matches!(provider_name, "ollama" | "vllm")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "gemini" => "https://generativelanguage.googleapis.com/v1beta/openai".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

fn default_model(provider_name: &str) -> &'static str {
    match provider_name {
        "gemini" => "gemini-2.0-flash",
        "openai" => "gpt-4o-mini",
        "openrouter" => "google/gemini-2.0-flash-001",
        "ollama" => "llama3.2",
        "deepseek" => "deepseek-chat",
        "groq" => "llama-3.1-8b-instant",
        _ => "default",
    }
}

//! Wires configuration into a ready-to-run orchestrator.

use safina_agent::Orchestrator;
use safina_config::AppConfig;
use safina_memory::SessionStore;
use safina_tools::{FaqBook, TableLookup, default_registry, fallback_handler};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load config from `--config` (or the default path) with env overrides.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))?;
    Ok(config)
}

/// Build providers, handlers, and the session store from config.
pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, Box<dyn std::error::Error>> {
    let providers = safina_providers::build_from_config(config);

    let lookup = TableLookup::from_csv_files(&config.data.qualified_path, &config.data.disqualified_path)?;
    let faqs = FaqBook::from_json_file(&config.data.faq_path)?;
    let registry = default_registry(Arc::new(lookup), faqs);

    info!(
        providers = providers.len(),
        handlers = registry.len(),
        max_history = config.session.max_history,
        "Runtime ready"
    );

    Ok(Orchestrator::new(
        Arc::new(providers),
        Arc::new(registry),
        Arc::new(SessionStore::new(config.session.max_history)),
        fallback_handler(),
    ))
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &AppConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

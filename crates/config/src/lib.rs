//! Configuration loading, validation, and management for Safina.
//!
//! Loads configuration from `~/.safina/config.toml` with environment
//! variable overrides. `${VAR}` references inside provider secrets are
//! expanded from the environment. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.safina/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key shared by providers that don't set their own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Provider tried after the caller's preference
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Providers tried, in order, when the default is unavailable
    #[serde(default)]
    pub fallback_order: Vec<String>,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Session history configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Data file locations
    #[serde(default)]
    pub data: DataConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_true() -> bool {
    true
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("fallback_order", &self.fallback_order)
            .field("providers", &self.providers)
            .field("session", &self.session)
            .field("data", &self.data)
            .field("logging", &self.logging)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// HTTP timeout for each backend call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            api_url: None,
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Interactions kept per session (oldest evicted first)
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_history() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV of qualified (eligible) accounts
    #[serde(default = "default_qualified_path")]
    pub qualified_path: PathBuf,

    /// CSV of disqualified customers and their check flags
    #[serde(default = "default_disqualified_path")]
    pub disqualified_path: PathBuf,

    /// FAQ knowledge base (JSON)
    #[serde(default = "default_faq_path")]
    pub faq_path: PathBuf,
}

fn default_qualified_path() -> PathBuf {
    PathBuf::from("data/warehouse.csv")
}
fn default_disqualified_path() -> PathBuf {
    PathBuf::from("data/reasons.csv")
}
fn default_faq_path() -> PathBuf {
    PathBuf::from("data/faqs.json")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            qualified_path: default_qualified_path(),
            disqualified_path: default_disqualified_path(),
            faq_path: default_faq_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.safina/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SAFINA_PROVIDER`: default provider
    /// - `SAFINA_MODEL`: model for the default provider
    /// - `SAFINA_API_KEY`, then `GEMINI_API_KEY`: shared API key
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply the environment overrides listed on [`AppConfig::load`].
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// The default config file location.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.expand_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".safina")
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(provider) = std::env::var("SAFINA_PROVIDER") {
            self.default_provider = provider;
        }

        if let Ok(model) = std::env::var("SAFINA_MODEL") {
            self.providers
                .entry(self.default_provider.clone())
                .or_default()
                .model = Some(model);
        }

        if self.api_key.is_none() {
            self.api_key = std::env::var("SAFINA_API_KEY")
                .ok()
                .or_else(|| std::env::var("GEMINI_API_KEY").ok());
        }
    }

    /// Expand `${VAR}` references in secrets and URLs.
    fn expand_env_vars(&mut self) {
        let lookup = |name: &str| std::env::var(name).ok();
        if let Some(key) = &self.api_key {
            self.api_key = Some(expand_vars_with(key, lookup));
        }
        for provider in self.providers.values_mut() {
            if let Some(key) = &provider.api_key {
                provider.api_key = Some(expand_vars_with(key, lookup));
            }
            if let Some(url) = &provider.api_url {
                provider.api_url = Some(expand_vars_with(url, lookup));
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_provider.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_provider must not be empty".into(),
            ));
        }

        if !self.providers.is_empty() && !self.providers.contains_key(&self.default_provider) {
            return Err(ConfigError::ValidationError(format!(
                "default provider '{}' not configured",
                self.default_provider
            )));
        }

        if self.session.max_history == 0 {
            return Err(ConfigError::ValidationError(
                "session.max_history must be at least 1".into(),
            ));
        }

        for (name, provider) in &self.providers {
            if provider.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "providers.{name}.timeout_secs must be > 0"
                )));
            }
        }

        Ok(())
    }

    /// Resolve the API key for a provider: its own key, else the shared one.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            fallback_order: vec![],
            providers: HashMap::new(),
            session: SessionConfig::default(),
            data: DataConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Replace every `${NAME}` in `input` with `lookup(NAME)`. Unknown names are
/// left as written.
pub fn expand_vars_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let name = &after[..end];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        tracing::warn!(var = %name, "Environment variable not found");
                        out.push_str(&rest[start..start + 2 + end + 1]);
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.session.max_history, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.data.faq_path, config.data.faq_path);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn parses_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
default_provider = "gemini"
fallback_order = ["ollama"]

[providers.gemini]
api_key = "literal-key"
model = "gemini-1.5-flash"
timeout_secs = 15

[providers.ollama]
api_url = "http://localhost:11434/v1"

[session]
max_history = 4

[logging]
level = "debug"
json = true
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.fallback_order, vec!["ollama"]);
        assert_eq!(config.providers["gemini"].timeout_secs, 15);
        assert!(config.providers["ollama"].enabled);
        assert_eq!(config.session.max_history, 4);
        assert!(config.logging.json);
        assert_eq!(config.api_key_for("gemini").as_deref(), Some("literal-key"));
        assert!(config.api_key_for("ollama").is_none());
    }

    #[test]
    fn unconfigured_default_provider_rejected() {
        let mut config = AppConfig::default();
        config.providers.insert("ollama".into(), ProviderConfig::default());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("'gemini' not configured"));
    }

    #[test]
    fn zero_history_rejected() {
        let config = AppConfig {
            session: SessionConfig { max_history: 0 },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                timeout_secs: 0,
                ..ProviderConfig::default()
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "default_provider = [").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn expands_known_vars_and_keeps_unknown() {
        let lookup = |name: &str| (name == "GEMINI_API_KEY").then(|| "secret".to_string());
        assert_eq!(expand_vars_with("${GEMINI_API_KEY}", lookup), "secret");
        assert_eq!(expand_vars_with("Bearer ${GEMINI_API_KEY}!", lookup), "Bearer secret!");
        assert_eq!(expand_vars_with("${MISSING}", lookup), "${MISSING}");
        assert_eq!(expand_vars_with("plain", lookup), "plain");
        assert_eq!(expand_vars_with("broken ${OPEN", lookup), "broken ${OPEN");
    }

    #[test]
    fn debug_redacts_keys() {
        let mut config = AppConfig {
            api_key: Some("top-secret".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "gemini".into(),
            ProviderConfig {
                api_key: Some("also-secret".into()),
                ..ProviderConfig::default()
            },
        );
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("top-secret"));
        assert!(!dbg.contains("also-secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini"));
        assert!(toml_str.contains("max_history"));
    }
}

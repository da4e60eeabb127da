//! Configuration loading, validation, and management for docchat.
//!
//! Loads configuration from `~/.docchat/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The root configuration structure.
///
/// Maps directly to `~/.docchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Generation provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Model identifier, fixed for the lifetime of a session
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Max tokens per reply; provider default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_max_tokens: Option<u32>,

    /// HTTP timeout for one generation call; unset means wait indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    /// Chat session behavior
    #[serde(default)]
    pub session: SessionSettings,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_provider() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.0-flash-lite".into()
}
fn default_temperature() -> f32 {
    0.7
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
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("session", &self.session)
            .field("providers", &self.providers)
            .finish()
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,
}

/// The reviewer persona the model is asked to play.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    /// Professional, even-handed hiring manager
    #[default]
    Neutral,
    /// Grumpy hiring manager who only recommends exceptional candidates
    Skeptical,
}

/// What happens when an action arrives before any document is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardMode {
    /// Refuse the action with a warning; nothing is appended
    #[default]
    Strict,
    /// Proceed with an empty document context
    Permissive,
}

/// One of the two shipped deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Neutral persona, strict guard, fast/lite model
    Neutral,
    /// Skeptical persona, permissive guard, small general-purpose model
    Skeptical,
}

impl FromStr for Persona {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "skeptical" | "grumpy" => Ok(Self::Skeptical),
            other => Err(ConfigError::ValidationError(format!(
                "unknown persona '{other}' (expected 'neutral' or 'skeptical')"
            ))),
        }
    }
}

impl FromStr for GuardMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(ConfigError::ValidationError(format!(
                "unknown document guard '{other}' (expected 'strict' or 'permissive')"
            ))),
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neutral" => Ok(Self::Neutral),
            "skeptical" => Ok(Self::Skeptical),
            other => Err(ConfigError::ValidationError(format!("unknown preset '{other}'"))),
        }
    }
}

/// Session behavior: persona, guard, prompt directives and size policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    #[serde(default)]
    pub persona: Persona,

    #[serde(default)]
    pub document_guard: GuardMode,

    /// Tell the model to say so when the answer is not in the document
    #[serde(default = "default_true")]
    pub require_grounding_disclaimer: bool,

    /// Tell the model to give a percentage when asked for a score
    #[serde(default = "default_true")]
    pub score_directive: bool,

    /// Seeded assistant greeting; no greeting when unset
    #[serde(default = "default_greeting", skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,

    /// Heading that introduces the document text in the prompt
    #[serde(default = "default_context_heading")]
    pub context_heading: String,

    /// Uploads longer than this are rejected. 0 disables the check.
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,
}

fn default_true() -> bool {
    true
}
fn default_greeting() -> Option<String> {
    Some("Hi! Upload your resume and I'll calculate your odds of getting that internship.".into())
}
fn default_context_heading() -> String {
    "RESUME CONTENT".into()
}
fn default_max_document_chars() -> usize {
    1_000_000
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            persona: Persona::default(),
            document_guard: GuardMode::default(),
            require_grounding_disclaimer: true,
            score_directive: true,
            greeting: default_greeting(),
            context_heading: default_context_heading(),
            max_document_chars: default_max_document_chars(),
        }
    }
}

impl SessionSettings {
    /// The neutral deployment: professional persona, document required.
    pub fn neutral_preset() -> Self {
        Self {
            persona: Persona::Neutral,
            document_guard: GuardMode::Strict,
            ..Self::default()
        }
    }

    /// The skeptical deployment: grumpy persona, answers even without a document.
    pub fn skeptical_preset() -> Self {
        Self {
            persona: Persona::Skeptical,
            document_guard: GuardMode::Permissive,
            greeting: Some(
                "Upload your resume. I'll tell you whether it's actually good enough.".into(),
            ),
            ..Self::default()
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docchat/config.toml).
    ///
    /// Also checks environment variables, see [`apply_env_overrides`](Self::apply_env_overrides).
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
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

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// API key, only when the file has none:
    /// `DOCCHAT_API_KEY` > `GOOGLE_API_KEY` > `GEMINI_API_KEY` > `OPENAI_API_KEY`.
    /// Always: `DOCCHAT_PROVIDER`, `DOCCHAT_MODEL`, `DOCCHAT_PERSONA`, `DOCCHAT_GUARD`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.api_key.is_none() {
            self.api_key = lookup("DOCCHAT_API_KEY")
                .or_else(|| lookup("GOOGLE_API_KEY"))
                .or_else(|| lookup("GEMINI_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"))
                .filter(|k| !k.trim().is_empty());
        }

        if let Some(provider) = lookup("DOCCHAT_PROVIDER") {
            self.default_provider = provider;
        }

        if let Some(model) = lookup("DOCCHAT_MODEL") {
            self.default_model = model;
        }

        if let Some(persona) = lookup("DOCCHAT_PERSONA") {
            self.session.persona = persona.parse()?;
        }

        if let Some(guard) = lookup("DOCCHAT_GUARD") {
            self.session.document_guard = guard.parse()?;
        }

        self.validate()
    }

    /// Switch persona, guard and model to one of the shipped deployments.
    pub fn apply_preset(&mut self, preset: Preset) {
        let greeting_was_default = self.session.greeting == default_greeting();
        let mut settings = match preset {
            Preset::Neutral => SessionSettings::neutral_preset(),
            Preset::Skeptical => SessionSettings::skeptical_preset(),
        };
        settings.require_grounding_disclaimer = self.session.require_grounding_disclaimer;
        settings.score_directive = self.session.score_directive;
        settings.context_heading = self.session.context_heading.clone();
        settings.max_document_chars = self.session.max_document_chars;
        if !greeting_was_default {
            settings.greeting = self.session.greeting.clone();
        }
        self.session = settings;

        self.default_model = match preset {
            Preset::Neutral => "gemini-2.0-flash-lite".into(),
            Preset::Skeptical => "gemini-1.5-flash-8b".into(),
        };
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docchat")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.default_model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "default_model must not be empty".into(),
            ));
        }

        if self.default_max_tokens == Some(0) {
            return Err(ConfigError::ValidationError(
                "default_max_tokens must be > 0 when set".into(),
            ));
        }

        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be > 0 when set".into(),
            ));
        }

        Ok(())
    }

    /// The API key for a provider: its own entry first, then the global key.
    pub fn resolve_api_key(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
            .filter(|k| !k.trim().is_empty())
    }

    /// The model for the default provider: its own entry first, then `default_model`.
    pub fn resolve_model(&self) -> String {
        self.providers
            .get(&self.default_provider)
            .and_then(|p| p.default_model.clone())
            .unwrap_or_else(|| self.default_model.clone())
    }

    /// Use `key` for the default provider, ahead of any configured key.
    pub fn set_api_key(&mut self, key: impl Into<String>) {
        let entry = self
            .providers
            .entry(self.default_provider.clone())
            .or_insert_with(|| ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: None,
            });
        entry.api_key = Some(key.into());
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.resolve_api_key(&self.default_provider).is_some()
    }

    /// Generate a default config TOML string (for `onboard` command).
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
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: None,
            request_timeout_secs: None,
            session: SessionSettings::default(),
            providers: HashMap::new(),
        }
    }
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

impl From<ConfigError> for docchat_core::Error {
    fn from(err: ConfigError) -> Self {
        docchat_core::Error::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.default_model, "gemini-2.0-flash-lite");
        assert_eq!(config.session.persona, Persona::Neutral);
        assert_eq!(config.session.document_guard, GuardMode::Strict);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.default_provider, config.default_provider);
        assert_eq!(parsed.session.greeting, config.session.greeting);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let config = AppConfig {
            default_temperature: 5.0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.default_provider, "gemini");
    }

    #[test]
    fn load_session_settings_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
default_model = "gemini-1.5-flash-8b"

[session]
persona = "skeptical"
document_guard = "permissive"
score_directive = false
max_document_chars = 5000
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.default_model, "gemini-1.5-flash-8b");
        assert_eq!(config.session.persona, Persona::Skeptical);
        assert_eq!(config.session.document_guard, GuardMode::Permissive);
        assert!(!config.session.score_directive);
        assert!(config.session.require_grounding_disclaimer);
        assert_eq!(config.session.max_document_chars, 5000);
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[session]\npersona = \"cheerful\"").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_key_only_fills_missing_key() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[("GOOGLE_API_KEY", "g-key"), ("OPENAI_API_KEY", "o-key")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("g-key"));

        let mut config = AppConfig {
            api_key: Some("file-key".into()),
            ..AppConfig::default()
        };
        config
            .apply_env_overrides(env(&[("DOCCHAT_API_KEY", "env-key")]))
            .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn blank_env_key_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[("DOCCHAT_API_KEY", "  ")])).unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn env_overrides_persona_and_guard() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("DOCCHAT_PERSONA", "skeptical"),
                ("DOCCHAT_GUARD", "permissive"),
                ("DOCCHAT_MODEL", "gpt-4o-mini"),
            ]))
            .unwrap();
        assert_eq!(config.session.persona, Persona::Skeptical);
        assert_eq!(config.session.document_guard, GuardMode::Permissive);
        assert_eq!(config.default_model, "gpt-4o-mini");
    }

    #[test]
    fn bad_env_persona_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_overrides(env(&[("DOCCHAT_PERSONA", "cheerful")]))
            .unwrap_err();
        assert!(err.to_string().contains("cheerful"));
    }

    #[test]
    fn skeptical_preset_switches_guard_and_model() {
        let mut config = AppConfig::default();
        config.apply_preset(Preset::Skeptical);
        assert_eq!(config.session.persona, Persona::Skeptical);
        assert_eq!(config.session.document_guard, GuardMode::Permissive);
        assert_eq!(config.default_model, "gemini-1.5-flash-8b");
        assert_ne!(config.session.greeting, default_greeting());
    }

    #[test]
    fn preset_keeps_custom_greeting() {
        let mut config = AppConfig::default();
        config.session.greeting = Some("Welcome".into());
        config.apply_preset(Preset::Skeptical);
        assert_eq!(config.session.greeting.as_deref(), Some("Welcome"));
    }

    #[test]
    fn provider_key_takes_precedence() {
        let mut config = AppConfig {
            api_key: Some("global".into()),
            ..AppConfig::default()
        };
        config.providers.insert(
            "openrouter".into(),
            ProviderConfig {
                api_key: Some("router-key".into()),
                api_url: None,
                default_model: Some("meta-llama/llama-3.1-8b-instruct".into()),
            },
        );
        assert_eq!(config.resolve_api_key("openrouter").as_deref(), Some("router-key"));
        assert_eq!(config.resolve_api_key("gemini").as_deref(), Some("global"));

        config.default_provider = "openrouter".into();
        assert_eq!(config.resolve_model(), "meta-llama/llama-3.1-8b-instruct");
    }

    #[test]
    fn runtime_key_overrides_configured_key() {
        let mut config = AppConfig {
            api_key: Some("stale".into()),
            ..AppConfig::default()
        };
        config.set_api_key("typed-in");
        assert_eq!(config.resolve_api_key("gemini").as_deref(), Some("typed-in"));
        assert_eq!(config.resolve_model(), "gemini-2.0-flash-lite");
    }

    #[test]
    fn runtime_key_enables_generation() {
        let mut config = AppConfig::default();
        assert!(!config.has_api_key());
        config.set_api_key("AIza-typed");
        assert!(config.has_api_key());
    }

    #[test]
    fn debug_output_redacts_key() {
        let config = AppConfig {
            api_key: Some("super-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini"));
        assert!(toml_str.contains("persona = \"neutral\""));
    }

    #[test]
    fn config_error_converts_to_core_error() {
        let err: docchat_core::Error = ConfigError::ValidationError("bad".into()).into();
        assert!(matches!(err, docchat_core::Error::Config { .. }));
    }
}

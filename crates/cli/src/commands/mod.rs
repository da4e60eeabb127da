pub mod ask;
pub mod chat;
pub mod doctor;
pub mod extract;
pub mod onboard;
pub mod status;

use docchat_config::{AppConfig, Preset};
use docchat_session::{SessionConfig, SessionLoop};

/// Load config (file + environment), then apply `--preset` on top.
pub(crate) fn load_config(preset: Option<Preset>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    if let Some(preset) = preset {
        config.apply_preset(preset);
    }
    Ok(config)
}

/// One session wired to the configured provider (or none, when no key resolves).
pub(crate) fn build_session(config: &AppConfig) -> SessionLoop {
    let provider = docchat_providers::build_from_config(config);
    SessionLoop::new(SessionConfig::from_app_config(config), provider)
}

pub(crate) fn print_missing_key_help() {
    eprintln!();
    eprintln!("  No API key configured, so generation is disabled.");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    export GOOGLE_API_KEY='AIza...'    (Gemini, default)");
    eprintln!("    export OPENAI_API_KEY='sk-...'     (with default_provider = \"openai\")");
    eprintln!("    export DOCCHAT_API_KEY='...'       (any provider)");
    eprintln!();
    eprintln!("  Or add api_key to {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}

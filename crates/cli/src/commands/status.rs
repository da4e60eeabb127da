//! `docchat status`: Show the resolved configuration.

use docchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let session = &config.session;

    println!("docchat Status");
    println!("==============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Provider:     {}", config.default_provider);
    println!("  Model:        {}", config.resolve_model());
    println!("  Temperature:  {}", config.default_temperature);
    println!(
        "  API key:      {}",
        if config.has_api_key() { "configured" } else { "missing (generation disabled)" }
    );
    println!(
        "  Timeout:      {}",
        config
            .request_timeout_secs
            .map(|s| format!("{s}s"))
            .unwrap_or_else(|| "none".into())
    );
    println!("  Persona:      {:?}", session.persona);
    println!("  Guard:        {:?}", session.document_guard);
    println!("  Heading:      {}", session.context_heading);
    println!(
        "  Size limit:   {}",
        if session.max_document_chars == 0 {
            "none".to_string()
        } else {
            format!("{} characters", session.max_document_chars)
        }
    );

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file — run `docchat onboard` first");
    }

    Ok(())
}

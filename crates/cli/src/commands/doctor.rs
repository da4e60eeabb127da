//! `docchat doctor`: Diagnose configuration problems.

use docchat_config::AppConfig;
use docchat_core::Provider;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 docchat Doctor — Configuration Diagnostics");
    println!("=============================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — using defaults (run `docchat onboard`)");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  1 issue found. See above for details.");
            return Ok(());
        }
    };

    match docchat_providers::build_from_config(&config) {
        Some(provider) => {
            println!("  ✅ Provider ready: {}", provider.name());
            check_model(provider.as_ref(), &config.resolve_model(), &mut issues).await;
        }
        None => {
            println!("  ⚠️  No API key configured — generation is disabled");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}

/// Ask the provider for its model list; an empty list means "can't tell".
async fn check_model(provider: &dyn Provider, model: &str, issues: &mut usize) {
    match provider.list_models().await {
        Ok(models) if models.is_empty() => println!("  ➖ Model list unavailable; skipped"),
        Ok(models) if models.iter().any(|m| m == model) => println!("  ✅ Model available: {model}"),
        Ok(_) => {
            println!("  ❌ Model not offered by provider: {model}");
            *issues += 1;
        }
        Err(e) => {
            println!("  ❌ Provider check failed: {e}");
            *issues += 1;
        }
    }
}

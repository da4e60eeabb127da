//! `docchat ask`: One question about one document.

use std::path::PathBuf;

use docchat_config::Preset;
use docchat_session::CannedAction;

pub async fn run(
    document: PathBuf,
    action: Option<CannedAction>,
    message: Option<String>,
    preset: Option<Preset>,
    show_prompt: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(preset)?;
    let mut session = super::build_session(&config);

    if !session.generation_enabled() {
        super::print_missing_key_help();
        return Err("No API key found. See above for setup instructions.".into());
    }

    session.upload_file(&document).await?;

    let question = match (action, message) {
        (Some(action), _) => action.question().to_string(),
        (None, Some(message)) => message,
        (None, None) => return Err("Provide a question or --action".into()),
    };

    eprint!("  Analyzing...");
    let result = session.submit(&question).await;
    eprint!("\r              \r");

    if show_prompt {
        if let Some(prompt) = session.last_prompt() {
            eprintln!("{prompt}");
            eprintln!();
        }
    }

    println!("{}", result?);
    Ok(())
}

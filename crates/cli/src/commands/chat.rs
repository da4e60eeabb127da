//! `docchat chat`: Interactive document-grounded chat.

use std::io::Write;
use std::path::PathBuf;

use docchat_config::{AppConfig, Preset};
use docchat_core::message::Role;
use docchat_session::{CannedAction, SessionLoop};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::debug;

/// An API key typed at the prompt. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// One line of user input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Upload(PathBuf),
    Key(ApiKey),
    Action(CannedAction),
    History,
    Reset,
    Help,
    Exit,
    Message(String),
    Invalid(String),
}

impl ChatCommand {
    /// Interpret a line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
            return Some(Self::Exit);
        }

        let Some(rest) = line.strip_prefix('/') else {
            return Some(Self::Message(line.to_string()));
        };

        let (command, arg) = match rest.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (rest, ""),
        };

        Some(match command {
            "upload" if arg.is_empty() => Self::Invalid("Usage: /upload PATH".into()),
            "upload" => Self::Upload(PathBuf::from(arg)),
            "key" if arg.is_empty() => Self::Invalid("Usage: /key YOUR_API_KEY".into()),
            "key" => Self::Key(ApiKey(arg.to_string())),
            "history" => Self::History,
            "reset" => Self::Reset,
            "help" => Self::Help,
            other => match other.parse::<CannedAction>() {
                Ok(action) => Self::Action(action),
                Err(_) => Self::Invalid(format!("Unknown command '/{other}'. Type /help.")),
            },
        })
    }
}

pub async fn run(
    document: Option<PathBuf>,
    preset: Option<Preset>,
    show_prompt: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(preset)?;
    let mut session = super::build_session(&config);

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        docchat — Interactive Mode            ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:  {}", config.default_provider);
    println!("  Model:     {}", session.config().model);
    println!("  Persona:   {:?}", config.session.persona);
    println!("  Guard:     {:?}", config.session.document_guard);
    println!();
    println!("  Type a question, or /help for commands.");
    println!();

    if !session.generation_enabled() {
        super::print_missing_key_help();
        eprintln!("  Or type /key YOUR_API_KEY to use a key for this session only.");
        eprintln!();
    }

    for turn in session.transcript() {
        print_turn(turn.role(), turn.text());
    }

    if let Some(path) = document {
        upload(&mut session, path).await;
    }

    let stdin = io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    prompt()?;
    while let Some(line) = lines.next_line().await? {
        let Some(command) = ChatCommand::parse(&line) else {
            prompt()?;
            continue;
        };
        debug!(?command, "Chat command");

        match command {
            ChatCommand::Exit => break,
            ChatCommand::Help => print_help(),
            ChatCommand::Invalid(message) => eprintln!("  {message}"),
            ChatCommand::Upload(path) => upload(&mut session, path).await,
            ChatCommand::Key(key) => install_key(&mut session, &mut config, key),
            ChatCommand::History => print_history(&session),
            ChatCommand::Reset => {
                session.reset_transcript();
                println!("  Conversation cleared. The document is still loaded.");
            }
            ChatCommand::Action(action) => {
                println!("  You > {}", action.question());
                ask(&mut session, action.question(), show_prompt).await;
            }
            ChatCommand::Message(text) => ask(&mut session, &text, show_prompt).await,
        }

        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

async fn upload(session: &mut SessionLoop, path: PathBuf) {
    match session.upload_file(&path).await {
        Ok(doc) => println!(
            "  Analyzed {} ({} page(s), {} characters).",
            doc.name,
            doc.page_count,
            doc.char_count()
        ),
        Err(e) => eprintln!("  [Error] {e}"),
    }
}

/// Rebuild the provider around a typed key. The key lives only in memory.
fn install_key(session: &mut SessionLoop, config: &mut AppConfig, key: ApiKey) {
    config.set_api_key(key.0);
    match docchat_providers::build_from_config(config) {
        Some(provider) => {
            session.set_provider(provider);
            println!("  Key set for this session. Generation is enabled.");
        }
        None => eprintln!("  [Error] The key is blank."),
    }
}

async fn ask(session: &mut SessionLoop, text: &str, show_prompt: bool) {
    eprint!("  Analyzing...");
    let result = session.submit(text).await;
    eprint!("\r              \r");

    if show_prompt {
        if let Some(prompt) = session.last_prompt() {
            eprintln!("  ── prompt ──");
            eprintln!("{prompt}");
            eprintln!("  ────────────");
        }
    }

    match result {
        Ok(reply) => print_turn(Role::Assistant, &reply),
        Err(e) => eprintln!("  [Error] {e}"),
    }
}

fn print_turn(role: Role, text: &str) {
    let label = match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    };
    println!();
    for line in text.lines() {
        println!("  {label} > {line}");
    }
    println!();
}

fn print_history(session: &SessionLoop) {
    for turn in session.transcript() {
        println!("  [{}]", turn.timestamp().format("%H:%M:%S UTC"));
        print_turn(turn.role(), turn.text());
    }
}

fn print_help() {
    println!("  /upload PATH   Load a PDF or text document");
    println!("  /key KEY       Use an API key for this session");
    for action in CannedAction::ALL {
        println!("  /{:<13} {}", action.command(), action.label());
    }
    println!("  /history       Show the conversation");
    println!("  /reset         Clear the conversation (keeps the document)");
    println!("  /exit          Quit");
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_is_ignored() {
        assert_eq!(ChatCommand::parse("   "), None);
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            ChatCommand::parse("  Is my GPA too low? "),
            Some(ChatCommand::Message("Is my GPA too low?".into()))
        );
    }

    #[test]
    fn exit_words() {
        for word in ["exit", "quit", "/exit", "/quit", ":q"] {
            assert_eq!(ChatCommand::parse(word), Some(ChatCommand::Exit));
        }
    }

    #[test]
    fn upload_takes_a_path() {
        assert_eq!(
            ChatCommand::parse("/upload ~/cv final.pdf"),
            Some(ChatCommand::Upload(PathBuf::from("~/cv final.pdf")))
        );
        assert!(matches!(ChatCommand::parse("/upload"), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn key_is_parsed_and_never_shown() {
        let command = ChatCommand::parse("/key AIza-secret-123").unwrap();
        assert_eq!(command, ChatCommand::Key(ApiKey("AIza-secret-123".into())));
        assert!(!format!("{command:?}").contains("AIza-secret-123"));
        assert!(matches!(ChatCommand::parse("/key  "), Some(ChatCommand::Invalid(_))));
    }

    #[test]
    fn typed_key_enables_a_keyless_session() {
        let mut config = AppConfig::default();
        let mut session = super::super::build_session(&config);
        assert!(!session.generation_enabled());

        install_key(&mut session, &mut config, ApiKey("AIza-typed".into()));
        assert!(session.generation_enabled());
        assert_eq!(config.resolve_api_key("gemini").as_deref(), Some("AIza-typed"));
    }

    #[test]
    fn canned_actions() {
        assert_eq!(
            ChatCommand::parse("/roast"),
            Some(ChatCommand::Action(CannedAction::Roast))
        );
        assert_eq!(
            ChatCommand::parse("/score"),
            Some(ChatCommand::Action(CannedAction::Score))
        );
        assert_eq!(
            ChatCommand::parse("/improve"),
            Some(ChatCommand::Action(CannedAction::KeyImprovements))
        );
    }

    #[test]
    fn unknown_slash_command() {
        assert!(matches!(ChatCommand::parse("/dance"), Some(ChatCommand::Invalid(_))));
    }
}

//! End-to-end tests for document-grounded chat.
//!
//! These exercise the full path from uploaded bytes to transcript: PDF
//! extraction, prompt assembly, the guard, and provider failures.

use std::sync::{Arc, Mutex};

use docchat_config::{AppConfig, GuardMode, Preset, SessionSettings};
use docchat_core::document::DocumentKind;
use docchat_core::error::{Error, ExtractionError, ProviderError};
use docchat_core::message::Role;
use docchat_core::provider::{GenerationRequest, GenerationResponse, Provider};
use docchat_documents::pdf::fixtures::text_pdf;
use docchat_session::{CannedAction, PromptAssembler, PromptConfig, SessionConfig, SessionLoop, SessionState};

// ── Mock Provider ────────────────────────────────────────────────────────

/// Answers from a script in order and remembers every request.
struct ScriptedProvider {
    replies: Mutex<Vec<Result<String, ProviderError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn text(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn prompts(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.prompt.clone()).collect()
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            panic!("ScriptedProvider exhausted");
        }
        replies.remove(0).map(|text| GenerationResponse {
            text,
            model,
            usage: None,
        })
    }
}

fn session_with(settings: SessionSettings, provider: Arc<ScriptedProvider>) -> SessionLoop {
    SessionLoop::new(SessionConfig::new("gemini-2.0-flash-lite", settings), Some(provider))
}

fn upload_resume(session: &mut SessionLoop) {
    let bytes = text_pdf(&["Jane Doe", "Skills: Rust"]).unwrap();
    session.upload(&bytes, DocumentKind::Pdf, "resume.pdf").unwrap();
}

// ── Transcript shape ─────────────────────────────────────────────────────

#[tokio::test]
async fn n_successful_turns_give_2n_alternating_entries_after_greeting() {
    let provider = ScriptedProvider::text(&["one", "two", "three", "four"]);
    let mut session = session_with(SessionSettings::neutral_preset(), provider);
    upload_resume(&mut session);

    for q in ["a", "b", "c", "d"] {
        session.submit(q).await.unwrap();
    }

    let turns = session.transcript().all();
    assert_eq!(turns.len(), 1 + 8);
    assert_eq!(turns[0].role(), Role::Assistant);
    for (i, turn) in turns[1..].iter().enumerate() {
        let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
        assert_eq!(turn.role(), expected, "turn {i}");
    }
}

// ── Assembler purity ─────────────────────────────────────────────────────

#[tokio::test]
async fn changing_only_the_question_changes_only_the_question_segment() {
    let provider = ScriptedProvider::text(&["ok"]);
    let mut session = session_with(SessionSettings::neutral_preset(), provider);
    upload_resume(&mut session);
    session.submit("warm-up").await.unwrap();

    let assembler = PromptAssembler::new(PromptConfig::from(&session.config().settings));
    let doc = &session.document().unwrap().text;
    let history = session.transcript().all();

    let a = assembler.build(doc, &history, "What is my score?");
    let b = assembler.build(doc, &history, "What is my score?");
    let c = assembler.build(doc, &history, "Roast me");

    assert_eq!(a.render(), b.render());
    assert_eq!((&a.persona, &a.context, &a.history, &a.instructions), (&c.persona, &c.context, &c.history, &c.instructions));
    assert_ne!(a.question, c.question);
}

// ── Extraction ───────────────────────────────────────────────────────────

#[test]
fn empty_pdf_fails_and_leaves_document_unset() {
    let mut session = session_with(SessionSettings::neutral_preset(), ScriptedProvider::text(&[]));

    let err = session.upload(&[], DocumentKind::Pdf, "empty.pdf").unwrap_err();
    assert!(matches!(err, Error::Extraction(ExtractionError::Empty)));
    assert!(session.document().is_none());
}

#[test]
fn multi_page_pdf_is_concatenated_in_order() {
    let bytes = text_pdf(&["Hello", "World"]).unwrap();
    assert_eq!(
        docchat_documents::extract(&bytes, DocumentKind::Pdf).unwrap(),
        "HelloWorld"
    );
}

// ── Failure handling ─────────────────────────────────────────────────────

#[tokio::test]
async fn transport_failure_leaves_user_turn_and_returns_to_awaiting_input() {
    let provider = ScriptedProvider::new(vec![
        Err(ProviderError::status(429, "quota exceeded")),
        Ok("Recovered.".into()),
    ]);
    let mut session = session_with(SessionSettings::neutral_preset(), provider);
    upload_resume(&mut session);
    let before = session.transcript().len();

    let err = session.run_action(CannedAction::Roast).await.unwrap_err();
    assert!(matches!(err, Error::Provider(ProviderError::Transport { .. })));
    assert_eq!(session.state(), SessionState::AwaitingInput);

    let turns = session.transcript().all();
    assert_eq!(turns.len(), before + 1);
    assert_eq!(turns.last().unwrap().role(), Role::User);

    // The session stays usable.
    assert_eq!(session.submit("again").await.unwrap(), "Recovered.");
}

#[tokio::test]
async fn auth_and_model_errors_are_distinguishable() {
    let provider = ScriptedProvider::new(vec![
        Err(ProviderError::AuthenticationFailed("bad key".into())),
        Err(ProviderError::ModelUnavailable("gemini-9".into())),
    ]);
    let mut session = session_with(SessionSettings::neutral_preset(), provider);
    upload_resume(&mut session);

    let first = session.submit("q1").await.unwrap_err();
    let second = session.submit("q2").await.unwrap_err();
    assert!(matches!(first, Error::Provider(ProviderError::AuthenticationFailed(_))));
    assert!(matches!(second, Error::Provider(ProviderError::ModelUnavailable(_))));
}

// ── Guard ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn strict_guard_rejects_canned_actions_without_document() {
    let provider = ScriptedProvider::text(&[]);
    let mut session = session_with(SessionSettings::neutral_preset(), provider.clone());
    let before = session.transcript().all();

    for action in CannedAction::ALL {
        let err = session.run_action(action).await.unwrap_err();
        assert!(matches!(err, Error::GuardRejected(_)));
    }

    assert_eq!(session.transcript().all(), before);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn permissive_guard_proceeds_with_absent_context() {
    let provider = ScriptedProvider::text(&["Without a resume? No."]);
    let mut session = session_with(SessionSettings::skeptical_preset(), provider.clone());

    session.run_action(CannedAction::KeyImprovements).await.unwrap();

    let prompt = &provider.prompts()[0];
    assert!(!prompt.contains("RESUME CONTENT"));
    assert!(prompt.starts_with("You are a grumpy, skeptical"));
}

// ── Canned actions ───────────────────────────────────────────────────────

#[tokio::test]
async fn score_action_shares_scaffolding_with_free_text() {
    let provider = ScriptedProvider::text(&["Pass Probability: 85%", "Pass Probability: 85%"]);

    let mut by_action = session_with(SessionSettings::neutral_preset(), provider.clone());
    upload_resume(&mut by_action);
    let reply = by_action.run_action(CannedAction::Score).await.unwrap();
    assert!(reply.contains("85%"));

    let mut by_text = session_with(SessionSettings::neutral_preset(), provider.clone());
    upload_resume(&mut by_text);
    by_text
        .submit("Rate this resume out of 100 based on internship standards and explain the score.")
        .await
        .unwrap();

    let prompts = provider.prompts();
    assert_eq!(prompts[0], prompts[1]);
    assert!(prompts[0].contains("Pass Probability"));
}

// ── Configuration wiring ─────────────────────────────────────────────────

#[test]
fn presets_configure_guard_and_model() {
    let mut config = AppConfig::default();
    config.apply_preset(Preset::Skeptical);
    let session_config = SessionConfig::from_app_config(&config);

    assert_eq!(session_config.model, "gemini-1.5-flash-8b");
    assert_eq!(session_config.settings.document_guard, GuardMode::Permissive);
}

#[tokio::test]
async fn no_key_means_generation_disabled() {
    let config = AppConfig::default();
    let provider = docchat_providers::build_from_config(&config);
    let mut session = SessionLoop::new(SessionConfig::from_app_config(&config), provider);
    upload_resume(&mut session);

    let err = session.submit("hello").await.unwrap_err();
    assert!(matches!(err, Error::GenerationDisabled));
    assert_eq!(session.transcript().len(), 1);
}

#[tokio::test]
async fn key_typed_at_runtime_enables_a_keyless_session() {
    let mut config = AppConfig::default();
    let mut session = SessionLoop::new(
        SessionConfig::from_app_config(&config),
        docchat_providers::build_from_config(&config),
    );
    upload_resume(&mut session);
    assert!(matches!(session.submit("hello").await, Err(Error::GenerationDisabled)));

    config.set_api_key("AIza-typed-at-runtime");
    let gemini = docchat_providers::build_from_config(&config).expect("key resolves");
    assert_eq!(gemini.name(), "gemini");

    // Stand in for the network-backed provider the CLI would install.
    let provider = ScriptedProvider::text(&["Looks solid."]);
    session.set_provider(provider.clone());

    let reply = session.submit("hello").await.unwrap();
    assert_eq!(reply, "Looks solid.");
    assert_eq!(provider.calls(), 1);
    assert_eq!(session.transcript().len(), 3);
}

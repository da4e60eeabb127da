//! The session state machine.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use docchat_config::{AppConfig, GuardMode, SessionSettings};
use docchat_core::document::{DocumentKind, LoadedDocument};
use docchat_core::event::{DomainEvent, EventBus};
use docchat_core::message::{Role, Transcript, Turn};
use docchat_core::provider::{GenerationRequest, Provider};
use docchat_core::{Error, Result};
use tracing::{debug, info, warn};

use crate::actions::CannedAction;
use crate::assembler::{PromptAssembler, PromptConfig};

/// Shown when an action arrives before any document under the strict guard.
pub const GUARD_MESSAGE: &str = "Please upload a document first!";

/// Where a session is in its lifecycle. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    DocumentLoaded,
    AwaitingInput,
    Processing,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::DocumentLoaded => "document_loaded",
            Self::AwaitingInput => "awaiting_input",
            Self::Processing => "processing",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-session parameters, fixed for the session's lifetime.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub settings: SessionSettings,
}

impl SessionConfig {
    pub fn new(model: impl Into<String>, settings: SessionSettings) -> Self {
        Self {
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            settings,
        }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            model: config.resolve_model(),
            temperature: config.default_temperature,
            max_tokens: config.default_max_tokens,
            settings: config.session.clone(),
        }
    }
}

/// One user's chat session over one (replaceable) document.
///
/// Owns its transcript and document outright; nothing is shared with other
/// sessions except the stateless provider.
pub struct SessionLoop {
    id: String,
    config: SessionConfig,
    assembler: PromptAssembler,
    provider: Option<Arc<dyn Provider>>,
    event_bus: Arc<EventBus>,
    transcript: Transcript,
    document: Option<LoadedDocument>,
    state: SessionState,
    last_prompt: Option<String>,
}

impl SessionLoop {
    /// Create a session. `provider` is `None` when no credential is
    /// configured; every generation then fails with `GenerationDisabled`
    /// until [`set_provider`](Self::set_provider) is called.
    pub fn new(config: SessionConfig, provider: Option<Arc<dyn Provider>>) -> Self {
        let transcript = match config.settings.greeting.as_deref() {
            Some(greeting) if !greeting.trim().is_empty() => Transcript::with_greeting(greeting),
            _ => Transcript::new(),
        };

        Self {
            id: uuid::Uuid::new_v4().to_string(),
            assembler: PromptAssembler::new(PromptConfig::from(&config.settings)),
            config,
            provider,
            event_bus: Arc::new(EventBus::default()),
            transcript,
            document: None,
            state: SessionState::Idle,
            last_prompt: None,
        }
    }

    /// Publish domain events on a shared bus.
    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn document(&self) -> Option<&LoadedDocument> {
        self.document.as_ref()
    }

    /// The prompt most recently sent to the provider.
    pub fn last_prompt(&self) -> Option<&str> {
        self.last_prompt.as_deref()
    }

    pub fn generation_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Install or replace the provider, e.g. once the user supplies a key.
    /// Transcript, document and state are kept.
    pub fn set_provider(&mut self, provider: Arc<dyn Provider>) {
        info!(session = %self.id, provider = provider.name(), "Provider installed");
        self.provider = Some(provider);
    }

    /// Extract `bytes` and install the result as the session's document.
    ///
    /// On failure the previous document (if any) and the state are untouched.
    pub fn upload(&mut self, bytes: &[u8], kind: DocumentKind, name: &str) -> Result<&LoadedDocument> {
        let (text, page_count) = match docchat_documents::extract_with_pages(bytes, kind) {
            Ok(extracted) => extracted,
            Err(e) => {
                self.reject_document(&e.to_string());
                return Err(e.into());
            }
        };
        self.load_document(LoadedDocument::new(name, kind, text, page_count))
    }

    /// Read a file from disk and install it as the session's document.
    pub async fn upload_file(&mut self, path: &Path) -> Result<&LoadedDocument> {
        match docchat_documents::load_file(path).await {
            Ok(doc) => self.load_document(doc),
            Err(e) => {
                self.reject_document(&e.to_string());
                Err(e.into())
            }
        }
    }

    /// Install an already-extracted document, replacing any previous one.
    pub fn load_document(&mut self, doc: LoadedDocument) -> Result<&LoadedDocument> {
        let limit = self.config.settings.max_document_chars;
        let chars = doc.char_count();
        if limit > 0 && chars > limit {
            let err = Error::DocumentTooLarge { chars, limit };
            self.reject_document(&err.to_string());
            return Err(err);
        }

        info!(session = %self.id, document = %doc.name, pages = doc.page_count, chars, "Document loaded");
        self.event_bus.publish(DomainEvent::DocumentLoaded {
            session_id: self.id.clone(),
            name: doc.name.clone(),
            page_count: doc.page_count,
            chars,
            timestamp: Utc::now(),
        });

        self.set_state(SessionState::DocumentLoaded);
        Ok(&*self.document.insert(doc))
    }

    /// Ask a free-text question. Returns the assistant's reply.
    pub async fn submit(&mut self, text: &str) -> Result<String> {
        let Some(provider) = self.provider.clone() else {
            return Err(Error::GenerationDisabled);
        };

        if self.document.is_none() && self.config.settings.document_guard == GuardMode::Strict {
            debug!(session = %self.id, "Rejected: no document loaded");
            self.event_bus.publish(DomainEvent::GuardRejected {
                session_id: self.id.clone(),
                timestamp: Utc::now(),
            });
            return Err(Error::GuardRejected(GUARD_MESSAGE.into()));
        }

        if text.trim().is_empty() {
            return Err(Error::EmptyInput);
        }

        let document_text = self.document.as_ref().map(|d| d.text.as_str()).unwrap_or("");
        let prompt = self
            .assembler
            .build(document_text, &self.transcript.all(), text)
            .render();

        self.append(Turn::user(text));
        self.set_state(SessionState::Processing);
        self.last_prompt = Some(prompt.clone());

        let mut request = GenerationRequest::new(&self.config.model, prompt);
        request.temperature = self.config.temperature;
        request.max_tokens = self.config.max_tokens;

        debug!(session = %self.id, provider = provider.name(), model = %self.config.model, "Requesting generation");

        match provider.generate(request).await {
            Ok(response) => {
                info!(
                    session = %self.id,
                    model = %response.model,
                    tokens = response.usage.map(|u| u.total_tokens),
                    "Response generated"
                );
                self.event_bus.publish(DomainEvent::ResponseGenerated {
                    session_id: self.id.clone(),
                    model: response.model.clone(),
                    tokens_used: response.usage.map(|u| u.total_tokens),
                    timestamp: Utc::now(),
                });
                self.append(Turn::assistant(response.text.clone()));
                self.set_state(SessionState::AwaitingInput);
                Ok(response.text)
            }
            Err(e) => {
                warn!(session = %self.id, error = %e, "Generation failed");
                self.event_bus.publish(DomainEvent::GenerationFailed {
                    session_id: self.id.clone(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                self.set_state(SessionState::AwaitingInput);
                Err(e.into())
            }
        }
    }

    /// Run a canned action; identical to submitting its question.
    pub async fn run_action(&mut self, action: CannedAction) -> Result<String> {
        self.submit(action.question()).await
    }

    /// Clear the conversation back to the greeting. The document is kept.
    pub fn reset_transcript(&mut self) {
        self.transcript.reset();
        self.last_prompt = None;
        let next = if self.document.is_some() {
            SessionState::DocumentLoaded
        } else {
            SessionState::Idle
        };
        self.set_state(next);
    }

    fn append(&mut self, turn: Turn) {
        let role: Role = turn.role();
        self.transcript.append(turn);
        self.event_bus.publish(DomainEvent::TurnAppended {
            session_id: self.id.clone(),
            role,
            index: self.transcript.len() - 1,
            timestamp: Utc::now(),
        });
    }

    fn reject_document(&self, reason: &str) {
        warn!(session = %self.id, reason, "Document rejected");
        self.event_bus.publish(DomainEvent::DocumentRejected {
            session_id: self.id.clone(),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn set_state(&mut self, next: SessionState) {
        if self.state == next {
            return;
        }
        debug!(session = %self.id, from = %self.state, to = %next, "State changed");
        self.event_bus.publish(DomainEvent::StateChanged {
            session_id: self.id.clone(),
            from: self.state.to_string(),
            to: next.to_string(),
            timestamp: Utc::now(),
        });
        self.state = next;
    }
}

//! The document-grounded chat session: the heart of docchat.
//!
//! Each user turn follows one fixed path:
//!
//! 1. **Guard**: generation must be enabled and, under the strict guard, a
//!    document must be loaded
//! 2. **Assemble** a prompt from the document, the transcript so far, and
//!    the question
//! 3. **Append** the user turn
//! 4. **Generate** via the configured provider
//! 5. **Append** the reply, or leave the user turn unanswered on failure
//!
//! Canned actions take exactly the same path as free text.

pub mod actions;
pub mod assembler;
pub mod loop_runner;

pub use actions::CannedAction;
pub use assembler::{AssembledPrompt, PromptAssembler, PromptConfig};
pub use loop_runner::{GUARD_MESSAGE, SessionConfig, SessionLoop, SessionState};

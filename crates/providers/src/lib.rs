//! Text-generation provider implementations for docchat.
//!
//! All providers implement the `docchat_core::Provider` trait.
//! [`router::build_from_config`] picks the right one from configuration.

pub mod gemini;
pub mod openai_compat;
pub mod router;

pub use gemini::GeminiProvider;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;

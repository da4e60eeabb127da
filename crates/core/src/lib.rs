//! # docchat Core
//!
//! Domain types, traits, and error definitions for the docchat
//! document-grounded chat engine. This crate has **no framework
//! dependencies**; it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait or a plain value here:
//! - the hosted text-generation backend is the [`Provider`] trait
//! - an uploaded document is a [`LoadedDocument`]
//! - a chat history is a [`Transcript`] of immutable [`Turn`]s
//!
//! Implementations live in their respective crates, so tests can swap in
//! scripted providers without touching the network.

pub mod document;
pub mod error;
pub mod event;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use document::{DocumentKind, LoadedDocument};
pub use error::{Error, ExtractionError, ProviderError, Result};
pub use event::{DomainEvent, EventBus};
pub use message::{Role, Transcript, Turn};
pub use provider::{GenerationRequest, GenerationResponse, Provider, Usage};

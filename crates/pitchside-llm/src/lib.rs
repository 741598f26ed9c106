//! OpenAI-compatible chat-completions client.
//!
//! [`LlmClient`] sends a system + user message pair to
//! `POST {base_url}/chat/completions` and returns the first choice's text.
//! Transient failures are retried with back-off, and the underlying HTTP
//! client is rebuilt before every retry so a wedged connection pool is
//! never reused.

pub mod client;
pub mod error;
pub(crate) mod retry;
pub mod types;

pub use client::{LlmClient, LlmSettings};
pub use error::LlmError;
pub use types::ChatMessage;

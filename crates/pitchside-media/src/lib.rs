//! Clients for article images: Gemini image generation and Supabase Storage.

pub mod error;
mod http;
pub mod image;
pub(crate) mod retry;
pub mod storage;

pub use error::MediaError;
pub use image::{GeneratedImage, ImageClient, ImageSettings};
pub use storage::{StorageClient, StorageSettings};

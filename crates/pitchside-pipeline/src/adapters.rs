//! Seam implementations for the HTTP clients.

use async_trait::async_trait;
use pitchside_llm::LlmClient;
use pitchside_media::{GeneratedImage, ImageClient, StorageClient};

use crate::error::PipelineError;
use crate::traits::{ImageGenerator, ImageStore, TextCompletion};

#[async_trait]
impl TextCompletion for LlmClient {
    async fn complete(&self, system: Option<&str>, prompt: &str) -> Result<String, PipelineError> {
        Ok(LlmClient::complete(self, system, prompt).await?)
    }
}

#[async_trait]
impl ImageGenerator for ImageClient {
    async fn generate(&self, prompt: &str) -> Result<Option<GeneratedImage>, PipelineError> {
        Ok(ImageClient::generate(self, prompt).await?)
    }
}

#[async_trait]
impl ImageStore for StorageClient {
    async fn exists(&self, path: &str) -> Result<bool, PipelineError> {
        Ok(StorageClient::exists(self, path).await?)
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, PipelineError> {
        Ok(StorageClient::upload(self, path, bytes, content_type).await?)
    }
}

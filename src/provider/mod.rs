use async_trait::async_trait;
use std::sync::Arc;

use crate::cli::ProviderKind;
use crate::config::Config;
use crate::errors::ProviderError;
use crate::model::MediaRef;
use crate::wire::{ImageRequest, SpeechRequest, TextRequest, TextResponse, VideoJob, VideoRequest, VideoStatus};

pub mod gemini;
pub mod offline;
#[cfg(test)]
pub mod scripted;

/// The generative-AI capability set every screen depends on.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Text, structured JSON, chat, transcription and (with `grounding`) search-grounded answers.
    async fn generate_text(&self, req: &TextRequest) -> Result<TextResponse, ProviderError>;

    async fn generate_image(&self, req: &ImageRequest) -> Result<MediaRef, ProviderError>;

    async fn submit_video(&self, req: &VideoRequest) -> Result<VideoJob, ProviderError>;

    async fn poll_video(&self, job: &VideoJob) -> Result<VideoStatus, ProviderError>;

    /// Download a finished job's result.
    async fn fetch_media(&self, uri: &str, mime: &str) -> Result<MediaRef, ProviderError>;

    async fn generate_speech(&self, req: &SpeechRequest) -> Result<MediaRef, ProviderError>;
}

pub type DynProvider = Arc<dyn Provider>;

pub fn make_provider(kind: ProviderKind, cfg: &Config) -> anyhow::Result<DynProvider> {
    match kind {
        ProviderKind::Gemini => {
            if !cfg.has_credentials() {
                tracing::warn!("no API key configured; every generation will fall back to mock data");
            }
            Ok(Arc::new(gemini::GeminiProvider::new(cfg)?))
        }
        ProviderKind::Offline => Ok(Arc::new(offline::OfflineProvider)),
    }
}

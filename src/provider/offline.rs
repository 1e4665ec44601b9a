use async_trait::async_trait;

use super::Provider;
use crate::errors::ProviderError;
use crate::model::MediaRef;
use crate::wire::{ImageRequest, SpeechRequest, TextRequest, TextResponse, VideoJob, VideoRequest, VideoStatus};

/// Reports every capability as unavailable so each screen runs on its mock data.
pub struct OfflineProvider;

#[async_trait]
impl Provider for OfflineProvider {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn generate_text(&self, _req: &TextRequest) -> Result<TextResponse, ProviderError> {
        Err(ProviderError::Offline)
    }

    async fn generate_image(&self, _req: &ImageRequest) -> Result<MediaRef, ProviderError> {
        Err(ProviderError::Offline)
    }

    async fn submit_video(&self, _req: &VideoRequest) -> Result<VideoJob, ProviderError> {
        Err(ProviderError::Offline)
    }

    async fn poll_video(&self, _job: &VideoJob) -> Result<VideoStatus, ProviderError> {
        Err(ProviderError::Offline)
    }

    async fn fetch_media(&self, _uri: &str, _mime: &str) -> Result<MediaRef, ProviderError> {
        Err(ProviderError::Offline)
    }

    async fn generate_speech(&self, _req: &SpeechRequest) -> Result<MediaRef, ProviderError> {
        Err(ProviderError::Offline)
    }
}

//! In-memory provider for tests: each capability replays a queue of canned
//! results and records the requests it saw.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use super::Provider;
use crate::errors::ProviderError;
use crate::model::MediaRef;
use crate::wire::{ImageRequest, SpeechRequest, TextRequest, TextResponse, VideoJob, VideoRequest, VideoStatus};

type Queue<T> = Mutex<VecDeque<Result<T, ProviderError>>>;

#[derive(Default)]
pub struct ScriptedProvider {
    pub text: Queue<TextResponse>,
    pub image: Queue<MediaRef>,
    pub submit: Queue<VideoJob>,
    pub poll: Queue<VideoStatus>,
    pub fetch: Queue<MediaRef>,
    pub speech: Queue<MediaRef>,

    pub text_calls: Mutex<Vec<TextRequest>>,
    pub image_calls: Mutex<Vec<ImageRequest>>,
    pub poll_calls: Mutex<usize>,
    pub speech_calls: Mutex<Vec<SpeechRequest>>,
}

/// An empty queue answers like a provider with no key.
fn next<T>(q: &Queue<T>) -> Result<T, ProviderError> {
    q.lock().pop_front().unwrap_or(Err(ProviderError::MissingCredentials))
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_text(&self, text: &str) {
        self.text.lock().push_back(Ok(TextResponse { text: text.into(), citations: vec![] }));
    }

    pub fn push_text_with_links(&self, text: &str, links: &[&str]) {
        self.text.lock().push_back(Ok(TextResponse {
            text: text.into(),
            citations: links.iter().map(|s| s.to_string()).collect(),
        }));
    }

    pub fn push_text_err(&self, err: ProviderError) {
        self.text.lock().push_back(Err(err));
    }

    pub fn push_image(&self, uri: &str) {
        self.image.lock().push_back(Ok(MediaRef::Remote { uri: uri.into() }));
    }

    pub fn push_image_err(&self, err: ProviderError) {
        self.image.lock().push_back(Err(err));
    }

    pub fn image_count(&self) -> usize {
        self.image_calls.lock().len()
    }

    pub fn text_count(&self) -> usize {
        self.text_calls.lock().len()
    }

    pub fn poll_count(&self) -> usize {
        *self.poll_calls.lock()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn generate_text(&self, req: &TextRequest) -> Result<TextResponse, ProviderError> {
        self.text_calls.lock().push(req.clone());
        next(&self.text)
    }

    async fn generate_image(&self, req: &ImageRequest) -> Result<MediaRef, ProviderError> {
        self.image_calls.lock().push(req.clone());
        next(&self.image)
    }

    async fn submit_video(&self, _req: &VideoRequest) -> Result<VideoJob, ProviderError> {
        next(&self.submit)
    }

    async fn poll_video(&self, _job: &VideoJob) -> Result<VideoStatus, ProviderError> {
        *self.poll_calls.lock() += 1;
        next(&self.poll)
    }

    async fn fetch_media(&self, _uri: &str, _mime: &str) -> Result<MediaRef, ProviderError> {
        next(&self.fetch)
    }

    async fn generate_speech(&self, req: &SpeechRequest) -> Result<MediaRef, ProviderError> {
        self.speech_calls.lock().push(req.clone());
        next(&self.speech)
    }
}

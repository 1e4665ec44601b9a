//! Media rendering: one call per artifact, no caching.
//!
//! Video generation is a long-running job. [`await_video`] polls it at a
//! fixed interval until it reports completion, the attempt budget runs out,
//! or the screen's [`CancellationToken`] fires.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::errors::{Outcome, ProviderError};
use crate::model::MediaRef;
use crate::provider::{DynProvider, Provider};
use crate::wire::{AspectRatio, ImageRequest, Resolution, SeedImage, SpeechRequest, VideoJob, VideoRequest};

/// How a video job is waited on.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl PollPolicy {
    pub fn from_config(cfg: &Config) -> Self {
        Self { interval: cfg.poll_interval(), max_polls: cfg.video_max_polls.max(1) }
    }
}

/// Poll `job` until done. "Not done" is a suspended state, not an error.
///
/// Returns the result URI, `TimedOut` once `max_polls` polls all reported
/// not-done, or `Cancelled` as soon as `cancel` fires.
pub async fn await_video(
    provider: &dyn Provider,
    job: &VideoJob,
    policy: PollPolicy,
    cancel: &CancellationToken,
) -> Outcome<String> {
    let mut attempts = 0u32;
    loop {
        let polled = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(job = %job.name, attempts, "video poll cancelled");
                return Outcome::Cancelled;
            }
            r = provider.poll_video(job) => r,
        };
        attempts += 1;

        match polled {
            Ok(status) if status.done => {
                return match status.result_uri {
                    Some(uri) => {
                        tracing::info!(job = %job.name, attempts, "video job finished");
                        Outcome::Success(uri)
                    }
                    None => Outcome::from_provider(
                        Err(ProviderError::Empty(format!("{} finished without a video", job.name))),
                        "poll_video",
                    ),
                };
            }
            Ok(_) => {
                tracing::debug!(job = %job.name, attempts, "video job still running");
            }
            Err(e) => return Outcome::from_provider(Err(e), "poll_video"),
        }

        if attempts >= policy.max_polls {
            tracing::warn!(job = %job.name, attempts, "video job exceeded poll budget");
            return Outcome::TimedOut { attempts };
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(job = %job.name, attempts, "video poll cancelled");
                return Outcome::Cancelled;
            }
            _ = tokio::time::sleep(policy.interval) => {}
        }
    }
}

/// Format-specific rendering over the injected provider.
#[derive(Clone)]
pub struct Renderer {
    provider: DynProvider,
    image_model: String,
    video_model: String,
    tts_model: String,
    voice: String,
    aspect: AspectRatio,
    resolution: Resolution,
    poll: PollPolicy,
}

impl Renderer {
    pub fn new(provider: DynProvider, cfg: &Config) -> Self {
        Self {
            provider,
            image_model: cfg.models.image.clone(),
            video_model: cfg.models.video.clone(),
            tts_model: cfg.models.tts.clone(),
            voice: cfg.voice.clone(),
            aspect: cfg.aspect_ratio,
            resolution: cfg.image_resolution,
            poll: PollPolicy::from_config(cfg),
        }
    }

    #[cfg(test)]
    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Configured framing for campaign renders.
    pub fn aspect(&self) -> AspectRatio {
        self.aspect
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub async fn image(&self, prompt: &str, aspect: AspectRatio, resolution: Resolution) -> Outcome<MediaRef> {
        let req = ImageRequest {
            model: self.image_model.clone(),
            prompt: prompt.to_string(),
            aspect,
            resolution,
        };
        Outcome::from_provider(self.provider.generate_image(&req).await, "generate_image")
    }

    pub async fn video(
        &self,
        prompt: &str,
        seed_image: Option<SeedImage>,
        aspect: AspectRatio,
        cancel: &CancellationToken,
    ) -> Outcome<MediaRef> {
        let req = VideoRequest {
            model: self.video_model.clone(),
            prompt: prompt.to_string(),
            seed_image,
            aspect,
        };
        let job = match self.provider.submit_video(&req).await {
            Ok(job) => job,
            Err(e) => return Outcome::from_provider(Err(e), "submit_video"),
        };
        let uri = match await_video(self.provider.as_ref(), &job, self.poll, cancel).await {
            Outcome::Success(uri) => uri,
            Outcome::Unavailable(r) => return Outcome::Unavailable(r),
            Outcome::Failed(r) => return Outcome::Failed(r),
            Outcome::TimedOut { attempts } => return Outcome::TimedOut { attempts },
            Outcome::Cancelled => return Outcome::Cancelled,
        };
        Outcome::from_provider(self.provider.fetch_media(&uri, "video/mp4").await, "fetch_media")
    }

    pub async fn audio(&self, text: &str) -> Outcome<MediaRef> {
        let req = SpeechRequest {
            model: self.tts_model.clone(),
            text: text.to_string(),
            voice: self.voice.clone(),
        };
        Outcome::from_provider(self.provider.generate_speech(&req).await, "generate_speech")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::scripted::ScriptedProvider;
    use crate::wire::VideoStatus;
    use assert_matches::assert_matches;
    use bytes::Bytes;

    fn fast(max_polls: u32) -> PollPolicy {
        PollPolicy { interval: Duration::from_millis(1), max_polls }
    }

    fn job() -> VideoJob {
        VideoJob { name: "operations/v1".into() }
    }

    fn running() -> Result<VideoStatus, ProviderError> {
        Ok(VideoStatus { done: false, result_uri: None })
    }

    #[tokio::test]
    async fn polls_n_plus_one_times_then_returns_uri() {
        let p = ScriptedProvider::new();
        for _ in 0..4 {
            p.poll.lock().push_back(running());
        }
        p.poll.lock().push_back(Ok(VideoStatus { done: true, result_uri: Some("https://v/final".into()) }));

        let out = await_video(p.as_ref(), &job(), fast(60), &CancellationToken::new()).await;
        assert_eq!(out, Outcome::Success("https://v/final".to_string()));
        assert_eq!(p.poll_count(), 5);
    }

    #[tokio::test]
    async fn stops_at_poll_budget_with_timeout() {
        let p = ScriptedProvider::new();
        for _ in 0..10 {
            p.poll.lock().push_back(running());
        }
        let out = await_video(p.as_ref(), &job(), fast(3), &CancellationToken::new()).await;
        assert_eq!(out, Outcome::TimedOut { attempts: 3 });
        assert_eq!(p.poll_count(), 3);
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_polling() {
        let p = ScriptedProvider::new();
        p.poll.lock().push_back(running());
        let cancel = CancellationToken::new();
        cancel.cancel();
        let out = await_video(p.as_ref(), &job(), fast(60), &cancel).await;
        assert_eq!(out, Outcome::Cancelled);
        assert_eq!(p.poll_count(), 0);
    }

    #[tokio::test]
    async fn cancel_during_sleep_ends_loop() {
        let p = ScriptedProvider::new();
        for _ in 0..10 {
            p.poll.lock().push_back(running());
        }
        let cancel = CancellationToken::new();
        let slow = PollPolicy { interval: Duration::from_secs(3600), max_polls: 60 };
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });
        let out = await_video(p.as_ref(), &job(), slow, &cancel).await;
        assert_eq!(out, Outcome::Cancelled);
        assert_eq!(p.poll_count(), 1);
    }

    #[tokio::test]
    async fn done_without_uri_is_unavailable() {
        let p = ScriptedProvider::new();
        p.poll.lock().push_back(Ok(VideoStatus { done: true, result_uri: None }));
        let out = await_video(p.as_ref(), &job(), fast(5), &CancellationToken::new()).await;
        assert_matches!(out, Outcome::Unavailable(_));
    }

    #[tokio::test]
    async fn video_render_fetches_result() {
        let p = ScriptedProvider::new();
        p.submit.lock().push_back(Ok(job()));
        p.poll.lock().push_back(running());
        p.poll.lock().push_back(Ok(VideoStatus { done: true, result_uri: Some("https://v/1".into()) }));
        p.fetch.lock().push_back(Ok(MediaRef::Inline { mime: "video/mp4".into(), data: Bytes::from_static(b"mp4") }));

        let r = Renderer::new(p.clone(), &Config::default()).with_poll_policy(fast(10));
        let out = r.video("highland dawn", None, AspectRatio::Landscape, &CancellationToken::new()).await;
        assert_matches!(out, Outcome::Success(MediaRef::Inline { ref mime, .. }) if mime == "video/mp4");
        assert_eq!(p.poll_count(), 2);
    }

    #[tokio::test]
    async fn image_without_credentials_is_unavailable() {
        let p = ScriptedProvider::new();
        let r = Renderer::new(p.clone(), &Config::default());
        let out = r.image("x", AspectRatio::Landscape, Resolution::OneK).await;
        assert_matches!(out, Outcome::Unavailable(_));
        assert_eq!(p.image_count(), 1);
    }
}

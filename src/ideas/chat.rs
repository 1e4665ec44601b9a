use tokio_util::sync::CancellationToken;

use super::voice::{CaptureDevice, Recording};
use crate::errors::{Outcome, ProviderError, WorkbenchError};
use crate::model::{ChatEntry, GeneratedIdea, RequestPrefill, Role};
use crate::prompt;
use crate::provider::DynProvider;
use crate::wire::{Part, TextRequest, Turn, TurnRole};

const APOLOGY: &str = "I couldn't reach the creative engine just now. Try again in a moment.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    AwaitingResponse,
    Recording,
}

/// Resets the session to idle however the awaiting turn ends.
struct Pending<'a>(&'a mut ChatState);

impl<'a> Pending<'a> {
    fn enter(state: &'a mut ChatState) -> Self {
        *state = ChatState::AwaitingResponse;
        Self(state)
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        *self.0 = ChatState::Idle;
    }
}

/// Idea Lab conversation: an append-only transcript plus the pending input.
pub struct ChatSession {
    provider: DynProvider,
    model: String,
    pub grounding: bool,
    pub input: String,
    transcript: Vec<ChatEntry>,
    state: ChatState,
    recording: Option<Recording>,
}

impl ChatSession {
    pub fn new(provider: DynProvider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            grounding: false,
            input: String::new(),
            transcript: Vec::new(),
            state: ChatState::Idle,
            recording: None,
        }
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn transcript(&self) -> &[ChatEntry] {
        &self.transcript
    }

    pub fn can_send(&self) -> bool {
        self.state == ChatState::Idle && !self.input.trim().is_empty()
    }

    /// History sent to the model. Apologies are local only, and user entries
    /// left unanswered are folded into the next user turn so roles alternate.
    fn request(&self) -> TextRequest {
        let mut turns: Vec<Turn> = Vec::with_capacity(self.transcript.len());
        for e in &self.transcript {
            match e.role {
                Role::Ai if e.content == APOLOGY => {}
                Role::Ai => turns.push(Turn::model(e.content.clone())),
                Role::User => match turns.last_mut() {
                    Some(last) if last.role == TurnRole::User => last.parts.push(Part::Text(e.content.clone())),
                    _ => turns.push(Turn::user(e.content.clone())),
                },
            }
        }
        TextRequest {
            model: self.model.clone(),
            system: Some(prompt::system_creative_partner()),
            turns,
            schema: None,
            grounding: self.grounding,
        }
    }

    /// Submit the pending input as one turn.
    ///
    /// Always returns to idle. A failed call appends an apology; a cancelled
    /// one appends nothing for the AI.
    pub async fn send(&mut self, cancel: &CancellationToken) -> Result<Outcome<()>, WorkbenchError> {
        match self.state {
            ChatState::Idle => {}
            ChatState::AwaitingResponse => return Err(WorkbenchError::Busy("awaiting a reply")),
            ChatState::Recording => return Err(WorkbenchError::Busy("recording a voice note")),
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return Err(WorkbenchError::MissingInput("message"));
        }

        self.transcript.push(ChatEntry::user(text));
        self.input.clear();
        let req = self.request();

        let reply = {
            let _pending = Pending::enter(&mut self.state);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                r = self.provider.generate_text(&req) => Some(r),
            }
        };

        let Some(res) = reply else {
            tracing::info!("chat turn cancelled");
            return Ok(Outcome::Cancelled);
        };

        let outcome = Outcome::from_provider(res, "chat");
        let status = outcome.status();
        match outcome {
            Outcome::Success(resp) => {
                let links = if self.grounding { resp.citations } else { Vec::new() };
                self.transcript.push(ChatEntry::ai(resp.text, links));
            }
            _ => self.transcript.push(ChatEntry::ai(APOLOGY, Vec::new())),
        }
        Ok(status)
    }

    pub fn start_recording(&mut self, device: Box<dyn CaptureDevice>) -> Result<(), WorkbenchError> {
        if self.state != ChatState::Idle {
            return Err(WorkbenchError::Busy("cannot record now"));
        }
        self.recording = Some(Recording::begin(device)?);
        self.state = ChatState::Recording;
        Ok(())
    }

    /// Stop, release the device, transcribe and append to the pending input.
    /// Never submits.
    pub async fn stop_recording(&mut self) -> Result<Outcome<()>, WorkbenchError> {
        let rec = self.recording.take().ok_or(WorkbenchError::InvalidTransition { from: "idle", to: "stop-recording" })?;
        let (audio, mime) = rec.stop();
        self.state = ChatState::Idle;

        if audio.is_empty() {
            tracing::info!("voice note was empty");
            return Ok(Outcome::Unavailable("no audio captured".into()));
        }

        let req = TextRequest {
            model: self.model.clone(),
            system: None,
            turns: vec![Turn {
                role: TurnRole::User,
                parts: vec![
                    Part::Inline { mime, data: audio },
                    Part::Text(prompt::transcribe_instruction().into()),
                ],
            }],
            schema: None,
            grounding: false,
        };
        let res = self.provider.generate_text(&req).await.and_then(|r| {
            let t = r.text.trim().to_string();
            if t.is_empty() { Err(ProviderError::Empty("empty transcription".into())) } else { Ok(t) }
        });
        let outcome = Outcome::from_provider(res, "transcribe");
        let status = outcome.status();
        if let Some(text) = outcome.ok() {
            if !self.input.trim().is_empty() {
                self.input.push(' ');
            }
            self.input.push_str(&text);
        }
        Ok(status)
    }

    /// Abandon a recording without transcribing.
    pub fn cancel_recording(&mut self) {
        if self.recording.take().is_some() {
            self.state = ChatState::Idle;
        }
    }

    /// Pre-fill a brief from the AI turn at `index`.
    pub fn promote(&self, index: usize) -> Option<RequestPrefill> {
        let entry = self.transcript.get(index).filter(|e| e.role == Role::Ai)?;
        Some(RequestPrefill::from(&GeneratedIdea::from_chat(entry)))
    }
}

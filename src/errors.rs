use thiserror::Error;

/// Failure modes of a single provider capability call.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("no API credentials configured")] MissingCredentials,
    #[error("provider offline")] Offline,
    #[error("http transport error: {0}")] Http(#[from] reqwest::Error),
    #[error("provider API error ({status}): {body}")] Api { status: u16, body: String },
    #[error("malformed provider response: {0}")] Malformed(String),
    #[error("provider returned no content: {0}")] Empty(String),
}

impl ProviderError {
    /// Expected absences (no key, offline, empty output) as opposed to real failures.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::MissingCredentials | Self::Offline | Self::Empty(_))
    }
}

/// Misuse of a workflow: actions the console keeps disabled.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WorkbenchError {
    #[error("cannot move from {from} to {to}")] InvalidTransition { from: &'static str, to: &'static str },
    #[error("missing input: {0}")] MissingInput(&'static str),
    #[error("unknown asset: {0}")] UnknownAsset(String),
    #[error("busy: {0}")] Busy(&'static str),
    #[error("capture device: {0}")] Device(String),
}

/// Result of a call across a component boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    /// Expected absence: no credentials, offline mode, empty model output.
    Unavailable(String),
    /// Transport, API or decoding failure.
    Failed(String),
    TimedOut { attempts: u32 },
    Cancelled,
}

impl<T> Outcome<T> {
    /// Classify a provider result, logging anything that is not a success.
    pub fn from_provider(res: Result<T, ProviderError>, what: &str) -> Self {
        match res {
            Ok(v) => Outcome::Success(v),
            Err(e) if e.is_unavailable() => {
                tracing::info!(call = what, reason = %e, "provider unavailable, degrading");
                Outcome::Unavailable(e.to_string())
            }
            Err(e) => {
                tracing::warn!(call = what, error = %e, "provider call failed");
                Outcome::Failed(e.to_string())
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Outcome::Success(v) => Some(v),
            _ => None,
        }
    }

    /// Keep only the status, dropping any success payload.
    pub fn status(&self) -> Outcome<()> {
        match self {
            Outcome::Success(_) => Outcome::Success(()),
            Outcome::Unavailable(r) => Outcome::Unavailable(r.clone()),
            Outcome::Failed(r) => Outcome::Failed(r.clone()),
            Outcome::TimedOut { attempts } => Outcome::TimedOut { attempts: *attempts },
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }

    /// Short label for terminal output.
    pub fn label(&self) -> String {
        match self {
            Outcome::Success(_) => "live".into(),
            Outcome::Unavailable(r) => format!("unavailable: {r}"),
            Outcome::Failed(r) => format!("failed: {r}"),
            Outcome::TimedOut { attempts } => format!("timed out after {attempts} polls"),
            Outcome::Cancelled => "cancelled".into(),
        }
    }
}

/// A value that is always present, plus whether it came from the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub status: Outcome<()>,
}

impl<T> Resolved<T> {
    pub fn live(value: T) -> Self {
        Self { value, status: Outcome::Success(()) }
    }

    pub fn fallback(value: T, status: Outcome<()>) -> Self {
        Self { value, status }
    }

    pub fn is_degraded(&self) -> bool {
        !self.status.is_success()
    }
}

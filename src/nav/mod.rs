use tokio_util::sync::CancellationToken;

use crate::model::{GeneratedIdea, RequestPrefill};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Home,
    AdvertCreation,
    AssetLab,
    IdeaLab,
    Analytics,
}

impl Screen {
    pub const ALL: [Screen; 5] = [Screen::Home, Screen::AdvertCreation, Screen::AssetLab, Screen::IdeaLab, Screen::Analytics];

    pub fn title(&self) -> &'static str {
        match self {
            Screen::Home => "Home",
            Screen::AdvertCreation => "Create Advert",
            Screen::AssetLab => "Create Assets",
            Screen::IdeaLab => "Idea Lab",
            Screen::Analytics => "Behaviour & Activity",
        }
    }
}

/// Current screen plus whatever brief is being carried between screens.
/// Each screen runs under its own cancellation token, cancelled on leave.
pub struct Navigator {
    current: Screen,
    prefill: Option<RequestPrefill>,
    token: CancellationToken,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self { current: Screen::Home, prefill: None, token: CancellationToken::new() }
    }

    pub fn current(&self) -> Screen {
        self.current
    }

    #[cfg(test)]
    pub fn prefill(&self) -> Option<&RequestPrefill> {
        self.prefill.as_ref()
    }

    /// Token for work started on the current screen.
    pub fn cancel_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn navigate(&mut self, to: Screen) {
        if to == Screen::Home {
            self.prefill = None;
        }
        if to != self.current {
            self.token.cancel();
            self.token = CancellationToken::new();
            tracing::debug!(from = ?self.current, to = ?to, "navigate");
            self.current = to;
        }
    }

    /// Carry an idea into the advert screen as a pre-filled brief.
    pub fn promote(&mut self, idea: &GeneratedIdea) {
        self.promote_prefill(RequestPrefill::from(idea));
    }

    pub fn promote_prefill(&mut self, prefill: RequestPrefill) {
        self.prefill = Some(prefill);
        self.navigate(Screen::AdvertCreation);
    }

    /// Hand the prefill to the screen that consumes it.
    pub fn take_prefill(&mut self) -> Option<RequestPrefill> {
        self.prefill.take()
    }
}

use crate::errors::{Outcome, ProviderError, Resolved};
use crate::prompt;
use crate::provider::DynProvider;
use crate::wire::TextRequest;

/// Agent Kim: rewrites a brief into a master prompt for human approval.
pub struct Kim {
    provider: DynProvider,
    model: String,
}

impl Kim {
    pub fn new(provider: DynProvider, model: impl Into<String>) -> Self {
        Self { provider, model: model.into() }
    }

    /// Single attempt, never fails: an unreachable provider yields the
    /// brief plus fixed stylistic qualifiers.
    pub async fn optimize(&self, brief: &str, guidelines: bool, context: Option<&str>) -> Resolved<String> {
        let req = TextRequest::new(&self.model, prompt::user_prompt_optimize(brief, context))
            .with_system(prompt::system_kim(guidelines));

        let res = self.provider.generate_text(&req).await.and_then(|r| {
            let text = clean(&r.text);
            if text.is_empty() {
                Err(ProviderError::Empty("Kim returned an empty prompt".into()))
            } else {
                Ok(text)
            }
        });

        match Outcome::from_provider(res, "optimize_prompt") {
            Outcome::Success(p) => Resolved::live(p),
            other => Resolved::fallback(prompt::fallback_prompt(brief), other.status()),
        }
    }
}

fn clean(raw: &str) -> String {
    raw.trim().trim_matches(|c| c == '"' || c == '\u{201c}' || c == '\u{201d}').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::scripted::ScriptedProvider;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn live_prompt_is_trimmed_of_quotes() {
        let p = ScriptedProvider::new();
        p.push_text("  \"Golden hour over Loch Lomond, couple on terrace\"  ");
        let kim = Kim::new(p.clone(), "m");
        let out = kim.optimize("winter spa", true, None).await;
        assert_eq!(out.value, "Golden hour over Loch Lomond, couple on terrace");
        assert!(!out.is_degraded());
        let sent = &p.text_calls.lock()[0];
        assert!(sent.system.as_deref().unwrap().contains("brand guidelines"));
    }

    #[tokio::test]
    async fn unreachable_provider_falls_back_to_brief() {
        let p = ScriptedProvider::new();
        p.push_text_err(ProviderError::Api { status: 503, body: "down".into() });
        let out = Kim::new(p.clone(), "m").optimize("Winter golf", false, None).await;
        assert!(out.value.starts_with("Winter golf"));
        assert!(out.value.contains(prompt::FALLBACK_QUALIFIERS));
        assert_matches!(out.status, Outcome::Failed(_));
    }

    #[tokio::test]
    async fn empty_reply_and_missing_key_still_return_text() {
        let p = ScriptedProvider::new();
        p.push_text("   ");
        let kim = Kim::new(p.clone(), "m");
        let out = kim.optimize("", true, None).await;
        assert!(!out.value.is_empty());
        assert_matches!(out.status, Outcome::Unavailable(_));

        let out = kim.optimize("spa", true, Some("competitor runs 2-for-1")).await;
        assert!(!out.value.is_empty());
        assert_eq!(p.text_count(), 2);
    }
}

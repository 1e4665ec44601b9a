pub mod chat;
pub mod voice;

use crate::errors::{Outcome, ProviderError, Resolved};
use crate::model::GeneratedIdea;
use crate::prompt;
use crate::provider::DynProvider;
use crate::wire::TextRequest;

/// Goals offered by the console next to the free-text context.
pub const GOALS: [&str; 4] = [
    "Increase Direct Bookings",
    "Drive Off-Peak Revenue",
    "Promote New Restaurant",
    "Build Brand Loyalty",
];

/// Batch idea generation for the Idea Lab.
pub struct Brainstorm {
    provider: DynProvider,
    model: String,
    count: usize,
}

impl Brainstorm {
    pub fn new(provider: DynProvider, model: impl Into<String>, count: usize) -> Self {
        Self { provider, model: model.into(), count: count.max(1) }
    }

    /// Without credentials the caller gets a single placeholder idea; any other
    /// failure gives an empty list.
    pub async fn generate(&self, context: &str, goal: Option<&str>) -> Resolved<Vec<GeneratedIdea>> {
        let req = TextRequest::new(&self.model, prompt::user_prompt_ideas(context, goal, self.count))
            .with_system(prompt::system_creative_partner())
            .with_schema(prompt::ideas_schema());

        let res = self.provider.generate_text(&req).await.and_then(|r| {
            match prompt::parse_model_json::<Vec<GeneratedIdea>>(&r.text) {
                Some(ideas) if !ideas.is_empty() => Ok(ideas),
                Some(_) => Err(ProviderError::Empty("no ideas returned".into())),
                None => Err(ProviderError::Malformed("ideas were not valid JSON".into())),
            }
        });
        let no_key = matches!(res, Err(ProviderError::MissingCredentials | ProviderError::Offline));

        match Outcome::from_provider(res, "generate_ideas") {
            Outcome::Success(mut ideas) => {
                ideas.truncate(self.count);
                tracing::debug!(count = ideas.len(), "ideas generated");
                Resolved::live(ideas)
            }
            other if no_key => Resolved::fallback(vec![mock_idea()], other.status()),
            other => Resolved::fallback(Vec::new(), other.status()),
        }
    }
}

pub fn mock_idea() -> GeneratedIdea {
    GeneratedIdea {
        title: "Mock Idea 1".into(),
        pitch: "Please set API Key".into(),
        visuals: "None".into(),
        grounding_urls: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RequestPrefill;
    use crate::provider::scripted::ScriptedProvider;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn parses_fenced_idea_list() {
        let p = ScriptedProvider::new();
        p.push_text(
            "```json\n[{\"title\":\"Snow & Sauna\",\"pitch\":\"Ski then steam.\",\"visuals\":\"Steam rising over snow\"}]\n```",
        );
        let out = Brainstorm::new(p.clone(), "m", 5).generate("winter", Some(GOALS[0])).await;
        assert!(!out.is_degraded());
        assert_eq!(out.value[0].title, "Snow & Sauna");

        let sent = &p.text_calls.lock()[0];
        assert!(sent.schema.is_some());
        assert_matches!(&sent.turns[0].parts[0], crate::wire::Part::Text(t) if t.contains("Increase Direct Bookings"));
    }

    #[tokio::test]
    async fn missing_key_yields_single_mock_idea() {
        let p = ScriptedProvider::new();
        let out = Brainstorm::new(p, "m", 5).generate("ctx", None).await;
        assert_matches!(out.status, Outcome::Unavailable(_));
        assert_eq!(out.value, vec![mock_idea()]);
    }

    #[tokio::test]
    async fn other_failures_yield_no_ideas() {
        let p = ScriptedProvider::new();
        p.push_text("I'm not sure what you mean");
        let out = Brainstorm::new(p, "m", 5).generate("ctx", None).await;
        assert_matches!(out.status, Outcome::Failed(_));
        assert!(out.value.is_empty());
    }

    #[tokio::test]
    async fn promoted_idea_carries_title_pitch_and_visuals() {
        let p = ScriptedProvider::new();
        p.push_text(r#"[{"title":"T","pitch":"P pitch","visuals":"V visuals"}]"#);
        let out = Brainstorm::new(p, "m", 5).generate("ctx", None).await;
        let prefill = RequestPrefill::from(&out.value[0]);
        assert_eq!(prefill.name.as_deref(), Some("T"));
        let d = prefill.description.unwrap();
        assert!(d.contains("P pitch") && d.contains("V visuals"));
        assert_eq!(prefill.kind.as_deref(), Some("Campaign"));
    }
}

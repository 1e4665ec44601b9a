use serde::Deserialize;
use std::collections::HashSet;
use tokio_util::sync::CancellationToken;

use crate::errors::{Outcome, ProviderError, Resolved};
use crate::model::{AssetFormat, AssetStats, AssetVersion, MarketingRequest, MediaRef};
use crate::prompt;
use crate::provider::DynProvider;
use crate::render::Renderer;
use crate::wire::{SeedImage, TextRequest};

/// Concept as the model returns it under the concepts schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConcept {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub predicted_ctr: Option<String>,
}

/// Sanitize model concepts before they reach the gallery.
/// - Drop entries with an empty title
/// - Drop duplicate titles (case-insensitive, first wins)
/// - Cap at `limit`
pub fn sanitize(raw: Vec<RawConcept>, limit: usize) -> (Vec<RawConcept>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for c in raw {
        let title = c.title.trim();
        if title.is_empty() {
            warnings.push("dropped concept with empty title".to_string());
            continue;
        }
        if !seen.insert(title.to_lowercase()) {
            warnings.push(format!("dropped duplicate concept '{title}'"));
            continue;
        }
        if out.len() == limit {
            warnings.push(format!("dropped concept '{title}' beyond batch size {limit}"));
            continue;
        }
        out.push(RawConcept { title: title.to_string(), ..c });
    }
    (out, warnings)
}

fn impressions_for(idx: usize) -> String {
    format!("{:.1}k", 8.0 + ((idx * 53) % 120) as f64 / 10.0)
}

fn ctr_for(idx: usize) -> String {
    format!("{:.1}%", 2.0 + ((idx * 37) % 30) as f64 / 10.0)
}

/// Fixed offline batch; identical on every call.
pub fn mock_batch(size: usize) -> Vec<AssetVersion> {
    (0..size.max(1))
        .map(|i| AssetVersion {
            id: format!("mock-{}", i + 1),
            title: format!("Highland Escape Variation {}", i + 1),
            description: Some(format!(
                "Luxury Scottish hotel scene, variation {} of the campaign, natural light and heritage interiors",
                i + 1
            )),
            image: MediaRef::placeholder(i + 1),
            video: None,
            audio: None,
            format: AssetFormat::Image,
            stats: AssetStats { predicted_ctr: ctr_for(i), impressions: impressions_for(i) },
        })
        .collect()
}

fn to_assets(concepts: Vec<RawConcept>) -> Vec<AssetVersion> {
    concepts
        .into_iter()
        .enumerate()
        .map(|(i, c)| AssetVersion {
            id: format!("concept-{}", i + 1),
            title: c.title,
            description: Some(c.description).filter(|d| !d.trim().is_empty()),
            image: MediaRef::placeholder(i + 1),
            video: None,
            audio: None,
            format: AssetFormat::Image,
            stats: AssetStats {
                predicted_ctr: c.predicted_ctr.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| ctr_for(i)),
                impressions: impressions_for(i),
            },
        })
        .collect()
}

pub struct ConceptGenerator {
    provider: DynProvider,
    model: String,
    batch_size: usize,
}

impl ConceptGenerator {
    pub fn new(provider: DynProvider, model: impl Into<String>, batch_size: usize) -> Self {
        Self { provider, model: model.into(), batch_size: batch_size.max(1) }
    }

    /// Always non-empty: any failure or an empty answer yields the mock batch.
    pub async fn generate(&self, req: &MarketingRequest, master_prompt: Option<&str>) -> Resolved<Vec<AssetVersion>> {
        let text_req = TextRequest::new(&self.model, prompt::user_prompt_concepts(req, master_prompt, self.batch_size))
            .with_system(prompt::system_concepts())
            .with_schema(prompt::concepts_schema());

        let res = self.provider.generate_text(&text_req).await.and_then(|r| {
            prompt::parse_model_json::<Vec<RawConcept>>(&r.text)
                .ok_or_else(|| ProviderError::Malformed("concepts were not a JSON array".into()))
        });

        let raw = match Outcome::from_provider(res, "generate_concepts") {
            Outcome::Success(raw) => raw,
            other => return Resolved::fallback(mock_batch(self.batch_size), other.status()),
        };

        let (clean, warnings) = sanitize(raw, self.batch_size);
        for w in &warnings {
            tracing::debug!(warning = %w, "concept sanitizer");
        }
        if clean.is_empty() {
            tracing::info!("model returned zero usable concepts; using mock batch");
            return Resolved::fallback(
                mock_batch(self.batch_size),
                Outcome::Unavailable("model returned zero concepts".into()),
            );
        }
        Resolved::live(to_assets(clean))
    }
}

/// Eagerly render the hero (first concept) in the chosen format.
/// Leaves the placeholder in place on failure.
pub async fn render_hero(
    renderer: &Renderer,
    assets: &mut [AssetVersion],
    format: AssetFormat,
    seed: Option<SeedImage>,
    cancel: &CancellationToken,
) -> Outcome<()> {
    let Some(hero) = assets.first_mut() else {
        return Outcome::Unavailable("no concepts to render".into());
    };
    let prompt = hero.render_prompt().to_string();
    match format {
        AssetFormat::Image => {
            let out = renderer.image(&prompt, renderer.aspect(), renderer.resolution()).await;
            let status = out.status();
            if let Some(img) = out.ok() {
                hero.image = img;
            }
            status
        }
        AssetFormat::Video => {
            let out = renderer.video(&prompt, seed, renderer.aspect(), cancel).await;
            let status = out.status();
            if let Some(v) = out.ok() {
                hero.video = Some(v);
                hero.format = AssetFormat::Video;
            }
            status
        }
        AssetFormat::Audio => {
            let out = renderer.audio(&prompt).await;
            let status = out.status();
            if let Some(a) = out.ok() {
                hero.audio = Some(a);
                hero.format = AssetFormat::Audio;
            }
            status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::scripted::ScriptedProvider;
    use assert_matches::assert_matches;

    fn raw(title: &str) -> RawConcept {
        RawConcept { title: title.into(), description: format!("{title} scene"), predicted_ctr: None }
    }

    fn request() -> MarketingRequest {
        let mut r = MarketingRequest::default();
        r.name = "Q4 Winter Golf".into();
        r.description = "golf break".into();
        r
    }

    #[test]
    fn sanitize_drops_blank_duplicates_and_overflow() {
        let (out, warnings) = sanitize(vec![raw("A"), raw(" "), raw("a"), raw("B"), raw("C")], 2);
        let titles: Vec<_> = out.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn mock_batch_is_deterministic() {
        let a = mock_batch(20);
        assert_eq!(a.len(), 20);
        assert_eq!(a, mock_batch(20));
        assert!(a.iter().all(|v| v.image.is_placeholder()));
    }

    #[tokio::test]
    async fn zero_concepts_falls_back_to_mock_batch() {
        let p = ScriptedProvider::new();
        p.push_text("[]");
        let gen = ConceptGenerator::new(p.clone(), "m", 20);
        let out = gen.generate(&request(), Some("prompt")).await;
        assert_eq!(out.value.len(), 20);
        assert_matches!(out.status, Outcome::Unavailable(_));
    }

    #[tokio::test]
    async fn missing_credentials_falls_back_to_mock_batch() {
        let p = ScriptedProvider::new();
        let out = ConceptGenerator::new(p.clone(), "m", 20).generate(&request(), None).await;
        assert_eq!(out.value, mock_batch(20));
    }

    #[tokio::test]
    async fn live_concepts_keep_model_ctr_and_placeholders() {
        let p = ScriptedProvider::new();
        p.push_text(r#"[{"title":"Fireside","description":"Couple by a log fire","predictedCtr":"4.2%"},{"title":"Fairway","description":""}]"#);
        let out = ConceptGenerator::new(p.clone(), "m", 20).generate(&request(), None).await;
        assert!(!out.is_degraded());
        assert_eq!(out.value.len(), 2);
        assert_eq!(out.value[0].stats.predicted_ctr, "4.2%");
        assert_eq!(out.value[1].description, None);
        assert!(out.value.iter().all(|a| a.image.is_placeholder()));
        assert!(p.text_calls.lock()[0].schema.is_some());
    }

    #[tokio::test]
    async fn hero_image_replaces_only_first_placeholder() {
        let p = ScriptedProvider::new();
        p.push_image("https://img/hero");
        let renderer = Renderer::new(p.clone(), &Config::default());
        let mut assets = mock_batch(3);
        let before = assets.clone();
        let status = render_hero(&renderer, &mut assets, AssetFormat::Image, None, &CancellationToken::new()).await;
        assert!(status.is_success());
        assert_eq!(assets[0].image, MediaRef::Remote { uri: "https://img/hero".into() });
        assert_eq!(&assets[1..], &before[1..]);
        assert_eq!(p.image_count(), 1);
    }

    #[tokio::test]
    async fn hero_uses_configured_framing() {
        let p = ScriptedProvider::new();
        p.push_image("https://img/tall");
        let cfg = Config {
            aspect_ratio: crate::wire::AspectRatio::Portrait,
            image_resolution: crate::wire::Resolution::TwoK,
            ..Config::default()
        };
        let renderer = Renderer::new(p.clone(), &cfg);
        let mut assets = mock_batch(1);
        render_hero(&renderer, &mut assets, AssetFormat::Image, None, &CancellationToken::new()).await;
        let req = &p.image_calls.lock()[0];
        assert_eq!(req.aspect.as_str(), "9:16");
        assert_eq!(req.resolution.as_str(), "2K");
    }

    #[tokio::test]
    async fn failed_audio_keeps_image_format() {
        let p = ScriptedProvider::new();
        let renderer = Renderer::new(p.clone(), &Config::default());
        let mut assets = mock_batch(2);
        let status = render_hero(&renderer, &mut assets, AssetFormat::Audio, None, &CancellationToken::new()).await;
        assert_matches!(status, Outcome::Unavailable(_));
        assert_eq!(assets[0].format, AssetFormat::Image);
        assert!(assets[0].audio.is_none());
    }
}

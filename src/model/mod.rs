use bytes::Bytes;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// ========================================
/// Campaign data shared across screens
/// ========================================

pub const IMPACT_MAX: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketingRequest {
    pub name: String,
    pub department: String,
    pub location: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub business_reason: String,
    impact_level: u8,
}

impl Default for MarketingRequest {
    fn default() -> Self {
        Self {
            name: String::new(),
            department: "Marketing".into(),
            location: "Aviemore Resort".into(),
            kind: "Seasonal Offer".into(),
            description: String::new(),
            business_reason: String::new(),
            impact_level: 50,
        }
    }
}

impl MarketingRequest {
    /// Form state on mount: defaults overlaid with whatever the prefill carries.
    pub fn from_prefill(prefill: Option<&RequestPrefill>) -> Self {
        let mut req = Self::default();
        if let Some(p) = prefill {
            req.apply(p);
        }
        req
    }

    pub fn apply(&mut self, p: &RequestPrefill) {
        if let Some(v) = &p.name { self.name = v.clone(); }
        if let Some(v) = &p.department { self.department = v.clone(); }
        if let Some(v) = &p.location { self.location = v.clone(); }
        if let Some(v) = &p.kind { self.kind = v.clone(); }
        if let Some(v) = &p.description { self.description = v.clone(); }
        if let Some(v) = &p.business_reason { self.business_reason = v.clone(); }
        if let Some(v) = p.impact_level { self.set_impact_level(v as i64); }
    }

    pub fn impact_level(&self) -> u8 {
        self.impact_level
    }

    pub fn set_impact_level(&mut self, v: i64) {
        self.impact_level = v.clamp(0, IMPACT_MAX as i64) as u8;
    }

    /// The brief is the only field gating the workflow.
    pub fn has_brief(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// Partial form carried between screens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPrefill {
    pub name: Option<String>,
    pub department: Option<String>,
    pub location: Option<String>,
    pub kind: Option<String>,
    pub description: Option<String>,
    pub business_reason: Option<String>,
    pub impact_level: Option<u8>,
}

impl From<&GeneratedIdea> for RequestPrefill {
    fn from(idea: &GeneratedIdea) -> Self {
        Self {
            name: Some(idea.title.clone()),
            description: Some(format!(
                "Concept Pitch: {}\n\nVisual Direction: {}",
                idea.pitch, idea.visuals
            )),
            kind: Some("Campaign".into()),
            business_reason: Some("Generated from Idea Lab".into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedIdea {
    pub title: String,
    pub pitch: String,
    pub visuals: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_urls: Vec<String>,
}

impl GeneratedIdea {
    /// Turn a free-form AI chat reply into an idea: first line is the title.
    pub fn from_chat(entry: &ChatEntry) -> Self {
        let mut lines = entry.content.lines().map(str::trim).filter(|l| !l.is_empty());
        let title: String = lines
            .next()
            .unwrap_or("Idea Lab Concept")
            .trim_matches(|c: char| c == '#' || c == '*' || c.is_whitespace())
            .chars()
            .take(80)
            .collect();
        let pitch = lines.collect::<Vec<_>>().join(" ");
        Self {
            title,
            pitch,
            visuals: "As discussed in the Idea Lab conversation".into(),
            grounding_urls: entry.links.clone(),
        }
    }
}

/// ========================================
/// Media & generated assets
/// ========================================

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetFormat {
    #[default]
    Image,
    Video,
    Audio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MediaRef {
    /// Synthetic stand-in until the concept is rendered.
    Placeholder { url: String },
    Remote { uri: String },
    Inline {
        mime: String,
        #[serde(skip)]
        data: Bytes,
    },
}

impl MediaRef {
    pub fn placeholder(seed: usize) -> Self {
        MediaRef::Placeholder { url: format!("https://picsum.photos/seed/mh{seed}/1280/720") }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, MediaRef::Placeholder { .. })
    }

    pub fn mime(&self) -> Option<&str> {
        match self {
            MediaRef::Inline { mime, .. } => Some(mime),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MediaRef::Placeholder { url } => format!("placeholder {url}"),
            MediaRef::Remote { uri } => uri.clone(),
            MediaRef::Inline { mime, data } => {
                format!("{mime}, {}", humansize::format_size(data.len(), humansize::DECIMAL))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetStats {
    pub predicted_ctr: String,
    pub impressions: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetVersion {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub image: MediaRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaRef>,
    pub format: AssetFormat,
    pub stats: AssetStats,
}

impl AssetVersion {
    /// The media reference `format` designates; image is always present.
    pub fn primary_media(&self) -> &MediaRef {
        match self.format {
            AssetFormat::Video => self.video.as_ref().unwrap_or(&self.image),
            AssetFormat::Audio => self.audio.as_ref().unwrap_or(&self.image),
            AssetFormat::Image => &self.image,
        }
    }

    /// Text used when rendering this concept.
    pub fn render_prompt(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&self.title)
    }
}

/// ========================================
/// Idea Lab transcript
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    pub at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), links: Vec::new(), at: Utc::now() }
    }

    pub fn ai(content: impl Into<String>, links: Vec<String>) -> Self {
        Self { role: Role::Ai, content: content.into(), links, at: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promoted_idea_fills_name_and_description() {
        let idea = GeneratedIdea {
            title: "T".into(),
            pitch: "P".into(),
            visuals: "V".into(),
            grounding_urls: vec![],
        };
        let req = MarketingRequest::from_prefill(Some(&RequestPrefill::from(&idea)));
        assert_eq!(req.name, "T");
        assert!(req.description.contains('P'));
        assert!(req.description.contains('V'));
        assert_eq!(req.kind, "Campaign");
        assert_eq!(req.location, "Aviemore Resort");
        assert_eq!(req.impact_level(), 50);
    }

    #[test]
    fn impact_level_is_clamped() {
        let mut req = MarketingRequest::default();
        req.set_impact_level(250);
        assert_eq!(req.impact_level(), 100);
        req.set_impact_level(-4);
        assert_eq!(req.impact_level(), 0);
        req.set_impact_level(73);
        assert_eq!(req.impact_level(), 73);
    }

    #[test]
    fn format_selects_authoritative_media() {
        let mut a = AssetVersion {
            id: "1".into(),
            title: "Hero".into(),
            description: None,
            image: MediaRef::placeholder(1),
            video: None,
            audio: None,
            format: AssetFormat::Image,
            stats: AssetStats { predicted_ctr: "3.1%".into(), impressions: "10k".into() },
        };
        assert!(a.primary_media().is_placeholder());
        a.video = Some(MediaRef::Remote { uri: "files/v".into() });
        a.format = AssetFormat::Video;
        assert_eq!(a.primary_media(), &MediaRef::Remote { uri: "files/v".into() });
        assert_eq!(a.render_prompt(), "Hero");
    }

    #[test]
    fn chat_reply_title_is_first_line() {
        let entry = ChatEntry::ai("## Highland Hideaway\nA winter spa escape.\nFor couples.", vec!["https://a".into()]);
        let idea = GeneratedIdea::from_chat(&entry);
        assert_eq!(idea.title, "Highland Hideaway");
        assert_eq!(idea.pitch, "A winter spa escape. For couples.");
        assert_eq!(idea.grounding_urls, vec!["https://a".to_string()]);
    }
}

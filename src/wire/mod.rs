use bytes::Bytes;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// ========================================
/// Provider capability requests/responses
/// ========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    /// Raw media handed straight to the model (voice notes, reference images).
    Inline { mime: String, data: Bytes },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: TurnRole,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: TurnRole::User, parts: vec![Part::Text(text.into())] }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: TurnRole::Model, parts: vec![Part::Text(text.into())] }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub model: String,
    pub system: Option<String>,
    pub turns: Vec<Turn>,
    /// JSON schema the reply must follow; implies a JSON mime type.
    pub schema: Option<Value>,
    /// Attach the search tool and collect citation links.
    pub grounding: bool,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: None,
            turns: vec![Turn::user(prompt)],
            schema: None,
            grounding: false,
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextResponse {
    pub text: String,
    pub citations: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    #[value(name = "16:9", alias = "landscape")]
    Landscape,
    #[serde(rename = "9:16")]
    #[value(name = "9:16", alias = "portrait")]
    Portrait,
    #[serde(rename = "1:1")]
    #[value(name = "1:1", alias = "square")]
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
pub enum Resolution {
    #[default]
    #[serde(rename = "1K")]
    #[value(name = "1k")]
    OneK,
    #[serde(rename = "2K")]
    #[value(name = "2k")]
    TwoK,
    #[serde(rename = "4K")]
    #[value(name = "4k")]
    FourK,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::OneK => "1K",
            Resolution::TwoK => "2K",
            Resolution::FourK => "4K",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub aspect: AspectRatio,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedImage {
    pub mime: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub model: String,
    pub prompt: String,
    pub seed_image: Option<SeedImage>,
    pub aspect: AspectRatio,
}

/// Handle of a long-running generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoJob {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoStatus {
    pub done: bool,
    pub result_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub model: String,
    pub text: String,
    pub voice: String,
}

use anyhow::Context;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cli::ProviderKind;
use crate::wire::{AspectRatio, Resolution};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Models {
    pub text: String,
    pub reasoning: String,
    pub image: String,
    pub video: String,
    pub tts: String,
}

impl Default for Models {
    fn default() -> Self {
        Self {
            text: "gemini-2.5-flash".into(),
            reasoning: "gemini-3-pro-preview".into(),
            image: "gemini-3-pro-image-preview".into(),
            video: "veo-3.1-fast-generate-preview".into(),
            tts: "gemini-2.5-flash-preview-tts".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub schema_version: String,
    pub provider: ProviderKind,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_base: String,
    pub models: Models,
    pub voice: String,
    pub aspect_ratio: AspectRatio,
    pub image_resolution: Resolution,
    pub timeout_secs: u64,
    pub video_poll_interval_secs: u64,
    pub video_max_polls: u32,
    pub concept_batch_size: usize,
    pub idea_count: usize,
    pub guidelines_active: bool,
    pub artifact_dir: String,
    pub save_artifacts: bool,
    pub asset_build_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: "2025-11-01".into(),
            provider: ProviderKind::Gemini,
            api_key: None,
            api_base: "https://generativelanguage.googleapis.com".into(),
            models: Models::default(),
            voice: "Kore".into(),
            aspect_ratio: AspectRatio::Landscape,
            image_resolution: Resolution::OneK,
            timeout_secs: 120,
            video_poll_interval_secs: 10,
            video_max_polls: 60,
            concept_batch_size: 20,
            idea_count: 5,
            guidelines_active: true,
            artifact_dir: ".workbench".into(),
            save_artifacts: false,
            asset_build_secs: 2,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file (if any), then the API key from the environment.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut cfg = match path {
            Some(p) => {
                let raw = fs::read_to_string(p)?;
                toml::from_str::<Config>(&raw)
                    .with_context(|| format!("parsing config {}", p.display()))?
            }
            None => Config::default(),
        };
        cfg.apply_env(|k| std::env::var(k).ok());
        Ok(cfg)
    }

    fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        let key = get("GEMINI_API_KEY").or_else(|| get("API_KEY"));
        if let Some(k) = key.filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(k);
        }
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.video_poll_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_values_override_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            "provider = \"offline\"\nvideo_max_polls = 5\naspect_ratio = \"9:16\"\nimage_resolution = \"4K\"\n\n[models]\nimage = \"imagen-x\""
        )
        .unwrap();
        let cfg = Config::load(Some(f.path())).unwrap();
        assert_eq!(cfg.provider, ProviderKind::Offline);
        assert_eq!(cfg.video_max_polls, 5);
        assert_eq!(cfg.models.image, "imagen-x");
        assert_eq!(cfg.models.text, Models::default().text);
        assert_eq!(cfg.concept_batch_size, 20);
        assert_eq!(cfg.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(cfg.image_resolution, Resolution::FourK);
    }

    #[test]
    fn env_key_prefers_gemini_var() {
        let mut cfg = Config::default();
        cfg.apply_env(|k| match k {
            "GEMINI_API_KEY" => Some("g-key".into()),
            "API_KEY" => Some("other".into()),
            _ => None,
        });
        assert_eq!(cfg.api_key.as_deref(), Some("g-key"));
        assert!(cfg.has_credentials());
    }

    #[test]
    fn blank_env_key_is_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env(|k| (k == "API_KEY").then(|| "  ".to_string()));
        assert!(!cfg.has_credentials());
    }
}

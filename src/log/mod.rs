use crate::config::Config;
use crate::model::MediaRef;
use fs_err as fs;
use serde::Serialize;
use serde_json::to_string_pretty;
use std::path::{Path, PathBuf};
use tracing_subscriber::{prelude::*, EnvFilter};
use uuid::Uuid;

/// `RUST_LOG` wins when set; otherwise warn globally and info (or debug) for this crate.
pub fn init_tracing(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,creative_workbench={level}")));
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr).with_filter(filter))
        .try_init();
}

/// One console run. Artifacts land under `<artifact_dir>/sessions/<id>/`
/// only when saving is enabled.
pub struct Session {
    pub id: Uuid,
    dir: PathBuf,
    enabled: bool,
}

fn session_dir(root: &Path, id: Uuid) -> PathBuf {
    root.join("sessions").join(id.to_string())
}

impl Session {
    pub fn new(cfg: &Config) -> Self {
        let id = Uuid::new_v4();
        Self { id, dir: session_dir(Path::new(&cfg.artifact_dir), id), enabled: cfg.save_artifacts }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Pretty JSON snapshot of a workflow stage (brief, prompt, concepts, ...).
    pub fn save_stage<T: Serialize>(&self, stage: &str, value: &T) -> anyhow::Result<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;
        let p = self.dir.join(format!("{stage}.json"));
        fs::write(&p, to_string_pretty(value)?)?;
        tracing::debug!(stage, path = %p.display(), "stage saved");
        Ok(Some(p))
    }

    /// Raw bytes for inline media; a JSON reference for anything remote.
    pub fn save_media(&self, name: &str, media: &MediaRef) -> anyhow::Result<Option<PathBuf>> {
        if !self.enabled {
            return Ok(None);
        }
        fs::create_dir_all(&self.dir)?;
        let p = match media {
            MediaRef::Inline { mime, data } => {
                let p = self.dir.join(format!("{name}.{}", extension_for(mime)));
                fs::write(&p, data)?;
                p
            }
            other => {
                let p = self.dir.join(format!("{name}.ref.json"));
                fs::write(&p, to_string_pretty(other)?)?;
                p
            }
        };
        tracing::debug!(name, path = %p.display(), "media saved");
        Ok(Some(p))
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "video/mp4" => "mp4",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/mpeg" | "audio/mp3" => "mp3",
        m if m.starts_with("audio/L16") || m.starts_with("audio/pcm") => "pcm",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn cfg(dir: &Path, save: bool) -> Config {
        Config { artifact_dir: dir.display().to_string(), save_artifacts: save, ..Config::default() }
    }

    #[test]
    fn nothing_written_when_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let s = Session::new(&cfg(tmp.path(), false));
        assert!(s.save_stage("brief", &serde_json::json!({"a": 1})).unwrap().is_none());
        assert!(!tmp.path().join("sessions").exists());
    }

    #[test]
    fn stages_and_media_written_when_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let s = Session::new(&cfg(tmp.path(), true));
        let p = s.save_stage("prompt", &"Golden hour").unwrap().unwrap();
        assert!(p.starts_with(tmp.path().join("sessions").join(s.id.to_string())));
        assert_eq!(fs::read_to_string(&p).unwrap(), "\"Golden hour\"");

        let img = MediaRef::Inline { mime: "image/png".into(), data: Bytes::from_static(b"\x89PNG") };
        let p = s.save_media("hero", &img).unwrap().unwrap();
        assert_eq!(p.extension().unwrap(), "png");
        assert_eq!(fs::read(&p).unwrap(), b"\x89PNG");

        let p = s.save_media("alt", &MediaRef::placeholder(3)).unwrap().unwrap();
        assert!(fs::read_to_string(&p).unwrap().contains("placeholder"));
    }
}

use anyhow::{bail, Context};
use bytes::Bytes;
use fs_err as fs;
use std::path::Path;

use crate::wire::SeedImage;

/// Media read from disk to hand to the provider (seed images, voice notes).
#[derive(Debug, Clone)]
pub struct MediaBlob {
    pub mime: String,
    pub data: Bytes,
}

impl From<MediaBlob> for SeedImage {
    fn from(b: MediaBlob) -> Self {
        SeedImage { mime: b.mime, data: b.data }
    }
}

/// Mime type from the file extension; the provider rejects anything it cannot decode.
pub fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "wav" => "audio/wav",
        "mp3" => "audio/mp3",
        "ogg" => "audio/ogg",
        "webm" => "audio/webm",
        "m4a" | "aac" => "audio/aac",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Read a whole media file. Unlike text context, media cannot be truncated,
/// so files over `max_bytes` are rejected.
pub fn load_media(path: &Path, max_bytes: usize) -> anyhow::Result<MediaBlob> {
    let len = fs::metadata(path)?.len() as usize;
    if len > max_bytes {
        bail!(
            "{} is {} (limit {})",
            path.display(),
            humansize::format_size(len, humansize::DECIMAL),
            humansize::format_size(max_bytes, humansize::DECIMAL)
        );
    }
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(MediaBlob { mime: mime_for(path).to_string(), data: Bytes::from(data) })
}

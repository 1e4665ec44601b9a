use bytes::Bytes;
use std::path::PathBuf;

use crate::context;
use crate::errors::WorkbenchError;

/// A source of voice-note audio (microphone, file, ...).
pub trait CaptureDevice: Send {
    /// Acquire the device and begin capturing.
    fn start(&mut self) -> Result<(), WorkbenchError>;
    /// Stop capturing and hand back the captured bytes (possibly empty).
    fn finish(&mut self) -> Bytes;
    /// Give the device back. Must be idempotent.
    fn release(&mut self);
    fn mime(&self) -> String;
}

/// An active capture. The device is released when this is dropped,
/// whichever way the recording ends.
pub struct Recording {
    device: Box<dyn CaptureDevice>,
}

impl Recording {
    pub fn begin(mut device: Box<dyn CaptureDevice>) -> Result<Self, WorkbenchError> {
        if let Err(e) = device.start() {
            device.release();
            return Err(e);
        }
        Ok(Self { device })
    }

    /// Returns (audio bytes, mime type).
    pub fn stop(mut self) -> (Bytes, String) {
        let data = self.device.finish();
        (data, self.device.mime())
    }
}

impl Drop for Recording {
    fn drop(&mut self) {
        self.device.release();
    }
}

/// Terminal stand-in for a microphone: the "recording" is an audio file read on stop.
pub struct FileCapture {
    path: PathBuf,
    max_bytes: usize,
    mime: String,
    open: bool,
}

impl FileCapture {
    pub fn new(path: impl Into<PathBuf>, max_bytes: usize) -> Self {
        let path = path.into();
        let mime = context::mime_for(&path).to_string();
        Self { path, max_bytes, mime, open: false }
    }
}

impl CaptureDevice for FileCapture {
    fn start(&mut self) -> Result<(), WorkbenchError> {
        if !self.path.is_file() {
            return Err(WorkbenchError::Device(format!("{} is not a readable file", self.path.display())));
        }
        self.open = true;
        Ok(())
    }

    fn finish(&mut self) -> Bytes {
        if !self.open {
            return Bytes::new();
        }
        match context::load_media(&self.path, self.max_bytes) {
            Ok(blob) => blob.data,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "voice note unreadable");
                Bytes::new()
            }
        }
    }

    fn release(&mut self) {
        self.open = false;
    }

    fn mime(&self) -> String {
        self.mime.clone()
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Records how often it was released.
    pub struct FakeMic {
        pub audio: Bytes,
        pub releases: Arc<AtomicUsize>,
    }

    impl FakeMic {
        pub fn new(audio: &'static [u8]) -> (Self, Arc<AtomicUsize>) {
            let releases = Arc::new(AtomicUsize::new(0));
            (Self { audio: Bytes::from_static(audio), releases: releases.clone() }, releases)
        }
    }

    impl CaptureDevice for FakeMic {
        fn start(&mut self) -> Result<(), WorkbenchError> {
            Ok(())
        }

        fn finish(&mut self) -> Bytes {
            self.audio.clone()
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }

        fn mime(&self) -> String {
            "audio/webm".into()
        }
    }
}

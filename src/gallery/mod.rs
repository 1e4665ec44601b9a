use crate::errors::{Outcome, WorkbenchError};
use crate::model::{AssetFormat, AssetVersion};
use crate::render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorMode {
    #[default]
    View,
    Text,
    Crop,
}

/// Caption overlay drawn over the selected asset. Never composited.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Overlay {
    pub headline: String,
    pub caption: String,
    pub mode: EditorMode,
}

/// In-memory gallery of one generated batch.
#[derive(Debug, Clone)]
pub struct Gallery {
    assets: Vec<AssetVersion>,
    selected: usize,
    format: AssetFormat,
    pub overlay: Overlay,
}

impl Gallery {
    /// `assets` must be non-empty; the first one is the hero and starts selected.
    pub fn new(assets: Vec<AssetVersion>, format: AssetFormat, caption: &str) -> Result<Self, WorkbenchError> {
        let hero = assets.first().ok_or(WorkbenchError::MissingInput("concepts"))?;
        let overlay = Overlay {
            headline: hero.title.to_uppercase(),
            caption: caption.to_string(),
            mode: EditorMode::View,
        };
        Ok(Self { assets, selected: 0, format, overlay })
    }

    pub fn assets(&self) -> &[AssetVersion] {
        &self.assets
    }

    pub fn format(&self) -> AssetFormat {
        self.format
    }

    pub fn selected(&self) -> &AssetVersion {
        &self.assets[self.selected]
    }

    pub fn hero(&self) -> &AssetVersion {
        &self.assets[0]
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// Select `id`, lazily rendering its placeholder image first when in image mode.
    ///
    /// A failed render keeps the placeholder; the selection still moves.
    pub async fn select(&mut self, id: &str, renderer: &Renderer) -> Result<Outcome<()>, WorkbenchError> {
        let idx = self
            .assets
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| WorkbenchError::UnknownAsset(id.to_string()))?;

        let mut status = Outcome::Success(());
        if self.format == AssetFormat::Image && self.assets[idx].image.is_placeholder() {
            let prompt = self.assets[idx].render_prompt().to_string();
            let out = renderer.image(&prompt, renderer.aspect(), renderer.resolution()).await;
            status = out.status();
            match out.ok() {
                Some(img) => self.assets[idx].image = img,
                None => tracing::warn!(asset = %id, status = %status.label(), "lazy render failed, keeping placeholder"),
            }
        }

        self.selected = idx;
        self.overlay.headline = self.assets[idx].title.to_uppercase();
        Ok(status)
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.overlay.mode = mode;
    }

    /// Text edits apply only while the editor is in text mode.
    pub fn edit_headline(&mut self, text: &str) -> Result<(), WorkbenchError> {
        if self.overlay.mode != EditorMode::Text {
            return Err(WorkbenchError::InvalidTransition { from: "view", to: "text-edit" });
        }
        self.overlay.headline = text.to_string();
        Ok(())
    }

    pub fn edit_caption(&mut self, text: &str) -> Result<(), WorkbenchError> {
        if self.overlay.mode != EditorMode::Text {
            return Err(WorkbenchError::InvalidTransition { from: "view", to: "text-edit" });
        }
        self.overlay.caption = text.to_string();
        Ok(())
    }
}

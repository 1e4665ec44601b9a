//! Create Digital Advert: brief -> Kim prompt -> approval -> concepts -> gallery.

use tokio_util::sync::CancellationToken;

use crate::concepts::{render_hero, ConceptGenerator};
use crate::config::Config;
use crate::errors::{Outcome, Resolved, WorkbenchError};
use crate::gallery::Gallery;
use crate::model::{AssetFormat, MarketingRequest, RequestPrefill};
use crate::optimize::Kim;
use crate::provider::DynProvider;
use crate::render::Renderer;
use crate::wire::SeedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Brief,
    Approval,
    Generating,
    Editing,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Brief => "brief",
            Stage::Approval => "approval",
            Stage::Generating => "generating",
            Stage::Editing => "editing",
        }
    }

    /// Allowed edges of the advert workflow.
    pub fn can_move_to(&self, next: Stage) -> bool {
        use Stage::*;
        matches!(
            (*self, next),
            (Brief, Approval)
                | (Approval, Approval)
                | (Approval, Brief)
                | (Approval, Generating)
                | (Generating, Editing)
                | (Editing, Brief)
                | (Editing, Approval)
        )
    }
}

/// Degradation notes from one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub concepts: Outcome<()>,
    pub hero: Outcome<()>,
}

pub struct AdvertWorkflow {
    pub request: MarketingRequest,
    pub format: AssetFormat,
    pub guidelines: bool,
    /// Reference frame for video renders.
    pub seed_image: Option<SeedImage>,
    stage: Stage,
    master_prompt: Option<Resolved<String>>,
    gallery: Option<Gallery>,
    kim: Kim,
    concepts: ConceptGenerator,
    renderer: Renderer,
}

impl AdvertWorkflow {
    pub fn new(provider: DynProvider, cfg: &Config, prefill: Option<&RequestPrefill>) -> Self {
        Self {
            request: MarketingRequest::from_prefill(prefill),
            format: AssetFormat::Image,
            guidelines: cfg.guidelines_active,
            seed_image: None,
            stage: Stage::Brief,
            master_prompt: None,
            gallery: None,
            kim: Kim::new(provider.clone(), cfg.models.text.clone()),
            concepts: ConceptGenerator::new(provider.clone(), cfg.models.reasoning.clone(), cfg.concept_batch_size),
            renderer: Renderer::new(provider, cfg),
        }
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn master_prompt(&self) -> Option<&Resolved<String>> {
        self.master_prompt.as_ref()
    }

    pub fn gallery(&self) -> Option<&Gallery> {
        self.gallery.as_ref()
    }

    pub fn gallery_mut(&mut self) -> Option<&mut Gallery> {
        self.gallery.as_mut()
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    fn move_to(&mut self, next: Stage) -> Result<(), WorkbenchError> {
        if !self.stage.can_move_to(next) {
            return Err(WorkbenchError::InvalidTransition { from: self.stage.name(), to: next.name() });
        }
        tracing::debug!(from = self.stage.name(), to = next.name(), "advert stage");
        self.stage = next;
        Ok(())
    }

    pub fn can_consult(&self) -> bool {
        self.request.has_brief() && matches!(self.stage, Stage::Brief | Stage::Approval)
    }

    /// Ask Kim for a master prompt; also serves as "Regenerate" while approving.
    pub async fn consult_kim(&mut self, context: Option<&str>) -> Result<&Resolved<String>, WorkbenchError> {
        if !self.request.has_brief() {
            return Err(WorkbenchError::MissingInput("brief description"));
        }
        if !self.stage.can_move_to(Stage::Approval) {
            return Err(WorkbenchError::InvalidTransition { from: self.stage.name(), to: Stage::Approval.name() });
        }
        let optimized = self.kim.optimize(&self.request.description, self.guidelines, context).await;
        self.move_to(Stage::Approval)?;
        Ok(self.master_prompt.insert(optimized))
    }

    /// Manual edit of the master prompt before approval.
    pub fn edit_master_prompt(&mut self, text: &str) -> Result<(), WorkbenchError> {
        if self.stage != Stage::Approval {
            return Err(WorkbenchError::InvalidTransition { from: self.stage.name(), to: "prompt-edit" });
        }
        if text.trim().is_empty() {
            return Err(WorkbenchError::MissingInput("master prompt"));
        }
        self.master_prompt = Some(Resolved::live(text.trim().to_string()));
        Ok(())
    }

    /// Approve the prompt: generate concepts, render the hero, open the gallery.
    pub async fn approve_and_generate(&mut self, cancel: &CancellationToken) -> Result<GenerationReport, WorkbenchError> {
        self.move_to(Stage::Generating)?;
        let prompt = self.master_prompt.as_ref().map(|p| p.value.clone());

        let batch = self.concepts.generate(&self.request, prompt.as_deref()).await;
        let mut assets = batch.value;
        let hero = if cancel.is_cancelled() {
            Outcome::Cancelled
        } else {
            render_hero(&self.renderer, &mut assets, self.format, self.seed_image.clone(), cancel).await
        };

        let gallery = Gallery::new(assets, self.format, &self.request.location)?;
        self.gallery = Some(gallery);
        self.move_to(Stage::Editing)?;
        Ok(GenerationReport { concepts: batch.status, hero })
    }

    /// Lazy-upgrading selection in the gallery.
    pub async fn select(&mut self, id: &str) -> Result<Outcome<()>, WorkbenchError> {
        if self.stage != Stage::Editing {
            return Err(WorkbenchError::InvalidTransition { from: self.stage.name(), to: "select" });
        }
        let gallery = self.gallery.as_mut().ok_or(WorkbenchError::MissingInput("gallery"))?;
        gallery.select(id, &self.renderer).await
    }

    /// Back to approval with the current prompt (Editing) or to the form.
    pub fn back(&mut self) -> Result<(), WorkbenchError> {
        match self.stage {
            Stage::Approval => self.move_to(Stage::Brief),
            Stage::Editing => {
                self.gallery = None;
                self.move_to(Stage::Approval)
            }
            other => Err(WorkbenchError::InvalidTransition { from: other.name(), to: "back" }),
        }
    }

    /// Start over with the same form data.
    pub fn restart(&mut self) -> Result<(), WorkbenchError> {
        self.move_to(Stage::Brief)?;
        self.gallery = None;
        self.master_prompt = None;
        Ok(())
    }
}

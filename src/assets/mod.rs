use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::{Outcome, WorkbenchError};

pub const ASSET_TYPES: [&str; 5] = [
    "Social Media Profile Graphics",
    "Email Template Headers",
    "Website Hero Images",
    "Print Collateral (PDF)",
    "Event Banners (Large Format)",
];

pub const THEMES: [&str; 3] = ["Seasonal", "Corporate", "Leisure"];

pub const PACKAGE_ASSETS: usize = 5;
pub const PACKAGE_BYTES: u64 = 158_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Generating,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageSummary {
    pub kind: &'static str,
    pub theme: &'static str,
    pub assets: usize,
    pub bytes: u64,
}

impl PackageSummary {
    pub fn size_label(&self) -> String {
        humansize::format_size(self.bytes, humansize::DECIMAL)
    }
}

/// Quick asset builder. The build is simulated with a fixed delay.
pub struct AssetLab {
    kind: usize,
    theme: usize,
    build_time: Duration,
    stage: Stage,
    package: Option<PackageSummary>,
}

impl AssetLab {
    pub fn new(build_time: Duration) -> Self {
        Self { kind: 0, theme: 0, build_time, stage: Stage::Idle, package: None }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn package(&self) -> Option<&PackageSummary> {
        self.package.as_ref()
    }

    pub fn kind(&self) -> &'static str {
        ASSET_TYPES[self.kind]
    }

    pub fn theme(&self) -> &'static str {
        THEMES[self.theme]
    }

    /// Case-insensitive match against the known asset types.
    pub fn set_kind(&mut self, name: &str) -> Result<(), WorkbenchError> {
        self.kind = lookup(&ASSET_TYPES, name).ok_or(WorkbenchError::MissingInput("known asset type"))?;
        Ok(())
    }

    pub fn set_theme(&mut self, name: &str) -> Result<(), WorkbenchError> {
        self.theme = lookup(&THEMES, name).ok_or(WorkbenchError::MissingInput("known visual theme"))?;
        Ok(())
    }

    pub async fn generate(&mut self, cancel: &CancellationToken) -> Result<Outcome<PackageSummary>, WorkbenchError> {
        match self.stage {
            Stage::Idle => {}
            Stage::Generating => return Err(WorkbenchError::Busy("package build in progress")),
            Stage::Completed => return Err(WorkbenchError::InvalidTransition { from: "completed", to: "generating" }),
        }
        self.stage = Stage::Generating;
        tracing::info!(kind = self.kind(), theme = self.theme(), "building asset package");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.stage = Stage::Idle;
                return Ok(Outcome::Cancelled);
            }
            _ = tokio::time::sleep(self.build_time) => {}
        }

        let pkg = PackageSummary { kind: self.kind(), theme: self.theme(), assets: PACKAGE_ASSETS, bytes: PACKAGE_BYTES };
        self.package = Some(pkg.clone());
        self.stage = Stage::Completed;
        Ok(Outcome::Success(pkg))
    }

    /// "Create new batch".
    pub fn reset(&mut self) {
        self.stage = Stage::Idle;
        self.package = None;
    }
}

fn lookup(options: &[&str], name: &str) -> Option<usize> {
    let name = name.trim();
    options
        .iter()
        .position(|o| o.eq_ignore_ascii_case(name))
        .or_else(|| {
            let lower = name.to_lowercase();
            options.iter().position(|o| !lower.is_empty() && o.to_lowercase().starts_with(&lower))
        })
}

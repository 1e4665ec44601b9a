use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::model::AssetFormat;
use crate::wire::{AspectRatio, Resolution};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[value(alias = "google")]
    Gemini,
    #[value(alias = "mock")]
    Offline,
}

#[derive(Parser, Debug)]
#[command(name = "creative_workbench", version, about = "Hotel campaign creative console: brief, prompt, concepts, assets")]
pub struct Args {
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, value_enum, global = true)]
    pub provider: Option<ProviderKind>,

    #[arg(long, default_value_t = false, global = true)]
    pub debug: bool,

    #[arg(long, default_value_t = false, global = true)]
    pub save_artifacts: bool,

    #[arg(long, default_value_t = false, global = true)]
    pub auto_approve: bool,

    /// Framing for rendered images and videos
    #[arg(long, value_enum, global = true)]
    pub aspect: Option<AspectRatio>,

    /// Image size tier
    #[arg(long, value_enum, global = true)]
    pub resolution: Option<Resolution>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive console across all screens
    Console,
    /// Brief -> Kim prompt -> concepts -> hero render -> gallery
    Advert(AdvertArgs),
    /// One-shot campaign idea brainstorm
    Ideas(IdeasArgs),
    /// Idea Lab chat
    Chat(ChatArgs),
    /// Asset package builder
    Assets(AssetsArgs),
    /// Performance dashboard
    Analytics,
}

#[derive(ClapArgs, Debug, Default)]
pub struct AdvertArgs {
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long, value_enum, default_value_t = AssetFormat::Image)]
    pub format: AssetFormat,

    #[arg(long, default_value_t = false)]
    pub no_guidelines: bool,

    /// Reference image for video renders
    #[arg(long)]
    pub seed_image: Option<String>,
}

#[derive(ClapArgs, Debug)]
pub struct IdeasArgs {
    #[arg(long)]
    pub context: String,

    #[arg(long, default_value = "Increase Direct Bookings")]
    pub goal: String,
}

#[derive(ClapArgs, Debug)]
pub struct ChatArgs {
    #[arg(long, default_value_t = false)]
    pub grounding: bool,
}

#[derive(ClapArgs, Debug)]
pub struct AssetsArgs {
    #[arg(long, default_value = "Social Media Profile Graphics")]
    pub kind: String,

    #[arg(long, default_value = "Seasonal")]
    pub theme: String,
}

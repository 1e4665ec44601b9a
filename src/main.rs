use anyhow::Context;
use clap::Parser;
use std::path::Path;
use tokio_util::sync::CancellationToken;

mod advert;
mod analytics;
mod assets;
mod cli;
mod concepts;
mod config;
mod console;
mod context;
mod errors;
mod gallery;
mod ideas;
mod log;
mod model;
mod nav;
mod optimize;
mod prompt;
mod provider;
mod render;
mod ux;
mod wire;

use cli::Command;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    dotenvy::dotenv().ok();
    log::init_tracing(args.debug);
    ux::exit_on_idle_interrupt();

    let mut cfg = config::Config::load(args.config.as_deref().map(Path::new))
        .context("loading configuration")?;
    if let Some(p) = args.provider {
        cfg.provider = p;
    }
    if args.save_artifacts {
        cfg.save_artifacts = true;
    }
    if let Some(a) = args.aspect {
        cfg.aspect_ratio = a;
    }
    if let Some(r) = args.resolution {
        cfg.image_resolution = r;
    }

    let provider = provider::make_provider(cfg.provider, &cfg)?;
    let session = log::Session::new(&cfg);
    tracing::debug!(
        session = %session.id,
        provider = provider.name(),
        artifacts = session.enabled(),
        dir = %session.dir().display(),
        "session started"
    );

    let app = console::App { cfg, provider, session, auto_approve: args.auto_approve };
    let cancel = CancellationToken::new();

    match args.command.unwrap_or(Command::Console) {
        Command::Console => console::run_console(&app).await?,
        Command::Advert(a) => console::run_advert(&app, None, Some(&a), &cancel).await?,
        Command::Ideas(a) => {
            if let Some(prefill) = console::run_ideas(&app, &a.context, Some(a.goal.as_str())).await? {
                console::run_advert(&app, Some(&prefill), None, &cancel).await?;
            }
        }
        Command::Chat(a) => {
            if let Some(prefill) = console::run_chat(&app, a.grounding, &cancel).await? {
                console::run_advert(&app, Some(&prefill), None, &cancel).await?;
            }
        }
        Command::Assets(a) => console::run_assets(&app, Some(a.kind.as_str()), Some(a.theme.as_str()), &cancel).await?,
        Command::Analytics => ux::show_analytics(),
    }

    if app.session.enabled() {
        println!("artifacts: {}", app.session.dir().display());
    }
    Ok(())
}

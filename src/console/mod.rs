//! Terminal drivers for each screen, plus the navigator loop tying them together.

use anyhow::Context;
use colored::Colorize;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::advert::{AdvertWorkflow, Stage};
use crate::assets::{AssetLab, ASSET_TYPES, THEMES};
use crate::cli::AdvertArgs;
use crate::config::Config;
use crate::gallery::EditorMode;
use crate::ideas::chat::ChatSession;
use crate::ideas::voice::FileCapture;
use crate::ideas::{Brainstorm, GOALS};
use crate::log::Session;
use crate::model::{AssetFormat, RequestPrefill};
use crate::nav::{Navigator, Screen};
use crate::provider::DynProvider;
use crate::{context, ux};

const MAX_SEED_BYTES: usize = 20_000_000;
const MAX_VOICE_BYTES: usize = 20_000_000;

/// Everything a screen needs for one run of the binary.
pub struct App {
    pub cfg: Config,
    pub provider: DynProvider,
    pub session: Session,
    pub auto_approve: bool,
}

impl App {
    fn save_stage<T: serde::Serialize>(&self, stage: &str, value: &T) {
        match self.session.save_stage(stage, value) {
            Ok(Some(p)) => tracing::debug!(path = %p.display(), "artifact written"),
            Ok(None) => {}
            Err(e) => tracing::warn!(stage, error = %e, "could not save artifact"),
        }
    }
}

// ===== Navigator =====

pub async fn run_console(app: &App) -> anyhow::Result<()> {
    let mut nav = Navigator::new();
    println!(
        "{}  {}",
        "MACDONALD CREATIVE WORKBENCH".yellow().bold(),
        format!("engine: {}", app.provider.name()).dimmed()
    );
    loop {
        heading_menu(&nav);
        let Some(choice) = ux::read_line(">") else { return Ok(()) };
        let screen = match choice.as_str() {
            "1" => Screen::AdvertCreation,
            "2" => Screen::AssetLab,
            "3" => Screen::IdeaLab,
            "4" => Screen::Analytics,
            "q" | "quit" => return Ok(()),
            _ => continue,
        };
        nav.navigate(screen);
        let cancel = nav.cancel_token();

        let promoted = match screen {
            Screen::AdvertCreation => {
                let prefill = nav.take_prefill();
                run_advert(app, prefill.as_ref(), None, &cancel).await?;
                None
            }
            Screen::AssetLab => {
                run_assets(app, None, None, &cancel).await?;
                None
            }
            Screen::IdeaLab => run_idea_lab(app, &cancel).await?,
            Screen::Analytics => {
                ux::show_analytics();
                None
            }
            Screen::Home => None,
        };

        match promoted {
            Some(p) => {
                nav.promote_prefill(p);
                let cancel = nav.cancel_token();
                let prefill = nav.take_prefill();
                run_advert(app, prefill.as_ref(), None, &cancel).await?;
                nav.navigate(Screen::Home);
            }
            None => nav.navigate(Screen::Home),
        }
    }
}

fn heading_menu(nav: &Navigator) {
    ux::heading(nav.current().title(), "Select a module");
    for (i, s) in Screen::ALL.iter().skip(1).enumerate() {
        println!("  {}. {}", i + 1, s.title());
    }
    println!("  q. Quit");
}

// ===== Create Advert =====

fn apply_args(wf: &mut AdvertWorkflow, args: &AdvertArgs) -> anyhow::Result<()> {
    if let Some(v) = &args.name { wf.request.name = v.clone(); }
    if let Some(v) = &args.description { wf.request.description = v.clone(); }
    if let Some(v) = &args.location { wf.request.location = v.clone(); }
    wf.format = args.format;
    if args.no_guidelines {
        wf.guidelines = false;
    }
    if let Some(path) = &args.seed_image {
        let blob = context::load_media(Path::new(path), MAX_SEED_BYTES)
            .with_context(|| format!("loading seed image {path}"))?;
        wf.seed_image = Some(blob.into());
    }
    Ok(())
}

fn fill_brief(wf: &mut AdvertWorkflow) -> Option<()> {
    let r = &mut wf.request;
    r.name = ux::read_or("Campaign name", &r.name)?;
    r.location = ux::read_or("Location", &r.location)?;
    r.kind = ux::read_or("Type", &r.kind)?;
    let impact = ux::read_or("Impact level 0-100", &r.impact_level().to_string())?;
    if let Ok(v) = impact.parse::<i64>() {
        r.set_impact_level(v);
    }
    while !r.has_brief() {
        r.description = ux::read_or("Brief description", &r.description)?;
    }
    let format = ux::read_or("Format (image/video/audio)", "image")?;
    wf.format = match format.to_lowercase().as_str() {
        "video" => AssetFormat::Video,
        "audio" => AssetFormat::Audio,
        _ => AssetFormat::Image,
    };
    Some(())
}

pub async fn run_advert(
    app: &App,
    prefill: Option<&RequestPrefill>,
    args: Option<&AdvertArgs>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    ux::heading("Create Digital Advert", "Brief -> Agent Kim -> Concepts");
    let mut wf = AdvertWorkflow::new(app.provider.clone(), &app.cfg, prefill);
    if let Some(a) = args {
        apply_args(&mut wf, a)?;
    }

    let mut skip_form = args.is_some() || app.auto_approve;
    loop {
        if cancel.is_cancelled() {
            println!("{}", "Cancelled, returning home".dimmed());
            return Ok(());
        }
        match wf.stage() {
            Stage::Brief => {
                if (!skip_form || !wf.request.has_brief()) && fill_brief(&mut wf).is_none() {
                    return Ok(());
                }
                skip_form = false;
                app.save_stage("brief", &wf.request);
                ux::with_spinner("Agent Kim is optimizing your brief...", wf.consult_kim(None)).await?;
            }
            Stage::Approval => {
                if let Some(p) = wf.master_prompt() {
                    ux::show_master_prompt(p);
                    app.save_stage("prompt", &p.value);
                }
                if app.auto_approve {
                    generate(app, &mut wf, cancel).await?;
                    continue;
                }
                let Some(cmd) = ux::read_line("[a]pprove  [e]dit  [r]egenerate  [g]uidelines  [b]ack  [q]uit >") else {
                    return Ok(());
                };
                match cmd.as_str() {
                    "a" => generate(app, &mut wf, cancel).await?,
                    "e" => {
                        let Some(text) = ux::read_line("New prompt:") else { return Ok(()) };
                        if let Err(e) = wf.edit_master_prompt(&text) {
                            println!("{}", e.to_string().red());
                        }
                    }
                    "r" => {
                        let ctx = ux::read_line("Extra context (optional):").filter(|c| !c.is_empty());
                        ux::with_spinner("Regenerating...", wf.consult_kim(ctx.as_deref())).await?;
                    }
                    "g" => {
                        wf.guidelines = !wf.guidelines;
                        println!("Brand guidelines {}", if wf.guidelines { "on" } else { "off" });
                    }
                    "b" => wf.back()?,
                    "q" => return Ok(()),
                    _ => {}
                }
            }
            Stage::Editing => {
                if app.auto_approve {
                    return Ok(());
                }
                if !edit_gallery(&mut wf).await? {
                    return Ok(());
                }
            }
            Stage::Generating => anyhow::bail!("advert workflow left in generation"),
        }
    }
}

async fn generate(app: &App, wf: &mut AdvertWorkflow, cancel: &CancellationToken) -> anyhow::Result<()> {
    let msg = match wf.format {
        AssetFormat::Video => "Generating concepts and rendering the hero video (this can take minutes)...",
        AssetFormat::Audio => "Generating concepts and synthesizing the hero voice track...",
        AssetFormat::Image => "Generating concepts and rendering the hero image...",
    };
    let report = ux::cancellable(msg, cancel, wf.approve_and_generate(cancel)).await?;
    ux::print_status("concepts", &report.concepts);
    ux::print_status("hero", &report.hero);

    if let Some(g) = wf.gallery() {
        app.save_stage("concepts", &g.assets());
        let hero = g.hero();
        if let Err(e) = app.session.save_media("hero", hero.primary_media()) {
            tracing::warn!(error = %e, "could not save hero media");
        }
        ux::show_gallery(g);
    }
    Ok(())
}

/// One editor command. Returns false when the user leaves the screen.
async fn edit_gallery(wf: &mut AdvertWorkflow) -> anyhow::Result<bool> {
    let Some(cmd) = ux::read_line("[#] select  [t]ext  [c]rop  [v]iew  [b]ack  [n]ew  [q]uit >") else {
        return Ok(false);
    };
    match cmd.as_str() {
        "q" => return Ok(false),
        "b" => wf.back()?,
        "n" => wf.restart()?,
        "v" | "c" => {
            if let Some(g) = wf.gallery_mut() {
                g.set_mode(if cmd == "v" { EditorMode::View } else { EditorMode::Crop });
            }
        }
        "t" => {
            if let Some(g) = wf.gallery_mut() {
                g.set_mode(EditorMode::Text);
                if let Some(h) = ux::read_line("Headline:").filter(|h| !h.is_empty()) {
                    g.edit_headline(&h)?;
                }
                if let Some(c) = ux::read_line("Caption:").filter(|c| !c.is_empty()) {
                    g.edit_caption(&c)?;
                }
                g.set_mode(EditorMode::View);
                ux::show_gallery(g);
            }
        }
        n => {
            let id = n
                .parse::<usize>()
                .ok()
                .and_then(|i| wf.gallery().and_then(|g| g.assets().get(i.wrapping_sub(1))))
                .map(|a| a.id.clone());
            if let Some(id) = id {
                let status = ux::with_spinner("Loading concept...", wf.select(&id)).await?;
                if !status.is_success() {
                    ux::print_status("render", &status);
                }
                if let Some(g) = wf.gallery() {
                    ux::show_gallery(g);
                }
            }
        }
    }
    Ok(true)
}

// ===== Create Assets =====

pub async fn run_assets(
    app: &App,
    kind: Option<&str>,
    theme: Option<&str>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    ux::heading("Create Digital Assets", "Quick asset builder");
    let mut lab = AssetLab::new(Duration::from_secs(app.cfg.asset_build_secs));

    match kind {
        Some(k) => {
            if let Err(e) = lab.set_kind(k) {
                println!("{} (using {})", e.to_string().red(), lab.kind());
            }
        }
        None => {
            for (i, t) in ASSET_TYPES.iter().enumerate() {
                println!("  {}. {}", i + 1, t);
            }
            loop {
                let Some(k) = ux::read_or("Asset type", lab.kind()) else { return Ok(()) };
                match lab.set_kind(&pick(&ASSET_TYPES, &k)) {
                    Ok(()) => break,
                    Err(e) => println!("{}", e.to_string().red()),
                }
            }
        }
    }
    match theme {
        Some(t) => {
            if let Err(e) = lab.set_theme(t) {
                println!("{} (using {})", e.to_string().red(), lab.theme());
            }
        }
        None => loop {
            let Some(t) = ux::read_or("Visual theme (Seasonal/Corporate/Leisure)", lab.theme()) else { return Ok(()) };
            match lab.set_theme(&pick(&THEMES, &t)) {
                Ok(()) => break,
                Err(e) => println!("{}", e.to_string().red()),
            }
        },
    }

    loop {
        let out = ux::cancellable("Processing request...", cancel, lab.generate(cancel)).await?;
        match out.ok() {
            Some(pkg) => ux::show_package(&pkg),
            None => {
                println!("{}", "Build cancelled".dimmed());
                return Ok(());
            }
        }
        if app.auto_approve || !ux::confirm("Create new batch?") {
            return Ok(());
        }
        lab.reset();
    }
}

/// Accept either a 1-based menu number or a name.
fn pick(options: &[&str], answer: &str) -> String {
    answer
        .parse::<usize>()
        .ok()
        .and_then(|i| options.get(i.wrapping_sub(1)))
        .map(|s| s.to_string())
        .unwrap_or_else(|| answer.to_string())
}

// ===== Idea Lab =====

async fn run_idea_lab(app: &App, cancel: &CancellationToken) -> anyhow::Result<Option<RequestPrefill>> {
    let Some(mode) = ux::read_line("Idea Lab: [b]rainstorm or [c]hat >") else { return Ok(None) };
    if mode == "c" {
        return run_chat(app, false, cancel).await;
    }
    let Some(ctx) = ux::read_line("Context:") else { return Ok(None) };
    for (i, g) in GOALS.iter().enumerate() {
        println!("  {}. {}", i + 1, g);
    }
    let Some(goal) = ux::read_or("Goal", GOALS[0]) else { return Ok(None) };
    let goal = pick(&GOALS, &goal);
    run_ideas(app, &ctx, Some(goal.as_str())).await
}

pub async fn run_ideas(app: &App, ctx: &str, goal: Option<&str>) -> anyhow::Result<Option<RequestPrefill>> {
    ux::heading("Idea Lab", "Campaign brainstorm");
    let brainstorm = Brainstorm::new(app.provider.clone(), app.cfg.models.text.clone(), app.cfg.idea_count);
    let ideas = ux::with_spinner("Brainstorming...", brainstorm.generate(ctx, goal)).await;
    ux::show_ideas(&ideas);
    app.save_stage("ideas", &ideas.value);

    if ideas.value.is_empty() || app.auto_approve {
        return Ok(None);
    }
    let Some(ans) = ux::read_line("Promote idea # to an advert (blank to skip):") else { return Ok(None) };
    Ok(ans
        .parse::<usize>()
        .ok()
        .and_then(|i| ideas.value.get(i.wrapping_sub(1)))
        .map(RequestPrefill::from))
}

pub async fn run_chat(app: &App, grounding: bool, cancel: &CancellationToken) -> anyhow::Result<Option<RequestPrefill>> {
    ux::heading("Idea Lab", "Chat with your creative partner");
    println!("{}", "/voice <file>  /grounding  /promote <n>  /quit  (blank line sends a transcribed note)".dimmed());
    let mut chat = ChatSession::new(app.provider.clone(), app.cfg.models.text.clone());
    chat.grounding = grounding;

    loop {
        let prompt = if chat.grounding { "you (grounded)>" } else { "you>" };
        let Some(line) = ux::read_line(prompt) else { break };

        if let Some(path) = line.strip_prefix("/voice ") {
            if let Err(e) = chat.start_recording(Box::new(FileCapture::new(path.trim(), MAX_VOICE_BYTES))) {
                println!("{}", e.to_string().red());
                continue;
            }
            let status = ux::with_spinner("Transcribing...", chat.stop_recording()).await?;
            ux::print_status("transcription", &status);
            if !chat.input.is_empty() {
                println!("{} {}", "pending:".dimmed(), chat.input);
            }
            continue;
        }
        if let Some(n) = line.strip_prefix("/promote ") {
            match n.trim().parse::<usize>().ok().and_then(|i| chat.promote(i)) {
                Some(p) => {
                    app.save_stage("chat", &chat.transcript());
                    return Ok(Some(p));
                }
                None => println!("{}", "only AI replies can be promoted".yellow()),
            }
            continue;
        }
        match line.as_str() {
            "/quit" => break,
            "/grounding" => {
                chat.grounding = !chat.grounding;
                continue;
            }
            "" if chat.input.is_empty() => continue,
            "" => {}
            text => {
                if !chat.input.is_empty() {
                    chat.input.push(' ');
                }
                chat.input.push_str(text);
            }
        }

        let before = chat.transcript().len();
        let status = ux::cancellable("Thinking...", cancel, chat.send(cancel)).await?;
        if !status.is_success() {
            ux::print_status("reply", &status);
        }
        for (i, e) in chat.transcript().iter().enumerate().skip(before) {
            ux::show_chat_entry(i, e);
        }
        if cancel.is_cancelled() {
            break;
        }
    }
    app.save_stage("chat", &chat.transcript());
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::scripted::ScriptedProvider;

    fn app(provider: std::sync::Arc<ScriptedProvider>) -> App {
        let cfg = Config { asset_build_secs: 0, ..Config::default() };
        let session = Session::new(&cfg);
        App { cfg, provider, session, auto_approve: true }
    }

    #[tokio::test]
    async fn unknown_asset_type_keeps_default_and_builds() {
        let app = app(ScriptedProvider::new());
        let kind = pick(&ASSET_TYPES, "0");
        let res = run_assets(&app, Some(kind.as_str()), Some("Seasonal"), &CancellationToken::new()).await;
        assert!(res.is_ok());
        let res = run_assets(&app, Some(ASSET_TYPES[1]), Some("neon"), &CancellationToken::new()).await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn cancelled_advert_screen_returns_before_any_call() {
        let p = ScriptedProvider::new();
        let app = app(p.clone());
        let args = AdvertArgs { description: Some("Spa weekend".into()), ..AdvertArgs::default() };
        let cancel = CancellationToken::new();
        cancel.cancel();
        run_advert(&app, None, Some(&args), &cancel).await.unwrap();
        assert_eq!(p.text_count(), 0);
        assert_eq!(p.image_count(), 0);
    }

    #[tokio::test]
    async fn cancelled_asset_build_leaves_screen() {
        let app = app(ScriptedProvider::new());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(run_assets(&app, Some(ASSET_TYPES[0]), Some(THEMES[0]), &cancel).await.is_ok());
    }

    #[test]
    fn pick_accepts_numbers_and_names() {
        assert_eq!(pick(&GOALS, "2"), "Drive Off-Peak Revenue");
        assert_eq!(pick(&GOALS, "Build Brand Loyalty"), "Build Brand Loyalty");
        assert_eq!(pick(&GOALS, "0"), "0");
        assert_eq!(pick(&GOALS, "9"), "9");
    }

    #[test]
    fn seed_image_args_are_loaded() {
        let mut f = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        std::io::Write::write_all(&mut f, b"\x89PNG").unwrap();
        let cfg = Config::default();
        let p = ScriptedProvider::new();
        let mut wf = AdvertWorkflow::new(p, &cfg, None);
        let args = AdvertArgs {
            description: Some("Spa".into()),
            format: AssetFormat::Video,
            no_guidelines: true,
            seed_image: Some(f.path().display().to_string()),
            ..AdvertArgs::default()
        };
        apply_args(&mut wf, &args).unwrap();
        assert_eq!(wf.format, AssetFormat::Video);
        assert!(!wf.guidelines);
        assert_eq!(wf.seed_image.as_ref().map(|s| s.mime.as_str()), Some("image/png"));
    }
}

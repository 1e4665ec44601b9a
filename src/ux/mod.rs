use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::future::Future;
use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::analytics::{self, AB_TEST, BOOKINGS_TREND, KPIS};
use crate::assets::PackageSummary;
use crate::errors::{Outcome, Resolved};
use crate::gallery::Gallery;
use crate::model::{ChatEntry, GeneratedIdea, Role};

pub fn heading(title: &str, subtitle: &str) {
    println!("\n{} {}", "┃".yellow().bold(), title.to_uppercase().bold());
    if !subtitle.is_empty() {
        println!("{} {}", "┃".yellow().bold(), subtitle.dimmed());
    }
}

/// Colored one-word status for a boundary outcome.
pub fn status<T>(o: &Outcome<T>) -> String {
    match o {
        Outcome::Success(_) => o.label().green().to_string(),
        Outcome::Unavailable(_) => o.label().yellow().to_string(),
        Outcome::Cancelled => o.label().dimmed().to_string(),
        _ => o.label().red().to_string(),
    }
}

pub fn print_status<T>(what: &str, o: &Outcome<T>) {
    println!("  {}: {}", what.bold(), status(o));
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.yellow} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Spinner shown while one provider call is in flight.
pub async fn with_spinner<F: Future>(msg: &str, fut: F) -> F::Output {
    let pb = spinner(msg);
    let out = fut.await;
    pb.finish_and_clear();
    out
}

// ===== Interrupts =====

static JOBS_RUNNING: AtomicUsize = AtomicUsize::new(0);

/// Counts a cancellable job as running for as long as it is held.
struct Running;

impl Running {
    fn enter() -> Self {
        JOBS_RUNNING.fetch_add(1, Ordering::SeqCst);
        Running
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        JOBS_RUNNING.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn job_running() -> bool {
    JOBS_RUNNING.load(Ordering::SeqCst) > 0
}

/// Spinner over work bound to a screen's token. Ctrl-C cancels the token
/// and the work is still awaited so it can unwind to its cancelled outcome.
pub async fn cancellable<F: Future>(msg: &str, cancel: &CancellationToken, fut: F) -> F::Output {
    let _running = Running::enter();
    let pb = spinner(&format!("{msg} (Ctrl-C to cancel)"));
    tokio::pin!(fut);
    let out = tokio::select! {
        biased;
        out = &mut fut => out,
        _ = cancel_on_interrupt(cancel) => {
            pb.set_message("Cancelling...");
            fut.await
        }
    };
    pb.finish_and_clear();
    out
}

async fn cancel_on_interrupt(cancel: &CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("interrupt received, cancelling screen work");
        cancel.cancel();
    } else {
        std::future::pending::<()>().await
    }
}

/// Ctrl-C outside a running job ends the process, as it would without a
/// handler installed.
pub fn exit_on_idle_interrupt() {
    tokio::spawn(async {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !job_running() {
                eprintln!();
                std::process::exit(130);
            }
        }
    });
}

pub fn show_master_prompt(p: &Resolved<String>) {
    println!("\n=== MASTER PROMPT ===");
    println!("{}", p.value.bold());
    if p.is_degraded() {
        println!("{}", format!("(fallback prompt, {})", p.status.label()).yellow());
    }
    println!();
}

pub fn show_gallery(g: &Gallery) {
    let hero = g.hero();
    println!("\n=== CONCEPTS ({}) ===", g.assets().len());
    println!(
        "{} {}  {}",
        "[HERO]".yellow().bold(),
        hero.title.bold(),
        hero.primary_media().describe().dimmed()
    );
    for (i, a) in g.assets().iter().enumerate() {
        let marker = if i == g.selected_index() { "▶".green().bold().to_string() } else { " ".into() };
        let media = if a.image.is_placeholder() { "placeholder".dimmed() } else { "rendered".green() };
        println!(
            "{} {:>2}. {:<48} CTR {:>5}  {:>6} impr  {}",
            marker,
            i + 1,
            truncate(&a.title, 48),
            a.stats.predicted_ctr,
            a.stats.impressions,
            media
        );
    }
    let sel = g.selected();
    println!("\n{} {}", "Selected:".bold(), sel.title);
    println!("  {}", sel.primary_media().describe());
    println!("  {} {}", "Headline:".bold(), g.overlay.headline);
    println!("  {} {}", "Caption:".bold(), g.overlay.caption);
}

pub fn show_ideas(ideas: &Resolved<Vec<GeneratedIdea>>) {
    println!("\n=== IDEAS ===");
    if ideas.value.is_empty() {
        println!("{}", "(no ideas generated)".dimmed());
    }
    for (i, idea) in ideas.value.iter().enumerate() {
        println!("{}. {}", i + 1, idea.title.bold());
        println!("   {}", idea.pitch);
        println!("   {} {}", "Visuals:".dimmed(), idea.visuals);
    }
    if ideas.is_degraded() {
        println!("{}", format!("({})", ideas.status.label()).yellow());
    }
}

pub fn show_chat_entry(index: usize, e: &ChatEntry) {
    let who = match e.role {
        Role::User => "you".cyan().bold(),
        Role::Ai => "ai".yellow().bold(),
    };
    println!("[{}] {}: {}", index, who, e.content);
    for link in &e.links {
        println!("      {} {}", "↗".dimmed(), link.underline());
    }
}

pub fn show_package(p: &PackageSummary) {
    println!("{}", "Generation Complete".green().bold());
    println!("  {} high-res {} assets, {} theme", p.assets, p.kind, p.theme);
    println!("  Download ZIP Package ({})", p.size_label());
}

pub fn show_analytics() {
    heading("Behaviour & Activity", "Performance intelligence");
    for k in KPIS {
        let change = if k.positive { k.change.green() } else { k.change.red() };
        println!("  {:<22} {:>8}  {} vs last month", k.title, k.value.bold(), change);
    }

    let winner = analytics::ab_winner().unwrap_or("none");
    println!("\n{} (winner: {})", "Creative A/B Test: Agency vs AI".bold(), winner.yellow());
    for r in AB_TEST {
        let max = r.agency.max(r.ai);
        println!("  {:<14} agency {:<20} {:>5}", r.metric, analytics::bar(r.agency, max, 20).dimmed(), r.agency);
        println!("  {:<14} ai     {:<20} {:>5}  {:+.0}%", "", analytics::bar(r.ai, max, 20).yellow(), r.ai, r.uplift_pct());
    }

    println!("\n{}", "Direct Bookings, last 7 days".bold());
    let max = BOOKINGS_TREND.iter().map(|(_, v)| *v).max().unwrap_or(0);
    for (day, v) in BOOKINGS_TREND {
        println!("  {day} {:<30} {v}", analytics::bar(v, max, 30).green());
    }
}

pub fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    let _ = io::stdout().flush();
    let mut s = String::new();
    if io::stdin().read_line(&mut s).is_ok() {
        let ans = s.trim().to_lowercase();
        ans == "y" || ans == "yes"
    } else {
        false
    }
}

/// Prompted line of input; `None` on EOF.
pub fn read_line(prompt: &str) -> Option<String> {
    print!("{} ", prompt.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim().to_string()),
    }
}

/// Prompted line with a default used when the answer is blank.
pub fn read_or(prompt: &str, default: &str) -> Option<String> {
    let ans = read_line(&format!("{prompt} [{default}]:"))?;
    Some(if ans.is_empty() { default.to_string() } else { ans })
}

fn truncate(s: &str, n: usize) -> String {
    if s.chars().count() <= n {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(n.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("Loch Lomond", 20), "Loch Lomond");
        assert_eq!(truncate("Ceilidh Nights Über Alles", 8).chars().count(), 8);
    }

    #[tokio::test]
    async fn cancellable_marks_job_running_and_returns_output() {
        let cancel = CancellationToken::new();
        let (seen, out) = cancellable("working", &cancel, async { (job_running(), 42) }).await;
        assert!(seen);
        assert_eq!(out, 42);
        assert!(!cancel.is_cancelled());
    }

    #[test]
    fn status_text_carries_label() {
        colored::control::set_override(false);
        assert_eq!(status(&Outcome::<()>::TimedOut { attempts: 4 }), "timed out after 4 polls");
    }
}

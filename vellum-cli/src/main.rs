//! Vellum demo driver
//!
//! Builds a small laid-out scene, renders it, then animates it for a few
//! frames, synchronizing the SVG output incrementally after each one.
//!
//! - `vellum`                 # print the final SVG markup
//! - `vellum --json -f 5`     # print one pass report per frame
//! - `vellum -c config.json`  # load a pipeline configuration

mod scene;

use std::path::PathBuf;

use clap::Parser;
use owo_colors::OwoColorize;
use tracing::Level;
use vellum_common::PipelineConfig;
use vellum_layout::Orientation;
use vellum_render::SyncReport;

use scene::Scene;

/// Vellum - incremental SVG rendering demo
#[derive(Parser, Debug)]
#[command(name = "vellum")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Render the demo scene and print the SVG
    vellum

    # Animate ten frames and print a JSON report per synchronization pass
    vellum --json --frames 10

    # Stack the cards vertically with a custom configuration
    vellum --orientation vertical -c pipeline.json

    # Show debug logs on stderr
    vellum -vv
"#)]
struct Cli {
    /// Pipeline configuration file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of animation frames after the first render
    #[arg(short, long, default_value = "3")]
    frames: usize,

    /// Number of cards in the scene
    #[arg(long, default_value = "4")]
    cards: usize,

    /// Stacking direction of the cards
    #[arg(long, default_value = "horizontal")]
    orientation: Orientation,

    /// Print the pass reports as JSON instead of the SVG markup
    #[arg(long)]
    json: bool,

    /// Summarize the recorded output mutations on stderr
    #[arg(long)]
    journal: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match cli.config {
        Some(ref path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    config.journal_mutations |= cli.journal;

    let mut scene = Scene::new(&config, cli.orientation, cli.cards)?;
    let mut reports = vec![scene.render()];
    for frame in 0..cli.frames {
        reports.push(scene.advance(frame));
    }

    for report in &reports {
        print_summary(report);
    }
    if cli.journal {
        print_journal(&scene);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("{}", scene.document().borrow().to_markup());
    }

    scene.dispose();
    Ok(())
}

/// One colored line per pass on stderr.
fn print_summary(report: &SyncReport) {
    eprintln!(
        "{} {:>2}  {} intervals ({} empty)  {} relinked  {} updated  {} stops  {} writes",
        "pass".bold(),
        report.pass,
        report.intervals.cyan(),
        report.empty_intervals,
        report.relinked.yellow(),
        report.drawables_updated.green(),
        report.stops_updated.magenta(),
        report.attribute_writes,
    );
}

/// Count the journaled mutations by kind.
fn print_journal(scene: &Scene) {
    let journal = scene.document().borrow_mut().take_journal();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for mutation in &journal {
        let kind = mutation.to_string();
        match counts.iter_mut().find(|(name, _)| *name == kind) {
            Some((_, count)) => *count += 1,
            None => counts.push((kind, 1)),
        }
    }
    eprintln!("{} {} mutations", "journal".bold(), journal.len());
    for (kind, count) in counts {
        eprintln!("  {:<18} {count}", kind.dimmed());
    }
}

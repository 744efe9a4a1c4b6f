//! Scrubline CLI
//!
//! Checks page files against their own layout and sweeps the scroll offset
//! through a headless page, printing one JSON sample per scroll position.

mod config;

use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use scrubline_core::value::PropertyMap;
use scrubline_scroll::headless::ManualClock;
use scrubline_scroll::{
    LandingPreset, Orchestrator, ProgressCallback, ProgressUpdate, RevealState, SceneConfig,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::config::PageFile;

/// Scroll-progress animation scenes, run headlessly
#[derive(Parser, Debug)]
#[command(name = "scrubline", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a page file and resolve its triggers against its layout
    Check {
        /// Page file (TOML)
        path: PathBuf,

        /// Run the landing page preset instead of the file's drivers
        #[arg(long)]
        preset: bool,
    },
    /// Sweep the scroll offset and print a JSON sample per position
    Simulate(SimulateArgs),
    /// Print the landing page preset as scene TOML
    Preset,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Page file (TOML)
    path: PathBuf,

    /// Run the landing page preset instead of the file's drivers
    #[arg(long)]
    preset: bool,

    /// Scroll distance between samples, in pixels
    #[arg(long, default_value_t = 100.0)]
    step: f32,

    /// Last scroll offset; defaults to the bottom of the document
    #[arg(long)]
    to: Option<f32>,

    /// Frames run at each scroll position before it is sampled
    #[arg(long, default_value_t = 1)]
    frames: u32,

    /// Frame interval in milliseconds
    #[arg(long, default_value_t = 16.0)]
    frame_ms: f64,

    /// Time the entrance timeline gets before scrolling starts
    #[arg(long, default_value_t = 2000.0)]
    settle_ms: f64,
}

/// One line of `simulate` output
#[derive(Serialize)]
struct Sample<'a> {
    time_ms: f64,
    scroll: f32,
    sections: IndexMap<&'a str, ProgressUpdate>,
    pinned: Vec<&'a str>,
    reveals: IndexMap<&'a str, Vec<RevealState>>,
    elements: IndexMap<&'a str, &'a PropertyMap>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check { path, preset } => cmd_check(&path, preset),
        Command::Simulate(args) => cmd_simulate(args),
        Command::Preset => cmd_preset(),
    }
}

fn load_scene(path: &Path, preset: bool) -> Result<(PageFile, SceneConfig)> {
    let file = PageFile::load(path)?;
    let scene = file.scene(preset);
    scene
        .validate()
        .with_context(|| format!("Invalid scene in {}", path.display()))?;
    Ok((file, scene))
}

fn cmd_check(path: &Path, preset: bool) -> Result<()> {
    let (file, scene) = load_scene(path, preset)?;
    let triggers: Vec<String> = scene.sections.iter().map(|s| s.scroll.trigger.to_string()).collect();
    let selectors: Vec<String> = scene.reveals.iter().map(|r| r.selector.to_string()).collect();
    let steps = scene.entrance.len();

    let (viewport, store) = file.page.build();
    let mut orchestrator = Orchestrator::new(viewport, store, ManualClock::new())?;
    let handles = scene
        .install(&mut orchestrator)
        .with_context(|| format!("Failed to install {}", path.display()))?;

    if handles.entrance.is_some() {
        println!("entrance: {} step(s)", steps);
    }
    for (trigger, &handle) in triggers.iter().zip(&handles.sections) {
        if let Some(region) = orchestrator.section_region(handle) {
            println!("section {}: scroll [{}, {})", trigger, region.start, region.end);
        }
    }
    for (selector, &handle) in selectors.iter().zip(&handles.reveals) {
        let count = orchestrator.reveal_states(handle).map_or(0, |states| states.len());
        println!("reveal {}: {} element(s)", selector, count);
    }
    println!("{}: ok", path.display());
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> Result<()> {
    if args.frame_ms <= 0.0 || args.step <= 0.0 {
        anyhow::bail!("--frame-ms and --step must be positive");
    }

    let (file, scene) = load_scene(&args.path, args.preset)?;
    let triggers: Vec<String> = scene.sections.iter().map(|s| s.scroll.trigger.to_string()).collect();
    let selectors: Vec<String> = scene.reveals.iter().map(|r| r.selector.to_string()).collect();

    let (viewport, store) = file.page.build();
    let mut orchestrator = Orchestrator::new(viewport, store, ManualClock::new())?;

    let latest: Rc<RefCell<Vec<Option<ProgressUpdate>>>> = Rc::new(RefCell::new(vec![None; triggers.len()]));
    let handles = scene
        .install_observed(&mut orchestrator, |index| {
            let latest = Rc::clone(&latest);
            let callback: ProgressCallback = Box::new(move |update: ProgressUpdate| {
                if let Some(slot) = latest.borrow_mut().get_mut(index) {
                    *slot = Some(update);
                }
            });
            Some(callback)
        })
        .with_context(|| format!("Failed to install {}", args.path.display()))?;

    let mut time_ms = 0.0;
    orchestrator.tick();
    while time_ms < args.settle_ms {
        orchestrator.clock_mut().advance(args.frame_ms);
        orchestrator.tick();
        time_ms += args.frame_ms;
    }

    let end = args
        .to
        .unwrap_or_else(|| file.page.document_height() - file.page.viewport.height)
        .max(0.0);
    let groups = file.page.group_keys();
    let mut out = std::io::stdout().lock();
    let mut scroll = 0.0_f32;

    loop {
        orchestrator.viewport_mut().scroll_to(scroll);
        for _ in 0..args.frames.max(1) {
            orchestrator.clock_mut().advance(args.frame_ms);
            orchestrator.tick();
            time_ms += args.frame_ms;
        }

        let updates = latest.borrow();
        let store = orchestrator.store();
        let sample = Sample {
            time_ms,
            scroll,
            sections: triggers
                .iter()
                .zip(updates.iter())
                .filter_map(|(trigger, update)| update.map(|u| (trigger.as_str(), u)))
                .collect(),
            pinned: triggers
                .iter()
                .zip(&handles.sections)
                .filter(|(_, handle)| orchestrator.is_pinned(**handle))
                .map(|(trigger, _)| trigger.as_str())
                .collect(),
            reveals: selectors
                .iter()
                .zip(&handles.reveals)
                .filter_map(|(selector, &handle)| {
                    orchestrator
                        .reveal_states(handle)
                        .map(|states| (selector.as_str(), states))
                })
                .collect(),
            elements: groups
                .iter()
                .filter_map(|&key| {
                    let first = store.group(key).first()?;
                    store
                        .properties(*first)
                        .filter(|props| !props.is_empty())
                        .map(|props| (key, props))
                })
                .collect(),
        };
        serde_json::to_writer(&mut out, &sample).context("Failed to write sample")?;
        writeln!(out)?;
        drop(updates);

        if scroll >= end {
            break;
        }
        scroll = (scroll + args.step).min(end);
    }

    for transition in orchestrator.take_pin_transitions() {
        tracing::debug!("pin transition: {:?}", transition);
    }
    Ok(())
}

fn cmd_preset() -> Result<()> {
    let toml = LandingPreset::scene()
        .to_toml()
        .context("Failed to serialize the landing preset")?;
    print!("{}", toml);
    Ok(())
}

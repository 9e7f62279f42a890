// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` feedback preview - headless preset runner
//!
//! Loads a RON preset, plays it once on a fixed timestep and reports:
//! - Player events as they happen
//! - Final values of every named target
//! - Observed versus computed duration
//!
//! ## Usage
//!
//! `ordoplay_feedback_preview <preset.ron> [--dt SECONDS] [--max-ticks N]
//! [--intensity X] [--backward] [--json]`

mod preset;

use indexmap::IndexMap;
use ordoplay_feedback::{Direction, Player, PlayerEvent};
use preset::{Preset, PresetError, Rig};
use serde::Serialize;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_DT: f32 = 1.0 / 60.0;
const DEFAULT_MAX_TICKS: u64 = 60 * 60;

#[derive(Debug)]
struct Options {
    preset: PathBuf,
    dt: f32,
    max_ticks: u64,
    intensity: Option<f32>,
    backward: bool,
    json: bool,
}

impl Options {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Self, String> {
        let mut preset = None;
        let mut options = Options {
            preset: PathBuf::new(),
            dt: DEFAULT_DT,
            max_ticks: DEFAULT_MAX_TICKS,
            intensity: None,
            backward: false,
            json: false,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--dt" => options.dt = parse_value(&arg, args.next())?,
                "--max-ticks" => options.max_ticks = parse_value(&arg, args.next())?,
                "--intensity" => options.intensity = Some(parse_value(&arg, args.next())?),
                "--backward" => options.backward = true,
                "--json" => options.json = true,
                flag if flag.starts_with("--") => return Err(format!("unknown flag {flag}")),
                _ => preset = Some(PathBuf::from(&arg)),
            }
        }

        options.preset = preset.ok_or("missing preset path")?;
        if options.dt <= 0.0 {
            return Err("--dt must be positive".into());
        }
        Ok(options)
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{flag} needs a value"))?;
    value.parse().map_err(|_| format!("invalid value '{value}' for {flag}"))
}

/// Summary of one preview run
#[derive(Debug, Serialize)]
struct Report {
    name: String,
    ticks: u64,
    elapsed: f32,
    total_duration: Option<f32>,
    completed: bool,
    events: usize,
    values: IndexMap<String, f32>,
}

fn log_event(player: &Player, event: &PlayerEvent) {
    match event {
        PlayerEvent::UnitSkipped { label, reason, .. } => {
            tracing::info!("[{:.3}s] skipped '{}': {:?}", player.clock(), label, reason);
        }
        other => tracing::info!("[{:.3}s] {:?}", player.clock(), other),
    }
}

fn run(options: &Options) -> Result<Report, PresetError> {
    let preset = Preset::load(&options.preset)?;
    let Rig {
        mut player,
        channel,
        values,
        responders,
    } = preset.build()?;
    tracing::info!(
        "Loaded '{}': {} units, {} responders",
        player.name(),
        player.unit_count(),
        responders.len()
    );

    if options.backward {
        player.set_direction(Direction::Backward);
    }
    let total_duration = player.try_total_duration().ok().filter(|_| !player.is_unbounded());
    match total_duration {
        Some(total) => tracing::info!("Computed duration {:.3}s", total),
        None => tracing::warn!("Sequence is unbounded, stopping after {} ticks", options.max_ticks),
    }

    let mut events = 0;
    let mut ticks = 0;
    player.play([0.0; 3], options.intensity);
    loop {
        for event in player.take_events() {
            log_event(&player, &event);
            events += 1;
        }
        if !player.is_playing() || ticks >= options.max_ticks {
            break;
        }
        player.tick(options.dt);
        channel.update(options.dt);
        ticks += 1;
    }

    let completed = !player.is_playing();
    if !completed {
        player.stop([0.0; 3]);
        events += player.take_events().len();
    }

    Ok(Report {
        name: player.name().to_string(),
        ticks,
        elapsed: ticks as f32 * options.dt,
        total_duration,
        completed,
        events,
        values: values
            .iter()
            .map(|(name, value)| (name.clone(), value.get()))
            .collect(),
    })
}

fn main() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("ordoplay_feedback=debug,ordoplay_feedback_preview=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!(
                "usage: ordoplay_feedback_preview <preset.ron> [--dt SECONDS] [--max-ticks N] \
                 [--intensity X] [--backward] [--json]"
            );
            std::process::exit(2);
        }
    };

    tracing::info!("Starting OrdoPlay feedback preview v{}", env!("CARGO_PKG_VERSION"));

    let report = match run(&options) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Preview failed: {e}");
            std::process::exit(1);
        }
    };

    if options.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("Failed to serialize report: {e}");
                std::process::exit(1);
            }
        }
    } else {
        println!(
            "{}: {} ticks ({:.3}s), {} events, completed: {}",
            report.name, report.ticks, report.elapsed, report.events, report.completed
        );
        for (name, value) in &report.values {
            println!("  {name} = {value:.3}");
        }
    }
}

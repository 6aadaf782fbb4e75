//! Headless runner for lab presets
//!
//! ```text
//! virtual-lab run presets/titration.json --ticks 200 --export run.json
//! virtual-lab inspect run.json
//! ```

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use virtual_lab_core_rs::{
    ClockState, ExperimentPreset, LabConfig, ObjectiveOutcome, RngManager, SimulationClock, StateSnapshot,
};

/// Nominal host frame interval (60 Hz)
const FRAME_INTERVAL: f64 = 1.0 / 60.0;

/// Frames delivered per tick before a run is considered stuck
const MAX_FRAMES_PER_TICK: u64 = 1_000;

#[derive(Parser)]
#[command(name = "virtual-lab")]
#[command(about = "Run virtual lab presets without a host UI", long_about = None)]
struct Cli {
    /// Log filter (overridden by RUST_LOG)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a preset to completion or for a fixed number of ticks
    Run {
        /// Preset JSON file
        preset: PathBuf,

        /// Stop after this many ticks
        #[arg(long)]
        ticks: Option<u64>,

        /// Override the session seed
        #[arg(long)]
        seed: Option<u32>,

        /// Optional config JSON file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Write the final session snapshot here
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,

        /// Deliver frames at irregular intervals
        #[arg(long, action = ArgAction::SetTrue)]
        jitter: bool,
    },
    /// Import a snapshot and print a summary
    Inspect {
        /// Snapshot JSON file
        snapshot: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run {
            preset,
            ticks,
            seed,
            config,
            export,
            jitter,
        } => run(&preset, ticks, seed, config.as_deref(), export.as_deref(), jitter),
        Commands::Inspect { snapshot } => inspect(&snapshot),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn run(
    preset_path: &Path,
    ticks: Option<u64>,
    seed: Option<u32>,
    config_path: Option<&Path>,
    export: Option<&Path>,
    jitter: bool,
) -> Result<()> {
    let preset = ExperimentPreset::from_json(&read(preset_path)?)?;

    let mut config: LabConfig = match config_path {
        Some(path) => serde_json::from_str(&read(path)?).context("parsing config")?,
        None => LabConfig::default(),
    };
    if let Some(seed) = seed.or(preset.seed) {
        config.seed = seed;
    }

    let mut clock = SimulationClock::new(config.clone())?;
    clock.start(preset.bench.clone())?;
    tracing::info!(preset = %preset.id, title = %preset.title, "Running preset");

    // Frame timing has its own generator so jitter never touches session draws
    let mut frame_rng = RngManager::new(config.seed ^ 0x5EED_F00D);
    let limit = ticks.unwrap_or(u64::MAX);
    let mut now = 0.0;
    let mut idle_frames = 0;

    while clock.state() == ClockState::Running && clock.status().tick < limit {
        now += if jitter {
            frame_rng.range(0.25 * FRAME_INTERVAL, 3.0 * FRAME_INTERVAL)
        } else {
            FRAME_INTERVAL
        };

        if clock.on_frame(now)? {
            idle_frames = 0;
        } else {
            idle_frames += 1;
            if idle_frames > MAX_FRAMES_PER_TICK {
                bail!("clock stopped advancing at tick {}", clock.status().tick);
            }
        }
    }

    let status = clock.status();
    println!(
        "{}: {} ticks, {:.2}s simulated ({:?})",
        preset.title, status.tick, status.elapsed, status.state
    );

    if let Some(payload) = clock.event_log().last_payload() {
        for vessel in &payload.vessels {
            println!(
                "  vessel {}: pH {:.2}, {:.1} K{}",
                vessel.vessel_id,
                vessel.ph,
                vessel.temperature_k,
                vessel
                    .indicator_color
                    .as_deref()
                    .map(|c| format!(", indicator {}", c))
                    .unwrap_or_default()
            );
        }
        if let Some(circuit) = &payload.circuit {
            println!("  circuit: {:.3} W dissipated", circuit.analysis.total_power);
        }
        if let Some(mechanics) = &payload.mechanics {
            println!(
                "  mechanics: {} objects, {} collisions this tick",
                mechanics.objects.len(),
                mechanics.collisions.len()
            );
        }
        if !payload.rays.is_empty() {
            println!("  optics: {} rays traced", payload.rays.len());
        }
    }

    let reports = clock.validate_objectives(&preset.objectives)?;
    let earned: f64 = reports.iter().map(|r| r.earned).sum();
    for report in &reports {
        match &report.outcome {
            ObjectiveOutcome::Evaluated(result) => println!(
                "  [{}] {} ({}/100): {}",
                if result.is_valid { "x" } else { " " },
                report.objective_id,
                result.score,
                result.message
            ),
            ObjectiveOutcome::Unsupported { kind } => {
                println!("  [?] {}: unsupported validator {}", report.objective_id, kind)
            }
        }
    }
    println!("Score: {:.1}/{}", earned, preset.max_points());

    if let Some(path) = export {
        fs::write(path, clock.export_state()?).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "Snapshot exported");
    }

    Ok(())
}

fn inspect(path: &Path) -> Result<()> {
    let json = read(path)?;
    let snapshot: StateSnapshot = serde_json::from_str(&json).context("parsing snapshot")?;

    let mut clock = SimulationClock::new(snapshot.config.clone())?;
    clock.import_state(&json)?;

    let status = clock.status();
    println!("Session {}", clock.session_id());
    println!("  state: {:?}", status.state);
    println!("  tick {} at {:.2}s", status.tick, status.elapsed);
    println!(
        "  rng: seed {}, {} draws",
        snapshot.rng.seed(),
        snapshot.rng.draw_count()
    );
    println!("  config hash: {}", snapshot.config_hash);
    println!(
        "  bench: {} vessels, circuit {}, {} mechanical objects, {} rays",
        clock.bench().vessels.len(),
        if clock.bench().circuit.is_some() { "yes" } else { "no" },
        clock.bench().mechanics.objects.len(),
        clock.bench().optics.rays.len()
    );
    println!("  events: {}", clock.event_log().len());
    for kind in ["start", "tick", "measurement", "complete", "error"] {
        let count = clock.event_log().events_of_type(kind).len();
        if count > 0 {
            println!("    {}: {}", kind, count);
        }
    }
    Ok(())
}

//! Headless fleet battle runner.
//!
//! Runs levels without graphics and prints JSON reports on stdout. Logs go
//! to stderr.
//!
//! # Usage
//!
//! ```bash
//! # One battle, report on stdout
//! cargo run -p fleet_headless -- run --level levels/skirmish.ron --seed 7
//!
//! # Pit two controllers against each other
//! cargo run -p fleet_headless -- run --level skirmish --ai nightmare --player-ai elite
//!
//! # 200 seeds in parallel, summary to a file
//! cargo run -p fleet_headless -- batch --level skirmish --count 200 --output results/skirmish.json
//!
//! # Check a level replays identically
//! cargo run -p fleet_headless -- verify --level skirmish --runs 5
//! ```
//!
//! `RUST_LOG` overrides the log filter; `--verbose` raises the default to
//! debug.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fleet_core::ai::AiKind;
use fleet_core::data::LevelData;
use fleet_headless::batch::{run_batch, BatchConfig};
use fleet_headless::level::{default_level_dir, load_level, load_level_dir};
use fleet_headless::runner::{run_level, RunConfig, DEFAULT_MAX_SECONDS};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fleet_headless")]
#[command(about = "Headless fleet battle runner for AI testing and balance batches")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one battle and print its report
    Run {
        /// Level file, or a level name in the bundled level directory
        #[arg(short, long)]
        level: String,

        /// Override the level seed
        #[arg(short, long)]
        seed: Option<u64>,

        /// Simulated seconds before the battle is called a draw
        #[arg(long, default_value_t = DEFAULT_MAX_SECONDS)]
        max_seconds: u32,

        /// Override the enemy controller
        #[arg(long)]
        ai: Option<AiKind>,

        /// Controller for the player fleet
        #[arg(long)]
        player_ai: Option<AiKind>,
    },

    /// Run a level over consecutive seeds and summarize
    Batch {
        /// Level file, or a level name in the bundled level directory
        #[arg(short, long)]
        level: String,

        /// Number of runs
        #[arg(short, long, default_value_t = 100)]
        count: u32,

        /// First seed
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value_t = 0)]
        parallel: u32,

        /// Simulated seconds per run
        #[arg(long, default_value_t = DEFAULT_MAX_SECONDS)]
        max_seconds: u32,

        /// Override the enemy controller
        #[arg(long)]
        ai: Option<AiKind>,

        /// Controller for the player fleet
        #[arg(long)]
        player_ai: Option<AiKind>,

        /// Write full results JSON here instead of printing the summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the same seed several times and compare final states
    Verify {
        /// Level file, or a level name in the bundled level directory
        #[arg(short, long)]
        level: String,

        /// Seed to replay
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of runs
        #[arg(short, long, default_value_t = 3)]
        runs: u32,

        /// Simulated seconds per run
        #[arg(long, default_value_t = 120)]
        max_seconds: u32,
    },

    /// List the available AI controllers
    ListAi,

    /// List the bundled levels
    Levels {
        /// Directory to scan instead of the bundled one
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            level,
            seed,
            max_seconds,
            ai,
            player_ai,
        } => cmd_run(&level, RunConfig {
            seed,
            max_seconds,
            enemy_ai: ai,
            player_ai,
        }),
        Commands::Batch {
            level,
            count,
            seed,
            parallel,
            max_seconds,
            ai,
            player_ai,
            output,
        } => {
            let run = RunConfig {
                seed: None,
                max_seconds,
                enemy_ai: ai,
                player_ai,
            };
            let config = BatchConfig::new(count)
                .with_seed(seed)
                .with_parallel(parallel)
                .with_run(run);
            cmd_batch(&level, config, output.as_deref())
        }
        Commands::Verify {
            level,
            seed,
            runs,
            max_seconds,
        } => cmd_verify(&level, seed, runs, max_seconds),
        Commands::ListAi => {
            cmd_list_ai();
            Ok(())
        }
        Commands::Levels { dir } => cmd_levels(dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("FATAL: {message}");
            ExitCode::FAILURE
        }
    }
}

/// Accept either a path or a bare level name from the bundled directory.
fn resolve_level(arg: &str) -> Result<LevelData, String> {
    let direct = PathBuf::from(arg);
    let path = if direct.exists() {
        direct
    } else {
        default_level_dir()
            .map(|dir| dir.join(format!("{arg}.ron")))
            .filter(|path| path.exists())
            .unwrap_or(direct)
    };
    load_level(&path).map_err(|e| e.to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn cmd_run(level: &str, config: RunConfig) -> Result<(), String> {
    let level = resolve_level(level)?;
    let report = run_level(&level, &config).map_err(|e| e.to_string())?;
    print_json(&report)
}

fn cmd_batch(level: &str, config: BatchConfig, output: Option<&Path>) -> Result<(), String> {
    let level = resolve_level(level)?;
    let results = run_batch(&level, config);

    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE: {}", results.level);
    eprintln!("{}", "=".repeat(50));
    eprintln!("Runs: {}", results.summary.total_runs);
    if !results.errors.is_empty() {
        eprintln!("Runs FAILED: {}", results.errors.len());
    }
    eprintln!(
        "Player wins: {} ({:.1}%)",
        results.summary.wins.player,
        results.summary.player_win_rate() * 100.0
    );
    eprintln!("Enemy wins: {}", results.summary.wins.enemy);
    eprintln!("Draws: {}", results.summary.draws);
    eprintln!("Average duration: {:.1}s", results.summary.average_duration_seconds);

    match output {
        Some(path) => {
            results.save(path).map_err(|e| format!("Failed to save results: {e}"))?;
            eprintln!("\nResults saved to: {}", path.display());
            Ok(())
        }
        None => print_json(&results.summary),
    }
}

fn cmd_verify(level: &str, seed: Option<u64>, runs: u32, max_seconds: u32) -> Result<(), String> {
    let level = resolve_level(level)?;
    let config = RunConfig {
        seed,
        max_seconds,
        ..RunConfig::default()
    };
    tracing::info!(level = %level.name, runs, "verifying determinism");

    let mut reports = Vec::new();
    for _ in 0..runs.max(1) {
        reports.push(run_level(&level, &config).map_err(|e| e.to_string())?);
    }
    let first = &reports[0];
    if reports.iter().all(|r| r == first) {
        eprintln!("PASS: All {} runs produced identical results (hash {:016x})", runs, first.state_hash);
        Ok(())
    } else {
        Err("Non-determinism detected!".to_string())
    }
}

fn cmd_list_ai() {
    for kind in AiKind::ALL {
        println!("{:<18} {}", kind.as_str(), kind.description());
    }
}

fn cmd_levels(dir: Option<PathBuf>) -> Result<(), String> {
    let dir = dir
        .or_else(default_level_dir)
        .ok_or_else(|| "No level directory found; pass --dir or set FLEET_LEVEL_DIR".to_string())?;
    let set = load_level_dir(&dir).map_err(|e| e.to_string())?;
    for (path, level) in &set.levels {
        println!(
            "{:<24} {:<10} ai={:<16} {}",
            path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default(),
            level.difficulty,
            level.ai_kind,
            level.name
        );
    }
    for (path, error) in &set.failures {
        eprintln!("{}: {error}", path.display());
    }
    Ok(())
}

//! Headless battle runner for AI testing and balance batches.
//!
//! Loads level files from disk, runs them through [`fleet_core`] without
//! any rendering, and reports the results as JSON:
//!
//! - **Single runs**: one level, one seed, one [`BattleReport`]
//! - **Batches**: many seeds in parallel, folded into a [`BatchSummary`]
//!
//! # Example
//!
//! ```bash
//! cargo run -p fleet_headless -- run --level skirmish --seed 3
//! cargo run -p fleet_headless -- batch --level skirmish --count 500 --parallel 8
//! ```

pub mod batch;
pub mod level;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use level::{default_level_dir, load_level, load_level_dir, LevelFileError, LevelSet};
pub use runner::{run_level, BattleReport, PerTeam, RunConfig};

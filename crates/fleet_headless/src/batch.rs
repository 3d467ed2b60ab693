//! Batch runner for balance testing.
//!
//! Runs one level many times over consecutive seeds in parallel with rayon
//! and folds the reports into a win/draw summary.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use fleet_core::data::LevelData;
use fleet_core::unit::{ENEMY_TEAM, PLAYER_TEAM};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::runner::{run_level, BattleReport, PerTeam, RunConfig};

/// Configuration for a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of runs.
    pub count: u32,
    /// Seed of the first run; run `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Worker threads (0 = rayon default).
    pub parallel: u32,
    /// Settings shared by every run. Its seed override is ignored.
    pub run: RunConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 100,
            seed_start: 0,
            parallel: 0,
            run: RunConfig::default(),
        }
    }
}

impl BatchConfig {
    /// `count` runs with default settings.
    #[must_use]
    pub fn new(count: u32) -> Self {
        Self {
            count,
            ..Default::default()
        }
    }

    /// Set the first seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the worker thread count.
    #[must_use]
    pub fn with_parallel(mut self, threads: u32) -> Self {
        self.parallel = threads;
        self
    }

    /// Set the per-run settings.
    #[must_use]
    pub fn with_run(mut self, run: RunConfig) -> Self {
        self.run = run;
        self
    }
}

/// Aggregate over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs that produced a report.
    pub total_runs: u32,
    /// Wins per team.
    pub wins: PerTeam<u32>,
    /// Runs that hit the time cap undecided.
    pub draws: u32,
    /// Mean simulated duration in seconds.
    pub average_duration_seconds: f64,
}

impl BatchSummary {
    /// Fold `reports` into a summary.
    #[must_use]
    pub fn from_reports(reports: &[BattleReport]) -> Self {
        let mut summary = Self {
            total_runs: reports.len() as u32,
            ..Default::default()
        };
        let mut total_duration = 0.0;
        for report in reports {
            match report.winner {
                Some(PLAYER_TEAM) => summary.wins.player += 1,
                Some(ENEMY_TEAM) => summary.wins.enemy += 1,
                Some(_) | None => summary.draws += 1,
            }
            total_duration += report.duration_seconds;
        }
        if !reports.is_empty() {
            summary.average_duration_seconds = total_duration / reports.len() as f64;
        }
        summary
    }

    /// Share of runs the player won.
    #[must_use]
    pub fn player_win_rate(&self) -> f64 {
        if self.total_runs == 0 {
            return 0.0;
        }
        f64::from(self.wins.player) / f64::from(self.total_runs)
    }
}

/// A run that failed to start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Seed of the failed run.
    pub seed: u64,
    /// Error message.
    pub message: String,
}

/// Everything a batch produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResults {
    /// Level name.
    pub level: String,
    /// Configuration used.
    pub config: BatchConfig,
    /// Per-run reports in seed order.
    pub reports: Vec<BattleReport>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Runs that failed.
    pub errors: Vec<BatchError>,
    /// Wall-clock runtime.
    pub wall_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

fn run_all(level: &LevelData, config: &BatchConfig) -> Vec<Result<BattleReport, BatchError>> {
    let completed = AtomicU32::new(0);
    (0..config.count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let run = RunConfig {
                seed: Some(seed),
                ..config.run.clone()
            };
            let result = run_level(level, &run).map_err(|e| {
                warn!(seed, error = %e, "run failed");
                BatchError {
                    seed,
                    message: e.to_string(),
                }
            });
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                debug!("Progress: {}/{}", done, config.count);
            }
            result
        })
        .collect()
}

/// Run `config.count` battles of `level` and summarize them.
pub fn run_batch(level: &LevelData, config: BatchConfig) -> BatchResults {
    let start = Instant::now();
    info!(level = %level.name, count = config.count, seed_start = config.seed_start, "starting batch");

    let results = if config.parallel > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel as usize)
            .build()
        {
            Ok(pool) => pool.install(|| run_all(level, &config)),
            Err(e) => {
                warn!(error = %e, "could not build thread pool, using the global one");
                run_all(level, &config)
            }
        }
    } else {
        run_all(level, &config)
    };

    let mut reports = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => errors.push(e),
        }
    }

    let summary = BatchSummary::from_reports(&reports);
    let wall_seconds = start.elapsed().as_secs_f64();
    info!(
        "Batch complete: {} runs in {:.1}s, player {} / enemy {} / draws {}",
        reports.len(),
        wall_seconds,
        summary.wins.player,
        summary.wins.enemy,
        summary.draws
    );

    BatchResults {
        level: level.name.clone(),
        config,
        reports,
        summary,
        errors,
        wall_seconds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::ai::AiKind;
    use fleet_core::conditions::Outcome;

    const LEVEL: &str = r#"(
        name: "Picket Line",
        ai_kind: "aggressive",
        units: {
            "mother": (kind: mothership, max_hp: 600, speed: 20, attack_damage: 15, attack_range: 250,
                       attack_cooldown: 2.0, radius: 40),
            "picket": (kind: fighter, max_hp: 80, speed: 120, attack_damage: 8, attack_range: 150),
        },
        player_units: [(unit_id: "mother", position: (1200, 2000)), (unit_id: "picket", position: (1150, 1800))],
        enemy_units: [(unit_id: "mother", position: (1200, 400)), (unit_id: "picket", position: (1250, 600))],
        victory_conditions: (eliminate_mothership: true),
        defeat_conditions: (lose_mothership: true),
        seed: 1,
    )"#;

    fn level() -> LevelData {
        LevelData::load_str(LEVEL, "picket.ron").unwrap()
    }

    fn report(winner: Option<u8>, duration_seconds: f64) -> BattleReport {
        BattleReport {
            level: "x".to_string(),
            seed: 0,
            outcome: match winner {
                Some(0) => Outcome::Victory,
                Some(_) => Outcome::Defeat,
                None => Outcome::InProgress,
            },
            winner,
            duration_seconds,
            ticks: 0,
            survivors: PerTeam::default(),
            damage_dealt: PerTeam::default(),
            kills: PerTeam::default(),
            skills_fired: PerTeam::default(),
            projectiles_fired: 0,
            controllers: Vec::new(),
            state_hash: 0,
        }
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(50).with_seed(12345).with_parallel(2);
        assert_eq!(config.count, 50);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.parallel, 2);
    }

    #[test]
    fn test_summary_counts_wins_and_draws() {
        let reports = [
            report(Some(0), 10.0),
            report(Some(1), 20.0),
            report(Some(0), 30.0),
            report(None, 40.0),
        ];
        let summary = BatchSummary::from_reports(&reports);
        assert_eq!(summary.total_runs, 4);
        assert_eq!(summary.wins, PerTeam { player: 2, enemy: 1 });
        assert_eq!(summary.draws, 1);
        assert!((summary.average_duration_seconds - 25.0).abs() < 1e-9);
        assert!((summary.player_win_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_reports(&[]);
        assert_eq!(summary.total_runs, 0);
        assert_eq!(summary.average_duration_seconds, 0.0);
        assert_eq!(summary.player_win_rate(), 0.0);
    }

    #[test]
    fn test_runs_use_consecutive_seeds() {
        let config = BatchConfig::new(6)
            .with_seed(40)
            .with_run(RunConfig::default().with_max_seconds(2));
        let results = run_batch(&level(), config);

        assert!(results.errors.is_empty());
        let seeds: Vec<u64> = results.reports.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![40, 41, 42, 43, 44, 45]);
        assert_eq!(results.summary.total_runs, 6);
    }

    #[test]
    fn test_thread_count_does_not_change_results() {
        let run = RunConfig::default()
            .with_max_seconds(20)
            .with_player_ai(AiKind::Advanced);
        let serial = run_batch(&level(), BatchConfig::new(4).with_run(run.clone()).with_parallel(1));
        let parallel = run_batch(&level(), BatchConfig::new(4).with_run(run).with_parallel(4));
        assert_eq!(serial.reports, parallel.reports);
        assert_eq!(serial.summary, parallel.summary);
    }

    #[test]
    fn test_batch_results_save_load() {
        let config = BatchConfig::new(3).with_run(RunConfig::default().with_max_seconds(1));
        let results = run_batch(&level(), config);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.json");
        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.reports.len(), 3);
        assert_eq!(loaded.level, "Picket Line");
        assert_eq!(loaded.summary.draws, 3);
    }
}

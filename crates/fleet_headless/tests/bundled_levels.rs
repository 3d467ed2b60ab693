//! The levels shipped with the runner must load and play.

use std::path::PathBuf;

use fleet_core::ai::AiKind;
use fleet_headless::batch::{run_batch, BatchConfig};
use fleet_headless::level::load_level_dir;
use fleet_headless::runner::{run_level, RunConfig};

fn level_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("levels")
}

#[test]
fn every_bundled_level_loads() {
    let set = load_level_dir(&level_dir()).unwrap();
    assert!(set.failures.is_empty(), "{:?}", set.failures);
    assert!(set.levels.len() >= 3);
}

#[test]
fn every_bundled_level_runs_with_both_sides_controlled() {
    let set = load_level_dir(&level_dir()).unwrap();
    let config = RunConfig::default()
        .with_max_seconds(20)
        .with_player_ai(AiKind::Elite);
    for (path, level) in &set.levels {
        let report = run_level(level, &config).unwrap();
        assert_eq!(report.level, level.name, "{}", path.display());
        assert!(report.ticks > 0);
        assert!(report.controllers.iter().any(|c| c == "elite@0"));
    }
}

#[test]
fn small_batch_on_a_bundled_level_is_reproducible() {
    let set = load_level_dir(&level_dir()).unwrap();
    let (_, level) = set
        .levels
        .iter()
        .find(|(path, _)| path.ends_with("skirmish.ron"))
        .unwrap();
    let config = || {
        BatchConfig::new(3)
            .with_seed(10)
            .with_run(RunConfig::default().with_max_seconds(15))
    };
    let first = run_batch(level, config());
    let second = run_batch(level, config());
    assert_eq!(first.reports, second.reports);
    assert_eq!(first.summary.total_runs, 3);
}

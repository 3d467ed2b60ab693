//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a battle
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A battle replayed from the same level and seed must end the same way.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`fleet_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: The roster is kept sorted by unit id and
//!   every keyed collection is a `BTreeMap`.
//!
//! - **System randomness**: All jitter comes from the world's seeded RNG.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual phase determinism (movement, combat, etc.)
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Full AI-vs-AI battles are reproducible
//! 4. **Parallel tests**: Running N battles on separate threads all match

use std::thread;

use fleet_core::battle::Battle;
use fleet_core::config::TICK_DELTA;
use fleet_core::world::World;

/// Something that advances in fixed ticks and can summarize its state.
pub trait Replayable {
    /// Advance one tick.
    fn step(&mut self);

    /// Hash of the current state.
    fn state_hash(&self) -> u64;
}

impl Replayable for World {
    fn step(&mut self) {
        self.tick(TICK_DELTA);
    }

    fn state_hash(&self) -> u64 {
        World::state_hash(self)
    }
}

impl Replayable for Battle {
    fn step(&mut self) {
        self.tick();
    }

    fn state_hash(&self) -> u64 {
        self.world().state_hash()
    }
}

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic battle).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs agreed, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Battle is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use fleet_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(3, 10, || 0u64, |n| *n += 2, |n| *n);
/// result.assert_deterministic();
/// assert_eq!(result.hashes, vec![20, 20, 20]);
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();
        for _ in 0..ticks {
            step(&mut state);
        }
        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Run anything [`Replayable`] twice and compare final hashes.
pub fn verify_replay<R, F>(setup_fn: F, num_ticks: u64) -> DeterminismResult
where
    R: Replayable,
    F: Fn() -> R,
{
    verify_determinism(2, num_ticks, setup_fn, R::step, R::state_hash)
}

/// Run N battles on separate threads and collect final hashes.
///
/// Each thread builds its own battle from `setup_fn`, so controllers and
/// worlds never cross threads.
///
/// # Panics
///
/// Panics if a battle thread panics.
pub fn run_parallel<R, F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> DeterminismResult
where
    R: Replayable,
    F: Fn() -> R + Sync,
{
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.step();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("battle thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        ticks: num_ticks,
    }
}

/// Compare two runs tick-by-tick, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs agree throughout, `Some(tick)` if they differ after
/// that tick (`0` for differing initial states).
pub fn find_first_divergence<R, F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    R: Replayable,
    F: Fn() -> R,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        first.step();
        second.step();
        if first.state_hash() != second.state_hash() {
            tracing::warn!(tick, "replays diverged");
            return Some(tick);
        }
    }

    None
}

/// Snapshot a world to RON mid-battle, restore it, and check that the
/// restored copy keeps ticking in lockstep with the live one.
///
/// Returns `false` if the snapshot fails to serialize or parse, or if the
/// copies diverge within `continue_ticks`.
pub fn verify_snapshot_determinism(mut world: World, warmup_ticks: u64, continue_ticks: u64) -> bool {
    for _ in 0..warmup_ticks {
        world.step();
    }

    let text = match ron::to_string(&world) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "snapshot failed to serialize");
            return false;
        }
    };
    let mut restored = match ron::from_str::<World>(&text) {
        Ok(world) => world,
        Err(e) => {
            tracing::warn!(error = %e, "snapshot failed to parse");
            return false;
        }
    };

    for _ in 0..=continue_ticks {
        if restored.state_hash() != World::state_hash(&world) {
            return false;
        }
        world.step();
        restored.step();
    }
    true
}

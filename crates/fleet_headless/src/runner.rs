//! Single-battle runs and their reports.

use fleet_core::ai::AiKind;
use fleet_core::battle::Battle;
use fleet_core::conditions::Outcome;
use fleet_core::data::{AiAssignment, LevelData};
use fleet_core::error::Result;
use fleet_core::math::Fixed;
use fleet_core::unit::{TeamId, ENEMY_TEAM, PLAYER_TEAM};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default cap on simulated time for one run, in seconds.
pub const DEFAULT_MAX_SECONDS: u32 = 600;

/// How a level should be run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Replaces the level's own seed.
    pub seed: Option<u64>,
    /// Simulated seconds before the run is called a draw.
    pub max_seconds: u32,
    /// Replaces the level's enemy controller.
    pub enemy_ai: Option<AiKind>,
    /// Controller for the player fleet. Without one the player side only
    /// auto-engages.
    pub player_ai: Option<AiKind>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_seconds: DEFAULT_MAX_SECONDS,
            enemy_ai: None,
            player_ai: None,
        }
    }
}

impl RunConfig {
    /// Set the seed override.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the time cap.
    #[must_use]
    pub fn with_max_seconds(mut self, seconds: u32) -> Self {
        self.max_seconds = seconds;
        self
    }

    /// Set the enemy controller.
    #[must_use]
    pub fn with_enemy_ai(mut self, kind: AiKind) -> Self {
        self.enemy_ai = Some(kind);
        self
    }

    /// Set the player controller.
    #[must_use]
    pub fn with_player_ai(mut self, kind: AiKind) -> Self {
        self.player_ai = Some(kind);
        self
    }

    /// The level with this config's controller overrides applied.
    #[must_use]
    pub fn apply(&self, level: &LevelData) -> LevelData {
        let mut level = level.clone();
        if let Some(kind) = self.enemy_ai {
            level.ai_kind = kind.to_string();
        }
        if let Some(kind) = self.player_ai {
            level.additional_ais.push(AiAssignment {
                kind: kind.to_string(),
                team: PLAYER_TEAM,
            });
        }
        level
    }
}

/// A per-team pair of numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerTeam<T> {
    /// Team 0.
    pub player: T,
    /// Team 1.
    pub enemy: T,
}

/// Summary of one finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleReport {
    /// Level name.
    pub level: String,
    /// World seed actually used.
    pub seed: u64,
    /// Final outcome from the player's point of view. `in_progress` means
    /// the time cap was hit first.
    pub outcome: Outcome,
    /// Winning team, `None` for a draw.
    pub winner: Option<TeamId>,
    /// Simulated seconds.
    pub duration_seconds: f64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Units alive at the end.
    pub survivors: PerTeam<usize>,
    /// Damage each side dealt.
    pub damage_dealt: PerTeam<f64>,
    /// Enemy units each side destroyed.
    pub kills: PerTeam<u32>,
    /// Skills each side fired.
    pub skills_fired: PerTeam<u32>,
    /// Projectiles launched by anyone.
    pub projectiles_fired: u32,
    /// Controllers in run order, as `kind@team`.
    pub controllers: Vec<String>,
    /// Hash of the final world state.
    pub state_hash: u64,
}

impl BattleReport {
    /// Whether the run ended without a winner.
    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }

    fn from_battle(battle: &Battle, seed: u64) -> Self {
        let world = battle.world();
        let stats = battle.stats();
        let winner = match battle.outcome() {
            Outcome::Victory => Some(PLAYER_TEAM),
            Outcome::Defeat => Some(ENEMY_TEAM),
            Outcome::InProgress => None,
        };
        Self {
            level: battle.name().to_string(),
            seed,
            outcome: battle.outcome(),
            winner,
            duration_seconds: world.elapsed().to_num(),
            ticks: world.tick_count(),
            survivors: PerTeam {
                player: world.count_units(PLAYER_TEAM),
                enemy: world.count_units(ENEMY_TEAM),
            },
            damage_dealt: PerTeam {
                player: stats.player.damage_dealt.to_num(),
                enemy: stats.enemy.damage_dealt.to_num(),
            },
            kills: PerTeam {
                player: stats.player.kills,
                enemy: stats.enemy.kills,
            },
            skills_fired: PerTeam {
                player: stats.player.skills_fired,
                enemy: stats.enemy.skills_fired,
            },
            projectiles_fired: stats.projectiles_fired,
            controllers: battle
                .controller_kinds()
                .into_iter()
                .map(|(kind, team)| format!("{kind}@{team}"))
                .collect(),
            state_hash: world.state_hash(),
        }
    }
}

/// Build the battle for `level` under `config` and run it to an outcome
/// or the time cap.
pub fn run_level(level: &LevelData, config: &RunConfig) -> Result<BattleReport> {
    let seed = config.seed.unwrap_or(level.seed);
    let mut battle = Battle::from_level_seeded(&config.apply(level), seed)?;
    battle.run(Fixed::from_num(config.max_seconds));

    let report = BattleReport::from_battle(&battle, seed);
    info!(
        level = %report.level,
        seed,
        outcome = ?report.outcome,
        winner = ?report.winner,
        duration = report.duration_seconds,
        "run finished"
    );
    Ok(report)
}

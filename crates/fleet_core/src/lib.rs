//! # Fleet Core
//!
//! Deterministic combat simulation core for two opposing fleets.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point simulation math (uses fixed-point)
//!
//! This separation enables:
//! - Headless AI-vs-AI batch runs
//! - Replayable battles from a seed
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`world`] - Unit roster, spatial queries and tick phases
//! - [`unit`] - Unit data and the state machine's vocabulary
//! - [`behavior`] - Per-state unit updates
//! - [`combat`] - Attack resolution, projectiles and repair
//! - [`skills`] - Ultimate abilities
//! - [`commands`] - External command surface
//! - [`ai`] - Tiered team controllers
//! - [`battle`] - World plus controllers plus end conditions
//! - [`data`] - Level and unit template definitions
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod battle;
pub mod behavior;
pub mod combat;
pub mod commands;
pub mod conditions;
pub mod config;
pub mod data;
pub mod effects;
pub mod error;
pub mod math;
pub mod projectile;
pub mod rng;
pub mod skills;
pub mod terrain;
pub mod unit;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{create_controller, create_controller_named, AiController, AiKind};
    pub use crate::battle::{Battle, BattleStats, TeamStats};
    pub use crate::commands::Command;
    pub use crate::conditions::{DefeatConditions, Outcome, VictoryConditions};
    pub use crate::config::{TICK_DELTA, TICK_RATE};
    pub use crate::data::{LevelData, UnitTemplate};
    pub use crate::error::{GameError, Result};
    pub use crate::math::{Fixed, Vec2Fixed};
    pub use crate::skills::{SkillKind, SkillSpec};
    pub use crate::unit::{AttackType, TeamId, Unit, UnitId, UnitKind, UnitState, ENEMY_TEAM, PLAYER_TEAM};
    pub use crate::world::World;
}

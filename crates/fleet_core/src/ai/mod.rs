//! AI controllers that command a whole team.
//!
//! Controllers come in tiers of increasing aggression and precision:
//!
//! | Tier | Kinds | Module |
//! |------|-------|--------|
//! | Basic | simple, aggressive, defensive | [`basic`] |
//! | Improved | advanced, hyper_aggressive, turtle | [`improved`] |
//! | Elite | elite, terminator | [`elite`] |
//! | Demon | demon, nightmare, apocalypse | [`demon`] |
//! | Dogfight | dogfight, blitzkrieg, kamikaze | [`dogfight`] |
//!
//! Every controller implements [`AiController`] and steers units only
//! through the order methods on [`World`](crate::world::World). Higher
//! tiers reuse the free functions in [`scoring`] rather than inheriting
//! from lower tiers.
//!
//! Several controllers may drive the same team. Nothing arbitrates between
//! them: whichever writes an order last in a tick wins.

pub mod basic;
pub mod demon;
pub mod dogfight;
pub mod elite;
pub mod improved;
pub mod memory;
pub mod scoring;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::math::Fixed;
use crate::unit::{TeamId, UnitId, UnitState};
use crate::world::World;

/// A controller that issues orders for one team.
pub trait AiController: Send {
    /// Which controller this is.
    fn kind(&self) -> AiKind;

    /// Team under command.
    fn team(&self) -> TeamId;

    /// Observe the world and issue orders. Called once per tick.
    fn update(&mut self, world: &mut World, dt: Fixed);
}

/// Every available controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiKind {
    /// Adaptive basic controller.
    Simple,
    /// Basic controller locked to all-out attack.
    Aggressive,
    /// Basic controller locked to mothership defence.
    Defensive,
    /// Threat-aware controller with micro-management.
    Advanced,
    /// Improved controller that only backs off when clearly outgunned.
    HyperAggressive,
    /// Improved controller that only leaves its shell when dominant.
    Turtle,
    /// Fast-cadence controller with named strategies and re-targeting.
    Elite,
    /// Relentless controller focused on motherships and repair craft.
    Terminator,
    /// Predictive hunter.
    Demon,
    /// Pack-hunting hunter.
    Nightmare,
    /// Unrestrained hunter of the most valuable target.
    Apocalypse,
    /// Close-range dogfighter.
    Dogfight,
    /// Charges the nearest enemy.
    Blitzkrieg,
    /// Dives the strongest enemy regardless of losses.
    Kamikaze,
}

impl AiKind {
    /// All kinds, weakest tier first.
    pub const ALL: [Self; 14] = [
        Self::Simple,
        Self::Aggressive,
        Self::Defensive,
        Self::Advanced,
        Self::HyperAggressive,
        Self::Turtle,
        Self::Elite,
        Self::Terminator,
        Self::Demon,
        Self::Nightmare,
        Self::Apocalypse,
        Self::Dogfight,
        Self::Blitzkrieg,
        Self::Kamikaze,
    ];

    /// Name used in level files and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
            Self::Advanced => "advanced",
            Self::HyperAggressive => "hyper_aggressive",
            Self::Turtle => "turtle",
            Self::Elite => "elite",
            Self::Terminator => "terminator",
            Self::Demon => "demon",
            Self::Nightmare => "nightmare",
            Self::Apocalypse => "apocalypse",
            Self::Dogfight => "dogfight",
            Self::Blitzkrieg => "blitzkrieg",
            Self::Kamikaze => "kamikaze",
        }
    }

    /// One-line description for listings.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Simple => "re-evaluates strategy every 5s from raw strength",
            Self::Aggressive => "always attacks the enemy mothership",
            Self::Defensive => "guards and patrols around its mothership",
            Self::Advanced => "threat map, weighted targeting, skill micro",
            Self::HyperAggressive => "advanced, attacking unless badly outgunned",
            Self::Turtle => "advanced, defending unless clearly dominant",
            Self::Elite => "named strategies, target switching, 0.05s orders",
            Self::Terminator => "fights to the last point of energy",
            Self::Demon => "predicts movement and intercepts",
            Self::Nightmare => "assigns hunting packs and surrounds targets",
            Self::Apocalypse => "all units on the most valuable target",
            Self::Dogfight => "close-range engagements with lead pursuit",
            Self::Blitzkrieg => "everyone charges the nearest enemy",
            Self::Kamikaze => "dives the strongest enemy",
        }
    }

    /// Parse `name`, falling back to [`AiKind::Elite`] when unknown.
    #[must_use]
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(kind = name, "unknown AI kind, using elite");
            Self::Elite
        })
    }
}

impl fmt::Display for AiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| GameError::UnknownAiKind(s.to_string()))
    }
}

/// Build a controller of `kind` for `team`.
#[must_use]
pub fn create_controller(kind: AiKind, team: TeamId) -> Box<dyn AiController> {
    match kind {
        AiKind::Simple | AiKind::Aggressive | AiKind::Defensive => {
            Box::new(basic::BasicAi::new(kind, team))
        }
        AiKind::Advanced | AiKind::HyperAggressive | AiKind::Turtle => {
            Box::new(improved::AdvancedAi::new(kind, team))
        }
        AiKind::Elite => Box::new(elite::EliteAi::new(team)),
        AiKind::Terminator => Box::new(elite::TerminatorAi::new(team)),
        AiKind::Demon | AiKind::Nightmare | AiKind::Apocalypse => {
            Box::new(demon::DemonAi::new(kind, team))
        }
        AiKind::Dogfight | AiKind::Blitzkrieg | AiKind::Kamikaze => {
            Box::new(dogfight::DogfightAi::new(kind, team))
        }
    }
}

/// Build a controller from a level-file name; unknown names give elite.
#[must_use]
pub fn create_controller_named(name: &str, team: TeamId) -> Box<dyn AiController> {
    create_controller(AiKind::parse_or_default(name), team)
}

/// Interval timer driven by simulation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval: Fixed,
    elapsed: Fixed,
}

impl Cadence {
    /// First fires once `interval` has passed.
    #[must_use]
    pub const fn new(interval: Fixed) -> Self {
        Self {
            interval,
            elapsed: Fixed::ZERO,
        }
    }

    /// First fires on the next check.
    #[must_use]
    pub const fn immediate(interval: Fixed) -> Self {
        Self {
            interval,
            elapsed: interval,
        }
    }

    /// Accumulate `dt`.
    pub fn advance(&mut self, dt: Fixed) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    /// Whether the interval has passed; restarts the interval if so.
    pub fn ready(&mut self) -> bool {
        if self.elapsed >= self.interval {
            self.elapsed = Fixed::ZERO;
            true
        } else {
            false
        }
    }
}

/// Live unit ids of a team and of its opponents, in roster order.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    /// Units under command.
    pub mine: Vec<UnitId>,
    /// Everyone else alive.
    pub enemies: Vec<UnitId>,
}

impl Roster {
    /// Snapshot the world from `team`'s side.
    #[must_use]
    pub fn of(world: &World, team: TeamId) -> Self {
        Self {
            mine: world.team_units(team).map(|u| u.id).collect(),
            enemies: world.enemy_units(team).map(|u| u.id).collect(),
        }
    }
}

/// Whether `id` is heading home or already resupplying.
pub(crate) fn on_supply_run(world: &World, id: UnitId) -> bool {
    world
        .live_unit(id)
        .is_some_and(|u| matches!(u.state, UnitState::Returning | UnitState::Supplying))
}

/// Send `id` home if its team still has a mothership to resupply from.
pub(crate) fn send_home(world: &mut World, id: UnitId) -> bool {
    let has_home = world
        .live_unit(id)
        .is_some_and(|u| world.mothership(u.team).is_some_and(|m| m.id != u.id));
    has_home && world.order_return(id)
}

/// Fire `id`'s skill once its bar reaches `threshold`.
///
/// The threshold only decides whether the tier tries; [`World::use_skill`]
/// still refuses anything short of a full bar.
pub(crate) fn try_skill(world: &mut World, id: UnitId, threshold: Fixed) -> bool {
    let wants = world.live_unit(id).is_some_and(|u| u.skill_charged(threshold));
    wants && world.use_skill(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in AiKind::ALL {
            assert_eq!(kind.as_str().parse::<AiKind>().unwrap(), kind);
        }
        assert_eq!("Hyper_Aggressive".parse::<AiKind>().unwrap(), AiKind::HyperAggressive);
    }

    #[test]
    fn test_unknown_kind_falls_back_to_elite() {
        assert!(matches!("overlord".parse::<AiKind>(), Err(GameError::UnknownAiKind(_))));
        assert_eq!(AiKind::parse_or_default("overlord"), AiKind::Elite);
        assert_eq!(create_controller_named("overlord", 1).kind(), AiKind::Elite);
    }

    #[test]
    fn test_factory_builds_every_kind() {
        for kind in AiKind::ALL {
            let controller = create_controller(kind, 1);
            assert_eq!(controller.kind(), kind);
            assert_eq!(controller.team(), 1);
        }
    }

    #[test]
    fn test_cadence() {
        let mut timer = Cadence::new(Fixed::ONE);
        timer.advance(Fixed::from_num(0.5));
        assert!(!timer.ready());
        timer.advance(Fixed::from_num(0.5));
        assert!(timer.ready());
        assert!(!timer.ready());

        let mut eager = Cadence::immediate(Fixed::from_num(3));
        assert!(eager.ready());
        assert!(!eager.ready());
    }
}

//! Level victory and defeat conditions, judged from the player's side.

use serde::{Deserialize, Serialize};

use crate::math::{option_decimal_serde, Fixed};
use crate::unit::{opposing_team, TeamId, UnitKind, PLAYER_TEAM};
use crate::world::World;

/// Ways the player can win. Any configured condition is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VictoryConditions {
    /// Every enemy unit destroyed.
    #[serde(default)]
    pub eliminate_all: bool,

    /// The enemy mothership destroyed (or never present).
    #[serde(default)]
    pub eliminate_mothership: bool,

    /// Hold out for this many seconds.
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub survive_time: Option<Fixed>,

    /// Every enemy of these kinds destroyed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub eliminate_specific: Vec<UnitKind>,
}

/// Ways the player can lose. Any configured condition is enough.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefeatConditions {
    /// Every player unit destroyed.
    #[serde(default)]
    pub lose_all: bool,

    /// The player mothership destroyed (or never present).
    #[serde(default)]
    pub lose_mothership: bool,

    /// Fail once this many seconds have passed.
    #[serde(default, with = "option_decimal_serde", skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<Fixed>,
}

/// State of a battle from the player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Still being fought.
    #[default]
    InProgress,
    /// The player met a victory condition.
    Victory,
    /// The player met a defeat condition.
    Defeat,
}

impl Outcome {
    /// Winning team, if decided.
    #[must_use]
    pub const fn winner(self) -> Option<TeamId> {
        match self {
            Self::InProgress => None,
            Self::Victory => Some(PLAYER_TEAM),
            Self::Defeat => Some(opposing_team(PLAYER_TEAM)),
        }
    }
}

impl VictoryConditions {
    /// Whether the player has won. All enemies gone always counts.
    #[must_use]
    pub fn is_met(&self, world: &World) -> bool {
        let enemy = opposing_team(PLAYER_TEAM);
        if world.count_units(enemy) == 0 {
            return true;
        }
        if self.eliminate_mothership && world.mothership(enemy).is_none() {
            return true;
        }
        if self.survive_time.is_some_and(|t| world.elapsed() >= t) {
            return true;
        }
        !self.eliminate_specific.is_empty()
            && world
                .team_units(enemy)
                .all(|unit| !self.eliminate_specific.contains(&unit.kind))
    }
}

impl DefeatConditions {
    /// Whether the player has lost. All player units gone always counts.
    #[must_use]
    pub fn is_met(&self, world: &World) -> bool {
        if world.count_units(PLAYER_TEAM) == 0 {
            return true;
        }
        if self.lose_mothership && world.mothership(PLAYER_TEAM).is_none() {
            return true;
        }
        self.time_limit.is_some_and(|t| world.elapsed() >= t)
    }
}

/// Judge the battle. Defeat is checked before victory.
#[must_use]
pub fn evaluate(world: &World, victory: &VictoryConditions, defeat: &DefeatConditions) -> Outcome {
    if defeat.is_met(world) {
        Outcome::Defeat
    } else if victory.is_met(world) {
        Outcome::Victory
    } else {
        Outcome::InProgress
    }
}

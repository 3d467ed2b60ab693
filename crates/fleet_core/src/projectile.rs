//! Travel-time damage carriers.

use serde::{Deserialize, Serialize};

use crate::config::PROJECTILE_HIT_RADIUS;
use crate::math::{Fixed, Vec2Fixed};
use crate::unit::{TeamId, UnitId};

/// How a projectile flies and what it does on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Flies straight to a fixed aim point and damages its target unit.
    Straight,
    /// Flies to a fixed aim point and splashes everything around it.
    Ballistic {
        /// Splash radius at impact.
        #[serde(with = "crate::math::fixed_serde")]
        splash_radius: Fixed,
    },
    /// Re-aims at its live target every tick.
    Homing,
}

/// A projectile in flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    /// Flight behaviour.
    pub kind: ProjectileKind,
    /// Firing unit, if still known.
    pub source: Option<UnitId>,
    /// Firing team.
    pub team: TeamId,
    /// Current position.
    pub position: Vec2Fixed,
    /// Where it is heading.
    pub aim: Vec2Fixed,
    /// Unit that takes the hit on arrival.
    pub target: Option<UnitId>,
    /// Damage on arrival.
    #[serde(with = "crate::math::fixed_serde")]
    pub damage: Fixed,
    /// Travel speed per second.
    #[serde(with = "crate::math::fixed_serde")]
    pub speed: Fixed,
    /// Cleared on impact.
    pub alive: bool,
}

impl Projectile {
    /// Create a projectile in flight.
    #[must_use]
    pub fn new(
        kind: ProjectileKind,
        source: Option<UnitId>,
        team: TeamId,
        from: Vec2Fixed,
        aim: Vec2Fixed,
        target: Option<UnitId>,
        damage: Fixed,
        speed: Fixed,
    ) -> Self {
        Self {
            kind,
            source,
            team,
            position: from,
            aim,
            target,
            damage,
            speed,
            alive: true,
        }
    }

    /// Move toward the aim point; returns true on arrival.
    ///
    /// A projectile arrives when it is within the hit radius or would reach
    /// the aim point this step, in which case it snaps onto it.
    pub fn advance(&mut self, dt: Fixed) -> bool {
        let distance = self.position.distance(self.aim);
        let step = self.speed * dt;
        if distance < PROJECTILE_HIT_RADIUS || distance <= step {
            self.position = self.aim;
            return true;
        }
        let direction = (self.aim - self.position).normalize();
        self.position += direction.scale(step);
        false
    }
}

//! Orders issued to units from outside the state machine.
//!
//! Players and AI controllers steer units through the same entry points.
//! A targeted order replaces the unit's current order and clears every
//! other order reference, so at most one of attack, repair and follow
//! targets is populated at a time.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::math::Vec2Fixed;
use crate::unit::{UnitId, UnitKind, UnitState};
use crate::world::World;

/// An order for one or more units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// Travel to a point.
    MoveTo(Vec2Fixed),
    /// Pursue and fire on an enemy unit.
    Attack(UnitId),
    /// Keep station on a unit and join its attacks.
    Follow(UnitId),
    /// Heal an allied unit.
    Repair(UnitId),
    /// Head back to the mothership for supply.
    ReturnToSupply,
    /// Fire the ultimate if fully charged.
    UseSkill,
}

impl Command {
    /// Short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MoveTo(_) => "move",
            Self::Attack(_) => "attack",
            Self::Follow(_) => "follow",
            Self::Repair(_) => "repair",
            Self::ReturnToSupply => "supply",
            Self::UseSkill => "skill",
        }
    }
}

impl World {
    /// Issue `command` to every unit in `units`.
    ///
    /// Returns how many units accepted the order. Units that cannot carry it
    /// out (wrong kind, dead, disabled, bad target) are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnitNotFound`] if any id in `units` is not on
    /// the roster. No unit is ordered in that case.
    pub fn issue_command(&mut self, units: &[UnitId], command: Command) -> Result<usize> {
        if let Some(missing) = units.iter().find(|id| self.unit(**id).is_none()) {
            return Err(GameError::UnitNotFound(*missing));
        }

        let mut accepted = 0;
        for &id in units {
            let ok = match command {
                Command::MoveTo(point) => self.order_move(id, point),
                Command::Attack(target) => self.order_attack(id, target),
                Command::Follow(leader) => self.order_follow(id, leader),
                Command::Repair(patient) => self.order_repair(id, patient),
                Command::ReturnToSupply => self.order_return(id),
                Command::UseSkill => self.order_skill(id),
            };
            if ok {
                accepted += 1;
            } else {
                tracing::warn!(unit = id, command = command.name(), tick = self.tick_count(), "command rejected");
            }
        }
        Ok(accepted)
    }

    /// The unit, if it is alive and free to take orders.
    fn orderable(&self, id: UnitId) -> bool {
        self.live_unit(id).is_some_and(|u| u.state != UnitState::Disabled)
    }

    /// Send `id` to `point`. Re-issuing the current destination is a no-op.
    pub fn order_move(&mut self, id: UnitId, point: Vec2Fixed) -> bool {
        if !self.orderable(id) {
            return false;
        }
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        if unit.state == UnitState::Moving && unit.target_pos == Some(point) {
            return true;
        }
        unit.clear_orders();
        unit.target_pos = Some(point);
        unit.set_state(UnitState::Moving);
        true
    }

    /// Set `id` on `target`. Units already engaging it keep their current
    /// approach or orbit.
    pub fn order_attack(&mut self, id: UnitId, target: UnitId) -> bool {
        self.order_attack_via(id, target, None)
    }

    /// Like [`World::order_attack`], closing through `intercept` first.
    pub fn order_attack_via(&mut self, id: UnitId, target: UnitId, intercept: Option<Vec2Fixed>) -> bool {
        if !self.orderable(id) {
            return false;
        }
        let Some(team) = self.live_unit(id).filter(|u| u.can_attack()).map(|u| u.team) else {
            return false;
        };
        if !self.live_unit(target).is_some_and(|t| t.team != team) {
            return false;
        }
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        let engaged = matches!(unit.state, UnitState::Attacking | UnitState::CircleStrafing)
            && unit.attack_target == Some(target);
        if engaged {
            if intercept.is_some() && unit.state == UnitState::Attacking {
                unit.target_pos = intercept;
            }
            return true;
        }
        unit.clear_orders();
        unit.attack_target = Some(target);
        unit.target = Some(target);
        unit.target_pos = intercept;
        unit.set_state(UnitState::Attacking);
        true
    }

    /// Have `id` keep station on `leader`.
    pub fn order_follow(&mut self, id: UnitId, leader: UnitId) -> bool {
        if id == leader || !self.orderable(id) || self.live_unit(leader).is_none() {
            return false;
        }
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        if unit.state == UnitState::Following && unit.follow_target == Some(leader) {
            return true;
        }
        unit.clear_orders();
        unit.follow_target = Some(leader);
        unit.set_state(UnitState::Following);
        true
    }

    /// Have a repair unit or mothership heal `patient`.
    pub fn order_repair(&mut self, id: UnitId, patient: UnitId) -> bool {
        if !self.orderable(id) {
            return false;
        }
        let Some(team) = self.live_unit(id).filter(|u| u.can_repair()).map(|u| u.team) else {
            return false;
        };
        if !self.live_unit(patient).is_some_and(|p| p.team == team) {
            return false;
        }
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        if unit.state == UnitState::Repairing && unit.repair_target == Some(patient) {
            return true;
        }
        unit.clear_orders();
        unit.repair_target = Some(patient);
        unit.target = Some(patient);
        unit.set_state(UnitState::Repairing);
        true
    }

    /// Send `id` home for supply.
    pub fn order_return(&mut self, id: UnitId) -> bool {
        if !self.orderable(id) {
            return false;
        }
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        if unit.kind == UnitKind::Mothership {
            return false;
        }
        if matches!(unit.state, UnitState::Returning | UnitState::Supplying) {
            return true;
        }
        unit.clear_orders();
        unit.set_state(UnitState::Returning);
        true
    }

    /// Stand `id` down.
    pub fn order_hold(&mut self, id: UnitId) -> bool {
        if !self.orderable(id) {
            return false;
        }
        let Some(unit) = self.unit_mut(id) else {
            return false;
        };
        unit.clear_orders();
        unit.set_state(UnitState::Idle);
        true
    }

    fn order_skill(&mut self, id: UnitId) -> bool {
        self.orderable(id) && self.use_skill(id)
    }
}

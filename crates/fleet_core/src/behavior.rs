//! Per-unit state machine.
//!
//! Each tick a live unit counts its timers down, then (unless disabled)
//! runs the handler for its current [`UnitState`]. Order references are
//! re-validated on every use; a reference to a dead or removed unit is
//! treated as absent and the unit falls back per its state's rules.

use crate::config::{
    AUTO_ENGAGE_MIN_ENERGY, AUTO_ENGAGE_RADIUS, AUTO_REPAIR_HP_RATIO, AUTO_REPAIR_MIN_ENERGY,
    AUTO_REPAIR_RADIUS, AUTO_RETURN_ENERGY, FOLLOW_DISTANCE, STRAFE_ANGULAR_SPEED, STRAFE_RADIUS,
    SUPPLY_ENERGY_RATE, SUPPLY_HP_RATE, SUPPLY_RANGE,
};
use crate::math::{Fixed, Vec2Fixed};
use crate::unit::{UnitId, UnitKind, UnitState, PLAYER_TEAM};
use crate::world::World;

impl World {
    /// Advance one unit's timers and state machine.
    pub(crate) fn update_unit(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        if !unit.is_alive() {
            return;
        }
        unit.tick_timers(dt);
        unit.velocity = Vec2Fixed::ZERO;
        if unit.state == UnitState::Disabled {
            return;
        }
        if unit.team == PLAYER_TEAM {
            self.player_autonomy(id);
        }

        let Some(state) = self.live_unit(id).map(|u| u.state) else {
            return;
        };
        match state {
            UnitState::Moving => self.update_moving(id, dt),
            UnitState::Attacking => self.update_attacking(id, dt),
            UnitState::CircleStrafing => self.update_strafing(id, dt),
            UnitState::Repairing => self.update_repairing(id, dt),
            UnitState::Following => self.update_following(id, dt),
            UnitState::Returning => self.update_returning(id, dt),
            UnitState::Supplying => self.update_supplying(id, dt),
            UnitState::Idle | UnitState::Disabled | UnitState::Dead => {}
        }

        self.release_stale_supply(id);
    }

    /// Step `id` toward `point` by at most `step`, detouring around blocked
    /// destinations. Returns true while the destination is still further
    /// than one step away.
    pub fn move_unit_towards(&mut self, id: UnitId, point: Vec2Fixed, step: Fixed) -> bool {
        let Some(unit) = self.live_unit(id) else {
            return false;
        };
        let (position, radius) = (unit.position, unit.radius);

        let mut goal = point;
        if self.terrain().is_blocked(point, radius) {
            if let Some(waypoint) = self.terrain().find_detour(position, point, radius).first() {
                goal = *waypoint;
            }
        }

        let distance = position.distance(goal);
        let still_moving = distance > step;
        let delta = if still_moving {
            (goal - position).normalize().scale(step)
        } else {
            goal - position
        };

        if let Some(unit) = self.unit_mut(id) {
            unit.position += delta;
            unit.velocity = delta;
        }
        still_moving
    }

    /// Limited self-direction for player units: they fire charged skills,
    /// head home when drained, and react to enemies or patients very close by.
    fn player_autonomy(&mut self, id: UnitId) {
        if self.live_unit(id).is_some_and(|u| u.skill_ready()) {
            self.use_skill(id);
        }

        let has_mothership = self
            .live_unit(id)
            .is_some_and(|u| self.mothership(u.team).is_some());
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        if unit.energy < AUTO_RETURN_ENERGY
            && unit.state == UnitState::Idle
            && unit.kind != UnitKind::Mothership
            && has_mothership
        {
            tracing::trace!(unit = id, "auto-returning for supply");
            unit.set_state(UnitState::Returning);
        }

        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let idle = unit.state == UnitState::Idle;

        if idle
            && unit.kind.auto_engages()
            && unit.can_attack()
            && self.resolve(unit.attack_target).is_none()
            && unit.energy > AUTO_ENGAGE_MIN_ENERGY
        {
            if let Some(enemy) = self.nearest_enemy(id, Some(AUTO_ENGAGE_RADIUS)) {
                if let Some(unit) = self.unit_mut(id) {
                    unit.attack_target = Some(enemy);
                    unit.set_state(UnitState::Attacking);
                }
                tracing::trace!(unit = id, enemy, "auto-engaging");
            }
            return;
        }

        if idle
            && unit.kind == UnitKind::Repair
            && self.resolve(unit.repair_target).is_none()
            && unit.energy > AUTO_REPAIR_MIN_ENERGY
        {
            let patient = self
                .damaged_allies(id, Some(AUTO_REPAIR_RADIUS))
                .into_iter()
                .find(|ally| self.unit(*ally).is_some_and(|a| a.hp_ratio() < AUTO_REPAIR_HP_RATIO));
            if let Some(patient) = patient {
                if let Some(unit) = self.unit_mut(id) {
                    unit.repair_target = Some(patient);
                    unit.target = Some(patient);
                    unit.set_state(UnitState::Repairing);
                }
            }
        }
    }

    fn update_moving(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let Some(destination) = unit.target_pos else {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Idle);
            }
            return;
        };
        let step = unit.speed * dt;
        if !self.move_unit_towards(id, destination, step) {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Idle);
                unit.target_pos = None;
            }
        }
    }

    fn update_attacking(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let Some(target) = self.resolve(unit.attack_target) else {
            self.lost_attack_target(id);
            return;
        };

        let target_id = target.id;
        let distance = unit.position.distance(target.position);
        let (kind, range) = (unit.kind, unit.attack_range);

        if kind.is_strafer() {
            if distance <= range + STRAFE_RADIUS {
                if let Some(unit) = self.unit_mut(id) {
                    unit.set_state(UnitState::CircleStrafing);
                }
            } else {
                self.chase(id, target_id, dt);
            }
        } else if distance <= range {
            self.perform_attack(id, target_id);
        } else {
            self.chase(id, target_id, dt);
        }
    }

    /// AI-side units pick the nearest enemy anywhere; player units stop.
    fn lost_attack_target(&mut self, id: UnitId) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let retarget = if unit.team == PLAYER_TEAM {
            None
        } else {
            self.nearest_enemy(id, None)
        };
        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        match retarget {
            Some(enemy) => {
                unit.attack_target = Some(enemy);
                unit.target = Some(enemy);
                tracing::trace!(unit = id, enemy, "re-acquired target");
            }
            None => {
                unit.set_state(UnitState::Idle);
                unit.attack_target = None;
                unit.target = None;
            }
        }
    }

    /// Close on `target`, through an intercept point when one is set.
    fn chase(&mut self, id: UnitId, target: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let step = unit.speed * dt;
        if let Some(intercept) = unit.target_pos {
            if !self.move_unit_towards(id, intercept, step) {
                if let Some(unit) = self.unit_mut(id) {
                    unit.target_pos = None;
                }
            }
            return;
        }
        if let Some(position) = self.live_unit(target).map(|t| t.position) {
            self.move_unit_towards(id, position, step);
        }
    }

    fn update_strafing(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let Some(target) = self.resolve(unit.attack_target) else {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Idle);
                unit.attack_target = None;
            }
            return;
        };

        let (target_id, target_pos) = (target.id, target.position);
        let distance = unit.position.distance(target_pos);
        let range = unit.attack_range;
        if distance > range + STRAFE_RADIUS * 2 {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Attacking);
            }
            return;
        }

        let step = unit.speed * dt;
        let angle = unit.circle_angle + STRAFE_ANGULAR_SPEED * dt * unit.circle_direction;
        if let Some(unit) = self.unit_mut(id) {
            unit.circle_angle = angle;
        }
        let orbit_point = target_pos + Vec2Fixed::from_angle(angle).scale(STRAFE_RADIUS);
        self.move_unit_towards(id, orbit_point, step);

        if distance <= range {
            self.perform_attack(id, target_id);
        }
    }

    fn update_repairing(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let patient = self
            .resolve(unit.repair_target)
            .filter(|p| p.hp < p.max_hp)
            .map(|p| (p.id, p.position));
        let Some((patient, position)) = patient else {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Idle);
                unit.repair_target = None;
                unit.target = None;
            }
            return;
        };

        if unit.position.distance(position) <= unit.repair_range {
            self.perform_repair(id, patient, dt);
        } else {
            let step = unit.speed * dt;
            self.move_unit_towards(id, position, step);
        }
    }

    fn update_following(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let Some(leader) = self.resolve(unit.follow_target) else {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Idle);
                unit.follow_target = None;
            }
            return;
        };

        let leader_pos = leader.position;
        let leader_prey = (leader.state == UnitState::Attacking)
            .then_some(leader.attack_target)
            .flatten()
            .and_then(|prey| self.live_unit(prey))
            .map(|prey| (prey.id, prey.position));
        let (can_attack, range, step) = (unit.can_attack(), unit.attack_range, unit.speed * dt);

        if unit.position.distance(leader_pos) > FOLLOW_DISTANCE {
            self.move_unit_towards(id, leader_pos, step);
        }

        if let Some((prey, prey_pos)) = leader_prey.filter(|_| can_attack) {
            let in_range = self
                .live_unit(id)
                .is_some_and(|u| u.position.distance(prey_pos) <= range);
            if in_range {
                if let Some(unit) = self.unit_mut(id) {
                    unit.attack_target = Some(prey);
                }
                self.perform_attack(id, prey);
            }
        }
    }

    fn update_returning(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let Some(mothership) = self.mothership(unit.team) else {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Idle);
            }
            return;
        };
        let (mother_id, mother_pos) = (mothership.id, mothership.position);

        if unit.position.distance(mother_pos) < SUPPLY_RANGE {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Supplying);
            }
            if let Some(mothership) = self.unit_mut(mother_id) {
                mothership.supply_target = Some(id);
            }
        } else {
            let step = unit.speed * dt;
            self.move_unit_towards(id, mother_pos, step);
        }
    }

    fn update_supplying(&mut self, id: UnitId, dt: Fixed) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        let mothership = self
            .mothership(unit.team)
            .filter(|m| m.position.distance(unit.position) < SUPPLY_RANGE)
            .map(|m| m.id);
        let Some(mother_id) = mothership else {
            if let Some(unit) = self.unit_mut(id) {
                unit.set_state(UnitState::Idle);
            }
            return;
        };

        let Some(unit) = self.unit_mut(id) else {
            return;
        };
        unit.restore_energy(SUPPLY_ENERGY_RATE * dt);
        unit.heal(SUPPLY_HP_RATE * dt);
        if unit.energy < unit.max_energy || unit.hp < unit.max_hp {
            return;
        }

        unit.set_state(UnitState::Idle);
        self.events_mut().supply_completed.push(id);
        if let Some(mothership) = self.unit_mut(mother_id) {
            if mothership.supply_target == Some(id) {
                mothership.supply_target = None;
            }
        }
        tracing::trace!(unit = id, "resupply complete");
    }

    /// A mothership forgets a supply target that left, finished or died.
    fn release_stale_supply(&mut self, id: UnitId) {
        let Some(unit) = self.live_unit(id) else {
            return;
        };
        if unit.kind != UnitKind::Mothership {
            return;
        }
        let Some(client) = unit.supply_target else {
            return;
        };
        let still_supplying = self.live_unit(client).is_some_and(|c| {
            c.state == UnitState::Supplying && c.position.distance(unit.position) <= SUPPLY_RANGE
        });
        if !still_supplying {
            if let Some(unit) = self.unit_mut(id) {
                unit.supply_target = None;
            }
        }
    }
}

//! A complete engagement: world, AI controllers and end conditions.
//!
//! [`Battle`] drives the world through the same phases as
//! [`World::tick`], inserting every AI controller between dead-unit pruning
//! and projectile advancement, then judges the level conditions.
//!
//! # Example
//!
//! ```
//! use fleet_core::battle::Battle;
//! use fleet_core::conditions::Outcome;
//! use fleet_core::data::LevelData;
//! use fleet_core::math::Fixed;
//!
//! let level = LevelData::load_str(
//!     r#"(
//!         name: "Standoff",
//!         ai_kind: "turtle",
//!         units: { "picket": (kind: heavy, max_hp: 200, speed: 40, attack_damage: 12, attack_range: 150) },
//!         player_units: [(unit_id: "picket", position: (1200, 2000))],
//!         enemy_units: [(unit_id: "picket", position: (1200, 400))],
//!         victory_conditions: (survive_time: Some(1.0)),
//!     )"#,
//!     "standoff.ron",
//! )
//! .unwrap();
//!
//! let mut battle = Battle::from_level(&level).unwrap();
//! assert_eq!(battle.run(Fixed::from_num(5)), Outcome::Victory);
//! ```

use serde::{Deserialize, Serialize};

use crate::ai::{create_controller_named, AiController, AiKind};
use crate::conditions::{evaluate, DefeatConditions, Outcome, VictoryConditions};
use crate::config::TICK_DELTA;
use crate::data::LevelData;
use crate::error::Result;
use crate::math::{decimal_serde, Fixed};
use crate::unit::{TeamId, ENEMY_TEAM, PLAYER_TEAM};
use crate::world::{TickEvents, World};

/// Running totals for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    /// Hull and shield points removed from the other side.
    #[serde(with = "decimal_serde")]
    pub damage_dealt: Fixed,
    /// Hull and shield points lost.
    #[serde(with = "decimal_serde")]
    pub damage_taken: Fixed,
    /// Enemy units destroyed.
    pub kills: u32,
    /// Own units destroyed.
    pub losses: u32,
    /// Skills fired.
    pub skills_fired: u32,
}

/// Running totals for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleStats {
    /// Team 0.
    pub player: TeamStats,
    /// Team 1.
    pub enemy: TeamStats,
    /// Projectiles launched by anyone.
    pub projectiles_fired: u32,
}

impl BattleStats {
    /// Totals for `team`; teams other than 0 count as the enemy side.
    #[must_use]
    pub fn team(&self, team: TeamId) -> &TeamStats {
        if team == PLAYER_TEAM {
            &self.player
        } else {
            &self.enemy
        }
    }

    fn team_mut(&mut self, team: TeamId) -> &mut TeamStats {
        if team == PLAYER_TEAM {
            &mut self.player
        } else {
            &mut self.enemy
        }
    }

    /// Fold one tick of events in. `world` resolves skill casters.
    fn record(&mut self, events: &TickEvents, world: &World) {
        for hit in &events.damage {
            if let Some(team) = hit.source_team {
                self.team_mut(team).damage_dealt += hit.amount;
            }
            self.team_mut(hit.target_team).damage_taken += hit.amount;
        }
        for death in &events.deaths {
            self.team_mut(death.team).losses += 1;
            if let Some(team) = death.killer_team.filter(|&t| t != death.team) {
                self.team_mut(team).kills += 1;
            }
        }
        for (caster, _) in &events.skills_fired {
            if let Some(team) = world.unit(*caster).map(|u| u.team) {
                self.team_mut(team).skills_fired += 1;
            }
        }
        self.projectiles_fired += events.projectiles_spawned;
    }
}

/// A world plus the controllers and conditions that decide it.
pub struct Battle {
    name: String,
    world: World,
    controllers: Vec<Box<dyn AiController>>,
    victory: VictoryConditions,
    defeat: DefeatConditions,
    outcome: Outcome,
    stats: BattleStats,
}

impl std::fmt::Debug for Battle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Battle")
            .field("name", &self.name)
            .field("tick", &self.world.tick_count())
            .field("controllers", &self.controller_kinds())
            .field("outcome", &self.outcome)
            .finish_non_exhaustive()
    }
}

impl Battle {
    /// Wrap `world` with no controllers and only the implicit end conditions.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self {
            name: String::new(),
            world,
            controllers: Vec::new(),
            victory: VictoryConditions::default(),
            defeat: DefeatConditions::default(),
            outcome: Outcome::InProgress,
            stats: BattleStats::default(),
        }
    }

    /// Build a battle from a level using the level's own seed.
    pub fn from_level(level: &LevelData) -> Result<Self> {
        Self::from_level_seeded(level, level.seed)
    }

    /// Build a battle from a level with an explicit world seed.
    ///
    /// The level is validated first; a bad template or spawn reference is
    /// returned as an error and nothing is built.
    pub fn from_level_seeded(level: &LevelData, seed: u64) -> Result<Self> {
        level.validate()?;
        let (width, height) = level.map_size;
        let mut world = World::new(seed)
            .with_map_size(width, height)
            .with_terrain(level.terrain.build(level.map_size));

        for (team, spawns) in [(PLAYER_TEAM, &level.player_units), (ENEMY_TEAM, &level.enemy_units)] {
            for spawn in spawns {
                let template = level.template(&spawn.unit_id)?;
                world.spawn_unit(template, team, spawn.position());
            }
        }

        let mut battle = Self::new(world).with_conditions(
            level.victory_conditions.clone(),
            level.defeat_conditions.clone(),
        );
        battle.name = level.name.clone();
        battle.add_controller(create_controller_named(&level.ai_kind, ENEMY_TEAM));
        for extra in &level.additional_ais {
            battle.add_controller(create_controller_named(&extra.kind, extra.team));
        }

        tracing::info!(
            level = %level.name,
            seed,
            player_units = battle.world.count_units(PLAYER_TEAM),
            enemy_units = battle.world.count_units(ENEMY_TEAM),
            controllers = ?battle.controller_kinds(),
            "battle created"
        );
        Ok(battle)
    }

    /// Replace the end conditions.
    #[must_use]
    pub fn with_conditions(mut self, victory: VictoryConditions, defeat: DefeatConditions) -> Self {
        self.victory = victory;
        self.defeat = defeat;
        self
    }

    /// Add a controller. Controllers run in insertion order, so for a
    /// shared team the last one added has the final word each tick.
    pub fn add_controller(&mut self, controller: Box<dyn AiController>) {
        self.controllers.push(controller);
    }

    /// Level name, empty for hand-built battles.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The battlefield.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable battlefield, for issuing player commands between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Kinds of the attached controllers, in run order.
    #[must_use]
    pub fn controller_kinds(&self) -> Vec<(AiKind, TeamId)> {
        self.controllers.iter().map(|c| (c.kind(), c.team())).collect()
    }

    /// Current outcome.
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Totals so far.
    #[must_use]
    pub fn stats(&self) -> &BattleStats {
        &self.stats
    }

    /// Whether an outcome has been reached.
    #[must_use]
    pub fn is_over(&self) -> bool {
        self.outcome != Outcome::InProgress
    }

    /// Advance one tick and re-judge the outcome. A decided battle no
    /// longer advances.
    pub fn tick(&mut self) -> Outcome {
        if self.is_over() {
            return self.outcome;
        }
        let dt = TICK_DELTA;
        let world = &mut self.world;
        world.begin_tick(dt);
        world.update_units(dt);
        world.resolve_collisions();
        world.prune_dead();
        for controller in &mut self.controllers {
            controller.update(world, dt);
        }
        world.update_projectiles(dt);
        world.update_effects(dt);
        world.finish_tick();

        self.stats.record(self.world.events(), &self.world);
        self.outcome = evaluate(&self.world, &self.victory, &self.defeat);
        if self.is_over() {
            tracing::info!(
                level = %self.name,
                outcome = ?self.outcome,
                tick = self.world.tick_count(),
                player_units = self.world.count_units(PLAYER_TEAM),
                enemy_units = self.world.count_units(ENEMY_TEAM),
                "battle decided"
            );
        }
        self.outcome
    }

    /// Tick until decided or `max_seconds` of simulation time have passed.
    pub fn run(&mut self, max_seconds: Fixed) -> Outcome {
        while !self.is_over() && self.world.elapsed() < max_seconds {
            self.tick();
        }
        self.outcome
    }
}

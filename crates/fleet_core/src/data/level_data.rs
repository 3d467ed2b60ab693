//! Level definitions: unit catalog, spawns, AI assignment and end conditions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::unit_data::UnitTemplate;
use crate::conditions::{DefeatConditions, VictoryConditions};
use crate::config::{MAP_HEIGHT, MAP_WIDTH};
use crate::error::{GameError, Result};
use crate::math::{decimal_serde, Fixed, Vec2Fixed};
use crate::terrain::{Terrain, TerrainKind, TerrainObject};
use crate::unit::{TeamId, ENEMY_TEAM};

/// A complete level.
///
/// # Example RON
///
/// ```ron
/// LevelData(
///     name: "Outer Rim",
///     ai_kind: "nightmare",
///     units: {
///         "raider": (kind: fighter, max_hp: 80, speed: 140, attack_damage: 8, attack_range: 150),
///     },
///     player_units: [(unit_id: "raider", position: (300, 2000))],
///     enemy_units: [(unit_id: "raider", position: (300, 400))],
///     victory_conditions: (eliminate_all: true),
///     defeat_conditions: (lose_mothership: true),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelData {
    /// Display name.
    pub name: String,

    /// Briefing text.
    #[serde(default)]
    pub description: String,

    /// Free-form difficulty label.
    #[serde(default = "default_difficulty")]
    pub difficulty: String,

    /// Controller for the enemy team.
    #[serde(default = "default_ai_kind")]
    pub ai_kind: String,

    /// Extra controllers, any team.
    #[serde(default)]
    pub additional_ais: Vec<AiAssignment>,

    /// Unit template catalog keyed by template id.
    pub units: BTreeMap<String, UnitTemplate>,

    /// Player fleet.
    #[serde(default)]
    pub player_units: Vec<UnitSpawn>,

    /// Enemy fleet.
    #[serde(default)]
    pub enemy_units: Vec<UnitSpawn>,

    /// Ways the player wins.
    #[serde(default)]
    pub victory_conditions: VictoryConditions,

    /// Ways the player loses.
    #[serde(default)]
    pub defeat_conditions: DefeatConditions,

    /// Battlefield obstacles.
    #[serde(default)]
    pub terrain: TerrainSetup,

    /// Battlefield width and height.
    #[serde(default = "default_map_size")]
    pub map_size: (i32, i32),

    /// World seed; a runner may override it.
    #[serde(default)]
    pub seed: u64,
}

fn default_difficulty() -> String {
    "normal".to_string()
}

fn default_ai_kind() -> String {
    "advanced".to_string()
}

const fn default_map_size() -> (i32, i32) {
    (MAP_WIDTH, MAP_HEIGHT)
}

/// An extra AI controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAssignment {
    /// Controller kind string.
    pub kind: String,

    /// Team it commands.
    #[serde(default = "default_ai_team")]
    pub team: TeamId,
}

const fn default_ai_team() -> TeamId {
    ENEMY_TEAM
}

/// A unit placed at level start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSpawn {
    /// Template id in the level catalog.
    pub unit_id: String,

    /// Spawn point.
    pub position: (i32, i32),
}

impl UnitSpawn {
    /// Spawn point as a world vector.
    #[must_use]
    pub fn position(&self) -> Vec2Fixed {
        Vec2Fixed::from_ints(self.position.0, self.position.1)
    }
}

/// How a level lays out its terrain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainSetup {
    /// Open space.
    #[default]
    None,
    /// Procedurally scattered obstacles.
    Generated {
        /// Terrain seed, independent of the world seed.
        seed: u64,
    },
    /// Hand-placed obstacles.
    Objects(Vec<TerrainPlacement>),
}

/// A hand-placed obstacle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainPlacement {
    /// Obstacle kind.
    pub kind: TerrainKind,

    /// Centre point.
    pub position: (i32, i32),

    /// Footprint radius.
    #[serde(with = "decimal_serde")]
    pub radius: Fixed,
}

impl TerrainSetup {
    /// Build the terrain for a map of the given size.
    #[must_use]
    pub fn build(&self, map_size: (i32, i32)) -> Terrain {
        match self {
            Self::None => Terrain::default(),
            Self::Generated { seed } => Terrain::generate(*seed, map_size.0, map_size.1),
            Self::Objects(placements) => Terrain::new(
                placements
                    .iter()
                    .map(|p| {
                        TerrainObject::new(
                            Vec2Fixed::from_ints(p.position.0, p.position.1),
                            p.kind,
                            p.radius,
                        )
                    })
                    .collect(),
            ),
        }
    }
}

impl LevelData {
    /// Parse a level from RON text. `origin` names the source in errors.
    pub fn from_ron_str(text: &str, origin: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    /// Look up a catalog template.
    pub fn template(&self, id: &str) -> Result<&UnitTemplate> {
        self.units
            .get(id)
            .ok_or_else(|| GameError::UnknownTemplate(id.to_string()))
    }

    /// Check every template and spawn reference.
    pub fn validate(&self) -> Result<()> {
        for (id, template) in &self.units {
            template.validate(id)?;
        }
        for spawn in self.player_units.iter().chain(&self.enemy_units) {
            self.template(&spawn.unit_id)?;
        }
        if self.map_size.0 <= 0 || self.map_size.1 <= 0 {
            return Err(GameError::InvalidState(format!(
                "map size must be positive, got {:?}",
                self.map_size
            )));
        }
        if let Some(time) = self.victory_conditions.survive_time {
            if time < Fixed::ZERO {
                return Err(GameError::InvalidState("survive_time must not be negative".into()));
            }
        }
        if let Some(time) = self.defeat_conditions.time_limit {
            if time < Fixed::ZERO {
                return Err(GameError::InvalidState("time_limit must not be negative".into()));
            }
        }
        Ok(())
    }

    /// Parse and validate in one step.
    pub fn load_str(text: &str, origin: &str) -> Result<Self> {
        let level = Self::from_ron_str(text, origin)?;
        level.validate()?;
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitKind;

    const LEVEL: &str = r#"(
        name: "Skirmish",
        units: {
            "mother": (kind: mothership, max_hp: 1000, speed: 50, attack_damage: 60, attack_range: 200,
                       attack_cooldown: 2.0, radius: 40, attack_type: beam),
            "viper": (kind: fighter, max_hp: 90, speed: 140, attack_damage: 9, attack_range: 150),
        },
        player_units: [(unit_id: "mother", position: (1200, 2000)), (unit_id: "viper", position: (1100, 1900))],
        enemy_units: [(unit_id: "viper", position: (1200, 400))],
        victory_conditions: (eliminate_mothership: true, survive_time: Some(120)),
        defeat_conditions: (lose_mothership: true),
        terrain: Generated(seed: 7),
    )"#;

    #[test]
    fn test_parse_level_with_defaults() {
        let level = LevelData::load_str(LEVEL, "skirmish.ron").unwrap();
        assert_eq!(level.ai_kind, "advanced");
        assert_eq!(level.difficulty, "normal");
        assert_eq!(level.map_size, (2400, 2400));
        assert_eq!(level.player_units.len(), 2);
        assert_eq!(level.template("viper").unwrap().kind, UnitKind::Fighter);
        assert!(level.victory_conditions.eliminate_mothership);
        assert_eq!(level.victory_conditions.survive_time, Some(Fixed::from_num(120)));
        assert!(level.defeat_conditions.lose_mothership);
        assert_eq!(level.terrain, TerrainSetup::Generated { seed: 7 });
    }

    #[test]
    fn test_unknown_spawn_template_is_rejected() {
        let text = LEVEL.replace("(unit_id: \"viper\", position: (1200, 400))", "(unit_id: \"ghost\", position: (0, 0))");
        let err = LevelData::load_str(&text, "broken.ron").unwrap_err();
        assert!(matches!(err, GameError::UnknownTemplate(ref id) if id == "ghost"));
    }

    #[test]
    fn test_missing_required_stat_reports_path() {
        let text = r#"(name: "Bad", units: { "x": (kind: heavy, speed: 40) })"#;
        let err = LevelData::load_str(text, "bad.ron").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { ref path, .. } if path == "bad.ron"));
    }

    #[test]
    fn test_placed_terrain_builds_objects() {
        let setup = TerrainSetup::Objects(vec![TerrainPlacement {
            kind: TerrainKind::Barrier,
            position: (100, 100),
            radius: Fixed::from_num(40),
        }]);
        let terrain = setup.build((2400, 2400));
        assert_eq!(terrain.objects().len(), 1);
        assert!(terrain.is_blocked(Vec2Fixed::from_ints(100, 130), Fixed::from_num(5)));
    }
}

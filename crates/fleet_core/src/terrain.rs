//! Terrain occlusion queries and generation.
//!
//! The battlefield is open space dotted with circular obstacles. Units ask
//! two questions of it: "is this point blocked for a hull of radius r" and
//! "how do I get around". The detour answer is a single greedy waypoint,
//! not real pathfinding.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_int, fixed_ratio, pi, Fixed, Vec2Fixed};
use crate::rng::SimRng;

/// Samples taken along a segment when checking for a clear line.
const PATH_SAMPLES: i32 = 30;

/// Detour probe distances from the segment midpoint, tried in order.
const DETOUR_DISTANCES: [i32; 3] = [80, 150, 250];

/// Terrain feature kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerrainKind {
    /// Nothing.
    #[default]
    Empty,
    /// Large destructible rock.
    Asteroid,
    /// Small destructible wreckage.
    Debris,
    /// Indestructible wall segment.
    Barrier,
    /// Decorative crystal field, does not block.
    Crystal,
}

impl TerrainKind {
    /// Whether hulls collide with this feature.
    #[must_use]
    pub const fn blocks_movement(self) -> bool {
        matches!(self, Self::Asteroid | Self::Debris | Self::Barrier)
    }
}

/// A circular terrain feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainObject {
    /// Centre point.
    pub position: Vec2Fixed,
    /// Feature kind.
    pub kind: TerrainKind,
    /// Footprint radius.
    #[serde(with = "crate::math::fixed_serde")]
    pub radius: Fixed,
    /// Whether weapons can wear it down.
    pub destructible: bool,
    /// Remaining structure points.
    #[serde(with = "crate::math::fixed_serde")]
    pub hp: Fixed,
}

impl TerrainObject {
    /// Create a feature.
    #[must_use]
    pub fn new(position: Vec2Fixed, kind: TerrainKind, radius: Fixed) -> Self {
        let (destructible, hp) = match kind {
            TerrainKind::Asteroid => (true, fixed_int(150)),
            TerrainKind::Debris => (true, fixed_int(50)),
            TerrainKind::Barrier => (false, fixed_int(200)),
            TerrainKind::Crystal | TerrainKind::Empty => (false, fixed_int(100)),
        };
        Self {
            position,
            kind,
            radius,
            destructible,
            hp,
        }
    }

    /// Apply damage; returns true when the feature is destroyed.
    pub fn take_damage(&mut self, damage: Fixed) -> bool {
        if !self.destructible {
            return false;
        }
        self.hp -= damage;
        self.hp <= Fixed::ZERO
    }
}

/// All terrain on the battlefield.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Terrain {
    objects: Vec<TerrainObject>,
}

impl Terrain {
    /// Terrain made of the given features.
    #[must_use]
    pub fn new(objects: Vec<TerrainObject>) -> Self {
        Self { objects }
    }

    /// Generate a seeded field for a `width` x `height` map.
    ///
    /// Asteroids and debris keep out of the deployment bands at the top and
    /// bottom edges so fleets never spawn inside rock.
    #[must_use]
    pub fn generate(seed: u64, width: i32, height: i32) -> Self {
        let mut rng = SimRng::new(seed);
        let mut objects = Vec::new();

        let mut scatter = |kind: TerrainKind,
                           count: usize,
                           radius: (i32, i32),
                           band: i32,
                           rng: &mut SimRng| {
            for _ in 0..count {
                let x = rng.range_i32(0, width);
                let y = rng.range_i32(band, (height - band).max(band + 1));
                let r = rng.range_i32(radius.0, radius.1 + 1);
                objects.push(TerrainObject::new(
                    Vec2Fixed::from_ints(x, y),
                    kind,
                    Fixed::from_num(r),
                ));
            }
        };

        scatter(TerrainKind::Asteroid, 12, (40, 90), 400, &mut rng);
        scatter(TerrainKind::Debris, 20, (20, 40), 350, &mut rng);
        scatter(TerrainKind::Barrier, 6, (30, 60), 0, &mut rng);
        scatter(TerrainKind::Crystal, 8, (15, 25), 0, &mut rng);

        tracing::debug!(seed, objects = objects.len(), "generated terrain");
        Self { objects }
    }

    /// All features.
    #[must_use]
    pub fn objects(&self) -> &[TerrainObject] {
        &self.objects
    }

    /// Whether a hull of `radius` centred on `point` overlaps a blocking feature.
    #[must_use]
    pub fn is_blocked(&self, point: Vec2Fixed, radius: Fixed) -> bool {
        self.objects.iter().any(|object| {
            if !object.kind.blocks_movement() {
                return false;
            }
            let reach = object.radius + radius;
            point.distance_squared(object.position) < reach.saturating_mul(reach)
        })
    }

    /// Whether the straight segment from `start` to `end` stays clear.
    #[must_use]
    pub fn is_path_clear(&self, start: Vec2Fixed, end: Vec2Fixed, radius: Fixed) -> bool {
        (0..=PATH_SAMPLES).all(|i| {
            let t = Fixed::from_num(i) / Fixed::from_num(PATH_SAMPLES);
            !self.is_blocked(start.lerp(end, t), radius)
        })
    }

    /// Waypoints from `start` to `end`: the direct endpoint when the line is
    /// clear, otherwise a detour probe followed by the endpoint.
    #[must_use]
    pub fn find_path(&self, start: Vec2Fixed, end: Vec2Fixed, radius: Fixed) -> Vec<Vec2Fixed> {
        if self.is_path_clear(start, end, radius) {
            vec![end]
        } else {
            self.find_detour(start, end, radius)
        }
    }

    /// Probe fixed offsets around the segment midpoint at growing distances.
    ///
    /// Returns `[detour, end]` for the first unblocked probe, or `[end]`
    /// when every probe is blocked.
    #[must_use]
    pub fn find_detour(&self, start: Vec2Fixed, end: Vec2Fixed, radius: Fixed) -> Vec<Vec2Fixed> {
        let mid = start.midpoint(end);
        let half_pi = pi() * fixed_ratio(1, 2);
        let quarter_pi = pi() * fixed_ratio(1, 4);
        let angles = [half_pi, -half_pi, quarter_pi, -quarter_pi];

        for distance in DETOUR_DISTANCES {
            for angle in angles {
                let probe = mid + Vec2Fixed::from_angle(angle).scale(Fixed::from_num(distance));
                if !self.is_blocked(probe, radius) {
                    return vec![probe, end];
                }
            }
        }
        vec![end]
    }

    /// Damage destructible features within `radius` of `point`.
    ///
    /// Destroyed features are removed and returned.
    pub fn damage_at(&mut self, point: Vec2Fixed, damage: Fixed, radius: Fixed) -> Vec<TerrainObject> {
        let mut destroyed = Vec::new();
        let mut index = 0;
        while index < self.objects.len() {
            let object = &mut self.objects[index];
            let in_reach =
                object.position.distance_squared(point) <= radius.saturating_mul(radius);
            if in_reach && object.take_damage(damage) {
                destroyed.push(self.objects.remove(index));
            } else {
                index += 1;
            }
        }
        destroyed
    }
}

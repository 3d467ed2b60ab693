//! Presentational effects.
//!
//! Effects never influence the simulation. The world times them so a
//! renderer can draw whatever is still active.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_ratio, fixed_int, Fixed, Vec2Fixed};

/// Visual effect kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Muzzle trail of a ranged shot.
    ProjectileTrail,
    /// Beam weapon line.
    Beam,
    /// Melee strike line.
    Melee,
    /// Artillery blast ring.
    ArtilleryBlast,
    /// Missile launch flash.
    Missile,
    /// Generic skill flash.
    Skill,
    /// Area damage blast.
    Explosion,
    /// Area heal ring.
    Heal,
    /// Buff ring.
    Buff,
    /// Shield bubble.
    Shield,
    /// Teleport line.
    Teleport,
    /// Disable ring.
    Disable,
    /// Team-wide heal flash.
    GlobalHeal,
}

impl EffectKind {
    /// How long the effect stays on screen, in seconds.
    #[must_use]
    pub const fn duration(self) -> Fixed {
        match self {
            Self::ProjectileTrail => fixed_ratio(1, 5),
            Self::Beam | Self::Melee => fixed_ratio(3, 10),
            Self::ArtilleryBlast | Self::Buff | Self::Teleport => fixed_ratio(1, 2),
            Self::Missile => fixed_ratio(2, 5),
            Self::Skill | Self::Heal | Self::Shield => fixed_int(1),
            Self::Explosion | Self::Disable => fixed_ratio(4, 5),
            Self::GlobalHeal => fixed_int(2),
        }
    }
}

/// A timed effect at a point, or along a line when `end` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    /// Effect kind.
    pub kind: EffectKind,
    /// Anchor point (line start).
    pub position: Vec2Fixed,
    /// Line end point.
    pub end: Option<Vec2Fixed>,
    /// Ring radius for area effects.
    #[serde(with = "crate::math::fixed_serde")]
    pub radius: Fixed,
    /// Seconds left on screen.
    #[serde(with = "crate::math::fixed_serde")]
    pub remaining: Fixed,
}

/// Active effects, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectRegistry {
    effects: Vec<Effect>,
}

impl EffectRegistry {
    /// Register an area effect.
    pub fn add_area(&mut self, kind: EffectKind, position: Vec2Fixed, radius: Fixed) {
        self.effects.push(Effect {
            kind,
            position,
            end: None,
            radius,
            remaining: kind.duration(),
        });
    }

    /// Register a line effect between two points.
    pub fn add_line(&mut self, kind: EffectKind, from: Vec2Fixed, to: Vec2Fixed) {
        self.effects.push(Effect {
            kind,
            position: from,
            end: Some(to),
            radius: Fixed::ZERO,
            remaining: kind.duration(),
        });
    }

    /// Count every effect down by `dt` and drop the expired ones.
    pub fn update(&mut self, dt: Fixed) {
        for effect in &mut self.effects {
            effect.remaining -= dt;
        }
        self.effects.retain(|effect| effect.remaining > Fixed::ZERO);
    }

    /// Active effects.
    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.effects.iter()
    }

    /// Number of active effects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_durations() {
        let close = |a: Fixed, b: f64| (a - Fixed::from_num(b)).abs() < Fixed::from_num(0.000_001);
        assert!(close(EffectKind::ProjectileTrail.duration(), 0.2));
        assert!(close(EffectKind::Explosion.duration(), 0.8));
        assert_eq!(EffectKind::GlobalHeal.duration(), Fixed::from_num(2));
    }

    #[test]
    fn test_effects_expire() {
        let mut registry = EffectRegistry::default();
        registry.add_line(EffectKind::Beam, Vec2Fixed::ZERO, Vec2Fixed::from_ints(10, 0));
        registry.add_area(EffectKind::Heal, Vec2Fixed::ZERO, Fixed::from_num(200));
        assert_eq!(registry.len(), 2);

        registry.update(Fixed::from_num(0.5));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.iter().next().map(|e| e.kind), Some(EffectKind::Heal));

        registry.update(Fixed::from_num(0.5));
        assert!(registry.is_empty());
    }
}

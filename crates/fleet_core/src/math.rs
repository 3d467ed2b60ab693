//! Fixed-point math utilities for deterministic simulation.
//!
//! All fleet simulation uses fixed-point arithmetic so that the same
//! level, seed and orders always produce the same battle. Floating-point
//! values only appear at the data-file boundary (see [`decimal_serde`]).

use fixed::consts;
use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// Builds a whole-number [`Fixed`] in const context.
#[must_use]
pub const fn fixed_int(value: i32) -> Fixed {
    Fixed::from_bits((value as i64) << 32)
}

/// Builds the fraction `num / den` as a [`Fixed`] in const context.
#[must_use]
pub const fn fixed_ratio(num: i32, den: i32) -> Fixed {
    Fixed::from_bits(((num as i64) << 32) / den as i64)
}

/// Pi as a fixed-point value.
#[must_use]
pub fn pi() -> Fixed {
    Fixed::from_num(consts::PI)
}

/// Tau (2 pi) as a fixed-point value.
#[must_use]
pub fn tau() -> Fixed {
    Fixed::from_num(consts::TAU)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for human-authored decimal numbers.
///
/// Level and template files are written by hand, so stats such as
/// `attack_cooldown: 1.5` are read as decimals and converted once at load.
/// Non-finite or out-of-range values are rejected.
pub mod decimal_serde {
    use super::Fixed;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a decimal into a fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(raw)
            .ok_or_else(|| de::Error::custom(format!("number {raw} is not representable")))
    }
}

/// Serde support for optional decimal numbers.
///
/// Accepts a bare number as well as `Some(..)`, so tuning fields in level
/// files can be written as `radius: 150`.
pub mod option_decimal_serde {
    use std::fmt;

    use super::Fixed;
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize an optional fixed-point number as a bare decimal.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => serializer.serialize_f64(v.to_num::<f64>()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize a bare decimal, `Some(decimal)` or `None`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(OptionalDecimal)
    }

    struct OptionalDecimal;

    fn convert<E: de::Error>(raw: f64) -> Result<Option<Fixed>, E> {
        Fixed::checked_from_num(raw)
            .map(Some)
            .ok_or_else(|| E::custom(format!("number {raw} is not representable")))
    }

    impl<'de> de::Visitor<'de> for OptionalDecimal {
        type Value = Option<Fixed>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number, Some(number) or None")
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            convert(v)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            convert(v as f64)
        }

        #[allow(clippy::cast_precision_loss)]
        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            convert(v as f64)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
            let raw = f64::deserialize(deserializer)?;
            convert(raw)
        }
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Create a vector from whole-number coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Unit vector pointing along `angle` (radians).
    #[must_use]
    pub fn from_angle(angle: Fixed) -> Self {
        Self::new(fixed_cos(angle), fixed_sin(angle))
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Vector length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x.saturating_mul(other.x) + self.y.saturating_mul(other.y)
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Linearly interpolate between two vectors.
    #[must_use]
    pub fn lerp(self, other: Self, t: Fixed) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Midpoint between two vectors.
    #[must_use]
    pub fn midpoint(self, other: Self) -> Self {
        self.lerp(other, fixed_ratio(1, 2))
    }

    /// Normalize vector using fixed-point math.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);

        if len_sq == Fixed::ZERO {
            return Self::ZERO;
        }

        let len = fixed_sqrt(len_sq);
        if len == Fixed::ZERO {
            return Self::ZERO;
        }

        Self::new(self.x / len, self.y / len)
    }
}

/// Computes the square root of a fixed-point number using binary search.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::ONE { value } else { Fixed::ONE };

    for _ in 0..64 {
        let mid = low + (high - low) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Sine of `angle` (radians).
///
/// Reduces into [-pi/2, pi/2] and evaluates the Taylor series to the
/// ninth power, which keeps the error below 1e-5 over the whole circle.
#[must_use]
pub fn fixed_sin(angle: Fixed) -> Fixed {
    let pi = pi();
    let half_pi = pi / Fixed::from_num(2);

    let mut x = angle - (angle / tau()).round() * tau();
    if x > half_pi {
        x = pi - x;
    } else if x < -half_pi {
        x = -pi - x;
    }

    let x2 = x * x;
    let mut term = x;
    let mut sum = x;
    for divisor in [6, 20, 42, 72] {
        term = -term * x2 / Fixed::from_num(divisor);
        sum += term;
    }
    sum
}

/// Cosine of `angle` (radians).
#[must_use]
pub fn fixed_cos(angle: Fixed) -> Fixed {
    fixed_sin(angle + pi() / Fixed::from_num(2))
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

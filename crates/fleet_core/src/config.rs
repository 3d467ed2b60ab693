//! Simulation tuning constants.
//!
//! Distances are in world units, rates are per second, durations in seconds.

use crate::math::{fixed_int, fixed_ratio, Fixed};

/// Ticks per second for the simulation.
pub const TICK_RATE: u32 = 60;

/// Duration of one tick in seconds.
pub const TICK_DELTA: Fixed = fixed_ratio(1, TICK_RATE as i32);

/// Default battlefield width.
pub const MAP_WIDTH: i32 = 2400;

/// Default battlefield height.
pub const MAP_HEIGHT: i32 = 2400;

// ============================================================================
// Energy & Skill Points
// ============================================================================

/// Energy spent per attack (motherships attack for free).
pub const ENERGY_ATTACK_COST: Fixed = fixed_int(5);

/// Energy per second spent while repairing; also the minimum to start a repair tick.
pub const ENERGY_REPAIR_COST: Fixed = fixed_int(3);

/// Skill points gained per successful attack.
pub const SP_GAIN_PER_ATTACK: Fixed = fixed_int(8);

/// Skill point capacity of every non-mothership unit.
pub const DEFAULT_MAX_SP: Fixed = fixed_int(100);

// ============================================================================
// Supply
// ============================================================================

/// Distance from the mothership at which supply happens.
pub const SUPPLY_RANGE: Fixed = fixed_int(80);

/// Energy restored per second while supplying.
pub const SUPPLY_ENERGY_RATE: Fixed = fixed_int(80);

/// Hit points restored per second while supplying.
pub const SUPPLY_HP_RATE: Fixed = fixed_int(50);

// ============================================================================
// Movement
// ============================================================================

/// Orbit radius for circle-strafing units.
pub const STRAFE_RADIUS: Fixed = fixed_int(100);

/// Orbit angular speed in radians per second.
pub const STRAFE_ANGULAR_SPEED: Fixed = fixed_int(1);

/// Followers close in once farther than this from the followed unit.
pub const FOLLOW_DISTANCE: Fixed = fixed_int(80);

/// Attempts made when searching for an unblocked point.
pub const CLEAR_POSITION_ATTEMPTS: i32 = 10;

/// Radial step between clear-position attempts.
pub const CLEAR_POSITION_STEP: Fixed = fixed_int(30);

/// Shortest jump a teleport makes.
pub const TELEPORT_MIN_DISTANCE: Fixed = fixed_int(100);

// ============================================================================
// Player-side autonomy
// ============================================================================

/// Idle player units below this energy head home.
pub const AUTO_RETURN_ENERGY: Fixed = fixed_int(20);

/// Radius inside which idle player combat units engage on their own.
pub const AUTO_ENGAGE_RADIUS: Fixed = fixed_int(150);

/// Energy required before a player unit engages on its own.
pub const AUTO_ENGAGE_MIN_ENERGY: Fixed = fixed_int(50);

/// Radius inside which idle player repair units pick patients.
pub const AUTO_REPAIR_RADIUS: Fixed = fixed_int(100);

/// Energy required before a player repair unit starts on its own.
pub const AUTO_REPAIR_MIN_ENERGY: Fixed = fixed_int(30);

/// Allies below this hp ratio are auto-repair candidates.
pub const AUTO_REPAIR_HP_RATIO: Fixed = fixed_ratio(1, 2);

// ============================================================================
// Projectiles
// ============================================================================

/// Projectiles closer than this to their aim point have arrived.
pub const PROJECTILE_HIT_RADIUS: Fixed = fixed_int(5);

/// Angular step between spread shots.
pub const SPREAD_ANGLE_STEP: Fixed = fixed_ratio(1, 5);

/// Distance of spread aim points from the target.
pub const SPREAD_OFFSET: Fixed = fixed_int(20);

/// Artillery shell speed.
pub const ARTILLERY_SPEED: Fixed = fixed_int(200);

/// Homing missile speed.
pub const MISSILE_SPEED: Fixed = fixed_int(300);

/// Radius around an artillery impact in which terrain takes damage.
pub const TERRAIN_DAMAGE_RADIUS: Fixed = fixed_int(50);

//! Proptest strategies.
//!
//! Generate random but reproducible inputs for property-based
//! testing of unit invariants and battle determinism.

use fleet_core::commands::Command;
use fleet_core::math::{Fixed, Vec2Fixed};
use fleet_core::unit::{UnitId, UnitKind};
use proptest::prelude::*;

/// A coordinate on the default battlefield.
///
/// Range: 0 to 2400
pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
    (0i32..2400i32).prop_map(Fixed::from_num)
}

/// A point on the default battlefield.
pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
    (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
}

/// A damage or heal amount with a fractional part, 0 to 1000.
pub fn arb_amount() -> impl Strategy<Value = Fixed> {
    (0i64..1000 << 16).prop_map(|raw| Fixed::from_bits(raw << 16))
}

/// A timer step of 1 to 120 ticks' worth of seconds.
pub fn arb_duration() -> impl Strategy<Value = Fixed> {
    (1i32..=120i32).prop_map(|ticks| Fixed::from_num(ticks) / Fixed::from_num(60))
}

/// Any hull classification.
pub fn arb_unit_kind() -> impl Strategy<Value = UnitKind> {
    proptest::sample::select(UnitKind::ALL.to_vec())
}

/// A hull classification that fights and skills.
pub fn arb_combat_kind() -> impl Strategy<Value = UnitKind> {
    proptest::sample::select(vec![
        UnitKind::Fighter,
        UnitKind::Heavy,
        UnitKind::Scout,
        UnitKind::Bomber,
        UnitKind::Interceptor,
    ])
}

/// A command whose unit references fall in `1..=max_id`.
pub fn arb_command(max_id: UnitId) -> impl Strategy<Value = Command> {
    let id = 1..=max_id;
    prop_oneof![
        arb_position().prop_map(Command::MoveTo),
        id.clone().prop_map(Command::Attack),
        id.clone().prop_map(Command::Follow),
        id.prop_map(Command::Repair),
        Just(Command::ReturnToSupply),
        Just(Command::UseSkill),
    ]
}

/// A scripted order stream: `(tick, unit, command)` triples, sorted by tick.
pub fn arb_order_script(
    max_id: UnitId,
    max_tick: u64,
    max_len: usize,
) -> impl Strategy<Value = Vec<(u64, UnitId, Command)>> {
    proptest::collection::vec((0..max_tick, 1..=max_id, arb_command(max_id)), 0..max_len).prop_map(
        |mut script| {
            script.sort_by_key(|(tick, unit, _)| (*tick, *unit));
            script
        },
    )
}

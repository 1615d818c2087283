//! Interfaces the mirroring layer consumes from the host simulation.
//!
//! The host owns the rosters, the experience rules, and the combat pipeline.
//! The mirroring layer never reimplements them; it reads and writes units
//! through [`UnitStore`] and asks [`GrowthRules`] for experience and growth.
//! [`World`](crate::world::World) and
//! [`StandardGrowth`](crate::world::StandardGrowth) are in-memory reference
//! implementations.

use mirror_types::{Class, ClassId, GrowthTable, ParamKind, ParamVector, RosterKind, Unit, UnitHandle};

/// Read and write access to the host rosters.
pub trait UnitStore {
    /// Number of units in `roster`.
    fn roster_len(&self, roster: RosterKind) -> usize;

    /// Unit at `index` in `roster`'s iteration order.
    fn roster_get(&self, roster: RosterKind, index: usize) -> Option<&Unit>;

    /// Unit by runtime handle, whichever roster holds it.
    fn unit(&self, handle: UnitHandle) -> Option<&Unit>;

    /// Mutable unit by runtime handle.
    fn unit_mut(&mut self, handle: UnitHandle) -> Option<&mut Unit>;

    /// Class definition by identifier.
    fn class(&self, id: ClassId) -> Option<&Class>;

    /// Number of item slots every unit has.
    fn item_capacity(&self) -> usize;

    /// Clamp `value` into the valid range of `param` for `unit`.
    ///
    /// The ceiling is the unit's class cap. Units whose class is unknown are
    /// only floored.
    fn valid_value(&self, unit: &Unit, param: ParamKind, value: i32) -> i32 {
        let floor = param.floor();
        let cap = self
            .class(unit.class)
            .map_or(i32::MAX, |class| class.caps.get(param));
        value.min(cap).max(floor)
    }
}

/// One side of a virtual (pre-resolved) combat exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualCombatant {
    /// The unit fighting.
    pub unit: UnitHandle,
    /// HP at the end of the simulated exchange.
    pub hp: i32,
    /// Total damage this combatant dealt during the exchange.
    pub damage_dealt: i32,
}

impl VirtualCombatant {
    /// Construct a combatant record.
    pub const fn new(unit: UnitHandle, hp: i32, damage_dealt: i32) -> Self {
        Self {
            unit,
            hp,
            damage_dealt,
        }
    }

    /// Whether this combatant survived the exchange.
    pub const fn survived(&self) -> bool {
        self.hp > 0
    }
}

/// Input to the host's experience calculator, oriented from the unit that
/// earns the experience.
#[derive(Debug, Clone, Copy)]
pub struct AttackExperience<'a> {
    /// The unit earning experience.
    pub active: &'a Unit,
    /// HP the earning unit ended the exchange with.
    pub active_hp: i32,
    /// Damage the earning unit dealt.
    pub active_damage: i32,
    /// The opponent.
    pub passive: &'a Unit,
    /// HP the opponent ended the exchange with.
    pub passive_hp: i32,
    /// Damage the opponent dealt.
    pub passive_damage: i32,
}

/// The host's experience and growth rules.
pub trait GrowthRules {
    /// Add `amount` experience to `unit` using the host's accumulation rule.
    ///
    /// Returns `true` when the unit gained a level.
    fn add_experience(&mut self, unit: &mut Unit, amount: u32) -> bool;

    /// Growth table for a human-roster unit, computed from its personal
    /// rates and its class.
    fn roster_growth(&mut self, unit: &Unit, class: Option<&Class>) -> GrowthTable;

    /// Fixed per-level growth table of `class` at `level`.
    fn class_growth(&self, class: &Class, level: u32) -> GrowthTable;

    /// Add `table` to `unit`'s parameters, clamping each slot to `caps`.
    fn apply_growth(&self, unit: &mut Unit, table: &GrowthTable, caps: &ParamVector);

    /// Experience earned by the active side of an exchange.
    fn experience_for(&self, attack: &AttackExperience<'_>) -> u32;
}

//! Core entity structs: units, classes, items, and parameter vectors.

use serde::{Deserialize, Serialize};

use crate::enums::{AliveState, Deployment, Faction, Importance, PARAM_COUNT, ParamKind};
use crate::ids::{BaseId, ClassId, ItemInstanceId, ItemKindId, UnitHandle};

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Fixed-size vector of unit parameters, one value per [`ParamKind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ParamVector([i32; PARAM_COUNT]);

impl ParamVector {
    /// A vector with every slot set to zero.
    pub const fn zero() -> Self {
        Self([0; PARAM_COUNT])
    }

    /// A vector with every slot set to `value`.
    pub const fn splat(value: i32) -> Self {
        Self([value; PARAM_COUNT])
    }

    /// Build a vector from raw values in [`ParamKind::ALL`] order.
    pub const fn from_array(values: [i32; PARAM_COUNT]) -> Self {
        Self(values)
    }

    /// Read one slot.
    pub fn get(&self, kind: ParamKind) -> i32 {
        self.0.get(kind.index()).copied().unwrap_or(0)
    }

    /// Write one slot.
    pub fn set(&mut self, kind: ParamKind, value: i32) {
        if let Some(slot) = self.0.get_mut(kind.index()) {
            *slot = value;
        }
    }

    /// Builder-style variant of [`set`](Self::set).
    #[must_use]
    pub fn with(mut self, kind: ParamKind, value: i32) -> Self {
        self.set(kind, value);
        self
    }

    /// Iterate `(kind, value)` pairs in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamKind, i32)> + '_ {
        ParamKind::ALL.iter().map(|&kind| (kind, self.get(kind)))
    }
}

/// Per-slot increases applied to a unit when it gains a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GrowthTable {
    /// Amount added to each parameter slot.
    pub gains: ParamVector,
}

impl GrowthTable {
    /// A table that grows nothing.
    pub const fn zero() -> Self {
        Self {
            gains: ParamVector::zero(),
        }
    }

    /// Wrap a vector of gains.
    pub const fn new(gains: ParamVector) -> Self {
        Self { gains }
    }
}

/// A tile coordinate on the battle map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MapPosition {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl MapPosition {
    /// Construct a position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// A single item instance held in a unit's item slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier of this instance.
    pub instance: ItemInstanceId,
    /// Authored item entry this instance was made from.
    pub kind: ItemKindId,
    /// Display name.
    pub name: String,
    /// Remaining uses, or `None` for unbreakable items.
    pub uses: Option<u32>,
}

impl Item {
    /// Create a new item instance.
    pub fn new(kind: ItemKindId, name: impl Into<String>, uses: Option<u32>) -> Self {
        Self {
            instance: ItemInstanceId::new(),
            kind,
            name: name.into(),
            uses,
        }
    }

    /// Copy this item into a new, independent instance.
    ///
    /// Durability is carried over; the instance identifier is fresh.
    #[must_use]
    pub fn duplicate(&self) -> Self {
        Self {
            instance: ItemInstanceId::new(),
            kind: self.kind,
            name: self.name.clone(),
            uses: self.uses,
        }
    }
}

/// Bounded, slot-addressed item storage.
///
/// The number of slots is fixed at construction. Empty slots may sit between
/// occupied ones after an item breaks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemSlots {
    slots: Vec<Option<Item>>,
}

impl ItemSlots {
    /// Create `capacity` empty slots.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
        }
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Item in `slot`, if any.
    pub fn get(&self, slot: usize) -> Option<&Item> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Mutable access to the item in `slot`, if any.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Item> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Empty `slot`, returning whatever was there.
    pub fn clear(&mut self, slot: usize) -> Option<Item> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Empty every slot.
    pub fn clear_all(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
    }

    /// Place `item` into `slot`.
    ///
    /// Returns the item back when `slot` is beyond capacity.
    pub fn set(&mut self, slot: usize, item: Item) -> Result<(), Item> {
        match self.slots.get_mut(slot) {
            Some(target) => {
                *target = Some(item);
                Ok(())
            }
            None => Err(item),
        }
    }

    /// Iterate occupied slots in order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.slots.iter().flatten()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

// ---------------------------------------------------------------------------
// Classes
// ---------------------------------------------------------------------------

/// A unit class (archetype).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Authored identifier.
    pub id: ClassId,
    /// Display name.
    pub name: String,
    /// Highest value each parameter may reach for units of this class.
    pub caps: ParamVector,
    /// Growth rates in percent, added to a player unit's personal rates.
    pub growth_rates: ParamVector,
    /// Fixed level-up gains for computer-controlled units, indexed by
    /// `level - 1`. Levels past the end reuse the last entry.
    #[serde(default)]
    pub prototype_growth: Vec<GrowthTable>,
}

impl Class {
    /// Create a class with the given caps and no growth.
    pub fn new(id: ClassId, name: impl Into<String>, caps: ParamVector) -> Self {
        Self {
            id,
            name: name.into(),
            caps,
            growth_rates: ParamVector::zero(),
            prototype_growth: Vec::new(),
        }
    }

    /// Prototype gains for a unit of this class at `level`.
    pub fn prototype_growth_at(&self, level: u32) -> GrowthTable {
        let index = usize::try_from(level.saturating_sub(1)).unwrap_or(usize::MAX);
        self.prototype_growth
            .get(index)
            .or_else(|| self.prototype_growth.last())
            .copied()
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// A combatant held by the host simulation.
///
/// Fields are public because the host owns the struct and several
/// subsystems (including the mirroring layer) write into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Runtime handle, unique per instance.
    pub handle: UnitHandle,
    /// Authored base identifier.
    pub base_id: BaseId,
    /// Side this unit fights for.
    pub faction: Faction,
    /// Current display name.
    pub name: String,
    /// Description text.
    pub description: String,
    /// Portrait resource reference.
    pub portrait: Option<String>,
    /// Story importance.
    pub importance: Importance,
    /// Current class.
    pub class: ClassId,
    /// First class-group identifier (promotion line).
    pub class_group_1: u32,
    /// Second class-group identifier (alternate promotion line).
    pub class_group_2: u32,
    /// Number of class changes performed.
    pub class_up_count: u32,
    /// Parameter vector.
    pub params: ParamVector,
    /// Current hit points.
    pub hp: i32,
    /// Current level.
    pub level: u32,
    /// Experience towards the next level.
    pub exp: u32,
    /// Equipped items.
    pub items: ItemSlots,
    /// Personal growth rates in percent (used for player units).
    pub growth_rates: ParamVector,
    /// Alive state.
    pub alive: AliveState,
    /// Deployment state.
    pub deployment: Deployment,
    /// Map position.
    pub position: MapPosition,
    /// Free-form configuration blob ("custom parameters").
    pub custom: serde_json::Value,
}

impl Unit {
    /// Create a level 1 unit with empty items and an empty blob.
    pub fn new(
        base_id: BaseId,
        faction: Faction,
        name: impl Into<String>,
        class: ClassId,
        item_capacity: usize,
    ) -> Self {
        Self {
            handle: UnitHandle::new(),
            base_id,
            faction,
            name: name.into(),
            description: String::new(),
            portrait: None,
            importance: Importance::default(),
            class,
            class_group_1: 0,
            class_group_2: 0,
            class_up_count: 0,
            params: ParamVector::zero().with(ParamKind::MaxHp, 1),
            hp: 1,
            level: 1,
            exp: 0,
            items: ItemSlots::with_capacity(item_capacity),
            growth_rates: ParamVector::zero(),
            alive: AliveState::Alive,
            deployment: Deployment::Undeployed,
            position: MapPosition::default(),
            custom: serde_json::Value::Null,
        }
    }

    /// Maximum hit points from the parameter vector.
    pub fn max_hp(&self) -> i32 {
        self.params.get(ParamKind::MaxHp)
    }

    /// Whether the unit is alive.
    pub fn is_alive(&self) -> bool {
        self.alive == AliveState::Alive
    }

    /// Whether the unit is placed on the map.
    pub fn is_deployed(&self) -> bool {
        self.deployment == Deployment::Deployed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicated_item_gets_new_instance() {
        let sword = Item::new(ItemKindId(1), "Iron Sword", Some(40));
        let copy = sword.duplicate();
        assert_ne!(sword.instance, copy.instance);
        assert_eq!(sword.kind, copy.kind);
        assert_eq!(copy.uses, Some(40));
    }

    #[test]
    fn item_slots_reject_out_of_range() {
        let mut slots = ItemSlots::with_capacity(2);
        let item = Item::new(ItemKindId(1), "Vulnerary", Some(3));
        assert!(slots.set(0, item.clone()).is_ok());
        assert!(slots.set(2, item).is_err());
        assert_eq!(slots.len(), 1);
        assert!(slots.clear(0).is_some());
        assert!(slots.is_empty());
    }

    #[test]
    fn prototype_growth_reuses_last_entry() {
        let mut class = Class::new(ClassId(1), "Fighter", ParamVector::splat(60));
        class.prototype_growth = vec![
            GrowthTable::new(ParamVector::zero().with(ParamKind::Strength, 1)),
            GrowthTable::new(ParamVector::zero().with(ParamKind::Strength, 2)),
        ];
        assert_eq!(class.prototype_growth_at(1).gains.get(ParamKind::Strength), 1);
        assert_eq!(class.prototype_growth_at(9).gains.get(ParamKind::Strength), 2);
        assert_eq!(
            Class::new(ClassId(2), "Empty", ParamVector::zero()).prototype_growth_at(3),
            GrowthTable::zero()
        );
    }

    #[test]
    fn new_unit_defaults() {
        let unit = Unit::new(BaseId(5), Faction::Player, "Alm", ClassId(1), 5);
        assert_eq!(unit.level, 1);
        assert_eq!(unit.items.capacity(), 5);
        assert!(unit.is_alive());
        assert!(!unit.is_deployed());
    }
}

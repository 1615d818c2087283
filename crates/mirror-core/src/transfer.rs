//! State transfer between a source unit and its shadow.
//!
//! Both operations copy the same field set:
//!
//! - the parameter vector except the reserved last slot, each value clamped
//!   into the destination's valid range,
//! - current HP (clamped to the new max HP), level, and experience,
//! - items: every destination slot is emptied, then source items are
//!   duplicated in slot order until the first empty source slot or the
//!   destination runs out of slots,
//! - class, display name, description, portrait, importance, both class
//!   groups, and the class-change count.
//!
//! [`clone_unit`] is the spawn-time copy. It additionally heals the
//! destination to full (unless HP is preserved) and moves it onto the tile of
//! a source that was deployed but has fallen. [`sync_unit`] is the plain copy
//! used after combat events, called once per direction.
//!
//! The full source payload is captured before the destination is touched and
//! then written in a single pass, so no other subsystem can observe a
//! half-copied unit.

use mirror_types::{ClassId, Importance, Item, MapPosition, ParamKind, ParamVector, Unit, UnitHandle};
use tracing::debug;

use crate::error::MirrorError;
use crate::host::UnitStore;

/// Spawn-time clone options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CloneOptions {
    /// Keep the copied current HP instead of healing to full.
    pub copy_current_hp: bool,
}

/// What a transfer did to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferReport {
    /// Parameter slots whose source value was outside the destination range.
    pub clamped: usize,
    /// Items duplicated into the destination.
    pub items_copied: usize,
    /// Destination was healed to its max HP.
    pub healed: bool,
    /// Destination was moved to the source's tile.
    pub repositioned: bool,
}

/// Snapshot of every field that moves, taken from the source.
#[derive(Debug, Clone)]
struct Payload {
    params: ParamVector,
    hp: i32,
    level: u32,
    exp: u32,
    items: Vec<Item>,
    class: ClassId,
    name: String,
    description: String,
    portrait: Option<String>,
    importance: Importance,
    class_group_1: u32,
    class_group_2: u32,
    class_up_count: u32,
}

impl Payload {
    fn capture(source: &Unit, capacity: usize) -> Self {
        let items = (0..capacity)
            .map_while(|slot| source.items.get(slot))
            .map(Item::duplicate)
            .collect();

        Self {
            params: source.params,
            hp: source.hp,
            level: source.level,
            exp: source.exp,
            items,
            class: source.class,
            name: source.name.clone(),
            description: source.description.clone(),
            portrait: source.portrait.clone(),
            importance: source.importance,
            class_group_1: source.class_group_1,
            class_group_2: source.class_group_2,
            class_up_count: source.class_up_count,
        }
    }
}

/// Extra steps a spawn-time clone performs after the shared copy.
#[derive(Debug, Clone, Copy)]
enum Pass {
    Clone {
        heal: bool,
        reposition: Option<MapPosition>,
    },
    Sync,
}

/// Copy `src` into `dest` at spawn time.
///
/// # Errors
///
/// Returns [`MirrorError::UnitNotFound`] if either handle is not in the store.
pub fn clone_unit(
    store: &mut dyn UnitStore,
    dest: UnitHandle,
    src: UnitHandle,
    options: CloneOptions,
) -> Result<TransferReport, MirrorError> {
    let source = store.unit(src).ok_or(MirrorError::UnitNotFound(src))?;
    // A deployed source that is no longer alive marks where it would have stood.
    let reposition = (source.is_deployed() && !source.is_alive()).then_some(source.position);
    let payload = Payload::capture(source, store.item_capacity());

    let pass = Pass::Clone {
        heal: !options.copy_current_hp,
        reposition,
    };
    let report = write(store, dest, payload, pass)?;
    debug!(%dest, %src, ?report, "cloned unit state");
    Ok(report)
}

/// Copy `src` into `dest` after a state-changing event.
///
/// # Errors
///
/// Returns [`MirrorError::UnitNotFound`] if either handle is not in the store.
pub fn sync_unit(
    store: &mut dyn UnitStore,
    dest: UnitHandle,
    src: UnitHandle,
) -> Result<TransferReport, MirrorError> {
    let source = store.unit(src).ok_or(MirrorError::UnitNotFound(src))?;
    let payload = Payload::capture(source, store.item_capacity());

    let report = write(store, dest, payload, Pass::Sync)?;
    debug!(%dest, %src, ?report, "synced unit state");
    Ok(report)
}

fn write(
    store: &mut dyn UnitStore,
    dest: UnitHandle,
    payload: Payload,
    pass: Pass,
) -> Result<TransferReport, MirrorError> {
    let mut report = TransferReport::default();

    // Clamp against the destination as it stands, before its class changes.
    let target = store.unit(dest).ok_or(MirrorError::UnitNotFound(dest))?;
    let mut params = target.params;
    for kind in ParamKind::MIRRORED {
        let value = payload.params.get(kind);
        let valid = store.valid_value(target, kind, value);
        if valid != value {
            report.clamped = report.clamped.saturating_add(1);
        }
        params.set(kind, valid);
    }

    let unit = store.unit_mut(dest).ok_or(MirrorError::UnitNotFound(dest))?;
    unit.params = params;
    unit.hp = payload.hp.min(unit.max_hp()).max(0);
    unit.level = payload.level;
    unit.exp = payload.exp;

    unit.items.clear_all();
    for (slot, item) in payload.items.into_iter().enumerate() {
        if unit.items.set(slot, item).is_err() {
            break;
        }
        report.items_copied = report.items_copied.saturating_add(1);
    }

    unit.class = payload.class;
    unit.name = payload.name;
    unit.description = payload.description;
    unit.portrait = payload.portrait;
    unit.importance = payload.importance;
    unit.class_group_1 = payload.class_group_1;
    unit.class_group_2 = payload.class_group_2;
    unit.class_up_count = payload.class_up_count;

    if let Pass::Clone { heal, reposition } = pass {
        if heal {
            unit.hp = unit.max_hp();
            report.healed = true;
        }
        if let Some(position) = reposition {
            unit.position = position;
            report.repositioned = true;
        }
    }

    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mirror_types::{
        AliveState, BaseId, Class, Deployment, Faction, ItemKindId, MapPosition, ParamVector,
    };

    use super::*;
    use crate::world::World;

    const HIGH: ClassId = ClassId(1);
    const LOW: ClassId = ClassId(2);

    fn world() -> World {
        let mut world = World::with_capacity(3);
        world.add_class(Class::new(HIGH, "Hero", ParamVector::splat(60).with(ParamKind::MaxHp, 80)));
        world.add_class(Class::new(LOW, "Thief", ParamVector::splat(15).with(ParamKind::MaxHp, 30)));
        world
    }

    fn source() -> Unit {
        let mut unit = Unit::new(BaseId(5), Faction::Player, "Alm", HIGH, 3);
        unit.params = ParamVector::from_array([40, 20, 3, 12, 11, 7, 9, 4, 5, 2, 8]);
        unit.hp = 25;
        unit.level = 3;
        unit.exp = 42;
        unit.description = "A boy from Ram Village.".to_owned();
        unit.portrait = Some("alm.png".to_owned());
        unit.importance = Importance::Leader;
        unit.class_group_1 = 4;
        unit.class_group_2 = 9;
        unit.class_up_count = 1;
        unit.items.set(0, Item::new(ItemKindId(1), "Iron Sword", Some(40))).unwrap();
        unit.items.set(1, Item::new(ItemKindId(2), "Vulnerary", Some(3))).unwrap();
        unit
    }

    fn shadow(class: ClassId) -> Unit {
        let mut unit = Unit::new(BaseId(90), Faction::Enemy, "Shade", class, 3);
        unit.params = ParamVector::splat(1).with(ParamKind::Build, 3);
        unit.position = MapPosition::new(9, 9);
        unit
    }

    #[test]
    fn clone_copies_the_param_tier_and_heals() {
        let mut world = world();
        let src = world.add_unit(source());
        let dest = world.add_unit(shadow(HIGH));

        let report = clone_unit(&mut world, dest, src, CloneOptions::default()).unwrap();
        let copy = world.unit(dest).unwrap();
        let original = world.unit(src).unwrap();

        for kind in ParamKind::MIRRORED {
            assert_eq!(copy.params.get(kind), original.params.get(kind));
        }
        // The reserved slot is left alone.
        assert_eq!(copy.params.get(ParamKind::Build), 3);
        assert_eq!(copy.hp, 40);
        assert!(report.healed);
        assert_eq!(copy.level, 3);
        assert_eq!(copy.exp, 42);
        assert_eq!(copy.class, HIGH);
        assert_eq!(copy.name, "Alm");
        assert_eq!(copy.description, original.description);
        assert_eq!(copy.portrait.as_deref(), Some("alm.png"));
        assert_eq!(copy.importance, Importance::Leader);
        assert_eq!((copy.class_group_1, copy.class_group_2), (4, 9));
        assert_eq!(copy.class_up_count, 1);
        assert_eq!(copy.faction, Faction::Enemy);
        assert_eq!(copy.base_id, BaseId(90));
        assert_eq!(report.clamped, 0);
    }

    #[test]
    fn clone_can_preserve_current_hp() {
        let mut world = world();
        let src = world.add_unit(source());
        let dest = world.add_unit(shadow(HIGH));

        let options = CloneOptions {
            copy_current_hp: true,
        };
        let report = clone_unit(&mut world, dest, src, options).unwrap();
        assert!(!report.healed);
        assert_eq!(world.unit(dest).unwrap().hp, 25);
    }

    #[test]
    fn copied_values_are_clamped_to_destination_caps() {
        let mut world = world();
        let src = world.add_unit(source());
        let dest = world.add_unit(shadow(LOW));

        let report = clone_unit(&mut world, dest, src, CloneOptions::default()).unwrap();
        let copy = world.unit(dest).unwrap();
        let original = world.unit(src).unwrap();

        for kind in ParamKind::MIRRORED {
            let cap = if kind == ParamKind::MaxHp { 30 } else { 15 };
            assert_eq!(copy.params.get(kind), original.params.get(kind).min(cap));
        }
        // max HP 40 -> 30 and strength 20 -> 15
        assert_eq!(report.clamped, 2);
        assert_eq!(copy.hp, 30);
    }

    #[test]
    fn items_are_duplicated_not_aliased() {
        let mut world = world();
        let src = world.add_unit(source());
        let mut stale = shadow(HIGH);
        stale.items.set(2, Item::new(ItemKindId(9), "Old Lance", Some(1))).unwrap();
        let dest = world.add_unit(stale);

        let report = sync_unit(&mut world, dest, src).unwrap();
        let copy = world.unit(dest).unwrap();
        let original = world.unit(src).unwrap();

        assert_eq!(report.items_copied, 2);
        assert_eq!(copy.items.len(), 2);
        for (a, b) in copy.items.iter().zip(original.items.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.uses, b.uses);
            assert_ne!(a.instance, b.instance);
        }
        assert!(copy.items.get(2).is_none());
    }

    #[test]
    fn item_copy_stops_at_first_empty_source_slot() {
        let mut world = world();
        let mut gappy = source();
        gappy.items.clear(0);
        let src = world.add_unit(gappy);
        let dest = world.add_unit(shadow(HIGH));

        let report = sync_unit(&mut world, dest, src).unwrap();
        assert_eq!(report.items_copied, 0);
        assert!(world.unit(dest).unwrap().items.is_empty());
    }

    #[test]
    fn item_copy_truncates_at_destination_capacity() {
        let mut world = world();
        let src = world.add_unit(source());
        let mut small = shadow(HIGH);
        small.items = mirror_types::ItemSlots::with_capacity(1);
        let dest = world.add_unit(small);

        let report = sync_unit(&mut world, dest, src).unwrap();
        assert_eq!(report.items_copied, 1);
        assert_eq!(world.unit(dest).unwrap().items.len(), 1);
    }

    #[test]
    fn clone_moves_to_fallen_deployed_source() {
        let mut world = world();
        let mut fallen = source();
        fallen.deployment = Deployment::Deployed;
        fallen.alive = AliveState::Dead;
        fallen.position = MapPosition::new(3, 4);
        let src = world.add_unit(fallen);
        let dest = world.add_unit(shadow(HIGH));

        let report = clone_unit(&mut world, dest, src, CloneOptions::default()).unwrap();
        assert!(report.repositioned);
        assert_eq!(world.unit(dest).unwrap().position, MapPosition::new(3, 4));
    }

    #[test]
    fn clone_keeps_position_for_living_or_reserve_sources() {
        let mut world = world();
        let mut reserve = source();
        reserve.position = MapPosition::new(1, 1);
        let src = world.add_unit(reserve);
        let dest = world.add_unit(shadow(HIGH));

        let report = clone_unit(&mut world, dest, src, CloneOptions::default()).unwrap();
        assert!(!report.repositioned);
        assert_eq!(world.unit(dest).unwrap().position, MapPosition::new(9, 9));
    }

    #[test]
    fn sync_after_clone_changes_no_parameters() {
        let mut world = world();
        let src = world.add_unit(source());
        let dest = world.add_unit(shadow(HIGH));
        clone_unit(&mut world, dest, src, CloneOptions::default()).unwrap();

        let shadow_before = world.unit(dest).unwrap().params;
        let source_before = world.unit(src).unwrap().params;

        sync_unit(&mut world, dest, src).unwrap();
        sync_unit(&mut world, dest, src).unwrap();
        assert_eq!(world.unit(dest).unwrap().params, shadow_before);

        sync_unit(&mut world, src, dest).unwrap();
        assert_eq!(world.unit(src).unwrap().params, source_before);
    }

    #[test]
    fn sync_carries_hp_without_healing() {
        let mut world = world();
        let src = world.add_unit(source());
        let dest = world.add_unit(shadow(HIGH));

        let report = sync_unit(&mut world, dest, src).unwrap();
        assert!(!report.healed);
        assert_eq!(world.unit(dest).unwrap().hp, 25);
    }

    #[test]
    fn missing_units_are_reported() {
        let mut world = world();
        let src = world.add_unit(source());
        let ghost = UnitHandle::new();

        assert!(matches!(
            sync_unit(&mut world, ghost, src),
            Err(MirrorError::UnitNotFound(h)) if h == ghost
        ));
        assert!(matches!(
            clone_unit(&mut world, src, ghost, CloneOptions::default()),
            Err(MirrorError::UnitNotFound(h)) if h == ghost
        ));
    }
}

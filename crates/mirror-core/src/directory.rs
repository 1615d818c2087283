//! Read-only unit lookup over the host rosters.
//!
//! [`UnitDirectory::find`] walks one roster in iteration order and returns the
//! first unit matching a [`SourceSelector`]. It never mutates the store.
//!
//! Identifier and name matches are only as reliable as the roster is free of
//! collisions. On [`RosterKind::All`] in particular, tags are the only
//! selector guaranteed to find the intended unit. Names are matched against
//! the *current* display name, which an earlier sync may have overwritten.

use mirror_types::{RosterKind, Unit, UnitHandle};

use crate::binding::{SourceSelector, source_tag};
use crate::host::UnitStore;

/// Result of a directory lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The unit that matched.
    Found(UnitHandle),
    /// No selector, or nothing in the roster matched.
    NotFound,
}

/// Borrowing view over a [`UnitStore`] for source lookups.
#[derive(Clone, Copy)]
pub struct UnitDirectory<'a> {
    store: &'a dyn UnitStore,
}

impl<'a> UnitDirectory<'a> {
    /// Wrap a store.
    pub const fn new(store: &'a dyn UnitStore) -> Self {
        Self { store }
    }

    /// Find a unit in `roster` using `selector`.
    pub fn find(&self, roster: RosterKind, selector: Option<&SourceSelector>) -> Lookup {
        let Some(selector) = selector else {
            return Lookup::NotFound;
        };
        match selector {
            SourceSelector::Id(id) => self.first_match(roster, |unit| unit.base_id == *id),
            SourceSelector::Name(name) => self.first_match(roster, |unit| unit.name == *name),
            SourceSelector::Tag(tag) => {
                self.first_match(roster, |unit| source_tag(unit) == Some(tag.as_str()))
            }
            SourceSelector::Index(index) => self
                .store
                .roster_get(roster, *index)
                .map_or(Lookup::NotFound, |unit| Lookup::Found(unit.handle)),
            SourceSelector::StatPredicate(_) => Lookup::NotFound,
        }
    }

    fn first_match(&self, roster: RosterKind, matches: impl Fn(&Unit) -> bool) -> Lookup {
        (0..self.store.roster_len(roster))
            .filter_map(|index| self.store.roster_get(roster, index))
            .find(|unit| matches(*unit))
            .map_or(Lookup::NotFound, |unit| Lookup::Found(unit.handle))
    }
}

impl core::fmt::Debug for UnitDirectory<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("UnitDirectory").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mirror_types::{BaseId, ClassId, Faction};
    use serde_json::json;

    use super::*;
    use crate::world::World;

    fn add(world: &mut World, id: u32, faction: Faction, name: &str) -> UnitHandle {
        world.add_unit(Unit::new(BaseId(id), faction, name, ClassId(1), 5))
    }

    #[test]
    fn finds_every_present_identifier() {
        let mut world = World::with_capacity(5);
        let handles: Vec<UnitHandle> = (1..=4)
            .map(|id| add(&mut world, id, Faction::Player, "Recruit"))
            .collect();
        let directory = UnitDirectory::new(&world);

        for (id, handle) in (1..=4).zip(handles) {
            let selector = SourceSelector::Id(BaseId(id));
            assert_eq!(
                directory.find(RosterKind::Player, Some(&selector)),
                Lookup::Found(handle)
            );
        }
        let absent = SourceSelector::Id(BaseId(99));
        assert_eq!(directory.find(RosterKind::Player, Some(&absent)), Lookup::NotFound);
    }

    #[test]
    fn identifier_match_returns_first_in_roster_order() {
        let mut world = World::with_capacity(5);
        let first = add(&mut world, 5, Faction::Player, "Alm");
        let _second = add(&mut world, 5, Faction::Player, "Alm (event)");
        let directory = UnitDirectory::new(&world);

        let selector = SourceSelector::Id(BaseId(5));
        assert_eq!(directory.find(RosterKind::Player, Some(&selector)), Lookup::Found(first));
    }

    #[test]
    fn roster_scopes_the_search() {
        let mut world = World::with_capacity(5);
        let enemy = add(&mut world, 5, Faction::Enemy, "Brigand");
        let directory = UnitDirectory::new(&world);
        let selector = SourceSelector::Id(BaseId(5));

        assert_eq!(directory.find(RosterKind::Player, Some(&selector)), Lookup::NotFound);
        assert_eq!(directory.find(RosterKind::Enemy, Some(&selector)), Lookup::Found(enemy));
        assert_eq!(directory.find(RosterKind::All, Some(&selector)), Lookup::Found(enemy));
    }

    #[test]
    fn name_match_uses_current_name() {
        let mut world = World::with_capacity(5);
        let alm = add(&mut world, 1, Faction::Player, "Alm");
        let directory = UnitDirectory::new(&world);

        let selector = SourceSelector::Name("Alm".to_owned());
        assert_eq!(directory.find(RosterKind::Player, Some(&selector)), Lookup::Found(alm));

        world.unit_mut(alm).unwrap().name = "Rigel".to_owned();
        let directory = UnitDirectory::new(&world);
        assert_eq!(directory.find(RosterKind::Player, Some(&selector)), Lookup::NotFound);
    }

    #[test]
    fn unique_tag_survives_identifier_collisions() {
        let mut world = World::with_capacity(5);
        let _decoy_a = add(&mut world, 7, Faction::Player, "Twin");
        let _decoy_b = add(&mut world, 7, Faction::Enemy, "Twin");
        let mut tagged = Unit::new(BaseId(7), Faction::Ally, "Twin", ClassId(1), 5);
        tagged.custom = json!({ "source_tag": "true-twin" });
        let owner = world.add_unit(tagged);
        let directory = UnitDirectory::new(&world);

        let selector = SourceSelector::Tag("true-twin".to_owned());
        assert_eq!(directory.find(RosterKind::All, Some(&selector)), Lookup::Found(owner));

        let by_id = SourceSelector::Id(BaseId(7));
        assert_ne!(directory.find(RosterKind::All, Some(&by_id)), Lookup::Found(owner));
    }

    #[test]
    fn index_selects_by_position() {
        let mut world = World::with_capacity(5);
        let _a = add(&mut world, 1, Faction::Player, "Alm");
        let b = add(&mut world, 2, Faction::Player, "Celica");
        let directory = UnitDirectory::new(&world);

        assert_eq!(
            directory.find(RosterKind::Player, Some(&SourceSelector::Index(1))),
            Lookup::Found(b)
        );
        assert_eq!(
            directory.find(RosterKind::Player, Some(&SourceSelector::Index(2))),
            Lookup::NotFound
        );
    }

    #[test]
    fn stat_predicate_and_missing_selector_never_match() {
        let mut world = World::with_capacity(5);
        let _a = add(&mut world, 1, Faction::Player, "Alm");
        let directory = UnitDirectory::new(&world);

        let stat = SourceSelector::StatPredicate("max_hp > 10".to_owned());
        assert_eq!(directory.find(RosterKind::Player, Some(&stat)), Lookup::NotFound);
        assert_eq!(directory.find(RosterKind::Player, None), Lookup::NotFound);
    }
}

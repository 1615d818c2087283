//! Binding resolution: is this unit a shadow, and which unit does it mirror?
//!
//! Resolution runs on every hook call. The resolver holds the parsed lookup
//! rules, never a resolved source, so a source that has left its roster
//! simply stops resolving. It does remember which shadows were cloned at
//! spawn, since only those carry mirrored state worth writing back.

use std::collections::BTreeSet;

use mirror_types::{Unit, UnitHandle};
use tracing::warn;

use crate::binding::{Binding, BindingRegistry};
use crate::directory::{Lookup, UnitDirectory};
use crate::host::UnitStore;

/// Outcome of resolving a shadow's source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The source currently matching the binding.
    Found(UnitHandle),
    /// A selector is configured but nothing matches it.
    NotFound,
    /// No selector is configured (or the unit is not a shadow).
    Unbound,
}

/// Answers shadow and source questions from a [`BindingRegistry`].
#[derive(Debug, Clone, Default)]
pub struct BindingResolver {
    registry: BindingRegistry,
    cloned: BTreeSet<UnitHandle>,
}

impl BindingResolver {
    /// Wrap a loaded registry.
    pub const fn new(registry: BindingRegistry) -> Self {
        Self {
            registry,
            cloned: BTreeSet::new(),
        }
    }

    /// Parse `unit`'s binding if this resolver has not seen it yet.
    pub fn observe(&mut self, unit: &Unit) {
        if !self.registry.is_registered(unit.handle) {
            self.registry.register(unit);
        }
    }

    /// Whether `unit` carries an enabled binding.
    pub fn is_shadow(&self, unit: UnitHandle) -> bool {
        self.registry.binding(unit).is_some()
    }

    /// Record whether `unit`'s latest spawn cloned its source.
    pub fn record_clone(&mut self, unit: UnitHandle, cloned: bool) {
        if cloned {
            self.cloned.insert(unit);
        } else {
            self.cloned.remove(&unit);
        }
    }

    /// Whether `unit` holds state cloned from its source.
    pub fn is_cloned(&self, unit: UnitHandle) -> bool {
        self.cloned.contains(&unit)
    }

    /// The binding of a shadow unit.
    pub fn binding(&self, unit: UnitHandle) -> Option<&Binding> {
        self.registry.binding(unit)
    }

    /// Look up the source `unit` is currently bound to.
    ///
    /// A shadow never resolves to itself; a selector that only matches the
    /// shadow (for example by tag on the `all` roster) reports `NotFound`.
    pub fn resolve_source(&self, store: &dyn UnitStore, unit: UnitHandle) -> Resolution {
        let Some(spec) = self.binding(unit).and_then(|binding| binding.source.as_ref()) else {
            return Resolution::Unbound;
        };
        let Some(selector) = spec.selector.as_ref() else {
            return Resolution::Unbound;
        };

        match UnitDirectory::new(store).find(spec.roster, Some(selector)) {
            Lookup::Found(source) if source == unit => {
                warn!(unit = %unit, ?selector, "binding resolves to the shadow itself");
                Resolution::NotFound
            }
            Lookup::Found(source) => Resolution::Found(source),
            Lookup::NotFound => Resolution::NotFound,
        }
    }
}

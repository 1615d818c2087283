//! Binding configuration: the typed form of a shadow unit's `mirror` blob.
//!
//! Scenario authors attach a `mirror` object to a unit's custom parameters:
//!
//! ```json
//! { "mirror": { "enabled": true, "source": { "roster": "player", "id": 5 } } }
//! ```
//!
//! Source units may carry a collision-safe handle of their own:
//!
//! ```json
//! { "source_tag": "rival" }
//! ```
//!
//! The blob is parsed exactly once per unit into a [`Binding`] and kept in a
//! [`BindingRegistry`]. Per-unit options that are absent fall back to the
//! process-wide [`MirrorDefaults`] at parse time, so a stored binding never
//! needs the defaults again.

use std::collections::{BTreeMap, BTreeSet};

use mirror_types::{BaseId, RosterKind, Unit, UnitHandle};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::MirrorDefaults;
use crate::error::MirrorError;
use crate::host::UnitStore;

/// Blob key holding a shadow's binding.
pub const BINDING_KEY: &str = "mirror";

/// Blob key holding a source unit's tag.
pub const SOURCE_TAG_KEY: &str = "source_tag";

// ---------------------------------------------------------------------------
// Policies and scopes
// ---------------------------------------------------------------------------

/// What happens to a shadow whose source cannot be found at spawn time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingSourcePolicy {
    /// Remove the shadow from play.
    Erase,
    /// Spawn the shadow with its authored data.
    #[default]
    #[serde(rename = "default")]
    KeepAuthored,
}

/// Field tier copied at spawn. Only [`CopyScope::Param`] is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopyScope {
    /// Parameters, level, experience, HP, items, class, and identity text.
    #[default]
    Param,
    /// Reserved.
    State,
    /// Reserved.
    All,
}

/// Field tier synced after combat events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncScope {
    /// Never sync; the shadow keeps only its spawn-time clone.
    None,
    /// Same field set as [`CopyScope::Param`].
    #[default]
    Param,
    /// Reserved.
    State,
    /// Reserved.
    All,
}

// ---------------------------------------------------------------------------
// Selector
// ---------------------------------------------------------------------------

/// How to find the source unit inside its roster.
///
/// When an author fills several fields, the first in declaration order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSelector {
    /// First unit with this base identifier.
    Id(BaseId),
    /// First unit whose current display name matches.
    Name(String),
    /// First unit whose [`SOURCE_TAG_KEY`] matches.
    Tag(String),
    /// Unit at this zero-based roster position.
    Index(usize),
    /// Reserved stat predicate; never matches.
    StatPredicate(String),
}

/// Roster plus selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSpec {
    /// Roster searched.
    pub roster: RosterKind,
    /// Lookup rule, or `None` when the author named no field.
    pub selector: Option<SourceSelector>,
}

/// A shadow unit's parsed binding with defaults already applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Where the source lives. `None` leaves the shadow unbound.
    pub source: Option<SourceSpec>,
    /// Level up with the source's growth table.
    pub growth: bool,
    /// Spawn behaviour when the source is missing.
    pub missing_source: MissingSourcePolicy,
    /// Allow spawning while the source is alive and deployed.
    pub allow_coexist: bool,
    /// Keep copied HP at spawn instead of healing to full.
    pub copy_current_hp: bool,
    /// Effective sync tier.
    pub sync_scope: SyncScope,
}

#[derive(Debug, Deserialize)]
struct RawBinding {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    source: Option<RawSource>,
    #[serde(default)]
    growth: Option<bool>,
    #[serde(default)]
    missing_source: Option<MissingSourcePolicy>,
    #[serde(default)]
    allow_coexist: Option<bool>,
    #[serde(default)]
    copy_current_hp: Option<bool>,
    #[serde(default)]
    copy_scope: Option<CopyScope>,
    #[serde(default)]
    sync_scope: Option<SyncScope>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    roster: RosterKind,
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    stat: Option<String>,
}

impl RawSource {
    /// Populated selectors in precedence order.
    fn selectors(self) -> Vec<SourceSelector> {
        [
            self.id.map(|id| SourceSelector::Id(BaseId(id))),
            self.name.map(SourceSelector::Name),
            self.tag.map(SourceSelector::Tag),
            self.index.map(SourceSelector::Index),
            self.stat.map(SourceSelector::StatPredicate),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

impl Binding {
    /// Parse the binding carried in `unit`'s blob.
    ///
    /// Returns `Ok(None)` when the blob has no `mirror` entry or its
    /// `enabled` flag is not `true`. Reserved options are accepted with a
    /// warning and downgraded to what is implemented.
    ///
    /// # Errors
    ///
    /// Returns [`MirrorError::MalformedBinding`] when the entry has the
    /// wrong shape (for example a non-boolean `enabled`).
    pub fn parse(unit: &Unit, defaults: MirrorDefaults) -> Result<Option<Self>, MirrorError> {
        let Some(entry) = unit.custom.get(BINDING_KEY) else {
            return Ok(None);
        };
        let raw = RawBinding::deserialize(entry).map_err(|source| MirrorError::MalformedBinding {
            unit: unit.handle,
            source,
        })?;
        if !raw.enabled {
            return Ok(None);
        }

        let source = raw.source.map(|raw_source| {
            let roster = raw_source.roster;
            let mut selectors = raw_source.selectors().into_iter();
            let selector = selectors.next();
            let ignored: Vec<SourceSelector> = selectors.collect();
            if !ignored.is_empty() {
                warn!(
                    unit = %unit.handle,
                    chosen = ?selector,
                    ?ignored,
                    "binding names several source selectors; only the first is used"
                );
            }
            if let Some(SourceSelector::StatPredicate(predicate)) = &selector {
                warn!(
                    unit = %unit.handle,
                    predicate,
                    "stat predicate selectors are reserved and never match"
                );
            }
            SourceSpec { roster, selector }
        });

        // Spawn always clones the param tier.
        let copy_scope = raw.copy_scope.unwrap_or_default();
        if copy_scope != CopyScope::Param {
            warn!(unit = %unit.handle, ?copy_scope, "copy scope not implemented; using param");
        }
        let sync_scope = match raw.sync_scope.unwrap_or_default() {
            scope @ (SyncScope::None | SyncScope::Param) => scope,
            reserved => {
                warn!(unit = %unit.handle, ?reserved, "sync scope not implemented; using param");
                SyncScope::Param
            }
        };

        Ok(Some(Self {
            source,
            growth: raw.growth.unwrap_or(defaults.growth),
            missing_source: raw.missing_source.unwrap_or(defaults.missing_source),
            allow_coexist: raw.allow_coexist.unwrap_or(defaults.allow_coexist),
            copy_current_hp: raw.copy_current_hp.unwrap_or(defaults.copy_current_hp),
            sync_scope,
        }))
    }
}

/// The tag a source unit carries in its own blob, if any.
pub fn source_tag(unit: &Unit) -> Option<&str> {
    unit.custom
        .get(SOURCE_TAG_KEY)
        .and_then(serde_json::Value::as_str)
}

// ---------------------------------------------------------------------------
// BindingRegistry
// ---------------------------------------------------------------------------

/// Parsed bindings of every shadow unit, keyed by runtime handle.
///
/// Holds only lookup rules; resolved source handles are never stored.
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    bindings: BTreeMap<UnitHandle, Binding>,
    seen: BTreeSet<UnitHandle>,
    defaults: MirrorDefaults,
}

impl BindingRegistry {
    /// Create an empty registry.
    pub const fn new(defaults: MirrorDefaults) -> Self {
        Self {
            bindings: BTreeMap::new(),
            seen: BTreeSet::new(),
            defaults,
        }
    }

    /// Parse the blob of every unit currently in the store.
    pub fn load(store: &dyn UnitStore, defaults: MirrorDefaults) -> Self {
        let mut registry = Self::new(defaults);
        let count = store.roster_len(RosterKind::All);
        for unit in (0..count).filter_map(|index| store.roster_get(RosterKind::All, index)) {
            registry.register(unit);
        }
        debug!(
            units = registry.seen.len(),
            shadows = registry.bindings.len(),
            "binding registry loaded"
        );
        registry
    }

    /// Parse `unit`'s blob unless it has been seen before.
    ///
    /// Malformed bindings are logged and leave the unit unmirrored.
    pub fn register(&mut self, unit: &Unit) -> Option<&Binding> {
        if self.seen.insert(unit.handle) {
            match Binding::parse(unit, self.defaults) {
                Ok(Some(binding)) => {
                    self.bindings.insert(unit.handle, binding);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(unit = %unit.handle, name = unit.name, %error, "ignoring binding");
                }
            }
        }
        self.bindings.get(&unit.handle)
    }

    /// Whether `handle` has been through [`register`](Self::register).
    pub fn is_registered(&self, handle: UnitHandle) -> bool {
        self.seen.contains(&handle)
    }

    /// Binding of an enabled shadow.
    pub fn binding(&self, handle: UnitHandle) -> Option<&Binding> {
        self.bindings.get(&handle)
    }

    /// Number of enabled shadows.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no shadow is registered.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

//! Growth delegation for shadow units.
//!
//! A growth-enabled shadow accumulates experience with the host's normal
//! rule, but the table applied on a level-up comes from its source:
//!
//! - a player source rolls its roster-standard growth (personal rates plus
//!   class rates),
//! - any other source uses its class's per-level table at the source's level.
//!
//! When the source cannot be resolved, the shadow's own default table is used
//! instead.
//!
//! The flow is linear: experience, then at most one growth application.
//! [`GrowthOutcome`] tells the pipeline whether its default path still has to
//! run.

use mirror_types::{Class, Faction, GrowthTable, ParamVector, Unit, UnitHandle};
use tracing::{debug, warn};

use crate::error::MirrorError;
use crate::host::{AttackExperience, GrowthRules, UnitStore, VirtualCombatant};
use crate::resolver::{BindingResolver, Resolution};

/// Result of an intercepted experience or growth step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthOutcome {
    /// Not intercepted; the host runs its default path.
    Passthrough,
    /// Experience was added but no level was gained.
    NoLevelUp,
    /// A level was gained; the caller applies this table.
    Obtained(GrowthTable),
    /// A level was gained and this table has already been applied.
    Applied(GrowthTable),
}

impl GrowthOutcome {
    /// Whether the host's default path must be skipped.
    pub const fn is_handled(&self) -> bool {
        !matches!(self, Self::Passthrough)
    }

    /// The table gained, if any.
    pub const fn table(&self) -> Option<GrowthTable> {
        match self {
            Self::Obtained(table) | Self::Applied(table) => Some(*table),
            Self::Passthrough | Self::NoLevelUp => None,
        }
    }
}

/// Virtual-combat experience granted to one shadow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceAward {
    /// The shadow that gained experience.
    pub unit: UnitHandle,
    /// Experience amount from the host's calculator.
    pub amount: u32,
    /// What the growth step did with it.
    pub outcome: GrowthOutcome,
}

/// The table the host would normally hand `unit` on a level-up.
pub fn standard_growth_table(
    rules: &mut dyn GrowthRules,
    unit: &Unit,
    class: Option<&Class>,
) -> GrowthTable {
    if unit.faction == Faction::Player {
        rules.roster_growth(unit, class)
    } else {
        class.map_or_else(GrowthTable::zero, |class| rules.class_growth(class, unit.level))
    }
}

fn source_growth_table(
    resolver: &BindingResolver,
    store: &dyn UnitStore,
    rules: &mut dyn GrowthRules,
    shadow: UnitHandle,
) -> Result<GrowthTable, MirrorError> {
    let owner = match resolver.resolve_source(store, shadow) {
        Resolution::Found(source) if resolver.is_cloned(shadow) => source,
        Resolution::Found(_) => {
            debug!(unit = %shadow, "shadow kept authored data; using own table");
            shadow
        }
        unresolved => {
            warn!(unit = %shadow, ?unresolved, "growth source unavailable; using own table");
            shadow
        }
    };
    let unit = store.unit(owner).ok_or(MirrorError::UnitNotFound(owner))?;
    Ok(standard_growth_table(rules, unit, store.class(unit.class)))
}

fn growth_enabled(resolver: &BindingResolver, unit: UnitHandle) -> bool {
    resolver.binding(unit).is_some_and(|binding| binding.growth)
}

/// Add experience to a shadow and pick the table for any level gained.
///
/// Units that are not growth-enabled shadows pass through untouched.
pub fn obtain_experience(
    resolver: &BindingResolver,
    store: &mut dyn UnitStore,
    rules: &mut dyn GrowthRules,
    unit: UnitHandle,
    amount: u32,
) -> Result<GrowthOutcome, MirrorError> {
    if !growth_enabled(resolver, unit) {
        return Ok(GrowthOutcome::Passthrough);
    }

    let shadow = store.unit_mut(unit).ok_or(MirrorError::UnitNotFound(unit))?;
    if !rules.add_experience(shadow, amount) {
        debug!(unit = %unit, amount, exp = shadow.exp, "shadow gained experience");
        return Ok(GrowthOutcome::NoLevelUp);
    }
    let level = shadow.level;

    let table = source_growth_table(resolver, store, rules, unit)?;
    debug!(unit = %unit, amount, level, gains = ?table.gains, "shadow levelled up");
    Ok(GrowthOutcome::Obtained(table))
}

/// Add experience to a shadow and apply at most one growth table.
///
/// The returned outcome is handled for every growth-enabled shadow, so the
/// host's own growth step never runs a second time for the same event.
pub fn direct_growth(
    resolver: &BindingResolver,
    store: &mut dyn UnitStore,
    rules: &mut dyn GrowthRules,
    unit: UnitHandle,
    amount: u32,
) -> Result<GrowthOutcome, MirrorError> {
    match obtain_experience(resolver, store, rules, unit, amount)? {
        GrowthOutcome::Obtained(table) => {
            apply_growth(store, &*rules, unit, &table)?;
            Ok(GrowthOutcome::Applied(table))
        }
        other => Ok(other),
    }
}

/// Apply `table` to `unit`, capped by its class.
pub fn apply_growth(
    store: &mut dyn UnitStore,
    rules: &dyn GrowthRules,
    unit: UnitHandle,
    table: &GrowthTable,
) -> Result<(), MirrorError> {
    let class = store.unit(unit).ok_or(MirrorError::UnitNotFound(unit))?.class;
    let caps = store
        .class(class)
        .map_or_else(|| ParamVector::splat(i32::MAX), |class| class.caps);
    let target = store.unit_mut(unit).ok_or(MirrorError::UnitNotFound(unit))?;
    rules.apply_growth(target, table, &caps);
    Ok(())
}

/// Grant virtual-combat experience to the shadow combatants that earned it.
///
/// A combatant qualifies when it is a growth-enabled shadow, is not on the
/// player roster, and survived the exchange. Both sides are checked.
pub fn award_virtual_experience(
    resolver: &BindingResolver,
    store: &mut dyn UnitStore,
    rules: &mut dyn GrowthRules,
    active: &VirtualCombatant,
    passive: &VirtualCombatant,
) -> Result<Vec<ExperienceAward>, MirrorError> {
    let mut awards = Vec::new();

    for (me, them) in [(active, passive), (passive, active)] {
        if !me.survived() || !growth_enabled(resolver, me.unit) {
            continue;
        }
        let unit = store.unit(me.unit).ok_or(MirrorError::UnitNotFound(me.unit))?;
        if unit.faction == Faction::Player {
            continue;
        }
        let opponent = store.unit(them.unit).ok_or(MirrorError::UnitNotFound(them.unit))?;

        let amount = rules.experience_for(&AttackExperience {
            active: unit,
            active_hp: me.hp,
            active_damage: me.damage_dealt,
            passive: opponent,
            passive_hp: them.hp,
            passive_damage: them.damage_dealt,
        });
        let outcome = direct_growth(resolver, store, rules, me.unit, amount)?;
        awards.push(ExperienceAward {
            unit: me.unit,
            amount,
            outcome,
        });
    }

    Ok(awards)
}

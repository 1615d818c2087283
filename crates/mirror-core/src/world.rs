//! In-memory reference host: rosters and experience rules.
//!
//! [`World`] holds every unit and class and exposes the player, ally, and
//! enemy rosters through [`UnitStore`]. [`StandardGrowth`] implements the
//! usual tactics-game experience rules through [`GrowthRules`]:
//!
//! - Experience accumulates to [`HostConfig::exp_per_level`]; crossing it
//!   grants exactly one level, and the remainder carries over.
//! - Player units roll percentage growth: each slot gains `rate / 100`
//!   guaranteed points plus one more with probability `rate % 100`.
//! - Computer units use their class's fixed prototype table.
//!
//! A real host plugs its own rosters and rules in through the same traits.

use std::collections::BTreeMap;

use mirror_types::{
    Class, ClassId, Faction, GrowthTable, Importance, ParamKind, ParamVector, RosterKind, Unit,
    UnitHandle,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::HostConfig;
use crate::host::{AttackExperience, GrowthRules, UnitStore};

// ---------------------------------------------------------------------------
// Experience constants
// ---------------------------------------------------------------------------

/// Experience for an exchange that dealt no damage.
const EXP_NO_DAMAGE: i64 = 1;

/// Base experience for damaging an opponent.
const EXP_HIT_BASE: i64 = 10;

/// Per-level-difference bonus for damaging an opponent.
const EXP_HIT_PER_LEVEL: i64 = 2;

/// Base experience for defeating an opponent.
const EXP_KILL_BASE: i64 = 30;

/// Per-level-difference bonus for defeating an opponent.
const EXP_KILL_PER_LEVEL: i64 = 3;

/// Extra experience for defeating a leader.
const EXP_LEADER_BONUS: i64 = 20;

/// Most experience a single exchange can award.
const EXP_MAX: i64 = 100;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Every unit and class of a running scenario.
#[derive(Debug, Clone, Default)]
pub struct World {
    units: BTreeMap<UnitHandle, Unit>,
    player: Vec<UnitHandle>,
    ally: Vec<UnitHandle>,
    enemy: Vec<UnitHandle>,
    classes: BTreeMap<ClassId, Class>,
    item_capacity: usize,
}

impl World {
    /// Create an empty world from host settings.
    pub fn new(config: &HostConfig) -> Self {
        Self::with_capacity(config.item_capacity)
    }

    /// Create an empty world whose units carry `item_capacity` slots.
    pub fn with_capacity(item_capacity: usize) -> Self {
        Self {
            item_capacity,
            ..Self::default()
        }
    }

    /// Register a class definition, replacing any with the same id.
    pub fn add_class(&mut self, class: Class) {
        self.classes.insert(class.id, class);
    }

    /// Append `unit` to the roster of its faction.
    pub fn add_unit(&mut self, unit: Unit) -> UnitHandle {
        let handle = unit.handle;
        match unit.faction {
            Faction::Player => self.player.push(handle),
            Faction::Ally => self.ally.push(handle),
            Faction::Enemy => self.enemy.push(handle),
        }
        self.units.insert(handle, unit);
        handle
    }

    /// Take a unit out of its roster entirely.
    pub fn remove_unit(&mut self, handle: UnitHandle) -> Option<Unit> {
        let unit = self.units.remove(&handle)?;
        self.player.retain(|&h| h != handle);
        self.ally.retain(|&h| h != handle);
        self.enemy.retain(|&h| h != handle);
        Some(unit)
    }

    /// Handles in `roster` in iteration order.
    pub fn roster_handles(&self, roster: RosterKind) -> Vec<UnitHandle> {
        self.roster_iter(roster).collect()
    }

    fn roster_iter(&self, roster: RosterKind) -> Box<dyn Iterator<Item = UnitHandle> + '_> {
        match roster {
            RosterKind::Player => Box::new(self.player.iter().copied()),
            RosterKind::Ally => Box::new(self.ally.iter().copied()),
            RosterKind::Enemy => Box::new(self.enemy.iter().copied()),
            RosterKind::All => Box::new(
                self.player
                    .iter()
                    .chain(self.ally.iter())
                    .chain(self.enemy.iter())
                    .copied(),
            ),
        }
    }
}

impl UnitStore for World {
    fn roster_len(&self, roster: RosterKind) -> usize {
        match roster {
            RosterKind::Player => self.player.len(),
            RosterKind::Ally => self.ally.len(),
            RosterKind::Enemy => self.enemy.len(),
            RosterKind::All => self
                .player
                .len()
                .saturating_add(self.ally.len())
                .saturating_add(self.enemy.len()),
        }
    }

    fn roster_get(&self, roster: RosterKind, index: usize) -> Option<&Unit> {
        let handle = self.roster_iter(roster).nth(index)?;
        self.units.get(&handle)
    }

    fn unit(&self, handle: UnitHandle) -> Option<&Unit> {
        self.units.get(&handle)
    }

    fn unit_mut(&mut self, handle: UnitHandle) -> Option<&mut Unit> {
        self.units.get_mut(&handle)
    }

    fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.get(&id)
    }

    fn item_capacity(&self) -> usize {
        self.item_capacity
    }
}

// ---------------------------------------------------------------------------
// StandardGrowth
// ---------------------------------------------------------------------------

/// Reference experience and growth rules.
#[derive(Debug, Clone)]
pub struct StandardGrowth {
    exp_per_level: u32,
    max_level: u32,
    rng: StdRng,
}

impl StandardGrowth {
    /// Create rules from host settings.
    pub fn new(config: &HostConfig) -> Self {
        Self {
            exp_per_level: config.exp_per_level.max(1),
            max_level: config.max_level,
            rng: StdRng::seed_from_u64(config.growth_seed),
        }
    }

    /// Roll one slot of a percentage growth rate.
    fn roll(&mut self, rate: i32) -> i32 {
        let rate = rate.max(0);
        let guaranteed = rate / 100;
        let chance = rate % 100;
        if chance > 0 && self.rng.random_range(0..100) < chance {
            guaranteed.saturating_add(1)
        } else {
            guaranteed
        }
    }
}

impl Default for StandardGrowth {
    fn default() -> Self {
        Self::new(&HostConfig::default())
    }
}

impl GrowthRules for StandardGrowth {
    fn add_experience(&mut self, unit: &mut Unit, amount: u32) -> bool {
        if amount == 0 || unit.level >= self.max_level {
            return false;
        }

        let total = unit.exp.saturating_add(amount);
        if total < self.exp_per_level {
            unit.exp = total;
            return false;
        }

        unit.level = unit.level.saturating_add(1);
        unit.exp = if unit.level >= self.max_level {
            0
        } else {
            // One level per event; the carry never reaches a second threshold.
            total
                .saturating_sub(self.exp_per_level)
                .min(self.exp_per_level.saturating_sub(1))
        };
        true
    }

    fn roster_growth(&mut self, unit: &Unit, class: Option<&Class>) -> GrowthTable {
        let class_rates = class.map_or_else(ParamVector::zero, |c| c.growth_rates);
        let mut gains = ParamVector::zero();
        for kind in ParamKind::ALL {
            let rate = unit.growth_rates.get(kind).saturating_add(class_rates.get(kind));
            gains.set(kind, self.roll(rate));
        }
        GrowthTable::new(gains)
    }

    fn class_growth(&self, class: &Class, level: u32) -> GrowthTable {
        class.prototype_growth_at(level)
    }

    fn apply_growth(&self, unit: &mut Unit, table: &GrowthTable, caps: &ParamVector) {
        let old_max_hp = unit.max_hp();
        for kind in ParamKind::ALL {
            let grown = unit.params.get(kind).saturating_add(table.gains.get(kind));
            unit.params.set(kind, grown.min(caps.get(kind)).max(kind.floor()));
        }
        let hp_gain = unit.max_hp().saturating_sub(old_max_hp).max(0);
        unit.hp = unit.hp.saturating_add(hp_gain).min(unit.max_hp());
    }

    fn experience_for(&self, attack: &AttackExperience<'_>) -> u32 {
        let level_diff =
            i64::from(attack.passive.level).saturating_sub(i64::from(attack.active.level));

        let raw = if attack.passive_hp <= 0 {
            let leader = if attack.passive.importance == Importance::Leader {
                EXP_LEADER_BONUS
            } else {
                0
            };
            EXP_KILL_BASE
                .saturating_add(EXP_KILL_PER_LEVEL.saturating_mul(level_diff))
                .saturating_add(leader)
        } else if attack.active_damage > 0 {
            EXP_HIT_BASE.saturating_add(EXP_HIT_PER_LEVEL.saturating_mul(level_diff))
        } else {
            EXP_NO_DAMAGE
        };

        u32::try_from(raw.clamp(EXP_NO_DAMAGE, EXP_MAX)).unwrap_or(1)
    }
}

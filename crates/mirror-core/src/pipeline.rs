//! Combat pipeline hook points and the reference pipeline driver.
//!
//! [`PipelineHooks`] is the extension seam. Every method has a pass-through
//! default, so an implementation only overrides the steps it cares about.
//! Hooks are registered on a [`CombatPipeline`] once at initialization and
//! run in registration order.
//!
//! | step | hooks run |
//! |---|---|
//! | [`spawn`](CombatPipeline::spawn) | `before_spawn`, then default |
//! | [`calculate_experience`](CombatPipeline::calculate_experience) | `before_experience`, then default |
//! | [`obtain_experience`](CombatPipeline::obtain_experience) | first handled outcome replaces default |
//! | [`direct_growth`](CombatPipeline::direct_growth) | first handled outcome replaces default |
//! | [`end_virtual_attack`](CombatPipeline::end_virtual_attack) | default, then `after_virtual_attack` |
//! | [`decrease_item_uses`](CombatPipeline::decrease_item_uses) | default, then `after_durability_decrease` |

use mirror_types::{AliveState, Deployment, Faction, UnitHandle};
use tracing::debug;

use crate::error::MirrorError;
use crate::growth::{self, ExperienceAward, GrowthOutcome, standard_growth_table};
use crate::host::{AttackExperience, GrowthRules, UnitStore, VirtualCombatant};

/// Host access handed to every hook call.
pub struct HookContext<'a> {
    /// Units, rosters, and classes.
    pub store: &'a mut dyn UnitStore,
    /// Experience and growth rules.
    pub rules: &'a mut dyn GrowthRules,
}

impl core::fmt::Debug for HookContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HookContext").finish_non_exhaustive()
    }
}

/// Integration points a combat pipeline exposes to extensions.
pub trait PipelineHooks {
    /// Runs before the default spawn step of `unit`.
    fn before_spawn(&mut self, _ctx: &mut HookContext<'_>, _unit: UnitHandle) {}

    /// Runs before the default experience calculation of a virtual attack.
    fn before_experience(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _active: &VirtualCombatant,
        _passive: &VirtualCombatant,
    ) {
    }

    /// May replace the default experience step. Return
    /// [`GrowthOutcome::Passthrough`] to leave it to the host.
    fn obtain_experience(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _unit: UnitHandle,
        _amount: u32,
    ) -> GrowthOutcome {
        GrowthOutcome::Passthrough
    }

    /// May replace the default experience-and-growth step. Return
    /// [`GrowthOutcome::Passthrough`] to leave it to the host.
    fn direct_growth(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _unit: UnitHandle,
        _amount: u32,
    ) -> GrowthOutcome {
        GrowthOutcome::Passthrough
    }

    /// Runs after the default end of a virtual attack.
    fn after_virtual_attack(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _active: &VirtualCombatant,
        _passive: &VirtualCombatant,
    ) {
    }

    /// Runs after the default durability decrease of `unit`'s item in `slot`.
    fn after_durability_decrease(
        &mut self,
        _ctx: &mut HookContext<'_>,
        _unit: UnitHandle,
        _slot: usize,
    ) {
    }
}

/// Result of the spawn step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnOutcome {
    /// The unit was placed on the map.
    Deployed,
    /// The unit was erased before spawning and stays off the map.
    Skipped,
}

/// Result of one durability decrease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemWear {
    /// The slot was empty.
    NoItem,
    /// The item has no durability.
    Unbreakable,
    /// Uses left after the decrease.
    Remaining(u32),
    /// The item ran out of uses and was removed.
    Broken,
}

/// Minimal combat pipeline driving a [`UnitStore`] and [`GrowthRules`].
pub struct CombatPipeline<S, G> {
    store: S,
    rules: G,
    hooks: Vec<Box<dyn PipelineHooks>>,
    experience_enabled: bool,
}

impl<S, G> core::fmt::Debug for CombatPipeline<S, G> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CombatPipeline")
            .field("hooks", &self.hooks.len())
            .field("experience_enabled", &self.experience_enabled)
            .finish_non_exhaustive()
    }
}

impl<S: UnitStore, G: GrowthRules> CombatPipeline<S, G> {
    /// Create a pipeline with no hooks and experience enabled.
    pub const fn new(store: S, rules: G) -> Self {
        Self {
            store,
            rules,
            hooks: Vec::new(),
            experience_enabled: true,
        }
    }

    /// Register an extension. Hooks run in registration order.
    pub fn register(&mut self, hooks: impl PipelineHooks + 'static) {
        self.hooks.push(Box::new(hooks));
    }

    /// Turn experience gain on or off for subsequent combats.
    pub const fn set_experience_enabled(&mut self, enabled: bool) {
        self.experience_enabled = enabled;
    }

    /// The unit store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the unit store.
    pub const fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Spawn `unit` onto the map.
    pub fn spawn(&mut self, unit: UnitHandle) -> Result<SpawnOutcome, MirrorError> {
        let mut ctx = HookContext {
            store: &mut self.store,
            rules: &mut self.rules,
        };
        for hooks in &mut self.hooks {
            hooks.before_spawn(&mut ctx, unit);
        }

        let target = self.store.unit_mut(unit).ok_or(MirrorError::UnitNotFound(unit))?;
        if target.alive == AliveState::Erased {
            debug!(unit = %unit, name = target.name, "spawn skipped for erased unit");
            return Ok(SpawnOutcome::Skipped);
        }
        target.deployment = Deployment::Deployed;
        debug!(unit = %unit, name = target.name, level = target.level, "unit spawned");
        Ok(SpawnOutcome::Deployed)
    }

    /// Experience step of a virtual attack.
    ///
    /// Does nothing while experience is disabled. Otherwise the hooks run
    /// first, then the surviving player combatant gains experience.
    pub fn calculate_experience(
        &mut self,
        active: &VirtualCombatant,
        passive: &VirtualCombatant,
    ) -> Result<Option<ExperienceAward>, MirrorError> {
        if !self.experience_enabled {
            return Ok(None);
        }

        let mut ctx = HookContext {
            store: &mut self.store,
            rules: &mut self.rules,
        };
        for hooks in &mut self.hooks {
            hooks.before_experience(&mut ctx, active, passive);
        }

        for (me, them) in [(active, passive), (passive, active)] {
            let unit = self.store.unit(me.unit).ok_or(MirrorError::UnitNotFound(me.unit))?;
            if unit.faction != Faction::Player || !me.survived() {
                continue;
            }
            let opponent = self
                .store
                .unit(them.unit)
                .ok_or(MirrorError::UnitNotFound(them.unit))?;
            let amount = self.rules.experience_for(&AttackExperience {
                active: unit,
                active_hp: me.hp,
                active_damage: me.damage_dealt,
                passive: opponent,
                passive_hp: them.hp,
                passive_damage: them.damage_dealt,
            });
            let outcome = self.direct_growth(me.unit, amount)?;
            return Ok(Some(ExperienceAward {
                unit: me.unit,
                amount,
                outcome,
            }));
        }
        Ok(None)
    }

    /// Add experience to `unit` and report the growth table of any level
    /// gained, without applying it.
    pub fn obtain_experience(
        &mut self,
        unit: UnitHandle,
        amount: u32,
    ) -> Result<GrowthOutcome, MirrorError> {
        let mut ctx = HookContext {
            store: &mut self.store,
            rules: &mut self.rules,
        };
        for hooks in &mut self.hooks {
            let outcome = hooks.obtain_experience(&mut ctx, unit, amount);
            if outcome.is_handled() {
                return Ok(outcome);
            }
        }

        let target = self.store.unit_mut(unit).ok_or(MirrorError::UnitNotFound(unit))?;
        if !self.rules.add_experience(target, amount) {
            return Ok(GrowthOutcome::NoLevelUp);
        }
        let target = self.store.unit(unit).ok_or(MirrorError::UnitNotFound(unit))?;
        let class = self.store.class(target.class);
        Ok(GrowthOutcome::Obtained(standard_growth_table(
            &mut self.rules,
            target,
            class,
        )))
    }

    /// Add experience to `unit` and apply the growth of any level gained.
    pub fn direct_growth(
        &mut self,
        unit: UnitHandle,
        amount: u32,
    ) -> Result<GrowthOutcome, MirrorError> {
        let mut ctx = HookContext {
            store: &mut self.store,
            rules: &mut self.rules,
        };
        for hooks in &mut self.hooks {
            let outcome = hooks.direct_growth(&mut ctx, unit, amount);
            if outcome.is_handled() {
                return Ok(outcome);
            }
        }

        match self.obtain_experience(unit, amount)? {
            GrowthOutcome::Obtained(table) => {
                growth::apply_growth(&mut self.store, &self.rules, unit, &table)?;
                Ok(GrowthOutcome::Applied(table))
            }
            other => Ok(other),
        }
    }

    /// Close a virtual attack.
    ///
    /// Writes the simulated HP back, marks defeated units dead, runs the
    /// experience step, then the hooks.
    pub fn end_virtual_attack(
        &mut self,
        active: &VirtualCombatant,
        passive: &VirtualCombatant,
    ) -> Result<Option<ExperienceAward>, MirrorError> {
        for combatant in [active, passive] {
            let unit = self
                .store
                .unit_mut(combatant.unit)
                .ok_or(MirrorError::UnitNotFound(combatant.unit))?;
            unit.hp = combatant.hp.clamp(0, unit.max_hp());
            if !combatant.survived() {
                unit.alive = AliveState::Dead;
                debug!(unit = %combatant.unit, name = unit.name, "unit defeated");
            }
        }

        let award = self.calculate_experience(active, passive)?;

        let mut ctx = HookContext {
            store: &mut self.store,
            rules: &mut self.rules,
        };
        for hooks in &mut self.hooks {
            hooks.after_virtual_attack(&mut ctx, active, passive);
        }
        Ok(award)
    }

    /// Consume one use of the item in `slot`, removing it when it breaks.
    pub fn decrease_item_uses(
        &mut self,
        unit: UnitHandle,
        slot: usize,
    ) -> Result<ItemWear, MirrorError> {
        let target = self.store.unit_mut(unit).ok_or(MirrorError::UnitNotFound(unit))?;
        let wear = match target.items.get_mut(slot) {
            None => ItemWear::NoItem,
            Some(item) => match item.uses {
                None => ItemWear::Unbreakable,
                Some(uses) => {
                    let left = uses.saturating_sub(1);
                    item.uses = Some(left);
                    if left == 0 {
                        target.items.clear(slot);
                        ItemWear::Broken
                    } else {
                        ItemWear::Remaining(left)
                    }
                }
            },
        };
        debug!(unit = %unit, slot, ?wear, "item durability decreased");

        let mut ctx = HookContext {
            store: &mut self.store,
            rules: &mut self.rules,
        };
        for hooks in &mut self.hooks {
            hooks.after_durability_decrease(&mut ctx, unit, slot);
        }
        Ok(wear)
    }
}

//! The mirroring extension for the combat pipeline.
//!
//! [`MirrorHooks`] implements [`PipelineHooks`] on top of the resolver,
//! transfer, and growth modules:
//!
//! - `before_spawn` clones the source into the shadow, or erases the shadow
//!   when its source is missing (under the `erase` policy) or already on the
//!   field (when coexistence is off),
//! - `before_experience`, `obtain_experience`, and `direct_growth` delegate
//!   to [`growth`](crate::growth),
//! - `after_virtual_attack` and `after_durability_decrease` sync each shadow
//!   back into its source.
//!
//! Errors never escape a hook. They are logged at `warn` and the pipeline
//! step continues with its default behaviour.

use mirror_types::{AliveState, UnitHandle};
use tracing::{debug, info, warn};

use crate::binding::{BindingRegistry, MissingSourcePolicy, SyncScope};
use crate::config::MirrorConfig;
use crate::error::MirrorError;
use crate::growth::{self, GrowthOutcome};
use crate::host::{UnitStore, VirtualCombatant};
use crate::pipeline::{HookContext, PipelineHooks};
use crate::resolver::{BindingResolver, Resolution};
use crate::transfer::{self, CloneOptions, TransferReport};

/// Why a shadow was erased at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseReason {
    /// The source could not be found and the policy is `erase`.
    SourceMissing,
    /// The source is alive and deployed and coexistence is off.
    SourceOnField,
}

/// What the spawn hook did with a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnDecision {
    /// The unit has no enabled binding.
    NotShadow,
    /// The source state was cloned into the shadow.
    Cloned(TransferReport),
    /// The shadow keeps its authored data.
    KeptAuthored,
    /// The shadow was marked erased and will not spawn.
    Erased(EraseReason),
}

fn erase(
    store: &mut dyn UnitStore,
    unit: UnitHandle,
    reason: EraseReason,
) -> Result<SpawnDecision, MirrorError> {
    let shadow = store.unit_mut(unit).ok_or(MirrorError::UnitNotFound(unit))?;
    shadow.alive = AliveState::Erased;
    info!(unit = %unit, name = shadow.name, ?reason, "shadow erased before spawn");
    Ok(SpawnDecision::Erased(reason))
}

/// Decide and perform the spawn-time treatment of `unit`.
///
/// Only a `Cloned` decision marks the shadow for later syncs.
pub fn prepare_spawn(
    resolver: &mut BindingResolver,
    store: &mut dyn UnitStore,
    unit: UnitHandle,
) -> Result<SpawnDecision, MirrorError> {
    let decision = spawn_decision(resolver, store, unit)?;
    resolver.record_clone(unit, matches!(decision, SpawnDecision::Cloned(_)));
    Ok(decision)
}

fn spawn_decision(
    resolver: &BindingResolver,
    store: &mut dyn UnitStore,
    unit: UnitHandle,
) -> Result<SpawnDecision, MirrorError> {
    let Some(binding) = resolver.binding(unit) else {
        return Ok(SpawnDecision::NotShadow);
    };

    match resolver.resolve_source(store, unit) {
        Resolution::Found(source) => {
            let original = store.unit(source).ok_or(MirrorError::UnitNotFound(source))?;
            if !binding.allow_coexist && original.is_alive() && original.is_deployed() {
                return erase(store, unit, EraseReason::SourceOnField);
            }
            let options = CloneOptions {
                copy_current_hp: binding.copy_current_hp,
            };
            let report = transfer::clone_unit(store, unit, source, options)?;
            info!(unit = %unit, %source, ?report, "shadow cloned from source");
            Ok(SpawnDecision::Cloned(report))
        }
        Resolution::NotFound => match binding.missing_source {
            MissingSourcePolicy::Erase => erase(store, unit, EraseReason::SourceMissing),
            MissingSourcePolicy::KeepAuthored => {
                info!(unit = %unit, "shadow source not found; keeping authored data");
                Ok(SpawnDecision::KeptAuthored)
            }
        },
        Resolution::Unbound => {
            warn!(unit = %unit, "shadow has no source selector; keeping authored data");
            Ok(SpawnDecision::KeptAuthored)
        }
    }
}

/// Copy a shadow's state back into its source.
///
/// Returns `None` when `unit` is not a shadow, its sync scope is `none`, it
/// was never cloned from its source, or the source no longer resolves.
pub fn sync_to_source(
    resolver: &BindingResolver,
    store: &mut dyn UnitStore,
    unit: UnitHandle,
) -> Result<Option<TransferReport>, MirrorError> {
    let Some(binding) = resolver.binding(unit) else {
        return Ok(None);
    };
    if binding.sync_scope == SyncScope::None {
        return Ok(None);
    }
    if !resolver.is_cloned(unit) {
        debug!(unit = %unit, "sync skipped; shadow keeps authored data");
        return Ok(None);
    }

    match resolver.resolve_source(store, unit) {
        Resolution::Found(source) => transfer::sync_unit(store, source, unit).map(Some),
        unresolved => {
            debug!(unit = %unit, ?unresolved, "sync skipped; source not resolved");
            Ok(None)
        }
    }
}

/// Pipeline extension that keeps shadows mirrored to their sources.
#[derive(Debug, Clone, Default)]
pub struct MirrorHooks {
    resolver: BindingResolver,
}

impl MirrorHooks {
    /// Parse the bindings of every unit currently in `store`.
    pub fn new(config: &MirrorConfig, store: &dyn UnitStore) -> Self {
        let registry = BindingRegistry::load(store, config.defaults);
        info!(shadows = registry.len(), "mirror hooks initialized");
        Self {
            resolver: BindingResolver::new(registry),
        }
    }

    /// The binding resolver.
    pub const fn resolver(&self) -> &BindingResolver {
        &self.resolver
    }

    /// Register units that joined the store after initialization.
    fn observe(&mut self, store: &dyn UnitStore, unit: UnitHandle) {
        if let Some(unit) = store.unit(unit) {
            self.resolver.observe(unit);
        }
    }

    fn sync(&self, store: &mut dyn UnitStore, unit: UnitHandle, event: &'static str) {
        match sync_to_source(&self.resolver, store, unit) {
            Ok(Some(report)) => debug!(unit = %unit, event, ?report, "shadow synced to source"),
            Ok(None) => {}
            Err(error) => warn!(unit = %unit, event, %error, "shadow sync failed"),
        }
    }

    fn growth_step(
        &mut self,
        ctx: &mut HookContext<'_>,
        unit: UnitHandle,
        amount: u32,
        apply: bool,
    ) -> GrowthOutcome {
        self.observe(ctx.store, unit);
        let result = if apply {
            growth::direct_growth(&self.resolver, ctx.store, ctx.rules, unit, amount)
        } else {
            growth::obtain_experience(&self.resolver, ctx.store, ctx.rules, unit, amount)
        };
        result.unwrap_or_else(|error| {
            warn!(unit = %unit, amount, %error, "shadow growth failed; using default path");
            GrowthOutcome::Passthrough
        })
    }
}

impl PipelineHooks for MirrorHooks {
    fn before_spawn(&mut self, ctx: &mut HookContext<'_>, unit: UnitHandle) {
        self.observe(ctx.store, unit);
        match prepare_spawn(&mut self.resolver, ctx.store, unit) {
            Ok(decision) => debug!(unit = %unit, ?decision, "spawn hook finished"),
            Err(error) => warn!(unit = %unit, %error, "spawn hook failed"),
        }
    }

    fn before_experience(
        &mut self,
        ctx: &mut HookContext<'_>,
        active: &VirtualCombatant,
        passive: &VirtualCombatant,
    ) {
        self.observe(ctx.store, active.unit);
        self.observe(ctx.store, passive.unit);
        match growth::award_virtual_experience(&self.resolver, ctx.store, ctx.rules, active, passive)
        {
            Ok(awards) => {
                for award in awards {
                    debug!(
                        unit = %award.unit,
                        amount = award.amount,
                        outcome = ?award.outcome,
                        "shadow gained virtual experience"
                    );
                }
            }
            Err(error) => warn!(%error, "virtual experience failed"),
        }
    }

    fn obtain_experience(
        &mut self,
        ctx: &mut HookContext<'_>,
        unit: UnitHandle,
        amount: u32,
    ) -> GrowthOutcome {
        self.growth_step(ctx, unit, amount, false)
    }

    fn direct_growth(
        &mut self,
        ctx: &mut HookContext<'_>,
        unit: UnitHandle,
        amount: u32,
    ) -> GrowthOutcome {
        self.growth_step(ctx, unit, amount, true)
    }

    fn after_virtual_attack(
        &mut self,
        ctx: &mut HookContext<'_>,
        active: &VirtualCombatant,
        passive: &VirtualCombatant,
    ) {
        for combatant in [active, passive] {
            self.observe(ctx.store, combatant.unit);
            self.sync(ctx.store, combatant.unit, "virtual_attack");
        }
    }

    fn after_durability_decrease(
        &mut self,
        ctx: &mut HookContext<'_>,
        unit: UnitHandle,
        _slot: usize,
    ) {
        self.observe(ctx.store, unit);
        self.sync(ctx.store, unit, "durability");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mirror_types::{
        BaseId, Class, ClassId, Deployment, Faction, Item, ItemKindId, ParamVector, Unit,
    };
    use serde_json::json;

    use super::*;
    use crate::config::MirrorDefaults;
    use crate::world::World;

    fn world() -> World {
        let mut world = World::with_capacity(5);
        world.add_class(Class::new(ClassId(1), "Lord", ParamVector::splat(60)));
        world
    }

    fn source(world: &mut World) -> UnitHandle {
        let mut unit = Unit::new(BaseId(5), Faction::Player, "Alm", ClassId(1), 5);
        unit.params = ParamVector::splat(12).with(mirror_types::ParamKind::MaxHp, 40);
        unit.hp = 40;
        unit.level = 3;
        unit.items.set(0, Item::new(ItemKindId(1), "Iron Sword", Some(30))).unwrap();
        world.add_unit(unit)
    }

    fn shadow(world: &mut World, mirror: serde_json::Value) -> UnitHandle {
        let mut unit = Unit::new(BaseId(90), Faction::Enemy, "Shade", ClassId(1), 5);
        unit.custom = json!({ "mirror": mirror });
        world.add_unit(unit)
    }

    fn resolver(world: &World) -> BindingResolver {
        BindingResolver::new(BindingRegistry::load(world, MirrorDefaults::default()))
    }

    #[test]
    fn spawn_clones_resolved_source() {
        let mut world = world();
        let _src = source(&mut world);
        let shade = shadow(&mut world, json!({ "enabled": true, "source": { "id": 5 } }));
        let mut resolver = resolver(&world);

        let decision = prepare_spawn(&mut resolver, &mut world, shade).unwrap();
        assert!(matches!(decision, SpawnDecision::Cloned(_)));
        let unit = world.unit(shade).unwrap();
        assert_eq!(unit.level, 3);
        assert_eq!(unit.hp, 40);
        assert_eq!(unit.name, "Alm");
    }

    #[test]
    fn missing_source_follows_policy() {
        let mut world = world();
        let erased = shadow(
            &mut world,
            json!({ "enabled": true, "missing_source": "erase", "source": { "id": 404 } }),
        );
        let kept = shadow(&mut world, json!({ "enabled": true, "source": { "id": 404 } }));
        let mut resolver = resolver(&world);

        assert_eq!(
            prepare_spawn(&mut resolver, &mut world, erased).unwrap(),
            SpawnDecision::Erased(EraseReason::SourceMissing)
        );
        assert_eq!(world.unit(erased).unwrap().alive, AliveState::Erased);
        assert_eq!(
            prepare_spawn(&mut resolver, &mut world, kept).unwrap(),
            SpawnDecision::KeptAuthored
        );
        assert_eq!(world.unit(kept).unwrap().alive, AliveState::Alive);
    }

    #[test]
    fn coexistence_is_checked_against_deployed_living_source() {
        let mut world = world();
        let src = source(&mut world);
        let shade = shadow(
            &mut world,
            json!({ "enabled": true, "allow_coexist": false, "source": { "id": 5 } }),
        );
        let mut resolver = resolver(&world);

        // Reserve units do not block the shadow.
        assert!(matches!(
            prepare_spawn(&mut resolver, &mut world, shade).unwrap(),
            SpawnDecision::Cloned(_)
        ));

        world.unit_mut(src).unwrap().deployment = Deployment::Deployed;
        assert_eq!(
            prepare_spawn(&mut resolver, &mut world, shade).unwrap(),
            SpawnDecision::Erased(EraseReason::SourceOnField)
        );
    }

    #[test]
    fn unbound_shadow_keeps_authored_data() {
        let mut world = world();
        let shade = shadow(&mut world, json!({ "enabled": true }));
        let mut resolver = resolver(&world);

        assert_eq!(
            prepare_spawn(&mut resolver, &mut world, shade).unwrap(),
            SpawnDecision::KeptAuthored
        );
        assert_eq!(world.unit(shade).unwrap().name, "Shade");
    }

    #[test]
    fn non_shadow_is_untouched() {
        let mut world = world();
        let src = source(&mut world);
        let before = world.unit(src).unwrap().clone();
        let mut resolver = resolver(&world);

        assert_eq!(prepare_spawn(&mut resolver, &mut world, src).unwrap(), SpawnDecision::NotShadow);
        assert_eq!(sync_to_source(&resolver, &mut world, src).unwrap(), None);
        assert_eq!(world.unit(src).unwrap(), &before);
    }

    #[test]
    fn sync_writes_shadow_state_into_source() {
        let mut world = world();
        let src = source(&mut world);
        let shade = shadow(&mut world, json!({ "enabled": true, "source": { "id": 5 } }));
        let mut resolver = resolver(&world);
        prepare_spawn(&mut resolver, &mut world, shade).unwrap();

        world.unit_mut(shade).unwrap().hp = 12;
        world.unit_mut(shade).unwrap().exp = 60;
        assert!(sync_to_source(&resolver, &mut world, shade).unwrap().is_some());

        let unit = world.unit(src).unwrap();
        assert_eq!(unit.hp, 12);
        assert_eq!(unit.exp, 60);
        assert_eq!(unit.faction, Faction::Player);
    }

    #[test]
    fn sync_scope_none_disables_sync() {
        let mut world = world();
        let src = source(&mut world);
        let shade = shadow(
            &mut world,
            json!({ "enabled": true, "sync_scope": "none", "source": { "id": 5 } }),
        );
        let resolver = resolver(&world);

        world.unit_mut(shade).unwrap().hp = 1;
        assert_eq!(sync_to_source(&resolver, &mut world, shade).unwrap(), None);
        assert_eq!(world.unit(src).unwrap().hp, 40);
    }

    #[test]
    fn sync_is_a_no_op_once_source_is_gone() {
        let mut world = world();
        let src = source(&mut world);
        let shade = shadow(&mut world, json!({ "enabled": true, "source": { "id": 5 } }));
        let mut resolver = resolver(&world);
        prepare_spawn(&mut resolver, &mut world, shade).unwrap();

        world.remove_unit(src);
        assert_eq!(sync_to_source(&resolver, &mut world, shade).unwrap(), None);
    }

    #[test]
    fn shadow_kept_authored_never_syncs_into_a_later_source() {
        let mut world = world();
        let shade = shadow(&mut world, json!({ "enabled": true, "source": { "id": 5 } }));
        let mut resolver = resolver(&world);
        assert_eq!(
            prepare_spawn(&mut resolver, &mut world, shade).unwrap(),
            SpawnDecision::KeptAuthored
        );

        let src = source(&mut world);
        let before = world.unit(src).unwrap().clone();
        assert_eq!(resolver.resolve_source(&world, shade), Resolution::Found(src));
        assert_eq!(sync_to_source(&resolver, &mut world, shade).unwrap(), None);
        assert_eq!(world.unit(src).unwrap(), &before);
    }

    #[test]
    fn respawn_without_clone_clears_the_clone_record() {
        let mut world = world();
        let src = source(&mut world);
        let shade = shadow(
            &mut world,
            json!({ "enabled": true, "allow_coexist": false, "source": { "id": 5 } }),
        );
        let mut resolver = resolver(&world);
        prepare_spawn(&mut resolver, &mut world, shade).unwrap();
        assert!(resolver.is_cloned(shade));

        world.unit_mut(src).unwrap().deployment = Deployment::Deployed;
        prepare_spawn(&mut resolver, &mut world, shade).unwrap();
        assert!(!resolver.is_cloned(shade));
    }

    #[test]
    fn hooks_register_late_shadows() {
        let mut world = world();
        let _src = source(&mut world);
        let mut hooks = MirrorHooks::new(&MirrorConfig::default(), &world);
        let late = shadow(&mut world, json!({ "enabled": true, "source": { "id": 5 } }));

        let mut rules = crate::world::StandardGrowth::default();
        let mut ctx = HookContext {
            store: &mut world,
            rules: &mut rules,
        };
        hooks.before_spawn(&mut ctx, late);

        assert!(hooks.resolver().is_shadow(late));
        assert!(hooks.resolver().is_cloned(late));
        assert_eq!(world.unit(late).unwrap().level, 3);
    }
}

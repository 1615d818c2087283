//! Source binding, state transfer, and growth delegation for shadow units.
//!
//! A *shadow* is a unit whose configuration blob names another unit as its
//! *source*. This crate keeps the two mirrored across a combat pipeline:
//! the shadow is cloned from its source when it spawns, grows with the
//! source's growth table, and writes its state back after every virtual
//! attack and every durability decrease.
//!
//! # Modules
//!
//! - [`binding`] -- Typed binding configuration parsed from unit blobs, and
//!   the [`BindingRegistry`] of every shadow.
//! - [`config`] -- Configuration loading from `mirror-config.yaml`.
//! - [`directory`] -- Read-only unit lookup by identifier, name, tag, or
//!   roster position.
//! - [`error`] -- [`MirrorError`].
//! - [`growth`] -- Experience and growth delegation to the source.
//! - [`hooks`] -- [`MirrorHooks`], the pipeline extension tying it together.
//! - [`host`] -- [`UnitStore`] and [`GrowthRules`], the host-facing traits.
//! - [`pipeline`] -- [`PipelineHooks`] and the reference [`CombatPipeline`].
//! - [`resolver`] -- Shadow detection and per-call source resolution.
//! - [`transfer`] -- Clone and sync between a source and its shadow.
//! - [`world`] -- In-memory reference host: rosters and standard growth.
//!
//! [`BindingRegistry`]: binding::BindingRegistry
//! [`MirrorError`]: error::MirrorError
//! [`MirrorHooks`]: hooks::MirrorHooks
//! [`UnitStore`]: host::UnitStore
//! [`GrowthRules`]: host::GrowthRules
//! [`PipelineHooks`]: pipeline::PipelineHooks
//! [`CombatPipeline`]: pipeline::CombatPipeline

pub mod binding;
pub mod config;
pub mod directory;
pub mod error;
pub mod growth;
pub mod hooks;
pub mod host;
pub mod pipeline;
pub mod resolver;
pub mod transfer;
pub mod world;

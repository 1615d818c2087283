//! Shared type definitions for the unit mirroring layer.
//!
//! This crate describes the host simulation's data model as the mirroring
//! layer sees it: units, their classes and items, and the identifiers used to
//! address them. It carries no behaviour beyond small accessors.
//!
//! # Modules
//!
//! - [`ids`] -- Runtime handles (UUID v7) and authored numeric keys
//! - [`enums`] -- Faction, roster, alive/deployment state, parameter slots
//! - [`structs`] -- Units, classes, items, parameter vectors, growth tables

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AliveState, Deployment, Faction, Importance, PARAM_COUNT, ParamKind, RosterKind};
pub use ids::{BaseId, ClassId, ItemInstanceId, ItemKindId, UnitHandle};
pub use structs::{Class, GrowthTable, Item, ItemSlots, MapPosition, ParamVector, Unit};

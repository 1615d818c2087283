//! Type-safe identifier wrappers.
//!
//! Two families of identifiers exist in the host simulation:
//!
//! - Runtime handles ([`UnitHandle`], [`ItemInstanceId`]) wrap a UUID v7 and
//!   are unique per live instance. Two units authored from the same editor
//!   entry still get distinct handles.
//! - Authored keys ([`BaseId`], [`ClassId`], [`ItemKindId`]) are the numeric
//!   identifiers a scenario author sees in the editor. They are stable across
//!   saves but not guaranteed unique within a roster.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

/// Generates a newtype wrapper around an authored numeric key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Return the inner numeric value.
            pub const fn get(self) -> u32 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(id: u32) -> Self {
                Self(id)
            }
        }
    };
}

define_id! {
    /// Runtime handle for a unit instance held by the host rosters.
    UnitHandle
}

define_id! {
    /// Runtime identifier for a single item instance. Duplicated items get a
    /// fresh one so two units never share equipment.
    ItemInstanceId
}

define_key! {
    /// Authored base identifier of a unit (the editor ID).
    BaseId
}

define_key! {
    /// Authored identifier of a class.
    ClassId
}

define_key! {
    /// Authored identifier of an item kind (weapon or consumable entry).
    ItemKindId
}

//! Error types for the mirror-core crate.
//!
//! None of these reach the host pipeline. Hooks catch them, log at `warn`,
//! and let the pipeline step continue with its default behaviour.

use mirror_types::UnitHandle;

/// Errors that can occur while mirroring unit state.
#[derive(Debug, thiserror::Error)]
pub enum MirrorError {
    /// A handle passed to the mirroring layer is not held by the unit store.
    #[error("unit not found: {0}")]
    UnitNotFound(UnitHandle),

    /// The unit's `mirror` blob entry could not be parsed.
    #[error("malformed binding on unit {unit}: {source}")]
    MalformedBinding {
        /// The unit carrying the blob.
        unit: UnitHandle,
        /// The underlying JSON shape error.
        source: serde_json::Error,
    },
}

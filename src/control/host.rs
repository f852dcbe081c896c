//! Boundary traits for whatever hosts the engine
//!
//! A host supplies the current tempo and may listen for parameter changes.

use crate::params::ParamId;

/// Transport information queried once per block
pub trait PlayHead {
    /// Tempo in BPM, or `None` when the host has no transport
    fn tempo(&self) -> Option<f64>;
}

/// A play head that always reports the same tempo
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FixedTempo(pub Option<f64>);

impl PlayHead for FixedTempo {
    fn tempo(&self) -> Option<f64> {
        self.0
    }
}

/// Gets told about parameter edits made on the control side
pub trait ParameterListener: Send + Sync {
    fn parameter_changed(&self, id: ParamId, value: f32);
}

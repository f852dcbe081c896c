//! Algorithmic reverb engine with 21 character modes
//!
//! Signal flow, per block: saturation, predelay, warp, Freeverb-style core,
//! dynamics (gate, dynamic EQ, ducking), tone shaping, dry/wet mix and a
//! brick-wall limiter. Parameter values live in a lock-free store that the
//! control thread writes and the audio thread snapshots once per block.

pub mod control;
pub mod dynamics;
pub mod effects;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod filters;
pub mod modes;
pub mod params;
pub mod preset;
pub mod processor;
pub mod utils;

pub use control::{AbSlot, FixedTempo, PlayHead, ReverbControls, SharedParameters};
pub use engine::{EngineState, ProcessSpec, ReverbEngine};
pub use error::{EngineError, PresetError};
pub use modes::{EffectiveParameters, Mode};
pub use params::{ParamId, ReverbParameters, SyncDivision, PARAM_COUNT, PARAM_SPECS};
pub use preset::PresetDocument;
pub use processor::ReverbProcessor;

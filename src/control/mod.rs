//! Control-thread side: lock-free parameter store and the operations a
//! control surface performs on it
//!
//! The audio thread only ever reads `SharedParameters` through `snapshot`
//! and consumes the clear flag with `take_clear`. Everything else here runs
//! on the control thread.

pub mod ab;
pub mod host;

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::PresetError;
use crate::modes::{character_preset, Mode, MODIFIER_RESETS};
use crate::params::{ParamId, ParameterValues, ReverbParameters, PARAM_COUNT, PARAM_SPECS};
use crate::preset;

pub use self::ab::{AbSlot, AbSnapshots};
pub use self::host::{FixedTempo, ParameterListener, PlayHead};

/// Lock-free parameter storage shared between the control and audio threads
///
/// Each value is an f32 stored as bits in an `AtomicU32`, so individual
/// reads never tear. Tempo is an f64 in an `AtomicU64`; NaN means the host
/// reports none.
pub struct SharedParameters {
    values: [AtomicU32; PARAM_COUNT],
    clear_requested: AtomicBool,
    tempo_bits: AtomicU64,
}

impl SharedParameters {
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicU32::new(PARAM_SPECS[i].default.to_bits())),
            clear_requested: AtomicBool::new(false),
            tempo_bits: AtomicU64::new(f64::NAN.to_bits()),
        }
    }

    /// Store a denormalized value and return what was stored after range
    /// clamping and step snapping
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let sanitized = id.spec().sanitize(value);
        self.values[id.index()].store(sanitized.to_bits(), Ordering::Relaxed);
        sanitized
    }

    pub fn get(&self, id: ParamId) -> f32 {
        f32::from_bits(self.values[id.index()].load(Ordering::Relaxed))
    }

    /// Store a normalized (0-1) value, honoring the parameter's skew
    pub fn set_normalized(&self, id: ParamId, normalized: f32) -> f32 {
        self.set(id, id.spec().denormalize(normalized))
    }

    pub fn get_normalized(&self, id: ParamId) -> f32 {
        id.spec().normalize(self.get(id))
    }

    /// Every value, indexed by `ParamId`
    pub fn values(&self) -> ParameterValues {
        std::array::from_fn(|i| f32::from_bits(self.values[i].load(Ordering::Relaxed)))
    }

    /// Return every parameter to its default (LIMITER on)
    pub fn reset_to_defaults(&self) {
        for spec in PARAM_SPECS.iter() {
            self.set(spec.id, spec.default);
        }
    }

    /// Build the per-block snapshot the engine consumes
    pub fn snapshot(&self) -> ReverbParameters {
        ReverbParameters::from_values(&self.values(), self.tempo())
    }

    /// Ask the audio thread to clear all reverb memory on its next block
    pub fn request_clear(&self) {
        self.clear_requested.store(true, Ordering::Release);
    }

    /// Consume a pending clear request. Returns true at most once per request.
    pub fn take_clear(&self) -> bool {
        self.clear_requested.swap(false, Ordering::Acquire)
    }

    pub fn set_tempo(&self, bpm: Option<f64>) {
        let bits = bpm
            .filter(|b| b.is_finite() && *b > 0.0)
            .unwrap_or(f64::NAN)
            .to_bits();
        self.tempo_bits.store(bits, Ordering::Relaxed);
    }

    pub fn tempo(&self) -> Option<f64> {
        let bpm = f64::from_bits(self.tempo_bits.load(Ordering::Relaxed));
        (bpm.is_finite() && bpm > 0.0).then_some(bpm)
    }
}

impl Default for SharedParameters {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle for a control surface
///
/// Every value change made through it is reported to the attached
/// listener, the way a host is told about parameter edits.
#[derive(Clone)]
pub struct ReverbControls {
    shared: Arc<SharedParameters>,
    ab: Arc<Mutex<AbSnapshots>>,
    listener: Option<Arc<dyn ParameterListener>>,
}

impl ReverbControls {
    pub fn new(shared: Arc<SharedParameters>) -> Self {
        Self {
            shared,
            ab: Arc::new(Mutex::new(AbSnapshots::new())),
            listener: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn ParameterListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn shared(&self) -> &Arc<SharedParameters> {
        &self.shared
    }

    /// Set one parameter and notify the listener if the stored value changed
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let before = self.shared.get(id);
        let stored = self.shared.set(id, value);
        if stored != before {
            self.notify(id, stored);
        }
        stored
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.shared.get(id)
    }

    fn notify(&self, id: ParamId, value: f32) {
        if let Some(listener) = &self.listener {
            listener.parameter_changed(id, value);
        }
    }

    fn set_all(&self, values: &ParameterValues) {
        for id in ParamId::ALL {
            self.set(id, values[id.index()]);
        }
    }

    /// Select `mode` and load its character onto the knobs
    ///
    /// Modifiers are cleared first; knobs the mode does not list keep their
    /// current values.
    pub fn apply_mode_character(&self, mode: Mode) {
        log::debug!("Applying character preset for {}", mode.name());
        for &(id, value) in MODIFIER_RESETS.iter().chain(character_preset(mode)) {
            self.set(id, value);
        }
        self.set(ParamId::Mode, mode.index() as f32);
    }

    /// Return every parameter to its default, notifying each change
    pub fn reset_all_parameters(&self) {
        log::debug!("Resetting all parameters to defaults");
        let before = self.shared.values();
        self.shared.reset_to_defaults();
        for id in ParamId::ALL {
            let value = self.shared.get(id);
            if value != before[id.index()] {
                self.notify(id, value);
            }
        }
    }

    /// Store the live values in the active A/B slot and switch to the other
    pub fn toggle_ab(&self) -> AbSlot {
        let mut ab = self.lock_ab();
        let next = ab.toggle(&self.shared.values());
        let slot = ab.active();
        drop(ab);

        log::debug!("A/B switched to {:?}", slot);
        self.set_all(&next);
        slot
    }

    pub fn active_ab_slot(&self) -> AbSlot {
        self.lock_ab().active()
    }

    fn lock_ab(&self) -> MutexGuard<'_, AbSnapshots> {
        // A poisoned lock still holds two valid snapshots
        self.ab.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask the audio thread to clear the reverb tail
    pub fn request_clear(&self) {
        self.shared.request_clear();
    }

    pub fn preset_json(&self) -> Result<String, PresetError> {
        preset::PresetDocument::from_values(&self.shared.values()).to_json()
    }

    pub fn save_preset(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        preset::save(path, &self.shared.values())
    }

    /// Load a preset file onto the live parameters
    ///
    /// On error nothing is changed.
    pub fn load_preset(&self, path: impl AsRef<Path>) -> Result<usize, PresetError> {
        let document = preset::load(path)?;
        Ok(self.apply_preset(&document))
    }

    /// Apply a parsed preset, returning how many values were taken from it
    pub fn apply_preset(&self, document: &preset::PresetDocument) -> usize {
        let mut values = self.shared.values();
        let applied = document.apply_to(&mut values);
        self.set_all(&values);
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingListener {
        changes: AtomicUsize,
    }

    impl ParameterListener for CountingListener {
        fn parameter_changed(&self, _id: ParamId, _value: f32) {
            self.changes.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn test_defaults_and_sanitize() {
        let shared = SharedParameters::new();
        assert_eq!(shared.get(ParamId::Mix), 50.0);
        assert_eq!(shared.get(ParamId::Limiter), 1.0);
        assert_eq!(shared.set(ParamId::Mix, 250.0), 100.0);
        assert_eq!(shared.set(ParamId::Mode, 999.0), 20.0);
        assert_eq!(shared.snapshot().mode, 20);
    }

    #[test]
    fn test_clear_flag_consumed_once() {
        let shared = SharedParameters::new();
        assert!(!shared.take_clear());
        shared.request_clear();
        shared.request_clear();
        assert!(shared.take_clear());
        assert!(!shared.take_clear());
    }

    #[test]
    fn test_tempo_unavailable() {
        let shared = SharedParameters::new();
        assert_eq!(shared.tempo(), None);
        shared.set_tempo(Some(128.0));
        assert_eq!(shared.snapshot().bpm, Some(128.0));
        shared.set_tempo(Some(f64::NAN));
        assert_eq!(shared.tempo(), None);
        shared.set_tempo(Some(0.0));
        assert_eq!(shared.tempo(), None);
    }

    #[test]
    fn test_mode_character_resets_modifiers() {
        let controls = ReverbControls::new(Arc::new(SharedParameters::new()));
        controls.set(ParamId::Ducking, 80.0);
        controls.set(ParamId::DynQ, 4.0);
        controls.apply_mode_character(Mode::VoidMaker);

        assert_eq!(controls.get(ParamId::Mode), 4.0);
        assert_eq!(controls.get(ParamId::Mix), 100.0);
        assert_eq!(controls.get(ParamId::Saturation), 45.0);
        assert_eq!(controls.get(ParamId::Eq3High), -12.0);
        assert_eq!(controls.get(ParamId::Ducking), 0.0);
        // not listed by the mode, so untouched
        assert_eq!(controls.get(ParamId::DynQ), 4.0);
    }

    #[test]
    fn test_listener_sees_only_changes() {
        let listener = Arc::new(CountingListener::default());
        let controls =
            ReverbControls::new(Arc::new(SharedParameters::new())).with_listener(listener.clone());
        controls.set(ParamId::Mix, 50.0);
        assert_eq!(listener.changes.load(Ordering::Relaxed), 0);
        controls.set(ParamId::Mix, 20.0);
        assert_eq!(listener.changes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_normalized_access_follows_skew() {
        let shared = SharedParameters::new();
        assert_eq!(shared.set_normalized(ParamId::Mix, 0.25), 25.0);
        assert_eq!(shared.get_normalized(ParamId::Mix), 0.25);

        // DYNFREQ is skewed, so the midpoint sits well below the linear centre
        let mid = shared.set_normalized(ParamId::DynFreq, 0.5);
        assert!(mid > 20.0 && mid < 10010.0);
        assert!((shared.get_normalized(ParamId::DynFreq) - 0.5).abs() < 1e-3);

        assert_eq!(shared.set_normalized(ParamId::Limiter, 0.2), 0.0);
        assert_eq!(shared.set_normalized(ParamId::Mode, 1.0), 20.0);
    }

    #[test]
    fn test_reset_to_defaults_and_listener() {
        let listener = Arc::new(CountingListener::default());
        let controls =
            ReverbControls::new(Arc::new(SharedParameters::new())).with_listener(listener.clone());
        controls.set(ParamId::Mix, 10.0);
        controls.set(ParamId::Width, 10.0);
        let edits = listener.changes.load(Ordering::Relaxed);

        controls.reset_all_parameters();
        assert_eq!(listener.changes.load(Ordering::Relaxed), edits + 2);
        assert_eq!(controls.get(ParamId::Mix), 50.0);

        // already at defaults: nothing to report
        controls.reset_all_parameters();
        assert_eq!(listener.changes.load(Ordering::Relaxed), edits + 2);
    }

    #[test]
    fn test_reset_all_parameters() {
        let controls = ReverbControls::new(Arc::new(SharedParameters::new()));
        controls.apply_mode_character(Mode::ScorpionTail);
        controls.set(ParamId::Limiter, 0.0);
        controls.reset_all_parameters();
        assert_eq!(controls.shared().snapshot(), ReverbParameters::default());
    }
}

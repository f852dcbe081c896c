//! Host-facing processor that ties the engine to the shared parameter store
//!
//! `ReverbProcessor` lives on the audio thread. Its `controls()` handle can
//! be cloned and moved to the control thread; the two sides only meet
//! through `SharedParameters`.

use std::path::Path;
use std::sync::Arc;

use crate::control::{AbSlot, PlayHead, ReverbControls, SharedParameters};
use crate::engine::{ProcessSpec, ReverbEngine};
use crate::error::{EngineError, PresetError};
use crate::modes::Mode;

pub struct ReverbProcessor {
    engine: ReverbEngine,
    shared: Arc<SharedParameters>,
    controls: ReverbControls,
}

impl ReverbProcessor {
    pub fn new() -> Self {
        let shared = Arc::new(SharedParameters::new());
        let controls = ReverbControls::new(Arc::clone(&shared));
        Self {
            engine: ReverbEngine::new(),
            shared,
            controls,
        }
    }

    pub fn prepare(&mut self, spec: ProcessSpec) -> Result<(), EngineError> {
        self.engine.prepare(spec)
    }

    /// Run one host block in place
    ///
    /// A pending clear request is honoured before the block is rendered, so
    /// the block after a clear starts from silence.
    pub fn process_block(
        &mut self,
        channels: &mut [&mut [f32]],
        play_head: &dyn PlayHead,
    ) -> Result<(), EngineError> {
        self.begin_block(play_head);
        let params = self.shared.snapshot();
        self.engine.process(channels, &params)
    }

    pub fn process_interleaved(
        &mut self,
        data: &mut [f32],
        play_head: &dyn PlayHead,
    ) -> Result<(), EngineError> {
        self.begin_block(play_head);
        let params = self.shared.snapshot();
        self.engine.process_interleaved(data, &params)
    }

    fn begin_block(&mut self, play_head: &dyn PlayHead) {
        self.shared.set_tempo(play_head.tempo());
        if self.shared.take_clear() {
            self.engine.reset();
        }
    }

    pub fn controls(&self) -> &ReverbControls {
        &self.controls
    }

    pub fn engine(&self) -> &ReverbEngine {
        &self.engine
    }

    pub fn apply_mode_character(&self, mode: Mode) {
        self.controls.apply_mode_character(mode);
    }

    pub fn reset_all_parameters(&self) {
        self.controls.reset_all_parameters();
    }

    pub fn toggle_ab(&self) -> AbSlot {
        self.controls.toggle_ab()
    }

    pub fn save_preset(&self, path: impl AsRef<Path>) -> Result<(), PresetError> {
        self.controls.save_preset(path)
    }

    pub fn load_preset(&self, path: impl AsRef<Path>) -> Result<usize, PresetError> {
        self.controls.load_preset(path)
    }
}

impl Default for ReverbProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::FixedTempo;
    use crate::engine::EngineState;
    use crate::params::ParamId;

    fn impulse_block(len: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = vec![0.0; len];
        let mut right = vec![0.0; len];
        left[0] = 1.0;
        right[0] = 1.0;
        (left, right)
    }

    #[test]
    fn test_unprepared_passes_dry() {
        let mut processor = ReverbProcessor::new();
        let (mut left, mut right) = impulse_block(64);
        let result =
            processor.process_block(&mut [&mut left[..], &mut right[..]], &FixedTempo(None));
        assert_eq!(result, Err(EngineError::NotPrepared));
        assert_eq!(left[0], 1.0);
        assert!(left[1..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_clear_empties_tail() {
        let mut processor = ReverbProcessor::new();
        processor.prepare(ProcessSpec::new(48000.0, 256, 2)).unwrap();
        processor.controls().set(ParamId::Mix, 100.0);
        processor.controls().set(ParamId::Delay, 0.0);

        let (mut left, mut right) = impulse_block(256);
        processor
            .process_block(&mut [&mut left[..], &mut right[..]], &FixedTempo(None))
            .unwrap();
        for _ in 0..4 {
            let mut left = vec![0.0; 256];
            let mut right = vec![0.0; 256];
            processor
                .process_block(&mut [&mut left[..], &mut right[..]], &FixedTempo(None))
                .unwrap();
        }

        processor.controls().request_clear();
        let mut left = vec![0.0; 256];
        let mut right = vec![0.0; 256];
        processor
            .process_block(&mut [&mut left[..], &mut right[..]], &FixedTempo(None))
            .unwrap();
        assert!(left.iter().chain(&right).all(|&s| s == 0.0));
        assert_eq!(processor.engine().state(), EngineState::Processing);
    }

    #[test]
    fn test_tempo_reaches_engine() {
        let mut processor = ReverbProcessor::new();
        processor.prepare(ProcessSpec::new(48000.0, 128, 2)).unwrap();
        processor.controls().set(ParamId::PredelaySync, 1.0);

        let mut left = vec![0.0; 128];
        let mut right = vec![0.0; 128];
        processor
            .process_block(&mut [&mut left[..], &mut right[..]], &FixedTempo(Some(120.0)))
            .unwrap();
        // quarter note at 120 BPM
        assert_eq!(processor.engine().predelay_samples(), Some(24000.0));

        processor
            .process_block(&mut [&mut left[..], &mut right[..]], &FixedTempo(None))
            .unwrap();
        // free time: DELAY 100 ms
        assert_eq!(processor.engine().predelay_samples(), Some(4800.0));
    }
}

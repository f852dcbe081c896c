//! Per-sample dynamics on the wet signal: gate, dynamic EQ, ducking
//!
//! The three envelope levels live in `EnvelopeState`, owned by the caller
//! and passed in for every block.

use crate::envelope::{EnvelopeConfig, EnvelopeFollower};
use crate::filters::BandpassSvf;
use crate::params::ReverbParameters;
use crate::utils::decibels::{db_to_gain, gain_to_db, MINUS_INFINITY_DB};

/// Gate timing: opens instantly, releases over 100 ms
pub const GATE_ENVELOPE: EnvelopeConfig = EnvelopeConfig::new(0.0, 0.1);

/// Dynamic EQ detector timing
pub const DYN_EQ_ENVELOPE: EnvelopeConfig = EnvelopeConfig::new(0.005, 0.1);

/// Ducking follower timing
pub const DUCK_ENVELOPE: EnvelopeConfig = EnvelopeConfig::new(0.01, 0.1);

/// Ducking reduction per unit of envelope at 100% ducking
pub const DUCK_SCALE: f32 = 2.5;

/// Excess over threshold (dB) that reaches the full dynamic depth
const DYN_EQ_RANGE_DB: f32 = 20.0;

/// Envelope levels carried across blocks
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnvelopeState {
    /// Gate gain, 0 (closed) to 1 (open)
    pub gate: f32,
    /// Dry-input level driving the ducker
    pub duck: f32,
    /// Detector band level driving the dynamic EQ
    pub dyn_eq: f32,
}

impl EnvelopeState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Block-rate control values for the dynamics stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsSettings {
    pub gate_thresh_db: f32,
    pub dyn_freq: f32,
    pub dyn_q: f32,
    pub dyn_gain_db: f32,
    pub dyn_depth_db: f32,
    pub dyn_thresh_db: f32,
    /// 0-100
    pub ducking: f32,
}

impl DynamicsSettings {
    pub fn from_params(params: &ReverbParameters) -> Self {
        Self {
            gate_thresh_db: params.gate_thresh_db,
            dyn_freq: params.dyn_freq,
            dyn_q: params.dyn_q,
            dyn_gain_db: params.dyn_gain_db,
            dyn_depth_db: params.dyn_depth_db,
            dyn_thresh_db: params.dyn_thresh_db,
            ducking: params.ducking,
        }
    }

    /// The gate is disabled at its minimum threshold
    pub fn gate_enabled(&self) -> bool {
        self.gate_thresh_db > MINUS_INFINITY_DB
    }
}

impl Default for DynamicsSettings {
    fn default() -> Self {
        Self::from_params(&ReverbParameters::default())
    }
}

/// Gate, dynamic EQ and ducker
pub struct DynamicsProcessor {
    settings: DynamicsSettings,
    gate_follower: EnvelopeFollower,
    gate_threshold: f32,
    dyn_threshold: f32,
    dyn_follower: EnvelopeFollower,
    duck_follower: EnvelopeFollower,
    /// Band-pass fed the channel mean of the wet signal (the gate is keyed
    /// on the channel peak). The follower rectifies the band output.
    detector: BandpassSvf,
    band_filters: Vec<BandpassSvf>,
}

impl DynamicsProcessor {
    /// Create a dynamics processor
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `channels` - One band filter is kept per channel
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        let settings = DynamicsSettings::default();
        let mut processor = Self {
            settings,
            gate_follower: EnvelopeFollower::new(GATE_ENVELOPE, sample_rate),
            gate_threshold: 0.0,
            dyn_threshold: 0.0,
            dyn_follower: EnvelopeFollower::new(DYN_EQ_ENVELOPE, sample_rate),
            duck_follower: EnvelopeFollower::new(DUCK_ENVELOPE, sample_rate),
            detector: BandpassSvf::new(sample_rate, settings.dyn_freq, settings.dyn_q),
            band_filters: (0..channels)
                .map(|_| BandpassSvf::new(sample_rate, settings.dyn_freq, settings.dyn_q))
                .collect(),
        };
        processor.set_settings(settings);
        processor
    }

    /// Recompute thresholds and filter coefficients for the next block
    pub fn set_settings(&mut self, settings: DynamicsSettings) {
        self.settings = settings;
        self.gate_threshold = db_to_gain(settings.gate_thresh_db);
        self.dyn_threshold = db_to_gain(settings.dyn_thresh_db);
        self.detector.set_params(settings.dyn_freq, settings.dyn_q);
        for filter in &mut self.band_filters {
            filter.set_params(settings.dyn_freq, settings.dyn_q);
        }
    }

    /// Linear band gain for a detector envelope level
    pub fn band_gain(&self, envelope: f32) -> f32 {
        let mut contribution = 0.0;
        if envelope > self.dyn_threshold {
            let excess_db = gain_to_db(envelope) - self.settings.dyn_thresh_db;
            if excess_db > 0.0 {
                contribution = self.settings.dyn_depth_db * (excess_db / DYN_EQ_RANGE_DB).min(1.0);
            }
        }
        db_to_gain(self.settings.dyn_gain_db + contribution)
    }

    /// Process one block of wet audio in place
    ///
    /// `dry` is the untouched input block and keys the ducker.
    pub fn process(
        &mut self,
        wet: &mut [Vec<f32>],
        dry: &[Vec<f32>],
        num_samples: usize,
        state: &mut EnvelopeState,
    ) {
        let channel_count = wet.len().max(1) as f32;
        let gate_enabled = self.settings.gate_enabled();
        let duck_amount = self.settings.ducking / 100.0;

        for i in 0..num_samples {
            // 1. Gate
            if gate_enabled {
                let peak = wet.iter().map(|ch| ch[i].abs()).fold(0.0_f32, f32::max);
                if peak > self.gate_threshold {
                    state.gate = 1.0;
                } else {
                    self.gate_follower.release(&mut state.gate);
                }
                for channel in wet.iter_mut() {
                    channel[i] *= state.gate;
                }
            } else {
                state.gate = 1.0;
            }

            // 2. Dynamic EQ, detector fed the channel mean
            let detector_in = wet.iter().map(|ch| ch[i]).sum::<f32>() / channel_count;
            let detected = self.detector.process(detector_in);
            self.dyn_follower.follow(&mut state.dyn_eq, detected);

            let band_gain = self.band_gain(state.dyn_eq);
            for (channel, filter) in wet.iter_mut().zip(self.band_filters.iter_mut()) {
                let input = channel[i];
                let band = filter.process(input);
                channel[i] = input + (band_gain - 1.0) * band;
            }

            // 3. Ducking
            if duck_amount > 0.0 {
                let dry_peak = dry.iter().map(|ch| ch[i].abs()).fold(0.0_f32, f32::max);
                self.duck_follower.follow(&mut state.duck, dry_peak);
                let reduction = (1.0 - state.duck * duck_amount * DUCK_SCALE).max(0.0);
                for channel in wet.iter_mut() {
                    channel[i] *= reduction;
                }
            }
        }
    }

    /// Clear filter memory. Envelope levels live in `EnvelopeState`.
    pub fn reset(&mut self) {
        self.detector.reset();
        for filter in &mut self.band_filters {
            filter.reset();
        }
    }
}

//! Reverb core: Schroeder/Moorer network in the Freeverb layout
//!
//! Eight damped feedback combs in parallel feed four series all-passes, per
//! channel. The right channel's lines are detuned by a fixed stereo spread.
//! The stage is always full-wet; dry/wet blending happens once, at the
//! output of the engine.

use crate::effects::{sanitize_sample, Effect};
use crate::modes::MAX_ROOM_SIZE;
use crate::utils::smoother::{SmoothedParam, DEFAULT_SMOOTH_TIME_MS};

const COMB_TUNINGS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_TUNINGS: [usize; 4] = [556, 441, 341, 225];
const STEREO_SPREAD: usize = 23;

/// Sample rate the tunings above were chosen for
const TUNING_SAMPLE_RATE: f32 = 44100.0;

const FIXED_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;
const DAMP_SCALE: f32 = 0.4;

/// Lowpass-feedback comb filter
struct CombFilter {
    buffer: Vec<f32>,
    index: usize,
    filter_store: f32,
}

impl CombFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
            filter_store: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, feedback: f32, damp: f32) -> f32 {
        let output = self.buffer[self.index];
        self.filter_store = sanitize_sample(output * (1.0 - damp) + self.filter_store * damp);
        self.buffer[self.index] = sanitize_sample(input + self.filter_store * feedback);
        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.filter_store = 0.0;
    }
}

/// Schroeder all-pass
struct AllpassFilter {
    buffer: Vec<f32>,
    index: usize,
}

impl AllpassFilter {
    fn new(size: usize) -> Self {
        Self {
            buffer: vec![0.0; size.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32, feedback: f32) -> f32 {
        let buffered = self.buffer[self.index];
        self.buffer[self.index] = sanitize_sample(input + buffered * feedback);
        self.index += 1;
        if self.index >= self.buffer.len() {
            self.index = 0;
        }
        buffered - input
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

struct ReverbChannel {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl ReverbChannel {
    fn new(sample_rate: f32, spread: usize) -> Self {
        let scale = |tuning: usize| ((tuning + spread) as f32 * sample_rate / TUNING_SAMPLE_RATE) as usize;
        Self {
            combs: COMB_TUNINGS.iter().map(|&t| CombFilter::new(scale(t))).collect(),
            allpasses: ALLPASS_TUNINGS.iter().map(|&t| AllpassFilter::new(scale(t))).collect(),
        }
    }

    #[inline]
    fn process(&mut self, input: f32, feedback: f32, damp: f32, allpass_feedback: f32) -> f32 {
        let mut out = 0.0;
        for comb in &mut self.combs {
            out += comb.process(input, feedback, damp);
        }
        for allpass in &mut self.allpasses {
            out = allpass.process(out, allpass_feedback);
        }
        out
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.allpasses.iter_mut().for_each(AllpassFilter::clear);
    }
}

/// Full-wet stereo reverb network
///
/// Parameters:
/// - Room size: 0.0 to 0.99 (comb feedback = room * 0.28 + 0.7)
/// - Damping: 0.0 to 1.0 (high-frequency loss inside the combs)
/// - Width: 0.0 (mono tail) to 1.0 (fully decorrelated)
/// - Wet level: output gain, 1.0 = full
/// - Diffusion: 0 to 100, sets the all-pass feedback (100 = 0.5)
pub struct ReverbCore {
    channels: Vec<ReverbChannel>,
    allpass_feedback: f32,

    feedback_smoothed: SmoothedParam,
    damp_smoothed: SmoothedParam,
    wet1_smoothed: SmoothedParam,
    wet2_smoothed: SmoothedParam,
}

impl ReverbCore {
    /// Create a reverb core
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz (delay lengths are scaled from 44.1kHz)
    /// * `channels` - 1 or 2
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        let smoother = |initial: f32, max: f32| {
            SmoothedParam::new(initial, 0.0, max, sample_rate, DEFAULT_SMOOTH_TIME_MS)
        };
        let mut core = Self {
            channels: (0..channels)
                .map(|ch| ReverbChannel::new(sample_rate, ch * STEREO_SPREAD))
                .collect(),
            allpass_feedback: 0.5,
            feedback_smoothed: smoother(0.0, 1.0),
            damp_smoothed: smoother(0.0, 1.0),
            wet1_smoothed: smoother(0.0, WET_SCALE),
            wet2_smoothed: smoother(0.0, WET_SCALE),
        };
        core.set_parameters(0.5, 0.5, 1.0, 1.0);
        core.snap();
        core
    }

    /// Set the block-rate reverb parameters; changes glide over 10ms
    pub fn set_parameters(&mut self, room_size: f32, damping: f32, width: f32, wet_level: f32) {
        let room_size = room_size.clamp(0.0, MAX_ROOM_SIZE);
        let damping = damping.clamp(0.0, 1.0);
        let width = width.clamp(0.0, 1.0);
        let wet = wet_level.clamp(0.0, 1.0) * WET_SCALE;

        self.feedback_smoothed.set_target(room_size * ROOM_SCALE + ROOM_OFFSET);
        self.damp_smoothed.set_target(damping * DAMP_SCALE);
        self.wet1_smoothed.set_target(0.5 * wet * (1.0 + width));
        self.wet2_smoothed.set_target(0.5 * wet * (1.0 - width));
    }

    /// Set diffusion (0-100)
    pub fn set_diffusion(&mut self, diffusion: f32) {
        let diffusion = if diffusion.is_finite() {
            diffusion.clamp(0.0, 100.0)
        } else {
            100.0
        };
        self.allpass_feedback = 0.5 * diffusion / 100.0;
    }

    /// Jump all smoothed parameters to their targets
    pub fn snap(&mut self) {
        self.feedback_smoothed.snap_to_target();
        self.damp_smoothed.snap_to_target();
        self.wet1_smoothed.snap_to_target();
        self.wet2_smoothed.snap_to_target();
    }

    /// Comb feedback currently targeted
    pub fn comb_feedback(&self) -> f32 {
        self.feedback_smoothed.target()
    }

    pub fn allpass_feedback(&self) -> f32 {
        self.allpass_feedback
    }
}

impl Effect for ReverbCore {
    fn process(&mut self, channels: &mut [Vec<f32>], num_samples: usize) {
        let allpass_feedback = self.allpass_feedback;

        match (channels, self.channels.as_mut_slice()) {
            ([left, right, ..], [core_l, core_r, ..]) => {
                for i in 0..num_samples {
                    let feedback = self.feedback_smoothed.tick();
                    let damp = self.damp_smoothed.tick();
                    let wet1 = self.wet1_smoothed.tick();
                    let wet2 = self.wet2_smoothed.tick();

                    let input = (sanitize_sample(left[i]) + sanitize_sample(right[i])) * FIXED_GAIN;
                    let out_l = core_l.process(input, feedback, damp, allpass_feedback);
                    let out_r = core_r.process(input, feedback, damp, allpass_feedback);

                    left[i] = out_l.mul_add(wet1, out_r * wet2);
                    right[i] = out_r.mul_add(wet1, out_l * wet2);
                }
            }
            ([mono, ..], [core, ..]) => {
                for i in 0..num_samples {
                    let feedback = self.feedback_smoothed.tick();
                    let damp = self.damp_smoothed.tick();
                    let wet1 = self.wet1_smoothed.tick();
                    self.wet2_smoothed.tick();

                    let input = sanitize_sample(mono[i]) * FIXED_GAIN;
                    mono[i] = core.process(input, feedback, damp, allpass_feedback) * wet1;
                }
            }
            _ => {}
        }
    }

    fn reset(&mut self) {
        self.channels.iter_mut().for_each(ReverbChannel::clear);
    }
}

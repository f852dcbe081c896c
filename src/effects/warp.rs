//! Warp: modulated delay that animates the signal ahead of the reverb core
//!
//! One voice per channel. Each voice is a short delay line swept by a sine
//! LFO around a 10ms centre, with signed feedback for resonant colour and a
//! fixed internal mix. The right voice runs 90 degrees ahead of the left.

use crate::effects::{sanitize_sample, Effect};
use crate::engine::lfo::Lfo;
use crate::utils::smoother::{SmoothedParam, DEFAULT_SMOOTH_TIME_MS};

/// Centre of the sweep in milliseconds
pub const CENTRE_DELAY_MS: f32 = 10.0;

/// Sweep excursion at full depth in milliseconds
pub const MAX_EXCURSION_MS: f32 = 5.0;

/// Maximum modulation rate in Hz
pub const MAX_RATE_HZ: f32 = 10.0;

/// Feedback magnitude limit
const MAX_FEEDBACK: f32 = 0.95;

struct WarpVoice {
    buffer: Vec<f32>,
    lfo: Lfo,
}

impl WarpVoice {
    fn new(sample_rate: f32, buffer_size: usize, phase: f32) -> Self {
        Self {
            buffer: vec![0.0; buffer_size],
            lfo: Lfo::with_phase(0.5, sample_rate, phase),
        }
    }

    fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.lfo.reset();
    }
}

/// Stereo modulated delay
pub struct Warp {
    sample_rate: f32,
    voices: Vec<WarpVoice>,
    write_index: usize,

    depth_smoothed: SmoothedParam,
    feedback_smoothed: SmoothedParam,
    mix_smoothed: SmoothedParam,
}

impl Warp {
    /// Create a warp stage
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `channels` - One voice is created per channel
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        let max_ms = CENTRE_DELAY_MS + MAX_EXCURSION_MS;
        let buffer_size = (max_ms / 1000.0 * sample_rate).ceil() as usize + 4;

        let voices = (0..channels)
            .map(|ch| WarpVoice::new(sample_rate, buffer_size, 0.25 * ch as f32))
            .collect();

        Self {
            sample_rate,
            voices,
            write_index: 0,
            depth_smoothed: SmoothedParam::new(0.5, 0.0, 1.0, sample_rate, DEFAULT_SMOOTH_TIME_MS),
            feedback_smoothed: SmoothedParam::new(
                0.0,
                -MAX_FEEDBACK,
                MAX_FEEDBACK,
                sample_rate,
                DEFAULT_SMOOTH_TIME_MS,
            ),
            mix_smoothed: SmoothedParam::new(0.5, 0.0, 1.0, sample_rate, DEFAULT_SMOOTH_TIME_MS),
        }
    }

    /// Set LFO rate in Hz (0 to `MAX_RATE_HZ`)
    pub fn set_rate(&mut self, rate_hz: f32) {
        let rate = if rate_hz.is_finite() {
            rate_hz.clamp(0.0, MAX_RATE_HZ)
        } else {
            0.0
        };
        for voice in &mut self.voices {
            voice.lfo.set_frequency(rate);
        }
    }

    /// Set sweep depth (0.0 to 1.0)
    pub fn set_depth(&mut self, depth: f32) {
        self.depth_smoothed.set_target(depth);
    }

    /// Set signed feedback (clamped to ±0.95)
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback_smoothed.set_target(feedback);
    }

    /// Set the internal wet/dry mix (0.0 to 1.0)
    pub fn set_mix(&mut self, mix: f32) {
        self.mix_smoothed.set_target(mix);
    }

    /// Jump all smoothed controls to their targets
    pub fn snap(&mut self) {
        self.depth_smoothed.snap_to_target();
        self.feedback_smoothed.snap_to_target();
        self.mix_smoothed.snap_to_target();
    }
}

impl Effect for Warp {
    fn process(&mut self, channels: &mut [Vec<f32>], num_samples: usize) {
        let Some(buffer_len) = self.voices.first().map(|v| v.buffer.len()) else {
            return;
        };
        let ms_to_samples = self.sample_rate / 1000.0;

        for i in 0..num_samples {
            let depth = self.depth_smoothed.tick();
            let feedback = self.feedback_smoothed.tick();
            let mix = self.mix_smoothed.tick();

            for (channel, voice) in channels.iter_mut().zip(self.voices.iter_mut()) {
                let input = sanitize_sample(channel[i]);

                let sweep_ms = CENTRE_DELAY_MS + MAX_EXCURSION_MS * depth * voice.lfo.tick();
                let delay_samples = (sweep_ms * ms_to_samples).max(1.0);
                let delay_int = delay_samples as usize;
                let delay_frac = delay_samples - delay_int as f32;

                let read_index_1 = (self.write_index + buffer_len - delay_int) % buffer_len;
                let read_index_2 = (self.write_index + buffer_len - delay_int - 1) % buffer_len;
                let delayed = voice.buffer[read_index_1] * (1.0 - delay_frac)
                    + voice.buffer[read_index_2] * delay_frac;

                voice.buffer[self.write_index] = sanitize_sample(input + delayed * feedback);

                channel[i] = input.mul_add(1.0 - mix, delayed * mix);
            }

            self.write_index = (self.write_index + 1) % buffer_len;
        }
    }

    fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.reset();
        }
        self.write_index = 0;
    }
}

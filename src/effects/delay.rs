//! Predelay line
//!
//! One circular buffer per channel sharing a single smoothed delay time.
//! Time changes glide over 50ms; reads use linear interpolation.

use crate::effects::{sanitize_sample, Effect};
use crate::utils::smoother::SmoothedParam;

/// Maximum delay time in seconds
pub const MAX_DELAY_TIME: f32 = 2.5;

/// Smoothing time for delay changes
const TIME_SMOOTH_MS: f32 = 50.0;

/// Variable predelay with interpolated reads
pub struct Predelay {
    sample_rate: f32,
    buffers: Vec<Vec<f32>>,
    write_index: usize,
    /// Delay in samples
    time_smoothed: SmoothedParam,
}

impl Predelay {
    /// Create a new predelay
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `channels` - Number of channels to delay
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        let max_samples = sample_rate * MAX_DELAY_TIME;
        // Allocate buffer for maximum delay time plus the interpolation tap
        let buffer_size = max_samples.ceil() as usize + 2;

        Self {
            sample_rate,
            buffers: vec![vec![0.0; buffer_size]; channels],
            write_index: 0,
            time_smoothed: SmoothedParam::new(0.0, 0.0, max_samples, sample_rate, TIME_SMOOTH_MS),
        }
    }

    /// Set delay time in milliseconds (clamped to `MAX_DELAY_TIME`)
    pub fn set_delay_ms(&mut self, ms: f32) {
        let ms = if ms.is_finite() { ms } else { 0.0 };
        self.time_smoothed.set_target(ms * self.sample_rate / 1000.0);
    }

    /// Jump straight to the target time
    pub fn snap(&mut self) {
        self.time_smoothed.snap_to_target();
    }

    /// Current (smoothed) delay in samples
    pub fn delay_samples(&self) -> f32 {
        self.time_smoothed.get()
    }

    /// Target delay in samples
    pub fn target_samples(&self) -> f32 {
        self.time_smoothed.target()
    }
}

impl Effect for Predelay {
    fn process(&mut self, channels: &mut [Vec<f32>], num_samples: usize) {
        let Some(buffer_len) = self.buffers.first().map(Vec::len) else {
            return;
        };

        for i in 0..num_samples {
            let delay_samples = self.time_smoothed.tick();
            let delay_int = delay_samples as usize;
            let delay_frac = delay_samples - delay_int as f32;

            let read_index_1 = (self.write_index + buffer_len - delay_int) % buffer_len;
            let read_index_2 = (self.write_index + buffer_len - delay_int - 1) % buffer_len;

            for (channel, buffer) in channels.iter_mut().zip(self.buffers.iter_mut()) {
                // Write first so a zero delay passes the input straight through
                buffer[self.write_index] = sanitize_sample(channel[i]);

                let sample_1 = buffer[read_index_1];
                let sample_2 = buffer[read_index_2];
                channel[i] = sample_1 * (1.0 - delay_frac) + sample_2 * delay_frac;
            }

            self.write_index = (self.write_index + 1) % buffer_len;
        }
    }

    fn reset(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        self.write_index = 0;
    }
}

use super::Effect;
use crate::envelope::time_constant_coeff;
use crate::utils::decibels::db_to_gain;

/// Threshold used when the limiter is switched on (dBFS)
pub const LIMITER_ON_THRESHOLD_DB: f32 = -0.1;

/// Threshold used when the limiter is switched off (+40 dB, above any
/// realistic level)
pub const LIMITER_OFF_THRESHOLD_DB: f32 = 40.0;

/// Gain recovery time in seconds
pub const RELEASE_TIME_S: f32 = 0.1;

/// A brick wall limiter that prevents audio signals from exceeding a threshold
///
/// Channel-linked peak detection with instant attack and a one-pole release,
/// followed by a hard clamp at the threshold.
pub struct BrickWallLimiter {
    pub threshold: f32,
    gain: f32,
    release_coeff: f32,
}

impl BrickWallLimiter {
    pub fn new(sample_rate: f32, threshold: f32) -> Self {
        Self {
            threshold,
            gain: 1.0,
            release_coeff: time_constant_coeff(RELEASE_TIME_S, sample_rate),
        }
    }

    /// Switch between the near-0dBFS ceiling and the transparent setting
    pub fn set_enabled(&mut self, enabled: bool) {
        let db = if enabled {
            LIMITER_ON_THRESHOLD_DB
        } else {
            LIMITER_OFF_THRESHOLD_DB
        };
        self.threshold = db_to_gain(db);
    }

    /// Current gain reduction (1.0 = none)
    pub fn gain(&self) -> f32 {
        self.gain
    }
}

impl Effect for BrickWallLimiter {
    fn process(&mut self, channels: &mut [Vec<f32>], num_samples: usize) {
        let threshold = self.threshold;
        for i in 0..num_samples {
            let peak = channels
                .iter()
                .map(|ch| ch[i].abs())
                .fold(0.0_f32, f32::max);

            self.gain += self.release_coeff * (1.0 - self.gain);
            if peak * self.gain > threshold {
                self.gain = threshold / peak;
            }

            for channel in channels.iter_mut() {
                let limited = channel[i] * self.gain;
                channel[i] = if limited.is_finite() {
                    limited.clamp(-threshold, threshold)
                } else {
                    0.0
                };
            }
        }
    }

    fn reset(&mut self) {
        self.gain = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limiter_caps_peaks() {
        let mut limiter = BrickWallLimiter::new(48000.0, 1.0);
        limiter.set_enabled(true);
        let ceiling = db_to_gain(LIMITER_ON_THRESHOLD_DB);
        let mut block = vec![vec![2.0, -3.0, 0.5], vec![0.1, 0.1, 0.1]];
        limiter.process(&mut block, 3);
        for channel in &block {
            assert!(channel.iter().all(|s| s.abs() <= ceiling + 1e-6));
        }
    }

    #[test]
    fn test_limiter_is_linked() {
        let mut limiter = BrickWallLimiter::new(48000.0, 1.0);
        limiter.set_enabled(true);
        let mut block = vec![vec![2.0], vec![0.5]];
        limiter.process(&mut block, 1);
        // both channels get the same reduction
        assert!((block[0][0] / block[1][0] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_below_threshold_is_untouched() {
        let mut limiter = BrickWallLimiter::new(44100.0, 1.0);
        limiter.set_enabled(true);
        let input = vec![0.5, -0.25, 0.9, 0.0];
        let mut block = vec![input.clone()];
        limiter.process(&mut block, 4);
        assert_eq!(block[0], input);
    }

    #[test]
    fn test_release_recovers() {
        let mut limiter = BrickWallLimiter::new(1000.0, 1.0);
        limiter.set_enabled(true);
        let mut block = vec![vec![4.0]];
        limiter.process(&mut block, 1);
        assert!(limiter.gain() < 0.3);

        // one second is ten release time constants
        let mut quiet = vec![vec![0.01; 1000]];
        limiter.process(&mut quiet, 1000);
        assert!(limiter.gain() > 0.99);
    }

    #[test]
    fn test_disabled_is_transparent() {
        let mut limiter = BrickWallLimiter::new(48000.0, 1.0);
        limiter.set_enabled(false);
        let input = vec![1.5, -2.0, 8.0];
        let mut block = vec![input.clone()];
        limiter.process(&mut block, 3);
        assert_eq!(block[0], input);
    }
}

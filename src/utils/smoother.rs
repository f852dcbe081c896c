//! Parameter smoothing for click-free coefficient changes
//!
//! Block-rate targets (room size, wet gains, predelay time) are handed to a
//! `SmoothedParam` once per block and read back once per sample.

use crate::envelope::time_constant_coeff;

/// Default smoothing time in milliseconds
pub const DEFAULT_SMOOTH_TIME_MS: f32 = 10.0;

/// One-pole smoothed value with range constraints
#[derive(Clone, Debug)]
pub struct SmoothedParam {
    /// Current smoothed value
    current: f32,
    /// Target value we're smoothing towards
    target: f32,
    /// Smoothing coefficient (0-1, higher = faster)
    coeff: f32,
    /// Whether we've reached the target
    settled: bool,
    pub min: f32,
    pub max: f32,
}

impl SmoothedParam {
    /// Create a new smoothed parameter
    ///
    /// # Arguments
    /// * `initial_value` - Starting value (clamped to range)
    /// * `min` / `max` - Allowed range
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `smooth_time_ms` - Time constant in milliseconds
    pub fn new(initial_value: f32, min: f32, max: f32, sample_rate: f32, smooth_time_ms: f32) -> Self {
        let clamped = initial_value.clamp(min, max);
        Self {
            current: clamped,
            target: clamped,
            coeff: time_constant_coeff(smooth_time_ms / 1000.0, sample_rate),
            settled: true,
            min,
            max,
        }
    }

    /// Set a new target value (clamped to range)
    pub fn set_target(&mut self, target: f32) {
        let clamped = target.clamp(self.min, self.max);
        if (self.target - clamped).abs() > 1e-8 {
            self.target = clamped;
            self.settled = false;
        }
    }

    /// Jump to the current target
    pub fn snap_to_target(&mut self) {
        self.current = self.target;
        self.settled = true;
    }

    /// Advance one sample and return the smoothed value
    #[inline]
    pub fn tick(&mut self) -> f32 {
        if self.settled {
            return self.current;
        }

        self.current += self.coeff * (self.target - self.current);

        if (self.current - self.target).abs() < 1e-6 {
            self.current = self.target;
            self.settled = true;
        }

        self.current
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

impl Default for SmoothedParam {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 44100.0, DEFAULT_SMOOTH_TIME_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoother_reaches_target() {
        let mut smoother = SmoothedParam::new(0.0, 0.0, 1.0, 44100.0, 10.0);
        smoother.set_target(1.0);

        // 200ms is twenty time constants
        for _ in 0..(44100 / 5) {
            smoother.tick();
        }

        assert!((smoother.get() - 1.0).abs() < 0.001, "Expected ~1.0, got {}", smoother.get());
        assert!(smoother.is_settled());
    }

    #[test]
    fn test_snap_to_target() {
        let mut smoother = SmoothedParam::new(0.0, 0.0, 2500.0, 48000.0, 50.0);
        smoother.set_target(200.0);
        assert!(!smoother.is_settled());

        smoother.snap_to_target();
        assert_eq!(smoother.get(), 200.0);
        assert_eq!(smoother.tick(), 200.0);
    }

    #[test]
    fn test_range_clamping() {
        let mut smoother = SmoothedParam::new(50.0, 20.0, 200.0, 44100.0, 10.0);

        smoother.set_target(300.0);
        assert_eq!(smoother.target(), 200.0);

        smoother.set_target(10.0);
        assert_eq!(smoother.target(), 20.0);
    }

    #[test]
    fn test_zero_time_is_instant() {
        let mut smoother = SmoothedParam::new(0.0, 0.0, 1.0, 44100.0, 0.0);
        smoother.set_target(0.75);
        assert_eq!(smoother.tick(), 0.75);
    }
}

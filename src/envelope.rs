//! One-pole envelope followers with separate attack and release times

/// Threshold for flushing denormal numbers to zero
const DENORMAL_THRESHOLD: f32 = 1e-15;

/// Per-sample coefficient for a one-pole with time constant `time_s`.
///
/// `1 - exp(-1 / (time_s * sample_rate))`. A zero or negative time gives 1.0
/// (instant).
#[inline]
pub fn time_constant_coeff(time_s: f32, sample_rate: f32) -> f32 {
    let samples = time_s * sample_rate;
    if samples <= 0.0 || !samples.is_finite() {
        return 1.0;
    }
    1.0 - (-1.0 / samples).exp()
}

/// Attack/release coefficient pair for one follower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeConfig {
    pub attack_s: f32,
    pub release_s: f32,
}

impl EnvelopeConfig {
    pub const fn new(attack_s: f32, release_s: f32) -> Self {
        Self {
            attack_s,
            release_s,
        }
    }
}

/// Peak follower. The level is owned by the caller and passed in by reference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnvelopeFollower {
    attack_coeff: f32,
    release_coeff: f32,
}

impl EnvelopeFollower {
    pub fn new(config: EnvelopeConfig, sample_rate: f32) -> Self {
        Self {
            attack_coeff: time_constant_coeff(config.attack_s, sample_rate),
            release_coeff: time_constant_coeff(config.release_s, sample_rate),
        }
    }

    /// Move `level` one sample towards `input`.
    #[inline]
    pub fn follow(&self, level: &mut f32, input: f32) {
        let input = if input.is_finite() { input.abs() } else { 0.0 };
        let coeff = if input > *level {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        *level += coeff * (input - *level);
        if *level < DENORMAL_THRESHOLD {
            *level = 0.0;
        }
    }

    /// Release-only decay of `level` towards zero, for callers that set the
    /// attack side themselves (the gate snaps open).
    #[inline]
    pub fn release(&self, level: &mut f32) {
        *level -= self.release_coeff * *level;
        if level.abs() < DENORMAL_THRESHOLD {
            *level = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coeff_matches_time_constant() {
        let coeff = time_constant_coeff(0.01, 48000.0);
        let expected = 1.0 - (-1.0_f32 / 480.0).exp();
        assert!((coeff - expected).abs() < 1e-9);
        assert_eq!(time_constant_coeff(0.0, 48000.0), 1.0);
    }

    #[test]
    fn test_follower_attack_faster_than_release() {
        let follower = EnvelopeFollower::new(EnvelopeConfig::new(0.005, 0.1), 48000.0);
        let mut level = 0.0;
        for _ in 0..1200 {
            follower.follow(&mut level, 1.0);
        }
        // five attack time constants
        assert!(level > 0.99, "level after attack: {level}");

        for _ in 0..240 {
            follower.follow(&mut level, 0.0);
        }
        assert!(level > 0.9, "release should be slow: {level}");
    }

    #[test]
    fn test_follower_ignores_nan() {
        let follower = EnvelopeFollower::new(EnvelopeConfig::new(0.01, 0.1), 44100.0);
        let mut level = 0.5;
        follower.follow(&mut level, f32::NAN);
        assert!(level.is_finite());
        assert!(level < 0.5);
    }

    #[test]
    fn test_release_matches_follow_on_silence() {
        let follower = EnvelopeFollower::new(EnvelopeConfig::new(0.0, 0.1), 48000.0);
        let mut released = 1.0;
        let mut followed = 1.0;
        for _ in 0..4800 {
            follower.release(&mut released);
            follower.follow(&mut followed, 0.0);
        }
        assert_eq!(released, followed);
        // one time constant
        assert!((released - (-1.0_f32).exp()).abs() < 5e-3);
    }

    #[test]
    fn test_level_decays_to_zero() {
        let follower = EnvelopeFollower::new(EnvelopeConfig::new(0.001, 0.001), 44100.0);
        let mut level = 1.0;
        for _ in 0..44100 {
            follower.follow(&mut level, 0.0);
        }
        assert_eq!(level, 0.0);
    }
}

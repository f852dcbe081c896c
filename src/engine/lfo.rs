use std::f32::consts::TAU;

/// Sine low frequency oscillator for the warp voices
#[derive(Clone, Debug)]
pub struct Lfo {
    frequency: f32,
    phase: f32,
    /// Phase the oscillator returns to on reset (0.0 to 1.0)
    start_phase: f32,
    sample_rate: f32,
}

impl Lfo {
    /// Create a new LFO
    /// - frequency: LFO frequency in Hz
    /// - sample_rate: Audio sample rate
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        Self::with_phase(frequency, sample_rate, 0.0)
    }

    /// Create an LFO starting at `phase` (0.0 to 1.0, wrapped)
    pub fn with_phase(frequency: f32, sample_rate: f32, phase: f32) -> Self {
        let start_phase = phase.rem_euclid(1.0);
        Self {
            frequency,
            phase: start_phase,
            start_phase,
            sample_rate,
        }
    }

    /// Set the frequency in Hz
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = if frequency.is_finite() {
            frequency.max(0.0)
        } else {
            0.0
        };
    }

    /// Get the current frequency
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Generate one sample and advance the phase
    /// Returns a value from -1.0 to 1.0 (sine wave)
    #[inline]
    pub fn tick(&mut self) -> f32 {
        let value = (self.phase * TAU).sin();

        self.phase += self.frequency / self.sample_rate;

        // Wrap phase to 0.0-1.0
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        value
    }

    /// Reset the phase to its starting point
    pub fn reset(&mut self) {
        self.phase = self.start_phase;
    }

    /// Get the current phase (0.0 to 1.0)
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfo_range() {
        let mut lfo = Lfo::new(3.0, 1000.0);
        for _ in 0..5000 {
            let v = lfo.tick();
            assert!((-1.0..=1.0).contains(&v));
            assert!((0.0..1.0).contains(&lfo.phase()));
        }
    }

    #[test]
    fn test_quadrature_offset() {
        let mut left = Lfo::new(1.0, 1000.0);
        let mut right = Lfo::with_phase(1.0, 1000.0, 0.25);
        assert!(left.tick().abs() < 1e-6);
        assert!((right.tick() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_reset_returns_to_start_phase() {
        let mut lfo = Lfo::with_phase(2.0, 100.0, 0.25);
        for _ in 0..17 {
            lfo.tick();
        }
        lfo.reset();
        assert_eq!(lfo.phase(), 0.25);
    }
}

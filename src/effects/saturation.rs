//! Input pre-conditioner: drive into tanh, then level compensation
//!
//! Adds harmonic density ahead of the predelay. At zero amount the stage is
//! bypassed and the input passes through bit-exact.

use crate::effects::{sanitize_sample, Effect};

/// Tanh soft clipper with drive compensation
///
/// `out = tanh(in * drive) / drive`, `drive = 1 + amount / 20`.
pub struct Saturation {
    drive: f32,
}

impl Saturation {
    pub fn new() -> Self {
        Self { drive: 1.0 }
    }

    /// Set the saturation amount (0-100)
    pub fn set_amount(&mut self, amount: f32) {
        let amount = if amount.is_finite() {
            amount.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.drive = 1.0 + amount / 20.0;
    }

    pub fn drive(&self) -> f32 {
        self.drive
    }

    pub fn is_bypassed(&self) -> bool {
        self.drive <= 1.0
    }

    #[inline]
    fn shape(&self, input: f32) -> f32 {
        sanitize_sample((input * self.drive).tanh() / self.drive)
    }
}

impl Default for Saturation {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for Saturation {
    fn process(&mut self, channels: &mut [Vec<f32>], num_samples: usize) {
        if self.is_bypassed() {
            return;
        }
        for channel in channels.iter_mut() {
            for sample in channel[..num_samples].iter_mut() {
                *sample = self.shape(*sample);
            }
        }
    }

    fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_amount_is_exact_bypass() {
        let mut sat = Saturation::new();
        sat.set_amount(0.0);
        let original: Vec<f32> = (0..64).map(|i| (i as f32 * 0.37).sin() * 0.9).collect();
        let mut block = vec![original.clone()];
        sat.process(&mut block, 64);
        assert_eq!(block[0], original);
    }

    #[test]
    fn test_drive_mapping() {
        let mut sat = Saturation::new();
        sat.set_amount(100.0);
        assert_eq!(sat.drive(), 6.0);
        sat.set_amount(f32::NAN);
        assert!(sat.is_bypassed());
    }

    #[test]
    fn test_output_is_bounded() {
        let mut sat = Saturation::new();
        sat.set_amount(80.0);
        let drive = sat.drive();
        let mut block = vec![vec![10.0, -10.0, 0.5, f32::INFINITY]];
        sat.process(&mut block, 4);
        for &s in &block[0] {
            assert!(s.is_finite());
            assert!(s.abs() <= 1.0 / drive + 1e-6);
        }
    }

    #[test]
    fn test_small_signal_is_nearly_linear() {
        let mut sat = Saturation::new();
        sat.set_amount(20.0);
        let mut block = vec![vec![0.001]];
        sat.process(&mut block, 1);
        assert!((block[0][0] - 0.001).abs() < 1e-6);
    }
}

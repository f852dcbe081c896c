use std::f32::consts::PI;

/// RBJ Audio EQ Cookbook response shapes used by the tone shaper
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BiquadShape {
    LowShelf { freq: f32, gain_db: f32 },
    Peak { freq: f32, q: f32, gain_db: f32 },
    HighShelf { freq: f32, gain_db: f32 },
    Highpass { freq: f32, q: f32 },
}

/// Shelf slope used for both shelving bands (S = 1)
const SHELF_SLOPE: f32 = 1.0;

/// Normalized biquad coefficients (a0 = 1)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoefficients {
    pub const IDENTITY: BiquadCoefficients = BiquadCoefficients {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design coefficients for `shape` at `sample_rate`.
    ///
    /// Frequencies are clamped to 20 Hz .. 0.95 * Nyquist and Q to 0.1 .. 100.
    pub fn design(shape: BiquadShape, sample_rate: f32) -> Self {
        let nyquist = sample_rate * 0.5;
        let clamp_freq = |f: f32| f.clamp(20.0, nyquist * 0.95);
        let clamp_q = |q: f32| q.clamp(0.1, 100.0);

        let (b0, b1, b2, a0, a1, a2) = match shape {
            BiquadShape::LowShelf { freq, gain_db } => {
                let a = 10.0_f32.powf(gain_db / 40.0);
                let omega0 = 2.0 * PI * clamp_freq(freq) / sample_rate;
                let (sin_w, cos_w) = omega0.sin_cos();
                let alpha = shelf_alpha(sin_w, a);
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w),
                    a * ((a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha),
                    (a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w),
                    (a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha,
                )
            }
            BiquadShape::HighShelf { freq, gain_db } => {
                let a = 10.0_f32.powf(gain_db / 40.0);
                let omega0 = 2.0 * PI * clamp_freq(freq) / sample_rate;
                let (sin_w, cos_w) = omega0.sin_cos();
                let alpha = shelf_alpha(sin_w, a);
                let two_sqrt_a_alpha = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w + two_sqrt_a_alpha),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w),
                    a * ((a + 1.0) + (a - 1.0) * cos_w - two_sqrt_a_alpha),
                    (a + 1.0) - (a - 1.0) * cos_w + two_sqrt_a_alpha,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w),
                    (a + 1.0) - (a - 1.0) * cos_w - two_sqrt_a_alpha,
                )
            }
            BiquadShape::Peak { freq, q, gain_db } => {
                let a = 10.0_f32.powf(gain_db / 40.0);
                let omega0 = 2.0 * PI * clamp_freq(freq) / sample_rate;
                let (sin_w, cos_w) = omega0.sin_cos();
                let alpha = sin_w / (2.0 * clamp_q(q));
                (
                    1.0 + alpha * a,
                    -2.0 * cos_w,
                    1.0 - alpha * a,
                    1.0 + alpha / a,
                    -2.0 * cos_w,
                    1.0 - alpha / a,
                )
            }
            BiquadShape::Highpass { freq, q } => {
                let omega0 = 2.0 * PI * clamp_freq(freq) / sample_rate;
                let (sin_w, cos_w) = omega0.sin_cos();
                let alpha = sin_w / (2.0 * clamp_q(q));
                (
                    (1.0 + cos_w) / 2.0,
                    -(1.0 + cos_w),
                    (1.0 + cos_w) / 2.0,
                    1.0 + alpha,
                    -2.0 * cos_w,
                    1.0 - alpha,
                )
            }
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude response at `freq`, for tests and diagnostics
    pub fn magnitude_at(&self, freq: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * freq / sample_rate;
        let (s1, c1) = w.sin_cos();
        let (s2, c2) = (2.0 * w).sin_cos();
        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);
        ((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im)).sqrt()
    }
}

fn shelf_alpha(sin_w: f32, a: f32) -> f32 {
    sin_w / 2.0 * ((a + 1.0 / a) * (1.0 / SHELF_SLOPE - 1.0) + 2.0).sqrt()
}

/// Direct Form I biquad with one state set per channel
///
/// Coefficients are shared across channels and only redesigned when the
/// shape changes.
#[derive(Clone, Debug)]
pub struct Biquad {
    sample_rate: f32,
    coeffs: BiquadCoefficients,
    shape: Option<BiquadShape>,
    // x1, x2, y1, y2 per channel
    state: Vec<[f32; 4]>,
}

impl Biquad {
    /// Create a pass-through biquad
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `channels` - Number of independent state sets to keep
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        Self {
            sample_rate,
            coeffs: BiquadCoefficients::IDENTITY,
            shape: None,
            state: vec![[0.0; 4]; channels],
        }
    }

    /// Reset filter state (clear delay lines)
    pub fn reset(&mut self) {
        for s in &mut self.state {
            *s = [0.0; 4];
        }
    }

    /// Set the response and recalculate coefficients if it changed
    #[inline]
    pub fn set_shape(&mut self, shape: BiquadShape) {
        if self.shape == Some(shape) {
            return;
        }
        self.shape = Some(shape);
        self.coeffs = BiquadCoefficients::design(shape, self.sample_rate);
    }

    /// Process one sample on `channel`
    ///
    /// Direct Form I: y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
    #[inline]
    pub fn process(&mut self, channel: usize, input: f32) -> f32 {
        let c = self.coeffs;
        let Some(s) = self.state.get_mut(channel) else {
            return input;
        };
        let [x1, x2, y1, y2] = *s;
        let mut output = c.b0 * input + c.b1 * x1 + c.b2 * x2 - c.a1 * y1 - c.a2 * y2;

        if output.abs() < 1e-15 {
            output = 0.0;
        }

        *s = [input, x1, output, y1];
        output
    }

    /// Filter a whole channel buffer in place
    pub fn process_buffer(&mut self, channel: usize, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(channel, *sample);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(g: f32) -> f32 {
        20.0 * g.log10()
    }

    #[test]
    fn test_biquad_reset() {
        let mut filter = Biquad::new(44100.0, 2);
        filter.set_shape(BiquadShape::Highpass { freq: 100.0, q: 0.707 });
        for _ in 0..100 {
            filter.process(0, 1.0);
            filter.process(1, -1.0);
        }
        filter.reset();
        assert!(filter.state.iter().all(|s| *s == [0.0; 4]));
    }

    #[test]
    fn test_low_shelf_gain() {
        let c = BiquadCoefficients::design(
            BiquadShape::LowShelf {
                freq: 200.0,
                gain_db: 6.0,
            },
            48000.0,
        );
        assert!((db(c.magnitude_at(20.0, 48000.0)) - 6.0).abs() < 0.3);
        assert!(db(c.magnitude_at(10000.0, 48000.0)).abs() < 0.1);
    }

    #[test]
    fn test_high_shelf_gain() {
        let c = BiquadCoefficients::design(
            BiquadShape::HighShelf {
                freq: 6000.0,
                gain_db: -12.0,
            },
            48000.0,
        );
        assert!((db(c.magnitude_at(20000.0, 48000.0)) + 12.0).abs() < 0.5);
        assert!(db(c.magnitude_at(100.0, 48000.0)).abs() < 0.1);
    }

    #[test]
    fn test_peak_gain_at_centre() {
        let c = BiquadCoefficients::design(
            BiquadShape::Peak {
                freq: 1000.0,
                q: 0.7,
                gain_db: 4.0,
            },
            44100.0,
        );
        assert!((db(c.magnitude_at(1000.0, 44100.0)) - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::new(48000.0, 1);
        filter.set_shape(BiquadShape::Highpass { freq: 120.0, q: 0.707 });
        let mut out = 1.0;
        for _ in 0..48000 {
            out = filter.process(0, 1.0);
        }
        assert!(out.abs() < 1e-3);
    }

    #[test]
    fn test_channels_are_independent() {
        let mut filter = Biquad::new(48000.0, 2);
        filter.set_shape(BiquadShape::LowShelf {
            freq: 200.0,
            gain_db: 6.0,
        });
        for _ in 0..64 {
            filter.process(0, 1.0);
        }
        // channel 1 has seen no input yet
        assert_eq!(filter.process(1, 0.0), 0.0);
    }
}

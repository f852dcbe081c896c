use std::f32::consts::PI;

/// Minimum Q accepted by the filter
pub const MIN_Q: f32 = 0.1;

/// Band-pass from a TPT (zero-delay feedback) state variable filter
///
/// Simper's trapezoidal SVF, keeping only the band output. Gain at the
/// centre frequency equals Q. Stable under per-block retuning.
#[derive(Clone, Debug)]
pub struct BandpassSvf {
    sample_rate: f32,
    centre_hz: f32,
    q: f32,
    g: f32,
    /// 1 / (1 + g/Q + g²)
    norm: f32,
    s1: f32,
    s2: f32,
}

impl BandpassSvf {
    pub fn new(sample_rate: f32, centre_hz: f32, q: f32) -> Self {
        let mut filter = Self {
            sample_rate,
            centre_hz: 0.0,
            q: 0.0,
            g: 0.0,
            norm: 1.0,
            s1: 0.0,
            s2: 0.0,
        };
        filter.design(centre_hz, q);
        filter
    }

    fn design(&mut self, centre_hz: f32, q: f32) {
        self.centre_hz = centre_hz.clamp(20.0, self.sample_rate * 0.45);
        self.q = q.max(MIN_Q);
        self.g = (PI * self.centre_hz / self.sample_rate).tan();
        self.norm = 1.0 / (1.0 + self.g / self.q + self.g * self.g);
    }

    /// Retune for the next block. No-op when nothing moved.
    pub fn set_params(&mut self, centre_hz: f32, q: f32) {
        let centre = centre_hz.clamp(20.0, self.sample_rate * 0.45);
        let q = q.max(MIN_Q);
        if (centre - self.centre_hz).abs() > 1e-3 || (q - self.q).abs() > 1e-3 {
            self.design(centre, q);
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let band = (self.g * (input - self.s2) + self.s1) * self.norm;
        let low = self.s2 + self.g * band;

        self.s1 = flush(2.0 * band - self.s1);
        self.s2 = flush(2.0 * low - self.s2);
        band
    }

    pub fn reset(&mut self) {
        self.s1 = 0.0;
        self.s2 = 0.0;
    }

    pub fn centre(&self) -> f32 {
        self.centre_hz
    }

    pub fn q(&self) -> f32 {
        self.q
    }
}

#[inline]
fn flush(x: f32) -> f32 {
    if x.abs() < 1e-15 {
        0.0
    } else {
        x
    }
}

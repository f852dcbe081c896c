//! Static tone shaper: optional mode low cut, 3-band EQ, mid/side balance
//!
//! Coefficients are redesigned once per block, only when a gain or the
//! sample rate changes. A band whose gain is exactly 0 dB is skipped; its
//! state is cleared when it becomes active again.

use crate::effects::Effect;
use crate::filters::{Biquad, BiquadShape};

pub const LOW_SHELF_HZ: f32 = 200.0;
pub const MID_PEAK_HZ: f32 = 1000.0;
pub const MID_PEAK_Q: f32 = 0.7;
pub const HIGH_SHELF_HZ: f32 = 6000.0;
pub const LOW_CUT_Q: f32 = 0.707;

/// Neutral mid/side balance position
pub const NEUTRAL_BALANCE: f32 = 50.0;

struct Band {
    filter: Biquad,
    active: bool,
}

impl Band {
    fn new(sample_rate: f32, channels: usize) -> Self {
        Self {
            filter: Biquad::new(sample_rate, channels),
            active: false,
        }
    }

    fn configure(&mut self, shape: Option<BiquadShape>) {
        match shape {
            Some(shape) => {
                if !self.active {
                    self.filter.reset();
                    self.active = true;
                }
                self.filter.set_shape(shape);
            }
            None => self.active = false,
        }
    }
}

/// Mid and side gains for a balance position (0-100)
///
/// Below 50 the side is pulled down and the mid pushed up to 2x at 0;
/// above 50 the mirror image. At 50 both gains are exactly 1.
pub fn ms_gains(balance: f32) -> (f32, f32) {
    let b = balance.clamp(0.0, 100.0);
    if b < NEUTRAL_BALANCE {
        (2.0 - b / 50.0, b / 50.0)
    } else if b > NEUTRAL_BALANCE {
        ((100.0 - b) / 50.0, 1.0 + (b - 50.0) / 50.0)
    } else {
        (1.0, 1.0)
    }
}

/// Tone shaper for the wet signal
pub struct ToneShaper {
    low_cut: Band,
    low: Band,
    mid: Band,
    high: Band,
    mid_gain: f32,
    side_gain: f32,
}

impl ToneShaper {
    /// Create a flat tone shaper
    ///
    /// # Arguments
    /// * `sample_rate` - Audio sample rate in Hz
    /// * `channels` - Number of channels (M/S only runs on stereo)
    pub fn new(sample_rate: f32, channels: usize) -> Self {
        Self {
            low_cut: Band::new(sample_rate, channels),
            low: Band::new(sample_rate, channels),
            mid: Band::new(sample_rate, channels),
            high: Band::new(sample_rate, channels),
            mid_gain: 1.0,
            side_gain: 1.0,
        }
    }

    /// Set the EQ gains in dB
    pub fn set_eq(&mut self, low_db: f32, mid_db: f32, high_db: f32) {
        let gain = |db: f32| (db.is_finite() && db != 0.0).then(|| db.clamp(-24.0, 24.0));

        self.low.configure(gain(low_db).map(|gain_db| BiquadShape::LowShelf {
            freq: LOW_SHELF_HZ,
            gain_db,
        }));
        self.mid.configure(gain(mid_db).map(|gain_db| BiquadShape::Peak {
            freq: MID_PEAK_HZ,
            q: MID_PEAK_Q,
            gain_db,
        }));
        self.high.configure(gain(high_db).map(|gain_db| BiquadShape::HighShelf {
            freq: HIGH_SHELF_HZ,
            gain_db,
        }));
    }

    /// Enable or disable the extra high-pass a mode may carry
    pub fn set_low_cut(&mut self, freq: Option<f32>) {
        self.low_cut.configure(
            freq.filter(|f| f.is_finite() && *f > 0.0)
                .map(|freq| BiquadShape::Highpass { freq, q: LOW_CUT_Q }),
        );
    }

    /// Set the mid/side balance (0-100, 50 = neutral)
    pub fn set_ms_balance(&mut self, balance: f32) {
        let balance = if balance.is_finite() { balance } else { NEUTRAL_BALANCE };
        (self.mid_gain, self.side_gain) = ms_gains(balance);
    }

    /// True when every band is skipped and M/S is neutral
    pub fn is_flat(&self) -> bool {
        !self.low_cut.active
            && !self.low.active
            && !self.mid.active
            && !self.high.active
            && self.mid_gain == 1.0
            && self.side_gain == 1.0
    }
}

impl Effect for ToneShaper {
    fn process(&mut self, channels: &mut [Vec<f32>], num_samples: usize) {
        for band in [&mut self.low_cut, &mut self.low, &mut self.mid, &mut self.high] {
            if !band.active {
                continue;
            }
            for (ch, buffer) in channels.iter_mut().enumerate() {
                band.filter.process_buffer(ch, &mut buffer[..num_samples]);
            }
        }

        if self.mid_gain == 1.0 && self.side_gain == 1.0 {
            return;
        }
        if let [left, right, ..] = channels {
            for (l, r) in left[..num_samples].iter_mut().zip(right[..num_samples].iter_mut()) {
                let mid = (*l + *r) * 0.5 * self.mid_gain;
                let side = (*l - *r) * 0.5 * self.side_gain;
                *l = mid + side;
                *r = mid - side;
            }
        }
    }

    fn reset(&mut self) {
        for band in [&mut self.low_cut, &mut self.low, &mut self.mid, &mut self.high] {
            band.filter.reset();
        }
    }
}

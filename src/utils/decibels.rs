//! dB <-> linear gain conversion

/// Floor added to a linear level before taking its logarithm
pub const GAIN_FLOOR: f32 = 1e-5;

/// Anything at or below this is treated as silence
pub const MINUS_INFINITY_DB: f32 = -100.0;

/// Convert decibels to linear gain. Values at or below `MINUS_INFINITY_DB` map to 0.
#[inline]
pub fn db_to_gain(db: f32) -> f32 {
    if db > MINUS_INFINITY_DB {
        10.0_f32.powf(db * 0.05)
    } else {
        0.0
    }
}

/// Convert linear gain to decibels, clamped at `MINUS_INFINITY_DB`.
///
/// The level is floored with `GAIN_FLOOR` so zero input never yields `-inf`.
#[inline]
pub fn gain_to_db(gain: f32) -> f32 {
    let level = gain.abs() + GAIN_FLOOR;
    (20.0 * level.log10()).max(MINUS_INFINITY_DB)
}

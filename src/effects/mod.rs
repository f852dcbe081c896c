pub mod delay;
pub mod limiter;
pub mod reverb;
pub mod saturation;
pub mod tone;
pub mod warp;

pub use self::delay::Predelay;
pub use self::limiter::BrickWallLimiter;
pub use self::reverb::ReverbCore;
pub use self::saturation::Saturation;
pub use self::tone::ToneShaper;
pub use self::warp::Warp;

/// Threshold for flushing denormal numbers to zero
pub(crate) const DENORMAL_THRESHOLD: f32 = 1e-15;

/// Flush denormals and non-finite values to zero
#[inline]
pub(crate) fn sanitize_sample(x: f32) -> f32 {
    if x.is_finite() && x.abs() >= DENORMAL_THRESHOLD {
        x
    } else {
        0.0
    }
}

/// Trait that every stage of the wet chain implements
///
/// `channels` holds one buffer per channel; only the first `num_samples`
/// of each are processed. Coefficients are set through each stage's own
/// block-rate setters before `process` is called.
pub trait Effect: Send {
    /// Process a block in place
    fn process(&mut self, channels: &mut [Vec<f32>], num_samples: usize);

    /// Clear all internal memory (delay lines, filter state, envelopes)
    fn reset(&mut self);
}

pub mod biquad;
pub mod state_variable_tpt;

pub use self::biquad::{Biquad, BiquadCoefficients, BiquadShape};
pub use self::state_variable_tpt::BandpassSvf;

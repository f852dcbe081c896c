//! Utility modules for audio processing

pub mod decibels;
pub mod logging;
pub mod smoother;

pub use decibels::{db_to_gain, gain_to_db};
pub use logging::init_logger;
pub use smoother::{SmoothedParam, DEFAULT_SMOOTH_TIME_MS};

//! The three signal-extraction stages: profile, baseline, pulse

pub mod baseline;
pub mod profiler;
pub mod pulse;

// Re-export for easier access
pub use baseline::{estimate_baselines, leading_baseline, linear_baseline};
pub use profiler::{rolling_average, slice_photo};
pub use pulse::{find_pulse, measure_profile, pulse_height, std_dev_pulsefinding};

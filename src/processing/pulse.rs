//! Hysteresis pulse finding on baseline-subtracted profiles

use crate::error::{IceError, Result};
use crate::types::config::DetectionConfig;
use crate::types::record::{IceMeasurement, PulseBounds};
use ndarray::{ArrayView1, s};

/// Locate the first pulse of a baseline-subtracted profile.
///
/// The pulse starts at the first sample of
/// `[trigger_sample - search_window, trigger_sample + search_window)` (clipped to the
/// profile) strictly above `rising_thresh * std_dev`, and ends at the first later sample
/// strictly below `falling_thresh * std_dev`, searched to the end of the profile. When the
/// profile never falls back, `end` is the last sample and `falling_edge_found` is false.
///
/// A window with no rising crossing is reported as [`IceError::NoPulseFound`].
pub fn std_dev_pulsefinding(
    profile: ArrayView1<f64>,
    std_dev: f64,
    trigger_sample: usize,
    search_window: usize,
    rising_thresh: f64,
    falling_thresh: f64,
) -> Result<PulseBounds> {
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(IceError::InvalidStdDev(std_dev));
    }

    let len = profile.len();
    let window_start = trigger_sample.saturating_sub(search_window);
    let window_end = (trigger_sample + search_window).min(len);
    if window_start >= window_end {
        return Err(IceError::InvalidSearchWindow {
            start: trigger_sample as i64 - search_window as i64,
            end: (trigger_sample + search_window) as i64,
            len,
        });
    }

    let rising = rising_thresh * std_dev;
    let start = profile
        .slice(s![window_start..window_end])
        .iter()
        .position(|&v| v > rising)
        .map(|offset| window_start + offset)
        .ok_or(IceError::NoPulseFound {
            window_start,
            window_end,
            threshold: rising,
        })?;
    if start + 1 >= len {
        return Err(IceError::DegeneratePulse { start, len });
    }

    let falling = falling_thresh * std_dev;
    let bounds = match profile
        .slice(s![start + 1..])
        .iter()
        .position(|&v| v < falling)
    {
        Some(offset) => PulseBounds {
            start,
            end: start + 1 + offset,
            falling_edge_found: true,
        },
        None => PulseBounds {
            start,
            end: len - 1,
            falling_edge_found: false,
        },
    };
    Ok(bounds)
}

/// [`std_dev_pulsefinding`] with settings taken from a [`DetectionConfig`].
pub fn find_pulse(
    profile: ArrayView1<f64>,
    std_dev: f64,
    config: &DetectionConfig,
) -> Result<PulseBounds> {
    std_dev_pulsefinding(
        profile,
        std_dev,
        config.trigger_sample,
        config.search_window,
        config.rising_thresh,
        config.falling_thresh,
    )
}

/// Highest baseline-subtracted value over `[start, end)`.
pub fn pulse_height(profile: ArrayView1<f64>, bounds: &PulseBounds) -> f64 {
    profile
        .slice(s![bounds.start..bounds.end])
        .iter()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Find the pulse and package it as a validated measurement.
pub fn measure_profile(
    profile: ArrayView1<f64>,
    std_dev: f64,
    config: &DetectionConfig,
) -> Result<IceMeasurement> {
    let bounds = find_pulse(profile, std_dev, config)?;
    IceMeasurement::builder()
        .ice_start(bounds.start)
        .ice_end(bounds.end)
        .pulse_height(pulse_height(profile, &bounds))
        .extends_to_end(!bounds.falling_edge_found)
        .profile_len(profile.len())
        .build()
}

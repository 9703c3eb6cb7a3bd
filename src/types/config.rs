//! Explicit configuration for every pipeline stage

use crate::error::{IceError, Result};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::path::Path;

/// Geometry of the diagonal cuts averaged into one profile.
///
/// `slice_start_x` is the row (first array index) and `slice_start_y` the column of the
/// first pixel of the first slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct SliceGeometry {
    #[builder(default = 200)]
    pub num_slices: usize,
    #[builder(default = 450)]
    pub slice_length: usize,
    #[builder(default = 950)]
    pub slice_start_x: usize,
    #[builder(default = 2150)]
    pub slice_start_y: usize,
}

impl Default for SliceGeometry {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Leading region of a profile assumed free of signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct BaselineWindow {
    #[builder(default = 300)]
    pub trigger_sample: usize,
    #[builder(default = 0)]
    pub start_sample: usize,
    #[builder(default = 100)]
    pub pretrigger_excl_samples: usize,
    /// Fit a straight line instead of a constant level.
    #[builder(default = false)]
    pub linear: bool,
}

impl Default for BaselineWindow {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BaselineWindow {
    /// Raw `[start, end)` bounds, which may be negative or inverted for bad settings.
    pub fn bounds(&self) -> (i64, i64) {
        (
            self.start_sample as i64,
            self.trigger_sample as i64 - self.pretrigger_excl_samples as i64,
        )
    }

    /// Index range of the window inside a profile of `len` samples.
    pub fn range(&self, len: usize) -> Result<Range<usize>> {
        let (start, end) = self.bounds();
        if start >= end || end > len as i64 {
            return Err(IceError::InvalidBaselineWindow { start, end, len });
        }
        Ok(start as usize..end as usize)
    }
}

/// Hysteresis thresholds and the search window for the rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct DetectionConfig {
    #[builder(default = 300)]
    pub trigger_sample: usize,
    #[builder(default = 60)]
    pub search_window: usize,
    /// Multiples of the baseline standard deviation.
    #[builder(default = 5.0)]
    pub rising_thresh: f64,
    #[builder(default = 3.0)]
    pub falling_thresh: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DetectionConfig {
    /// Thresholds used when measuring ice photos (3σ up, 1σ down).
    pub fn ice_photos() -> Self {
        Self::builder().rising_thresh(3.0).falling_thresh(1.0).build()
    }
}

fn default_detection() -> DetectionConfig {
    DetectionConfig::ice_photos()
}

/// Full configuration of a measurement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
pub struct PipelineConfig {
    #[builder(default)]
    pub geometry: SliceGeometry,
    #[builder(default)]
    pub baseline: BaselineWindow,
    #[builder(default = DetectionConfig::ice_photos())]
    #[serde(default = "default_detection")]
    pub detection: DetectionConfig,
    /// Smooth profiles with a rolling average of this half width before baseline estimation.
    pub smoothing_half_window: Option<usize>,
    /// Character offset of the capture timestamp inside a photo file name.
    #[builder(default = 0)]
    pub timestamp_offset: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl PipelineConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that every stage's settings fit the profile length before any photo is read.
    pub fn validate(&self) -> Result<()> {
        let len = self.geometry.slice_length;
        if self.geometry.num_slices == 0 || len == 0 {
            return Err(IceError::InvalidGeometry(format!(
                "num_slices ({}) and slice_length ({}) must be positive",
                self.geometry.num_slices, len
            )));
        }

        let window = self.baseline.range(len)?;
        if self.baseline.linear && window.len() < 2 {
            return Err(IceError::SingularFit {
                samples: window.len(),
            });
        }

        let detection = &self.detection;
        let search_start = detection.trigger_sample as i64 - detection.search_window as i64;
        let search_end = (detection.trigger_sample + detection.search_window) as i64;
        if search_start.max(0) >= search_end.min(len as i64) {
            return Err(IceError::InvalidSearchWindow {
                start: search_start,
                end: search_end,
                len,
            });
        }
        if !detection.rising_thresh.is_finite() || !detection.falling_thresh.is_finite() {
            return Err(IceError::InvalidGeometry(format!(
                "thresholds must be finite (rising {}, falling {})",
                detection.rising_thresh, detection.falling_thresh
            )));
        }
        if detection.falling_thresh > detection.rising_thresh {
            log::warn!(
                "falling threshold {} is above rising threshold {}; hysteresis is inverted",
                detection.falling_thresh,
                detection.rising_thresh
            );
        }

        if let Some(half_window) = self.smoothing_half_window {
            if 2 * half_window + 1 > len {
                return Err(IceError::InvalidSmoothingWindow { half_window, len });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_ice_measurement_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.geometry.num_slices, 200);
        assert_eq!(config.geometry.slice_length, 450);
        assert_eq!(config.geometry.slice_start_x, 950);
        assert_eq!(config.geometry.slice_start_y, 2150);
        assert_eq!(config.baseline.range(450).unwrap(), 0..200);
        assert!(!config.baseline.linear);
        assert_eq!(config.detection.search_window, 60);
        assert_eq!(config.detection.rising_thresh, 3.0);
        assert_eq!(config.detection.falling_thresh, 1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_detection_defaults_are_generic() {
        let detection = DetectionConfig::default();
        assert_eq!(detection.rising_thresh, 5.0);
        assert_eq!(detection.falling_thresh, 3.0);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{ "geometry": { "num_slices": 4 }, "smoothing_half_window": 2 }"#,
        )
        .unwrap();
        assert_eq!(config.geometry.num_slices, 4);
        assert_eq!(config.geometry.slice_length, 450);
        assert_eq!(config.detection, DetectionConfig::ice_photos());
        assert_eq!(config.smoothing_half_window, Some(2));
    }

    #[test]
    fn test_baseline_window_rejects_empty_and_out_of_range() {
        let empty = BaselineWindow::builder()
            .trigger_sample(100)
            .start_sample(50)
            .pretrigger_excl_samples(50)
            .build();
        assert!(matches!(
            empty.range(450),
            Err(IceError::InvalidBaselineWindow { start: 50, end: 50, .. })
        ));

        let too_long = BaselineWindow::builder()
            .trigger_sample(500)
            .pretrigger_excl_samples(0)
            .build();
        assert!(matches!(
            too_long.range(450),
            Err(IceError::InvalidBaselineWindow { end: 500, .. })
        ));

        let negative = BaselineWindow::builder()
            .trigger_sample(10)
            .pretrigger_excl_samples(20)
            .build();
        assert!(matches!(
            negative.range(450),
            Err(IceError::InvalidBaselineWindow { end: -10, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_search_window_past_profile() {
        let config = PipelineConfig::builder()
            .geometry(SliceGeometry::builder().slice_length(100).build())
            .baseline(BaselineWindow::builder().trigger_sample(50).pretrigger_excl_samples(10).build())
            .detection(DetectionConfig::builder().trigger_sample(400).search_window(20).build())
            .build();
        assert!(matches!(
            config.validate(),
            Err(IceError::InvalidSearchWindow { start: 380, end: 420, len: 100 })
        ));
    }

    #[test]
    fn test_validate_rejects_single_sample_linear_window() {
        let config = PipelineConfig::builder()
            .baseline(
                BaselineWindow::builder()
                    .trigger_sample(11)
                    .start_sample(10)
                    .pretrigger_excl_samples(0)
                    .linear(true)
                    .build(),
            )
            .build();
        assert!(matches!(
            config.validate(),
            Err(IceError::SingularFit { samples: 1 })
        ));
    }
}

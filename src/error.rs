//! Error taxonomy for the ice-ring pipeline

use polars::prelude::PolarsError;
use thiserror::Error;

/// Every way a photo, a profile or a whole run can fail.
///
/// Per-photo variants (geometry, window, fit, pulse) are carried into the result table as
/// failure markers; the remaining variants abort a run.
#[derive(Debug, Error)]
pub enum IceError {
    #[error(
        "slice geometry reaches pixel (row {row}, col {col}) outside a {height}x{width} image"
    )]
    GeometryOutOfBounds {
        row: i64,
        col: i64,
        height: usize,
        width: usize,
    },

    #[error("invalid slice geometry: {0}")]
    InvalidGeometry(String),

    #[error("baseline window [{start}, {end}) is empty or outside a profile of length {len}")]
    InvalidBaselineWindow { start: i64, end: i64, len: usize },

    #[error("linear baseline fit is singular over {samples} sample(s)")]
    SingularFit { samples: usize },

    #[error("no sample in [{window_start}, {window_end}) exceeds the rising threshold {threshold}")]
    NoPulseFound {
        window_start: usize,
        window_end: usize,
        threshold: f64,
    },

    #[error("search window [{start}, {end}) does not overlap a profile of length {len}")]
    InvalidSearchWindow { start: i64, end: i64, len: usize },

    #[error("half window {half_window} leaves no full window in a profile of length {len}")]
    InvalidSmoothingWindow { half_window: usize, len: usize },

    #[error("baseline standard deviation must be finite and non-negative, got {0}")]
    InvalidStdDev(f64),

    #[error("pulse starts at the last sample ({start}) of a profile of length {len}")]
    DegeneratePulse { start: usize, len: usize },

    #[error("pulse bounds start={start} end={end} are invalid for a profile of length {len}")]
    InvalidPulseBounds { start: usize, end: usize, len: usize },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("cannot read timestamp from '{file_name}': {reason}")]
    Timestamp { file_name: String, reason: String },

    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("table error: {0}")]
    Polars(#[from] PolarsError),
}

impl IceError {
    /// Stable label written to the `status` column of the result table.
    pub fn kind(&self) -> &'static str {
        match self {
            IceError::GeometryOutOfBounds { .. } => "geometry_out_of_bounds",
            IceError::InvalidGeometry(_) => "invalid_geometry",
            IceError::InvalidBaselineWindow { .. } => "invalid_baseline_window",
            IceError::SingularFit { .. } => "singular_fit",
            IceError::NoPulseFound { .. } => "no_pulse_found",
            IceError::InvalidSearchWindow { .. } => "invalid_search_window",
            IceError::InvalidSmoothingWindow { .. } => "invalid_smoothing_window",
            IceError::InvalidStdDev(_) => "invalid_std_dev",
            IceError::DegeneratePulse { .. } => "degenerate_pulse",
            IceError::InvalidPulseBounds { .. } => "invalid_pulse_bounds",
            IceError::ShapeMismatch(_) => "shape_mismatch",
            IceError::Timestamp { .. } => "timestamp",
            IceError::Image(_) => "image_decode",
            IceError::Io(_) => "io",
            IceError::Config(_) => "config",
            IceError::Polars(_) => "table",
        }
    }
}

pub type Result<T, E = IceError> = std::result::Result<T, E>;

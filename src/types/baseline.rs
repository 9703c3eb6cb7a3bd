//! Per-profile noise baseline

use crate::error::{IceError, Result};
use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

/// Noise level of one profile, estimated from its leading window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Baseline {
    /// Flat background: mean and population standard deviation of the window.
    Constant { mean: f64, std_dev: f64 },
    /// Drifting background: least-squares line over the window, extended across the
    /// whole profile, and the standard deviation of the residual inside the window.
    Linear {
        slope: f64,
        intercept: f64,
        line: Array1<f64>,
        std_dev: f64,
    },
}

impl Baseline {
    pub fn std_dev(&self) -> f64 {
        match self {
            Baseline::Constant { std_dev, .. } | Baseline::Linear { std_dev, .. } => *std_dev,
        }
    }

    /// Remove the background from a profile, sample by sample for a linear baseline.
    pub fn subtract(&self, profile: ArrayView1<f64>) -> Result<Array1<f64>> {
        match self {
            Baseline::Constant { mean, .. } => Ok(profile.mapv(|v| v - mean)),
            Baseline::Linear { line, .. } => {
                if line.len() != profile.len() {
                    return Err(IceError::ShapeMismatch(format!(
                        "linear baseline has {} samples, profile has {}",
                        line.len(),
                        profile.len()
                    )));
                }
                Ok(&profile - line)
            }
        }
    }
}

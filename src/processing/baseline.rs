//! Baseline and noise estimation from the signal-free leading region of each profile

use crate::error::{IceError, Result};
use crate::types::baseline::Baseline;
use crate::types::config::BaselineWindow;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, s};

fn window(trigger_sample: usize, start_sample: usize, pretrigger_excl_samples: usize) -> BaselineWindow {
    BaselineWindow::builder()
        .trigger_sample(trigger_sample)
        .start_sample(start_sample)
        .pretrigger_excl_samples(pretrigger_excl_samples)
        .build()
}

/// Mean and population standard deviation of every profile over
/// `[start_sample, trigger_sample - pretrigger_excl_samples)`.
pub fn leading_baseline(
    batch: ArrayView2<f64>,
    trigger_sample: usize,
    start_sample: usize,
    pretrigger_excl_samples: usize,
) -> Result<(Array1<f64>, Array1<f64>)> {
    let range = window(trigger_sample, start_sample, pretrigger_excl_samples).range(batch.ncols())?;
    let leading = batch.slice(s![.., range.clone()]);
    let means = leading
        .mean_axis(Axis(1))
        .ok_or(IceError::InvalidBaselineWindow {
            start: range.start as i64,
            end: range.end as i64,
            len: batch.ncols(),
        })?;
    let stds = leading.std_axis(Axis(1), 0.0);
    Ok((means, stds))
}

/// Least-squares line through each profile's leading window, extended over the full
/// profile, with the standard deviation of the in-window residual.
///
/// Returns the per-sample baseline array (one row per profile) and the residual spreads.
pub fn linear_baseline(
    batch: ArrayView2<f64>,
    trigger_sample: usize,
    start_sample: usize,
    pretrigger_excl_samples: usize,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let range = window(trigger_sample, start_sample, pretrigger_excl_samples).range(batch.ncols())?;
    let mut lines = Array2::<f64>::zeros(batch.raw_dim());
    let mut stds = Array1::<f64>::zeros(batch.nrows());
    for (k, profile) in batch.rows().into_iter().enumerate() {
        if let Baseline::Linear { line, std_dev, .. } = fit_linear(profile, range.clone())? {
            lines.row_mut(k).assign(&line);
            stds[k] = std_dev;
        }
    }
    Ok((lines, stds))
}

/// One [`Baseline`] per profile, constant or linear as the window asks.
pub fn estimate_baselines(batch: ArrayView2<f64>, window: &BaselineWindow) -> Result<Vec<Baseline>> {
    let range = window.range(batch.ncols())?;
    if window.linear {
        batch
            .rows()
            .into_iter()
            .map(|profile| fit_linear(profile, range.clone()))
            .collect()
    } else {
        let (means, stds) = leading_baseline(
            batch,
            window.trigger_sample,
            window.start_sample,
            window.pretrigger_excl_samples,
        )?;
        Ok(means
            .iter()
            .zip(stds.iter())
            .map(|(&mean, &std_dev)| Baseline::Constant { mean, std_dev })
            .collect())
    }
}

fn fit_linear(profile: ArrayView1<f64>, range: std::ops::Range<usize>) -> Result<Baseline> {
    let (slope, intercept) = fit_line(range.start, profile.slice(s![range.clone()]))?;

    let line = Array1::from_shape_fn(profile.len(), |i| slope * i as f64 + intercept);
    let residual = &profile.slice(s![range.clone()]) - &line.slice(s![range]);
    let std_dev = residual.std(0.0);

    Ok(Baseline::Linear {
        slope,
        intercept,
        line,
        std_dev,
    })
}

/// Ordinary least squares for `y[i]` sampled at `x = first_x + i`.
fn fit_line(first_x: usize, ys: ArrayView1<f64>) -> Result<(f64, f64)> {
    let n = ys.len();
    if n < 2 {
        return Err(IceError::SingularFit { samples: n });
    }
    let xs = Array1::from_shape_fn(n, |i| (first_x + i) as f64);
    let x_mean = xs.sum() / n as f64;
    let y_mean = ys.sum() / n as f64;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        sxx += (x - x_mean) * (x - x_mean);
        sxy += (x - x_mean) * (y - y_mean);
    }
    if !(sxx > 0.0) || !sxy.is_finite() {
        return Err(IceError::SingularFit { samples: n });
    }

    let slope = sxy / sxx;
    Ok((slope, y_mean - slope * x_mean))
}

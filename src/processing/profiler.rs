//! Reduce a photo to a 1-D brightness profile across the ice ring

use crate::error::{IceError, Result};
use crate::types::config::SliceGeometry;
use crate::utils::misc::{Coordinate, slice_extent, slice_pixel};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, Zip, s};

impl SliceGeometry {
    /// Check that every pixel addressed by this geometry lies inside a `height` x `width`
    /// image.
    pub fn validate_for(&self, height: usize, width: usize) -> Result<()> {
        if self.num_slices == 0 || self.slice_length == 0 {
            return Err(IceError::InvalidGeometry(format!(
                "num_slices ({}) and slice_length ({}) must be positive",
                self.num_slices, self.slice_length
            )));
        }

        // Each extreme is reached by one sampled pixel; report that pixel.
        let (last_slice, last_sample) = (self.num_slices - 1, self.slice_length - 1);
        let (top_left, bottom_right) = slice_extent(self);
        let out_of_bounds = |pixel: Coordinate| IceError::GeometryOutOfBounds {
            row: pixel.row,
            col: pixel.col,
            height,
            width,
        };
        if top_left.row < 0 {
            return Err(out_of_bounds(slice_pixel(self, last_slice, 0)));
        }
        if bottom_right.row >= height as i64 {
            return Err(out_of_bounds(slice_pixel(self, 0, last_sample)));
        }
        if bottom_right.col >= width as i64 {
            return Err(out_of_bounds(slice_pixel(self, last_slice, last_sample)));
        }
        Ok(())
    }
}

/// Average `num_slices` parallel diagonal cuts through `image` into one profile.
///
/// Sample `j` of slice `i` reads pixel
/// `(slice_start_x + j - (i + 1) / 2, slice_start_y + i / 2 + j)`; the profile value at `j`
/// is the mean over all slices. The geometry is checked against the image before any pixel
/// is read.
pub fn slice_photo(image: ArrayView2<f64>, geometry: &SliceGeometry) -> Result<Array1<f64>> {
    let (height, width) = image.dim();
    geometry.validate_for(height, width)?;

    let mut profile = Array1::<f64>::zeros(geometry.slice_length);
    for slice in 0..geometry.num_slices {
        let row0 = geometry.slice_start_x - (slice + 1) / 2;
        let col0 = geometry.slice_start_y + slice / 2;
        for (j, acc) in profile.iter_mut().enumerate() {
            *acc += image[[row0 + j, col0 + j]];
        }
    }
    profile /= geometry.num_slices as f64;
    Ok(profile)
}

/// Smooth every profile of a batch with a centred moving average of `2 * half_window + 1`
/// samples.
///
/// Samples closer than `half_window` to either end take the first or last full-window
/// average. A zero half window returns the batch unchanged.
pub fn rolling_average(profiles: ArrayView2<f64>, half_window: usize) -> Result<Array2<f64>> {
    if half_window == 0 {
        return Ok(profiles.to_owned());
    }
    let len = profiles.ncols();
    let width = 2 * half_window + 1;
    if width > len {
        return Err(IceError::InvalidSmoothingWindow { half_window, len });
    }

    let mut smoothed = Array2::<f64>::zeros(profiles.raw_dim());
    let rows = Zip::from(smoothed.rows_mut()).and(profiles.rows());
    #[cfg(feature = "parallel")]
    rows.par_for_each(|out, profile| smooth_row(profile, out, half_window));
    #[cfg(not(feature = "parallel"))]
    rows.for_each(|out, profile| smooth_row(profile, out, half_window));
    Ok(smoothed)
}

fn smooth_row(profile: ArrayView1<f64>, mut out: ArrayViewMut1<f64>, half_window: usize) {
    let width = 2 * half_window + 1;
    let mut cumsum = Vec::with_capacity(profile.len() + 1);
    cumsum.push(0.0);
    let mut running = 0.0;
    for &v in profile {
        running += v;
        cumsum.push(running);
    }

    let averages: Vec<f64> = cumsum
        .windows(width + 1)
        .map(|w| (w[width] - w[0]) / width as f64)
        .collect();
    let (first, last) = (averages[0], averages[averages.len() - 1]);

    let len = out.len();
    out.slice_mut(s![..half_window]).fill(first);
    out.slice_mut(s![len - half_window..]).fill(last);
    out.slice_mut(s![half_window..len - half_window])
        .iter_mut()
        .zip(&averages)
        .for_each(|(o, &a)| *o = a);
}

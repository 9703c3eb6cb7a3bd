use crate::error::{IceError, Result};
use crate::parser::timestamp_from_file_name;
use crate::processing::{estimate_baselines, measure_profile, rolling_average, slice_photo};
use crate::types::{Outcome, PhotoRecord, PipelineConfig, ResultTable};
use crate::utils::file_utils::{list_photos, load_grayscale};
use chrono::NaiveDateTime;
use itertools::Itertools;
use log::{debug, info, warn};
use ndarray::{Array1, Array2};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// A directory of ice photos with the settings used to measure them
pub struct PhotoSeries {
    dir: PathBuf,
    config: PipelineConfig,
    photos: Vec<PathBuf>,
}

/// Profile extracted from one photo, or the reason it could not be
struct Extracted {
    file_name: String,
    timestamp: Option<NaiveDateTime>,
    profile: Result<Array1<f64>>,
}

impl PhotoSeries {
    /// Validate `config` and enumerate the photos in `dir`
    pub fn open(dir: impl AsRef<Path>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let dir = dir.as_ref().to_path_buf();
        let photos = list_photos(&dir)?;
        info!("{}: {} photos", dir.display(), photos.len());
        Ok(Self { dir, config, photos })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Photo paths in measurement order
    pub fn photos(&self) -> &[PathBuf] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Get a summary of the series and its settings
    pub fn get_summary(&self) -> String {
        let geometry = &self.config.geometry;
        let detection = &self.config.detection;
        let mut result = String::new();
        result.push_str(&format!("Photo series: {}\n", self.dir.display()));
        result.push_str(&format!("  Photos: {}\n", self.photos.len()));
        if let (Some(first), Some(last)) = (self.photos.first(), self.photos.last()) {
            result.push_str(&format!(
                "  Range: {} .. {}\n",
                first.file_name().unwrap_or_default().to_string_lossy(),
                last.file_name().unwrap_or_default().to_string_lossy()
            ));
        }
        result.push_str(&format!(
            "  Slices: {} x {} samples from ({}, {})\n",
            geometry.num_slices, geometry.slice_length, geometry.slice_start_x, geometry.slice_start_y
        ));
        result.push_str(&format!(
            "  Detection: trigger {} +/- {}, rising {} sigma, falling {} sigma\n",
            detection.trigger_sample,
            detection.search_window,
            detection.rising_thresh,
            detection.falling_thresh
        ));
        result
    }

    /// Measure every photo.
    ///
    /// Each photo is decoded, sliced and dropped before the next batch stage, so only the
    /// profiles stay resident. Per-photo failures are recorded in the table; only batch-wide
    /// problems (an unusable baseline window) fail the run.
    pub fn measure(&self) -> Result<ResultTable> {
        let extract = |path: &PathBuf| self.extract(path);

        #[cfg(feature = "parallel")]
        let extracted: Vec<Extracted> = self.photos.par_iter().map(extract).collect();
        #[cfg(not(feature = "parallel"))]
        let extracted: Vec<Extracted> = self.photos.iter().map(extract).collect();

        measure_extracted(extracted, &self.config)
    }

    fn extract(&self, path: &Path) -> Extracted {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match timestamp_from_file_name(&file_name, self.config.timestamp_offset) {
            Ok(timestamp) => {
                let profile = load_grayscale(path)
                    .and_then(|image| slice_photo(image.view(), &self.config.geometry));
                if profile.is_ok() {
                    debug!("{file_name}: profile extracted");
                }
                Extracted {
                    file_name,
                    timestamp: Some(timestamp),
                    profile,
                }
            }
            Err(e) => Extracted {
                file_name,
                timestamp: None,
                profile: Err(e),
            },
        }
    }
}

/// Run the pipeline over photos already decoded to grayscale `[row, col]` arrays.
///
/// Rows are named `image_0000`, `image_0001`, ... in input order. `timestamps` must have one
/// entry per image.
pub fn measure_images(
    images: &[Array2<f64>],
    timestamps: &[Option<NaiveDateTime>],
    config: &PipelineConfig,
) -> Result<ResultTable> {
    if images.len() != timestamps.len() {
        return Err(IceError::ShapeMismatch(format!(
            "{} images but {} timestamps",
            images.len(),
            timestamps.len()
        )));
    }
    config.validate()?;

    let extract = |(i, (image, timestamp)): (usize, (&Array2<f64>, &Option<NaiveDateTime>))| Extracted {
        file_name: format!("image_{i:04}"),
        timestamp: *timestamp,
        profile: slice_photo(image.view(), &config.geometry),
    };

    #[cfg(feature = "parallel")]
    let extracted: Vec<Extracted> = images
        .par_iter()
        .zip(timestamps.par_iter())
        .enumerate()
        .map(extract)
        .collect();
    #[cfg(not(feature = "parallel"))]
    let extracted: Vec<Extracted> = images
        .iter()
        .zip(timestamps.iter())
        .enumerate()
        .map(extract)
        .collect();

    measure_extracted(extracted, config)
}

fn measure_extracted(extracted: Vec<Extracted>, config: &PipelineConfig) -> Result<ResultTable> {
    let profiles: Vec<&Array1<f64>> = extracted
        .iter()
        .filter_map(|item| item.profile.as_ref().ok())
        .collect();

    let measured = if profiles.is_empty() {
        Vec::new()
    } else {
        let mut batch = Array2::<f64>::zeros((profiles.len(), config.geometry.slice_length));
        for (mut row, profile) in batch.rows_mut().into_iter().zip(profiles.iter().copied()) {
            row.assign(profile);
        }
        if let Some(half_window) = config.smoothing_half_window {
            batch = rolling_average(batch.view(), half_window)?;
        }

        let baselines = estimate_baselines(batch.view(), &config.baseline)?;
        batch
            .rows()
            .into_iter()
            .zip(&baselines)
            .map(|(profile, baseline)| {
                let subtracted = baseline.subtract(profile)?;
                measure_profile(subtracted.view(), baseline.std_dev(), &config.detection)
            })
            .map(Outcome::from)
            .collect()
    };

    let mut measured = measured.into_iter();
    let records = extracted
        .into_iter()
        .map(|item| {
            let outcome = match item.profile {
                Ok(_) => measured.next().unwrap_or_else(|| {
                    Outcome::failed(&IceError::ShapeMismatch("profile without a result".into()))
                }),
                Err(e) => Outcome::failed(&e),
            };
            match &outcome {
                Outcome::Measured(m) => debug!(
                    "{}: ice {}..{} (height {:.2})",
                    item.file_name, m.ice_start(), m.ice_end(), m.pulse_height()
                ),
                Outcome::Failed { message, .. } => warn!("{}: {}", item.file_name, message),
            }
            PhotoRecord {
                file_name: item.file_name,
                timestamp: item.timestamp,
                outcome,
            }
        })
        .collect_vec();

    let table = ResultTable::new(records);
    let failures = table
        .records
        .iter()
        .filter_map(|r| match &r.outcome {
            Outcome::Failed { kind, .. } => Some(kind.as_str()),
            Outcome::Measured(_) => None,
        })
        .counts();
    info!(
        "measured {} of {} photos{}",
        table.len() - failures.values().sum::<usize>(),
        table.len(),
        failures
            .iter()
            .sorted()
            .map(|(kind, n)| format!(", {n} {kind}"))
            .join("")
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BaselineWindow, DetectionConfig, SliceGeometry};

    fn small_config() -> PipelineConfig {
        PipelineConfig::builder()
            .geometry(
                SliceGeometry::builder()
                    .num_slices(2)
                    .slice_length(40)
                    .slice_start_x(1)
                    .slice_start_y(0)
                    .build(),
            )
            .baseline(
                BaselineWindow::builder()
                    .trigger_sample(20)
                    .pretrigger_excl_samples(5)
                    .build(),
            )
            .detection(
                DetectionConfig::builder()
                    .trigger_sample(20)
                    .search_window(10)
                    .rising_thresh(3.0)
                    .falling_thresh(1.0)
                    .build(),
            )
            .build()
    }

    /// Image whose slices read a plateau over samples `from..=to`
    fn image_with_band(from: usize, to: usize) -> Array2<f64> {
        // slice i sample j reads (x + j - (i+1)/2, y + i/2 + j); x = 1, y = 0, two slices
        Array2::from_shape_fn((64, 64), |(r, c)| {
            let sample = c;
            let on_diagonal = r == c + 1 || r == c;
            if on_diagonal && (from..=to).contains(&sample) { 200.0 } else { 10.0 + (c % 2) as f64 }
        })
    }

    #[test]
    fn test_measure_images_keeps_order_and_failures() {
        let config = small_config();
        let images = vec![
            image_with_band(15, 25),
            Array2::<f64>::zeros((4, 4)),
            image_with_band(18, 29),
        ];
        let timestamps = vec![None; 3];
        let table = measure_images(&images, &timestamps, &config).unwrap();

        assert_eq!(table.len(), 3);
        let names: Vec<&str> = table.records.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, ["image_0000", "image_0001", "image_0002"]);

        let first = table.records[0].outcome.measurement().unwrap();
        assert_eq!((first.ice_start(), first.ice_end()), (15, 26));
        assert_eq!(table.records[1].outcome.status(), "geometry_out_of_bounds");
        let third = table.records[2].outcome.measurement().unwrap();
        assert_eq!((third.ice_start(), third.ice_end()), (18, 30));
    }

    #[test]
    fn test_measure_images_rejects_mismatched_timestamps() {
        let images = vec![image_with_band(15, 25)];
        assert!(matches!(
            measure_images(&images, &[], &small_config()),
            Err(IceError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_all_failed_batch_still_yields_rows() {
        let images = vec![Array2::<f64>::zeros((3, 3)); 2];
        let table = measure_images(&images, &[None, None], &small_config()).unwrap();
        assert_eq!(table.failures().count(), 2);
    }
}

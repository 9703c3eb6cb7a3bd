pub mod error;
pub mod parser;
pub mod photo_series;
pub mod processing;
pub mod types;
pub mod utils;

pub use error::{IceError, Result};
pub use photo_series::{PhotoSeries, measure_images};
pub use types::{
    Baseline, BaselineWindow, DetectionConfig, IceMeasurement, Outcome, PhotoRecord,
    PipelineConfig, PulseBounds, ResultTable, SliceGeometry,
};

#[cfg(feature = "python")]
mod python {
    use crate::error::IceError;
    use crate::photo_series::PhotoSeries;
    use crate::processing::std_dev_pulsefinding;
    use crate::types::PipelineConfig;
    use crate::utils::to_dataframe;
    use ndarray::Array1;
    use pyo3::{
        Bound, PyErr, PyResult, pyfunction, pymodule, types::PyModule, types::PyModuleMethods,
        wrap_pyfunction,
    };
    use pyo3_polars::PyDataFrame;
    use std::path::PathBuf;

    // --- Error Conversion for PyO3 ---
    impl From<IceError> for PyErr {
        fn from(err: IceError) -> PyErr {
            match &err {
                IceError::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                    pyo3::exceptions::PyFileNotFoundError::new_err(err.to_string())
                }
                _ => pyo3::exceptions::PyValueError::new_err(err.to_string()),
            }
        }
    }

    /// Measures every photo in a directory and returns one row per photo.
    ///
    /// Args:
    ///     path (str): Directory holding the photos.
    ///     config_json (str | None): Pipeline settings as JSON; defaults when omitted.
    ///
    /// Returns:
    ///     polars.DataFrame: file_name, datetime, ice_start, ice_end, pulse_height,
    ///     extends_to_end, status and error columns.
    ///
    /// Raises:
    ///     FileNotFoundError: If the directory does not exist.
    ///     ValueError: If the settings are inconsistent or the baseline cannot be estimated.
    #[pyfunction]
    #[pyo3(signature = (path, config_json = None))]
    fn measure_photo_directory(path: PathBuf, config_json: Option<&str>) -> PyResult<PyDataFrame> {
        let config = match config_json {
            Some(text) => PipelineConfig::from_json_str(text)?,
            None => PipelineConfig::default(),
        };
        let series = PhotoSeries::open(&path, config)?;
        let table = series.measure()?;
        let df = to_dataframe(&table).map_err(IceError::from)?;
        Ok(PyDataFrame(df))
    }

    /// Finds the first pulse of a baseline-subtracted profile and returns `(start, end)`.
    #[pyfunction]
    #[pyo3(signature = (profile, std_dev, trigger_sample, search_window, rising_thresh = 5.0, falling_thresh = 3.0))]
    fn find_pulse(
        profile: Vec<f64>,
        std_dev: f64,
        trigger_sample: usize,
        search_window: usize,
        rising_thresh: f64,
        falling_thresh: f64,
    ) -> PyResult<(usize, usize)> {
        let profile = Array1::from(profile);
        let bounds = std_dev_pulsefinding(
            profile.view(),
            std_dev,
            trigger_sample,
            search_window,
            rising_thresh,
            falling_thresh,
        )?;
        Ok((bounds.start, bounds.end))
    }

    /// A Python module implemented in Rust. The name of this function must match
    /// the `lib.name` setting in the `pyproject.toml`, else Python will not be able to
    /// import the module.
    #[pymodule]
    fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(measure_photo_directory, m)?)?;
        m.add_function(wrap_pyfunction!(find_pulse, m)?)?;
        Ok(())
    }
}

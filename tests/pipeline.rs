use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime};
use icering::utils::{TableFormat, write_table};
use icering::{
    BaselineWindow, DetectionConfig, PhotoSeries, PipelineConfig, SliceGeometry, measure_images,
};
use image::{GrayImage, Luma};
use ndarray::Array2;
use polars::prelude::*;
use std::error::Error;
use std::path::Path;

const SIZE: u32 = 64;
/// Mean of the alternating 10 / 11 background over samples [0, 15)
const BACKGROUND_MEAN: f64 = 157.0 / 15.0;

fn config() -> PipelineConfig {
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

/// Photo whose two diagonal slices read `level` over samples `from..=to` on a 10 / 11
/// striped background.
fn photo(from: u32, to: u32, level: u8) -> GrayImage {
    GrayImage::from_fn(SIZE, SIZE, |x, y| {
        let on_slice = y == x || y == x + 1;
        if on_slice && (from..=to).contains(&x) {
            Luma([level])
        } else {
            Luma([10 + (x % 2) as u8])
        }
    })
}

fn to_array(img: &GrayImage) -> Array2<f64> {
    Array2::from_shape_fn((img.height() as usize, img.width() as usize), |(r, c)| {
        img.get_pixel(c as u32, r as u32).0[0] as f64
    })
}

fn at(hour: u32, minute: u32, second: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2019, 3, 12).and_then(|d| d.and_hms_opt(hour, minute, second))
}

fn write_series(dir: &Path) -> Result<(), Box<dyn Error>> {
    photo(15, 25, 200).save(dir.join("2019-03-12_140000.png"))?;
    photo(18, 29, 150).save(dir.join("2019-03-12_141500.png"))?;
    std::fs::write(dir.join("2019-03-12_150000.jpg"), b"not a photo")?;
    photo(15, 25, 200).save(dir.join("notes.png"))?;
    std::fs::write(dir.join("readme.txt"), b"ignored")?;
    Ok(())
}

#[test]
fn test_directory_run_measures_and_records_failures() -> Result<(), Box<dyn Error>> {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir()?;
    write_series(dir.path())?;

    let series = PhotoSeries::open(dir.path(), config())?;
    assert_eq!(series.len(), 4);
    let table = series.measure()?;

    let names: Vec<&str> = table.records.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(
        names,
        [
            "2019-03-12_140000.png",
            "2019-03-12_141500.png",
            "2019-03-12_150000.jpg",
            "notes.png"
        ]
    );

    let first = table.records[0].outcome.measurement().ok_or("first photo failed")?;
    assert_eq!((first.ice_start(), first.ice_end()), (15, 26));
    assert!(!first.extends_to_end());
    assert_relative_eq!(first.pulse_height(), 200.0 - BACKGROUND_MEAN, epsilon = 1e-9);
    assert_eq!(table.records[0].timestamp, at(14, 0, 0));

    let second = table.records[1].outcome.measurement().ok_or("second photo failed")?;
    assert_eq!((second.ice_start(), second.ice_end()), (18, 30));
    assert_relative_eq!(second.pulse_height(), 150.0 - BACKGROUND_MEAN, epsilon = 1e-9);

    assert_eq!(table.records[2].outcome.status(), "image_decode");
    assert_eq!(table.records[2].timestamp, at(15, 0, 0));
    assert_eq!(table.records[3].outcome.status(), "timestamp");
    assert_eq!(table.records[3].timestamp, None);
    assert_eq!(table.failures().count(), 2);
    Ok(())
}

#[test]
fn test_in_memory_run_matches_directory_run() -> Result<(), Box<dyn Error>> {
    let images = vec![
        to_array(&photo(15, 25, 200)),
        to_array(&photo(18, 29, 150)),
        Array2::zeros((8, 8)),
    ];
    let timestamps = vec![at(14, 0, 0), at(14, 15, 0), None];
    let table = measure_images(&images, &timestamps, &config())?;

    assert_eq!(table.len(), 3);
    let bounds: Vec<Option<(usize, usize)>> = table
        .records
        .iter()
        .map(|r| r.outcome.measurement().map(|m| (m.ice_start(), m.ice_end())))
        .collect();
    assert_eq!(bounds, [Some((15, 26)), Some((18, 30)), None]);
    assert_eq!(table.records[2].outcome.status(), "geometry_out_of_bounds");
    Ok(())
}

#[test]
fn test_three_photos_reproduce_hand_computed_pulses() -> Result<(), Box<dyn Error>> {
    // (band, level) -> (start, end, height); each band ends on an odd sample, so the next
    // (even, background 10) sample is the falling edge
    let cases = [
        ((15, 25, 200u8), (15, 26, 200.0 - BACKGROUND_MEAN)),
        ((18, 29, 150), (18, 30, 150.0 - BACKGROUND_MEAN)),
        ((22, 27, 90), (22, 28, 90.0 - BACKGROUND_MEAN)),
    ];
    let images: Vec<Array2<f64>> = cases
        .iter()
        .map(|&((from, to, level), _)| to_array(&photo(from, to, level)))
        .collect();
    let timestamps = vec![at(14, 0, 0), at(14, 15, 0), at(14, 30, 0)];
    let table = measure_images(&images, &timestamps, &config())?;

    assert_eq!(table.len(), 3);
    assert_eq!(table.failures().count(), 0);
    for (record, &(_, (start, end, height))) in table.records.iter().zip(&cases) {
        let m = record.outcome.measurement().ok_or("photo failed")?;
        assert_eq!((m.ice_start(), m.ice_end()), (start, end));
        assert!(!m.extends_to_end());
        assert_relative_eq!(m.pulse_height(), height, epsilon = 1e-9);
    }
    Ok(())
}

#[test]
fn test_smoothing_widens_pulse_by_one_sample() -> Result<(), Box<dyn Error>> {
    let mut config = config();
    config.smoothing_half_window = Some(1);
    let table = measure_images(&[to_array(&photo(15, 25, 200))], &[None], &config)?;

    let m = table.records[0].outcome.measurement().ok_or("photo failed")?;
    assert_eq!((m.ice_start(), m.ice_end()), (14, 27));
    assert_relative_eq!(m.pulse_height(), 200.0 - 472.0 / 45.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_sort_by_time_reorders_rows() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    photo(15, 25, 200).save(dir.path().join("camA_2019-03-12_150000.png"))?;
    photo(15, 25, 200).save(dir.path().join("camB_2019-03-12_140000.png"))?;

    let mut config = config();
    config.timestamp_offset = 5;
    let mut table = PhotoSeries::open(dir.path(), config)?.measure()?;
    assert_eq!(table.records[0].file_name, "camA_2019-03-12_150000.png");

    table.sort_by_timestamp();
    assert_eq!(table.records[0].file_name, "camB_2019-03-12_140000.png");
    assert_eq!(table.records[0].timestamp, at(14, 0, 0));
    assert_eq!(table.measured().count(), 2);
    Ok(())
}

#[test]
fn test_parquet_output_has_one_row_per_photo() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    write_series(dir.path())?;
    let table = PhotoSeries::open(dir.path(), config())?.measure()?;

    let out = dir.path().join("out.parquet");
    write_table(&table, &out, TableFormat::Parquet)?;
    let df = ParquetReader::new(std::fs::File::open(&out)?).finish()?;

    assert_eq!(df.height(), 4);
    let ends = df.column("ice_end")?.u32()?;
    assert_eq!(ends.get(0), Some(26));
    assert_eq!(ends.get(2), None);
    let errors = df.column("error")?.str()?;
    assert_eq!(errors.get(0), None);
    assert!(errors.get(3).is_some());
    Ok(())
}

#[test]
fn test_bad_config_fails_before_reading_photos() {
    let mut config = config();
    config.detection.trigger_sample = 500;
    let dir = tempfile::tempdir().unwrap();
    assert!(PhotoSeries::open(dir.path(), config).is_err());
}

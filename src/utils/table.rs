use crate::error::Result;
use crate::types::record::{Outcome, ResultTable};
use polars::prelude::*;
use polars_io::prelude::ParquetWriter;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// On-disk formats for the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    #[default]
    Parquet,
    Json,
}

/// Create a DataFrame with one row per photo.
///
/// Failed photos keep their row: measurement columns are null and `status` / `error` name
/// the failure.
pub fn to_dataframe(table: &ResultTable) -> PolarsResult<DataFrame> {
    let records = &table.records;

    let file_names: Vec<String> = records.iter().map(|r| r.file_name.clone()).collect();
    let millis: Vec<Option<i64>> = records
        .iter()
        .map(|r| r.timestamp.map(|t| t.and_utc().timestamp_millis()))
        .collect();
    let starts: Vec<Option<u32>> = records
        .iter()
        .map(|r| r.outcome.measurement().map(|m| m.ice_start() as u32))
        .collect();
    let ends: Vec<Option<u32>> = records
        .iter()
        .map(|r| r.outcome.measurement().map(|m| m.ice_end() as u32))
        .collect();
    let heights: Vec<Option<f64>> = records
        .iter()
        .map(|r| r.outcome.measurement().map(|m| m.pulse_height()))
        .collect();
    let to_end: Vec<Option<bool>> = records
        .iter()
        .map(|r| r.outcome.measurement().map(|m| m.extends_to_end()))
        .collect();
    let statuses: Vec<String> = records.iter().map(|r| r.outcome.status().to_string()).collect();
    let errors: Vec<Option<String>> = records
        .iter()
        .map(|r| match &r.outcome {
            Outcome::Measured(_) => None,
            Outcome::Failed { message, .. } => Some(message.clone()),
        })
        .collect();

    let datetime = Series::new("datetime".into(), &millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    DataFrame::new(vec![
        Series::new("file_name".into(), &file_names).into(),
        datetime.into(),
        Series::new("ice_start".into(), &starts).into(),
        Series::new("ice_end".into(), &ends).into(),
        Series::new("pulse_height".into(), &heights).into(),
        Series::new("extends_to_end".into(), &to_end).into(),
        Series::new("status".into(), &statuses).into(),
        Series::new("error".into(), &errors).into(),
    ])
}

/// Persist the result table.
pub fn write_table(table: &ResultTable, path: impl AsRef<Path>, format: TableFormat) -> Result<()> {
    let file = File::create(path)?;
    match format {
        TableFormat::Parquet => {
            let mut df = to_dataframe(table)?;
            let mut writer = BufWriter::new(file);
            ParquetWriter::new(&mut writer).finish(&mut df)?;
        }
        TableFormat::Json => {
            serde_json::to_writer_pretty(BufWriter::new(file), &table.records)?;
        }
    }
    Ok(())
}

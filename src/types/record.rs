//! Per-photo results

use crate::error::{IceError, Result};
use bon::bon;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Start and end of the first pulse in a baseline-subtracted profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PulseBounds {
    pub start: usize,
    pub end: usize,
    /// False when the profile never fell below the falling threshold and `end` is the
    /// last sample.
    pub falling_edge_found: bool,
}

/// Ice boundaries measured on one photo.
///
/// Only built through [`IceMeasurement::builder`] or deserialization, both of which reject
/// `ice_start >= ice_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MeasurementFields")]
pub struct IceMeasurement {
    ice_start: usize,
    ice_end: usize,
    pulse_height: f64,
    extends_to_end: bool,
}

#[derive(Deserialize)]
struct MeasurementFields {
    ice_start: usize,
    ice_end: usize,
    pulse_height: f64,
    extends_to_end: bool,
}

impl TryFrom<MeasurementFields> for IceMeasurement {
    type Error = IceError;

    fn try_from(fields: MeasurementFields) -> Result<Self> {
        // the profile length is not stored, so only the ordering can be checked here
        if fields.ice_start >= fields.ice_end {
            return Err(IceError::InvalidPulseBounds {
                start: fields.ice_start,
                end: fields.ice_end,
                len: fields.ice_end,
            });
        }
        Ok(Self {
            ice_start: fields.ice_start,
            ice_end: fields.ice_end,
            pulse_height: fields.pulse_height,
            extends_to_end: fields.extends_to_end,
        })
    }
}

#[bon]
impl IceMeasurement {
    #[builder]
    pub fn new(
        ice_start: usize,
        ice_end: usize,
        pulse_height: f64,
        #[builder(default = false)] extends_to_end: bool,
        profile_len: usize,
    ) -> Result<Self> {
        if ice_start >= ice_end || ice_end >= profile_len {
            return Err(IceError::InvalidPulseBounds {
                start: ice_start,
                end: ice_end,
                len: profile_len,
            });
        }
        Ok(Self {
            ice_start,
            ice_end,
            pulse_height,
            extends_to_end,
        })
    }

    /// First sample of the ice band.
    pub fn ice_start(&self) -> usize {
        self.ice_start
    }

    /// Falling-edge sample, or the last sample when the band runs off the profile.
    pub fn ice_end(&self) -> usize {
        self.ice_end
    }

    /// Highest baseline-subtracted value over `[ice_start, ice_end)`.
    pub fn pulse_height(&self) -> f64 {
        self.pulse_height
    }

    pub fn extends_to_end(&self) -> bool {
        self.extends_to_end
    }
}

/// What happened to one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Measured(IceMeasurement),
    Failed { kind: String, message: String },
}

impl Outcome {
    pub fn failed(err: &IceError) -> Self {
        Outcome::Failed {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }

    pub fn measurement(&self) -> Option<&IceMeasurement> {
        match self {
            Outcome::Measured(m) => Some(m),
            Outcome::Failed { .. } => None,
        }
    }

    /// `"ok"` or the failure kind.
    pub fn status(&self) -> &str {
        match self {
            Outcome::Measured(_) => "ok",
            Outcome::Failed { kind, .. } => kind,
        }
    }
}

impl From<Result<IceMeasurement>> for Outcome {
    fn from(result: Result<IceMeasurement>) -> Self {
        match result {
            Ok(m) => Outcome::Measured(m),
            Err(e) => Outcome::failed(&e),
        }
    }
}

/// One row of the result table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    pub file_name: String,
    pub timestamp: Option<NaiveDateTime>,
    pub outcome: Outcome,
}

/// All rows of a run, one per input photo, in input order unless re-sorted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub records: Vec<PhotoRecord>,
}

impl ResultTable {
    pub fn new(records: Vec<PhotoRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn measured(&self) -> impl Iterator<Item = (&PhotoRecord, &IceMeasurement)> + '_ {
        self.records
            .iter()
            .filter_map(|r| r.outcome.measurement().map(|m| (r, m)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &PhotoRecord> + '_ {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed { .. }))
    }

    /// Stable sort by capture time; rows without a timestamp go last.
    pub fn sort_by_timestamp(&mut self) {
        self.records
            .sort_by_key(|r| (r.timestamp.is_none(), r.timestamp));
    }
}

//! Type definitions for profiles, baselines, configuration and results

pub mod baseline;
pub mod config;
pub mod record;

// Re-export the main types for convenience
pub use baseline::Baseline;
pub use config::{BaselineWindow, DetectionConfig, PipelineConfig, SliceGeometry};
pub use record::{IceMeasurement, Outcome, PhotoRecord, PulseBounds, ResultTable};

//! Batch pole detection and measurement for survey photographs.
//!
//! This crate provides tools for:
//! - Enumerating and decoding a directory of photographs
//! - Locating a red survey pole and its top and bottom endpoints
//! - Gating raw detections into table rows with pole length
//! - Writing annotated images and a CSV results table, with progress output
//!
//! # Example
//!
//! ```no_run
//! use pole_survey::{BatchAggregator, ConsoleReporter, RedPoleDetector, SurveyConfig};
//!
//! let config = SurveyConfig::default();
//! let detector = RedPoleDetector::new(config.detection.clone());
//! let aggregator = BatchAggregator::new(&config, &detector, &ConsoleReporter);
//! let files = aggregator.enumerate().unwrap();
//! let report = aggregator.measure(&files).unwrap();
//! println!("{} rows", report.table.len());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod detection;
pub mod processors;

pub use config::{AnnotateConfig, BatchConfig, DetectionConfig, PathsConfig, PointsConfig, SurveyConfig};
pub use crate::core::types::{DetectionResult, MeasurementRecord, Point};
pub use detection::{PoleDetector, RedPoleDetector};
pub use processors::{BatchAggregator, ConsoleReporter, ResultTable, RunReporter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Core data types and I/O operations.

pub mod loaders;
pub mod transforms;
pub mod types;
pub mod writers;

pub use loaders::{list_images, load_image, LoaderError};
pub use types::{DetectionResult, GatedPoint, MeasurementRecord, Point};
pub use writers::{save_image, write_results_csv, WriteError};

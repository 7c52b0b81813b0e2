//! Configuration types for the pole survey pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in '{path}': {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Input locations shared by both batch jobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for input photographs
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data/samples/")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
        }
    }
}

/// Output settings for the annotated-image job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotateConfig {
    /// Directory receiving annotated images
    #[serde(default = "default_annotate_save_path")]
    pub save_path: PathBuf,

    /// Prefix prepended to every output file name
    #[serde(default)]
    pub save_prefix: String,

    /// Extension (and encoder) used for annotated images
    #[serde(default = "default_image_extension")]
    pub image_extension: String,
}

fn default_annotate_save_path() -> PathBuf {
    PathBuf::from("output/samples/images/")
}

fn default_image_extension() -> String {
    "jpg".to_string()
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            save_path: default_annotate_save_path(),
            save_prefix: String::new(),
            image_extension: default_image_extension(),
        }
    }
}

/// Output settings for the point-measurement job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsConfig {
    /// Directory receiving the results table
    #[serde(default = "default_points_save_path")]
    pub save_path: PathBuf,

    /// Prefix prepended to the results file name
    #[serde(default = "default_points_save_prefix")]
    pub save_prefix: String,

    /// Base name of the results table
    #[serde(default = "default_results_name")]
    pub results_name: String,
}

fn default_points_save_path() -> PathBuf {
    PathBuf::from("output/samples/")
}

fn default_points_save_prefix() -> String {
    "get_points_".to_string()
}

fn default_results_name() -> String {
    "results.csv".to_string()
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            save_path: default_points_save_path(),
            save_prefix: default_points_save_prefix(),
            results_name: default_results_name(),
        }
    }
}

impl PointsConfig {
    /// Full path of the results table.
    pub fn results_path(&self) -> PathBuf {
        self.save_path
            .join(format!("{}{}", self.save_prefix, self.results_name))
    }
}

/// Batch execution policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// File extensions picked up by the enumerator, matched case-sensitively
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Abort the whole run on the first file that cannot be decoded
    #[serde(default)]
    pub fail_fast: bool,

    /// Worker threads; 1 keeps the run strictly sequential
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Append an `error` column to the results table
    #[serde(default)]
    pub error_column: bool,
}

fn default_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "JPG".to_string()]
}

fn default_jobs() -> usize {
    1
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            fail_fast: false,
            jobs: default_jobs(),
            error_column: false,
        }
    }
}

/// Tuning knobs for the red pole detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Horizontal sweep step in pixels
    #[serde(default = "default_sweep_step")]
    pub sweep_step: u32,

    /// Vertical sweep step in pixels
    #[serde(default = "default_sweep_step_vertical")]
    pub sweep_step_vertical: u32,

    /// Narrowest accepted pole, in pixels
    #[serde(default = "default_min_pole_width")]
    pub min_pole_width: i32,

    /// Largest accepted difference between two width readings, as a fraction of their sum
    #[serde(default = "default_width_tolerance")]
    pub width_tolerance: f32,

    /// RGB contrast treated as an edge while crawling along the pole
    #[serde(default = "default_contrast")]
    pub contrast: f32,

    /// Hue (degrees) above which a pixel counts as red
    #[serde(default = "default_hue_pink")]
    pub hue_pink: f32,

    /// Hue (degrees) below which a pixel counts as red
    #[serde(default = "default_hue_orange")]
    pub hue_orange: f32,

    /// Wider lower hue bound used when deciding whether to climb past the red band
    #[serde(default = "default_hue_orange_top")]
    pub hue_orange_top: f32,

    #[serde(default = "default_saturation_min")]
    pub saturation_min: f32,

    #[serde(default = "default_saturation_max")]
    pub saturation_max: f32,

    /// Minimum side contrast while looking for the pole ends
    #[serde(default = "default_side_contrast")]
    pub side_contrast: f32,

    /// Contrast that marks the bottom end
    #[serde(default = "default_bottom_contrast")]
    pub bottom_contrast: f32,

    /// Contrast that marks the top end
    #[serde(default = "default_top_contrast")]
    pub top_contrast: f32,

    /// Thickness of the cross markers drawn on annotated images
    #[serde(default = "default_marker_thickness")]
    pub marker_thickness: i32,

    /// Arm length of the cross markers drawn on annotated images
    #[serde(default = "default_marker_size")]
    pub marker_size: i32,
}

fn default_sweep_step() -> u32 {
    5
}

fn default_sweep_step_vertical() -> u32 {
    50
}

fn default_min_pole_width() -> i32 {
    20
}

fn default_width_tolerance() -> f32 {
    0.25
}

fn default_contrast() -> f32 {
    0.9
}

fn default_hue_pink() -> f32 {
    300.0
}

fn default_hue_orange() -> f32 {
    30.0
}

fn default_hue_orange_top() -> f32 {
    80.0
}

fn default_saturation_min() -> f32 {
    0.02
}

fn default_saturation_max() -> f32 {
    0.98
}

fn default_side_contrast() -> f32 {
    0.1
}

fn default_bottom_contrast() -> f32 {
    1.2
}

fn default_top_contrast() -> f32 {
    0.6
}

fn default_marker_thickness() -> i32 {
    5
}

fn default_marker_size() -> i32 {
    40
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sweep_step: default_sweep_step(),
            sweep_step_vertical: default_sweep_step_vertical(),
            min_pole_width: default_min_pole_width(),
            width_tolerance: default_width_tolerance(),
            contrast: default_contrast(),
            hue_pink: default_hue_pink(),
            hue_orange: default_hue_orange(),
            hue_orange_top: default_hue_orange_top(),
            saturation_min: default_saturation_min(),
            saturation_max: default_saturation_max(),
            side_contrast: default_side_contrast(),
            bottom_contrast: default_bottom_contrast(),
            top_contrast: default_top_contrast(),
            marker_thickness: default_marker_thickness(),
            marker_size: default_marker_size(),
        }
    }
}

/// Main survey configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub annotate: AnnotateConfig,

    #[serde(default)]
    pub points: PointsConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub detection: DetectionConfig,
}

impl SurveyConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

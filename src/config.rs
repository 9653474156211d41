use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::warn;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub fit: FitConfig,
}

/// Frame source capping policy.
#[derive(Debug, Deserialize, Clone)]
pub struct VideoConfig {
    /// Width every decoded frame is resized to
    #[serde(default = "default_target_size")]
    pub target_width: usize,
    /// Height every decoded frame is resized to
    #[serde(default = "default_target_size")]
    pub target_height: usize,
    /// Longest stretch of the clip that is analysed (seconds)
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: f64,
    /// Frames above this rate are decimated
    #[serde(default = "default_max_fps")]
    pub max_fps: f64,
    /// Take the window from the middle of the clip instead of its start
    #[serde(default = "default_true")]
    pub centered_window: bool,
}

fn default_target_size() -> usize { 256 }
fn default_max_duration_secs() -> f64 { 10.0 }
fn default_max_fps() -> f64 { 30.0 }
fn default_true() -> bool { true }

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            target_width: default_target_size(),
            target_height: default_target_size(),
            max_duration_secs: default_max_duration_secs(),
            max_fps: default_max_fps(),
            centered_window: default_true(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// ONNX model path (MoveNet singlepose)
    #[serde(default = "default_model_path")]
    pub path: String,
    /// Square input resolution (192 = Lightning, 256 = Thunder)
    #[serde(default = "default_input_size")]
    pub input_size: usize,
    #[serde(default = "default_input_name")]
    pub input_name: String,
    #[serde(default = "default_output_name")]
    pub output_name: String,
}

fn default_model_path() -> String { "models/movenet_thunder.onnx".to_string() }
fn default_input_size() -> usize { 256 }
fn default_input_name() -> String { "serving_default_input_0".to_string() }
fn default_output_name() -> String { "StatefulPartitionedCall_0".to_string() }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            input_size: default_input_size(),
            input_name: default_input_name(),
            output_name: default_output_name(),
        }
    }
}

/// Crop region tracking between consecutive frames.
#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// false: every frame is inferred on the full-frame square
    #[serde(default = "default_true")]
    pub adaptive: bool,
    /// Keypoints at or below this score are ignored for cropping
    #[serde(default = "default_min_keypoint_score")]
    pub min_keypoint_score: f32,
    #[serde(default = "default_torso_expansion")]
    pub torso_expansion: f32,
    #[serde(default = "default_body_expansion")]
    pub body_expansion: f32,
}

fn default_min_keypoint_score() -> f32 { 0.55 }
fn default_torso_expansion() -> f32 { 1.9 }
fn default_body_expansion() -> f32 { 1.2 }

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            adaptive: default_true(),
            min_keypoint_score: default_min_keypoint_score(),
            torso_expansion: default_torso_expansion(),
            body_expansion: default_body_expansion(),
        }
    }
}

/// Angle measurement and filtering.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Minimum frames between two accepted pedal extrema
    #[serde(default = "default_min_peak_distance")]
    pub min_peak_distance: usize,
    /// MAD-scaled deviation above which a sample is rejected
    #[serde(default = "default_mad_tolerance")]
    pub mad_tolerance: f64,
    /// Plausible knee angle (exclusive, degrees) with the leg extended
    #[serde(default = "default_extended_knee_band")]
    pub extended_knee_band: [f64; 2],
    /// Plausible knee angle (exclusive, degrees) with the leg flexed
    #[serde(default = "default_flexed_knee_band")]
    pub flexed_knee_band: [f64; 2],
    /// Also apply MAD rejection to hip / shoulder / elbow
    #[serde(default)]
    pub filter_upper_body: bool,
    /// Upper bound for the frame extraction loop, 0 for none
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_min_peak_distance() -> usize { 10 }
fn default_mad_tolerance() -> f64 { 2.0 }
fn default_extended_knee_band() -> [f64; 2] { [90.0, 170.0] }
fn default_flexed_knee_band() -> [f64; 2] { [40.0, 130.0] }
fn default_timeout_secs() -> u64 { 120 }

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_peak_distance: default_min_peak_distance(),
            mad_tolerance: default_mad_tolerance(),
            extended_knee_band: default_extended_knee_band(),
            flexed_knee_band: default_flexed_knee_band(),
            filter_upper_body: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Ideal angle ranges (inclusive, degrees) for the fit verdicts.
#[derive(Debug, Deserialize, Clone)]
pub struct FitConfig {
    #[serde(default = "default_knee_lowest_range")]
    pub knee_angle_lowest: [f64; 2],
    #[serde(default = "default_knee_highest_range")]
    pub knee_angle_highest: [f64; 2],
    #[serde(default = "default_hip_range")]
    pub hip_angle: [f64; 2],
    #[serde(default = "default_shoulder_range")]
    pub shoulder_angle: [f64; 2],
    #[serde(default = "default_elbow_range")]
    pub elbow_angle: [f64; 2],
}

fn default_knee_lowest_range() -> [f64; 2] { [65.0, 75.0] }
fn default_knee_highest_range() -> [f64; 2] { [140.0, 150.0] }
fn default_hip_range() -> [f64; 2] { [45.0, 90.0] }
fn default_shoulder_range() -> [f64; 2] { [20.0, 45.0] }
fn default_elbow_range() -> [f64; 2] { [150.0, 165.0] }

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            knee_angle_lowest: default_knee_lowest_range(),
            knee_angle_highest: default_knee_highest_range(),
            hip_angle: default_hip_range(),
            shoulder_angle: default_shoulder_range(),
            elbow_angle: default_elbow_range(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Loads `path`, falling back to defaults when it is missing or invalid.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}; using default configuration", e);
                Self::default()
            }
        }
    }
}

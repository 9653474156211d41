use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use super::angle::{AngleSample, Joint};
use super::orientation::{AnatomyIndexSet, Orientation};
use super::outlier::{AngleBand, OutlierFilter};
use super::pedal::{ankle_series, find_extrema, PedalPhase};
use crate::config::AnalysisConfig;
use crate::pose::FrameKeypoints;

/// Reduced value of one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AngleStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub samples: usize,
    /// Frames the surviving samples came from.
    pub frames: Vec<usize>,
}

impl AngleStats {
    /// `None` for an empty sample set.
    pub fn from_samples(samples: &[AngleSample]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }
        let n = samples.len() as f64;
        let mean = samples.iter().map(|s| s.degrees).sum::<f64>() / n;
        let variance = samples
            .iter()
            .map(|s| (s.degrees - mean).powi(2))
            .sum::<f64>()
            / n;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            samples: samples.len(),
            frames: samples.iter().map(|s| s.frame).collect(),
        })
    }
}

/// Reported body-angle metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    KneeAngleLowest,
    KneeAngleHighest,
    HipAngle,
    ShoulderAngle,
    ElbowAngle,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::KneeAngleLowest,
        Metric::KneeAngleHighest,
        Metric::HipAngle,
        Metric::ShoulderAngle,
        Metric::ElbowAngle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Metric::KneeAngleLowest => "knee_angle_lowest",
            Metric::KneeAngleHighest => "knee_angle_highest",
            Metric::HipAngle => "hip_angle",
            Metric::ShoulderAngle => "shoulder_angle",
            Metric::ElbowAngle => "elbow_angle",
        }
    }
}

/// Per-clip result handed to the advice layer.
///
/// A metric is `None` when no sample survived detection and filtering; such
/// metrics are also listed in `insufficient_data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementSummary {
    pub orientation: Orientation,
    pub frames: usize,
    pub knee_angle_lowest: Option<AngleStats>,
    pub knee_angle_highest: Option<AngleStats>,
    pub hip_angle: Option<AngleStats>,
    pub shoulder_angle: Option<AngleStats>,
    pub elbow_angle: Option<AngleStats>,
    pub insufficient_data: Vec<Metric>,
    /// Knee angle per frame, `None` where the keypoints were degenerate.
    pub knee_angles: Vec<Option<f64>>,
}

impl MeasurementSummary {
    pub fn get(&self, metric: Metric) -> Option<&AngleStats> {
        match metric {
            Metric::KneeAngleLowest => self.knee_angle_lowest.as_ref(),
            Metric::KneeAngleHighest => self.knee_angle_highest.as_ref(),
            Metric::HipAngle => self.hip_angle.as_ref(),
            Metric::ShoulderAngle => self.shoulder_angle.as_ref(),
            Metric::ElbowAngle => self.elbow_angle.as_ref(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.insufficient_data.is_empty()
    }

    /// Metric name → mean in degrees, 0.0 where data was insufficient.
    pub fn to_metric_map(&self) -> BTreeMap<String, f64> {
        Metric::ALL
            .iter()
            .map(|&m| (m.name().to_string(), self.get(m).map_or(0.0, |s| s.mean)))
            .collect()
    }
}

/// Turns a keypoint sequence into a [`MeasurementSummary`].
///
/// Knee angles are taken at the pedal extrema and filtered with the band of
/// their phase. Hip, shoulder and elbow are averaged over every frame.
#[derive(Debug, Clone)]
pub struct Aggregator {
    pub min_peak_distance: usize,
    pub mad_tolerance: f64,
    /// Band for the extended knee ([`PedalPhase::Top`]).
    pub extended_knee_band: AngleBand,
    /// Band for the flexed knee ([`PedalPhase::Bottom`]).
    pub flexed_knee_band: AngleBand,
    /// Apply MAD rejection to the upper-body series as well.
    pub filter_upper_body: bool,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl Aggregator {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            min_peak_distance: config.min_peak_distance,
            mad_tolerance: config.mad_tolerance,
            extended_knee_band: AngleBand::from_pair(config.extended_knee_band),
            flexed_knee_band: AngleBand::from_pair(config.flexed_knee_band),
            filter_upper_body: config.filter_upper_body,
        }
    }

    pub fn knee_band(&self, phase: PedalPhase) -> AngleBand {
        match phase {
            PedalPhase::Top => self.extended_knee_band,
            PedalPhase::Bottom => self.flexed_knee_band,
        }
    }

    /// Angle of `joint` in every frame where it is computable.
    pub fn angle_series(
        &self,
        frames: &[FrameKeypoints],
        anatomy: &AnatomyIndexSet,
        joint: Joint,
    ) -> Vec<AngleSample> {
        frames
            .iter()
            .enumerate()
            .filter_map(|(frame, keypoints)| match joint.measure(keypoints, anatomy) {
                Ok(degrees) => Some(AngleSample::new(frame, degrees)),
                Err(e) => {
                    debug!(frame, ?joint, "skipping sample: {}", e);
                    None
                }
            })
            .collect()
    }

    /// Stats of `joint` restricted to the stroke extrema of `phase`.
    pub fn joint_at_phase(
        &self,
        frames: &[FrameKeypoints],
        anatomy: &AnatomyIndexSet,
        joint: Joint,
        phase: PedalPhase,
    ) -> Option<AngleStats> {
        let series = self.angle_series(frames, anatomy, joint);
        let extrema = find_extrema(
            &ankle_series(frames, anatomy),
            phase,
            self.min_peak_distance,
        );
        debug!(?phase, extrema = extrema.len(), "pedal extrema");

        let at_extrema: Vec<AngleSample> = series
            .into_iter()
            .filter(|s| extrema.binary_search(&s.frame).is_ok())
            .collect();

        let kept = match joint {
            Joint::Knee => {
                OutlierFilter::new(Some(self.knee_band(phase)), self.mad_tolerance).filter(&at_extrema)
            }
            _ if self.filter_upper_body => OutlierFilter::new(None, self.mad_tolerance).filter(&at_extrema),
            _ => at_extrema,
        };
        AngleStats::from_samples(&kept)
    }

    fn whole_clip(
        &self,
        frames: &[FrameKeypoints],
        anatomy: &AnatomyIndexSet,
        joint: Joint,
    ) -> Option<AngleStats> {
        let series = self.angle_series(frames, anatomy, joint);
        if self.filter_upper_body {
            AngleStats::from_samples(&OutlierFilter::new(None, self.mad_tolerance).filter(&series))
        } else {
            AngleStats::from_samples(&series)
        }
    }

    pub fn aggregate(&self, frames: &[FrameKeypoints], anatomy: &AnatomyIndexSet) -> MeasurementSummary {
        let knee_angles = frames
            .iter()
            .map(|kp| Joint::Knee.measure(kp, anatomy).ok())
            .collect();

        let mut summary = MeasurementSummary {
            orientation: anatomy.orientation,
            frames: frames.len(),
            knee_angle_lowest: self.joint_at_phase(frames, anatomy, Joint::Knee, PedalPhase::Bottom),
            knee_angle_highest: self.joint_at_phase(frames, anatomy, Joint::Knee, PedalPhase::Top),
            hip_angle: self.whole_clip(frames, anatomy, Joint::Hip),
            shoulder_angle: self.whole_clip(frames, anatomy, Joint::Shoulder),
            elbow_angle: self.whole_clip(frames, anatomy, Joint::Elbow),
            insufficient_data: Vec::new(),
            knee_angles,
        };

        for metric in Metric::ALL {
            match summary.get(metric) {
                Some(stats) => info!(
                    metric = metric.name(),
                    mean = stats.mean,
                    std_dev = stats.std_dev,
                    samples = stats.samples,
                    "measured"
                ),
                None => {
                    warn!(metric = metric.name(), "insufficient data");
                    summary.insufficient_data.push(metric);
                }
            }
        }
        summary
    }
}

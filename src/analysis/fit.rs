use serde::Serialize;
use std::collections::BTreeMap;

use super::aggregate::{MeasurementSummary, Metric};
use crate::config::FitConfig;

/// Measured angle relative to the ideal range of its metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitVerdict {
    TooSmall,
    Ideal,
    TooLarge,
}

impl FitVerdict {
    /// Range bounds are inclusive.
    pub fn classify(degrees: f64, [min, max]: [f64; 2]) -> Self {
        if degrees < min {
            Self::TooSmall
        } else if degrees > max {
            Self::TooLarge
        } else {
            Self::Ideal
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitAssessment {
    pub metric: Metric,
    pub measured: f64,
    pub ideal: [f64; 2],
    pub verdict: FitVerdict,
}

pub fn ideal_range(config: &FitConfig, metric: Metric) -> [f64; 2] {
    match metric {
        Metric::KneeAngleLowest => config.knee_angle_lowest,
        Metric::KneeAngleHighest => config.knee_angle_highest,
        Metric::HipAngle => config.hip_angle,
        Metric::ShoulderAngle => config.shoulder_angle,
        Metric::ElbowAngle => config.elbow_angle,
    }
}

/// Verdict per measured metric. Metrics without data are left out.
pub fn assess(summary: &MeasurementSummary, config: &FitConfig) -> BTreeMap<Metric, FitAssessment> {
    Metric::ALL
        .iter()
        .filter_map(|&metric| {
            let stats = summary.get(metric)?;
            let ideal = ideal_range(config, metric);
            Some((
                metric,
                FitAssessment {
                    metric,
                    measured: stats.mean,
                    ideal,
                    verdict: FitVerdict::classify(stats.mean, ideal),
                },
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::tests::pedaling_clip;
    use crate::analysis::aggregate::Aggregator;
    use crate::analysis::orientation::{AnatomyIndexSet, Orientation};

    #[test]
    fn test_classify_inclusive_bounds() {
        assert_eq!(FitVerdict::classify(64.9, [65.0, 75.0]), FitVerdict::TooSmall);
        assert_eq!(FitVerdict::classify(65.0, [65.0, 75.0]), FitVerdict::Ideal);
        assert_eq!(FitVerdict::classify(75.0, [65.0, 75.0]), FitVerdict::Ideal);
        assert_eq!(FitVerdict::classify(80.0, [65.0, 75.0]), FitVerdict::TooLarge);
    }

    #[test]
    fn test_assess_pedaling_clip() {
        let anatomy = AnatomyIndexSet::for_side(Orientation::Left);
        let summary = Aggregator::default().aggregate(&pedaling_clip(60), &anatomy);
        let report = assess(&summary, &FitConfig::default());

        assert_eq!(report.len(), 5);
        assert_eq!(report[&Metric::KneeAngleLowest].verdict, FitVerdict::Ideal);
        assert_eq!(report[&Metric::KneeAngleHighest].verdict, FitVerdict::Ideal);
        // 135° < 150°
        assert_eq!(report[&Metric::ElbowAngle].verdict, FitVerdict::TooSmall);
        // 90° > 45°
        assert_eq!(report[&Metric::ShoulderAngle].verdict, FitVerdict::TooLarge);
    }

    #[test]
    fn test_missing_metrics_have_no_verdict() {
        let anatomy = AnatomyIndexSet::for_side(Orientation::Left);
        let summary = Aggregator::default().aggregate(&pedaling_clip(5), &anatomy);
        let report = assess(&summary, &FitConfig::default());
        assert!(!report.contains_key(&Metric::KneeAngleLowest));
        assert!(report.contains_key(&Metric::HipAngle));
    }
}

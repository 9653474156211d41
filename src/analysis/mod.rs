//! Joint-angle analysis over a keypoint sequence.

pub mod aggregate;
pub mod angle;
pub mod fit;
pub mod orientation;
pub mod outlier;
pub mod pedal;

pub use aggregate::{Aggregator, AngleStats, MeasurementSummary, Metric};
pub use angle::{joint_angle, AngleError, AngleSample, Joint};
pub use fit::{assess, FitAssessment, FitVerdict};
pub use orientation::{resolve, AnatomyIndexSet, Orientation};
pub use outlier::{filter_bad_angles, AngleBand, OutlierFilter};
pub use pedal::{find_extrema, find_peaks, PedalPhase};

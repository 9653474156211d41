use nalgebra::Point2;
use serde::Serialize;

use super::orientation::AnatomyIndexSet;
use crate::pose::{FrameKeypoints, KeypointIndex};

/// Angle at `vertex` could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum AngleError {
    /// Two of the three keypoints coincide.
    #[error("zero-length vector at vertex ({x:.4}, {y:.4})")]
    ZeroLengthVector { x: f64, y: f64 },
    #[error("non-finite keypoint coordinate")]
    NonFinite,
}

/// Angle in degrees [0, 180] at `vertex` between the rays to `a` and `b`.
pub fn joint_angle(
    a: Point2<f64>,
    vertex: Point2<f64>,
    b: Point2<f64>,
) -> Result<f64, AngleError> {
    if [a, vertex, b].iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(AngleError::NonFinite);
    }

    let v1 = a - vertex;
    let v2 = b - vertex;
    if v1.norm_squared() == 0.0 || v2.norm_squared() == 0.0 {
        return Err(AngleError::ZeroLengthVector {
            x: vertex.x,
            y: vertex.y,
        });
    }

    // exact at 0 and 180 degrees
    Ok(v1.perp(&v2).atan2(v1.dot(&v2)).abs().to_degrees())
}

/// Joint measured on the camera-facing side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Joint {
    /// hip - knee - ankle
    Knee,
    /// shoulder - hip - knee
    Hip,
    /// hip - shoulder - elbow (forward lean of the upper arm)
    Shoulder,
    /// shoulder - elbow - wrist
    Elbow,
}

impl Joint {
    /// `(a, vertex, b)` landmarks for this joint.
    pub fn triple(self, anatomy: &AnatomyIndexSet) -> (KeypointIndex, KeypointIndex, KeypointIndex) {
        match self {
            Self::Knee => (anatomy.hip, anatomy.knee, anatomy.ankle),
            Self::Hip => (anatomy.shoulder, anatomy.hip, anatomy.knee),
            Self::Shoulder => (anatomy.hip, anatomy.shoulder, anatomy.elbow),
            Self::Elbow => (anatomy.shoulder, anatomy.elbow, anatomy.wrist),
        }
    }

    pub fn measure(
        self,
        keypoints: &FrameKeypoints,
        anatomy: &AnatomyIndexSet,
    ) -> Result<f64, AngleError> {
        let (a, vertex, b) = self.triple(anatomy);
        joint_angle(
            keypoints.get(a).position(),
            keypoints.get(vertex).position(),
            keypoints.get(b).position(),
        )
    }
}

/// One angle measurement tied to its frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleSample {
    pub frame: usize,
    pub degrees: f64,
}

impl AngleSample {
    pub fn new(frame: usize, degrees: f64) -> Self {
        Self { frame, degrees }
    }
}

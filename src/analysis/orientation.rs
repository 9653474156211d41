use serde::Serialize;

use crate::pose::{FrameKeypoints, KeypointIndex};

/// Body side facing the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Left,
    Right,
}

impl Orientation {
    /// Decides the camera-facing side from a single frame.
    ///
    /// The rider faces the direction of the nose: a nose left of the left hip
    /// means the left side of the body is towards the camera.
    pub fn from_keypoints(keypoints: &FrameKeypoints) -> Self {
        let nose_x = keypoints.get(KeypointIndex::Nose).x;
        let hip_x = keypoints.get(KeypointIndex::LeftHip).x;
        if nose_x < hip_x {
            Self::Left
        } else {
            Self::Right
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Landmarks of the camera-facing side used by every angle measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnatomyIndexSet {
    pub orientation: Orientation,
    pub hip: KeypointIndex,
    pub knee: KeypointIndex,
    pub ankle: KeypointIndex,
    pub shoulder: KeypointIndex,
    pub elbow: KeypointIndex,
    pub wrist: KeypointIndex,
}

impl AnatomyIndexSet {
    pub fn for_side(orientation: Orientation) -> Self {
        use KeypointIndex::*;
        match orientation {
            Orientation::Left => Self {
                orientation,
                hip: LeftHip,
                knee: LeftKnee,
                ankle: LeftAnkle,
                shoulder: LeftShoulder,
                elbow: LeftElbow,
                wrist: LeftWrist,
            },
            Orientation::Right => Self {
                orientation,
                hip: RightHip,
                knee: RightKnee,
                ankle: RightAnkle,
                shoulder: RightShoulder,
                elbow: RightElbow,
                wrist: RightWrist,
            },
        }
    }
}

/// Resolves the facing side once, from the first frame of a clip.
pub fn resolve(first_frame: &FrameKeypoints) -> (Orientation, AnatomyIndexSet) {
    let orientation = Orientation::from_keypoints(first_frame);
    (orientation, AnatomyIndexSet::for_side(orientation))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Keypoint;

    fn frame(nose_x: f32, left_hip_x: f32) -> FrameKeypoints {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        keypoints[KeypointIndex::Nose as usize] = Keypoint::new(nose_x, 0.2, 0.9);
        keypoints[KeypointIndex::LeftHip as usize] = Keypoint::new(left_hip_x, 0.5, 0.9);
        FrameKeypoints::new(keypoints)
    }

    #[test]
    fn test_nose_left_of_hip_is_left() {
        let (orientation, anatomy) = resolve(&frame(0.3, 0.5));
        assert_eq!(orientation, Orientation::Left);
        assert_eq!(anatomy.hip, KeypointIndex::LeftHip);
        assert_eq!(anatomy.knee, KeypointIndex::LeftKnee);
        assert_eq!(anatomy.ankle, KeypointIndex::LeftAnkle);
        assert_eq!(anatomy.shoulder, KeypointIndex::LeftShoulder);
        assert_eq!(anatomy.elbow, KeypointIndex::LeftElbow);
        assert_eq!(anatomy.wrist, KeypointIndex::LeftWrist);
    }

    #[test]
    fn test_nose_right_of_hip_is_right() {
        let (orientation, anatomy) = resolve(&frame(0.7, 0.5));
        assert_eq!(orientation, Orientation::Right);
        assert_eq!(anatomy.ankle, KeypointIndex::RightAnkle);
        assert_eq!(anatomy.wrist, KeypointIndex::RightWrist);
    }

    #[test]
    fn test_equal_x_resolves_right() {
        assert_eq!(Orientation::from_keypoints(&frame(0.5, 0.5)), Orientation::Right);
    }

    #[test]
    fn test_anatomy_carries_orientation() {
        let anatomy = AnatomyIndexSet::for_side(Orientation::Left);
        assert_eq!(anatomy.orientation.as_str(), "left");
    }
}

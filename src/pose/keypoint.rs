use nalgebra::Point2;
use serde::Serialize;

/// MoveNet's 17 landmarks, in model output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(usize)]
pub enum KeypointIndex {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl KeypointIndex {
    pub const COUNT: usize = 17;

    /// Shoulders and hips, used for torso visibility and crop sizing.
    pub const TORSO: [KeypointIndex; 4] = [
        KeypointIndex::LeftShoulder,
        KeypointIndex::RightShoulder,
        KeypointIndex::LeftHip,
        KeypointIndex::RightHip,
    ];
}

/// A single detected landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Keypoint {
    /// Normalized x (0.0-1.0)
    pub x: f32,
    /// Normalized y (0.0-1.0, pointing down)
    pub y: f32,
    /// Score (0.0-1.0)
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// Strictly above `threshold`.
    pub fn is_confident(&self, threshold: f32) -> bool {
        self.confidence > threshold
    }

    /// Pixel coordinates `(y, x)`.
    pub fn to_pixel(&self, height: usize, width: usize) -> (f32, f32) {
        (self.y * height as f32, self.x * width as f32)
    }

    /// Position as a 2D point for the angle math.
    pub fn position(&self) -> Point2<f64> {
        Point2::new(self.x as f64, self.y as f64)
    }
}

impl Default for Keypoint {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            confidence: 0.0,
        }
    }
}

/// One frame of pose model output: 17 keypoints in [`KeypointIndex`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameKeypoints {
    pub keypoints: [Keypoint; KeypointIndex::COUNT],
}

impl FrameKeypoints {
    pub fn new(keypoints: [Keypoint; KeypointIndex::COUNT]) -> Self {
        Self { keypoints }
    }

    /// Builds a frame from MoveNet's `(y, x, confidence)` triples.
    pub fn from_yx_scores(rows: &[[f32; 3]; KeypointIndex::COUNT]) -> Self {
        let mut keypoints = [Keypoint::default(); KeypointIndex::COUNT];
        for (kp, row) in keypoints.iter_mut().zip(rows.iter()) {
            *kp = Keypoint::new(row[1], row[0], row[2]);
        }
        Self { keypoints }
    }

    pub fn get(&self, index: KeypointIndex) -> &Keypoint {
        &self.keypoints[index as usize]
    }

    /// True when the model reported zero confidence for every landmark.
    pub fn is_degenerate(&self) -> bool {
        self.keypoints.iter().all(|k| k.confidence <= 0.0)
    }
}

impl Default for FrameKeypoints {
    fn default() -> Self {
        Self {
            keypoints: [Keypoint::default(); KeypointIndex::COUNT],
        }
    }
}

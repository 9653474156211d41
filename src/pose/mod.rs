pub mod crop;
pub mod detector;
pub mod extractor;
pub mod keypoint;
pub mod preprocess;

pub use crop::{remap_keypoints, CropRegion, RegionTracker};
#[cfg(feature = "desktop")]
pub use detector::MoveNet;
pub use detector::PoseModel;
pub use extractor::KeypointExtractor;
pub use keypoint::{FrameKeypoints, Keypoint, KeypointIndex};
pub use preprocess::crop_and_resize;

use anyhow::{Context, Result};
use ndarray::Array3;
use opencv::{
    core::{AlgorithmHint, Mat, Size},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::Path;
use tracing::info;

use super::{Frame, FramePlan};
use crate::config::VideoConfig;
use crate::error::PipelineError;

/// Video file decoding through OpenCV.
pub struct VideoSource {
    capture: VideoCapture,
    fps: f64,
    total_frames: usize,
}

impl VideoSource {
    /// Fails with [`PipelineError::NoUsableInput`] when the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let capture = path
            .to_str()
            .and_then(|name| VideoCapture::from_file(name, videoio::CAP_ANY).ok())
            .filter(|capture| capture.is_opened().unwrap_or(false))
            .ok_or_else(|| PipelineError::unreadable_video(path))?;

        let fps = capture.get(videoio::CAP_PROP_FPS)?;
        let total_frames = capture.get(videoio::CAP_PROP_FRAME_COUNT)?.max(0.0) as usize;
        let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        info!(
            "Video {}: {}x{} @ {:.1} FPS, {} frames",
            path.display(),
            width,
            height,
            fps,
            total_frames
        );

        Ok(Self {
            capture,
            fps,
            total_frames,
        })
    }

    pub fn plan(&self, config: &VideoConfig) -> FramePlan {
        FramePlan::new(self.total_frames, self.fps, config)
    }

    /// Decodes the frames selected by [`FramePlan`], resized to the configured
    /// target size, in RGB order.
    pub fn read_frames(&mut self, config: &VideoConfig) -> Result<Vec<Frame>> {
        let plan = self.plan(config);
        if plan.start > 0 {
            self.capture
                .set(videoio::CAP_PROP_POS_FRAMES, plan.start as f64)
                .context("Failed to seek video")?;
        }

        let target = Size::new(config.target_width as i32, config.target_height as i32);
        let mut frames = Vec::with_capacity(plan.count);
        let mut mat = Mat::default();

        for offset in 0..plan.window() {
            if !self.capture.read(&mut mat).context("Failed to read frame")? || mat.empty() {
                break;
            }
            if plan.keeps(offset) {
                frames.push(to_rgb_frame(&mat, target)?);
            }
        }

        info!(
            "Decoded {} frames (start {}, stride {})",
            frames.len(),
            plan.start,
            plan.stride
        );
        Ok(frames)
    }
}

/// Resizes a BGR `Mat` and copies it out as an RGB ndarray.
fn to_rgb_frame(bgr: &Mat, target: Size) -> Result<Frame> {
    let mut resized = Mat::default();
    imgproc::resize(bgr, &mut resized, target, 0.0, 0.0, imgproc::INTER_LINEAR)?;

    let mut rgb = Mat::default();
    imgproc::cvt_color(
        &resized,
        &mut rgb,
        imgproc::COLOR_BGR2RGB,
        0,
        AlgorithmHint::ALGO_HINT_DEFAULT,
    )?;

    if !rgb.is_continuous() {
        rgb = rgb.try_clone()?;
    }
    let data = rgb.data_bytes()?.to_vec();
    let frame = Array3::from_shape_vec(
        (target.height as usize, target.width as usize, 3),
        data,
    )
    .context("Decoded frame has unexpected size")?;
    Ok(frame)
}

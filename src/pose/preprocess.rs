use ndarray::{Array4, ArrayView3};

use super::crop::CropRegion;

/// Samples `region` of an RGB frame into a `[1, size, size, 3]` f32 tensor (0.0-255.0).
///
/// - Bilinear sampling; the region corners map onto the outer pixel centers.
/// - Samples that land outside the frame are 0 (black padding).
pub fn crop_and_resize(frame: ArrayView3<u8>, region: &CropRegion, size: usize) -> Array4<f32> {
    let (height, width, channels) = frame.dim();
    let mut tensor = Array4::<f32>::zeros((1, size, size, channels));
    if height == 0 || width == 0 || size == 0 {
        return tensor;
    }

    let ys: Vec<Option<Lerp>> = (0..size)
        .map(|i| Lerp::sample(region.y_min, region.y_max, height, i, size))
        .collect();
    let xs: Vec<Option<Lerp>> = (0..size)
        .map(|i| Lerp::sample(region.x_min, region.x_max, width, i, size))
        .collect();

    for (oy, y) in ys.iter().enumerate() {
        let Some(y) = y else { continue };
        for (ox, x) in xs.iter().enumerate() {
            let Some(x) = x else { continue };
            for c in 0..channels {
                let top_left = frame[[y.lo, x.lo, c]] as f32;
                let top_right = frame[[y.lo, x.hi, c]] as f32;
                let bottom_left = frame[[y.hi, x.lo, c]] as f32;
                let bottom_right = frame[[y.hi, x.hi, c]] as f32;
                let top = top_left + (top_right - top_left) * x.frac;
                let bottom = bottom_left + (bottom_right - bottom_left) * x.frac;
                tensor[[0, oy, ox, c]] = top + (bottom - top) * y.frac;
            }
        }
    }

    tensor
}

/// Neighbouring source pixels and blend weight along one axis.
#[derive(Debug, Clone, Copy)]
struct Lerp {
    lo: usize,
    hi: usize,
    frac: f32,
}

impl Lerp {
    fn sample(start: f32, end: f32, extent: usize, i: usize, size: usize) -> Option<Self> {
        let last = (extent - 1) as f32;
        let pos = if size > 1 {
            start * last + i as f32 * (end - start) * last / (size - 1) as f32
        } else {
            0.5 * (start + end) * last
        };
        if !(0.0..=last).contains(&pos) {
            return None;
        }
        let lo = pos.floor();
        let hi = pos.ceil();
        Some(Self {
            lo: lo as usize,
            hi: hi as usize,
            frac: pos - lo,
        })
    }
}

use std::cmp::Ordering;
use tracing::debug;

use super::angle::AngleSample;

/// Open interval of plausible angles, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleBand {
    pub min: f64,
    pub max: f64,
}

impl AngleBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn from_pair([min, max]: [f64; 2]) -> Self {
        Self { min, max }
    }

    /// Both bounds are exclusive.
    pub fn contains(&self, degrees: f64) -> bool {
        self.min < degrees && degrees < self.max
    }
}

/// Plausible range for an extended knee.
pub const EXTENDED_KNEE_BAND: AngleBand = AngleBand::new(90.0, 170.0);

/// Two-stage rejection: a hard band, then median absolute deviation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierFilter {
    /// `None` skips the hard band.
    pub band: Option<AngleBand>,
    /// Samples scoring `|x - median| / MAD >= tolerance` are dropped.
    pub tolerance: f64,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self {
            band: Some(EXTENDED_KNEE_BAND),
            tolerance: 2.0,
        }
    }
}

impl OutlierFilter {
    pub fn new(band: Option<AngleBand>, tolerance: f64) -> Self {
        Self { band, tolerance }
    }

    /// Survivors in input order, each still paired with its frame.
    ///
    /// A zero MAD scores every in-band sample 0, so all of them survive.
    pub fn filter(&self, samples: &[AngleSample]) -> Vec<AngleSample> {
        let in_band: Vec<AngleSample> = samples
            .iter()
            .copied()
            .filter(|s| s.degrees.is_finite())
            .filter(|s| self.band.map_or(true, |band| band.contains(s.degrees)))
            .collect();
        if in_band.is_empty() {
            return in_band;
        }

        let values: Vec<f64> = in_band.iter().map(|s| s.degrees).collect();
        let center = median(&values);
        let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
        let mad = median(&deviations);

        let kept: Vec<AngleSample> = in_band
            .into_iter()
            .zip(deviations)
            .filter(|(_, dev)| {
                let score = if mad > 0.0 { dev / mad } else { 0.0 };
                score < self.tolerance
            })
            .map(|(sample, _)| sample)
            .collect();

        debug!(
            input = samples.len(),
            kept = kept.len(),
            median = center,
            mad,
            "outlier filter"
        );
        kept
    }
}

/// Parallel-array form of [`OutlierFilter::filter`] with the extended-knee band.
pub fn filter_bad_angles(angles: &[f64], indices: &[usize], tolerance: f64) -> (Vec<f64>, Vec<usize>) {
    let samples: Vec<AngleSample> = indices
        .iter()
        .zip(angles)
        .map(|(&frame, &degrees)| AngleSample::new(frame, degrees))
        .collect();
    OutlierFilter::new(Some(EXTENDED_KNEE_BAND), tolerance)
        .filter(&samples)
        .into_iter()
        .map(|s| (s.degrees, s.frame))
        .unzip()
}

/// Mean of the two middle values for even lengths, NaN when empty.
pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

use serde::Serialize;
use std::cmp::Ordering;

use super::orientation::AnatomyIndexSet;
use crate::pose::FrameKeypoints;

/// Extreme point of the pedal stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PedalPhase {
    /// Ankle highest in the image (smallest y, peaks of the negated series).
    /// The knee is at its most flexed.
    Bottom,
    /// Ankle lowest in the image (largest y, peaks of the raw series).
    /// The knee is at its most extended.
    Top,
}

/// Ankle y-coordinate of the facing side, one value per frame.
///
/// Frames where the ankle was not detected (zero score or non-finite y) take
/// the previous detected value, or the next one at the start of the clip, so
/// they never form an extremum of their own. All zeros if no frame has one.
pub fn ankle_series(frames: &[FrameKeypoints], anatomy: &AnatomyIndexSet) -> Vec<f64> {
    let detected: Vec<Option<f64>> = frames
        .iter()
        .map(|kp| {
            let ankle = kp.get(anatomy.ankle);
            let y = ankle.y as f64;
            (ankle.confidence > 0.0 && y.is_finite()).then_some(y)
        })
        .collect();

    let Some(first) = detected.iter().flatten().next().copied() else {
        return vec![0.0; frames.len()];
    };

    let mut last = first;
    detected
        .into_iter()
        .map(|y| {
            if let Some(y) = y {
                last = y;
            }
            last
        })
        .collect()
}

/// Frame indices of the stroke extrema for `phase`, ascending.
pub fn find_extrema(series: &[f64], phase: PedalPhase, min_distance: usize) -> Vec<usize> {
    match phase {
        PedalPhase::Top => find_peaks(series, min_distance),
        PedalPhase::Bottom => {
            let negated: Vec<f64> = series.iter().map(|y| -y).collect();
            find_peaks(&negated, min_distance)
        }
    }
}

/// Strict local maxima of `x`, at least `distance` samples apart.
///
/// Flat peaks report their midpoint (rounded down); the first and last
/// samples are never peaks. When two peaks are closer than `distance` the
/// higher one survives; ties go to the later peak.
pub fn find_peaks(x: &[f64], distance: usize) -> Vec<usize> {
    let peaks = local_maxima(x);
    if peaks.len() < 2 {
        return peaks;
    }
    let distance = distance.max(1);

    // stable ascending sort, walked from the highest peak down
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| {
        x[peaks[a]]
            .partial_cmp(&x[peaks[b]])
            .unwrap_or(Ordering::Equal)
    });

    let mut keep = vec![true; peaks.len()];
    for &j in order.iter().rev() {
        if !keep[j] {
            continue;
        }
        for k in (0..j).rev() {
            if peaks[j] - peaks[k] >= distance {
                break;
            }
            keep[k] = false;
        }
        for k in j + 1..peaks.len() {
            if peaks[k] - peaks[j] >= distance {
                break;
            }
            keep[k] = false;
        }
    }

    peaks
        .into_iter()
        .zip(keep)
        .filter_map(|(peak, kept)| kept.then_some(peak))
        .collect()
}

fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }
    let last = x.len() - 1;

    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::orientation::Orientation;
    use crate::pose::{Keypoint, KeypointIndex};
    use std::f64::consts::PI;

    fn sine(n: usize, period: f64) -> Vec<f64> {
        (0..n).map(|t| (2.0 * PI * t as f64 / period).sin()).collect()
    }

    #[test]
    fn test_sine_extrema() {
        let series = sine(100, 20.0);
        assert_eq!(find_extrema(&series, PedalPhase::Top, 10), vec![5, 25, 45, 65, 85]);
        assert_eq!(find_extrema(&series, PedalPhase::Bottom, 10), vec![15, 35, 55, 75, 95]);
    }

    #[test]
    fn test_peaks_respect_distance() {
        let series = sine(200, 13.0);
        for distance in [1, 5, 10, 20] {
            let peaks = find_peaks(&series, distance);
            assert!(peaks.windows(2).all(|w| w[1] - w[0] >= distance));
        }
    }

    #[test]
    fn test_jitter_suppressed_by_higher_peak() {
        // 3 and 6 are 3 apart: only the higher (6) survives
        let series = [0.0, 0.1, 0.2, 0.9, 0.5, 0.6, 1.0, 0.3, 0.0];
        assert_eq!(find_peaks(&series, 1), vec![3, 6]);
        assert_eq!(find_peaks(&series, 5), vec![6]);
    }

    #[test]
    fn test_equal_height_tie_keeps_later_peak() {
        let series = [0.0, 1.0, 0.0, 1.0, 0.0];
        assert_eq!(find_peaks(&series, 3), vec![3]);
    }

    #[test]
    fn test_plateau_midpoint() {
        let series = [0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        assert_eq!(find_peaks(&series, 1), vec![2]);
        // a plateau touching the edge is not a peak
        assert!(find_peaks(&[0.0, 1.0, 1.0], 1).is_empty());
    }

    #[test]
    fn test_edges_are_not_peaks() {
        assert!(find_peaks(&[5.0, 1.0, 0.0, 1.0, 5.0], 1).is_empty());
    }

    #[test]
    fn test_short_or_flat_series() {
        assert!(find_peaks(&[], 10).is_empty());
        assert!(find_peaks(&[1.0, 2.0], 10).is_empty());
        assert!(find_peaks(&[0.5; 40], 10).is_empty());
    }

    #[test]
    fn test_ankle_series_follows_side() {
        let anatomy = AnatomyIndexSet::for_side(Orientation::Right);
        let frames: Vec<FrameKeypoints> = [0.25f32, 0.5, 0.75]
            .iter()
            .map(|&y| {
                let mut kp = [Keypoint::default(); KeypointIndex::COUNT];
                kp[KeypointIndex::RightAnkle as usize] = Keypoint::new(0.4, y, 0.9);
                FrameKeypoints::new(kp)
            })
            .collect();
        assert_eq!(ankle_series(&frames, &anatomy), vec![0.25, 0.5, 0.75]);
    }

    #[test]
    fn test_undetected_ankle_holds_neighbour() {
        let anatomy = AnatomyIndexSet::for_side(Orientation::Left);
        let frames: Vec<FrameKeypoints> = [None, Some(0.4f32), None, None, Some(0.6), None]
            .iter()
            .map(|y| match y {
                Some(y) => {
                    let mut kp = [Keypoint::default(); KeypointIndex::COUNT];
                    kp[KeypointIndex::LeftAnkle as usize] = Keypoint::new(0.5, *y, 0.9);
                    FrameKeypoints::new(kp)
                }
                None => FrameKeypoints::default(),
            })
            .collect();

        let series = ankle_series(&frames, &anatomy);
        let expected = [0.4f32, 0.4, 0.4, 0.4, 0.6, 0.6].map(|y| y as f64);
        assert_eq!(series, expected.to_vec());

        assert_eq!(ankle_series(&vec![FrameKeypoints::default(); 3], &anatomy), vec![0.0; 3]);
    }
}

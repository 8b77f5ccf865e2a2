//! Snapping of continuous measurements onto the small discrete scales
//! design systems use.

pub const SPACING_SNAP_POINTS: [u32; 8] = [4, 8, 12, 16, 24, 32, 48, 64];
pub const RADIUS_SNAP_POINTS: [u32; 8] = [0, 4, 6, 8, 12, 16, 24, 32];
pub const STROKE_SNAP_POINTS: [u32; 6] = [1, 2, 3, 4, 6, 8];

/// Snap point closest to `value`. Ties go to the earlier snap point.
pub fn nearest<T>(value: f64, snap_points: &[T]) -> Option<T>
where
    T: Copy + Into<f64>,
{
    let mut best: Option<(T, f64)> = None;
    for &point in snap_points {
        let distance = (point.into() - value).abs();
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((point, distance)),
        }
    }
    best.map(|(point, _)| point)
}

/// Snap every value and return the distinct results in ascending order.
///
/// Non-finite values are skipped; an empty input (or empty snap set)
/// yields an empty scale.
pub fn quantize<T>(values: &[f64], snap_points: &[T]) -> Vec<T>
where
    T: Copy + Into<f64> + PartialOrd,
{
    let mut snapped: Vec<T> = values
        .iter()
        .filter(|v| v.is_finite())
        .filter_map(|&v| nearest(v, snap_points))
        .collect();

    snapped.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    snapped.dedup_by(|a, b| a == b);
    snapped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(quantize::<u32>(&[], &SPACING_SNAP_POINTS).is_empty());
    }

    #[test]
    fn test_snaps_to_nearest_and_sorts() {
        let values = [30.0, 5.0, 17.0, 100.0, 7.9];
        assert_eq!(quantize(&values, &SPACING_SNAP_POINTS), vec![4, 8, 16, 32, 64]);
    }

    #[test]
    fn test_ties_prefer_earlier_snap_point() {
        // 56 is equidistant from 48 and 64
        assert_eq!(nearest(56.0, &SPACING_SNAP_POINTS), Some(48));
        // 5 is equidistant from 4 and 6
        assert_eq!(nearest(5.0, &RADIUS_SNAP_POINTS), Some(4));
    }

    #[test]
    fn test_results_are_members_and_nearest() {
        let values: Vec<f64> = (0..400).map(|i| i as f64 * 0.37 - 20.0).collect();
        for &v in &values {
            let snapped = quantize(&[v], &STROKE_SNAP_POINTS);
            assert_eq!(snapped.len(), 1);
            let s = snapped[0];
            assert!(STROKE_SNAP_POINTS.contains(&s));
            let best = STROKE_SNAP_POINTS
                .iter()
                .map(|&p| (p as f64 - v).abs())
                .fold(f64::INFINITY, f64::min);
            assert_eq!((s as f64 - v).abs(), best);
        }
    }

    #[test]
    fn test_idempotent() {
        let values = [3.3, 9.0, 13.9, 14.1, 250.0, 0.0];
        let once = quantize(&values, &SPACING_SNAP_POINTS);
        let as_f64: Vec<f64> = once.iter().map(|&v| v as f64).collect();
        assert_eq!(quantize(&as_f64, &SPACING_SNAP_POINTS), once);
    }

    #[test]
    fn test_non_finite_skipped() {
        assert_eq!(quantize(&[f64::NAN, f64::INFINITY, 2.2], &STROKE_SNAP_POINTS), vec![2]);
    }
}

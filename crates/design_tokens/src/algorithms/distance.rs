use image::GrayImage;
use imageproc::distance_transform::{Norm, euclidean_squared_distance_transform};

use super::preprocessing::{count_foreground, invert};

/// Euclidean distance from every pixel to the nearest nonzero pixel of `targets`.
///
/// Returns `None` when `targets` has no nonzero pixel, since distances are
/// unbounded in that case.
pub fn distance_to_nearest(targets: &GrayImage) -> Option<Vec<f64>> {
    if count_foreground(targets) == 0 {
        return None;
    }
    let squared = euclidean_squared_distance_transform(targets);
    Some(squared.pixels().map(|p| p[0].sqrt()).collect())
}

/// Distance transform of a mask's foreground: for each nonzero pixel, the
/// distance to the nearest zero pixel; zero pixels map to 0.
pub fn foreground_distance(mask: &GrayImage) -> Option<Vec<f64>> {
    distance_to_nearest(&invert(mask))
}

/// Square-kernel dilation, `radius` pixels in every direction
pub fn dilate(mask: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::dilate(mask, Norm::LInf, radius)
}

/// Square-kernel erosion, `radius` pixels in every direction
pub fn erode(mask: &GrayImage, radius: u8) -> GrayImage {
    imageproc::morphology::erode(mask, Norm::LInf, radius)
}

/// Linear-interpolated percentile (`q` in [0, 100]) of already sorted values.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * fraction
}

/// Percentile of unsorted values
pub fn percentile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, q)
}

/// Median of the values, 0 for an empty slice
pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_percentile_interpolates() {
        let values = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 4.0);
        assert!((percentile(&values, 50.0) - 2.5).abs() < 1e-12);
        assert_eq!(median(&[]), 0.0);
    }

    #[test]
    fn test_distance_to_single_point() {
        let mut targets = GrayImage::new(5, 1);
        targets.put_pixel(0, 0, Luma([255]));
        let distances = distance_to_nearest(&targets).expect("Has a target pixel");
        assert_eq!(distances, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_no_targets() {
        assert!(distance_to_nearest(&GrayImage::new(4, 4)).is_none());
    }

    #[test]
    fn test_foreground_distance_of_bar() {
        // A 5 pixel wide vertical bar in the middle of a 9 pixel row
        let mask = GrayImage::from_fn(9, 1, |x, _| {
            if (2..7).contains(&x) { Luma([255]) } else { Luma([0]) }
        });
        let distances = foreground_distance(&mask).expect("Has background pixels");
        assert_eq!(distances, vec![0.0, 0.0, 1.0, 2.0, 3.0, 2.0, 1.0, 0.0, 0.0]);
    }
}

//! Multi-cue relative depth estimate used by the extended elevation
//! analysis. Three cues are fused per pixel:
//!
//! * sharpness: blurred magnitude of the Laplacian, high where detail is in focus
//! * shadow: darkening next to edges, where drop shadows sit
//! * perspective: a prior that the top of a screenshot is nearer than the bottom
//!
//! Image cues are normalized by their 2nd and 98th percentiles before fusing.

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::gaussian_blur_f32;

use crate::{
    algorithms::{dilate, laplacian_magnitude, percentile},
    types::DepthMetrics,
};

pub const SHARPNESS_WEIGHT: f64 = 0.45;
pub const SHADOW_WEIGHT: f64 = 0.35;
pub const PERSPECTIVE_WEIGHT: f64 = 0.20;

/// Fused variance at or above this value counts as a layered composition
pub const LAYER_VARIANCE: f64 = 0.02;
const ELEVATION_VARIANCE: [f64; 3] = [LAYER_VARIANCE, 0.05, 0.12];

/// Pixels darker than this share of the mean lightness count as shadow
const SHADOW_RATIO: f64 = 0.7;
const EDGE_DILATION: u8 = 2;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const BLUR_SIGMA: f32 = 1.0;

/// Single-channel floating point image holding one cue
pub type CueImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Per-pixel depth values backed by a floating point image
#[derive(Debug, Clone, PartialEq)]
pub struct DepthMap {
    pub image: CueImage,
}

impl DepthMap {
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f64) -> Self {
        Self {
            image: ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y) as f32])),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Row-major values
    pub fn values(&self) -> Vec<f64> {
        self.image.pixels().map(|p| p[0] as f64).collect()
    }

    pub fn mean(&self) -> f64 {
        let count = self.image.len();
        if count == 0 {
            return 0.0;
        }
        self.image.pixels().map(|p| p[0] as f64).sum::<f64>() / count as f64
    }

    /// Population variance
    pub fn variance(&self) -> f64 {
        let count = self.image.len();
        if count == 0 {
            return 0.0;
        }
        let mean = self.mean();
        self.image.pixels().map(|p| (p[0] as f64 - mean).powi(2)).sum::<f64>() / count as f64
    }

    fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        let mut image = self.image.clone();
        for p in image.pixels_mut() {
            p[0] = f(p[0] as f64) as f32;
        }
        Self { image }
    }

    /// Gaussian blur with the cue smoothing sigma
    pub fn blurred(&self) -> Self {
        if self.image.is_empty() {
            return self.clone();
        }
        Self {
            image: gaussian_blur_f32(&self.image, BLUR_SIGMA),
        }
    }

    /// Rescale so the 2nd percentile maps to 0 and the 98th to 1, clipping
    /// outside. A map without spread becomes all zeros.
    pub fn percentile_normalized(&self) -> Self {
        let values = self.values();
        let low = percentile(&values, 2.0);
        let high = percentile(&values, 98.0);
        let span = high - low;
        if !span.is_finite() || span < 1e-6 {
            return self.map(|_| 0.0);
        }
        self.map(|v| ((v - low) / span).clamp(0.0, 1.0))
    }

    /// Contrast-stretched grayscale rendering
    pub fn to_image(&self) -> GrayImage {
        crate::walkthrough::heatmap(self.width(), self.height(), &self.values())
    }
}

/// The three normalized cues and their weighted fusion
#[derive(Debug, Clone)]
pub struct DepthFusion {
    pub sharpness: DepthMap,
    pub shadow: DepthMap,
    pub perspective: DepthMap,
    pub fused: DepthMap,
}

impl DepthFusion {
    pub fn metrics(&self) -> DepthMetrics {
        let variance = self.fused.variance();
        DepthMetrics {
            average_depth: crate::types::round_to(self.fused.mean(), 4),
            depth_variance: crate::types::round_to(variance, 4),
            has_layers: variance >= LAYER_VARIANCE,
        }
    }

    pub fn elevation(&self) -> u8 {
        elevation_from_variance(self.fused.variance())
    }
}

/// Elevation level 0..=3 from the variance of the fused depth map
pub fn elevation_from_variance(variance: f64) -> u8 {
    ELEVATION_VARIANCE.iter().filter(|&&t| variance >= t).count() as u8
}

fn sharpness_cue(lightness: &GrayImage) -> DepthMap {
    let (width, height) = lightness.dimensions();
    let laplacian = laplacian_magnitude(lightness);
    DepthMap::from_fn(width, height, |x, y| laplacian[(y * width + x) as usize])
        .blurred()
        .percentile_normalized()
}

fn shadow_cue(lightness: &GrayImage) -> DepthMap {
    let (width, height) = lightness.dimensions();
    let blurred = DepthMap::from_fn(width, height, |x, y| lightness.get_pixel(x, y)[0] as f64).blurred();
    let edges = dilate(&imageproc::edges::canny(lightness, CANNY_LOW, CANNY_HIGH), EDGE_DILATION);

    let cutoff = SHADOW_RATIO * blurred.mean();
    if cutoff <= 0.0 {
        return blurred.map(|_| 0.0);
    }
    DepthMap::from_fn(width, height, |x, y| {
        let v = blurred.image.get_pixel(x, y)[0] as f64;
        if edges.get_pixel(x, y)[0] > 0 && v < cutoff {
            (cutoff - v) / cutoff
        } else {
            0.0
        }
    })
    .percentile_normalized()
}

fn perspective_prior(width: u32, height: u32) -> DepthMap {
    DepthMap::from_fn(width, height, |_, y| {
        if height <= 1 {
            1.0
        } else {
            1.0 - y as f64 / (height - 1) as f64
        }
    })
}

/// Fuse the depth cues of a lightness channel.
pub fn fuse(lightness: &GrayImage) -> DepthFusion {
    let (width, height) = lightness.dimensions();
    let sharpness = sharpness_cue(lightness);
    let shadow = shadow_cue(lightness);
    let perspective = perspective_prior(width, height);

    let total = SHARPNESS_WEIGHT + SHADOW_WEIGHT + PERSPECTIVE_WEIGHT;
    let fused = DepthMap::from_fn(width, height, |x, y| {
        let s = sharpness.image.get_pixel(x, y)[0] as f64;
        let d = shadow.image.get_pixel(x, y)[0] as f64;
        let p = perspective.image.get_pixel(x, y)[0] as f64;
        ((SHARPNESS_WEIGHT * s + SHADOW_WEIGHT * d + PERSPECTIVE_WEIGHT * p) / total).clamp(0.0, 1.0)
    });

    DepthFusion {
        sharpness,
        shadow,
        perspective,
        fused,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_flat_lightness_has_no_layers() {
        let fusion = fuse(&GrayImage::from_pixel(48, 48, Luma([140])));
        assert!(fusion.sharpness.values().iter().all(|&v| v == 0.0));
        assert!(fusion.shadow.values().iter().all(|&v| v == 0.0));
        let metrics = fusion.metrics();
        assert!(!metrics.has_layers);
        assert_eq!(fusion.elevation(), 0);
    }

    #[test]
    fn test_fused_values_stay_in_unit_range() {
        let lightness = GrayImage::from_fn(64, 64, |x, y| {
            if (16..48).contains(&x) && (16..48).contains(&y) { Luma([250]) } else { Luma([((x * 7 + y * 3) % 256) as u8]) }
        });
        let fusion = fuse(&lightness);
        assert!(fusion.fused.values().iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(fusion.fused.values().len(), 64 * 64);
    }

    #[test]
    fn test_perspective_runs_top_to_bottom() {
        let prior = perspective_prior(2, 3);
        assert_eq!(prior.values(), vec![1.0, 1.0, 0.5, 0.5, 0.0, 0.0]);
        assert_eq!(perspective_prior(1, 1).values(), vec![1.0]);
    }

    #[test]
    fn test_percentile_normalization() {
        let map = DepthMap::from_fn(101, 1, |x, _| x as f64);
        let normalized = map.percentile_normalized().values();
        assert_eq!(normalized[0], 0.0);
        assert_eq!(normalized[100], 1.0);
        assert!((normalized[50] - 0.5).abs() < 1e-6);

        let flat = DepthMap::from_fn(4, 4, |_, _| 3.0).percentile_normalized();
        assert!(flat.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_blur_preserves_constant_map() {
        let map = DepthMap::from_fn(5, 4, |_, _| 2.0);
        assert!(map.blurred().values().iter().all(|v| (v - 2.0).abs() < 1e-4));
    }

    #[test]
    fn test_blur_spreads_a_spike() {
        let map = DepthMap::from_fn(9, 9, |x, y| if (x, y) == (4, 4) { 1.0 } else { 0.0 });
        let blurred = map.blurred();
        let centre = blurred.image.get_pixel(4, 4)[0];
        let neighbour = blurred.image.get_pixel(5, 4)[0];
        assert!(centre < 1.0 && centre > neighbour && neighbour > 0.0);
        assert!((blurred.mean() - map.mean()).abs() < 1e-3);
    }

    #[test]
    fn test_elevation_thresholds() {
        assert_eq!(elevation_from_variance(0.0), 0);
        assert_eq!(elevation_from_variance(0.02), 1);
        assert_eq!(elevation_from_variance(0.07), 2);
        assert_eq!(elevation_from_variance(0.5), 3);
    }
}

use image::{GrayImage, RgbImage};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use tracing::debug;

use crate::{
    algorithms::{distance_to_nearest, laplacian_magnitude, median, percentile, percentile_sorted},
    color::srgb_to_oklch,
    config::{ExtractionConfig, PipelineVariant},
    error::Result,
    extractors::{
        ExtractorKind,
        depth::{DepthFusion, fuse},
    },
    traits::TokenExtractor,
    types::{ColorSample, DepthStyle, Direction, LuminanceDistribution, ShadowDescriptor, round_to},
    walkthrough::{Walkthrough, heatmap},
};

/// Laplacian mean magnitudes separating elevation levels 0..=3
const STRENGTH_LEVELS: [f64; 3] = [2.0, 5.0, 12.0];
const MAX_BLUR_RADIUS: f64 = 24.0;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const DARK_BELOW: u8 = 85;
const LIGHT_FROM: u8 = 170;
/// Lightness below which a pixel is sampled for the shadow color
const SHADOW_LIGHTNESS: u8 = 50;
const MIN_SHADOW_PIXELS: usize = 100;

#[derive(Debug, Clone)]
pub struct ShadowAnalysis {
    pub lightness: GrayImage,
    /// |Laplacian| per pixel, row-major
    pub laplacian: Vec<f64>,
    pub edges: GrayImage,
    pub strong_pixels: usize,
    pub fusion: Option<DepthFusion>,
    pub descriptor: ShadowDescriptor,
}

pub fn elevation_from_strength(strength: f64) -> u8 {
    STRENGTH_LEVELS.iter().filter(|&&t| strength >= t).count() as u8
}

/// Dominant light direction from the mean gradient of the strongest pixels.
///
/// Returns the compass angle in degrees alongside the number of pixels used.
fn light_direction(lightness: &GrayImage) -> (Option<f64>, usize) {
    let gx = horizontal_sobel(lightness);
    let gy = vertical_sobel(lightness);
    let vectors: Vec<(f64, f64)> = gx
        .pixels()
        .zip(gy.pixels())
        .map(|(x, y)| (x[0] as f64, y[0] as f64))
        .collect();
    let magnitudes: Vec<f64> = vectors.iter().map(|(x, y)| x.hypot(*y)).collect();
    let cutoff = percentile(&magnitudes, 90.0);

    let (mut sum_x, mut sum_y, mut count) = (0.0, 0.0, 0usize);
    for ((x, y), m) in vectors.iter().zip(&magnitudes) {
        if *m >= cutoff && *m > 0.0 {
            sum_x += x;
            sum_y += y;
            count += 1;
        }
    }
    if count == 0 {
        return (None, 0);
    }

    let (mean_x, mean_y) = (sum_x / count as f64, sum_y / count as f64);
    if mean_x.hypot(mean_y) < 1e-9 {
        return (None, count);
    }
    // Image y grows downward; the shadow falls opposite the brightening
    let angle = mean_y.atan2(-mean_x).to_degrees().rem_euclid(360.0);
    (Some(angle), count)
}

/// Median distance from non-edge pixels to the nearest edge, capped.
fn blur_radius(edges: &GrayImage) -> f64 {
    let Some(distances) = distance_to_nearest(edges) else {
        return 0.0;
    };
    let off_edge: Vec<f64> = edges
        .pixels()
        .zip(distances)
        .filter(|(p, _)| p[0] == 0)
        .map(|(_, d)| d)
        .collect();
    median(&off_edge).min(MAX_BLUR_RADIUS)
}

fn distribution(lightness: &GrayImage) -> LuminanceDistribution {
    let total = (lightness.width() * lightness.height()).max(1) as f64;
    let dark = lightness.pixels().filter(|p| p[0] < DARK_BELOW).count() as f64 / total;
    let light = lightness.pixels().filter(|p| p[0] >= LIGHT_FROM).count() as f64 / total;
    LuminanceDistribution { dark, mid: 1.0 - dark - light, light }
}

fn depth_style(distribution: &LuminanceDistribution) -> DepthStyle {
    let LuminanceDistribution { dark, mid, light } = *distribution;
    if dark > 0.4 && light > 0.2 {
        DepthStyle::HighContrast
    } else if dark > 0.5 {
        DepthStyle::DarkDominant
    } else if light > 0.5 {
        DepthStyle::LightDominant
    } else if mid > 0.6 {
        DepthStyle::Flat
    } else {
        DepthStyle::Balanced
    }
}

/// Mean color of the darkest pixels, when there are enough of them
fn shadow_color(image: &RgbImage, lightness: &GrayImage) -> Option<ColorSample> {
    let mut sum = [0u64; 3];
    let mut count = 0usize;
    for (rgb, l) in image.pixels().zip(lightness.pixels()) {
        if l[0] < SHADOW_LIGHTNESS {
            for (s, c) in sum.iter_mut().zip(rgb.0) {
                *s += c as u64;
            }
            count += 1;
        }
    }
    if count < MIN_SHADOW_PIXELS {
        return None;
    }
    let mean = sum.map(|s| (s as f64 / count as f64).round().clamp(0.0, 255.0) as u8);
    Some(srgb_to_oklch(mean).rounded())
}

/// Elevation and shadow character of the screenshot
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowExtractor {
    pub variant: PipelineVariant,
}

impl ShadowExtractor {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self { variant: config.variant }
    }

    pub fn analyze(&self, image: &RgbImage) -> Result<ShadowAnalysis> {
        let lightness = crate::algorithms::lightness_channel(image);

        let laplacian = laplacian_magnitude(&lightness);
        let strength = if laplacian.is_empty() {
            0.0
        } else {
            laplacian.iter().sum::<f64>() / laplacian.len() as f64
        };

        let (angle, strong_pixels) = light_direction(&lightness);
        let (direction, direction_angle) = match angle {
            Some(angle) => (Direction::from_angle(angle), round_to(angle, 1)),
            None => (Direction::Ambient, 0.0),
        };

        let edges = imageproc::edges::canny(&lightness, CANNY_LOW, CANNY_HIGH);
        let blur = blur_radius(&edges);

        let mut sorted: Vec<f64> = lightness.pixels().map(|p| p[0] as f64).collect();
        sorted.sort_by(f64::total_cmp);
        let contrast = (percentile_sorted(&sorted, 95.0) - percentile_sorted(&sorted, 5.0)) / 255.0;

        let distribution = distribution(&lightness);
        let style = depth_style(&distribution);

        let fusion = match self.variant {
            PipelineVariant::Standard => None,
            PipelineVariant::Extended => Some(fuse(&lightness)),
        };
        let elevation = match &fusion {
            Some(fusion) => fusion.elevation(),
            None => elevation_from_strength(strength),
        };

        let values = [strength, direction_angle, blur, contrast, distribution.dark, distribution.light];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ExtractorKind::Elevation.failure(format!("non-finite shadow measurement in {values:?}")));
        }

        let descriptor = ShadowDescriptor {
            elevation,
            shadow_strength: round_to(strength, 2),
            direction,
            direction_angle,
            blur_radius: round_to(blur, 2),
            contrast: round_to(contrast, 3),
            depth_style: style,
            distribution: LuminanceDistribution {
                dark: round_to(distribution.dark, 3),
                mid: round_to(distribution.mid, 3),
                light: round_to(distribution.light, 3),
            },
            shadow_color: shadow_color(image, &lightness),
            depth_metrics: fusion.as_ref().map(DepthFusion::metrics),
        };

        debug!(
            elevation = descriptor.elevation,
            strength = descriptor.shadow_strength,
            direction = ?descriptor.direction,
            style = ?descriptor.depth_style,
            "Extracted elevation"
        );

        Ok(ShadowAnalysis {
            lightness,
            laplacian,
            edges,
            strong_pixels,
            fusion,
            descriptor,
        })
    }
}

impl TokenExtractor for ShadowExtractor {
    type Output = ShadowDescriptor;

    fn extract(&self, image: &RgbImage) -> Result<ShadowDescriptor> {
        Ok(self.analyze(image)?.descriptor)
    }

    fn walkthrough(&self, image: &RgbImage) -> Result<(ShadowDescriptor, Walkthrough)> {
        let analysis = self.analyze(image)?;
        let descriptor = &analysis.descriptor;
        let (width, height) = analysis.lightness.dimensions();
        let mut walkthrough = Walkthrough::new(ExtractorKind::Elevation);

        walkthrough.visualize("lightness", analysis.lightness.clone());
        walkthrough.visualize("laplacian", heatmap(width, height, &analysis.laplacian));
        walkthrough.visualize("edges", analysis.edges.clone());

        walkthrough.explain(format!(
            "Mean Laplacian magnitude of the lightness channel is {}.",
            descriptor.shadow_strength
        ));
        match descriptor.direction {
            Direction::Ambient => walkthrough.explain("No dominant gradient direction, lighting reads as ambient."),
            direction => walkthrough.explain(format!(
                "{} strong gradient pixels point the shadow {:?} at {}°.",
                analysis.strong_pixels, direction, descriptor.direction_angle
            )),
        }
        walkthrough.explain(format!(
            "Median distance to the nearest edge gives a blur radius of {}px.",
            descriptor.blur_radius
        ));
        walkthrough.explain(format!(
            "Lightness splits {} dark, {} mid, {} light: {:?}.",
            descriptor.distribution.dark, descriptor.distribution.mid, descriptor.distribution.light, descriptor.depth_style
        ));

        if let Some(fusion) = &analysis.fusion {
            walkthrough.visualize("sharpness cue", fusion.sharpness.to_image());
            walkthrough.visualize("shadow cue", fusion.shadow.to_image());
            walkthrough.visualize("perspective prior", fusion.perspective.to_image());
            walkthrough.visualize("fused depth", fusion.fused.to_image());
            let metrics = fusion.metrics();
            walkthrough.explain(format!(
                "Fused depth averages {} with variance {}, elevation {}.",
                metrics.average_depth, metrics.depth_variance, descriptor.elevation
            ));
        } else {
            walkthrough.explain(format!("Elevation level {} from the Laplacian strength.", descriptor.elevation));
        }

        Ok((analysis.descriptor, walkthrough))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    /// A light page with a card and a soft dark band beneath it
    fn card_with_shadow() -> RgbImage {
        RgbImage::from_fn(128, 128, |x, y| {
            if (24..104).contains(&x) && (24..80).contains(&y) {
                Rgb([255, 255, 255])
            } else if (28..108).contains(&x) && (80..88).contains(&y) {
                Rgb([90, 90, 100])
            } else {
                Rgb([225, 225, 230])
            }
        })
    }

    #[test]
    fn test_flat_image_is_ground_level() {
        let image = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let shadow = ShadowExtractor::default().extract(&image).expect("Should extract");
        assert_eq!(shadow.elevation, 0);
        assert_eq!(shadow.shadow_strength, 0.0);
        assert_eq!(shadow.direction, Direction::Ambient);
        assert_eq!(shadow.blur_radius, 0.0);
        assert_eq!(shadow.contrast, 0.0);
        assert_eq!(shadow.depth_style, DepthStyle::Flat);
        assert!(shadow.shadow_color.is_none());
        assert!(shadow.depth_metrics.is_none());
    }

    #[test]
    fn test_distribution_sums_to_one() {
        let shadow = ShadowExtractor::default().extract(&card_with_shadow()).expect("Should extract");
        let d = shadow.distribution;
        assert!((d.dark + d.mid + d.light - 1.0).abs() < 0.002);
        assert!(shadow.elevation <= 3);
        assert!(shadow.blur_radius > 0.0 && shadow.blur_radius <= MAX_BLUR_RADIUS);
    }

    #[test]
    fn test_dark_image_has_shadow_color() {
        let image = RgbImage::from_pixel(32, 32, Rgb([10, 10, 40]));
        let shadow = ShadowExtractor::default().extract(&image).expect("Should extract");
        assert_eq!(shadow.depth_style, DepthStyle::DarkDominant);
        assert_eq!(shadow.shadow_color, Some(srgb_to_oklch([10, 10, 40]).rounded()));
    }

    #[test]
    fn test_extended_variant_adds_depth_metrics() {
        let extractor = ShadowExtractor { variant: PipelineVariant::Extended };
        let flat = extractor
            .extract(&RgbImage::from_pixel(48, 48, Rgb([200, 200, 200])))
            .expect("Should extract");
        let metrics = flat.depth_metrics.expect("Extended variant reports depth");
        assert!(!metrics.has_layers);
        assert_eq!(flat.elevation, 0);
    }

    #[test]
    fn test_strength_levels() {
        assert_eq!(elevation_from_strength(0.0), 0);
        assert_eq!(elevation_from_strength(3.0), 1);
        assert_eq!(elevation_from_strength(7.5), 2);
        assert_eq!(elevation_from_strength(40.0), 3);
    }

    #[test]
    fn test_depth_style_priority() {
        let style = |dark, mid, light| depth_style(&LuminanceDistribution { dark, mid, light });
        assert_eq!(style(0.45, 0.3, 0.25), DepthStyle::HighContrast);
        assert_eq!(style(0.6, 0.3, 0.1), DepthStyle::DarkDominant);
        assert_eq!(style(0.1, 0.3, 0.6), DepthStyle::LightDominant);
        assert_eq!(style(0.1, 0.7, 0.2), DepthStyle::Flat);
        assert_eq!(style(0.3, 0.4, 0.3), DepthStyle::Balanced);
    }

    #[test]
    fn test_walkthrough_matches_extract() {
        let extractor = ShadowExtractor { variant: PipelineVariant::Extended };
        let image = card_with_shadow();
        let (descriptor, walkthrough) = extractor.walkthrough(&image).expect("Should explain");
        assert_eq!(descriptor, extractor.extract(&image).expect("Should extract"));
        assert_eq!(walkthrough.visualizations.len(), 7);
    }
}

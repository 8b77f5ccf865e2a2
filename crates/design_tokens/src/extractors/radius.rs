use std::f64::consts::PI;

use image::{GrayImage, RgbImage};
use tracing::debug;

use crate::{
    algorithms::{RADIUS_SNAP_POINTS, external_outlines, grayscale, quantize},
    error::Result,
    extractors::ExtractorKind,
    traits::TokenExtractor,
    walkthrough::Walkthrough,
};

const CANNY_LOW: f32 = 80.0;
const CANNY_HIGH: f32 = 160.0;
const MIN_AREA: f64 = 200.0;
/// Polygon approximation tolerance as a share of the perimeter
const APPROXIMATION_RATIO: f64 = 0.02;
const MAX_SAMPLES: usize = 50;

#[derive(Debug, Clone)]
pub struct RadiusAnalysis {
    pub edges: GrayImage,
    pub outlines: usize,
    pub radii: Vec<f64>,
    pub scale: Vec<u32>,
}

/// Corner radius scale from the outlines of shapes in the screenshot
#[derive(Debug, Clone, Copy, Default)]
pub struct BorderRadiusExtractor;

impl BorderRadiusExtractor {
    pub fn analyze(&self, image: &RgbImage) -> RadiusAnalysis {
        let edges = imageproc::edges::canny(&grayscale(image), CANNY_LOW, CANNY_HIGH);
        let outlines = external_outlines(&edges);

        let mut radii = Vec::new();
        for outline in &outlines {
            if outline.area() < MIN_AREA {
                continue;
            }
            let perimeter = outline.perimeter();
            if outline.approximate_vertices(APPROXIMATION_RATIO * perimeter) >= 4 {
                // Radius of the circle with the same perimeter
                radii.push(perimeter / (2.0 * PI));
                if radii.len() == MAX_SAMPLES {
                    break;
                }
            }
        }
        let scale = quantize(&radii, &RADIUS_SNAP_POINTS);

        debug!(outlines = outlines.len(), samples = radii.len(), ?scale, "Extracted border radius scale");

        RadiusAnalysis { edges, outlines: outlines.len(), radii, scale }
    }
}

impl TokenExtractor for BorderRadiusExtractor {
    type Output = Vec<u32>;

    fn extract(&self, image: &RgbImage) -> Result<Vec<u32>> {
        Ok(self.analyze(image).scale)
    }

    fn walkthrough(&self, image: &RgbImage) -> Result<(Vec<u32>, Walkthrough)> {
        let analysis = self.analyze(image);
        let mut walkthrough = Walkthrough::new(ExtractorKind::BorderRadius);

        walkthrough.visualize("edges", analysis.edges.clone());
        walkthrough.explain(format!(
            "Edge detection found {} outer outlines.",
            analysis.outlines
        ));
        walkthrough.explain(format!(
            "{} outlines enclose at least {MIN_AREA} px² and approximate to a polygon of four or more corners.",
            analysis.radii.len()
        ));
        walkthrough.explain(format!("Snapped to the radius scale {:?}.", analysis.scale));

        Ok((analysis.scale, walkthrough))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_flat_image_has_no_radius() {
        let image = RgbImage::from_pixel(64, 64, Rgb([240, 240, 240]));
        assert!(BorderRadiusExtractor.extract(&image).expect("Should extract").is_empty());
    }

    #[test]
    fn test_card_yields_snapped_radius() {
        let image = RgbImage::from_fn(160, 160, |x, y| {
            if (40..120).contains(&x) && (40..120).contains(&y) {
                Rgb([30, 30, 30])
            } else {
                Rgb([250, 250, 250])
            }
        });
        let analysis = BorderRadiusExtractor.analyze(&image);
        assert!(!analysis.radii.is_empty());
        assert!(analysis.scale.iter().all(|r| RADIUS_SNAP_POINTS.contains(r)));
        // An 80px square has a perimeter-equivalent radius well above the scale
        assert_eq!(analysis.scale, vec![32]);
    }

    #[test]
    fn test_tiny_shapes_ignored() {
        let image = RgbImage::from_fn(64, 64, |x, y| {
            if (30..36).contains(&x) && (30..36).contains(&y) {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        assert!(BorderRadiusExtractor.extract(&image).expect("Should extract").is_empty());
    }
}

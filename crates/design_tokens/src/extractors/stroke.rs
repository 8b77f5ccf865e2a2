use image::{GrayImage, RgbImage};
use tracing::{debug, trace};

use crate::{
    algorithms::{STROKE_SNAP_POINTS, dilate, erode, foreground_distance, grayscale, invert, otsu_binarize, quantize},
    error::Result,
    extractors::ExtractorKind,
    traits::TokenExtractor,
    walkthrough::{Walkthrough, heatmap},
};

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
/// Two passes of a 3x3 dilation
const EDGE_DILATION: u8 = 2;
const MAX_SAMPLES: usize = 200;

/// Where the half-width samples came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeSource {
    Boundary,
    Edges,
    None,
}

#[derive(Debug, Clone)]
pub struct StrokeAnalysis {
    pub ink: GrayImage,
    /// Pixels that were sampled: the ink boundary, or the dilated edges
    pub sampled: GrayImage,
    pub distances: Vec<f64>,
    pub source: StrokeSource,
    /// Full widths (half widths doubled), at most 200
    pub widths: Vec<f64>,
    pub scale: Vec<u32>,
}

/// Distance values under the nonzero pixels of `mask`, row-major.
fn sample_under(mask: &GrayImage, distances: &[f64]) -> Vec<f64> {
    mask.pixels()
        .zip(distances)
        .filter(|(p, _)| p[0] > 0)
        .map(|(_, &d)| d)
        .collect()
}

/// Stroke widths from the distance transform of the dark ink
#[derive(Debug, Clone, Copy, Default)]
pub struct StrokeWidthExtractor;

impl StrokeWidthExtractor {
    pub fn analyze(&self, image: &RgbImage) -> StrokeAnalysis {
        let gray = grayscale(image);
        let ink = invert(&otsu_binarize(&gray));

        // One pixel ring inside each ink region
        let eroded = erode(&ink, 1);
        let boundary = GrayImage::from_fn(ink.width(), ink.height(), |x, y| {
            image::Luma([ink.get_pixel(x, y)[0].saturating_sub(eroded.get_pixel(x, y)[0])])
        });

        let distances = foreground_distance(&ink).unwrap_or_default();
        let mut samples = sample_under(&boundary, &distances);
        let (mut sampled, mut source, mut distances) = (boundary, StrokeSource::Boundary, distances);

        if samples.iter().all(|&d| d < 0.5) {
            trace!("No usable ink boundary, measuring dilated edges");
            let edges = dilate(&imageproc::edges::canny(&gray, CANNY_LOW, CANNY_HIGH), EDGE_DILATION);
            distances = foreground_distance(&edges).unwrap_or_default();
            samples = distances.iter().copied().filter(|&d| d > 0.0).collect();
            sampled = edges;
            source = StrokeSource::Edges;
        }
        if samples.is_empty() {
            source = StrokeSource::None;
        }

        let widths: Vec<f64> = samples.iter().take(MAX_SAMPLES).map(|d| d * 2.0).collect();
        let scale = if widths.is_empty() {
            vec![1]
        } else {
            quantize(&widths, &STROKE_SNAP_POINTS)
        };

        debug!(?source, samples = widths.len(), ?scale, "Extracted stroke widths");

        StrokeAnalysis { ink, sampled, distances, source, widths, scale }
    }
}

impl TokenExtractor for StrokeWidthExtractor {
    type Output = Vec<u32>;

    fn extract(&self, image: &RgbImage) -> Result<Vec<u32>> {
        Ok(self.analyze(image).scale)
    }

    fn walkthrough(&self, image: &RgbImage) -> Result<(Vec<u32>, Walkthrough)> {
        let analysis = self.analyze(image);
        let (width, height) = analysis.ink.dimensions();
        let mut walkthrough = Walkthrough::new(ExtractorKind::StrokeWidth);

        walkthrough.visualize("ink", analysis.ink.clone());
        walkthrough.visualize("sampled pixels", analysis.sampled.clone());
        if analysis.distances.len() == (width * height) as usize {
            walkthrough.visualize("distance transform", heatmap(width, height, &analysis.distances));
        }

        walkthrough.explain(match analysis.source {
            StrokeSource::Boundary => "Measured the distance to the background along the inner edge of the ink.",
            StrokeSource::Edges => "The ink had no measurable boundary, so edges were dilated and measured instead.",
            StrokeSource::None => "Nothing to measure, falling back to a 1px stroke.",
        });
        walkthrough.explain(format!(
            "Doubled {} half widths and snapped them to {:?}.",
            analysis.widths.len(),
            analysis.scale
        ));

        Ok((analysis.scale, walkthrough))
    }
}

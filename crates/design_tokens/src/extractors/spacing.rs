use image::{GrayImage, Luma, RgbImage};
use imageproc::region_labelling::{Connectivity, connected_components};
use tracing::debug;

use crate::{
    algorithms::{SPACING_SNAP_POINTS, grayscale, otsu_binarize, quantize},
    error::Result,
    extractors::ExtractorKind,
    traits::TokenExtractor,
    walkthrough::Walkthrough,
};

/// Offsets outside this open interval are ignored
const MIN_OFFSET: u32 = 2;
const MAX_OFFSET: u32 = 200;
const MAX_SAMPLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct SpacingAnalysis {
    pub binary: GrayImage,
    /// One box per foreground component, in label order
    pub boxes: Vec<BoundingBox>,
    pub offsets: Vec<f64>,
    pub scale: Vec<u32>,
}

/// Bounding boxes of the 8-connected foreground components.
pub fn component_boxes(binary: &GrayImage) -> Vec<BoundingBox> {
    let labels = connected_components(binary, Connectivity::Eight, Luma([0u8]));

    // (min_x, min_y, max_x, max_y) per label; label 0 is the background
    let mut extents: Vec<Option<(u32, u32, u32, u32)>> = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if extents.len() < label {
            extents.resize(label, None);
        }
        let slot = &mut extents[label - 1];
        *slot = Some(match *slot {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }

    extents
        .into_iter()
        .flatten()
        .map(|(x0, y0, x1, y1)| BoundingBox {
            x: x0,
            y: y0,
            width: x1 - x0 + 1,
            height: y1 - y0 + 1,
        })
        .collect()
}

/// Horizontal and vertical offsets between box origins, collected pair by
/// pair in component order and capped at the first hundred values.
pub fn origin_offsets(boxes: &[BoundingBox]) -> Vec<f64> {
    let in_range = |d: u32| d > MIN_OFFSET && d < MAX_OFFSET;
    let mut offsets = Vec::new();

    'pairs: for (i, a) in boxes.iter().enumerate() {
        for b in &boxes[i + 1..] {
            for d in [a.x.abs_diff(b.x), a.y.abs_diff(b.y)] {
                if in_range(d) {
                    offsets.push(d as f64);
                    if offsets.len() == MAX_SAMPLES {
                        break 'pairs;
                    }
                }
            }
        }
    }

    offsets
}

/// Spacing scale from the offsets between component bounding boxes
#[derive(Debug, Clone, Copy, Default)]
pub struct SpacingExtractor;

impl SpacingExtractor {
    pub fn analyze(&self, image: &RgbImage) -> SpacingAnalysis {
        let binary = otsu_binarize(&grayscale(image));
        let boxes = component_boxes(&binary);
        let offsets = origin_offsets(&boxes);
        let scale = quantize(&offsets, &SPACING_SNAP_POINTS);

        debug!(components = boxes.len(), samples = offsets.len(), ?scale, "Extracted spacing scale");

        SpacingAnalysis { binary, boxes, offsets, scale }
    }
}

impl TokenExtractor for SpacingExtractor {
    type Output = Vec<u32>;

    fn extract(&self, image: &RgbImage) -> Result<Vec<u32>> {
        Ok(self.analyze(image).scale)
    }

    fn walkthrough(&self, image: &RgbImage) -> Result<(Vec<u32>, Walkthrough)> {
        let analysis = self.analyze(image);
        let mut walkthrough = Walkthrough::new(ExtractorKind::Spacing);

        let mut boxes = GrayImage::new(analysis.binary.width(), analysis.binary.height());
        for b in &analysis.boxes {
            for x in b.x..b.x + b.width {
                boxes.put_pixel(x, b.y, Luma([255]));
                boxes.put_pixel(x, b.y + b.height - 1, Luma([255]));
            }
            for y in b.y..b.y + b.height {
                boxes.put_pixel(b.x, y, Luma([255]));
                boxes.put_pixel(b.x + b.width - 1, y, Luma([255]));
            }
        }

        walkthrough.visualize("binary", analysis.binary.clone());
        walkthrough.visualize("bounding boxes", boxes);
        walkthrough.explain(format!(
            "Automatic thresholding separated {} foreground components.",
            analysis.boxes.len()
        ));
        walkthrough.explain(format!(
            "Collected {} origin offsets between {MIN_OFFSET} and {MAX_OFFSET} px.",
            analysis.offsets.len()
        ));
        walkthrough.explain(format!("Snapped to the spacing scale {:?}.", analysis.scale));

        Ok((analysis.scale, walkthrough))
    }
}

//! Explanation mode: intermediate images and plain-language notes for each
//! extractor. Presentation only; the numbers come from the same analysis
//! functions that back regular extraction.

use image::{DynamicImage, GrayImage, Luma};
use serde::Serialize;

use crate::extractors::ExtractorKind;

/// A labeled intermediate image
#[derive(Debug, Clone)]
pub struct Visualization {
    pub label: String,
    pub image: DynamicImage,
}

#[derive(Debug, Clone)]
pub struct Walkthrough {
    pub kind: ExtractorKind,
    pub visualizations: Vec<Visualization>,
    pub explanations: Vec<String>,
}

/// Serializable part of a walkthrough (images are written separately)
#[derive(Debug, Clone, Serialize)]
pub struct WalkthroughSummary {
    pub extractor: String,
    pub visualizations: Vec<String>,
    pub explanations: Vec<String>,
}

impl Walkthrough {
    pub fn new(kind: ExtractorKind) -> Self {
        Self {
            kind,
            visualizations: Vec::new(),
            explanations: Vec::new(),
        }
    }

    pub fn visualize(&mut self, label: impl Into<String>, image: impl Into<DynamicImage>) {
        self.visualizations.push(Visualization {
            label: label.into(),
            image: image.into(),
        });
    }

    pub fn explain(&mut self, text: impl Into<String>) {
        self.explanations.push(text.into());
    }

    pub fn summary(&self) -> WalkthroughSummary {
        WalkthroughSummary {
            extractor: self.kind.to_string(),
            visualizations: self.visualizations.iter().map(|v| v.label.clone()).collect(),
            explanations: self.explanations.clone(),
        }
    }
}

/// Stretch a float map onto 0..255 for display
pub fn heatmap(width: u32, height: u32, values: &[f64]) -> GrayImage {
    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;

    GrayImage::from_fn(width, height, |x, y| {
        let v = values[(y * width + x) as usize];
        if !v.is_finite() || range <= 0.0 {
            Luma([0])
        } else {
            Luma([((v - min) / range * 255.0).round() as u8])
        }
    })
}

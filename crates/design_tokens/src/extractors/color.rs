use image::{Rgb, RgbImage};
use tracing::debug;

use crate::{
    algorithms::resize_for_width,
    color::{Clustering, KMeansConfig, MIN_DELTA_E, delta_e, kmeans, srgb_to_oklch},
    config::{ExtractionConfig, PALETTE_MAX_WIDTH},
    error::Result,
    extractors::ExtractorKind,
    traits::TokenExtractor,
    types::{ColorAnalysis, ColorSample, ColorTokens},
    walkthrough::Walkthrough,
};

pub const MAX_PALETTE_SIZE: usize = 8;

/// A cluster centroid truncated to 8-bit channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedColor {
    pub rgb: [u8; 3],
    pub population: usize,
}

/// Intermediate state of the palette extraction
#[derive(Debug, Clone)]
pub struct PaletteAnalysis {
    pub downscaled: RgbImage,
    pub clustering: Clustering,
    pub ranked: Vec<RankedColor>,
    /// Centroids surviving the Delta-E deduplication, at most eight
    pub kept: Vec<RankedColor>,
    pub tokens: ColorTokens,
}

/// Dominant-color clustering with perceptual deduplication
#[derive(Debug, Clone)]
pub struct ColorExtractor {
    pub max_width: u32,
    pub kmeans: KMeansConfig,
}

impl Default for ColorExtractor {
    fn default() -> Self {
        Self {
            max_width: PALETTE_MAX_WIDTH,
            kmeans: KMeansConfig::default(),
        }
    }
}

/// Walk the ranked centroids, keeping each one that differs from every
/// kept color by at least the minimum Delta-E.
pub fn deduplicate(ranked: &[RankedColor]) -> Vec<RankedColor> {
    let mut kept: Vec<RankedColor> = Vec::new();
    for candidate in ranked {
        if kept.len() == MAX_PALETTE_SIZE {
            break;
        }
        if kept.iter().all(|k| delta_e(k.rgb, candidate.rgb) >= MIN_DELTA_E) {
            kept.push(*candidate);
        }
    }
    kept
}

impl ColorExtractor {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            max_width: config.palette_max_width,
            ..Self::default()
        }
    }

    pub fn analyze(&self, image: &RgbImage) -> Result<PaletteAnalysis> {
        let downscaled = resize_for_width(image, self.max_width)?;
        let points: Vec<[f64; 3]> = downscaled
            .pixels()
            .map(|p| p.0.map(|c| c as f64))
            .collect();

        let clustering = kmeans(&points, &self.kmeans);
        let ranked: Vec<RankedColor> = clustering
            .ranked()
            .into_iter()
            .map(|(center, population)| RankedColor {
                rgb: center.map(|c| c.clamp(0.0, 255.0) as u8),
                population,
            })
            .collect();

        let kept = deduplicate(&ranked);
        let palette: Vec<ColorSample> = kept
            .iter()
            .map(|c| srgb_to_oklch(c.rgb).rounded())
            .collect();
        let analysis = ColorAnalysis::from_palette(&palette);

        debug!(
            clusters = ranked.len(),
            palette = palette.len(),
            harmony = ?analysis.harmony.kind,
            "Extracted color palette"
        );

        Ok(PaletteAnalysis {
            downscaled,
            clustering,
            ranked,
            kept,
            tokens: ColorTokens { palette, analysis },
        })
    }
}

impl TokenExtractor for ColorExtractor {
    type Output = ColorTokens;

    fn extract(&self, image: &RgbImage) -> Result<ColorTokens> {
        Ok(self.analyze(image)?.tokens)
    }

    fn walkthrough(&self, image: &RgbImage) -> Result<(ColorTokens, Walkthrough)> {
        let analysis = self.analyze(image)?;
        let mut walkthrough = Walkthrough::new(ExtractorKind::Color);

        let centers = &analysis.clustering.centers;
        let (width, height) = analysis.downscaled.dimensions();
        let quantized = RgbImage::from_fn(width, height, |x, y| {
            let label = analysis.clustering.labels[(y * width + x) as usize];
            Rgb(centers[label].map(|c| c.clamp(0.0, 255.0) as u8))
        });

        walkthrough.visualize("downscaled", analysis.downscaled.clone());
        walkthrough.visualize("clusters", quantized);

        walkthrough.explain(format!(
            "Downscaled to {width}x{height} and grouped {} pixels into {} color clusters.",
            analysis.clustering.labels.len(),
            centers.len()
        ));
        for (rank, color) in analysis.ranked.iter().enumerate() {
            let [r, g, b] = color.rgb;
            let verdict = if analysis.kept.contains(color) {
                "kept"
            } else {
                "dropped as a near duplicate or beyond the palette limit"
            };
            walkthrough.explain(format!(
                "#{} rgb({r}, {g}, {b}) covers {} pixels: {verdict}.",
                rank + 1,
                color.population
            ));
        }
        let harmony = &analysis.tokens.analysis.harmony;
        walkthrough.explain(format!(
            "Harmony reads as {:?} with strength {} over a hue range of {}°.",
            harmony.kind, harmony.strength, harmony.hue_range
        ));
        walkthrough.explain(format!(
            "{} of {} color pairs pass WCAG AA for body text.",
            analysis.tokens.analysis.contrast.summary.aa_normal_pass,
            analysis.tokens.analysis.contrast.summary.total_pairs
        ));

        Ok((analysis.tokens, walkthrough))
    }
}

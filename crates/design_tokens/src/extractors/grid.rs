use std::collections::BTreeMap;

use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

use crate::{
    algorithms::{SPACING_SNAP_POINTS, grayscale, nearest},
    config::{ExtractionConfig, PipelineVariant},
    error::Result,
    extractors::ExtractorKind,
    traits::TokenExtractor,
    types::GridDescriptor,
    walkthrough::Walkthrough,
};

/// Minimum jump in mean luminance between neighbouring columns (or rows)
const TRANSITION_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone)]
pub struct GridAnalysis {
    pub column_profile: Vec<f64>,
    pub row_profile: Vec<f64>,
    pub column_transitions: Vec<usize>,
    pub row_transitions: Vec<usize>,
    pub descriptor: GridDescriptor,
}

/// Mean luminance of every column and every row
pub fn projections(gray: &GrayImage) -> (Vec<f64>, Vec<f64>) {
    let (width, height) = gray.dimensions();
    let mut columns = vec![0.0; width as usize];
    let mut rows = vec![0.0; height as usize];

    for (x, y, pixel) in gray.enumerate_pixels() {
        let v = pixel[0] as f64;
        columns[x as usize] += v;
        rows[y as usize] += v;
    }
    columns.iter_mut().for_each(|c| *c /= height as f64);
    rows.iter_mut().for_each(|r| *r /= width as f64);

    (columns, rows)
}

/// Indices `i` where the profile jumps by more than the threshold between
/// `i` and `i + 1`.
pub fn transitions(profile: &[f64]) -> Vec<usize> {
    profile
        .windows(2)
        .enumerate()
        .filter(|(_, w)| (w[1] - w[0]).abs() > TRANSITION_THRESHOLD)
        .map(|(i, _)| i)
        .collect()
}

/// Most frequent gap between consecutive transitions, snapped to the spacing
/// scale. Equal frequencies favour the smaller gap.
pub fn gutter(transitions: &[usize]) -> u32 {
    let mut frequencies: BTreeMap<usize, usize> = BTreeMap::new();
    for w in transitions.windows(2) {
        let gap = w[1] - w[0];
        if gap > 2 && gap < 200 {
            *frequencies.entry(gap).or_default() += 1;
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (&gap, &count) in &frequencies {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((gap, count));
        }
    }

    best.and_then(|(gap, _)| nearest(gap as f64, &SPACING_SNAP_POINTS))
        .unwrap_or(0)
}

/// Column and row structure from luminance projection profiles
#[derive(Debug, Clone, Copy, Default)]
pub struct GridExtractor {
    pub variant: PipelineVariant,
}

impl GridExtractor {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self { variant: config.variant }
    }

    pub fn analyze(&self, image: &RgbImage) -> GridAnalysis {
        let (column_profile, row_profile) = projections(&grayscale(image));
        let column_transitions = transitions(&column_profile);
        let row_transitions = transitions(&row_profile);

        let columns = column_transitions.len().max(1) as u32;
        let descriptor = match self.variant {
            PipelineVariant::Standard => GridDescriptor::Standard {
                columns,
                rows: row_transitions.len().max(1) as u32,
            },
            PipelineVariant::Extended => GridDescriptor::Extended {
                columns,
                gutter: gutter(&column_transitions),
            },
        };

        debug!(?descriptor, "Extracted grid");

        GridAnalysis {
            column_profile,
            row_profile,
            column_transitions,
            row_transitions,
            descriptor,
        }
    }
}

fn profile_chart(profile: &[f64], transitions: &[usize], height: u32) -> GrayImage {
    let mut chart = GrayImage::new(profile.len().max(1) as u32, height);
    for (i, v) in profile.iter().enumerate() {
        let bar = ((v / 255.0) * height as f64).round() as u32;
        for y in height.saturating_sub(bar)..height {
            chart.put_pixel(i as u32, y, Luma([120]));
        }
    }
    for &t in transitions {
        for y in 0..height {
            chart.put_pixel(t as u32, y, Luma([255]));
        }
    }
    chart
}

impl TokenExtractor for GridExtractor {
    type Output = GridDescriptor;

    fn extract(&self, image: &RgbImage) -> Result<GridDescriptor> {
        Ok(self.analyze(image).descriptor)
    }

    fn walkthrough(&self, image: &RgbImage) -> Result<(GridDescriptor, Walkthrough)> {
        let analysis = self.analyze(image);
        let mut walkthrough = Walkthrough::new(ExtractorKind::Grid);

        walkthrough.visualize(
            "column profile",
            profile_chart(&analysis.column_profile, &analysis.column_transitions, 64),
        );
        walkthrough.visualize(
            "row profile",
            profile_chart(&analysis.row_profile, &analysis.row_transitions, 64),
        );
        walkthrough.explain(format!(
            "Averaged luminance along each axis and counted jumps larger than {TRANSITION_THRESHOLD}."
        ));
        walkthrough.explain(format!(
            "{} column transitions and {} row transitions.",
            analysis.column_transitions.len(),
            analysis.row_transitions.len()
        ));
        if let GridDescriptor::Extended { gutter, .. } = analysis.descriptor {
            walkthrough.explain(format!("Most common gap between column transitions snaps to a {gutter}px gutter."));
        }

        Ok((analysis.descriptor, walkthrough))
    }
}

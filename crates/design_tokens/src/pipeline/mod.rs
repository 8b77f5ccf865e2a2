pub mod builder;

use std::{future::Future, sync::Arc, time::Instant};

use image::RgbImage;
use strum::{EnumCount, IntoEnumIterator};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::{
    algorithms::resize_for_width,
    config::{ExecutionMode, ExtractionConfig},
    error::{Result, TokenError},
    extractors::{ExtractorKind, ExtractorOutput},
    types::{Meta, TokenBundle},
    walkthrough::Walkthrough,
};

pub use builder::PipelineBuilder;

/// Runs the six extractors over one screenshot and assembles the bundle.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: ExtractionConfig,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn new(config: ExtractionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Downscale to the shared working width. Fails on an empty image.
    pub fn prepare(&self, image: &RgbImage) -> Result<RgbImage> {
        resize_for_width(image, self.config.working_max_width)
    }

    /// Extract the full token bundle.
    ///
    /// In concurrent mode every extractor runs as its own blocking task over
    /// the shared buffer. If any of them fails the partial results are
    /// discarded and all six are run again one after another.
    pub async fn extract(&self, image: &RgbImage) -> Result<TokenBundle> {
        let started = Instant::now();
        let working = Arc::new(self.prepare(image)?);
        info!(
            width = working.width(),
            height = working.height(),
            mode = %self.config.mode,
            variant = %self.config.variant,
            "Extracting design tokens"
        );

        let bundle = match self.config.mode {
            ExecutionMode::Sequential => sequential_task(working, self.config.clone()).await?,
            ExecutionMode::Concurrent => {
                let attempt = run_concurrent(Arc::clone(&working), &self.config).await;
                settle(attempt, sequential_task(working, self.config.clone())).await?
            }
        };

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            parallel = bundle.meta.parallel,
            "Extraction finished"
        );
        Ok(bundle)
    }

    /// Extract on the calling thread without a runtime.
    pub fn extract_sequential(&self, image: &RgbImage) -> Result<TokenBundle> {
        let working = self.prepare(image)?;
        run_sequential(&working, &self.config)
    }

    /// Extract together with each extractor's intermediate steps.
    pub fn walkthrough(&self, image: &RgbImage) -> Result<(TokenBundle, Vec<Walkthrough>)> {
        let working = self.prepare(image)?;
        let mut outputs = Vec::with_capacity(ExtractorKind::COUNT);
        let mut walkthroughs = Vec::with_capacity(ExtractorKind::COUNT);
        for kind in ExtractorKind::iter() {
            let (output, walkthrough) = kind.walkthrough(&working, &self.config)?;
            outputs.push(output);
            walkthroughs.push(walkthrough);
        }
        Ok((assemble(outputs, false)?, walkthroughs))
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} extractors, {} variant, {} mode, working width {}",
            ExtractorKind::COUNT,
            self.config.variant,
            self.config.mode,
            self.config.working_max_width
        )
    }
}

/// One blocking task per extractor, merged by kind once all have finished.
async fn run_concurrent(image: Arc<RgbImage>, config: &ExtractionConfig) -> Result<TokenBundle> {
    let mut tasks = JoinSet::new();
    for kind in ExtractorKind::iter() {
        let image = Arc::clone(&image);
        let config = config.clone();
        tasks.spawn_blocking(move || kind.run(&image, &config));
    }

    let outputs = collect_outputs(&mut tasks).await?;
    assemble(outputs, true)
}

/// Join every task in the set, keeping the first error.
///
/// The set is always drained, so no extractor is still running when the
/// sequential rerun starts.
pub async fn collect_outputs(tasks: &mut JoinSet<Result<ExtractorOutput>>) -> Result<Vec<ExtractorOutput>> {
    let mut outputs = Vec::with_capacity(tasks.len());
    let mut failure = None;
    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(|e| TokenError::TaskJoin(e.to_string())).and_then(|r| r) {
            Ok(output) => {
                debug!(kind = %output.kind(), "Extractor finished");
                outputs.push(output);
            }
            Err(error) => {
                debug!(%error, "Extractor failed");
                failure.get_or_insert(error);
            }
        }
    }
    match failure {
        Some(error) => Err(error),
        None => Ok(outputs),
    }
}

pub fn run_sequential(image: &RgbImage, config: &ExtractionConfig) -> Result<TokenBundle> {
    let outputs = ExtractorKind::iter()
        .map(|kind| kind.run(image, config))
        .collect::<Result<Vec<_>>>()?;
    assemble(outputs, false)
}

/// Sequential run moved off the async worker threads
async fn sequential_task(image: Arc<RgbImage>, config: ExtractionConfig) -> Result<TokenBundle> {
    tokio::task::spawn_blocking(move || run_sequential(&image, &config))
        .await
        .map_err(|e| TokenError::TaskJoin(e.to_string()))?
}

/// Keep a successful concurrent attempt, or fall back to `retry`.
///
/// The retry future is only polled when the attempt failed.
pub async fn settle<F>(attempt: Result<TokenBundle>, retry: F) -> Result<TokenBundle>
where
    F: Future<Output = Result<TokenBundle>>,
{
    match attempt {
        Ok(bundle) => Ok(bundle),
        Err(error) => {
            warn!(%error, "Concurrent extraction failed, rerunning all extractors sequentially");
            retry.await
        }
    }
}

/// Merge per-kind outputs into a bundle. Every kind must be present.
pub fn assemble(outputs: Vec<ExtractorOutput>, parallel: bool) -> Result<TokenBundle> {
    let (mut color, mut spacing, mut border_radius, mut grid, mut elevation, mut stroke_width) =
        (None, None, None, None, None, None);

    for output in outputs {
        match output {
            ExtractorOutput::Color(v) => color = Some(v),
            ExtractorOutput::Spacing(v) => spacing = Some(v),
            ExtractorOutput::BorderRadius(v) => border_radius = Some(v),
            ExtractorOutput::Grid(v) => grid = Some(v),
            ExtractorOutput::Elevation(v) => elevation = Some(v),
            ExtractorOutput::StrokeWidth(v) => stroke_width = Some(v),
        }
    }

    let color = color.ok_or(TokenError::MissingOutput(ExtractorKind::Color))?;
    Ok(TokenBundle {
        color: color.palette,
        color_analysis: color.analysis,
        spacing: spacing.ok_or(TokenError::MissingOutput(ExtractorKind::Spacing))?,
        border_radius: border_radius.ok_or(TokenError::MissingOutput(ExtractorKind::BorderRadius))?,
        grid: grid.ok_or(TokenError::MissingOutput(ExtractorKind::Grid))?,
        elevation: elevation.ok_or(TokenError::MissingOutput(ExtractorKind::Elevation))?,
        stroke_width: stroke_width.ok_or(TokenError::MissingOutput(ExtractorKind::StrokeWidth))?,
        meta: Meta::heuristic(parallel),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PipelineVariant,
        types::{Direction, GridDescriptor},
    };
    use image::Rgb;

    /// A small settings screen: header bar, two cards, an outlined button
    fn mock_screenshot() -> RgbImage {
        let mut image = RgbImage::from_pixel(320, 240, Rgb([245, 246, 250]));
        let mut fill = |x0: u32, y0: u32, w: u32, h: u32, color: [u8; 3]| {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    image.put_pixel(x, y, Rgb(color));
                }
            }
        };
        fill(0, 0, 320, 32, [30, 60, 140]);
        fill(16, 48, 136, 96, [255, 255, 255]);
        fill(168, 48, 136, 96, [255, 255, 255]);
        fill(16, 160, 120, 40, [220, 60, 50]);
        fill(168, 160, 120, 2, [20, 20, 20]);
        fill(168, 198, 120, 2, [20, 20, 20]);
        fill(168, 160, 2, 40, [20, 20, 20]);
        fill(286, 160, 2, 40, [20, 20, 20]);
        image
    }

    #[tokio::test]
    async fn test_flat_image_tokens() {
        let image = RgbImage::from_pixel(64, 64, Rgb([128, 128, 128]));
        let bundle = Pipeline::default().extract(&image).await.expect("Should extract");

        assert_eq!(bundle.color.len(), 1);
        assert!(bundle.spacing.is_empty());
        assert!(bundle.border_radius.is_empty());
        assert_eq!(bundle.grid, GridDescriptor::Standard { columns: 1, rows: 1 });
        assert_eq!(bundle.elevation.elevation, 0);
        assert_eq!(bundle.elevation.direction, Direction::Ambient);
        assert_eq!(bundle.stroke_width, vec![1]);
        assert!(bundle.meta.parallel);
    }

    #[tokio::test]
    async fn test_concurrent_matches_sequential() {
        let image = mock_screenshot();
        let concurrent = Pipeline::default().extract(&image).await.expect("Should extract");
        let sequential = Pipeline::builder()
            .sequential()
            .build()
            .expect("Should build")
            .extract(&image)
            .await
            .expect("Should extract");

        assert!(concurrent.meta.parallel);
        assert!(!sequential.meta.parallel);
        assert!(concurrent.same_tokens(&sequential));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let image = mock_screenshot();
        let pipeline = Pipeline::default();
        let first = pipeline.extract(&image).await.expect("Should extract");
        let second = pipeline.extract(&image).await.expect("Should extract");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_empty_image_is_fatal() {
        let result = Pipeline::default().extract(&RgbImage::new(0, 0)).await;
        assert!(matches!(result, Err(TokenError::EmptyImage)));
    }

    #[tokio::test]
    async fn test_failed_attempt_falls_back() {
        let image = mock_screenshot();
        let config = ExtractionConfig::default();
        let expected = run_sequential(&image, &config).expect("Should extract");

        let failed: Result<TokenBundle> = Err(TokenError::TaskJoin("extractor panicked".into()));
        let settled = settle(failed, async { run_sequential(&image, &config) })
            .await
            .expect("Should recover");
        assert!(!settled.meta.parallel);
        assert_eq!(settled, expected);
    }

    #[tokio::test]
    async fn test_successful_attempt_skips_retry() {
        let image = RgbImage::from_pixel(16, 16, Rgb([10, 200, 10]));
        let config = ExtractionConfig::default();
        let attempt = run_sequential(&image, &config);
        let settled = settle(attempt, async { Err(TokenError::Config("retry must not run".into())) })
            .await
            .expect("Should keep the attempt");
        assert_eq!(settled.color.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_waits_for_remaining_extractors() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let finished = Arc::new(AtomicBool::new(false));
        let mut tasks = JoinSet::new();
        tasks.spawn_blocking(|| {
            Err(TokenError::Extraction {
                kind: ExtractorKind::Color,
                message: "no pixels".to_string(),
            })
        });
        let flag = Arc::clone(&finished);
        tasks.spawn_blocking(move || {
            std::thread::sleep(std::time::Duration::from_millis(50));
            flag.store(true, Ordering::SeqCst);
            Ok(ExtractorOutput::Spacing(vec![8]))
        });

        let result = collect_outputs(&mut tasks).await;
        assert!(matches!(result, Err(TokenError::Extraction { kind: ExtractorKind::Color, .. })));
        assert!(tasks.is_empty());
        assert!(finished.load(Ordering::SeqCst));
    }

    #[test]
    fn test_missing_output_is_reported() {
        let image = RgbImage::from_pixel(16, 16, Rgb([90, 90, 90]));
        let config = ExtractionConfig::default();
        let outputs: Vec<ExtractorOutput> = ExtractorKind::iter()
            .filter(|kind| *kind != ExtractorKind::Grid)
            .map(|kind| kind.run(&image, &config).expect("Should extract"))
            .collect();

        let result = assemble(outputs, true);
        assert!(matches!(result, Err(TokenError::MissingOutput(ExtractorKind::Grid))));
    }

    #[test]
    fn test_wide_images_are_downscaled() {
        let pipeline = Pipeline::default();
        let prepared = pipeline
            .prepare(&RgbImage::from_pixel(1024, 300, Rgb([0, 0, 0])))
            .expect("Should resize");
        assert_eq!(prepared.dimensions(), (512, 150));
    }

    #[test]
    fn test_extended_variant_bundle() {
        let pipeline = Pipeline::builder()
            .variant(PipelineVariant::Extended)
            .build()
            .expect("Should build");
        let bundle = pipeline.extract_sequential(&mock_screenshot()).expect("Should extract");

        assert!(matches!(bundle.grid, GridDescriptor::Extended { .. }));
        assert!(bundle.elevation.depth_metrics.is_some());
        let json = bundle.to_json().expect("Should serialize");
        assert!(json.contains("\"gutter\""));
        assert!(json.contains("\"depthMetrics\""));
    }

    #[test]
    fn test_walkthrough_covers_every_extractor() {
        let pipeline = Pipeline::default();
        let image = mock_screenshot();
        let (bundle, walkthroughs) = pipeline.walkthrough(&image).expect("Should explain");

        let kinds: Vec<ExtractorKind> = walkthroughs.iter().map(|w| w.kind).collect();
        assert_eq!(kinds, ExtractorKind::iter().collect::<Vec<_>>());
        assert!(walkthroughs.iter().all(|w| !w.explanations.is_empty()));
        assert!(bundle.same_tokens(&pipeline.extract_sequential(&image).expect("Should extract")));
    }
}

//! # Design Token Extraction Library
//!
//! Heuristic, training-free extraction of design tokens from UI screenshots.
//! A single pass over a downscaled copy of the screenshot yields a color
//! palette with harmony, contrast and temperature analysis, spacing,
//! border-radius and stroke-width scales, grid structure, and an elevation
//! descriptor.
//!
//! ## Core Features
//!
//! - **Static extractor table**: six analyzers keyed by [`ExtractorKind`]
//! - **Concurrent orchestration**: one blocking task per extractor over a
//!   shared buffer, with a sequential rerun if anything fails
//! - **Two variants**: the extended variant reports a grid gutter and a
//!   fused multi-cue depth estimate
//! - **Walkthroughs**: intermediate images and explanations per extractor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use design_tokens::Pipeline;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::builder().build()?;
//!
//! let image = image::open("screenshot.png")?.to_rgb8();
//! let bundle = pipeline.extract(&image).await?;
//!
//! println!("{}", bundle.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Extended Variant
//!
//! ```rust,no_run
//! use design_tokens::{Pipeline, GridDescriptor};
//!
//! let pipeline = Pipeline::builder().extended().sequential().build()?;
//! let image = image::open("screenshot.png")?.to_rgb8();
//! let bundle = pipeline.extract_sequential(&image)?;
//!
//! if let GridDescriptor::Extended { columns, gutter } = bundle.grid {
//!     println!("{columns} columns, {gutter}px gutter");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Core modules
pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod color;
pub mod extractors;
pub mod pipeline;
pub mod walkthrough;

// Re-exports for convenience
pub use error::{Result, TokenError};
pub use types::*;
pub use config::{ExecutionMode, ExtractionConfig, PipelineVariant};
pub use traits::TokenExtractor;
pub use extractors::{ExtractorKind, ExtractorOutput};
pub use pipeline::{Pipeline, builder::PipelineBuilder};
pub use walkthrough::{Walkthrough, WalkthroughSummary};

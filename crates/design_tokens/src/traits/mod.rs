use image::RgbImage;
use crate::{error::Result, walkthrough::Walkthrough};

/// One heuristic analyzer over the shared working buffer.
///
/// Implementations must be pure functions of the image: the orchestrator
/// runs them concurrently over the same buffer and relies on repeated runs
/// producing identical output.
pub trait TokenExtractor: Send + Sync {
    type Output;

    /// Compute the token value for the image
    fn extract(&self, image: &RgbImage) -> Result<Self::Output>;

    /// Compute the token value together with the intermediate steps that
    /// produced it
    fn walkthrough(&self, image: &RgbImage) -> Result<(Self::Output, Walkthrough)>;
}

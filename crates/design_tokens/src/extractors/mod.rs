pub mod color;
pub mod spacing;
pub mod radius;
pub mod grid;
pub mod shadow;
pub mod depth;
pub mod stroke;

pub use color::ColorExtractor;
pub use spacing::SpacingExtractor;
pub use radius::BorderRadiusExtractor;
pub use grid::GridExtractor;
pub use shadow::ShadowExtractor;
pub use stroke::StrokeWidthExtractor;

use image::RgbImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumCount, EnumIter, IntoStaticStr};

use crate::{
    config::ExtractionConfig,
    error::{Result, TokenError},
    traits::TokenExtractor,
    types::{ColorTokens, GridDescriptor, ShadowDescriptor},
    walkthrough::Walkthrough,
};

/// The six analyzers, named after the bundle field each one fills.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
    Serialize, Deserialize, JsonSchema,
    Display, EnumIter, EnumCount, IntoStaticStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum ExtractorKind {
    Color,
    Spacing,
    BorderRadius,
    Grid,
    Elevation,
    StrokeWidth,
}

/// Result of one extractor, tagged by kind
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractorOutput {
    Color(ColorTokens),
    Spacing(Vec<u32>),
    BorderRadius(Vec<u32>),
    Grid(GridDescriptor),
    Elevation(ShadowDescriptor),
    StrokeWidth(Vec<u32>),
}

impl ExtractorOutput {
    pub fn kind(&self) -> ExtractorKind {
        match self {
            Self::Color(_) => ExtractorKind::Color,
            Self::Spacing(_) => ExtractorKind::Spacing,
            Self::BorderRadius(_) => ExtractorKind::BorderRadius,
            Self::Grid(_) => ExtractorKind::Grid,
            Self::Elevation(_) => ExtractorKind::Elevation,
            Self::StrokeWidth(_) => ExtractorKind::StrokeWidth,
        }
    }
}

impl ExtractorKind {
    /// Run the extractor for this kind. The kind-to-implementation table is
    /// this match; there is no runtime registry.
    pub fn run(self, image: &RgbImage, config: &ExtractionConfig) -> Result<ExtractorOutput> {
        let output = match self {
            Self::Color => ExtractorOutput::Color(ColorExtractor::from_config(config).extract(image)?),
            Self::Spacing => ExtractorOutput::Spacing(SpacingExtractor.extract(image)?),
            Self::BorderRadius => ExtractorOutput::BorderRadius(BorderRadiusExtractor.extract(image)?),
            Self::Grid => ExtractorOutput::Grid(GridExtractor::from_config(config).extract(image)?),
            Self::Elevation => ExtractorOutput::Elevation(ShadowExtractor::from_config(config).extract(image)?),
            Self::StrokeWidth => ExtractorOutput::StrokeWidth(StrokeWidthExtractor.extract(image)?),
        };
        Ok(output)
    }

    /// Like [`ExtractorKind::run`], also returning the explanation steps.
    pub fn walkthrough(self, image: &RgbImage, config: &ExtractionConfig) -> Result<(ExtractorOutput, Walkthrough)> {
        fn tag<T>(
            result: Result<(T, Walkthrough)>,
            wrap: fn(T) -> ExtractorOutput,
        ) -> Result<(ExtractorOutput, Walkthrough)> {
            result.map(|(output, walkthrough)| (wrap(output), walkthrough))
        }

        match self {
            Self::Color => tag(ColorExtractor::from_config(config).walkthrough(image), ExtractorOutput::Color),
            Self::Spacing => tag(SpacingExtractor.walkthrough(image), ExtractorOutput::Spacing),
            Self::BorderRadius => tag(BorderRadiusExtractor.walkthrough(image), ExtractorOutput::BorderRadius),
            Self::Grid => tag(GridExtractor::from_config(config).walkthrough(image), ExtractorOutput::Grid),
            Self::Elevation => tag(ShadowExtractor::from_config(config).walkthrough(image), ExtractorOutput::Elevation),
            Self::StrokeWidth => tag(StrokeWidthExtractor.walkthrough(image), ExtractorOutput::StrokeWidth),
        }
    }

    pub(crate) fn failure(self, message: impl Into<String>) -> TokenError {
        TokenError::Extraction { kind: self, message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_kind_names_match_bundle_fields() {
        let names: Vec<&'static str> = ExtractorKind::iter().map(|k| k.into()).collect();
        assert_eq!(
            names,
            vec!["color", "spacing", "borderRadius", "grid", "elevation", "strokeWidth"]
        );
        assert_eq!(ExtractorKind::COUNT, 6);
    }

    #[test]
    fn test_run_tags_output_with_its_kind() {
        let image = RgbImage::from_pixel(32, 32, image::Rgb([200, 200, 200]));
        let config = ExtractionConfig::default();
        for kind in ExtractorKind::iter() {
            let output = kind.run(&image, &config).expect("Should extract");
            assert_eq!(output.kind(), kind);
        }
    }
}

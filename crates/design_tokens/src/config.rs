use std::{fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::{Result, TokenError};

/// Width of the shared working buffer handed to every extractor.
pub const WORKING_MAX_WIDTH: u32 = 512;
/// Width used by the color clustering sub-path.
pub const PALETTE_MAX_WIDTH: u32 = 256;

/// Which generation of the extraction pipeline to run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PipelineVariant {
    /// Grid as `{columns, rows}`, elevation from Laplacian strength
    #[default]
    Standard,
    /// Grid as `{columns, gutter}`, elevation from fused depth variance
    Extended,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Concurrent,
    Sequential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExtractionConfig {
    pub variant: PipelineVariant,
    pub mode: ExecutionMode,
    #[schemars(range(min = 1))]
    pub working_max_width: u32,
    #[schemars(range(min = 1))]
    pub palette_max_width: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            variant: PipelineVariant::Standard,
            mode: ExecutionMode::Concurrent,
            working_max_width: WORKING_MAX_WIDTH,
            palette_max_width: PALETTE_MAX_WIDTH,
        }
    }
}

impl ExtractionConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string; missing keys keep their defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ExtractionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.working_max_width == 0 {
            return Err(TokenError::Config("working_max_width must be positive".into()));
        }
        if self.palette_max_width == 0 {
            return Err(TokenError::Config("palette_max_width must be positive".into()));
        }
        Ok(())
    }

    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ExtractionConfig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ExtractionConfig::from_toml("variant = \"extended\"\n")
            .expect("Should parse config");
        assert_eq!(config.variant, PipelineVariant::Extended);
        assert_eq!(config.mode, ExecutionMode::Concurrent);
        assert_eq!(config.working_max_width, 512);
        assert_eq!(config.palette_max_width, 256);
    }

    #[test]
    fn test_full_toml() {
        let toml = r#"
            variant = "standard"
            mode = "sequential"
            working_max_width = 640
            palette_max_width = 128
        "#;
        let config = ExtractionConfig::from_toml(toml).expect("Should parse config");
        assert_eq!(config.mode, ExecutionMode::Sequential);
        assert_eq!(config.working_max_width, 640);
        assert_eq!(config.palette_max_width, 128);
    }

    #[test]
    fn test_zero_width_rejected() {
        let err = ExtractionConfig::from_toml("working_max_width = 0").unwrap_err();
        assert!(matches!(err, TokenError::Config(_)));
    }

    #[test]
    fn test_unknown_variant_rejected() {
        let err = ExtractionConfig::from_toml("variant = \"holographic\"").unwrap_err();
        assert!(matches!(err, TokenError::Toml(_)));
    }

    #[test]
    fn test_variant_from_str() {
        let variant: PipelineVariant = "extended".parse().expect("Should parse variant");
        assert_eq!(variant, PipelineVariant::Extended);
        assert_eq!(ExecutionMode::Sequential.to_string(), "sequential");
    }
}

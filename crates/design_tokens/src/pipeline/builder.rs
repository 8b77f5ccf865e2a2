use crate::{
    config::{ExecutionMode, ExtractionConfig, PipelineVariant},
    error::Result,
    pipeline::Pipeline,
};

/// Builder for creating extraction pipelines with a fluent API
#[derive(Debug, Clone, Default)]
pub struct PipelineBuilder {
    config: ExtractionConfig,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a loaded configuration (replaces any earlier settings)
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn variant(mut self, variant: PipelineVariant) -> Self {
        self.config.variant = variant;
        self
    }

    /// Shorthand for the extended variant
    pub fn extended(self) -> Self {
        self.variant(PipelineVariant::Extended)
    }

    pub fn mode(mut self, mode: ExecutionMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Run the extractors one after another
    pub fn sequential(self) -> Self {
        self.mode(ExecutionMode::Sequential)
    }

    pub fn working_max_width(mut self, width: u32) -> Self {
        self.config.working_max_width = width;
        self
    }

    pub fn palette_max_width(mut self, width: u32) -> Self {
        self.config.palette_max_width = width;
        self
    }

    /// Validate the settings and build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.config)
    }
}

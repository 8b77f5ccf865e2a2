use thiserror::Error;

use crate::extractors::ExtractorKind;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Image has no pixels")]
    EmptyImage,

    #[error("{kind} extractor failed: {message}")]
    Extraction { kind: ExtractorKind, message: String },

    #[error("Extractor task did not complete: {0}")]
    TaskJoin(String),

    #[error("No output produced by the {0} extractor")]
    MissingOutput(ExtractorKind),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TokenError>;

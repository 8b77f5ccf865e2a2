use std::fs;
use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use design_tokens::{Walkthrough, WalkthroughSummary};
use image::RgbImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    ImageError(#[from] image::ImageError),
    #[error("Invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("No image data on stdin")]
    EmptyInput,
}

/// Decode a base64 image, with or without a `data:image/...;base64,` prefix.
pub fn decode_base64_image(text: &str) -> Result<RgbImage, CliError> {
    let text = text.trim();
    let payload = match text.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => text,
    };
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(CliError::EmptyInput);
    }

    let bytes = STANDARD.decode(compact)?;
    Ok(image::load_from_memory(&bytes)?.to_rgb8())
}

/// Load an image file in any format the `image` crate understands
pub fn load_image_file<P: AsRef<Path>>(path: P) -> Result<RgbImage, CliError> {
    Ok(image::open(path)?.to_rgb8())
}

fn slug(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect()
}

/// Write every visualization as a PNG plus an `explanations.json` index.
///
/// Returns the paths of the written images.
pub fn write_walkthroughs<P: AsRef<Path>>(dir: P, walkthroughs: &[Walkthrough]) -> Result<Vec<PathBuf>, CliError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let mut written = Vec::new();
    for walkthrough in walkthroughs {
        for (index, visualization) in walkthrough.visualizations.iter().enumerate() {
            let path = dir.join(format!("{}_{index}_{}.png", walkthrough.kind, slug(&visualization.label)));
            visualization.image.save(&path)?;
            written.push(path);
        }
    }

    let summaries: Vec<WalkthroughSummary> = walkthroughs.iter().map(Walkthrough::summary).collect();
    fs::write(dir.join("explanations.json"), serde_json::to_string_pretty(&summaries)?)?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb};
    use std::io::Cursor;

    fn png_base64(image: &RgbImage) -> String {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("Should encode PNG");
        STANDARD.encode(bytes)
    }

    #[test]
    fn test_decode_data_url() {
        let image = RgbImage::from_pixel(4, 3, Rgb([10, 20, 30]));
        let url = format!("data:image/png;base64,{}\n", png_base64(&image));
        let decoded = decode_base64_image(&url).expect("Should decode");
        assert_eq!(decoded, image);
    }

    #[test]
    fn test_decode_bare_base64() {
        let image = RgbImage::from_pixel(2, 2, Rgb([200, 0, 0]));
        let decoded = decode_base64_image(&png_base64(&image)).expect("Should decode");
        assert_eq!(decoded.dimensions(), (2, 2));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_base64_image("  \n"), Err(CliError::EmptyInput)));
        assert!(matches!(decode_base64_image("not*base64"), Err(CliError::Base64(_))));
    }

    #[test]
    fn test_write_walkthroughs() {
        let image = RgbImage::from_pixel(48, 48, Rgb([120, 120, 120]));
        let (_, walkthroughs) = design_tokens::Pipeline::default()
            .walkthrough(&image)
            .expect("Should explain");

        let dir = std::env::temp_dir().join(format!("tokens_cli_walkthrough_{}", std::process::id()));
        let written = write_walkthroughs(&dir, &walkthroughs).expect("Should write walkthroughs");

        let expected: usize = walkthroughs.iter().map(|w| w.visualizations.len()).sum();
        assert_eq!(written.len(), expected);
        assert!(written.iter().all(|p| p.exists()));
        let index = fs::read_to_string(dir.join("explanations.json")).expect("Should read index");
        assert!(index.contains("\"strokeWidth\""));

        fs::remove_dir_all(&dir).expect("Should clean up");
    }
}

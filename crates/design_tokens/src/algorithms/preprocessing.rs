use image::{GrayImage, ImageBuffer, Luma, RgbImage, imageops::FilterType};

use crate::error::{Result, TokenError};

/// Aspect-preserving downscale so the width does not exceed `max_width`.
///
/// Images already narrow enough are returned unchanged (as a copy). Both
/// dimensions are scaled by `max_width / width` and rounded to the nearest
/// pixel.
pub fn resize_for_width(image: &RgbImage, max_width: u32) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TokenError::EmptyImage);
    }
    if width <= max_width {
        return Ok(image.clone());
    }

    let scale = max_width as f64 / width as f64;
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);

    Ok(image::imageops::resize(image, new_width, new_height, FilterType::Triangle))
}

/// Grayscale view used by the geometric extractors
pub fn grayscale(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Perceptual lightness (CIE L*) rescaled to 0..255, one byte per pixel.
pub fn lightness_channel(image: &RgbImage) -> GrayImage {
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let l = crate::color::cie_lightness([r, g, b]);
        Luma([(l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8])
    })
}

/// Global binarization at the variance-maximizing (Otsu) level.
///
/// Pixels strictly brighter than the level become 255.
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    let level = imageproc::contrast::otsu_level(gray);
    imageproc::contrast::threshold(gray, level)
}

pub fn invert(binary: &GrayImage) -> GrayImage {
    let mut inverted = binary.clone();
    image::imageops::invert(&mut inverted);
    inverted
}

const LAPLACIAN: [i32; 9] = [0, 1, 0, 1, -4, 1, 0, 1, 0];

/// Absolute 4-neighbour Laplacian response per pixel, row-major.
///
/// Borders replicate the edge pixels, so a flat image responds with zero
/// everywhere.
pub fn laplacian_magnitude(gray: &GrayImage) -> Vec<f64> {
    imageproc::filter::filter3x3::<_, i32, i16>(gray, &LAPLACIAN)
        .pixels()
        .map(|p| (p[0] as f64).abs())
        .collect()
}

/// Number of nonzero pixels in a mask
pub fn count_foreground(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] > 0).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_narrow_image_unchanged() {
        let image = RgbImage::from_pixel(200, 100, Rgb([10, 20, 30]));
        let resized = resize_for_width(&image, 256).expect("Should resize");
        assert_eq!(resized.dimensions(), (200, 100));
        assert_eq!(resized, image);
    }

    #[test]
    fn test_wide_image_scaled_with_rounding() {
        let image = RgbImage::from_pixel(1000, 333, Rgb([0, 0, 0]));
        let resized = resize_for_width(&image, 512).expect("Should resize");
        // 333 * 0.512 = 170.496
        assert_eq!(resized.dimensions(), (512, 170));

        let image = RgbImage::from_pixel(1000, 335, Rgb([0, 0, 0]));
        let resized = resize_for_width(&image, 256).expect("Should resize");
        // 335 * 0.256 = 85.76
        assert_eq!(resized.dimensions(), (256, 86));
    }

    #[test]
    fn test_empty_image_rejected() {
        let image = RgbImage::new(0, 10);
        assert!(matches!(resize_for_width(&image, 512), Err(TokenError::EmptyImage)));
    }

    #[test]
    fn test_lightness_extremes() {
        let image = RgbImage::from_fn(2, 1, |x, _| {
            if x == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        });
        let l = lightness_channel(&image);
        assert_eq!(l.get_pixel(0, 0)[0], 0);
        assert_eq!(l.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_otsu_splits_two_levels() {
        let gray = GrayImage::from_fn(10, 10, |x, _| if x < 5 { Luma([20]) } else { Luma([220]) });
        let binary = otsu_binarize(&gray);
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(9, 0)[0], 255);
        assert_eq!(count_foreground(&binary), 50);
        assert_eq!(count_foreground(&invert(&binary)), 50);
    }

    #[test]
    fn test_laplacian_of_single_spike() {
        let flat = GrayImage::from_pixel(5, 5, Luma([90]));
        assert!(laplacian_magnitude(&flat).iter().all(|v| *v == 0.0));

        let mut spike = GrayImage::new(5, 5);
        spike.put_pixel(2, 2, Luma([50]));
        let response = laplacian_magnitude(&spike);
        assert_eq!(response.len(), 25);
        assert_eq!(response[2 * 5 + 2], 200.0);
        assert_eq!(response[2 * 5 + 1], 50.0);
        assert_eq!(response[1 * 5 + 1], 0.0);
    }
}

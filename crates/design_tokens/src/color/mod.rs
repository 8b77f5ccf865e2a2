//! Color spaces used by the extractors.
//!
//! Palette entries are reported in OKLCH, duplicates are judged with the
//! CIE76 Delta-E in CIELAB (D65), and lightness maps for the shadow
//! analysis use CIE L*.

pub mod analysis;
pub mod kmeans;

pub use analysis::*;
pub use kmeans::*;

use palette::{convert::FromColorUnclamped, white_point::D65, FromColor, Lab, Oklab, Oklch, Srgb};

use crate::types::ColorSample;

/// Chroma above which a color is considered to carry a hue
pub const CHROMATIC_THRESHOLD: f64 = 0.02;

/// Minimum Delta-E between two palette entries
pub const MIN_DELTA_E: f64 = 3.0;

fn srgb(rgb: [u8; 3]) -> Srgb<f64> {
    Srgb::new(rgb[0], rgb[1], rgb[2]).into_format()
}

/// OKLab coordinates of an 8-bit sRGB color
pub fn srgb_to_oklab(rgb: [u8; 3]) -> [f64; 3] {
    let lab: Oklab<f64> = Oklab::from_color(srgb(rgb));
    [lab.l, lab.a, lab.b]
}

/// OKLCH sample of an 8-bit sRGB color. Achromatic colors get hue 0.
pub fn srgb_to_oklch(rgb: [u8; 3]) -> ColorSample {
    let lch: Oklch<f64> = Oklch::from_color(srgb(rgb));
    let h = if lch.chroma < 1e-10 {
        0.0
    } else {
        lch.hue.into_positive_degrees()
    };
    ColorSample::new(lch.l, lch.chroma, h)
}

/// Gamma-encoded sRGB components in [0, 1], clamped to the gamut.
pub fn oklch_to_srgb(sample: &ColorSample) -> [f64; 3] {
    let lch = Oklch::new(sample.l, sample.c, sample.h);
    let rgb: Srgb<f64> = Srgb::from_color_unclamped(Oklab::<f64>::from_color_unclamped(lch));
    [rgb.red, rgb.green, rgb.blue].map(|c| c.clamp(0.0, 1.0))
}

/// CIELAB (D65) coordinates of an 8-bit sRGB color
pub fn srgb_to_lab(rgb: [u8; 3]) -> Lab<D65, f64> {
    Lab::from_color(srgb(rgb))
}

/// CIE L* in [0, 100]
pub fn cie_lightness(rgb: [u8; 3]) -> f64 {
    srgb_to_lab(rgb).l.max(0.0)
}

/// CIE76 color difference, the Euclidean distance in CIELAB
pub fn delta_e(a: [u8; 3], b: [u8; 3]) -> f64 {
    let (a, b) = (srgb_to_lab(a), srgb_to_lab(b));
    ((a.l - b.l).powi(2) + (a.a - b.a).powi(2) + (a.b - b.b).powi(2)).sqrt()
}

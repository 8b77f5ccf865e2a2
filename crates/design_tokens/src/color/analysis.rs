//! Perceptual classification of a palette: hue harmony, WCAG contrast and
//! color temperature.

use crate::types::{
    ColorAnalysis, ColorSample, ContrastPair, ContrastReport, ContrastSummary, HarmonyReport,
    HarmonyType, HueRelation, HueRelationship, Temperature, TemperatureReport, Tone, round_to,
};

use super::oklch_to_srgb;

/// Hue spread below which a palette counts as monochromatic
const MONOCHROMATIC_SPREAD: f64 = 15.0;
const MAX_RELATIONSHIPS: usize = 5;

pub const AA_NORMAL: f64 = 4.5;
pub const AA_LARGE: f64 = 3.0;
pub const AAA_NORMAL: f64 = 7.0;
pub const AAA_LARGE: f64 = 4.5;

/// Circular hue difference in [0, 180]
pub fn hue_difference(h1: f64, h2: f64) -> f64 {
    let d = (h1 - h2).abs() % 360.0;
    d.min(360.0 - d)
}

pub fn classify_hue_angle(angle: f64) -> HueRelation {
    if angle < 30.0 {
        HueRelation::Analogous
    } else if (150.0..=210.0).contains(&angle) {
        HueRelation::Complementary
    } else if (110.0..=130.0).contains(&angle) {
        HueRelation::Triadic
    } else if (80.0..=100.0).contains(&angle) {
        HueRelation::Tetradic
    } else {
        HueRelation::Other
    }
}

/// Relationship between two hues; symmetric in its arguments.
pub fn relationship(h1: f64, h2: f64) -> HueRelation {
    classify_hue_angle(hue_difference(h1, h2))
}

/// Smallest arc of the hue circle containing every hue.
fn hue_spread(hues: &[f64]) -> f64 {
    if hues.len() < 2 {
        return 0.0;
    }
    let mut sorted: Vec<f64> = hues.iter().map(|h| h.rem_euclid(360.0)).collect();
    sorted.sort_by(f64::total_cmp);

    let wrap_gap = sorted[0] + 360.0 - sorted[sorted.len() - 1];
    let largest_gap = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold(wrap_gap, f64::max);

    360.0 - largest_gap
}

pub fn analyze_harmony(palette: &[ColorSample]) -> HarmonyReport {
    let hues: Vec<f64> = palette
        .iter()
        .filter(|s| s.is_chromatic())
        .map(|s| s.h)
        .collect();

    if hues.is_empty() {
        return HarmonyReport {
            kind: HarmonyType::Achromatic,
            strength: 1.0,
            hue_range: 0.0,
            relationships: Vec::new(),
        };
    }

    let mut counts = [0usize; 4];
    let mut relationships = Vec::new();
    for i in 0..hues.len() {
        for j in (i + 1)..hues.len() {
            let angle = hue_difference(hues[i], hues[j]);
            let relation = classify_hue_angle(angle);
            match relation {
                HueRelation::Analogous => counts[0] += 1,
                HueRelation::Complementary => counts[1] += 1,
                HueRelation::Triadic => counts[2] += 1,
                HueRelation::Tetradic => counts[3] += 1,
                HueRelation::Other => continue,
            }
            if relationships.len() < MAX_RELATIONSHIPS {
                relationships.push(HueRelationship {
                    hues: [hues[i], hues[j]],
                    angle: round_to(angle, 1),
                    relation,
                });
            }
        }
    }
    let [analogous, complementary, triadic, tetradic] = counts;

    let spread = hue_spread(&hues);
    let total = hues.len() as f64;
    let ratio = |count: usize| (count as f64 / total).clamp(0.0, 1.0);

    let (kind, strength) = if spread < MONOCHROMATIC_SPREAD {
        (HarmonyType::Monochromatic, 1.0 - spread / MONOCHROMATIC_SPREAD)
    } else if complementary > 0 && analogous > 0 {
        (HarmonyType::SplitComplementary, ratio(complementary + analogous))
    } else if complementary > 0 {
        (HarmonyType::Complementary, ratio(complementary))
    } else if analogous > 0 {
        (HarmonyType::Analogous, ratio(analogous))
    } else if triadic >= 2 {
        (HarmonyType::Triadic, ratio(triadic))
    } else if tetradic >= 3 {
        (HarmonyType::Tetradic, ratio(tetradic))
    } else {
        (HarmonyType::Analogous, 0.0)
    };

    HarmonyReport {
        kind,
        strength: round_to(strength, 2),
        hue_range: round_to(spread, 1),
        relationships,
    }
}

/// WCAG channel linearization
fn wcag_channel(v: f64) -> f64 {
    if v <= 0.03928 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance of gamma-encoded sRGB in [0, 1]
pub fn relative_luminance(rgb: [f64; 3]) -> f64 {
    let [r, g, b] = rgb.map(wcag_channel);
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Contrast ratio in [1, 21]
pub fn contrast_ratio(a: [f64; 3], b: [f64; 3]) -> f64 {
    let (la, lb) = (relative_luminance(a), relative_luminance(b));
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    ((lighter + 0.05) / (darker + 0.05)).clamp(1.0, 21.0)
}

pub fn analyze_contrast(palette: &[ColorSample]) -> ContrastReport {
    let rgb: Vec<[f64; 3]> = palette.iter().map(oklch_to_srgb).collect();

    let mut pairs = Vec::new();
    for i in 0..rgb.len() {
        for j in (i + 1)..rgb.len() {
            let ratio = contrast_ratio(rgb[i], rgb[j]);
            pairs.push(ContrastPair {
                first: i,
                second: j,
                ratio: round_to(ratio, 2),
                aa_normal: ratio >= AA_NORMAL,
                aa_large: ratio >= AA_LARGE,
                aaa_normal: ratio >= AAA_NORMAL,
                aaa_large: ratio >= AAA_LARGE,
            });
        }
    }

    let count = |pred: fn(&ContrastPair) -> bool| pairs.iter().filter(|p| pred(p)).count();
    let aa_normal_pass = count(|p| p.aa_normal);
    let total_pairs = pairs.len();

    let summary = ContrastSummary {
        total_pairs,
        aa_normal_pass,
        aa_large_pass: count(|p| p.aa_large),
        aaa_normal_pass: count(|p| p.aaa_normal),
        aaa_large_pass: count(|p| p.aaa_large),
        accessibility_score: if total_pairs == 0 {
            1.0
        } else {
            round_to(aa_normal_pass as f64 / total_pairs as f64, 3)
        },
    };

    ContrastReport { pairs, summary }
}

fn is_warm_hue(h: f64) -> bool {
    (0.0..=60.0).contains(&h) || (300.0..360.0).contains(&h)
}

fn is_cool_hue(h: f64) -> bool {
    (120.0..=240.0).contains(&h)
}

/// Warm and cool shares of one hue. Hues in the two transition bands give
/// half their weight to the class whose boundary is nearer.
fn hue_temperature(h: f64) -> (f64, f64) {
    if is_warm_hue(h) {
        (1.0, 0.0)
    } else if is_cool_hue(h) {
        (0.0, 1.0)
    } else {
        let nearest_warm = (h - 60.0).abs().min((h - 300.0).abs());
        let nearest_cool = (h - 120.0).abs().min((h - 240.0).abs());
        if nearest_warm <= nearest_cool { (0.5, 0.0) } else { (0.0, 0.5) }
    }
}

fn tone_of(h: f64) -> Tone {
    if is_warm_hue(h) {
        Tone::Warm
    } else if is_cool_hue(h) {
        Tone::Cool
    } else {
        Tone::Neutral
    }
}

pub fn analyze_temperature(palette: &[ColorSample]) -> TemperatureReport {
    let chromatic: Vec<&ColorSample> = palette.iter().filter(|s| s.is_chromatic()).collect();

    let total: f64 = chromatic.iter().map(|s| s.c).sum();
    if total <= 0.0 {
        return TemperatureReport {
            temperature: Temperature::Neutral,
            warm_ratio: 0.0,
            cool_ratio: 0.0,
            dominant_tone: Tone::Neutral,
        };
    }

    let (warm, cool) = chromatic.iter().fold((0.0, 0.0), |(warm, cool), s| {
        let (w, c) = hue_temperature(s.h);
        (warm + w * s.c, cool + c * s.c)
    });
    let (warm_ratio, cool_ratio) = (warm / total, cool / total);

    let temperature = if warm_ratio > 0.6 {
        Temperature::Warm
    } else if cool_ratio > 0.6 {
        Temperature::Cool
    } else if (warm_ratio - cool_ratio).abs() < 0.2 {
        Temperature::Neutral
    } else if warm_ratio > cool_ratio {
        Temperature::WarmNeutral
    } else {
        Temperature::CoolNeutral
    };

    let dominant_tone = chromatic
        .iter()
        .copied()
        .fold(None::<&ColorSample>, |best, s| match best {
            Some(b) if b.c >= s.c => Some(b),
            _ => Some(s),
        })
        .map_or(Tone::Neutral, |s| tone_of(s.h));

    TemperatureReport {
        temperature,
        warm_ratio: round_to(warm_ratio, 3),
        cool_ratio: round_to(cool_ratio, 3),
        dominant_tone,
    }
}

impl ColorAnalysis {
    pub fn from_palette(palette: &[ColorSample]) -> Self {
        Self {
            harmony: analyze_harmony(palette),
            contrast: analyze_contrast(palette),
            temperature: analyze_temperature(palette),
        }
    }
}

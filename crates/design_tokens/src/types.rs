use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Round `value` to `places` decimal places.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ColorSpace {
    Oklch,
}

/// A single perceptual color in OKLCH coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorSample {
    pub space: ColorSpace,
    /// Lightness in [0, 1]
    pub l: f64,
    /// Chroma, never negative
    pub c: f64,
    /// Hue in degrees, [0, 360)
    pub h: f64,
}

impl ColorSample {
    /// Build a sample, coercing an undefined hue to 0.
    pub fn new(l: f64, c: f64, h: f64) -> Self {
        let h = if h.is_finite() { h.rem_euclid(360.0) } else { 0.0 };
        Self {
            space: ColorSpace::Oklch,
            l: if l.is_finite() { l } else { 0.0 },
            c: if c.is_finite() { c.max(0.0) } else { 0.0 },
            h,
        }
    }

    /// Output precision: 3 dp for lightness and chroma, 1 dp for hue.
    pub fn rounded(self) -> Self {
        let h = round_to(self.h, 1);
        Self {
            space: self.space,
            l: round_to(self.l, 3),
            c: round_to(self.c, 3),
            h: if h >= 360.0 { 0.0 } else { h },
        }
    }

    /// Whether the sample carries a meaningful hue.
    pub fn is_chromatic(&self) -> bool {
        self.c > crate::color::CHROMATIC_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum HarmonyType {
    Monochromatic,
    Achromatic,
    Analogous,
    Complementary,
    SplitComplementary,
    Triadic,
    Tetradic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum HueRelation {
    Analogous,
    Complementary,
    Triadic,
    Tetradic,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HueRelationship {
    pub hues: [f64; 2],
    /// Circular hue difference in degrees, [0, 180]
    pub angle: f64,
    pub relation: HueRelation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HarmonyReport {
    #[serde(rename = "type")]
    pub kind: HarmonyType,
    pub strength: f64,
    pub hue_range: f64,
    pub relationships: Vec<HueRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContrastPair {
    /// Palette indices of the two colors
    pub first: usize,
    pub second: usize,
    pub ratio: f64,
    pub aa_normal: bool,
    pub aa_large: bool,
    pub aaa_normal: bool,
    pub aaa_large: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContrastSummary {
    pub total_pairs: usize,
    pub aa_normal_pass: usize,
    pub aa_large_pass: usize,
    pub aaa_normal_pass: usize,
    pub aaa_large_pass: usize,
    /// Share of pairs passing AA for normal text, [0, 1]
    pub accessibility_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ContrastReport {
    pub pairs: Vec<ContrastPair>,
    pub summary: ContrastSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Temperature {
    Warm,
    Cool,
    Neutral,
    WarmNeutral,
    CoolNeutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Warm,
    Cool,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReport {
    pub temperature: Temperature,
    pub warm_ratio: f64,
    pub cool_ratio: f64,
    pub dominant_tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorAnalysis {
    pub harmony: HarmonyReport,
    pub contrast: ContrastReport,
    pub temperature: TemperatureReport,
}

/// Output of the color extractor: the ranked palette and its analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorTokens {
    pub palette: Vec<ColorSample>,
    pub analysis: ColorAnalysis,
}

/// Grid structure. The two shapes come from the two pipeline variants and
/// are kept apart on purpose rather than merged into one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum GridDescriptor {
    Standard { columns: u32, rows: u32 },
    Extended { columns: u32, gutter: u32 },
}

impl GridDescriptor {
    pub fn columns(&self) -> u32 {
        match *self {
            Self::Standard { columns, .. } | Self::Extended { columns, .. } => columns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    East,
    NorthEast,
    North,
    NorthWest,
    West,
    SouthWest,
    South,
    SouthEast,
    Ambient,
}

impl Direction {
    /// Compass sectors, counter-clockwise from east in 45° steps.
    pub const SECTORS: [Direction; 8] = [
        Direction::East,
        Direction::NorthEast,
        Direction::North,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::South,
        Direction::SouthEast,
    ];

    /// Map a compass angle (degrees, counter-clockwise from east) to its sector.
    pub fn from_angle(angle: f64) -> Self {
        let sector = (angle.rem_euclid(360.0) / 45.0).round() as usize % 8;
        Self::SECTORS[sector]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum DepthStyle {
    HighContrast,
    DarkDominant,
    LightDominant,
    Flat,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LuminanceDistribution {
    pub dark: f64,
    pub mid: f64,
    pub light: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepthMetrics {
    pub average_depth: f64,
    pub depth_variance: f64,
    pub has_layers: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShadowDescriptor {
    pub elevation: u8,
    pub shadow_strength: f64,
    pub direction: Direction,
    pub direction_angle: f64,
    pub blur_radius: f64,
    pub contrast: f64,
    pub depth_style: DepthStyle,
    pub distribution: LuminanceDistribution,
    pub shadow_color: Option<ColorSample>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_metrics: Option<DepthMetrics>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub method: String,
    pub confidence: String,
    pub realtime_safe: bool,
    pub parallel: bool,
}

impl Meta {
    pub fn heuristic(parallel: bool) -> Self {
        Self {
            method: "heuristic-cv".to_string(),
            confidence: "medium-high".to_string(),
            realtime_safe: true,
            parallel,
        }
    }
}

/// Everything extracted from one screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    pub color: Vec<ColorSample>,
    pub color_analysis: ColorAnalysis,
    pub spacing: Vec<u32>,
    pub border_radius: Vec<u32>,
    pub grid: GridDescriptor,
    pub elevation: ShadowDescriptor,
    pub stroke_width: Vec<u32>,
    pub meta: Meta,
}

impl TokenBundle {
    /// JSON schema of the serialized bundle
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(TokenBundle)
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compare the extracted tokens, ignoring how they were scheduled.
    pub fn same_tokens(&self, other: &TokenBundle) -> bool {
        self.color == other.color
            && self.color_analysis == other.color_analysis
            && self.spacing == other.spacing
            && self.border_radius == other.border_radius
            && self.grid == other.grid
            && self.elevation == other.elevation
            && self.stroke_width == other.stroke_width
    }
}

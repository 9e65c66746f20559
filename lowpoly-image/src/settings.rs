use crate::TriangulateError;
use lowpoly_core::Scalar;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Density extraction mode: how a pixel collapses to the scalar `L` that
/// density is derived from (`density = 1 - L`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DensityMode {
    /// BT.709 luma of RGB.
    Luma,
    /// Luma re-contrasted around 0.5 by a factor of 1.2.
    LumaBoost,
    /// Normalized red channel.
    Red,
    /// Normalized green channel.
    Green,
    /// Normalized blue channel.
    Blue,
}

impl Default for DensityMode {
    fn default() -> Self {
        Self::Luma
    }
}

/// Space in which size-valued settings (`min_dist`, `edge_samples`,
/// `wire_width`) are declared. Output-space values are divided by the
/// analysis-to-output scale factor before use, so internal computation
/// always operates in analysis units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsSpace {
    /// Analysis-space pixel units.
    Analysis,
    /// Output-space pixel units.
    Output,
}

impl Default for SettingsSpace {
    fn default() -> Self {
        Self::Analysis
    }
}

/// Requested artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Raster surface.
    Canvas,
    /// Raster image (same pixels as `Canvas`).
    Image,
    /// Vector document.
    Svg,
}

impl FromStr for OutputFormat {
    type Err = TriangulateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "canvas" => Ok(Self::Canvas),
            "image" => Ok(Self::Image),
            "svg" => Ok(Self::Svg),
            other => Err(TriangulateError::UnsupportedFormat(other.to_owned())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canvas => write!(f, "canvas"),
            Self::Image => write!(f, "image"),
            Self::Svg => write!(f, "svg"),
        }
    }
}

/// Photometric preprocessing settings applied to the analysis buffer before
/// density extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessSettings {
    /// Brightness multiplier.
    #[serde(default = "PreprocessSettings::default_brightness")]
    pub brightness: Scalar,
    /// Contrast scale around the midpoint.
    #[serde(default = "PreprocessSettings::default_contrast")]
    pub contrast: Scalar,
    /// Chroma scale; 0 collapses every pixel to its luma.
    #[serde(default = "PreprocessSettings::default_saturation")]
    pub saturation: Scalar,
    /// Gaussian blur radius in pixels.
    #[serde(default)]
    pub blur: Scalar,
    /// Invert all channels.
    #[serde(default)]
    pub invert: bool,
    /// Gamma correction exponent; values within 1e-3 of 1 are skipped.
    #[serde(default = "PreprocessSettings::default_gamma")]
    pub gamma: Scalar,
    /// Density extraction mode.
    #[serde(default)]
    pub density_mode: DensityMode,
    /// Sobel edge boost weight; 0 skips the edge pass entirely.
    #[serde(default)]
    pub edge_boost: Scalar,
}

impl Default for PreprocessSettings {
    fn default() -> Self {
        Self {
            brightness: Self::default_brightness(),
            contrast: Self::default_contrast(),
            saturation: Self::default_saturation(),
            blur: 0.0,
            invert: false,
            gamma: Self::default_gamma(),
            density_mode: DensityMode::default(),
            edge_boost: 0.0,
        }
    }
}

impl PreprocessSettings {
    fn default_brightness() -> Scalar {
        1.0
    }

    fn default_contrast() -> Scalar {
        1.0
    }

    fn default_saturation() -> Scalar {
        1.0
    }

    fn default_gamma() -> Scalar {
        1.0
    }
}

/// Settings of triangulation and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriangulateSettings {
    /// Target point count.
    #[serde(default = "TriangulateSettings::default_points")]
    pub points: usize,
    /// Darkness bias exponent, clamped to `[0.1, 8.0]` before use.
    #[serde(default = "TriangulateSettings::default_dark_strength")]
    pub dark_strength: Scalar,
    /// Minimal pairwise point spacing, in `settings_space` units.
    #[serde(default = "TriangulateSettings::default_min_dist")]
    pub min_dist: Scalar,
    /// Seed points per border edge, in `settings_space` units.
    #[serde(default = "TriangulateSettings::default_edge_samples")]
    pub edge_samples: Scalar,
    /// Stroke triangle edges in `wire_color` over the fills.
    #[serde(default = "TriangulateSettings::default_show_wires")]
    pub show_wires: bool,
    /// Wireframe color as `#rrggbb`.
    #[serde(default = "TriangulateSettings::default_wire_color")]
    pub wire_color: String,
    /// Wireframe stroke width, in `settings_space` units.
    #[serde(default = "TriangulateSettings::default_wire_width")]
    pub wire_width: Scalar,
    /// Random generator seed; identical seeds reproduce identical meshes.
    #[serde(default)]
    pub seed: u64,
    /// Space in which size-valued settings are declared.
    #[serde(default)]
    pub settings_space: SettingsSpace,
}

impl Default for TriangulateSettings {
    fn default() -> Self {
        Self {
            points: Self::default_points(),
            dark_strength: Self::default_dark_strength(),
            min_dist: Self::default_min_dist(),
            edge_samples: Self::default_edge_samples(),
            show_wires: Self::default_show_wires(),
            wire_color: Self::default_wire_color(),
            wire_width: Self::default_wire_width(),
            seed: 0,
            settings_space: SettingsSpace::default(),
        }
    }
}

impl TriangulateSettings {
    /// Returns a copy with all size-valued settings converted to analysis
    /// units, given the analysis-to-output scale factor.
    pub(crate) fn to_analysis_units(&self, sx: Scalar) -> Self {
        match self.settings_space {
            SettingsSpace::Analysis => self.clone(),
            SettingsSpace::Output => Self {
                min_dist: self.min_dist / sx,
                edge_samples: self.edge_samples / sx,
                wire_width: self.wire_width / sx,
                settings_space: SettingsSpace::Analysis,
                ..self.clone()
            },
        }
    }

    fn default_points() -> usize {
        3000
    }

    fn default_dark_strength() -> Scalar {
        4.0
    }

    fn default_min_dist() -> Scalar {
        8.0
    }

    fn default_edge_samples() -> Scalar {
        20.0
    }

    fn default_show_wires() -> bool {
        true
    }

    fn default_wire_color() -> String {
        "#ffffff".to_owned()
    }

    fn default_wire_width() -> Scalar {
        1.0
    }
}

/// Parse a `#rrggbb` hex color.
pub fn parse_hex_color(hex: &str) -> Result<[u8; 3], TriangulateError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(TriangulateError::InvalidInput(format!(
            "invalid color: {:?}",
            hex
        )));
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .map_err(|_| TriangulateError::InvalidInput(format!("invalid color: {:?}", hex)))
    };
    Ok([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}

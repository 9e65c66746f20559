use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use lowpoly_core::Scalar;
use lowpoly_image::{DensityMode, SettingsSpace};

#[derive(Clone, Debug, Parser)]
#[command(name = "lowpoly", version, author, about)]
#[command(help_template = "\
{name} {version}
{about}
{author}

{usage-heading}
{tab}{usage}

{all-args}
")]
pub struct CliArgs {
    #[command(subcommand)]
    pub action: Action,
}

#[derive(Clone, Debug, Args)]
pub struct CommonArgs {
    /// Input image file path
    #[arg(short, long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub input: PathBuf,

    /// Output file path
    #[arg(short, long, value_name = "PATH", value_hint(ValueHint::FilePath))]
    pub output: PathBuf,

    /// Analysis width in pixels; when absent the source is downscaled
    /// uniformly so neither dimension exceeds 1000
    #[arg(long, value_name = "INTEGER")]
    pub resolution: Option<u32>,

    /// Density extraction mode
    #[arg(long, value_name = "MODE", default_value_t)]
    pub density_mode: DensityModeSelection,

    /// Brightness multiplier
    #[arg(long, value_name = "NUMBER", default_value_t = 1.0)]
    pub brightness: Scalar,

    /// Contrast scale around the midpoint
    #[arg(long, value_name = "NUMBER", default_value_t = 1.0)]
    pub contrast: Scalar,

    /// Chroma scale; 0 collapses pixels to luma
    #[arg(long, value_name = "NUMBER", default_value_t = 1.0)]
    pub saturation: Scalar,

    /// Gaussian blur radius in pixels
    #[arg(long, value_name = "NUMBER", default_value_t = 0.0)]
    pub blur: Scalar,

    /// Invert all channels
    #[arg(long)]
    pub invert: bool,

    /// Gamma correction exponent
    #[arg(long, value_name = "NUMBER", default_value_t = 1.0)]
    pub gamma: Scalar,

    /// Sobel edge boost weight; 0 disables the edge pass
    #[arg(long, value_name = "NUMBER", default_value_t = 0.0)]
    pub edge_boost: Scalar,

    /// Display settings used and report progress
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, strum::Display, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum DensityModeSelection {
    #[default]
    Luma,
    LumaBoost,
    Red,
    Green,
    Blue,
}
impl From<DensityModeSelection> for DensityMode {
    fn from(value: DensityModeSelection) -> Self {
        use DensityModeSelection as S; // source
        use DensityMode as T; // target
        match value {
            S::Luma => T::Luma,
            S::LumaBoost => T::LumaBoost,
            S::Red => T::Red,
            S::Green => T::Green,
            S::Blue => T::Blue,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, strum::Display, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum SettingsSpaceSelection {
    #[default]
    Analysis,
    Output,
}
impl From<SettingsSpaceSelection> for SettingsSpace {
    fn from(value: SettingsSpaceSelection) -> Self {
        use SettingsSpaceSelection as S; // source
        use SettingsSpace as T; // target
        match value {
            S::Analysis => T::Analysis,
            S::Output => T::Output,
        }
    }
}

#[derive(Clone, Debug, Subcommand)]
pub enum Action {
    /// Produce density field image
    #[command(help_template = "\
{name}
{about}

{usage-heading}
{tab}{usage}

{all-args}
")]
    Density {
        #[command(flatten)]
        common: CommonArgs,
    },

    /// Produce low-poly triangulated artwork
    #[command(help_template = "\
{name}
{about}

{usage-heading}
{tab}{usage}

{all-args}
")]
    Triangulate {
        #[command(flatten)]
        common: CommonArgs,

        #[command(flatten)]
        format: Format,

        /// Target point count
        #[arg(long, value_name = "INTEGER", default_value_t = 3000)]
        points: usize,

        /// Darkness bias exponent, clamped to 0.1..8
        #[arg(long, value_name = "NUMBER", default_value_t = 4.0)]
        dark_strength: Scalar,

        /// Minimal pairwise point spacing
        #[arg(long, value_name = "NUMBER", default_value_t = 8.0)]
        min_dist: Scalar,

        /// Seed points per border edge
        #[arg(long, value_name = "NUMBER", default_value_t = 20.0)]
        edge_samples: Scalar,

        /// Do not stroke triangle edges
        #[arg(long)]
        no_wires: bool,

        /// Wireframe color as #rrggbb
        #[arg(long, value_name = "COLOR", default_value = "#ffffff")]
        wire_color: String,

        /// Wireframe stroke width
        #[arg(long, value_name = "NUMBER", default_value_t = 1.0)]
        wire_width: Scalar,

        /// Random generator seed
        #[arg(long, value_name = "INTEGER", default_value_t = 0)]
        seed: u64,

        /// Output width in pixels; matches the analysis size when absent
        #[arg(long, value_name = "INTEGER")]
        output_resolution: Option<u32>,

        /// Space in which size-valued settings are declared
        #[arg(long, value_name = "SPACE", default_value_t)]
        settings_space: SettingsSpaceSelection,
    },
}

#[derive(Clone, Debug, Args)]
#[group(required = true)]
pub struct Format {
    /// Produce PNG artwork
    #[arg(long)]
    pub png: bool,

    /// Produce SVG artwork
    #[arg(long)]
    pub svg: bool,
}

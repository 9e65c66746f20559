pub mod density;
pub mod preprocess;
pub mod render;
pub mod settings;

use image::{imageops::FilterType, DynamicImage, GenericImageView, GrayImage, RgbaImage};
use lowpoly_core::prelude::*;
use rand::{rngs::StdRng, SeedableRng};

use crate::render::RenderStyle;
pub use crate::{
    density::density_field,
    preprocess::preprocess,
    settings::{
        parse_hex_color, DensityMode, OutputFormat, PreprocessSettings, SettingsSpace,
        TriangulateSettings,
    },
};

/// Largest analysis dimension used when no explicit resolution is
/// requested; the source is downscaled uniformly until both dimensions fit.
const MAX_ANALYSIS_SIZE: u32 = 1000;

/// Error that can happen during image triangulation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriangulateError {
    /// Input image or settings cannot be processed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested output format is not supported.
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
}

impl From<DensityFieldError> for TriangulateError {
    fn from(error: DensityFieldError) -> Self {
        Self::InvalidInput(error.to_string())
    }
}

/// Complete description of one triangulation run.
#[derive(Debug, Clone)]
pub struct TriangulateConfig {
    /// Source image.
    pub image: DynamicImage,
    /// Analysis width in pixels, with height following the source aspect
    /// ratio. When absent, the source is downscaled uniformly so neither
    /// dimension exceeds 1000 pixels.
    pub resolution: Option<u32>,
    /// Output width in pixels. When absent, output matches analysis size.
    pub output_resolution: Option<u32>,
    /// Photometric preprocessing settings.
    pub preprocess: PreprocessSettings,
    /// Triangulation and styling settings.
    pub settings: TriangulateSettings,
    /// Requested artifact kind.
    pub format: OutputFormat,
}

impl Default for TriangulateConfig {
    fn default() -> Self {
        Self {
            image: DynamicImage::new_rgba8(1, 1),
            resolution: None,
            output_resolution: None,
            preprocess: PreprocessSettings::default(),
            settings: TriangulateSettings::default(),
            format: OutputFormat::Image,
        }
    }
}

/// Produced artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// Raster surface (`canvas` and `image` formats).
    Raster(RgbaImage),
    /// Vector document (`svg` format).
    Svg(String),
}

/// Triangulate an image into a low-poly artifact.
///
/// ```no_run
/// use lowpoly_image::{triangulate, TriangulateConfig};
///
/// let config = TriangulateConfig {
///     image: image::open("input.png").unwrap(),
///     ..Default::default()
/// };
/// let artifact = triangulate(&config).unwrap();
/// # let _ = artifact;
/// ```
pub fn triangulate(config: &TriangulateConfig) -> Result<Artifact, TriangulateError> {
    triangulate_tracked(config, |_| {})
}

/// Same as [`triangulate`] but reports progress as a non-decreasing integer
/// percentage in `[0, 100]`.
pub fn triangulate_tracked<F>(
    config: &TriangulateConfig,
    on_progress: F,
) -> Result<Artifact, TriangulateError>
where
    F: FnMut(u32),
{
    let mut tracker = ProgressTracker::new(Some(on_progress));

    let buffer = analysis_buffer(&config.image, config.resolution)?;
    let buffer = preprocess(&buffer, &config.preprocess);
    let ana_w = buffer.width();
    let ana_h = buffer.height();
    let (out_w, out_h) = render::output_dimensions(ana_w, ana_h, config.output_resolution);
    let sx = out_w as Scalar / ana_w as Scalar;
    let settings = config.settings.to_analysis_units(sx);
    log::debug!(
        "analysis {}x{}, output {}x{}, scale {}",
        ana_w,
        ana_h,
        out_w,
        out_h,
        sx
    );
    tracker.complete(PipelineStage::Prepare);

    let field = density_field(&buffer, config.preprocess.density_mode, config.preprocess.edge_boost)?;
    tracker.complete(PipelineStage::Density);

    let sampling = PointSamplingSettings {
        target: settings.points,
        dark_strength: settings.dark_strength,
        min_dist: settings.min_dist,
        edge_samples: settings.edge_samples,
    };
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let points = collect_points(&field, &sampling, &mut rng);
    log::debug!("sampled {} points", points.len());
    tracker.complete(PipelineStage::Points);

    let mesh = triangulate_points(&points, ana_w as Scalar, ana_h as Scalar, |done, total| {
        tracker.partial(PipelineStage::Triangulation, done as Scalar / total as Scalar);
    });
    log::debug!("triangulated into {} triangles", mesh.triangles.len());
    tracker.complete(PipelineStage::Triangulation);

    let style = RenderStyle {
        show_wires: settings.show_wires,
        wire_color: parse_hex_color(&settings.wire_color)?,
        wire_width: settings.wire_width,
    };
    let artifact = match config.format {
        OutputFormat::Canvas | OutputFormat::Image => {
            Artifact::Raster(render::render_raster(&mesh, &buffer, out_w, out_h, &style))
        }
        OutputFormat::Svg => Artifact::Svg(render::render_svg(&mesh, &buffer, out_w, out_h, &style)),
    };
    tracker.complete(PipelineStage::Rendering);
    Ok(artifact)
}

/// Render the density field of an image as a grayscale picture, useful for
/// tuning preprocessing settings.
pub fn density_image(
    image: &DynamicImage,
    resolution: Option<u32>,
    settings: &PreprocessSettings,
) -> Result<GrayImage, TriangulateError> {
    let buffer = analysis_buffer(image, resolution)?;
    let buffer = preprocess(&buffer, settings);
    let field = density_field(&buffer, settings.density_mode, settings.edge_boost)?;
    let data = field
        .values()
        .iter()
        .map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect::<Vec<_>>();
    GrayImage::from_raw(buffer.width(), buffer.height(), data)
        .ok_or_else(|| TriangulateError::InvalidInput("density buffer size mismatch".to_owned()))
}

/// Scale the source into the analysis buffer. An explicit resolution sets
/// the width with height following the source aspect ratio; otherwise the
/// source is downscaled uniformly until its larger dimension fits in 1000
/// pixels. Dimensions never drop below one pixel.
fn analysis_buffer(
    image: &DynamicImage,
    resolution: Option<u32>,
) -> Result<RgbaImage, TriangulateError> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Err(TriangulateError::InvalidInput(
            "empty input image".to_owned(),
        ));
    }
    let scale = match resolution {
        Some(resolution) if resolution > 0 => resolution as Scalar / width as Scalar,
        Some(_) => {
            return Err(TriangulateError::InvalidInput(
                "analysis resolution must be positive".to_owned(),
            ))
        }
        None => {
            let largest = width.max(height);
            if largest <= MAX_ANALYSIS_SIZE {
                return Ok(image.to_rgba8());
            }
            MAX_ANALYSIS_SIZE as Scalar / largest as Scalar
        }
    };
    let target_width = ((width as Scalar * scale).round() as u32).max(1);
    let target_height = ((height as Scalar * scale).round() as u32).max(1);
    if (target_width, target_height) == (width, height) {
        return Ok(image.to_rgba8());
    }
    Ok(image
        .resize_exact(target_width, target_height, FilterType::Triangle)
        .to_rgba8())
}

use crate::{preprocess::luma, settings::DensityMode};
use image::RgbaImage;
use lowpoly_core::prelude::*;

const LUMA_BOOST_FACTOR: Scalar = 1.2;

/// Build the density field for a preprocessed analysis buffer.
///
/// Each pixel collapses to a scalar `L` per the density mode and density is
/// `1 - L`, so ink increases as brightness decreases. When `edge_boost > 0`
/// a Sobel gradient-magnitude map over luma is added with that weight; when
/// it is 0 the edge pass is skipped entirely, not merely zero-weighted.
///
/// # Arguments
/// * `buffer` - Preprocessed analysis buffer.
/// * `mode` - Density extraction mode.
/// * `edge_boost` - Sobel edge boost weight.
///
/// # Returns
/// Density field at analysis resolution or error.
pub fn density_field(
    buffer: &RgbaImage,
    mode: DensityMode,
    edge_boost: Scalar,
) -> Result<DensityField, DensityFieldError> {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let mut data = Vec::with_capacity(width * height);
    for pixel in buffer.pixels() {
        let r = pixel.0[0] as Scalar / 255.0;
        let g = pixel.0[1] as Scalar / 255.0;
        let b = pixel.0[2] as Scalar / 255.0;
        let l = match mode {
            DensityMode::Luma => luma(r, g, b),
            DensityMode::LumaBoost => {
                (0.5 + (luma(r, g, b) - 0.5) * LUMA_BOOST_FACTOR).clamp(0.0, 1.0)
            }
            DensityMode::Red => r,
            DensityMode::Green => g,
            DensityMode::Blue => b,
        };
        data.push(1.0 - l);
    }
    if edge_boost > 0.0 {
        for (density, magnitude) in data.iter_mut().zip(sobel_edges(buffer)) {
            *density = (*density + edge_boost * magnitude).clamp(0.0, 1.0);
        }
    }
    DensityField::new(width, height, data)
}

/// Sobel gradient magnitude over luma, normalized by the maximum magnitude
/// observed. Border pixels are left at zero.
fn sobel_edges(buffer: &RgbaImage) -> Vec<Scalar> {
    let width = buffer.width() as usize;
    let height = buffer.height() as usize;
    let gray = buffer
        .pixels()
        .map(|p| {
            luma(
                p.0[0] as Scalar / 255.0,
                p.0[1] as Scalar / 255.0,
                p.0[2] as Scalar / 255.0,
            )
        })
        .collect::<Vec<_>>();
    let mut out = vec![0.0; width * height];
    let mut max_magnitude: Scalar = 1e-6;
    let at = |x: usize, y: usize| gray[y * width + x];
    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let gx = -at(x - 1, y - 1) + at(x + 1, y - 1) - 2.0 * at(x - 1, y)
                + 2.0 * at(x + 1, y)
                - at(x - 1, y + 1)
                + at(x + 1, y + 1);
            let gy = at(x - 1, y - 1) + 2.0 * at(x, y - 1) + at(x + 1, y - 1)
                - at(x - 1, y + 1)
                - 2.0 * at(x, y + 1)
                - at(x + 1, y + 1);
            let magnitude = (gx * gx + gy * gy).sqrt();
            out[y * width + x] = magnitude;
            if magnitude > max_magnitude {
                max_magnitude = magnitude;
            }
        }
    }
    let inv = 1.0 / max_magnitude;
    for value in &mut out {
        *value *= inv;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn solid_black_is_full_density() {
        let buffer = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]));
        let field = density_field(&buffer, DensityMode::Luma, 0.0).unwrap();
        assert!(field.values().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn solid_white_is_zero_density() {
        let buffer = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        let field = density_field(&buffer, DensityMode::Luma, 0.0).unwrap();
        assert!(field.values().iter().all(|v| v.abs() < 1e-5));
    }

    #[test]
    fn channel_modes_read_their_channel() {
        let buffer = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let red = density_field(&buffer, DensityMode::Red, 0.0).unwrap();
        assert!(red.values().iter().all(|v| *v == 0.0));
        let green = density_field(&buffer, DensityMode::Green, 0.0).unwrap();
        assert!(green.values().iter().all(|v| *v == 1.0));
        let blue = density_field(&buffer, DensityMode::Blue, 0.0).unwrap();
        assert!(blue.values().iter().all(|v| *v == 1.0));
    }

    #[test]
    fn luma_boost_recontrasts_around_midpoint() {
        let buffer = RgbaImage::from_pixel(1, 1, Rgba([255, 255, 255, 255]));
        let boosted = density_field(&buffer, DensityMode::LumaBoost, 0.0).unwrap();
        // L = clamp(0.5 + (1 - 0.5) * 1.2) = 1, density 0.
        assert!(boosted.values()[0].abs() < 1e-5);
    }

    #[test]
    fn zero_edge_boost_skips_the_edge_pass() {
        let mut buffer = RgbaImage::new(6, 6);
        for (x, _, pixel) in buffer.enumerate_pixels_mut() {
            let v = if x < 3 { 255 } else { 0 };
            *pixel = Rgba([v, v, v, 255]);
        }
        let base = density_field(&buffer, DensityMode::Luma, 0.0).unwrap();
        let boosted = density_field(&buffer, DensityMode::Luma, 0.5).unwrap();
        assert_ne!(base, boosted);
        // A uniform buffer has no gradients, so the boost changes nothing.
        let flat = RgbaImage::from_pixel(6, 6, Rgba([40, 40, 40, 255]));
        assert_eq!(
            density_field(&flat, DensityMode::Luma, 0.0).unwrap(),
            density_field(&flat, DensityMode::Luma, 0.5).unwrap(),
        );
    }

    #[test]
    fn edge_boost_raises_density_near_contrast_edges() {
        let mut buffer = RgbaImage::new(6, 6);
        for (x, _, pixel) in buffer.enumerate_pixels_mut() {
            let v = if x < 3 { 255 } else { 0 };
            *pixel = Rgba([v, v, v, 255]);
        }
        let base = density_field(&buffer, DensityMode::Luma, 0.0).unwrap();
        let boosted = density_field(&buffer, DensityMode::Luma, 0.5).unwrap();
        // White pixel next to the boundary: base density ~0, boosted well above.
        let index = 2 * 6 + 2;
        assert!(base.values()[index].abs() < 1e-5);
        assert!(boosted.values()[index] > 0.4);
    }
}

use crate::settings::PreprocessSettings;
use image::{imageops, Rgba, RgbaImage};
use lowpoly_core::Scalar;

const GAMMA_EPSILON: Scalar = 1e-3;

/// BT.709 luma of normalized RGB.
#[inline]
pub(crate) fn luma(r: Scalar, g: Scalar, b: Scalar) -> Scalar {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

#[inline]
fn to_channel(value: Scalar) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Apply photometric preprocessing to the analysis buffer, returning a new
/// buffer and leaving the input untouched.
///
/// Brightness, contrast, saturation and invert run as a combined per-pixel
/// transform, followed by a Gaussian blur when `blur > 0`. Gamma correction
/// and forced desaturation are then applied together whenever either
/// condition holds, matching the combined gate of the original pixel
/// pipeline: gamma within 1e-3 of 1 is skipped, and `saturation == 0`
/// collapses each pixel to its BT.709 luma even when gamma is near 1.
pub fn preprocess(buffer: &RgbaImage, settings: &PreprocessSettings) -> RgbaImage {
    let mut out = buffer.clone();
    for pixel in out.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let mut rgb = [
            r as Scalar / 255.0,
            g as Scalar / 255.0,
            b as Scalar / 255.0,
        ];
        for channel in &mut rgb {
            *channel *= settings.brightness;
            *channel = (*channel - 0.5) * settings.contrast + 0.5;
        }
        let l = luma(rgb[0], rgb[1], rgb[2]);
        for channel in &mut rgb {
            *channel = l + (*channel - l) * settings.saturation;
            if settings.invert {
                *channel = 1.0 - *channel;
            }
        }
        *pixel = Rgba([
            to_channel(rgb[0]),
            to_channel(rgb[1]),
            to_channel(rgb[2]),
            a,
        ]);
    }

    if settings.blur > 0.0 {
        out = imageops::blur(&out, settings.blur);
    }

    let apply_gamma = (settings.gamma - 1.0).abs() > GAMMA_EPSILON;
    if apply_gamma || settings.saturation == 0.0 {
        let gamma_inv = 1.0 / settings.gamma;
        for pixel in out.pixels_mut() {
            let Rgba([r, g, b, a]) = *pixel;
            let mut rgb = [r as Scalar, g as Scalar, b as Scalar];
            if apply_gamma {
                for channel in &mut rgb {
                    *channel = 255.0 * (*channel / 255.0).powf(gamma_inv);
                }
            }
            if settings.saturation == 0.0 {
                let l = 0.2126 * rgb[0] + 0.7152 * rgb[1] + 0.0722 * rgb[2];
                rgb = [l, l, l];
            }
            *pixel = Rgba([
                (rgb[0]).round().clamp(0.0, 255.0) as u8,
                (rgb[1]).round().clamp(0.0, 255.0) as u8,
                (rgb[2]).round().clamp(0.0, 255.0) as u8,
                a,
            ]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba(color))
    }

    #[test]
    fn default_settings_are_identity() {
        let mut buffer = RgbaImage::new(3, 3);
        for (i, pixel) in buffer.pixels_mut().enumerate() {
            let v = (i * 28) as u8;
            *pixel = Rgba([v, v.wrapping_add(40), v.wrapping_add(80), 255]);
        }
        let out = preprocess(&buffer, &PreprocessSettings::default());
        assert_eq!(out, buffer);
    }

    #[test]
    fn invert_flips_channels() {
        let out = preprocess(
            &solid(2, 2, [0, 128, 255, 255]),
            &PreprocessSettings {
                invert: true,
                ..Default::default()
            },
        );
        assert_eq!(*out.get_pixel(0, 0), Rgba([255, 127, 0, 255]));
    }

    #[test]
    fn brightness_scales_channels() {
        let out = preprocess(
            &solid(1, 1, [100, 100, 100, 255]),
            &PreprocessSettings {
                brightness: 2.0,
                ..Default::default()
            },
        );
        assert_eq!(*out.get_pixel(0, 0), Rgba([200, 200, 200, 255]));
    }

    #[test]
    fn gamma_lifts_midtones() {
        let out = preprocess(
            &solid(1, 1, [64, 64, 64, 255]),
            &PreprocessSettings {
                gamma: 2.0,
                ..Default::default()
            },
        );
        // 255 * (64/255)^(1/2) = 127.75
        assert_eq!(*out.get_pixel(0, 0), Rgba([128, 128, 128, 255]));
    }

    #[test]
    fn zero_saturation_desaturates_even_with_unit_gamma() {
        let out = preprocess(
            &solid(1, 1, [255, 0, 0, 255]),
            &PreprocessSettings {
                saturation: 0.0,
                gamma: 1.0,
                ..Default::default()
            },
        );
        let Rgba([r, g, b, _]) = *out.get_pixel(0, 0);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn preserves_alpha() {
        let out = preprocess(
            &solid(1, 1, [10, 20, 30, 77]),
            &PreprocessSettings {
                brightness: 1.5,
                gamma: 2.2,
                ..Default::default()
            },
        );
        assert_eq!(out.get_pixel(0, 0).0[3], 77);
    }
}

use image::{Rgba, RgbaImage};
use lowpoly_core::prelude::*;
use svg::node::element::{path::Data, Path, Rectangle};
use svg::Document;

/// Fixed opacity of the wireframe pass.
const WIRE_OPACITY: Scalar = 0.24;

/// Per-invocation rendering style, with size values already normalized to
/// analysis units.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RenderStyle {
    pub show_wires: bool,
    pub wire_color: [u8; 3],
    pub wire_width: Scalar,
}

/// Output dimensions from the analysis dimensions: uniformly scaled by
/// `output_resolution / analysis_width` when provided, else unchanged.
pub(crate) fn output_dimensions(
    analysis_width: u32,
    analysis_height: u32,
    output_resolution: Option<u32>,
) -> (u32, u32) {
    match output_resolution {
        Some(resolution) if resolution > 0 => {
            let scale = resolution as Scalar / analysis_width as Scalar;
            (
                (analysis_width as Scalar * scale).round() as u32,
                (analysis_height as Scalar * scale).round().max(1.0) as u32,
            )
        }
        _ => (analysis_width, analysis_height),
    }
}

/// Stroke width in output-space units: the analysis-space width scaled up,
/// floored at half a pixel so hairlines stay visible.
pub(crate) fn stroke_width(wire_width: Scalar, sx: Scalar) -> Scalar {
    (wire_width * sx).max(0.5)
}

/// Nearest-pixel sample with coordinates clamped to the buffer bounds.
pub(crate) fn sample_pixel(buffer: &RgbaImage, x: Scalar, y: Scalar) -> Rgba<u8> {
    if !x.is_finite() || !y.is_finite() {
        return Rgba([0, 0, 0, 255]);
    }
    let xi = ((x + 0.5).floor().max(0.0) as u32).min(buffer.width() - 1);
    let yi = ((y + 0.5).floor().max(0.0) as u32).min(buffer.height() - 1);
    *buffer.get_pixel(xi, yi)
}

/// Render the mesh to a raster surface.
///
/// Geometry is scaled from analysis to output space at draw time; fill
/// colors are sampled at each triangle's centroid from the preprocessed
/// analysis buffer. When wires are off, every triangle is stroked in its
/// own fill color to hide seams between adjacent fills; when on, a single
/// wire pass strokes all edges at fixed 24% opacity after the fills.
pub(crate) fn render_raster(
    mesh: &TriangleMesh,
    buffer: &RgbaImage,
    out_w: u32,
    out_h: u32,
    style: &RenderStyle,
) -> RgbaImage {
    let sx = out_w as Scalar / buffer.width() as Scalar;
    let sy = out_h as Scalar / buffer.height() as Scalar;
    let width = stroke_width(style.wire_width, sx);

    let background = sample_pixel(buffer, 0.0, 0.0);
    let mut out = RgbaImage::from_pixel(out_w, out_h, background);

    for triangle in &mesh.triangles {
        let [a, b, c] = mesh.vertices(triangle);
        let scaled = [
            Coord::new(a.x * sx, a.y * sy),
            Coord::new(b.x * sx, b.y * sy),
            Coord::new(c.x * sx, c.y * sy),
        ];
        let centroid = mesh.centroid(triangle);
        let color = sample_pixel(buffer, centroid.x, centroid.y);
        let fill = Rgba([color.0[0], color.0[1], color.0[2], 255]);
        fill_polygon(&mut out, &scaled, fill, 1.0);
        if !style.show_wires {
            for (p, q) in [(0, 1), (1, 2), (2, 0)] {
                stroke_segment(&mut out, scaled[p], scaled[q], width, fill, 1.0);
            }
        }
    }

    if style.show_wires {
        let wire = Rgba([
            style.wire_color[0],
            style.wire_color[1],
            style.wire_color[2],
            255,
        ]);
        for triangle in &mesh.triangles {
            let [a, b, c] = mesh.vertices(triangle);
            let scaled = [
                Coord::new(a.x * sx, a.y * sy),
                Coord::new(b.x * sx, b.y * sy),
                Coord::new(c.x * sx, c.y * sy),
            ];
            for (p, q) in [(0, 1), (1, 2), (2, 0)] {
                stroke_segment(&mut out, scaled[p], scaled[q], width, wire, WIRE_OPACITY);
            }
        }
    }
    out
}

/// Render the mesh to an SVG document with identical triangle placement and
/// per-triangle colors as the raster backend: one background `<rect>` plus
/// one closed 3-point `<path>` per triangle.
pub(crate) fn render_svg(
    mesh: &TriangleMesh,
    buffer: &RgbaImage,
    out_w: u32,
    out_h: u32,
    style: &RenderStyle,
) -> String {
    let sx = out_w as Scalar / buffer.width() as Scalar;
    let sy = out_h as Scalar / buffer.height() as Scalar;
    let width = stroke_width(style.wire_width, sx);

    let background = sample_pixel(buffer, 0.0, 0.0);
    let mut document = Document::new()
        .set("width", out_w)
        .set("height", out_h)
        .set("viewBox", (0, 0, out_w, out_h))
        .add(
            Rectangle::new()
                .set("x", 0)
                .set("y", 0)
                .set("width", out_w)
                .set("height", out_h)
                .set("fill", rgb_attribute(background))
                .set("fill-opacity", background.0[3] as Scalar / 255.0),
        );

    for triangle in &mesh.triangles {
        let [a, b, c] = mesh.vertices(triangle);
        let centroid = mesh.centroid(triangle);
        let color = sample_pixel(buffer, centroid.x, centroid.y);
        let data = Data::new()
            .move_to((a.x * sx, a.y * sy))
            .line_to((b.x * sx, b.y * sy))
            .line_to((c.x * sx, c.y * sy))
            .close();
        let mut path = Path::new()
            .set("d", data)
            .set("fill", rgb_attribute(color))
            .set("stroke-width", width);
        if style.show_wires {
            path = path
                .set(
                    "stroke",
                    rgb_attribute(Rgba([
                        style.wire_color[0],
                        style.wire_color[1],
                        style.wire_color[2],
                        255,
                    ])),
                )
                .set("stroke-opacity", WIRE_OPACITY);
        } else {
            path = path.set("stroke", rgb_attribute(color));
        }
        document = document.add(path);
    }
    document.to_string()
}

fn rgb_attribute(color: Rgba<u8>) -> String {
    format!("rgb({},{},{})", color.0[0], color.0[1], color.0[2])
}

/// Scanline polygon fill over pixel centers with optional alpha blending.
fn fill_polygon(image: &mut RgbaImage, points: &[Coord], color: Rgba<u8>, opacity: Scalar) {
    let height = image.height() as i64;
    let width = image.width() as i64;
    let min_y = points
        .iter()
        .map(|p| p.y)
        .fold(Scalar::INFINITY, Scalar::min)
        .floor()
        .max(0.0) as i64;
    let max_y = (points
        .iter()
        .map(|p| p.y)
        .fold(Scalar::NEG_INFINITY, Scalar::max)
        .ceil() as i64)
        .min(height - 1);

    let mut crossings = Vec::with_capacity(points.len());
    for y in min_y..=max_y {
        let py = y as Scalar + 0.5;
        crossings.clear();
        for i in 0..points.len() {
            let p = points[i];
            let q = points[(i + 1) % points.len()];
            let (lo, hi) = if p.y <= q.y { (p, q) } else { (q, p) };
            // Half-open span so shared vertices are counted once.
            if py >= lo.y && py < hi.y {
                let t = (py - lo.y) / (hi.y - lo.y);
                crossings.push(lo.x + (hi.x - lo.x) * t);
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        for pair in crossings.chunks(2) {
            if pair.len() < 2 {
                continue;
            }
            let from = ((pair[0] - 0.5).ceil().max(0.0)) as i64;
            let to = ((pair[1] - 0.5).floor() as i64).min(width - 1);
            for x in from..=to {
                blend_pixel(image, x, y, color, opacity);
            }
        }
    }
}

/// Stroke a segment as a filled quad of the given width.
fn stroke_segment(
    image: &mut RgbaImage,
    from: Coord,
    to: Coord,
    width: Scalar,
    color: Rgba<u8>,
    opacity: Scalar,
) {
    let direction = to - from;
    let length = direction.magnitude();
    if length <= 0.0 {
        return;
    }
    let normal = Coord::new(-direction.y, direction.x) / length * (width / 2.0);
    let quad = [from + normal, to + normal, to - normal, from - normal];
    fill_polygon(image, &quad, color, opacity);
}

fn blend_pixel(image: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>, opacity: Scalar) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let (x, y) = (x as u32, y as u32);
    if opacity >= 1.0 {
        image.put_pixel(x, y, color);
        return;
    }
    let destination = *image.get_pixel(x, y);
    let mut blended = [0u8; 4];
    for i in 0..4 {
        let d = destination.0[i] as Scalar;
        let s = color.0[i] as Scalar;
        blended[i] = (d + (s - d) * opacity).round().clamp(0.0, 255.0) as u8;
    }
    image.put_pixel(x, y, Rgba(blended));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_buffer() -> RgbaImage {
        let mut buffer = RgbaImage::new(4, 4);
        for (x, y, pixel) in buffer.enumerate_pixels_mut() {
            *pixel = if x < 2 {
                Rgba([200, 40, 40, 255])
            } else {
                Rgba([40, 40, 200, 255])
            };
            if y == 0 && x == 0 {
                *pixel = Rgba([10, 20, 30, 255]);
            }
        }
        buffer
    }

    fn two_triangle_mesh() -> TriangleMesh {
        TriangleMesh {
            points: vec![
                Coord::new(0.0, 0.0),
                Coord::new(3.0, 0.0),
                Coord::new(3.0, 3.0),
                Coord::new(0.0, 3.0),
            ],
            triangles: vec![Triangle { a: 0, b: 1, c: 2 }, Triangle { a: 0, b: 2, c: 3 }],
        }
    }

    #[test]
    fn output_dimensions_scale_uniformly() {
        assert_eq!(output_dimensions(100, 50, None), (100, 50));
        assert_eq!(output_dimensions(100, 50, Some(200)), (200, 100));
        assert_eq!(output_dimensions(100, 40, Some(50)), (50, 20));
    }

    #[test]
    fn stroke_width_has_half_pixel_floor() {
        assert_eq!(stroke_width(1.0, 2.0), 2.0);
        assert_eq!(stroke_width(0.1, 1.0), 0.5);
        // Output-space declaration round-trips through the scale factor.
        let analysis = 4.0 / 2.0;
        assert_eq!(stroke_width(analysis, 2.0), 4.0);
    }

    #[test]
    fn sample_pixel_clamps_to_bounds() {
        let buffer = checker_buffer();
        assert_eq!(sample_pixel(&buffer, -10.0, -10.0), *buffer.get_pixel(0, 0));
        assert_eq!(sample_pixel(&buffer, 100.0, 100.0), *buffer.get_pixel(3, 3));
        assert_eq!(sample_pixel(&buffer, Scalar::NAN, 0.0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn raster_background_uses_origin_pixel() {
        let buffer = checker_buffer();
        let mesh = TriangleMesh::default();
        let style = RenderStyle {
            show_wires: false,
            wire_color: [255, 255, 255],
            wire_width: 1.0,
        };
        let out = render_raster(&mesh, &buffer, 4, 4, &style);
        assert_eq!(*out.get_pixel(3, 3), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn raster_fill_color_comes_from_centroid() {
        let buffer = checker_buffer();
        let mesh = TriangleMesh {
            points: vec![
                Coord::new(0.0, 0.0),
                Coord::new(3.0, 0.0),
                Coord::new(0.0, 3.0),
            ],
            triangles: vec![Triangle { a: 0, b: 1, c: 2 }],
        };
        let style = RenderStyle {
            show_wires: false,
            wire_color: [255, 255, 255],
            wire_width: 0.0,
        };
        let out = render_raster(&mesh, &buffer, 4, 4, &style);
        // Centroid (1, 1) samples the red half.
        assert_eq!(*out.get_pixel(1, 1), Rgba([200, 40, 40, 255]));
    }

    #[test]
    fn svg_lists_one_path_per_triangle() {
        let buffer = checker_buffer();
        let mesh = two_triangle_mesh();
        let style = RenderStyle {
            show_wires: true,
            wire_color: [16, 32, 48],
            wire_width: 1.0,
        };
        let svg = render_svg(&mesh, &buffer, 4, 4, &style);
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<rect"));
        assert_eq!(svg.matches("<path").count(), mesh.triangles.len());
        assert!(svg.contains("viewBox=\"0 0 4 4\""));
        assert!(svg.contains("stroke=\"rgb(16,32,48)\""));
        assert!(svg.contains("stroke-opacity=\"0.24\""));
    }

    #[test]
    fn svg_and_raster_share_triangle_colors() {
        let buffer = checker_buffer();
        let mesh = two_triangle_mesh();
        let style = RenderStyle {
            show_wires: false,
            wire_color: [255, 255, 255],
            wire_width: 0.0,
        };
        let svg = render_svg(&mesh, &buffer, 4, 4, &style);
        for triangle in &mesh.triangles {
            let centroid = mesh.centroid(triangle);
            let color = sample_pixel(&buffer, centroid.x, centroid.y);
            assert!(svg.contains(&format!("fill=\"{}\"", rgb_attribute(color))));
        }
    }

    #[test]
    fn wireless_svg_strokes_in_fill_color() {
        let buffer = checker_buffer();
        let mesh = two_triangle_mesh();
        let style = RenderStyle {
            show_wires: false,
            wire_color: [255, 255, 255],
            wire_width: 1.0,
        };
        let svg = render_svg(&mesh, &buffer, 4, 4, &style);
        assert!(!svg.contains("stroke-opacity"));
        assert!(!svg.contains("rgb(255,255,255)"));
    }
}

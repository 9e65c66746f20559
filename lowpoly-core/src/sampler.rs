use crate::{coord::Coord, field::DensityField, Scalar};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Lower clamp bound for the darkness exponent.
pub const MIN_DARK_STRENGTH: Scalar = 0.1;
/// Upper clamp bound for the darkness exponent.
pub const MAX_DARK_STRENGTH: Scalar = 8.0;

const RELAXATION_STEPS: i32 = 6;
const RELAXATION_FACTOR: Scalar = 0.8;

/// Settings of darkness-biased point sampling.
///
/// Size-valued settings (`min_dist`, `edge_samples`) are interpreted in
/// analysis-space pixel units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSamplingSettings {
    /// Target point count. The sampler may return fewer points when the
    /// target cannot be met even after spacing relaxation.
    #[serde(default = "PointSamplingSettings::default_target")]
    pub target: usize,
    /// Darkness bias exponent; acceptance probability is density raised to
    /// this power. Clamped to `[0.1, 8.0]` before use.
    #[serde(default = "PointSamplingSettings::default_dark_strength")]
    pub dark_strength: Scalar,
    /// Minimal pairwise spacing between points.
    #[serde(default = "PointSamplingSettings::default_min_dist")]
    pub min_dist: Scalar,
    /// Number of evenly spaced seed points along each border edge.
    #[serde(default = "PointSamplingSettings::default_edge_samples")]
    pub edge_samples: Scalar,
}

impl Default for PointSamplingSettings {
    fn default() -> Self {
        Self {
            target: Self::default_target(),
            dark_strength: Self::default_dark_strength(),
            min_dist: Self::default_min_dist(),
            edge_samples: Self::default_edge_samples(),
        }
    }
}

impl PointSamplingSettings {
    fn default_target() -> usize {
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
}

/// Uniform spatial hash over the field extent for amortized O(1) spacing
/// queries. Cell size never drops below 2 so the 3x3 neighborhood always
/// covers the spacing radius.
struct SpatialGrid {
    cell: Scalar,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<Coord>>,
}

impl SpatialGrid {
    fn new(width: Scalar, height: Scalar, min_dist: Scalar) -> Self {
        let cell = min_dist.max(2.0);
        let cols = ((width / cell).ceil() as usize).max(1);
        let rows = ((height / cell).ceil() as usize).max(1);
        Self {
            cell,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
        }
    }

    fn insert(&mut self, point: Coord) {
        let cx = ((point.x / self.cell) as usize).min(self.cols - 1);
        let cy = ((point.y / self.cell) as usize).min(self.rows - 1);
        self.buckets[cy * self.cols + cx].push(point);
    }

    fn far_enough(&self, point: Coord, min_dist: Scalar) -> bool {
        if !point.is_finite() {
            return false;
        }
        if min_dist <= 0.0 {
            return true;
        }
        let limit = min_dist * min_dist;
        let cx = (point.x / self.cell) as isize;
        let cy = (point.y / self.cell) as isize;
        for oy in -1..=1 {
            for ox in -1..=1 {
                let nx = cx + ox;
                let ny = cy + oy;
                if nx < 0 || ny < 0 || nx >= self.cols as isize || ny >= self.rows as isize {
                    continue;
                }
                let bucket = &self.buckets[ny as usize * self.cols + nx as usize];
                if bucket
                    .iter()
                    .any(|p| (*p - point).sqr_magnitude() < limit)
                {
                    return false;
                }
            }
        }
        true
    }
}

/// Place up to `settings.target` points over the density field, biased
/// toward high-density regions.
///
/// The four image corners are always included. Border seed points and
/// rejection-sampled interior points honor the minimal spacing; if the
/// target cannot be reached the spacing is relaxed geometrically (factor
/// 0.8, up to 6 steps, floor 1) and previously accepted points are
/// revalidated against the looser spacing. Returning fewer points than the
/// target is graceful degradation, not an error.
///
/// # Arguments
/// * `field` - Density field guiding acceptance.
/// * `settings` - Sampling settings in analysis units.
/// * `rng` - Seeded random generator; identical seeds reproduce identical
///   point sets.
///
/// # Returns
/// Sampled points in insertion order.
pub fn collect_points<R: Rng>(
    field: &DensityField,
    settings: &PointSamplingSettings,
    rng: &mut R,
) -> Vec<Coord> {
    let w = field.width() as Scalar;
    let h = field.height() as Scalar;
    let dark_strength = settings
        .dark_strength
        .clamp(MIN_DARK_STRENGTH, MAX_DARK_STRENGTH);
    let mut min_dist = settings.min_dist.max(0.0);
    let mut grid = SpatialGrid::new(w, h, min_dist);
    let mut points = Vec::with_capacity(settings.target.max(4));

    // Corners guarantee full-frame coverage.
    for corner in [
        Coord::new(0.0, 0.0),
        Coord::new(w - 1.0, 0.0),
        Coord::new(w - 1.0, h - 1.0),
        Coord::new(0.0, h - 1.0),
    ] {
        points.push(corner);
        grid.insert(corner);
    }

    if settings.edge_samples > 0.0 {
        let count = settings.edge_samples.ceil() as usize;
        let denom = (settings.edge_samples.floor() - 1.0).max(1.0);
        for i in 0..count {
            let t = i as Scalar / denom;
            for candidate in [
                Coord::new(lerp(0.0, w - 1.0, t), 0.0),
                Coord::new(lerp(0.0, w - 1.0, t), h - 1.0),
                Coord::new(0.0, lerp(0.0, h - 1.0, t)),
                Coord::new(w - 1.0, lerp(0.0, h - 1.0, t)),
            ] {
                if grid.far_enough(candidate, min_dist) {
                    points.push(candidate);
                    grid.insert(candidate);
                }
            }
        }
    }

    let mut success = fill(field, settings, dark_strength, min_dist, &mut points, &mut grid, rng);
    if !success && min_dist > 1.0 {
        let start = min_dist;
        for step in 0..RELAXATION_STEPS {
            if success {
                break;
            }
            min_dist = (start * RELAXATION_FACTOR.powi(step + 1)).max(1.0);
            log::debug!(
                "relaxing point spacing to {} ({} of {} points placed)",
                min_dist,
                points.len(),
                settings.target,
            );
            grid = SpatialGrid::new(w, h, min_dist);
            let old = std::mem::take(&mut points);
            for point in old {
                if grid.far_enough(point, min_dist) {
                    points.push(point);
                    grid.insert(point);
                }
            }
            success = fill(field, settings, dark_strength, min_dist, &mut points, &mut grid, rng);
        }
    }
    points
}

fn fill<R: Rng>(
    field: &DensityField,
    settings: &PointSamplingSettings,
    dark_strength: Scalar,
    min_dist: Scalar,
    points: &mut Vec<Coord>,
    grid: &mut SpatialGrid,
    rng: &mut R,
) -> bool {
    let w = field.width() as Scalar;
    let h = field.height() as Scalar;
    let max_attempts = 2000.max(settings.target * 40);
    let mut attempts = 0;
    while points.len() < settings.target && attempts < max_attempts {
        attempts += 1;
        let x = rng.gen::<Scalar>() * w;
        let y = rng.gen::<Scalar>() * h;
        let density = field.value_at(x, y).clamp(0.0, 1.0);
        let acceptance = density.powf(dark_strength);
        let candidate = Coord::new(x, y);
        if rng.gen::<Scalar>() < acceptance && grid.far_enough(candidate, min_dist) {
            points.push(candidate);
            grid.insert(candidate);
        }
    }
    points.len() >= settings.target
}

#[inline]
fn lerp(from: Scalar, to: Scalar, t: Scalar) -> Scalar {
    from + (to - from) * t
}

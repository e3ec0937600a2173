//! TSPLIB distance functions for coordinate-based instances.
//!
//! All functions return whole numbers (as `f64`) rounded the way TSPLIB
//! prescribes for each edge weight type.

use super::NodeCoord;

const GEO_PI: f64 = 3.141592;
const GEO_EARTH_RADIUS: f64 = 6378.388;

/// Nearest integer, halves rounded up.
pub fn nint(x: f64) -> f64 {
    (x + 0.5).floor()
}

fn deltas(a: &NodeCoord, b: &NodeCoord) -> (f64, f64, f64) {
    let dz = match (a.z, b.z) {
        (Some(za), Some(zb)) => za - zb,
        _ => 0.0,
    };
    (a.x - b.x, a.y - b.y, dz)
}

pub fn euclidean(a: &NodeCoord, b: &NodeCoord) -> f64 {
    let (dx, dy, dz) = deltas(a, b);
    nint((dx * dx + dy * dy + dz * dz).sqrt())
}

pub fn ceil_euclidean(a: &NodeCoord, b: &NodeCoord) -> f64 {
    let (dx, dy, _) = deltas(a, b);
    (dx * dx + dy * dy).sqrt().ceil()
}

pub fn manhattan(a: &NodeCoord, b: &NodeCoord) -> f64 {
    let (dx, dy, dz) = deltas(a, b);
    nint(dx.abs() + dy.abs() + dz.abs())
}

pub fn maximum(a: &NodeCoord, b: &NodeCoord) -> f64 {
    let (dx, dy, dz) = deltas(a, b);
    nint(dx.abs()).max(nint(dy.abs())).max(nint(dz.abs()))
}

/// Pseudo-Euclidean distance used by the `att` instances.
pub fn pseudo_euclidean(a: &NodeCoord, b: &NodeCoord) -> f64 {
    let (dx, dy, _) = deltas(a, b);
    let r = ((dx * dx + dy * dy) / 10.0).sqrt();
    let t = nint(r);
    if t < r { t + 1.0 } else { t }
}

/// Great-circle distance in km with `x` as latitude and `y` as longitude, both
/// written as `DDD.MM` (degrees and minutes). The distance from a node to
/// itself is 1, as in the reference implementation.
pub fn geographical(a: &NodeCoord, b: &NodeCoord) -> f64 {
    let (lat_a, lng_a) = (geo_radians(a.x), geo_radians(a.y));
    let (lat_b, lng_b) = (geo_radians(b.x), geo_radians(b.y));
    let q1 = (lng_a - lng_b).cos();
    let q2 = (lat_a - lat_b).cos();
    let q3 = (lat_a + lat_b).cos();
    let cos_angle = (0.5 * ((1.0 + q1) * q2 - (1.0 - q1) * q3)).clamp(-1.0, 1.0);
    (GEO_EARTH_RADIUS * cos_angle.acos() + 1.0).trunc()
}

fn geo_radians(value: f64) -> f64 {
    let degrees = value.trunc();
    let minutes = value - degrees;
    GEO_PI * (degrees + 5.0 * minutes / 3.0) / 180.0
}

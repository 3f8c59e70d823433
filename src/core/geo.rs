//! Angular conversions and great-circle separation on the mean-radius sphere.

use std::f64::consts::PI;

/// Convert degrees to radians with the multiply-then-divide ordering used
/// throughout the crate. Kept as `x * PI / 180.0` (not `x.to_radians()`):
/// the two round differently in the last bit and every distance downstream
/// depends on this exact form.
#[inline]
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Central angle between two points given in radians, by the spherical law
/// of cosines.
///
/// The cosine argument is intentionally not clamped to `[-1, 1]`. For
/// coincident or near-coincident points `sin²φ + cos²φ` can round to just
/// above 1, in which case `acos` returns NaN; NaN fails every radius
/// comparison, so such pairs report as out of range rather than at distance
/// zero.
#[inline]
pub fn arc_between(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    (lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lon1 - lon2).cos()).acos()
}

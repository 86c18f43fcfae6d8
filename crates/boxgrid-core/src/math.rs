//! Minimal 3-D vector helpers.

/// A position or displacement in continuous 3-D space.
pub type Real3 = [f64; 3];

/// Squared Euclidean distance between two points.
#[inline]
pub fn squared_distance(a: &Real3, b: &Real3) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

/// Squared distance under periodic boundaries (minimum image convention).
///
/// `period` is the domain length, identical on every axis.
#[inline]
pub fn squared_distance_periodic(a: &Real3, b: &Real3, period: f64) -> f64 {
    let half = period * 0.5;
    let mut sum = 0.0;
    for i in 0..3 {
        let mut d = (a[i] - b[i]).abs() % period;
        if d > half {
            d = period - d;
        }
        sum += d * d;
    }
    sum
}

/// Returns `true` if every component is finite.
#[inline]
pub fn is_finite(p: &Real3) -> bool {
    p.iter().all(|c| c.is_finite())
}

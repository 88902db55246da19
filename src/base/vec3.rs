//! Implements small helpers for 3D vectors stored as `[f64; 3]`

/// Returns a + b
#[inline]
pub fn add3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Returns a - b
#[inline]
pub fn sub3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Returns α a
#[inline]
pub fn scale3(alpha: f64, a: &[f64; 3]) -> [f64; 3] {
    [alpha * a[0], alpha * a[1], alpha * a[2]]
}

/// Returns a · b
#[inline]
pub fn dot3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Returns a × b
#[inline]
pub fn cross3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Returns the Euclidean norm of a
#[inline]
pub fn norm3(a: &[f64; 3]) -> f64 {
    dot3(a, a).sqrt()
}

/// Returns the unit vector along a, or None if the norm is below `tiny`
#[inline]
pub fn unit3(a: &[f64; 3], tiny: f64) -> Option<[f64; 3]> {
    let n = norm3(a);
    if n <= tiny {
        None
    } else {
        Some(scale3(1.0 / n, a))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

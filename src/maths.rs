//! Small math helpers shared by worldgen sampling and raycasting.

/// Linear interpolation between `f0` and `f1` by `alpha`.
pub fn lerp(f0: f32, f1: f32, alpha: f32) -> f32 {
    f0 + alpha * (f1 - f0)
}

/// Bilinear interpolation across the four corners of a unit cell.
///
/// `f00` is the sample at (0,0), `f10` at (1,0), `f01` at (0,1) and `f11`
/// at (1,1); `ax` and `ay` are the fractional offsets inside the cell.
pub fn blerp(f00: f32, f01: f32, f10: f32, f11: f32, ax: f32, ay: f32) -> f32 {
    f00 * (1.0 - ax) * (1.0 - ay)
        + f10 * ax * (1.0 - ay)
        + f01 * (1.0 - ax) * ay
        + f11 * ax * ay
}

/// Euclidean remainder: the result is always in `[0, m)`, even for negative
/// `a`. Used wherever a block coordinate has to be wrapped into chunk-local
/// space or onto a coarse noise grid.
pub fn posmod(a: i32, m: i32) -> i32 {
    a.rem_euclid(m)
}

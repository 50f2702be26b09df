use nalgebra::Vector3;

use crate::TripletGeometry;

/// Divisor used instead of an exactly-zero cross-product norm.
pub const ZERO_NORM_FALLBACK: f32 = 0.01;

/// Lower bound on the norm product in [`cosine_similarity`].
pub const COSINE_SIMILARITY_EPS: f32 = 1e-8;

/// Normal of the plane through a triplet: `(p2-p1) x (p3-p1)` scaled to unit
/// length.
///
/// A zero cross product is divided by [`ZERO_NORM_FALLBACK`] instead, which
/// keeps the result finite (and zero) rather than unit length.
#[inline]
pub fn triplet_normal(geom: &TripletGeometry) -> Vector3<f32> {
    let normal = geom.edges[0].cross(&geom.edges[1]);
    let norm = normal.norm();
    let norm = if norm == 0.0 {
        norm + ZERO_NORM_FALLBACK
    } else {
        norm
    };
    normal / norm
}

/// `a·b / max(|a||b|, eps)`.
#[inline]
pub fn cosine_similarity(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    let denom = (a.norm() * b.norm()).max(COSINE_SIMILARITY_EPS);
    a.dot(b) / denom
}

/// `1 - |cos|` between an estimated and a target normal.
#[inline]
pub fn orientation_loss(estimated: &Vector3<f32>, target: &Vector3<f32>) -> f32 {
    1.0 - cosine_similarity(estimated, target).abs()
}

/// Sum of absolute per-axis differences between two normals.
#[inline]
pub fn normal_l1_distance(a: &Vector3<f32>, b: &Vector3<f32>) -> f32 {
    (a - b).abs().sum()
}

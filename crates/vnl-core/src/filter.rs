//! Rejection of ill-conditioned point triplets.
//!
//! A triplet survives when all three points have valid depth, its edges are
//! not near-parallel, and its points are not nearly coincident along every
//! axis at once.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{PointCloud, TripletIndexSet};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Added to the edge-length product when building the cosine matrix.
pub const COSINE_MATRIX_EPS: f32 = 1e-8;

/// Thresholds for [`filter_triplets`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripletFilterParams {
    /// Edge pairs with `|cos| > delta_cos` count as parallel.
    pub delta_cos: f32,
    /// Per-axis (x, y, z) proximity thresholds.
    pub delta_diff: [f32; 3],
    /// Points need `z > delta_z` to count as measured.
    pub delta_z: f32,
}

impl Default for TripletFilterParams {
    fn default() -> Self {
        Self {
            delta_cos: 0.985,
            delta_diff: [0.005; 3],
            delta_z: 1e-4,
        }
    }
}

impl TripletFilterParams {
    /// Same thresholds with one proximity value on every axis.
    pub fn with_uniform_diff(self, delta_diff: f32) -> Self {
        Self {
            delta_diff: [delta_diff; 3],
            ..self
        }
    }
}

/// The three points of a triplet and its edges `p2-p1`, `p3-p1`, `p3-p2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TripletGeometry {
    pub points: [Vector3<f32>; 3],
    pub edges: [Vector3<f32>; 3],
}

impl TripletGeometry {
    pub fn new(p1: Vector3<f32>, p2: Vector3<f32>, p3: Vector3<f32>) -> Self {
        Self {
            points: [p1, p2, p3],
            edges: [p2 - p1, p3 - p1, p3 - p2],
        }
    }

    /// Pairwise cosine matrix of the three edges, row-major.
    pub fn edge_cosines(&self) -> [f32; 9] {
        let norms = self.edges.map(|e| e.norm());
        let mut out = [0.0; 9];
        for i in 0..3 {
            for j in 0..3 {
                let dot = self.edges[i].dot(&self.edges[j]);
                out[i * 3 + j] = dot / (norms[i] * norms[j] + COSINE_MATRIX_EPS);
            }
        }
        out
    }

    /// More than 3 of the 9 cosine entries beyond `±delta_cos`.
    ///
    /// The diagonal contributes up to 3, so one parallel edge pair (counted
    /// twice) is enough to flag the triplet.
    pub fn is_collinear(&self, delta_cos: f32) -> bool {
        let parallel = self
            .edge_cosines()
            .iter()
            .filter(|&&c| c > delta_cos || c < -delta_cos)
            .count();
        parallel > 3
    }

    pub fn has_valid_depth(&self, delta_z: f32) -> bool {
        self.points.iter().all(|p| p.z > delta_z)
    }

    /// Every axis has at least one edge component below its threshold.
    pub fn is_too_close(&self, delta_diff: &[f32; 3]) -> bool {
        (0..3).all(|axis| self.edges.iter().any(|e| e[axis].abs() < delta_diff[axis]))
    }
}

/// Reason a triplet was kept or dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripletVerdict {
    Valid,
    InvalidDepth,
    Collinear,
    TooClose,
}

/// Counts of filter outcomes over one region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStats {
    pub sampled: usize,
    pub valid: usize,
    pub invalid_depth: usize,
    pub collinear: usize,
    pub too_close: usize,
}

impl FilterStats {
    /// Add the counts of `other` into `self`.
    pub fn merge(&mut self, other: &FilterStats) {
        self.sampled += other.sampled;
        self.valid += other.valid;
        self.invalid_depth += other.invalid_depth;
        self.collinear += other.collinear;
        self.too_close += other.too_close;
    }

    fn record(&mut self, verdict: TripletVerdict) {
        self.sampled += 1;
        match verdict {
            TripletVerdict::Valid => self.valid += 1,
            TripletVerdict::InvalidDepth => self.invalid_depth += 1,
            TripletVerdict::Collinear => self.collinear += 1,
            TripletVerdict::TooClose => self.too_close += 1,
        }
    }
}

/// Classify one triplet. Depth is checked first, then collinearity.
pub fn classify_triplet(geom: &TripletGeometry, params: &TripletFilterParams) -> TripletVerdict {
    if !geom.has_valid_depth(params.delta_z) {
        TripletVerdict::InvalidDepth
    } else if geom.is_collinear(params.delta_cos) {
        TripletVerdict::Collinear
    } else if geom.is_too_close(&params.delta_diff) {
        TripletVerdict::TooClose
    } else {
        TripletVerdict::Valid
    }
}

/// Gather point triplets from `cloud`.
pub fn gather_triplets(set: &TripletIndexSet, cloud: &PointCloud) -> Vec<TripletGeometry> {
    set.iter()
        .map(|[a, b, c]| TripletGeometry::new(cloud.point(a), cloud.point(b), cloud.point(c)))
        .collect()
}

/// Filter output: validity per triplet plus the geometry it was computed on.
#[derive(Clone, Debug, Default)]
pub struct FilteredTriplets {
    pub mask: Vec<bool>,
    pub geometry: Vec<TripletGeometry>,
    pub stats: FilterStats,
}

impl FilteredTriplets {
    /// Geometry of the triplets that passed.
    pub fn valid(&self) -> impl Iterator<Item = &TripletGeometry> + '_ {
        self.geometry
            .iter()
            .zip(&self.mask)
            .filter_map(|(g, &ok)| ok.then_some(g))
    }

    pub fn valid_count(&self) -> usize {
        self.stats.valid
    }
}

/// Gather the triplets of `set` from `cloud` and classify each one.
///
/// Never fails; a region where nothing survives gets an all-false mask.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip_all, fields(triplets = set.len()))
)]
pub fn filter_triplets(
    set: &TripletIndexSet,
    cloud: &PointCloud,
    params: &TripletFilterParams,
) -> FilteredTriplets {
    let geometry = gather_triplets(set, cloud);
    let mut stats = FilterStats::default();
    let mask = geometry
        .iter()
        .map(|g| {
            let verdict = classify_triplet(g, params);
            stats.record(verdict);
            verdict == TripletVerdict::Valid
        })
        .collect();
    FilteredTriplets {
        mask,
        geometry,
        stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(x: f32, y: f32, z: f32) -> Vector3<f32> {
        Vector3::new(x, y, z)
    }

    fn params() -> TripletFilterParams {
        TripletFilterParams::default()
    }

    #[test]
    fn collinear_points_are_rejected() {
        let geom = TripletGeometry::new(v(0.0, 0.0, 0.0), v(1.0, 0.0, 0.0), v(2.0, 0.0, 0.0));
        for delta_cos in [0.5, 0.9, 0.985, 0.9999] {
            assert!(geom.is_collinear(delta_cos), "delta_cos = {delta_cos}");
        }
        // lifted off the z=0 plane so depth is valid
        let lifted = TripletGeometry::new(v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.0), v(2.0, 0.0, 1.0));
        assert_eq!(
            classify_triplet(&lifted, &params()),
            TripletVerdict::Collinear
        );
    }

    #[test]
    fn anti_parallel_edges_count_as_collinear() {
        let geom = TripletGeometry::new(v(1.0, 1.0, 2.0), v(0.0, 1.0, 2.0), v(2.0, 1.0, 2.0));
        assert!(geom.is_collinear(0.985));
    }

    #[test]
    fn tilted_right_triangle_is_valid() {
        let geom = TripletGeometry::new(v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.5), v(0.0, 1.0, 2.0));
        assert!(!geom.is_collinear(0.867));
        assert_eq!(classify_triplet(&geom, &params()), TripletVerdict::Valid);
    }

    #[test]
    fn shallow_depth_is_rejected() {
        let base = [v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.5), v(0.0, 1.0, 2.0)];
        for bad in [0.0, 1e-4, -3.0] {
            let mut pts = base;
            pts[1].z = bad;
            let geom = TripletGeometry::new(pts[0], pts[1], pts[2]);
            assert_eq!(
                classify_triplet(&geom, &params()),
                TripletVerdict::InvalidDepth,
                "z = {bad}"
            );
        }
    }

    #[test]
    fn near_coincident_points_are_rejected() {
        let geom = TripletGeometry::new(
            v(0.0, 0.0, 1.0),
            v(0.001, 0.3, 1.2),
            v(0.4, 0.002, 1.001),
        );
        assert!(!geom.is_collinear(0.985));
        assert!(geom.is_too_close(&[0.005; 3]));
        assert_eq!(classify_triplet(&geom, &params()), TripletVerdict::TooClose);
        // per-axis: a z threshold under every z-gap lets it through
        assert!(!geom.is_too_close(&[0.005, 0.005, 0.0005]));
    }

    #[test]
    fn constant_depth_triangle_is_too_close() {
        // every edge has a zero z-component, plus a zero x and y component
        let geom = TripletGeometry::new(v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.0), v(0.0, 1.0, 1.0));
        assert!(!geom.is_collinear(0.867));
        assert_eq!(classify_triplet(&geom, &params()), TripletVerdict::TooClose);
    }

    #[test]
    fn self_triplet_is_dropped() {
        let cloud = PointCloud::new(vec![v(0.0, 0.0, 1.0), v(1.0, 0.0, 1.0)]);
        let set = TripletIndexSet {
            p1: vec![0, 0],
            p2: vec![0, 1],
            p3: vec![0, 0],
        };
        let out = filter_triplets(&set, &cloud, &params());
        assert_eq!(out.mask, vec![false, false]);
        assert_eq!(out.valid_count(), 0);
        assert_eq!(out.stats.sampled, 2);
        assert_eq!(out.valid().count(), 0);
    }

    #[test]
    fn filter_keeps_geometry_aligned_with_mask() {
        let cloud = PointCloud::new(vec![
            v(0.0, 0.0, 1.0),
            v(1.0, 0.0, 1.5),
            v(0.0, 1.0, 2.0),
            v(2.0, 0.0, 2.0),
        ]);
        let set = TripletIndexSet {
            p1: vec![0, 0],
            p2: vec![1, 1],
            p3: vec![2, 3],
        };
        let out = filter_triplets(&set, &cloud, &params());
        assert_eq!(out.mask, vec![true, false]);
        assert_eq!(out.stats.collinear, 1);
        let kept: Vec<_> = out.valid().collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].edges[1], v(0.0, 1.0, 1.0));
    }
}

use nalgebra::Vector3;

use crate::{GeometryError, MaskView};

/// Depth substituted for exactly-zero `z` before predicted geometry is built.
pub const ZERO_DEPTH_CLAMP: f32 = 1e-4;

/// Back-projected points, one per source pixel (or per selected pixel).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Vector3<f32>>,
}

impl PointCloud {
    pub fn new(points: Vec<Vector3<f32>>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn points(&self) -> &[Vector3<f32>] {
        &self.points
    }

    #[inline]
    pub fn point(&self, idx: usize) -> Vector3<f32> {
        self.points[idx]
    }

    /// Keep points whose pixel is set in `mask`, preserving row-major order.
    pub fn select(&self, mask: &MaskView<'_>) -> Result<PointCloud, GeometryError> {
        if mask.data.len() != self.points.len() {
            return Err(GeometryError::BufferLength {
                expected: self.points.len(),
                got: mask.data.len(),
            });
        }
        let points = self
            .points
            .iter()
            .zip(mask.data)
            .filter_map(|(p, &keep)| keep.then_some(*p))
            .collect();
        Ok(PointCloud { points })
    }

    /// Copy of the cloud with every `z == 0` replaced by `eps`.
    pub fn with_clamped_depth(&self, eps: f32) -> PointCloud {
        let points = self
            .points
            .iter()
            .map(|p| {
                if p.z == 0.0 {
                    Vector3::new(p.x, p.y, eps)
                } else {
                    *p
                }
            })
            .collect();
        PointCloud { points }
    }
}

impl From<Vec<Vector3<f32>>> for PointCloud {
    fn from(points: Vec<Vector3<f32>>) -> Self {
        Self::new(points)
    }
}

//! Pinhole back-projection of depth maps.
//!
//! The principal point is fixed to the image center (`width / 2`,
//! `height / 2`, integer division) and baked into a [`CoordinateGrid`] once per
//! image size. Only the focal lengths vary per call.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{DepthMapView, GeometryError, ImageSize, PointCloud};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Focal lengths in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intrinsics {
    pub fx: f32,
    pub fy: f32,
}

impl Intrinsics {
    pub fn new(fx: f32, fy: f32) -> Self {
        Self { fx, fy }
    }

    /// Read `fx = K[0,0]` and `fy = K[1,1]` from a camera matrix.
    pub fn from_matrix(k: &Matrix3<f32>) -> Self {
        Self {
            fx: k[(0, 0)],
            fy: k[(1, 1)],
        }
    }
}

/// Per-pixel offsets from the principal point.
#[derive(Clone, Debug)]
pub struct CoordinateGrid {
    size: ImageSize,
    u_u0: Vec<f32>,
    v_v0: Vec<f32>,
}

impl CoordinateGrid {
    pub fn new(size: ImageSize) -> Self {
        let u0 = (size.width / 2) as f32;
        let v0 = (size.height / 2) as f32;
        let mut u_u0 = Vec::with_capacity(size.pixel_count());
        let mut v_v0 = Vec::with_capacity(size.pixel_count());
        for row in 0..size.height {
            for col in 0..size.width {
                u_u0.push(col as f32 - u0);
                v_v0.push(row as f32 - v0);
            }
        }
        Self {
            size,
            u_u0,
            v_v0,
        }
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Back-project every pixel of `depth`.
    ///
    /// `x` and `y` scale with `|d|` so that negative depth does not flip the
    /// lateral coordinates; `z` keeps the raw value.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip_all, fields(width = depth.width, height = depth.height))
    )]
    pub fn project(
        &self,
        depth: &DepthMapView<'_>,
        intrinsics: &Intrinsics,
    ) -> Result<PointCloud, GeometryError> {
        self.size.check(depth.size())?;
        if depth.data.len() != self.size.pixel_count() {
            return Err(GeometryError::BufferLength {
                expected: self.size.pixel_count(),
                got: depth.data.len(),
            });
        }

        let points = depth
            .data
            .iter()
            .zip(self.u_u0.iter().zip(&self.v_v0))
            .map(|(&d, (&du, &dv))| {
                let a = d.abs();
                Vector3::new(du * a / intrinsics.fx, dv * a / intrinsics.fy, d)
            })
            .collect();
        Ok(PointCloud::new(points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DepthMap;
    use approx::assert_relative_eq;

    #[test]
    fn grid_is_centered_with_integer_division() {
        let grid = CoordinateGrid::new(ImageSize::new(5, 4));
        let depth = DepthMap::filled(5, 4, 1.0);
        let cloud = grid
            .project(&depth.view(), &Intrinsics::new(1.0, 1.0))
            .expect("projection");
        // unit depth and focal: x, y are the offsets from (u0, v0) = (2, 2)
        let first = cloud.points()[0];
        let last = cloud.points()[19];
        assert_eq!((first.x, first.y), (-2.0, -2.0));
        assert_eq!((last.x, last.y), (2.0, 1.0));
    }

    #[test]
    fn from_matrix_reads_diagonal() {
        let k = Matrix3::new(
            500.0, 0.0, 320.0, //
            0.0, 400.0, 240.0, //
            0.0, 0.0, 1.0,
        );
        assert_eq!(Intrinsics::from_matrix(&k), Intrinsics::new(500.0, 400.0));
    }

    #[test]
    fn projection_uses_abs_depth_for_lateral_axes() {
        let grid = CoordinateGrid::new(ImageSize::new(4, 2));
        let depth = DepthMap::from_fn(4, 2, |x, _| if x == 3 { -2.0 } else { 2.0 });
        let cloud = grid
            .project(&depth.view(), &Intrinsics::new(2.0, 4.0))
            .expect("projection");
        assert_eq!(cloud.len(), 8);

        // row 1, col 3: du = 1, dv = 0, depth = -2
        let p = cloud.points()[7];
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 0.0);
        assert_relative_eq!(p.z, -2.0);

        // row 0, col 0: du = -2, dv = -1, depth = 2
        let q = cloud.points()[0];
        assert_relative_eq!(q.x, -2.0);
        assert_relative_eq!(q.y, -0.5);
        assert_relative_eq!(q.z, 2.0);
    }

    #[test]
    fn projection_rejects_wrong_size() {
        let grid = CoordinateGrid::new(ImageSize::new(4, 2));
        let depth = DepthMap::filled(2, 4, 1.0);
        let err = grid
            .project(&depth.view(), &Intrinsics::new(1.0, 1.0))
            .unwrap_err();
        assert!(matches!(err, GeometryError::SizeMismatch { .. }));
    }
}

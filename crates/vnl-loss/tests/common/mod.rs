#![allow(dead_code)]

use nalgebra::Vector3;
use vnl_core::{DepthMap, ImageSize, Intrinsics};

pub const SIZE: ImageSize = ImageSize {
    width: 32,
    height: 24,
};

pub fn intrinsics() -> Intrinsics {
    Intrinsics::new(40.0, 40.0)
}

pub fn plane_normal() -> Vector3<f32> {
    Vector3::new(0.2, -0.3, 1.0).normalize()
}

/// Depth of the plane `n·P = k` seen through the centered pinhole grid.
pub fn plane_depth(size: ImageSize, intr: Intrinsics, n: Vector3<f32>, k: f32) -> DepthMap {
    let u0 = (size.width / 2) as f32;
    let v0 = (size.height / 2) as f32;
    DepthMap::from_fn(size.width, size.height, |x, y| {
        let rx = (x as f32 - u0) / intr.fx;
        let ry = (y as f32 - v0) / intr.fy;
        k / (n.x * rx + n.y * ry + n.z)
    })
}

/// Smooth non-planar surface.
pub fn bumpy_depth(size: ImageSize) -> DepthMap {
    DepthMap::from_fn(size.width, size.height, |x, y| {
        let (fx, fy) = (x as f32 * 0.3, y as f32 * 0.4);
        2.5 + 0.3 * fx.sin() + 0.2 * fy.cos()
    })
}

//! Depth and mask loading from PNG files, plus on-disk sample descriptions.
//!
//! Depth PNGs are read as 16-bit grayscale and divided by a scale factor
//! (`1000.0` for millimetres). Any non-zero mask pixel marks plane membership.

use std::path::{Path, PathBuf};

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::core::{DepthMap, GeometryError, ImageSize, Intrinsics, MaskView, PlaneMask};
use crate::loss::{read_json, PlaneLossInput, VnlIoError};

/// Errors produced while loading samples from disk.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] VnlIoError),
    #[error("failed to read {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: ::image::ImageError,
    },
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error("depth scale must be positive and finite (got {0})")]
    InvalidScale(f32),
}

fn default_depth_scale() -> f32 {
    1000.0
}

/// Read a 16-bit depth PNG and divide every value by `scale`.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip(path)))]
pub fn load_depth_png(path: impl AsRef<Path>, scale: f32) -> Result<DepthMap, LoadError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(LoadError::InvalidScale(scale));
    }
    let path = path.as_ref();
    let img = ::image::open(path)
        .map_err(|source| LoadError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_luma16();
    let (width, height) = (img.width() as usize, img.height() as usize);
    let data = img.as_raw().iter().map(|&v| v as f32 / scale).collect();
    Ok(DepthMap::new(width, height, data)?)
}

/// Read a mask PNG; non-zero pixels belong to the plane.
pub fn load_mask_png(path: impl AsRef<Path>) -> Result<PlaneMask, LoadError> {
    let path = path.as_ref();
    let img = ::image::open(path)
        .map_err(|source| LoadError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .to_luma8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    let data = img.as_raw().iter().map(|&v| v != 0).collect();
    Ok(PlaneMask::new(width, height, data)?)
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn base_dir(spec_path: &Path) -> PathBuf {
    spec_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// One annotated plane: mask image and ground-truth normal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneSpec {
    pub mask: PathBuf,
    pub normal: [f32; 3],
}

/// JSON description of a plane-aware sample. Relative paths resolve against
/// the directory of the JSON file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneSampleSpec {
    pub pred_depth: PathBuf,
    pub gt_depth: PathBuf,
    #[serde(default = "default_depth_scale")]
    pub depth_scale: f32,
    #[serde(default)]
    pub planes: Vec<PlaneSpec>,
    /// Camera matrix, row-major.
    pub camera_matrix: [[f32; 3]; 3],
}

/// A plane-aware sample loaded into memory.
#[derive(Clone, Debug)]
pub struct PlaneSample {
    pub pred_depth: DepthMap,
    pub gt_depth: DepthMap,
    pub masks: Vec<PlaneMask>,
    pub normals: Vec<Vector3<f32>>,
    pub intrinsics: Intrinsics,
}

impl PlaneSampleSpec {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, VnlIoError> {
        read_json(path)
    }

    /// Load every image referenced by the spec stored at `spec_path`.
    pub fn load(&self, spec_path: &Path) -> Result<PlaneSample, LoadError> {
        let base = base_dir(spec_path);
        let pred_depth = load_depth_png(resolve(&base, &self.pred_depth), self.depth_scale)?;
        let gt_depth = load_depth_png(resolve(&base, &self.gt_depth), self.depth_scale)?;
        let masks = self
            .planes
            .iter()
            .map(|p| load_mask_png(resolve(&base, &p.mask)))
            .collect::<Result<Vec<_>, _>>()?;
        let normals = self
            .planes
            .iter()
            .map(|p| Vector3::new(p.normal[0], p.normal[1], p.normal[2]))
            .collect();
        let k = self.camera_matrix;
        let k = Matrix3::new(
            k[0][0], k[0][1], k[0][2], //
            k[1][0], k[1][1], k[1][2], //
            k[2][0], k[2][1], k[2][2],
        );
        Ok(PlaneSample {
            pred_depth,
            gt_depth,
            masks,
            normals,
            intrinsics: Intrinsics::from_matrix(&k),
        })
    }
}

impl PlaneSample {
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.pred_depth.width, self.pred_depth.height)
    }

    pub fn mask_views(&self) -> Vec<MaskView<'_>> {
        self.masks.iter().map(PlaneMask::view).collect()
    }

    /// Borrow the sample as loss input; `masks` comes from [`Self::mask_views`].
    pub fn input<'a>(&'a self, masks: &'a [MaskView<'a>]) -> PlaneLossInput<'a> {
        PlaneLossInput {
            pred_depth: self.pred_depth.view(),
            gt_depth: self.gt_depth.view(),
            masks,
            normals: &self.normals,
            intrinsics: self.intrinsics,
        }
    }
}

/// JSON description of a whole-image batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WholeImageSampleSpec {
    pub gt_depth: Vec<PathBuf>,
    pub pred_depth: Vec<PathBuf>,
    #[serde(default = "default_depth_scale")]
    pub depth_scale: f32,
    pub fx: f32,
    pub fy: f32,
}

/// A whole-image batch loaded into memory.
#[derive(Clone, Debug)]
pub struct WholeImageSample {
    pub gt_depth: Vec<DepthMap>,
    pub pred_depth: Vec<DepthMap>,
    pub intrinsics: Intrinsics,
}

impl WholeImageSampleSpec {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, VnlIoError> {
        read_json(path)
    }

    pub fn load(&self, spec_path: &Path) -> Result<WholeImageSample, LoadError> {
        let base = base_dir(spec_path);
        let load_all = |paths: &[PathBuf]| {
            paths
                .iter()
                .map(|p| load_depth_png(resolve(&base, p), self.depth_scale))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(WholeImageSample {
            gt_depth: load_all(&self.gt_depth)?,
            pred_depth: load_all(&self.pred_depth)?,
            intrinsics: Intrinsics::new(self.fx, self.fy),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{GrayImage, ImageBuffer, Luma};

    #[test]
    fn depth_png_is_scaled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("depth.png");
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(4, 3, |x, y| Luma([(1000 + 100 * x + 10 * y) as u16]));
        img.save(&path).expect("save");

        let depth = load_depth_png(&path, 1000.0).expect("load");
        assert_eq!((depth.width, depth.height), (4, 3));
        assert_eq!(depth.data[0], 1.0);
        assert_eq!(depth.data[2 * 4 + 3], 1.32);
    }

    #[test]
    fn zero_scale_is_rejected() {
        assert!(matches!(
            load_depth_png("unused.png", 0.0),
            Err(LoadError::InvalidScale(_))
        ));
    }

    #[test]
    fn mask_png_marks_nonzero_pixels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("mask.png");
        let img = GrayImage::from_fn(3, 2, |x, _| Luma([if x == 1 { 255 } else { 0 }]));
        img.save(&path).expect("save");

        let mask = load_mask_png(&path).expect("load");
        assert_eq!(mask.data, vec![false, true, false, false, true, false]);
    }

    #[test]
    fn missing_image_reports_path() {
        let err = load_mask_png("/nonexistent/mask.png").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/mask.png"));
    }

    #[test]
    fn relative_paths_resolve_against_spec_dir() {
        let base = Path::new("/data/scene");
        assert_eq!(
            resolve(base, Path::new("depth.png")),
            PathBuf::from("/data/scene/depth.png")
        );
        assert_eq!(
            resolve(base, Path::new("/abs/depth.png")),
            PathBuf::from("/abs/depth.png")
        );
    }
}

//! Plane-aware virtual-normal loss.
//!
//! Each ground-truth plane contributes the mean `1 - |cos|` between normals
//! of predicted triplets sampled inside its mask and the plane's normal. The
//! pixels outside every mask form one extra region, compared predicted
//! against ground-truth triplet normals.

use log::{debug, warn};
use nalgebra::Vector3;
use rand::Rng;
use serde::{Deserialize, Serialize};
use vnl_core::{
    filter_triplets, gather_triplets, nonplanar_mask, orientation_loss, sample_triplets,
    triplet_normal, CoordinateGrid, DepthMapView, Intrinsics, MaskView, PointCloud,
    ZERO_DEPTH_CLAMP,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::region::{reduce_region, Reduction, RegionLoss};
use crate::{PlaneLossParams, VnlLossError};

/// Inputs of one plane-aware loss evaluation.
#[derive(Clone, Copy, Debug)]
pub struct PlaneLossInput<'a> {
    pub pred_depth: DepthMapView<'a>,
    pub gt_depth: DepthMapView<'a>,
    /// One mask per ground-truth plane.
    pub masks: &'a [MaskView<'a>],
    /// Ground-truth unit normal of each plane, same order as `masks`.
    pub normals: &'a [Vector3<f32>],
    pub intrinsics: Intrinsics,
}

/// Breakdown of a plane-aware evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneLossReport {
    pub planes: Vec<RegionLoss>,
    /// Pixels covered by no plane mask.
    pub nonplanar_pixels: usize,
    /// `None` when there are no non-planar pixels or none of their triplets
    /// survived the filter.
    pub nonplanar: Option<RegionLoss>,
    pub loss: f32,
}

/// Plane-aware loss with a coordinate grid fixed at construction.
#[derive(Clone, Debug)]
pub struct PlaneVnlLoss {
    params: PlaneLossParams,
    grid: CoordinateGrid,
}

impl PlaneVnlLoss {
    pub fn new(params: PlaneLossParams) -> Self {
        let grid = CoordinateGrid::new(params.image_size);
        Self { params, grid }
    }

    #[inline]
    pub fn params(&self) -> &PlaneLossParams {
        &self.params
    }

    #[inline]
    pub fn grid(&self) -> &CoordinateGrid {
        &self.grid
    }

    /// Scalar loss; see [`PlaneVnlLoss::compute_report`].
    pub fn compute<R: Rng + ?Sized>(
        &self,
        input: &PlaneLossInput<'_>,
        hard_mining: bool,
        rng: &mut R,
    ) -> Result<f32, VnlLossError> {
        Ok(self.compute_report(input, hard_mining, rng)?.loss)
    }

    /// Evaluate the loss and keep per-region statistics.
    ///
    /// The result is `(sum of plane losses + non-planar loss) / (N + 1)`, or
    /// `sum / N` when the non-planar term is absent. A plane with no surviving
    /// triplet contributes NaN, and `N = 0` without a non-planar term divides
    /// by zero; neither is guarded.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip(self, input, rng), fields(planes = input.masks.len()))
    )]
    pub fn compute_report<R: Rng + ?Sized>(
        &self,
        input: &PlaneLossInput<'_>,
        hard_mining: bool,
        rng: &mut R,
    ) -> Result<PlaneLossReport, VnlLossError> {
        self.validate(input)?;

        let pred_cloud = self.grid.project(&input.pred_depth, &input.intrinsics)?;
        let num_planes = input.masks.len();
        if num_planes == 0 {
            warn!("plane-aware loss called with zero planes");
        }

        let mut planes = Vec::with_capacity(num_planes);
        let mut total = 0.0f32;
        for (i, (mask, normal)) in input.masks.iter().zip(input.normals).enumerate() {
            let segment = pred_cloud.select(mask)?;
            let region = self.plane_region(&segment, normal, hard_mining, rng)?;
            debug!(
                "plane {i}: {} px, {}/{} triplets valid, kept {}, loss {:.5}",
                segment.len(),
                region.stats.valid,
                region.stats.sampled,
                region.kept,
                region.loss
            );
            if region.stats.valid == 0 {
                warn!("plane {i}: no valid triplets");
            }
            total += region.loss;
            planes.push(region);
        }

        let rest = nonplanar_mask(self.grid.size(), input.masks)?;
        let nonplanar_pixels = rest.view().count();
        let nonplanar = if nonplanar_pixels > 0 {
            self.nonplanar_region(input, &pred_cloud, &rest.view(), hard_mining, rng)?
        } else {
            None
        };

        let loss = match &nonplanar {
            Some(region) => (total + region.loss) / (num_planes + 1) as f32,
            None => total / num_planes as f32,
        };

        Ok(PlaneLossReport {
            planes,
            nonplanar_pixels,
            nonplanar,
            loss,
        })
    }

    fn validate(&self, input: &PlaneLossInput<'_>) -> Result<(), VnlLossError> {
        if input.masks.len() != input.normals.len() {
            return Err(VnlLossError::PlaneCountMismatch {
                masks: input.masks.len(),
                normals: input.normals.len(),
            });
        }
        let size = self.grid.size();
        size.check(input.pred_depth.size())?;
        size.check(input.gt_depth.size())?;
        for mask in input.masks {
            size.check(mask.size())?;
        }
        Ok(())
    }

    fn plane_region<R: Rng + ?Sized>(
        &self,
        segment: &PointCloud,
        normal: &Vector3<f32>,
        hard_mining: bool,
        rng: &mut R,
    ) -> Result<RegionLoss, VnlLossError> {
        let set = sample_triplets(segment.len(), self.params.sample_ratio, rng)?;
        let filtered = filter_triplets(&set, segment, &self.params.planar);
        let losses = filtered
            .valid()
            .map(|g| orientation_loss(&triplet_normal(g), normal))
            .collect();
        Ok(reduce_region(
            losses,
            filtered.stats,
            hard_mining,
            Reduction::NanMean,
        ))
    }

    /// Predicted vs ground-truth normals over pixels outside every plane.
    ///
    /// Triplets are sampled once and filtered on the ground-truth cloud only;
    /// `None` if the filter keeps nothing.
    fn nonplanar_region<R: Rng + ?Sized>(
        &self,
        input: &PlaneLossInput<'_>,
        pred_cloud: &PointCloud,
        rest: &MaskView<'_>,
        hard_mining: bool,
        rng: &mut R,
    ) -> Result<Option<RegionLoss>, VnlLossError> {
        let gt_cloud = self.grid.project(&input.gt_depth, &input.intrinsics)?;
        let gt_rest = gt_cloud.select(rest)?;
        let set = sample_triplets(gt_rest.len(), self.params.sample_ratio, rng)?;
        let filtered = filter_triplets(&set, &gt_rest, &self.params.nonplanar);
        if filtered.valid_count() == 0 {
            debug!(
                "non-planar: {} px, none of {} triplets valid; term skipped",
                gt_rest.len(),
                filtered.stats.sampled
            );
            return Ok(None);
        }

        let pred_rest = pred_cloud
            .select(rest)?
            .with_clamped_depth(ZERO_DEPTH_CLAMP);
        let pred_geometry = gather_triplets(&set, &pred_rest);
        let losses = filtered
            .geometry
            .iter()
            .zip(&pred_geometry)
            .zip(&filtered.mask)
            .filter_map(|((gt, pred), &ok)| {
                ok.then(|| orientation_loss(&triplet_normal(pred), &triplet_normal(gt)))
            })
            .collect();
        let region = reduce_region(losses, filtered.stats, hard_mining, Reduction::NanMean);
        debug!(
            "non-planar: {} px, {}/{} triplets valid, kept {}, loss {:.5}",
            gt_rest.len(),
            region.stats.valid,
            region.stats.sampled,
            region.kept,
            region.loss
        );
        Ok(Some(region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use vnl_core::{DepthMap, ImageSize, PlaneMask};

    fn tilted_depth(size: ImageSize) -> DepthMap {
        DepthMap::from_fn(size.width, size.height, |x, y| {
            2.0 + 0.01 * x as f32 + 0.02 * y as f32
        })
    }

    #[test]
    fn mask_normal_count_mismatch_is_rejected() {
        let size = ImageSize::new(8, 8);
        let loss = PlaneVnlLoss::new(PlaneLossParams::new(size));
        let depth = tilted_depth(size);
        let mask = PlaneMask::from_fn(8, 8, |_, _| true);
        let masks = [mask.view()];
        let input = PlaneLossInput {
            pred_depth: depth.view(),
            gt_depth: depth.view(),
            masks: &masks,
            normals: &[],
            intrinsics: Intrinsics::new(10.0, 10.0),
        };
        let err = loss
            .compute(&input, true, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(
            err,
            VnlLossError::PlaneCountMismatch {
                masks: 1,
                normals: 0
            }
        ));
    }

    #[test]
    fn wrong_depth_size_is_rejected() {
        let loss = PlaneVnlLoss::new(PlaneLossParams::new(ImageSize::new(8, 8)));
        let depth = tilted_depth(ImageSize::new(8, 6));
        let input = PlaneLossInput {
            pred_depth: depth.view(),
            gt_depth: depth.view(),
            masks: &[],
            normals: &[],
            intrinsics: Intrinsics::new(10.0, 10.0),
        };
        let err = loss
            .compute(&input, true, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(matches!(err, VnlLossError::Geometry(_)));
    }

    #[test]
    fn oversampling_ratio_fails_the_call() {
        let size = ImageSize::new(8, 8);
        let mut params = PlaneLossParams::new(size);
        params.sample_ratio = 2.0;
        let loss = PlaneVnlLoss::new(params);
        let depth = tilted_depth(size);
        let mask = PlaneMask::from_fn(8, 8, |x, _| x < 4);
        let masks = [mask.view()];
        let normals = [Vector3::z()];
        let input = PlaneLossInput {
            pred_depth: depth.view(),
            gt_depth: depth.view(),
            masks: &masks,
            normals: &normals,
            intrinsics: Intrinsics::new(10.0, 10.0),
        };
        let err = loss
            .compute(&input, false, &mut StdRng::seed_from_u64(3))
            .unwrap_err();
        assert!(matches!(
            err,
            VnlLossError::Sample(vnl_core::SampleError::SampleCountExceedsPool {
                requested: 64,
                pool: 32
            })
        ));
    }
}

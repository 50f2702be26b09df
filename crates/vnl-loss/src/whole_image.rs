//! Whole-image virtual-normal loss, for data without plane annotations.

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use vnl_core::{
    filter_triplets, normal_l1_distance, sample_triplets, triplet_normal, CoordinateGrid,
    DepthMapView, FilterStats, Intrinsics, TripletGeometry, ZERO_DEPTH_CLAMP,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::region::{reduce_region, Reduction, RegionLoss};
use crate::{VnlLossError, VnlLossParams};

/// Breakdown of a whole-image evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WholeImageReport {
    pub batch: usize,
    /// Filter counts summed over the batch.
    pub region: RegionLoss,
    pub loss: f32,
}

/// Whole-image loss with a coordinate grid fixed at construction.
#[derive(Clone, Debug)]
pub struct VnlLoss {
    params: VnlLossParams,
    grid: CoordinateGrid,
}

impl VnlLoss {
    pub fn new(params: VnlLossParams) -> Self {
        let grid = CoordinateGrid::new(params.image_size);
        Self { params, grid }
    }

    #[inline]
    pub fn params(&self) -> &VnlLossParams {
        &self.params
    }

    pub fn compute<R: Rng + ?Sized>(
        &self,
        gt_depth: &[DepthMapView<'_>],
        pred_depth: &[DepthMapView<'_>],
        intrinsics: Intrinsics,
        hard_mining: bool,
        rng: &mut R,
    ) -> Result<f32, VnlLossError> {
        Ok(self
            .compute_report(gt_depth, pred_depth, intrinsics, hard_mining, rng)?
            .loss)
    }

    /// One triplet set over the full image is shared by every batch item.
    ///
    /// Validity comes from the ground-truth cloud alone and is reused for the
    /// prediction. Each surviving triplet costs `Σ |n_gt - n_pred|` over the
    /// three axes; the result is the plain mean after optional hard mining
    /// (NaN when nothing survives).
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(batch = gt_depth.len()))
    )]
    pub fn compute_report<R: Rng + ?Sized>(
        &self,
        gt_depth: &[DepthMapView<'_>],
        pred_depth: &[DepthMapView<'_>],
        intrinsics: Intrinsics,
        hard_mining: bool,
        rng: &mut R,
    ) -> Result<WholeImageReport, VnlLossError> {
        if gt_depth.len() != pred_depth.len() {
            return Err(VnlLossError::BatchMismatch {
                gt: gt_depth.len(),
                pred: pred_depth.len(),
            });
        }
        if gt_depth.is_empty() {
            return Err(VnlLossError::EmptyBatch);
        }

        let size = self.grid.size();
        let set = sample_triplets(size.pixel_count(), self.params.sample_ratio, rng)?;

        let mut stats = FilterStats::default();
        let mut losses = Vec::new();
        for (gt, pred) in gt_depth.iter().zip(pred_depth) {
            let gt_cloud = self.grid.project(gt, &intrinsics)?;
            let pred_cloud = self
                .grid
                .project(pred, &intrinsics)?
                .with_clamped_depth(ZERO_DEPTH_CLAMP);

            let filtered = filter_triplets(&set, &gt_cloud, &self.params.filter);
            stats.merge(&filtered.stats);
            for (([a, b, c], gt_geom), _) in set
                .iter()
                .zip(&filtered.geometry)
                .zip(&filtered.mask)
                .filter(|(_, ok)| **ok)
            {
                let pred_geom = TripletGeometry::new(
                    pred_cloud.point(a),
                    pred_cloud.point(b),
                    pred_cloud.point(c),
                );
                losses.push(normal_l1_distance(
                    &triplet_normal(gt_geom),
                    &triplet_normal(&pred_geom),
                ));
            }
        }

        let region = reduce_region(losses, stats, hard_mining, Reduction::Mean);
        debug!(
            "whole image: batch {}, {}/{} triplets valid, kept {}, loss {:.5}",
            gt_depth.len(),
            region.stats.valid,
            region.stats.sampled,
            region.kept,
            region.loss
        );
        Ok(WholeImageReport {
            batch: gt_depth.len(),
            loss: region.loss,
            region,
        })
    }
}

use serde::{Deserialize, Serialize};
use vnl_core::{hard_mine, mean, nan_mean, FilterStats};

/// Per-region outcome: filter counts, triplets left after mining, and loss.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionLoss {
    pub stats: FilterStats,
    pub kept: usize,
    /// NaN when no triplet survived (serialized as `null`).
    pub loss: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Reduction {
    /// NaN entries add nothing to the sum but still count.
    NanMean,
    Mean,
}

pub(crate) fn reduce_region(
    losses: Vec<f32>,
    stats: FilterStats,
    hard_mining: bool,
    reduction: Reduction,
) -> RegionLoss {
    let losses = if hard_mining {
        hard_mine(losses)
    } else {
        losses
    };
    let loss = match reduction {
        Reduction::NanMean => nan_mean(&losses),
        Reduction::Mean => mean(&losses),
    };
    RegionLoss {
        stats,
        kept: losses.len(),
        loss,
    }
}

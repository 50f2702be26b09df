use serde::{Deserialize, Serialize};
use vnl_core::{ImageSize, TripletFilterParams};

fn default_plane_sample_ratio() -> f64 {
    0.3
}

fn default_planar_filter() -> TripletFilterParams {
    TripletFilterParams {
        delta_cos: 0.985,
        delta_diff: [0.005; 3],
        delta_z: 1e-4,
    }
}

fn default_nonplanar_filter() -> TripletFilterParams {
    default_planar_filter().with_uniform_diff(0.1)
}

fn default_whole_image_sample_ratio() -> f64 {
    0.15
}

fn default_whole_image_filter() -> TripletFilterParams {
    TripletFilterParams {
        delta_cos: 0.867,
        delta_diff: [0.005; 3],
        delta_z: 1e-4,
    }
}

/// Configuration of [`PlaneVnlLoss`](crate::PlaneVnlLoss).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneLossParams {
    /// Size of every depth map and mask passed to the loss.
    pub image_size: ImageSize,
    /// Triplets drawn per region, as a fraction of the region's pixel count.
    #[serde(default = "default_plane_sample_ratio")]
    pub sample_ratio: f64,
    /// Filter applied to triplets inside each ground-truth plane.
    #[serde(default = "default_planar_filter")]
    pub planar: TripletFilterParams,
    /// Filter applied to the ground-truth cloud of the non-planar residual.
    ///
    /// Same as `planar` except for a looser proximity threshold (0.1).
    #[serde(default = "default_nonplanar_filter")]
    pub nonplanar: TripletFilterParams,
}

impl PlaneLossParams {
    /// Defaults for the given image size.
    pub fn new(image_size: ImageSize) -> Self {
        Self {
            image_size,
            sample_ratio: default_plane_sample_ratio(),
            planar: default_planar_filter(),
            nonplanar: default_nonplanar_filter(),
        }
    }
}

/// Configuration of [`VnlLoss`](crate::VnlLoss).
///
/// Sampling is sparser (0.15) and the collinearity threshold looser (0.867)
/// than in [`PlaneLossParams`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VnlLossParams {
    pub image_size: ImageSize,
    #[serde(default = "default_whole_image_sample_ratio")]
    pub sample_ratio: f64,
    #[serde(default = "default_whole_image_filter")]
    pub filter: TripletFilterParams,
}

impl VnlLossParams {
    pub fn new(image_size: ImageSize) -> Self {
        Self {
            image_size,
            sample_ratio: default_whole_image_sample_ratio(),
            filter: default_whole_image_filter(),
        }
    }
}

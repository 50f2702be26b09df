//! Geometric building blocks of the virtual-normal loss.
//!
//! This crate holds the data model and every stage of the triplet pipeline:
//!
//! 1. [`CoordinateGrid`] back-projects a [`DepthMapView`] into a [`PointCloud`].
//! 2. [`sample_triplets`] draws a [`TripletIndexSet`] from a caller-supplied RNG.
//! 3. [`filter_triplets`] rejects collinear, shallow and near-coincident triplets.
//! 4. [`triplet_normal`] turns surviving triplets into normals.
//! 5. [`hard_mine`] and [`nan_mean`] reduce per-triplet losses.
//!
//! Loss aggregation lives in `vnl-loss`.

mod camera;
mod depth;
mod error;
mod filter;
mod logger;
mod mining;
mod normal;
mod point_cloud;
mod triplet;

pub use camera::{CoordinateGrid, Intrinsics};
pub use depth::{nonplanar_mask, DepthMap, DepthMapView, ImageSize, MaskView, PlaneMask};
pub use error::{GeometryError, SampleError};
pub use filter::{
    classify_triplet, filter_triplets, gather_triplets, FilterStats, FilteredTriplets,
    TripletFilterParams, TripletGeometry, TripletVerdict, COSINE_MATRIX_EPS,
};
pub use mining::{hard_mine, mean, nan_mean};
pub use normal::{
    cosine_similarity, normal_l1_distance, orientation_loss, triplet_normal,
    COSINE_SIMILARITY_EPS, ZERO_NORM_FALLBACK,
};
pub use point_cloud::{PointCloud, ZERO_DEPTH_CLAMP};
pub use triplet::{sample_count, sample_triplets, TripletIndexSet};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_from_env, init_with_level, resolve_level, LOG_ENV};

use crate::ImageSize;

/// Shape errors raised while building point clouds and masks.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("map size mismatch (expected {}x{}, got {}x{})", expected.width, expected.height, got.width, got.height)]
    SizeMismatch { expected: ImageSize, got: ImageSize },
    #[error("buffer length mismatch (expected {expected}, got {got})")]
    BufferLength { expected: usize, got: usize },
}

/// Triplet sampling precondition failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SampleError {
    #[error("requested {requested} triplet samples from a pool of {pool} points")]
    SampleCountExceedsPool { requested: usize, pool: usize },
    #[error("sample ratio must be finite and non-negative (got {0})")]
    InvalidRatio(f64),
}

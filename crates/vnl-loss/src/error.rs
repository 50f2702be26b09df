use vnl_core::{GeometryError, SampleError};

/// Errors returned by the loss aggregators.
#[derive(thiserror::Error, Debug)]
pub enum VnlLossError {
    #[error("{masks} plane masks but {normals} plane normals")]
    PlaneCountMismatch { masks: usize, normals: usize },
    #[error("batch size mismatch (ground truth {gt}, prediction {pred})")]
    BatchMismatch { gt: usize, pred: usize },
    #[error("empty depth batch")]
    EmptyBatch,
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Sample(#[from] SampleError),
}

//! Virtual-normal losses for monocular depth training.
//!
//! Two variants share the triplet pipeline from `vnl-core`:
//! - [`PlaneVnlLoss`] compares predicted triplet normals against known plane
//!   normals inside each ground-truth plane mask, plus one point-cloud to
//!   point-cloud term for the pixels outside every mask;
//! - [`VnlLoss`] compares predicted and ground-truth triplet normals over the
//!   whole image.
//!
//! Randomness is always supplied by the caller, so a seeded RNG makes the
//! loss reproducible.
//!
//! ## Quickstart
//!
//! ```
//! use nalgebra::Vector3;
//! use rand::{rngs::StdRng, SeedableRng};
//! use vnl_core::{DepthMap, ImageSize, Intrinsics, PlaneMask};
//! use vnl_loss::{PlaneLossInput, PlaneLossParams, PlaneVnlLoss};
//!
//! let size = ImageSize::new(32, 24);
//! let depth = DepthMap::from_fn(32, 24, |x, y| 2.0 + 0.01 * x as f32 + 0.02 * y as f32);
//! let floor = PlaneMask::from_fn(32, 24, |_, y| y >= 12);
//! let masks = [floor.view()];
//! let normals = [Vector3::new(0.0, 1.0, 0.0)];
//!
//! let loss = PlaneVnlLoss::new(PlaneLossParams::new(size));
//! let input = PlaneLossInput {
//!     pred_depth: depth.view(),
//!     gt_depth: depth.view(),
//!     masks: &masks,
//!     normals: &normals,
//!     intrinsics: Intrinsics::new(30.0, 30.0),
//! };
//! let value = loss.compute(&input, true, &mut StdRng::seed_from_u64(0))?;
//! println!("loss = {value}");
//! # Ok::<(), vnl_loss::VnlLossError>(())
//! ```

mod error;
mod io;
mod params;
mod plane;
mod region;
mod whole_image;

pub use error::VnlLossError;
pub use io::{read_json, write_json, ConfiguredLoss, LossConfig, VnlIoError};
pub use params::{PlaneLossParams, VnlLossParams};
pub use plane::{PlaneLossInput, PlaneLossReport, PlaneVnlLoss};
pub use region::RegionLoss;
pub use whole_image::{VnlLoss, WholeImageReport};

//! Facade crate for the `vnl-*` workspace.
//!
//! This crate provides:
//! - re-exports of the geometric core (`vnl::core`) and the loss
//!   aggregators (`vnl::loss`);
//! - (feature `image`) loading of 16-bit depth PNGs, plane mask PNGs and JSON
//!   sample descriptions;
//! - (feature `cli`) the `vnl` command-line tool that evaluates either loss
//!   variant on samples stored on disk.
//!
//! ## Quickstart
//!
//! ```no_run
//! use rand::{rngs::StdRng, SeedableRng};
//! use std::path::Path;
//! use vnl::load::PlaneSampleSpec;
//! use vnl::loss::{PlaneLossParams, PlaneVnlLoss};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let spec_path = Path::new("sample.json");
//! let sample = PlaneSampleSpec::load_json(spec_path)?.load(spec_path)?;
//! let loss = PlaneVnlLoss::new(PlaneLossParams::new(sample.size()));
//! let masks = sample.mask_views();
//! let value = loss.compute(&sample.input(&masks), true, &mut StdRng::seed_from_u64(0))?;
//! println!("loss = {value}");
//! # Ok(())
//! # }
//! ```

pub use vnl_core as core;
pub use vnl_loss as loss;

pub use vnl_loss::{LossConfig, PlaneLossParams, PlaneVnlLoss, VnlLoss, VnlLossParams};

#[cfg(feature = "image")]
pub mod load;

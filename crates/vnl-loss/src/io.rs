//! JSON configuration and report helpers.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use vnl_core::ImageSize;

use crate::{PlaneLossParams, PlaneVnlLoss, VnlLoss, VnlLossParams};

#[derive(thiserror::Error, Debug)]
pub enum VnlIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Parameters of either loss variant, tagged by `"variant"`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum LossConfig {
    Plane(PlaneLossParams),
    WholeImage(VnlLossParams),
}

/// A constructed loss of the configured variant.
#[derive(Clone, Debug)]
pub enum ConfiguredLoss {
    Plane(PlaneVnlLoss),
    WholeImage(VnlLoss),
}

impl LossConfig {
    pub fn plane(image_size: ImageSize) -> Self {
        Self::Plane(PlaneLossParams::new(image_size))
    }

    pub fn whole_image(image_size: ImageSize) -> Self {
        Self::WholeImage(VnlLossParams::new(image_size))
    }

    pub fn image_size(&self) -> ImageSize {
        match self {
            Self::Plane(p) => p.image_size,
            Self::WholeImage(p) => p.image_size,
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, VnlIoError> {
        read_json(path)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), VnlIoError> {
        write_json(self, path)
    }

    pub fn build(&self) -> ConfiguredLoss {
        match self {
            Self::Plane(p) => ConfiguredLoss::Plane(PlaneVnlLoss::new(p.clone())),
            Self::WholeImage(p) => ConfiguredLoss::WholeImage(VnlLoss::new(p.clone())),
        }
    }
}

/// Read any JSON document from disk.
pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, VnlIoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write `value` to disk as pretty JSON.
pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), VnlIoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

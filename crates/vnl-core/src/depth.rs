use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Width and height of every map a loss instance is configured for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: usize,
    pub height: usize,
}

impl ImageSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }

    /// Fail with [`GeometryError::SizeMismatch`] unless `got` matches.
    pub fn check(&self, got: ImageSize) -> Result<(), GeometryError> {
        if *self != got {
            return Err(GeometryError::SizeMismatch {
                expected: *self,
                got,
            });
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DepthMapView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [f32], // row-major, len = w*h
}

impl DepthMapView<'_> {
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthMap {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

impl DepthMap {
    /// Wrap a row-major buffer, checking its length against the dimensions.
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self, GeometryError> {
        if data.len() != width * height {
            return Err(GeometryError::BufferLength {
                expected: width * height,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn filled(width: usize, height: usize, value: f32) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build a map by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> DepthMapView<'_> {
        DepthMapView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

/// Borrowed per-plane membership mask.
#[derive(Clone, Copy, Debug)]
pub struct MaskView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [bool], // row-major, len = w*h
}

impl MaskView<'_> {
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    pub fn count(&self) -> usize {
        self.data.iter().filter(|&&m| m).count()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaneMask {
    pub width: usize,
    pub height: usize,
    pub data: Vec<bool>,
}

impl PlaneMask {
    pub fn new(width: usize, height: usize, data: Vec<bool>) -> Result<Self, GeometryError> {
        if data.len() != width * height {
            return Err(GeometryError::BufferLength {
                expected: width * height,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn view(&self) -> MaskView<'_> {
        MaskView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}

/// Pixels covered by none of `masks`.
///
/// All masks must share `size`.
pub fn nonplanar_mask(size: ImageSize, masks: &[MaskView<'_>]) -> Result<PlaneMask, GeometryError> {
    let mut data = vec![true; size.pixel_count()];
    for mask in masks {
        size.check(mask.size())?;
        for (out, &covered) in data.iter_mut().zip(mask.data) {
            if covered {
                *out = false;
            }
        }
    }
    Ok(PlaneMask {
        width: size.width,
        height: size.height,
        data,
    })
}

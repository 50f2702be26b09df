//! Random triplet sampling over a point pool.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::SampleError;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Three equal-length index arrays; entry `i` of each forms triplet `i`.
///
/// Indices may repeat inside a triplet. Such triplets are degenerate and get
/// rejected by the filter, not here.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TripletIndexSet {
    pub p1: Vec<usize>,
    pub p2: Vec<usize>,
    pub p3: Vec<usize>,
}

impl TripletIndexSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.p1.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.p1.is_empty()
    }

    /// Index triple of triplet `i`.
    #[inline]
    pub fn triplet(&self, i: usize) -> [usize; 3] {
        [self.p1[i], self.p2[i], self.p3[i]]
    }

    pub fn iter(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        (0..self.len()).map(|i| self.triplet(i))
    }
}

/// Number of triplets drawn from a pool of `pool` points: `floor(pool * ratio)`.
pub fn sample_count(pool: usize, ratio: f64) -> Result<usize, SampleError> {
    if !ratio.is_finite() || ratio < 0.0 {
        return Err(SampleError::InvalidRatio(ratio));
    }
    let requested = (pool as f64 * ratio).floor() as usize;
    if requested > pool {
        return Err(SampleError::SampleCountExceedsPool { requested, pool });
    }
    Ok(requested)
}

/// Draw `floor(pool * ratio)` triplets uniformly with replacement.
///
/// Each of the three arrays is drawn independently and then shuffled. A
/// request larger than the pool is an error, never a truncation.
#[cfg_attr(feature = "tracing", instrument(level = "debug", skip(rng)))]
pub fn sample_triplets<R: Rng + ?Sized>(
    pool: usize,
    ratio: f64,
    rng: &mut R,
) -> Result<TripletIndexSet, SampleError> {
    let k = sample_count(pool, ratio)?;
    let p1 = draw_indices(k, pool, rng);
    let p2 = draw_indices(k, pool, rng);
    let p3 = draw_indices(k, pool, rng);
    Ok(TripletIndexSet { p1, p2, p3 })
}

fn draw_indices<R: Rng + ?Sized>(k: usize, pool: usize, rng: &mut R) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..k).map(|_| rng.random_range(0..pool)).collect();
    idx.shuffle(rng);
    idx
}

//! Hard-example mining and the reductions applied after it.

use std::cmp::Ordering;

/// Sort ascending (NaN last) and drop the easiest quarter of the losses.
///
/// Exactly `ceil(0.75 * n)` entries remain.
pub fn hard_mine(mut losses: Vec<f32>) -> Vec<f32> {
    losses.sort_by(nan_last);
    let drop = drop_count(losses.len());
    losses.split_off(drop)
}

/// `floor(n / 4)`, in integers so the count stays exact for any `n`.
#[inline]
fn drop_count(n: usize) -> usize {
    n / 4
}

fn nan_last(a: &f32, b: &f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}

/// Sum ignoring NaN, divided by the full count. Empty input gives NaN.
pub fn nan_mean(losses: &[f32]) -> f32 {
    let sum: f32 = losses.iter().filter(|l| !l.is_nan()).sum();
    sum / losses.len() as f32
}

/// Plain average. Empty input gives NaN.
pub fn mean(losses: &[f32]) -> f32 {
    losses.iter().sum::<f32>() / losses.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_ceil_three_quarters() {
        for n in 0..40usize {
            let losses: Vec<f32> = (0..n).map(|i| ((i * 7) % 11) as f32).collect();
            let kept = hard_mine(losses);
            assert_eq!(kept.len(), (3 * n).div_ceil(4), "n = {n}");
        }
    }

    #[test]
    fn drop_count_is_exact_past_f32_precision() {
        // 2^24 + 3: not representable as f32, 0.25 * n rounds up there.
        let n = 16_777_219usize;
        assert_eq!(drop_count(n), 4_194_304);
        assert_eq!(n - drop_count(n), (3 * n).div_ceil(4));
        assert_eq!(drop_count(usize::MAX), usize::MAX / 4);
    }

    #[test]
    fn drops_the_lowest_quartile() {
        let kept = hard_mine(vec![0.4, 0.1, 0.9, 0.3, 0.2, 0.8, 0.7, 0.5]);
        assert_eq!(kept, vec![0.3, 0.4, 0.5, 0.7, 0.8, 0.9]);
    }

    #[test]
    fn nan_sorts_last_and_survives() {
        let kept = hard_mine(vec![f32::NAN, 0.5, 0.1, 0.2]);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0], 0.2);
        assert_eq!(kept[1], 0.5);
        assert!(kept[2].is_nan());
    }

    #[test]
    fn nan_mean_counts_nan_in_divisor() {
        assert_eq!(nan_mean(&[1.0, f32::NAN, 2.0, f32::NAN]), 0.75);
        assert!(nan_mean(&[]).is_nan());
    }

    #[test]
    fn mean_propagates_nan() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
        assert!(mean(&[1.0, f32::NAN]).is_nan());
        assert!(mean(&[]).is_nan());
    }
}

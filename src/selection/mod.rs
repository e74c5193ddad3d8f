//! Exact k-smallest selection
//!
//! Quickselect with Hoare partitioning. Only the side of the partition that
//! holds rank `k - 1` is visited again, giving expected linear time.

use crate::error::{LlrError, Result};

/// Partition `keys` in place so that the `k` smallest keys occupy `keys[..k]`
/// (in arbitrary order) and return the original indices of those keys.
///
/// The pivot is the first element of the active range. Ties are resolved by
/// partition order.
pub fn least_indices(keys: &mut [f64], k: usize) -> Result<Vec<usize>> {
    let n = keys.len();
    if n == 0 {
        return Err(LlrError::InvalidArgument("cannot select from an empty key array".to_string()));
    }
    if k == 0 || k > n {
        return Err(LlrError::InvalidArgument(format!(
            "k must be in 1..={}, got {}",
            n, k
        )));
    }
    if let Some(pos) = keys.iter().position(|v| v.is_nan()) {
        return Err(LlrError::InvalidArgument(format!("key at position {} is NaN", pos)));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let target = k - 1;
    let (mut lo, mut hi) = (0usize, n - 1);

    while lo < hi {
        let split = hoare_partition(keys, &mut indices, lo, hi);
        if target <= split {
            hi = split;
        } else {
            lo = split + 1;
        }
    }

    indices.truncate(k);
    Ok(indices)
}

/// Partition `keys[lo..=hi]` around `keys[lo]`.
///
/// Returns `j` with `lo <= j < hi` such that every key in `lo..=j` is `<=` every
/// key in `j + 1..=hi`.
fn hoare_partition(keys: &mut [f64], indices: &mut [usize], lo: usize, hi: usize) -> usize {
    let pivot = keys[lo];
    let (mut i, mut j) = (lo, hi);
    loop {
        while keys[i] < pivot {
            i += 1;
        }
        while keys[j] > pivot {
            j -= 1;
        }
        if i >= j {
            return j;
        }
        keys.swap(i, j);
        indices.swap(i, j);
        i += 1;
        j -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_smallest() {
        let original = vec![5.0, 1.0, 4.0, 2.0, 3.0];
        let mut keys = original.clone();
        let mut idx = least_indices(&mut keys, 2).unwrap();
        idx.sort_unstable();
        assert_eq!(idx, vec![1, 3]);
        let mut window = keys[..2].to_vec();
        window.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(window, vec![1.0, 2.0]);
    }

    #[test]
    fn test_k_equals_n_returns_all() {
        let mut keys = vec![3.0, 1.0, 2.0];
        let mut idx = least_indices(&mut keys, 3).unwrap();
        idx.sort_unstable();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicates() {
        let mut keys = vec![2.0, 2.0, 1.0, 2.0, 1.0];
        let idx = least_indices(&mut keys, 3).unwrap();
        let mut selected: Vec<f64> = idx.iter().map(|&i| [2.0, 2.0, 1.0, 2.0, 1.0][i]).collect();
        selected.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(selected, vec![1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_invalid_arguments() {
        assert!(least_indices(&mut [], 1).is_err());
        assert!(least_indices(&mut [1.0, 2.0], 0).is_err());
        assert!(least_indices(&mut [1.0, 2.0], 3).is_err());
        assert!(least_indices(&mut [1.0, f64::NAN], 1).is_err());
    }
}

//! # Robust location and scale
//!
//! Median, median absolute deviation and the multivariate geometric median
//! used by the robust regression weights.

use std::cmp::Ordering;
use num_traits::Float;

mod weiszfeld;

pub use weiszfeld::{geometric_median, GeometricMedian};

/// Median of `values`; even-length inputs average the two middle elements.
///
/// Returns `None` for an empty slice. NaN values compare as equal and make the
/// result unspecified.
pub fn median<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }

    let mut buffer = values.to_vec();
    Some(median_inplace(&mut buffer))
}

/// Median absolute deviation, `median_i |v_i - median(v)|`, without any
/// consistency factor.
pub fn median_absolute_deviation<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }

    let mut buffer = values.to_vec();
    let center = median_inplace(&mut buffer);
    for val in buffer.iter_mut() {
        *val = (*val - center).abs();
    }
    Some(median_inplace(&mut buffer))
}

fn median_inplace<T: Float>(buffer: &mut [T]) -> T {
    let n = buffer.len();
    let mid = n / 2;
    buffer.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let upper = buffer[mid];

    if n % 2 == 1 {
        return upper;
    }

    let lower = buffer[..mid].iter().copied().fold(T::neg_infinity(), T::max);
    (lower + upper) / (T::one() + T::one())
}

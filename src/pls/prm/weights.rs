//! Residual and leverage weights for PRM.
//!
//! Both weights pass a robustly standardised distance through the Fair
//! function, so every weight lies in (0, 1].

use ndarray::{Array1, ArrayView1, ArrayView2};
use num_traits::Float;

use super::check_c;
use crate::statistics::{geometric_median, median, median_absolute_deviation};
use crate::utils::RowDistances;
use crate::PrmError;

/// Fair weight function, `1 / (1 + |z/c|)^2`. `c` must be non-zero.
pub(crate) fn fair<T: Float>(z: T, c: T) -> T {
    let base = T::one() + (z / c).abs();
    T::one() / (base * base)
}

/// Residual weights `Fair(r_i / MAD(r), c)`.
///
/// Without a fitted model the residuals are taken against `median(y)`;
/// otherwise against `scores · gamma`. Inside the PRM loop `y` is the
/// response of the current round, already scaled by `sqrt(Wr ∘ Wx)`.
pub fn residual_weights(
    y: ArrayView1<f64>,
    fitted: Option<(ArrayView2<f64>, ArrayView1<f64>)>,
    c: f64,
) -> Result<Array1<f64>, PrmError> {
    check_c(c)?;
    let n_samples = y.len();
    let values = y.to_vec();

    let fitted_values = match fitted {
        None => {
            let center = median(&values).ok_or_else(|| {
                PrmError::DimensionMismatch("Residual weights of an empty response".to_string())
            })?;
            Array1::from_elem(n_samples, center)
        }
        Some((scores, gamma)) => {
            if scores.nrows() != n_samples || scores.ncols() != gamma.len() {
                return Err(PrmError::DimensionMismatch(format!(
                    "Scores {:?} and {} response coefficients do not fit {} responses",
                    scores.dim(),
                    gamma.len(),
                    n_samples
                )));
            }
            scores.dot(&gamma)
        }
    };

    let residuals = &y - &fitted_values;
    let scale = median_absolute_deviation(&residuals.to_vec()).unwrap_or(0.0);
    let reference = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    if negligible(scale, reference) {
        return Err(PrmError::NumericalDegeneracy(format!(
            "Median absolute deviation of residuals is {scale:e}"
        )));
    }

    Ok(residuals.mapv(|r| fair(r / scale, c)))
}

/// Leverage weights `Fair(d_i / median(d), c)`, where `d_i` is the distance of
/// row `i` to the geometric median of the rows.
///
/// `max_iter` and `tol` drive the Weiszfeld iteration.
pub fn leverage_weights(
    points: ArrayView2<f64>,
    c: f64,
    max_iter: usize,
    tol: f64,
) -> Result<Array1<f64>, PrmError> {
    check_c(c)?;
    let center = geometric_median(points, max_iter, tol)?;
    let distances = points
        .row_distances(center.point.view())
        .map_err(|e| PrmError::DimensionMismatch(e.to_string()))?;

    let values = distances.to_vec();
    let scale = median(&values).unwrap_or(0.0);
    let reference = values.iter().fold(0.0_f64, |acc, d| acc.max(*d));
    if negligible(scale, reference) {
        return Err(PrmError::NumericalDegeneracy(format!(
            "Median distance to the geometric median is {scale:e}"
        )));
    }

    Ok(distances.mapv(|d| fair(d / scale, c)))
}

/// Elementwise product `Wr ∘ Wx`.
pub fn combined_weights(residual: &Array1<f64>, leverage: &Array1<f64>) -> Array1<f64> {
    residual * leverage
}

fn negligible(scale: f64, reference: f64) -> bool {
    !(scale > f64::EPSILON * reference.max(f64::MIN_POSITIVE))
}

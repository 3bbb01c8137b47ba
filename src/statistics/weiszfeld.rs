use log::trace;
use ndarray::{Array1, ArrayView2, Axis};

use crate::utils::RowDistances;
use crate::PrmError;

/// Distances below this are treated as coincident with the current guess.
const ZERO_DISTANCE: f64 = 1e-10;

/// Stand-in distance for coincident points, bounding their inverse weight at 10.
const COINCIDENT_DISTANCE: f64 = 0.1;

/// Result of Weiszfeld's algorithm.
#[derive(Debug, Clone)]
pub struct GeometricMedian {
    /// Point minimising the summed Euclidean distance to the rows.
    pub point: Array1<f64>,
    /// Number of Weiszfeld updates performed.
    pub iterations: usize,
    /// Whether the last update moved the guess by less than the tolerance.
    pub converged: bool,
}

/// Geometric median of the rows of `points` via Weiszfeld's algorithm.
///
/// Starts from the column means and performs at most `max_iter` updates,
/// stopping once the squared norm of an update falls below `tol`. Running out
/// of iterations is not an error; the last guess is returned with
/// `converged == false`.
pub fn geometric_median(
    points: ArrayView2<f64>,
    max_iter: usize,
    tol: f64,
) -> Result<GeometricMedian, PrmError> {
    let mut guess = points.mean_axis(Axis(0)).ok_or_else(|| {
        PrmError::DimensionMismatch("Geometric median of an empty point set".to_string())
    })?;

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iter {
        let inverse = points
            .row_distances(guess.view())
            .map_err(|e| PrmError::DimensionMismatch(e.to_string()))?
            .mapv(|d| {
                if d.abs() < ZERO_DISTANCE {
                    1.0 / COINCIDENT_DISTANCE
                } else {
                    1.0 / d
                }
            });

        let denominator = inverse.sum();
        if !denominator.is_finite() || denominator < f64::EPSILON {
            return Err(PrmError::NumericalDegeneracy(format!(
                "Weiszfeld denominator is {denominator:e} at iteration {}",
                iterations + 1
            )));
        }

        let next = points.t().dot(&inverse) / denominator;
        let change = (&next - &guess).mapv(|v| v * v).sum();
        guess = next;
        iterations += 1;
        trace!("Weiszfeld iteration {}: squared change {:.3e}", iterations, change);

        if change < tol {
            converged = true;
            break;
        }
    }

    Ok(GeometricMedian {
        point: guess,
        iterations,
        converged,
    })
}

use log::{debug, info, warn};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::weights::{combined_weights, leverage_weights, residual_weights};
use super::PrmConfig;
use crate::pls::{LatentFit, LatentVariableRegression};
use crate::utils::RowScale;
use crate::PrmError;

/// Selects one of the matrices exposed by a [`PrmFit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrmMatrix {
    /// Final regression coefficients `B` (p × 1).
    Coefficients,
    /// Residual weights `Wr` (n × 1).
    ResidualWeights,
    /// Leverage weights `Wx` (n × 1).
    LeverageWeights,
    /// Combined weights `Wr ∘ Wx` (n × 1).
    CombinedWeights,
    /// Projection weights `W` of the last engine fit (p × k).
    ProjectionWeights,
}

/// Parameters learned by a PRM fit.
///
/// `B` and `W` come verbatim from the last engine fit; the weights are the
/// ones recomputed after it.
#[derive(Debug, Clone)]
pub struct PrmFit {
    coefficients: Array1<f64>,
    projection: Array2<f64>,
    gamma: Array1<f64>,
    scores: Array2<f64>,
    residual_weights: Array1<f64>,
    leverage_weights: Array1<f64>,
    iterations: usize,
    converged: bool,
}

impl PrmFit {
    /// Scores `x · W`.
    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PrmError> {
        self.check_features(x)?;
        Ok(x.dot(&self.projection))
    }

    /// Predictions `x · B`.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, PrmError> {
        self.check_features(x)?;
        Ok(x.dot(&self.coefficients))
    }

    pub fn matrix(&self, which: PrmMatrix) -> Array2<f64> {
        match which {
            PrmMatrix::Coefficients => self.coefficients.clone().insert_axis(Axis(1)),
            PrmMatrix::ResidualWeights => self.residual_weights.clone().insert_axis(Axis(1)),
            PrmMatrix::LeverageWeights => self.leverage_weights.clone().insert_axis(Axis(1)),
            PrmMatrix::CombinedWeights => self.combined_weights().insert_axis(Axis(1)),
            PrmMatrix::ProjectionWeights => self.projection.clone(),
        }
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn projection_weights(&self) -> &Array2<f64> {
        &self.projection
    }

    /// Response coefficients of the last engine fit.
    pub fn gamma(&self) -> &Array1<f64> {
        &self.gamma
    }

    /// Training scores of the last round, rescaled to the unweighted samples.
    pub fn scores(&self) -> &Array2<f64> {
        &self.scores
    }

    pub fn residual_weights(&self) -> &Array1<f64> {
        &self.residual_weights
    }

    pub fn leverage_weights(&self) -> &Array1<f64> {
        &self.leverage_weights
    }

    pub fn combined_weights(&self) -> Array1<f64> {
        combined_weights(&self.residual_weights, &self.leverage_weights)
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    fn check_features(&self, x: ArrayView2<f64>) -> Result<(), PrmError> {
        if x.ncols() != self.projection.nrows() {
            return Err(PrmError::DimensionMismatch(format!(
                "Number of columns ({}) does not match number of fitted features ({})",
                x.ncols(),
                self.projection.nrows()
            )));
        }
        Ok(())
    }
}

/// Runs the PRM reweighting loop.
///
/// Each round weights the samples by `sqrt(Wr ∘ Wx)`, refits the engine from
/// scratch, rescales its scores back by `1 / sqrt(Wr ∘ Wx)` and recomputes both
/// weights from them: `Wr` from the round's weighted response against the
/// rescaled fit, `Wx` from the rescaled scores. The loop stops once the squared change of the response
/// coefficients drops below `tol` or after `max_iter` rounds.
pub(crate) fn estimate<L>(
    config: &PrmConfig,
    engine: &L,
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
) -> Result<PrmFit, PrmError>
where
    L: LatentVariableRegression + ?Sized,
{
    let (n_samples, n_features) = x.dim();
    let n_components = config.n_components();
    if n_samples == 0 || n_features == 0 {
        return Err(PrmError::DimensionMismatch(format!(
            "Predictor matrix is empty ({n_samples}x{n_features})"
        )));
    }
    if y.len() != n_samples {
        return Err(PrmError::DimensionMismatch(format!(
            "Number of responses ({}) does not match number of samples ({})",
            y.len(),
            n_samples
        )));
    }
    if n_samples < n_components {
        return Err(PrmError::DimensionMismatch(format!(
            "Cannot extract {n_components} components from {n_samples} samples"
        )));
    }

    let c = config.c();
    let tol = config.tol();
    let max_iter = config.max_iter();
    let x = x.to_owned();
    let y = y.to_owned();

    let mut wr = residual_weights(y.view(), None, c)?;
    let mut wx = leverage_weights(x.view(), c, max_iter, tol)?;
    let mut gamma = Array1::<f64>::zeros(n_components);
    let mut iteration = 0;

    let (latent, scores, converged) = loop {
        let root_weights = root_combined_weights(&wr, &wx)?;

        let x_weighted = x
            .scaled_rows(&root_weights)
            .map_err(|e| PrmError::DimensionMismatch(e.to_string()))?;
        let y_weighted = &y * &Array1::from(root_weights.clone());

        let latent = engine.fit(
            x_weighted.view(),
            y_weighted.view(),
            n_components,
            config.n_coefficients(),
        )?;
        if latent.n_features() != n_features || latent.n_components() != n_components {
            return Err(PrmError::DimensionMismatch(format!(
                "Engine returned {} components over {} features, expected {} over {}",
                latent.n_components(),
                latent.n_features(),
                n_components,
                n_features
            )));
        }
        let mut scores = latent.transform(x_weighted.view())?;
        let inverse: Vec<f64> = root_weights.iter().map(|w| 1.0 / w).collect();
        scores
            .scale_rows(&inverse)
            .map_err(|e| PrmError::DimensionMismatch(e.to_string()))?;

        let previous = std::mem::replace(&mut gamma, latent.y_loadings().clone());
        wr = residual_weights(y_weighted.view(), Some((scores.view(), gamma.view())), c)?;
        wx = leverage_weights(scores.view(), c, max_iter, tol)?;
        iteration += 1;

        let change = (&gamma - &previous).mapv(|v| v * v).sum();
        debug!("PRM iteration {}: squared gamma change {:.3e}", iteration, change);

        if change < tol {
            info!("PRM converged after {} iterations", iteration);
            break (latent, scores, true);
        }
        if iteration >= max_iter {
            warn!(
                "PRM stopped after {} iterations without converging (last change {:.3e})",
                iteration, change
            );
            break (latent, scores, false);
        }
    };

    finish(latent, gamma, scores, wr, wx, iteration, converged)
}

fn root_combined_weights(wr: &Array1<f64>, wx: &Array1<f64>) -> Result<Vec<f64>, PrmError> {
    combined_weights(wr, wx)
        .iter()
        .map(|&w| {
            if w > 0.0 && w.is_finite() {
                Ok(w.sqrt())
            } else {
                Err(PrmError::NumericalDegeneracy(format!(
                    "Combined sample weight {w:e} is not strictly positive"
                )))
            }
        })
        .collect()
}

fn finish(
    latent: LatentFit,
    gamma: Array1<f64>,
    scores: Array2<f64>,
    residual_weights: Array1<f64>,
    leverage_weights: Array1<f64>,
    iterations: usize,
    converged: bool,
) -> Result<PrmFit, PrmError> {
    let coefficients = latent.coefficients().clone();
    let projection = latent.weights().clone();
    if !coefficients.iter().chain(projection.iter()).all(|v| v.is_finite()) {
        return Err(PrmError::NumericalDegeneracy(
            "Regression coefficients are not finite".to_string(),
        ));
    }

    Ok(PrmFit {
        coefficients,
        projection,
        gamma,
        scores,
        residual_weights,
        leverage_weights,
        iterations,
        converged,
    })
}

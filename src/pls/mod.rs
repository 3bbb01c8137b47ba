//! # Partial Least Squares
//!
//! Latent-variable regression for a single response.
//!
//! ## Currently Available
//! - **SIMPLS** ([`Simpls`]): de Jong's SIMPLS, used directly or as the inner engine of PRM
//! - **PRM** ([`prm`]): Partial Robust M-regression, an outlier-robust reweighting of SIMPLS
//!
//! Engines plug into PRM through [`LatentVariableRegression`]. An engine fit is
//! a pure function of its inputs, so PRM can refit from scratch on every
//! reweighting round.

use anyhow::bail;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

pub mod prm;
mod simpls;

pub use simpls::Simpls;

/// A latent-variable regression routine for a single response.
pub trait LatentVariableRegression: Send + Sync {
    /// Fits `n_components` latent components of `x` against `y`.
    ///
    /// With `n_coefficients = Some(n)` and `0 < n < p`, each projection-weight
    /// column keeps only its `n` largest-magnitude entries; the rest are zeroed.
    /// `None` and `Some(0)` keep all entries.
    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        n_components: usize,
        n_coefficients: Option<usize>,
    ) -> anyhow::Result<LatentFit>;
}

/// Selects one of the matrices exposed by a [`LatentFit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatentMatrix {
    /// Response coefficients per component (k × 1), `Q` transposed.
    ResponseCoefficients,
    /// Regression coefficients on the predictors (p × 1), `B`.
    RegressionCoefficients,
    /// Projection weights (p × k), `W`.
    ProjectionWeights,
    /// Predictor loadings (p × k), `P`.
    XLoadings,
}

/// Matrices produced by one latent-variable regression fit.
#[derive(Debug, Clone)]
pub struct LatentFit {
    weights: Array2<f64>,
    x_loadings: Array2<f64>,
    y_loadings: Array1<f64>,
    coefficients: Array1<f64>,
}

impl LatentFit {
    pub fn new(
        weights: Array2<f64>,
        x_loadings: Array2<f64>,
        y_loadings: Array1<f64>,
        coefficients: Array1<f64>,
    ) -> anyhow::Result<Self> {
        let (n_features, n_components) = weights.dim();
        if x_loadings.dim() != (n_features, n_components) {
            bail!(
                "Loadings shape {:?} does not match weights shape {:?}",
                x_loadings.dim(),
                weights.dim()
            );
        }
        if y_loadings.len() != n_components || coefficients.len() != n_features {
            bail!(
                "Expected {} response coefficients and {} regression coefficients, got {} and {}",
                n_components,
                n_features,
                y_loadings.len(),
                coefficients.len()
            );
        }

        Ok(LatentFit {
            weights,
            x_loadings,
            y_loadings,
            coefficients,
        })
    }

    pub fn n_components(&self) -> usize {
        self.weights.ncols()
    }

    pub fn n_features(&self) -> usize {
        self.weights.nrows()
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn x_loadings(&self) -> &Array2<f64> {
        &self.x_loadings
    }

    /// The response coefficient per component (gamma).
    pub fn y_loadings(&self) -> &Array1<f64> {
        &self.y_loadings
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn matrix(&self, which: LatentMatrix) -> Array2<f64> {
        match which {
            LatentMatrix::ResponseCoefficients => self.y_loadings.clone().insert_axis(Axis(1)),
            LatentMatrix::RegressionCoefficients => self.coefficients.clone().insert_axis(Axis(1)),
            LatentMatrix::ProjectionWeights => self.weights.clone(),
            LatentMatrix::XLoadings => self.x_loadings.clone(),
        }
    }

    /// Scores `x · W`.
    pub fn transform(&self, x: ArrayView2<f64>) -> anyhow::Result<Array2<f64>> {
        self.check_features(x)?;
        Ok(x.dot(&self.weights))
    }

    /// Predictions `x · B`.
    pub fn predict(&self, x: ArrayView2<f64>) -> anyhow::Result<Array1<f64>> {
        self.check_features(x)?;
        Ok(x.dot(&self.coefficients))
    }

    fn check_features(&self, x: ArrayView2<f64>) -> anyhow::Result<()> {
        if x.ncols() != self.n_features() {
            bail!(
                "Number of columns ({}) does not match number of fitted features ({})",
                x.ncols(),
                self.n_features()
            );
        }
        Ok(())
    }
}

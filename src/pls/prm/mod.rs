//! # Partial Robust M-regression
//!
//! PRM (Serneels et al., 2005) makes PLS regression resistant to outliers in
//! both the response and the predictors. Every sample carries a residual weight
//! and a leverage weight, each obtained from the Fair function; the engine is
//! refit on the reweighted data until its response coefficients settle.
//!
//! ```rust,ignore
//! use single_pls::pls::prm::PrmBuilder;
//!
//! let mut prm = PrmBuilder::default().n_components(3).c(4.0).build()?;
//! prm.fit(x.view(), y.view())?;
//! let predictions = prm.predict(x_new.view())?;
//! ```

use std::sync::Arc;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::pls::{LatentVariableRegression, Simpls};
use crate::PrmError;

mod fit;
mod weights;

pub use fit::{PrmFit, PrmMatrix};
pub use weights::{combined_weights, leverage_weights, residual_weights};

const DEFAULT_C: f64 = 4.0;
const DEFAULT_TOL: f64 = 1e-6;
const DEFAULT_MAX_ITER: usize = 500;

/// Hyperparameters of a PRM model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrmConfig {
    c: f64,
    tol: f64,
    max_iter: usize,
    n_components: usize,
    n_coefficients: Option<usize>,
}

impl PrmConfig {
    /// Tuning constant of the Fair function.
    pub fn c(&self) -> f64 {
        self.c
    }

    /// Convergence tolerance on the squared change of the response coefficients.
    pub fn tol(&self) -> f64 {
        self.tol
    }

    pub fn max_iter(&self) -> usize {
        self.max_iter
    }

    pub fn n_components(&self) -> usize {
        self.n_components
    }

    /// Projection-weight entries kept per component; `None` keeps all.
    pub fn n_coefficients(&self) -> Option<usize> {
        self.n_coefficients
    }
}

fn check_c(c: f64) -> Result<(), PrmError> {
    if !c.is_finite() || c.abs() < 1e-10 {
        return Err(PrmError::Configuration(format!(
            "Parameter c must be finite and non-zero, got {c}"
        )));
    }
    Ok(())
}

fn check_tol(tol: f64) -> Result<(), PrmError> {
    if !tol.is_finite() || tol < 0.0 {
        return Err(PrmError::Configuration(format!(
            "Tolerance must be finite and non-negative, got {tol}"
        )));
    }
    Ok(())
}

fn check_max_iter(max_iter: usize) -> Result<(), PrmError> {
    if max_iter == 0 {
        return Err(PrmError::Configuration(
            "Maximum number of iterations must be positive".to_string(),
        ));
    }
    Ok(())
}

fn check_n_components(n_components: usize) -> Result<(), PrmError> {
    if n_components == 0 {
        return Err(PrmError::Configuration(
            "Number of components must be positive".to_string(),
        ));
    }
    Ok(())
}

pub struct PrmBuilder<L: LatentVariableRegression> {
    c: f64,
    tol: f64,
    max_iter: usize,
    n_components: Option<usize>,
    n_coefficients: Option<usize>,
    engine: Arc<L>,
}

impl<L: LatentVariableRegression> PrmBuilder<L> {
    pub fn new(engine: L) -> Self {
        PrmBuilder {
            c: DEFAULT_C,
            tol: DEFAULT_TOL,
            max_iter: DEFAULT_MAX_ITER,
            n_components: None,
            n_coefficients: None,
            engine: Arc::new(engine),
        }
    }

    pub fn c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn n_components(mut self, n_components: usize) -> Self {
        self.n_components = Some(n_components);
        self
    }

    pub fn n_coefficients(mut self, n_coefficients: Option<usize>) -> Self {
        self.n_coefficients = n_coefficients;
        self
    }

    pub fn build(self) -> Result<Prm<L>, PrmError> {
        let n_components = self.n_components.ok_or_else(|| {
            PrmError::Configuration("Number of components is required".to_string())
        })?;
        check_c(self.c)?;
        check_tol(self.tol)?;
        check_max_iter(self.max_iter)?;
        check_n_components(n_components)?;

        Ok(Prm {
            config: PrmConfig {
                c: self.c,
                tol: self.tol,
                max_iter: self.max_iter,
                n_components,
                n_coefficients: self.n_coefficients,
            },
            engine: self.engine,
            fitted: None,
        })
    }
}

impl Default for PrmBuilder<Simpls> {
    fn default() -> Self {
        Self::new(Simpls::new())
    }
}

/// A PRM model: validated hyperparameters, the engine, and the result of the
/// last successful fit.
///
/// Every setter validates its argument and, when accepted, discards the
/// fitted state.
pub struct Prm<L: LatentVariableRegression = Simpls> {
    config: PrmConfig,
    engine: Arc<L>,
    fitted: Option<PrmFit>,
}

impl<L: LatentVariableRegression> Prm<L> {
    pub fn config(&self) -> &PrmConfig {
        &self.config
    }

    pub fn engine(&self) -> &L {
        &self.engine
    }

    pub fn set_c(&mut self, c: f64) -> Result<(), PrmError> {
        check_c(c)?;
        self.config.c = c;
        self.reset();
        Ok(())
    }

    pub fn set_tol(&mut self, tol: f64) -> Result<(), PrmError> {
        check_tol(tol)?;
        self.config.tol = tol;
        self.reset();
        Ok(())
    }

    pub fn set_max_iter(&mut self, max_iter: usize) -> Result<(), PrmError> {
        check_max_iter(max_iter)?;
        self.config.max_iter = max_iter;
        self.reset();
        Ok(())
    }

    pub fn set_n_components(&mut self, n_components: usize) -> Result<(), PrmError> {
        check_n_components(n_components)?;
        self.config.n_components = n_components;
        self.reset();
        Ok(())
    }

    pub fn set_n_coefficients(&mut self, n_coefficients: Option<usize>) {
        self.config.n_coefficients = n_coefficients;
        self.reset();
    }

    fn reset(&mut self) {
        self.fitted = None;
    }

    /// Fits the model, replacing any previous fit. On error the model is left
    /// unfitted.
    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<&PrmFit, PrmError> {
        self.reset();
        let fitted = self.estimate(x, y)?;
        Ok(self.fitted.insert(fitted))
    }

    /// Runs the fit without touching the model's state.
    pub fn estimate(&self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<PrmFit, PrmError> {
        fit::estimate(&self.config, self.engine.as_ref(), x, y)
    }

    pub fn fitted(&self) -> Option<&PrmFit> {
        self.fitted.as_ref()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>, PrmError> {
        self.fitted.as_ref().ok_or(PrmError::NotFitted)?.transform(x)
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>, PrmError> {
        self.fitted.as_ref().ok_or(PrmError::NotFitted)?.predict(x)
    }

    pub fn matrix(&self, which: PrmMatrix) -> Result<Array2<f64>, PrmError> {
        Ok(self.fitted.as_ref().ok_or(PrmError::NotFitted)?.matrix(which))
    }

    /// PRM exposes no loadings matrix.
    pub fn has_loadings(&self) -> bool {
        false
    }
}

//! # SIMPLS
//!
//! de Jong's SIMPLS for a single response. Components are extracted from the
//! cross-product `X'y` and the predictor covariance `X'X`, deflating both
//! through an orthogonal projector rather than deflating `X` itself, so the
//! scores `T = X W` come out orthonormal.
//!
//! No centering or scaling is applied; callers pass the matrices they want
//! decomposed.

use std::cmp::Ordering;
use anyhow::bail;
use log::debug;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use super::{LatentFit, LatentVariableRegression};

const DEFAULT_RANK_TOLERANCE: f64 = 1e-12;

/// SIMPLS engine.
#[derive(Debug, Clone, Copy)]
pub struct Simpls {
    rank_tolerance: f64,
}

impl Simpls {
    pub fn new() -> Self {
        Simpls {
            rank_tolerance: DEFAULT_RANK_TOLERANCE,
        }
    }

    /// Relative threshold below which a component's score variance counts as
    /// zero and the fit fails as rank deficient.
    pub fn rank_tolerance(mut self, rank_tolerance: f64) -> Self {
        self.rank_tolerance = rank_tolerance;
        self
    }
}

impl Default for Simpls {
    fn default() -> Self {
        Self::new()
    }
}

impl LatentVariableRegression for Simpls {
    fn fit(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        n_components: usize,
        n_coefficients: Option<usize>,
    ) -> anyhow::Result<LatentFit> {
        let (n_samples, n_features) = x.dim();
        if y.len() != n_samples {
            bail!(
                "Number of responses ({}) does not match number of samples ({})",
                y.len(),
                n_samples
            );
        }
        if n_components == 0 {
            bail!("Number of components must be positive");
        }
        if n_components > n_samples.min(n_features) {
            bail!(
                "Cannot extract {} components from {} samples with {} features",
                n_components,
                n_samples,
                n_features
            );
        }

        let mut cross = x.t().dot(&y);
        let mut covariance = x.t().dot(&x);
        let mut projector = Array2::<f64>::eye(n_features);

        let total_variance = covariance.diag().sum();
        if !total_variance.is_finite() || total_variance <= 0.0 {
            bail!("Predictor matrix has no finite, non-zero variance");
        }

        let mut weights = Array2::zeros((n_features, n_components));
        let mut x_loadings = Array2::zeros((n_features, n_components));
        let mut y_loadings = Array1::zeros(n_components);

        for h in 0..n_components {
            // For a single response the dominant eigenvector of A'A is the scalar 1, so w = A.
            let w = cross.clone();
            let score_variance = w.dot(&covariance.dot(&w));
            if !(score_variance > self.rank_tolerance * total_variance * w.dot(&w)) {
                bail!(
                    "Predictor matrix is rank deficient: component {} has no remaining variance",
                    h + 1
                );
            }

            let w = w / score_variance.sqrt();
            let loading = covariance.dot(&w);
            y_loadings[h] = cross.dot(&w);
            weights.column_mut(h).assign(&w);
            x_loadings.column_mut(h).assign(&loading);

            if h + 1 < n_components {
                let mut v = projector.dot(&loading);
                let v_norm = v.dot(&v).sqrt();
                if !(v_norm > f64::EPSILON * loading.dot(&loading).sqrt()) {
                    bail!(
                        "Predictor matrix is rank deficient: loading {} lies in the span of earlier loadings",
                        h + 1
                    );
                }
                v /= v_norm;

                projector -= &outer(&v, &v);
                covariance -= &outer(&loading, &loading);
                cross = projector.dot(&cross);
            }
        }

        if let Some(keep) = n_coefficients.filter(|&n| n > 0 && n < n_features) {
            slim_columns(&mut weights, keep);
        }

        let coefficients = weights.dot(&y_loadings);
        debug!(
            "SIMPLS extracted {} components from {}x{} predictors",
            n_components, n_samples, n_features
        );

        LatentFit::new(weights, x_loadings, y_loadings, coefficients)
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    a.view()
        .insert_axis(Axis(1))
        .dot(&b.view().insert_axis(Axis(0)))
}

/// Keeps the `keep` largest-magnitude entries of every column, zeroing the rest.
fn slim_columns(weights: &mut Array2<f64>, keep: usize) {
    for mut column in weights.columns_mut() {
        let mut order: Vec<usize> = (0..column.len()).collect();
        order.sort_by(|&a, &b| {
            column[b]
                .abs()
                .partial_cmp(&column[a].abs())
                .unwrap_or(Ordering::Equal)
        });
        for &i in &order[keep..] {
            column[i] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pls::LatentMatrix;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn design() -> Array2<f64> {
        array![
            [1.0, 0.0, 2.0],
            [0.0, 1.0, 1.0],
            [3.0, 1.0, 0.0],
            [1.0, 2.0, 1.0],
            [2.0, 0.0, 1.0],
            [0.0, 3.0, 2.0]
        ]
    }

    #[test]
    fn test_full_rank_fit_recovers_least_squares() {
        let x = design();
        let b = array![1.0, -2.0, 0.5];
        let y = x.dot(&b);

        let fit = Simpls::new().fit(x.view(), y.view(), 3, None).unwrap();

        for (got, want) in fit.coefficients().iter().zip(b.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-8);
        }
        let predicted = fit.predict(x.view()).unwrap();
        for (got, want) in predicted.iter().zip(y.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_scores_are_orthonormal() {
        let x = design();
        let y = array![0.3, -1.0, 2.2, 0.7, 1.1, -0.4];

        let fit = Simpls::new().fit(x.view(), y.view(), 3, None).unwrap();
        let t = fit.transform(x.view()).unwrap();
        let gram = t.t().dot(&t);

        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(gram[[i, j]], expected, epsilon = 1e-8);
            }
        }

        // Response coefficients are the projections of y on the scores.
        let q = t.t().dot(&y);
        for (got, want) in fit.y_loadings().iter().zip(q.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-8);
        }
    }

    #[test]
    fn test_matrix_shapes() {
        let x = design();
        let y = array![0.3, -1.0, 2.2, 0.7, 1.1, -0.4];

        let fit = Simpls::new().fit(x.view(), y.view(), 2, None).unwrap();

        assert_eq!(fit.matrix(LatentMatrix::ResponseCoefficients).shape(), &[2, 1]);
        assert_eq!(fit.matrix(LatentMatrix::RegressionCoefficients).shape(), &[3, 1]);
        assert_eq!(fit.matrix(LatentMatrix::ProjectionWeights).shape(), &[3, 2]);
        assert_eq!(fit.matrix(LatentMatrix::XLoadings).shape(), &[3, 2]);
        assert_eq!(fit.transform(x.view()).unwrap().shape(), &[6, 2]);
    }

    #[test]
    fn test_slimmed_weights() {
        let x = array![
            [1.0, 0.5, 2.0, -1.0],
            [0.0, 1.0, 1.0, 0.5],
            [3.0, 1.0, 0.0, 2.0],
            [1.0, 2.0, 1.0, -0.5],
            [2.0, 0.0, 1.0, 1.0],
            [0.0, 3.0, 2.0, 0.0],
            [1.5, -1.0, 0.5, 1.0],
            [-1.0, 0.5, 1.0, 2.5]
        ];
        let y = array![1.0, 0.2, 3.1, 0.9, 2.0, 0.4, 1.7, -0.3];

        let slim = Simpls::new().fit(x.view(), y.view(), 2, Some(2)).unwrap();
        for column in slim.weights().columns() {
            assert!(column.iter().filter(|w| **w != 0.0).count() <= 2);
        }

        let full = Simpls::new().fit(x.view(), y.view(), 2, None).unwrap();
        let zero = Simpls::new().fit(x.view(), y.view(), 2, Some(0)).unwrap();
        assert_eq!(full.weights(), zero.weights());
        assert!(full.weights().iter().all(|w| *w != 0.0));
    }

    #[test]
    fn test_rank_deficient() {
        let x = array![[1.0, 1.0, 2.0], [2.0, 2.0, 0.0], [3.0, 3.0, 1.0], [0.0, 0.0, 4.0]];
        let y = array![1.0, 2.0, 0.5, -1.0];

        assert!(Simpls::new().fit(x.view(), y.view(), 3, None).is_err());
        assert!(Simpls::new().fit(x.view(), y.view(), 2, None).is_ok());
    }

    #[test]
    fn test_dimension_errors() {
        let x = design();

        assert!(Simpls::new().fit(x.view(), array![1.0, 2.0].view(), 2, None).is_err());
        assert!(Simpls::new().fit(x.view(), Array1::zeros(6).view(), 0, None).is_err());
        assert!(Simpls::new().fit(x.view(), Array1::ones(6).view(), 4, None).is_err());

        let fit = Simpls::new().fit(x.view(), Array1::ones(6).view(), 2, None).unwrap();
        assert!(fit.predict(Array2::zeros((2, 4)).view()).is_err());
        assert!(fit.transform(Array2::zeros((2, 2)).view()).is_err());
    }
}

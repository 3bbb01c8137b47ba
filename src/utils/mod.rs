use ndarray::{Array1, ArrayView1};
use num_traits::Float;

/// Row-wise scaling of a dense matrix, one factor per row.
pub trait RowScale<T: Float> {
    fn scale_rows(&mut self, factors: &[T]) -> anyhow::Result<()>;

    /// Returns a scaled copy, leaving `self` untouched.
    fn scaled_rows(&self, factors: &[T]) -> anyhow::Result<Self>
    where
        Self: Sized;
}

pub trait RowDistances<T: Float> {
    /// Euclidean distance from every row to `point`.
    fn row_distances(&self, point: ArrayView1<T>) -> anyhow::Result<Array1<T>>;
}

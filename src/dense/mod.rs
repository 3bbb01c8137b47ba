use anyhow::bail;
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Data, Ix2};
use num_traits::Float;
use crate::utils::{RowDistances, RowScale};

impl<T: Float> RowScale<T> for Array2<T> {
    fn scale_rows(&mut self, factors: &[T]) -> anyhow::Result<()> {
        if factors.len() != self.nrows() {
            bail!(
                "Length of factors ({}) does not match number of rows ({})",
                factors.len(),
                self.nrows()
            );
        }

        for (row, &factor) in self.rows_mut().into_iter().zip(factors) {
            for val in row {
                *val = *val * factor;
            }
        }
        Ok(())
    }

    fn scaled_rows(&self, factors: &[T]) -> anyhow::Result<Self> {
        let mut scaled = self.clone();
        scaled.scale_rows(factors)?;
        Ok(scaled)
    }
}

impl<T, S> RowDistances<T> for ArrayBase<S, Ix2>
where
    T: Float,
    S: Data<Elem = T>,
{
    fn row_distances(&self, point: ArrayView1<T>) -> anyhow::Result<Array1<T>> {
        if point.len() != self.ncols() {
            bail!(
                "Length of point ({}) does not match number of columns ({})",
                point.len(),
                self.ncols()
            );
        }

        Ok(self
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .zip(point.iter())
                    .fold(T::zero(), |acc, (&a, &b)| acc + (a - b) * (a - b))
                    .sqrt()
            })
            .collect())
    }
}

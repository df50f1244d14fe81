//! Matrix type for 2D numeric data (row-major storage).

use crate::error::{PreverError, Result};
use serde::{Deserialize, Serialize};

/// A 2D matrix of `f32` values (row-major storage).
///
/// # Examples
///
/// ```
/// use prever::primitives::Matrix;
///
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(m.shape(), (2, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Creates a new matrix from a flat vector of data.
    ///
    /// # Errors
    ///
    /// Returns an error if data length doesn't match rows * cols.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(PreverError::DimensionMismatch {
                expected: format!("{rows}x{cols} = {} values", rows * cols),
                actual: format!("{} values", data.len()),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Creates a matrix from equally-sized rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the rows have inconsistent lengths.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(PreverError::DimensionMismatch {
                    expected: format!("{n_cols} columns"),
                    actual: format!("{} columns", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: n_rows,
            cols: n_cols,
        })
    }

    /// Creates a matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// Gets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    /// Sets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row * self.cols + col] = value;
    }

    /// Returns a row as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `row_idx` is out of bounds.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> &[f32] {
        let start = row_idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Returns a new matrix containing the selected rows, in order.
    ///
    /// Used by the k-fold and subsampling paths to carve out training
    /// subsets without copying the whole set.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

#[cfg(test)]
#[path = "matrix_tests.rs"]
mod tests;

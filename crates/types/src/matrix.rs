//! Rectangular resource matrix
//!
//! Allocation and claim tables are P×R and must stay rectangular. The
//! matrix stores its cells in one flat vector, so ragged rows are
//! unrepresentable after construction; `from_rows` is the only way in and
//! rejects rows of unequal length.

use crate::Units;
use resguard_errors::AvoidanceError;
use serde::{Deserialize, Serialize};

/// A P×R table of resource units with enforced equal row length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>", into = "Vec<Vec<i64>>")]
pub struct Matrix {
    data: Vec<Units>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Build a matrix from row vectors, enforcing rectangular shape.
    ///
    /// The column count is taken from the first row; an empty row list
    /// yields a 0×0 matrix.
    ///
    /// # Errors
    ///
    /// Returns `AvoidanceError::ShapeMismatch` if any row's length differs
    /// from the first row's.
    pub fn from_rows(rows: Vec<Vec<Units>>) -> Result<Self, AvoidanceError> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        let row_count = rows.len();

        for row in rows {
            if row.len() != cols {
                return Err(AvoidanceError::ShapeMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            data.extend(row);
        }

        Ok(Self {
            data,
            rows: row_count,
            cols,
        })
    }

    /// Number of rows (processes).
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Number of columns (resource types).
    #[must_use]
    pub fn col_count(&self) -> usize {
        self.cols
    }

    /// Borrow one row as a slice.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    #[must_use]
    pub fn row(&self, row: usize) -> &[Units] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Read a single cell.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of range.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Units {
        assert!(col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Add `delta` componentwise into one row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range or `delta` has the wrong length.
    pub fn add_assign_row(&mut self, row: usize, delta: &[Units]) {
        assert_eq!(delta.len(), self.cols);
        let slot = &mut self.data[row * self.cols..(row + 1) * self.cols];
        for (cell, d) in slot.iter_mut().zip(delta) {
            *cell += d;
        }
    }

    /// Subtract `delta` componentwise from one row.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range or `delta` has the wrong length.
    pub fn sub_assign_row(&mut self, row: usize, delta: &[Units]) {
        assert_eq!(delta.len(), self.cols);
        let slot = &mut self.data[row * self.cols..(row + 1) * self.cols];
        for (cell, d) in slot.iter_mut().zip(delta) {
            *cell -= d;
        }
    }

    /// Per-column sums across all rows.
    #[must_use]
    pub fn column_sums(&self) -> Vec<Units> {
        let mut sums = vec![0; self.cols];
        for row in 0..self.rows {
            for (sum, cell) in sums.iter_mut().zip(self.row(row)) {
                *sum += cell;
            }
        }
        sums
    }

    /// Iterate over rows as slices.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[Units]> {
        (0..self.rows).map(|row| self.row(row))
    }

    /// Copy the matrix out as row vectors.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<Units>> {
        (0..self.rows).map(|r| self.row(r).to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<i64>>> for Matrix {
    type Error = AvoidanceError;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<i64>> {
    fn from(matrix: Matrix) -> Self {
        matrix.to_rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_construction() {
        let m = Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5, 6]]).unwrap();
        assert_eq!(m.row_count(), 2);
        assert_eq!(m.col_count(), 3);
        assert_eq!(m.row(1), &[4, 5, 6]);
        assert_eq!(m.get(0, 2), 3);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = Matrix::from_rows(vec![vec![1, 2, 3], vec![4, 5]]).unwrap_err();
        assert_eq!(
            err,
            AvoidanceError::ShapeMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn test_empty_matrix() {
        let m = Matrix::from_rows(vec![]).unwrap();
        assert_eq!(m.row_count(), 0);
        assert_eq!(m.col_count(), 0);
        assert!(m.column_sums().is_empty());
    }

    #[test]
    fn test_row_arithmetic() {
        let mut m = Matrix::from_rows(vec![vec![2, 0, 0], vec![3, 0, 2]]).unwrap();
        m.add_assign_row(0, &[1, 0, 2]);
        assert_eq!(m.row(0), &[3, 0, 2]);
        m.sub_assign_row(0, &[3, 0, 2]);
        assert_eq!(m.row(0), &[0, 0, 0]);
        // Other rows are untouched
        assert_eq!(m.row(1), &[3, 0, 2]);
    }

    #[test]
    fn test_column_sums() {
        let m = Matrix::from_rows(vec![vec![0, 1, 0], vec![2, 0, 0], vec![3, 0, 2]]).unwrap();
        assert_eq!(m.column_sums(), vec![5, 1, 2]);
    }
}

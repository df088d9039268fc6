//! Row-major observation matrices.
//!
//! Rows are instances, columns are random variables. A `NaN` cell marks a
//! missing observation: the variable is marginalized during inference.

use std::fmt;
use std::ops::Index;

use crate::error::{Result, SpnError};

/// An `N x D` matrix of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl DataMatrix {
    /// Create a matrix from row-major values.
    pub fn new(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self> {
        if rows * cols != values.len() {
            return Err(SpnError::shape(format!(
                "expected {} values for a {}x{} matrix, got {}",
                rows * cols,
                rows,
                cols,
                values.len()
            )));
        }
        Ok(Self { rows, cols, values })
    }

    /// Create a matrix from a list of equally long rows.
    pub fn from_rows<R>(rows: impl IntoIterator<Item = R>) -> Result<Self>
    where
        R: AsRef<[f64]>,
    {
        let mut values = Vec::new();
        let mut n = 0;
        let mut cols = None;
        for row in rows {
            let row = row.as_ref();
            match cols {
                None => cols = Some(row.len()),
                Some(c) if c != row.len() => {
                    return Err(SpnError::shape(format!(
                        "row {} has {} columns, expected {}",
                        n,
                        row.len(),
                        c
                    )));
                }
                _ => {}
            }
            values.extend_from_slice(row);
            n += 1;
        }
        Ok(Self {
            rows: n,
            cols: cols.unwrap_or(0),
            values,
        })
    }

    /// Create a single-column matrix.
    pub fn column(values: impl IntoIterator<Item = f64>) -> Self {
        let values: Vec<f64> = values.into_iter().collect();
        Self {
            rows: values.len(),
            cols: 1,
            values,
        }
    }

    /// Create a matrix filled with `NaN` (every variable missing).
    pub fn missing(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![f64::NAN; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.cols..(row + 1) * self.cols]
    }

    /// Iterate over the values of one column.
    pub fn column_iter(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows).map(move |r| self.get(r, col))
    }

    /// Fail unless `col` is a valid column of this matrix.
    pub fn check_column(&self, col: usize) -> Result<()> {
        if col >= self.cols {
            return Err(SpnError::shape(format!(
                "scope references column {} but data has {} columns",
                col, self.cols
            )));
        }
        Ok(())
    }

    pub fn is_missing(&self, row: usize, col: usize) -> bool {
        self.get(row, col).is_nan()
    }
}

impl Index<(usize, usize)> for DataMatrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.values[row * self.cols + col]
    }
}

impl fmt::Display for DataMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            writeln!(f, "{:?}", self.row(r))?;
        }
        Ok(())
    }
}

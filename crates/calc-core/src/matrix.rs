use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{invalid, CalcError, CalcResult};

/// Dense row-major matrix of `f64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from a list of rows. Rows must be non-empty and of equal length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> CalcResult<Self> {
        let cols = match rows.first() {
            Some(r) if !r.is_empty() => r.len(),
            _ => return Err(invalid("matrix must have at least one row and one column")),
        };
        if let Some(i) = rows.iter().position(|r| r.len() != cols) {
            return Err(invalid(format!(
                "row {} has {} columns, expected {cols}",
                i + 1,
                rows[i].len()
            )));
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data: rows.into_iter().flatten().collect(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.chunks(self.cols).map(|c| c.to_vec()).collect()
    }

    /// Classic row-by-column product. `self.cols` must equal `other.rows`.
    pub fn multiply(&self, other: &Matrix) -> CalcResult<Matrix> {
        if self.cols != other.rows {
            return Err(CalcError::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            for j in 0..other.cols {
                out.data[i * other.cols + j] =
                    (0..self.cols).map(|k| self.get(i, k) * other.get(k, j)).sum();
            }
        }
        Ok(out)
    }
}

impl TryFrom<Vec<Vec<f64>>> for Matrix {
    type Error = CalcError;

    fn try_from(rows: Vec<Vec<f64>>) -> CalcResult<Self> {
        Self::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<f64>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

/// Parses `"1,2;3,4"`. Rows are separated by `;` or newlines, cells by `,`.
impl std::str::FromStr for Matrix {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_cell = |cell: &str| {
            let cell = cell.trim();
            cell.parse::<f64>()
                .map_err(|_| CalcError::Parse(format!("invalid number: {cell:?}")))
        };
        let rows = s
            .split(|c: char| c == ';' || c == '\n')
            .map(str::trim)
            .filter(|row| !row.is_empty())
            .map(|row| row.split(',').map(parse_cell).collect::<CalcResult<Vec<f64>>>())
            .collect::<CalcResult<Vec<_>>>()?;
        Self::from_rows(rows)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.data.chunks(self.cols).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let cells: Vec<String> = match f.precision() {
                Some(p) => row.iter().map(|v| format!("{v:.p$}")).collect(),
                None => row.iter().map(|v| v.to_string()).collect(),
            };
            write!(f, "[{}]", cells.join(", "))?;
        }
        Ok(())
    }
}

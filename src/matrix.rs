//! Dense row-major 2D array.
//!
//! Every operation that produces a matrix returns a new owned value. Only
//! [`Matrix::set`], [`Matrix::scalar_arithmetic`], [`Matrix::apply_column`],
//! [`Matrix::apply_all`] and [`Matrix::add_row_broadcast`] mutate in place.
//! Borrowed access to the backing buffer is available only through the
//! explicitly named [`Matrix::as_slice`] and [`Matrix::row_view`].

use std::ops::Range;

use crate::matmul::gemm_f64;
use crate::vector::std_of;
use crate::{ArithOp, Error, Result, Vector};

/// Pivot magnitudes below this abort inversion with [`Error::Singular`].
pub const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Direction of a row/column reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Reduce across one row (`idx` is a row index).
    Row,
    /// Reduce down one column (`idx` is a column index).
    Col,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Row-major, `rows * cols` values.
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-initialized `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; len],
        })
    }

    /// Wrap a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        if data.len() != len {
            return Err(Error::DimensionMismatch(format!(
                "buffer length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from per-row vectors (copied into contiguous storage).
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let len = checked_len(rows.len(), cols)?;

        let mut data = Vec::with_capacity(len);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::DimensionMismatch(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::new(n, n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    /// `(dim, 1)` column matrix holding a copy of `x`.
    pub fn from_column(x: &Vector) -> Self {
        Self {
            rows: x.dim(),
            cols: 1,
            data: x.as_slice().to_vec(),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Borrow the row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Borrowed (non-copying) view of row `i`.
    pub fn row_view(&self, i: usize) -> Result<&[f64]> {
        self.check_row(i)?;
        Ok(self.row_unchecked(i))
    }

    #[inline]
    pub(crate) fn row_unchecked(&self, i: usize) -> &[f64] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }

    pub fn get(&self, i: usize, j: usize) -> Result<f64> {
        self.check_index(i, j)?;
        Ok(self.data[i * self.cols + j])
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        self.check_index(i, j)?;
        self.data[i * self.cols + j] = value;
        Ok(())
    }

    /// Copy of row `i`.
    pub fn row(&self, i: usize) -> Result<Vector> {
        Vector::from_slice(self.row_view(i)?)
    }

    /// Copy of column `j`.
    pub fn column(&self, j: usize) -> Result<Vector> {
        Ok(Vector::from_nonempty(self.lane(Axis::Col, j)?.collect()))
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for i in 0..self.rows {
            for j in 0..self.cols {
                data[j * self.rows + i] = self.data[i * self.cols + j];
            }
        }
        Matrix {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Matrix product `self * other`.
    pub fn matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Matrix::new(self.rows, other.cols)?;
        gemm_f64(
            self.rows,
            other.cols,
            self.cols,
            &self.data,
            self.cols,
            1,
            &other.data,
            other.cols,
            1,
            &mut out.data,
        );
        Ok(out)
    }

    /// `transpose(self) * other` without materializing the transpose.
    pub fn t_matmul(&self, other: &Matrix) -> Result<Matrix> {
        if self.rows != other.rows {
            return Err(Error::DimensionMismatch(format!(
                "cannot multiply ({}x{})^T by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Matrix::new(self.cols, other.cols)?;
        gemm_f64(
            self.cols,
            other.cols,
            self.rows,
            &self.data,
            1,
            self.cols,
            &other.data,
            other.cols,
            1,
            &mut out.data,
        );
        Ok(out)
    }

    /// `self * transpose(other)` without materializing the transpose.
    pub fn matmul_t(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.cols {
            return Err(Error::DimensionMismatch(format!(
                "cannot multiply {}x{} by ({}x{})^T",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        let mut out = Matrix::new(self.rows, other.rows)?;
        gemm_f64(
            self.rows,
            other.rows,
            self.cols,
            &self.data,
            self.cols,
            1,
            &other.data,
            1,
            other.cols,
            &mut out.data,
        );
        Ok(out)
    }

    /// Gauss-Jordan inversion with partial pivoting.
    ///
    /// Fails with [`Error::Singular`] as soon as the largest available pivot in
    /// a column is below [`SINGULAR_TOLERANCE`]; no partial result is returned.
    pub fn inverse(&self) -> Result<Matrix> {
        if self.rows != self.cols {
            return Err(Error::NotSquare {
                rows: self.rows,
                cols: self.cols,
            });
        }

        let n = self.rows;
        let mut work = self.data.clone();
        let mut inv = Matrix::identity(n)?;

        for col in 0..n {
            let mut pivot_row = col;
            let mut pivot_abs = work[col * n + col].abs();
            for r in col + 1..n {
                let candidate = work[r * n + col].abs();
                if candidate > pivot_abs {
                    pivot_abs = candidate;
                    pivot_row = r;
                }
            }
            // Written negated so a NaN pivot is treated as singular too.
            if !(pivot_abs >= SINGULAR_TOLERANCE) {
                return Err(Error::Singular {
                    column: col,
                    pivot: pivot_abs,
                });
            }

            if pivot_row != col {
                swap_rows(&mut work, n, col, pivot_row);
                swap_rows(&mut inv.data, n, col, pivot_row);
            }

            let pivot = work[col * n + col];
            for j in 0..n {
                work[col * n + j] /= pivot;
                inv.data[col * n + j] /= pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work[r * n + col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    let w = work[col * n + j];
                    work[r * n + j] -= factor * w;
                    let v = inv.data[col * n + j];
                    inv.data[r * n + j] -= factor * v;
                }
            }
        }

        Ok(inv)
    }

    /// Element-wise `self op other` into a new matrix.
    ///
    /// Division by an exact zero element writes `0.0` there and warns.
    pub fn arithmetic(&self, other: &Matrix, op: ArithOp) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(Error::DimensionMismatch(format!(
                "element-wise {op} of {}x{} and {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let mut data = Vec::with_capacity(self.data.len());
        for (idx, (&a, &b)) in self.data.iter().zip(&other.data).enumerate() {
            let (v, div_by_zero) = op.apply(a, b);
            if div_by_zero {
                tracing::warn!(
                    row = idx / self.cols,
                    col = idx % self.cols,
                    "division by zero in matrix arithmetic, set to 0"
                );
            }
            data.push(v);
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data,
        })
    }

    /// In-place `self[i][j] = self[i][j] op scalar`.
    ///
    /// Dividing by exactly zero zeroes every element and warns once.
    pub fn scalar_arithmetic(&mut self, scalar: f64, op: ArithOp) {
        if op == ArithOp::Div && scalar == 0.0 {
            tracing::warn!(
                rows = self.rows,
                cols = self.cols,
                "division of matrix by zero scalar, set to 0"
            );
            self.data.fill(0.0);
            return;
        }
        for v in &mut self.data {
            *v = op.apply(*v, scalar).0;
        }
    }

    /// Copy of the sub-matrix `rows x cols` (half-open ranges).
    pub fn slice(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Matrix> {
        check_range(&rows, self.rows, "row")?;
        check_range(&cols, self.cols, "column")?;

        let mut data = Vec::with_capacity(rows.len() * cols.len());
        for i in rows.clone() {
            data.extend_from_slice(&self.row_unchecked(i)[cols.clone()]);
        }
        Ok(Matrix {
            rows: rows.len(),
            cols: cols.len(),
            data,
        })
    }

    pub fn slice_rows(&self, rows: Range<usize>) -> Result<Matrix> {
        self.slice(rows, 0..self.cols)
    }

    pub fn slice_cols(&self, cols: Range<usize>) -> Result<Matrix> {
        self.slice(0..self.rows, cols)
    }

    /// Copy the listed rows, in order, into a new matrix.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Matrix> {
        if indices.is_empty() {
            return Err(Error::InvalidDimension(
                "row selection must not be empty".to_owned(),
            ));
        }
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            self.check_row(i)?;
            data.extend_from_slice(self.row_unchecked(i));
        }
        Ok(Matrix {
            rows: indices.len(),
            cols: self.cols,
            data,
        })
    }

    /// Column-wise concatenation `[self | other]`.
    pub fn concat(&self, other: &Matrix) -> Result<Matrix> {
        if self.rows != other.rows {
            return Err(Error::DimensionMismatch(format!(
                "cannot concat {} rows with {} rows",
                self.rows, other.rows
            )));
        }
        let cols = self.cols + other.cols;
        let mut data = Vec::with_capacity(self.rows * cols);
        for i in 0..self.rows {
            data.extend_from_slice(self.row_unchecked(i));
            data.extend_from_slice(other.row_unchecked(i));
        }
        Ok(Matrix {
            rows: self.rows,
            cols,
            data,
        })
    }

    /// Add `bias` to every row in place.
    pub fn add_row_broadcast(&mut self, bias: &Vector) -> Result<()> {
        if bias.dim() != self.cols {
            return Err(Error::DimensionMismatch(format!(
                "bias dim {} does not match {} columns",
                bias.dim(),
                self.cols
            )));
        }
        for row in self.data.chunks_exact_mut(self.cols) {
            for (v, &b) in row.iter_mut().zip(bias.as_slice()) {
                *v += b;
            }
        }
        Ok(())
    }

    /// Mean of every column.
    pub fn column_means(&self) -> Vector {
        let mut sums = vec![0.0; self.cols];
        for row in self.data.chunks_exact(self.cols) {
            for (s, &v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        let inv_n = 1.0 / self.rows as f64;
        for s in &mut sums {
            *s *= inv_n;
        }
        Vector::from_nonempty(sums)
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.data.len() as f64
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn sum_along(&self, axis: Axis, idx: usize) -> Result<f64> {
        Ok(self.lane(axis, idx)?.sum())
    }

    pub fn mean_along(&self, axis: Axis, idx: usize) -> Result<f64> {
        let n = self.lane_len(axis);
        Ok(self.sum_along(axis, idx)? / n as f64)
    }

    /// Standard deviation of one row/column with `ddof` in `{0, 1}`.
    pub fn std_along(&self, axis: Axis, idx: usize, ddof: usize) -> Result<f64> {
        let lane = self.lane(axis, idx)?;
        std_of(lane, self.lane_len(axis), ddof)
    }

    pub fn min_along(&self, axis: Axis, idx: usize) -> Result<f64> {
        Ok(self.lane(axis, idx)?.fold(f64::INFINITY, f64::min))
    }

    pub fn max_along(&self, axis: Axis, idx: usize) -> Result<f64> {
        Ok(self.lane(axis, idx)?.fold(f64::NEG_INFINITY, f64::max))
    }

    /// Dot product of lane `idx` of `self` with lane `other_idx` of `other`.
    pub fn dot_along(
        &self,
        axis: Axis,
        idx: usize,
        other: &Matrix,
        other_idx: usize,
    ) -> Result<f64> {
        if self.lane_len(axis) != other.lane_len(axis) {
            return Err(Error::DimensionMismatch(format!(
                "lane lengths {} and {} differ",
                self.lane_len(axis),
                other.lane_len(axis)
            )));
        }
        let a = self.lane(axis, idx)?;
        let b = other.lane(axis, other_idx)?;
        let mut sum = 0.0;
        for (x, y) in a.zip(b) {
            sum += x * y;
        }
        Ok(sum)
    }

    /// Transform column `col` in place.
    pub fn apply_column<F: FnMut(f64) -> f64>(&mut self, col: usize, mut f: F) -> Result<()> {
        if col >= self.cols {
            return Err(Error::IndexOutOfBounds(format!(
                "column {col} for matrix with {} columns",
                self.cols
            )));
        }
        for row in self.data.chunks_exact_mut(self.cols) {
            row[col] = f(row[col]);
        }
        Ok(())
    }

    /// Transform every element in place.
    pub fn apply_all<F: FnMut(f64) -> f64>(&mut self, mut f: F) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    #[inline]
    fn lane_len(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.cols,
            Axis::Col => self.rows,
        }
    }

    fn lane(&self, axis: Axis, idx: usize) -> Result<impl Iterator<Item = f64> + Clone + '_> {
        let (start, stride) = match axis {
            Axis::Row => {
                self.check_row(idx)?;
                (idx * self.cols, 1)
            }
            Axis::Col => {
                if idx >= self.cols {
                    return Err(Error::IndexOutOfBounds(format!(
                        "column {idx} for matrix with {} columns",
                        self.cols
                    )));
                }
                (idx, self.cols)
            }
        };
        Ok(self.data[start..]
            .iter()
            .step_by(stride)
            .take(self.lane_len(axis))
            .copied())
    }

    #[inline]
    fn check_row(&self, i: usize) -> Result<()> {
        if i >= self.rows {
            return Err(Error::IndexOutOfBounds(format!(
                "row {i} for matrix with {} rows",
                self.rows
            )));
        }
        Ok(())
    }

    #[inline]
    fn check_index(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.rows || j >= self.cols {
            return Err(Error::IndexOutOfBounds(format!(
                "({i}, {j}) for {}x{} matrix",
                self.rows, self.cols
            )));
        }
        Ok(())
    }
}

fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    if rows == 0 || cols == 0 {
        return Err(Error::InvalidDimension(format!(
            "matrix dims must be > 0, got {rows}x{cols}"
        )));
    }
    rows.checked_mul(cols).ok_or_else(|| {
        Error::AllocationFailure(format!("{rows}x{cols} matrix overflows usize"))
    })
}

fn check_range(range: &Range<usize>, dim: usize, what: &str) -> Result<()> {
    if range.start >= range.end || range.end > dim {
        return Err(Error::IndexOutOfBounds(format!(
            "{what} range {}..{} for dimension {dim}",
            range.start, range.end
        )));
    }
    Ok(())
}

fn swap_rows(data: &mut [f64], n: usize, a: usize, b: usize) {
    for j in 0..n {
        data.swap(a * n + j, b * n + j);
    }
}

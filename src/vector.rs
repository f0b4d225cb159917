//! Dense 1D array.

use std::fmt;

use crate::{Error, Result};

/// Element-wise arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    /// Apply the operator to one pair of elements.
    ///
    /// Division by exactly zero yields `0.0` and reports `true` in the second
    /// slot so the caller can warn with its own context.
    #[inline]
    pub(crate) fn apply(self, a: f64, b: f64) -> (f64, bool) {
        match self {
            ArithOp::Add => (a + b, false),
            ArithOp::Sub => (a - b, false),
            ArithOp::Mul => (a * b, false),
            ArithOp::Div => {
                if b == 0.0 {
                    (0.0, true)
                } else {
                    (a / b, false)
                }
            }
        }
    }
}

impl TryFrom<char> for ArithOp {
    type Error = Error;

    fn try_from(op: char) -> Result<Self> {
        match op {
            '+' => Ok(ArithOp::Add),
            '-' => Ok(ArithOp::Sub),
            '*' => Ok(ArithOp::Mul),
            '/' => Ok(ArithOp::Div),
            other => Err(Error::InvalidParameter(format!(
                "unknown arithmetic operator {other:?}"
            ))),
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            ArithOp::Add => '+',
            ArithOp::Sub => '-',
            ArithOp::Mul => '*',
            ArithOp::Div => '/',
        };
        write!(f, "{c}")
    }
}

/// Dense vector of `dim > 0` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    /// Zero-initialized vector.
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidDimension(
                "vector dim must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            data: vec![0.0; dim],
        })
    }

    pub fn from_vec(data: Vec<f64>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidDimension(
                "vector dim must be > 0".to_owned(),
            ));
        }
        Ok(Self { data })
    }

    pub fn from_slice(data: &[f64]) -> Result<Self> {
        Self::from_vec(data.to_vec())
    }

    /// Callers guarantee `data` is non-empty.
    #[inline]
    pub(crate) fn from_nonempty(data: Vec<f64>) -> Self {
        debug_assert!(!data.is_empty());
        Self { data }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn get(&self, i: usize) -> Result<f64> {
        self.data.get(i).copied().ok_or_else(|| {
            Error::IndexOutOfBounds(format!("index {i} for vector of dim {}", self.dim()))
        })
    }

    pub fn set(&mut self, i: usize, value: f64) -> Result<()> {
        let dim = self.dim();
        let slot = self.data.get_mut(i).ok_or_else(|| {
            Error::IndexOutOfBounds(format!("index {i} for vector of dim {dim}"))
        })?;
        *slot = value;
        Ok(())
    }

    /// Element-wise `self op other` into a new vector.
    pub fn arithmetic(&self, other: &Vector, op: ArithOp) -> Result<Vector> {
        if self.dim() != other.dim() {
            return Err(Error::DimensionMismatch(format!(
                "vector dims {} and {} differ",
                self.dim(),
                other.dim()
            )));
        }

        let mut data = Vec::with_capacity(self.dim());
        for (i, (&a, &b)) in self.data.iter().zip(&other.data).enumerate() {
            let (v, div_by_zero) = op.apply(a, b);
            if div_by_zero {
                tracing::warn!(index = i, "division by zero in vector arithmetic, set to 0");
            }
            data.push(v);
        }
        Ok(Vector { data })
    }

    /// In-place `self[i] = self[i] op scalar`.
    ///
    /// Dividing by exactly zero zeroes every element and warns once.
    pub fn scalar_arithmetic(&mut self, scalar: f64, op: ArithOp) {
        if op == ArithOp::Div && scalar == 0.0 {
            tracing::warn!(dim = self.dim(), "division of vector by zero scalar, set to 0");
            self.data.fill(0.0);
            return;
        }
        for v in &mut self.data {
            *v = op.apply(*v, scalar).0;
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn mean(&self) -> f64 {
        self.sum() / self.dim() as f64
    }

    /// Standard deviation with `ddof` in `{0, 1}`.
    pub fn std(&self, ddof: usize) -> Result<f64> {
        std_of(self.data.iter().copied(), self.dim(), ddof)
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn dot(&self, other: &Vector) -> Result<f64> {
        if self.dim() != other.dim() {
            return Err(Error::DimensionMismatch(format!(
                "dot product of dims {} and {}",
                self.dim(),
                other.dim()
            )));
        }
        let mut sum = 0.0;
        for (&a, &b) in self.data.iter().zip(&other.data) {
            sum += a * b;
        }
        Ok(sum)
    }

    /// In-place element-wise transform.
    pub fn apply<F: FnMut(f64) -> f64>(&mut self, mut f: F) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }
}

/// Two-pass standard deviation shared by `Vector` and `Matrix` lanes.
pub(crate) fn std_of<I>(values: I, count: usize, ddof: usize) -> Result<f64>
where
    I: Iterator<Item = f64> + Clone,
{
    if ddof > 1 {
        return Err(Error::InvalidParameter(format!(
            "ddof must be 0 or 1, got {ddof}"
        )));
    }
    if count <= ddof {
        return Err(Error::InsufficientSamples(format!(
            "std with ddof={ddof} needs at least {} values, got {count}",
            ddof + 1
        )));
    }

    let mean = values.clone().sum::<f64>() / count as f64;
    let mut var = 0.0;
    for v in values {
        let diff = v - mean;
        var += diff * diff;
    }
    Ok((var / (count - ddof) as f64).sqrt())
}

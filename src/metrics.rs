//! Metrics.
//!
//! Metrics are evaluation helpers (they do not participate in training).

use crate::{Error, Matrix, Result, Vector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Supported evaluation metrics.
pub enum Metric {
    /// Mean squared error.
    Mse,
    /// Mean absolute error.
    Mae,
    /// Coefficient of determination.
    R2,
    /// Fraction of predictions equal to their label.
    Accuracy,
}

impl Metric {
    /// Score `pred` against `target`.
    pub fn evaluate(self, pred: &Vector, target: &Vector) -> Result<f64> {
        let (p, t) = (pred.as_slice(), target.as_slice());
        match self {
            Metric::Mse => mean_squared_error(p, t),
            Metric::Mae => mean_absolute_error(p, t),
            Metric::R2 => r2_score(p, t),
            Metric::Accuracy => accuracy(p, t),
        }
    }
}

fn check_lengths(pred: &[f64], target: &[f64]) -> Result<()> {
    if pred.len() != target.len() {
        return Err(Error::DimensionMismatch(format!(
            "pred len {} does not match target len {}",
            pred.len(),
            target.len()
        )));
    }
    if pred.is_empty() {
        return Err(Error::InsufficientSamples(
            "metrics need at least one sample".to_owned(),
        ));
    }
    Ok(())
}

pub fn mean_squared_error(pred: &[f64], target: &[f64]) -> Result<f64> {
    check_lengths(pred, target)?;
    let mut sum = 0.0;
    for (&p, &t) in pred.iter().zip(target) {
        let diff = p - t;
        sum += diff * diff;
    }
    Ok(sum / pred.len() as f64)
}

pub fn mean_absolute_error(pred: &[f64], target: &[f64]) -> Result<f64> {
    check_lengths(pred, target)?;
    let mut sum = 0.0;
    for (&p, &t) in pred.iter().zip(target) {
        sum += (p - t).abs();
    }
    Ok(sum / pred.len() as f64)
}

/// `1 - SS_res / SS_tot`.
///
/// A constant target gives `1.0` for a perfect fit and `0.0` otherwise.
pub fn r2_score(pred: &[f64], target: &[f64]) -> Result<f64> {
    check_lengths(pred, target)?;
    let mean = target.iter().sum::<f64>() / target.len() as f64;
    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (&p, &t) in pred.iter().zip(target) {
        ss_res += (t - p) * (t - p);
        ss_tot += (t - mean) * (t - mean);
    }
    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}

/// Fraction of exact label matches.
pub fn accuracy(pred: &[f64], target: &[f64]) -> Result<f64> {
    check_lengths(pred, target)?;
    let hits = pred.iter().zip(target).filter(|(p, t)| p == t).count();
    Ok(hits as f64 / pred.len() as f64)
}

/// Multiclass accuracy: row-wise argmax of `pred` against one-hot `target`.
pub fn argmax_accuracy(pred: &Matrix, target: &Matrix) -> Result<f64> {
    if pred.shape() != target.shape() {
        return Err(Error::DimensionMismatch(format!(
            "prediction shape {:?} does not match target shape {:?}",
            pred.shape(),
            target.shape()
        )));
    }
    let mut hits = 0;
    for i in 0..pred.rows() {
        if argmax(pred.row_unchecked(i)) == argmax(target.row_unchecked(i)) {
            hits += 1;
        }
    }
    Ok(hits as f64 / pred.rows() as f64)
}

/// Index of the first maximum.
pub fn argmax(row: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in row.iter().enumerate().skip(1) {
        if v > row[best] {
            best = i;
        }
    }
    best
}

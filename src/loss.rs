//! Loss functions.
//!
//! [`Loss`] covers the network losses, evaluated row by row over a batch. The
//! free functions are the per-sample helpers the scalar trainers use for their
//! epoch readouts.
//!
//! Every logarithm is guarded by [`EPSILON`].

use std::fmt;

use crate::{Activation, Error, Matrix, Result};

/// Added inside every logarithm.
pub const EPSILON: f64 = 1e-15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
/// Supported network loss functions.
pub enum Loss {
    /// Mean squared error over the outputs of a row.
    Mse,
    /// Mean binary cross-entropy over the outputs of a row.
    ///
    /// Expects probabilities, i.e. a `Sigmoid` output layer.
    BinaryCrossEntropy,
    /// `-sum(t * ln(p))` for a one-hot target row.
    ///
    /// Expects probabilities, i.e. a `Softmax` output layer.
    CategoricalCrossEntropy,
}

impl Loss {
    /// Loss of one row.
    pub fn row_loss(self, pred: &[f64], target: &[f64]) -> Result<f64> {
        match self {
            Loss::Mse => mse(pred, target),
            Loss::BinaryCrossEntropy => {
                check_lengths(pred, target)?;
                let mut sum = 0.0;
                for (&p, &t) in pred.iter().zip(target) {
                    sum += binary_cross_entropy(p, t);
                }
                Ok(sum / pred.len() as f64)
            }
            Loss::CategoricalCrossEntropy => categorical_cross_entropy(pred, target),
        }
    }

    /// Sum of the row losses of a batch.
    pub fn batch_loss(self, pred: &Matrix, target: &Matrix) -> Result<f64> {
        check_same_shape(pred, target)?;
        let mut total = 0.0;
        for i in 0..pred.rows() {
            total += self.row_loss(pred.row_unchecked(i), target.row_unchecked(i))?;
        }
        Ok(total)
    }

    /// Gradient of the loss with respect to the output layer's pre-activation.
    ///
    /// Starts from `pred - target`. For MSE it is then scaled element-wise by
    /// the output activation's derivative at `pre`; the cross-entropy deltas are
    /// already simplified through their matching sigmoid/softmax output.
    pub fn output_delta(
        self,
        pred: &Matrix,
        target: &Matrix,
        pre: &Matrix,
        output_activation: Activation,
    ) -> Result<Matrix> {
        check_same_shape(pred, target)?;
        check_same_shape(pred, pre)?;

        let mut delta = pred.clone();
        for (d, (&t, &z)) in delta
            .as_mut_slice()
            .iter_mut()
            .zip(target.as_slice().iter().zip(pre.as_slice()))
        {
            *d -= t;
            if self == Loss::Mse {
                *d *= output_activation.derivative(z);
            }
        }
        Ok(delta)
    }
}

impl fmt::Display for Loss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Loss::Mse => "mse",
            Loss::BinaryCrossEntropy => "binary_cross_entropy",
            Loss::CategoricalCrossEntropy => "categorical_cross_entropy",
        };
        f.write_str(name)
    }
}

fn check_same_shape(a: &Matrix, b: &Matrix) -> Result<()> {
    if a.shape() != b.shape() {
        return Err(Error::DimensionMismatch(format!(
            "prediction shape {:?} does not match target shape {:?}",
            a.shape(),
            b.shape()
        )));
    }
    Ok(())
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
            "loss needs at least one output".to_owned(),
        ));
    }
    Ok(())
}

/// `mean((pred - target)^2)`.
#[inline]
pub fn mse(pred: &[f64], target: &[f64]) -> Result<f64> {
    check_lengths(pred, target)?;
    let mut sum_sq = 0.0;
    for (&p, &t) in pred.iter().zip(target) {
        let diff = p - t;
        sum_sq += diff * diff;
    }
    Ok(sum_sq / pred.len() as f64)
}

/// `-(t ln(p + eps) + (1 - t) ln(1 - p + eps))` for one probability.
#[inline]
pub fn binary_cross_entropy(p: f64, t: f64) -> f64 {
    -(t * (p + EPSILON).ln() + (1.0 - t) * (1.0 - p + EPSILON).ln())
}

/// `-sum(t ln(p + eps))` over one row.
#[inline]
pub fn categorical_cross_entropy(pred: &[f64], target: &[f64]) -> Result<f64> {
    check_lengths(pred, target)?;
    let mut sum = 0.0;
    for (&p, &t) in pred.iter().zip(target) {
        if t != 0.0 {
            sum -= t * (p + EPSILON).ln();
        }
    }
    Ok(sum)
}

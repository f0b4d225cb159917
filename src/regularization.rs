//! Weight penalties and the single regularized gradient step every trainer uses.
//!
//! The intercept/bias terms are never penalized; callers apply plain descent to
//! them and route only weights through [`gradient_step`].

use crate::{Error, Result};

/// Penalty kind without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Penalty {
    None,
    L1,
    L2,
    ElasticNet,
}

/// Weight penalty with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Regularization {
    #[default]
    None,
    L1 { lambda: f64 },
    L2 { lambda: f64 },
    /// `ratio` weights the L1 part, `1 - ratio` the L2 part.
    ElasticNet { lambda: f64, ratio: f64 },
}

impl Regularization {
    /// Build from a penalty kind and optional parameters.
    ///
    /// Parameter presence must match the kind: `None` takes neither, `L1`/`L2`
    /// take `lambda` only, `ElasticNet` takes both.
    pub fn from_parts(penalty: Penalty, lambda: Option<f64>, ratio: Option<f64>) -> Result<Self> {
        let reg = match (penalty, lambda, ratio) {
            (Penalty::None, None, None) => Regularization::None,
            (Penalty::L1, Some(lambda), None) => Regularization::L1 { lambda },
            (Penalty::L2, Some(lambda), None) => Regularization::L2 { lambda },
            (Penalty::ElasticNet, Some(lambda), Some(ratio)) => {
                Regularization::ElasticNet { lambda, ratio }
            }
            (penalty, lambda, ratio) => {
                return Err(Error::InvalidParameter(format!(
                    "{penalty:?} penalty does not accept lambda={lambda:?}, ratio={ratio:?}"
                )));
            }
        };
        reg.validate()?;
        Ok(reg)
    }

    pub fn penalty(self) -> Penalty {
        match self {
            Regularization::None => Penalty::None,
            Regularization::L1 { .. } => Penalty::L1,
            Regularization::L2 { .. } => Penalty::L2,
            Regularization::ElasticNet { .. } => Penalty::ElasticNet,
        }
    }

    /// Validate penalty parameters.
    pub fn validate(self) -> Result<()> {
        match self {
            Regularization::None => Ok(()),
            Regularization::L1 { lambda } | Regularization::L2 { lambda } => {
                validate_lambda(lambda)
            }
            Regularization::ElasticNet { lambda, ratio } => {
                validate_lambda(lambda)?;
                if !(ratio.is_finite() && (0.0..=1.0).contains(&ratio)) {
                    return Err(Error::InvalidParameter(format!(
                        "elastic net ratio must be in [0,1], got {ratio}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Gradient of the penalty term at `w`.
    #[inline]
    pub fn penalty_gradient(self, w: f64) -> f64 {
        match self {
            Regularization::None => 0.0,
            Regularization::L1 { lambda } => lambda * sign(w),
            Regularization::L2 { lambda } => lambda * w,
            Regularization::ElasticNet { lambda, ratio } => {
                lambda * (ratio * sign(w) + (1.0 - ratio) * w)
            }
        }
    }
}

fn validate_lambda(lambda: f64) -> Result<()> {
    if !(lambda.is_finite() && lambda >= 0.0) {
        return Err(Error::InvalidParameter(format!(
            "lambda must be finite and >= 0, got {lambda}"
        )));
    }
    Ok(())
}

/// Sign with `sign(0) = 0`.
#[inline]
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// One regularized descent step for a single weight.
///
/// `g` is the raw (batch-averaged) loss gradient; the penalty gradient is added
/// before scaling by `alpha`.
#[inline]
pub fn gradient_step(w: f64, g: f64, alpha: f64, reg: Regularization) -> f64 {
    w - alpha * (g + reg.penalty_gradient(w))
}

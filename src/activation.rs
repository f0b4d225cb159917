//! Activation functions.
//!
//! A dense layer computes a pre-activation `Z = X W + b` and then applies an
//! activation. Every variant except [`Activation::Softmax`] is element-wise;
//! softmax normalizes each row.
//!
//! Backprop evaluates derivatives at the cached *pre-activation* values. Softmax
//! and Linear report a unit derivative: their gradient is folded into the
//! loss-specific output delta.

use std::fmt;

use crate::Matrix;

/// Slope of [`Activation::LeakyReLU`] for negative inputs.
pub const LEAKY_RELU_SLOPE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Activation {
    ReLU,
    LeakyReLU,
    SiLU,
    Sigmoid,
    Tanh,
    Softmax,
    Linear,
}

impl Activation {
    /// Element-wise forward value. Softmax is row-wise and passes `x` through
    /// here; use [`Activation::activate`] for whole matrices.
    #[inline]
    pub(crate) fn forward(self, x: f64) -> f64 {
        match self {
            Activation::ReLU => x.max(0.0),
            Activation::LeakyReLU => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            Activation::SiLU => x * sigmoid(x),
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
            Activation::Softmax | Activation::Linear => x,
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    #[inline]
    pub(crate) fn derivative(self, x: f64) -> f64 {
        match self {
            Activation::ReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::LeakyReLU => {
                if x > 0.0 {
                    1.0
                } else {
                    LEAKY_RELU_SLOPE
                }
            }
            Activation::SiLU => {
                let s = sigmoid(x);
                s + x * s * (1.0 - s)
            }
            Activation::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            Activation::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            Activation::Softmax | Activation::Linear => 1.0,
        }
    }

    /// Apply the activation to every row of `z` in place.
    pub fn activate(self, z: &mut Matrix) {
        match self {
            Activation::Softmax => {
                let cols = z.cols();
                for row in z.as_mut_slice().chunks_exact_mut(cols) {
                    softmax_in_place(row);
                }
            }
            Activation::Linear => {}
            act => z.apply_all(|x| act.forward(x)),
        }
    }

    /// Matrix of derivatives evaluated at `pre`.
    pub fn derivative_at(self, pre: &Matrix) -> Matrix {
        let mut d = pre.clone();
        d.apply_all(|x| self.derivative(x));
        d
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Activation::ReLU => "relu",
            Activation::LeakyReLU => "leaky_relu",
            Activation::SiLU => "silu",
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Softmax => "softmax",
            Activation::Linear => "linear",
        };
        f.write_str(name)
    }
}

/// Numerically stable logistic function.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// `exp(x - max) / sum` over one row.
pub fn softmax_in_place(row: &mut [f64]) {
    let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut sum = 0.0;
    for v in row.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in row.iter_mut() {
        *v /= sum;
    }
}

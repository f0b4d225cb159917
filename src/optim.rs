//! Plain stochastic gradient descent.
//!
//! Weights go through [`gradient_step`] with the owning layer's or model's
//! [`Regularization`]; biases and intercepts always take an unpenalized step.

use crate::regularization::gradient_step;
use crate::{Error, Regularization, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
/// Stochastic gradient descent with a fixed learning rate.
pub struct Sgd {
    lr: f64,
}

impl Sgd {
    /// Construct an SGD optimizer.
    ///
    /// Returns an error if `lr` is not finite or `lr < 0`. A zero rate is
    /// accepted and leaves parameters unchanged.
    pub fn new(lr: f64) -> Result<Self> {
        if !(lr.is_finite() && lr >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "learning rate must be finite and >= 0, got {lr}"
            )));
        }
        Ok(Self { lr })
    }

    #[inline]
    pub fn lr(&self) -> f64 {
        self.lr
    }

    /// `w[i] = gradient_step(w[i], g[i], lr, reg)` for every weight.
    #[inline]
    pub fn step_weights(&self, weights: &mut [f64], grads: &[f64], reg: Regularization) {
        debug_assert_eq!(weights.len(), grads.len());
        for (w, &g) in weights.iter_mut().zip(grads) {
            *w = gradient_step(*w, g, self.lr, reg);
        }
    }

    /// `b[i] -= lr * g[i]`, no penalty.
    #[inline]
    pub fn step_biases(&self, biases: &mut [f64], grads: &[f64]) {
        debug_assert_eq!(biases.len(), grads.len());
        for (b, &g) in biases.iter_mut().zip(grads) {
            *b -= self.lr * g;
        }
    }

    /// Unpenalized step for a single intercept.
    #[inline]
    pub fn step_bias(&self, bias: f64, grad: f64) -> f64 {
        bias - self.lr * grad
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sgd_requires_finite_non_negative_lr() {
        assert!(Sgd::new(-1.0).is_err());
        assert!(Sgd::new(f64::NAN).is_err());
        assert!(Sgd::new(f64::INFINITY).is_err());
        assert_eq!(Sgd::new(0.0).unwrap().lr(), 0.0);
    }

    #[test]
    fn weights_are_penalized_biases_are_not() {
        let opt = Sgd::new(0.1).unwrap();
        let reg = Regularization::L2 { lambda: 1.0 };

        let mut w = [1.0, -2.0];
        opt.step_weights(&mut w, &[3.0, 0.0], reg);
        assert!((w[0] - (1.0 - 0.1 * (3.0 + 1.0))).abs() < 1e-12);
        assert!((w[1] - (-2.0 - 0.1 * -2.0)).abs() < 1e-12);

        let mut b = [2.0];
        opt.step_biases(&mut b, &[4.0]);
        assert!((b[0] - 1.6).abs() < 1e-12);
        assert!((opt.step_bias(2.0, 4.0) - 1.6).abs() < 1e-12);
    }

    #[test]
    fn zero_lr_is_a_no_op() {
        let opt = Sgd::new(0.0).unwrap();
        let mut w = [0.5];
        opt.step_weights(&mut w, &[10.0], Regularization::L1 { lambda: 1.0 });
        assert_eq!(w[0], 0.5);
    }
}

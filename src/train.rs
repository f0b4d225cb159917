//! Training configuration and the mini-batch loop shared by the scalar models.
//!
//! `SgdRegression` and `LogisticRegression` differ only in their link function,
//! so both run through [`ScalarTrainer`]. `NeuralNetwork::fit` reuses
//! [`FitConfig`], [`FitReport`] and [`shuffled_batches`].

use rand::seq::SliceRandom;

use crate::loss::binary_cross_entropy;
use crate::rng::{resolve_seed, xavier_limit};
use crate::{Activation, Error, Matrix, Pcg32, Regularization, Result, Sgd, Vector};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FitConfig {
    pub epochs: usize,
    pub learning_rate: f64,
    /// Samples per gradient update; the last batch of an epoch may be short.
    pub batch_size: usize,
    /// Emit a loss readout every `print_every` epochs (and on the last one).
    /// `0` disables readouts.
    pub print_every: usize,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 1e-2,
            batch_size: 1,
            print_every: 0,
        }
    }
}

impl FitConfig {
    /// Validate against a dataset of `n_samples` rows.
    pub fn validate(&self, n_samples: usize) -> Result<()> {
        if self.epochs == 0 {
            return Err(Error::InvalidParameter("epochs must be > 0".to_owned()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "learning rate must be finite and >= 0, got {}",
                self.learning_rate
            )));
        }
        if self.batch_size == 0 || self.batch_size > n_samples {
            return Err(Error::InvalidParameter(format!(
                "batch size must be in [1, {n_samples}], got {}",
                self.batch_size
            )));
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn should_report(&self, epoch: usize) -> bool {
        self.print_every > 0 && (epoch % self.print_every == 0 || epoch + 1 == self.epochs)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// Mean loss of the last epoch.
    pub final_loss: f64,
    /// Mean loss of every epoch, in order.
    pub loss_history: Vec<f64>,
}

/// Shuffle `0..n` and cut it into batches of `batch_size`.
pub(crate) fn shuffled_batches(rng: &mut Pcg32, n: usize, batch_size: usize) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);
    indices.chunks(batch_size).map(<[usize]>::to_vec).collect()
}

/// `X coef (+ intercept)`.
pub(crate) fn decision_function(
    x: &Matrix,
    coef: &Vector,
    intercept: Option<f64>,
) -> Result<Vector> {
    if x.cols() != coef.dim() {
        return Err(Error::DimensionMismatch(format!(
            "X has {} columns, model expects {} features",
            x.cols(),
            coef.dim()
        )));
    }
    let mut out = x.matmul(&Matrix::from_column(coef))?.column(0)?;
    if let Some(b) = intercept {
        out.scalar_arithmetic(b, crate::ArithOp::Add);
    }
    Ok(out)
}

/// Link between the affine score and the prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    /// Squared-error regression.
    Identity,
    /// Sigmoid probability with binary cross-entropy.
    Logistic,
}

impl Link {
    #[inline]
    fn apply(self, z: f64) -> f64 {
        match self {
            Link::Identity => Activation::Linear.forward(z),
            Link::Logistic => Activation::Sigmoid.forward(z),
        }
    }

    #[inline]
    fn sample_loss(self, pred: f64, target: f64) -> f64 {
        match self {
            Link::Identity => {
                let e = pred - target;
                e * e
            }
            Link::Logistic => binary_cross_entropy(pred, target),
        }
    }
}

/// Fitted parameters of a scalar model.
#[derive(Debug, Clone)]
pub(crate) struct ScalarFit {
    pub coef: Vector,
    pub intercept: f64,
    pub report: FitReport,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ScalarTrainer {
    pub num_features: usize,
    pub fit_intercept: bool,
    pub regularization: Regularization,
    pub seed: i64,
    pub link: Link,
}

impl ScalarTrainer {
    /// Validate, draw Xavier-range initial weights, then run the epoch loop.
    ///
    /// Nothing is returned (and so nothing is mutated by the caller) unless
    /// every check passes.
    pub fn fit(&self, x: &Matrix, y: &Vector, cfg: &FitConfig) -> Result<ScalarFit> {
        self.validate(x, y, cfg)?;

        let seed = resolve_seed(self.seed);
        let mut rng = Pcg32::new(seed);
        let limit = xavier_limit(self.num_features, 1);
        let coef: Vec<f64> = (0..self.num_features)
            .map(|_| rng.symmetric(limit))
            .collect();
        self.run(x, y, cfg, rng, seed, coef, 0.0)
    }

    /// Like [`fit`](Self::fit), but start from the given parameters instead
    /// of a random draw. `intercept` is ignored without `fit_intercept`.
    pub fn fit_from(
        &self,
        x: &Matrix,
        y: &Vector,
        cfg: &FitConfig,
        coef: &Vector,
        intercept: f64,
    ) -> Result<ScalarFit> {
        self.validate(x, y, cfg)?;
        if coef.dim() != self.num_features {
            return Err(Error::DimensionMismatch(format!(
                "initial coef has {} values, model expects {} features",
                coef.dim(),
                self.num_features
            )));
        }
        let intercept = if self.fit_intercept { intercept } else { 0.0 };
        if !intercept.is_finite() || coef.as_slice().iter().any(|w| !w.is_finite()) {
            return Err(Error::InvalidParameter(
                "initial parameters must be finite".to_owned(),
            ));
        }

        let seed = resolve_seed(self.seed);
        let rng = Pcg32::new(seed);
        self.run(x, y, cfg, rng, seed, coef.as_slice().to_vec(), intercept)
    }

    fn validate(&self, x: &Matrix, y: &Vector, cfg: &FitConfig) -> Result<()> {
        if x.cols() != self.num_features {
            return Err(Error::DimensionMismatch(format!(
                "X has {} columns, model expects {} features",
                x.cols(),
                self.num_features
            )));
        }
        if x.rows() != y.dim() {
            return Err(Error::DimensionMismatch(format!(
                "X has {} rows but y has {} values",
                x.rows(),
                y.dim()
            )));
        }
        self.regularization.validate()?;
        cfg.validate(x.rows())
    }

    #[allow(clippy::too_many_arguments)]
    fn run(
        &self,
        x: &Matrix,
        y: &Vector,
        cfg: &FitConfig,
        mut rng: Pcg32,
        seed: u64,
        mut coef: Vec<f64>,
        mut intercept: f64,
    ) -> Result<ScalarFit> {
        let opt = Sgd::new(cfg.learning_rate)?;
        let n = self.num_features;
        let m = x.rows();

        tracing::debug!(
            samples = m,
            features = n,
            batch_size = cfg.batch_size,
            epochs = cfg.epochs,
            seed,
            link = ?self.link,
            "fit start"
        );

        let targets = y.as_slice();
        let mut grad_sums = vec![0.0; n];
        let mut loss_history = Vec::with_capacity(cfg.epochs);

        for epoch in 0..cfg.epochs {
            let mut epoch_loss = 0.0;

            for batch in shuffled_batches(&mut rng, m, cfg.batch_size) {
                grad_sums.fill(0.0);
                let mut intercept_grad_sum = 0.0;

                for &i in &batch {
                    let row = x.row_unchecked(i);
                    let mut z = 0.0;
                    for (&xj, &wj) in row.iter().zip(&coef) {
                        z += xj * wj;
                    }
                    if self.fit_intercept {
                        z += intercept;
                    }

                    let pred = self.link.apply(z);
                    let error = pred - targets[i];
                    epoch_loss += self.link.sample_loss(pred, targets[i]);

                    for (g, &xj) in grad_sums.iter_mut().zip(row) {
                        *g += error * xj;
                    }
                    intercept_grad_sum += error;
                }

                let inv_bs = 1.0 / batch.len() as f64;
                for g in &mut grad_sums {
                    *g *= inv_bs;
                }
                opt.step_weights(&mut coef, &grad_sums, self.regularization);
                if self.fit_intercept {
                    intercept = opt.step_bias(intercept, intercept_grad_sum * inv_bs);
                }
            }

            let mean_loss = epoch_loss / m as f64;
            if cfg.should_report(epoch) {
                tracing::info!(epoch = epoch + 1, loss = mean_loss, "epoch");
            }
            loss_history.push(mean_loss);
        }

        Ok(ScalarFit {
            coef: Vector::from_nonempty(coef),
            intercept,
            report: FitReport {
                final_loss: loss_history.last().copied().unwrap_or(f64::NAN),
                loss_history,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        let cfg = FitConfig::default();
        assert!(cfg.validate(10).is_ok());
        assert!(
            FitConfig {
                epochs: 0,
                ..cfg
            }
            .validate(10)
            .is_err()
        );
        assert!(
            FitConfig {
                learning_rate: f64::NAN,
                ..cfg
            }
            .validate(10)
            .is_err()
        );
        assert!(
            FitConfig {
                batch_size: 0,
                ..cfg
            }
            .validate(10)
            .is_err()
        );
        assert!(
            FitConfig {
                batch_size: 11,
                ..cfg
            }
            .validate(10)
            .is_err()
        );
    }

    #[test]
    fn readout_schedule_includes_last_epoch() {
        let cfg = FitConfig {
            epochs: 10,
            print_every: 4,
            ..FitConfig::default()
        };
        let reported: Vec<usize> = (0..10).filter(|&e| cfg.should_report(e)).collect();
        assert_eq!(reported, vec![0, 4, 8, 9]);
        assert!(!FitConfig::default().should_report(0));
    }

    #[test]
    fn batches_cover_every_index_once() {
        let mut rng = Pcg32::new(5);
        let batches = shuffled_batches(&mut rng, 7, 3);
        assert_eq!(
            batches.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![3, 3, 1]
        );
        let mut all: Vec<usize> = batches.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn scalar_trainer_is_deterministic_for_a_seed() {
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let y = Vector::from_slice(&[2.0, 4.0, 6.0]).unwrap();
        let trainer = ScalarTrainer {
            num_features: 1,
            fit_intercept: true,
            regularization: Regularization::None,
            seed: 9,
            link: Link::Identity,
        };
        let cfg = FitConfig {
            epochs: 20,
            learning_rate: 0.05,
            batch_size: 2,
            print_every: 0,
        };
        let a = trainer.fit(&x, &y, &cfg).unwrap();
        let b = trainer.fit(&x, &y, &cfg).unwrap();
        assert_eq!(a.coef, b.coef);
        assert_eq!(a.intercept, b.intercept);
        assert_eq!(a.report.loss_history.len(), 20);
        assert!(a.report.final_loss < a.report.loss_history[0]);
    }

    #[test]
    fn scalar_trainer_rejects_mismatched_data() {
        let x = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let y = Vector::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        let trainer = ScalarTrainer {
            num_features: 2,
            fit_intercept: false,
            regularization: Regularization::None,
            seed: 0,
            link: Link::Logistic,
        };
        assert!(matches!(
            trainer.fit(&x, &y, &FitConfig::default()),
            Err(Error::DimensionMismatch(_))
        ));
    }

    #[test]
    fn decision_function_adds_intercept() {
        let x = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let coef = Vector::from_slice(&[1.0, -1.0]).unwrap();
        let z = decision_function(&x, &coef, Some(0.5)).unwrap();
        assert_eq!(z.as_slice(), &[-0.5, -0.5]);
        let z = decision_function(&x, &coef, None).unwrap();
        assert_eq!(z.as_slice(), &[-1.0, -1.0]);
    }
}

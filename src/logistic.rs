//! Binary logistic regression trained by regularized mini-batch gradient descent.

use crate::activation::sigmoid;
use crate::linear_model::fitted_intercept;
use crate::metrics::accuracy;
use crate::train::{Link, ScalarTrainer, decision_function};
use crate::{Error, FitConfig, FitReport, Matrix, Regularization, Result, Vector};

#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression {
    fit_intercept: bool,
    regularization: Regularization,
    seed: i64,
    threshold: f64,
    coef: Vector,
    intercept: f64,
}

impl LogisticRegression {
    /// `threshold` must lie in `[0, 1]`; `seed < 0` draws a wall-clock seed at
    /// every `fit`.
    pub fn new(
        num_features: usize,
        fit_intercept: bool,
        regularization: Regularization,
        seed: i64,
        threshold: f64,
    ) -> Result<Self> {
        regularization.validate()?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::InvalidParameter(format!(
                "threshold must be in [0,1], got {threshold}"
            )));
        }
        Ok(Self {
            fit_intercept,
            regularization,
            seed,
            threshold,
            coef: Vector::new(num_features).map_err(|_| {
                Error::InvalidDimension("num_features must be > 0".to_owned())
            })?,
            intercept: f64::NAN,
        })
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.coef.dim()
    }

    #[inline]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    #[inline]
    pub fn regularization(&self) -> Regularization {
        self.regularization
    }

    #[inline]
    pub fn coef(&self) -> &Vector {
        &self.coef
    }

    /// `NaN` until the model has been fit.
    #[inline]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        !self.intercept.is_nan()
    }

    /// Re-initialize and train on labels in `{0, 1}`. The per-epoch readout is
    /// the mean binary cross-entropy.
    pub fn fit(&mut self, x: &Matrix, y: &Vector, cfg: &FitConfig) -> Result<FitReport> {
        let fit = ScalarTrainer {
            num_features: self.num_features(),
            fit_intercept: self.fit_intercept,
            regularization: self.regularization,
            seed: self.seed,
            link: Link::Logistic,
        }
        .fit(x, y, cfg)?;

        self.coef = fit.coef;
        self.intercept = fit.intercept;
        Ok(fit.report)
    }

    /// `P(y = 1 | x)` for every row.
    pub fn predict_proba(&self, x: &Matrix) -> Result<Vector> {
        let intercept =
            fitted_intercept(self.fit_intercept, self.intercept, "LogisticRegression")?;
        let mut z = decision_function(x, &self.coef, intercept)?;
        z.apply(sigmoid);
        Ok(z)
    }

    /// Class labels: `1.0` when the probability is at least the threshold.
    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let mut p = self.predict_proba(x)?;
        let threshold = self.threshold;
        p.apply(|v| if v >= threshold { 1.0 } else { 0.0 });
        Ok(p)
    }

    /// Accuracy of the predicted labels on `(x, y)`.
    pub fn score(&self, x: &Matrix, y: &Vector) -> Result<f64> {
        let pred = self.predict(x)?;
        accuracy(pred.as_slice(), y.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Matrix, Vector) {
        let x = Matrix::from_rows(&[
            vec![-2.0, -1.0],
            vec![-1.5, -2.0],
            vec![-1.0, -0.5],
            vec![1.0, 0.5],
            vec![1.5, 2.0],
            vec![2.0, 1.0],
        ])
        .unwrap();
        let y = Vector::from_slice(&[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]).unwrap();
        (x, y)
    }

    #[test]
    fn threshold_must_be_a_probability() {
        assert!(LogisticRegression::new(2, true, Regularization::None, 0, 1.5).is_err());
        assert!(LogisticRegression::new(2, true, Regularization::None, 0, -0.1).is_err());
        assert!(LogisticRegression::new(2, true, Regularization::None, 0, f64::NAN).is_err());
        assert!(LogisticRegression::new(2, true, Regularization::None, 0, 0.5).is_ok());
    }

    #[test]
    fn predict_before_fit_is_rejected() {
        let (x, _) = separable();
        let model = LogisticRegression::new(2, true, Regularization::None, 0, 0.5).unwrap();
        assert!(matches!(model.predict_proba(&x), Err(Error::NotFitted(_))));
    }

    #[test]
    fn learns_a_separable_problem() {
        let (x, y) = separable();
        let mut model =
            LogisticRegression::new(2, true, Regularization::L2 { lambda: 1e-3 }, 7, 0.5).unwrap();
        let report = model
            .fit(
                &x,
                &y,
                &FitConfig {
                    epochs: 500,
                    learning_rate: 0.1,
                    batch_size: 2,
                    print_every: 0,
                },
            )
            .unwrap();

        assert!(report.final_loss < report.loss_history[0]);
        assert_eq!(model.score(&x, &y).unwrap(), 1.0);

        let p = model.predict_proba(&x).unwrap();
        assert!(p.as_slice().iter().all(|&v| (0.0..=1.0).contains(&v)));
        assert!(p.as_slice()[0] < 0.5 && p.as_slice()[5] > 0.5);
    }

    #[test]
    fn extreme_thresholds() {
        let (x, y) = separable();
        let cfg = FitConfig {
            epochs: 10,
            learning_rate: 0.1,
            batch_size: 6,
            print_every: 0,
        };
        let mut always = LogisticRegression::new(2, true, Regularization::None, 1, 0.0).unwrap();
        always.fit(&x, &y, &cfg).unwrap();
        assert!(always.predict(&x).unwrap().as_slice().iter().all(|&v| v == 1.0));
    }
}

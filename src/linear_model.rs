//! Linear regression: closed-form ridge solve and mini-batch SGD.
//!
//! Both models start "unfit" (intercept `NaN`). The closed-form model starts
//! with zero coefficients; the SGD model redraws Xavier-range coefficients at
//! the start of every `fit`; `fit_from` starts from given weights instead.

use crate::metrics::r2_score;
use crate::train::{Link, ScalarTrainer, decision_function};
use crate::{Error, FitConfig, FitReport, Matrix, Regularization, Result, Vector};

/// Ordinary least squares / ridge regression via the normal equations.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegression {
    fit_intercept: bool,
    coef: Vector,
    intercept: f64,
    l2_lambda: f64,
}

impl LinearRegression {
    pub fn new(num_features: usize, fit_intercept: bool) -> Result<Self> {
        Ok(Self {
            fit_intercept,
            coef: Vector::new(num_features).map_err(|_| {
                Error::InvalidDimension("num_features must be > 0".to_owned())
            })?,
            intercept: f64::NAN,
            l2_lambda: f64::NAN,
        })
    }

    #[inline]
    pub fn num_features(&self) -> usize {
        self.coef.dim()
    }

    #[inline]
    pub fn fit_intercept(&self) -> bool {
        self.fit_intercept
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

    /// Ridge penalty used by the last successful fit (`NaN` before).
    #[inline]
    pub fn l2_lambda(&self) -> f64 {
        self.l2_lambda
    }

    #[inline]
    pub fn is_fitted(&self) -> bool {
        !self.intercept.is_nan()
    }

    /// Solve `(A^T A + lambda I') theta = A^T y`, where `A` is `X` with a
    /// leading column of ones when fitting an intercept and `I'` excludes the
    /// intercept entry.
    ///
    /// On any error (including [`Error::Singular`]) the model is left as it was.
    pub fn fit(&mut self, x: &Matrix, y: &Vector, l2_lambda: f64) -> Result<()> {
        if x.cols() != self.num_features() || x.rows() != y.dim() {
            return Err(Error::DimensionMismatch(format!(
                "X is {}x{} and y has {} values; model expects {} features",
                x.rows(),
                x.cols(),
                y.dim(),
                self.num_features()
            )));
        }
        if !(l2_lambda.is_finite() && l2_lambda >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "l2 lambda must be finite and >= 0, got {l2_lambda}"
            )));
        }

        let design = if self.fit_intercept {
            let mut ones = Matrix::new(x.rows(), 1)?;
            ones.apply_all(|_| 1.0);
            ones.concat(x)?
        } else {
            x.clone()
        };

        let mut gram = design.t_matmul(&design)?;
        let start = usize::from(self.fit_intercept);
        for i in start..gram.rows() {
            let d = gram.get(i, i)?;
            gram.set(i, i, d + l2_lambda)?;
        }
        let rhs = design.t_matmul(&Matrix::from_column(y))?;
        let theta = gram.inverse()?.matmul(&rhs)?.column(0)?;

        let theta = theta.as_slice();
        if self.fit_intercept {
            self.intercept = theta[0];
            self.coef = Vector::from_slice(&theta[1..])?;
        } else {
            self.intercept = 0.0;
            self.coef = Vector::from_slice(theta)?;
        }
        self.l2_lambda = l2_lambda;
        Ok(())
    }

    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let intercept = fitted_intercept(self.fit_intercept, self.intercept, "LinearRegression")?;
        decision_function(x, &self.coef, intercept)
    }

    /// R^2 of the predictions on `(x, y)`.
    pub fn score(&self, x: &Matrix, y: &Vector) -> Result<f64> {
        let pred = self.predict(x)?;
        r2_score(pred.as_slice(), y.as_slice())
    }
}

/// Linear regression trained by regularized mini-batch gradient descent.
#[derive(Debug, Clone, PartialEq)]
pub struct SgdRegression {
    fit_intercept: bool,
    regularization: Regularization,
    seed: i64,
    coef: Vector,
    intercept: f64,
}

impl SgdRegression {
    /// `seed < 0` draws a wall-clock seed at every `fit`.
    pub fn new(
        num_features: usize,
        fit_intercept: bool,
        regularization: Regularization,
        seed: i64,
    ) -> Result<Self> {
        regularization.validate()?;
        Ok(Self {
            fit_intercept,
            regularization,
            seed,
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

    /// Re-initialize and train. The per-epoch readout is the mean squared error.
    pub fn fit(&mut self, x: &Matrix, y: &Vector, cfg: &FitConfig) -> Result<FitReport> {
        let fit = ScalarTrainer {
            num_features: self.num_features(),
            fit_intercept: self.fit_intercept,
            regularization: self.regularization,
            seed: self.seed,
            link: Link::Identity,
        }
        .fit(x, y, cfg)?;

        self.coef = fit.coef;
        self.intercept = fit.intercept;
        Ok(fit.report)
    }

    /// Train starting from caller-supplied parameters.
    ///
    /// With `batch_size` equal to the number of samples this is plain
    /// full-batch gradient descent.
    pub fn fit_from(
        &mut self,
        x: &Matrix,
        y: &Vector,
        cfg: &FitConfig,
        init_coef: &Vector,
        init_intercept: f64,
    ) -> Result<FitReport> {
        let fit = ScalarTrainer {
            num_features: self.num_features(),
            fit_intercept: self.fit_intercept,
            regularization: self.regularization,
            seed: self.seed,
            link: Link::Identity,
        }
        .fit_from(x, y, cfg, init_coef, init_intercept)?;

        self.coef = fit.coef;
        self.intercept = fit.intercept;
        Ok(fit.report)
    }

    pub fn predict(&self, x: &Matrix) -> Result<Vector> {
        let intercept = fitted_intercept(self.fit_intercept, self.intercept, "SgdRegression")?;
        decision_function(x, &self.coef, intercept)
    }

    /// R^2 of the predictions on `(x, y)`.
    pub fn score(&self, x: &Matrix, y: &Vector) -> Result<f64> {
        let pred = self.predict(x)?;
        r2_score(pred.as_slice(), y.as_slice())
    }
}

/// The intercept to add at predict time, or `NotFitted` while it is still `NaN`.
pub(crate) fn fitted_intercept(
    fit_intercept: bool,
    intercept: f64,
    model: &str,
) -> Result<Option<f64>> {
    if !fit_intercept {
        return Ok(None);
    }
    if intercept.is_nan() {
        return Err(Error::NotFitted(format!("{model} must be fit before predict")));
    }
    Ok(Some(intercept))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_data() -> (Matrix, Vector) {
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        let y = Vector::from_slice(&[2.0, 4.0, 6.0]).unwrap();
        (x, y)
    }

    #[test]
    fn new_model_is_unfit_with_zero_coefficients() {
        let model = LinearRegression::new(3, true).unwrap();
        assert!(!model.is_fitted());
        assert!(model.intercept().is_nan());
        assert_eq!(model.coef().as_slice(), &[0.0, 0.0, 0.0]);
        assert!(matches!(
            LinearRegression::new(0, true),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn closed_form_recovers_line() {
        let (x, y) = line_data();
        let mut model = LinearRegression::new(1, true).unwrap();
        model.fit(&x, &y, 0.0).unwrap();
        assert!((model.coef().as_slice()[0] - 2.0).abs() < 1e-9);
        assert!(model.intercept().abs() < 1e-9);
        assert!((model.score(&x, &y).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ridge_shrinks_slope_but_not_intercept() {
        let (x, y) = line_data();
        let mut model = LinearRegression::new(1, true).unwrap();
        model.fit(&x, &y, 10.0).unwrap();
        let slope = model.coef().as_slice()[0];
        assert!(slope > 0.0 && slope < 2.0);
        // Intercept absorbs the mean the shrunken slope no longer explains.
        assert!(model.intercept() > 0.0);
        assert_eq!(model.l2_lambda(), 10.0);
    }

    #[test]
    fn singular_fit_leaves_model_untouched() {
        // Two identical columns make X^T X singular.
        let x = Matrix::from_rows(&[vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]]).unwrap();
        let y = Vector::from_slice(&[1.0, 2.0, 3.0]).unwrap();
        let mut model = LinearRegression::new(2, false).unwrap();
        let before = model.clone();
        assert!(matches!(
            model.fit(&x, &y, 0.0),
            Err(Error::Singular { .. })
        ));
        assert_eq!(model.coef(), before.coef());
        assert!(model.intercept().is_nan());
    }

    #[test]
    fn predict_requires_fit_when_intercept_is_enabled() {
        let (x, _) = line_data();
        let model = LinearRegression::new(1, true).unwrap();
        assert!(matches!(model.predict(&x), Err(Error::NotFitted(_))));

        let no_intercept = LinearRegression::new(1, false).unwrap();
        assert_eq!(no_intercept.predict(&x).unwrap().as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn fit_rejects_shape_mismatch() {
        let (x, _) = line_data();
        let y = Vector::from_slice(&[1.0, 2.0]).unwrap();
        let mut model = LinearRegression::new(1, true).unwrap();
        assert!(matches!(
            model.fit(&x, &y, 0.0),
            Err(Error::DimensionMismatch(_))
        ));
        assert!(!model.is_fitted());
    }

    #[test]
    fn sgd_regression_rejects_invalid_config_without_mutation() {
        let (x, y) = line_data();
        let mut model = SgdRegression::new(1, true, Regularization::None, 0).unwrap();
        let cfg = FitConfig {
            batch_size: 4,
            ..FitConfig::default()
        };
        assert!(matches!(
            model.fit(&x, &y, &cfg),
            Err(Error::InvalidParameter(_))
        ));
        assert!(!model.is_fitted());
        assert_eq!(model.coef().as_slice(), &[0.0]);
    }

    #[test]
    fn sgd_regression_rejects_invalid_penalty() {
        assert!(SgdRegression::new(1, true, Regularization::L1 { lambda: -1.0 }, 0).is_err());
    }

    #[test]
    fn sgd_regression_fits_a_line() {
        let (x, y) = line_data();
        let mut model = SgdRegression::new(1, true, Regularization::None, 42).unwrap();
        let report = model
            .fit(
                &x,
                &y,
                &FitConfig {
                    epochs: 2000,
                    learning_rate: 0.05,
                    batch_size: 3,
                    print_every: 0,
                },
            )
            .unwrap();
        assert!(report.final_loss < 1e-6);
        assert!((model.coef().as_slice()[0] - 2.0).abs() < 1e-3);
        assert!(model.intercept().abs() < 1e-2);
    }

    #[test]
    fn full_batch_step_from_zero_weights() {
        let (x, y) = line_data();
        let cfg = FitConfig {
            epochs: 1,
            learning_rate: 0.1,
            batch_size: 3,
            print_every: 0,
        };
        let zeros = Vector::new(1).unwrap();

        let mut model = SgdRegression::new(1, true, Regularization::None, 3).unwrap();
        let report = model.fit_from(&x, &y, &cfg, &zeros, 0.0).unwrap();
        // grad_w = -(1*2 + 2*4 + 3*6) / 3, grad_b = -(2 + 4 + 6) / 3
        assert!((model.coef().as_slice()[0] - 0.1 * 28.0 / 3.0).abs() < 1e-12);
        assert!((model.intercept() - 0.4).abs() < 1e-12);
        assert!((report.final_loss - 56.0 / 3.0).abs() < 1e-12);

        let mut ridge =
            SgdRegression::new(1, true, Regularization::L2 { lambda: 0.5 }, 3).unwrap();
        let one = Vector::from_slice(&[1.0]).unwrap();
        ridge.fit_from(&x, &y, &cfg, &one, 0.0).unwrap();
        // pred = x, grad_w = -(1 + 4 + 9) / 3, penalty 0.5 * 1
        let expected = 1.0 - 0.1 * (-14.0 / 3.0 + 0.5);
        assert!((ridge.coef().as_slice()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn fit_from_rejects_bad_initial_parameters() {
        let (x, y) = line_data();
        let mut model = SgdRegression::new(1, true, Regularization::None, 0).unwrap();
        let cfg = FitConfig {
            batch_size: 3,
            ..FitConfig::default()
        };
        let two = Vector::new(2).unwrap();
        assert!(matches!(
            model.fit_from(&x, &y, &cfg, &two, 0.0),
            Err(Error::DimensionMismatch(_))
        ));
        let one = Vector::new(1).unwrap();
        assert!(matches!(
            model.fit_from(&x, &y, &cfg, &one, f64::NAN),
            Err(Error::InvalidParameter(_))
        ));
        assert!(!model.is_fitted());
    }
}

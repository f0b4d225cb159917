use crate::rng::xavier_limit;
use crate::{Activation, Error, Matrix, Pcg32, Regularization, Result, Vector};

/// Fully connected layer: `activation(X W + b)`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    name: String,
    /// Shape `(in_units, units)`.
    coef: Matrix,
    intercepts: Vector,
    activation: Activation,
    regularization: Regularization,
}

impl DenseLayer {
    /// Xavier-range uniform weights and zero intercepts.
    pub fn new_with_rng(
        name: impl Into<String>,
        in_units: usize,
        units: usize,
        activation: Activation,
        regularization: Regularization,
        rng: &mut Pcg32,
    ) -> Result<Self> {
        if in_units == 0 || units == 0 {
            return Err(Error::InvalidDimension(format!(
                "layer dims must be > 0, got {in_units}x{units}"
            )));
        }
        regularization.validate()?;

        let limit = xavier_limit(in_units, units);
        let mut coef = Matrix::new(in_units, units)?;
        coef.apply_all(|_| rng.symmetric(limit));

        Ok(Self {
            name: name.into(),
            coef,
            intercepts: Vector::new(units)?,
            activation,
            regularization,
        })
    }

    /// Assemble a layer from existing parameters.
    pub fn from_parts(
        name: impl Into<String>,
        coef: Matrix,
        intercepts: Vector,
        activation: Activation,
        regularization: Regularization,
    ) -> Result<Self> {
        if coef.cols() != intercepts.dim() {
            return Err(Error::DimensionMismatch(format!(
                "coef has {} columns but intercepts has {} values",
                coef.cols(),
                intercepts.dim()
            )));
        }
        regularization.validate()?;
        Ok(Self {
            name: name.into(),
            coef,
            intercepts,
            activation,
            regularization,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn in_units(&self) -> usize {
        self.coef.rows()
    }

    #[inline]
    pub fn units(&self) -> usize {
        self.coef.cols()
    }

    #[inline]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    #[inline]
    pub fn regularization(&self) -> Regularization {
        self.regularization
    }

    #[inline]
    pub fn coef(&self) -> &Matrix {
        &self.coef
    }

    #[inline]
    pub fn coef_mut(&mut self) -> &mut Matrix {
        &mut self.coef
    }

    #[inline]
    pub fn intercepts(&self) -> &Vector {
        &self.intercepts
    }

    #[inline]
    pub fn intercepts_mut(&mut self) -> &mut Vector {
        &mut self.intercepts
    }

    /// Trainable parameter count.
    #[inline]
    pub fn num_params(&self) -> usize {
        self.coef.size() + self.intercepts.dim()
    }

    /// Pre-activation `X W + b`.
    pub fn pre_activation(&self, input: &Matrix) -> Result<Matrix> {
        let mut z = input.matmul(&self.coef)?;
        z.add_row_broadcast(&self.intercepts)?;
        Ok(z)
    }

    /// Returns `(pre, post)` for a batch.
    pub fn forward(&self, input: &Matrix) -> Result<(Matrix, Matrix)> {
        let pre = self.pre_activation(input)?;
        let mut post = pre.clone();
        self.activation.activate(&mut post);
        Ok((pre, post))
    }
}

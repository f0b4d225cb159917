//! Network builder.
//!
//! `NetworkBuilder` declares a whole network up front (input size, loss, seed,
//! layers) and then creates a [`NeuralNetwork`] whose capacity is exactly the
//! number of declared layers.

use crate::{Activation, Error, Loss, NeuralNetwork, Regularization, Result};

#[derive(Debug, Clone, Copy)]
struct LayerSpec {
    units: usize,
    activation: Activation,
    regularization: Regularization,
}

#[derive(Debug, Clone)]
/// Builder for a `NeuralNetwork`.
///
/// Example:
///
/// ```rust
/// use rust_ml::{Activation, Loss, NetworkBuilder};
///
/// # fn main() -> rust_ml::Result<()> {
/// let net = NetworkBuilder::new(2, Loss::BinaryCrossEntropy)?
///     .seed(0)
///     .add_layer(8, Activation::Tanh)?
///     .add_layer(1, Activation::Sigmoid)?
///     .build()?;
/// assert!(net.is_complete());
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    input_size: usize,
    loss: Loss,
    seed: i64,
    layers: Vec<LayerSpec>,
}

impl NetworkBuilder {
    /// Start building a network that accepts rows of width `input_size`.
    pub fn new(input_size: usize, loss: Loss) -> Result<Self> {
        if input_size == 0 {
            return Err(Error::InvalidDimension(
                "input_size must be > 0".to_owned(),
            ));
        }
        Ok(Self {
            input_size,
            loss,
            seed: 0,
            layers: Vec::new(),
        })
    }

    /// Weight-init seed; negative picks a wall-clock seed at `build`.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Add an unregularized dense layer.
    pub fn add_layer(self, units: usize, activation: Activation) -> Result<Self> {
        self.add_regularized_layer(units, activation, Regularization::None)
    }

    /// Add a dense layer whose weights are penalized by `regularization`.
    pub fn add_regularized_layer(
        mut self,
        units: usize,
        activation: Activation,
        regularization: Regularization,
    ) -> Result<Self> {
        if units == 0 {
            return Err(Error::InvalidDimension(
                "layer units must be > 0".to_owned(),
            ));
        }
        regularization.validate()?;

        self.layers.push(LayerSpec {
            units,
            activation,
            regularization,
        });
        Ok(self)
    }

    pub fn build(self) -> Result<NeuralNetwork> {
        if self.layers.is_empty() {
            return Err(Error::InvalidParameter(
                "network must have at least one layer".to_owned(),
            ));
        }

        let mut net = NeuralNetwork::new(self.input_size, self.layers.len(), self.loss, self.seed)?;
        for spec in self.layers {
            net.add_layer(spec.units, spec.activation, spec.regularization)?;
        }
        Ok(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_complete_network() {
        let net = NetworkBuilder::new(3, Loss::CategoricalCrossEntropy)
            .unwrap()
            .seed(4)
            .add_layer(5, Activation::ReLU)
            .unwrap()
            .add_regularized_layer(
                3,
                Activation::Softmax,
                Regularization::ElasticNet {
                    lambda: 0.01,
                    ratio: 0.5,
                },
            )
            .unwrap()
            .build()
            .unwrap();

        assert!(net.is_complete());
        assert_eq!(net.capacity(), 2);
        assert_eq!(net.output_size(), 3);
        assert_eq!(net.seed(), 4);
        assert_eq!(
            net.layer(1).unwrap().regularization().penalty(),
            crate::Penalty::ElasticNet
        );
    }

    #[test]
    fn matches_incremental_construction() {
        let built = NetworkBuilder::new(2, Loss::Mse)
            .unwrap()
            .seed(9)
            .add_layer(4, Activation::SiLU)
            .unwrap()
            .add_layer(1, Activation::Linear)
            .unwrap()
            .build()
            .unwrap();

        let mut manual = NeuralNetwork::new(2, 2, Loss::Mse, 9).unwrap();
        manual
            .add_layer(4, Activation::SiLU, Regularization::None)
            .unwrap();
        manual
            .add_layer(1, Activation::Linear, Regularization::None)
            .unwrap();

        assert_eq!(built.layers(), manual.layers());
    }

    #[test]
    fn rejects_invalid_declarations() {
        assert!(NetworkBuilder::new(0, Loss::Mse).is_err());
        let b = NetworkBuilder::new(2, Loss::Mse).unwrap();
        assert!(b.clone().add_layer(0, Activation::ReLU).is_err());
        assert!(
            b.clone()
                .add_regularized_layer(1, Activation::ReLU, Regularization::L2 { lambda: -1.0 })
                .is_err()
        );
        assert!(matches!(b.build(), Err(Error::InvalidParameter(_))));
    }
}

//! Model serialization/deserialization (feature: `serde`).
//!
//! This module defines a versioned, stable on-disk format for `NeuralNetwork`.
//!
//! Design notes:
//! - Internal `NeuralNetwork`/`DenseLayer` structs are not serialized directly;
//!   the `Serialized*` mirrors below are the file format.
//! - Deserialization validates dimensions, parameter lengths, penalty values,
//!   and that all parameters are finite.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    Activation, DenseLayer, Error, Loss, Matrix, NeuralNetwork, Regularization, Result, Vector,
};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNetwork {
    pub format_version: u32,
    pub input_size: usize,
    pub loss: SerializedLoss,
    pub seed: u64,
    pub layers: Vec<SerializedLayer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedLayer {
    pub name: String,
    pub in_units: usize,
    pub units: usize,
    pub activation: SerializedActivation,
    pub regularization: SerializedRegularization,
    /// Row-major (in_units, units).
    pub coef: Vec<f64>,
    pub intercepts: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializedActivation {
    Relu,
    LeakyRelu,
    Silu,
    Sigmoid,
    Tanh,
    Softmax,
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializedLoss {
    Mse,
    BinaryCrossEntropy,
    CategoricalCrossEntropy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerializedRegularization {
    None,
    L1 { lambda: f64 },
    L2 { lambda: f64 },
    ElasticNet { lambda: f64, ratio: f64 },
}

impl From<Activation> for SerializedActivation {
    fn from(value: Activation) -> Self {
        match value {
            Activation::ReLU => SerializedActivation::Relu,
            Activation::LeakyReLU => SerializedActivation::LeakyRelu,
            Activation::SiLU => SerializedActivation::Silu,
            Activation::Sigmoid => SerializedActivation::Sigmoid,
            Activation::Tanh => SerializedActivation::Tanh,
            Activation::Softmax => SerializedActivation::Softmax,
            Activation::Linear => SerializedActivation::Linear,
        }
    }
}

impl From<SerializedActivation> for Activation {
    fn from(value: SerializedActivation) -> Self {
        match value {
            SerializedActivation::Relu => Activation::ReLU,
            SerializedActivation::LeakyRelu => Activation::LeakyReLU,
            SerializedActivation::Silu => Activation::SiLU,
            SerializedActivation::Sigmoid => Activation::Sigmoid,
            SerializedActivation::Tanh => Activation::Tanh,
            SerializedActivation::Softmax => Activation::Softmax,
            SerializedActivation::Linear => Activation::Linear,
        }
    }
}

impl From<Loss> for SerializedLoss {
    fn from(value: Loss) -> Self {
        match value {
            Loss::Mse => SerializedLoss::Mse,
            Loss::BinaryCrossEntropy => SerializedLoss::BinaryCrossEntropy,
            Loss::CategoricalCrossEntropy => SerializedLoss::CategoricalCrossEntropy,
        }
    }
}

impl From<SerializedLoss> for Loss {
    fn from(value: SerializedLoss) -> Self {
        match value {
            SerializedLoss::Mse => Loss::Mse,
            SerializedLoss::BinaryCrossEntropy => Loss::BinaryCrossEntropy,
            SerializedLoss::CategoricalCrossEntropy => Loss::CategoricalCrossEntropy,
        }
    }
}

impl From<Regularization> for SerializedRegularization {
    fn from(value: Regularization) -> Self {
        match value {
            Regularization::None => SerializedRegularization::None,
            Regularization::L1 { lambda } => SerializedRegularization::L1 { lambda },
            Regularization::L2 { lambda } => SerializedRegularization::L2 { lambda },
            Regularization::ElasticNet { lambda, ratio } => {
                SerializedRegularization::ElasticNet { lambda, ratio }
            }
        }
    }
}

impl From<SerializedRegularization> for Regularization {
    fn from(value: SerializedRegularization) -> Self {
        match value {
            SerializedRegularization::None => Regularization::None,
            SerializedRegularization::L1 { lambda } => Regularization::L1 { lambda },
            SerializedRegularization::L2 { lambda } => Regularization::L2 { lambda },
            SerializedRegularization::ElasticNet { lambda, ratio } => {
                Regularization::ElasticNet { lambda, ratio }
            }
        }
    }
}

impl SerializedNetwork {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::Serialization(format!(
                "unsupported model format_version {}; expected {}",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if self.input_size == 0 {
            return Err(Error::Serialization("input_size must be > 0".to_owned()));
        }
        if self.layers.is_empty() {
            return Err(Error::Serialization(
                "serialized model must have at least one layer".to_owned(),
            ));
        }

        let mut prev_units = self.input_size;
        for (i, layer) in self.layers.iter().enumerate() {
            layer
                .validate()
                .map_err(|e| Error::Serialization(format!("layer {i} invalid: {e}")))?;
            if layer.in_units != prev_units {
                return Err(Error::Serialization(format!(
                    "layer {i} in_units {} does not match previous units {prev_units}",
                    layer.in_units
                )));
            }
            prev_units = layer.units;
        }

        Ok(())
    }
}

impl SerializedLayer {
    fn validate(&self) -> Result<()> {
        if self.in_units == 0 || self.units == 0 {
            return Err(Error::Serialization(format!(
                "layer dims must be > 0, got in_units={} units={}",
                self.in_units, self.units
            )));
        }

        let expected = self
            .in_units
            .checked_mul(self.units)
            .ok_or_else(|| Error::Serialization("layer weight shape overflow".to_owned()))?;
        if self.coef.len() != expected {
            return Err(Error::Serialization(format!(
                "coef length {} does not match in_units * units ({} * {})",
                self.coef.len(),
                self.in_units,
                self.units
            )));
        }
        if self.intercepts.len() != self.units {
            return Err(Error::Serialization(format!(
                "intercepts length {} does not match units {}",
                self.intercepts.len(),
                self.units
            )));
        }

        Regularization::from(self.regularization).validate()?;

        if self.coef.iter().any(|v| !v.is_finite()) {
            return Err(Error::Serialization(
                "coef must contain only finite values".to_owned(),
            ));
        }
        if self.intercepts.iter().any(|v| !v.is_finite()) {
            return Err(Error::Serialization(
                "intercepts must contain only finite values".to_owned(),
            ));
        }

        Ok(())
    }
}

impl From<&NeuralNetwork> for SerializedNetwork {
    fn from(model: &NeuralNetwork) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            input_size: model.input_size(),
            loss: model.loss().into(),
            seed: model.seed(),
            layers: model.layers().iter().map(SerializedLayer::from).collect(),
        }
    }
}

impl From<&DenseLayer> for SerializedLayer {
    fn from(layer: &DenseLayer) -> Self {
        Self {
            name: layer.name().to_owned(),
            in_units: layer.in_units(),
            units: layer.units(),
            activation: layer.activation().into(),
            regularization: layer.regularization().into(),
            coef: layer.coef().as_slice().to_vec(),
            intercepts: layer.intercepts().as_slice().to_vec(),
        }
    }
}

impl TryFrom<SerializedNetwork> for NeuralNetwork {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> std::result::Result<Self, Self::Error> {
        value.validate()?;

        let mut layers = Vec::with_capacity(value.layers.len());
        for layer in value.layers {
            let coef = Matrix::from_vec(layer.in_units, layer.units, layer.coef)?;
            let intercepts = Vector::from_vec(layer.intercepts)?;
            layers.push(DenseLayer::from_parts(
                layer.name,
                coef,
                intercepts,
                layer.activation.into(),
                layer.regularization.into(),
            )?);
        }

        NeuralNetwork::from_layers(value.input_size, layers, value.loss.into(), value.seed)
    }
}

impl NeuralNetwork {
    /// Serialize the model to a pretty-printed JSON string.
    ///
    /// Only complete networks can be serialized.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        self.check_complete()?;
        let ser = SerializedNetwork::from(self);
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::Serialization(format!("failed to serialize model: {e}")))
    }

    /// Serialize the model to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        self.check_complete()?;
        let ser = SerializedNetwork::from(self);
        serde_json::to_string(&ser)
            .map_err(|e| Error::Serialization(format!("failed to serialize model: {e}")))
    }

    /// Parse a model from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNetwork = serde_json::from_str(s)
            .map_err(|e| Error::Serialization(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    /// Save the model to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s)
            .map_err(|e| Error::Serialization(format!("failed to write {}: {e}", p.display())))?;
        Ok(())
    }

    /// Load a model from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::Serialization(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn golden_network() -> NeuralNetwork {
        let l1 = DenseLayer::from_parts(
            "dense_0",
            Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap(),
            Vector::from_slice(&[0.1, 0.2]).unwrap(),
            Activation::Tanh,
            Regularization::L2 { lambda: 0.5 },
        )
        .unwrap();
        let l2 = DenseLayer::from_parts(
            "dense_1",
            Matrix::from_vec(2, 1, vec![5.0, 6.0]).unwrap(),
            Vector::from_slice(&[0.3]).unwrap(),
            Activation::Linear,
            Regularization::None,
        )
        .unwrap();
        NeuralNetwork::from_layers(2, vec![l1, l2], Loss::Mse, 7).unwrap()
    }

    #[test]
    fn golden_json_is_stable_and_roundtrips() {
        let net = golden_network();
        let json = net.to_json_string_pretty().unwrap();

        let golden = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/golden/network_v1.json"
        ))
        .trim_end();
        assert_eq!(json, golden);

        let loaded = NeuralNetwork::from_json_str(golden).unwrap();
        assert_eq!(loaded.layers(), net.layers());
        assert_eq!(loaded.seed(), 7);
        assert_eq!(loaded.loss(), Loss::Mse);
        assert!(loaded.is_complete());
    }

    #[test]
    fn loaded_model_predicts_like_the_original() {
        let net = golden_network();
        let loaded = NeuralNetwork::from_json_str(&net.to_json_string().unwrap()).unwrap();
        let x = Matrix::from_rows(&[vec![0.5, -0.25], vec![1.0, 2.0]]).unwrap();
        assert_eq!(loaded.predict(&x).unwrap(), net.predict(&x).unwrap());
    }

    #[test]
    fn rejects_unknown_version() {
        let bad = r#"{"format_version":999,"input_size":1,"loss":"mse","seed":0,"layers":[]}"#;
        let err = NeuralNetwork::from_json_str(bad).unwrap_err();
        assert!(format!("{err}").contains("format_version"));
    }

    #[test]
    fn rejects_mismatched_parameter_lengths() {
        let mut ser = SerializedNetwork::from(&golden_network());
        ser.layers[1].coef.pop();
        assert!(matches!(
            NeuralNetwork::try_from(ser),
            Err(Error::Serialization(_))
        ));

        let mut ser = SerializedNetwork::from(&golden_network());
        ser.layers[0].regularization = SerializedRegularization::L1 { lambda: -1.0 };
        assert!(NeuralNetwork::try_from(ser).is_err());
    }

    #[test]
    fn incomplete_network_is_not_serialized() {
        let mut net = NeuralNetwork::new(2, 2, Loss::Mse, 0).unwrap();
        assert!(matches!(
            net.to_json_string(),
            Err(Error::InvalidParameter(_))
        ));
        net.add_layer(3, Activation::ReLU, Regularization::None)
            .unwrap();
        assert!(matches!(
            net.to_json_string_pretty(),
            Err(Error::InvalidParameter(_))
        ));

        let path = std::env::temp_dir().join(format!(
            "rust_ml_incomplete_{}.json",
            std::process::id()
        ));
        assert!(matches!(
            net.save_json(&path),
            Err(Error::InvalidParameter(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn save_and_load_file() {
        let net = golden_network();
        let path = std::env::temp_dir().join(format!("rust_ml_net_{}.json", std::process::id()));
        net.save_json(&path).unwrap();
        let loaded = NeuralNetwork::load_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.layers(), net.layers());
    }
}

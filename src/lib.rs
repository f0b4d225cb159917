//! A small dense linear-algebra kernel and the gradient trainers built on it.
//!
//! `rust-ml` is a from-scratch, single-threaded implementation of:
//!
//! - a row-major [`Matrix`] / [`Vector`] kernel (products, Gauss-Jordan inverse,
//!   slicing, reductions),
//! - closed-form and gradient-descent linear models ([`LinearRegression`],
//!   [`SgdRegression`], [`LogisticRegression`]),
//! - a feed-forward [`NeuralNetwork`] trained with mini-batch backprop.
//!
//! Every trainer routes its weight updates through the same
//! [`regularization::gradient_step`], so the four penalties behave identically
//! everywhere.
//!
//! # Errors and soft failures
//!
//! Every fallible operation returns [`Result`] and leaves its receiver untouched
//! on `Err`. Element-wise division by exactly zero is not an error: the element
//! becomes `0.0` and a `tracing` warning is emitted.
//!
//! # Logging
//!
//! The crate logs through [`tracing`] and installs no subscriber. Loss readouts
//! (see [`FitConfig::print_every`]) are `info` events.
//!
//! # Determinism
//!
//! Each model owns its own [`Pcg32`] generator. A non-negative seed makes
//! initialization and shuffling fully reproducible; a negative seed picks one
//! from the wall clock.
//!
//! # Quick start
//!
//! ```rust
//! use rust_ml::{Activation, FitConfig, Loss, Matrix, NetworkBuilder};
//!
//! # fn main() -> rust_ml::Result<()> {
//! let x = Matrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ])?;
//! let y = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![1.0], vec![0.0]])?;
//!
//! let mut net = NetworkBuilder::new(2, Loss::BinaryCrossEntropy)?
//!     .seed(0)
//!     .add_layer(8, Activation::Tanh)?
//!     .add_layer(1, Activation::Sigmoid)?
//!     .build()?;
//!
//! let report = net.fit(
//!     &x,
//!     &y,
//!     &FitConfig {
//!         epochs: 50,
//!         learning_rate: 0.5,
//!         batch_size: 4,
//!         print_every: 0,
//!     },
//! )?;
//! assert_eq!(report.loss_history.len(), 50);
//! let _probabilities = net.predict(&x)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Linear models
//!
//! ```rust
//! use rust_ml::{LinearRegression, Matrix, Vector};
//!
//! # fn main() -> rust_ml::Result<()> {
//! let x = Matrix::from_rows(&[vec![1.0], vec![2.0], vec![3.0]])?;
//! let y = Vector::from_slice(&[2.0, 4.0, 6.0])?;
//!
//! let mut model = LinearRegression::new(1, true)?;
//! model.fit(&x, &y, 0.0)?;
//! assert!((model.coef().get(0)? - 2.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod builder;
pub mod error;
pub mod layer;
pub mod linear_model;
pub mod logistic;
pub mod loss;
pub(crate) mod matmul;
pub mod matrix;
pub mod metrics;
pub mod network;
pub mod optim;
pub mod regularization;
pub mod rng;
pub mod train;
pub mod vector;

#[cfg(feature = "serde")]
pub mod serde_model;

pub use activation::Activation;
pub use builder::NetworkBuilder;
pub use error::{Error, Result};
pub use layer::DenseLayer;
pub use linear_model::{LinearRegression, SgdRegression};
pub use logistic::LogisticRegression;
pub use loss::Loss;
pub use matrix::{Axis, Matrix};
pub use metrics::Metric;
pub use network::NeuralNetwork;
pub use optim::Sgd;
pub use regularization::{Penalty, Regularization};
pub use rng::Pcg32;
pub use train::{FitConfig, FitReport};
pub use vector::{ArithOp, Vector};

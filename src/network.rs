//! Feed-forward network: a capacity-bounded stack of [`DenseLayer`]s.
//!
//! A network is declared with a fixed layer capacity and filled with
//! [`NeuralNetwork::add_layer`]. Once full it can be trained and queried; the
//! layer count never changes again, only the weights do.
//!
//! Training is mini-batch backprop. Per batch the forward pass caches every
//! layer's pre-activation and post-activation, all deltas are computed against
//! the pre-update weights, and then every layer takes one SGD step. Those
//! caches live only for the duration of the batch.

use std::fmt;

use crate::rng::resolve_seed;
use crate::train::shuffled_batches;
use crate::{
    Activation, ArithOp, DenseLayer, Error, FitConfig, FitReport, Loss, Matrix, Pcg32,
    Regularization, Result, Sgd,
};

#[derive(Debug, Clone)]
pub struct NeuralNetwork {
    input_size: usize,
    capacity: usize,
    layers: Vec<DenseLayer>,
    loss: Loss,
    seed: u64,
    /// Draws layer weights as layers are appended.
    init_rng: Pcg32,
}

impl NeuralNetwork {
    /// Empty network for inputs of width `input_size` holding `num_layers` layers.
    ///
    /// `seed < 0` picks a wall-clock seed once, here.
    pub fn new(input_size: usize, num_layers: usize, loss: Loss, seed: i64) -> Result<Self> {
        if input_size == 0 {
            return Err(Error::InvalidDimension(
                "input_size must be > 0".to_owned(),
            ));
        }
        if num_layers == 0 {
            return Err(Error::InvalidParameter(
                "num_layers must be > 0".to_owned(),
            ));
        }
        let seed = resolve_seed(seed);
        Ok(Self {
            input_size,
            capacity: num_layers,
            layers: Vec::with_capacity(num_layers),
            loss,
            seed,
            init_rng: Pcg32::new(seed),
        })
    }

    /// Complete network from already-built layers (used when loading models).
    pub fn from_layers(
        input_size: usize,
        layers: Vec<DenseLayer>,
        loss: Loss,
        seed: u64,
    ) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::InvalidParameter(
                "network must have at least one layer".to_owned(),
            ));
        }
        let mut in_units = input_size;
        for (idx, layer) in layers.iter().enumerate() {
            if layer.in_units() != in_units {
                return Err(Error::DimensionMismatch(format!(
                    "layer {idx} expects {} inputs, previous layer provides {in_units}",
                    layer.in_units()
                )));
            }
            in_units = layer.units();
        }

        Ok(Self {
            input_size,
            capacity: layers.len(),
            layers,
            loss,
            seed,
            init_rng: Pcg32::new(seed),
        })
    }

    #[inline]
    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Declared number of layers.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Layers added so far.
    #[inline]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.layers.len() == self.capacity
    }

    #[inline]
    pub fn loss(&self) -> Loss {
        self.loss
    }

    /// Resolved (non-negative) seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Width of the last layer added, or the input size while empty.
    #[inline]
    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(self.input_size, DenseLayer::units)
    }

    #[inline]
    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    #[inline]
    pub fn layer(&self, idx: usize) -> Option<&DenseLayer> {
        self.layers.get(idx)
    }

    #[inline]
    pub fn layer_mut(&mut self, idx: usize) -> Option<&mut DenseLayer> {
        self.layers.get_mut(idx)
    }

    pub fn num_params(&self) -> usize {
        self.layers.iter().map(DenseLayer::num_params).sum()
    }

    /// Append a layer fed by the previous one (or the input).
    ///
    /// Fails without changing the network if `units == 0` or the network is
    /// already full.
    pub fn add_layer(
        &mut self,
        units: usize,
        activation: Activation,
        regularization: Regularization,
    ) -> Result<()> {
        if self.is_complete() {
            tracing::warn!(
                capacity = self.capacity,
                "network is full, layer not added"
            );
            return Err(Error::InvalidParameter(format!(
                "network already holds its {} layers",
                self.capacity
            )));
        }
        if units == 0 {
            return Err(Error::InvalidDimension(
                "layer units must be > 0".to_owned(),
            ));
        }
        regularization.validate()?;

        let name = format!("dense_{}", self.layers.len());
        let mut rng = self.init_rng.clone();
        let layer = DenseLayer::new_with_rng(
            name,
            self.output_size(),
            units,
            activation,
            regularization,
            &mut rng,
        )?;
        self.init_rng = rng;
        self.layers.push(layer);
        Ok(())
    }

    /// Forward pass over a batch of rows.
    pub fn predict(&self, x: &Matrix) -> Result<Matrix> {
        self.check_complete()?;
        self.check_input(x)?;

        let mut out = x.clone();
        for layer in &self.layers {
            out = layer.forward(&out)?.1;
        }
        Ok(out)
    }

    /// Mean per-row loss of the predictions on `(x, y)`.
    pub fn evaluate(&self, x: &Matrix, y: &Matrix) -> Result<f64> {
        let pred = self.predict(x)?;
        Ok(self.loss.batch_loss(&pred, y)? / x.rows() as f64)
    }

    /// Train with mini-batch backprop.
    ///
    /// Shapes and config are validated before anything is touched. The
    /// shuffle order is drawn from a generator seeded with [`Self::seed`], so
    /// repeated calls on equal networks train identically.
    pub fn fit(&mut self, x: &Matrix, y: &Matrix, cfg: &FitConfig) -> Result<FitReport> {
        self.check_complete()?;
        self.check_input(x)?;
        if y.rows() != x.rows() || y.cols() != self.output_size() {
            return Err(Error::DimensionMismatch(format!(
                "y is {}x{}, expected {}x{}",
                y.rows(),
                y.cols(),
                x.rows(),
                self.output_size()
            )));
        }
        cfg.validate(x.rows())?;
        let opt = Sgd::new(cfg.learning_rate)?;

        tracing::debug!(
            samples = x.rows(),
            batch_size = cfg.batch_size,
            epochs = cfg.epochs,
            seed = self.seed,
            loss = %self.loss,
            "fit start"
        );

        let mut rng = Pcg32::new(self.seed);
        let mut loss_history = Vec::with_capacity(cfg.epochs);

        for epoch in 0..cfg.epochs {
            let mut epoch_loss = 0.0;
            for batch in shuffled_batches(&mut rng, x.rows(), cfg.batch_size) {
                let xb = x.select_rows(&batch)?;
                let yb = y.select_rows(&batch)?;
                epoch_loss += self.train_batch(&xb, &yb, &opt)?;
            }

            let mean_loss = epoch_loss / x.rows() as f64;
            if cfg.should_report(epoch) {
                tracing::info!(epoch = epoch + 1, loss = mean_loss, "epoch");
            }
            loss_history.push(mean_loss);
        }

        Ok(FitReport {
            final_loss: loss_history.last().copied().unwrap_or(f64::NAN),
            loss_history,
        })
    }

    /// One forward/backward/update step. Returns the summed row loss of the batch.
    fn train_batch(&mut self, xb: &Matrix, yb: &Matrix, opt: &Sgd) -> Result<f64> {
        let depth = self.layers.len();
        let mut pre = Vec::with_capacity(depth);
        let mut post = Vec::with_capacity(depth + 1);
        post.push(xb.clone());
        for (l, layer) in self.layers.iter().enumerate() {
            let (z, a) = layer.forward(&post[l])?;
            pre.push(z);
            post.push(a);
        }

        let batch_loss = self.loss.batch_loss(&post[depth], yb)?;

        let last = depth - 1;
        let mut deltas = Vec::with_capacity(depth);
        deltas.push(self.loss.output_delta(
            &post[depth],
            yb,
            &pre[last],
            self.layers[last].activation(),
        )?);
        for l in (0..last).rev() {
            let upstream = deltas
                .last()
                .ok_or_else(|| Error::InvalidParameter("empty delta stack".to_owned()))?
                .matmul_t(self.layers[l + 1].coef())?;
            let local = self.layers[l].activation().derivative_at(&pre[l]);
            deltas.push(upstream.arithmetic(&local, ArithOp::Mul)?);
        }
        deltas.reverse();

        let bs = xb.rows() as f64;
        for (l, layer) in self.layers.iter_mut().enumerate() {
            let mut grad_w = post[l].t_matmul(&deltas[l])?;
            grad_w.scalar_arithmetic(bs, ArithOp::Div);
            let grad_b = deltas[l].column_means();

            let reg = layer.regularization();
            opt.step_weights(layer.coef_mut().as_mut_slice(), grad_w.as_slice(), reg);
            opt.step_biases(layer.intercepts_mut().as_mut_slice(), grad_b.as_slice());
        }

        Ok(batch_loss)
    }

    pub(crate) fn check_complete(&self) -> Result<()> {
        if !self.is_complete() {
            return Err(Error::InvalidParameter(format!(
                "network has {} of {} layers",
                self.layers.len(),
                self.capacity
            )));
        }
        Ok(())
    }

    fn check_input(&self, x: &Matrix) -> Result<()> {
        if x.cols() != self.input_size {
            return Err(Error::DimensionMismatch(format!(
                "X has {} columns, network expects {}",
                x.cols(),
                self.input_size
            )));
        }
        Ok(())
    }
}

impl fmt::Display for NeuralNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "NeuralNetwork(input_size={}, layers={}/{}, loss={}, seed={})",
            self.input_size,
            self.layers.len(),
            self.capacity,
            self.loss,
            self.seed
        )?;
        for layer in &self.layers {
            writeln!(
                f,
                "  {:<10} {:>4} -> {:<4} {:<10} params={}",
                layer.name(),
                layer.in_units(),
                layer.units(),
                layer.activation().to_string(),
                layer.num_params()
            )?;
        }
        write!(f, "  total params={}", self.num_params())
    }
}

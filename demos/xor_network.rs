use tracing_subscriber::EnvFilter;

use rust_ml::{Activation, FitConfig, Loss, Matrix, NetworkBuilder};

fn main() -> rust_ml::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Classic XOR dataset.
    let x = Matrix::from_rows(&[
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ])?;
    let y = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![1.0], vec![0.0]])?;

    // 2 -> 16 -> 1 network, tanh hidden layer, sigmoid output.
    let mut net = NetworkBuilder::new(2, Loss::BinaryCrossEntropy)?
        .seed(0)
        .add_layer(16, Activation::Tanh)?
        .add_layer(1, Activation::Sigmoid)?
        .build()?;
    println!("{net}");

    let report = net.fit(
        &x,
        &y,
        &FitConfig {
            epochs: 5_000,
            learning_rate: 0.5,
            batch_size: 4,
            print_every: 500,
        },
    )?;
    println!("final_loss={}", report.final_loss);

    let pred = net.predict(&x)?;
    for i in 0..x.rows() {
        println!("x={:?} p={:.4}", x.row_view(i)?, pred.get(i, 0)?);
    }

    Ok(())
}

use tracing_subscriber::EnvFilter;

use rust_ml::metrics::argmax_accuracy;
use rust_ml::{Activation, FitConfig, Loss, Matrix, NetworkBuilder, Pcg32, Regularization};

fn main() -> rust_ml::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Tiny synthetic 3-class dataset: uniform noise around three centers.
    let mut rng = Pcg32::new(0);
    let centers = [[-1.0, -1.0], [1.0, -1.0], [0.0, 1.0]];
    let n_per_class = 128;
    let mut xs = Vec::with_capacity(3 * n_per_class);
    let mut ys = Vec::with_capacity(3 * n_per_class);
    for (class, center) in centers.iter().enumerate() {
        for _ in 0..n_per_class {
            xs.push(vec![
                center[0] + rng.symmetric(0.3),
                center[1] + rng.symmetric(0.3),
            ]);
            let mut one_hot = vec![0.0; 3];
            one_hot[class] = 1.0;
            ys.push(one_hot);
        }
    }
    let x = Matrix::from_rows(&xs)?;
    let y = Matrix::from_rows(&ys)?;

    // Softmax output pairs with categorical cross-entropy: the output delta is `p - y`.
    let mut net = NetworkBuilder::new(2, Loss::CategoricalCrossEntropy)?
        .seed(0)
        .add_regularized_layer(16, Activation::ReLU, Regularization::L2 { lambda: 1e-4 })?
        .add_layer(3, Activation::Softmax)?
        .build()?;

    let report = net.fit(
        &x,
        &y,
        &FitConfig {
            epochs: 200,
            learning_rate: 0.05,
            batch_size: 32,
            print_every: 20,
        },
    )?;

    let pred = net.predict(&x)?;
    println!(
        "final_loss={} accuracy={}",
        report.final_loss,
        argmax_accuracy(&pred, &y)?
    );
    println!("evaluate: loss={}", net.evaluate(&x, &y)?);

    Ok(())
}

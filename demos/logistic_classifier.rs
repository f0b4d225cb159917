use tracing_subscriber::EnvFilter;

use rust_ml::{FitConfig, LogisticRegression, Matrix, Pcg32, Regularization, Vector};

fn main() -> rust_ml::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Two noisy blobs in 2D, labelled 0 and 1.
    let mut rng = Pcg32::new(0);
    let n_per_class = 64;
    let mut rows = Vec::with_capacity(2 * n_per_class);
    let mut labels = Vec::with_capacity(2 * n_per_class);
    for (label, center) in [(0.0, [-1.0, -1.0]), (1.0, [1.0, 1.0])] {
        for _ in 0..n_per_class {
            rows.push(vec![
                center[0] + rng.symmetric(0.5),
                center[1] + rng.symmetric(0.5),
            ]);
            labels.push(label);
        }
    }
    let x = Matrix::from_rows(&rows)?;
    let y = Vector::from_vec(labels)?;

    let mut model = LogisticRegression::new(
        2,
        true,
        Regularization::ElasticNet {
            lambda: 1e-3,
            ratio: 0.5,
        },
        0,
        0.5,
    )?;
    let report = model.fit(
        &x,
        &y,
        &FitConfig {
            epochs: 200,
            learning_rate: 0.1,
            batch_size: 16,
            print_every: 50,
        },
    )?;

    println!(
        "final_loss={} coef={:?} intercept={}",
        report.final_loss,
        model.coef().as_slice(),
        model.intercept()
    );
    println!("train accuracy={}", model.score(&x, &y)?);

    Ok(())
}

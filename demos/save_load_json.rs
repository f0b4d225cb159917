#[cfg(not(feature = "serde"))]
fn main() {
    println!("enable the `serde` feature: cargo run --example save_load_json --features serde");
}

#[cfg(feature = "serde")]
fn main() -> rust_ml::Result<()> {
    use rust_ml::{Activation, FitConfig, Loss, Matrix, NetworkBuilder, NeuralNetwork};

    let x = Matrix::from_rows(&[
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ])?;
    let y = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![1.0], vec![0.0]])?;

    let mut net = NetworkBuilder::new(2, Loss::Mse)?
        .seed(0)
        .add_layer(8, Activation::Tanh)?
        .add_layer(1, Activation::Sigmoid)?
        .build()?;
    net.fit(
        &x,
        &y,
        &FitConfig {
            epochs: 500,
            learning_rate: 0.5,
            batch_size: 4,
            print_every: 0,
        },
    )?;

    let path = std::env::temp_dir().join("rust_ml_xor.json");
    net.save_json(&path)?;
    let loaded = NeuralNetwork::load_json(&path)?;

    let a = net.predict(&x)?;
    let b = loaded.predict(&x)?;
    println!("saved to {}", path.display());
    println!("original={:?}", a.as_slice());
    println!("loaded={:?}", b.as_slice());

    Ok(())
}

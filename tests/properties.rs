use proptest::prelude::*;

use rust_ml::activation::{sigmoid, softmax_in_place};
use rust_ml::regularization::gradient_step;
use rust_ml::{Matrix, Regularization};

fn matrix_strategy(max_dim: usize) -> impl Strategy<Value = Matrix> {
    (1..=max_dim, 1..=max_dim).prop_flat_map(|(r, c)| {
        prop::collection::vec(-100.0f64..100.0, r * c)
            .prop_map(move |data| Matrix::from_vec(r, c, data).unwrap())
    })
}

/// Square matrices whose diagonal dominates each row, hence invertible and
/// well conditioned.
fn dominant_square(max_dim: usize) -> impl Strategy<Value = Matrix> {
    (1..=max_dim).prop_flat_map(|n| {
        prop::collection::vec(-1.0f64..1.0, n * n).prop_map(move |data| {
            let mut m = Matrix::from_vec(n, n, data).unwrap();
            for i in 0..n {
                let d = m.get(i, i).unwrap();
                m.set(i, i, d + n as f64 + 1.0).unwrap();
            }
            m
        })
    })
}

proptest! {
    #[test]
    fn transpose_is_an_involution(m in matrix_strategy(6)) {
        let tt = m.transpose().transpose();
        prop_assert_eq!(tt, m);
    }

    #[test]
    fn transposed_products_agree(a in matrix_strategy(5), seed in 0u64..1000) {
        let mut rng = rust_ml::Pcg32::new(seed);
        let mut b = Matrix::new(a.rows(), 3).unwrap();
        b.apply_all(|_| rng.symmetric(2.0));

        let fast = a.t_matmul(&b).unwrap();
        let slow = a.transpose().matmul(&b).unwrap();
        for (x, y) in fast.as_slice().iter().zip(slow.as_slice()) {
            prop_assert!((x - y).abs() < 1e-9);
        }
    }

    #[test]
    fn inverse_round_trips(a in dominant_square(6)) {
        let inv = a.inverse().unwrap();
        let id = a.matmul(&inv).unwrap();
        let n = a.rows();
        for i in 0..n {
            for j in 0..n {
                let expected = if i == j { 1.0 } else { 0.0 };
                prop_assert!((id.get(i, j).unwrap() - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn unregularized_step_is_plain_descent(
        w in -10.0f64..10.0,
        g in -10.0f64..10.0,
        alpha in 0.0f64..1.0,
    ) {
        let stepped = gradient_step(w, g, alpha, Regularization::None);
        prop_assert!((stepped - (w - alpha * g)).abs() < 1e-12);
    }

    #[test]
    fn l2_step_never_grows_a_weight_without_gradient(
        w in -10.0f64..10.0,
        lambda in 0.0f64..1.0,
        alpha in 0.0f64..1.0,
    ) {
        let stepped = gradient_step(w, 0.0, alpha, Regularization::L2 { lambda });
        prop_assert!(stepped.abs() <= w.abs());
    }

    #[test]
    fn softmax_rows_are_distributions(row in prop::collection::vec(-500.0f64..500.0, 1..8)) {
        let mut row = row;
        softmax_in_place(&mut row);
        prop_assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        prop_assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sigmoid_stays_in_unit_interval(x in -1e4f64..1e4) {
        let s = sigmoid(x);
        prop_assert!(s.is_finite());
        prop_assert!((0.0..=1.0).contains(&s));
    }
}

#[test]
fn softmax_survives_extreme_logits() {
    let mut row = [1000.0, 1000.0001, -1000.0];
    softmax_in_place(&mut row);
    assert!(row.iter().all(|p| p.is_finite() && *p >= 0.0));
    assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    assert!(row[1] > row[0]);
    assert_eq!(row[2], 0.0);
}

#[test]
fn sigmoid_saturates_without_overflow() {
    assert_eq!(sigmoid(0.0), 0.5);
    assert_eq!(sigmoid(1000.0), 1.0);
    assert_eq!(sigmoid(-1000.0), 0.0);
}

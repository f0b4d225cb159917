//! Naive strided matrix product used by every `Matrix` product.
//!
//! Plain dot-product accumulation in `p` order (no fused multiply-add, no
//! compensated summation) so results are reproducible bit-for-bit.
//! Strides let callers multiply by a transposed operand without copying it.

/// `c = a * b` where `a` is `(m, k)` and `b` is `(k, n)`, both addressed by
/// row/column strides. `c` is row-major `(m, n)` and fully overwritten.
#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f64(
    m: usize,
    n: usize,
    k: usize,
    a: &[f64],
    rsa: usize,
    csa: usize,
    b: &[f64],
    rsb: usize,
    csb: usize,
    c: &mut [f64],
) {
    debug_assert_eq!(c.len(), m * n);

    for i in 0..m {
        let a0 = i * rsa;
        for j in 0..n {
            let b0 = j * csb;
            let mut acc = 0.0_f64;
            for p in 0..k {
                acc += a[a0 + p * csa] * b[p * rsb + b0];
            }
            c[i * n + j] = acc;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_row_major_product() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [0.0; 4];
        gemm_f64(2, 2, 2, &a, 2, 1, &b, 2, 1, &mut c);
        assert_eq!(c, [19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn transposed_operand_via_strides() {
        // a is stored (2, 3); multiply a^T (3, 2) by b (2, 1).
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [1.0, 1.0];
        let mut c = [0.0; 3];
        gemm_f64(3, 1, 2, &a, 1, 3, &b, 1, 1, &mut c);
        assert_eq!(c, [5.0, 7.0, 9.0]);
    }
}

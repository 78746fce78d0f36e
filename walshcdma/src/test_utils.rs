//! Tensor assertions for tests
//!
//! Comparisons run as tensor ops and only the final max is read back.

use burn::tensor::{backend::Backend, ElementConversion, Tensor};

/// Assert two tensors are approximately equal
pub fn assert_approx_eq_tensor<B: Backend, const D: usize>(
    a: &Tensor<B, D>,
    b: &Tensor<B, D>,
    epsilon: f32,
    msg: &str,
) {
    assert_eq!(a.dims(), b.dims(), "{}: shape mismatch", msg);

    let max_diff: f32 = (a.clone() - b.clone()).abs().max().into_scalar().elem();

    assert!(
        max_diff <= epsilon,
        "{}: max difference {:.6} > epsilon {:.6}",
        msg,
        max_diff,
        epsilon
    );
}

/// Assert tensor approximately equals a constant value
pub fn assert_approx_eq_scalar<B: Backend, const D: usize>(
    tensor: &Tensor<B, D>,
    expected: f32,
    epsilon: f32,
    msg: &str,
) {
    let expected_tensor = tensor.ones_like() * expected;
    assert_approx_eq_tensor(tensor, &expected_tensor, epsilon, msg);
}

/// Assert every entry is exactly +1 or -1
pub fn assert_bipolar<B: Backend, const D: usize>(tensor: &Tensor<B, D>, msg: &str) {
    // |x| - 1 is zero only for +/-1
    let max_dev: f32 = (tensor.clone().abs() - 1.0).abs().max().into_scalar().elem();

    assert!(max_dev == 0.0, "{}: entries are not all +/-1 (max deviation {})", msg, max_dev);
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_assertions_pass() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 1>::from_floats([1.0, -1.0, 1.0], &device);
        let b = Tensor::<TestBackend, 1>::from_floats([1.0, -1.0, 1.0005], &device);

        assert_approx_eq_tensor(&a, &b, 1e-3, "close");
        assert_bipolar(&a, "bipolar");
        assert_approx_eq_scalar(&a.clone().abs(), 1.0, 0.0, "unit magnitude");
    }

    #[test]
    #[should_panic]
    fn test_bipolar_rejects_zero() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 1>::from_floats([1.0, 0.0], &device);
        assert_bipolar(&a, "zero chip");
    }
}

// ============================================================
// Layer 5 — Tensor Ops
// ============================================================
// Small numeric building blocks burn doesn't ship directly:
//
//   l2_normalize                 x / sqrt(max(Σx², ε)) on the last axis
//   sigmoid_cross_entropy_with_logits
//                                max(x,0) − x·z + ln(1 + e^{−|x|})
//
// The cross-entropy form is the numerically stable rewrite of
// −z·ln σ(x) − (1−z)·ln(1−σ(x)); it never exponentiates a
// large positive number.

use burn::prelude::*;

/// Floor on the squared norm, matching the usual l2_normalize epsilon
pub const L2_NORM_EPSILON: f64 = 1e-12;

/// Scale every vector along the last axis to unit length.
pub fn l2_normalize<B: Backend, const D: usize>(x: Tensor<B, D>) -> Tensor<B, D> {
    let squared_norm = x.clone().powf_scalar(2.0).sum_dim(D - 1);
    x / squared_norm.clamp_min(L2_NORM_EPSILON).sqrt()
}

/// Element-wise sigmoid cross-entropy between `logits` and 0/1 `labels`.
/// Shapes must be broadcast-compatible; the result has the broadcast shape.
pub fn sigmoid_cross_entropy_with_logits<B: Backend, const D: usize>(
    labels: Tensor<B, D>,
    logits: Tensor<B, D>,
) -> Tensor<B, D> {
    let relu_logits = logits.clone().clamp_min(0.0);
    let log_term    = logits.clone().abs().neg().exp().log1p();
    relu_logits - logits * labels + log_term
}

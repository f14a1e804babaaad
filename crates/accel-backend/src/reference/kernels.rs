// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Software kernels for the reference accelerator.
//!
//! Weights for a fully-connected kernel are row-major `[out, in]`; each
//! output element is one dot product plus bias. The narrow-precision
//! variants model the accelerator's numerics: f16 passes operands
//! through half floats, int8 computes integer dot products and
//! dequantizes the accumulator.

use half::f16;

/// `out[o] = Σ_i weights[o, i] * input[i] + bias[o]` in f32.
pub(crate) fn fully_connected_f32(
    input: &[f32],
    weights: &[f32],
    bias: &[f32],
    out: &mut [f32],
) {
    let in_features = input.len();
    for (o, out_val) in out.iter_mut().enumerate() {
        let row = &weights[o * in_features..(o + 1) * in_features];
        let mut acc = 0.0f32;
        for (w, x) in row.iter().zip(input) {
            acc += w * x;
        }
        *out_val = acc + bias[o];
    }
}

/// Fully-connected with operands rounded through f16; accumulation in f32.
pub(crate) fn fully_connected_f16(
    input: &[f32],
    weights: &[f16],
    bias: &[f32],
    out: &mut [f32],
) {
    let in_features = input.len();
    for (o, out_val) in out.iter_mut().enumerate() {
        let row = &weights[o * in_features..(o + 1) * in_features];
        let mut acc = 0.0f32;
        for (w, x) in row.iter().zip(input) {
            acc += w.to_f32() * f16::from_f32(*x).to_f32();
        }
        *out_val = acc + bias[o];
    }
}

/// Quantized fully-connected: the input is quantized on the fly with
/// `input_scale`, the integer accumulator is dequantized by the product
/// of the two scales, and the bias is applied in f32.
pub(crate) fn fully_connected_i8(
    input: &[f32],
    weights: &[i8],
    bias: &[f32],
    input_scale: f32,
    weight_scale: f32,
    out: &mut [f32],
) {
    let in_features = input.len();
    let quantized_input = quantize_i8(input, input_scale);
    let dequant = 1.0 / (input_scale * weight_scale);

    for (o, out_val) in out.iter_mut().enumerate() {
        let row = &weights[o * in_features..(o + 1) * in_features];
        let mut acc = 0i32;
        for (w, x) in row.iter().zip(&quantized_input) {
            acc += (*w as i32) * (*x as i32);
        }
        *out_val = acc as f32 * dequant + bias[o];
    }
}

/// Elementwise `max(0, x)` in place.
pub(crate) fn relu(values: &mut [f32]) {
    for v in values.iter_mut() {
        *v = v.max(0.0);
    }
}

/// Numerically stable softmax in place.
pub(crate) fn softmax(values: &mut [f32]) {
    if values.is_empty() {
        return;
    }
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
}

/// Symmetric quantization: `q = round(x * scale)` saturated to ±127.
pub(crate) fn quantize_i8(values: &[f32], scale: f32) -> Vec<i8> {
    values
        .iter()
        .map(|&x| (x * scale).round().clamp(-127.0, 127.0) as i8)
        .collect()
}

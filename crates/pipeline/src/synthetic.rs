// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Synthetic template-matching model and digit images.
//!
//! Used by tests, the benchmark, and the CLI's demo fallback when no
//! model files are present. Each digit gets a distinct ink band in the
//! image, and the classifier's weight rows are exactly those templates
//! (normalized), so the correct class always receives the highest dot
//! product.

use crate::{DigitImage, DIGITS};
use graph_ir::{ComputationGraph, OpKind, TensorBinding, WeightTensor};
use tensor_core::{Dims3, Shape};

/// Generates the canonical image for a digit: a full-width ink band
/// whose vertical position encodes the digit.
pub fn digit_image(digit: usize, dims: Dims3) -> DigitImage {
    let (height, width) = (dims.height, dims.width);
    let mut pixels = vec![255u8; height * width]; // background
    let band = (height / DIGITS).max(1);
    let start = digit * band;
    for row in start..(start + band).min(height) {
        for col in 0..width {
            pixels[row * width + col] = 0; // ink
        }
    }
    DigitImage::new(pixels)
}

/// Builds a one-layer template classifier over the declared input.
///
/// The fully-connected weight row for class `d` is the normalized image
/// of digit `d`; a softmax turns the matched filter responses into
/// probability-like scores.
pub fn template_graph(input: TensorBinding, output_name: &str) -> ComputationGraph {
    let dims = input.dims;
    let volume = dims.volume();

    let mut weights = Vec::with_capacity(DIGITS * volume);
    for digit in 0..DIGITS {
        let image = digit_image(digit, dims);
        weights.extend(
            image
                .pixels
                .iter()
                .map(|&byte| 1.0 - f32::from(byte) / 255.0),
        );
    }

    let mut graph = ComputationGraph::new("digit-templates", input, output_name);
    graph.insert_weight(WeightTensor::new(
        "fc.weight",
        Shape::new(vec![DIGITS, volume]),
        weights,
    ));
    graph.insert_weight(WeightTensor::new(
        "fc.bias",
        Shape::vector(DIGITS),
        vec![0.0; DIGITS],
    ));

    let input_name = graph.input().name.clone();
    graph.push_op(
        OpKind::FullyConnected,
        "fc",
        input_name,
        "scores",
        vec!["fc.weight".into(), "fc.bias".into()],
    );
    graph.push_op(OpKind::Softmax, "prob", "scores", output_name, vec![]);
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensor_core::TensorOrder;

    #[test]
    fn test_digit_images_are_distinct() {
        let dims = Dims3::new(1, 28, 28);
        let zero = digit_image(0, dims);
        let nine = digit_image(9, dims);
        assert_eq!(zero.pixels.len(), 784);
        assert_ne!(zero.pixels, nine.pixels);
        // Each image has exactly one band of ink.
        let ink: usize = zero.pixels.iter().filter(|&&p| p == 0).count();
        assert_eq!(ink, 2 * 28);
    }

    #[test]
    fn test_template_graph_shape() {
        let input = TensorBinding::new("in", Dims3::new(1, 28, 28), TensorOrder::Nchw);
        let graph = template_graph(input, "out");
        assert_eq!(graph.num_ops(), 2);
        assert_eq!(
            graph.weight("fc.weight").unwrap().shape,
            Shape::new(vec![10, 784])
        );
        assert_eq!(graph.external_inputs(), vec!["in".to_string()]);
        assert_eq!(graph.output_name(), "out");
    }
}

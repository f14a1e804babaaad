// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors.
//!
//! Two shape types coexist deliberately:
//!
//! - [`Dims3`] for image-shaped activations, where the meaning of each
//!   dimension is fixed and the fields are named.
//! - [`Shape`] for weight tensors, where rank varies per tensor.

use crate::{DType, TensorError};
use std::fmt;

/// A rank-3 tensor shape with named fields.
///
/// Input bindings in this system are always channel × height × width.
/// Accessing the dimensions by name instead of by position removes an
/// entire class of indexing mistakes.
///
/// # Examples
/// ```
/// use tensor_core::Dims3;
/// let d = Dims3::new(1, 28, 28);
/// assert_eq!(d.volume(), 784);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dims3 {
    /// Number of channels (1 for grayscale).
    pub channels: usize,
    /// Image height in pixels.
    pub height: usize,
    /// Image width in pixels.
    pub width: usize,
}

impl Dims3 {
    /// Creates a new rank-3 shape.
    pub fn new(channels: usize, height: usize, width: usize) -> Self {
        Self {
            channels,
            height,
            width,
        }
    }

    /// Returns the total number of elements.
    pub fn volume(&self) -> usize {
        self.channels * self.height * self.width
    }

    /// Converts to a general [`Shape`] (`[c, h, w]`).
    pub fn to_shape(&self) -> Shape {
        Shape::new(vec![self.channels, self.height, self.width])
    }

    /// Converts a general shape back to named dimensions.
    ///
    /// Fails with [`TensorError::RankMismatch`] unless the shape is
    /// exactly rank 3.
    pub fn from_shape(shape: &Shape) -> Result<Self, TensorError> {
        match shape.dims() {
            &[channels, height, width] => Ok(Self {
                channels,
                height,
                width,
            }),
            dims => Err(TensorError::RankMismatch {
                expected: 3,
                got: dims.len(),
            }),
        }
    }
}

impl fmt::Display for Dims3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.channels, self.height, self.width)
    }
}

/// Describes the dimensionality of an arbitrary-rank tensor.
///
/// Shapes are immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Creates a new shape from the given dimensions.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![10, 784]);
    /// assert_eq!(s.rank(), 2);
    /// assert_eq!(s.num_elements(), 7840);
    /// ```
    pub fn new(dims: Vec<usize>) -> Self {
        Self { dims }
    }

    /// Creates a 1-D shape.
    pub fn vector(len: usize) -> Self {
        Self { dims: vec![len] }
    }

    /// Creates a 2-D shape (matrix).
    pub fn matrix(rows: usize, cols: usize) -> Self {
        Self {
            dims: vec![rows, cols],
        }
    }

    /// Returns the number of dimensions (rank).
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Returns the total number of elements.
    ///
    /// For a rank-0 shape, returns 1.
    pub fn num_elements(&self) -> usize {
        if self.dims.is_empty() {
            1
        } else {
            self.dims.iter().product()
        }
    }

    /// Returns the dimensions as a slice.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Returns the size of a specific dimension, or `None` if out of bounds.
    pub fn dim(&self, index: usize) -> Option<usize> {
        self.dims.get(index).copied()
    }

    /// Computes the memory footprint in bytes for a given [`DType`].
    pub fn size_bytes(&self, dtype: DType) -> usize {
        self.num_elements() * dtype.size_bytes()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "]")
    }
}

/// Convenience: `Shape::from(vec![10, 784])`.
impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self::new(dims)
    }
}

/// Convenience: `Shape::from(&[10, 784][..])`.
impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self::new(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dims3_volume() {
        let d = Dims3::new(1, 28, 28);
        assert_eq!(d.volume(), 784);
        assert_eq!(d.channels, 1);
        assert_eq!(d.height, 28);
        assert_eq!(d.width, 28);
    }

    #[test]
    fn test_dims3_shape_roundtrip() {
        let d = Dims3::new(3, 4, 5);
        let s = d.to_shape();
        assert_eq!(s.dims(), &[3, 4, 5]);
        assert_eq!(Dims3::from_shape(&s).unwrap(), d);
    }

    #[test]
    fn test_dims3_from_wrong_rank() {
        let s = Shape::matrix(10, 784);
        let err = Dims3::from_shape(&s).unwrap_err();
        assert!(matches!(
            err,
            TensorError::RankMismatch {
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn test_dims3_display() {
        assert_eq!(format!("{}", Dims3::new(1, 28, 28)), "1x28x28");
    }

    #[test]
    fn test_vector_shape() {
        let s = Shape::vector(10);
        assert_eq!(s.rank(), 1);
        assert_eq!(s.num_elements(), 10);
    }

    #[test]
    fn test_matrix_shape() {
        let s = Shape::matrix(10, 784);
        assert_eq!(s.rank(), 2);
        assert_eq!(s.num_elements(), 7840);
        assert_eq!(s.size_bytes(DType::F32), 31360);
    }

    #[test]
    fn test_rank0_num_elements() {
        let s = Shape::new(vec![]);
        assert_eq!(s.num_elements(), 1);
    }

    #[test]
    fn test_dim_accessor() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(s.dim(1), Some(3));
        assert_eq!(s.dim(3), None);
    }

    #[test]
    fn test_display() {
        let s = Shape::new(vec![2, 3, 4]);
        assert_eq!(format!("{s}"), "[2, 3, 4]");
    }

    #[test]
    fn test_from_conversions() {
        let s1: Shape = vec![2, 3].into();
        let s2: Shape = (&[2, 3][..]).into();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_serde_roundtrip() {
        let d = Dims3::new(1, 28, 28);
        let json = serde_json::to_string(&d).unwrap();
        let back: Dims3 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}

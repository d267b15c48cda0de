use thiserror::Error;

use crate::shape::TensorShape;

/// An error type for tensor metadata and storage operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TensorError {
    /// The tensor shape, element count and (rows, cols) pair are not consistent.
    ///
    /// # Examples
    /// - A symmetric matrix requested with 2 rows and 3 columns
    /// - A symmetric shape requested for 4 elements (not a triangular number)
    #[error("Invalid tensor shape: {0}")]
    InvalidShape(String),

    /// The requested (row, col) element is not physically stored by the shape.
    ///
    /// Off-diagonal elements of a diagonal matrix and the empty half of a
    /// triangular matrix have no storage of their own.
    #[error("Tensor element ({row}, {col}) is not stored by a {shape}")]
    NonStoredElement {
        /// Row of the requested element.
        row: usize,
        /// Column of the requested element.
        col: usize,
        /// Shape that does not store the element.
        shape: TensorShape,
    },

    /// Index exceeds the tensor or buffer bounds.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted.
        index: usize,
        /// The size of the dimension being indexed.
        size: usize,
    },

    /// Tensors of order higher than 2 (matrices) cannot be described.
    #[error("Tensor order {0} is not supported, the maximum is 2")]
    UnsupportedRank(usize),

    /// A data type or sample type does not fit the requested operation.
    #[error("Invalid conversion: {0}")]
    InvalidConversion(String),

    /// A tensor shape name could not be parsed.
    #[error("Unknown tensor shape name: {0:?}")]
    UnknownShapeName(String),
}

impl TensorError {
    /// Create a new `InvalidShape` error.
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        TensorError::InvalidShape(message.into())
    }

    /// Create a new `IndexOutOfBounds` error.
    pub fn index_out_of_bounds(index: usize, size: usize) -> Self {
        TensorError::IndexOutOfBounds { index, size }
    }

    /// Create a new `InvalidConversion` error.
    pub fn invalid_conversion(message: impl Into<String>) -> Self {
        TensorError::InvalidConversion(message.into())
    }
}

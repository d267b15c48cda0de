use pixten_tensor::TensorError;

/// An error type for the image module.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ImageError {
    /// Error raised by the tensor metadata or the sample storage.
    #[error(transparent)]
    Tensor(#[from] TensorError),

    /// A pixel coordinate or tensor index lies outside its range.
    #[error("Index {index} out of bounds for dimension of size {size}")]
    IndexOutOfBounds {
        /// The invalid index that was attempted.
        index: usize,
        /// The size of the dimension being indexed.
        size: usize,
    },

    /// Axes, sizes or tensor sizes of the operands do not agree.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The data type does not support the requested operation.
    #[error("Invalid conversion: {0}")]
    InvalidConversion(String),

    /// The index expression cannot be resolved.
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// The image has no buffer.
    #[error("Image is not forged")]
    NotForged,

    /// Error when the length of the provided data does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    DataLengthMismatch(usize, usize),
}

impl ImageError {
    /// Create a new `DimensionMismatch` error.
    pub fn dimension_mismatch(message: impl Into<String>) -> Self {
        ImageError::DimensionMismatch(message.into())
    }

    /// Create a new `InvalidIndex` error.
    pub fn invalid_index(message: impl Into<String>) -> Self {
        ImageError::InvalidIndex(message.into())
    }

    /// Create a new `InvalidConversion` error.
    pub fn invalid_conversion(message: impl Into<String>) -> Self {
        ImageError::InvalidConversion(message.into())
    }
}

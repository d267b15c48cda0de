#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `pixten-tensor` holds the metadata and storage primitives of a pixel-tensor
//! image: the numeric kind of its samples, the shape of the tensor stored at
//! every pixel and the strided layout addressing those samples in a shared
//! buffer.
//!
//! # Architecture
//!
//! - **Kind / DataType**: the sample kinds, the complex flag and the promotion
//!   rules used when two images meet in one operation.
//! - **TensorShape / TensorDescriptor**: storage conventions for vectors, full,
//!   diagonal, symmetric and triangular matrices, with cached lookup tables.
//! - **Samples / Buffer**: type-erased contiguous storage, reference counted
//!   and shared by every image aliasing it.
//! - **StridedLayout**: sizes, strides and offset mapping a pixel, a tensor
//!   element and a complex part to a sample offset.
//!
//! # Quick Start
//!
//! ```rust
//! use pixten_tensor::{StridedLayout, TensorDescriptor, TensorShape};
//!
//! let tensor = TensorDescriptor::new(TensorShape::Symmetric, 3, 3).unwrap();
//! assert_eq!(tensor.elements(), 6);
//! assert_eq!(tensor.index(2, 0).unwrap(), tensor.index(0, 2).unwrap());
//!
//! let layout = StridedLayout::normal(&[4, 3], tensor.elements(), false);
//! assert_eq!(layout.offset(&[0, 1], 0, 0).unwrap(), 6);
//! ```

/// Sample kinds, complex data types and the promotion rules between them.
pub mod data_type;

/// Error types for the tensor module.
pub mod error;

/// Strided layout of the samples of an image.
pub mod layout;

/// Serde support for the metadata types.
///
/// Deserialization validates the decoded values the same way the
/// constructors do.
#[cfg(feature = "serde")]
pub mod serde;

/// Tensor shapes and their lookup tables.
pub mod shape;

/// Type-erased sample storage and the shared buffer.
pub mod storage;

pub use crate::data_type::{saturating_cast, DataType, Kind, Sample};
pub use crate::error::TensorError;
pub use crate::layout::{normal_strides, StridedLayout};
pub use crate::shape::{
    build_lookup, element_count, infer_size, TensorDescriptor, TensorLookup, TensorShape,
};
pub use crate::storage::{Buffer, Samples};

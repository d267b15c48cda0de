#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! An [`Image`] is an N-dimensional grid of pixels where every pixel holds a
//! small tensor of samples. Images are handles onto a shared, reference
//! counted buffer: cloning an image, indexing it with a regular selection or
//! reshaping it never copies samples, and writes through any handle are
//! visible through every other handle aliasing the same buffer.
//!
//! # Quick Start
//!
//! ```rust
//! use pixten_image::{Image, IndexSpec};
//!
//! let image = Image::from_vec(&[4, 3], (0u8..12).collect()).unwrap();
//!
//! // Every other column, all rows: a zero-copy view.
//! let view = image.at([IndexSpec::range(0, 3, 2), IndexSpec::All]).unwrap();
//! assert!(view.is_regular());
//!
//! let mut region = view.into_image().unwrap();
//! region.fill(9.0).unwrap();
//! assert_eq!(image.get_sample(&[2, 1], 0).unwrap(), 9.0);
//! assert_eq!(image.get_sample(&[1, 1], 0).unwrap(), 5.0);
//! ```

/// Error types for the image module.
pub mod error;

/// Image representation: metadata, lifecycle and sample access.
pub mod image;

/// Index expressions over tensor elements and pixels.
pub mod index;

/// Operations combining several images.
pub mod ops;

/// Physical pixel sizes.
pub mod physdims;

/// Zero-copy reshaping of the strided layout.
pub mod reshape;

/// Views produced by indexing an image.
pub mod view;

pub use crate::error::ImageError;
pub use crate::image::Image;
pub use crate::index::{IndexSpec, Position, SpatialIndex, Subscript, TensorIndex};
pub use crate::ops::concatenate;
pub use crate::physdims::{PhysicalQuantity, PixelSize};
pub use crate::view::{GatheredView, View};

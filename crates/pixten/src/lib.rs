#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use pixten_tensor as tensor;

#[doc(inline)]
pub use pixten_image as image;

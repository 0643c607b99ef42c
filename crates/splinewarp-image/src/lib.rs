#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// planar image representation for resampling purposes.
pub mod image;

/// Error types for the image module.
pub mod error;

/// Conversions between planar and interleaved sample layouts.
pub mod ops;

pub use crate::error::ImageError;
pub use crate::image::{Image, ImageSize};

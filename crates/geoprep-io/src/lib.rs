#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for I/O operations.
///
/// Defines [`error::IoError`] variants for file access, decoding and encoding failures.
pub mod error;

/// High-level image reading functions.
///
/// Images of any supported format are decoded and normalized to 3-channel RGB8.
/// See [`functional::read_image_any_rgb8`].
pub mod functional;

/// RGB8 image container.
pub mod rgb_image;

/// JPEG image encoding.
pub mod jpeg;

/// PNG image encoding.
pub mod png;

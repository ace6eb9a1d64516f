#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pipeline configuration.
pub mod config;

/// Pipeline error types.
pub mod error;

/// Session preparation pipeline.
pub mod pipeline;

#[doc(inline)]
pub use geoprep_3d as geo3d;

#[doc(inline)]
pub use geoprep_io as io;

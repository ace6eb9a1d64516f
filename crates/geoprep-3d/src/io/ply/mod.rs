mod parser;
mod properties;
mod writer;

pub use parser::*;
pub use properties::*;
pub use writer::*;

/// Error types for the PLY module.
#[derive(Debug, thiserror::Error)]
pub enum PlyError {
    /// Failed to read or write PLY file
    #[error("Failed to read or write PLY file")]
    Io(#[from] std::io::Error),

    /// Malformed PLY header
    #[error("Malformed PLY header: {0}")]
    MalformedHeader(String),

    /// Unsupported PLY storage format
    #[error("Unsupported PLY format: {0}")]
    UnsupportedFormat(String),

    /// Unsupported PLY property
    #[error("Unsupported PLY property: {0}")]
    UnsupportedProperty(String),

    /// The vertex element lacks one of the x, y, z properties
    #[error("PLY vertex element must define x, y and z")]
    MissingCoordinates,

    /// Failed to parse a vertex value
    #[error("Failed to parse PLY vertex data: {0}")]
    Parse(String),
}

use std::path::PathBuf;

use geoprep_3d::{
    io::{ply::PlyError, poses::PoseTableError, trajectory::TrajectoryError},
    sampling::SamplingError,
};
use geoprep_io::error::IoError;

/// An error type for the session pipeline.
///
/// Every error aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The configuration is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The point cloud target size is not positive.
    #[error("Invalid point cloud target. {0}")]
    InvalidTarget(#[from] SamplingError),

    /// An enumerated image has no entry in the pose table.
    #[error("Missing pose for image {key} (frame {frame_index})")]
    MissingPose {
        /// Image key without a pose.
        key: String,
        /// Frame index assigned to the image.
        frame_index: usize,
    },

    /// The pose table could not be read.
    #[error("Failed to read pose table {path}. {source}")]
    PoseTable {
        /// Path of the pose table.
        path: PathBuf,
        /// Underlying error.
        source: PoseTableError,
    },

    /// The point cloud could not be read or written.
    #[error("Failed to process point cloud {path}. {source}")]
    PointCloud {
        /// Path of the point cloud.
        path: PathBuf,
        /// Underlying error.
        source: PlyError,
    },

    /// A frame image could not be read, converted or written.
    #[error("Failed to process image {key} (frame {frame_index}). {source}")]
    Image {
        /// Image key.
        key: String,
        /// Frame index assigned to the image.
        frame_index: usize,
        /// Underlying error.
        source: IoError,
    },

    /// The trajectory file could not be written.
    #[error("Failed to write trajectory {path}. {source}")]
    Trajectory {
        /// Path of the trajectory file.
        path: PathBuf,
        /// Underlying error.
        source: TrajectoryError,
    },

    /// A filesystem operation on the session layout failed.
    #[error("Failed to access {path}. {source}")]
    Io {
        /// Path involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// I/O utilities for reading and writing point clouds, pose tables and trajectories.
pub mod io;

/// Point cloud container.
pub mod pointcloud;

/// Random point cloud downsampling.
pub mod sampling;

/// Rotation and rigid transform utilities.
pub mod transforms;

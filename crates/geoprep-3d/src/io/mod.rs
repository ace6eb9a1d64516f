/// PLY reader and writer module.
pub mod ply;

/// Pose table reader module.
pub mod poses;

/// Keyframe trajectory writer module.
pub mod trajectory;

use std::path::{Path, PathBuf};

use geoprep_3d::sampling::SamplerConfig;
use geoprep_io::jpeg::DEFAULT_JPEG_QUALITY;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Encoding of the output frame images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputImageFormat {
    /// Lossy JPEG, written with the `jpg` extension.
    Jpeg,
    /// Lossless PNG, written with the `png` extension.
    Png,
}

impl OutputImageFormat {
    /// File extension of the output images.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputImageFormat::Jpeg => "jpg",
            OutputImageFormat::Png => "png",
        }
    }
}

impl std::str::FromStr for OutputImageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Ok(OutputImageFormat::Jpeg),
            "png" => Ok(OutputImageFormat::Png),
            other => Err(format!("unsupported image format: {other}")),
        }
    }
}

/// Where the list of frames comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameSource {
    /// Every key of the pose table is a frame.
    PoseTable,
    /// Every image file in the images directory is a frame and must have a pose.
    ImageDirectory,
}

/// Configuration of a [`crate::pipeline::SessionPipeline`] run.
///
/// Relative input names are resolved against `data_dir` and output names against
/// `output_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory of the raw capture session.
    pub data_dir: PathBuf,
    /// Root directory of the prepared session.
    pub output_dir: PathBuf,
    /// Pose table file name inside `data_dir`.
    pub poses_file: PathBuf,
    /// Point cloud file name inside `data_dir`.
    pub point_cloud_file: PathBuf,
    /// Image directory name inside `data_dir`.
    pub images_dir: PathBuf,
    /// Downsampled point cloud file name inside `output_dir`.
    pub output_point_cloud_file: PathBuf,
    /// Frame image directory name inside `output_dir`.
    pub output_images_dir: PathBuf,
    /// Trajectory file name inside `output_dir`.
    pub trajectory_file: PathBuf,
    /// Point cloud downsampling parameters.
    pub sampler: SamplerConfig,
    /// Encoding of the output frame images.
    pub image_format: OutputImageFormat,
    /// JPEG quality, from 1 to 100.
    pub jpeg_quality: u8,
    /// Optional bound on the longest side of the output images, in pixels.
    pub max_image_dim: Option<usize>,
    /// Where the list of frames comes from.
    pub frame_source: FrameSource,
    /// Remove an existing output directory before writing. When disabled, only stale frame
    /// images are removed from the output image directory.
    pub clean_output: bool,
    /// Do not read, sample or write the point cloud.
    pub skip_point_cloud: bool,
    /// Log progress every this many frames.
    pub progress_interval: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            poses_file: PathBuf::from("poses.json"),
            point_cloud_file: PathBuf::from("points.ply"),
            images_dir: PathBuf::from("images"),
            output_point_cloud_file: PathBuf::from("PointCloud.ply"),
            output_images_dir: PathBuf::from("results"),
            trajectory_file: PathBuf::from("KeyFrameTrajectory2.txt"),
            sampler: SamplerConfig::default(),
            image_format: OutputImageFormat::Jpeg,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_image_dim: None,
            frame_source: FrameSource::PoseTable,
            clean_output: true,
            skip_point_cloud: false,
            progress_interval: 10,
        }
    }
}

impl PipelineConfig {
    /// Create a default configuration for the given input and output roots.
    pub fn new(data_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    /// Load a configuration from a JSON file. Missing fields take their default value.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| PipelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(std::io::BufReader::new(file))
            .map_err(|e| PipelineError::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    /// Check the configuration before anything touches the filesystem.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.sampler.target_points == 0 {
            return Err(PipelineError::InvalidTarget(
                geoprep_3d::sampling::SamplingError::InvalidTarget(0),
            ));
        }
        if self.progress_interval == 0 {
            return Err(PipelineError::InvalidConfig(
                "progress_interval must be greater than zero".to_string(),
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(PipelineError::InvalidConfig(format!(
                "jpeg_quality must be within 1..=100, got {}",
                self.jpeg_quality
            )));
        }
        if self.max_image_dim == Some(0) {
            return Err(PipelineError::InvalidConfig(
                "max_image_dim must be greater than zero".to_string(),
            ));
        }
        if self.output_dir == self.data_dir {
            return Err(PipelineError::InvalidConfig(
                "output_dir must differ from data_dir".to_string(),
            ));
        }
        if self.clean_output && self.data_dir.starts_with(&self.output_dir) {
            return Err(PipelineError::InvalidConfig(
                "data_dir must not be inside output_dir when clean_output is set".to_string(),
            ));
        }
        Ok(())
    }

    /// Path of the input pose table.
    pub fn poses_path(&self) -> PathBuf {
        self.data_dir.join(&self.poses_file)
    }

    /// Path of the input point cloud.
    pub fn point_cloud_path(&self) -> PathBuf {
        self.data_dir.join(&self.point_cloud_file)
    }

    /// Path of the input image directory.
    pub fn images_path(&self) -> PathBuf {
        self.data_dir.join(&self.images_dir)
    }

    /// Path of the output point cloud.
    pub fn output_point_cloud_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_point_cloud_file)
    }

    /// Path of the output image directory.
    pub fn output_images_path(&self) -> PathBuf {
        self.output_dir.join(&self.output_images_dir)
    }

    /// Path of the output trajectory file.
    pub fn trajectory_path(&self) -> PathBuf {
        self.output_dir.join(&self.trajectory_file)
    }
}

use std::path::{Path, PathBuf};

use geoprep_3d::{
    io::{
        ply,
        poses::{self, PoseTable},
        trajectory,
    },
    sampling::PointCloudSampler,
    transforms::{quaternion_norm, Transform4x4},
};
use geoprep_io::{functional, jpeg, png};

use crate::{
    config::{FrameSource, OutputImageFormat, PipelineConfig},
    error::PipelineError,
};

// Quaternions further than this from unit norm are reported but still used.
const QUATERNION_NORM_TOLERANCE: f64 = 1e-3;

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "tif", "tiff", "webp", "tga"];

/// A capture frame: its index in the prepared session and its source image key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Zero-based index given by the lexicographic order of the image keys.
    pub index: usize,
    /// Source image file name, also the pose table key.
    pub key: String,
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    /// Number of frames written.
    pub num_frames: usize,
    /// Number of points in the input point cloud, when processed.
    pub input_points: Option<usize>,
    /// Number of points in the output point cloud, when processed.
    pub output_points: Option<usize>,
    /// Path of the output trajectory file.
    pub trajectory_path: PathBuf,
    /// Path of the output image directory.
    pub images_path: PathBuf,
    /// Path of the output point cloud, when processed.
    pub point_cloud_path: Option<PathBuf>,
}

/// Sort image keys lexicographically and assign each its frame index.
///
/// Duplicate keys are collapsed.
///
/// Example:
///
/// ```
/// use geoprep::pipeline::assign_frame_indices;
///
/// let frames = assign_frame_indices(["b.jpg", "a.jpg", "c.jpg"]);
/// assert_eq!(frames[0].key, "a.jpg");
/// assert_eq!(frames[2].index, 2);
/// ```
pub fn assign_frame_indices<I, S>(keys: I) -> Vec<Frame>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut keys = keys.into_iter().map(Into::into).collect::<Vec<String>>();
    keys.sort();
    keys.dedup();
    keys.into_iter()
        .enumerate()
        .map(|(index, key)| Frame { index, key })
        .collect()
}

/// Name of the output image of a frame, e.g. `frame000042.jpg`.
pub fn frame_image_name(frame_index: usize, extension: &str) -> String {
    format!("frame{:06}.{}", frame_index, extension)
}

/// Compute the camera-to-world transform of every frame, in frame order.
///
/// Fails with [`PipelineError::MissingPose`] on the first frame without a pose.
pub fn compute_frame_transforms(
    frames: &[Frame],
    poses: &PoseTable,
) -> Result<Vec<(usize, Transform4x4)>, PipelineError> {
    frames
        .iter()
        .map(|frame| {
            let pose = poses
                .get(&frame.key)
                .ok_or_else(|| PipelineError::MissingPose {
                    key: frame.key.clone(),
                    frame_index: frame.index,
                })?;

            let norm = quaternion_norm(&pose.rotation_quaternion);
            if (norm - 1.0).abs() > QUATERNION_NORM_TOLERANCE {
                log::warn!(
                    "quaternion of {} (frame {}) has norm {}, rotation will not be orthonormal",
                    frame.key,
                    frame.index,
                    norm
                );
            }

            Ok((frame.index, pose.camera_to_world()))
        })
        .collect()
}

fn is_image_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

/// List the file names of the images in a directory.
pub fn list_image_keys(images_path: &Path) -> Result<Vec<String>, PipelineError> {
    let io_error = |source| PipelineError::Io {
        path: images_path.to_path_buf(),
        source,
    };

    let mut keys = Vec::new();
    for entry in std::fs::read_dir(images_path).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if !is_image_file(&path) {
            continue;
        }
        match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => keys.push(name.to_string()),
            None => log::warn!("skipping image with non UTF-8 name: {}", path.display()),
        }
    }
    Ok(keys)
}

/// Remove the frame images left in an output image directory by a previous run.
///
/// Only files named like [`frame_image_name`] outputs are removed. Returns how many were
/// removed.
pub fn remove_frame_images(images_path: &Path) -> Result<usize, PipelineError> {
    let io_error = |source| PipelineError::Io {
        path: images_path.to_path_buf(),
        source,
    };

    let mut removed = 0;
    for entry in std::fs::read_dir(images_path).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_frame = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.strip_prefix("frame"))
            .is_some_and(|digits| {
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            });
        if is_frame && is_image_file(&path) {
            std::fs::remove_file(&path).map_err(io_error)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Converts a raw capture session into the prepared training layout.
///
/// See [`PipelineConfig`] for the input and output layout.
pub struct SessionPipeline {
    config: PipelineConfig,
}

impl SessionPipeline {
    /// Create a pipeline from its configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Get the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the whole preparation.
    ///
    /// Poses are resolved for every frame before any output image or trajectory line is
    /// written. The trajectory file only appears once it is complete.
    pub fn run(&self) -> Result<PipelineSummary, PipelineError> {
        self.config.validate()?;
        let sampler = PointCloudSampler::from_config(&self.config.sampler)?;

        let poses = self.read_poses()?;
        let frames = self.enumerate_frames(&poses)?;
        log::info!("Found {} frames", frames.len());

        let transforms = compute_frame_transforms(&frames, &poses)?;

        self.prepare_output_dir()?;

        for frame in frames.iter() {
            if frame.index % self.config.progress_interval == 0 {
                log::info!("Processing frame {}/{}", frame.index, frames.len());
            }
            self.process_frame_image(frame)?;
        }

        let trajectory_path = self.config.trajectory_path();
        trajectory::write_trajectory_file(&trajectory_path, &transforms).map_err(|source| {
            PipelineError::Trajectory {
                path: trajectory_path.clone(),
                source,
            }
        })?;

        let (input_points, output_points) = if self.config.skip_point_cloud {
            log::info!("Skipping point cloud");
            (None, None)
        } else {
            let (input_points, output_points) = self.process_point_cloud(&sampler)?;
            (Some(input_points), Some(output_points))
        };

        Ok(PipelineSummary {
            num_frames: frames.len(),
            input_points,
            output_points,
            trajectory_path,
            images_path: self.config.output_images_path(),
            point_cloud_path: output_points.map(|_| self.config.output_point_cloud_path()),
        })
    }

    fn read_poses(&self) -> Result<PoseTable, PipelineError> {
        let path = self.config.poses_path();
        poses::read_pose_table(&path).map_err(|source| PipelineError::PoseTable { path, source })
    }

    fn enumerate_frames(&self, poses: &PoseTable) -> Result<Vec<Frame>, PipelineError> {
        let keys: Vec<String> = match self.config.frame_source {
            FrameSource::PoseTable => poses.keys().map(str::to_string).collect(),
            FrameSource::ImageDirectory => list_image_keys(&self.config.images_path())?,
        };
        Ok(assign_frame_indices(keys))
    }

    fn prepare_output_dir(&self) -> Result<(), PipelineError> {
        let output_dir = &self.config.output_dir;
        if self.config.clean_output && output_dir.exists() {
            log::info!("Removing existing output directory {}", output_dir.display());
            std::fs::remove_dir_all(output_dir).map_err(|source| PipelineError::Io {
                path: output_dir.clone(),
                source,
            })?;
        }

        let images_path = self.config.output_images_path();
        std::fs::create_dir_all(&images_path).map_err(|source| PipelineError::Io {
            path: images_path.clone(),
            source,
        })?;

        if !self.config.clean_output {
            let removed = remove_frame_images(&images_path)?;
            if removed > 0 {
                log::info!(
                    "Removed {} stale frame images from {}",
                    removed,
                    images_path.display()
                );
            }
        }

        Ok(())
    }

    fn process_point_cloud(
        &self,
        sampler: &PointCloudSampler,
    ) -> Result<(usize, usize), PipelineError> {
        log::info!(
            "Reading and downsampling point cloud to at most {} points...",
            sampler.target_points()
        );

        let input_path = self.config.point_cloud_path();
        let pointcloud = ply::read_ply(&input_path).map_err(|source| PipelineError::PointCloud {
            path: input_path,
            source,
        })?;

        if let (Some(min), Some(max)) = (pointcloud.min_bound(), pointcloud.max_bound()) {
            log::debug!("point cloud bounds: {:?} - {:?}", min, max);
        }

        let downsampled = sampler.sample(&pointcloud);

        let output_path = self.config.output_point_cloud_path();
        ply::write_ply(&output_path, &downsampled).map_err(|source| {
            PipelineError::PointCloud {
                path: output_path,
                source,
            }
        })?;

        Ok((pointcloud.len(), downsampled.len()))
    }

    fn process_frame_image(&self, frame: &Frame) -> Result<(), PipelineError> {
        let image_error = |source| PipelineError::Image {
            key: frame.key.clone(),
            frame_index: frame.index,
            source,
        };

        let src_path = self.config.images_path().join(&frame.key);
        let image = functional::read_image_any_rgb8(&src_path).map_err(image_error)?;
        let image = match self.config.max_image_dim {
            Some(max_dim) => functional::downscale_rgb8(image, max_dim).map_err(image_error)?,
            None => image,
        };

        let format = self.config.image_format;
        let dst_path = self
            .config
            .output_images_path()
            .join(frame_image_name(frame.index, format.extension()));

        let written = match format {
            OutputImageFormat::Jpeg => {
                jpeg::write_image_jpeg_rgb8(&dst_path, &image, self.config.jpeg_quality)
            }
            OutputImageFormat::Png => png::write_image_png_rgb8(&dst_path, &image),
        };
        written.map_err(image_error)?;

        log::debug!("{} -> {}", src_path.display(), dst_path.display());

        Ok(())
    }
}

use std::path::PathBuf;

use argh::FromArgs;

use geoprep::{
    config::{FrameSource, OutputImageFormat, PipelineConfig},
    pipeline::SessionPipeline,
};

#[derive(FromArgs, Debug)]
/// Prepare a posed capture session for Gaussian splatting training.
struct Args {
    /// path to the extracted session (poses.json, points.ply and images/)
    #[argh(option, short = 'd')]
    data_dir: Option<PathBuf>,

    /// path to the prepared output directory
    #[argh(option, short = 'o')]
    output_dir: Option<PathBuf>,

    /// path to a JSON pipeline configuration, explicit flags override it
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// number of points to keep in the output point cloud
    #[argh(option, short = 'n')]
    target_points: Option<usize>,

    /// seed of the point cloud sampler
    #[argh(option)]
    seed: Option<u64>,

    /// output image format, jpg or png
    #[argh(option)]
    image_format: Option<OutputImageFormat>,

    /// jpeg quality, from 1 to 100
    #[argh(option)]
    jpeg_quality: Option<u8>,

    /// bound on the longest side of the output images
    #[argh(option)]
    max_image_dim: Option<usize>,

    /// enumerate frames from the images directory instead of the pose table
    #[argh(switch)]
    frames_from_images: bool,

    /// keep an existing output directory, only replacing its frame images
    #[argh(switch)]
    keep_output: bool,

    /// do not process the point cloud
    #[argh(switch)]
    skip_point_cloud: bool,

    /// log progress every this many frames
    #[argh(option)]
    progress_interval: Option<usize>,
}

impl Args {
    fn into_config(self) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_json_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Some(data_dir) = self.data_dir {
            config.data_dir = data_dir;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(target_points) = self.target_points {
            config.sampler.target_points = target_points;
        }
        if let Some(seed) = self.seed {
            config.sampler.seed = Some(seed);
        }
        if let Some(image_format) = self.image_format {
            config.image_format = image_format;
        }
        if let Some(jpeg_quality) = self.jpeg_quality {
            config.jpeg_quality = jpeg_quality;
        }
        if let Some(max_image_dim) = self.max_image_dim {
            config.max_image_dim = Some(max_image_dim);
        }
        if let Some(progress_interval) = self.progress_interval {
            config.progress_interval = progress_interval;
        }
        if self.frames_from_images {
            config.frame_source = FrameSource::ImageDirectory;
        }
        if self.keep_output {
            config.clean_output = false;
        }
        config.skip_point_cloud |= self.skip_point_cloud;

        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    let config = args.into_config()?;
    log::debug!("{:?}", config);

    let pipeline = SessionPipeline::new(config);
    let summary = pipeline.run()?;

    log::info!(
        "Wrote {} frames to {}",
        summary.num_frames,
        summary.images_path.display()
    );
    if let (Some(input), Some(output)) = (summary.input_points, summary.output_points) {
        log::info!("Point cloud: {} -> {} points", input, output);
    }

    println!("Prepared data at {}", pipeline.config().output_dir.display());

    Ok(())
}

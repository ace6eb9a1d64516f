use std::path::Path;

use image::{imageops::FilterType, ColorType, ImageReader, RgbImage};

use crate::{
    error::IoError,
    rgb_image::{ImageSize, Rgb8Image},
};

/// Reads an image from the given file path and normalizes it to 3-channel RGB8.
///
/// The method tries to read from any image format supported by the image crate. Grayscale,
/// alpha and 16-bit images are converted; alpha is dropped.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An RGB8 image containing the image data.
pub fn read_image_any_rgb8(file_path: impl AsRef<Path>) -> Result<Rgb8Image, IoError> {
    let file_path = file_path.as_ref();

    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let bytes = std::fs::read(file_path)?;
    decode_image_any_rgb8(&bytes)
}

/// Decodes an image of any supported format from raw bytes into 3-channel RGB8.
///
/// # Arguments
///
/// * `bytes` - Raw bytes of the encoded image.
pub fn decode_image_any_rgb8(bytes: &[u8]) -> Result<Rgb8Image, IoError> {
    let img = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    if img.color() != ColorType::Rgb8 {
        log::debug!("converting image from {:?} to Rgb8", img.color());
    }

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(Rgb8Image::new(size, img.into_rgb8().into_raw())?)
}

/// Downscales an image so that its longest side is at most `max_dim` pixels.
///
/// The aspect ratio is kept. Images already within the bound are returned unchanged.
///
/// # Arguments
///
/// * `image` - The image to downscale.
/// * `max_dim` - The maximum size of the longest side, in pixels.
pub fn downscale_rgb8(image: Rgb8Image, max_dim: usize) -> Result<Rgb8Image, IoError> {
    let size = image.size();
    let longest = size.width.max(size.height);
    if max_dim == 0 || longest <= max_dim {
        return Ok(image);
    }

    let scale = max_dim as f64 / longest as f64;
    let new_size = ImageSize {
        width: ((size.width as f64 * scale).round() as usize).max(1),
        height: ((size.height as f64 * scale).round() as usize).max(1),
    };

    let src = RgbImage::from_raw(size.width as u32, size.height as u32, image.into_vec())
        .ok_or_else(|| {
            IoError::ImageCreationError(crate::rgb_image::ImageError::InvalidChannelShape(
                0,
                size.width * size.height * Rgb8Image::CHANNELS,
            ))
        })?;
    let dst = image::imageops::resize(
        &src,
        new_size.width as u32,
        new_size.height as u32,
        FilterType::Triangle,
    );

    log::debug!("downscaled image from {} to {}", size, new_size);

    Ok(Rgb8Image::new(new_size, dst.into_raw())?)
}

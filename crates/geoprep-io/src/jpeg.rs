use std::path::Path;

use jpeg_encoder::{ColorType, Encoder};

use crate::{error::IoError, rgb_image::Rgb8Image};

/// Default JPEG quality, matching the usual library default.
pub const DEFAULT_JPEG_QUALITY: u8 = 75;

/// Writes the given JPEG _(rgb8)_ data to the given file path.
///
/// # Arguments
///
/// - `file_path` - The path to the JPEG image.
/// - `image` - The RGB8 image to encode.
/// - `quality` - The quality of the JPEG encoding, range from 1 (lowest) to 100 (highest)
pub fn write_image_jpeg_rgb8(
    file_path: impl AsRef<Path>,
    image: &Rgb8Image,
    quality: u8,
) -> Result<(), IoError> {
    let file_path = file_path.as_ref();
    if file_path.extension().map_or(true, |ext| {
        !ext.eq_ignore_ascii_case("jpg") && !ext.eq_ignore_ascii_case("jpeg")
    }) {
        return Err(IoError::InvalidFileExtension(file_path.to_path_buf()));
    }

    let image_size = image.size();
    let (width, height) = match (
        u16::try_from(image_size.width),
        u16::try_from(image_size.height),
    ) {
        (Ok(width), Ok(height)) => (width, height),
        _ => return Err(IoError::JpegImageTooLarge(image_size)),
    };

    let encoder = Encoder::new_file(file_path, quality.clamp(1, 100))?;
    encoder.encode(image.as_slice(), width, height, ColorType::Rgb)?;
    Ok(())
}

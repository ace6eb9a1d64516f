/// An error type for image creation.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when the data length does not match the image size.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),
}

/// Image size in pixels
///
/// # Examples
///
/// ```
/// use geoprep_io::rgb_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// An 8-bit, 3-channel RGB image with interleaved pixels in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct Rgb8Image {
    size: ImageSize,
    data: Vec<u8>,
}

impl Rgb8Image {
    /// Number of channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The interleaved RGB pixel data, `width * height * 3` bytes.
    pub fn new(size: ImageSize, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected = size.width * size.height * Self::CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }
        Ok(Self { size, data })
    }

    /// Create a new image filled with a single color.
    pub fn from_pixel(size: ImageSize, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(size.width * size.height * Self::CHANNELS)
            .collect();
        Self { size, data }
    }

    /// Get the size of the image in pixels.
    #[inline]
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels.
    #[inline]
    pub fn num_channels(&self) -> usize {
        Self::CHANNELS
    }

    /// Get the pixel data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the image and return its pixel data.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Get the pixel at the given column and row.
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.size.width || y >= self.size.height {
            return None;
        }
        let offset = (y * self.size.width + x) * Self::CHANNELS;
        Some([
            self.data[offset],
            self.data[offset + 1],
            self.data[offset + 2],
        ])
    }
}

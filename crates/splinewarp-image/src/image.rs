use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use splinewarp_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
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

/// Represents a multi-channel image with `f64` samples in planar layout.
///
/// Channels are stored as contiguous blocks of `width * height` samples
/// (R...RG...GB...B), not interleaved. The channel count is a runtime value,
/// so grayscale, gray+alpha, RGB and RGBA images share one type.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    size: ImageSize,
    channels: usize,
    data: Vec<f64>,
}

impl Image {
    /// Create a new image from planar sample data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `channels` - The number of channels.
    /// * `data` - The planar sample data, `size.width * size.height * channels`
    ///   values with each channel stored contiguously.
    ///
    /// # Errors
    ///
    /// If a dimension is zero or the data length does not match the image
    /// size, an error is returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use splinewarp_image::{Image, ImageSize};
    ///
    /// let image = Image::new(
    ///     ImageSize {
    ///         width: 10,
    ///         height: 20,
    ///     },
    ///     3,
    ///     vec![0.0; 10 * 20 * 3],
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, channels: usize, data: Vec<f64>) -> Result<Self, ImageError> {
        if size.width == 0 || size.height == 0 || channels == 0 {
            return Err(ImageError::ZeroSizedImage(
                size.width,
                size.height,
                channels,
            ));
        }

        let expected = size.width * size.height * channels;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self {
            size,
            channels,
            data,
        })
    }

    /// Create a new image filled with a constant value.
    pub fn from_size_val(size: ImageSize, channels: usize, val: f64) -> Result<Self, ImageError> {
        let data = vec![val; size.width * size.height * channels];
        Image::new(size, channels, data)
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// Get one channel plane as a slice of `width * height` samples.
    ///
    /// # Errors
    ///
    /// If the channel index is out of bounds, an error is returned.
    pub fn plane(&self, channel: usize) -> Result<&[f64], ImageError> {
        if channel >= self.channels {
            return Err(ImageError::ChannelIndexOutOfBounds(channel, self.channels));
        }
        let len = self.size.width * self.size.height;
        Ok(&self.data[channel * len..(channel + 1) * len])
    }

    /// Iterate over the channel planes in channel order.
    pub fn planes(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks_exact(self.size.width * self.size.height)
    }

    /// Iterate mutably over the channel planes in channel order.
    pub fn planes_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.data
            .chunks_exact_mut(self.size.width * self.size.height)
    }

    /// Get the underlying planar sample buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get the underlying planar sample buffer mutably.
    pub fn as_slice_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

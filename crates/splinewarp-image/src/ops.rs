use crate::error::ImageError;
use crate::image::{Image, ImageSize};

/// Build a planar image from pixel-interleaved samples.
///
/// # Arguments
///
/// * `data` - Interleaved samples, `channels` values per pixel in row-major
///   pixel order.
/// * `size` - The size of the image in pixels.
/// * `channels` - The number of channels.
///
/// # Errors
///
/// If the data length does not match the image size or a sample cannot be
/// represented as `f64`, an error is returned.
///
/// # Examples
///
/// ```
/// use splinewarp_image::{ops, ImageSize};
///
/// let image = ops::from_interleaved(
///     &[0u8, 10, 1, 11, 2, 12],
///     ImageSize {
///         width: 3,
///         height: 1,
///     },
///     2,
/// )
/// .unwrap();
///
/// assert_eq!(image.plane(0).unwrap(), &[0.0, 1.0, 2.0]);
/// assert_eq!(image.plane(1).unwrap(), &[10.0, 11.0, 12.0]);
/// ```
pub fn from_interleaved<T>(data: &[T], size: ImageSize, channels: usize) -> Result<Image, ImageError>
where
    T: Copy + num_traits::ToPrimitive,
{
    let num_pixels = size.width * size.height;
    if data.len() != num_pixels * channels {
        return Err(ImageError::InvalidChannelShape(
            data.len(),
            num_pixels * channels,
        ));
    }

    let mut planar = vec![0.0; data.len()];
    for (p, pixel) in data.chunks_exact(channels).enumerate() {
        for (ch, &sample) in pixel.iter().enumerate() {
            planar[ch * num_pixels + p] = sample.to_f64().ok_or(ImageError::CastError)?;
        }
    }

    Image::new(size, channels, planar)
}

/// Flatten a planar image into pixel-interleaved samples.
pub fn to_interleaved(image: &Image) -> Vec<f64> {
    let num_pixels = image.width() * image.height();
    let channels = image.num_channels();
    let mut out = vec![0.0; num_pixels * channels];
    for (ch, plane) in image.planes().enumerate() {
        for (p, &sample) in plane.iter().enumerate() {
            out[p * channels + ch] = sample;
        }
    }
    out
}

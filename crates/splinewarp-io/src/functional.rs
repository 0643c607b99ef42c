use std::path::Path;

use image::DynamicImage;

use splinewarp_image::{ops, Image, ImageSize};

use crate::error::IoError;

/// Reads an image from the given file path into a planar `f64` image.
///
/// The method tries any format supported by the image crate. 8-bit images
/// keep their native channel count (grayscale, gray+alpha, RGB, RGBA) with
/// samples in `[0, 255]`; other bit depths are converted to 8-bit RGB first.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// A planar image with one `f64` plane per channel.
pub fn read_image_planar(file_path: impl AsRef<Path>) -> Result<Image, IoError> {
    let file_path = file_path.as_ref();
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::open(file_path)?;
    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    let image = match img {
        DynamicImage::ImageLuma8(buf) => ops::from_interleaved(buf.as_raw(), size, 1)?,
        DynamicImage::ImageLumaA8(buf) => ops::from_interleaved(buf.as_raw(), size, 2)?,
        DynamicImage::ImageRgb8(buf) => ops::from_interleaved(buf.as_raw(), size, 3)?,
        DynamicImage::ImageRgba8(buf) => ops::from_interleaved(buf.as_raw(), size, 4)?,
        other => ops::from_interleaved(other.into_rgb8().as_raw(), size, 3)?,
    };

    Ok(image)
}

/// Writes a planar `f64` image to the given file path.
///
/// Samples are rounded and clamped to 8-bit; the format follows the file
/// extension. Supported channel counts are 1 (grayscale), 2 (gray+alpha),
/// 3 (RGB) and 4 (RGBA).
pub fn write_image_planar(file_path: impl AsRef<Path>, image: &Image) -> Result<(), IoError> {
    let data: Vec<u8> = ops::to_interleaved(image)
        .iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();

    let width = image.width() as u32;
    let height = image.height() as u32;

    let color = match image.num_channels() {
        1 => image::ColorType::L8,
        2 => image::ColorType::La8,
        3 => image::ColorType::Rgb8,
        4 => image::ColorType::Rgba8,
        c => return Err(IoError::UnsupportedChannelCount(c)),
    };

    image::save_buffer(file_path, &data, width, height, color)?;

    Ok(())
}

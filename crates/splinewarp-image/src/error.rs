/// An error type for the image module.
#[derive(thiserror::Error, Debug)]
pub enum ImageError {
    /// Error when the data length does not match the image dimensions.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when a dimension or the channel count is zero.
    #[error("Image dimensions must be non-zero, got {0}x{1}x{2}")]
    ZeroSizedImage(usize, usize, usize),

    /// Error when the channel index is out of bounds.
    #[error("Channel index {0} out of bounds for {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a sample cannot be represented in the target type.
    #[error("Failed to cast sample value to f64")]
    CastError,
}

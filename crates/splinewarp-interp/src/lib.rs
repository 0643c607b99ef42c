#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// boundary extension rules and lattice index resolution.
pub mod boundary;

/// centered B-spline basis kernels.
pub mod kernel;

/// recursive prefilter poles, gains and truncation horizons.
pub mod poles;

/// spline coefficient plans and arbitrary-coordinate evaluation.
pub mod plan;

/// homography utilities and image warping.
pub mod warp;

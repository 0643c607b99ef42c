//! Homography utilities and spline-interpolated image warping.

use rayon::prelude::*;

use splinewarp_image::{ops, Image, ImageError, ImageSize};

use crate::plan::{Plan, PlanConfig, PlanError};

/// An error type for warp operations.
#[derive(thiserror::Error, Debug)]
pub enum WarpError {
    /// The transform matrix cannot be inverted.
    #[error("Homography determinant is zero")]
    SingularHomography,

    /// Plan construction failed.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// The output image could not be assembled.
    #[error(transparent)]
    Image(#[from] ImageError),
}

#[rustfmt::skip]
fn determinant3x3(m: &[f64; 9]) -> f64 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) -
    m[1] * (m[3] * m[8] - m[5] * m[6]) +
    m[2] * (m[3] * m[7] - m[4] * m[6])
}

#[rustfmt::skip]
fn adjugate3x3(m: &[f64; 9]) -> [f64; 9] {
    [
        m[4] * m[8] - m[5] * m[7],  // [0, 0]
        m[2] * m[7] - m[1] * m[8],  // [0, 1]
        m[1] * m[5] - m[2] * m[4],  // [0, 2]
        m[5] * m[6] - m[3] * m[8],  // [1, 0]
        m[0] * m[8] - m[2] * m[6],  // [1, 1]
        m[2] * m[3] - m[0] * m[5],  // [1, 2]
        m[3] * m[7] - m[4] * m[6],  // [2, 0]
        m[1] * m[6] - m[0] * m[7],  // [2, 1]
        m[0] * m[4] - m[1] * m[3],  // [2, 2]
    ]
}

/// Invert a 3x3 homography.
///
/// # Errors
///
/// Returns [`WarpError::SingularHomography`] when the determinant is zero.
pub fn invert_homography(m: &[f64; 9]) -> Result<[f64; 9], WarpError> {
    let det = determinant3x3(m);
    if det == 0.0 {
        return Err(WarpError::SingularHomography);
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut inv_m = [0.0; 9];
    for (out, a) in inv_m.iter_mut().zip(adj.iter()) {
        *out = a * inv_det;
    }

    Ok(inv_m)
}

/// Apply a homography to a point.
pub fn apply_homography(m: &[f64; 9], x: f64, y: f64) -> (f64, f64) {
    let w = m[6] * x + m[7] * y + m[8];
    (
        (m[0] * x + m[1] * y + m[2]) / w,
        (m[3] * x + m[4] * y + m[5]) / w,
    )
}

/// Warp an image with a homography into an output of the same size anchored
/// at the origin.
///
/// `m` maps source coordinates to output coordinates. See
/// [`warp_homography_geom`] for a custom output area.
pub fn warp_homography(
    src: &Image,
    m: &[f64; 9],
    config: &PlanConfig,
) -> Result<Image, WarpError> {
    warp_homography_geom(src, m, config, 0.0, 0.0, src.size())
}

/// Warp an image with a homography into an output area of `size` whose
/// top-left pixel sits at `(x0, y0)` in output coordinates.
///
/// The source is prefiltered into a [`Plan`] once; every output pixel is
/// pulled through the inverse map and interpolated on the plan, rows in
/// parallel.
///
/// # Example
///
/// ```
/// use splinewarp_image::{Image, ImageSize};
/// use splinewarp_interp::plan::PlanConfig;
/// use splinewarp_interp::warp::warp_homography;
///
/// let src = Image::from_size_val(ImageSize { width: 4, height: 5 }, 1, 0.0).unwrap();
/// let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
///
/// let dst = warp_homography(&src, &m, &PlanConfig::default()).unwrap();
///
/// assert_eq!(dst.size().width, 4);
/// assert_eq!(dst.size().height, 5);
/// ```
pub fn warp_homography_geom(
    src: &Image,
    m: &[f64; 9],
    config: &PlanConfig,
    x0: f64,
    y0: f64,
    size: ImageSize,
) -> Result<Image, WarpError> {
    let inv_m = invert_homography(m)?;
    let plan = Plan::new(src, config)?;
    let margin = plan.margin() as f64;

    let channels = src.num_channels();
    let mut interleaved = vec![0.0; size.width * size.height * channels];
    interleaved
        .par_chunks_mut(size.width * channels)
        .enumerate()
        .for_each(|(j, row)| {
            let py = y0 + j as f64;
            for (i, pixel) in row.chunks_exact_mut(channels).enumerate() {
                let (qx, qy) = apply_homography(&inv_m, x0 + i as f64, py);
                plan.sample_into(qx + margin, qy + margin, pixel);
            }
        });

    Ok(ops::from_interleaved(&interleaved, size, channels)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryExt;
    use crate::plan::DEFAULT_ORDER;
    use approx::assert_abs_diff_eq;

    fn identity() -> [f64; 9] {
        [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]
    }

    #[test]
    fn invert_translation() -> Result<(), WarpError> {
        let m = [1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
        let expected = [1.0, 0.0, 1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0];
        let inv_m = invert_homography(&m)?;
        assert_eq!(inv_m, expected);
        Ok(())
    }

    #[test]
    fn invert_singular_fails() {
        let m = [1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.0];
        assert!(matches!(
            invert_homography(&m),
            Err(WarpError::SingularHomography)
        ));
    }

    #[test]
    fn apply_translation() {
        let m = [1.0, 0.0, -1.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0];
        let (x, y) = apply_homography(&m, 1.0, 1.0);
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 2.0);
    }

    #[test]
    fn apply_projective_division() {
        let m = [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0];
        // scale-equivalent matrices act identically
        let (x, y) = apply_homography(&m, 3.0, -1.5);
        assert_abs_diff_eq!(x, 3.0);
        assert_abs_diff_eq!(y, -1.5);
    }

    #[test]
    fn identity_warp_reproduces_the_image() -> Result<(), WarpError> {
        let size = ImageSize {
            width: 12,
            height: 9,
        };
        let mut data = Vec::new();
        for ch in 0..2 {
            for j in 0..size.height {
                for i in 0..size.width {
                    data.push(((i * 13 + j * 29 + ch * 5) % 11) as f64);
                }
            }
        }
        let src = Image::new(size, 2, data)?;

        for boundary in [
            BoundaryExt::Periodic,
            BoundaryExt::HalfSymmetric,
            BoundaryExt::WholeSymmetric,
        ] {
            let config = PlanConfig {
                order: DEFAULT_ORDER,
                boundary,
                eps: 1e-6,
                ..Default::default()
            };
            let dst = warp_homography(&src, &identity(), &config)?;
            assert_eq!(dst.size(), src.size());
            assert_eq!(dst.num_channels(), 2);
            // eps is relative to the sample magnitude and stacks over the
            // pole cascade, hence the slack on the absolute comparison
            for (a, b) in dst.as_slice().iter().zip(src.as_slice().iter()) {
                assert_abs_diff_eq!(a, b, epsilon = 1e-4);
            }
        }
        Ok(())
    }

    #[test]
    fn horizontal_flip_warp() -> Result<(), WarpError> {
        let src = Image::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            1,
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        )?;

        // flip about the vertical axis through x = 0.5
        let m = [-1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let config = PlanConfig {
            order: 1,
            boundary: BoundaryExt::HalfSymmetric,
            ..Default::default()
        };
        let dst = warp_homography(&src, &m, &config)?;

        let expected = [1.0, 0.0, 3.0, 2.0, 5.0, 4.0];
        for (a, b) in dst.plane(0)?.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
        Ok(())
    }

    #[test]
    fn shifted_output_geometry() -> Result<(), WarpError> {
        let src = Image::new(
            ImageSize {
                width: 4,
                height: 4,
            },
            1,
            (0..16).map(|v| v as f64).collect(),
        )?;

        // reading the output one pixel to the right of the origin shifts the
        // image content one pixel to the left
        let config = PlanConfig {
            order: 1,
            boundary: BoundaryExt::Periodic,
            ..Default::default()
        };
        let dst = warp_homography_geom(
            &src,
            &identity(),
            &config,
            1.0,
            0.0,
            ImageSize {
                width: 3,
                height: 4,
            },
        )?;

        for j in 0..4 {
            for i in 0..3 {
                assert_abs_diff_eq!(
                    dst.plane(0)?[j * 3 + i],
                    src.plane(0)?[j * 4 + i + 1],
                    epsilon = 1e-12
                );
            }
        }
        Ok(())
    }
}

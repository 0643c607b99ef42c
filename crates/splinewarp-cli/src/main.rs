//! Homographic transformation of an image using B-spline interpolation.
//!
//! The interpolation itself lives in `splinewarp-interp`; this binary only
//! parses the driver arguments, decodes the image, computes the output
//! geometry and writes the result.

use std::path::PathBuf;
use std::time::Instant;

use argh::FromArgs;

use splinewarp_image::ImageSize;
use splinewarp_interp::boundary::BoundaryExt;
use splinewarp_interp::plan::{PlanConfig, DEFAULT_ORDER};
use splinewarp_interp::warp::{apply_homography, warp_homography_geom};

#[derive(FromArgs)]
/// Homographic transformation of an image using B-spline interpolation
struct Args {
    /// nine homography coefficients ("h11 h12 h13; h21 h22 h23; h31 h32 h33")
    #[argh(positional)]
    homography: String,

    /// filename of the input image
    #[argh(positional)]
    input: PathBuf,

    /// filename of the output image
    #[argh(positional)]
    output: PathBuf,

    /// order of interpolation (integer between 0 and 16, default 11)
    #[argh(option, short = 'n', default = "DEFAULT_ORDER")]
    order: usize,

    /// boundary extension (constant, periodic, hsymmetric, wsymmetric)
    #[argh(option, short = 'b', default = "String::from(\"hsymmetric\")")]
    boundary: String,

    /// relative precision (default 6; eps >= 1 means 10^-eps)
    #[argh(option, short = 'e', default = "6.0")]
    eps: f64,

    /// compute on a larger domain instead of the exact one
    #[argh(switch, short = 'l')]
    larger: bool,

    /// area of output: WxH, WxH+X+Y, auto or center
    #[argh(option, short = 'g')]
    geometry: Option<String>,
}

/// An error type for driver argument handling.
#[derive(thiserror::Error, Debug)]
enum CliError {
    /// The homography string did not contain nine numbers.
    #[error("Homography must contain 9 numeric coefficients, got {0:?}")]
    BadHomography(String),

    /// The boundary name matched no known extension.
    #[error("Unknown boundary condition {0:?}")]
    UnknownBoundary(String),

    /// The geometry specification could not be parsed.
    #[error("Wrong format for geometry {0:?}")]
    BadGeometry(String),
}

/// Parse nine homography coefficients separated by spaces, commas or
/// semicolons.
fn parse_homography(spec: &str) -> Result<[f64; 9], CliError> {
    let values: Vec<f64> = spec
        .split(|c: char| c.is_whitespace() || c == ';' || c == ',')
        .filter(|token| !token.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| CliError::BadHomography(spec.to_string()))?;

    values
        .try_into()
        .map_err(|_| CliError::BadHomography(spec.to_string()))
}

/// Match a boundary name, accepting unambiguous prefixes like the original
/// driver ("hsym" selects hsymmetric).
fn parse_boundary(name: &str) -> Result<BoundaryExt, CliError> {
    const NAMES: [(&str, BoundaryExt); 4] = [
        ("constant", BoundaryExt::Constant),
        ("periodic", BoundaryExt::Periodic),
        ("hsymmetric", BoundaryExt::HalfSymmetric),
        ("wsymmetric", BoundaryExt::WholeSymmetric),
    ];
    if !name.is_empty() {
        for (full, boundary) in NAMES {
            if full.starts_with(name) {
                return Ok(boundary);
            }
        }
    }
    Err(CliError::UnknownBoundary(name.to_string()))
}

/// Precision values >= 1 select a power of ten, `10^-eps`.
fn fix_precision(eps: f64) -> f64 {
    if eps >= 1.0 {
        let mut tmp = 1.0;
        let mut i = 0.0;
        while i < eps {
            tmp *= 0.1;
            i += 1.0;
        }
        tmp
    } else {
        eps
    }
}

/// Resolve the output area: an explicit "WxH" or "WxH+X+Y" box, "auto" for
/// the bounding box of the transformed input corners, or "center" to keep
/// the image center fixed.
fn parse_geometry(
    spec: &str,
    homography: &[f64; 9],
    width: usize,
    height: usize,
) -> Result<(f64, f64, ImageSize), CliError> {
    let size = ImageSize { width, height };
    let bad = || CliError::BadGeometry(spec.to_string());

    if !spec.is_empty() && "center".starts_with(spec) {
        let (cx, cy) = apply_homography(homography, width as f64 / 2.0, height as f64 / 2.0);
        return Ok((cx - width as f64 / 2.0, cy - height as f64 / 2.0, size));
    }

    if !spec.is_empty() && "auto".starts_with(spec) {
        let corners = [
            (0.0, 0.0),
            (width as f64, 0.0),
            (0.0, height as f64),
            (width as f64, height as f64),
        ];
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for (x, y) in corners {
            let (tx, ty) = apply_homography(homography, x, y);
            min_x = min_x.min(tx);
            min_y = min_y.min(ty);
            max_x = max_x.max(tx);
            max_y = max_y.max(ty);
        }
        let out = ImageSize {
            width: (max_x - min_x).ceil() as usize,
            height: (max_y - min_y).ceil() as usize,
        };
        return Ok((min_x, min_y, out));
    }

    // WxH with optional +X+Y offsets (negative offsets use '-')
    let (w_str, rest) = spec.split_once('x').ok_or_else(bad)?;
    let w: usize = w_str.parse().map_err(|_| bad())?;
    let (h_str, offsets) = match rest.find(['+', '-']) {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    };
    let h: usize = h_str.parse().map_err(|_| bad())?;
    if w == 0 || h == 0 {
        return Err(bad());
    }

    let (x0, y0) = if offsets.is_empty() {
        (0.0, 0.0)
    } else {
        let second = offsets[1..].find(['+', '-']).map(|p| p + 1).ok_or_else(bad)?;
        let x0: f64 = offsets[..second].parse().map_err(|_| bad())?;
        let y0: f64 = offsets[second..].parse().map_err(|_| bad())?;
        (x0, y0)
    };

    Ok((
        x0,
        y0,
        ImageSize {
            width: w,
            height: h,
        },
    ))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();

    let homography = parse_homography(&args.homography)?;
    let boundary = parse_boundary(&args.boundary)?;
    let eps = fix_precision(args.eps);

    let mut larger = args.larger;
    if boundary == BoundaryExt::Constant && !larger {
        log::warn!(
            "the constant extension is not compatible with computations \
             in the exact domain; parameter 'larger' changed to 1"
        );
        larger = true;
    }

    let config = PlanConfig {
        order: args.order,
        boundary,
        eps,
        enlarge: larger,
        fill: 0.0,
    };
    config.validate()?;

    let image = splinewarp_io::read_image_planar(&args.input)?;

    let (x0, y0, out_size) = match &args.geometry {
        Some(spec) => parse_geometry(spec, &homography, image.width(), image.height())?,
        None => (0.0, 0.0, image.size()),
    };

    let start = Instant::now();
    let out = warp_homography_geom(&image, &homography, &config, x0, y0, out_size)?;
    log::info!("interpolation: {:.3} s", start.elapsed().as_secs_f64());

    splinewarp_io::write_image_planar(&args.output, &out)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSLATION: [f64; 9] = [1.0, 0.0, 5.0, 0.0, 1.0, -3.0, 0.0, 0.0, 1.0];

    #[test]
    fn homography_accepts_mixed_separators() {
        let h = parse_homography("1 0 5; 0 1 -3; 0 0 1").unwrap();
        assert_eq!(h, TRANSLATION);

        let h = parse_homography("1,0,5,0,1,-3,0,0,1").unwrap();
        assert_eq!(h, TRANSLATION);
    }

    #[test]
    fn homography_rejects_wrong_counts() {
        assert!(parse_homography("1 2 3").is_err());
        assert!(parse_homography("1 2 3 4 5 6 7 8 9 10").is_err());
        assert!(parse_homography("1 2 3 4 5 six 7 8 9").is_err());
    }

    #[test]
    fn boundary_names_and_prefixes() {
        assert_eq!(parse_boundary("periodic").unwrap(), BoundaryExt::Periodic);
        assert_eq!(parse_boundary("per").unwrap(), BoundaryExt::Periodic);
        assert_eq!(
            parse_boundary("hsym").unwrap(),
            BoundaryExt::HalfSymmetric
        );
        assert_eq!(
            parse_boundary("wsymmetric").unwrap(),
            BoundaryExt::WholeSymmetric
        );
        assert_eq!(parse_boundary("c").unwrap(), BoundaryExt::Constant);
        assert!(parse_boundary("mirror").is_err());
        assert!(parse_boundary("").is_err());
    }

    #[test]
    fn precision_powers_of_ten() {
        assert!((fix_precision(6.0) - 1e-6).abs() < 1e-18);
        assert!((fix_precision(1.0) - 1e-1).abs() < 1e-12);
        assert_eq!(fix_precision(0.5), 0.5);
        assert_eq!(fix_precision(1e-4), 1e-4);
    }

    #[test]
    fn geometry_explicit_boxes() {
        let (x0, y0, size) = parse_geometry("300x200", &TRANSLATION, 10, 8).unwrap();
        assert_eq!((x0, y0), (0.0, 0.0));
        assert_eq!(size, ImageSize { width: 300, height: 200 });

        let (x0, y0, size) = parse_geometry("300x200+10-20", &TRANSLATION, 10, 8).unwrap();
        assert_eq!((x0, y0), (10.0, -20.0));
        assert_eq!(size, ImageSize { width: 300, height: 200 });

        let (x0, y0, _) = parse_geometry("30x40-5+6", &TRANSLATION, 10, 8).unwrap();
        assert_eq!((x0, y0), (-5.0, 6.0));
    }

    #[test]
    fn geometry_auto_is_the_corner_bounding_box() {
        let (x0, y0, size) = parse_geometry("auto", &TRANSLATION, 10, 8).unwrap();
        assert_eq!((x0, y0), (5.0, -3.0));
        assert_eq!(size, ImageSize { width: 10, height: 8 });

        // prefix match as in the original driver
        let (x0, _, _) = parse_geometry("a", &TRANSLATION, 10, 8).unwrap();
        assert_eq!(x0, 5.0);
    }

    #[test]
    fn geometry_center_keeps_the_center_fixed() {
        let (x0, y0, size) = parse_geometry("center", &TRANSLATION, 10, 8).unwrap();
        assert_eq!((x0, y0), (5.0, -3.0));
        assert_eq!(size, ImageSize { width: 10, height: 8 });
    }

    #[test]
    fn geometry_rejects_malformed_specs() {
        for spec in ["300x", "x200", "0x10", "10x0", "300x200+1", "wxh", ""] {
            assert!(
                parse_geometry(spec, &TRANSLATION, 10, 8).is_err(),
                "{spec:?} should be rejected"
            );
        }
    }
}

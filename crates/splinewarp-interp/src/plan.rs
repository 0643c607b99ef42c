//! Spline coefficient plans.
//!
//! A [`Plan`] is the prepared form of an image for interpolation: the
//! separable recursive prefilter turns the samples of every channel into
//! B-spline coefficients once, after which the plan can be evaluated at any
//! continuous coordinate, any number of times, from any thread. Dropping the
//! plan releases the coefficient storage.

use rayon::prelude::*;

use splinewarp_image::{Image, ImageSize};

use crate::boundary::{map_index, BoundaryExt};
use crate::kernel;
use crate::poles;

/// Default spline order of the driver.
pub const DEFAULT_ORDER: usize = 11;

/// An error type for plan construction.
#[derive(thiserror::Error, Debug)]
pub enum PlanError {
    /// The requested order exceeds the supported maximum.
    #[error("Spline order {0} exceeds the maximum of {max}", max = kernel::MAX_ORDER)]
    UnsupportedOrder(usize),

    /// The precision parameter is outside the open unit interval.
    #[error("Precision must lie in (0, 1), got {0}")]
    InvalidEps(f64),

    /// The coefficient buffers could not be allocated.
    #[error("Failed to allocate {0} coefficient samples")]
    Allocation(usize),
}

/// Configuration for building a [`Plan`].
#[derive(Debug, Clone, Copy)]
pub struct PlanConfig {
    /// Spline order in `0..=MAX_ORDER`.
    pub order: usize,
    /// Boundary extension rule.
    pub boundary: BoundaryExt,
    /// Relative truncation tolerance in (0, 1) for the prefilter
    /// initialization series.
    pub eps: f64,
    /// Prefilter an enlarged domain so every coefficient an in-domain query
    /// touches is explicitly filtered. `Constant` boundaries force this.
    pub enlarge: bool,
    /// Virtual sample value for the `Constant` extension.
    pub fill: f64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            boundary: BoundaryExt::HalfSymmetric,
            eps: 1e-6,
            enlarge: false,
            fill: 0.0,
        }
    }
}

impl PlanConfig {
    /// Check the order and precision bounds.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.order > kernel::MAX_ORDER {
            return Err(PlanError::UnsupportedOrder(self.order));
        }
        if !(self.eps > 0.0 && self.eps < 1.0) {
            return Err(PlanError::InvalidEps(self.eps));
        }
        Ok(())
    }
}

/// The extension geometry of one filtered line.
///
/// A line covers the working domain; the original domain of `len` samples
/// starts `margin` slots into it. Virtual samples outside the line resolve
/// through the boundary rule against the original domain, so the exact and
/// the enlarged case share one code path.
#[derive(Clone, Copy)]
struct LineDomain {
    len: usize,
    margin: usize,
    boundary: BoundaryExt,
    fill: f64,
}

impl LineDomain {
    fn virtual_sample(&self, raw: &[f64], i: isize) -> f64 {
        if (0..raw.len() as isize).contains(&i) {
            return raw[i as usize];
        }
        match map_index(i - self.margin as isize, self.len, self.boundary) {
            Some(j) => raw[self.margin + j],
            None => self.fill,
        }
    }

    fn period(&self) -> Option<usize> {
        self.boundary.period(self.len)
    }

    /// Number of series terms for the initialization sums: always one full
    /// period for `Periodic` (exact, zero truncation error), otherwise the
    /// precision horizon capped at one reflection period.
    fn init_terms(&self, period: usize, z: f64, eps: f64) -> usize {
        match self.boundary {
            BoundaryExt::Periodic => period,
            _ => poles::horizon(z, eps).min(period),
        }
    }
}

/// First value of the causal recursion: the geometric series of the signal
/// extended to the left, truncated by the precision horizon and closed
/// exactly once one extension period is covered.
fn causal_init(raw: &[f64], domain: &LineDomain, z: f64, eps: f64) -> f64 {
    match domain.period() {
        // constant extension: every virtual sample to the left is the fill
        None => raw[0] + domain.fill * z / (1.0 - z),
        Some(period) => {
            let terms = domain.init_terms(period, z, eps);
            let mut sum = 0.0;
            let mut zk = 1.0;
            for k in 0..terms {
                sum += zk * domain.virtual_sample(raw, -(k as isize));
                zk *= z;
            }
            if terms == period {
                // zk is z^period; the remaining tail repeats with that ratio
                sum /= 1.0 - zk;
            }
            sum
        }
    }
}

/// Last value of the anticausal recursion, obtained by continuing the causal
/// recursion past the end of the line and summing its geometric series with
/// the same horizon and periodic closure as [`causal_init`].
fn anticausal_init(
    c_last: f64,
    raw: &[f64],
    domain: &LineDomain,
    z: f64,
    g: f64,
    eps: f64,
) -> f64 {
    let last = raw.len() as isize - 1;
    match domain.period() {
        None => {
            // constant extension: the continued recursion decays towards the
            // fixed point of a constant input
            let a = g * domain.fill / (1.0 - z);
            -(z * a / (1.0 - z) + z * (c_last - a) / (1.0 - z * z))
        }
        Some(period) => {
            let terms = domain.init_terms(period, z, eps);
            let mut acc = 0.0;
            let mut zk = z;
            let mut c = c_last;
            for k in 0..terms {
                if k > 0 {
                    c = g * domain.virtual_sample(raw, last + k as isize) + z * c;
                }
                acc += zk * c;
                zk *= z;
            }
            if terms == period {
                // an exactly initialized causal pass makes the continued
                // recursion periodic, closing the remaining tail
                acc /= 1.0 - z.powi(period as i32);
            }
            -acc
        }
    }
}

/// Apply the full recursive prefilter to one line, in place.
///
/// Per pole: a causal forward recursion `c[i] = g*x[i] + z*c[i-1]` followed
/// by an anticausal backward recursion `d[i] = z*(d[i+1] - c[i])`, with the
/// per-pole gain `g` folded into the forward pass. `raw` is scratch for the
/// line's pre-pass values, which the initializers read through the boundary
/// mapping.
fn filter_line(line: &mut [f64], domain: &LineDomain, poles: &[f64], eps: f64, raw: &mut Vec<f64>) {
    for &z in poles {
        raw.clear();
        raw.extend_from_slice(line);
        let g = poles::gain(z);

        line[0] = g * causal_init(raw, domain, z, eps);
        for i in 1..line.len() {
            line[i] = g * line[i] + z * line[i - 1];
        }

        let last = line.len() - 1;
        line[last] = anticausal_init(line[last], raw, domain, z, g, eps);
        for i in (0..last).rev() {
            line[i] = z * (line[i + 1] - line[i]);
        }
    }
}

/// Margin of the enlarged domain: far enough that the initialization error
/// at the enlarged border has decayed below eps before it can reach any
/// coefficient an in-domain query touches.
fn enlarged_margin(order: usize, eps: f64, poles: &[f64]) -> usize {
    let reach = kernel::support(order).div_ceil(2);
    match poles.first() {
        Some(&z) => poles::horizon(z, eps) + reach,
        None => reach,
    }
}

/// Prefiltered spline-coefficient representation of an image.
///
/// Built once per image with [`Plan::new`], evaluated with [`Plan::sample`]
/// or [`Plan::sample_into`], released on drop.
#[derive(Debug, Clone)]
pub struct Plan {
    size: ImageSize,
    source: ImageSize,
    channels: usize,
    margin: usize,
    config: PlanConfig,
    poles: Vec<f64>,
    coeffs: Vec<f64>,
}

impl Plan {
    /// Prefilter `image` into a coefficient plan.
    ///
    /// Each channel runs through the separable filter independently: one
    /// pass along rows, one along columns, every line initialized per the
    /// boundary rule and the precision bound. Lines within a pass are
    /// filtered in parallel; the column pass starts after the row pass
    /// completes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unsupported order or precision,
    /// and [`PlanError::Allocation`] if the coefficient storage cannot be
    /// reserved. No partial plan is ever returned.
    pub fn new(image: &Image, config: &PlanConfig) -> Result<Self, PlanError> {
        config.validate()?;

        let mut config = *config;
        // constant extension cannot be folded into the coefficient index at
        // evaluation time, so it always works on the enlarged domain
        if config.boundary == BoundaryExt::Constant {
            config.enlarge = true;
        }

        let poles = poles::poles(config.order);
        let margin = if config.enlarge {
            enlarged_margin(config.order, config.eps, &poles)
        } else {
            0
        };

        let source = image.size();
        let size = ImageSize {
            width: source.width + 2 * margin,
            height: source.height + 2 * margin,
        };
        let plane_len = size.width * size.height;
        let total = plane_len * image.num_channels();

        let mut coeffs = try_alloc(total)?;
        let mut rows = try_alloc(plane_len)?;
        let mut cols = try_alloc(plane_len)?;

        let x_domain = LineDomain {
            len: source.width,
            margin,
            boundary: config.boundary,
            fill: config.fill,
        };
        let y_domain = LineDomain {
            len: source.height,
            margin,
            boundary: config.boundary,
            fill: config.fill,
        };

        log::debug!(
            "prefiltering {}x{}x{} into {}x{} ({} poles, margin {})",
            source.width,
            source.height,
            image.num_channels(),
            size.width,
            size.height,
            poles.len(),
            margin
        );

        for (ch, plane) in image.planes().enumerate() {
            // row pass over the enlarged height
            rows.par_chunks_mut(size.width).enumerate().for_each_init(
                Vec::new,
                |scratch, (jp, line)| {
                    match map_index(jp as isize - margin as isize, source.height, config.boundary) {
                        Some(j) => {
                            let src = &plane[j * source.width..(j + 1) * source.width];
                            for (i, v) in line.iter_mut().enumerate() {
                                *v = match map_index(
                                    i as isize - margin as isize,
                                    source.width,
                                    config.boundary,
                                ) {
                                    Some(col) => src[col],
                                    None => config.fill,
                                };
                            }
                            filter_line(line, &x_domain, &poles, config.eps, scratch);
                        }
                        // a constant-extension margin row prefilters to the fill
                        None => line.fill(config.fill),
                    }
                },
            );

            // column pass on the transposed buffer
            cols.par_chunks_mut(size.height).enumerate().for_each_init(
                Vec::new,
                |scratch, (i, line)| {
                    for (j, v) in line.iter_mut().enumerate() {
                        *v = rows[j * size.width + i];
                    }
                    filter_line(line, &y_domain, &poles, config.eps, scratch);
                },
            );

            // transpose back into the channel's coefficient plane
            coeffs[ch * plane_len..(ch + 1) * plane_len]
                .par_chunks_mut(size.width)
                .enumerate()
                .for_each(|(j, row)| {
                    for (i, v) in row.iter_mut().enumerate() {
                        *v = cols[i * size.height + j];
                    }
                });
        }

        Ok(Self {
            size,
            source,
            channels: image.num_channels(),
            margin,
            config,
            poles,
            coeffs,
        })
    }

    /// Working-domain dimensions of the coefficient planes.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Dimensions of the source image.
    pub fn source_size(&self) -> ImageSize {
        self.source
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// Spline order of the plan.
    pub fn order(&self) -> usize {
        self.config.order
    }

    /// Boundary extension rule of the plan.
    pub fn boundary(&self) -> BoundaryExt {
        self.config.boundary
    }

    /// Offset of the source domain inside the working domain.
    ///
    /// Queries expressed in source coordinates must be shifted by this
    /// amount on both axes; zero unless the plan was built enlarged.
    pub fn margin(&self) -> usize {
        self.margin
    }

    /// Prefilter poles of the configured order.
    pub fn poles(&self) -> &[f64] {
        &self.poles
    }

    /// One channel's coefficient plane, `size().width * size().height`
    /// values, or `None` for an out-of-range channel.
    pub fn coefficients(&self, channel: usize) -> Option<&[f64]> {
        let plane_len = self.size.width * self.size.height;
        self.coeffs
            .get(channel * plane_len..(channel + 1) * plane_len)
    }

    /// Interpolate all channels at a continuous working-domain coordinate.
    ///
    /// `out` must hold at least `num_channels()` values. Channels share the
    /// same spatial weights and are accumulated in one pass over the support
    /// window. Evaluation never mutates the plan, so shared references can
    /// be used from several threads at once.
    pub fn sample_into(&self, x: f64, y: f64, out: &mut [f64]) {
        let order = self.config.order;
        let taps = kernel::support(order);

        let mut wx = [0.0f64; kernel::MAX_ORDER + 1];
        let mut wy = [0.0f64; kernel::MAX_ORDER + 1];
        let bx = kernel::tap_weights(order, x, &mut wx);
        let by = kernel::tap_weights(order, y, &mut wy);

        let (wp, hp) = (self.size.width, self.size.height);
        let plane_len = wp * hp;

        let out = &mut out[..self.channels];
        out.fill(0.0);
        for (l, &wyl) in wy[..taps].iter().enumerate() {
            let row = map_index(by + l as isize, hp, self.config.boundary);
            for (k, &wxk) in wx[..taps].iter().enumerate() {
                let w = wyl * wxk;
                let col = map_index(bx + k as isize, wp, self.config.boundary);
                match (row, col) {
                    (Some(r), Some(c)) => {
                        let idx = r * wp + c;
                        for (ch, acc) in out.iter_mut().enumerate() {
                            *acc += w * self.coeffs[ch * plane_len + idx];
                        }
                    }
                    // outside the enlarged buffer the constant extension
                    // contributes its fill value
                    _ => {
                        for acc in out.iter_mut() {
                            *acc += w * self.config.fill;
                        }
                    }
                }
            }
        }
    }

    /// Interpolate all channels at a continuous working-domain coordinate,
    /// returning a freshly allocated pixel.
    pub fn sample(&self, x: f64, y: f64) -> Vec<f64> {
        let mut out = vec![0.0; self.channels];
        self.sample_into(x, y, &mut out);
        out
    }
}

fn try_alloc(len: usize) -> Result<Vec<f64>, PlanError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| PlanError::Allocation(len))?;
    buf.resize(len, 0.0);
    Ok(buf)
}

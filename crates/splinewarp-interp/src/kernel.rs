//! Centered B-spline basis kernels.
//!
//! The basis of order `n` is the n-fold self-convolution of the unit box; it
//! is nonzero on `(-(n+1)/2, (n+1)/2)` and touches `n + 1` lattice points per
//! axis. Orders 0..=3 use the closed-form piecewise polynomials; higher
//! orders are evaluated with the self-convolution recursion.

/// Highest supported spline order.
pub const MAX_ORDER: usize = 16;

/// Number of lattice taps per axis for a given order.
pub const fn support(order: usize) -> usize {
    order + 1
}

/// Value of the centered B-spline basis of `order` at offset `t`.
///
/// Order 0 treats its cell as half-open, `[-1/2, 1/2)`, so that the tap
/// weights of any query coordinate always sum to one.
pub fn weight(order: usize, t: f64) -> f64 {
    debug_assert!(order <= MAX_ORDER);
    match order {
        0 => {
            if (-0.5..0.5).contains(&t) {
                1.0
            } else {
                0.0
            }
        }
        1 => (1.0 - t.abs()).max(0.0),
        2 => {
            let a = t.abs();
            if a < 0.5 {
                0.75 - a * a
            } else if a < 1.5 {
                let d = a - 1.5;
                0.5 * d * d
            } else {
                0.0
            }
        }
        3 => {
            let a = t.abs();
            if a < 1.0 {
                (0.5 * a - 1.0) * a * a + 2.0 / 3.0
            } else if a < 2.0 {
                let d = 2.0 - a;
                d * d * d / 6.0
            } else {
                0.0
            }
        }
        _ => weight_by_convolution(order, t),
    }
}

/// Self-convolution recursion, evaluated bottom-up.
///
/// Level `d` needs the order-`d-1` values at `t ± 1/2`, so level 0 starts
/// from the box kernel sampled at `t + (order - d)/2 - j` and each level
/// consumes one slot of the scratch row.
fn weight_by_convolution(order: usize, t: f64) -> f64 {
    let radius = 0.5 * (order as f64 + 1.0);
    if t.abs() >= radius {
        return 0.0;
    }

    let mut v = [0.0f64; MAX_ORDER + 1];
    for (j, vj) in v.iter_mut().enumerate().take(order + 1) {
        let s = t + 0.5 * order as f64 - j as f64;
        *vj = if (-0.5..0.5).contains(&s) { 1.0 } else { 0.0 };
    }
    for d in 1..=order {
        let half = 0.5 * (d as f64 + 1.0);
        for j in 0..=(order - d) {
            let s = t + 0.5 * (order - d) as f64 - j as f64;
            v[j] = ((s + half) * v[j] + (half - s) * v[j + 1]) / d as f64;
        }
    }
    v[0]
}

/// Index of the first lattice tap for a query coordinate.
///
/// Odd orders center the window on `floor(x)`, even orders on the nearest
/// lattice point.
pub fn tap_base(order: usize, x: f64) -> isize {
    if order % 2 == 1 {
        (x.floor() as isize) - (order as isize - 1) / 2
    } else {
        ((x + 0.5).floor() as isize) - order as isize / 2
    }
}

/// Fill `out[0..=order]` with the tap weights for coordinate `x` and return
/// the lattice index of the first tap.
pub fn tap_weights(order: usize, x: f64, out: &mut [f64]) -> isize {
    let base = tap_base(order, x);
    for (k, w) in out.iter_mut().enumerate().take(order + 1) {
        *w = weight(order, x - (base + k as isize) as f64);
    }
    base
}

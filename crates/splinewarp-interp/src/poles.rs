//! Poles of the direct B-spline prefilter.
//!
//! The prefilter inverts the discrete convolution with the sampled kernel.
//! Its transfer function factors into first-order causal/anticausal pairs,
//! one per root of the sampled-kernel z-transform inside the unit circle.
//! All those roots are simple, real and negative, which keeps the recursive
//! implementation numerically benign.

use crate::kernel;

/// Number of prefilter poles for a spline order.
pub const fn pole_count(order: usize) -> usize {
    order / 2
}

/// Real poles in `(-1, 0)` of the prefilter for `order`, sorted by
/// decreasing magnitude.
///
/// Orders 0 and 1 need no prefiltering. Orders 2..=5 use the published
/// radicals; higher orders are isolated numerically from the sampled-kernel
/// z-transform.
pub fn poles(order: usize) -> Vec<f64> {
    debug_assert!(order <= kernel::MAX_ORDER);
    match order {
        0 | 1 => Vec::new(),
        2 => vec![8f64.sqrt() - 3.0],
        3 => vec![3f64.sqrt() - 2.0],
        4 => vec![
            (664.0 - 438976f64.sqrt()).sqrt() + 304f64.sqrt() - 19.0,
            (664.0 + 438976f64.sqrt()).sqrt() - 304f64.sqrt() - 19.0,
        ],
        5 => vec![
            0.5 * ((270.0 - 70980f64.sqrt()).sqrt() + 105f64.sqrt() - 13.0),
            0.5 * ((270.0 + 70980f64.sqrt()).sqrt() - 105f64.sqrt() - 13.0),
        ],
        _ => solve_poles(order),
    }
}

/// Normalizing gain of the first-order cascade for pole `z`.
///
/// With this gain the causal/anticausal pair has unit DC gain, so the
/// coefficients of a constant signal are that constant.
pub fn gain(z: f64) -> f64 {
    (1.0 - z) * (1.0 - 1.0 / z)
}

/// Number of series terms after which the remaining tail of the geometric
/// initialization sum stays below `eps`.
///
/// The tail after `k` terms is bounded by `|z|^k / (1 - |z|)` relative to
/// the signal magnitude.
pub fn horizon(z: f64, eps: f64) -> usize {
    let az = z.abs();
    let k = (eps * (1.0 - az)).ln() / az.ln();
    if k.is_finite() && k > 1.0 {
        k.ceil() as usize
    } else {
        1
    }
}

/// Isolate the in-circle roots of the sampled-kernel z-transform.
///
/// The polynomial `q(z) = sum_j b(|j - m|) z^j` with `b(k)` the kernel value
/// at lattice offset `k` is palindromic of degree `2m`, so its roots come in
/// `(z, 1/z)` pairs; the `m` roots inside the unit circle all lie in
/// `(-1, 0)` and are geometrically separated. A log-spaced scan brackets
/// each sign change and bisection polishes it to machine precision.
pub(crate) fn solve_poles(order: usize) -> Vec<f64> {
    let m = pole_count(order);
    let b: Vec<f64> = (0..=m).map(|k| kernel::weight(order, k as f64)).collect();
    let q = |z: f64| -> f64 {
        let mut acc = 0.0;
        for j in (0..=2 * m).rev() {
            acc = acc * z + b[(j as isize - m as isize).unsigned_abs()];
        }
        acc
    };

    const DECADES: f64 = 12.0;
    const STEPS: usize = 2880;

    let mut roots = Vec::with_capacity(m);
    let mut prev_z = -1.0;
    let mut prev_q = q(prev_z);
    for i in 1..=STEPS {
        let z = -10f64.powf(-DECADES * i as f64 / STEPS as f64);
        let cur_q = q(z);
        if prev_q == 0.0 {
            roots.push(prev_z);
        } else if (prev_q < 0.0) != (cur_q < 0.0) {
            roots.push(bisect(&q, prev_z, z));
        }
        prev_z = z;
        prev_q = cur_q;
    }
    debug_assert_eq!(roots.len(), m, "pole isolation for order {order}");
    roots
}

fn bisect(q: &impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> f64 {
    let mut q_lo = q(lo);
    for _ in 0..100 {
        let mid = 0.5 * (lo + hi);
        let q_mid = q(mid);
        if q_mid == 0.0 {
            return mid;
        }
        if (q_mid < 0.0) == (q_lo < 0.0) {
            lo = mid;
            q_lo = q_mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

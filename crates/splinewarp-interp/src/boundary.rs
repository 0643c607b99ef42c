//! Boundary extension rules for lattice indices outside the image domain.
//!
//! Both the prefilter initialization and the evaluator resolve out-of-range
//! indices through the same [`map_index`] function, so the coefficients and
//! the reconstruction always assume the same virtual signal.

/// Boundary extension rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryExt {
    /// Extend with a constant fill value.
    Constant,
    /// Wrap around with the domain length as period.
    Periodic,
    /// Mirror about the half-sample boundary: `x[-1] == x[0]`.
    HalfSymmetric,
    /// Mirror about the boundary sample: `x[-1] == x[1]`.
    WholeSymmetric,
}

impl BoundaryExt {
    /// Period of the extended signal for a domain of `len` samples.
    ///
    /// `Constant` has no finite period and returns `None`.
    pub fn period(&self, len: usize) -> Option<usize> {
        match self {
            BoundaryExt::Constant => None,
            BoundaryExt::Periodic => Some(len),
            BoundaryExt::HalfSymmetric => Some(2 * len),
            BoundaryExt::WholeSymmetric => Some((2 * len).saturating_sub(2).max(1)),
        }
    }
}

/// Resolve a lattice index against the boundary rule.
///
/// Returns the in-range index the extended signal takes its value from, or
/// `None` for `Constant` when `i` falls outside `[0, len)`; the caller
/// substitutes its fill value.
pub fn map_index(i: isize, len: usize, boundary: BoundaryExt) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if (0..len as isize).contains(&i) {
        return Some(i as usize);
    }
    match boundary {
        BoundaryExt::Constant => None,
        BoundaryExt::Periodic => Some(i.rem_euclid(len as isize) as usize),
        BoundaryExt::HalfSymmetric => {
            let r = i.rem_euclid(2 * len as isize) as usize;
            if r < len {
                Some(r)
            } else {
                Some(2 * len - 1 - r)
            }
        }
        BoundaryExt::WholeSymmetric => {
            if len == 1 {
                return Some(0);
            }
            let r = i.rem_euclid(2 * (len as isize) - 2) as usize;
            if r < len {
                Some(r)
            } else {
                Some(2 * len - 2 - r)
            }
        }
    }
}

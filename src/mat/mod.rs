//! Row-major strided matrices.
//!
//! A logical `nrows × ncols` matrix lives inside a flat buffer with a row stride `row_stride >=
//! ncols`; element `(i, j)` is stored at offset `i * row_stride + j`. Everything else in the
//! buffer (the trailing `row_stride - ncols` entries of each row, and anything after the last
//! row) is *out-of-rectangle* storage. The owned [`Mat`] fills that storage with NaN on
//! allocation, so that [`Mat::outside_all_nan`] can later detect a callee writing past the
//! logical rectangle.

use crate::required_len;
use reborrow::*;

mod matmut;
mod matown;
mod matref;

pub use matmut::MatMut;
pub use matown::Mat;
pub use matref::MatRef;

/// Like [`f64::max`], but returns NaN if either argument is NaN.
#[inline]
pub(crate) fn max_propagate_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

/// Returns `true` if every element of `data` that lies outside the logical `nrows × ncols`
/// rectangle is NaN.
fn outside_all_nan(data: &[f64], nrows: usize, ncols: usize, row_stride: usize) -> bool {
    if row_stride == 0 {
        // no element can belong to the rectangle.
        return data.iter().all(|x| x.is_nan());
    }
    data.iter().enumerate().all(|(k, x)| {
        let (i, j) = (k / row_stride, k % row_stride);
        (i < nrows && j < ncols) || x.is_nan()
    })
}

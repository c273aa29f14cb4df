//! `numcheck` bundles two small numerical pieces.
//!
//! - [`stats::roc`] computes weighted receiver operating characteristic curves from labels that
//!   were pre-sorted by a classifier score.
//! - [`linalg::evd`] is a randomized test oracle for routines that compute the eigenvectors of a
//!   real upper quasi-triangular (Schur canonical) matrix, in the style of LAPACK's `dtrevc3`.
//!   The oracle builds random Schur matrices inside NaN-padded strided storage, calls the solver
//!   under several modes, and checks residuals, normalization, out-of-bounds writes, selection
//!   masks and bit-exact agreement between modes.
//!
//! # Example
//! ```
//! use numcheck::stats::roc::{auc, roc};
//!
//! let classes = [true, false, true, false];
//! let (tpr, fpr) = roc(&classes, None);
//!
//! assert_eq!(tpr, [0.0, 0.0, 0.5, 0.5, 1.0]);
//! assert_eq!(fpr, [0.0, 0.5, 0.5, 1.0, 1.0]);
//! assert_eq!(auc(&fpr, &tpr), 0.25);
//! ```

#![allow(clippy::too_many_arguments)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use equator::assert;

pub mod linalg;
pub mod mat;
pub mod stats;

pub use mat::{Mat, MatMut, MatRef};
pub use reborrow;

/// Creates a [`Mat`] from rows of `f64` literals. The matrix is tightly packed, its row stride
/// equals its number of columns.
///
/// # Example
/// ```
/// use numcheck::mat;
///
/// let a = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
///
/// assert_eq!(a.nrows(), 2);
/// assert_eq!(a.ncols(), 3);
/// assert_eq!(a.read(1, 0), 4.0);
/// ```
#[macro_export]
macro_rules! mat {
    () => {
        {
            compile_error!("number of columns in the matrix is ambiguous");
        }
    };

    ($([$($v:expr),* $(,)?] ),* $(,)?) => {
        {
            let rows: &[&[f64]] = &[$(&[$($v),*]),*];
            $crate::mat::Mat::from_rows(rows)
        }
    };
}

/// Parallelism strategy that can be passed to the test harnesses of the library.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Parallelism {
    /// No parallelism.
    ///
    /// The code is executed sequentially on the same thread that calls a function
    /// and passes this argument.
    None,
    /// Rayon parallelism. Only available with the `rayon` feature.
    ///
    /// The code is possibly executed in parallel on the current thread, as well as the currently
    /// active rayon thread pool.
    ///
    /// The contained value represents a hint about the number of threads an implementation should
    /// use. A value of `0` is treated as equivalent to `rayon::current_num_threads()`.
    #[cfg(feature = "rayon")]
    #[cfg_attr(docsrs, doc(cfg(feature = "rayon")))]
    Rayon(usize),
}

impl Default for Parallelism {
    #[inline]
    fn default() -> Self {
        #[cfg(feature = "rayon")]
        {
            Parallelism::Rayon(0)
        }
        #[cfg(not(feature = "rayon"))]
        {
            Parallelism::None
        }
    }
}

/// Returns the minimum number of elements a row-major buffer must hold to store an
/// `nrows × ncols` matrix with the given row stride.
#[inline]
#[track_caller]
pub(crate) fn required_len(nrows: usize, ncols: usize, row_stride: usize) -> usize {
    assert!(row_stride >= ncols);
    if nrows == 0 || ncols == 0 {
        0
    } else {
        (nrows - 1) * row_stride + ncols
    }
}

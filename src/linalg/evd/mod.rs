//! Eigenvectors of real Schur canonical matrices.
//!
//! A real Schur canonical matrix $T$ of shape $(n, n)$ is upper quasi-triangular: its diagonal
//! is made of $1 \times 1$ blocks, each holding a real eigenvalue, and $2 \times 2$ blocks of the
//! form
//!
//! $$\begin{bmatrix} a & b \\\\ c & a \end{bmatrix}, \quad bc < 0,$$
//!
//! each holding the complex conjugate pair $a \pm i \sqrt{-bc}$.
//!
//! This module defines the calling contract of a routine computing the eigenvectors of such a
//! matrix ([`RealSchurEigenvectors`], modelled on LAPACK's `dtrevc3`), and a randomized oracle
//! ([`check_trevc3`]) that verifies an implementation of that contract.
//!
//! # Packed eigenvector storage
//! A real eigenvector occupies one column of the output. The eigenvector of a complex pair
//! starting at column `j` (the one associated with the eigenvalue of positive imaginary part)
//! occupies two consecutive columns holding its real and imaginary parts. Every eigenvector is
//! scaled so that its largest component has magnitude one, where the magnitude of a complex
//! component is measured as `|re| + |im|`.
//!
//! Right eigenvectors satisfy $T v = \lambda v$. Left eigenvectors satisfy $u^H T = \lambda u^H$.

use core::fmt;

mod residual;
mod schur_gen;
mod trevc_check;

#[cfg(test)]
mod back_substitution;

pub use residual::{
    eigen_blocks, residual_ev_normalization, residual_left_ev, residual_right_ev, EigenBlock,
    EigenBlocks,
};
pub use schur_gen::{random_schur_canonical, SchurCanonical};
pub use trevc_check::{
    check_trevc3, check_trevc3_case, CaseLabel, FailureKind, Operand, Phase, ResidualKind,
    TrevcCheckParams, TrevcFailure, TrevcReport,
};

/// Which eigenvectors should be computed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EvSide {
    /// Right eigenvectors only.
    Right,
    /// Left eigenvectors only.
    Left,
    /// Both left and right eigenvectors.
    Both,
}

impl fmt::Display for EvSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How many eigenvectors should be computed, and whether they are multiplied into an input
/// matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EvHowMany {
    /// All eigenvectors.
    All,
    /// Only the eigenvectors flagged in the selection mask.
    Selected,
    /// All eigenvectors, multiplied on the left by the matrix `Q` that the eigenvector storage
    /// holds on entry.
    AllMulQ,
    /// The selected eigenvectors, multiplied on the left by `Q`.
    SelectedMulQ,
}

impl EvHowMany {
    /// Returns `true` if the selection mask is read.
    #[inline]
    pub fn is_selected(self) -> bool {
        matches!(self, EvHowMany::Selected | EvHowMany::SelectedMulQ)
    }

    /// Returns `true` if the eigenvectors are multiplied into the input matrix.
    #[inline]
    pub fn is_mul_q(self) -> bool {
        matches!(self, EvHowMany::AllMulQ | EvHowMany::SelectedMulQ)
    }
}

/// Scratch space passed to [`RealSchurEigenvectors::trevc3`].
#[derive(Debug)]
pub enum Workspace<'a> {
    /// Workspace size query. The callee writes the optimal workspace length into the first
    /// element of the slice and returns without computing anything.
    Query(&'a mut [f64]),
    /// Workspace of length at least [`minimum_work_len(n)`](minimum_work_len).
    Buffer(&'a mut [f64]),
}

/// Returns the minimum workspace length accepted by [`RealSchurEigenvectors::trevc3`] for a
/// matrix of dimension `n`, `max(1, 3n)`.
#[inline]
pub fn minimum_work_len(n: usize) -> usize {
    Ord::max(1, 3 * n)
}

/// Computes eigenvectors of a real Schur canonical matrix.
///
/// This is the contract exercised by [`check_trevc3`]. The implementation itself lives outside
/// of this crate.
pub trait RealSchurEigenvectors {
    /// Returns `true` if [`Workspace::Query`] is answered.
    fn supports_workspace_query(&self) -> bool {
        true
    }

    /// Computes some or all of the left and/or right eigenvectors of the `n × n` upper
    /// quasi-triangular matrix stored row-major in `t` with row stride `ldt`, and returns the
    /// number of columns `m` of `vl`/`vr` that hold eigenvectors (real count plus twice the
    /// complex pair count).
    ///
    /// - `selected` is read only when `howmny` selects. On return, a selected complex pair
    ///   spanning columns `j, j + 1` is reported as `selected[j] = true`,
    ///   `selected[j + 1] = false`.
    /// - `vl` and `vr` are row-major with row strides `ldvl` and `ldvr` and `mm` columns. They
    ///   are accessed only when `side` asks for them. In the multiply-by-`Q` modes they hold the
    ///   `n × n` matrix `Q` on entry.
    /// - `t` may be used as scratch. No element outside the logical rectangles of `t`, `vl` and
    ///   `vr` may be written.
    /// - `work` is either a size query or a buffer of length at least
    ///   [`minimum_work_len(n)`](minimum_work_len).
    fn trevc3(
        &self,
        side: EvSide,
        howmny: EvHowMany,
        selected: &mut [bool],
        n: usize,
        t: &mut [f64],
        ldt: usize,
        vl: &mut [f64],
        ldvl: usize,
        vr: &mut [f64],
        ldvr: usize,
        mm: usize,
        work: Workspace<'_>,
    ) -> usize;
}

impl<S: RealSchurEigenvectors + ?Sized> RealSchurEigenvectors for &S {
    #[inline]
    fn supports_workspace_query(&self) -> bool {
        (**self).supports_workspace_query()
    }

    #[inline]
    fn trevc3(
        &self,
        side: EvSide,
        howmny: EvHowMany,
        selected: &mut [bool],
        n: usize,
        t: &mut [f64],
        ldt: usize,
        vl: &mut [f64],
        ldvl: usize,
        vr: &mut [f64],
        ldvr: usize,
        mm: usize,
        work: Workspace<'_>,
    ) -> usize {
        (**self).trevc3(
            side, howmny, selected, n, t, ldt, vl, ldvl, vr, ldvr, mm, work,
        )
    }
}

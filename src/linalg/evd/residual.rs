use crate::{assert, mat::max_propagate_nan, Mat, MatRef};

/// A column, or pair of columns, of a packed eigenvector matrix.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EigenBlock {
    /// Column `j` holds a real eigenvector.
    Real(usize),
    /// Columns `j` and `j + 1` hold the real and imaginary parts of a complex eigenvector.
    Complex(usize),
}

impl EigenBlock {
    /// Index of the first column of the block.
    #[inline]
    pub fn col(self) -> usize {
        match self {
            EigenBlock::Real(j) | EigenBlock::Complex(j) => j,
        }
    }

    /// Number of columns spanned by the block.
    #[inline]
    pub fn width(self) -> usize {
        match self {
            EigenBlock::Real(_) => 1,
            EigenBlock::Complex(_) => 2,
        }
    }
}

/// Iterator over the eigenvector blocks described by the imaginary parts of the eigenvalues.
///
/// See [`eigen_blocks`].
#[derive(Clone, Debug)]
pub struct EigenBlocks<'a> {
    wi: &'a [f64],
    j: usize,
}

/// Returns an iterator over the columns of a packed eigenvector matrix, driven by the imaginary
/// parts `wi` of the eigenvalues: a nonzero `wi[j]` with a following column starts a complex
/// pair, anything else is a real column.
///
/// # Example
/// ```
/// use numcheck::linalg::evd::{eigen_blocks, EigenBlock};
///
/// let wi = [0.0, 0.5, -0.5, 0.0];
/// let blocks: Vec<_> = eigen_blocks(&wi).collect();
/// assert_eq!(
///     blocks,
///     [EigenBlock::Real(0), EigenBlock::Complex(1), EigenBlock::Real(3)],
/// );
/// ```
#[inline]
pub fn eigen_blocks(wi: &[f64]) -> EigenBlocks<'_> {
    EigenBlocks { wi, j: 0 }
}

impl Iterator for EigenBlocks<'_> {
    type Item = EigenBlock;

    fn next(&mut self) -> Option<Self::Item> {
        let j = self.j;
        if j >= self.wi.len() {
            return None;
        }
        if self.wi[j] != 0.0 && j + 1 < self.wi.len() {
            self.j += 2;
            Some(EigenBlock::Complex(j))
        } else {
            self.j += 1;
            Some(EigenBlock::Real(j))
        }
    }
}

/// Returns the largest deviation from one of the max-norm of the eigenvectors stored in `e`:
///
/// $$\max_j \left| \lVert e_j \rVert_\infty - 1 \right|,$$
///
/// where the norm of a complex eigenvector is $\max_i (|\Re e_{ij}| + |\Im e_{ij}|)$. Returns
/// NaN if any norm is NaN, and zero if `e` is empty.
///
/// # Panics
/// Panics if `wi.len() != e.ncols()`.
#[track_caller]
pub fn residual_ev_normalization(e: MatRef<'_>, wi: &[f64]) -> f64 {
    assert!(wi.len() == e.ncols());
    if e.nrows() == 0 || e.ncols() == 0 {
        return 0.0;
    }

    let mut enrmin = f64::INFINITY;
    let mut enrmax = 0.0f64;
    for block in eigen_blocks(wi) {
        let nrm = match block {
            EigenBlock::Real(j) => e.col(j).fold(0.0, |acc, x| max_propagate_nan(acc, x.abs())),
            EigenBlock::Complex(j) => core::iter::zip(e.col(j), e.col(j + 1))
                .fold(0.0, |acc, (re, im)| max_propagate_nan(acc, re.abs() + im.abs())),
        };
        if nrm.is_nan() {
            return f64::NAN;
        }
        enrmin = enrmin.min(nrm);
        enrmax = enrmax.max(nrm);
    }
    f64::max((enrmin - 1.0).abs(), (enrmax - 1.0).abs())
}

/// Returns the scaled residual of the right eigenvectors `v` of `t`,
///
/// $$\frac{\lVert T V - V \Lambda \rVert_1}{n \lVert V \rVert_1},$$
///
/// where $\Lambda$ is the real block diagonal matrix of eigenvalues matching the packed storage
/// of `v`: column `j` of a complex pair with eigenvalue $w_r + i w_i$ maps to
/// $w_r v_j - w_i v_{j+1}$, and column `j + 1` to $w_i v_j + w_r v_{j+1}$.
///
/// # Panics
/// Panics if the dimensions of `t`, `v`, `wr` and `wi` do not all agree.
#[track_caller]
pub fn residual_right_ev(t: MatRef<'_>, v: MatRef<'_>, wr: &[f64], wi: &[f64]) -> f64 {
    residual_ev(t, v, wr, wi, Transpose::No)
}

/// Returns the scaled residual of the left eigenvectors `u` of `t`,
///
/// $$\frac{\lVert T^\top U - U \bar\Lambda \rVert_1}{n \lVert U \rVert_1},$$
///
/// where $\bar\Lambda$ is built like the $\Lambda$ of [`residual_right_ev`] from the conjugate
/// eigenvalues, since a left eigenvector satisfies $u^H T = \lambda u^H$.
///
/// # Panics
/// Panics if the dimensions of `t`, `u`, `wr` and `wi` do not all agree.
#[track_caller]
pub fn residual_left_ev(t: MatRef<'_>, u: MatRef<'_>, wr: &[f64], wi: &[f64]) -> f64 {
    residual_ev(t, u, wr, wi, Transpose::Yes)
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Transpose {
    No,
    Yes,
}

#[track_caller]
fn residual_ev(t: MatRef<'_>, v: MatRef<'_>, wr: &[f64], wi: &[f64], trans: Transpose) -> f64 {
    let n = t.nrows();
    assert!(all(
        t.ncols() == n,
        v.nrows() == n,
        v.ncols() == n,
        wr.len() == n,
        wi.len() == n,
    ));
    if n == 0 {
        return 0.0;
    }

    let t_at = |i: usize, k: usize| match trans {
        Transpose::No => t.read(i, k),
        Transpose::Yes => t.read(k, i),
    };
    let op_t_v = |i: usize, j: usize| (0..n).map(|k| t_at(i, k) * v.read(k, j)).sum::<f64>();

    let mut r = Mat::zeros(n, n);
    for block in eigen_blocks(wi) {
        match block {
            EigenBlock::Real(j) => {
                for i in 0..n {
                    r.write(i, j, op_t_v(i, j) - wr[j] * v.read(i, j));
                }
            }
            EigenBlock::Complex(j) => {
                let re = wr[j];
                let im = match trans {
                    Transpose::No => wi[j],
                    Transpose::Yes => -wi[j],
                };
                for i in 0..n {
                    let (x, y) = (v.read(i, j), v.read(i, j + 1));
                    r.write(i, j, op_t_v(i, j) - (re * x - im * y));
                    r.write(i, j + 1, op_t_v(i, j + 1) - (im * x + re * y));
                }
            }
        }
    }

    let enorm = max_propagate_nan(v.norm_l1(), f64::EPSILON);
    r.as_ref().norm_l1() / (n as f64 * enorm)
}

//! Reference eigenvector solver used to exercise the oracle, along with wrappers that inject
//! defects into its output.

use super::{
    minimum_work_len, EigenBlock, EvHowMany, EvSide, RealSchurEigenvectors, Workspace,
};
use crate::{assert, Mat, MatMut, MatRef};
use num_complex::Complex64;
use reborrow::*;

/// Computes eigenvectors of a real Schur canonical matrix by back substitution (right
/// eigenvectors) and forward substitution (left eigenvectors), without scaling against
/// overflow.
#[derive(Copy, Clone, Debug)]
pub struct BackSubstitution;

fn diagonal_blocks(t: MatRef<'_>) -> Vec<EigenBlock> {
    let n = t.nrows();
    let mut blocks = Vec::new();
    let mut j = 0;
    while j < n {
        if j + 1 < n && t.read(j + 1, j) != 0.0 {
            blocks.push(EigenBlock::Complex(j));
            j += 2;
        } else {
            blocks.push(EigenBlock::Real(j));
            j += 1;
        }
    }
    blocks
}

// sum of the magnitudes of the upper Hessenberg part, used to replace zero pivots.
fn schur_norm(t: MatRef<'_>) -> f64 {
    let n = t.nrows();
    let mut norm = f64::MIN_POSITIVE;
    for i in 0..n {
        for j in i.saturating_sub(1)..n {
            norm += t.read(i, j).abs();
        }
    }
    norm
}

fn dot_row(t: MatRef<'_>, i: usize, cols: core::ops::Range<usize>, x: &[f64]) -> f64 {
    cols.map(|l| t.read(i, l) * x[l]).sum()
}

fn dot_row_cplx(
    t: MatRef<'_>,
    i: usize,
    cols: core::ops::Range<usize>,
    x: &[Complex64],
) -> Complex64 {
    cols.map(|l| x[l] * t.read(i, l)).sum()
}

fn dot_col(t: MatRef<'_>, j: usize, rows: core::ops::Range<usize>, y: &[f64]) -> f64 {
    rows.map(|l| t.read(l, j) * y[l]).sum()
}

fn dot_col_cplx(
    t: MatRef<'_>,
    j: usize,
    rows: core::ops::Range<usize>,
    y: &[Complex64],
) -> Complex64 {
    rows.map(|l| y[l] * t.read(l, j)).sum()
}

/// Solves `(T - p I) x = 0` with `x[k] = 1` and `x[k + 1..] = 0`.
fn right_real(t: MatRef<'_>, blocks: &[EigenBlock], k: usize, eps_norm: f64) -> Vec<f64> {
    let n = t.nrows();
    let p = t.read(k, k);
    let mut x = vec![0.0; n];
    x[k] = 1.0;
    for i in 0..k {
        x[i] = -t.read(i, k);
    }

    for &block in blocks.iter().rev().filter(|block| block.col() < k) {
        match block {
            EigenBlock::Real(i) => {
                let r = x[i] - dot_row(t, i, i + 1..k, &x);
                let mut z = t.read(i, i) - p;
                if z == 0.0 {
                    z = eps_norm;
                }
                x[i] = r / z;
            }
            EigenBlock::Complex(i) => {
                // [a0 b ] [x0]   [r0]
                // [c  a1]×[x1] = [r1]
                let r0 = x[i] - dot_row(t, i, i + 2..k, &x);
                let r1 = x[i + 1] - dot_row(t, i + 1, i + 2..k, &x);
                let a0 = t.read(i, i) - p;
                let a1 = t.read(i + 1, i + 1) - p;
                let b = t.read(i, i + 1);
                let c = t.read(i + 1, i);
                let mut det = a0 * a1 - b * c;
                if det == 0.0 {
                    det = eps_norm;
                }
                x[i] = (a1 * r0 - b * r1) / det;
                x[i + 1] = (a0 * r1 - c * r0) / det;
            }
        }
    }
    x
}

/// Solves `(T - (p + iq) I) x = 0` for the pair starting at `k`, with `x[k + 2..] = 0`.
fn right_complex(t: MatRef<'_>, blocks: &[EigenBlock], k: usize, eps_norm: f64) -> Vec<Complex64> {
    let n = t.nrows();
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);

    let p = t.read(k, k);
    let b = t.read(k, k + 1);
    let c = t.read(k + 1, k);
    let q = b.abs().sqrt() * c.abs().sqrt();
    let lambda = Complex64::new(p, q);

    let mut x = vec![zero; n];
    if b.abs() >= c.abs() {
        x[k] = one;
        x[k + 1] = Complex64::new(0.0, q / b);
    } else {
        x[k] = Complex64::new(0.0, q / c);
        x[k + 1] = one;
    }
    for i in 0..k {
        x[i] = -(x[k] * t.read(i, k) + x[k + 1] * t.read(i, k + 1));
    }

    for &block in blocks.iter().rev().filter(|block| block.col() < k) {
        match block {
            EigenBlock::Real(i) => {
                let r = x[i] - dot_row_cplx(t, i, i + 1..k, &x);
                let mut z = t.read(i, i) - lambda;
                if z == zero {
                    z = Complex64::new(eps_norm, 0.0);
                }
                x[i] = r / z;
            }
            EigenBlock::Complex(i) => {
                let r0 = x[i] - dot_row_cplx(t, i, i + 2..k, &x);
                let r1 = x[i + 1] - dot_row_cplx(t, i + 1, i + 2..k, &x);
                let a0 = t.read(i, i) - lambda;
                let a1 = t.read(i + 1, i + 1) - lambda;
                let b = t.read(i, i + 1);
                let c = t.read(i + 1, i);
                let mut det = a0 * a1 - b * c;
                if det == zero {
                    det = Complex64::new(eps_norm, 0.0);
                }
                x[i] = (a1 * r0 - r1 * b) / det;
                x[i + 1] = (a0 * r1 - r0 * c) / det;
            }
        }
    }
    x
}

/// Solves `y^T (T - p I) = 0` with `y[k] = 1` and `y[..k] = 0`.
fn left_real(t: MatRef<'_>, blocks: &[EigenBlock], k: usize, eps_norm: f64) -> Vec<f64> {
    let n = t.nrows();
    let p = t.read(k, k);
    let mut y = vec![0.0; n];
    y[k] = 1.0;

    for &block in blocks.iter().filter(|block| block.col() > k) {
        match block {
            EigenBlock::Real(i) => {
                let r = -dot_col(t, i, k..i, &y);
                let mut z = t.read(i, i) - p;
                if z == 0.0 {
                    z = eps_norm;
                }
                y[i] = r / z;
            }
            EigenBlock::Complex(i) => {
                // [a0 b ] [y0]   [r0]
                // [c  a1]×[y1] = [r1], with the block of T transposed
                let r0 = -dot_col(t, i, k..i, &y);
                let r1 = -dot_col(t, i + 1, k..i, &y);
                let a0 = t.read(i, i) - p;
                let a1 = t.read(i + 1, i + 1) - p;
                let b = t.read(i + 1, i);
                let c = t.read(i, i + 1);
                let mut det = a0 * a1 - b * c;
                if det == 0.0 {
                    det = eps_norm;
                }
                y[i] = (a1 * r0 - b * r1) / det;
                y[i + 1] = (a0 * r1 - c * r0) / det;
            }
        }
    }
    y
}

/// Solves `y^H (T - (p + iq) I) = 0` for the pair starting at `k`, with `y[..k] = 0`.
///
/// Equivalently `T^T y = (p - iq) y`.
fn left_complex(t: MatRef<'_>, blocks: &[EigenBlock], k: usize, eps_norm: f64) -> Vec<Complex64> {
    let n = t.nrows();
    let zero = Complex64::new(0.0, 0.0);
    let one = Complex64::new(1.0, 0.0);

    let p = t.read(k, k);
    let b = t.read(k, k + 1);
    let c = t.read(k + 1, k);
    let q = b.abs().sqrt() * c.abs().sqrt();
    let mu = Complex64::new(p, -q);

    let mut y = vec![zero; n];
    if c.abs() >= b.abs() {
        y[k] = one;
        y[k + 1] = Complex64::new(0.0, -q / c);
    } else {
        y[k] = Complex64::new(0.0, -q / b);
        y[k + 1] = one;
    }

    for &block in blocks.iter().filter(|block| block.col() > k + 1) {
        match block {
            EigenBlock::Real(i) => {
                let r = -dot_col_cplx(t, i, k..i, &y);
                let mut z = t.read(i, i) - mu;
                if z == zero {
                    z = Complex64::new(eps_norm, 0.0);
                }
                y[i] = r / z;
            }
            EigenBlock::Complex(i) => {
                let r0 = -dot_col_cplx(t, i, k..i, &y);
                let r1 = -dot_col_cplx(t, i + 1, k..i, &y);
                let a0 = t.read(i, i) - mu;
                let a1 = t.read(i + 1, i + 1) - mu;
                let b = t.read(i + 1, i);
                let c = t.read(i, i + 1);
                let mut det = a0 * a1 - b * c;
                if det == zero {
                    det = Complex64::new(eps_norm, 0.0);
                }
                y[i] = (a1 * r0 - r1 * b) / det;
                y[i + 1] = (a0 * r1 - r0 * c) / det;
            }
        }
    }
    y
}

/// Scales the eigenvector stored in `block` so that its largest component has magnitude one.
fn normalize(mut x: MatMut<'_>, block: EigenBlock) {
    let n = x.nrows();
    match block {
        EigenBlock::Real(j) => {
            let s = x.rb().col(j).fold(0.0, |acc: f64, v| acc.max(v.abs()));
            if s > 0.0 {
                for i in 0..n {
                    x.write(i, j, x.read(i, j) / s);
                }
            }
        }
        EigenBlock::Complex(j) => {
            let s = (0..n).fold(0.0, |acc: f64, i| {
                acc.max(x.read(i, j).abs() + x.read(i, j + 1).abs())
            });
            if s > 0.0 {
                for i in 0..n {
                    x.write(i, j, x.read(i, j) / s);
                    x.write(i, j + 1, x.read(i, j + 1) / s);
                }
            }
        }
    }
}

/// Returns the unnormalized eigenvectors of the blocks accepted by `wanted`, in packed storage.
fn eigenvectors(
    t: MatRef<'_>,
    blocks: &[EigenBlock],
    side: EvSide,
    wanted: impl Fn(EigenBlock) -> bool,
) -> Mat {
    let n = t.nrows();
    let eps_norm = f64::EPSILON * schur_norm(t);
    let mut x = Mat::zeros(n, n);
    for &block in blocks.iter().filter(|&&block| wanted(block)) {
        match (block, side) {
            (EigenBlock::Real(k), EvSide::Right) => {
                for (i, v) in right_real(t, blocks, k, eps_norm).into_iter().enumerate() {
                    x.write(i, k, v);
                }
            }
            (EigenBlock::Real(k), _) => {
                for (i, v) in left_real(t, blocks, k, eps_norm).into_iter().enumerate() {
                    x.write(i, k, v);
                }
            }
            (EigenBlock::Complex(k), side) => {
                let v = if side == EvSide::Right {
                    right_complex(t, blocks, k, eps_norm)
                } else {
                    left_complex(t, blocks, k, eps_norm)
                };
                for (i, v) in v.into_iter().enumerate() {
                    x.write(i, k, v.re);
                    x.write(i, k + 1, v.im);
                }
            }
        }
    }
    x
}

/// Writes the eigenvectors accepted by `wanted` into consecutive columns of `out`, multiplying
/// them into the matrix held by `out` first if requested.
fn store(
    mut out: MatMut<'_>,
    mut x: Mat,
    blocks: &[EigenBlock],
    mul_q: bool,
    wanted: impl Fn(EigenBlock) -> bool,
) {
    let n = x.nrows();
    if mul_q {
        let q = Mat::from_fn(n, n, |i, j| out.read(i, j));
        x = Mat::from_fn(n, n, |i, j| (0..n).map(|l| q.read(i, l) * x.read(l, j)).sum());
    }

    let mut k = 0;
    for &block in blocks.iter().filter(|&&block| wanted(block)) {
        normalize(x.as_mut(), block);
        for c in 0..block.width() {
            for i in 0..n {
                out.write(i, k + c, x.read(i, block.col() + c));
            }
        }
        k += block.width();
    }
}

impl RealSchurEigenvectors for BackSubstitution {
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
        let t = MatRef::from_row_major_slice_with_stride(t, n, n, ldt);
        let blocks = diagonal_blocks(t);

        if howmny.is_selected() {
            assert!(selected.len() == n);
            for &block in &blocks {
                if let EigenBlock::Complex(j) = block {
                    if selected[j] || selected[j + 1] {
                        selected[j] = true;
                        selected[j + 1] = false;
                    }
                }
            }
        }
        let selected = &*selected;
        let wanted = |block: EigenBlock| !howmny.is_selected() || selected[block.col()];
        let m = blocks
            .iter()
            .filter(|&&block| wanted(block))
            .map(|block| block.width())
            .sum::<usize>();

        match work {
            Workspace::Query(work) => {
                work[0] = minimum_work_len(n) as f64;
                return m;
            }
            Workspace::Buffer(work) => assert!(work.len() >= minimum_work_len(n)),
        }
        assert!(all(mm >= m, howmny != EvHowMany::SelectedMulQ));

        if side != EvSide::Left {
            let x = eigenvectors(t, &blocks, EvSide::Right, wanted);
            let out = MatMut::from_row_major_slice_with_stride(vr, n, mm, ldvr);
            store(out, x, &blocks, howmny.is_mul_q(), wanted);
        }
        if side != EvSide::Right {
            let x = eigenvectors(t, &blocks, EvSide::Left, wanted);
            let out = MatMut::from_row_major_slice_with_stride(vl, n, mm, ldvl);
            store(out, x, &blocks, howmny.is_mul_q(), wanted);
        }
        m
    }
}

/// Defect injected by [`Faulty`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Writes to the first element past the last column of `vr`.
    ScribblesPadding,
    /// Reports one eigenvector column too many.
    WrongCount,
    /// Returns the selection mask as it was passed in.
    LeavesMaskAlone,
    /// Flips the lowest mantissa bit of the first element of `vr` in [`EvHowMany::Selected`]
    /// mode.
    PerturbsSelected,
    /// Negates `vr` in the multiply-by-`Q` modes.
    NegatesBacktransform,
    /// Answers workspace queries with zero.
    ZeroQuery,
    /// Does not support workspace queries.
    NoQuery,
    /// Leaves every output untouched and reports no eigenvectors.
    DoesNothing,
    /// Writes NaN into the middle row of the first column of `vr` in [`EvHowMany::All`] mode.
    LeaksNan,
}

/// [`BackSubstitution`] with a defect.
#[derive(Copy, Clone, Debug)]
pub struct Faulty(pub Fault);

impl RealSchurEigenvectors for Faulty {
    fn supports_workspace_query(&self) -> bool {
        self.0 != Fault::NoQuery
    }

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
        let fault = self.0;
        let input_mask = selected.to_vec();
        let work = match work {
            Workspace::Query(work) => {
                assert!(fault != Fault::NoQuery);
                let m = BackSubstitution.trevc3(
                    side,
                    howmny,
                    selected,
                    n,
                    t,
                    ldt,
                    vl,
                    ldvl,
                    vr,
                    ldvr,
                    mm,
                    Workspace::Query(&mut *work),
                );
                match fault {
                    Fault::ZeroQuery => work[0] = 0.0,
                    Fault::LeavesMaskAlone => selected.copy_from_slice(&input_mask),
                    _ => {}
                }
                return m;
            }
            Workspace::Buffer(work) => work,
        };
        if fault == Fault::DoesNothing {
            return 0;
        }

        let mut m = BackSubstitution.trevc3(
            side,
            howmny,
            selected,
            n,
            t,
            ldt,
            vl,
            ldvl,
            vr,
            ldvr,
            mm,
            Workspace::Buffer(work),
        );
        let right = side != EvSide::Left;

        match fault {
            Fault::ScribblesPadding => {
                if right && n > 0 && ldvr > mm && vr.len() > mm {
                    vr[mm] = 0.0;
                }
            }
            Fault::WrongCount => m += 1,
            Fault::LeavesMaskAlone => selected.copy_from_slice(&input_mask),
            Fault::PerturbsSelected => {
                if right && howmny == EvHowMany::Selected && m > 0 {
                    vr[0] = f64::from_bits(vr[0].to_bits() ^ 1);
                }
            }
            Fault::NegatesBacktransform => {
                if right && howmny.is_mul_q() {
                    for i in 0..n {
                        for j in 0..m {
                            vr[i * ldvr + j] = -vr[i * ldvr + j];
                        }
                    }
                }
            }
            Fault::LeaksNan => {
                if right && howmny == EvHowMany::All && n >= 2 {
                    vr[(n / 2) * ldvr] = f64::NAN;
                }
            }
            Fault::ZeroQuery | Fault::NoQuery | Fault::DoesNothing => {}
        }
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mat;
    use equator::assert;

    fn solve(side: EvSide, t: &Mat, ld: usize) -> (Mat, usize) {
        let n = t.nrows();
        let mut t = t.clone();
        let mut v = Mat::nan_padded(n, n, ld);
        let mut work = vec![0.0; minimum_work_len(n)];
        let ldt = t.row_stride();
        let (mut vl, mut vr) = (Vec::<f64>::new(), Vec::<f64>::new());
        let m = {
            let out = v.as_slice_mut();
            let (vl, vr) = match side {
                EvSide::Right => (&mut vl[..], out),
                _ => (out, &mut vr[..]),
            };
            BackSubstitution.trevc3(
                side,
                EvHowMany::All,
                &mut [],
                n,
                t.as_slice_mut(),
                ldt,
                vl,
                ld,
                vr,
                ld,
                n,
                Workspace::Buffer(&mut work),
            )
        };
        (v, m)
    }

    #[test]
    fn upper_triangular() {
        let t = mat![[2.0, 1.0], [0.0, 3.0]];

        let (vr, m) = solve(EvSide::Right, &t, 4);
        assert!(m == 2);
        assert!(all(vr.read(0, 0) == 1.0, vr.read(1, 0) == 0.0));
        assert!(all(vr.read(0, 1) == 1.0, vr.read(1, 1) == 1.0));
        assert!(vr.outside_all_nan());

        let (vl, m) = solve(EvSide::Left, &t, 2);
        assert!(m == 2);
        assert!(all(vl.read(0, 0) == 1.0, vl.read(1, 0) == -1.0));
        assert!(all(vl.read(0, 1) == 0.0, vl.read(1, 1) == 1.0));
    }

    #[test]
    fn rotation_block() {
        // (1, i) on both sides.
        let t = mat![[0.0, 1.0], [-1.0, 0.0]];
        for side in [EvSide::Right, EvSide::Left] {
            let (v, m) = solve(side, &t, 3);
            assert!(m == 2);
            assert!(all(v.read(0, 0) == 1.0, v.read(0, 1) == 0.0));
            assert!(all(v.read(1, 0) == 0.0, v.read(1, 1) == 1.0));
        }
    }

    #[test]
    fn canonicalizes_mask() {
        let mut t = mat![[0.5, 1.0, 0.0], [0.0, 1.0, 2.0], [0.0, -1.0, 1.0]];
        let mut selected = [false, false, true];
        let mut vr = [f64::NAN; 9];
        let mut work = [0.0];
        let m = BackSubstitution.trevc3(
            EvSide::Right,
            EvHowMany::Selected,
            &mut selected,
            3,
            t.as_slice_mut(),
            3,
            &mut [],
            1,
            &mut vr,
            3,
            2,
            Workspace::Query(&mut work),
        );
        assert!(all(m == 2, selected == [false, true, false]));
        assert!(work[0] == 9.0);
        // queries leave the output alone.
        assert!(vr.iter().all(|x| x.is_nan()));
    }
}

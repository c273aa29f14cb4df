//! Randomized checks of [`RealSchurEigenvectors`] implementations.
//!
//! Every case draws a random Schur canonical matrix inside NaN-padded storage, then runs three
//! phases:
//!
//! 1. [`Phase::All`]: all eigenvectors. The count, the residuals of the eigenvector equations
//!    and the normalization are checked.
//! 2. [`Phase::Selected`]: the trailing `max(1, n/4)` real eigenvectors and the trailing
//!    `max(1, n/4)` complex pairs. The returned selection mask must be canonical, and the
//!    computed columns must be bitwise equal to the matching columns of the first phase.
//! 3. [`Phase::AllMulQ`]: all eigenvectors multiplied into the identity, which must reproduce
//!    the first phase bitwise.
//!
//! After every call the storage outside the logical rectangles of `T`, `VR` and `VL` must still
//! be NaN.

use super::{
    eigen_blocks, minimum_work_len, random_schur_canonical, residual_ev_normalization,
    residual_left_ev, residual_right_ev, EvHowMany, EvSide, RealSchurEigenvectors,
    SchurCanonical, Workspace,
};
use crate::{Mat, MatRef, Parallelism};
use core::fmt;
use rand::{rngs::StdRng, Rng, SeedableRng};

const LOG_TARGET: &str = "numcheck_trevc";

/// Parameters of [`check_trevc3`].
///
/// The suite runs `cases` random matrices for every combination of `sides`, `sizes`, `extras`
/// and `opt_work`.
#[derive(Clone, Debug)]
pub struct TrevcCheckParams {
    /// Sides passed to the solver.
    pub sides: Vec<EvSide>,
    /// Matrix dimensions.
    pub sizes: Vec<usize>,
    /// Row stride padding: matrices of dimension `n` are stored with row stride `n + extra`.
    pub extras: Vec<usize>,
    /// Whether the workspace length is queried from the solver (`true`) or set to the minimum
    /// (`false`).
    pub opt_work: Vec<bool>,
    /// Number of random matrices per combination.
    pub cases: usize,
    /// Seed of the master random number generator.
    pub seed: u64,
    /// Upper bound on the residuals.
    pub tolerance: f64,
    /// Whether [`Phase::AllMulQ`] runs.
    pub check_mul_q: bool,
    /// How the cases are distributed across threads. The results do not depend on it.
    pub parallelism: Parallelism,
}

impl Default for TrevcCheckParams {
    fn default() -> Self {
        Self {
            sides: vec![EvSide::Right, EvSide::Left],
            sizes: vec![0, 1, 2, 3, 4, 5, 6, 7, 10, 34],
            extras: vec![0, 11],
            opt_work: vec![true, false],
            cases: 10,
            seed: 1,
            tolerance: 1e-15,
            check_mul_q: true,
            parallelism: Parallelism::default(),
        }
    }
}

/// Identifies a test case.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct CaseLabel {
    pub side: EvSide,
    pub n: usize,
    pub extra: usize,
    pub opt_work: bool,
}

impl fmt::Display for CaseLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/n={},extra={},optwk={}",
            self.side, self.n, self.extra, self.opt_work
        )
    }
}

/// Solver invocation within a test case.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    All,
    Selected,
    AllMulQ,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::All => "all",
            Phase::Selected => "selected",
            Phase::AllMulQ => "all*Q",
        })
    }
}

/// Matrix passed to the solver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operand {
    T,
    Vr,
    Vl,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operand::T => "T",
            Operand::Vr => "VR",
            Operand::Vl => "VL",
        })
    }
}

/// Residual measured after [`Phase::All`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ResidualKind {
    Right,
    Left,
    RightNormalization,
    LeftNormalization,
}

impl fmt::Display for ResidualKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResidualKind::Right => "right eigenvectors",
            ResidualKind::Left => "left eigenvectors",
            ResidualKind::RightNormalization => "normalization of right eigenvectors",
            ResidualKind::LeftNormalization => "normalization of left eigenvectors",
        })
    }
}

/// What went wrong in a failed check.
#[derive(Clone, Debug, PartialEq)]
pub enum FailureKind {
    /// The optimal workspace length reported by a query is not finite, or is smaller than
    /// [`minimum_work_len`]. The minimum length is used instead.
    WorkspaceQuery {
        phase: Phase,
        reported: f64,
        minimum: usize,
    },
    /// The solver returned an unexpected number of eigenvector columns.
    EigenvectorCount {
        phase: Phase,
        got: usize,
        want: usize,
    },
    /// An element outside the logical rectangle of an operand was overwritten.
    OutOfRectangleWrite { phase: Phase, operand: Operand },
    /// A residual is above the tolerance, or NaN.
    Residual {
        kind: ResidualKind,
        value: f64,
        tolerance: f64,
    },
    /// An element of the returned selection mask is not canonical.
    SelectionMask { index: usize, got: bool, want: bool },
    /// The eigenvectors of a phase are not bitwise equal to those of [`Phase::All`].
    Mismatch { phase: Phase, operand: Operand },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FailureKind::WorkspaceQuery {
                phase,
                reported,
                minimum,
            } => write!(
                f,
                "{phase}: workspace query reported {reported}, want a finite value >= {minimum}"
            ),
            FailureKind::EigenvectorCount { phase, got, want } => {
                write!(f, "{phase}: unexpected value of m={got}, want {want}")
            }
            FailureKind::OutOfRectangleWrite { phase, operand } => {
                write!(f, "{phase}: out-of-range write to {operand}")
            }
            FailureKind::Residual {
                kind,
                value,
                tolerance,
            } => write!(
                f,
                "unexpected {kind}; residual={value:e}, want<={tolerance:e}"
            ),
            FailureKind::SelectionMask { index, got, want } => {
                write!(f, "unexpected selected[{index}]={got}, want {want}")
            }
            FailureKind::Mismatch { phase, operand } => {
                write!(f, "{phase}: {operand} differs from the full computation")
            }
        }
    }
}

/// Failed check of a test case.
#[derive(Clone, Debug, PartialEq)]
pub struct TrevcFailure {
    pub label: CaseLabel,
    pub kind: FailureKind,
}

impl fmt::Display for TrevcFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.kind)
    }
}

impl std::error::Error for TrevcFailure {}

/// Outcome of [`check_trevc3`].
#[derive(Clone, Debug, PartialEq)]
pub struct TrevcReport {
    /// Number of test cases that were run.
    pub cases_run: usize,
    /// Failed checks, ordered by test case.
    pub failures: Vec<TrevcFailure>,
}

impl TrevcReport {
    /// Returns `true` if no check failed.
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for TrevcReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(f, "{} cases run, no failures", self.cases_run);
        }
        write!(
            f,
            "{} cases run, {} failures",
            self.cases_run,
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "\n  {failure}")?;
        }
        Ok(())
    }
}

/// Runs the randomized suite described by `params` against `solver`.
///
/// Failures are collected rather than raised, and each of them is also logged at the `warn`
/// level under the `numcheck_trevc` target. The matrices, and therefore the report, depend only
/// on `params.seed`, not on `params.parallelism`.
///
/// # Example
/// ```
/// use numcheck::linalg::evd::{
///     check_trevc3, EvHowMany, EvSide, RealSchurEigenvectors, TrevcCheckParams, Workspace,
/// };
///
/// // a solver that fails every check
/// struct Broken;
///
/// impl RealSchurEigenvectors for Broken {
///     fn trevc3(
///         &self,
///         _side: EvSide,
///         _howmny: EvHowMany,
///         _selected: &mut [bool],
///         _n: usize,
///         _t: &mut [f64],
///         _ldt: usize,
///         _vl: &mut [f64],
///         _ldvl: usize,
///         _vr: &mut [f64],
///         _ldvr: usize,
///         _mm: usize,
///         work: Workspace<'_>,
///     ) -> usize {
///         if let Workspace::Query(work) = work {
///             work[0] = 1.0;
///         }
///         0
///     }
/// }
///
/// let params = TrevcCheckParams {
///     sizes: vec![3],
///     cases: 1,
///     ..Default::default()
/// };
/// let report = check_trevc3(&Broken, &params);
/// assert_eq!(report.cases_run, 8);
/// assert!(!report.is_ok());
/// ```
pub fn check_trevc3<S: RealSchurEigenvectors + Sync + ?Sized>(
    solver: &S,
    params: &TrevcCheckParams,
) -> TrevcReport {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut jobs = Vec::new();
    for &side in &params.sides {
        for &n in &params.sizes {
            for &extra in &params.extras {
                for &opt_work in &params.opt_work {
                    for _ in 0..params.cases {
                        let label = CaseLabel {
                            side,
                            n,
                            extra,
                            opt_work,
                        };
                        jobs.push((label, rng.gen::<u64>()));
                    }
                }
            }
        }
    }

    let run = |&(label, seed): &(CaseLabel, u64)| {
        log::debug!(target: LOG_TARGET, "{label}: seed={seed}");
        check_trevc3_case(
            solver,
            label,
            params.tolerance,
            params.check_mul_q,
            &mut StdRng::seed_from_u64(seed),
        )
    };

    let per_case: Vec<Vec<TrevcFailure>> = match params.parallelism {
        Parallelism::None => jobs.iter().map(run).collect(),
        #[cfg(feature = "rayon")]
        Parallelism::Rayon(n_threads) => par_map(&jobs, n_threads, run),
    };

    let report = TrevcReport {
        cases_run: jobs.len(),
        failures: per_case.into_iter().flatten().collect(),
    };
    if report.is_ok() {
        log::info!(target: LOG_TARGET, "{report}");
    } else {
        log::info!(
            target: LOG_TARGET,
            "{} cases run, {} failures",
            report.cases_run,
            report.failures.len()
        );
    }
    report
}

#[cfg(feature = "rayon")]
fn par_map<T: Sync, R: Send>(items: &[T], n_threads: usize, f: impl Fn(&T) -> R + Sync) -> Vec<R> {
    use rayon::prelude::*;

    let run = || items.par_iter().map(&f).collect();
    if n_threads == 0 {
        return run();
    }
    match rayon::ThreadPoolBuilder::new().num_threads(n_threads).build() {
        Ok(pool) => pool.install(run),
        Err(err) => {
            log::warn!(
                target: LOG_TARGET,
                "could not build a pool of {n_threads} threads, using the global pool: {err}"
            );
            run()
        }
    }
}

/// Runs a single test case on a random matrix drawn from `rng`, and returns the failed checks.
pub fn check_trevc3_case(
    solver: &(impl RealSchurEigenvectors + ?Sized),
    label: CaseLabel,
    tolerance: f64,
    check_mul_q: bool,
    rng: &mut (impl Rng + ?Sized),
) -> Vec<TrevcFailure> {
    let CaseLabel {
        side,
        n,
        extra,
        opt_work,
    } = label;
    let stride = n + extra;
    let right = side != EvSide::Left;
    let left = side != EvSide::Right;
    let mut rec = Recorder {
        label,
        failures: Vec::new(),
    };

    let SchurCanonical { t: t_orig, wr, wi } = random_schur_canonical(n, stride, rng);
    let mut t = t_orig.clone();

    // all eigenvectors
    let mut vr = right.then(|| Mat::nan_padded(n, n, stride));
    let mut vl = left.then(|| Mat::nan_padded(n, n, stride));
    let call = Call {
        solver,
        side,
        n,
        opt_work,
    };
    let m = call.run(
        &mut rec,
        Phase::All,
        EvHowMany::All,
        &mut [],
        &mut t,
        &mut vl,
        &mut vr,
        n,
    );
    rec.check_outside(Phase::All, &t, &vl, &vr);
    rec.check_count(Phase::All, m, n);

    if let Some(vr) = &vr {
        rec.check_residual(
            ResidualKind::Right,
            residual_right_ev(t_orig.as_ref(), vr.as_ref(), &wr, &wi),
            tolerance,
        );
        rec.check_residual(
            ResidualKind::RightNormalization,
            residual_ev_normalization(vr.as_ref(), &wi),
            tolerance,
        );
    }
    if let Some(vl) = &vl {
        rec.check_residual(
            ResidualKind::Left,
            residual_left_ev(t_orig.as_ref(), vl.as_ref(), &wr, &wi),
            tolerance,
        );
        rec.check_residual(
            ResidualKind::LeftNormalization,
            residual_ev_normalization(vl.as_ref(), &wi),
            tolerance,
        );
    }

    // selected eigenvectors, compared with the full computation
    let (mut selected, selected_want, m_want) = select_trailing(&wi);
    t.copy_from(t_orig.as_ref());
    let mut vr_sel = right.then(|| Mat::nan_padded(n, m_want, stride));
    let mut vl_sel = left.then(|| Mat::nan_padded(n, m_want, stride));
    let m = call.run(
        &mut rec,
        Phase::Selected,
        EvHowMany::Selected,
        &mut selected,
        &mut t,
        &mut vl_sel,
        &mut vr_sel,
        m_want,
    );
    rec.check_outside(Phase::Selected, &t, &vl_sel, &vr_sel);
    rec.check_count(Phase::Selected, m, m_want);
    for (index, (&got, &want)) in core::iter::zip(&selected, &selected_want).enumerate() {
        if got != want {
            rec.fail(FailureKind::SelectionMask { index, got, want });
        }
    }
    for (operand, full, sel) in [(Operand::Vr, &vr, &vr_sel), (Operand::Vl, &vl, &vl_sel)] {
        if let (Some(full), Some(sel)) = (full, sel) {
            if !selected_columns_match(full.as_ref(), sel.as_ref(), &wi, &selected_want) {
                rec.fail(FailureKind::Mismatch {
                    phase: Phase::Selected,
                    operand,
                });
            }
        }
    }

    // all eigenvectors multiplied into the identity, compared with the full computation
    if check_mul_q {
        t.copy_from(t_orig.as_ref());
        let mut vr_mul = right.then(|| Mat::identity_padded(n, stride));
        let mut vl_mul = left.then(|| Mat::identity_padded(n, stride));
        let m = call.run(
            &mut rec,
            Phase::AllMulQ,
            EvHowMany::AllMulQ,
            &mut [],
            &mut t,
            &mut vl_mul,
            &mut vr_mul,
            n,
        );
        rec.check_outside(Phase::AllMulQ, &t, &vl_mul, &vr_mul);
        rec.check_count(Phase::AllMulQ, m, n);
        for (operand, full, mul) in [(Operand::Vr, &vr, &vr_mul), (Operand::Vl, &vl, &vl_mul)] {
            if let (Some(full), Some(mul)) = (full, mul) {
                if !bitwise_eq(full.as_ref(), mul.as_ref()) {
                    rec.fail(FailureKind::Mismatch {
                        phase: Phase::AllMulQ,
                        operand,
                    });
                }
            }
        }
    }

    rec.failures
}

struct Recorder {
    label: CaseLabel,
    failures: Vec<TrevcFailure>,
}

impl Recorder {
    fn fail(&mut self, kind: FailureKind) {
        let failure = TrevcFailure {
            label: self.label,
            kind,
        };
        log::warn!(target: LOG_TARGET, "{failure}");
        self.failures.push(failure);
    }

    fn check_outside(&mut self, phase: Phase, t: &Mat, vl: &Option<Mat>, vr: &Option<Mat>) {
        for (operand, mat) in [
            (Operand::T, Some(t)),
            (Operand::Vr, vr.as_ref()),
            (Operand::Vl, vl.as_ref()),
        ] {
            if let Some(mat) = mat {
                if !mat.outside_all_nan() {
                    self.fail(FailureKind::OutOfRectangleWrite { phase, operand });
                }
            }
        }
    }

    fn check_count(&mut self, phase: Phase, got: usize, want: usize) {
        if got != want {
            self.fail(FailureKind::EigenvectorCount { phase, got, want });
        }
    }

    fn check_residual(&mut self, kind: ResidualKind, value: f64, tolerance: f64) {
        // NaN fails too.
        if !(value <= tolerance) {
            self.fail(FailureKind::Residual {
                kind,
                value,
                tolerance,
            });
        }
    }
}

struct Call<'a, S: ?Sized> {
    solver: &'a S,
    side: EvSide,
    n: usize,
    opt_work: bool,
}

impl<S: RealSchurEigenvectors + ?Sized> Call<'_, S> {
    /// Allocates the workspace, querying its length if requested, then calls the solver.
    fn run(
        &self,
        rec: &mut Recorder,
        phase: Phase,
        howmny: EvHowMany,
        selected: &mut [bool],
        t: &mut Mat,
        vl: &mut Option<Mat>,
        vr: &mut Option<Mat>,
        mm: usize,
    ) -> usize {
        let Self {
            solver,
            side,
            n,
            opt_work,
        } = *self;
        let minimum = minimum_work_len(n);
        let ldt = Ord::max(1, t.row_stride());

        let lwork = if opt_work && solver.supports_workspace_query() {
            let mut query = [0.0];
            let (vl, ldvl) = raw_parts(vl);
            let (vr, ldvr) = raw_parts(vr);
            solver.trevc3(
                side,
                howmny,
                selected,
                n,
                t.as_slice_mut(),
                ldt,
                vl,
                ldvl,
                vr,
                ldvr,
                mm,
                Workspace::Query(&mut query),
            );
            let reported = query[0];
            if reported.is_finite() && reported >= minimum as f64 {
                reported as usize
            } else {
                rec.fail(FailureKind::WorkspaceQuery {
                    phase,
                    reported,
                    minimum,
                });
                minimum
            }
        } else {
            minimum
        };

        let mut work = vec![0.0; lwork];
        let (vl, ldvl) = raw_parts(vl);
        let (vr, ldvr) = raw_parts(vr);
        solver.trevc3(
            side,
            howmny,
            selected,
            n,
            t.as_slice_mut(),
            ldt,
            vl,
            ldvl,
            vr,
            ldvr,
            mm,
            Workspace::Buffer(&mut work),
        )
    }
}

/// Returns the backing buffer and the leading dimension passed to the solver. An absent operand
/// is an empty buffer with leading dimension one.
fn raw_parts(mat: &mut Option<Mat>) -> (&mut [f64], usize) {
    match mat {
        Some(mat) => {
            let ld = Ord::max(1, mat.row_stride());
            (mat.as_slice_mut(), ld)
        }
        None => (&mut [], 1),
    }
}

/// Selects the last `max(1, n/4)` real eigenvalues and the last `max(1, n/4)` complex pairs.
///
/// Returns the selection mask passed to the solver, in which both columns of a selected pair
/// are set, the canonical mask the solver must return, in which only the first column of a
/// selected pair is set, and the number of selected columns.
fn select_trailing(wi: &[f64]) -> (Vec<bool>, Vec<bool>, usize) {
    let n = wi.len();
    let quota = Ord::max(1, n / 4);
    let mut selected = vec![false; n];
    let mut selected_want = vec![false; n];
    let mut n_real = 0;
    let mut n_complex = 0;

    let mut j = n;
    while j > 0 {
        let k = j - 1;
        if wi[k] != 0.0 && k > 0 {
            if n_complex < quota {
                n_complex += 1;
                selected[k] = true;
                selected[k - 1] = true;
                selected_want[k - 1] = true;
            }
            j -= 2;
        } else {
            if n_real < quota {
                n_real += 1;
                selected[k] = true;
                selected_want[k] = true;
            }
            j -= 1;
        }
    }
    (selected, selected_want, n_real + 2 * n_complex)
}

/// Returns `true` if the columns of `sel` are bitwise equal, in order, to the columns of `full`
/// flagged in the canonical mask `selected`.
fn selected_columns_match(
    full: MatRef<'_>,
    sel: MatRef<'_>,
    wi: &[f64],
    selected: &[bool],
) -> bool {
    let n = full.nrows();
    let mut k = 0;
    for block in eigen_blocks(wi) {
        let j = block.col();
        if !selected[j] {
            continue;
        }
        let width = block.width();
        if k + width > sel.ncols() {
            return false;
        }
        for c in 0..width {
            for i in 0..n {
                if sel.read(i, k + c) != full.read(i, j + c) {
                    return false;
                }
            }
        }
        k += width;
    }
    true
}

fn bitwise_eq(a: MatRef<'_>, b: MatRef<'_>) -> bool {
    a.nrows() == b.nrows()
        && a.ncols() == b.ncols()
        && (0..a.nrows()).all(|i| a.row(i) == b.row(i))
}

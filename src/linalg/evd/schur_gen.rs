use crate::Mat;
use rand::Rng;

/// Random real Schur canonical matrix along with its eigenvalues.
#[derive(Clone, Debug)]
pub struct SchurCanonical {
    /// Upper quasi-triangular matrix, with NaN out-of-rectangle storage.
    pub t: Mat,
    /// Real parts of the eigenvalues, in diagonal order.
    pub wr: Vec<f64>,
    /// Imaginary parts of the eigenvalues. A $2 \times 2$ block at `(j, j + 1)` has
    /// `wi[j] > 0` and `wi[j + 1] = -wi[j]`.
    pub wi: Vec<f64>,
}

/// Returns a random `n × n` real Schur canonical matrix stored with the given row stride.
///
/// The diagonal is a random mix of $1 \times 1$ blocks and $2 \times 2$ blocks
/// `[[a, b], [c, a]]` with `b * c < 0`, each chosen with probability one half while a
/// $2 \times 2$ block still fits. Diagonal and strictly upper block entries are drawn uniformly
/// from `[-1, 1]`, and everything outside the logical rectangle is NaN.
///
/// # Panics
/// Panics if `row_stride < n`.
#[track_caller]
pub fn random_schur_canonical(
    n: usize,
    row_stride: usize,
    rng: &mut (impl Rng + ?Sized),
) -> SchurCanonical {
    let mut t = Mat::from_fn_padded(n, n, row_stride, |_, _| 0.0);
    let mut wr = vec![0.0; n];
    let mut wi = vec![0.0; n];

    let mut j = 0;
    while j < n {
        if j + 1 < n && rng.gen::<bool>() {
            let a = rng.gen_range(-1.0..=1.0);
            let (b, mut c) = loop {
                let b: f64 = rng.gen_range(-1.0..=1.0);
                let c: f64 = rng.gen_range(-1.0..=1.0);
                if b * c != 0.0 {
                    break (b, c);
                }
            };
            if b * c > 0.0 {
                c = -c;
            }
            t.write(j, j, a);
            t.write(j, j + 1, b);
            t.write(j + 1, j, c);
            t.write(j + 1, j + 1, a);

            let im = b.abs().sqrt() * c.abs().sqrt();
            wr[j] = a;
            wr[j + 1] = a;
            wi[j] = im;
            wi[j + 1] = -im;
            j += 2;
        } else {
            let a = rng.gen_range(-1.0..=1.0);
            t.write(j, j, a);
            wr[j] = a;
            j += 1;
        }
    }

    for i in 0..n {
        // skip the superdiagonal entry of a 2x2 block, which is already set.
        let first = if wi[i] > 0.0 { i + 2 } else { i + 1 };
        for k in first..n {
            t.write(i, k, rng.gen_range(-1.0..=1.0));
        }
    }

    SchurCanonical { t, wr, wi }
}

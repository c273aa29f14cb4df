//! Receiver operating characteristic curves.
//!
//! The input to [`roc`] is a vector of binary labels that the caller has already sorted by
//! ascending classifier score, together with optional nonnegative weights. Cutting the sorted
//! vector at index `k` predicts every observation at index `>= k` as positive; sweeping `k`
//! yields one (FPR, TPR) point per cut.

use equator::assert;

/// Returns the true positive rates and false positive rates of the ROC curve obtained by
/// thresholding the score-sorted `classes` at every position, as `(tpr, fpr)`.
///
/// `classes[i]` is the ground truth label of the observation with the `i`-th smallest score. If
/// `weights` is `None`, every observation has weight one. Both returned vectors have length
/// `classes.len() + 1`, are non-decreasing, start at zero and end at one. A rate whose class
/// has zero total weight is NaN at every point, since its denominator is zero. When `classes`
/// is empty both vectors are empty.
///
/// Negative weights are not validated.
///
/// # Panics
/// Panics if `weights` is provided and its length differs from the length of `classes`.
///
/// # Example
/// ```
/// use numcheck::stats::roc::roc;
///
/// let classes = [false, true, false, true, true, true];
/// let weights = [4.0, 1.0, 6.0, 3.0, 2.0, 2.0];
///
/// let (tpr, fpr) = roc(&classes, Some(&weights));
/// assert_eq!(tpr, [0.0, 0.25, 0.5, 0.875, 0.875, 1.0, 1.0]);
/// let want = [0.0, 0.0, 0.0, 0.0, 0.6, 0.6, 1.0];
/// assert!(fpr.iter().zip(want).all(|(x, y)| (x - y).abs() < 1e-14));
/// ```
#[track_caller]
pub fn roc(classes: &[bool], weights: Option<&[f64]>) -> (Vec<f64>, Vec<f64>) {
    if let Some(weights) = weights {
        assert!(weights.len() == classes.len());
    }
    if classes.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let n = classes.len();
    let mut tpr = vec![0.0; n + 1];
    let mut fpr = vec![0.0; n + 1];
    let mut n_pos = 0.0;
    let mut n_neg = 0.0;

    for (j, &positive) in classes.iter().enumerate() {
        tpr[j + 1] = tpr[j];
        fpr[j + 1] = fpr[j];

        let w = weights.map_or(1.0, |weights| weights[j]);
        if positive {
            n_pos += w;
            tpr[j + 1] += w;
        } else {
            n_neg += w;
            fpr[j + 1] += w;
        }
    }

    // 0/0 is NaN when a class is absent, which is the reported rate.
    for (t, f) in core::iter::zip(&mut tpr, &mut fpr) {
        *t = 1.0 - *t / n_pos;
        *f = 1.0 - *f / n_neg;
    }
    tpr.reverse();
    fpr.reverse();

    (tpr, fpr)
}

/// Returns the integral of the piecewise linear function through the points `(x[i], f[i])`,
/// computed with the trapezoidal rule.
///
/// Applied to the output of [`roc`] as `auc(&fpr, &tpr)` this gives the area under the ROC
/// curve.
///
/// # Panics
/// Panics if `x` and `f` have different lengths, or if fewer than two points are given.
///
/// # Example
/// ```
/// use numcheck::stats::roc::auc;
///
/// assert_eq!(auc(&[0.0, 1.0, 3.0], &[1.0, 1.0, 2.0]), 4.0);
/// ```
#[track_caller]
pub fn auc(x: &[f64], f: &[f64]) -> f64 {
    assert!(all(x.len() == f.len(), x.len() >= 2));

    let mut integral = 0.0;
    for i in 1..x.len() {
        integral += (x[i] - x[i - 1]) * (f[i] + f[i - 1]);
    }
    integral / 2.0
}

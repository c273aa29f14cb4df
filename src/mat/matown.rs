use super::*;
use equator::assert;

/// Heap allocated matrix, stored in row-major order with a possibly padded row stride.
///
/// Cloning a `Mat` preserves its row stride and the contents of its out-of-rectangle storage.
#[derive(Clone, Debug)]
pub struct Mat {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
    row_stride: usize,
}

impl Mat {
    /// Returns a tightly packed `nrows × ncols` matrix with all elements equal to zero.
    #[inline]
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::from_fn(nrows, ncols, |_, _| 0.0)
    }

    /// Returns a tightly packed `nrows × ncols` matrix whose elements are initialized with `f`.
    #[inline]
    pub fn from_fn(nrows: usize, ncols: usize, f: impl FnMut(usize, usize) -> f64) -> Self {
        Self::from_fn_padded(nrows, ncols, ncols, f)
    }

    /// Returns a tightly packed matrix built from a slice of equally sized rows.
    ///
    /// # Panics
    /// Panics if the rows do not all have the same length.
    #[track_caller]
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |row| row.len());
        let rectangular = rows.iter().all(|row| row.len() == ncols);
        assert!(rectangular);
        Self::from_fn(nrows, ncols, |i, j| rows[i][j])
    }

    /// Returns an `nrows × ncols` matrix with the given row stride, backed by a buffer of
    /// `nrows * row_stride` elements that are all NaN, in and out of the logical rectangle.
    ///
    /// # Panics
    /// Panics if `row_stride < ncols`.
    #[track_caller]
    pub fn nan_padded(nrows: usize, ncols: usize, row_stride: usize) -> Self {
        assert!(row_stride >= ncols);
        Self {
            data: vec![f64::NAN; nrows * row_stride],
            nrows,
            ncols,
            row_stride,
        }
    }

    /// Returns an `nrows × ncols` matrix with the given row stride whose logical rectangle is
    /// initialized with `f` and whose out-of-rectangle storage is NaN.
    ///
    /// # Panics
    /// Panics if `row_stride < ncols`.
    #[track_caller]
    pub fn from_fn_padded(
        nrows: usize,
        ncols: usize,
        row_stride: usize,
        mut f: impl FnMut(usize, usize) -> f64,
    ) -> Self {
        let mut mat = Self::nan_padded(nrows, ncols, row_stride);
        for i in 0..nrows {
            for j in 0..ncols {
                mat.data[i * row_stride + j] = f(i, j);
            }
        }
        mat
    }

    /// Returns the `n × n` identity matrix with the given row stride and NaN out-of-rectangle
    /// storage.
    #[track_caller]
    pub fn identity_padded(n: usize, row_stride: usize) -> Self {
        Self::from_fn_padded(n, n, row_stride, |i, j| if i == j { 1.0 } else { 0.0 })
    }

    /// Returns the number of rows of the matrix.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of columns of the matrix.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the distance between the starts of two consecutive rows.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Returns a view over the matrix.
    #[inline]
    pub fn as_ref(&self) -> MatRef<'_> {
        MatRef {
            data: &self.data,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
        }
    }

    /// Returns a mutable view over the matrix.
    #[inline]
    pub fn as_mut(&mut self) -> MatMut<'_> {
        MatMut {
            data: &mut self.data,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
        }
    }

    /// Returns the backing buffer, out-of-rectangle storage included.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Returns the backing buffer, out-of-rectangle storage included.
    #[inline]
    pub fn as_slice_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Reads the value of the element at the given indices.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize) -> f64 {
        self.as_ref().read(row, col)
    }

    /// Writes the value to the element at the given indices.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, col: usize, value: f64) {
        self.as_mut().write(row, col, value)
    }

    /// Copies the logical rectangle of `src` into the logical rectangle of `self`, leaving the
    /// out-of-rectangle storage untouched.
    #[inline]
    #[track_caller]
    pub fn copy_from(&mut self, src: MatRef<'_>) {
        self.as_mut().copy_from(src)
    }

    /// Returns `true` if no element outside the logical rectangle has been overwritten, assuming
    /// the matrix was allocated by one of the NaN-padded constructors.
    #[inline]
    pub fn outside_all_nan(&self) -> bool {
        self.as_ref().outside_all_nan()
    }
}

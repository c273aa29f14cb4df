use super::*;
use equator::assert;

/// Immutable view over a matrix, similar to an immutable reference to a 2D strided [prim@slice].
///
/// The view covers the whole backing slice, including the out-of-rectangle storage, so that
/// [`MatRef::outside_all_nan`] can inspect it.
#[derive(Copy, Clone, Debug)]
pub struct MatRef<'a> {
    pub(super) data: &'a [f64],
    pub(super) nrows: usize,
    pub(super) ncols: usize,
    pub(super) row_stride: usize,
}

impl<'short> Reborrow<'short> for MatRef<'_> {
    type Target = MatRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        *self
    }
}

impl<'short> ReborrowMut<'short> for MatRef<'_> {
    type Target = MatRef<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        *self
    }
}

impl<'a> MatRef<'a> {
    /// Creates a view over a row-major slice with the given row stride.
    ///
    /// # Panics
    /// Panics if `row_stride < ncols`, or if `data` is too short to hold the logical rectangle.
    #[inline]
    #[track_caller]
    pub fn from_row_major_slice_with_stride(
        data: &'a [f64],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        assert!(data.len() >= required_len(nrows, ncols, row_stride));
        Self {
            data,
            nrows,
            ncols,
            row_stride,
        }
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

    /// Returns the backing slice, out-of-rectangle storage included.
    #[inline]
    pub fn as_slice(self) -> &'a [f64] {
        self.data
    }

    /// Reads the value of the element at the given indices.
    ///
    /// # Panics
    /// Panics if `(row, col)` lies outside the logical rectangle.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize) -> f64 {
        assert!(all(row < self.nrows, col < self.ncols));
        self.data[row * self.row_stride + col]
    }

    /// Returns the logical part of the row at the given index.
    #[inline]
    #[track_caller]
    pub fn row(self, row: usize) -> &'a [f64] {
        assert!(row < self.nrows);
        let start = row * self.row_stride;
        &self.data[start..start + self.ncols]
    }

    /// Returns an iterator over the elements of the column at the given index.
    #[inline]
    #[track_caller]
    pub fn col(self, col: usize) -> impl Iterator<Item = f64> + 'a {
        assert!(col < self.ncols);
        let data = self.data;
        let row_stride = self.row_stride;
        (0..self.nrows).map(move |i| data[i * row_stride + col])
    }

    /// Returns `true` if every element of the backing slice that lies outside the logical
    /// rectangle is NaN.
    pub fn outside_all_nan(&self) -> bool {
        outside_all_nan(self.data, self.nrows, self.ncols, self.row_stride)
    }

    /// Returns the maximum absolute value of the elements of the matrix, or zero if it is empty.
    /// NaN elements propagate to the result.
    pub fn norm_max(&self) -> f64 {
        (0..self.nrows)
            .flat_map(|i| self.row(i).iter())
            .fold(0.0, |acc, x| max_propagate_nan(acc, x.abs()))
    }

    /// Returns the maximum absolute column sum of the matrix (its induced one-norm), or zero if
    /// it is empty. NaN elements propagate to the result.
    pub fn norm_l1(&self) -> f64 {
        (0..self.ncols)
            .map(|j| self.col(j).map(f64::abs).sum::<f64>())
            .fold(0.0, max_propagate_nan)
    }
}

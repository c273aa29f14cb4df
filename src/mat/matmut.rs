use super::*;
use equator::assert;

/// Mutable view over a matrix, similar to a mutable reference to a 2D strided [prim@slice].
///
/// Writes through the view are restricted to the logical rectangle.
#[derive(Debug)]
pub struct MatMut<'a> {
    pub(super) data: &'a mut [f64],
    pub(super) nrows: usize,
    pub(super) ncols: usize,
    pub(super) row_stride: usize,
}

impl<'short> Reborrow<'short> for MatMut<'_> {
    type Target = MatRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        MatRef {
            data: &*self.data,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
        }
    }
}

impl<'short> ReborrowMut<'short> for MatMut<'_> {
    type Target = MatMut<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        MatMut {
            data: &mut *self.data,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
        }
    }
}

impl<'a> MatMut<'a> {
    /// Creates a mutable view over a row-major slice with the given row stride.
    ///
    /// # Panics
    /// Panics if `row_stride < ncols`, or if `data` is too short to hold the logical rectangle.
    #[inline]
    #[track_caller]
    pub fn from_row_major_slice_with_stride(
        data: &'a mut [f64],
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

    /// Reads the value of the element at the given indices.
    #[inline]
    #[track_caller]
    pub fn read(&self, row: usize, col: usize) -> f64 {
        self.rb().read(row, col)
    }

    /// Writes the value to the element at the given indices.
    ///
    /// # Panics
    /// Panics if `(row, col)` lies outside the logical rectangle.
    #[inline]
    #[track_caller]
    pub fn write(&mut self, row: usize, col: usize, value: f64) {
        assert!(all(row < self.nrows, col < self.ncols));
        self.data[row * self.row_stride + col] = value;
    }

    /// Returns the backing slice, out-of-rectangle storage included.
    #[inline]
    pub fn as_slice_mut(self) -> &'a mut [f64] {
        self.data
    }

    /// Fills the logical rectangle with `value`, leaving the out-of-rectangle storage untouched.
    pub fn fill(&mut self, value: f64) {
        for i in 0..self.nrows {
            let start = i * self.row_stride;
            self.data[start..start + self.ncols].fill(value);
        }
    }

    /// Copies the logical rectangle of `src` into the logical rectangle of `self`.
    ///
    /// # Panics
    /// Panics if the dimensions of `self` and `src` differ.
    #[track_caller]
    pub fn copy_from(&mut self, src: MatRef<'_>) {
        assert!(all(self.nrows == src.nrows(), self.ncols == src.ncols()));
        for i in 0..self.nrows {
            let start = i * self.row_stride;
            self.data[start..start + self.ncols].copy_from_slice(src.row(i));
        }
    }
}

//! Row-major matrix views over caller-owned buffers.
//!
//! Views never allocate. Input views ([`MatRef`]) must cover their buffer
//! exactly; the output view ([`MatMut`]) accepts a larger buffer and only
//! exposes its leading `rows * cols` elements, so whatever sits past the
//! product is left alone.

use ndarray::{ArrayView2, ArrayViewMut2};

use crate::error::{dimension_mismatch, Result, TransmulError};

fn checked_len(rows: usize, cols: usize) -> Result<usize> {
    rows.checked_mul(cols)
        .ok_or_else(|| TransmulError::Layout(format!("{rows}x{cols} overflows usize")))
}

/// Read-only row-major matrix view with stride equal to the column count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatRef<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<'a, T> MatRef<'a, T> {
    /// Wraps `data` as a `rows x cols` matrix.
    ///
    /// # Errors
    ///
    /// Returns [`TransmulError::DimensionMismatch`] if `data.len() != rows * cols`.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        if data.len() != len {
            return Err(dimension_mismatch("matrix elements", len, data.len()));
        }
        Ok(Self { data, rows, cols })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row `i` as a slice of `cols` elements.
    ///
    /// # Panics
    ///
    /// Panics if `i >= rows`.
    #[inline(always)]
    pub fn row(&self, i: usize) -> &'a [T] {
        let start = i * self.cols;
        &self.data[start..start + self.cols]
    }
}

impl<'a, T> TryFrom<ArrayView2<'a, T>> for MatRef<'a, T> {
    type Error = TransmulError;

    /// Borrows an ndarray view; only contiguous row-major views are accepted.
    fn try_from(view: ArrayView2<'a, T>) -> Result<Self> {
        let (rows, cols) = view.dim();
        let data = view.to_slice().ok_or_else(|| {
            TransmulError::Layout(format!(
                "{rows}x{cols} view is not contiguous in row-major order"
            ))
        })?;
        Self::new(data, rows, cols)
    }
}

/// Write-only row-major output view of `i32` accumulators.
#[derive(Debug)]
pub struct MatMut<'a> {
    data: &'a mut [i32],
    rows: usize,
    cols: usize,
}

impl<'a> MatMut<'a> {
    /// Views the leading `rows * cols` elements of `data` as a matrix.
    ///
    /// # Errors
    ///
    /// Returns [`TransmulError::DimensionMismatch`] if `data` is shorter than
    /// `rows * cols`.
    pub fn new(data: &'a mut [i32], rows: usize, cols: usize) -> Result<Self> {
        let len = checked_len(rows, cols)?;
        if data.len() < len {
            return Err(dimension_mismatch("output elements", len, data.len()));
        }
        Ok(Self {
            data: &mut data[..len],
            rows,
            cols,
        })
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn as_mut_slice(&mut self) -> &mut [i32] {
        &mut *self.data
    }
}

impl<'a> TryFrom<ArrayViewMut2<'a, i32>> for MatMut<'a> {
    type Error = TransmulError;

    fn try_from(view: ArrayViewMut2<'a, i32>) -> Result<Self> {
        let (rows, cols) = view.dim();
        let data = view.into_slice().ok_or_else(|| {
            TransmulError::Layout(format!(
                "{rows}x{cols} output view is not contiguous in row-major order"
            ))
        })?;
        Self::new(data, rows, cols)
    }
}

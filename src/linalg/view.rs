//! Non-owning column-major views into a caller-provided slab.
//!
//! Modeled on faer's `MatRef`/`MatMut` split, specialized so the leading
//! dimension is always `rows` — every view here is carved from a single
//! packed slab, never from an arbitrarily-strided buffer, so there is no
//! separate stride to track.

/// A read-only `rows x cols` column-major view into a slab.
///
/// Element `(i, j)` lives at `data[j * rows + i]`.
#[derive(Clone, Copy, Debug)]
pub struct MatrixView<'a> {
    rows: usize,
    cols: usize,
    data: &'a [f64],
}

/// A mutable `rows x cols` column-major view into a slab.
#[derive(Debug)]
pub struct MatrixViewMut<'a> {
    rows: usize,
    cols: usize,
    data: &'a mut [f64],
}

impl<'a> MatrixView<'a> {
    pub fn new(rows: usize, cols: usize, data: &'a [f64]) -> Self {
        assert_eq!(data.len(), rows * cols, "slab slice does not match shape");
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn data(&self) -> &[f64] {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[j * self.rows + i]
    }

    pub fn col(&self, j: usize) -> &[f64] {
        &self.data[j * self.rows..(j + 1) * self.rows]
    }

    pub fn reborrow(&self) -> MatrixView<'_> {
        MatrixView {
            rows: self.rows,
            cols: self.cols,
            data: self.data,
        }
    }
}

impl<'a> MatrixViewMut<'a> {
    pub fn new(rows: usize, cols: usize, data: &'a mut [f64]) -> Self {
        assert_eq!(data.len(), rows * cols, "slab slice does not match shape");
        Self { rows, cols, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn data(&self) -> &[f64] {
        self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[j * self.rows + i]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[j * self.rows + i] = value;
    }

    pub fn col(&self, j: usize) -> &[f64] {
        &self.data[j * self.rows..(j + 1) * self.rows]
    }

    pub fn col_mut(&mut self, j: usize) -> &mut [f64] {
        &mut self.data[j * self.rows..(j + 1) * self.rows]
    }

    pub fn as_ref(&self) -> MatrixView<'_> {
        MatrixView {
            rows: self.rows,
            cols: self.cols,
            data: self.data,
        }
    }

    pub fn reborrow_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut {
            rows: self.rows,
            cols: self.cols,
            data: self.data,
        }
    }

    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    pub fn copy_from(&mut self, src: MatrixView<'_>) -> Result<(), crate::error::LinAlgError> {
        if self.rows != src.rows || self.cols != src.cols {
            return Err(crate::error::LinAlgError::ShapeMismatch);
        }
        self.data.copy_from_slice(src.data);
        Ok(())
    }
}

//! Per-stage data block.
//!
//! Each stage owns no memory; it is a set of named, disjoint sub-slices
//! carved out of one `stage_size(n, m)`-length segment of the solver's
//! slab, with `K` immediately followed by `d` so the pair can be treated
//! as a single `m x (n+1)` matrix for one Cholesky solve.

use crate::error::LqrError;
use crate::linalg::{MatrixView, MatrixViewMut};

/// Number of `f64`s needed for one stage's block, for state dimension `n`
/// and input dimension `m`.
///
/// Field order: `Q R H q r c A B f [K d] [P p] Qxx Quu Qux Qx Qu y`.
pub fn stage_size(n: usize, m: usize) -> usize {
    n * n   // Q
        + m * m // R
        + m * n // H
        + n     // q
        + m     // r
        + 1     // c
        + n * n // A
        + n * m // B
        + n     // f
        + m * (n + 1) // [K | d]
        + n * (n + 1) // [P | p]
        + (n * n + m * m + m * n + n + m) // Qxx Quu Qux Qx Qu
        + n // y
}

/// Named, disjoint views into one stage's slab segment.
#[allow(non_snake_case)]
pub struct StageData<'a> {
    n: usize,
    m: usize,
    pub Q: &'a mut [f64],
    pub R: &'a mut [f64],
    pub H: &'a mut [f64],
    pub q: &'a mut [f64],
    pub r: &'a mut [f64],
    pub c: &'a mut [f64],
    pub A: &'a mut [f64],
    pub B: &'a mut [f64],
    pub f: &'a mut [f64],
    pub K: &'a mut [f64],
    pub d: &'a mut [f64],
    pub P: &'a mut [f64],
    pub p: &'a mut [f64],
    pub Qxx: &'a mut [f64],
    pub Quu: &'a mut [f64],
    pub Qux: &'a mut [f64],
    pub Qx: &'a mut [f64],
    pub Qu: &'a mut [f64],
    pub y: &'a mut [f64],
}

#[allow(non_snake_case)]
impl<'a> StageData<'a> {
    /// Splits `slab` (which must be exactly `stage_size(n, m)` long) into
    /// the named field sub-slices, in spec order.
    pub fn from_slab(slab: &'a mut [f64], n: usize, m: usize) -> Self {
        debug_assert_eq!(slab.len(), stage_size(n, m));

        let (Q, rest) = slab.split_at_mut(n * n);
        let (R, rest) = rest.split_at_mut(m * m);
        let (H, rest) = rest.split_at_mut(m * n);
        let (q, rest) = rest.split_at_mut(n);
        let (r, rest) = rest.split_at_mut(m);
        let (c, rest) = rest.split_at_mut(1);
        let (A, rest) = rest.split_at_mut(n * n);
        let (B, rest) = rest.split_at_mut(n * m);
        let (f, rest) = rest.split_at_mut(n);
        let (K, rest) = rest.split_at_mut(m * n);
        let (d, rest) = rest.split_at_mut(m);
        let (P, rest) = rest.split_at_mut(n * n);
        let (p, rest) = rest.split_at_mut(n);
        let (Qxx, rest) = rest.split_at_mut(n * n);
        let (Quu, rest) = rest.split_at_mut(m * m);
        let (Qux, rest) = rest.split_at_mut(m * n);
        let (Qx, rest) = rest.split_at_mut(n);
        let (Qu, rest) = rest.split_at_mut(m);
        let (y, rest) = rest.split_at_mut(n);
        debug_assert!(rest.is_empty());

        Self {
            n, m, Q, R, H, q, r, c, A, B, f, K, d, P, p, Qxx, Quu, Qux, Qx, Qu, y,
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn Q(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, self.n, self.Q)
    }
    pub fn Q_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, self.n, self.Q)
    }
    pub fn R(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, self.m, self.R)
    }
    pub fn R_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, self.m, self.R)
    }
    pub fn H(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, self.n, self.H)
    }
    pub fn H_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, self.n, self.H)
    }
    pub fn q(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, 1, self.q)
    }
    pub fn q_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, 1, self.q)
    }
    pub fn r(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, 1, self.r)
    }
    pub fn r_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, 1, self.r)
    }
    pub fn c(&self) -> f64 {
        self.c[0]
    }
    pub fn set_c(&mut self, value: f64) {
        self.c[0] = value;
    }
    pub fn A(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, self.n, self.A)
    }
    pub fn A_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, self.n, self.A)
    }
    pub fn B(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, self.m, self.B)
    }
    pub fn B_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, self.m, self.B)
    }
    pub fn f(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, 1, self.f)
    }
    pub fn f_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, 1, self.f)
    }
    pub fn K(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, self.n, self.K)
    }
    pub fn K_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, self.n, self.K)
    }
    pub fn d(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, 1, self.d)
    }
    pub fn d_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, 1, self.d)
    }

    /// `[K | d]` as one `m x (n+1)` view, relying on `K` and `d` being
    /// adjacent in the slab. Used for the single Cholesky solve that
    /// produces both gains at once.
    pub fn kd_mut(&mut self) -> MatrixViewMut<'_> {
        debug_assert_eq!(
            self.d.as_ptr() as usize,
            self.K.as_ptr() as usize + self.K.len() * std::mem::size_of::<f64>(),
            "K and d must be adjacent in the slab"
        );
        let n = self.n;
        let m = self.m;
        // SAFETY: `K` and `d` are adjacent, disjoint sub-slices of the same
        // slab segment (guaranteed by `from_slab`'s split order); this
        // reconstructs the single contiguous `m x (n+1)` slice they form.
        let combined = unsafe { std::slice::from_raw_parts_mut(self.K.as_mut_ptr(), m * n + m) };
        MatrixViewMut::new(m, n + 1, combined)
    }

    pub fn P(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, self.n, self.P)
    }
    pub fn P_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, self.n, self.P)
    }
    pub fn p(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, 1, self.p)
    }
    pub fn p_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, 1, self.p)
    }
    pub fn Qxx(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, self.n, self.Qxx)
    }
    pub fn Qxx_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, self.n, self.Qxx)
    }
    pub fn Quu(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, self.m, self.Quu)
    }
    pub fn Quu_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, self.m, self.Quu)
    }
    pub fn Qux(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, self.n, self.Qux)
    }
    pub fn Qux_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, self.n, self.Qux)
    }
    pub fn Qx(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, 1, self.Qx)
    }
    pub fn Qx_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, 1, self.Qx)
    }
    pub fn Qu(&self) -> MatrixView<'_> {
        MatrixView::new(self.m, 1, self.Qu)
    }
    pub fn Qu_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.m, 1, self.Qu)
    }
    pub fn y(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, 1, self.y)
    }
    pub fn y_mut(&mut self) -> MatrixViewMut<'_> {
        MatrixViewMut::new(self.n, 1, self.y)
    }
}

/// Reconstructs the single contiguous `[K | d]` slice from two field-level
/// reborrows of an already-split [`StageData`]. Taking `k` and `d` as
/// separate `&mut [f64]` parameters (rather than `&mut StageData`) keeps
/// the borrow disjoint at the call site, so a caller can hold an
/// immutable view of some other field (e.g. the freshly factorized `Quu`)
/// at the same time.
pub fn combine_kd<'b>(k: &'b mut [f64], d: &'b mut [f64]) -> &'b mut [f64] {
    debug_assert_eq!(
        d.as_ptr() as usize,
        k.as_ptr() as usize + k.len() * std::mem::size_of::<f64>(),
        "K and d must be adjacent in the slab"
    );
    let total = k.len() + d.len();
    // SAFETY: `k` and `d` are adjacent, disjoint sub-slices of the same
    // slab segment, checked above.
    unsafe { std::slice::from_raw_parts_mut(k.as_mut_ptr(), total) }
}

/// Bulk-copies one stage's entire `stage_size(n, m)` doubles from `src`
/// into `dst`. Both slices must already be exactly `stage_size(n, m)`
/// long; dimensional mismatch is a caller bug, not a recoverable
/// condition, since both are carved from slabs this crate itself
/// allocated with matching `(n, m)`.
pub fn copy_stage(dst: &mut [f64], src: &[f64]) -> Result<(), LqrError> {
    if dst.len() != src.len() {
        return Err(LqrError::MismatchedShapes);
    }
    dst.copy_from_slice(src);
    Ok(())
}

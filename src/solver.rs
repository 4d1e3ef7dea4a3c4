//! Solver container: one contiguous slab holding the initial state, every
//! stage's data block, and every knot point, plus the non-owning views
//! carved out of it on demand.

use crate::config::RiccatiSettings;
use crate::error::LqrError;
use crate::knot_point::{knot_point_size, KnotPoint};
use crate::linalg::{MatrixView, MatrixViewMut};
use crate::stage::{stage_size, StageData};

/// Owns the single allocation backing a horizon's worth of LQR data.
///
/// Layout, in order: `x0` (`n` doubles), then `nhorizon` stage blocks of
/// `stage_size(n, m)` doubles each, then `nhorizon` knot-point blocks of
/// `knot_point_size(n, m)` doubles each. Dropping a `RiccatiSolver` frees
/// the slab exactly once, for free, via `Vec`'s own `Drop` — there is no
/// explicit teardown call to forget.
pub struct RiccatiSolver {
    n: usize,
    m: usize,
    nhorizon: usize,
    settings: RiccatiSettings,
    slab: Vec<f64>,
    stage_region: usize, // offset where the stage blocks begin
    knot_region: usize,  // offset where the knot-point blocks begin
}

impl RiccatiSolver {
    /// Allocates a zeroed slab for an `n`-state, `m`-input problem over
    /// `nhorizon` knot points.
    pub fn new(n: usize, m: usize, nhorizon: usize, settings: RiccatiSettings) -> Result<Self, LqrError> {
        if n < 1 || m < 1 || nhorizon < 1 {
            return Err(LqrError::NonPositiveDimension);
        }

        let stage_len = stage_size(n, m);
        let knot_len = knot_point_size(n, m);

        let stage_region = n;
        let knot_region = stage_region + nhorizon * stage_len;
        let total = knot_region + nhorizon * knot_len;

        Ok(Self {
            n,
            m,
            nhorizon,
            settings,
            slab: vec![0.0; total],
            stage_region,
            knot_region,
        })
    }

    pub fn nstates(&self) -> usize {
        self.n
    }

    pub fn ninputs(&self) -> usize {
        self.m
    }

    pub fn nhorizon(&self) -> usize {
        self.nhorizon
    }

    pub fn settings(&self) -> &RiccatiSettings {
        &self.settings
    }

    /// Total number of KKT variables across the trajectory: a state and a
    /// costate/dual at every knot point, plus an input at every knot point
    /// but the last — `(2n + m) * nhorizon - m`.
    pub fn nvars(&self) -> usize {
        2 * self.n * self.nhorizon + self.m * (self.nhorizon - 1)
    }

    /// Total `f64`s backing this solver (the slab length), not to be
    /// confused with [`Self::nvars`].
    pub fn storage_len(&self) -> usize {
        self.slab.len()
    }

    fn stage_len(&self) -> usize {
        stage_size(self.n, self.m)
    }

    fn knot_len(&self) -> usize {
        knot_point_size(self.n, self.m)
    }

    fn check_stage_index(&self, k: usize) -> Result<(), LqrError> {
        if k >= self.nhorizon {
            Err(LqrError::IndexOutOfRange)
        } else {
            Ok(())
        }
    }

    pub fn initial_state(&self) -> MatrixView<'_> {
        MatrixView::new(self.n, 1, &self.slab[..self.stage_region])
    }

    pub fn set_initial_state(&mut self, x0: &[f64]) -> Result<(), LqrError> {
        if x0.len() != self.n {
            return Err(LqrError::MismatchedShapes);
        }
        self.slab[..self.stage_region].copy_from_slice(x0);
        Ok(())
    }

    /// Copies `x0` into knot point 0's `x` field, in place. Used by the
    /// forward pass to seed the rollout without an intermediate
    /// allocation (`x0` and knot 0 live in the same slab, just at
    /// different offsets).
    pub fn seed_initial_state(&mut self) {
        let dest = self.knot_region; // knot 0's x field starts here
        self.slab.copy_within(0..self.n, dest);
    }

    /// Mutable view into stage `k`'s data block.
    pub fn stage_mut(&mut self, k: usize) -> Result<StageData<'_>, LqrError> {
        self.check_stage_index(k)?;
        let len = self.stage_len();
        let start = self.stage_region + k * len;
        let slice = &mut self.slab[start..start + len];
        Ok(StageData::from_slab(slice, self.n, self.m))
    }

    /// Mutable views into stages `k` and `k + 1` simultaneously, needed by
    /// the backward pass, which reads stage `k+1`'s cost-to-go while
    /// writing stage `k`'s gains and overwrites stage `k+1`'s scratch
    /// action-value slots along the way.
    pub fn stage_pair_mut(&mut self, k: usize) -> Result<(StageData<'_>, StageData<'_>), LqrError> {
        if k + 1 >= self.nhorizon {
            return Err(LqrError::IndexOutOfRange);
        }
        let len = self.stage_len();
        let region = &mut self.slab[self.stage_region..self.knot_region];
        let boundary = (k + 1) * len;
        let (left, right) = region.split_at_mut(boundary);
        let stage_k = &mut left[k * len..boundary];
        let stage_kp1 = &mut right[..len];
        Ok((
            StageData::from_slab(stage_k, self.n, self.m),
            StageData::from_slab(stage_kp1, self.n, self.m),
        ))
    }

    /// Mutable view into knot point `k`.
    pub fn knot_mut(&mut self, k: usize) -> Result<KnotPoint<'_>, LqrError> {
        self.check_stage_index(k)?;
        let len = self.knot_len();
        let start = self.knot_region + k * len;
        let slice = &mut self.slab[start..start + len];
        Ok(KnotPoint::from_slab(slice, self.n, self.m))
    }

    /// Mutable views into stage `k` and knot points `k` and `k + 1`
    /// simultaneously, needed by the forward rollout, which reads knot
    /// `k`'s state and stage `k`'s gains/dynamics while writing knot
    /// `k`'s input and knot `k + 1`'s state.
    pub fn forward_views(&mut self, k: usize) -> Result<(StageData<'_>, KnotPoint<'_>, KnotPoint<'_>), LqrError> {
        if k + 1 >= self.nhorizon {
            return Err(LqrError::IndexOutOfRange);
        }
        let stage_len = self.stage_len();
        let knot_len = self.knot_len();
        let stage_start = self.stage_region + k * stage_len;
        let knot_k_start = self.knot_region + k * knot_len - self.knot_region;

        let (stages_part, knots_part) = self.slab.split_at_mut(self.knot_region);
        let stage_slice = &mut stages_part[stage_start..stage_start + stage_len];

        let boundary = knot_k_start + knot_len;
        let (left, right) = knots_part.split_at_mut(boundary);
        let knot_k_slice = &mut left[knot_k_start..boundary];
        let knot_kp1_slice = &mut right[..knot_len];

        Ok((
            StageData::from_slab(stage_slice, self.n, self.m),
            KnotPoint::from_slab(knot_k_slice, self.n, self.m),
            KnotPoint::from_slab(knot_kp1_slice, self.n, self.m),
        ))
    }

    /// Mutable views into stage `k` and knot point `k` simultaneously
    /// (the terminal step of the forward rollout needs only these).
    pub fn stage_and_knot_mut(&mut self, k: usize) -> Result<(StageData<'_>, KnotPoint<'_>), LqrError> {
        self.check_stage_index(k)?;
        let stage_len = self.stage_len();
        let knot_len = self.knot_len();
        let stage_start = self.stage_region + k * stage_len;
        let knot_start = self.knot_region + k * knot_len - self.knot_region;

        let (stages_part, knots_part) = self.slab.split_at_mut(self.knot_region);
        let stage_slice = &mut stages_part[stage_start..stage_start + stage_len];
        let knot_slice = &mut knots_part[knot_start..knot_start + knot_len];

        Ok((
            StageData::from_slab(stage_slice, self.n, self.m),
            KnotPoint::from_slab(knot_slice, self.n, self.m),
        ))
    }

    /// Sets `Q`, `R`, and optionally `H`, `q`, `r` for every stage in
    /// `[k_start, k_end)`. Fields left as `None` are untouched, not zeroed
    /// (a caller building up a cost incrementally should not have earlier
    /// writes clobbered by a later, narrower call).
    pub fn set_cost(
        &mut self,
        k_start: usize,
        k_end: usize,
        q_mat: MatrixView<'_>,
        r_mat: MatrixView<'_>,
        h_mat: Option<MatrixView<'_>>,
        q_vec: Option<MatrixView<'_>>,
        r_vec: Option<MatrixView<'_>>,
    ) -> Result<(), LqrError> {
        self.check_range(k_start, k_end)?;
        if q_mat.shape() != (self.n, self.n) || r_mat.shape() != (self.m, self.m) {
            return Err(LqrError::MismatchedShapes);
        }
        if let Some(h) = h_mat {
            if h.shape() != (self.m, self.n) {
                return Err(LqrError::MismatchedShapes);
            }
        }
        if let Some(q) = q_vec {
            if q.shape() != (self.n, 1) {
                return Err(LqrError::MismatchedShapes);
            }
        }
        if let Some(r) = r_vec {
            if r.shape() != (self.m, 1) {
                return Err(LqrError::MismatchedShapes);
            }
        }

        for k in k_start..k_end {
            let mut stage = self.stage_mut(k)?;
            stage.Q_mut().copy_from(q_mat)?;
            stage.R_mut().copy_from(r_mat)?;
            if let Some(h) = h_mat {
                stage.H_mut().copy_from(h)?;
            }
            if let Some(q) = q_vec {
                stage.q_mut().copy_from(q)?;
            }
            if let Some(r) = r_vec {
                stage.r_mut().copy_from(r)?;
            }
        }
        Ok(())
    }

    /// Sets `A`, `B`, and optionally `f` for every stage in
    /// `[k_start, k_end)`.
    pub fn set_dynamics(
        &mut self,
        k_start: usize,
        k_end: usize,
        a_mat: MatrixView<'_>,
        b_mat: MatrixView<'_>,
        f_vec: Option<MatrixView<'_>>,
    ) -> Result<(), LqrError> {
        self.check_range(k_start, k_end)?;
        if a_mat.shape() != (self.n, self.n) || b_mat.shape() != (self.n, self.m) {
            return Err(LqrError::MismatchedShapes);
        }
        if let Some(f) = f_vec {
            if f.shape() != (self.n, 1) {
                return Err(LqrError::MismatchedShapes);
            }
        }

        for k in k_start..k_end {
            let mut stage = self.stage_mut(k)?;
            stage.A_mut().copy_from(a_mat)?;
            stage.B_mut().copy_from(b_mat)?;
            if let Some(f) = f_vec {
                stage.f_mut().copy_from(f)?;
            }
        }
        Ok(())
    }

    fn check_range(&self, k_start: usize, k_end: usize) -> Result<(), LqrError> {
        if k_start >= k_end {
            tracing::warn!(k_start, k_end, "set_cost/set_dynamics called with empty range");
            return Err(LqrError::InvalidRange);
        }
        if k_end > self.nhorizon {
            return Err(LqrError::InvalidRange);
        }
        Ok(())
    }
}

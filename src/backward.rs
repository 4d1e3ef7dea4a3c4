//! Riccati backward pass: walks the horizon from the terminal stage to
//! the first, computing the action-value expansion
//! `Qxx, Quu, Qux, Qx, Qu`, the feedback gains `K, d`, and the cost-to-go
//! `P, p` for every stage.
//!
//! Every stage's `Qxx, Quu, Qux, Qx, Qu` slots are scratch: once a stage's
//! gains and cost-to-go are computed, its own action-value expansion is
//! dead and becomes the temporary storage the *previous* stage's
//! expansion is computed into. The cost-to-go update needs the
//! pre-factorization `Quu` intact, so the gain solve factorizes a copy
//! of it parked in the dead `Quu` slot rather than `Quu` itself.
//! Views here are therefore built directly off
//! [`crate::stage::StageData`]'s public fields, rather than its
//! `_mut`/plain accessor methods, so the borrow checker can see that e.g.
//! `stage_k.Q` and `stage_k.Qxx` are disjoint even while one is borrowed
//! immutably and the other mutably in the same expression.

use std::time::{Duration, Instant};

use crate::config::RiccatiSettings;
use crate::error::LqrError;
use crate::linalg::{cholesky_factorize, cholesky_solve, multiply, scale, MatrixView, MatrixViewMut};
use crate::solver::RiccatiSolver;
use crate::stage::combine_kd;

/// Runs the backward pass over the whole horizon, in place, returning the
/// wall-clock time spent.
///
/// Aborts on the first [`LqrError::LinearAlgebra`] raised by a Cholesky
/// factorization; no regularization of an indefinite `Quu` is attempted.
pub fn backward_pass(solver: &mut RiccatiSolver, settings: &RiccatiSettings) -> Result<Duration, LqrError> {
    let start = Instant::now();
    let nhorizon = solver.nhorizon();

    {
        let mut terminal = solver.stage_mut(nhorizon - 1)?;
        let n = terminal.n();
        let q_view = MatrixView::new(n, n, &*terminal.Q);
        let mut p_view = MatrixViewMut::new(n, n, &mut *terminal.P);
        p_view.copy_from(q_view)?;
        let qlin_view = MatrixView::new(n, 1, &*terminal.q);
        let mut plin_view = MatrixViewMut::new(n, 1, &mut *terminal.p);
        plin_view.copy_from(qlin_view)?;
    }

    for k in (0..nhorizon - 1).rev() {
        backward_step(solver, k, settings)?;
    }

    Ok(start.elapsed())
}

fn backward_step(solver: &mut RiccatiSolver, k: usize, settings: &RiccatiSettings) -> Result<(), LqrError> {
    let (mut stage_k, mut stage_kp1) = solver.stage_pair_mut(k)?;
    let n = stage_k.n();
    let m = stage_k.m();

    // Qxx := Q + A^T P[k+1] A, using stage k+1's dead Qxx field as
    // scratch for the A^T P[k+1] intermediate.
    {
        let q_view = MatrixView::new(n, n, &*stage_k.Q);
        let mut qxx_view = MatrixViewMut::new(n, n, &mut *stage_k.Qxx);
        qxx_view.copy_from(q_view)?;
    }
    {
        let a_view = MatrixView::new(n, n, &*stage_k.A);
        let p_view = MatrixView::new(n, n, &*stage_kp1.P);
        let mut tmp_nn = MatrixViewMut::new(n, n, &mut *stage_kp1.Qxx);
        multiply(a_view, p_view, tmp_nn.reborrow_mut(), true, false, 1.0, 0.0)?;
        let tmp_view = tmp_nn.as_ref();
        let qxx_view = MatrixViewMut::new(n, n, &mut *stage_k.Qxx);
        multiply(tmp_view, a_view, qxx_view, false, false, 1.0, 1.0)?;
    }

    // Qux := B^T P[k+1] A, and Quu := R + B^T P[k+1] B, sharing the
    // B^T P[k+1] intermediate (stored in stage k+1's dead Qux field).
    {
        let b_view = MatrixView::new(n, m, &*stage_k.B);
        let a_view = MatrixView::new(n, n, &*stage_k.A);
        let p_view = MatrixView::new(n, n, &*stage_kp1.P);
        let mut tmp_mn = MatrixViewMut::new(m, n, &mut *stage_kp1.Qux);
        multiply(b_view, p_view, tmp_mn.reborrow_mut(), true, false, 1.0, 0.0)?;
        let tmp_view = tmp_mn.as_ref();

        let qux_view = MatrixViewMut::new(m, n, &mut *stage_k.Qux);
        multiply(tmp_view, a_view, qux_view, false, false, 1.0, 0.0)?;

        let r_view = MatrixView::new(m, m, &*stage_k.R);
        let mut quu_view = MatrixViewMut::new(m, m, &mut *stage_k.Quu);
        quu_view.copy_from(r_view)?;
        multiply(tmp_view, b_view, quu_view, false, false, 1.0, 1.0)?;
    }

    // Qx := q + A^T (P[k+1] f[k] + p[k+1]); Qu := r + B^T (P[k+1] f[k] + p[k+1]).
    // The affine dynamics residual f[k] folds into the gradient through
    // P[k+1] before the A^T/B^T projection; the combined term is built
    // once into stage k+1's dead Qx field (already consumed by stage
    // k+1's own step) and shared between the Qx and Qu updates.
    {
        let p_view = MatrixView::new(n, 1, &*stage_kp1.p);
        let mut tmp_view = MatrixViewMut::new(n, 1, &mut *stage_kp1.Qx);
        tmp_view.copy_from(p_view)?;
    }
    {
        let f_view = MatrixView::new(n, 1, &*stage_k.f);
        let pmat_view = MatrixView::new(n, n, &*stage_kp1.P);
        let tmp_view = MatrixViewMut::new(n, 1, &mut *stage_kp1.Qx);
        multiply(pmat_view, f_view, tmp_view, false, false, 1.0, 1.0)?;
    }
    {
        let q_view = MatrixView::new(n, 1, &*stage_k.q);
        let mut qx_view = MatrixViewMut::new(n, 1, &mut *stage_k.Qx);
        qx_view.copy_from(q_view)?;
    }
    {
        let a_view = MatrixView::new(n, n, &*stage_k.A);
        let tmp_view = MatrixView::new(n, 1, &*stage_kp1.Qx);
        let qx_view = MatrixViewMut::new(n, 1, &mut *stage_k.Qx);
        multiply(a_view, tmp_view, qx_view, true, false, 1.0, 1.0)?;
    }
    {
        let r_view = MatrixView::new(m, 1, &*stage_k.r);
        let mut qu_view = MatrixViewMut::new(m, 1, &mut *stage_k.Qu);
        qu_view.copy_from(r_view)?;
    }
    {
        let b_view = MatrixView::new(n, m, &*stage_k.B);
        let tmp_view = MatrixView::new(n, 1, &*stage_kp1.Qx);
        let qu_view = MatrixViewMut::new(m, 1, &mut *stage_k.Qu);
        multiply(b_view, tmp_view, qu_view, true, false, 1.0, 1.0)?;
    }

    // Gain solve: the original Quu is needed intact for the cost-to-go
    // update below, so it is copied into stage k+1's dead Quu field
    // (already consumed by stage k+1's own step) and that copy is
    // factorized and solved in place, leaving stage k's Quu untouched.
    {
        let quu_view = MatrixView::new(m, m, &*stage_k.Quu);
        let mut quu_tmp_view = MatrixViewMut::new(m, m, &mut *stage_kp1.Quu);
        quu_tmp_view.copy_from(quu_view)?;
    }
    {
        let qux_view = MatrixView::new(m, n, &*stage_k.Qux);
        let mut k_view = MatrixViewMut::new(m, n, &mut *stage_k.K);
        k_view.copy_from(qux_view)?;
    }
    {
        let qu_view = MatrixView::new(m, 1, &*stage_k.Qu);
        let mut d_view = MatrixViewMut::new(m, 1, &mut *stage_k.d);
        d_view.copy_from(qu_view)?;
    }
    {
        let mut quu_tmp_view = MatrixViewMut::new(m, m, &mut *stage_kp1.Quu);
        cholesky_factorize(&mut quu_tmp_view, settings.cholesky_min_pivot)?;
    }
    {
        let quu_tmp_view = MatrixView::new(m, m, &*stage_kp1.Quu);
        let kd_slice = combine_kd(&mut *stage_k.K, &mut *stage_k.d);
        let mut kd_view = MatrixViewMut::new(m, n + 1, kd_slice);
        cholesky_solve(quu_tmp_view, &mut kd_view)?;
        scale(kd_view, -1.0);
    }

    // Cost-to-go update, explicit and non-symmetry-exploiting:
    // P := Qxx + K^T Quu K + K^T Qux + Qux^T K
    // p := Qx + K^T Quu d + K^T Qu  + Qux^T d
    // using the pre-factorization Quu still sitting in
    // stage k's own Quu field. The K^T Quu K / K^T Quu d intermediates
    // (Quu*K, Quu*d) borrow stage k+1's dead Qux/Qu fields as scratch.
    {
        let qxx_view = MatrixView::new(n, n, &*stage_k.Qxx);
        let mut p_view = MatrixViewMut::new(n, n, &mut *stage_k.P);
        p_view.copy_from(qxx_view)?;
    }
    {
        let quu_view = MatrixView::new(m, m, &*stage_k.Quu);
        let k_view = MatrixView::new(m, n, &*stage_k.K);
        let mut tmp_mn = MatrixViewMut::new(m, n, &mut *stage_kp1.Qux);
        multiply(quu_view, k_view, tmp_mn.reborrow_mut(), false, false, 1.0, 0.0)?;
        let tmp_view = tmp_mn.as_ref();
        let p_view = MatrixViewMut::new(n, n, &mut *stage_k.P);
        multiply(k_view, tmp_view, p_view, true, false, 1.0, 1.0)?;
    }
    {
        let k_view = MatrixView::new(m, n, &*stage_k.K);
        let qux_view = MatrixView::new(m, n, &*stage_k.Qux);
        let p_view = MatrixViewMut::new(n, n, &mut *stage_k.P);
        multiply(k_view, qux_view, p_view, true, false, 1.0, 1.0)?;
    }
    {
        let qux_view = MatrixView::new(m, n, &*stage_k.Qux);
        let k_view = MatrixView::new(m, n, &*stage_k.K);
        let p_view = MatrixViewMut::new(n, n, &mut *stage_k.P);
        multiply(qux_view, k_view, p_view, true, false, 1.0, 1.0)?;
    }
    {
        let qx_view = MatrixView::new(n, 1, &*stage_k.Qx);
        let mut plin_view = MatrixViewMut::new(n, 1, &mut *stage_k.p);
        plin_view.copy_from(qx_view)?;
    }
    {
        let quu_view = MatrixView::new(m, m, &*stage_k.Quu);
        let d_view = MatrixView::new(m, 1, &*stage_k.d);
        let mut tmp_m = MatrixViewMut::new(m, 1, &mut *stage_kp1.Qu);
        multiply(quu_view, d_view, tmp_m.reborrow_mut(), false, false, 1.0, 0.0)?;
        let tmp_view = tmp_m.as_ref();
        let k_view = MatrixView::new(m, n, &*stage_k.K);
        let plin_view = MatrixViewMut::new(n, 1, &mut *stage_k.p);
        multiply(k_view, tmp_view, plin_view, true, false, 1.0, 1.0)?;
    }
    {
        let k_view = MatrixView::new(m, n, &*stage_k.K);
        let qu_view = MatrixView::new(m, 1, &*stage_k.Qu);
        let plin_view = MatrixViewMut::new(n, 1, &mut *stage_k.p);
        multiply(k_view, qu_view, plin_view, true, false, 1.0, 1.0)?;
    }
    {
        let qux_view = MatrixView::new(m, n, &*stage_k.Qux);
        let d_view = MatrixView::new(m, 1, &*stage_k.d);
        let plin_view = MatrixViewMut::new(n, 1, &mut *stage_k.p);
        multiply(qux_view, d_view, plin_view, true, false, 1.0, 1.0)?;
    }

    Ok(())
}

//! Forward pass: rolls the closed loop out from the initial state using
//! the gains the backward pass left in every stage's `K, d`.
//!
//! Each stage's `y` holds the costate (dual variable) `P x + p` evaluated
//! at that knot's rolled-out state; the last knot point gets a `y` with
//! no corresponding input, since there is no stage beyond it to drive
//! into.

use std::time::{Duration, Instant};

use crate::error::LqrError;
use crate::linalg::{multiply, MatrixView, MatrixViewMut};
use crate::solver::RiccatiSolver;

/// Runs the forward rollout over the whole horizon, in place, returning
/// the wall-clock time spent.
pub fn forward_pass(solver: &mut RiccatiSolver) -> Result<Duration, LqrError> {
    let start = Instant::now();
    let nhorizon = solver.nhorizon();

    solver.seed_initial_state();

    for k in 0..nhorizon - 1 {
        forward_step(solver, k)?;
    }

    {
        let (mut stage, knot) = solver.stage_and_knot_mut(nhorizon - 1)?;
        let n = knot.n();
        let p_view = MatrixView::new(n, 1, &*stage.p);
        let mut y_view = MatrixViewMut::new(n, 1, &mut *stage.y);
        y_view.copy_from(p_view)?;
        let pmat_view = MatrixView::new(n, n, &*stage.P);
        let x_view = MatrixView::new(n, 1, &*knot.x);
        multiply(pmat_view, x_view, y_view, false, false, 1.0, 1.0)?;
    }

    Ok(start.elapsed())
}

fn forward_step(solver: &mut RiccatiSolver, k: usize) -> Result<(), LqrError> {
    let (mut stage, mut knot_k, mut knot_kp1) = solver.forward_views(k)?;
    let n = knot_k.n();
    let m = knot_k.m();

    // y[k] := P[k] x[k] + p[k] (the costate/dual at this knot).
    {
        let p_view = MatrixView::new(n, 1, &*stage.p);
        let mut y_view = MatrixViewMut::new(n, 1, &mut *stage.y);
        y_view.copy_from(p_view)?;
        let pmat_view = MatrixView::new(n, n, &*stage.P);
        let x_view = MatrixView::new(n, 1, &*knot_k.x);
        multiply(pmat_view, x_view, y_view, false, false, 1.0, 1.0)?;
    }

    // u[k] := K[k] x[k] + d[k].
    {
        let d_view = MatrixView::new(m, 1, &*stage.d);
        let mut u_view = MatrixViewMut::new(m, 1, &mut *knot_k.u);
        u_view.copy_from(d_view)?;
    }
    {
        let k_view = MatrixView::new(m, n, &*stage.K);
        let x_view = MatrixView::new(n, 1, &*knot_k.x);
        let u_view = MatrixViewMut::new(m, 1, &mut *knot_k.u);
        multiply(k_view, x_view, u_view, false, false, 1.0, 1.0)?;
    }

    // x[k+1] := f[k] + A[k] x[k] + B[k] u[k].
    {
        let f_view = MatrixView::new(n, 1, &*stage.f);
        let mut xnext_view = MatrixViewMut::new(n, 1, &mut *knot_kp1.x);
        xnext_view.copy_from(f_view)?;
    }
    {
        let a_view = MatrixView::new(n, n, &*stage.A);
        let x_view = MatrixView::new(n, 1, &*knot_k.x);
        let xnext_view = MatrixViewMut::new(n, 1, &mut *knot_kp1.x);
        multiply(a_view, x_view, xnext_view, false, false, 1.0, 1.0)?;
    }
    {
        let b_view = MatrixView::new(n, m, &*stage.B);
        let u_view = MatrixView::new(m, 1, &*knot_k.u);
        let xnext_view = MatrixViewMut::new(n, 1, &mut *knot_kp1.x);
        multiply(b_view, u_view, xnext_view, false, false, 1.0, 1.0)?;
    }

    knot_kp1.set_t(knot_k.t() + knot_k.h());
    knot_kp1.set_h(knot_k.h());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiccatiSettings;

    #[test]
    fn open_loop_identity_dynamics_holds_state_fixed_with_zero_gains() {
        // K = 0, d = 0, A = I, B = 0, f = 0: the rollout must keep x fixed
        // at x0 and drive u to zero everywhere.
        let n = 2;
        let m = 1;
        let nhorizon = 4;
        let mut solver = RiccatiSolver::new(n, m, nhorizon, RiccatiSettings::default()).unwrap();
        let mut a = vec![0.0; n * n];
        for i in 0..n {
            a[i * n + i] = 1.0;
        }
        let b = vec![0.0; n * m];
        solver
            .set_dynamics(
                0,
                nhorizon,
                MatrixView::new(n, n, &a),
                MatrixView::new(n, m, &b),
                None,
            )
            .unwrap();
        solver.set_initial_state(&[3.0, -1.0]).unwrap();

        forward_pass(&mut solver).unwrap();

        for k in 0..nhorizon {
            let knot = solver.knot_mut(k).unwrap();
            assert_eq!(knot.x().data(), &[3.0, -1.0]);
        }
        for k in 0..nhorizon - 1 {
            let knot = solver.knot_mut(k).unwrap();
            assert_eq!(knot.u().data(), &[0.0]);
        }
    }

    #[test]
    fn terminal_knot_has_no_input_but_gets_a_dual_y() {
        // With identity dynamics the rollout leaves x[N-1] = x0; seeding
        // the terminal P, p by hand (as a backward pass would) checks
        // y[N-1] = P x + p without running the full solve.
        let n = 2;
        let m = 1;
        let nhorizon = 3;
        let mut solver = RiccatiSolver::new(n, m, nhorizon, RiccatiSettings::default()).unwrap();
        let mut a = vec![0.0; n * n];
        for i in 0..n {
            a[i * n + i] = 1.0;
        }
        let b = vec![0.0; n * m];
        solver
            .set_dynamics(
                0,
                nhorizon,
                MatrixView::new(n, n, &a),
                MatrixView::new(n, m, &b),
                None,
            )
            .unwrap();
        solver.set_initial_state(&[1.0, 2.0]).unwrap();
        {
            let mut terminal = solver.stage_mut(nhorizon - 1).unwrap();
            let p_mat = [2.0, 0.0, 0.0, 3.0]; // column-major diag(2, 3)
            let p_lin = [0.5, -0.5];
            terminal.P_mut().copy_from(MatrixView::new(n, n, &p_mat)).unwrap();
            terminal.p_mut().copy_from(MatrixView::new(n, 1, &p_lin)).unwrap();
        }
        forward_pass(&mut solver).unwrap();

        let stage = solver.stage_mut(nhorizon - 1).unwrap();
        // x[N-1] = [1, 2] (identity dynamics): y = diag(2,3)*[1,2] + [0.5,-0.5].
        assert_eq!(stage.y().data(), &[2.5, 5.5]);
    }
}

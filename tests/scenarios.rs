//! End-to-end scenarios exercising the public solve path: construction,
//! cost/dynamics setup, and the backward/forward pass pair.

use riccati_lqr::linalg::{two_norm, MatrixView};
use riccati_lqr::{solve, LinAlgError, LqrError, RiccatiSettings, RiccatiSolver};

/// Zero-order-hold discretization of a double integrator with timestep
/// `h`: state `[position, velocity]`, scalar acceleration input.
fn double_integrator(nhorizon: usize, h: f64, x0: [f64; 2], q_diag: [f64; 2], r: f64) -> RiccatiSolver {
    let n = 2;
    let m = 1;
    let mut solver = RiccatiSolver::new(n, m, nhorizon, RiccatiSettings::default()).unwrap();

    let a = [1.0, 0.0, h, 1.0]; // column-major [[1, h], [0, 1]]
    let b = [0.5 * h * h, h];
    let q = [q_diag[0], 0.0, 0.0, q_diag[1]];
    let r_mat = [r];

    solver
        .set_dynamics(0, nhorizon, MatrixView::new(n, n, &a), MatrixView::new(n, m, &b), None)
        .unwrap();
    solver
        .set_cost(
            0,
            nhorizon,
            MatrixView::new(n, n, &q),
            MatrixView::new(m, m, &r_mat),
            None,
            None,
            None,
        )
        .unwrap();
    solver.set_initial_state(&x0).unwrap();
    solver
}

#[test]
fn s4_double_integrator_discretization_matches_zero_order_hold() {
    // A(h) = [[1, h], [0, 1]], B(h) = [h^2/2, h]: direct algebraic check
    // of the discretization before any solve runs.
    let h = 0.1;
    let mut solver = double_integrator(5, h, [0.0, 0.0], [1.0, 1.0], 1.0);
    let stage = solver.stage_mut(0).unwrap();
    assert_eq!(stage.A().data(), &[1.0, 0.0, h, 1.0]);
    assert_eq!(stage.B().data(), &[0.5 * h * h, h]);
}

#[test]
fn s5_cost_evaluation_matches_the_quadratic_form() {
    let n = 2;
    let m = 1;
    let mut solver = double_integrator(3, 0.1, [2.0, -1.0], [3.0, 5.0], 2.0);
    let stage = solver.stage_mut(0).unwrap();

    // cost(x, u) = 0.5 x^T Q x + 0.5 u^T R u for the state/input sitting
    // at stage 0 right after construction (u = 0 since nothing has run).
    let x = [2.0_f64, -1.0];
    let q_cost = 0.5 * (3.0 * x[0] * x[0] + 5.0 * x[1] * x[1]);
    let expected = q_cost; // u = 0 so the R term vanishes
    let qxx = stage.Q();
    let mut actual = 0.0;
    for i in 0..n {
        for j in 0..n {
            actual += 0.5 * x[i] * qxx.get(i, j) * x[j];
        }
    }
    assert!((actual - expected).abs() < 1e-12);
    let _ = m;
}

#[test]
fn s5_literal_cost_evaluation_matches_known_totals() {
    // n=2, m=1, N=11, h=0.2, Q = h*I, R = 0.1h*I, Qf = I, xf = [1,0]^T,
    // q = -Q*xf, qf = -Qf*xf, c = 0.5 xf^T Q xf, cf = 0.5 xf^T Qf xf.
    let n = 2;
    let m = 1;
    let nhorizon = 11;
    let h = 0.2;
    let xf = [1.0_f64, 0.0];
    let q_mat = [h, 0.0, 0.0, h]; // column-major h*I
    let r_mat = [0.1 * h];
    let qf_mat = [1.0, 0.0, 0.0, 1.0];
    let q_lin = [-h * xf[0], -h * xf[1]];
    let qf_lin = [-xf[0], -xf[1]];
    let c = 0.5 * h * (xf[0] * xf[0] + xf[1] * xf[1]);
    let cf = 0.5 * (xf[0] * xf[0] + xf[1] * xf[1]);

    let mut solver = RiccatiSolver::new(n, m, nhorizon, RiccatiSettings::default()).unwrap();
    solver
        .set_cost(
            0,
            nhorizon - 1,
            MatrixView::new(n, n, &q_mat),
            MatrixView::new(m, m, &r_mat),
            None,
            Some(MatrixView::new(n, 1, &q_lin)),
            None,
        )
        .unwrap();
    solver
        .set_cost(
            nhorizon - 1,
            nhorizon,
            MatrixView::new(n, n, &qf_mat),
            MatrixView::new(m, m, &[0.0]),
            None,
            Some(MatrixView::new(n, 1, &qf_lin)),
            None,
        )
        .unwrap();
    for k in 0..nhorizon - 1 {
        solver.stage_mut(k).unwrap().set_c(c);
    }
    solver.stage_mut(nhorizon - 1).unwrap().set_c(cf);

    // stage(x, u) = 0.5 x^T Q x + 0.5 u^T R u + q^T x + r^T u + c;
    // terminal(x) = 0.5 x^T Qf x + qf^T x + cf.
    let total_cost = |solver: &mut RiccatiSolver, x: f64, u: f64| -> f64 {
        let mut total = 0.0;
        for k in 0..nhorizon - 1 {
            let stage = solver.stage_mut(k).unwrap();
            let qxx = stage.Q();
            let rmm = stage.R();
            let mut quad = 0.0;
            for i in 0..n {
                for j in 0..n {
                    quad += 0.5 * x * qxx.get(i, j) * x;
                }
            }
            let ctrl = 0.5 * u * rmm.get(0, 0) * u;
            let lin = stage.q().data().iter().map(|qi| qi * x).sum::<f64>() + stage.r().data()[0] * u;
            total += quad + ctrl + lin + stage.c();
        }
        let terminal = solver.stage_mut(nhorizon - 1).unwrap();
        let qff = terminal.Q();
        let mut tquad = 0.0;
        for i in 0..n {
            for j in 0..n {
                tquad += 0.5 * x * qff.get(i, j) * x;
            }
        }
        let tlin = terminal.q().data().iter().map(|qi| qi * x).sum::<f64>();
        total + tquad + tlin + terminal.c()
    };

    let at_origin = total_cost(&mut solver, 0.0, 0.0);
    assert!((at_origin - 1.5).abs() < 1e-10, "expected 1.5, got {at_origin}");

    let at_1_2 = total_cost(&mut solver, 1.2, 0.5);
    assert!((at_1_2 - 2.245).abs() < 1e-10, "expected 2.245, got {at_1_2}");
}

#[test]
fn s6_literal_riccati_fixed_point_holds_state_at_x0_with_zero_gains() {
    // n=3, m=2, N=5, Q=I, R=I, A=I, B=0.1*I, f=0, q=r=0, H=0, x0=[1,0,0].
    // Optimal policy at the origin reference is zero everywhere: u[k]=0,
    // x[k]=x0, and with p=0 the costate y[k] = P[k] x0.
    let n = 3;
    let m = 2;
    let nhorizon = 5;
    let mut solver = RiccatiSolver::new(n, m, nhorizon, RiccatiSettings::default()).unwrap();

    let mut q_mat = vec![0.0; n * n];
    for i in 0..n {
        q_mat[i * n + i] = 1.0;
    }
    let mut r_mat = vec![0.0; m * m];
    for i in 0..m {
        r_mat[i * m + i] = 1.0;
    }
    let mut a_mat = vec![0.0; n * n];
    for i in 0..n {
        a_mat[i * n + i] = 1.0;
    }
    let mut b_mat = vec![0.0; n * m];
    for i in 0..m.min(n) {
        b_mat[i * n + i] = 0.1;
    }

    solver
        .set_cost(0, nhorizon, MatrixView::new(n, n, &q_mat), MatrixView::new(m, m, &r_mat), None, None, None)
        .unwrap();
    solver
        .set_dynamics(0, nhorizon, MatrixView::new(n, n, &a_mat), MatrixView::new(n, m, &b_mat), None)
        .unwrap();
    solver.set_initial_state(&[1.0, 0.0, 0.0]).unwrap();

    solve(&mut solver).unwrap();

    for k in 0..nhorizon {
        let knot = solver.knot_mut(k).unwrap();
        assert_eq!(knot.x().data(), &[1.0, 0.0, 0.0]);
    }
    for k in 0..nhorizon - 1 {
        let knot = solver.knot_mut(k).unwrap();
        for &ui in knot.u().data() {
            assert!(ui.abs() < 1e-8, "expected u[{k}] = 0, got {ui}");
        }
    }
    for k in 0..nhorizon {
        let stage = solver.stage_mut(k).unwrap();
        let p = stage.p().data().to_vec();
        assert!(p.iter().all(|&v| v.abs() < 1e-8), "expected p[{k}] = 0");
        let pmat = stage.P();
        let x0 = [1.0_f64, 0.0, 0.0];
        let mut expected_y = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                expected_y[i] += pmat.get(i, j) * x0[j];
            }
        }
        let y = stage.y().data();
        for i in 0..n {
            assert!((y[i] - expected_y[i]).abs() < 1e-8, "y[{k}][{i}] should equal (P x0)[{i}]");
        }
    }
}

#[test]
fn s6_riccati_gain_sanity_converges_away_from_the_terminal_boundary() {
    let mut solver = double_integrator(300, 0.02, [1.0, 0.5], [1.0, 1.0], 0.5);
    solve(&mut solver).unwrap();

    let k_mid1 = solver.stage_mut(100).unwrap().K().data().to_vec();
    let k_mid2 = solver.stage_mut(150).unwrap().K().data().to_vec();
    for (a, b) in k_mid1.iter().zip(k_mid2.iter()) {
        assert!(
            (a - b).abs() < 1e-8,
            "gain should have reached a near fixed point away from the horizon end"
        );
    }
}

#[test]
fn closed_loop_rollout_regulates_the_double_integrator_to_rest() {
    let mut solver = double_integrator(80, 0.05, [1.0, 0.0], [1.0, 1.0], 0.1);
    solve(&mut solver).unwrap();

    let last = solver.knot_mut(solver.nhorizon() - 1).unwrap();
    assert!(two_norm(last.x().data()) < 0.1);
}

#[test]
fn indefinite_stage_cost_aborts_the_solve_without_regularization() {
    let n = 1;
    let m = 1;
    let nhorizon = 4;
    let mut solver = RiccatiSolver::new(n, m, nhorizon, RiccatiSettings::default()).unwrap();
    let q = [1.0];
    let r = [0.0]; // R = 0, B = 0 forces Quu = 0 at every stage.
    let a = [1.0];
    let b = [0.0];
    solver
        .set_cost(0, nhorizon, MatrixView::new(n, n, &q), MatrixView::new(m, m, &r), None, None, None)
        .unwrap();
    solver
        .set_dynamics(0, nhorizon, MatrixView::new(n, n, &a), MatrixView::new(n, m, &b), None)
        .unwrap();

    assert_eq!(
        solve(&mut solver),
        Err(LqrError::LinearAlgebra(LinAlgError::CholeskyFailed))
    );
}

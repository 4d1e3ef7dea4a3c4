//! Time-varying discrete-time LQR via Riccati recursion.
//!
//! A [`RiccatiSolver`] owns a single contiguous slab of `f64`s holding the
//! initial state, every stage's cost/dynamics/gain data, and every knot
//! point's state/input trajectory. [`solve`] runs the backward Riccati
//! recursion ([`backward`]) followed by the closed-loop forward rollout
//! ([`forward`]); neither pass allocates once the solver has been built.

pub mod backward;
pub mod config;
pub mod error;
pub mod forward;
pub mod knot_point;
pub mod linalg;
pub mod solver;
pub mod stage;

pub use config::RiccatiSettings;
pub use error::{LinAlgError, LqrError};
pub use knot_point::KnotPoint;
pub use solver::RiccatiSolver;
pub use stage::StageData;

use std::time::Duration;

/// Timing summary for one [`solve`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub backward_pass: Duration,
    pub forward_pass: Duration,
    pub total: Duration,
}

/// Runs the backward Riccati recursion followed by the closed-loop
/// forward rollout, in place, on `solver`.
///
/// Returns the first error either pass raises; a [`LqrError::LinearAlgebra`]
/// from the backward pass means some `Quu` along the horizon failed to
/// factorize, and the solver is left with whatever gains were computed
/// before the failing stage.
pub fn solve(solver: &mut RiccatiSolver) -> Result<SolveReport, LqrError> {
    let settings = *solver.settings();
    let span = tracing::info_span!("lqr_solve", nstates = solver.nstates(), ninputs = solver.ninputs(), nhorizon = solver.nhorizon());
    let _enter = span.enter();

    let backward_duration = backward::backward_pass(solver, &settings)?;
    tracing::debug!(?backward_duration, "backward pass complete");

    let forward_duration = forward::forward_pass(solver)?;
    tracing::debug!(?forward_duration, "forward pass complete");

    Ok(SolveReport {
        backward_pass: backward_duration,
        forward_pass: forward_duration,
        total: backward_duration + forward_duration,
    })
}

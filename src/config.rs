//! Solver configuration: a single small, `serde`-deserializable settings
//! struct. There is only one algorithm here, so a typed struct is enough
//! rather than a dynamic option registry.

use serde::Deserialize;

/// Tunable knobs for a [`crate::solver::RiccatiSolver`] solve.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiccatiSettings {
    /// Floor below which a Cholesky pivot is treated as factorization
    /// failure. `0.0` is a strict positive-definiteness check.
    pub cholesky_min_pivot: f64,
}

impl Default for RiccatiSettings {
    fn default() -> Self {
        Self {
            cholesky_min_pivot: 0.0,
        }
    }
}

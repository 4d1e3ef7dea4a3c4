use derive_more::{Display, Error};

/// Return-code taxonomy for the solver.
///
/// `Ok` is represented by `Result::Ok` rather than a variant here; every
/// fallible entry point in this crate returns `Result<T, LqrError>`.
#[derive(Debug, Display, Error, PartialEq, Eq, Clone, Copy)]
pub enum LqrError {
    #[display("dimension must be at least 1")]
    NonPositiveDimension,

    #[display("time and timestep must be non-negative")]
    NegativeTime,

    #[display("knot-point index out of range")]
    IndexOutOfRange,

    #[display("copy source and destination dimensions do not match")]
    MismatchedShapes,

    #[display("stage/knot-point range is empty or out of [0, N]")]
    InvalidRange,

    #[display("failed to allocate solver storage")]
    FailedMemoryAllocation,

    #[display("linear algebra error: {_0}")]
    LinearAlgebra(LinAlgError),
}

impl From<LinAlgError> for LqrError {
    fn from(value: LinAlgError) -> Self {
        LqrError::LinearAlgebra(value)
    }
}

/// Errors raised by the dense kernels in [`crate::linalg`].
#[derive(Debug, Display, Error, PartialEq, Eq, Clone, Copy)]
pub enum LinAlgError {
    /// Operand shapes do not conform for the requested operation.
    #[display("shape mismatch")]
    ShapeMismatch,

    /// `CholeskyFactorize` encountered a non-positive pivot.
    #[display("cholesky factorization failed: non-positive pivot")]
    CholeskyFailed,
}

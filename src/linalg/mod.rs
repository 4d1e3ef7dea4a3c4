//! Dense linear algebra: column-major views over a caller-owned slab, and
//! the small set of allocation-free kernels the Riccati recursion needs.

pub mod kernels;
pub mod view;

pub use kernels::{
    add, add_diagonal, cholesky_factorize, cholesky_solve, lower_tri_back_sub, multiply,
    one_norm, scale, symmetric_multiply, two_norm,
};
pub use view::{MatrixView, MatrixViewMut};

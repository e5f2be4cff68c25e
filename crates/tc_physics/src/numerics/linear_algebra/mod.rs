// crates/tc_physics/src/numerics/linear_algebra/mod.rs

//! 稀疏线性代数
//!
//! - [`csr`]: CSR 稀疏矩阵与构建器
//! - [`vector_ops`]: BLAS Level 1 向量运算
//! - [`preconditioner`]: Identity / Jacobi 预条件器
//! - [`solver`]: BiCGStab 迭代求解器

pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use csr::{CsrBuilder, CsrMatrix, CsrPattern, RowView};
pub use preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
pub use solver::{BiCgStabSolver, IterativeSolver, SolverConfig, SolverResult, SolverStatus};
pub use vector_ops::{axpy, copy, dot, norm2, norm_inf};

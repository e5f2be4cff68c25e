// crates/tc_physics/src/numerics/mod.rs

//! 数值方法
//!
//! - [`linear_algebra`]: CSR 稀疏矩阵、预条件器、BiCGStab
//! - [`gradient`]: Green-Gauss 梯度重构
//! - [`discretization`]: 标量输运方程组装

pub mod discretization;
pub mod gradient;
pub mod linear_algebra;

// crates/tc_physics/src/numerics/discretization/mod.rs

//! 有限体积离散

pub mod assembler;

pub use assembler::{CellSource, EquationTerms, TransportAssembler};

// crates/tc_physics/src/numerics/gradient/mod.rs

//! 梯度重构

pub mod green_gauss;

pub use green_gauss::GreenGaussGradient;

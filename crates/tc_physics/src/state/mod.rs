// crates/tc_physics/src/state/mod.rs

//! 场状态
//!
//! - [`field`]: 带边界条件的单元标量场
//! - [`mean_flow`]: 宿主提供的平均流输入
//! - [`turbulence_state`]: 模型拥有的湍流场集合

pub mod field;
pub mod mean_flow;
pub mod turbulence_state;

pub use field::{BoundaryCondition, ScalarField};
pub use mean_flow::MeanFlowState;
pub use turbulence_state::{read_bounds, StateLayout, TurbulenceState, GAMMA, K, OMEGA, V2};

// crates/tc_physics/src/turbulence/mod.rs

//! RANS 湍流闭合
//!
//! # 结构
//!
//! - [`traits`]: 宿主接口 [`TurbulenceClosure`] 与变体接口 [`TwoEquationClosure`]
//! - [`rans_model`]: 通用驱动 [`RasModel`]，负责组装、求解、截断与原子回滚
//! - [`transport`]: 单个标量方程的组装与线性求解
//! - [`context`]: 逐单元只读上下文与单步缓存
//! - [`invariants`]: 应变率/旋转率张量、不变量与基张量
//! - [`blending`]: SST 族混合函数
//! - [`correlations`]: 转捩经验关联式
//! - [`earsm_closure`]: EARSM 的 N 三次方程与非线性各向异性
//! - [`models`]: 六个闭合变体
//! - [`registry`]: 按名称创建模型
//!
//! # 每步流程
//!
//! ```text
//! begin_step → ω 方程 → k 方程 → 附加方程（v2 / γ）
//!            → 截断 → 梯度与混合函数 → νt、a^(ex)、代数 γ
//! ```
//!
//! 任一方程失败时，全部场恢复为步前值。

pub mod blending;
pub mod context;
pub mod correlations;
pub mod earsm_closure;
pub mod invariants;
pub mod models;
pub mod rans_model;
pub mod registry;
pub mod traits;
pub mod transport;

pub use context::{CellKinematics, ClosureContext, StepCache};
pub use models::{Earsm, EarsmTrans, GammaSst, KOmega, KOmegaSst, Kv2Omega};
pub use rans_model::{CorrectReport, RasModel};
pub use registry::{ClosureFactory, ClosureRegistry};
pub use traits::{
    ClosureCoefficients, ExtraEquation, TurbulenceClosure, TwoEquationClosure, VelocityGradient,
};
pub use transport::{EquationReport, ScalarTransport};

// crates/tc_physics/src/lib.rs

//! TurbClosure Physics Layer
//!
//! 有限体积数值方法与 RANS 湍流闭合。
//!
//! # 模块概览
//!
//! - [`mesh`]: 非结构有限体积网格与结构网格生成
//! - [`numerics`]: 稀疏线性代数、梯度重构、标量输运组装
//! - [`state`]: 平均流输入与湍流状态
//! - [`turbulence`]: 闭合模型（k-ω、SST、γ-SST、k-v2-ω、EARSM、EARSMTrans）
//!
//! # 示例
//!
//! ```
//! use tc_config::ClosureConfig;
//! use tc_physics::mesh::StructuredMesh;
//! use tc_physics::state::MeanFlowState;
//! use tc_physics::turbulence::{ClosureRegistry, VelocityGradient};
//!
//! let mesh = StructuredMesh::new(4, 4, 1.0, 1.0).build().unwrap();
//! let flow = MeanFlowState::uniform_gradient(
//!     &mesh,
//!     VelocityGradient::simple_shear(10.0),
//!     vec![0.1; mesh.n_cells()],
//!     1e-5,
//! )
//! .unwrap();
//!
//! let mut model = ClosureRegistry::with_defaults()
//!     .create("kOmegaSST", &mesh, &ClosureConfig::new("kOmegaSST"))
//!     .unwrap();
//! model.correct(&mesh, &flow, 1e-3).unwrap();
//! assert!(model.eddy_viscosity().iter().all(|&nut| nut >= 0.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod mesh;
pub mod numerics;
pub mod state;
pub mod turbulence;

pub use mesh::{FvMesh, StructuredMesh};
pub use state::{MeanFlowState, ScalarField, TurbulenceState};
pub use turbulence::{ClosureRegistry, CorrectReport, RasModel, TurbulenceClosure};

// crates/tc_config/src/lib.rs

//! TurbClosure Config Layer
//!
//! 配置层，提供模型系数字典与闭合模型的整体配置。
//!
//! # 模块概览
//!
//! - [`coeff_dict`]: 键值系数字典（标量或开关），带默认值查找
//! - [`closure_config`]: 模型选择、输运求解、场下限、初值与边界条件
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: tc_cli        ─> 读取 ClosureConfig，驱动模型
//! Layer 3: tc_physics    ─> 由 CoeffDict 构造各湍流模型系数
//! Layer 2: tc_config     ─> CoeffDict, ClosureConfig (本层)
//! Layer 1: tc_foundation
//! ```
//!
//! # 设计原则
//!
//! 1. **全 f64 配置**: 所有数值使用 f64，JSON 序列化
//! 2. **默认值优先**: 缺省键回退到模型文献值，只对非法值报错
//! 3. **整体替换**: 系数集合整体构造、整体校验后才生效

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod closure_config;
pub mod coeff_dict;
pub mod error;

// 重导出核心类型
pub use closure_config::{
    BoundarySpec, ClosureConfig, FieldBounds, InitialConditions, RelaxationFactors,
    TransportSolverConfig,
};
pub use coeff_dict::{CoeffDict, CoeffReader, CoeffValue};
pub use error::ConfigError;

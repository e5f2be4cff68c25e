// crates/tc_foundation/src/lib.rs

//! TurbClosure Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型与数值保护常量。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `TcError` / `TcResult`
//! - [`scalar`]: 标量类型别名与数值下限常量
//!
//! # 示例
//!
//! ```
//! use tc_foundation::{TcError, TcResult};
//!
//! fn check_cells(n: usize) -> TcResult<()> {
//!     TcError::check_size("k", 10, n)
//! }
//!
//! assert!(check_cells(10).is_ok());
//! assert!(check_cells(3).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod scalar;

// 重导出常用类型
pub use error::{TcError, TcResult};
pub use scalar::{Scalar, ROOT_VSMALL, SMALL, VSMALL};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{TcError, TcResult};
    pub use crate::scalar::{Scalar, ROOT_VSMALL, SMALL, VSMALL};
    pub use crate::{ensure, require};
}

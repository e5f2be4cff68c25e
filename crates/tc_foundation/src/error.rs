// crates/tc_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `TcError` 枚举和 `TcResult` 类型别名。
//!
//! # 错误分类
//!
//! 1. **配置错误**: 系数缺失或非法、模型名称未注册，构造阶段立即返回
//! 2. **输入错误**: 网格或平均流场尺寸不匹配
//! 3. **线性求解失败**: 求解发散或出现非有限值
//!
//! 数值退化（不变量下溢、三次方程重根）与可实现性越界（负的 k、ω）
//! 在物理层本地钳位处理，不会以错误形式出现。
//!
//! # 示例
//!
//! ```
//! use tc_foundation::error::{TcError, TcResult};
//!
//! fn lookup(name: &str) -> TcResult<()> {
//!     Err(TcError::unknown_model(name, vec!["kOmega".into()]))
//! }
//!
//! assert!(lookup("kEpsilon").is_err());
//! ```

use thiserror::Error;

/// 统一结果类型
pub type TcResult<T> = Result<T, TcError>;

/// TurbClosure 错误类型
#[derive(Error, Debug)]
pub enum TcError {
    // ========================================================================
    // 配置相关错误
    // ========================================================================

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 未注册的湍流模型
    #[error("未知湍流模型: {name} (可用模型: {available:?})")]
    UnknownModel {
        /// 请求的模型名
        name: String,
        /// 已注册的模型名列表
        available: Vec<String>,
    },

    // ========================================================================
    // 输入相关错误
    // ========================================================================

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 无效网格拓扑
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    // ========================================================================
    // 数值求解错误
    // ========================================================================

    /// 线性求解失败
    #[error("线性求解失败: 场 {field}, {message}")]
    LinearSolve {
        /// 求解的场名称
        field: String,
        /// 失败原因
        message: String,
    },

    /// 出现非有限值
    #[error("非有限值: {field} 在单元 {cell}")]
    NonFinite {
        /// 场名称
        field: String,
        /// 首个出错单元
        cell: usize,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl TcError {
    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 未知模型
    pub fn unknown_model(name: impl Into<String>, available: Vec<String>) -> Self {
        Self::UnknownModel {
            name: name.into(),
            available,
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 线性求解失败
    pub fn linear_solve(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::LinearSolve {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 非有限值
    pub fn non_finite(field: impl Into<String>, cell: usize) -> Self {
        Self::NonFinite {
            field: field.into(),
            cell,
        }
    }

    /// 是否为配置类错误
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::UnknownModel { .. })
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl TcError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> TcResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查值是否在范围内
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> TcResult<()> {
        if !(min..=max).contains(&value) {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }

    /// 检查切片全部有限，返回首个非有限单元
    #[inline]
    pub fn check_finite(field: &str, values: &[f64]) -> TcResult<()> {
        match values.iter().position(|v| !v.is_finite()) {
            Some(cell) => Err(Self::non_finite(field, cell)),
            None => Ok(()),
        }
    }
}

// ========================================================================
// 断言宏
// ========================================================================

/// 条件不满足时返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// 从 `Option` 取值，`None` 时返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr $(,)?) => {
        match $opt {
            Some(v) => v,
            None => return Err($err.into()),
        }
    };
}

// ========================================================================
// 测试
// ========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TcError::config("系数非法");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_unknown_model_lists_available() {
        let err = TcError::unknown_model("kEps", vec!["kOmega".into(), "EARSM".into()]);
        let msg = err.to_string();
        assert!(msg.contains("kEps"));
        assert!(msg.contains("EARSM"));
        assert!(err.is_config());
    }

    #[test]
    fn test_check_size() {
        assert!(TcError::check_size("k", 10, 10).is_ok());
        assert!(TcError::check_size("k", 10, 5).is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(TcError::check_range("gamma", 0.5, 0.0, 1.0).is_ok());
        assert!(TcError::check_range("gamma", -0.1, 0.0, 1.0).is_err());
        assert!(TcError::check_range("gamma", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_check_finite() {
        assert!(TcError::check_finite("omega", &[1.0, 2.0]).is_ok());
        let err = TcError::check_finite("omega", &[1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, TcError::NonFinite { cell: 1, .. }));
    }

    #[test]
    fn test_ensure_macro() {
        fn check(value: i32) -> TcResult<()> {
            ensure!(value > 0, TcError::invalid_input("value must be positive"));
            Ok(())
        }

        assert!(check(1).is_ok());
        assert!(check(-1).is_err());
    }

    #[test]
    fn test_require_macro() {
        fn get_value(opt: Option<i32>) -> TcResult<i32> {
            let v = require!(opt, TcError::invalid_input("value"));
            Ok(v)
        }

        assert_eq!(get_value(Some(42)).unwrap(), 42);
        assert!(get_value(None).is_err());
    }
}

// crates/tc_config/src/error.rs

//! 配置层错误类型

use tc_foundation::TcError;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    /// 解析错误
    #[error("解析错误: {0}")]
    Parse(String),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },

    /// 缺失配置
    #[error("缺失配置: {0}")]
    Missing(String),

    /// 类型不符（例如需要标量却给了开关）
    #[error("类型不符 '{key}': 期望 {expected}")]
    TypeMismatch {
        /// 配置键
        key: String,
        /// 期望的类型
        expected: &'static str,
    },
}

impl ConfigError {
    /// 构造无效值错误
    pub fn invalid(key: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<ConfigError> for TcError {
    fn from(err: ConfigError) -> Self {
        TcError::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::invalid("betaStar", -1.0, "必须为正");
        assert!(err.to_string().contains("betaStar"));
    }

    #[test]
    fn test_into_tc_error() {
        let err: TcError = ConfigError::Missing("a1".into()).into();
        assert!(err.is_config());
        assert!(err.to_string().contains("a1"));
    }
}

// crates/tc_config/src/coeff_dict.rs

//! 模型系数字典
//!
//! 键为系数名（沿用文献中的驼峰写法，如 `betaStar`、`alphaOmega1`），
//! 值为标量或开关。JSON 形式：
//!
//! ```json
//! { "betaStar": 0.09, "a1": 0.31, "F3": false, "curvatureCorrection": "on" }
//! ```
//!
//! 模型构造时通过 [`CoeffReader`] 逐项读取：缺省键回退到默认值，
//! 类型不符或数值非法立即报错，字典中多余的键只记录警告。

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// 系数值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoeffValue {
    /// 开关量
    Switch(bool),
    /// 标量
    Scalar(f64),
    /// 文字开关（"on"/"off"/"yes"/"no"/"true"/"false"）
    Word(String),
}

impl CoeffValue {
    /// 作为标量读取
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// 作为开关读取
    pub fn as_switch(&self) -> Option<bool> {
        match self {
            Self::Switch(b) => Some(*b),
            Self::Word(w) => match w.to_ascii_lowercase().as_str() {
                "on" | "yes" | "true" | "y" => Some(true),
                "off" | "no" | "false" | "n" | "none" => Some(false),
                _ => None,
            },
            Self::Scalar(_) => None,
        }
    }
}

/// 系数字典
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoeffDict {
    entries: BTreeMap<String, CoeffValue>,
}

impl CoeffDict {
    /// 创建空字典
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加标量
    pub fn with_scalar(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert_scalar(key, value);
        self
    }

    /// 链式添加开关
    pub fn with_switch(mut self, key: impl Into<String>, value: bool) -> Self {
        self.insert_switch(key, value);
        self
    }

    /// 写入标量（覆盖）
    pub fn insert_scalar(&mut self, key: impl Into<String>, value: f64) {
        self.entries.insert(key.into(), CoeffValue::Scalar(value));
    }

    /// 写入开关（覆盖）
    pub fn insert_switch(&mut self, key: impl Into<String>, value: bool) {
        self.entries.insert(key.into(), CoeffValue::Switch(value));
    }

    /// 删除键
    pub fn remove(&mut self, key: &str) -> Option<CoeffValue> {
        self.entries.remove(key)
    }

    /// 是否包含键
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// 获取原始值
    pub fn get(&self, key: &str) -> Option<&CoeffValue> {
        self.entries.get(key)
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 遍历键
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// 用另一字典覆盖同名条目
    pub fn merge(&mut self, other: &CoeffDict) {
        for (k, v) in &other.entries {
            self.entries.insert(k.clone(), v.clone());
        }
    }

    /// 查找必需标量
    pub fn lookup_scalar(&self, key: &str) -> Result<f64, ConfigError> {
        match self.entries.get(key) {
            None => Err(ConfigError::Missing(key.to_string())),
            Some(value) => Self::finite_scalar(key, value),
        }
    }

    /// 查找标量，缺省时返回默认值
    pub fn lookup_or_default(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        match self.entries.get(key) {
            None => Ok(default),
            Some(value) => Self::finite_scalar(key, value),
        }
    }

    /// 查找开关，缺省时返回默认值
    pub fn lookup_switch_or_default(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.entries.get(key) {
            None => Ok(default),
            Some(value) => value.as_switch().ok_or_else(|| ConfigError::TypeMismatch {
                key: key.to_string(),
                expected: "switch",
            }),
        }
    }

    fn finite_scalar(key: &str, value: &CoeffValue) -> Result<f64, ConfigError> {
        let v = value.as_scalar().ok_or_else(|| ConfigError::TypeMismatch {
            key: key.to_string(),
            expected: "scalar",
        })?;
        if !v.is_finite() {
            return Err(ConfigError::invalid(key, v, "必须为有限值"));
        }
        Ok(v)
    }

    /// 从 JSON 字符串解析
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// 序列化为格式化 JSON
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// 带使用记录的系数读取器
///
/// 记录每个被读取的键，读取结束后可报告字典中未被使用的键
/// （通常是拼写错误）。
pub struct CoeffReader<'a> {
    dict: &'a CoeffDict,
    used: BTreeSet<&'static str>,
}

impl<'a> CoeffReader<'a> {
    /// 创建读取器
    pub fn new(dict: &'a CoeffDict) -> Self {
        Self {
            dict,
            used: BTreeSet::new(),
        }
    }

    /// 读取有限标量
    pub fn scalar(&mut self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        self.used.insert(key);
        self.dict.lookup_or_default(key, default)
    }

    /// 读取正标量
    pub fn positive(&mut self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        let v = self.scalar(key, default)?;
        if v <= 0.0 {
            return Err(ConfigError::invalid(key, v, "必须为正"));
        }
        Ok(v)
    }

    /// 读取非负标量
    pub fn non_negative(&mut self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        let v = self.scalar(key, default)?;
        if v < 0.0 {
            return Err(ConfigError::invalid(key, v, "不能为负"));
        }
        Ok(v)
    }

    /// 读取非零标量（允许为负）
    pub fn non_zero(&mut self, key: &'static str, default: f64) -> Result<f64, ConfigError> {
        let v = self.scalar(key, default)?;
        if v == 0.0 {
            return Err(ConfigError::invalid(key, v, "不能为零"));
        }
        Ok(v)
    }

    /// 读取开关
    pub fn switch(&mut self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        self.used.insert(key);
        self.dict.lookup_switch_or_default(key, default)
    }

    /// 返回未被读取的键，并逐个记录警告
    pub fn warn_unused(&self, model: &str) -> Vec<String> {
        let unused: Vec<String> = self
            .dict
            .keys()
            .filter(|k| !self.used.contains(k))
            .map(str::to_string)
            .collect();
        for key in &unused {
            log::warn!("{} 系数字典中存在未使用的键: {}", model, key);
        }
        unused
    }
}

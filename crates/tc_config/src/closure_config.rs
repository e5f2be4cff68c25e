// crates/tc_config/src/closure_config.rs

//! ClosureConfig - 湍流闭合配置
//!
//! 一个 JSON 文件描述一次闭合计算所需的全部外部输入：
//!
//! ```json
//! {
//!   "model": "kOmegaSST",
//!   "coefficients": { "a1": 0.31 },
//!   "solver": { "rtol": 1e-8, "relaxation": { "omega": 0.7 } },
//!   "bounds": { "k_min": 1e-15 },
//!   "initial": { "k": 1e-4, "omega": 10.0 },
//!   "boundary": {
//!     "south": { "k": { "type": "fixedValue", "value": 0.0 } }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::coeff_dict::CoeffDict;
use crate::error::ConfigError;

/// 闭合模型配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureConfig {
    /// 注册表中的模型名（区分大小写）
    pub model: String,

    /// 模型系数（缺省项取文献默认值）
    #[serde(default)]
    pub coefficients: CoeffDict,

    /// 输运方程求解设置
    #[serde(default)]
    pub solver: TransportSolverConfig,

    /// 场变量下限
    #[serde(default)]
    pub bounds: FieldBounds,

    /// 均匀初值
    #[serde(default)]
    pub initial: InitialConditions,

    /// 边界条件：patch 名 -> 场名 -> 条件
    #[serde(default)]
    pub boundary: BTreeMap<String, BTreeMap<String, BoundarySpec>>,
}

/// 输运方程求解设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportSolverConfig {
    /// 相对收敛容差
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    /// 绝对收敛容差
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// 最大迭代次数
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,
    /// 是否输出迭代残差
    #[serde(default)]
    pub verbose: bool,
    /// 是否扣除对流通量散度（有界迎风）
    #[serde(default = "default_bounded")]
    pub bounded: bool,
    /// 每个时间步对每个方程的求解次数
    #[serde(default = "default_n_sweeps")]
    pub n_sweeps: usize,
    /// 欠松弛因子
    #[serde(default)]
    pub relaxation: RelaxationFactors,
}

fn default_rtol() -> f64 { 1e-8 }
fn default_atol() -> f64 { 1e-14 }
fn default_max_iter() -> usize { 500 }
fn default_bounded() -> bool { true }
fn default_n_sweeps() -> usize { 1 }

impl Default for TransportSolverConfig {
    fn default() -> Self {
        Self {
            rtol: default_rtol(),
            atol: default_atol(),
            max_iter: default_max_iter(),
            verbose: false,
            bounded: default_bounded(),
            n_sweeps: default_n_sweeps(),
            relaxation: RelaxationFactors::default(),
        }
    }
}

/// 各场欠松弛因子，取值 (0, 1]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RelaxationFactors {
    /// 湍动能
    #[serde(default = "default_relax")]
    pub k: f64,
    /// 比耗散率
    #[serde(default = "default_relax")]
    pub omega: f64,
    /// 壁面法向脉动能
    #[serde(default = "default_relax")]
    pub v2: f64,
    /// 间歇因子
    #[serde(default = "default_relax")]
    pub gamma: f64,
}

fn default_relax() -> f64 { 1.0 }

impl Default for RelaxationFactors {
    fn default() -> Self {
        Self {
            k: 1.0,
            omega: 1.0,
            v2: 1.0,
            gamma: 1.0,
        }
    }
}

impl RelaxationFactors {
    /// 按场名取松弛因子，未知场返回 1
    pub fn for_field(&self, name: &str) -> f64 {
        match name {
            "k" => self.k,
            "omega" => self.omega,
            "v2" => self.v2,
            "gammaInt" => self.gamma,
            _ => 1.0,
        }
    }
}

/// 场变量下限（可实现性）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldBounds {
    /// k 下限 [m²/s²]
    #[serde(default = "default_floor")]
    pub k_min: f64,
    /// ω 下限 [1/s]
    #[serde(default = "default_floor")]
    pub omega_min: f64,
    /// v2 下限 [m²/s²]
    #[serde(default = "default_floor")]
    pub v2_min: f64,
}

fn default_floor() -> f64 { tc_foundation::scalar::SMALL }

impl Default for FieldBounds {
    fn default() -> Self {
        Self {
            k_min: default_floor(),
            omega_min: default_floor(),
            v2_min: default_floor(),
        }
    }
}

/// 均匀初值
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitialConditions {
    /// k [m²/s²]
    #[serde(default = "default_k0")]
    pub k: f64,
    /// ω [1/s]
    #[serde(default = "default_omega0")]
    pub omega: f64,
    /// v2 [m²/s²]
    #[serde(default = "default_v20")]
    pub v2: f64,
    /// 间歇因子 [-]
    #[serde(default = "default_gamma0")]
    pub gamma: f64,
}

fn default_k0() -> f64 { 1e-4 }
fn default_omega0() -> f64 { 1.0 }
fn default_v20() -> f64 { 1e-6 }
fn default_gamma0() -> f64 { 1.0 }

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            k: default_k0(),
            omega: default_omega0(),
            v2: default_v20(),
            gamma: default_gamma0(),
        }
    }
}

/// 边界条件描述
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum BoundarySpec {
    /// 零法向梯度
    ZeroGradient,
    /// 固定值
    FixedValue {
        /// 边界值
        value: f64,
    },
}

impl Default for BoundarySpec {
    fn default() -> Self {
        Self::ZeroGradient
    }
}

impl ClosureConfig {
    /// 以默认设置选择模型
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            coefficients: CoeffDict::new(),
            solver: TransportSolverConfig::default(),
            bounds: FieldBounds::default(),
            initial: InitialConditions::default(),
            boundary: BTreeMap::new(),
        }
    }

    /// 链式设置系数字典
    pub fn with_coefficients(mut self, coefficients: CoeffDict) -> Self {
        self.coefficients = coefficients;
        self
    }

    /// 链式设置初值
    pub fn with_initial(mut self, initial: InitialConditions) -> Self {
        self.initial = initial;
        self
    }

    /// 设置某 patch 上某场的边界条件
    pub fn set_boundary(&mut self, patch: &str, field: &str, spec: BoundarySpec) {
        self.boundary
            .entry(patch.to_string())
            .or_default()
            .insert(field.to_string(), spec);
    }

    /// 查询某 patch 上某场的边界条件
    pub fn boundary_for(&self, patch: &str, field: &str) -> Option<BoundarySpec> {
        self.boundary.get(patch).and_then(|m| m.get(field)).copied()
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let config: ClosureConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// 保存为 JSON 文件
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 验证配置有效性（不含模型系数，系数由模型自身校验）
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Missing("model".to_string()));
        }

        let s = &self.solver;
        if !(s.rtol > 0.0 && s.rtol < 1.0) {
            return Err(ConfigError::invalid("solver.rtol", s.rtol, "必须在 (0, 1) 范围内"));
        }
        if !(s.atol >= 0.0) {
            return Err(ConfigError::invalid("solver.atol", s.atol, "不能为负"));
        }
        if s.max_iter == 0 {
            return Err(ConfigError::invalid("solver.max_iter", s.max_iter, "必须大于 0"));
        }
        if s.n_sweeps == 0 {
            return Err(ConfigError::invalid("solver.n_sweeps", s.n_sweeps, "必须大于 0"));
        }
        let r = &s.relaxation;
        for (key, value) in [
            ("solver.relaxation.k", r.k),
            ("solver.relaxation.omega", r.omega),
            ("solver.relaxation.v2", r.v2),
            ("solver.relaxation.gamma", r.gamma),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::invalid(key, value, "松弛因子必须在 (0, 1] 范围内"));
            }
        }

        let b = &self.bounds;
        for (key, value) in [
            ("bounds.k_min", b.k_min),
            ("bounds.omega_min", b.omega_min),
            ("bounds.v2_min", b.v2_min),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::invalid(key, value, "下限必须为正的有限值"));
            }
        }

        let i = &self.initial;
        for (key, value) in [
            ("initial.k", i.k),
            ("initial.omega", i.omega),
            ("initial.v2", i.v2),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::invalid(key, value, "初值必须为非负有限值"));
            }
        }
        if !(0.0..=1.0).contains(&i.gamma) {
            return Err(ConfigError::invalid("initial.gamma", i.gamma, "间歇因子必须在 [0, 1]"));
        }

        for (patch, fields) in &self.boundary {
            for (field, spec) in fields {
                if let BoundarySpec::FixedValue { value } = spec {
                    if !value.is_finite() {
                        return Err(ConfigError::invalid(
                            format!("boundary.{}.{}", patch, field),
                            value,
                            "边界值必须为有限值",
                        ));
                    }
                }
            }
        }

        Ok(())
    }
}

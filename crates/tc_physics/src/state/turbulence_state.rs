// crates/tc_physics/src/state/turbulence_state.rs

//! 湍流模型状态
//!
//! 一个模型实例拥有唯一的 [`TurbulenceState`]：输运标量、涡黏度、
//! 可选的非线性各向异性张量以及可实现性下界。所有场在构造时按网格分配，
//! 只在 `correct()` 中原位更新。

use super::field::ScalarField;
use crate::mesh::FvMesh;
use glam::DMat3;
use tc_config::{ClosureConfig, CoeffReader, ConfigError, FieldBounds};

/// k 场名称
pub const K: &str = "k";
/// ω 场名称
pub const OMEGA: &str = "omega";
/// v2 场名称
pub const V2: &str = "v2";
/// 间歇因子场名称
pub const GAMMA: &str = "gammaInt";

/// 湍流状态
#[derive(Debug, Clone, PartialEq)]
pub struct TurbulenceState {
    /// 湍动能 k [m²/s²]
    pub k: ScalarField,
    /// 比耗散率 ω [1/s]
    pub omega: ScalarField,
    /// 壁面法向能量分量 v2 [m²/s²]
    pub v2: Option<ScalarField>,
    /// 间歇因子 γ [-]
    pub gamma: Option<ScalarField>,
    /// 涡黏度 νt [m²/s]
    pub nut: Vec<f64>,
    /// 无量纲额外各向异性 a^(ex)（对称、无迹）
    pub anisotropy: Option<Vec<DMat3>>,
    /// 可实现性下界
    pub bounds: FieldBounds,
}

/// 状态所需的可选场
#[derive(Debug, Clone, Copy, Default)]
pub struct StateLayout {
    /// 是否包含 v2
    pub v2: bool,
    /// 是否包含 γ
    pub gamma: bool,
    /// 是否包含各向异性张量
    pub anisotropy: bool,
}

impl TurbulenceState {
    /// 按配置初值与边界条件分配全部场
    pub fn from_config(
        mesh: &FvMesh,
        config: &ClosureConfig,
        layout: StateLayout,
    ) -> Result<Self, ConfigError> {
        let init = &config.initial;
        let bounds = read_bounds(&mut CoeffReader::new(&config.coefficients), &config.bounds)?;
        let n = mesh.n_cells();

        let mut state = Self {
            k: ScalarField::from_config(K, mesh, config, init.k),
            omega: ScalarField::from_config(OMEGA, mesh, config, init.omega),
            v2: layout
                .v2
                .then(|| ScalarField::from_config(V2, mesh, config, init.v2)),
            gamma: layout
                .gamma
                .then(|| ScalarField::from_config(GAMMA, mesh, config, init.gamma)),
            nut: vec![0.0; n],
            anisotropy: layout.anisotropy.then(|| vec![DMat3::ZERO; n]),
            bounds,
        };
        state.bound_all();
        Ok(state)
    }

    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.nut.len()
    }

    /// 对所有输运标量施加可实现性约束，返回被截断单元总数
    pub fn bound_all(&mut self) -> usize {
        let b = self.bounds;
        let mut clipped = self.k.bound(b.k_min) + self.omega.bound(b.omega_min);
        if let Some(v2) = self.v2.as_mut() {
            clipped += v2.bound(b.v2_min);
        }
        if let Some(g) = self.gamma.as_mut() {
            clipped += g.clamp(0.0, 1.0);
        }
        clipped
    }
}

/// 读取字典中的下界覆盖值（kMin、omegaMin、v2Min）
pub fn read_bounds(
    reader: &mut CoeffReader<'_>,
    defaults: &FieldBounds,
) -> Result<FieldBounds, ConfigError> {
    Ok(FieldBounds {
        k_min: reader.positive("kMin", defaults.k_min)?,
        omega_min: reader.positive("omegaMin", defaults.omega_min)?,
        v2_min: reader.positive("v2Min", defaults.v2_min)?,
    })
}

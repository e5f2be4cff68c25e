// crates/tc_physics/src/turbulence/traits.rs

//! 湍流闭合 trait
//!
//! 两层接口：
//!
//! - [`TurbulenceClosure`]: 宿主求解器使用的对象安全接口（`Box<dyn TurbulenceClosure>`）
//! - [`TwoEquationClosure`]: 各模型变体实现的能力接口，只描述逐单元的
//!   产生、耗散、扩散和涡黏度公式；方程组装、求解、截断由
//!   [`RasModel`](super::RasModel) 统一完成
//!
//! 系数集合实现 [`ClosureCoefficients`]，从字典读取并可写回字典。

use super::context::{CellKinematics, ClosureContext};
use super::invariants::{rotation_rate, strain_rate};
use super::rans_model::CorrectReport;
use crate::mesh::FvMesh;
use crate::numerics::discretization::CellSource;
use crate::state::{MeanFlowState, StateLayout, TurbulenceState};
use glam::DMat3;
use tc_config::{CoeffDict, CoeffReader, ConfigError};
use tc_foundation::TcResult;

// =============================================================================
// 速度梯度
// =============================================================================

/// 速度梯度张量
///
/// 元素 `(i, j) = ∂u_i/∂x_j`，以 glam 列主序存储，即 `col(j)[i]`。
///
/// # 应变率模
///
/// ```text
/// |S| = √(2 S_ij S_ij)
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityGradient(DMat3);

impl Default for VelocityGradient {
    fn default() -> Self {
        Self::zero()
    }
}

impl VelocityGradient {
    /// 按行给出 `rows[i][j] = ∂u_i/∂x_j`
    #[inline]
    pub fn new(rows: [[f64; 3]; 3]) -> Self {
        Self(DMat3::from_cols_array_2d(&rows).transpose())
    }

    /// 包装已有矩阵
    #[inline]
    pub fn from_mat3(grad: DMat3) -> Self {
        Self(grad)
    }

    /// 零梯度
    #[inline]
    pub fn zero() -> Self {
        Self(DMat3::ZERO)
    }

    /// 简单剪切 ∂u/∂y = rate
    #[inline]
    pub fn simple_shear(rate: f64) -> Self {
        Self::new([[0.0, rate, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]])
    }

    /// 元素 ∂u_i/∂x_j
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.0.col(j)[i]
    }

    /// 矩阵
    #[inline]
    pub fn as_mat3(&self) -> &DMat3 {
        &self.0
    }

    /// 应变率张量
    #[inline]
    pub fn strain_rate(&self) -> DMat3 {
        strain_rate(&self.0)
    }

    /// 旋转率张量
    #[inline]
    pub fn rotation_rate(&self) -> DMat3 {
        rotation_rate(&self.0)
    }

    /// 应变率模 √(2S:S)
    #[inline]
    pub fn strain_rate_magnitude(&self) -> f64 {
        CellKinematics::from_gradient(self).mag_s
    }

    /// 涡量模 √(2W:W)
    #[inline]
    pub fn vorticity_magnitude(&self) -> f64 {
        CellKinematics::from_gradient(self).mag_w
    }

    /// 散度 ∇·U
    #[inline]
    pub fn divergence(&self) -> f64 {
        self.0.x_axis.x + self.0.y_axis.y + self.0.z_axis.z
    }

    /// 是否全部有限
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.0.is_finite()
    }
}

// =============================================================================
// 系数
// =============================================================================

/// 模型系数集合
///
/// `Default` 给出文献默认值；`read_from` 读取字典中出现的键，
/// 缺省取默认值，并校验符号与有限性。
pub trait ClosureCoefficients: Clone + PartialEq + Default + Send + Sync + 'static {
    /// 从读取器读取（缺省取 `Default`）
    fn read_from(reader: &mut CoeffReader<'_>) -> Result<Self, ConfigError>;

    /// 写回字典
    fn to_dict(&self) -> CoeffDict;

    /// 从字典构建
    fn from_dict(dict: &CoeffDict) -> Result<Self, ConfigError> {
        Self::read_from(&mut CoeffReader::new(dict))
    }
}

// =============================================================================
// 宿主接口
// =============================================================================

/// 湍流闭合模型（宿主侧接口）
///
/// 宿主每个时间步调用一次 [`correct`](Self::correct)，之后读取涡黏度和
/// （非线性模型的）额外应力。所有场只读暴露。
pub trait TurbulenceClosure: Send + Sync {
    /// 模型名称
    fn name(&self) -> &'static str;

    /// 模型状态
    fn state(&self) -> &TurbulenceState;

    /// 涡黏度场 νt
    fn eddy_viscosity(&self) -> &[f64] {
        &self.state().nut
    }

    /// 湍动能 k
    fn k(&self) -> &[f64] {
        self.state().k.values()
    }

    /// 比耗散率 ω
    fn omega(&self) -> &[f64] {
        self.state().omega.values()
    }

    /// 耗散率 ε（派生量）
    fn epsilon(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>>;

    /// 壁面法向能量 v2
    fn v2(&self) -> Option<&[f64]> {
        self.state().v2.as_ref().map(|f| f.values())
    }

    /// 间歇因子 γ
    fn gamma_intermittency(&self) -> Option<&[f64]> {
        self.state().gamma.as_ref().map(|f| f.values())
    }

    /// 非线性额外应力 k·a^(ex)（仅非线性模型）
    fn nonlinear_stress(&self) -> Option<Vec<DMat3>> {
        let state = self.state();
        state.anisotropy.as_ref().map(|a| {
            a.iter()
                .zip(state.k.values())
                .map(|(a, &k)| *a * k)
                .collect()
        })
    }

    /// k 方程有效扩散率
    fn dk_eff(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>>;

    /// ω 方程有效扩散率
    fn domega_eff(&self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<Vec<f64>>;

    /// 按当前场重算派生量（不做输运）
    fn validate(&mut self, mesh: &FvMesh, flow: &MeanFlowState) -> TcResult<()>;

    /// 推进一个时间步
    fn correct(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        dt: f64,
    ) -> TcResult<CorrectReport>;

    /// 重新读取系数，返回是否有变化
    fn read(&mut self, dict: &CoeffDict) -> TcResult<bool>;

    /// 当前系数字典
    fn coefficients(&self) -> CoeffDict;
}

// =============================================================================
// 变体能力接口
// =============================================================================

/// 附加输运方程
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraEquation {
    /// 壁面法向能量 v2
    V2,
    /// 间歇因子 γ
    Intermittency,
}

impl ExtraEquation {
    /// 场名称
    pub fn field_name(self) -> &'static str {
        match self {
            Self::V2 => crate::state::V2,
            Self::Intermittency => crate::state::GAMMA,
        }
    }
}

/// 两方程（及其扩展）闭合变体
///
/// 所有逐单元函数只读 [`ClosureContext`]，可在单元间并行调用。
/// 耗散项以"速率"给出（乘以所求变量即为耗散），隐式处理。
pub trait TwoEquationClosure: Clone + Send + Sync {
    /// 系数类型
    type Coeffs: ClosureCoefficients;

    /// 由系数构建
    fn from_coefficients(coeffs: Self::Coeffs) -> Self;

    /// 注册名称
    fn name(&self) -> &'static str;

    /// 需要的场
    fn layout(&self) -> StateLayout;

    /// 当前系数
    fn coefficients(&self) -> &Self::Coeffs;

    /// 替换系数
    fn set_coefficients(&mut self, coeffs: Self::Coeffs);

    /// 每步开始时更新变体内部状态
    fn begin_step(
        &mut self,
        _mesh: &FvMesh,
        _flow: &MeanFlowState,
        _state: &TurbulenceState,
        _kinematics: &[CellKinematics],
        _dt: f64,
    ) -> TcResult<()> {
        Ok(())
    }

    /// 混合函数（1 为内层系数）
    fn blending(&self, _ctx: &ClosureContext<'_>, _cell: usize) -> f64 {
        1.0
    }

    /// k 方程有效扩散率
    fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;

    /// ω 方程有效扩散率
    fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;

    /// k 产生项
    fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;

    /// k 耗散速率
    fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;

    /// ω 产生项
    fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;

    /// ω 耗散速率
    fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;

    /// k 方程附加源项
    fn k_source(&self, _ctx: &ClosureContext<'_>, _cell: usize) -> CellSource {
        CellSource::default()
    }

    /// ω 方程附加源项
    fn omega_source(&self, _ctx: &ClosureContext<'_>, _cell: usize) -> CellSource {
        CellSource::default()
    }

    /// 附加输运方程（按求解顺序）
    fn extra_equations(&self) -> &'static [ExtraEquation] {
        &[]
    }

    /// 附加方程有效扩散率
    fn extra_diffusivity(&self, _eq: ExtraEquation, _ctx: &ClosureContext<'_>, _cell: usize) -> f64 {
        0.0
    }

    /// 附加方程源项
    fn extra_source(
        &self,
        _eq: ExtraEquation,
        _ctx: &ClosureContext<'_>,
        _cell: usize,
    ) -> CellSource {
        CellSource::default()
    }

    /// 涡黏度
    fn eddy_viscosity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;

    /// 是否以代数形式给出间歇因子
    fn has_algebraic_intermittency(&self) -> bool {
        false
    }

    /// 代数间歇因子（仅当 [`has_algebraic_intermittency`](Self::has_algebraic_intermittency)）
    fn algebraic_intermittency(&self, _ctx: &ClosureContext<'_>, _cell: usize) -> f64 {
        1.0
    }

    /// 无量纲额外各向异性 a^(ex)
    fn anisotropy(&self, _ctx: &ClosureContext<'_>, _cell: usize) -> Option<DMat3> {
        None
    }

    /// 耗散率 ε
    fn epsilon(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_convention() {
        let g = VelocityGradient::new([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]);
        assert_eq!(g.get(0, 1), 2.0);
        assert_eq!(g.get(1, 0), 4.0);
        assert_eq!(g.get(2, 1), 8.0);
        assert_eq!(g.divergence(), 15.0);
    }

    #[test]
    fn test_simple_shear_magnitudes() {
        let g = VelocityGradient::simple_shear(1.0);
        assert!((g.strain_rate_magnitude() - 1.0).abs() < 1e-14);
        assert!((g.vorticity_magnitude() - 1.0).abs() < 1e-14);
        assert_eq!(g.divergence(), 0.0);
    }

    #[test]
    fn test_validity() {
        assert!(VelocityGradient::simple_shear(2.0).is_valid());
        let bad = VelocityGradient::new([[f64::NAN, 0.0, 0.0], [0.0; 3], [0.0; 3]]);
        assert!(!bad.is_valid());
    }

    #[test]
    fn test_extra_equation_names() {
        assert_eq!(ExtraEquation::V2.field_name(), "v2");
        assert_eq!(ExtraEquation::Intermittency.field_name(), "gammaInt");
    }
}

// crates/tc_physics/src/turbulence/context.rs

//! 单步上下文
//!
//! 每次 `correct()` 开始时按速度梯度计算一次运动学量 [`CellKinematics`]；
//! k、ω 梯度与混合函数放在 [`StepCache`] 中，在求解 ω 之后刷新，
//! 使 k 方程使用更新后的 ω。变体的逐单元公式通过 [`ClosureContext`]
//! 只读访问这些数据。

use super::blending::BlendInputs;
use super::invariants::{double_dot, rotation_rate, strain_rate};
use super::traits::VelocityGradient;
use crate::mesh::FvMesh;
use crate::numerics::gradient::GreenGaussGradient;
use crate::state::{MeanFlowState, TurbulenceState};
use glam::{DMat3, DVec3};
use rayon::prelude::*;

/// 壁面距离下限 [m]
pub const WALL_DISTANCE_FLOOR: f64 = 1e-12;

/// 单元运动学量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellKinematics {
    /// 应变率 S
    pub s: DMat3,
    /// 旋转率 W
    pub w: DMat3,
    /// 2S:S
    pub s2: f64,
    /// √(2S:S)
    pub mag_s: f64,
    /// √(2W:W)
    pub mag_w: f64,
    /// ∇·U
    pub div_u: f64,
}

impl CellKinematics {
    /// 由速度梯度计算
    #[inline]
    pub fn from_gradient(grad: &VelocityGradient) -> Self {
        let g = grad.as_mat3();
        let s = strain_rate(g);
        let w = rotation_rate(g);
        let s2 = 2.0 * double_dot(&s, &s);
        let w2 = 2.0 * double_dot(&w, &w);
        Self {
            s,
            w,
            s2,
            mag_s: s2.sqrt(),
            mag_w: w2.sqrt(),
            div_u: grad.divergence(),
        }
    }

    /// 全场计算
    pub fn compute(flow: &MeanFlowState) -> Vec<Self> {
        flow.grad_u.par_iter().map(Self::from_gradient).collect()
    }
}

/// 单步缓存
#[derive(Debug, Clone, Default)]
pub struct StepCache {
    /// 运动学量
    pub kinematics: Vec<CellKinematics>,
    /// ∇k
    pub grad_k: Vec<DVec3>,
    /// ∇ω
    pub grad_omega: Vec<DVec3>,
    /// 混合函数
    pub blend: Vec<f64>,
}

impl StepCache {
    /// 以运动学量创建，梯度与混合函数待刷新
    pub fn new(kinematics: Vec<CellKinematics>) -> Self {
        let n = kinematics.len();
        Self {
            kinematics,
            grad_k: vec![DVec3::ZERO; n],
            grad_omega: vec![DVec3::ZERO; n],
            blend: vec![1.0; n],
        }
    }

    /// 按当前 k、ω 刷新梯度
    pub fn refresh_gradients(
        &mut self,
        mesh: &FvMesh,
        state: &TurbulenceState,
        gg: &GreenGaussGradient,
    ) {
        self.grad_k = state.k.gradient(mesh, gg);
        self.grad_omega = state.omega.gradient(mesh, gg);
    }
}

/// 逐单元公式的只读上下文
#[derive(Clone, Copy)]
pub struct ClosureContext<'a> {
    /// 网格
    pub mesh: &'a FvMesh,
    /// 平均流
    pub flow: &'a MeanFlowState,
    /// 湍流状态
    pub state: &'a TurbulenceState,
    /// 单步缓存
    pub cache: &'a StepCache,
}

impl<'a> ClosureContext<'a> {
    /// 创建
    pub fn new(
        mesh: &'a FvMesh,
        flow: &'a MeanFlowState,
        state: &'a TurbulenceState,
        cache: &'a StepCache,
    ) -> Self {
        Self {
            mesh,
            flow,
            state,
            cache,
        }
    }

    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.state.n_cells()
    }

    /// k
    #[inline]
    pub fn k(&self, cell: usize) -> f64 {
        self.state.k.values()[cell]
    }

    /// ω
    #[inline]
    pub fn omega(&self, cell: usize) -> f64 {
        self.state.omega.values()[cell]
    }

    /// v2（无该场时为 0）
    #[inline]
    pub fn v2(&self, cell: usize) -> f64 {
        self.state.v2.as_ref().map_or(0.0, |f| f.values()[cell])
    }

    /// γ（无该场时为 1）
    #[inline]
    pub fn gamma(&self, cell: usize) -> f64 {
        self.state.gamma.as_ref().map_or(1.0, |f| f.values()[cell])
    }

    /// 上一步涡黏度
    #[inline]
    pub fn nut(&self, cell: usize) -> f64 {
        self.state.nut[cell]
    }

    /// 分子黏度
    #[inline]
    pub fn nu(&self, cell: usize) -> f64 {
        self.flow.nu[cell]
    }

    /// 壁面距离（带下限）
    #[inline]
    pub fn y(&self, cell: usize) -> f64 {
        self.flow.wall_distance[cell].max(WALL_DISTANCE_FLOOR)
    }

    /// 运动学量
    #[inline]
    pub fn kin(&self, cell: usize) -> &CellKinematics {
        &self.cache.kinematics[cell]
    }

    /// 混合函数
    #[inline]
    pub fn blend(&self, cell: usize) -> f64 {
        self.cache.blend[cell]
    }

    /// ∇k
    #[inline]
    pub fn grad_k(&self, cell: usize) -> DVec3 {
        self.cache.grad_k[cell]
    }

    /// ∇ω
    #[inline]
    pub fn grad_omega(&self, cell: usize) -> DVec3 {
        self.cache.grad_omega[cell]
    }

    /// ∇k·∇ω
    #[inline]
    pub fn grad_k_dot_grad_omega(&self, cell: usize) -> f64 {
        self.cache.grad_k[cell].dot(self.cache.grad_omega[cell])
    }

    /// 混合函数输入
    #[inline]
    pub fn blend_inputs(&self, cell: usize) -> BlendInputs {
        BlendInputs {
            y: self.flow.wall_distance[cell],
            k: self.k(cell),
            omega: self.omega(cell),
            nu: self.nu(cell),
            grad_k_dot_grad_omega: self.grad_k_dot_grad_omega(cell),
        }
    }
}

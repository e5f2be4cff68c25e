// crates/tc_physics/src/turbulence/models/earsm.rs

//! Hellsten EARSM（2005）
//!
//! k-ω 输运方程 + 显式代数雷诺应力：
//!
//! ```text
//! τ = 1/(β*ω),  S̃ = τS,  W̃ = τW*
//! νt = Cμ·k·τ
//! G  = νt·2S:S − k·a^(ex):S
//! Dk/Dt = G − β*ωk + ∇·((ν + αK·νt)∇k)
//! Dω/Dt = γ·ω/k·G − βω² + αD/ω·max(∇k·∇ω, 0) + ∇·((ν + αω·νt)∇ω)
//! ```
//!
//! 系数由 fMix 在两组之间混合。可选曲率修正见 [`CurvatureTracker`]。
//!
//! τ 不设 Kolmogorov 下限，k → 0 时仍为 1/(β*ω)；
//! 带 Cτ 下限的时间尺度见 [`EarsmTrans`](super::EarsmTrans)。

use crate::mesh::FvMesh;
use crate::numerics::discretization::CellSource;
use crate::state::{MeanFlowState, StateLayout, TurbulenceState};
use crate::turbulence::blending::{blend, earsm_f_mix};
use crate::turbulence::context::{CellKinematics, ClosureContext};
use crate::turbulence::earsm_closure::{
    curvature_rotation, nonlinear_anisotropy, time_scale, CurvatureRamp, EarsmResult,
};
use crate::turbulence::invariants::double_dot;
use crate::turbulence::rans_model::RasModel;
use crate::turbulence::traits::{ClosureCoefficients, TwoEquationClosure};
use glam::DMat3;
use log::debug;
use rayon::prelude::*;
use tc_config::{CoeffDict, CoeffReader, ConfigError};
use tc_foundation::TcResult;

/// 曲率修正开关切换的默认渐变步数
pub const DEFAULT_CURVATURE_RAMP_STEPS: f64 = 20.0;

// =============================================================================
// 系数
// =============================================================================

/// EARSM 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarsmCoeffs {
    /// β*
    pub beta_star: f64,
    /// γ1
    pub gamma1: f64,
    /// γ2
    pub gamma2: f64,
    /// β1
    pub beta1: f64,
    /// β2
    pub beta2: f64,
    /// αK1
    pub alpha_k1: f64,
    /// αK2
    pub alpha_k2: f64,
    /// αω1
    pub alpha_omega1: f64,
    /// αω2
    pub alpha_omega2: f64,
    /// αD1
    pub alpha_d1: f64,
    /// αD2
    pub alpha_d2: f64,
    /// 自由流 k
    pub k_inf: f64,
    /// 曲率修正开关
    pub curvature_correction: bool,
    /// A0（曲率修正）
    pub a0: f64,
    /// 曲率修正渐变步数
    pub curvature_ramp_steps: f64,
}

impl Default for EarsmCoeffs {
    fn default() -> Self {
        Self {
            beta_star: 0.09,
            gamma1: 0.518,
            gamma2: 0.44,
            beta1: 0.0747,
            beta2: 0.0828,
            alpha_k1: 1.1,
            alpha_k2: 1.1,
            alpha_omega1: 0.53,
            alpha_omega2: 1.0,
            alpha_d1: 1.0,
            alpha_d2: 0.4,
            k_inf: 1e-10,
            curvature_correction: false,
            a0: -0.72,
            curvature_ramp_steps: DEFAULT_CURVATURE_RAMP_STEPS,
        }
    }
}

impl ClosureCoefficients for EarsmCoeffs {
    fn read_from(reader: &mut CoeffReader<'_>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let steps = reader.positive("curvatureRampSteps", d.curvature_ramp_steps)?;
        if steps.fract() != 0.0 || steps > f64::from(u32::MAX) {
            return Err(ConfigError::invalid("curvatureRampSteps", steps, "必须为正整数"));
        }
        Ok(Self {
            beta_star: reader.positive("betaStar", d.beta_star)?,
            gamma1: reader.positive("gamma1", d.gamma1)?,
            gamma2: reader.positive("gamma2", d.gamma2)?,
            beta1: reader.positive("beta1", d.beta1)?,
            beta2: reader.positive("beta2", d.beta2)?,
            alpha_k1: reader.positive("alphaK1", d.alpha_k1)?,
            alpha_k2: reader.positive("alphaK2", d.alpha_k2)?,
            alpha_omega1: reader.positive("alphaOmega1", d.alpha_omega1)?,
            alpha_omega2: reader.positive("alphaOmega2", d.alpha_omega2)?,
            alpha_d1: reader.non_negative("alphaD1", d.alpha_d1)?,
            alpha_d2: reader.non_negative("alphaD2", d.alpha_d2)?,
            k_inf: reader.positive("kInf", d.k_inf)?,
            curvature_correction: reader.switch("curvatureCorrection", d.curvature_correction)?,
            a0: reader.non_zero("A0", d.a0)?,
            curvature_ramp_steps: steps,
        })
    }

    fn to_dict(&self) -> CoeffDict {
        CoeffDict::new()
            .with_scalar("betaStar", self.beta_star)
            .with_scalar("gamma1", self.gamma1)
            .with_scalar("gamma2", self.gamma2)
            .with_scalar("beta1", self.beta1)
            .with_scalar("beta2", self.beta2)
            .with_scalar("alphaK1", self.alpha_k1)
            .with_scalar("alphaK2", self.alpha_k2)
            .with_scalar("alphaOmega1", self.alpha_omega1)
            .with_scalar("alphaOmega2", self.alpha_omega2)
            .with_scalar("alphaD1", self.alpha_d1)
            .with_scalar("alphaD2", self.alpha_d2)
            .with_scalar("kInf", self.k_inf)
            .with_switch("curvatureCorrection", self.curvature_correction)
            .with_scalar("A0", self.a0)
            .with_scalar("curvatureRampSteps", self.curvature_ramp_steps)
    }
}

// =============================================================================
// 曲率修正
// =============================================================================

/// 曲率修正状态
///
/// 保存上一步应变率以构造 Ṡ = ∂S/∂t + (U·∇)S，对流项用迎风面通量近似。
/// 权重按 [`CurvatureRamp`] 渐变；权重为零时不计算 Ω^(r)。
#[derive(Debug, Clone)]
pub struct CurvatureTracker {
    ramp: CurvatureRamp,
    prev_strain: Option<Vec<DMat3>>,
    rotation: Vec<DMat3>,
}

impl CurvatureTracker {
    /// 创建，权重从零开始
    pub fn new(ramp_steps: f64) -> Self {
        Self {
            ramp: CurvatureRamp::new(ramp_steps as u32),
            prev_strain: None,
            rotation: Vec::new(),
        }
    }

    /// 当前权重 w_c
    #[inline]
    pub fn weight(&self) -> f64 {
        self.ramp.weight()
    }

    /// 单元的 Ω^(r)（未计算时为零）
    #[inline]
    pub fn rotation(&self, cell: usize) -> DMat3 {
        self.rotation.get(cell).copied().unwrap_or(DMat3::ZERO)
    }

    /// 修改渐变步数（保留当前权重）
    pub fn set_ramp_steps(&mut self, steps: f64) {
        self.ramp.set_steps(steps as u32);
    }

    /// 推进一步
    pub fn update(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        kinematics: &[CellKinematics],
        dt: f64,
        enabled: bool,
    ) {
        let weight = self.ramp.advance(enabled);
        let strain: Vec<DMat3> = kinematics.par_iter().map(|k| k.s).collect();

        if weight > 0.0 {
            let convection = strain_convection(mesh, flow, &strain);
            let prev = self.prev_strain.as_deref();
            self.rotation = strain
                .par_iter()
                .enumerate()
                .map(|(i, s)| {
                    let ddt = match prev {
                        Some(p) if dt.is_finite() => (*s - p[i]) * (1.0 / dt),
                        _ => DMat3::ZERO,
                    };
                    curvature_rotation(s, &(ddt + convection[i]))
                })
                .collect();
            debug!("EARSM 曲率修正权重 {:.3}", weight);
        } else {
            self.rotation.clear();
        }
        self.prev_strain = Some(strain);
    }
}

/// (U·∇)S ≈ (1/V)·Σ_入流面 F_f·(S_N − S_P)，F_f 为体积通量
fn strain_convection(mesh: &FvMesh, flow: &MeanFlowState, strain: &[DMat3]) -> Vec<DMat3> {
    let mut acc = vec![DMat3::ZERO; mesh.n_cells()];
    for &face in mesh.interior_faces() {
        let f = mesh.face(face);
        let nb = match f.neighbor {
            Some(nb) => nb,
            None => continue,
        };
        let p = f.owner;
        let w = mesh.weight(face);
        let rho_f = w * flow.rho[p] + (1.0 - w) * flow.rho[nb];
        let phi = flow.mass_flux[face] / rho_f;
        let diff = strain[nb] - strain[p];
        if phi < 0.0 {
            // 对 owner 为入流
            acc[p] += diff * phi;
        } else if phi > 0.0 {
            // 对 neighbor 为入流（外法向通量为 −φ）
            acc[nb] += diff * phi;
        }
    }
    acc.iter()
        .enumerate()
        .map(|(i, a)| *a * (1.0 / mesh.cell_volume(i)))
        .collect()
}

// =============================================================================
// 闭合
// =============================================================================

/// EARSM 闭合
#[derive(Debug, Clone)]
pub struct EarsmClosure {
    coeffs: EarsmCoeffs,
    curvature: CurvatureTracker,
}

/// EARSM 模型
pub type Earsm = RasModel<EarsmClosure>;

impl EarsmClosure {
    /// 曲率修正状态
    pub fn curvature(&self) -> &CurvatureTracker {
        &self.curvature
    }

    #[inline]
    fn tau(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        time_scale(
            ctx.k(cell),
            ctx.omega(cell),
            ctx.nu(cell),
            self.coeffs.beta_star,
            None,
        )
    }

    /// 单元的 Cμ 与 a^(ex)
    fn closure_at(&self, ctx: &ClosureContext<'_>, cell: usize) -> EarsmResult {
        let kin = ctx.kin(cell);
        let tau = self.tau(ctx, cell);
        let wc = self.curvature.weight();
        let w_eff = if wc > 0.0 {
            kin.w - self.curvature.rotation(cell) * (wc / self.coeffs.a0)
        } else {
            kin.w
        };
        nonlinear_anisotropy(&(kin.s * tau), &(w_eff * tau))
    }

    /// G = νt·2S:S − k·a^(ex):S
    fn g(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let kin = ctx.kin(cell);
        let r = self.closure_at(ctx, cell);
        let nut = r.cmu * ctx.k(cell) * self.tau(ctx, cell);
        nut * kin.s2 - ctx.k(cell) * double_dot(&r.anisotropy, &kin.s)
    }
}

impl TwoEquationClosure for EarsmClosure {
    type Coeffs = EarsmCoeffs;

    fn from_coefficients(coeffs: EarsmCoeffs) -> Self {
        Self {
            curvature: CurvatureTracker::new(coeffs.curvature_ramp_steps),
            coeffs,
        }
    }

    fn name(&self) -> &'static str {
        "EARSM"
    }

    fn layout(&self) -> StateLayout {
        StateLayout {
            anisotropy: true,
            ..Default::default()
        }
    }

    fn coefficients(&self) -> &EarsmCoeffs {
        &self.coeffs
    }

    /// 开关变化不立即生效，由下一步起按渐变推进
    fn set_coefficients(&mut self, coeffs: EarsmCoeffs) {
        if coeffs.curvature_ramp_steps != self.coeffs.curvature_ramp_steps {
            self.curvature.set_ramp_steps(coeffs.curvature_ramp_steps);
        }
        self.coeffs = coeffs;
    }

    fn begin_step(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        _state: &TurbulenceState,
        kinematics: &[CellKinematics],
        dt: f64,
    ) -> TcResult<()> {
        self.curvature
            .update(mesh, flow, kinematics, dt, self.coeffs.curvature_correction);
        Ok(())
    }

    fn blending(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        earsm_f_mix(&ctx.blend_inputs(cell), self.coeffs.beta_star, self.coeffs.k_inf)
    }

    fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        blend(ctx.blend(cell), c.alpha_k1, c.alpha_k2) * ctx.nut(cell) + ctx.nu(cell)
    }

    fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        blend(ctx.blend(cell), c.alpha_omega1, c.alpha_omega2) * ctx.nut(cell) + ctx.nu(cell)
    }

    fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.g(ctx, cell)
    }

    fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta_star * ctx.omega(cell)
    }

    fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        let gamma = blend(ctx.blend(cell), c.gamma1, c.gamma2);
        gamma * ctx.omega(cell) / ctx.k(cell) * self.g(ctx, cell).max(0.0)
    }

    fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        blend(ctx.blend(cell), c.beta1, c.beta2) * ctx.omega(cell)
    }

    fn k_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        CellSource::sink(2.0 / 3.0 * ctx.kin(cell).div_u, ctx.k(cell))
    }

    fn omega_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        let c = &self.coeffs;
        let f = ctx.blend(cell);
        let omega = ctx.omega(cell);
        let cross = blend(f, c.alpha_d1, c.alpha_d2) / omega
            * ctx.grad_k_dot_grad_omega(cell).max(0.0);
        CellSource::explicit(cross)
            + CellSource::sink(
                2.0 / 3.0 * blend(f, c.gamma1, c.gamma2) * ctx.kin(cell).div_u,
                omega,
            )
    }

    fn eddy_viscosity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.closure_at(ctx, cell).cmu * ctx.k(cell) * self.tau(ctx, cell)
    }

    fn anisotropy(&self, ctx: &ClosureContext<'_>, cell: usize) -> Option<DMat3> {
        Some(self.closure_at(ctx, cell).anisotropy)
    }

    fn epsilon(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta_star * ctx.k(cell) * ctx.omega(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StructuredMesh;
    use crate::turbulence::{TurbulenceClosure, VelocityGradient};
    use tc_config::{ClosureConfig, InitialConditions};

    #[test]
    fn test_ramp_steps_must_be_integer() {
        let dict = CoeffDict::new().with_scalar("curvatureRampSteps", 2.5);
        assert!(EarsmCoeffs::from_dict(&dict).is_err());
        let dict = CoeffDict::new().with_scalar("A0", 0.0);
        assert!(EarsmCoeffs::from_dict(&dict).is_err());
    }

    #[test]
    fn test_defaults_round_trip() {
        let c = EarsmCoeffs::default();
        assert_eq!(EarsmCoeffs::from_dict(&c.to_dict()).unwrap(), c);
    }

    #[test]
    fn test_curvature_disabled_has_no_rotation() {
        let mesh = StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap();
        let flow = MeanFlowState::uniform_gradient(
            &mesh,
            VelocityGradient::simple_shear(1.0),
            vec![0.1; 9],
            1e-5,
        )
        .unwrap();
        let kin = CellKinematics::compute(&flow);
        let mut tracker = CurvatureTracker::new(20.0);
        tracker.update(&mesh, &flow, &kin, 1.0, false);
        assert_eq!(tracker.weight(), 0.0);
        assert_eq!(tracker.rotation(0), DMat3::ZERO);

        // 打开开关后权重逐步增加
        tracker.update(&mesh, &flow, &kin, 1.0, true);
        assert!((tracker.weight() - 0.05).abs() < 1e-12);
        // 稳定均匀剪切没有曲率
        assert!(tracker.rotation(4).abs_diff_eq(DMat3::ZERO, 1e-14));
    }

    #[test]
    fn test_ramp_steps_change_keeps_weight() {
        let mesh = StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap();
        let flow = MeanFlowState::uniform_gradient(
            &mesh,
            VelocityGradient::simple_shear(1.0),
            vec![0.1; 9],
            1e-5,
        )
        .unwrap();
        let kin = CellKinematics::compute(&flow);
        let mut tracker = CurvatureTracker::new(20.0);
        tracker.update(&mesh, &flow, &kin, 1.0, true);
        tracker.update(&mesh, &flow, &kin, 1.0, true);
        tracker.set_ramp_steps(10.0);
        assert!((tracker.weight() - 0.1).abs() < 1e-12);
        tracker.update(&mesh, &flow, &kin, 1.0, true);
        assert!((tracker.weight() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_time_scale_has_no_kolmogorov_floor() {
        let mesh = StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap();
        let flow = MeanFlowState::uniform_gradient(
            &mesh,
            VelocityGradient::simple_shear(5.0),
            vec![0.1; 9],
            1e-5,
        )
        .unwrap();
        let nut_per_k = |k: f64| {
            let config = ClosureConfig::new("EARSM").with_initial(InitialConditions {
                k,
                omega: 10.0,
                ..Default::default()
            });
            let model = Earsm::from_config(&mesh, &config).unwrap();
            assert_eq!(model.state().k.values()[4], k);
            model.compute_eddy_viscosity(&mesh, &flow).unwrap()[4] / k
        };
        // 有 Cτ = 6 下限时 k = 1e-12 的 τ 将放大三个量级以上
        let reference = nut_per_k(1e-3);
        assert!((nut_per_k(1e-12) - reference).abs() < 1e-9 * reference);
    }
}

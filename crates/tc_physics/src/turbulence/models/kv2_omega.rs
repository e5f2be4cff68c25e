// crates/tc_physics/src/turbulence/models/kv2_omega.rs

//! k-v2-ω 三方程转捩模型（Lopez & Walters 2016）
//!
//! k 为总脉动能，v2 为壁面法向（湍流）部分，kL = k − v2 为非湍流部分。
//! 涡黏度分小尺度与大尺度两部分：
//!
//! ```text
//! λT = √k/ω,  λeff = min(Cλ·y, λT),  fW = (λeff/λT)^(2/3)
//! v2s = fSS·fW·v2,  v2l = v2 − v2s
//! αT  = fν·Cμ·√v2s·λeff
//! νTs = fINT·αT
//! νTl = min(fτl·C11·W·λeff²/ν·√v2l·λeff + βTS·C12·ReΩ·y²·W, ½(kL + v2l)/S)
//! ```
//!
//! 旁路 R_BP 与自然转捩 R_NAT 将能量从 kL 转入 v2。
//!
//! ```text
//! Dk/Dt  = νT·S² − ω·min(k, v2) − D(k)     + ∇·((ν + αT/σk)∇k)
//! Dv2/Dt = νTs·S² + R_BP + R_NAT − ω·v2 − D(v2) + ∇·((ν + αT/σk)∇v2)
//! Dω/Dt  = Cω1·ω/v2·νTs·S² + (CωR/fW − 1)·ω/v2·(R_BP + R_NAT) − Cω2·ω²
//!          + 2(1 − F1)/σω2·∇k·∇ω/ω + ∇·((ν + αT/σω)∇ω)
//! ```
//!
//! D(φ) = 2ν|∇√φ|² = ν|∇φ|²/(2φ)。

use crate::mesh::FvMesh;
use crate::numerics::discretization::CellSource;
use crate::numerics::gradient::GreenGaussGradient;
use crate::state::{MeanFlowState, StateLayout, TurbulenceState};
use crate::turbulence::blending::SstBlending;
use crate::turbulence::context::{CellKinematics, ClosureContext};
use crate::turbulence::correlations::{growth, natural_crit_factor, shear_sheltering, ts_onset};
use crate::turbulence::rans_model::RasModel;
use crate::turbulence::traits::{ClosureCoefficients, ExtraEquation, TwoEquationClosure};
use glam::DVec3;
use tc_config::{CoeffDict, CoeffReader, ConfigError};
use tc_foundation::{TcResult, ROOT_VSMALL};

/// 应变率/涡量下限 [1/s]
const RATE_FLOOR: f64 = 1e-10;

/// k-v2-ω 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kv2OmegaCoeffs {
    /// Cμ 分母常数 A0
    pub a0: f64,
    /// Cμ 分母中 S/ω 的系数 AS
    pub a_s: f64,
    /// 黏性阻尼 fν 的尺度 Aν
    pub a_nu: f64,
    /// 旁路转捩增长函数的尺度 ABP
    pub a_bp: f64,
    /// 自然转捩增长函数的尺度 ANAT
    pub a_nat: f64,
    /// TS 波起始函数的尺度 ATS
    pub a_ts: f64,
    /// 旁路转捩临界值 CBPcrit
    pub c_bp_crit: f64,
    /// 自然转捩临界修正系数 CNC
    pub c_nc: f64,
    /// 自然转捩临界 Reω，CNATcrit
    pub c_nat_crit: f64,
    /// 间歇函数 f_INT 的常数 CINT
    pub c_int: f64,
    /// TS 波临界 Reω，CTScrit
    pub c_ts_crit: f64,
    /// 自然转捩率系数 CR,NAT
    pub c_r_nat: f64,
    /// 层流涡黏度的 TS 项系数 C11
    pub c11: f64,
    /// 层流涡黏度的近壁项系数 C12
    pub c12: f64,
    /// 旁路转捩率系数 CR
    pub c_r: f64,
    /// 剪切遮蔽常数 CSS
    pub c_ss: f64,
    /// 层流时间尺度阻尼常数 Cτ,1
    pub c_tau1: f64,
    /// ω 方程产生项系数 Cω1
    pub c_w1: f64,
    /// ω 方程耗散系数 Cω2
    pub c_w2: f64,
    /// ω 方程转捩产生系数 CωR
    pub c_w_r: f64,
    /// 有效长度尺度 λ_eff = min(Cλ·y, λT) 的 Cλ
    pub c_lambda: f64,
    /// β*
    pub beta_star: f64,
    /// k 扩散的 Prandtl 数 σk
    pub sigma_k: f64,
    /// ω 扩散的 Prandtl 数 σω
    pub sigma_w: f64,
    /// 交叉扩散系数 σω2
    pub sigma_w2: f64,
}

impl Default for Kv2OmegaCoeffs {
    fn default() -> Self {
        Self {
            a0: 4.04,
            a_s: 2.12,
            a_nu: 3.8,
            a_bp: 0.6,
            a_nat: 200.0,
            a_ts: 200.0,
            c_bp_crit: 1.5,
            c_nc: 0.1,
            c_nat_crit: 1450.0,
            c_int: 0.95,
            c_ts_crit: 1000.0,
            c_r_nat: 0.02,
            c11: 3.4e-6,
            c12: 1.0e-10,
            c_r: 0.32,
            c_ss: 3.0,
            c_tau1: 4360.0,
            c_w1: 0.44,
            c_w2: 0.92,
            c_w_r: 1.15,
            c_lambda: 2.495,
            beta_star: 0.09,
            sigma_k: 1.0,
            sigma_w: 1.17,
            sigma_w2: 1.856,
        }
    }
}

impl ClosureCoefficients for Kv2OmegaCoeffs {
    fn read_from(reader: &mut CoeffReader<'_>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            a0: reader.positive("A0", d.a0)?,
            a_s: reader.non_negative("AS", d.a_s)?,
            a_nu: reader.positive("Anu", d.a_nu)?,
            a_bp: reader.positive("ABP", d.a_bp)?,
            a_nat: reader.positive("ANAT", d.a_nat)?,
            a_ts: reader.positive("ATS", d.a_ts)?,
            c_bp_crit: reader.non_negative("CBPcrit", d.c_bp_crit)?,
            c_nc: reader.non_negative("CNC", d.c_nc)?,
            c_nat_crit: reader.non_negative("CNATcrit", d.c_nat_crit)?,
            c_int: reader.positive("CINT", d.c_int)?,
            c_ts_crit: reader.non_negative("CTScrit", d.c_ts_crit)?,
            c_r_nat: reader.non_negative("CRNAT", d.c_r_nat)?,
            c11: reader.non_negative("C11", d.c11)?,
            c12: reader.non_negative("C12", d.c12)?,
            c_r: reader.non_negative("CR", d.c_r)?,
            c_ss: reader.non_negative("CSS", d.c_ss)?,
            c_tau1: reader.non_negative("Ctau1", d.c_tau1)?,
            c_w1: reader.positive("Cw1", d.c_w1)?,
            c_w2: reader.positive("Cw2", d.c_w2)?,
            c_w_r: reader.positive("CwR", d.c_w_r)?,
            c_lambda: reader.positive("Clambda", d.c_lambda)?,
            beta_star: reader.positive("betaStar", d.beta_star)?,
            sigma_k: reader.positive("sigmaK", d.sigma_k)?,
            sigma_w: reader.positive("sigmaW", d.sigma_w)?,
            sigma_w2: reader.positive("sigmaW2", d.sigma_w2)?,
        })
    }

    fn to_dict(&self) -> CoeffDict {
        CoeffDict::new()
            .with_scalar("A0", self.a0)
            .with_scalar("AS", self.a_s)
            .with_scalar("Anu", self.a_nu)
            .with_scalar("ABP", self.a_bp)
            .with_scalar("ANAT", self.a_nat)
            .with_scalar("ATS", self.a_ts)
            .with_scalar("CBPcrit", self.c_bp_crit)
            .with_scalar("CNC", self.c_nc)
            .with_scalar("CNATcrit", self.c_nat_crit)
            .with_scalar("CINT", self.c_int)
            .with_scalar("CTScrit", self.c_ts_crit)
            .with_scalar("CRNAT", self.c_r_nat)
            .with_scalar("C11", self.c11)
            .with_scalar("C12", self.c12)
            .with_scalar("CR", self.c_r)
            .with_scalar("CSS", self.c_ss)
            .with_scalar("Ctau1", self.c_tau1)
            .with_scalar("Cw1", self.c_w1)
            .with_scalar("Cw2", self.c_w2)
            .with_scalar("CwR", self.c_w_r)
            .with_scalar("Clambda", self.c_lambda)
            .with_scalar("betaStar", self.beta_star)
            .with_scalar("sigmaK", self.sigma_k)
            .with_scalar("sigmaW", self.sigma_w)
            .with_scalar("sigmaW2", self.sigma_w2)
    }
}

impl Kv2OmegaCoeffs {
    /// F1 使用的混合参数（αω2 = 1/σω2）
    fn blending(&self) -> SstBlending {
        SstBlending {
            beta_star: self.beta_star,
            alpha_omega2: 1.0 / self.sigma_w2,
        }
    }
}

/// 单元中间量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kv2CellTerms {
    /// 有效长度尺度比 fW
    pub f_w: f64,
    /// 小尺度 v2
    pub v2s: f64,
    /// 湍流扩散系数 αT
    pub alpha_t: f64,
    /// 小尺度涡黏度
    pub nut_s: f64,
    /// 大尺度涡黏度
    pub nut_l: f64,
    /// 旁路转捩能量转移
    pub r_bp: f64,
    /// 自然转捩能量转移
    pub r_nat: f64,
}

impl Kv2CellTerms {
    /// 总涡黏度
    #[inline]
    pub fn nut(&self) -> f64 {
        self.nut_s + self.nut_l
    }
}

/// 逐单元计算中间量
#[allow(clippy::too_many_arguments)]
pub fn kv2_cell_terms(
    c: &Kv2OmegaCoeffs,
    k: f64,
    v2: f64,
    omega: f64,
    nu: f64,
    y: f64,
    mag_s: f64,
    mag_w: f64,
) -> Kv2CellTerms {
    let k = k.max(ROOT_VSMALL);
    let v2 = v2.max(0.0);
    let nu = nu.max(ROOT_VSMALL);
    let omega = omega.max(ROOT_VSMALL);
    let w = mag_w.max(RATE_FLOOR);
    let s = mag_s.max(RATE_FLOOR);
    let k_l = (k - v2).max(0.0);

    let lambda_t = k.sqrt() / omega;
    let lambda_eff = (c.c_lambda * y).min(lambda_t);
    let f_w = (lambda_eff / lambda_t).powf(2.0 / 3.0).max(ROOT_VSMALL);

    let v2s = shear_sheltering(c.c_ss, nu, mag_w, v2) * f_w * v2;
    let v2l = (v2 - v2s).max(0.0);

    let re_t = f_w * f_w * v2 / (nu * omega);
    let f_nu = 1.0 - (-re_t.sqrt() / c.a_nu).exp();
    let f_int = (v2 / (c.c_int * k)).min(1.0);
    let c_mu = 1.0 / (c.a0 + c.a_s * mag_s / omega);

    let alpha_t = f_nu * c_mu * v2s.sqrt() * lambda_eff;
    let nut_s = f_int * alpha_t;

    let re_omega = y * y * mag_w / nu;
    let f_tau_l = 1.0 - (-c.c_tau1 * v2l / (lambda_eff * lambda_eff * w * w).max(ROOT_VSMALL)).exp();
    let beta_ts = ts_onset(re_omega, c.c_ts_crit, c.a_ts);
    let nut_l = (f_tau_l * c.c11 * mag_w * lambda_eff * lambda_eff / nu * v2l.sqrt() * lambda_eff
        + beta_ts * c.c12 * re_omega * y * y * mag_w)
        .min(0.5 * (k_l + v2l) / s)
        .max(0.0);

    let phi_bp = (v2 / (nu * w) - c.c_bp_crit).max(0.0);
    let r_bp = c.c_r * growth(phi_bp, c.a_bp) * k_l * omega / f_w;

    let f_nat_crit = natural_crit_factor(k_l, y, nu, c.c_nc).max(ROOT_VSMALL);
    let phi_nat = (re_omega - c.c_nat_crit / f_nat_crit).max(0.0);
    let r_nat = c.c_r_nat * growth(phi_nat, c.a_nat) * k_l * mag_w;

    Kv2CellTerms {
        f_w,
        v2s,
        alpha_t,
        nut_s,
        nut_l,
        r_bp,
        r_nat,
    }
}

/// k-v2-ω 闭合
#[derive(Debug, Clone, Default)]
pub struct Kv2OmegaClosure {
    coeffs: Kv2OmegaCoeffs,
    /// ∇v2，每步开始时计算
    grad_v2: Vec<DVec3>,
}

/// k-v2-ω 模型
pub type Kv2Omega = RasModel<Kv2OmegaClosure>;

impl Kv2OmegaClosure {
    fn terms(&self, ctx: &ClosureContext<'_>, cell: usize) -> Kv2CellTerms {
        let kin = ctx.kin(cell);
        kv2_cell_terms(
            &self.coeffs,
            ctx.k(cell),
            ctx.v2(cell),
            ctx.omega(cell),
            ctx.nu(cell),
            ctx.y(cell),
            kin.mag_s,
            kin.mag_w,
        )
    }

    /// D(k)/k = ν|∇k|²/(2k²)
    #[inline]
    fn wall_dissipation_rate(nu: f64, grad: DVec3, phi: f64) -> f64 {
        let phi = phi.max(ROOT_VSMALL);
        nu * grad.length_squared() / (2.0 * phi * phi)
    }

    /// ω/v2
    #[inline]
    fn omega_by_v2(ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        ctx.omega(cell) / ctx.v2(cell).max(ctx.state.bounds.v2_min)
    }
}

impl TwoEquationClosure for Kv2OmegaClosure {
    type Coeffs = Kv2OmegaCoeffs;

    fn from_coefficients(coeffs: Kv2OmegaCoeffs) -> Self {
        Self {
            coeffs,
            grad_v2: Vec::new(),
        }
    }

    fn name(&self) -> &'static str {
        "kv2Omega"
    }

    fn layout(&self) -> StateLayout {
        StateLayout {
            v2: true,
            ..Default::default()
        }
    }

    fn coefficients(&self) -> &Kv2OmegaCoeffs {
        &self.coeffs
    }

    fn set_coefficients(&mut self, coeffs: Kv2OmegaCoeffs) {
        self.coeffs = coeffs;
    }

    fn begin_step(
        &mut self,
        mesh: &FvMesh,
        _flow: &MeanFlowState,
        state: &TurbulenceState,
        _kinematics: &[CellKinematics],
        _dt: f64,
    ) -> TcResult<()> {
        self.grad_v2 = match state.v2.as_ref() {
            Some(v2) => v2.gradient(mesh, &GreenGaussGradient::new()),
            None => vec![DVec3::ZERO; mesh.n_cells()],
        };
        Ok(())
    }

    fn blending(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.blending().f1(&ctx.blend_inputs(cell))
    }

    fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.terms(ctx, cell).alpha_t / self.coeffs.sigma_k + ctx.nu(cell)
    }

    fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.terms(ctx, cell).alpha_t / self.coeffs.sigma_w + ctx.nu(cell)
    }

    fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.terms(ctx, cell).nut() * ctx.kin(cell).s2
    }

    fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let k = ctx.k(cell);
        ctx.omega(cell) * ctx.v2(cell).min(k) / k
            + Self::wall_dissipation_rate(ctx.nu(cell), ctx.grad_k(cell), k)
    }

    fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        let t = self.terms(ctx, cell);
        let w_v2 = Self::omega_by_v2(ctx, cell);
        c.c_w1 * w_v2 * t.nut_s * ctx.kin(cell).s2
            + (c.c_w_r / t.f_w - 1.0).max(0.0) * w_v2 * (t.r_bp + t.r_nat)
    }

    fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.c_w2 * ctx.omega(cell)
    }

    fn omega_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        let inp = ctx.blend_inputs(cell);
        let cd = self.coeffs.blending().cd_k_omega(&inp);
        let omega = ctx.omega(cell);
        CellSource::sink((ctx.blend(cell) - 1.0) * cd / omega, omega)
    }

    fn extra_equations(&self) -> &'static [ExtraEquation] {
        &[ExtraEquation::V2]
    }

    fn extra_diffusivity(&self, eq: ExtraEquation, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        match eq {
            ExtraEquation::V2 => self.k_diffusivity(ctx, cell),
            ExtraEquation::Intermittency => 0.0,
        }
    }

    fn extra_source(
        &self,
        eq: ExtraEquation,
        ctx: &ClosureContext<'_>,
        cell: usize,
    ) -> CellSource {
        if eq != ExtraEquation::V2 {
            return CellSource::default();
        }
        let t = self.terms(ctx, cell);
        let v2 = ctx.v2(cell);
        let grad_v2 = self.grad_v2.get(cell).copied().unwrap_or(DVec3::ZERO);
        CellSource {
            su: t.nut_s * ctx.kin(cell).s2 + t.r_bp + t.r_nat,
            sp: ctx.omega(cell) + Self::wall_dissipation_rate(ctx.nu(cell), grad_v2, v2),
        }
    }

    fn eddy_viscosity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.terms(ctx, cell).nut()
    }

    /// ε = ω·min(k, v2) + D(k)
    fn epsilon(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let k = ctx.k(cell);
        ctx.omega(cell) * ctx.v2(cell).min(k)
            + k * Self::wall_dissipation_rate(ctx.nu(cell), ctx.grad_k(cell), k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        let c = Kv2OmegaCoeffs::default();
        let d = c.to_dict();
        assert_eq!(d.len(), 25);
        assert_eq!(Kv2OmegaCoeffs::from_dict(&d).unwrap(), c);
    }

    #[test]
    fn test_laminar_region_has_small_viscosity() {
        let c = Kv2OmegaCoeffs::default();
        // 近壁、低湍流度：v2 ≪ k
        let t = kv2_cell_terms(&c, 1e-6, 1e-10, 100.0, 1.5e-5, 1e-4, 100.0, 100.0);
        assert!(t.nut() >= 0.0);
        assert!(t.nut() < 1.5e-5);
        assert!(t.v2s <= 1e-10);
    }

    #[test]
    fn test_fully_turbulent_viscosity_positive() {
        let c = Kv2OmegaCoeffs::default();
        let t = kv2_cell_terms(&c, 1.0, 0.9, 10.0, 1e-5, 0.1, 10.0, 10.0);
        assert!(t.nut_s > 0.0);
        assert!((t.f_w - 1.0).abs() < 1e-12);
        assert!(t.alpha_t >= t.nut_s);
    }

    #[test]
    fn test_terms_finite_for_degenerate_input() {
        let c = Kv2OmegaCoeffs::default();
        for &(k, v2, w, s) in &[(0.0, 0.0, 0.0, 0.0), (1e-20, 1e-20, 1e-20, 1e8), (1.0, 2.0, 1.0, 0.0)] {
            let t = kv2_cell_terms(&c, k, v2, w, 1e-5, 1e-3, s, s);
            assert!(t.nut().is_finite() && t.nut() >= 0.0);
            assert!(t.r_bp.is_finite() && t.r_nat.is_finite());
        }
    }
}

// crates/tc_physics/src/turbulence/models/earsm_trans.rs

//! EARSM 与代数转捩模型耦合
//!
//! 系数固定（不混合），时间尺度带 Kolmogorov 下限
//! τ = max(1/(β*ω), Cτ·√(ν/(β*kω)))。k 方程产生项乘代数间歇因子
//! γ = max(f_SS, γ_BP)，见 [`algebraic_intermittency`]。

use crate::numerics::discretization::CellSource;
use crate::state::StateLayout;
use crate::turbulence::context::ClosureContext;
use crate::turbulence::correlations::{algebraic_intermittency, AlgebraicIntermittencyCoeffs};
use crate::turbulence::earsm_closure::{nonlinear_anisotropy, time_scale, EarsmResult};
use crate::turbulence::invariants::double_dot;
use crate::turbulence::rans_model::RasModel;
use crate::turbulence::traits::{ClosureCoefficients, TwoEquationClosure};
use glam::DMat3;
use tc_config::{CoeffDict, CoeffReader, ConfigError};

/// EARSMTrans 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarsmTransCoeffs {
    /// β*
    pub beta_star: f64,
    /// αK（σ*）
    pub alpha_k: f64,
    /// αω（σ）
    pub alpha_omega: f64,
    /// β
    pub beta: f64,
    /// 交叉扩散 σd
    pub sigma_d: f64,
    /// γ
    pub gamma: f64,
    /// Kolmogorov 时间尺度系数 Cτ
    pub c_tau: f64,
    /// 间歇因子关联式系数
    pub intermittency: AlgebraicIntermittencyCoeffs,
    /// 产生项限制器开关
    pub production_limiter: bool,
    /// 产生项限制倍数
    pub c1: f64,
}

impl Default for EarsmTransCoeffs {
    fn default() -> Self {
        Self {
            beta_star: 0.09,
            alpha_k: 1.01,
            alpha_omega: 0.5,
            beta: 0.075,
            sigma_d: 0.52,
            gamma: 5.0 / 9.0,
            c_tau: 6.0,
            intermittency: AlgebraicIntermittencyCoeffs {
                c_ss: 3.25,
                c_t: 14.5 / 8.0,
                a_t: 1.0,
            },
            production_limiter: false,
            c1: 10.0,
        }
    }
}

impl ClosureCoefficients for EarsmTransCoeffs {
    fn read_from(reader: &mut CoeffReader<'_>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            beta_star: reader.positive("betaStar", d.beta_star)?,
            alpha_k: reader.positive("alphaK", d.alpha_k)?,
            alpha_omega: reader.positive("alphaOmega", d.alpha_omega)?,
            beta: reader.positive("beta", d.beta)?,
            sigma_d: reader.non_negative("sigmaD", d.sigma_d)?,
            gamma: reader.positive("gamma", d.gamma)?,
            c_tau: reader.non_negative("Ctau", d.c_tau)?,
            intermittency: AlgebraicIntermittencyCoeffs {
                c_ss: reader.non_negative("CSS", d.intermittency.c_ss)?,
                c_t: reader.positive("CT", d.intermittency.c_t)?,
                a_t: reader.positive("AT", d.intermittency.a_t)?,
            },
            production_limiter: reader.switch("productionLimiter", d.production_limiter)?,
            c1: reader.positive("c1", d.c1)?,
        })
    }

    fn to_dict(&self) -> CoeffDict {
        CoeffDict::new()
            .with_scalar("betaStar", self.beta_star)
            .with_scalar("alphaK", self.alpha_k)
            .with_scalar("alphaOmega", self.alpha_omega)
            .with_scalar("beta", self.beta)
            .with_scalar("sigmaD", self.sigma_d)
            .with_scalar("gamma", self.gamma)
            .with_scalar("Ctau", self.c_tau)
            .with_scalar("CSS", self.intermittency.c_ss)
            .with_scalar("CT", self.intermittency.c_t)
            .with_scalar("AT", self.intermittency.a_t)
            .with_switch("productionLimiter", self.production_limiter)
            .with_scalar("c1", self.c1)
    }
}

/// EARSMTrans 闭合
#[derive(Debug, Clone, Default)]
pub struct EarsmTransClosure {
    coeffs: EarsmTransCoeffs,
}

/// EARSMTrans 模型
pub type EarsmTrans = RasModel<EarsmTransClosure>;

impl EarsmTransClosure {
    #[inline]
    fn tau(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        time_scale(
            ctx.k(cell),
            ctx.omega(cell),
            ctx.nu(cell),
            self.coeffs.beta_star,
            Some(self.coeffs.c_tau),
        )
    }

    fn closure_at(&self, ctx: &ClosureContext<'_>, cell: usize) -> EarsmResult {
        let kin = ctx.kin(cell);
        let tau = self.tau(ctx, cell);
        nonlinear_anisotropy(&(kin.s * tau), &(kin.w * tau))
    }

    /// 未乘间歇因子的 G
    fn g(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let kin = ctx.kin(cell);
        let r = self.closure_at(ctx, cell);
        let nut = r.cmu * ctx.k(cell) * self.tau(ctx, cell);
        nut * kin.s2 - ctx.k(cell) * double_dot(&r.anisotropy, &kin.s)
    }
}

impl TwoEquationClosure for EarsmTransClosure {
    type Coeffs = EarsmTransCoeffs;

    fn from_coefficients(coeffs: EarsmTransCoeffs) -> Self {
        Self { coeffs }
    }

    fn name(&self) -> &'static str {
        "EARSMTrans"
    }

    fn layout(&self) -> StateLayout {
        StateLayout {
            gamma: true,
            anisotropy: true,
            ..Default::default()
        }
    }

    fn coefficients(&self) -> &EarsmTransCoeffs {
        &self.coeffs
    }

    fn set_coefficients(&mut self, coeffs: EarsmTransCoeffs) {
        self.coeffs = coeffs;
    }

    fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.alpha_k * ctx.nut(cell) + ctx.nu(cell)
    }

    fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.alpha_omega * ctx.nut(cell) + ctx.nu(cell)
    }

    fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        let p = self.algebraic_intermittency(ctx, cell) * self.g(ctx, cell);
        if c.production_limiter {
            p.min(c.c1 * c.beta_star * ctx.k(cell) * ctx.omega(cell))
        } else {
            p
        }
    }

    fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta_star * ctx.omega(cell)
    }

    fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.gamma * ctx.omega(cell) / ctx.k(cell) * self.g(ctx, cell).max(0.0)
    }

    fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta * ctx.omega(cell)
    }

    fn k_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        CellSource::sink(2.0 / 3.0 * ctx.kin(cell).div_u, ctx.k(cell))
    }

    fn omega_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        let c = &self.coeffs;
        let omega = ctx.omega(cell);
        CellSource::explicit(c.sigma_d / omega * ctx.grad_k_dot_grad_omega(cell).max(0.0))
            + CellSource::sink(2.0 / 3.0 * c.gamma * ctx.kin(cell).div_u, omega)
    }

    fn has_algebraic_intermittency(&self) -> bool {
        true
    }

    fn algebraic_intermittency(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        algebraic_intermittency(
            ctx.k(cell),
            ctx.omega(cell),
            ctx.nu(cell),
            ctx.kin(cell).mag_w,
            &self.coeffs.intermittency,
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

    #[test]
    fn test_defaults() {
        let c = EarsmTransCoeffs::default();
        assert!((c.gamma - 0.5555555555555556).abs() < 1e-15);
        assert!((c.intermittency.c_t - 1.8125).abs() < 1e-15);
        assert_eq!(EarsmTransCoeffs::from_dict(&c.to_dict()).unwrap(), c);
    }

    #[test]
    fn test_layout() {
        let closure = EarsmTransClosure::default();
        let layout = closure.layout();
        assert!(layout.gamma && layout.anisotropy && !layout.v2);
        assert!(closure.extra_equations().is_empty());
        assert!(closure.has_algebraic_intermittency());
    }
}

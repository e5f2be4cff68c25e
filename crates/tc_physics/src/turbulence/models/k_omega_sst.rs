// crates/tc_physics/src/turbulence/models/k_omega_sst.rs

//! Menter k-ω SST 模型（2003 版）
//!
//! 内层（k-ω）与外层（k-ε 变换）系数由 F1 混合：
//!
//! ```text
//! φ = F1·φ1 + (1 − F1)·φ2,   φ ∈ {αK, αω, β, γ}
//! νt = a1·k / max(a1·ω, b1·F23·|S|)
//! Pk = min(G, c1·β*·k·ω)
//! Pω = γ·min(G/νt, c1/a1·β*·ω·max(a1·ω, b1·F23·|S|))
//! ```
//!
//! ω 方程含交叉扩散 (1 − F1)·CDkω。

use crate::numerics::discretization::CellSource;
use crate::state::StateLayout;
use crate::turbulence::blending::{blend, BlendInputs, SstBlending};
use crate::turbulence::context::ClosureContext;
use crate::turbulence::rans_model::RasModel;
use crate::turbulence::traits::{ClosureCoefficients, TwoEquationClosure};
use tc_config::{CoeffDict, CoeffReader, ConfigError};

/// SST 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SstCoeffs {
    /// αK1
    pub alpha_k1: f64,
    /// αK2
    pub alpha_k2: f64,
    /// αω1
    pub alpha_omega1: f64,
    /// αω2
    pub alpha_omega2: f64,
    /// β1
    pub beta1: f64,
    /// β2
    pub beta2: f64,
    /// β*
    pub beta_star: f64,
    /// γ1
    pub gamma1: f64,
    /// γ2
    pub gamma2: f64,
    /// a1
    pub a1: f64,
    /// b1
    pub b1: f64,
    /// c1
    pub c1: f64,
    /// 是否使用粗糙壁 F3
    pub f3: bool,
}

impl Default for SstCoeffs {
    fn default() -> Self {
        Self {
            alpha_k1: 0.85,
            alpha_k2: 1.0,
            alpha_omega1: 0.5,
            alpha_omega2: 0.856,
            beta1: 0.075,
            beta2: 0.0828,
            beta_star: 0.09,
            gamma1: 5.0 / 9.0,
            gamma2: 0.44,
            a1: 0.31,
            b1: 1.0,
            c1: 10.0,
            f3: false,
        }
    }
}

impl ClosureCoefficients for SstCoeffs {
    fn read_from(reader: &mut CoeffReader<'_>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            alpha_k1: reader.positive("alphaK1", d.alpha_k1)?,
            alpha_k2: reader.positive("alphaK2", d.alpha_k2)?,
            alpha_omega1: reader.positive("alphaOmega1", d.alpha_omega1)?,
            alpha_omega2: reader.positive("alphaOmega2", d.alpha_omega2)?,
            beta1: reader.positive("beta1", d.beta1)?,
            beta2: reader.positive("beta2", d.beta2)?,
            beta_star: reader.positive("betaStar", d.beta_star)?,
            gamma1: reader.positive("gamma1", d.gamma1)?,
            gamma2: reader.positive("gamma2", d.gamma2)?,
            a1: reader.positive("a1", d.a1)?,
            b1: reader.positive("b1", d.b1)?,
            c1: reader.positive("c1", d.c1)?,
            f3: reader.switch("F3", d.f3)?,
        })
    }

    fn to_dict(&self) -> CoeffDict {
        CoeffDict::new()
            .with_scalar("alphaK1", self.alpha_k1)
            .with_scalar("alphaK2", self.alpha_k2)
            .with_scalar("alphaOmega1", self.alpha_omega1)
            .with_scalar("alphaOmega2", self.alpha_omega2)
            .with_scalar("beta1", self.beta1)
            .with_scalar("beta2", self.beta2)
            .with_scalar("betaStar", self.beta_star)
            .with_scalar("gamma1", self.gamma1)
            .with_scalar("gamma2", self.gamma2)
            .with_scalar("a1", self.a1)
            .with_scalar("b1", self.b1)
            .with_scalar("c1", self.c1)
            .with_switch("F3", self.f3)
    }
}

impl SstCoeffs {
    /// 混合函数参数
    pub fn blending(&self) -> SstBlending {
        SstBlending {
            beta_star: self.beta_star,
            alpha_omega2: self.alpha_omega2,
        }
    }

    /// αK(F1)
    #[inline]
    pub fn alpha_k(&self, f1: f64) -> f64 {
        blend(f1, self.alpha_k1, self.alpha_k2)
    }

    /// αω(F1)
    #[inline]
    pub fn alpha_omega(&self, f1: f64) -> f64 {
        blend(f1, self.alpha_omega1, self.alpha_omega2)
    }

    /// β(F1)
    #[inline]
    pub fn beta(&self, f1: f64) -> f64 {
        blend(f1, self.beta1, self.beta2)
    }

    /// γ(F1)
    #[inline]
    pub fn gamma(&self, f1: f64) -> f64 {
        blend(f1, self.gamma1, self.gamma2)
    }

    /// max(a1·ω, b1·F23·|S|)
    #[inline]
    fn limiter(&self, inp: &BlendInputs, mag_s: f64) -> f64 {
        let f23 = self.blending().f23(inp, self.f3);
        (self.a1 * inp.omega).max(self.b1 * f23 * mag_s)
    }

    /// 应力限制涡黏度 νt = a1·k / max(a1·ω, b1·F23·|S|)
    pub fn eddy_viscosity(&self, inp: &BlendInputs, mag_s: f64) -> f64 {
        self.a1 * inp.k / self.limiter(inp, mag_s)
    }

    /// SST 的 k 产生项 min(G, c1·β*·k·ω)
    pub fn production_k(&self, inp: &BlendInputs, mag_s: f64, s2: f64) -> f64 {
        let g = self.eddy_viscosity(inp, mag_s) * s2;
        g.min(self.c1 * self.beta_star * inp.k * inp.omega)
    }

    /// SST 的 ω 产生项
    pub fn production_omega(&self, inp: &BlendInputs, f1: f64, mag_s: f64, s2: f64) -> f64 {
        let cap = self.c1 / self.a1 * self.beta_star * inp.omega * self.limiter(inp, mag_s);
        self.gamma(f1) * s2.min(cap)
    }

    /// ω 方程交叉扩散与压缩项
    pub fn omega_source(&self, inp: &BlendInputs, f1: f64, div_u: f64) -> CellSource {
        let cd = self.blending().cd_k_omega(inp);
        let omega = inp.omega;
        CellSource::sink(2.0 / 3.0 * self.gamma(f1) * div_u, omega)
            + CellSource::sink((f1 - 1.0) * cd / omega, omega)
    }
}

/// k-ω SST 闭合
#[derive(Debug, Clone, Default)]
pub struct KOmegaSstClosure {
    coeffs: SstCoeffs,
}

/// k-ω SST 模型
pub type KOmegaSst = RasModel<KOmegaSstClosure>;

impl TwoEquationClosure for KOmegaSstClosure {
    type Coeffs = SstCoeffs;

    fn from_coefficients(coeffs: SstCoeffs) -> Self {
        Self { coeffs }
    }

    fn name(&self) -> &'static str {
        "kOmegaSST"
    }

    fn layout(&self) -> StateLayout {
        StateLayout::default()
    }

    fn coefficients(&self) -> &SstCoeffs {
        &self.coeffs
    }

    fn set_coefficients(&mut self, coeffs: SstCoeffs) {
        self.coeffs = coeffs;
    }

    fn blending(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.blending().f1(&ctx.blend_inputs(cell))
    }

    fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.alpha_k(ctx.blend(cell)) * ctx.nut(cell) + ctx.nu(cell)
    }

    fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.alpha_omega(ctx.blend(cell)) * ctx.nut(cell) + ctx.nu(cell)
    }

    fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let kin = ctx.kin(cell);
        self.coeffs
            .production_k(&ctx.blend_inputs(cell), kin.mag_s, kin.s2)
    }

    fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta_star * ctx.omega(cell)
    }

    fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let kin = ctx.kin(cell);
        self.coeffs
            .production_omega(&ctx.blend_inputs(cell), ctx.blend(cell), kin.mag_s, kin.s2)
    }

    fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta(ctx.blend(cell)) * ctx.omega(cell)
    }

    fn k_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        CellSource::sink(2.0 / 3.0 * ctx.kin(cell).div_u, ctx.k(cell))
    }

    fn omega_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        self.coeffs
            .omega_source(&ctx.blend_inputs(cell), ctx.blend(cell), ctx.kin(cell).div_u)
    }

    fn eddy_viscosity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs
            .eddy_viscosity(&ctx.blend_inputs(cell), ctx.kin(cell).mag_s)
    }

    fn epsilon(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta_star * ctx.k(cell) * ctx.omega(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(y: f64) -> BlendInputs {
        BlendInputs {
            y,
            k: 1.0,
            omega: 1.0,
            nu: 1e-5,
            grad_k_dot_grad_omega: 0.0,
        }
    }

    #[test]
    fn test_blended_coefficients_at_limits() {
        let c = SstCoeffs::default();
        assert_eq!(c.alpha_k(1.0), c.alpha_k1);
        assert_eq!(c.alpha_k(0.0), c.alpha_k2);
        assert_eq!(c.beta(1.0), c.beta1);
        assert_eq!(c.gamma(0.0), c.gamma2);
    }

    #[test]
    fn test_limiter_inactive_in_weak_shear() {
        let c = SstCoeffs::default();
        // a1·ω = 0.31 > |S|·F23
        let nut = c.eddy_viscosity(&inputs(0.01), 0.1);
        assert!((nut - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_limiter_active_in_strong_shear() {
        let c = SstCoeffs::default();
        let inp = inputs(1e-3);
        let f2 = c.blending().f2(&inp);
        assert!(f2 > 0.999);
        let nut = c.eddy_viscosity(&inp, 10.0);
        assert!((nut - 0.31 / (10.0 * f2)).abs() < 1e-12);
    }

    #[test]
    fn test_production_cap() {
        let c = SstCoeffs::default();
        let p = c.production_k(&inputs(1e-3), 1e4, 1e8);
        assert!((p - c.c1 * c.beta_star).abs() < 1e-12);
    }

    #[test]
    fn test_dictionary_keys() {
        let d = SstCoeffs::default().to_dict();
        for key in ["alphaK1", "alphaOmega2", "betaStar", "a1", "b1", "c1", "F3"] {
            assert!(d.contains(key), "缺少 {}", key);
        }
        assert_eq!(SstCoeffs::from_dict(&d).unwrap(), SstCoeffs::default());
    }
}

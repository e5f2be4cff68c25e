// crates/tc_physics/src/turbulence/models/k_omega.rs

//! Wilcox k-ω 模型
//!
//! ```text
//! νt = k/ω
//! Dk/Dt = G − β*ωk + ∇·((ν + αK·νt)∇k)
//! Dω/Dt = γ·G·ω/k − βω² + ∇·((ν + αω·νt)∇ω)
//! ```
//!
//! G = νt·2S:S；开启 `productionLimiter` 时 k 方程中 G ≤ c1·β*·k·ω。

use crate::numerics::discretization::CellSource;
use crate::state::StateLayout;
use crate::turbulence::context::ClosureContext;
use crate::turbulence::rans_model::RasModel;
use crate::turbulence::traits::{ClosureCoefficients, TwoEquationClosure};
use tc_config::{CoeffDict, CoeffReader, ConfigError};

/// k-ω 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KOmegaCoeffs {
    /// αK
    pub alpha_k: f64,
    /// αω
    pub alpha_omega: f64,
    /// β
    pub beta: f64,
    /// β*
    pub beta_star: f64,
    /// γ
    pub gamma: f64,
    /// 产生项限制器开关
    pub production_limiter: bool,
    /// 产生项限制倍数
    pub c1: f64,
}

impl Default for KOmegaCoeffs {
    fn default() -> Self {
        Self {
            alpha_k: 0.5,
            alpha_omega: 0.5,
            beta: 0.072,
            beta_star: 0.09,
            gamma: 0.52,
            production_limiter: false,
            c1: 10.0,
        }
    }
}

impl ClosureCoefficients for KOmegaCoeffs {
    fn read_from(reader: &mut CoeffReader<'_>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            alpha_k: reader.positive("alphaK", d.alpha_k)?,
            alpha_omega: reader.positive("alphaOmega", d.alpha_omega)?,
            beta: reader.positive("beta", d.beta)?,
            beta_star: reader.positive("betaStar", d.beta_star)?,
            gamma: reader.positive("gamma", d.gamma)?,
            production_limiter: reader.switch("productionLimiter", d.production_limiter)?,
            c1: reader.positive("c1", d.c1)?,
        })
    }

    fn to_dict(&self) -> CoeffDict {
        CoeffDict::new()
            .with_scalar("alphaK", self.alpha_k)
            .with_scalar("alphaOmega", self.alpha_omega)
            .with_scalar("beta", self.beta)
            .with_scalar("betaStar", self.beta_star)
            .with_scalar("gamma", self.gamma)
            .with_switch("productionLimiter", self.production_limiter)
            .with_scalar("c1", self.c1)
    }
}

/// k-ω 闭合
#[derive(Debug, Clone, Default)]
pub struct KOmegaClosure {
    coeffs: KOmegaCoeffs,
}

/// k-ω 模型
pub type KOmega = RasModel<KOmegaClosure>;

impl KOmegaClosure {
    /// G = νt·2S:S
    #[inline]
    fn g(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.eddy_viscosity(ctx, cell) * ctx.kin(cell).s2
    }
}

impl TwoEquationClosure for KOmegaClosure {
    type Coeffs = KOmegaCoeffs;

    fn from_coefficients(coeffs: KOmegaCoeffs) -> Self {
        Self { coeffs }
    }

    fn name(&self) -> &'static str {
        "kOmega"
    }

    fn layout(&self) -> StateLayout {
        StateLayout::default()
    }

    fn coefficients(&self) -> &KOmegaCoeffs {
        &self.coeffs
    }

    fn set_coefficients(&mut self, coeffs: KOmegaCoeffs) {
        self.coeffs = coeffs;
    }

    fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.alpha_k * ctx.nut(cell) + ctx.nu(cell)
    }

    fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.alpha_omega * ctx.nut(cell) + ctx.nu(cell)
    }

    fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let g = self.g(ctx, cell);
        if self.coeffs.production_limiter {
            g.min(self.coeffs.c1 * self.coeffs.beta_star * ctx.k(cell) * ctx.omega(cell))
        } else {
            g
        }
    }

    fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta_star * ctx.omega(cell)
    }

    fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.gamma * self.g(ctx, cell) * ctx.omega(cell) / ctx.k(cell)
    }

    fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta * ctx.omega(cell)
    }

    fn k_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        CellSource::sink(2.0 / 3.0 * ctx.kin(cell).div_u, ctx.k(cell))
    }

    fn omega_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        CellSource::sink(
            2.0 / 3.0 * self.coeffs.gamma * ctx.kin(cell).div_u,
            ctx.omega(cell),
        )
    }

    fn eddy_viscosity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        ctx.k(cell) / ctx.omega(cell)
    }

    fn epsilon(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.beta_star * ctx.k(cell) * ctx.omega(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_round_trip() {
        let c = KOmegaCoeffs::default();
        assert_eq!(KOmegaCoeffs::from_dict(&c.to_dict()).unwrap(), c);
    }

    #[test]
    fn test_invalid_coefficient_rejected() {
        let dict = CoeffDict::new().with_scalar("beta", -1.0);
        assert!(KOmegaCoeffs::from_dict(&dict).is_err());
        let dict = CoeffDict::new().with_switch("betaStar", true);
        assert!(KOmegaCoeffs::from_dict(&dict).is_err());
    }

    #[test]
    fn test_override() {
        let dict = CoeffDict::new()
            .with_scalar("gamma", 0.5)
            .with_switch("productionLimiter", true);
        let c = KOmegaCoeffs::from_dict(&dict).unwrap();
        assert_eq!(c.gamma, 0.5);
        assert!(c.production_limiter);
        assert_eq!(c.beta, 0.072);
    }
}

// crates/tc_physics/src/turbulence/models/gamma_sst.rs

//! γ-SST 单方程转捩模型（Menter et al. 2015）
//!
//! 在 SST 基础上增加间歇因子 γ 的输运方程：
//!
//! ```text
//! Dγ/Dt = Pγ − Eγ + ∇·((ν + νt/σγ)∇γ)
//! Pγ = Flength·|S|·γ(1 − γ)·Fonset
//! Eγ = ca2·|W|·γ·Fturb·(ce2·γ − 1)
//! ```
//!
//! k 方程：产生项乘 γ 并加分离诱导项 Pk_lim，耗散乘 max(γ, 0.1)。
//! F1 取 max(F1, F3)，保证层流边界层内使用内层系数。

use super::k_omega_sst::SstCoeffs;
use crate::mesh::FvMesh;
use crate::numerics::discretization::CellSource;
use crate::numerics::gradient::GreenGaussGradient;
use crate::state::{MeanFlowState, StateLayout, TurbulenceState};
use crate::turbulence::blending::f1_transitional;
use crate::turbulence::context::{CellKinematics, ClosureContext};
use crate::turbulence::correlations::{
    f_onset, f_onset_lim, f_pg, f_turb, lambda_theta, re_theta_c, turbulence_intensity,
    turbulence_reynolds, vorticity_reynolds, CriticalReynoldsCoeffs, PressureGradientCoeffs,
};
use crate::turbulence::rans_model::RasModel;
use crate::turbulence::traits::{
    ClosureCoefficients, ExtraEquation, TurbulenceClosure, TwoEquationClosure,
};
use rayon::prelude::*;
use tc_config::{CoeffDict, CoeffReader, ConfigError};
use tc_foundation::{TcError, TcResult};

/// 耗散乘子下限
const GAMMA_DESTRUCTION_FLOOR: f64 = 0.1;

/// γ-SST 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GammaSstCoeffs {
    /// SST 基础系数
    pub sst: SstCoeffs,
    /// Flength
    pub f_length: f64,
    /// ca2
    pub ca2: f64,
    /// ce2
    pub ce2: f64,
    /// σγ
    pub sigma_gamma: f64,
    /// FPG 系数
    pub pressure_gradient: PressureGradientCoeffs,
    /// Reθc 系数
    pub critical_reynolds: CriticalReynoldsCoeffs,
    /// Reθc_lim
    pub re_theta_c_lim: f64,
    /// Ck
    pub c_k: f64,
    /// CSEP
    pub c_sep: f64,
}

impl Default for GammaSstCoeffs {
    fn default() -> Self {
        Self {
            sst: SstCoeffs::default(),
            f_length: 100.0,
            ca2: 0.06,
            ce2: 50.0,
            sigma_gamma: 1.0,
            pressure_gradient: PressureGradientCoeffs {
                cpg1: 14.68,
                cpg1_lim: 1.5,
                cpg2: -7.34,
                cpg3: 0.0,
                cpg2_lim: 3.0,
            },
            critical_reynolds: CriticalReynoldsCoeffs {
                ctu1: 100.0,
                ctu2: 1000.0,
                ctu3: 1.0,
            },
            re_theta_c_lim: 1100.0,
            c_k: 1.0,
            c_sep: 1.0,
        }
    }
}

impl ClosureCoefficients for GammaSstCoeffs {
    fn read_from(reader: &mut CoeffReader<'_>) -> Result<Self, ConfigError> {
        let d = Self::default();
        let pg = d.pressure_gradient;
        let cr = d.critical_reynolds;
        Ok(Self {
            sst: SstCoeffs::read_from(reader)?,
            f_length: reader.positive("Flength", d.f_length)?,
            ca2: reader.positive("ca2", d.ca2)?,
            ce2: reader.positive("ce2", d.ce2)?,
            sigma_gamma: reader.positive("sigmaGamma", d.sigma_gamma)?,
            pressure_gradient: PressureGradientCoeffs {
                cpg1: reader.scalar("CPG1", pg.cpg1)?,
                cpg1_lim: reader.non_negative("CPG1lim", pg.cpg1_lim)?,
                cpg2: reader.scalar("CPG2", pg.cpg2)?,
                cpg3: reader.scalar("CPG3", pg.cpg3)?,
                cpg2_lim: reader.non_negative("CPG2lim", pg.cpg2_lim)?,
            },
            critical_reynolds: CriticalReynoldsCoeffs {
                ctu1: reader.positive("CTU1", cr.ctu1)?,
                ctu2: reader.non_negative("CTU2", cr.ctu2)?,
                ctu3: reader.non_negative("CTU3", cr.ctu3)?,
            },
            re_theta_c_lim: reader.positive("ReThetacLim", d.re_theta_c_lim)?,
            c_k: reader.non_negative("Ck", d.c_k)?,
            c_sep: reader.non_negative("CSEP", d.c_sep)?,
        })
    }

    fn to_dict(&self) -> CoeffDict {
        let pg = &self.pressure_gradient;
        let cr = &self.critical_reynolds;
        let mut dict = self.sst.to_dict();
        dict.merge(
            &CoeffDict::new()
                .with_scalar("Flength", self.f_length)
                .with_scalar("ca2", self.ca2)
                .with_scalar("ce2", self.ce2)
                .with_scalar("sigmaGamma", self.sigma_gamma)
                .with_scalar("CPG1", pg.cpg1)
                .with_scalar("CPG1lim", pg.cpg1_lim)
                .with_scalar("CPG2", pg.cpg2)
                .with_scalar("CPG3", pg.cpg3)
                .with_scalar("CPG2lim", pg.cpg2_lim)
                .with_scalar("CTU1", cr.ctu1)
                .with_scalar("CTU2", cr.ctu2)
                .with_scalar("CTU3", cr.ctu3)
                .with_scalar("ReThetacLim", self.re_theta_c_lim)
                .with_scalar("Ck", self.c_k)
                .with_scalar("CSEP", self.c_sep),
        );
        dict
    }
}

/// γ-SST 闭合
#[derive(Debug, Clone, Default)]
pub struct GammaSstClosure {
    coeffs: GammaSstCoeffs,
    /// 壁面法向速度导数 dV/dy，每步开始时计算
    dv_dy: Vec<f64>,
}

/// γ-SST 模型
pub type GammaSst = RasModel<GammaSstClosure>;

impl GammaSst {
    /// 湍流雷诺数 Rt = k/(νω)
    pub fn turbulence_reynolds(&self, flow: &MeanFlowState) -> TcResult<Vec<f64>> {
        let state = self.state();
        TcError::check_size("nu", state.n_cells(), flow.nu.len())?;
        Ok(state
            .k
            .values()
            .par_iter()
            .zip(state.omega.values().par_iter())
            .zip(flow.nu.par_iter())
            .map(|((&k, &w), &nu)| turbulence_reynolds(k, w, nu))
            .collect())
    }
}

impl GammaSstClosure {
    #[inline]
    fn gamma(ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        ctx.gamma(cell).max(0.0).min(1.0)
    }

    /// 分离诱导产生项 Pk_lim
    fn production_lim(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        let kin = ctx.kin(cell);
        let nu = ctx.nu(cell);
        let gamma = Self::gamma(ctx, cell);
        let re_v = vorticity_reynolds(ctx.y(cell), kin.mag_s, nu);
        let f_lim = f_onset_lim(re_v, c.re_theta_c_lim);
        let nut = self.eddy_viscosity(ctx, cell);
        5.0 * c.c_k
            * (gamma - 0.2).max(0.0)
            * (1.0 - gamma)
            * f_lim
            * (3.0 * c.c_sep * nu - nut).max(0.0)
            * kin.mag_s
            * kin.mag_w
    }

    /// 转捩起始函数 Fonset
    fn onset(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let c = &self.coeffs;
        let y = ctx.y(cell);
        let nu = ctx.nu(cell);
        let k = ctx.k(cell);
        let omega = ctx.omega(cell);
        let dv_dy = self.dv_dy.get(cell).copied().unwrap_or(0.0);

        let tu_l = turbulence_intensity(k, omega, y);
        let fpg = f_pg(lambda_theta(dv_dy, y, nu), &c.pressure_gradient);
        let re_theta_c = re_theta_c(tu_l, fpg, &c.critical_reynolds);
        let re_v = vorticity_reynolds(y, ctx.kin(cell).mag_s, nu);
        f_onset(re_v, re_theta_c, turbulence_reynolds(k, omega, nu))
    }
}

impl TwoEquationClosure for GammaSstClosure {
    type Coeffs = GammaSstCoeffs;

    fn from_coefficients(coeffs: GammaSstCoeffs) -> Self {
        Self {
            coeffs,
            dv_dy: Vec::new(),
        }
    }

    fn name(&self) -> &'static str {
        "gammaSST"
    }

    fn layout(&self) -> StateLayout {
        StateLayout {
            gamma: true,
            ..Default::default()
        }
    }

    fn coefficients(&self) -> &GammaSstCoeffs {
        &self.coeffs
    }

    fn set_coefficients(&mut self, coeffs: GammaSstCoeffs) {
        self.coeffs = coeffs;
    }

    fn begin_step(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        _state: &TurbulenceState,
        _kinematics: &[CellKinematics],
        _dt: f64,
    ) -> TcResult<()> {
        let grad_speed = flow.speed_gradient(mesh);
        let grad_y = GreenGaussGradient::new().scalar(mesh, &flow.wall_distance, |face, y| {
            if mesh.is_wall_face(face) {
                0.0
            } else {
                y
            }
        });
        self.dv_dy = grad_speed
            .par_iter()
            .zip(grad_y.par_iter())
            .map(|(gu, gy)| gu.dot(gy.normalize_or_zero()))
            .collect();
        Ok(())
    }

    fn blending(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let inp = ctx.blend_inputs(cell);
        f1_transitional(self.coeffs.sst.blending().f1(&inp), &inp)
    }

    fn k_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.sst.alpha_k(ctx.blend(cell)) * ctx.nut(cell) + ctx.nu(cell)
    }

    fn omega_diffusivity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.sst.alpha_omega(ctx.blend(cell)) * ctx.nut(cell) + ctx.nu(cell)
    }

    fn production_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let kin = ctx.kin(cell);
        let p = self
            .coeffs
            .sst
            .production_k(&ctx.blend_inputs(cell), kin.mag_s, kin.s2);
        Self::gamma(ctx, cell) * p + self.production_lim(ctx, cell)
    }

    fn destruction_k(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        Self::gamma(ctx, cell).max(GAMMA_DESTRUCTION_FLOOR)
            * self.coeffs.sst.beta_star
            * ctx.omega(cell)
    }

    fn production_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        let kin = ctx.kin(cell);
        self.coeffs.sst.production_omega(
            &ctx.blend_inputs(cell),
            ctx.blend(cell),
            kin.mag_s,
            kin.s2,
        )
    }

    fn destruction_omega(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.sst.beta(ctx.blend(cell)) * ctx.omega(cell)
    }

    fn k_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        CellSource::sink(2.0 / 3.0 * ctx.kin(cell).div_u, ctx.k(cell))
    }

    fn omega_source(&self, ctx: &ClosureContext<'_>, cell: usize) -> CellSource {
        self.coeffs
            .sst
            .omega_source(&ctx.blend_inputs(cell), ctx.blend(cell), ctx.kin(cell).div_u)
    }

    fn extra_equations(&self) -> &'static [ExtraEquation] {
        &[ExtraEquation::Intermittency]
    }

    fn extra_diffusivity(&self, eq: ExtraEquation, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        match eq {
            ExtraEquation::Intermittency => {
                ctx.nut(cell) / self.coeffs.sigma_gamma + ctx.nu(cell)
            }
            ExtraEquation::V2 => 0.0,
        }
    }

    /// Pγ − Eγ 按 γ 线性化：显式部分 (cp + ce)·γ，隐式部分 (cp + ce·ce2)·γ
    fn extra_source(
        &self,
        eq: ExtraEquation,
        ctx: &ClosureContext<'_>,
        cell: usize,
    ) -> CellSource {
        if eq != ExtraEquation::Intermittency {
            return CellSource::default();
        }
        let c = &self.coeffs;
        let kin = ctx.kin(cell);
        let gamma = Self::gamma(ctx, cell);
        let r_t = turbulence_reynolds(ctx.k(cell), ctx.omega(cell), ctx.nu(cell));

        let cp = c.f_length * kin.mag_s * self.onset(ctx, cell);
        let ce = c.ca2 * kin.mag_w * f_turb(r_t);
        CellSource {
            su: (cp + ce) * gamma,
            sp: (cp + ce * c.ce2) * gamma,
        }
    }

    fn eddy_viscosity(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs
            .sst
            .eddy_viscosity(&ctx.blend_inputs(cell), ctx.kin(cell).mag_s)
    }

    fn epsilon(&self, ctx: &ClosureContext<'_>, cell: usize) -> f64 {
        self.coeffs.sst.beta_star * ctx.k(cell) * ctx.omega(cell)
    }
}

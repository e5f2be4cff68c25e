// crates/tc_physics/src/turbulence/correlations.rs

//! 转捩/间歇因子经验关联式
//!
//! 无状态纯函数，输入在求值前截断到各关联式的有效区间（见 `*_RANGE` 常量），
//! 防止外推时溢出。
//!
//! # 分组
//!
//! - γ-SST（Menter 2015）：TuL、λθL、FPG、Reθc、Fonset、Fturb
//! - 代数间歇因子（EARSMTrans）：剪切遮蔽 + 旁路转捩
//! - k-v2-ω（Lopez & Walters 2016）：T-S 不稳定、自然转捩临界因子

use tc_foundation::ROOT_VSMALL;

// =============================================================================
// 有效区间
// =============================================================================

/// 局部湍流度 TuL [%]
pub const TU_L_RANGE: (f64, f64) = (0.0, 100.0);
/// 压力梯度参数 λθL
pub const LAMBDA_THETA_RANGE: (f64, f64) = (-1.0, 1.0);
/// Fonset1 上限
pub const FONSET1_MAX: f64 = 2.0;
/// Fonset_lim 上限
pub const FONSET_LIM_MAX: f64 = 3.0;
/// 湍流雷诺数 RT = k/(νω)
pub const R_T_RANGE: (f64, f64) = (0.0, 1e12);
/// 涡量雷诺数 Rev = d²S/ν
pub const RE_V_RANGE: (f64, f64) = (0.0, 1e12);
/// λθL 公式中的偏移
const LAMBDA_OFFSET: f64 = 0.0681;

#[inline]
fn clip(value: f64, range: (f64, f64)) -> f64 {
    // NaN 落到下限
    value.max(range.0).min(range.1)
}

// =============================================================================
// γ-SST
// =============================================================================

/// FPG 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureGradientCoeffs {
    /// CPG1
    pub cpg1: f64,
    /// CPG1lim
    pub cpg1_lim: f64,
    /// CPG2
    pub cpg2: f64,
    /// CPG3
    pub cpg3: f64,
    /// CPG2lim
    pub cpg2_lim: f64,
}

/// Reθc 系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalReynoldsCoeffs {
    /// CTU1
    pub ctu1: f64,
    /// CTU2
    pub ctu2: f64,
    /// CTU3
    pub ctu3: f64,
}

/// 局部湍流度 TuL = min(100√(2k/3)/(ωd), 100)
pub fn turbulence_intensity(k: f64, omega: f64, d: f64) -> f64 {
    let tu = 100.0 * (2.0 * k.max(0.0) / 3.0).sqrt() / (omega * d).max(ROOT_VSMALL);
    clip(tu, TU_L_RANGE)
}

/// 压力梯度参数 λθL = −7.57e-3·(dV/dy)·d²/ν + 0.0128
pub fn lambda_theta(dv_dy: f64, d: f64, nu: f64) -> f64 {
    let lambda = -7.57e-3 * dv_dy * d * d / nu.max(ROOT_VSMALL) + 0.0128;
    clip(lambda, LAMBDA_THETA_RANGE)
}

/// 压力梯度函数 FPG(λθL) ≥ 0
pub fn f_pg(lambda: f64, c: &PressureGradientCoeffs) -> f64 {
    let lambda = clip(lambda, LAMBDA_THETA_RANGE);
    let fpg = if lambda >= 0.0 {
        (1.0 + c.cpg1 * lambda).min(c.cpg1_lim)
    } else {
        (1.0 + c.cpg2 * lambda + c.cpg3 * (lambda + LAMBDA_OFFSET).min(0.0)).min(c.cpg2_lim)
    };
    fpg.max(0.0)
}

/// 临界动量厚度雷诺数 Reθc = CTU1 + CTU2·exp(−CTU3·TuL·FPG)
pub fn re_theta_c(tu_l: f64, fpg: f64, c: &CriticalReynoldsCoeffs) -> f64 {
    let tu_l = clip(tu_l, TU_L_RANGE);
    c.ctu1 + c.ctu2 * (-c.ctu3 * tu_l * fpg.max(0.0)).exp()
}

/// 涡量雷诺数 Rev = d²S/ν
pub fn vorticity_reynolds(d: f64, strain: f64, nu: f64) -> f64 {
    clip(d * d * strain / nu.max(ROOT_VSMALL), RE_V_RANGE)
}

/// 湍流雷诺数 RT = k/(νω)
pub fn turbulence_reynolds(k: f64, omega: f64, nu: f64) -> f64 {
    clip(k / (nu * omega).max(ROOT_VSMALL), R_T_RANGE)
}

/// 转捩起始函数
///
/// ```text
/// Fonset1 = Rev/(2.2Reθc)
/// Fonset2 = min(Fonset1, 2)
/// Fonset3 = max(1 − (RT/3.5)³, 0)
/// Fonset  = max(Fonset2 − Fonset3, 0)
/// ```
pub fn f_onset(re_v: f64, re_theta_c: f64, r_t: f64) -> f64 {
    let re_v = clip(re_v, RE_V_RANGE);
    let r_t = clip(r_t, R_T_RANGE);
    let f1 = re_v / (2.2 * re_theta_c).max(ROOT_VSMALL);
    let f2 = f1.min(FONSET1_MAX);
    let f3 = (1.0 - (r_t / 3.5).powi(3)).max(0.0);
    (f2 - f3).max(0.0)
}

/// 湍流衰减函数 Fturb = exp(−(RT/2)⁴)
pub fn f_turb(r_t: f64) -> f64 {
    let r_t = clip(r_t, R_T_RANGE);
    (-(r_t / 2.0).powi(4)).exp()
}

/// 分离诱导转捩起始函数 Fonset_lim = min(max(Rev/(2.2Reθc_lim) − 1, 0), 3)
pub fn f_onset_lim(re_v: f64, re_theta_c_lim: f64) -> f64 {
    let re_v = clip(re_v, RE_V_RANGE);
    (re_v / (2.2 * re_theta_c_lim).max(ROOT_VSMALL) - 1.0)
        .max(0.0)
        .min(FONSET_LIM_MAX)
}

// =============================================================================
// 代数间歇因子
// =============================================================================

/// 代数间歇因子系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlgebraicIntermittencyCoeffs {
    /// 剪切遮蔽系数 CSS
    pub c_ss: f64,
    /// 旁路转捩阈值 CT
    pub c_t: f64,
    /// 旁路转捩增长率 AT
    pub a_t: f64,
}

/// 剪切遮蔽函数 f_SS = exp(−(CSS·νΩ/e)²)，e 为湍流能量尺度
pub fn shear_sheltering(c_ss: f64, nu: f64, vorticity: f64, energy: f64) -> f64 {
    let arg = c_ss * nu * vorticity.abs() / energy.max(ROOT_VSMALL);
    (-(arg * arg)).exp()
}

/// 代数间歇因子
///
/// ```text
/// φ_BP = max(RT/CT − 1, 0)
/// γ_BP = min(AT·φ_BP, 1)
/// γ    = clamp(max(f_SS, γ_BP), 0, 1)
/// ```
pub fn algebraic_intermittency(
    k: f64,
    omega: f64,
    nu: f64,
    vorticity: f64,
    c: &AlgebraicIntermittencyCoeffs,
) -> f64 {
    let r_t = turbulence_reynolds(k, omega, nu);
    let f_ss = shear_sheltering(c.c_ss, nu, vorticity, k);
    let phi_bp = (r_t / c.c_t - 1.0).max(0.0);
    let gamma_bp = (c.a_t * phi_bp).min(1.0);
    f_ss.max(gamma_bp).max(0.0).min(1.0)
}

// =============================================================================
// k-v2-ω
// =============================================================================

/// Tollmien-Schlichting 起始函数 βTS = 1 − exp(−max(ReΩ − CTScrit, 0)²/ATS)
pub fn ts_onset(re_omega: f64, c_ts_crit: f64, a_ts: f64) -> f64 {
    let re_omega = clip(re_omega, RE_V_RANGE);
    let excess = (re_omega - c_ts_crit).max(0.0);
    1.0 - (-(excess * excess) / a_ts.max(ROOT_VSMALL)).exp()
}

/// 自然转捩临界因子 fNATcrit = 1 − exp(−CNC·√kL·d/ν)
pub fn natural_crit_factor(k_l: f64, d: f64, nu: f64, c_nc: f64) -> f64 {
    1.0 - (-c_nc * k_l.max(0.0).sqrt() * d / nu.max(ROOT_VSMALL)).exp()
}

/// 增长型转捩函数 1 − exp(−φ/A)，φ ≥ 0
#[inline]
pub fn growth(phi: f64, a: f64) -> f64 {
    1.0 - (-phi.max(0.0) / a.max(ROOT_VSMALL)).exp()
}

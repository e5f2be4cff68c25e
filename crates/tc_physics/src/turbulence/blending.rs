// crates/tc_physics/src/turbulence/blending.rs

//! 混合函数
//!
//! SST 型近壁/远场切换函数与系数线性混合。所有开关函数输出在 [0, 1]，
//! 壁面附近为 1（内层系数），远场为 0（外层系数）。
//!
//! # 输入保护
//!
//! 壁面距离、ω 以下限截断，k 取非负值，保证各子参数不除零。

use tc_foundation::ROOT_VSMALL;

/// 交叉扩散下限
pub const CD_K_OMEGA_FLOOR: f64 = 1e-10;
/// F1 参数上限
pub const ARG1_MAX: f64 = 10.0;
/// F2 参数上限
pub const ARG2_MAX: f64 = 100.0;
/// F3 参数上限
pub const ARG3_MAX: f64 = 10.0;
/// 壁面距离下限 [m]
pub const Y_FLOOR: f64 = 1e-12;
/// 壁面距离上限 [m]
pub const Y_CEIL: f64 = 1e30;

/// 线性混合 `F·(inner − outer) + outer`
///
/// F ≥ 1 与 F ≤ 0 时精确返回端点值，且 `blend(F, a, a) == a`。
#[inline]
pub fn blend(f: f64, inner: f64, outer: f64) -> f64 {
    if f >= 1.0 {
        inner
    } else if f <= 0.0 || inner == outer {
        outer
    } else {
        f * (inner - outer) + outer
    }
}

/// 对混合场逐单元混合
pub fn blend_field(f: &[f64], inner: f64, outer: f64) -> Vec<f64> {
    f.iter().map(|&fi| blend(fi, inner, outer)).collect()
}

/// 混合函数的局部输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendInputs {
    /// 壁面距离 [m]
    pub y: f64,
    /// 湍动能 [m²/s²]
    pub k: f64,
    /// 比耗散率 [1/s]
    pub omega: f64,
    /// 分子黏度 [m²/s]
    pub nu: f64,
    /// ∇k·∇ω
    pub grad_k_dot_grad_omega: f64,
}

impl BlendInputs {
    #[inline]
    fn guarded(&self) -> (f64, f64, f64, f64) {
        let y = self.y.max(Y_FLOOR).min(Y_CEIL);
        let omega = self.omega.max(ROOT_VSMALL);
        let sqrt_k = self.k.max(0.0).sqrt();
        (y, omega, sqrt_k, self.nu.max(0.0))
    }
}

/// SST 混合函数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SstBlending {
    /// β*
    pub beta_star: f64,
    /// αω2
    pub alpha_omega2: f64,
}

impl SstBlending {
    /// 交叉扩散 CDkω = 2αω2 (∇k·∇ω)/ω
    #[inline]
    pub fn cd_k_omega(&self, inp: &BlendInputs) -> f64 {
        2.0 * self.alpha_omega2 * inp.grad_k_dot_grad_omega / inp.omega.max(ROOT_VSMALL)
    }

    /// F1 = tanh(arg1⁴)
    pub fn f1(&self, inp: &BlendInputs) -> f64 {
        let (y, omega, sqrt_k, nu) = self.guard(inp);
        let cd_plus = self.cd_k_omega(inp).max(CD_K_OMEGA_FLOOR);
        let arg1 = (sqrt_k / (self.beta_star * omega * y))
            .max(500.0 * nu / (y * y * omega))
            .min(4.0 * self.alpha_omega2 * sqrt_k * sqrt_k / (cd_plus * y * y))
            .min(ARG1_MAX);
        arg1.powi(4).tanh()
    }

    /// F2 = tanh(arg2²)
    pub fn f2(&self, inp: &BlendInputs) -> f64 {
        let (y, omega, sqrt_k, nu) = self.guard(inp);
        let arg2 = (2.0 * sqrt_k / (self.beta_star * omega * y))
            .max(500.0 * nu / (y * y * omega))
            .min(ARG2_MAX);
        (arg2 * arg2).tanh()
    }

    /// F3 = 1 − tanh(arg3⁴)（粗糙壁修正）
    pub fn f3(&self, inp: &BlendInputs) -> f64 {
        let (y, omega, _, nu) = self.guard(inp);
        let arg3 = (150.0 * nu / (omega * y * y)).min(ARG3_MAX);
        1.0 - arg3.powi(4).tanh()
    }

    /// F23 = F2 或 F2·F3
    pub fn f23(&self, inp: &BlendInputs, use_f3: bool) -> f64 {
        let f2 = self.f2(inp);
        if use_f3 {
            f2 * self.f3(inp)
        } else {
            f2
        }
    }

    #[inline]
    fn guard(&self, inp: &BlendInputs) -> (f64, f64, f64, f64) {
        inp.guarded()
    }
}

/// 转捩修正 F1 = max(F1_orig, exp(−(Ry/120)⁸))，Ry = y√k/ν
pub fn f1_transitional(f1: f64, inp: &BlendInputs) -> f64 {
    let (y, _, sqrt_k, nu) = inp.guarded();
    let ry = y * sqrt_k / nu.max(ROOT_VSMALL);
    let f3 = (-(ry / 120.0).powi(8)).exp();
    f1.max(f3)
}

/// Hellsten EARSM 混合函数 fMix = tanh(1.5Γ⁴)
///
/// ```text
/// Γ  = min(max(Γ1, Γ2), Γ3)
/// Γ1 = √k/(β*ωy)
/// Γ2 = 500ν/(ωy²)
/// Γ3 = 20k/max(y²(∇k·∇ω)/ω, 200 k_inf)
/// ```
pub fn earsm_f_mix(inp: &BlendInputs, beta_star: f64, k_inf: f64) -> f64 {
    let (y, omega, sqrt_k, nu) = inp.guarded();
    let gamma1 = sqrt_k / (beta_star * omega * y);
    let gamma2 = 500.0 * nu / (omega * y * y);
    let cross = y * y * inp.grad_k_dot_grad_omega / omega;
    let gamma3 = 20.0 * sqrt_k * sqrt_k / cross.max(200.0 * k_inf).max(ROOT_VSMALL);
    let gamma = gamma1.max(gamma2).min(gamma3);
    (1.5 * gamma.powi(4)).tanh()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SST: SstBlending = SstBlending {
        beta_star: 0.09,
        alpha_omega2: 0.856,
    };

    fn inputs(y: f64, k: f64, omega: f64) -> BlendInputs {
        BlendInputs {
            y,
            k,
            omega,
            nu: 1.5e-5,
            grad_k_dot_grad_omega: 0.3,
        }
    }

    #[test]
    fn test_blend_endpoints_exact() {
        let inner = 0.1 + 0.2;
        let outer = 1.0 / 3.0;
        assert_eq!(blend(1.0, inner, outer), inner);
        assert_eq!(blend(0.0, inner, outer), outer);
        assert_eq!(blend(1.5, inner, outer), inner);
        assert_eq!(blend(-0.5, inner, outer), outer);
    }

    #[test]
    fn test_blend_degenerate_idempotent() {
        for f in [0.0, 0.123456789, 0.5, 0.999, 1.0] {
            for a in [0.0, 1e-300, 0.075, 1.0 / 3.0, -7.25, 1e300] {
                assert_eq!(blend(f, a, a), a);
            }
        }
    }

    #[test]
    fn test_blend_midpoint() {
        assert!((blend(0.5, 1.0, 3.0) - 2.0).abs() < 1e-15);
        assert_eq!(blend_field(&[0.0, 1.0], 4.0, 2.0), vec![2.0, 4.0]);
    }

    #[test]
    fn test_near_wall_and_far_field() {
        // 近壁：F1 → 1
        let near = inputs(1e-6, 1e-3, 1e4);
        assert!(SST.f1(&near) > 0.999);
        assert!(SST.f2(&near) > 0.999);
        // 远场：F1 → 0
        let far = inputs(10.0, 1e-6, 1e-2);
        assert!(SST.f1(&far) < 1e-3);
    }

    #[test]
    fn test_range_for_extreme_inputs() {
        for y in [0.0, 1e-30, 1e-6, 1.0, 1e6, f64::INFINITY] {
            for k in [0.0, -1.0, 1e-20, 1.0, 1e10] {
                for omega in [0.0, 1e-30, 1.0, 1e12] {
                    let inp = inputs(y, k, omega);
                    for f in [
                        SST.f1(&inp),
                        SST.f2(&inp),
                        SST.f3(&inp),
                        earsm_f_mix(&inp, 0.09, 1e-10),
                        f1_transitional(SST.f1(&inp), &inp),
                    ] {
                        assert!((0.0..=1.0).contains(&f), "f = {}", f);
                    }
                }
            }
        }
    }

    #[test]
    fn test_f_mix_limits() {
        assert!(earsm_f_mix(&inputs(1e-6, 1e-3, 1e4), 0.09, 1e-10) > 0.999);
        assert!(earsm_f_mix(&inputs(10.0, 1e-6, 1e-2), 0.09, 1e-10) < 1e-3);
    }
}

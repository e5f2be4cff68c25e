// crates/tc_physics/src/turbulence/earsm_closure.rs

//! 显式代数雷诺应力闭合（Wallin-Johansson / Hellsten）
//!
//! 无量纲张量 S̃ = τ·S、W̃ = τ·W，τ 为湍流时间尺度。
//! 闭合乘子 N 满足二维三次方程
//!
//! ```text
//! N³ − A3'·N² − (27/10·II_S + 2·II_W)·N + 2·A3'·II_W = 0
//! ```
//!
//! 取与平衡态连续相连的实根（Cardano 公式，P2 < 0 时改用三角形式）。
//! 各向异性
//!
//! ```text
//! a = β1·S̃ + β3·T3 + β4·T4 + β6·T6 + β9·T9
//! Cμ = −½(β1 + II_W·β6)，a^(ex) = a − β1·S̃ 中除线性部分外的项
//! ```
//!
//! 曲率修正：W* = W̃ − w_c·τ·Ω^(r)/A0，Ω^(r) = (S·Ṡ − Ṡ·S)/(2·II_S)。

use super::invariants::{dev, dev_symm, trace, BasisTensors, Invariants};
use glam::DMat3;
use tc_foundation::ROOT_VSMALL;

/// 平衡态 N
pub const N_EQUILIBRIUM: f64 = 81.0 / 20.0;
/// Hellsten 扩散修正系数
pub const C_DIFF: f64 = 2.2;
/// Q 的下限
pub const Q_FLOOR: f64 = 1e-12;
/// N 的下限（保证 β3 有界）
pub const N_FLOOR: f64 = 1e-6;
/// 曲率修正中 II_S 的下限 [1/s²]
pub const CURVATURE_STRAIN_FLOOR: f64 = 1e-10;

// =============================================================================
// 闭合乘子
// =============================================================================

/// Hellsten 修正的 A3'
///
/// A3' = 9/5 + 9/4·C_diff·max(1 + β1_eq·II_S, 0)，β1_eq = −6/5·N_eq/(N_eq² − 2·II_W)
pub fn a3_prime(ii_s: f64, ii_w: f64) -> f64 {
    let beta1_eq = -1.2 * N_EQUILIBRIUM / (N_EQUILIBRIUM * N_EQUILIBRIUM - 2.0 * ii_w);
    1.8 + 2.25 * C_DIFF * (1.0 + beta1_eq * ii_s).max(0.0)
}

/// 求解闭合乘子 N
///
/// 退化（非有限）时回退到零不变量极限 N = A3'。
pub fn solve_n(a3p: f64, ii_s: f64, ii_w: f64) -> f64 {
    let p1 = (a3p * a3p / 27.0 + 0.45 * ii_s - 2.0 / 3.0 * ii_w) * a3p;
    let r = a3p * a3p / 9.0 + 0.9 * ii_s + 2.0 / 3.0 * ii_w;
    let p2 = p1 * p1 - r * r * r;

    let n = if p2 >= 0.0 {
        let sq = p2.sqrt();
        a3p / 3.0 + (p1 + sq).cbrt() + (p1 - sq).cbrt()
    } else {
        let m = p1 * p1 - p2;
        let arg = (p1 / m.sqrt()).clamp(-1.0, 1.0);
        a3p / 3.0 + 2.0 * m.powf(1.0 / 6.0) * (arg.acos() / 3.0).cos()
    };

    if n.is_finite() {
        n.max(N_FLOOR)
    } else {
        a3p
    }
}

// =============================================================================
// β 系数
// =============================================================================

/// 各向异性展开系数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarsmCoefficients {
    /// 闭合乘子
    pub n: f64,
    /// β1
    pub beta1: f64,
    /// β3
    pub beta3: f64,
    /// β4
    pub beta4: f64,
    /// β6
    pub beta6: f64,
    /// β9
    pub beta9: f64,
    /// 等效 Cμ = −½(β1 + II_W·β6)
    pub cmu: f64,
}

impl EarsmCoefficients {
    /// 由 N 与不变量计算
    pub fn new(n: f64, inv: &Invariants) -> Self {
        let n = n.max(N_FLOOR);
        let n2 = n * n;
        let q = (5.0 / 6.0 * (n2 - 2.0 * inv.ii_w) * (2.0 * n2 - inv.ii_w)).max(Q_FLOOR);
        let beta1 = -n * (2.0 * n2 - 7.0 * inv.ii_w) / q;
        let beta6 = -6.0 * n / q;
        Self {
            n,
            beta1,
            beta3: -12.0 * inv.iv / (n * q),
            beta4: -2.0 * (n2 - 2.0 * inv.ii_w) / q,
            beta6,
            beta9: 6.0 / q,
            cmu: -0.5 * (beta1 + inv.ii_w * beta6),
        }
    }

    /// 由无量纲 S̃、W̃ 直接计算
    pub fn from_tensors(s: &DMat3, w: &DMat3) -> (Self, Invariants) {
        let inv = Invariants::new(s, w);
        let n = solve_n(a3_prime(inv.ii_s, inv.ii_w), inv.ii_s, inv.ii_w);
        (Self::new(n, &inv), inv)
    }
}

/// 非线性闭合结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarsmResult {
    /// 等效 Cμ
    pub cmu: f64,
    /// 额外各向异性 a^(ex)（对称、无迹）
    pub anisotropy: DMat3,
}

/// 由无量纲应变、旋转张量计算 Cμ 与 a^(ex)
///
/// `s` 取偏量后使用；S = W = 0 时 a^(ex) 恰为零。
pub fn nonlinear_anisotropy(s: &DMat3, w: &DMat3) -> EarsmResult {
    let s = dev(s);
    let (c, inv) = EarsmCoefficients::from_tensors(&s, w);
    let t = BasisTensors::new(&s, w, &inv);
    let a = t.t3 * c.beta3 + t.t4 * c.beta4 + t.t6 * c.beta6 + t.t9 * c.beta9;
    EarsmResult {
        cmu: c.cmu,
        anisotropy: dev_symm(&a),
    }
}

/// 湍流时间尺度 τ = max(1/(β*ω), Cτ·√(ν/(β*kω)))
///
/// `c_tau` 为 `None` 时不施加 Kolmogorov 下限。
#[inline]
pub fn time_scale(k: f64, omega: f64, nu: f64, beta_star: f64, c_tau: Option<f64>) -> f64 {
    let bw = beta_star * omega;
    let tau = 1.0 / bw;
    match c_tau {
        Some(ct) => tau.max(ct * (nu / (bw * k.max(0.0)).max(ROOT_VSMALL)).sqrt()),
        None => tau,
    }
}

// =============================================================================
// 曲率修正
// =============================================================================

/// 流线曲率引起的旋转率 Ω^(r) = (S·Ṡ − Ṡ·S)/(2·II_S)
pub fn curvature_rotation(s: &DMat3, s_dot: &DMat3) -> DMat3 {
    let ii_s = trace(&(*s * *s));
    (*s * *s_dot - *s_dot * *s) * (0.5 / ii_s.max(CURVATURE_STRAIN_FLOOR))
}

/// 曲率修正权重渐变
///
/// 权重每步向开关目标移动 1/`steps`，避免源项突变。
/// 初始权重为零，开启修正的冷启动同样逐步引入。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvatureRamp {
    weight: f64,
    steps: u32,
}

impl CurvatureRamp {
    /// 以零权重创建
    pub fn new(steps: u32) -> Self {
        Self {
            weight: 0.0,
            steps: steps.max(1),
        }
    }

    /// 当前权重
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// 修改步数，保留当前权重
    pub fn set_steps(&mut self, steps: u32) {
        self.steps = steps.max(1);
    }

    /// 前进一步
    pub fn advance(&mut self, enabled: bool) -> f64 {
        let target = if enabled { 1.0 } else { 0.0 };
        let step = 1.0 / f64::from(self.steps);
        self.weight = if self.weight < target {
            (self.weight + step).min(target)
        } else {
            (self.weight - step).max(target)
        };
        self.weight
    }
}

// crates/tc_physics/src/turbulence/invariants.rs

//! 张量与不变量工具
//!
//! 速度梯度 ∇U（`(i, j) = ∂u_i/∂x_j`）分解为
//!
//! ```text
//! S = ½(∇U + ∇Uᵀ)    应变率（对称）
//! W = ½(∇U − ∇Uᵀ)    旋转率（反对称）
//! ```
//!
//! 非线性闭合使用无量纲张量 S̃ = τ·dev(S)、W̃ = τ·W 的不变量
//!
//! ```text
//! II_S = tr(S̃²)   II_W = tr(W̃²)   IV = tr(S̃W̃²)   V = tr(S̃²W̃²)
//! ```
//!
//! 所有函数均为纯函数，对有限输入总有定义。

use glam::DMat3;

/// 应变率张量 S = ½(G + Gᵀ)
#[inline]
pub fn strain_rate(grad: &DMat3) -> DMat3 {
    (*grad + grad.transpose()) * 0.5
}

/// 旋转率张量 W = ½(G − Gᵀ)
#[inline]
pub fn rotation_rate(grad: &DMat3) -> DMat3 {
    (*grad - grad.transpose()) * 0.5
}

/// 双点积 A:B = Σ A_ij B_ij
#[inline]
pub fn double_dot(a: &DMat3, b: &DMat3) -> f64 {
    a.x_axis.dot(b.x_axis) + a.y_axis.dot(b.y_axis) + a.z_axis.dot(b.z_axis)
}

/// 迹
#[inline]
pub fn trace(a: &DMat3) -> f64 {
    a.x_axis.x + a.y_axis.y + a.z_axis.z
}

/// 偏量 dev(A) = A − ⅓tr(A)·I
#[inline]
pub fn dev(a: &DMat3) -> DMat3 {
    *a - DMat3::IDENTITY * (trace(a) / 3.0)
}

/// 对称部分
#[inline]
pub fn symm(a: &DMat3) -> DMat3 {
    (*a + a.transpose()) * 0.5
}

/// 对称无迹化
#[inline]
pub fn dev_symm(a: &DMat3) -> DMat3 {
    dev(&symm(a))
}

/// 张量元素 (i, j)
#[inline]
pub fn component(a: &DMat3, i: usize, j: usize) -> f64 {
    a.col(j)[i]
}

/// 非线性闭合所需的不变量
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Invariants {
    /// tr(S²)
    pub ii_s: f64,
    /// tr(W²)（≤ 0）
    pub ii_w: f64,
    /// tr(S·W²)
    pub iv: f64,
    /// tr(S²·W²)
    pub v: f64,
}

impl Invariants {
    /// 由（无量纲）S、W 计算
    pub fn new(s: &DMat3, w: &DMat3) -> Self {
        let s2 = *s * *s;
        let w2 = *w * *w;
        Self {
            ii_s: trace(&s2),
            ii_w: trace(&w2),
            iv: trace(&(*s * w2)),
            v: trace(&(s2 * w2)),
        }
    }
}

/// Hellsten 基张量
///
/// ```text
/// T3 = W² − ⅓II_W·I
/// T4 = SW − WS
/// T6 = SW² + W²S − II_W·S − ⅔IV·I
/// T9 = WSW² − W²SW
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BasisTensors {
    /// T3
    pub t3: DMat3,
    /// T4
    pub t4: DMat3,
    /// T6
    pub t6: DMat3,
    /// T9
    pub t9: DMat3,
}

impl BasisTensors {
    /// 构建基张量
    pub fn new(s: &DMat3, w: &DMat3, inv: &Invariants) -> Self {
        let i = DMat3::IDENTITY;
        let w2 = *w * *w;
        let sw = *s * *w;
        let ws = *w * *s;
        Self {
            t3: w2 - i * (inv.ii_w / 3.0),
            t4: sw - ws,
            t6: *s * w2 + w2 * *s - *s * inv.ii_w - i * (2.0 / 3.0 * inv.iv),
            t9: *w * *s * w2 - w2 * sw,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;

    fn shear() -> DMat3 {
        // ∂u/∂y = 1
        DMat3::from_cols(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO)
    }

    #[test]
    fn test_decomposition() {
        let g = shear();
        let s = strain_rate(&g);
        let w = rotation_rate(&g);
        assert_eq!(component(&s, 0, 1), 0.5);
        assert_eq!(component(&s, 1, 0), 0.5);
        assert_eq!(component(&w, 0, 1), 0.5);
        assert_eq!(component(&w, 1, 0), -0.5);
        assert_eq!(s + w, g);
    }

    #[test]
    fn test_shear_invariants() {
        let g = shear();
        let s = strain_rate(&g);
        let w = rotation_rate(&g);
        let inv = Invariants::new(&s, &w);
        assert!((inv.ii_s - 0.5).abs() < 1e-15);
        assert!((inv.ii_w + 0.5).abs() < 1e-15);
        // 二维流动中 IV = 0
        assert!(inv.iv.abs() < 1e-15);
        assert!((double_dot(&s, &s) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_basis_tensors_trace_free() {
        let g = DMat3::from_cols(
            DVec3::new(0.3, -0.2, 0.1),
            DVec3::new(1.0, -0.1, 0.4),
            DVec3::new(-0.5, 0.2, -0.2),
        );
        let s = dev(&strain_rate(&g));
        let w = rotation_rate(&g);
        let inv = Invariants::new(&s, &w);
        let b = BasisTensors::new(&s, &w, &inv);
        for t in [b.t3, b.t4, b.t6, b.t9] {
            assert!(trace(&t).abs() < 1e-12);
        }
    }

    #[test]
    fn test_dev_symm() {
        let a = DMat3::from_cols(
            DVec3::new(1.0, 2.0, 0.0),
            DVec3::new(0.0, 3.0, 0.0),
            DVec3::new(0.0, 0.0, 5.0),
        );
        let d = dev_symm(&a);
        assert!(trace(&d).abs() < 1e-14);
        assert_eq!(d, d.transpose());
    }
}

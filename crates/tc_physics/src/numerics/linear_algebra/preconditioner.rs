// crates/tc_physics/src/numerics/linear_algebra/preconditioner.rs

//! 预条件器
//!
//! 输运方程矩阵是对角占优的 M 矩阵，Jacobi 预条件已足够。
//!
//! - [`IdentityPreconditioner`]: 无预条件
//! - [`JacobiPreconditioner`]: 对角预条件 M = diag(A)

use super::csr::CsrMatrix;

/// 对角元阈值，低于该值的行不做缩放
const DIAG_THRESHOLD: f64 = 1e-14;

/// 预条件器 trait
pub trait Preconditioner: Send + Sync {
    /// 应用预条件 z = M⁻¹ r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 名称
    fn name(&self) -> &'static str;

    /// 按新矩阵值更新
    fn update(&mut self, matrix: &CsrMatrix);
}

/// 恒等预条件器
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl IdentityPreconditioner {
    /// 创建
    pub fn new() -> Self {
        Self
    }
}

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }

    fn update(&mut self, _matrix: &CsrMatrix) {}
}

/// Jacobi 预条件器
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// 从矩阵对角线构建
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        Self::from_diagonal(&matrix.extract_diagonal())
    }

    /// 从对角线向量构建
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let inv_diag = diag
            .iter()
            .map(|&d| if d.abs() > DIAG_THRESHOLD { 1.0 / d } else { 1.0 })
            .collect();
        Self { inv_diag }
    }

    /// 对角逆
    pub fn inv_diagonal(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        for ((zi, &ri), &inv) in z.iter_mut().zip(r.iter()).zip(self.inv_diag.iter()) {
            *zi = ri * inv;
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }

    fn update(&mut self, matrix: &CsrMatrix) {
        *self = Self::from_matrix(matrix);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::linear_algebra::csr::CsrBuilder;

    #[test]
    fn test_identity() {
        let p = IdentityPreconditioner::new();
        let mut z = [0.0; 2];
        p.apply(&[1.0, 2.0], &mut z);
        assert_eq!(z, [1.0, 2.0]);
    }

    #[test]
    fn test_jacobi() {
        let mut b = CsrBuilder::new_square(2);
        b.set(0, 0, 4.0);
        b.set(1, 1, 0.0);
        let m = b.build();
        let p = JacobiPreconditioner::from_matrix(&m);
        let mut z = [0.0; 2];
        p.apply(&[8.0, 3.0], &mut z);
        assert_eq!(z, [2.0, 3.0]);
        assert_eq!(p.name(), "Jacobi");
    }
}

// crates/tc_physics/src/numerics/gradient/green_gauss.rs

//! Green-Gauss 梯度计算
//!
//! 使用 Green 定理将体积分转化为面积分:
//! ∇φ ≈ (1/V) ∮ φ·n dS
//!
//! 对于离散网格:
//! ∇φ_P ≈ (1/V_P) Σ_f φ_f · A_f
//!
//! 内部面值按面法向距离加权插值；边界面值由调用方给出的闭包决定
//! （固定值边界返回边界值，零梯度边界返回单元值）。
//! 矢量场梯度按 `(i, j) = ∂u_i/∂x_j` 排列，对应 glam 的 `col(j)[i]`。

use crate::mesh::FvMesh;

use glam::{DMat3, DVec3};
use rayon::prelude::*;

/// 最小体积保护
const MIN_VOLUME: f64 = 1e-30;

/// Green-Gauss 梯度计算器
#[derive(Debug, Clone)]
pub struct GreenGaussGradient {
    /// 并行阈值（单元数）
    parallel_threshold: usize,
}

impl Default for GreenGaussGradient {
    fn default() -> Self {
        Self {
            parallel_threshold: 1000,
        }
    }
}

impl GreenGaussGradient {
    /// 创建新实例
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置并行阈值
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    fn map_cells<T, F>(&self, n: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        if n >= self.parallel_threshold {
            (0..n).into_par_iter().map(f).collect()
        } else {
            (0..n).map(f).collect()
        }
    }

    /// 标量梯度
    ///
    /// `boundary(face, phi_owner)` 返回边界面值。
    pub fn scalar<B>(&self, mesh: &FvMesh, field: &[f64], boundary: B) -> Vec<DVec3>
    where
        B: Fn(usize, f64) -> f64 + Sync + Send,
    {
        self.map_cells(mesh.n_cells(), |cell| {
            let volume = mesh.cell_volume(cell);
            if volume < MIN_VOLUME {
                return DVec3::ZERO;
            }
            let mut grad = DVec3::ZERO;
            for &face in mesh.cell_faces(cell) {
                let f = mesh.face(face);
                let phi_face = match f.neighbor {
                    Some(n) => {
                        let w = mesh.weight(face);
                        w * field[f.owner] + (1.0 - w) * field[n]
                    }
                    None => boundary(face, field[cell]),
                };
                grad += mesh.outward_area(face, cell) * phi_face;
            }
            grad / volume
        })
    }

    /// 零梯度边界的标量梯度
    pub fn scalar_zero_gradient(&self, mesh: &FvMesh, field: &[f64]) -> Vec<DVec3> {
        self.scalar(mesh, field, |_, phi_c| phi_c)
    }

    /// 矢量梯度，`boundary(face, u_owner)` 返回边界面值
    pub fn vector<B>(&self, mesh: &FvMesh, field: &[DVec3], boundary: B) -> Vec<DMat3>
    where
        B: Fn(usize, DVec3) -> DVec3 + Sync + Send,
    {
        self.map_cells(mesh.n_cells(), |cell| {
            let volume = mesh.cell_volume(cell);
            if volume < MIN_VOLUME {
                return DMat3::ZERO;
            }
            let mut grad = DMat3::ZERO;
            for &face in mesh.cell_faces(cell) {
                let f = mesh.face(face);
                let u_face = match f.neighbor {
                    Some(n) => {
                        let w = mesh.weight(face);
                        field[f.owner] * w + field[n] * (1.0 - w)
                    }
                    None => boundary(face, field[cell]),
                };
                let a = mesh.outward_area(face, cell);
                // (i, j) = u_i * A_j
                grad += DMat3::from_cols(u_face * a.x, u_face * a.y, u_face * a.z);
            }
            grad * (1.0 / volume)
        })
    }
}

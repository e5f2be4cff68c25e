// crates/tc_physics/src/state/mean_flow.rs

//! 平均流输入
//!
//! 宿主求解器每个时间步提供的只读数据：速度及其梯度、壁面距离、
//! 分子运动黏度、密度和面质量通量。尺寸在 [`MeanFlowState::validate`]
//! 中对照网格检查。

use crate::mesh::FvMesh;
use crate::numerics::gradient::GreenGaussGradient;
use crate::turbulence::VelocityGradient;
use glam::DVec3;
use rayon::prelude::*;
use tc_foundation::{TcError, TcResult};

/// 平均流状态
#[derive(Debug, Clone)]
pub struct MeanFlowState {
    /// 单元速度 [m/s]
    pub velocity: Vec<DVec3>,
    /// 单元速度梯度，(i, j) = ∂u_i/∂x_j [1/s]
    pub grad_u: Vec<VelocityGradient>,
    /// 壁面距离 [m]
    pub wall_distance: Vec<f64>,
    /// 分子运动黏度 [m²/s]
    pub nu: Vec<f64>,
    /// 密度 [kg/m³]
    pub rho: Vec<f64>,
    /// 面质量通量 ρU·A（owner 指向外侧为正）[kg/s]
    pub mass_flux: Vec<f64>,
}

impl MeanFlowState {
    /// 由全部分量构建，检查尺寸与有效性
    pub fn new(
        mesh: &FvMesh,
        velocity: Vec<DVec3>,
        grad_u: Vec<VelocityGradient>,
        wall_distance: Vec<f64>,
        nu: Vec<f64>,
    ) -> TcResult<Self> {
        let rho = vec![1.0; mesh.n_cells()];
        let mass_flux = face_flux(mesh, &velocity, &rho);
        let flow = Self {
            velocity,
            grad_u,
            wall_distance,
            nu,
            rho,
            mass_flux,
        };
        flow.validate(mesh)?;
        Ok(flow)
    }

    /// 由速度场构建：Green-Gauss 求梯度，固壁按无滑移处理
    pub fn from_velocity(
        mesh: &FvMesh,
        velocity: Vec<DVec3>,
        wall_distance: Vec<f64>,
        nu: f64,
    ) -> TcResult<Self> {
        TcError::check_size("velocity", mesh.n_cells(), velocity.len())?;
        let grad = GreenGaussGradient::new().vector(mesh, &velocity, |face, u_c| {
            if mesh.is_wall_face(face) {
                DVec3::ZERO
            } else {
                u_c
            }
        });
        let grad_u = grad.into_iter().map(VelocityGradient::from_mat3).collect();
        Self::new(
            mesh,
            velocity,
            grad_u,
            wall_distance,
            vec![nu; mesh.n_cells()],
        )
    }

    /// 均匀梯度、静止流体（通量为零），常用于单元级检验
    pub fn uniform_gradient(
        mesh: &FvMesh,
        grad: VelocityGradient,
        wall_distance: Vec<f64>,
        nu: f64,
    ) -> TcResult<Self> {
        let n = mesh.n_cells();
        Self::new(
            mesh,
            vec![DVec3::ZERO; n],
            vec![grad; n],
            wall_distance,
            vec![nu; n],
        )
    }

    /// 设置密度并重算质量通量
    pub fn with_density(mut self, mesh: &FvMesh, rho: Vec<f64>) -> TcResult<Self> {
        TcError::check_size("rho", mesh.n_cells(), rho.len())?;
        self.mass_flux = face_flux(mesh, &self.velocity, &rho);
        self.rho = rho;
        Ok(self)
    }

    /// 直接指定面质量通量（宿主已有守恒通量时使用）
    pub fn with_mass_flux(mut self, mesh: &FvMesh, mass_flux: Vec<f64>) -> TcResult<Self> {
        TcError::check_size("mass_flux", mesh.n_faces(), mass_flux.len())?;
        self.mass_flux = mass_flux;
        Ok(self)
    }

    /// 单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.wall_distance.len()
    }

    /// 检查尺寸、有限性和物理范围
    pub fn validate(&self, mesh: &FvMesh) -> TcResult<()> {
        let n = mesh.n_cells();
        TcError::check_size("velocity", n, self.velocity.len())?;
        TcError::check_size("grad_u", n, self.grad_u.len())?;
        TcError::check_size("wall_distance", n, self.wall_distance.len())?;
        TcError::check_size("nu", n, self.nu.len())?;
        TcError::check_size("rho", n, self.rho.len())?;
        TcError::check_size("mass_flux", mesh.n_faces(), self.mass_flux.len())?;

        TcError::check_finite("wall_distance", &self.wall_distance)?;
        TcError::check_finite("nu", &self.nu)?;
        TcError::check_finite("rho", &self.rho)?;
        TcError::check_finite("mass_flux", &self.mass_flux)?;

        if let Some(i) = self.grad_u.iter().position(|g| !g.is_valid()) {
            return Err(TcError::non_finite("grad_u", i));
        }
        if let Some(i) = self.velocity.iter().position(|u| !u.is_finite()) {
            return Err(TcError::non_finite("velocity", i));
        }
        if let Some(i) = self.wall_distance.iter().position(|&y| y < 0.0) {
            return Err(TcError::invalid_input(format!(
                "单元 {} 壁面距离为负: {}",
                i, self.wall_distance[i]
            )));
        }
        if let Some(i) = self.nu.iter().position(|&nu| nu <= 0.0) {
            return Err(TcError::invalid_input(format!(
                "单元 {} 分子黏度非正: {}",
                i, self.nu[i]
            )));
        }
        if let Some(i) = self.rho.iter().position(|&r| r <= 0.0) {
            return Err(TcError::invalid_input(format!("单元 {} 密度非正", i)));
        }
        Ok(())
    }

    /// 速度模的梯度（γ-SST 压力梯度参数用）
    pub fn speed_gradient(&self, mesh: &FvMesh) -> Vec<DVec3> {
        let speed: Vec<f64> = self.velocity.par_iter().map(|u| u.length()).collect();
        GreenGaussGradient::new().scalar(mesh, &speed, |face, s| {
            if mesh.is_wall_face(face) {
                0.0
            } else {
                s
            }
        })
    }
}

/// 线性插值面质量通量，固壁面为零
fn face_flux(mesh: &FvMesh, velocity: &[DVec3], rho: &[f64]) -> Vec<f64> {
    if velocity.len() != mesh.n_cells() || rho.len() != mesh.n_cells() {
        return vec![0.0; mesh.n_faces()];
    }
    (0..mesh.n_faces())
        .map(|face| {
            let f = mesh.face(face);
            match f.neighbor {
                Some(n) => {
                    let w = mesh.weight(face);
                    let u = velocity[f.owner] * w + velocity[n] * (1.0 - w);
                    let r = w * rho[f.owner] + (1.0 - w) * rho[n];
                    r * u.dot(f.area)
                }
                None if mesh.is_wall_face(face) => 0.0,
                None => rho[f.owner] * velocity[f.owner].dot(f.area),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StructuredMesh;

    #[test]
    fn test_from_velocity_shear() {
        let mesh = StructuredMesh::new(4, 8, 1.0, 1.0).build().unwrap();
        let velocity: Vec<DVec3> = mesh
            .cell_centers()
            .iter()
            .map(|c| DVec3::new(c.y, 0.0, 0.0))
            .collect();
        let y = mesh.nearest_wall_distance();
        let flow = MeanFlowState::from_velocity(&mesh, velocity, y, 1e-5).unwrap();
        // 内部单元 ∂u/∂y = 1
        let cell = 3 * 4 + 1;
        assert!((flow.grad_u[cell].get(0, 1) - 1.0).abs() < 1e-10);
        // 均匀 x 向通量守恒：每个内部单元净通量为零
        for c in 0..mesh.n_cells() {
            let net: f64 = mesh
                .cell_faces(c)
                .iter()
                .map(|&f| {
                    let sign = if mesh.face(f).owner == c { 1.0 } else { -1.0 };
                    sign * flow.mass_flux[f]
                })
                .sum();
            assert!(net.abs() < 1e-12);
        }
    }

    #[test]
    fn test_size_mismatch() {
        let mesh = StructuredMesh::new(2, 2, 1.0, 1.0).build().unwrap();
        let err = MeanFlowState::uniform_gradient(
            &mesh,
            VelocityGradient::zero(),
            vec![0.1; 3],
            1e-5,
        )
        .unwrap_err();
        assert!(matches!(err, TcError::SizeMismatch { .. }));
    }

    #[test]
    fn test_rejects_negative_viscosity() {
        let mesh = StructuredMesh::new(2, 2, 1.0, 1.0).build().unwrap();
        assert!(MeanFlowState::uniform_gradient(
            &mesh,
            VelocityGradient::zero(),
            vec![0.1; 4],
            -1.0
        )
        .is_err());
    }
}

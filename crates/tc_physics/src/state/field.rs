// crates/tc_physics/src/state/field.rs

//! 湍流标量场
//!
//! 每个输运标量（k、ω、v2、γ）拥有单元值与每个 patch 的边界条件。
//! 求解后由 [`ScalarField::bound`] / [`ScalarField::clamp`] 施加可实现性约束。

use crate::mesh::FvMesh;
use crate::numerics::gradient::GreenGaussGradient;
use glam::DVec3;
use tc_config::{BoundarySpec, ClosureConfig};
use tc_foundation::{TcError, TcResult};

/// 标量场边界条件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    /// 零法向梯度
    ZeroGradient,
    /// 固定值
    FixedValue(f64),
}

impl From<BoundarySpec> for BoundaryCondition {
    fn from(spec: BoundarySpec) -> Self {
        match spec {
            BoundarySpec::ZeroGradient => Self::ZeroGradient,
            BoundarySpec::FixedValue { value } => Self::FixedValue(value),
        }
    }
}

/// 单元标量场
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    name: String,
    values: Vec<f64>,
    /// 按 patch 索引
    boundary: Vec<BoundaryCondition>,
}

impl ScalarField {
    /// 均匀初值、全部边界零梯度
    pub fn uniform(name: impl Into<String>, mesh: &FvMesh, value: f64) -> Self {
        Self {
            name: name.into(),
            values: vec![value; mesh.n_cells()],
            boundary: vec![BoundaryCondition::ZeroGradient; mesh.patches().len()],
        }
    }

    /// 从单元值构建
    pub fn from_values(
        name: impl Into<String>,
        mesh: &FvMesh,
        values: Vec<f64>,
    ) -> TcResult<Self> {
        TcError::check_size("field values", mesh.n_cells(), values.len())?;
        Ok(Self {
            name: name.into(),
            values,
            boundary: vec![BoundaryCondition::ZeroGradient; mesh.patches().len()],
        })
    }

    /// 按配置的初值与边界条件构建
    pub fn from_config(
        name: &str,
        mesh: &FvMesh,
        config: &ClosureConfig,
        initial: f64,
    ) -> Self {
        let mut field = Self::uniform(name, mesh, initial);
        for (p, patch) in mesh.patches().iter().enumerate() {
            if let Some(spec) = config.boundary_for(&patch.name, name) {
                field.boundary[p] = spec.into();
            }
        }
        field
    }

    /// 名称
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 单元值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 可变单元值
    #[inline]
    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// 单元数
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// patch 边界条件
    #[inline]
    pub fn boundary(&self, patch: usize) -> BoundaryCondition {
        self.boundary[patch]
    }

    /// 设置 patch 边界条件
    pub fn set_boundary(&mut self, patch: usize, bc: BoundaryCondition) {
        self.boundary[patch] = bc;
    }

    /// 边界面值
    pub fn boundary_face_value(&self, mesh: &FvMesh, face: usize) -> f64 {
        let f = mesh.face(face);
        match f.patch.map(|p| self.boundary[p]) {
            Some(BoundaryCondition::FixedValue(v)) => v,
            _ => self.values[f.owner],
        }
    }

    /// Green-Gauss 梯度
    pub fn gradient(&self, mesh: &FvMesh, gg: &GreenGaussGradient) -> Vec<DVec3> {
        gg.scalar(mesh, &self.values, |face, phi_c| match mesh
            .face(face)
            .patch
            .map(|p| self.boundary[p])
        {
            Some(BoundaryCondition::FixedValue(v)) => v,
            _ => phi_c,
        })
    }

    /// 下界截断（NaN 也替换为下界），返回被截断的单元数
    pub fn bound(&mut self, min: f64) -> usize {
        let mut clipped = 0;
        for v in &mut self.values {
            if !(*v >= min) {
                *v = min;
                clipped += 1;
            }
        }
        clipped
    }

    /// 区间截断，返回被截断的单元数
    pub fn clamp(&mut self, min: f64, max: f64) -> usize {
        let mut clipped = 0;
        for v in &mut self.values {
            if !(*v >= min) {
                *v = min;
                clipped += 1;
            } else if *v > max {
                *v = max;
                clipped += 1;
            }
        }
        clipped
    }

    /// (最小值, 最大值)
    pub fn min_max(&self) -> (f64, f64) {
        self.values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StructuredMesh;

    #[test]
    fn test_bound_replaces_nan_and_negative() {
        let mesh = StructuredMesh::new(2, 2, 1.0, 1.0).build().unwrap();
        let mut f =
            ScalarField::from_values("k", &mesh, vec![-1.0, f64::NAN, 0.5, 1e-20]).unwrap();
        let n = f.bound(1e-10);
        assert_eq!(n, 3);
        assert_eq!(f.values(), &[1e-10, 1e-10, 0.5, 1e-10]);
    }

    #[test]
    fn test_clamp_unit_interval() {
        let mesh = StructuredMesh::new(2, 2, 1.0, 1.0).build().unwrap();
        let mut f = ScalarField::from_values("g", &mesh, vec![-0.1, 1.2, 0.3, 1.0]).unwrap();
        assert_eq!(f.clamp(0.0, 1.0), 2);
        assert_eq!(f.values(), &[0.0, 1.0, 0.3, 1.0]);
    }

    #[test]
    fn test_boundary_from_config() {
        let mesh = StructuredMesh::new(2, 2, 1.0, 1.0).build().unwrap();
        let mut cfg = ClosureConfig::new("kOmega");
        cfg.set_boundary("west", "k", BoundarySpec::FixedValue { value: 0.25 });
        let f = ScalarField::from_config("k", &mesh, &cfg, 1.0);
        let west = mesh.find_patch("west").unwrap();
        assert_eq!(f.boundary(west), BoundaryCondition::FixedValue(0.25));
        let east = mesh.find_patch("east").unwrap();
        assert_eq!(f.boundary(east), BoundaryCondition::ZeroGradient);
    }

    #[test]
    fn test_size_check() {
        let mesh = StructuredMesh::new(2, 2, 1.0, 1.0).build().unwrap();
        assert!(ScalarField::from_values("k", &mesh, vec![1.0]).is_err());
    }
}

// crates/tc_physics/src/numerics/discretization/assembler.rs

//! 标量输运方程矩阵组装器
//!
//! 组装隐式 Euler + 有界迎风对流 + 中心差分扩散的离散方程：
//!
//! ```text
//! ∂(ρφ)/∂t + ∇·(ρUφ) − ∇·(ρD∇φ) = ρ(Su − Sp·φ)
//! ```
//!
//! # 离散要点
//!
//! - 时间项 ρ_P V/Δt
//! - 迎风对流，`bounded` 时从对角元扣除净通量散度 ∇·(ρU)，矩阵为 M 矩阵
//! - 扩散系数 ρ_f D_f |A| / |d|，D_f 取两侧算术平均
//! - 固定值边界：扩散到边界值，入流取边界值；零梯度边界无贡献
//! - `Su` 显式源，`Sp ≥ 0` 隐式汇，见 [`CellSource::su_sp`]
//! - 欠松弛：对角元除以 α，右端项补 (1−α)/α · a_P · φ_old
//!
//! 稀疏模式在构造时确定，之后每次组装只清零重填。

use crate::mesh::FvMesh;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
use crate::state::{BoundaryCondition, MeanFlowState, ScalarField};
use std::ops::{Add, AddAssign};
use tc_foundation::{TcError, TcResult};

// =============================================================================
// 源项
// =============================================================================

/// 单元源项（单位体积、运动学量）
///
/// 方程右端为 `Su − Sp·φ`。
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellSource {
    /// 显式源
    pub su: f64,
    /// 隐式汇系数（非负）
    pub sp: f64,
}

impl CellSource {
    /// 显式源
    #[inline]
    pub fn explicit(su: f64) -> Self {
        Self { su, sp: 0.0 }
    }

    /// 隐式汇 `−rate·φ`，负的 rate 按显式处理
    #[inline]
    pub fn sink(rate: f64, phi: f64) -> Self {
        if rate >= 0.0 {
            Self { su: 0.0, sp: rate }
        } else {
            Self {
                su: -rate * phi,
                sp: 0.0,
            }
        }
    }

    /// 按符号线性化 `s·φ`：s ≥ 0 显式，s < 0 隐式
    #[inline]
    pub fn su_sp(s: f64, phi: f64) -> Self {
        if s >= 0.0 {
            Self {
                su: s * phi,
                sp: 0.0,
            }
        } else {
            Self { su: 0.0, sp: -s }
        }
    }
}

impl Add for CellSource {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            su: self.su + rhs.su,
            sp: self.sp + rhs.sp,
        }
    }
}

impl AddAssign for CellSource {
    fn add_assign(&mut self, rhs: Self) {
        self.su += rhs.su;
        self.sp += rhs.sp;
    }
}

/// 一个标量方程的系数
#[derive(Debug, Clone, Default)]
pub struct EquationTerms {
    /// 有效扩散率 D_eff [m²/s]
    pub diffusivity: Vec<f64>,
    /// 单元源项
    pub sources: Vec<CellSource>,
}

impl EquationTerms {
    /// 由扩散率与源项构建
    pub fn new(diffusivity: Vec<f64>, sources: Vec<CellSource>) -> Self {
        Self {
            diffusivity,
            sources,
        }
    }

    /// 检查尺寸与取值
    pub fn validate(&self, n_cells: usize) -> TcResult<()> {
        TcError::check_size("diffusivity", n_cells, self.diffusivity.len())?;
        TcError::check_size("sources", n_cells, self.sources.len())?;
        for (i, (d, s)) in self.diffusivity.iter().zip(&self.sources).enumerate() {
            if !(d.is_finite() && s.su.is_finite() && s.sp.is_finite()) {
                return Err(TcError::non_finite("equation terms", i));
            }
            if *d < 0.0 || s.sp < 0.0 {
                return Err(TcError::invalid_input(format!(
                    "单元 {} 扩散率或隐式汇为负",
                    i
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// 组装器
// =============================================================================

/// 标量输运方程组装器
pub struct TransportAssembler {
    matrix: CsrMatrix,
    rhs: Vec<f64>,
    diag_indices: Vec<usize>,
    bounded: bool,
}

impl TransportAssembler {
    /// 按网格连接关系建立稀疏模式
    pub fn new(mesh: &FvMesh) -> TcResult<Self> {
        let n = mesh.n_cells();
        let mut builder = CsrBuilder::new_square(n);
        for cell in 0..n {
            builder.set(cell, cell, 0.0);
        }
        for &face in mesh.interior_faces() {
            let f = mesh.face(face);
            if let Some(nb) = f.neighbor {
                builder.set(f.owner, nb, 0.0);
                builder.set(nb, f.owner, 0.0);
            }
        }

        let pattern = builder.build_pattern();
        let diag_indices = (0..n)
            .map(|i| {
                pattern
                    .find_index(i, i)
                    .ok_or_else(|| TcError::invalid_mesh(format!("单元 {} 缺少对角元", i)))
            })
            .collect::<TcResult<Vec<_>>>()?;

        Ok(Self {
            matrix: pattern.into(),
            rhs: vec![0.0; n],
            diag_indices,
            bounded: true,
        })
    }

    /// 设置是否扣除通量散度
    pub fn with_bounded(mut self, bounded: bool) -> Self {
        self.bounded = bounded;
        self
    }

    /// 系数矩阵
    #[inline]
    pub fn matrix(&self) -> &CsrMatrix {
        &self.matrix
    }

    /// 右端项
    #[inline]
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// 对角元
    #[inline]
    pub fn diagonal(&self, cell: usize) -> f64 {
        self.matrix.values()[self.diag_indices[cell]]
    }

    #[inline]
    fn add_diag(&mut self, cell: usize, value: f64) {
        self.matrix.values_mut()[self.diag_indices[cell]] += value;
    }

    /// 组装方程
    ///
    /// `dt` 为无穷大时退化为稳态方程；`relax` ∈ (0, 1]。
    pub fn assemble(
        &mut self,
        mesh: &FvMesh,
        flow: &MeanFlowState,
        field: &ScalarField,
        terms: &EquationTerms,
        dt: f64,
        relax: f64,
    ) -> TcResult<()> {
        let n = mesh.n_cells();
        TcError::check_size("field", n, field.len())?;
        terms.validate(n)?;
        if !(dt > 0.0) {
            return Err(TcError::invalid_input(format!("时间步长必须为正: {}", dt)));
        }
        if !(relax > 0.0 && relax <= 1.0) {
            return Err(TcError::invalid_input(format!("欠松弛因子越界: {}", relax)));
        }

        let phi = field.values();
        let rho = &flow.rho;
        let flux = &flow.mass_flux;
        let diff = &terms.diffusivity;

        self.matrix.clear_values();
        self.rhs.fill(0.0);

        // 时间项与源项
        for cell in 0..n {
            let rv = rho[cell] * mesh.cell_volume(cell);
            let a_t = if dt.is_finite() { rv / dt } else { 0.0 };
            let s = terms.sources[cell];
            self.add_diag(cell, a_t + rv * s.sp);
            self.rhs[cell] += a_t * phi[cell] + rv * s.su;
        }

        // 内部面
        for &face in mesh.interior_faces() {
            let f = mesh.face(face);
            let (p, nb) = match f.neighbor {
                Some(nb) => (f.owner, nb),
                None => continue,
            };
            let w = mesh.weight(face);
            let rho_f = w * rho[p] + (1.0 - w) * rho[nb];
            let d_f = 0.5 * (diff[p] + diff[nb]);
            let c_d = rho_f * d_f * f.magnitude() / mesh.delta(face);

            let fl = flux[face];
            let out = fl.max(0.0);
            let inn = (-fl).max(0.0);

            let (dp, dn) = if self.bounded {
                (c_d + out - fl, c_d + inn + fl)
            } else {
                (c_d + out, c_d + inn)
            };
            self.add_diag(p, dp);
            self.add_diag(nb, dn);
            self.matrix.add(p, nb, -(c_d + inn));
            self.matrix.add(nb, p, -(c_d + out));
        }

        // 边界面
        for &face in mesh.boundary_faces() {
            let f = mesh.face(face);
            let p = f.owner;
            let bc = f
                .patch
                .map_or(BoundaryCondition::ZeroGradient, |id| field.boundary(id));
            let fl = flux[face];

            let mut a_p = 0.0;
            let mut b = 0.0;

            if let BoundaryCondition::FixedValue(value) = bc {
                let c_d = rho[p] * diff[p] * f.magnitude() / mesh.delta(face);
                a_p += c_d;
                b += c_d * value;
            }

            if fl >= 0.0 {
                a_p += fl;
            } else {
                match bc {
                    BoundaryCondition::FixedValue(value) => b -= fl * value,
                    BoundaryCondition::ZeroGradient => a_p += fl,
                }
            }
            if self.bounded {
                a_p -= fl;
            }

            self.add_diag(p, a_p);
            self.rhs[p] += b;
        }

        // 欠松弛
        if relax < 1.0 {
            for cell in 0..n {
                let d = self.diagonal(cell);
                let d_relaxed = d / relax;
                self.matrix.values_mut()[self.diag_indices[cell]] = d_relaxed;
                self.rhs[cell] += (d_relaxed - d) * phi[cell];
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::StructuredMesh;
    use crate::turbulence::VelocityGradient;
    use glam::DVec3;

    fn setup(u: f64) -> (FvMesh, MeanFlowState) {
        let mesh = StructuredMesh::new(4, 1, 4.0, 1.0).build().unwrap();
        let n = mesh.n_cells();
        let flow = MeanFlowState::new(
            &mesh,
            vec![DVec3::new(u, 0.0, 0.0); n],
            vec![VelocityGradient::zero(); n],
            vec![0.5; n],
            vec![1.0; n],
        )
        .unwrap();
        (mesh, flow)
    }

    #[test]
    fn test_m_matrix_property() {
        let (mesh, flow) = setup(2.0);
        let field = ScalarField::uniform("k", &mesh, 1.0);
        let terms = EquationTerms::new(vec![0.1; 4], vec![CellSource::default(); 4]);
        let mut asm = TransportAssembler::new(&mesh).unwrap();
        asm.assemble(&mesh, &flow, &field, &terms, 0.1, 1.0).unwrap();

        let m = asm.matrix();
        for row in 0..4 {
            let mut off = 0.0;
            for (col, v) in m.row(row).iter() {
                if col != row {
                    assert!(v <= 0.0);
                    off += v.abs();
                }
            }
            assert!(asm.diagonal(row) > off);
        }
    }

    #[test]
    fn test_uniform_field_is_steady() {
        let (mesh, flow) = setup(1.0);
        let field = ScalarField::uniform("k", &mesh, 3.0);
        let terms = EquationTerms::new(vec![0.2; 4], vec![CellSource::default(); 4]);
        let mut asm = TransportAssembler::new(&mesh).unwrap();
        asm.assemble(&mesh, &flow, &field, &terms, 0.5, 1.0).unwrap();

        // A·φ_old = b 时均匀场保持不变
        let mut ax = vec![0.0; 4];
        asm.matrix().mul_vec(field.values(), &mut ax);
        for (a, b) in ax.iter().zip(asm.rhs()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_fixed_value_inflow() {
        let (mesh, flow) = setup(1.0);
        let mut field = ScalarField::uniform("k", &mesh, 0.0);
        let west = mesh.find_patch("west").unwrap();
        field.set_boundary(west, BoundaryCondition::FixedValue(2.0));
        let terms = EquationTerms::new(vec![0.0; 4], vec![CellSource::default(); 4]);
        let mut asm = TransportAssembler::new(&mesh).unwrap();
        asm.assemble(&mesh, &flow, &field, &terms, f64::INFINITY, 1.0)
            .unwrap();
        // 第一个单元的入流通量为 1·1·1
        assert!((asm.rhs()[0] - 2.0).abs() < 1e-12);
        assert!((asm.diagonal(0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_relaxation_keeps_solution() {
        let (mesh, flow) = setup(0.0);
        let field = ScalarField::uniform("k", &mesh, 1.5);
        let terms = EquationTerms::new(vec![0.1; 4], vec![CellSource::default(); 4]);
        let mut asm = TransportAssembler::new(&mesh).unwrap();
        asm.assemble(&mesh, &flow, &field, &terms, 1.0, 0.5).unwrap();
        let mut ax = vec![0.0; 4];
        asm.matrix().mul_vec(field.values(), &mut ax);
        for (a, b) in ax.iter().zip(asm.rhs()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_su_sp_linearisation() {
        let s = CellSource::su_sp(2.0, 3.0);
        assert_eq!(s, CellSource { su: 6.0, sp: 0.0 });
        let s = CellSource::su_sp(-2.0, 3.0);
        assert_eq!(s, CellSource { su: 0.0, sp: 2.0 });
        let s = CellSource::sink(-1.0, 4.0);
        assert_eq!(s.su, 4.0);
    }

    #[test]
    fn test_rejects_bad_inputs() {
        let (mesh, flow) = setup(0.0);
        let field = ScalarField::uniform("k", &mesh, 1.0);
        let terms = EquationTerms::new(vec![0.1; 3], vec![CellSource::default(); 4]);
        let mut asm = TransportAssembler::new(&mesh).unwrap();
        assert!(asm.assemble(&mesh, &flow, &field, &terms, 1.0, 1.0).is_err());
        let terms = EquationTerms::new(vec![0.1; 4], vec![CellSource::default(); 4]);
        assert!(asm.assemble(&mesh, &flow, &field, &terms, 0.0, 1.0).is_err());
        assert!(asm.assemble(&mesh, &flow, &field, &terms, 1.0, 1.5).is_err());
    }
}

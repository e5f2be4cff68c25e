// crates/tc_physics/src/mesh/mod.rs

//! 有限体积网格
//!
//! 湍流闭合只需要网格的少量几何信息：单元体积与中心、面的 owner/neighbor、
//! 面积矢量与面中心、边界 patch。宿主求解器按本模块的 [`FvMesh`] 提供网格，
//! 构造时一次性建立单元-面 CSR 连接表并校验索引。
//!
//! # 约定
//!
//! - 面积矢量 `area` 的模等于面积，方向由 owner 指向 neighbor；
//!   边界面指向计算域外
//! - 内部面的 `neighbor` 为 `Some`，边界面为 `None` 且必须属于某个 patch
//!
//! # 子模块
//!
//! - [`structured`]: 二维矩形结构网格生成（单位厚度），用于测试与演示

pub mod structured;

pub use structured::StructuredMesh;

use glam::DVec3;
use tc_foundation::{TcError, TcResult};

/// 最小距离保护 [m]
const MIN_DISTANCE: f64 = 1e-30;

/// 边界 patch 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchKind {
    /// 无滑移固壁
    Wall,
    /// 入口
    Inlet,
    /// 出口
    Outlet,
    /// 对称面
    Symmetry,
    /// 其他
    Generic,
}

/// 边界 patch
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    /// 名称
    pub name: String,
    /// 类型
    pub kind: PatchKind,
}

impl Patch {
    /// 创建 patch
    pub fn new(name: impl Into<String>, kind: PatchKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// 面几何
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Owner 单元
    pub owner: usize,
    /// Neighbor 单元（None 表示边界面）
    pub neighbor: Option<usize>,
    /// 面积矢量 [m²]，owner 指向外侧
    pub area: DVec3,
    /// 面中心 [m]
    pub center: DVec3,
    /// 所属 patch（仅边界面）
    pub patch: Option<usize>,
}

impl Face {
    /// 内部面
    pub fn interior(owner: usize, neighbor: usize, area: DVec3, center: DVec3) -> Self {
        Self {
            owner,
            neighbor: Some(neighbor),
            area,
            center,
            patch: None,
        }
    }

    /// 边界面
    pub fn boundary(owner: usize, patch: usize, area: DVec3, center: DVec3) -> Self {
        Self {
            owner,
            neighbor: None,
            area,
            center,
            patch: Some(patch),
        }
    }

    /// 是否为边界面
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.neighbor.is_none()
    }

    /// 面积 [m²]
    #[inline]
    pub fn magnitude(&self) -> f64 {
        self.area.length()
    }
}

/// 有限体积网格
#[derive(Debug, Clone)]
pub struct FvMesh {
    cell_centers: Vec<DVec3>,
    cell_volumes: Vec<f64>,
    faces: Vec<Face>,
    patches: Vec<Patch>,
    /// 每个单元的面索引列表起始位置
    cell_face_ptr: Vec<usize>,
    /// 所有单元的面索引列表（扁平存储）
    cell_face_idx: Vec<usize>,
    interior_faces: Vec<usize>,
    boundary_faces: Vec<usize>,
    /// 面法向上的中心距 [m]
    deltas: Vec<f64>,
    /// owner 侧插值权重
    weights: Vec<f64>,
}

impl FvMesh {
    /// 从几何数据构建网格，校验索引与几何量
    pub fn new(
        cell_centers: Vec<DVec3>,
        cell_volumes: Vec<f64>,
        faces: Vec<Face>,
        patches: Vec<Patch>,
    ) -> TcResult<Self> {
        let n_cells = cell_centers.len();
        TcError::check_size("cell_volumes", n_cells, cell_volumes.len())?;
        if n_cells == 0 {
            return Err(TcError::invalid_mesh("网格没有单元"));
        }
        if let Some(i) = cell_volumes.iter().position(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(TcError::invalid_mesh(format!(
                "单元 {} 体积非正: {}",
                i, cell_volumes[i]
            )));
        }

        for (f, face) in faces.iter().enumerate() {
            if face.owner >= n_cells {
                return Err(TcError::invalid_mesh(format!("面 {} 的 owner 越界", f)));
            }
            match face.neighbor {
                Some(n) if n >= n_cells || n == face.owner => {
                    return Err(TcError::invalid_mesh(format!("面 {} 的 neighbor 非法", f)));
                }
                None => match face.patch {
                    Some(p) if p < patches.len() => {}
                    _ => {
                        return Err(TcError::invalid_mesh(format!(
                            "边界面 {} 未指定有效 patch",
                            f
                        )))
                    }
                },
                _ => {}
            }
            let mag = face.magnitude();
            if !(mag.is_finite() && mag > 0.0) {
                return Err(TcError::invalid_mesh(format!("面 {} 面积非正", f)));
            }
        }

        // 统计每个单元的面数
        let mut cell_face_count = vec![0usize; n_cells];
        for face in &faces {
            cell_face_count[face.owner] += 1;
            if let Some(n) = face.neighbor {
                cell_face_count[n] += 1;
            }
        }

        let mut cell_face_ptr = Vec::with_capacity(n_cells + 1);
        cell_face_ptr.push(0);
        let mut running = 0;
        for &count in &cell_face_count {
            running += count;
            cell_face_ptr.push(running);
        }

        let mut cell_face_idx = vec![0usize; running];
        let mut cursor: Vec<usize> = cell_face_ptr[..n_cells].to_vec();
        let mut interior_faces = Vec::new();
        let mut boundary_faces = Vec::new();
        let mut deltas = Vec::with_capacity(faces.len());
        let mut weights = Vec::with_capacity(faces.len());

        for (f, face) in faces.iter().enumerate() {
            cell_face_idx[cursor[face.owner]] = f;
            cursor[face.owner] += 1;

            let unit = face.area / face.magnitude();
            let d_of = (face.center - cell_centers[face.owner]).dot(unit).abs();

            match face.neighbor {
                Some(n) => {
                    cell_face_idx[cursor[n]] = f;
                    cursor[n] += 1;
                    interior_faces.push(f);

                    let d_nf = (cell_centers[n] - face.center).dot(unit).abs();
                    let delta = (d_of + d_nf).max(MIN_DISTANCE);
                    deltas.push(delta);
                    weights.push(if d_of + d_nf > MIN_DISTANCE {
                        d_nf / (d_of + d_nf)
                    } else {
                        0.5
                    });
                }
                None => {
                    boundary_faces.push(f);
                    deltas.push(d_of.max(MIN_DISTANCE));
                    weights.push(1.0);
                }
            }
        }

        Ok(Self {
            cell_centers,
            cell_volumes,
            faces,
            patches,
            cell_face_ptr,
            cell_face_idx,
            interior_faces,
            boundary_faces,
            deltas,
            weights,
        })
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cell_volumes.len()
    }

    /// 面数量
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.faces.len()
    }

    /// 单元体积 [m³]
    #[inline]
    pub fn cell_volume(&self, cell: usize) -> f64 {
        self.cell_volumes[cell]
    }

    /// 全部单元体积
    #[inline]
    pub fn cell_volumes(&self) -> &[f64] {
        &self.cell_volumes
    }

    /// 单元中心 [m]
    #[inline]
    pub fn cell_center(&self, cell: usize) -> DVec3 {
        self.cell_centers[cell]
    }

    /// 全部单元中心
    #[inline]
    pub fn cell_centers(&self) -> &[DVec3] {
        &self.cell_centers
    }

    /// 面
    #[inline]
    pub fn face(&self, face: usize) -> &Face {
        &self.faces[face]
    }

    /// 全部面
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// 全部 patch
    #[inline]
    pub fn patches(&self) -> &[Patch] {
        &self.patches
    }

    /// 按名称查找 patch
    pub fn find_patch(&self, name: &str) -> Option<usize> {
        self.patches.iter().position(|p| p.name == name)
    }

    /// 单元的面索引列表
    #[inline]
    pub fn cell_faces(&self, cell: usize) -> &[usize] {
        &self.cell_face_idx[self.cell_face_ptr[cell]..self.cell_face_ptr[cell + 1]]
    }

    /// 内部面索引
    #[inline]
    pub fn interior_faces(&self) -> &[usize] {
        &self.interior_faces
    }

    /// 边界面索引
    #[inline]
    pub fn boundary_faces(&self) -> &[usize] {
        &self.boundary_faces
    }

    /// 面法向中心距：内部面为 owner-neighbor，边界面为 owner-面中心 [m]
    #[inline]
    pub fn delta(&self, face: usize) -> f64 {
        self.deltas[face]
    }

    /// owner 侧线性插值权重
    #[inline]
    pub fn weight(&self, face: usize) -> f64 {
        self.weights[face]
    }

    /// 面是否属于固壁 patch
    #[inline]
    pub fn is_wall_face(&self, face: usize) -> bool {
        self.faces[face]
            .patch
            .map_or(false, |p| self.patches[p].kind == PatchKind::Wall)
    }

    /// 相对于 `cell` 的外法向面积矢量
    #[inline]
    pub fn outward_area(&self, face: usize, cell: usize) -> DVec3 {
        let f = &self.faces[face];
        if f.owner == cell {
            f.area
        } else {
            -f.area
        }
    }

    /// 最近壁面距离（逐壁面中心暴力搜索，面法向投影）
    ///
    /// 供没有自备壁面距离的宿主使用。闭合模型本身只使用调用方传入的距离场。
    pub fn nearest_wall_distance(&self) -> Vec<f64> {
        let walls: Vec<&Face> = self
            .boundary_faces
            .iter()
            .filter(|&&f| self.is_wall_face(f))
            .map(|&f| &self.faces[f])
            .collect();

        self.cell_centers
            .iter()
            .map(|c| {
                walls
                    .iter()
                    .map(|w| {
                        let d = *c - w.center;
                        let n = w.area / w.magnitude();
                        let normal = d.dot(n).abs();
                        let tangential = (d - n * d.dot(n)).length();
                        let half = 0.5 * w.magnitude().sqrt();
                        if tangential <= half {
                            normal
                        } else {
                            d.length()
                        }
                    })
                    .fold(f64::INFINITY, f64::min)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_cell_mesh() -> TcResult<FvMesh> {
        let centers = vec![DVec3::new(0.5, 0.5, 0.5), DVec3::new(1.5, 0.5, 0.5)];
        let volumes = vec![1.0, 1.0];
        let faces = vec![
            Face::interior(0, 1, DVec3::X, DVec3::new(1.0, 0.5, 0.5)),
            Face::boundary(0, 0, -DVec3::X, DVec3::new(0.0, 0.5, 0.5)),
            Face::boundary(1, 1, DVec3::X, DVec3::new(2.0, 0.5, 0.5)),
        ];
        let patches = vec![
            Patch::new("left", PatchKind::Wall),
            Patch::new("right", PatchKind::Outlet),
        ];
        FvMesh::new(centers, volumes, faces, patches)
    }

    #[test]
    fn test_connectivity() {
        let mesh = two_cell_mesh().unwrap();
        assert_eq!(mesh.n_cells(), 2);
        assert_eq!(mesh.interior_faces(), &[0]);
        assert_eq!(mesh.boundary_faces(), &[1, 2]);
        assert_eq!(mesh.cell_faces(0), &[0, 1]);
        assert_eq!(mesh.cell_faces(1), &[0, 2]);
    }

    #[test]
    fn test_geometry() {
        let mesh = two_cell_mesh().unwrap();
        assert!((mesh.delta(0) - 1.0).abs() < 1e-14);
        assert!((mesh.delta(1) - 0.5).abs() < 1e-14);
        assert!((mesh.weight(0) - 0.5).abs() < 1e-14);
        assert_eq!(mesh.outward_area(0, 1), -DVec3::X);
        assert!(mesh.is_wall_face(1));
        assert!(!mesh.is_wall_face(2));
        assert_eq!(mesh.find_patch("right"), Some(1));
    }

    #[test]
    fn test_wall_distance() {
        let mesh = two_cell_mesh().unwrap();
        let y = mesh.nearest_wall_distance();
        assert!((y[0] - 0.5).abs() < 1e-14);
        assert!((y[1] - 1.5).abs() < 1e-14);
    }

    #[test]
    fn test_rejects_bad_owner() {
        let centers = vec![DVec3::ZERO];
        let faces = vec![Face::boundary(3, 0, DVec3::X, DVec3::ZERO)];
        let patches = vec![Patch::new("p", PatchKind::Generic)];
        assert!(FvMesh::new(centers, vec![1.0], faces, patches).is_err());
    }

    #[test]
    fn test_rejects_boundary_without_patch() {
        let centers = vec![DVec3::ZERO];
        let faces = vec![Face {
            owner: 0,
            neighbor: None,
            area: DVec3::X,
            center: DVec3::ZERO,
            patch: None,
        }];
        assert!(FvMesh::new(centers, vec![1.0], faces, vec![]).is_err());
    }

    #[test]
    fn test_rejects_non_positive_volume() {
        let centers = vec![DVec3::ZERO];
        assert!(FvMesh::new(centers, vec![0.0], vec![], vec![]).is_err());
    }
}

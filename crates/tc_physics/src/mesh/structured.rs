// crates/tc_physics/src/mesh/structured.rs

//! 二维矩形结构网格
//!
//! 生成 nx×ny 的单层六面体网格（z 方向厚度为 1，不带前后面），
//! y 方向可按等比级数向南侧壁面加密。边界 patch 固定为
//! `west`/`east`/`south`/`north`，类型可配置。
//!
//! 单元编号 `i + j * nx`；面按 x 向内部面、y 向内部面、
//! 西、东、南、北边界面的顺序排列。

use super::{Face, FvMesh, Patch, PatchKind};
use glam::DVec3;
use tc_foundation::{TcError, TcResult};

/// 西侧 patch 名称
pub const WEST: &str = "west";
/// 东侧 patch 名称
pub const EAST: &str = "east";
/// 南侧 patch 名称
pub const SOUTH: &str = "south";
/// 北侧 patch 名称
pub const NORTH: &str = "north";

/// 结构网格生成器
#[derive(Debug, Clone)]
pub struct StructuredMesh {
    nx: usize,
    ny: usize,
    lx: f64,
    ly: f64,
    /// 相邻单元高度比（>1 向南侧加密）
    grading_y: f64,
    /// 西、东、南、北 patch 类型
    kinds: [PatchKind; 4],
}

impl StructuredMesh {
    /// 创建生成器：默认西入口、东出口、南北固壁
    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> Self {
        Self {
            nx,
            ny,
            lx,
            ly,
            grading_y: 1.0,
            kinds: [
                PatchKind::Inlet,
                PatchKind::Outlet,
                PatchKind::Wall,
                PatchKind::Wall,
            ],
        }
    }

    /// 设置 y 向等比加密比
    pub fn with_grading(mut self, ratio: f64) -> Self {
        self.grading_y = ratio;
        self
    }

    /// 设置 patch 类型（西、东、南、北）
    pub fn with_patch_kinds(
        mut self,
        west: PatchKind,
        east: PatchKind,
        south: PatchKind,
        north: PatchKind,
    ) -> Self {
        self.kinds = [west, east, south, north];
        self
    }

    /// 单元编号
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize) -> usize {
        i + j * self.nx
    }

    /// y 向节点坐标（长度 ny + 1）
    pub fn y_nodes(&self) -> Vec<f64> {
        let r = self.grading_y;
        let mut heights = Vec::with_capacity(self.ny);
        let mut h = 1.0;
        for _ in 0..self.ny {
            heights.push(h);
            h *= r;
        }
        let total: f64 = heights.iter().sum();
        let mut nodes = Vec::with_capacity(self.ny + 1);
        let mut y = 0.0;
        nodes.push(y);
        for h in heights {
            y += h / total * self.ly;
            nodes.push(y);
        }
        if let Some(last) = nodes.last_mut() {
            *last = self.ly;
        }
        nodes
    }

    /// 生成网格
    pub fn build(&self) -> TcResult<FvMesh> {
        if self.nx == 0 || self.ny == 0 {
            return Err(TcError::invalid_mesh("结构网格单元数必须为正"));
        }
        if !(self.lx > 0.0 && self.ly > 0.0 && self.lx.is_finite() && self.ly.is_finite()) {
            return Err(TcError::invalid_mesh("结构网格尺寸必须为正"));
        }
        if !(self.grading_y.is_finite() && self.grading_y > 0.0) {
            return Err(TcError::invalid_mesh("加密比必须为正"));
        }

        let (nx, ny) = (self.nx, self.ny);
        let dx = self.lx / nx as f64;
        let yn = self.y_nodes();
        let z = 0.5;

        let mut centers = Vec::with_capacity(nx * ny);
        let mut volumes = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            let dy = yn[j + 1] - yn[j];
            let yc = 0.5 * (yn[j] + yn[j + 1]);
            for i in 0..nx {
                centers.push(DVec3::new((i as f64 + 0.5) * dx, yc, z));
                volumes.push(dx * dy);
            }
        }

        let mut faces = Vec::new();

        // x 向内部面
        for j in 0..ny {
            let dy = yn[j + 1] - yn[j];
            let yc = 0.5 * (yn[j] + yn[j + 1]);
            for i in 0..nx.saturating_sub(1) {
                faces.push(Face::interior(
                    self.cell_index(i, j),
                    self.cell_index(i + 1, j),
                    DVec3::new(dy, 0.0, 0.0),
                    DVec3::new((i + 1) as f64 * dx, yc, z),
                ));
            }
        }

        // y 向内部面
        for j in 0..ny.saturating_sub(1) {
            for i in 0..nx {
                faces.push(Face::interior(
                    self.cell_index(i, j),
                    self.cell_index(i, j + 1),
                    DVec3::new(0.0, dx, 0.0),
                    DVec3::new((i as f64 + 0.5) * dx, yn[j + 1], z),
                ));
            }
        }

        for j in 0..ny {
            let dy = yn[j + 1] - yn[j];
            let yc = 0.5 * (yn[j] + yn[j + 1]);
            faces.push(Face::boundary(
                self.cell_index(0, j),
                0,
                DVec3::new(-dy, 0.0, 0.0),
                DVec3::new(0.0, yc, z),
            ));
        }
        for j in 0..ny {
            let dy = yn[j + 1] - yn[j];
            let yc = 0.5 * (yn[j] + yn[j + 1]);
            faces.push(Face::boundary(
                self.cell_index(nx - 1, j),
                1,
                DVec3::new(dy, 0.0, 0.0),
                DVec3::new(self.lx, yc, z),
            ));
        }
        for i in 0..nx {
            faces.push(Face::boundary(
                self.cell_index(i, 0),
                2,
                DVec3::new(0.0, -dx, 0.0),
                DVec3::new((i as f64 + 0.5) * dx, 0.0, z),
            ));
        }
        for i in 0..nx {
            faces.push(Face::boundary(
                self.cell_index(i, ny - 1),
                3,
                DVec3::new(0.0, dx, 0.0),
                DVec3::new((i as f64 + 0.5) * dx, self.ly, z),
            ));
        }

        let patches = vec![
            Patch::new(WEST, self.kinds[0]),
            Patch::new(EAST, self.kinds[1]),
            Patch::new(SOUTH, self.kinds[2]),
            Patch::new(NORTH, self.kinds[3]),
        ];

        FvMesh::new(centers, volumes, faces, patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mesh = StructuredMesh::new(4, 3, 2.0, 1.0).build().unwrap();
        assert_eq!(mesh.n_cells(), 12);
        assert_eq!(mesh.interior_faces().len(), 3 * 3 + 4 * 2);
        assert_eq!(mesh.boundary_faces().len(), 2 * 3 + 2 * 4);
        let total: f64 = mesh.cell_volumes().iter().sum();
        assert!((total - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_grading() {
        let gen = StructuredMesh::new(1, 5, 1.0, 1.0).with_grading(1.5);
        let y = gen.y_nodes();
        assert_eq!(y.len(), 6);
        assert!((y[5] - 1.0).abs() < 1e-14);
        let h0 = y[1] - y[0];
        let h1 = y[2] - y[1];
        assert!((h1 / h0 - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_closed_cells() {
        let mesh = StructuredMesh::new(3, 3, 1.0, 1.0).build().unwrap();
        for cell in 0..mesh.n_cells() {
            let sum: DVec3 = mesh
                .cell_faces(cell)
                .iter()
                .map(|&f| mesh.outward_area(f, cell))
                .sum();
            assert!(sum.length() < 1e-12);
        }
    }

    #[test]
    fn test_wall_distance_matches_height() {
        let gen = StructuredMesh::new(2, 4, 1.0, 1.0).with_patch_kinds(
            PatchKind::Inlet,
            PatchKind::Outlet,
            PatchKind::Wall,
            PatchKind::Symmetry,
        );
        let mesh = gen.build().unwrap();
        let y = mesh.nearest_wall_distance();
        for cell in 0..mesh.n_cells() {
            assert!((y[cell] - mesh.cell_center(cell).y).abs() < 1e-12);
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert!(StructuredMesh::new(0, 3, 1.0, 1.0).build().is_err());
    }
}

// crates/nf_mesh/src/mesh.rs

//! 只读网格视图
//!
//! SoA 布局的多面体网格，面按 owner/neighbor 邻接组织。
//! 与计算网格约定一致：内部面在前，边界面在后；`u32::MAX` 表示无邻居。
//!
//! # 字段布局
//!
//! 单元场数组长度为 `n_cells + n_boundary_faces`，边界面 f 的幽灵值
//! 存放于 `ghost_index(f)`。几何量（有向面积、形心、体积）在构建时
//! 由 [`crate::geometry`] 预计算并校验封闭性。

use crate::error::{MeshError, MeshResult};
use crate::geometry;
use nf_foundation::{Scalar, Vector, GREAT, SMALL};
use serde::{Deserialize, Serialize};

/// 无邻居哨兵值
pub const NO_NEIGHBOR: u32 = u32::MAX;

/// 分区面片类型提示
///
/// 来自网格文件的 kind 字段；场级边界条件可覆盖。
/// 名称含 `WALL` 的面片默认按壁面处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PatchKind {
    /// 一般边界（由场的边界条件决定行为）
    #[default]
    Generic,
    /// 固壁
    Wall,
    /// 对称面
    Symmetry,
    /// 周期边界（需配对）
    Cyclic,
}

impl PatchKind {
    /// 大小写不敏感地解析类型名
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GENERIC" | "PATCH" => Some(Self::Generic),
            "WALL" => Some(Self::Wall),
            "SYMMETRY" => Some(Self::Symmetry),
            "CYCLIC" => Some(Self::Cyclic),
            _ => None,
        }
    }
}

/// 边界分区面片
///
/// 一段连续的边界面区间，带名称与类型提示。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patch {
    /// 面片名称（唯一）
    pub name: String,
    /// 起始面索引（全局面编号）
    pub start: usize,
    /// 面数量
    pub count: usize,
    /// 类型提示
    pub kind: PatchKind,
    /// 周期边界的配对面片名
    pub cyclic_partner: Option<String>,
}

impl Patch {
    /// 面索引区间
    #[inline]
    pub fn faces(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.count
    }

    /// 名称是否提示壁面（大小写不敏感地包含 WALL）
    #[inline]
    pub fn is_wall_named(&self) -> bool {
        self.kind == PatchKind::Wall || self.name.to_ascii_uppercase().contains("WALL")
    }
}

/// 只读网格
///
/// 由网格文件读取或结构化生成器构建，构建后不可修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mesh {
    /// 顶点坐标
    pub vertices: Vec<Vector>,

    /// 面-顶点压缩偏移（长度 n_faces + 1）
    pub face_vertex_offsets: Vec<usize>,
    /// 面-顶点索引列表
    pub face_vertex_indices: Vec<u32>,
    /// 面 owner 单元
    pub face_owner: Vec<u32>,
    /// 面 neighbor 单元（NO_NEIGHBOR 表示边界面）
    pub face_neighbor: Vec<u32>,

    /// 单元数
    pub n_cells: usize,
    /// 内部面数
    pub n_interior_faces: usize,

    /// 面有向面积矢量（owner → neighbor / 外法向）
    pub face_area: Vec<Vector>,
    /// 面形心
    pub face_centroid: Vec<Vector>,
    /// 单元体积
    pub cell_volume: Vec<Scalar>,
    /// 单元形心
    pub cell_centroid: Vec<Vector>,

    /// 单元-面压缩偏移（长度 n_cells + 1）
    pub cell_face_offsets: Vec<usize>,
    /// 单元-面索引列表
    pub cell_face_indices: Vec<u32>,

    /// 边界分区面片
    pub patches: Vec<Patch>,
}

impl Mesh {
    /// 由拓扑数据构建网格：预计算几何、建立单元-面邻接并校验完整性
    ///
    /// 要求面已按"内部在前"排序，分区面片恰好覆盖全部边界面。
    pub fn build(
        vertices: Vec<Vector>,
        face_vertex_offsets: Vec<usize>,
        face_vertex_indices: Vec<u32>,
        face_owner: Vec<u32>,
        face_neighbor: Vec<u32>,
        n_cells: usize,
        patches: Vec<Patch>,
    ) -> MeshResult<Self> {
        let n_faces = face_owner.len();
        let n_interior_faces = face_neighbor
            .iter()
            .take_while(|&&n| n != NO_NEIGHBOR)
            .count();

        // 内部面必须连续在前
        for (f, &n) in face_neighbor.iter().enumerate().skip(n_interior_faces) {
            if n != NO_NEIGHBOR {
                return Err(MeshError::BadAdjacency {
                    face: f,
                    reason: "内部面必须位于边界面之前".to_string(),
                });
            }
        }

        let geom = geometry::compute(
            &vertices,
            &face_vertex_offsets,
            &face_vertex_indices,
            &face_owner,
            &face_neighbor,
            n_cells,
        )?;

        let (cell_face_offsets, cell_face_indices) =
            build_cell_faces(&face_owner, &face_neighbor, n_cells);

        let mesh = Self {
            vertices,
            face_vertex_offsets,
            face_vertex_indices,
            face_owner,
            face_neighbor,
            n_cells,
            n_interior_faces,
            face_area: geom.face_area,
            face_centroid: geom.face_centroid,
            cell_volume: geom.cell_volume,
            cell_centroid: geom.cell_centroid,
            cell_face_offsets,
            cell_face_indices,
            patches,
        };

        mesh.validate()?;
        log::debug!(
            "网格构建完成: {} 单元, {} 面 ({} 内部), {} 面片",
            mesh.n_cells,
            n_faces,
            mesh.n_interior_faces,
            mesh.patches.len()
        );
        Ok(mesh)
    }

    /// 面总数
    #[inline]
    pub fn n_faces(&self) -> usize {
        self.face_owner.len()
    }

    /// 边界面数
    #[inline]
    pub fn n_boundary_faces(&self) -> usize {
        self.n_faces() - self.n_interior_faces
    }

    /// 单元场数组总长度（内部 + 幽灵）
    #[inline]
    pub fn n_cells_total(&self) -> usize {
        self.n_cells + self.n_boundary_faces()
    }

    /// 面 owner 单元索引
    #[inline]
    pub fn owner(&self, face: usize) -> usize {
        self.face_owner[face] as usize
    }

    /// 面 neighbor 单元索引（边界面为 None）
    #[inline]
    pub fn neighbor(&self, face: usize) -> Option<usize> {
        let n = self.face_neighbor[face];
        (n != NO_NEIGHBOR).then_some(n as usize)
    }

    /// 面是否为内部面
    #[inline]
    pub fn is_interior(&self, face: usize) -> bool {
        face < self.n_interior_faces
    }

    /// 边界面对应的幽灵单元索引
    #[inline]
    pub fn ghost_index(&self, face: usize) -> usize {
        debug_assert!(face >= self.n_interior_faces, "内部面没有幽灵单元");
        self.n_cells + (face - self.n_interior_faces)
    }

    /// 面"对侧"单元：内部面取 neighbor，边界面取幽灵单元
    #[inline]
    pub fn other_index(&self, face: usize) -> usize {
        match self.neighbor(face) {
            Some(n) => n,
            None => self.ghost_index(face),
        }
    }

    /// 单元关联的面列表
    #[inline]
    pub fn cell_faces(&self, cell: usize) -> &[u32] {
        let s = self.cell_face_offsets[cell];
        let e = self.cell_face_offsets[cell + 1];
        &self.cell_face_indices[s..e]
    }

    /// 面的顶点列表
    #[inline]
    pub fn face_vertices(&self, face: usize) -> &[u32] {
        let s = self.face_vertex_offsets[face];
        let e = self.face_vertex_offsets[face + 1];
        &self.face_vertex_indices[s..e]
    }

    /// 面心间距矢量：owner 形心 → 对侧形心
    ///
    /// 边界面以面心代替对侧形心（幽灵单元几何位置）。
    #[inline]
    pub fn delta(&self, face: usize) -> Vector {
        let o = self.cell_centroid[self.owner(face)];
        match self.neighbor(face) {
            Some(n) => self.cell_centroid[n] - o,
            None => self.face_centroid[face] - o,
        }
    }

    /// 面单位法向（外法向 / owner→neighbor）
    #[inline]
    pub fn unit_normal(&self, face: usize) -> Vector {
        let s = self.face_area[face];
        s / s.length().max(SMALL)
    }

    /// 面线性插值权（owner 侧权重）
    ///
    /// w = |x_f − x_N| / (|x_f − x_O| + |x_f − x_N|)；边界面为 1。
    #[inline]
    pub fn face_weight(&self, face: usize) -> Scalar {
        match self.neighbor(face) {
            Some(n) => {
                let xf = self.face_centroid[face];
                let d_o = (xf - self.cell_centroid[self.owner(face)]).length();
                let d_n = (xf - self.cell_centroid[n]).length();
                let total = d_o + d_n;
                if total < SMALL {
                    0.5
                } else {
                    d_n / total
                }
            }
            None => 1.0,
        }
    }

    /// 按名称查找分区面片
    pub fn patch(&self, name: &str) -> Option<&Patch> {
        self.patches.iter().find(|p| p.name == name)
    }

    /// 查找最接近给定点的单元（探针定位用，线性扫描）
    pub fn find_nearest_cell(&self, p: Vector) -> usize {
        let mut best = 0usize;
        let mut best_d = GREAT;
        for (c, &x) in self.cell_centroid.iter().enumerate() {
            let d = (x - p).length_squared();
            if d < best_d {
                best_d = d;
                best = c;
            }
        }
        best
    }

    /// 完整性校验：邻接、面片覆盖、单元封闭性
    pub fn validate(&self) -> MeshResult<()> {
        let n_faces = self.n_faces();

        // 邻接合法性
        for f in 0..n_faces {
            let o = self.face_owner[f] as usize;
            if o >= self.n_cells {
                return Err(MeshError::BadAdjacency {
                    face: f,
                    reason: format!("owner {} 超出单元数 {}", o, self.n_cells),
                });
            }
            if let Some(n) = self.neighbor(f) {
                if n >= self.n_cells {
                    return Err(MeshError::BadAdjacency {
                        face: f,
                        reason: format!("neighbor {} 超出单元数 {}", n, self.n_cells),
                    });
                }
                if n == o {
                    return Err(MeshError::BadAdjacency {
                        face: f,
                        reason: "owner 与 neighbor 相同".to_string(),
                    });
                }
            }
        }

        // 面片名唯一且恰好覆盖边界面
        let mut covered = vec![false; self.n_boundary_faces()];
        for (i, p) in self.patches.iter().enumerate() {
            if self.patches[..i].iter().any(|q| q.name == p.name) {
                return Err(MeshError::BadPatch(format!("面片名重复: {}", p.name)));
            }
            for f in p.faces() {
                if f < self.n_interior_faces || f >= n_faces {
                    return Err(MeshError::BadPatch(format!(
                        "面片 {} 引用非边界面 {}",
                        p.name, f
                    )));
                }
                let b = f - self.n_interior_faces;
                if covered[b] {
                    return Err(MeshError::BadPatch(format!(
                        "边界面 {} 被多个面片覆盖",
                        f
                    )));
                }
                covered[b] = true;
            }
        }
        if let Some(b) = covered.iter().position(|&c| !c) {
            return Err(MeshError::BadPatch(format!(
                "边界面 {} 不属于任何面片",
                b + self.n_interior_faces
            )));
        }

        // 单元封闭性: Σ ±S_f ≈ 0
        let mut max_area: Scalar = 0.0;
        for s in &self.face_area {
            max_area = max_area.max(s.length());
        }
        let tol = 1e-10 * max_area;
        for c in 0..self.n_cells {
            let mut sum = Vector::ZERO;
            for &f in self.cell_faces(c) {
                let f = f as usize;
                let sign = if self.owner(f) == c { 1.0 } else { -1.0 };
                sum += self.face_area[f] * sign;
            }
            if sum.length() > tol {
                return Err(MeshError::CellNotClosed {
                    cell: c,
                    magnitude: sum.length(),
                    tolerance: tol,
                });
            }
        }

        Ok(())
    }
}

/// 由面邻接建立单元-面 CSR 连接
fn build_cell_faces(
    face_owner: &[u32],
    face_neighbor: &[u32],
    n_cells: usize,
) -> (Vec<usize>, Vec<u32>) {
    let mut counts = vec![0usize; n_cells];
    for f in 0..face_owner.len() {
        counts[face_owner[f] as usize] += 1;
        if face_neighbor[f] != NO_NEIGHBOR {
            counts[face_neighbor[f] as usize] += 1;
        }
    }

    let mut offsets = Vec::with_capacity(n_cells + 1);
    offsets.push(0usize);
    for c in 0..n_cells {
        offsets.push(offsets[c] + counts[c]);
    }

    let mut indices = vec![0u32; offsets[n_cells]];
    let mut cursor = offsets.clone();
    for f in 0..face_owner.len() {
        let o = face_owner[f] as usize;
        indices[cursor[o]] = f as u32;
        cursor[o] += 1;
        if face_neighbor[f] != NO_NEIGHBOR {
            let n = face_neighbor[f] as usize;
            indices[cursor[n]] = f as u32;
            cursor[n] += 1;
        }
    }

    (offsets, indices)
}

#[cfg(test)]
mod tests {
    use crate::generation::BoxMesh;
    use nf_foundation::Vector;

    #[test]
    fn test_box_mesh_counts() {
        let mesh = BoxMesh::new(2, 2, 1).build().unwrap();
        assert_eq!(mesh.n_cells, 4);
        // 内部面: x 方向 2, y 方向 2
        assert_eq!(mesh.n_interior_faces, 4);
        // 边界面: 2*2(z 两侧) * 2 + 4 * 2
        assert_eq!(mesh.n_boundary_faces(), 16);
        assert_eq!(mesh.patches.len(), 6);
    }

    #[test]
    fn test_closure_validated() {
        // build() 内部已做封闭性校验；再显式跑一遍
        let mesh = BoxMesh::new(3, 2, 2).build().unwrap();
        mesh.validate().unwrap();
    }

    #[test]
    fn test_ghost_addressing() {
        let mesh = BoxMesh::new(2, 1, 1).build().unwrap();
        let f = mesh.n_interior_faces; // 第一个边界面
        assert_eq!(mesh.ghost_index(f), mesh.n_cells);
        assert_eq!(mesh.other_index(f), mesh.n_cells);
        assert_eq!(mesh.n_cells_total(), mesh.n_cells + mesh.n_boundary_faces());
    }

    #[test]
    fn test_face_weight_uniform() {
        let mesh = BoxMesh::new(4, 1, 1).build().unwrap();
        // 均匀网格内部面权重应为 0.5
        for f in 0..mesh.n_interior_faces {
            assert!((mesh.face_weight(f) - 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_find_nearest_cell() {
        let mesh = BoxMesh::new(4, 1, 1).with_extent(4.0, 1.0, 1.0).build().unwrap();
        let c = mesh.find_nearest_cell(Vector::new(2.4, 0.5, 0.5));
        assert_eq!(c, 2);
    }
}

// crates/nf_mesh/src/generation.rs

//! 结构化长方体网格生成
//!
//! 生成轴对齐的六面体网格，带六个规范分区面片。
//! 主要供测试、演示算例与 `validate` 命令使用；
//! 生产网格由外部网格协作者提供。

use crate::error::MeshResult;
use crate::mesh::{Mesh, Patch, PatchKind, NO_NEIGHBOR};
use nf_foundation::{Scalar, Vector};

/// 长方体网格构建器
///
/// # 使用示例
///
/// ```
/// use nf_mesh::BoxMesh;
///
/// let mesh = BoxMesh::new(10, 10, 1)
///     .with_extent(1.0, 1.0, 0.1)
///     .with_patch_names(["left", "right", "floor", "lidWALL", "front", "back"])
///     .build()
///     .unwrap();
/// assert_eq!(mesh.n_cells, 100);
/// ```
#[derive(Debug, Clone)]
pub struct BoxMesh {
    nx: usize,
    ny: usize,
    nz: usize,
    extent: Vector,
    origin: Vector,
    /// 面片名，顺序: xmin, xmax, ymin, ymax, zmin, zmax
    patch_names: [String; 6],
}

impl BoxMesh {
    /// 创建单位立方域的构建器
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            nx,
            ny,
            nz,
            extent: Vector::ONE,
            origin: Vector::ZERO,
            patch_names: [
                "xmin".to_string(),
                "xmax".to_string(),
                "ymin".to_string(),
                "ymax".to_string(),
                "zmin".to_string(),
                "zmax".to_string(),
            ],
        }
    }

    /// 设置域尺寸
    pub fn with_extent(mut self, lx: Scalar, ly: Scalar, lz: Scalar) -> Self {
        self.extent = Vector::new(lx, ly, lz);
        self
    }

    /// 设置域原点
    pub fn with_origin(mut self, origin: Vector) -> Self {
        self.origin = origin;
        self
    }

    /// 设置六个面片名（顺序: xmin, xmax, ymin, ymax, zmin, zmax）
    pub fn with_patch_names(mut self, names: [&str; 6]) -> Self {
        self.patch_names = names.map(|s| s.to_string());
        self
    }

    /// 构建网格
    pub fn build(self) -> MeshResult<Mesh> {
        let (nx, ny, nz) = (self.nx, self.ny, self.nz);
        assert!(nx > 0 && ny > 0 && nz > 0, "单元数必须为正");

        let dx = self.extent.x / nx as Scalar;
        let dy = self.extent.y / ny as Scalar;
        let dz = self.extent.z / nz as Scalar;

        let vid = |i: usize, j: usize, k: usize| -> u32 {
            (i + (nx + 1) * (j + (ny + 1) * k)) as u32
        };
        let cid = |i: usize, j: usize, k: usize| -> u32 { (i + nx * (j + ny * k)) as u32 };

        // 顶点
        let mut vertices = Vec::with_capacity((nx + 1) * (ny + 1) * (nz + 1));
        for k in 0..=nz {
            for j in 0..=ny {
                for i in 0..=nx {
                    vertices.push(
                        self.origin
                            + Vector::new(i as Scalar * dx, j as Scalar * dy, k as Scalar * dz),
                    );
                }
            }
        }

        let mut faces = FaceBuf::new();

        // 内部面（法向 +x / +y / +z，owner 为低索引单元）
        for k in 0..nz {
            for j in 0..ny {
                for i in 1..nx {
                    faces.push(
                        [vid(i, j, k), vid(i, j + 1, k), vid(i, j + 1, k + 1), vid(i, j, k + 1)],
                        cid(i - 1, j, k),
                        cid(i, j, k),
                    );
                }
            }
        }
        for k in 0..nz {
            for j in 1..ny {
                for i in 0..nx {
                    faces.push(
                        [vid(i, j, k), vid(i, j, k + 1), vid(i + 1, j, k + 1), vid(i + 1, j, k)],
                        cid(i, j - 1, k),
                        cid(i, j, k),
                    );
                }
            }
        }
        for k in 1..nz {
            for j in 0..ny {
                for i in 0..nx {
                    faces.push(
                        [vid(i, j, k), vid(i + 1, j, k), vid(i + 1, j + 1, k), vid(i, j + 1, k)],
                        cid(i, j, k - 1),
                        cid(i, j, k),
                    );
                }
            }
        }

        // 边界面（外法向），面片顺序: xmin, xmax, ymin, ymax, zmin, zmax
        let mut patches = Vec::with_capacity(6);
        let mut patch_start = faces.len();

        // xmin: 外法向 -x
        for k in 0..nz {
            for j in 0..ny {
                faces.push(
                    [vid(0, j, k + 1), vid(0, j + 1, k + 1), vid(0, j + 1, k), vid(0, j, k)],
                    cid(0, j, k),
                    NO_NEIGHBOR,
                );
            }
        }
        patch_start = close_patch(&mut patches, &self.patch_names[0], patch_start, faces.len());

        // xmax: 外法向 +x
        for k in 0..nz {
            for j in 0..ny {
                faces.push(
                    [vid(nx, j, k), vid(nx, j + 1, k), vid(nx, j + 1, k + 1), vid(nx, j, k + 1)],
                    cid(nx - 1, j, k),
                    NO_NEIGHBOR,
                );
            }
        }
        patch_start = close_patch(&mut patches, &self.patch_names[1], patch_start, faces.len());

        // ymin: 外法向 -y
        for k in 0..nz {
            for i in 0..nx {
                faces.push(
                    [vid(i + 1, 0, k), vid(i + 1, 0, k + 1), vid(i, 0, k + 1), vid(i, 0, k)],
                    cid(i, 0, k),
                    NO_NEIGHBOR,
                );
            }
        }
        patch_start = close_patch(&mut patches, &self.patch_names[2], patch_start, faces.len());

        // ymax: 外法向 +y
        for k in 0..nz {
            for i in 0..nx {
                faces.push(
                    [vid(i, ny, k), vid(i, ny, k + 1), vid(i + 1, ny, k + 1), vid(i + 1, ny, k)],
                    cid(i, ny - 1, k),
                    NO_NEIGHBOR,
                );
            }
        }
        patch_start = close_patch(&mut patches, &self.patch_names[3], patch_start, faces.len());

        // zmin: 外法向 -z
        for j in 0..ny {
            for i in 0..nx {
                faces.push(
                    [vid(i, j + 1, 0), vid(i + 1, j + 1, 0), vid(i + 1, j, 0), vid(i, j, 0)],
                    cid(i, j, 0),
                    NO_NEIGHBOR,
                );
            }
        }
        patch_start = close_patch(&mut patches, &self.patch_names[4], patch_start, faces.len());

        // zmax: 外法向 +z
        for j in 0..ny {
            for i in 0..nx {
                faces.push(
                    [vid(i, j, nz), vid(i + 1, j, nz), vid(i + 1, j + 1, nz), vid(i, j + 1, nz)],
                    cid(i, j, nz - 1),
                    NO_NEIGHBOR,
                );
            }
        }
        close_patch(&mut patches, &self.patch_names[5], patch_start, faces.len());

        Mesh::build(
            vertices,
            faces.offsets,
            faces.indices,
            faces.owner,
            faces.neighbor,
            nx * ny * nz,
            patches,
        )
    }
}

/// 面构建缓冲
struct FaceBuf {
    offsets: Vec<usize>,
    indices: Vec<u32>,
    owner: Vec<u32>,
    neighbor: Vec<u32>,
}

impl FaceBuf {
    fn new() -> Self {
        Self {
            offsets: vec![0],
            indices: Vec::new(),
            owner: Vec::new(),
            neighbor: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.owner.len()
    }

    fn push(&mut self, vs: [u32; 4], o: u32, n: u32) {
        self.indices.extend_from_slice(&vs);
        self.offsets.push(self.indices.len());
        self.owner.push(o);
        self.neighbor.push(n);
    }
}

fn close_patch(patches: &mut Vec<Patch>, name: &str, start: usize, end: usize) -> usize {
    patches.push(Patch {
        name: name.to_string(),
        start,
        count: end - start,
        kind: if name.to_ascii_uppercase().contains("WALL") {
            PatchKind::Wall
        } else {
            PatchKind::Generic
        },
        cyclic_partner: None,
    });
    end
}

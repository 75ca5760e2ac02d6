// crates/nf_io/src/vtk.rs

//! legacy VTK 导出
//!
//! 每进程每写步一个 ASCII legacy 文件 `<case><step>.vtk`
//! （多进程时文件名带进程号）。单元以 VTK_CONVEX_POINT_SET (41)
//! 写出——多面体单元无须固定顶点序，ParaView 按凸包渲染。
//! 场数据按 CELL_DATA 写出：标量为 SCALARS，向量为 VECTORS。

use crate::error::{IoError, IoResult};
use nf_core::field::Field;
use nf_foundation::{Scalar, Vector};
use nf_mesh::Mesh;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 可导出的场引用
pub enum VtkField<'a> {
    /// 标量场
    Scalar(&'a Field<Scalar>),
    /// 向量场
    Vector(&'a Field<Vector>),
}

/// VTK 导出器
#[derive(Debug, Clone)]
pub struct VtkWriter {
    /// 输出目录
    dir: PathBuf,
    /// 算例名（文件名前缀）
    case_name: String,
    /// 进程号（多进程时进入文件名）
    rank: usize,
    /// 进程总数
    size: usize,
}

impl VtkWriter {
    /// 创建导出器
    pub fn new(dir: &Path, case_name: impl Into<String>, rank: usize, size: usize) -> Self {
        Self {
            dir: dir.to_path_buf(),
            case_name: case_name.into(),
            rank,
            size,
        }
    }

    /// 写步文件路径
    pub fn path_for(&self, step: usize) -> PathBuf {
        let name = if self.size > 1 {
            format!("{}{}_r{}.vtk", self.case_name, step, self.rank)
        } else {
            format!("{}{}.vtk", self.case_name, step)
        };
        self.dir.join(name)
    }

    /// 写出一个时间步
    pub fn write(&self, mesh: &Mesh, step: usize, fields: &[VtkField<'_>]) -> IoResult<()> {
        let path = self.path_for(step);
        let file = File::create(&path).map_err(|e| IoError::io(&path, e))?;
        let mut w = BufWriter::new(file);
        let io_err = |e: std::io::Error| IoError::io(&path, e);

        writeln!(w, "# vtk DataFile Version 2.0").map_err(io_err)?;
        writeln!(w, "{} step {}", self.case_name, step).map_err(io_err)?;
        writeln!(w, "ASCII").map_err(io_err)?;
        writeln!(w, "DATASET UNSTRUCTURED_GRID").map_err(io_err)?;

        writeln!(w, "POINTS {} double", mesh.vertices.len()).map_err(io_err)?;
        for v in &mesh.vertices {
            writeln!(w, "{:.9e} {:.9e} {:.9e}", v.x, v.y, v.z).map_err(io_err)?;
        }

        // 单元顶点集合（面顶点并集，升序去重）
        let cell_vertices: Vec<Vec<u32>> = (0..mesh.n_cells)
            .map(|c| {
                let mut vs: Vec<u32> = mesh
                    .cell_faces(c)
                    .iter()
                    .flat_map(|&f| mesh.face_vertices(f as usize).iter().copied())
                    .collect();
                vs.sort_unstable();
                vs.dedup();
                vs
            })
            .collect();

        let total: usize = cell_vertices.iter().map(|vs| vs.len() + 1).sum();
        writeln!(w, "CELLS {} {}", mesh.n_cells, total).map_err(io_err)?;
        for vs in &cell_vertices {
            write!(w, "{}", vs.len()).map_err(io_err)?;
            for &v in vs {
                write!(w, " {}", v).map_err(io_err)?;
            }
            writeln!(w).map_err(io_err)?;
        }

        writeln!(w, "CELL_TYPES {}", mesh.n_cells).map_err(io_err)?;
        for _ in 0..mesh.n_cells {
            writeln!(w, "41").map_err(io_err)?;
        }

        writeln!(w, "CELL_DATA {}", mesh.n_cells).map_err(io_err)?;
        for field in fields {
            match field {
                VtkField::Scalar(f) => {
                    writeln!(w, "SCALARS {} double 1", f.name).map_err(io_err)?;
                    writeln!(w, "LOOKUP_TABLE default").map_err(io_err)?;
                    for c in 0..mesh.n_cells {
                        writeln!(w, "{:.9e}", f[c]).map_err(io_err)?;
                    }
                }
                VtkField::Vector(f) => {
                    writeln!(w, "VECTORS {} double", f.name).map_err(io_err)?;
                    for c in 0..mesh.n_cells {
                        let v = f[c];
                        writeln!(w, "{:.9e} {:.9e} {:.9e}", v.x, v.y, v.z).map_err(io_err)?;
                    }
                }
            }
        }

        log::debug!("VTK 写出: {}", path.display());
        Ok(())
    }
}

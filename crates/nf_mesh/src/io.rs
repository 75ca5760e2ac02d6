// crates/nf_mesh/src/io.rs

//! 网格文件读写
//!
//! 每个算例目录含三个文本文件：`vertices`、`faces`、`patches`。
//! 多进程运行时网格目录按进程号加后缀（`<mesh>0`, `<mesh>1`, ...），
//! 由调用方通过 [`mesh_dir`] 解析。
//!
//! # 格式
//!
//! 数组统一采用 `N { ... }` 包裹：
//!
//! ```text
//! vertices:  每行  x y z
//! faces:     每行  nv v0 .. v(nv-1) owner neighbor   (边界面 neighbor = -1)
//! patches:   每行  name kind start count [cyclic_partner]
//! ```
//!
//! 面必须已按"内部在前"排序；面片 start/count 以全局面编号计。

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Mesh, Patch, PatchKind, NO_NEIGHBOR};
use nf_foundation::Vector;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// 解析网格目录：多进程时追加进程号后缀
pub fn mesh_dir(base: &Path, rank: usize, size: usize) -> PathBuf {
    if size > 1 {
        let mut s = base.as_os_str().to_os_string();
        s.push(rank.to_string());
        PathBuf::from(s)
    } else {
        base.to_path_buf()
    }
}

/// 从目录读取网格
pub fn read_mesh(dir: &Path) -> MeshResult<Mesh> {
    let vertices = read_vertices(&dir.join("vertices"))?;
    let (offsets, indices, owner, neighbor) = read_faces(&dir.join("faces"))?;
    let patches = read_patches(&dir.join("patches"))?;

    let n_cells = owner
        .iter()
        .chain(neighbor.iter().filter(|&&n| n != NO_NEIGHBOR))
        .map(|&c| c as usize + 1)
        .max()
        .unwrap_or(0);

    log::info!(
        "读取网格 {}: {} 顶点, {} 面, {} 单元",
        dir.display(),
        vertices.len(),
        owner.len(),
        n_cells
    );

    Mesh::build(vertices, offsets, indices, owner, neighbor, n_cells, patches)
}

/// 将网格写入目录（生成算例与测试用）
pub fn write_mesh(mesh: &Mesh, dir: &Path) -> MeshResult<()> {
    fs::create_dir_all(dir).map_err(|e| MeshError::ReadFailed {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let io_err = |path: &Path, e: std::io::Error| MeshError::ReadFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let path = dir.join("vertices");
    let mut out = String::new();
    out.push_str(&format!("{}\n{{\n", mesh.vertices.len()));
    for v in &mesh.vertices {
        out.push_str(&format!("{:.15e} {:.15e} {:.15e}\n", v.x, v.y, v.z));
    }
    out.push_str("}\n");
    fs::write(&path, out).map_err(|e| io_err(&path, e))?;

    let path = dir.join("faces");
    let mut w = Vec::new();
    writeln!(w, "{}\n{{", mesh.n_faces()).ok();
    for f in 0..mesh.n_faces() {
        let vs = mesh.face_vertices(f);
        write!(w, "{}", vs.len()).ok();
        for &v in vs {
            write!(w, " {}", v).ok();
        }
        let n = mesh.face_neighbor[f];
        let n = if n == NO_NEIGHBOR { -1 } else { n as i64 };
        writeln!(w, " {} {}", mesh.face_owner[f], n).ok();
    }
    writeln!(w, "}}").ok();
    fs::write(&path, w).map_err(|e| io_err(&path, e))?;

    let path = dir.join("patches");
    let mut out = String::new();
    out.push_str(&format!("{}\n{{\n", mesh.patches.len()));
    for p in &mesh.patches {
        let kind = match p.kind {
            PatchKind::Generic => "GENERIC",
            PatchKind::Wall => "WALL",
            PatchKind::Symmetry => "SYMMETRY",
            PatchKind::Cyclic => "CYCLIC",
        };
        out.push_str(&format!("{} {} {} {}", p.name, kind, p.start, p.count));
        if let Some(partner) = &p.cyclic_partner {
            out.push_str(&format!(" {}", partner));
        }
        out.push('\n');
    }
    out.push_str("}\n");
    fs::write(&path, out).map_err(|e| io_err(&path, e))?;

    Ok(())
}

// ============================================================
// 解析
// ============================================================

/// 逐行 token 读取器，跳过 `{` / `}` 与空行
struct Tokens {
    path: PathBuf,
    lines: Vec<(usize, Vec<String>)>,
    cursor: usize,
}

impl Tokens {
    fn load(path: &Path) -> MeshResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| MeshError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut lines = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let toks: Vec<String> = raw
                .split_whitespace()
                .filter(|t| *t != "{" && *t != "}")
                .map(|t| t.to_string())
                .collect();
            if !toks.is_empty() {
                lines.push((i + 1, toks));
            }
        }
        Ok(Self {
            path: path.to_path_buf(),
            lines,
            cursor: 0,
        })
    }

    fn next_line(&mut self) -> MeshResult<(usize, Vec<String>)> {
        if self.cursor >= self.lines.len() {
            return Err(MeshError::ParseFailed {
                path: self.path.clone(),
                line: self.lines.last().map(|(l, _)| *l).unwrap_or(0),
                reason: "文件提前结束".to_string(),
            });
        }
        let (line, toks) = self.lines[self.cursor].clone();
        self.cursor += 1;
        Ok((line, toks))
    }

    fn error(&self, line: usize, reason: impl Into<String>) -> MeshError {
        MeshError::ParseFailed {
            path: self.path.clone(),
            line,
            reason: reason.into(),
        }
    }
}

fn read_vertices(path: &Path) -> MeshResult<Vec<Vector>> {
    let mut toks = Tokens::load(path)?;
    let (line, head) = toks.next_line()?;
    let n: usize = head[0]
        .parse()
        .map_err(|_| toks.error(line, "顶点数不可解析"))?;

    let mut vertices = Vec::with_capacity(n);
    for _ in 0..n {
        let (line, t) = toks.next_line()?;
        if t.len() < 3 {
            return Err(toks.error(line, "顶点行需要 3 个坐标"));
        }
        let parse = |s: &str| s.parse::<f64>().map_err(|_| toks.error(line, "坐标不可解析"));
        vertices.push(Vector::new(parse(&t[0])?, parse(&t[1])?, parse(&t[2])?));
    }
    Ok(vertices)
}

type FacesData = (Vec<usize>, Vec<u32>, Vec<u32>, Vec<u32>);

fn read_faces(path: &Path) -> MeshResult<FacesData> {
    let mut toks = Tokens::load(path)?;
    let (line, head) = toks.next_line()?;
    let n: usize = head[0]
        .parse()
        .map_err(|_| toks.error(line, "面数不可解析"))?;

    let mut offsets = vec![0usize];
    let mut indices = Vec::new();
    let mut owner = Vec::with_capacity(n);
    let mut neighbor = Vec::with_capacity(n);

    for _ in 0..n {
        let (line, t) = toks.next_line()?;
        let nv: usize = t[0]
            .parse()
            .map_err(|_| toks.error(line, "面顶点数不可解析"))?;
        if t.len() != nv + 3 {
            return Err(toks.error(line, format!("面行需要 {} 个 token", nv + 3)));
        }
        for s in &t[1..=nv] {
            let v: u32 = s.parse().map_err(|_| toks.error(line, "顶点索引不可解析"))?;
            indices.push(v);
        }
        offsets.push(indices.len());
        let o: u32 = t[nv + 1]
            .parse()
            .map_err(|_| toks.error(line, "owner 不可解析"))?;
        let nb: i64 = t[nv + 2]
            .parse()
            .map_err(|_| toks.error(line, "neighbor 不可解析"))?;
        owner.push(o);
        neighbor.push(if nb < 0 { NO_NEIGHBOR } else { nb as u32 });
    }
    Ok((offsets, indices, owner, neighbor))
}

fn read_patches(path: &Path) -> MeshResult<Vec<Patch>> {
    let mut toks = Tokens::load(path)?;
    let (line, head) = toks.next_line()?;
    let n: usize = head[0]
        .parse()
        .map_err(|_| toks.error(line, "面片数不可解析"))?;

    let mut patches = Vec::with_capacity(n);
    for _ in 0..n {
        let (line, t) = toks.next_line()?;
        if t.len() < 4 {
            return Err(toks.error(line, "面片行需要 name kind start count"));
        }
        let kind = PatchKind::parse(&t[1])
            .ok_or_else(|| toks.error(line, format!("未知面片类型: {}", t[1])))?;
        let start: usize = t[2]
            .parse()
            .map_err(|_| toks.error(line, "start 不可解析"))?;
        let count: usize = t[3]
            .parse()
            .map_err(|_| toks.error(line, "count 不可解析"))?;
        patches.push(Patch {
            name: t[0].clone(),
            start,
            count,
            kind,
            cyclic_partner: t.get(4).cloned(),
        });
    }
    Ok(patches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::BoxMesh;

    #[test]
    fn test_mesh_dir_rank_suffix() {
        let base = Path::new("cavity/grid");
        assert_eq!(mesh_dir(base, 0, 1), PathBuf::from("cavity/grid"));
        assert_eq!(mesh_dir(base, 2, 4), PathBuf::from("cavity/grid2"));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let mesh = BoxMesh::new(3, 2, 1).with_extent(3.0, 2.0, 1.0).build().unwrap();
        let dir = std::env::temp_dir().join("nf_mesh_roundtrip_test");
        write_mesh(&mesh, &dir).unwrap();
        let back = read_mesh(&dir).unwrap();

        assert_eq!(back.n_cells, mesh.n_cells);
        assert_eq!(back.n_interior_faces, mesh.n_interior_faces);
        assert_eq!(back.patches.len(), mesh.patches.len());
        for c in 0..mesh.n_cells {
            assert!((back.cell_volume[c] - mesh.cell_volume[c]).abs() < 1e-12);
        }
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = read_mesh(Path::new("/nonexistent/nf_mesh")).unwrap_err();
        assert!(matches!(err, MeshError::ReadFailed { .. }));
    }
}

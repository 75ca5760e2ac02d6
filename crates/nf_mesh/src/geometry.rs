// crates/nf_mesh/src/geometry.rs

//! 网格几何量预计算
//!
//! 由顶点与面-顶点拓扑计算：
//! - 面有向面积矢量与面形心（三角扇分解）
//! - 单元体积与形心（以面形心均值为参考点的金字塔分解）
//!
//! 有向面积約定：右手系沿面顶点顺序，指向 owner → neighbor（边界面为外法向）。

use crate::error::{MeshError, MeshResult};
use nf_foundation::{Scalar, Vector, SMALL};

/// 预计算结果
pub struct Precomputed {
    /// 面有向面积矢量
    pub face_area: Vec<Vector>,
    /// 面形心
    pub face_centroid: Vec<Vector>,
    /// 单元体积
    pub cell_volume: Vec<Scalar>,
    /// 单元形心
    pub cell_centroid: Vec<Vector>,
}

/// 计算全部几何量
pub fn compute(
    vertices: &[Vector],
    face_vertex_offsets: &[usize],
    face_vertex_indices: &[u32],
    face_owner: &[u32],
    face_neighbor: &[u32],
    n_cells: usize,
) -> MeshResult<Precomputed> {
    let n_faces = face_owner.len();
    let mut face_area = Vec::with_capacity(n_faces);
    let mut face_centroid = Vec::with_capacity(n_faces);

    for f in 0..n_faces {
        let vs = &face_vertex_indices[face_vertex_offsets[f]..face_vertex_offsets[f + 1]];
        if vs.len() < 3 {
            return Err(MeshError::Degenerate(format!("面 {} 顶点数不足", f)));
        }
        let (area, centroid) = face_geometry(vertices, vs);
        if area.length() < SMALL {
            return Err(MeshError::Degenerate(format!("面 {} 面积为零", f)));
        }
        face_area.push(area);
        face_centroid.push(centroid);
    }

    // 以面形心均值为参考点做金字塔分解
    let mut ref_point = vec![Vector::ZERO; n_cells];
    let mut ref_count = vec![0usize; n_cells];
    for f in 0..n_faces {
        let o = face_owner[f] as usize;
        ref_point[o] += face_centroid[f];
        ref_count[o] += 1;
        if face_neighbor[f] != u32::MAX {
            let n = face_neighbor[f] as usize;
            ref_point[n] += face_centroid[f];
            ref_count[n] += 1;
        }
    }
    for c in 0..n_cells {
        if ref_count[c] < 4 {
            return Err(MeshError::Degenerate(format!(
                "单元 {} 面数不足 ({})",
                c, ref_count[c]
            )));
        }
        ref_point[c] /= ref_count[c] as Scalar;
    }

    let mut cell_volume = vec![0.0; n_cells];
    let mut cell_centroid = vec![Vector::ZERO; n_cells];
    for f in 0..n_faces {
        let xf = face_centroid[f];
        let sf = face_area[f];
        let mut accumulate = |c: usize, sign: Scalar| {
            // 金字塔体积 = (x_f - x_ref)·S_f / 3（S_f 指向外侧时为正）
            let d = xf - ref_point[c];
            let vol = sign * d.dot(sf) / 3.0;
            // 金字塔形心位于参考点与底面形心连线 3/4 处
            let centroid = ref_point[c] + 0.75 * d;
            cell_volume[c] += vol;
            cell_centroid[c] += centroid * vol;
        };
        accumulate(face_owner[f] as usize, 1.0);
        if face_neighbor[f] != u32::MAX {
            accumulate(face_neighbor[f] as usize, -1.0);
        }
    }

    for c in 0..n_cells {
        if cell_volume[c] < SMALL {
            return Err(MeshError::Degenerate(format!(
                "单元 {} 体积非正: {:.3e}",
                c, cell_volume[c]
            )));
        }
        cell_centroid[c] /= cell_volume[c];
    }

    Ok(Precomputed {
        face_area,
        face_centroid,
        cell_volume,
        cell_centroid,
    })
}

/// 单个多边形面的有向面积与形心（三角扇分解）
fn face_geometry(vertices: &[Vector], vs: &[u32]) -> (Vector, Vector) {
    // 顶点均值作为扇心，对非平面面更稳健
    let mut fan_center = Vector::ZERO;
    for &v in vs {
        fan_center += vertices[v as usize];
    }
    fan_center /= vs.len() as Scalar;

    let mut area = Vector::ZERO;
    let mut centroid = Vector::ZERO;
    let mut total_mag = 0.0;
    for i in 0..vs.len() {
        let a = vertices[vs[i] as usize];
        let b = vertices[vs[(i + 1) % vs.len()] as usize];
        let tri = 0.5 * (a - fan_center).cross(b - fan_center);
        let mag = tri.length();
        area += tri;
        centroid += (fan_center + a + b) / 3.0 * mag;
        total_mag += mag;
    }

    if total_mag < SMALL {
        (area, fan_center)
    } else {
        (area, centroid / total_mag)
    }
}

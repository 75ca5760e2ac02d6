// crates/nf_core/src/ops/lap.rs

//! 拉普拉斯算子
//!
//! `lap(φ, γ)` 返回 `∇·(γ∇φ)` 的体积分矩阵。面法向扩散采用
//! 过松弛分解：正交部分 `γ·|S|²/(S·d)` 进非对角与对角，
//! 非正交余项以当前梯度显式进源项；驱动的 n_ORTHO 外循环
//! 用最新 φ 重组装以收敛该修正。数值对称（Symmetric）。
//!
//! 注意本算子对角为负（正拉普拉斯），驱动中以 `M -= lap` 或
//! 由求解入口做符号归一后求解。

use super::grad::component_gradients;
use crate::field::{bc::BcKind, FaceField, Field, FieldElem};
use crate::matrix::{MatrixShape, MeshMatrix};
use nf_foundation::{Scalar, SMALL};
use nf_mesh::Mesh;
use std::sync::Arc;

/// 隐式拉普拉斯 `∇·(γ∇φ)`
///
/// 组装前须已调用 `update_explicit_bcs`。
pub fn lap<T: FieldElem>(
    mesh: Arc<Mesh>,
    phi: &Field<T>,
    gamma: &FaceField<Scalar>,
) -> MeshMatrix<T> {
    let mut m = MeshMatrix::zero(mesh.clone(), MatrixShape::Symmetric);

    // 内部面正交部分
    for f in 0..mesh.n_interior_faces {
        let o = mesh.owner(f);
        let n = mesh.neighbor(f).expect("内部面必有邻居");
        let s = mesh.face_area[f];
        let d = mesh.delta(f);
        let dcoef = gamma[f] * s.length_squared() / d.dot(s).max(SMALL);

        m.ap[o] -= dcoef;
        m.ap[n] -= dcoef;
        m.an_owner[f] -= dcoef;
        m.an_neigh[f] -= dcoef;
    }

    // 非正交余项（仅在网格确有偏斜时计算梯度）
    if has_nonorthogonal_face(&mesh) {
        let grads = component_gradients(&mesh, phi);
        for f in 0..mesh.n_interior_faces {
            let o = mesh.owner(f);
            let n = mesh.neighbor(f).expect("内部面必有邻居");
            let s = mesh.face_area[f];
            let d = mesh.delta(f);
            let k = s - d * (s.length_squared() / d.dot(s).max(SMALL));
            if k.length() < 1e-12 * s.length() {
                continue;
            }
            let w = mesh.face_weight(f);
            let mut comps = [0.0; 9];
            for (i, g) in grads.iter().enumerate() {
                let g_f = g[o] * w + g[n] * (1.0 - w);
                comps[i] = gamma[f] * k.dot(g_f);
            }
            let t = T::from_components(&comps[..T::N_COMPONENTS]);
            // 正拉普拉斯含 +γ k·∇φ，显式折入后 su 得 −t
            m.su[o] -= t;
            m.su[n] += t;
        }
    }

    // 边界面
    for patch in &mesh.patches {
        let bc = phi.bcs.iter().find(|b| b.patch == patch.name);
        for f in patch.faces() {
            let o = mesh.owner(f);
            let s = mesh.face_area[f];
            let d = mesh.delta(f);
            let dcoef = gamma[f] * s.length_squared() / d.dot(s).max(SMALL);
            let ghost = phi.data[mesh.ghost_index(f)];

            match bc.map(|b| b.kind) {
                Some(BcKind::Neumann) => {
                    // +γ·g·|S| 与 φ 无关
                    let g = bc.expect("上一行已判断").gradient;
                    m.su[o] -= g * (gamma[f] * s.length());
                }
                _ => {
                    // +D(φ_g − φ_c)：内部值隐式，幽灵值显式
                    m.ap[o] -= dcoef;
                    m.su[o] -= ghost * dcoef;
                }
            }
        }
    }

    m
}

fn has_nonorthogonal_face(mesh: &Mesh) -> bool {
    for f in 0..mesh.n_interior_faces {
        let s = mesh.face_area[f];
        let d = mesh.delta(f);
        let k = s - d * (s.length_squared() / d.dot(s).max(SMALL));
        if k.length() > 1e-10 * s.length() {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::bc::{update_explicit_bcs, BCondition};
    use crate::field::Access;
    use nf_mesh::BoxMesh;

    fn setup(n: usize) -> (Arc<Mesh>, Field<Scalar>) {
        let mesh = Arc::new(BoxMesh::new(n, n, 1).build().unwrap());
        let mut t = Field::<Scalar>::new(&mesh, "phi", Access::None);
        for p in &mesh.patches {
            t.add_bc(BCondition::zero_gradient(&p.name));
        }
        update_explicit_bcs(&mut t, &mesh).unwrap();
        (mesh, t)
    }

    #[test]
    fn test_laplacian_is_symmetric() {
        let (mesh, t) = setup(3);
        let gamma = FaceField::<Scalar>::uniform(&mesh, 2.5);
        let m = lap(mesh.clone(), &t, &gamma);
        assert_eq!(m.shape, MatrixShape::Symmetric);
        for f in 0..mesh.n_interior_faces {
            assert!(
                (m.an_owner[f] - m.an_neigh[f]).abs() < 1e-14,
                "拉普拉斯面系数必须对称"
            );
        }
    }

    #[test]
    fn test_pure_neumann_rows_are_conservative() {
        // 全零梯度边界：行和为零（离散守恒）
        let (mesh, t) = setup(3);
        let gamma = FaceField::<Scalar>::uniform(&mesh, 1.0);
        let m = lap(mesh, &t, &gamma);
        for s in m.row_sums() {
            assert!(s.abs() < 1e-12);
        }
    }

    #[test]
    fn test_uniform_gamma_interior_coefficient() {
        let (mesh, t) = setup(2);
        let gamma = FaceField::<Scalar>::uniform(&mesh, 1.0);
        let m = lap(mesh.clone(), &t, &gamma);
        // h = 0.5：内部面面积 0.5，|S|² = 0.25，S·d = 0.5·0.5 = 0.25 → D = 1
        for f in 0..mesh.n_interior_faces {
            assert!((m.an_owner[f] + 1.0).abs() < 1e-12);
        }
    }
}

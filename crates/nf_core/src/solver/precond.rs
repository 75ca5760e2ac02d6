// crates/nf_core/src/solver/precond.rs

//! 预条件器
//!
//! - [`Precond::Jacobi`]: 对角倒数，始终可用
//! - [`Precond::Sor`]: 对称 Gauss–Seidel 扫掠（前向 + 后向），
//!   直接作用于面邻接矩阵，无需显式分解
//!
//! 显式分派的标签变体，与求解器在同一矩阵上无矩阵协作。

use crate::field::FieldElem;
use crate::matrix::MeshMatrix;
use nf_foundation::{Scalar, SMALL};

/// 预条件算子 z = M⁻¹·r
pub enum Precond<'a, T: FieldElem> {
    /// 对角（Jacobi）
    Jacobi {
        /// 对角倒数
        inv_ap: Vec<Scalar>,
    },
    /// 对称逐次松弛扫掠
    Sor {
        /// 被预条件的矩阵
        matrix: &'a MeshMatrix<T>,
    },
}

impl<'a, T: FieldElem> Precond<'a, T> {
    /// 由矩阵构建 Jacobi 预条件器
    pub fn jacobi(m: &MeshMatrix<T>) -> Self {
        Self::Jacobi {
            inv_ap: m
                .ap
                .iter()
                .map(|&a| {
                    if a.abs() < SMALL {
                        0.0
                    } else {
                        1.0 / a
                    }
                })
                .collect(),
        }
    }

    /// 由矩阵构建 SOR 预条件器
    pub fn sor(m: &'a MeshMatrix<T>) -> Self {
        Self::Sor { matrix: m }
    }

    /// 应用预条件
    pub fn apply(&self, r: &[T], z: &mut [T]) {
        match self {
            Self::Jacobi { inv_ap } => {
                for c in 0..r.len() {
                    z[c] = r[c] * inv_ap[c];
                }
            }
            Self::Sor { matrix } => {
                let m = matrix;
                let mesh = &m.mesh;
                let n = r.len();

                // 前向扫掠
                for zc in z.iter_mut() {
                    *zc = T::zero();
                }
                for c in 0..n {
                    let mut acc = r[c];
                    for &f in mesh.cell_faces(c) {
                        let f = f as usize;
                        if !mesh.is_interior(f) {
                            continue;
                        }
                        let (an, other) = if mesh.owner(f) == c {
                            (m.an_owner[f], mesh.neighbor(f).expect("内部面必有邻居"))
                        } else {
                            (m.an_neigh[f], mesh.owner(f))
                        };
                        acc += z[other] * an;
                    }
                    z[c] = acc / m.ap[c];
                }

                // 后向扫掠
                for c in (0..n).rev() {
                    let mut acc = r[c];
                    for &f in mesh.cell_faces(c) {
                        let f = f as usize;
                        if !mesh.is_interior(f) {
                            continue;
                        }
                        let (an, other) = if mesh.owner(f) == c {
                            (m.an_owner[f], mesh.neighbor(f).expect("内部面必有邻居"))
                        } else {
                            (m.an_neigh[f], mesh.owner(f))
                        };
                        acc += z[other] * an;
                    }
                    z[c] = acc / m.ap[c];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixShape;
    use nf_mesh::BoxMesh;
    use std::sync::Arc;

    fn diag_matrix() -> MeshMatrix<Scalar> {
        let mesh = Arc::new(BoxMesh::new(3, 1, 1).build().unwrap());
        let mut m = MeshMatrix::<Scalar>::zero(mesh, MatrixShape::Symmetric);
        m.ap = vec![2.0, 4.0, 8.0];
        m
    }

    #[test]
    fn test_jacobi_inverts_diagonal() {
        let m = diag_matrix();
        let p = Precond::jacobi(&m);
        let r = vec![2.0, 4.0, 8.0];
        let mut z = vec![0.0; 3];
        p.apply(&r, &mut z);
        assert_eq!(z, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_sor_exact_on_diagonal_matrix() {
        // 无非对角时 SOR 与 Jacobi 等价
        let m = diag_matrix();
        let p = Precond::sor(&m);
        let r = vec![2.0, 4.0, 8.0];
        let mut z = vec![0.0; 3];
        p.apply(&r, &mut z);
        assert_eq!(z, vec![1.0, 1.0, 1.0]);
    }
}

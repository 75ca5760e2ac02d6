// crates/nf_core/src/ops/ddt.rs

//! 时间导数算子
//!
//! `ddt(φ, ρ)`: 对角加 `ρV/Δt`，源项加 `ρV·φⁿ/Δt`。
//! Crank–Nicolson 由驱动对已组装矩阵做 θ 改写
//! （见 `MeshMatrix::crank_nicolson`）。

use crate::field::{Field, FieldElem};
use crate::matrix::{MatrixShape, MeshMatrix};
use nf_foundation::Scalar;
use nf_mesh::Mesh;
use std::sync::Arc;

/// 一阶欧拉时间导数的体积分矩阵
pub fn ddt<T: FieldElem>(
    mesh: Arc<Mesh>,
    phi: &Field<T>,
    rho: Scalar,
    dt: Scalar,
) -> MeshMatrix<T> {
    debug_assert!(dt > 0.0, "时间步长必须为正");
    let mut m = MeshMatrix::zero(mesh.clone(), MatrixShape::Symmetric);
    for c in 0..mesh.n_cells {
        let coeff = rho * mesh.cell_volume[c] / dt;
        m.ap[c] += coeff;
        m.su[c] += phi[c] * coeff;
    }
    m
}

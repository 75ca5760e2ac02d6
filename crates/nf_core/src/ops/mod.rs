// crates/nf_core/src/ops/mod.rs

//! 微分算子
//!
//! 每个算子都是自由函数，显式接收网格句柄；隐式形式返回
//! [`crate::matrix::MeshMatrix`]，显式形式返回场。
//!
//! - [`grad`] / [`grad_vec`]: Green-Gauss 梯度（含偏斜修正）
//! - [`div`] / [`div_flux`]: 显式散度；[`div_matrix`]: 隐式对流-扩散
//! - [`lap`]: 隐式拉普拉斯（过松弛正交分解，偏斜部分入源项）
//! - [`ddt`]: 时间导数
//! - [`flx`] / [`flx_rhie_chow`]: 面通量（含 Rhie-Chow 修正）

mod ddt;
mod div;
mod flux;
mod grad;
mod lap;

pub use ddt::ddt;
pub use div::{div, div_flux, div_matrix};
pub use flux::{flx, flx_rhie_chow};
pub use grad::{component_gradients, grad, grad_vec};
pub use lap::lap;

use crate::field::{FaceField, Field, FieldElem};
use nf_mesh::Mesh;

/// 单元数超过该阈值时梯度走并行路径
pub(crate) const PARALLEL_THRESHOLD: usize = 4096;

/// 面上的线性插值值
///
/// 内部面按距离权重混合 owner/neighbor，边界面取幽灵值。
#[inline]
pub fn face_value<T: FieldElem>(mesh: &Mesh, field: &Field<T>, f: usize) -> T {
    match mesh.neighbor(f) {
        Some(n) => {
            let w = mesh.face_weight(f);
            field[mesh.owner(f)] * w + field[n] * (1.0 - w)
        }
        None => field[mesh.ghost_index(f)],
    }
}

/// 整场面插值
pub fn face_interpolate<T: FieldElem>(mesh: &Mesh, field: &Field<T>) -> FaceField<T> {
    FaceField {
        data: (0..mesh.n_faces())
            .map(|f| face_value(mesh, field, f))
            .collect(),
    }
}

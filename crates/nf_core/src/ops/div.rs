// crates/nf_core/src/ops/div.rs

//! 散度算子
//!
//! 显式形式返回单位体积散度场；隐式形式 `div_matrix` 组装
//! 对流-扩散联合算子 `∇·(Fφ) − ∇·(μ∇φ)` 的体积分矩阵：
//! 对流系数按全局格式选择器取迎风 / 中心 / TVD（高阶部分
//! 延迟修正入源项，保持对角占优），扩散正交部分入非对角，
//! 偏斜修正入源项。
//!
//! 边界面按该场的边界条件折叠：定梯度精确折入源项，其余
//! 类型以当前幽灵值显式处理（随外迭代收敛）。

use super::grad::component_gradients;
use crate::controls::ConvectionScheme;
use crate::field::{bc::BcKind, FaceField, Field, FieldElem};
use crate::matrix::{MatrixShape, MeshMatrix};
use nf_foundation::{Scalar, Vector, SMALL};
use nf_mesh::Mesh;
use std::sync::Arc;

/// 显式散度 ∇·U（单位体积）
pub fn div(mesh: &Mesh, u: &Field<Vector>) -> Field<Scalar> {
    let mut out = Field::<Scalar>::work(mesh);
    for c in 0..mesh.n_cells {
        let mut acc = 0.0;
        for &f in mesh.cell_faces(c) {
            let f = f as usize;
            let sign = if mesh.owner(f) == c { 1.0 } else { -1.0 };
            let uf = super::face_value(mesh, u, f);
            acc += sign * uf.dot(mesh.face_area[f]);
        }
        out[c] = acc / mesh.cell_volume[c];
    }
    out
}

/// 面通量的散度（单位体积）
pub fn div_flux(mesh: &Mesh, flux: &FaceField<Scalar>) -> Field<Scalar> {
    let mut out = Field::<Scalar>::work(mesh);
    for f in 0..mesh.n_faces() {
        let o = mesh.owner(f);
        out[o] += flux[f];
        if let Some(n) = mesh.neighbor(f) {
            out[n] -= flux[f];
        }
    }
    for c in 0..mesh.n_cells {
        out[c] /= mesh.cell_volume[c];
    }
    out
}

/// 隐式对流-扩散算子
///
/// - `flux`: 面质量通量 F（按面法向号）
/// - `mu`: 面扩散系数
/// - `scheme`: 对流格式
///
/// 组装前须已调用 `update_explicit_bcs`（幽灵值与 BC 区间就绪）。
pub fn div_matrix<T: FieldElem>(
    mesh: Arc<Mesh>,
    phi: &Field<T>,
    flux: &FaceField<Scalar>,
    mu: &FaceField<Scalar>,
    scheme: ConvectionScheme,
) -> MeshMatrix<T> {
    let mut m = MeshMatrix::zero(mesh.clone(), MatrixShape::Asymmetric);

    // TVD 需要各分量梯度做比率因子
    let grads = match scheme {
        ConvectionScheme::Tvd(_) => Some(component_gradients(&mesh, phi)),
        _ => None,
    };

    // 内部面
    for f in 0..mesh.n_interior_faces {
        let o = mesh.owner(f);
        let n = mesh.neighbor(f).expect("内部面必有邻居");
        let s = mesh.face_area[f];
        let d = mesh.delta(f);
        let fl = flux[f];

        // 过松弛正交系数
        let dcoef = mu[f] * s.length_squared() / d.dot(s).max(SMALL);

        m.ap[o] += dcoef;
        m.ap[n] += dcoef;
        m.an_owner[f] += dcoef;
        m.an_neigh[f] += dcoef;

        match scheme {
            ConvectionScheme::Upwind | ConvectionScheme::Tvd(_) => {
                m.ap[o] += fl.max(0.0);
                m.an_owner[f] += (-fl).max(0.0);
                m.ap[n] += (-fl).max(0.0);
                m.an_neigh[f] += fl.max(0.0);
            }
            ConvectionScheme::Central => {
                let w = mesh.face_weight(f);
                m.ap[o] += w * fl;
                m.an_owner[f] += -(1.0 - w) * fl;
                m.ap[n] += -(1.0 - w) * fl;
                m.an_neigh[f] += w * fl;
            }
        }

        // TVD 高阶部分：延迟修正入源项
        if let (ConvectionScheme::Tvd(limiter), Some(grads)) = (scheme, grads.as_ref()) {
            let (up, down, dir) = if fl >= 0.0 { (o, n, 1.0) } else { (n, o, -1.0) };
            let d_ud = mesh.delta(f) * dir;
            let mut corr = [0.0; 9];
            for (i, g) in grads.iter().enumerate() {
                let dphi = phi.data[down].component(i) - phi.data[up].component(i);
                if dphi.abs() < SMALL {
                    continue;
                }
                let r = 2.0 * g[up].dot(d_ud) / dphi - 1.0;
                corr[i] = fl * 0.5 * limiter.psi(r) * dphi;
            }
            let h = T::from_components(&corr[..T::N_COMPONENTS]);
            m.su[o] -= h;
            m.su[n] += h;
        }

        // 偏斜修正：μ·k·(∇φ)_f 显式入源项
        if let Some(grads) = grads.as_ref() {
            add_skew(&mesh, &mut m, f, o, Some(n), mu[f], grads);
        }
    }

    // 未启用 TVD 时偏斜修正仍然需要梯度：仅在网格确有偏斜时计算
    if grads.is_none() && mesh_has_nonorthogonality(&mesh) {
        let grads = component_gradients(&mesh, phi);
        for f in 0..mesh.n_interior_faces {
            let o = mesh.owner(f);
            let n = mesh.neighbor(f).expect("内部面必有邻居");
            add_skew(&mesh, &mut m, f, o, Some(n), mu[f], &grads);
        }
    }

    // 边界面折叠
    fold_boundary(&mesh, &mut m, phi, flux, mu);

    m
}

/// 过松弛分解的非正交余项入源项
fn add_skew<T: FieldElem>(
    mesh: &Mesh,
    m: &mut MeshMatrix<T>,
    f: usize,
    o: usize,
    n: Option<usize>,
    mu_f: Scalar,
    grads: &[Field<Vector>],
) {
    let s = mesh.face_area[f];
    let d = mesh.delta(f);
    let k = s - d * (s.length_squared() / d.dot(s).max(SMALL));
    if k.length() < 1e-12 * s.length() {
        return;
    }

    let w = mesh.face_weight(f);
    let mut comps = [0.0; 9];
    for (i, g) in grads.iter().enumerate() {
        let g_f = match n {
            Some(n) => g[o] * w + g[n] * (1.0 - w),
            None => g[o],
        };
        comps[i] = mu_f * k.dot(g_f);
    }
    let t = T::from_components(&comps[..T::N_COMPONENTS]);
    // 对流-扩散算子含 −μ k·∇φ，显式折入后源项得 +t
    m.su[o] += t;
    if let Some(n) = n {
        m.su[n] -= t;
    }
}

/// 网格是否存在非正交面
fn mesh_has_nonorthogonality(mesh: &Mesh) -> bool {
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

/// 边界系数折叠
fn fold_boundary<T: FieldElem>(
    mesh: &Mesh,
    m: &mut MeshMatrix<T>,
    phi: &Field<T>,
    flux: &FaceField<Scalar>,
    mu: &FaceField<Scalar>,
) {
    for patch in &mesh.patches {
        let bc = phi.bcs.iter().find(|b| b.patch == patch.name);
        for f in patch.faces() {
            let o = mesh.owner(f);
            let s = mesh.face_area[f];
            let d = mesh.delta(f);
            let dcoef = mu[f] * s.length_squared() / d.dot(s).max(SMALL);
            let fl = flux[f];
            let ghost = phi.data[mesh.ghost_index(f)];

            // 对流：出流迎风取内部值（隐式），入流取幽灵值（显式）
            if fl >= 0.0 {
                m.ap[o] += fl;
            } else {
                m.su[o] -= ghost * fl;
            }

            // 扩散
            match bc.map(|b| b.kind) {
                Some(BcKind::Neumann) => {
                    // 精确折入：−μ·g·|S| 与 φ 无关
                    let g = bc.expect("上一行已判断").gradient;
                    m.su[o] += g * (mu[f] * s.length());
                }
                _ => {
                    // 幽灵值显式 + 内部值隐式
                    m.ap[o] += dcoef;
                    m.su[o] += ghost * dcoef;
                }
            }
        }
    }
}

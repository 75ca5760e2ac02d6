// crates/nf_solvers/src/turbulence/mod.rs

//! 湍流模型族
//!
//! 带标签的变体显式分派，无虚表。每个模型携带自己的状态，
//! 对核心只暴露固定的两方法能力集：
//!
//! - [`TurbulenceModel::add_turbulent_stress`]: 向动量矩阵加入
//!   湍流应力（隐式 `−∇·(μ_t∇U)` + 显式转置项 `∇·(μ_t(∇U)ᵀ)`）
//! - [`TurbulenceModel::solve`]: 用最新的 U 与 F 推进模型自身的
//!   输运方程（代数模型只刷新涡黏）
//!
//! 代数模型（混合长度、LES）需要壁面距离，由驱动在启动时注入。

mod kx;
mod les;
mod mixing_length;

pub use kx::{KxCoeffs, KxModel, KxVariant};
pub use les::SmagorinskyModel;
pub use mixing_length::MixingLengthModel;

use crate::SolverResult;
use nf_config::TurbulenceKind;
use nf_core::field::{FaceField, Field};
use nf_core::ops;
use nf_core::{Context, MeshMatrix};
use nf_foundation::{Scalar, Vector};
use nf_mesh::Mesh;

/// 湍流模型（带标签变体，显式分派）
pub enum TurbulenceModel {
    /// 层流：两方法均为空操作
    None,
    /// 混合长度代数模型
    MixingLength(MixingLengthModel),
    /// k-ε / k-ω 两方程族（系数集区分变体）
    Kx(KxModel),
    /// Smagorinsky 大涡模拟
    Les(SmagorinskyModel),
}

impl TurbulenceModel {
    /// 由配置构建模型
    pub fn from_kind(kind: TurbulenceKind, mesh: &Mesh) -> Self {
        match kind {
            TurbulenceKind::None => Self::None,
            TurbulenceKind::MixingLength => Self::MixingLength(MixingLengthModel::new(mesh)),
            TurbulenceKind::KEpsilon => Self::Kx(KxModel::new(mesh, KxVariant::KEpsilon)),
            TurbulenceKind::RngKEpsilon => Self::Kx(KxModel::new(mesh, KxVariant::RngKEpsilon)),
            TurbulenceKind::RealizableKEpsilon => {
                Self::Kx(KxModel::new(mesh, KxVariant::RealizableKEpsilon))
            }
            TurbulenceKind::KOmega => Self::Kx(KxModel::new(mesh, KxVariant::KOmega)),
            TurbulenceKind::Les => Self::Les(SmagorinskyModel::new(mesh)),
        }
    }

    /// 是否需要壁面距离
    pub fn needs_wall_distance(&self) -> bool {
        matches!(self, Self::MixingLength(_) | Self::Les(_))
    }

    /// 注入壁面距离场
    pub fn set_wall_distance(&mut self, y: Field<Scalar>) {
        match self {
            Self::MixingLength(m) => m.y_wall = Some(y),
            Self::Les(m) => m.y_wall = Some(y),
            _ => {}
        }
    }

    /// 当前涡黏（层流为 None）
    pub fn eddy_viscosity(&self) -> Option<&Field<Scalar>> {
        match self {
            Self::None => None,
            Self::MixingLength(m) => Some(&m.mu_t),
            Self::Kx(m) => Some(&m.mu_t),
            Self::Les(m) => Some(&m.mu_t),
        }
    }

    /// 向动量矩阵加入湍流应力
    pub fn add_turbulent_stress(
        &self,
        ctx: &Context,
        m: &mut MeshMatrix<Vector>,
        u: &Field<Vector>,
    ) {
        if let Some(mu_t) = self.eddy_viscosity() {
            add_eddy_stress(ctx, m, u, mu_t);
        }
    }

    /// 推进模型自身的输运方程（代数模型只刷新涡黏）
    pub fn solve(
        &mut self,
        ctx: &Context,
        u: &Field<Vector>,
        flux: &FaceField<Scalar>,
    ) -> SolverResult<()> {
        match self {
            Self::None => Ok(()),
            Self::MixingLength(m) => {
                m.update(ctx, u);
                Ok(())
            }
            Self::Kx(m) => m.solve(ctx, u, flux),
            Self::Les(m) => {
                m.update(ctx, u);
                Ok(())
            }
        }
    }
}

/// 涡黏应力组装（各模型共用）
///
/// 隐式部分为 `−∇·(μ_t∇U)`（拉普拉斯取负加入矩阵），
/// 转置项 `∇·(μ_t(∇U)ᵀ)` 以当前速度显式进源项。
fn add_eddy_stress(
    ctx: &Context,
    m: &mut MeshMatrix<Vector>,
    u: &Field<Vector>,
    mu_t: &Field<Scalar>,
) {
    let mesh = &ctx.mesh;
    let mu_face = ops::face_interpolate(mesh, mu_t);

    let mut visc = ops::lap(ctx.mesh.clone(), u, &mu_face);
    visc.scale(-1.0);
    *m += visc;

    // 转置项：面通量 μ_t·(∇U)ᵀ·S 的散度（体积分）
    let g = ops::grad_vec(mesh, u);
    for f in 0..mesh.n_faces() {
        let o = mesh.owner(f);
        let g_f = match mesh.neighbor(f) {
            Some(n) => {
                let w = mesh.face_weight(f);
                let go = g[o];
                let gn = g[n];
                go * w + gn * (1.0 - w)
            }
            None => g[mesh.ghost_index(f)],
        };
        let t = g_f.transpose().dot_vec(mesh.face_area[f]) * mu_face[f];
        m.su[o] += t;
        if let Some(n) = mesh.neighbor(f) {
            m.su[n] -= t;
        }
    }
}

/// 应变率模方：2·S:S，S 为速度梯度的对称部分
pub(crate) fn strain_rate_sq(mesh: &Mesh, u: &Field<Vector>) -> Field<Scalar> {
    let g = ops::grad_vec(mesh, u);
    let mut out = Field::<Scalar>::work(mesh);
    for c in 0..mesh.n_cells {
        let s = g[c].symm();
        out[c] = 2.0 * s.double_dot();
    }
    out.fill_boundary(mesh);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::field::bc::{update_explicit_bcs, BCondition};
    use nf_core::field::Access;
    use nf_core::MatrixShape;
    use nf_mesh::BoxMesh;
    use std::sync::Arc;

    #[test]
    fn test_none_model_is_noop() {
        let mesh = Arc::new(BoxMesh::new(2, 2, 1).build().unwrap());
        let ctx = Context::new(mesh.clone());
        let mut model = TurbulenceModel::from_kind(TurbulenceKind::None, &mesh);
        assert!(!model.needs_wall_distance());
        assert!(model.eddy_viscosity().is_none());

        let mut u = Field::<Vector>::new(&mesh, "U", Access::None);
        for p in &mesh.patches {
            u.add_bc(BCondition::wall(&p.name, Vector::ZERO));
        }
        update_explicit_bcs(&mut u, &mesh).unwrap();

        let mut m = MeshMatrix::<Vector>::zero(mesh.clone(), MatrixShape::Asymmetric);
        let before = m.ap.clone();
        model.add_turbulent_stress(&ctx, &mut m, &u);
        assert_eq!(m.ap, before);

        let flux = FaceField::uniform(&mesh, 0.0);
        model.solve(&ctx, &u, &flux).unwrap();
    }

    #[test]
    fn test_eddy_stress_strengthens_diagonal() {
        let mesh = Arc::new(BoxMesh::new(3, 3, 1).build().unwrap());
        let ctx = Context::new(mesh.clone());
        let mut u = Field::<Vector>::new(&mesh, "U", Access::None);
        for p in &mesh.patches {
            u.add_bc(BCondition::wall(&p.name, Vector::ZERO));
        }
        update_explicit_bcs(&mut u, &mesh).unwrap();

        let mut mu_t = Field::<Scalar>::uniform(&mesh, "mut", Access::None, 0.1);
        mu_t.fill_boundary(&mesh);

        let mut m = MeshMatrix::<Vector>::zero(mesh.clone(), MatrixShape::Asymmetric);
        add_eddy_stress(&ctx, &mut m, &u, &mu_t);
        for c in 0..mesh.n_cells {
            assert!(m.ap[c] > 0.0, "涡黏扩散必须加强对角");
        }
    }

    #[test]
    fn test_strain_rate_of_uniform_flow_is_zero() {
        let mesh = BoxMesh::new(3, 3, 1).build().unwrap();
        let mut u = Field::<Vector>::uniform(&mesh, "U", Access::None, Vector::new(2.0, 0.0, 0.0));
        u.fill_boundary(&mesh);
        let s = strain_rate_sq(&mesh, &u);
        for c in 0..mesh.n_cells {
            assert!(s[c].abs() < 1e-12);
        }
    }
}

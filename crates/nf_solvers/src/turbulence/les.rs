// crates/nf_solvers/src/turbulence/les.rs

//! Smagorinsky 亚格子模型
//!
//! `μ_t = ρ·(C_s·Δ)²·|S|`，滤波尺度 Δ = V^{1/3}。
//! 近壁以 κ·y_wall 封顶亚格子长度（Van Driest 风格的简化阻尼），
//! 涡黏上下限钳制防止个别畸形单元污染动量矩阵。
//! 启用后 PISO 驱动可累计运行平均统计。

use crate::turbulence::strain_rate_sq;
use nf_core::field::Field;
use nf_core::{Access, Context};
use nf_foundation::{Scalar, Vector};
use nf_mesh::Mesh;

/// 默认 Smagorinsky 常数
pub const DEFAULT_CS: Scalar = 0.15;
/// 涡黏上限
const MU_T_MAX: Scalar = 1e3;

/// Smagorinsky 模型
pub struct SmagorinskyModel {
    /// 涡黏
    pub mu_t: Field<Scalar>,
    /// 壁面距离（驱动注入）
    pub y_wall: Option<Field<Scalar>>,
    /// Smagorinsky 常数
    pub cs: Scalar,
    /// von Kármán 常数（近壁封顶）
    pub kappa: Scalar,
}

impl SmagorinskyModel {
    /// 构建（壁面距离待注入）
    pub fn new(mesh: &Mesh) -> Self {
        Self {
            mu_t: Field::<Scalar>::uniform(mesh, "mut", Access::Write, 0.0),
            y_wall: None,
            cs: DEFAULT_CS,
            kappa: 0.41,
        }
    }

    /// 按最新速度刷新涡黏
    pub fn update(&mut self, ctx: &Context, u: &Field<Vector>) {
        let mesh = &ctx.mesh;
        let s2 = strain_rate_sq(mesh, u);
        let rho = ctx.props.rho;
        for c in 0..mesh.n_cells {
            let delta = mesh.cell_volume[c].cbrt();
            let mut l = self.cs * delta;
            if let Some(y) = self.y_wall.as_ref() {
                l = l.min(self.kappa * y[c]);
            }
            self.mu_t[c] = (rho * l * l * s2[c].sqrt()).clamp(0.0, MU_T_MAX);
        }
        self.mu_t.fill_boundary(mesh);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_mesh::BoxMesh;
    use std::sync::Arc;

    #[test]
    fn test_smagorinsky_scaling_with_shear() {
        let mesh = Arc::new(BoxMesh::new(2, 2, 2).build().unwrap());
        let ctx = Context::new(mesh.clone());
        let mut model = SmagorinskyModel::new(&mesh);

        // 线性剪切 U = (2y, 0, 0) → |S| = 2
        let mut u = Field::<Vector>::new(&mesh, "U", Access::None);
        for c in 0..mesh.n_cells {
            u[c] = Vector::new(2.0 * mesh.cell_centroid[c].y, 0.0, 0.0);
        }
        for f in mesh.n_interior_faces..mesh.n_faces() {
            u.data[mesh.ghost_index(f)] = Vector::new(2.0 * mesh.face_centroid[f].y, 0.0, 0.0);
        }
        model.update(&ctx, &u);

        // Δ = (0.5³)^{1/3} = 0.5 → μ_t = (0.15·0.5)²·2
        let expect = (0.15_f64 * 0.5).powi(2) * 2.0;
        for c in 0..mesh.n_cells {
            assert!((model.mu_t[c] - expect).abs() < 1e-9);
        }
    }

    #[test]
    fn test_near_wall_cap() {
        let mesh = Arc::new(BoxMesh::new(2, 2, 2).build().unwrap());
        let ctx = Context::new(mesh.clone());
        let mut model = SmagorinskyModel::new(&mesh);
        // 贴壁: κ·y 远小于 C_s·Δ
        model.y_wall = Some(Field::<Scalar>::uniform(&mesh, "yWall", Access::None, 1e-3));

        let mut u = Field::<Vector>::new(&mesh, "U", Access::None);
        for c in 0..mesh.n_cells {
            u[c] = Vector::new(mesh.cell_centroid[c].y, 0.0, 0.0);
        }
        u.fill_boundary(&mesh);
        model.update(&ctx, &u);

        let l = 0.41 * 1e-3;
        for c in 0..mesh.n_cells {
            assert!(model.mu_t[c] <= l * l * 1.5 + 1e-12);
        }
    }
}

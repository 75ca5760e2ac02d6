// crates/nf_solvers/src/turbulence/mixing_length.rs

//! 混合长度代数模型
//!
//! `μ_t = ρ·l²·|S|`，混合长度 `l = min(κ·y_wall, l_max)`。
//! 无输运方程；每次 `solve` 只按最新速度刷新涡黏。
//! 需要启动时注入壁面距离。

use crate::turbulence::strain_rate_sq;
use nf_core::field::Field;
use nf_core::{Access, Context};
use nf_foundation::{Scalar, Vector};
use nf_mesh::Mesh;

/// 混合长度模型
pub struct MixingLengthModel {
    /// 涡黏
    pub mu_t: Field<Scalar>,
    /// 壁面距离（驱动注入）
    pub y_wall: Option<Field<Scalar>>,
    /// von Kármán 常数
    pub kappa: Scalar,
    /// 混合长度上限
    pub l_max: Scalar,
}

impl MixingLengthModel {
    /// 构建（壁面距离待注入）
    pub fn new(mesh: &Mesh) -> Self {
        Self {
            mu_t: Field::<Scalar>::uniform(mesh, "mut", Access::Write, 0.0),
            y_wall: None,
            kappa: 0.41,
            l_max: 0.09,
        }
    }

    /// 按最新速度刷新涡黏
    pub fn update(&mut self, ctx: &Context, u: &Field<Vector>) {
        let mesh = &ctx.mesh;
        let s2 = strain_rate_sq(mesh, u);
        let rho = ctx.props.rho;
        for c in 0..mesh.n_cells {
            let y = self
                .y_wall
                .as_ref()
                .map(|f| f[c])
                .unwrap_or(self.l_max / self.kappa);
            let l = (self.kappa * y).min(self.l_max);
            self.mu_t[c] = rho * l * l * s2[c].sqrt();
        }
        self.mu_t.fill_boundary(mesh);
    }
}

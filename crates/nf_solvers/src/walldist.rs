// crates/nf_solvers/src/walldist.rs

//! 壁面距离
//!
//! 求解 Poisson 方程 `∇·∇φ = −1`（单位体积），φ 在 WALL 面片为零、
//! 其余零梯度；近壁距离由
//! `y = √(|∇φ|² + 2φ) − |∇φ|`
//! 恢复。湍流模型请求时在启动期运行一次。

use crate::error::SolverResult;
use nf_core::field::bc::{update_explicit_bcs, BCondition};
use nf_core::field::{FaceField, Field};
use nf_core::ops;
use nf_core::{Access, Context, Equation};
use nf_foundation::Scalar;

/// 计算壁面距离场
pub fn calc_wall_distance(ctx: &Context) -> SolverResult<Field<Scalar>> {
    let mesh = &ctx.mesh;

    let mut phi = Field::<Scalar>::new(mesh, "phi", Access::None);
    for patch in &mesh.patches {
        if patch.is_wall_named() {
            phi.add_bc(BCondition::dirichlet(&patch.name, 0.0));
        } else {
            phi.add_bc(BCondition::zero_gradient(&patch.name));
        }
    }
    update_explicit_bcs(&mut phi, mesh)?;

    let one = FaceField::<Scalar>::uniform(mesh, 1.0);
    let minus_one = Field::<Scalar>::uniform(mesh, "", Access::None, -1.0);
    let m = ops::lap(ctx.mesh.clone(), &phi, &one);
    let out = Equation::new(m).with_rhs(&minus_one).solve(&mut phi, ctx);
    if !out.converged() {
        log::warn!("壁面距离 Poisson 求解未收敛 (残差 {:.3e})", out.residual);
    }
    update_explicit_bcs(&mut phi, mesh)?;

    let g = ops::grad(mesh, &phi);
    let mut y = Field::<Scalar>::new(mesh, "yWall", Access::Write);
    for c in 0..mesh.n_cells_total() {
        let gm = g.data[c].length();
        let val = (gm * gm + 2.0 * phi.data[c].max(0.0)).sqrt() - gm;
        y.data[c] = val.max(0.0);
    }
    Ok(y)
}

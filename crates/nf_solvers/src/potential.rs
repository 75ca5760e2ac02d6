// crates/nf_solvers/src/potential.rs

//! 势流初始化
//!
//! 内部场清零后求解 `∇·∇p = ∇·U`（n_ORTHO 次非正交重组装），
//! 再以 `U ← U − ∇p` 修正，得到满足连续性的无旋初始速度场。
//! 边界速度由读入场的边界条件给定。

use crate::error::SolverResult;
use crate::{checkpoint, StepRange};
use nf_config::CaseFile;
use nf_core::field::bc::{add_default_bcs, update_explicit_bcs, BCondition};
use nf_core::field::{FaceField, Field};
use nf_core::ops;
use nf_core::{Access, Context, Equation};
use nf_foundation::{Scalar, Vector};
use std::path::Path;

/// 在就绪的速度/压力场上执行势流校正
pub fn solve_potential(
    ctx: &Context,
    u: &mut Field<Vector>,
    p: &mut Field<Scalar>,
    n_ortho: usize,
) -> SolverResult<()> {
    let mesh = ctx.mesh.clone();

    // 内部场清零，边界值保留
    u.set_internal(Vector::ZERO);
    p.set_internal(0.0);
    update_explicit_bcs(u, &mesh)?;
    update_explicit_bcs(p, &mesh)?;

    let div_u = ops::div(&mesh, u);
    let one = FaceField::<Scalar>::uniform(&mesh, 1.0);
    for _ in 0..=n_ortho {
        update_explicit_bcs(p, &mesh)?;
        let m = ops::lap(mesh.clone(), p, &one);
        let out = Equation::new(m).with_rhs(&div_u).solve(p, ctx);
        if !out.converged() {
            log::warn!("势流 Poisson 求解未收敛 (残差 {:.3e})", out.residual);
        }
    }
    update_explicit_bcs(p, &mesh)?;

    let grad_p = ops::grad(&mesh, p);
    for c in 0..mesh.n_cells {
        u[c] -= grad_p[c];
    }
    update_explicit_bcs(u, &mesh)?;
    Ok(())
}

/// 势流驱动：读初始场、校正、写出
pub fn run_potential(ctx: &Context, case: &CaseFile, io_dir: &Path) -> SolverResult<()> {
    let mesh = ctx.mesh.clone();
    let steps = StepRange::from_controls(&ctx.controls);

    let mut u = Field::<Vector>::new(&mesh, "U", Access::ReadWrite);
    add_default_bcs(&mut u, &mesh, |n| BCondition::wall(n, Vector::ZERO), |n| BCondition::zero_gradient(n));
    checkpoint::read_initial_vector(ctx, io_dir, steps.read_step, &mut u)?;

    let mut p = Field::<Scalar>::new(&mesh, "p", Access::Read);
    add_default_bcs(&mut p, &mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));
    checkpoint::read_initial_scalar(ctx, io_dir, steps.read_step, &mut p)?;

    solve_potential(ctx, &mut u, &mut p, case.potential.n_ortho)?;

    let set = checkpoint::FieldSet {
        scalars: vec![],
        vectors: vec![&u],
    };
    checkpoint::write_step(ctx, io_dir, "potential", steps.read_step, &set);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_mesh::BoxMesh;
    use std::sync::Arc;

    #[test]
    fn test_uniform_inlet_recovers_uniform_flow() {
        // 直通道，入口 U=(1,0,0)、出口零梯度: 校正后内部近似均匀来流且无散度
        let mesh = Arc::new(
            BoxMesh::new(10, 4, 1)
                .with_extent(1.0, 0.4, 0.1)
                .with_patch_names(["inlet", "outlet", "botWALL", "topWALL", "front", "back"])
                .build()
                .unwrap(),
        );
        let mut ctx = Context::new(mesh.clone());
        ctx.controls.tolerance = 1e-10;
        ctx.controls.max_iterations = 4000;

        let mut u = Field::<Vector>::new(&mesh, "U", Access::None);
        u.add_bc(BCondition::dirichlet("inlet", Vector::new(1.0, 0.0, 0.0)));
        u.add_bc(BCondition::zero_gradient("outlet"));
        u.add_bc(BCondition::symmetry("botWALL"));
        u.add_bc(BCondition::symmetry("topWALL"));
        u.add_bc(BCondition::symmetry("front"));
        u.add_bc(BCondition::symmetry("back"));

        let mut p = Field::<Scalar>::new(&mesh, "p", Access::None);
        add_default_bcs(&mut p, &mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));
        // 出口压力参考，钉住 Poisson 的常数模态
        for bc in p.bcs.iter_mut() {
            if bc.patch == "outlet" {
                *bc = BCondition::dirichlet("outlet", 0.0);
            }
        }

        solve_potential(&ctx, &mut u, &mut p, 1).unwrap();

        // 散度残差显著小于来流通量尺度
        let d = ops::div(&mesh, &u);
        for c in 0..mesh.n_cells {
            assert!(d[c].abs() < 0.05, "单元 {} 散度 {}", c, d[c]);
        }
    }
}

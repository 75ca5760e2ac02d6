// crates/nf_solvers/tests/determinism.rs

//! 串行确定性
//!
//! 同一算例从同一初值重复运行必须逐位一致（残差历史与场值）。
//! 分区一致性（1 进程 vs 多进程）依赖同一性质，待分布式通信器
//! 接入后在其测试中复用这里的比较逻辑。

use nf_core::controls::TimeState;
use nf_core::field::bc::{add_default_bcs, BCondition};
use nf_core::field::Field;
use nf_core::{Access, Context};
use nf_foundation::{Scalar, Vector};
use nf_mesh::BoxMesh;
use nf_solvers::{PisoConfig, PisoSolver};
use std::sync::Arc;

fn build_solver(ctx: &Context) -> PisoSolver {
    let mesh = &ctx.mesh;
    let mut u = Field::<Vector>::new(mesh, "U", Access::ReadWrite);
    u.add_bc(BCondition::wall("lid", Vector::new(1.0, 0.0, 0.0)));
    add_default_bcs(
        &mut u,
        mesh,
        |n| BCondition::wall(n, Vector::ZERO),
        |n| BCondition::symmetry(n),
    );
    let mut p = Field::<Scalar>::new(mesh, "p", Access::ReadWrite);
    add_default_bcs(&mut p, mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));
    PisoSolver::new(ctx, PisoConfig { n_piso: 2, ..PisoConfig::default() }, u, p).unwrap()
}

#[test]
fn repeated_runs_are_bitwise_identical() {
    let mesh = Arc::new(
        BoxMesh::new(8, 8, 1)
            .with_extent(1.0, 1.0, 0.125)
            .with_patch_names(["leftWALL", "rightWALL", "bottomWALL", "lid", "front", "back"])
            .build()
            .unwrap(),
    );
    let mut ctx = Context::new(mesh.clone());
    ctx.props.viscosity = 0.01;
    ctx.controls.state = TimeState::Steady;
    ctx.controls.tolerance = 1e-8;
    ctx.controls.max_iterations = 400;

    let run = |ctx: &Context| -> (Vec<Vector>, Vec<Scalar>, Vec<Scalar>) {
        let mut solver = build_solver(ctx);
        let mut residuals = Vec::new();
        for step in 1..=10 {
            let stats = solver.advance(ctx, step).unwrap();
            residuals.push(stats.momentum.initial_residual);
        }
        (
            solver.u.internal().to_vec(),
            solver.p.internal().to_vec(),
            residuals,
        )
    };

    let (u1, p1, r1) = run(&ctx);
    let (u2, p2, r2) = run(&ctx);

    assert_eq!(r1, r2, "残差历史必须逐位一致");
    for c in 0..u1.len() {
        assert_eq!(u1[c], u2[c], "速度场单元 {} 不一致", c);
        assert_eq!(p1[c], p2[c], "压力场单元 {} 不一致", c);
    }
}

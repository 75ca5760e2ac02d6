// crates/nf_solvers/tests/cavity.rs

//! 盖驱动方腔验证（Re = 100）
//!
//! 快速算例在常规测试中运行；与 Ghia 基准曲线的定量比较
//! 标记 `#[ignore]`，作为长时验证手工触发：
//! `cargo test --release -- --ignored`

use nf_core::controls::{ConvectionScheme, Limiter, TimeState};
use nf_core::field::bc::{add_default_bcs, BCondition};
use nf_core::field::Field;
use nf_core::{Access, Context};
use nf_foundation::{Scalar, Vector};
use nf_mesh::BoxMesh;
use nf_solvers::{PisoConfig, PisoSolver};
use std::sync::Arc;

/// Re = 100 的方腔上下文：U_lid = 1, L = 1, ν = 0.01
fn cavity_context(n: usize) -> Context {
    let mesh = Arc::new(
        BoxMesh::new(n, n, 1)
            .with_extent(1.0, 1.0, 1.0 / n as Scalar)
            .with_patch_names([
                "leftWALL",
                "rightWALL",
                "bottomWALL",
                "lid",
                "front",
                "back",
            ])
            .build()
            .unwrap(),
    );
    let mut ctx = Context::new(mesh);
    ctx.props.rho = 1.0;
    ctx.props.viscosity = 0.01;
    ctx.controls.state = TimeState::Steady;
    ctx.controls.tolerance = 1e-8;
    ctx.controls.max_iterations = 1000;
    ctx
}

fn cavity_solver(ctx: &Context, cfg: PisoConfig) -> PisoSolver {
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
    PisoSolver::new(ctx, cfg, u, p).unwrap()
}

/// x = 0.5 竖直中线上在给定 y 处的 u_x（最近单元）
fn centerline_ux(ctx: &Context, solver: &PisoSolver, y: Scalar) -> Scalar {
    let c = ctx.mesh.find_nearest_cell(Vector::new(
        0.5,
        y,
        ctx.mesh.cell_centroid[0].z,
    ));
    solver.u[c].x
}

#[test]
fn cavity_coarse_develops_primary_vortex() {
    let ctx = cavity_context(12);
    let cfg = PisoConfig {
        n_piso: 2,
        n_ortho: 1,
        ..PisoConfig::default()
    };
    let mut solver = cavity_solver(&ctx, cfg);

    let mut continuity = Scalar::MAX;
    for step in 1..=120 {
        continuity = solver.advance(&ctx, step).unwrap().continuity;
    }
    assert!(continuity < 1e-3, "连续性残差 {}", continuity);

    // 主涡: 中线上部顺流、中心回流
    assert!(centerline_ux(&ctx, &solver, 0.95) > 0.2, "盖下速度过小");
    assert!(centerline_ux(&ctx, &solver, 0.5) < -0.02, "中心无回流");
}

#[test]
#[ignore = "长时验证: 32×32 网格与 Ghia 基准比较"]
fn cavity_matches_ghia_reference() {
    let mut ctx = cavity_context(32);
    ctx.controls
        .schemes
        .insert("U".to_string(), ConvectionScheme::Tvd(Limiter::VanLeer));
    let cfg = PisoConfig {
        n_piso: 2,
        n_ortho: 1,
        velocity_ur: 0.7,
        pressure_ur: 0.3,
        ..PisoConfig::default()
    };
    let mut solver = cavity_solver(&ctx, cfg);

    let mut last_continuity = Scalar::MAX;
    for step in 1..=1500 {
        last_continuity = solver.advance(&ctx, step).unwrap().continuity;
        if last_continuity < 1e-7 {
            break;
        }
    }
    assert!(last_continuity < 1e-5, "未收敛: 连续性 {}", last_continuity);

    // Ghia, Ghia & Shin (1982), Re=100, x=0.5 中线 u_x
    let reference: &[(Scalar, Scalar)] = &[
        (0.9766, 0.84123),
        (0.8594, 0.23151),
        (0.6172, -0.04775),
        (0.5000, -0.20581),
        (0.2813, -0.15662),
        (0.1016, -0.06434),
    ];
    for &(y, ux_ref) in reference {
        let ux = centerline_ux(&ctx, &solver, y);
        assert!(
            (ux - ux_ref).abs() < 0.02,
            "u_x(0.5, {:.4}) = {:.4}, 基准 {:.4}",
            y,
            ux,
            ux_ref
        );
    }
}

// crates/nf_solvers/tests/conservation.rs

//! 离散守恒验证
//!
//! 对收敛的对流-扩散解，任意内部子域的净通量（即各单元残差
//! 之和）在求解器容差内为零；绝热瞬态扩散下总量守恒。

use nf_core::controls::TimeState;
use nf_core::field::bc::{add_default_bcs, update_explicit_bcs, BCondition};
use nf_core::field::{FaceField, Field};
use nf_core::{ops, Access, Context, ConvectionScheme};
use nf_foundation::{Scalar, Vector};
use nf_mesh::BoxMesh;
use nf_solvers::scalar_transport::{advance_scalar, ScalarConfig};
use std::sync::Arc;

#[test]
fn interior_subvolume_flux_balance_at_convergence() {
    // 2D 通道中的稳态对流-扩散
    let mesh = Arc::new(
        BoxMesh::new(12, 6, 1)
            .with_extent(1.2, 0.6, 0.1)
            .build()
            .unwrap(),
    );
    let mut ctx = Context::new(mesh.clone());
    ctx.controls.state = TimeState::Steady;
    ctx.controls.tolerance = 1e-11;
    ctx.controls.max_iterations = 5000;

    let mut u = Field::<Vector>::uniform(&mesh, "U", Access::None, Vector::new(0.8, 0.0, 0.0));
    u.fill_boundary(&mesh);
    let flux = ops::flx(&mesh, &u);
    let mu = FaceField::<Scalar>::uniform(&mesh, 0.05);

    let mut t = Field::<Scalar>::new(&mesh, "T", Access::None);
    t.add_bc(BCondition::dirichlet("xmin", 1.0));
    t.add_bc(BCondition::zero_gradient("xmax"));
    t.add_bc(BCondition::dirichlet("ymin", 0.0));
    t.add_bc(BCondition::dirichlet("ymax", 0.0));
    t.add_bc(BCondition::zero_gradient("zmin"));
    t.add_bc(BCondition::zero_gradient("zmax"));

    let cfg = ScalarConfig {
        dt_coeff: 0.05,
        t_ur: 1.0,
        n_deferred: 0,
    };
    for _ in 0..40 {
        advance_scalar(&ctx, &mut t, Some(&flux), &mu, &cfg).unwrap();
    }

    // 重组装收敛解的算子并取残差
    update_explicit_bcs(&mut t, &mesh).unwrap();
    let mut m = ops::div_matrix(mesh.clone(), &t, &flux, &mu, ConvectionScheme::Upwind);
    let mut l = ops::lap(mesh.clone(), &t, &mu);
    l.scale(-1.0);
    m += l;
    let applied = m.apply(t.internal());
    let residual: Vec<Scalar> = (0..mesh.n_cells)
        .map(|c| m.su[c] - applied[c])
        .collect();

    // 内部 2×2 子域的净通量 = 子域残差和
    let mut subvolume = 0.0;
    let mut picked = 0;
    for c in 0..mesh.n_cells {
        let x = mesh.cell_centroid[c];
        if (0.4..0.6).contains(&x.x) && (0.2..0.4).contains(&x.y) {
            subvolume += residual[c];
            picked += 1;
        }
    }
    assert!(picked >= 4, "子域应含若干单元");
    assert!(
        subvolume.abs() < 1e-7,
        "子域净通量 {:.3e} 超出容差",
        subvolume
    );

    // 全域残差同样趋零
    let total: Scalar = residual.iter().sum();
    assert!(total.abs() < 1e-7, "全域净通量 {:.3e}", total);
}

#[test]
fn insulated_transient_diffusion_preserves_total() {
    let mesh = Arc::new(BoxMesh::new(6, 6, 1).build().unwrap());
    let mut ctx = Context::new(mesh.clone());
    ctx.controls.state = TimeState::Transient;
    ctx.controls.dt = 0.02;
    ctx.controls.tolerance = 1e-12;
    ctx.controls.max_iterations = 4000;

    let mut t = Field::<Scalar>::new(&mesh, "T", Access::None);
    for c in 0..mesh.n_cells {
        t[c] = mesh.cell_centroid[c].x + 2.0 * mesh.cell_centroid[c].y;
    }
    add_default_bcs(&mut t, &mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));

    let weighted = |f: &Field<Scalar>| -> Scalar {
        (0..mesh.n_cells).map(|c| f[c] * mesh.cell_volume[c]).sum()
    };
    let total0 = weighted(&t);

    let mu = FaceField::<Scalar>::uniform(&mesh, 0.2);
    let cfg = ScalarConfig {
        dt_coeff: 0.2,
        t_ur: 1.0,
        n_deferred: 0,
    };
    for _ in 0..25 {
        advance_scalar(&ctx, &mut t, None, &mu, &cfg).unwrap();
    }

    let total = weighted(&t);
    assert!(
        (total - total0).abs() < 1e-8 * total0.abs().max(1.0),
        "总量漂移: {} → {}",
        total0,
        total
    );
}

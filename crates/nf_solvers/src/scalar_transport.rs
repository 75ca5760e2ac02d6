// crates/nf_solvers/src/scalar_transport.rs

//! 扩散与标量输运
//!
//! 两个共享外循环机制（延迟修正、欠松弛、Crank–Nicolson）的驱动：
//!
//! - 扩散:  `ddt(T,ρ) = lap(T, ρ·DT)`
//! - 输运:  `ddt(T,ρ) + div(T, F, μ) = lap(T, μ)`
//!
//! 输运的面通量 F 由读入的速度场经 `flx(ρU)` 得到。

use crate::error::{SolverError, SolverResult};
use crate::{checkpoint, StepRange};
use nf_config::CaseFile;
use nf_core::field::bc::{add_default_bcs, update_explicit_bcs, BCondition};
use nf_core::field::{FaceField, Field};
use nf_core::ops;
use nf_core::{solve, Access, Context, SolveOutcome};
use nf_foundation::{Scalar, Vector, SMALL};
use std::path::Path;

/// 标量求解器配置
#[derive(Debug, Clone)]
pub struct ScalarConfig {
    /// 扩散系数 DT
    pub dt_coeff: Scalar,
    /// 欠松弛因子
    pub t_ur: Scalar,
    /// 延迟修正外循环次数
    pub n_deferred: usize,
}

impl From<&nf_config::ScalarBlock> for ScalarConfig {
    fn from(b: &nf_config::ScalarBlock) -> Self {
        Self {
            dt_coeff: b.dt_coeff,
            t_ur: b.t_ur,
            n_deferred: b.n_deferred,
        }
    }
}

/// 组装并求解一轮标量方程
///
/// `flux` 为 None 时是纯扩散。算子组合与时间机制对两种驱动一致。
pub fn advance_scalar(
    ctx: &Context,
    t: &mut Field<Scalar>,
    flux: Option<&FaceField<Scalar>>,
    mu: &FaceField<Scalar>,
    cfg: &ScalarConfig,
) -> SolverResult<SolveOutcome> {
    let mesh = ctx.mesh.clone();
    let rho = ctx.props.rho;
    let steady = ctx.controls.is_steady();
    let theta = ctx.controls.time_scheme_factor;

    update_explicit_bcs(t, &mesh)?;

    let mut m = match flux {
        Some(f) => {
            // div(T,F,μ) − lap(T,μ)
            let mut m = ops::div_matrix(mesh.clone(), t, f, mu, ctx.controls.scheme_for(&t.name));
            let mut l = ops::lap(mesh.clone(), t, mu);
            l.scale(-1.0);
            m += l;
            m
        }
        None => {
            // −lap(T, ρ·DT)
            let mut l = ops::lap(mesh.clone(), t, mu);
            l.scale(-1.0);
            l
        }
    };

    if steady {
        m.relax(cfg.t_ur, t.internal());
    } else {
        if (theta - 1.0).abs() > SMALL {
            m.crank_nicolson(theta, t.internal());
        }
        m += ops::ddt(mesh.clone(), t, rho, ctx.controls.dt);
    }

    let out = solve(t, m, ctx);
    update_explicit_bcs(t, &mesh)?;
    Ok(out)
}

/// 扩散驱动
pub fn run_diffusion(ctx: &Context, case: &CaseFile, io_dir: &Path) -> SolverResult<()> {
    let cfg = ScalarConfig::from(&case.scalar);
    let mesh = ctx.mesh.clone();
    let steps = StepRange::from_controls(&ctx.controls);

    let mut t = Field::<Scalar>::new(&mesh, "T", Access::ReadWrite);
    add_default_bcs(&mut t, &mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));
    checkpoint::read_initial_scalar(ctx, io_dir, steps.read_step, &mut t)?;

    let mu = FaceField::<Scalar>::uniform(&mesh, ctx.props.rho * cfg.dt_coeff);
    step_loop(ctx, io_dir, "diffusion", steps, &cfg, |ctx, t_field, cfg| {
        advance_scalar(ctx, t_field, None, &mu, cfg)
    }, &mut t)
}

/// 输运驱动
pub fn run_transport(ctx: &Context, case: &CaseFile, io_dir: &Path) -> SolverResult<()> {
    let cfg = ScalarConfig::from(&case.scalar);
    let mesh = ctx.mesh.clone();
    let steps = StepRange::from_controls(&ctx.controls);

    let mut u = Field::<Vector>::new(&mesh, "U", Access::ReadWrite);
    add_default_bcs(&mut u, &mesh, |n| BCondition::wall(n, Vector::ZERO), |n| BCondition::zero_gradient(n));
    checkpoint::read_initial_vector(ctx, io_dir, steps.read_step, &mut u)?;

    let mut t = Field::<Scalar>::new(&mesh, "T", Access::ReadWrite);
    add_default_bcs(&mut t, &mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));
    checkpoint::read_initial_scalar(ctx, io_dir, steps.read_step, &mut t)?;

    let rho_u = u.map(|v| v * ctx.props.rho);
    let flux = ops::flx(&mesh, &rho_u);
    let mu = FaceField::<Scalar>::uniform(&mesh, ctx.props.rho * cfg.dt_coeff);

    step_loop(ctx, io_dir, "transport", steps, &cfg, |ctx, t_field, cfg| {
        advance_scalar(ctx, t_field, Some(&flux), &mu, cfg)
    }, &mut t)
}

/// 两个驱动共享的步进循环
fn step_loop(
    ctx: &Context,
    io_dir: &Path,
    case_name: &str,
    steps: StepRange,
    cfg: &ScalarConfig,
    mut advance: impl FnMut(&Context, &mut Field<Scalar>, &ScalarConfig) -> SolverResult<SolveOutcome>,
    t: &mut Field<Scalar>,
) -> SolverResult<()> {
    let steady = ctx.controls.is_steady();
    let n_deferred = if steady { 0 } else { cfg.n_deferred };

    let write = |ctx: &Context, t: &Field<Scalar>, cp: usize| {
        let set = checkpoint::FieldSet {
            scalars: vec![t],
            vectors: vec![],
        };
        checkpoint::write_step(ctx, io_dir, case_name, cp, &set);
    };

    write(ctx, t, steps.read_step);

    for i in steps.first..=steps.last {
        if crate::terminated() {
            log::info!("收到终止请求，写出检查点后退出");
            write(ctx, t, i / steps.write_interval);
            break;
        }
        if ctx.comm.is_root() {
            if steady {
                log::info!("步 {}", i);
            } else {
                log::info!("时间 {:.6}", i as Scalar * ctx.controls.dt);
            }
        }

        for _ in 0..=n_deferred {
            let out = advance(ctx, t, cfg)?;
            if out.diverged() || !out.residual.is_finite() {
                log::error!("第 {} 步发散，写出最终检查点", i);
                write(ctx, t, i / steps.write_interval);
                return Err(SolverError::NumericalDivergence {
                    field: t.name.clone(),
                    step: i,
                    residual: out.residual,
                });
            }
        }

        if let Some(cp) = steps.checkpoint_at(i) {
            write(ctx, t, cp);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::controls::TimeState;
    use nf_mesh::BoxMesh;
    use std::sync::Arc;

    #[test]
    fn test_steady_conduction_linear_profile() {
        // 1 维热传导: T(0)=0, T(1)=1 → T(x) = x
        let n = 20;
        let mesh = Arc::new(
            BoxMesh::new(n, 1, 1).with_extent(1.0, 0.1, 0.1).build().unwrap(),
        );
        let mut ctx = Context::new(mesh.clone());
        ctx.controls.state = TimeState::Steady;
        ctx.controls.tolerance = 1e-10;
        ctx.controls.max_iterations = 2000;

        let mut t = Field::<Scalar>::new(&mesh, "T", Access::None);
        t.add_bc(BCondition::dirichlet("xmin", 0.0));
        t.add_bc(BCondition::dirichlet("xmax", 1.0));
        for p in ["ymin", "ymax", "zmin", "zmax"] {
            t.add_bc(BCondition::zero_gradient(p));
        }

        let cfg = ScalarConfig {
            dt_coeff: 1.0,
            t_ur: 1.0,
            n_deferred: 0,
        };
        let mu = FaceField::<Scalar>::uniform(&mesh, 1.0);
        advance_scalar(&ctx, &mut t, None, &mu, &cfg).unwrap();

        for c in 0..mesh.n_cells {
            let x = mesh.cell_centroid[c].x;
            assert!((t[c] - x).abs() < 1e-6, "T({}) = {}", x, t[c]);
        }
    }

    #[test]
    fn test_transient_diffusion_conserves_mean_with_insulated_walls() {
        // 全绝热边界: 平均温度守恒
        let mesh = Arc::new(BoxMesh::new(8, 1, 1).with_extent(1.0, 0.1, 0.1).build().unwrap());
        let mut ctx = Context::new(mesh.clone());
        ctx.controls.state = TimeState::Transient;
        ctx.controls.dt = 0.01;
        ctx.controls.tolerance = 1e-12;
        ctx.controls.max_iterations = 2000;

        let mut t = Field::<Scalar>::new(&mesh, "T", Access::None);
        for c in 0..mesh.n_cells {
            t[c] = if c < 4 { 1.0 } else { 0.0 };
        }
        add_default_bcs(&mut t, &mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));

        let total0: Scalar = t.internal().iter().sum();
        let cfg = ScalarConfig {
            dt_coeff: 0.1,
            t_ur: 1.0,
            n_deferred: 0,
        };
        let mu = FaceField::<Scalar>::uniform(&mesh, 0.1);
        for _ in 0..10 {
            advance_scalar(&ctx, &mut t, None, &mu, &cfg).unwrap();
        }
        let total: Scalar = t.internal().iter().sum();
        assert!((total - total0).abs() < 1e-8, "绝热扩散必须守恒: {} → {}", total0, total);

        // 扩散使梯度衰减
        assert!(t[0] < 1.0 && t[7] > 0.0);
    }
}

// crates/nf_solvers/src/piso.rs

//! PISO 压力-速度耦合
//!
//! 同位网格上的分裂算法，Rhie–Chow 面速度重建抑制压力棋盘模式。
//!
//! 每个时间步（稳态为外迭代）：
//! 1. 延迟修正循环 n ∈ 0..=n_DEFERRED：
//!    a. 组装动量矩阵 `div(U,F,μ) + 湍流应力`；
//!    b. 稳态做隐式欠松弛，瞬态做 Crank–Nicolson 改写加时间导数；
//!    c. 解 `M·U = −∇p` 得试探速度；
//!    d. PISO 校正 ×n_PISO：`U_a = H(U)/ap` → 压力 Poisson
//!       （n_ORTHO 次非正交重组装）→ 速度显式校正；
//!    e. Rhie–Chow 通量更新，推进湍流模型。
//! 2. 可选累计 LES 运行统计，检查点时以闭式均值/标准差写出。

use crate::error::{SolverError, SolverResult};
use crate::turbulence::TurbulenceModel;
use crate::{checkpoint, walldist, StepRange};
use nf_config::{CaseFile, TurbulenceKind};
use nf_core::field::bc::{add_default_bcs, update_explicit_bcs, BCondition};
use nf_core::field::{FaceField, Field};
use nf_core::ops;
use nf_core::{Access, Context, Equation, SolveOutcome};
use nf_foundation::{Scalar, Vector, SMALL};
use nf_io::ProbeWriter;
use std::path::Path;

/// PISO 驱动配置
#[derive(Debug, Clone)]
pub struct PisoConfig {
    /// 速度欠松弛因子
    pub velocity_ur: Scalar,
    /// 压力欠松弛因子
    pub pressure_ur: Scalar,
    /// PISO 校正次数
    pub n_piso: usize,
    /// 非正交修正次数
    pub n_ortho: usize,
    /// 延迟修正外循环次数
    pub n_deferred: usize,
    /// 湍流模型
    pub turbulence: TurbulenceKind,
    /// 是否累计 LES 统计
    pub les_average: bool,
}

impl Default for PisoConfig {
    fn default() -> Self {
        Self {
            velocity_ur: 0.8,
            pressure_ur: 0.5,
            n_piso: 1,
            n_ortho: 0,
            n_deferred: 0,
            turbulence: TurbulenceKind::None,
            les_average: false,
        }
    }
}

impl From<&nf_config::PisoBlock> for PisoConfig {
    fn from(b: &nf_config::PisoBlock) -> Self {
        Self {
            velocity_ur: b.velocity_ur,
            pressure_ur: b.pressure_ur,
            n_piso: b.n_piso,
            n_ortho: b.n_ortho,
            n_deferred: b.n_deferred,
            turbulence: b.turbulence_model,
            les_average: b.les_average,
        }
    }
}

/// 一个外迭代的统计
#[derive(Debug, Clone, Copy)]
pub struct PisoStats {
    /// 动量方程求解结果
    pub momentum: SolveOutcome,
    /// 最后一次压力求解结果
    pub pressure: SolveOutcome,
    /// 连续性残差（|∇·F| 的最大值）
    pub continuity: Scalar,
}

/// LES 运行统计累计器
struct LesAverages {
    u_sum: Vec<Vector>,
    p_sum: Vec<Scalar>,
    u_sq: Vec<Vector>,
    p_sq: Vec<Scalar>,
    steps: usize,
}

impl LesAverages {
    fn new(n: usize) -> Self {
        Self {
            u_sum: vec![Vector::ZERO; n],
            p_sum: vec![0.0; n],
            u_sq: vec![Vector::ZERO; n],
            p_sq: vec![0.0; n],
            steps: 0,
        }
    }

    fn accumulate(&mut self, u: &Field<Vector>, p: &Field<Scalar>) {
        for c in 0..self.u_sum.len() {
            self.u_sum[c] += u[c];
            self.p_sum[c] += p[c];
            self.u_sq[c] += u[c] * u[c];
            self.p_sq[c] += p[c] * p[c];
        }
        self.steps += 1;
    }

    /// 闭式均值与标准差（不破坏累计器）
    fn snapshot(
        &self,
        mesh: &nf_mesh::Mesh,
    ) -> (Field<Vector>, Field<Vector>, Field<Scalar>, Field<Scalar>) {
        let n = self.steps.max(1) as Scalar;
        let mut u_avg = Field::<Vector>::new(mesh, "Uavg", Access::Write);
        let mut u_std = Field::<Vector>::new(mesh, "Ustd", Access::Write);
        let mut p_avg = Field::<Scalar>::new(mesh, "pavg", Access::Write);
        let mut p_std = Field::<Scalar>::new(mesh, "pstd", Access::Write);

        for c in 0..self.u_sum.len() {
            let mu = self.u_sum[c] / n;
            let mp = self.p_sum[c] / n;
            u_avg[c] = mu;
            p_avg[c] = mp;
            // Var = (Σφ² − n·mean²)/n
            let vu = (self.u_sq[c] - mu * mu * n) / n;
            let vp = (self.p_sq[c] - mp * mp * n) / n;
            u_std[c] = Vector::new(vu.x.max(0.0).sqrt(), vu.y.max(0.0).sqrt(), vu.z.max(0.0).sqrt());
            p_std[c] = vp.max(0.0).sqrt();
        }
        (u_avg, u_std, p_avg, p_std)
    }
}

/// PISO 求解器状态
pub struct PisoSolver {
    /// 配置
    pub cfg: PisoConfig,
    /// 速度
    pub u: Field<Vector>,
    /// 压力
    pub p: Field<Scalar>,
    /// 面质量通量
    pub flux: FaceField<Scalar>,
    /// 湍流模型
    pub turb: TurbulenceModel,
    averages: Option<LesAverages>,
}

impl PisoSolver {
    /// 由就绪的场构建（BC 已配置；内部完成幽灵刷新与通量初始化）
    pub fn new(
        ctx: &Context,
        cfg: PisoConfig,
        mut u: Field<Vector>,
        mut p: Field<Scalar>,
    ) -> SolverResult<Self> {
        let mesh = &ctx.mesh;
        update_explicit_bcs(&mut u, mesh)?;
        update_explicit_bcs(&mut p, mesh)?;

        let mut turb = TurbulenceModel::from_kind(cfg.turbulence, mesh);
        if turb.needs_wall_distance() {
            log::info!("计算壁面距离");
            let y = walldist::calc_wall_distance(ctx)?;
            turb.set_wall_distance(y);
            log::info!("壁面距离完成");
        }

        let rho_u = u.map(|v| v * ctx.props.rho);
        let flux = ops::flx(mesh, &rho_u);
        let averages = cfg.les_average.then(|| LesAverages::new(mesh.n_cells_total()));

        Ok(Self {
            cfg,
            u,
            p,
            flux,
            turb,
            averages,
        })
    }

    /// 一个外迭代（时间步）
    pub fn advance(&mut self, ctx: &Context, step: usize) -> SolverResult<PisoStats> {
        let mesh = ctx.mesh.clone();
        let rho = ctx.props.rho;
        let steady = ctx.controls.is_steady();
        let theta = ctx.controls.time_scheme_factor;
        let n_deferred = if steady { 0 } else { self.cfg.n_deferred };

        let mut momentum_out = None;
        let mut pressure_out = None;

        for _ in 0..=n_deferred {
            update_explicit_bcs(&mut self.u, &mesh)?;
            update_explicit_bcs(&mut self.p, &mesh)?;

            // ---- 动量预测 ----
            let mu_lam = FaceField::uniform(&mesh, rho * ctx.props.viscosity);
            let mut m = ops::div_matrix(
                mesh.clone(),
                &self.u,
                &self.flux,
                &mu_lam,
                ctx.controls.scheme_for(&self.u.name),
            );
            self.turb.add_turbulent_stress(ctx, &mut m, &self.u);

            if steady {
                m.relax(self.cfg.velocity_ur, self.u.internal());
            } else {
                if (theta - 1.0).abs() > SMALL {
                    m.crank_nicolson(theta, self.u.internal());
                }
                m += ops::ddt(mesh.clone(), &self.u, rho, ctx.controls.dt);
            }

            let momentum = m.clone();
            let grad_p = ops::grad(&mesh, &self.p);
            let out_u = Equation::new(m).with_rhs(&(-&grad_p)).solve(&mut self.u, ctx);
            if out_u.diverged() || !out_u.residual.is_finite() {
                return Err(SolverError::NumericalDivergence {
                    field: self.u.name.clone(),
                    step,
                    residual: out_u.residual,
                });
            }
            momentum_out = Some(out_u);

            // 压力扩散系数 V/ap
            let mut dp = Field::<Scalar>::work(&mesh);
            for c in 0..mesh.n_cells {
                dp[c] = mesh.cell_volume[c] / momentum.ap[c].max(SMALL);
            }
            dp.fill_boundary(&mesh);

            // ---- PISO 校正 ----
            for _ in 0..self.cfg.n_piso {
                // U_a = H(U)/ap
                let h = momentum.rhs_of(self.u.internal());
                for c in 0..mesh.n_cells {
                    self.u[c] = h[c] / momentum.ap[c].max(SMALL);
                }
                update_explicit_bcs(&mut self.u, &mesh)?;

                let p_old = steady.then(|| self.p.clone());

                // 压力 Poisson：lap(p, ρ·V/ap) == div(ρ·U_a)
                let rho_dp = dp.map(|v| v * rho);
                let gamma = ops::face_interpolate(&mesh, &rho_dp);
                for _ in 0..=self.cfg.n_ortho {
                    update_explicit_bcs(&mut self.p, &mesh)?;
                    let rho_ua = self.u.map(|v| v * rho);
                    let rhs = ops::div_flux(&mesh, &ops::flx(&mesh, &rho_ua));
                    let pm = ops::lap(mesh.clone(), &self.p, &gamma);
                    let out_p = Equation::new(pm).with_rhs(&rhs).solve(&mut self.p, ctx);
                    if out_p.diverged() || !out_p.residual.is_finite() {
                        return Err(SolverError::NumericalDivergence {
                            field: self.p.name.clone(),
                            step,
                            residual: out_p.residual,
                        });
                    }
                    pressure_out = Some(out_p);
                }
                if let Some(po) = p_old {
                    self.p.relax_explicit(&po, self.cfg.pressure_ur);
                }
                update_explicit_bcs(&mut self.p, &mesh)?;

                // 速度显式校正: U = U_a − (V/ap)·∇p
                let grad_p = ops::grad(&mesh, &self.p);
                for c in 0..mesh.n_cells {
                    self.u[c] -= grad_p[c] * dp[c];
                }
                update_explicit_bcs(&mut self.u, &mesh)?;
            }

            // ---- Rhie–Chow 通量更新与湍流推进 ----
            let grad_p = ops::grad(&mesh, &self.p);
            self.flux = ops::flx_rhie_chow(&mesh, &self.u, &self.p, &grad_p, &dp, rho);
            self.turb.solve(ctx, &self.u, &self.flux)?;
        }

        let continuity = {
            let d = ops::div_flux(&mesh, &self.flux);
            d.max_mag(&ctx.comm)
        };

        let momentum = momentum_out.expect("至少一轮延迟修正");
        Ok(PisoStats {
            momentum,
            // n_PISO = 0 时退化为无校正的动量解
            pressure: pressure_out.unwrap_or(momentum),
            continuity,
        })
    }

    /// 累计 LES 统计（les_average 开启时）
    pub fn accumulate_statistics(&mut self) {
        if let Some(avg) = self.averages.as_mut() {
            avg.accumulate(&self.u, &self.p);
        }
    }

    /// 当前统计快照（均值与标准差场）
    pub fn statistics(
        &self,
        mesh: &nf_mesh::Mesh,
    ) -> Option<(Field<Vector>, Field<Vector>, Field<Scalar>, Field<Scalar>)> {
        self.averages.as_ref().map(|a| a.snapshot(mesh))
    }
}

/// 完整 PISO 运行：初始读取、步进、探针、检查点
pub fn run_piso(ctx: &Context, case: &CaseFile, io_dir: &Path) -> SolverResult<()> {
    let mesh = ctx.mesh.clone();
    let steps = StepRange::from_controls(&ctx.controls);

    // 场与初始状态
    let mut u = Field::<Vector>::new(&mesh, "U", Access::ReadWrite);
    let mut p = Field::<Scalar>::new(&mesh, "p", Access::ReadWrite);
    add_default_bcs(&mut u, &mesh, |n| BCondition::wall(n, Vector::ZERO), |n| BCondition::zero_gradient(n));
    add_default_bcs(&mut p, &mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));
    checkpoint::read_initial_vector(ctx, io_dir, steps.read_step, &mut u)?;
    checkpoint::read_initial_scalar(ctx, io_dir, steps.read_step, &mut p)?;

    let mut solver = PisoSolver::new(ctx, PisoConfig::from(&case.piso), u, p)?;

    // 探针
    let probe_cells: Vec<usize> = case
        .general
        .probes
        .iter()
        .map(|&x| mesh.find_nearest_cell(x))
        .collect();
    let probes = if probe_cells.is_empty() || !ctx.comm.is_root() {
        None
    } else {
        Some((
            ProbeWriter::create(io_dir, "Ui", probe_cells.clone())?,
            ProbeWriter::create(io_dir, "pi", probe_cells)?,
        ))
    };

    let write_checkpoint = |solver: &PisoSolver, cp: usize| {
        let mut set = checkpoint::FieldSet {
            scalars: vec![&solver.p],
            vectors: vec![&solver.u],
        };
        let stats = solver.statistics(&mesh);
        if let Some((u_avg, u_std, p_avg, p_std)) = stats.as_ref() {
            set.vectors.push(u_avg);
            set.vectors.push(u_std);
            set.scalars.push(p_avg);
            set.scalars.push(p_std);
        }
        checkpoint::write_step(ctx, io_dir, "piso", cp, &set);
    };

    write_checkpoint(&solver, steps.read_step);

    for i in steps.first..=steps.last {
        if crate::terminated() {
            log::info!("收到终止请求，写出检查点后退出");
            write_checkpoint(&solver, i / steps.write_interval);
            break;
        }
        if ctx.comm.is_root() {
            if ctx.controls.is_steady() {
                log::info!("步 {}", i);
            } else {
                log::info!("时间 {:.6}", i as Scalar * ctx.controls.dt);
            }
        }

        match solver.advance(ctx, i) {
            Ok(stats) => {
                log::debug!(
                    "动量残差 {:.3e} → {:.3e}, 连续性 {:.3e}",
                    stats.momentum.initial_residual,
                    stats.momentum.residual,
                    stats.continuity
                );
            }
            Err(e) => {
                log::error!("第 {} 步发散，写出最终检查点", i);
                write_checkpoint(&solver, i / steps.write_interval);
                return Err(e);
            }
        }

        solver.accumulate_statistics();

        if let Some((up, pp)) = probes.as_ref() {
            if let Err(e) = up.append(i, &solver.u) {
                log::warn!("探针写出失败: {}", e);
            }
            if let Err(e) = pp.append(i, &solver.p) {
                log::warn!("探针写出失败: {}", e);
            }
        }

        if let Some(cp) = steps.checkpoint_at(i) {
            write_checkpoint(&solver, cp);
        }
    }

    Ok(())
}

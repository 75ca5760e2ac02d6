// apps/nf_cli/src/commands/run.rs

//! 运行算例
//!
//! 读算例文件 → 装载网格（多进程目录后缀）→ 构建 Context →
//! 按 solver 键分派驱动。场文件与 VTK 写入网格目录。

use anyhow::{Context as _, Result};
use clap::Args;
use nf_config::{CaseFile, SolverKind};
use nf_core::{Communicator, Context, Properties};
use nf_mesh::io as mesh_io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// 运行算例参数
#[derive(Args)]
pub struct RunArgs {
    /// 算例文件路径
    pub case: PathBuf,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== NaviFlow 求解启动 ===");
    let t0 = Instant::now();

    let case = CaseFile::load(&args.case).context("算例文件解析失败")?;

    let comm = Communicator::Serial;
    let mesh_dir = mesh_io::mesh_dir(&case.general.mesh, comm.rank(), comm.size());
    let mesh = Arc::new(mesh_io::read_mesh(&mesh_dir).context("网格装载失败")?);
    info!(
        "网格: {} 单元, {} 面 ({} 内部), {} 面片",
        mesh.n_cells,
        mesh.n_faces(),
        mesh.n_interior_faces,
        mesh.patches.len()
    );

    let ctx = Context {
        mesh,
        controls: case.controls.clone(),
        props: Properties {
            rho: case.general.rho,
            viscosity: case.general.viscosity,
            conductivity: case.general.conductivity,
            gravity: case.general.gravity,
        },
        comm,
    };

    match case.general.solver {
        SolverKind::Piso => nf_solvers::piso::run_piso(&ctx, &case, &mesh_dir)?,
        SolverKind::Diffusion => nf_solvers::run_diffusion(&ctx, &case, &mesh_dir)?,
        SolverKind::Transport => nf_solvers::run_transport(&ctx, &case, &mesh_dir)?,
        SolverKind::Potential => nf_solvers::run_potential(&ctx, &case, &mesh_dir)?,
    }

    info!("=== 完成，用时 {:.2}s ===", t0.elapsed().as_secs_f64());
    Ok(())
}

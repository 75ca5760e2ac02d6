// apps/nf_cli/src/commands/validate.rs

//! 校验算例
//!
//! 只做解析与装载期检查：算例文件语法 / 键白名单、网格完整性
//! （封闭性、邻接、面片覆盖）。不求解。

use anyhow::{Context as _, Result};
use clap::Args;
use nf_config::CaseFile;
use nf_mesh::io as mesh_io;
use std::path::PathBuf;
use tracing::info;

/// 校验参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 算例文件路径
    pub case: PathBuf,

    /// 同时装载并校验网格
    #[arg(long, default_value_t = true)]
    pub mesh: bool,
}

/// 执行校验命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    let case = CaseFile::load(&args.case).context("算例文件校验失败")?;
    info!("算例文件通过: solver={:?}", case.general.solver);

    if args.mesh {
        let dir = mesh_io::mesh_dir(&case.general.mesh, 0, 1);
        let mesh = mesh_io::read_mesh(&dir).context("网格校验失败")?;
        info!(
            "网格通过: {} 单元, {} 面, {} 面片",
            mesh.n_cells,
            mesh.n_faces(),
            mesh.patches.len()
        );
    }

    info!("校验通过");
    Ok(())
}

// apps/nf_cli/src/commands/info.rs

//! 网格信息
//!
//! 打印网格规模、面片表与几何统计。

use anyhow::{Context as _, Result};
use clap::Args;
use nf_mesh::io as mesh_io;
use std::path::PathBuf;
use tracing::info;

/// 信息参数
#[derive(Args)]
pub struct InfoArgs {
    /// 网格目录
    pub mesh: PathBuf,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let mesh = mesh_io::read_mesh(&args.mesh).context("网格装载失败")?;

    info!("网格: {}", args.mesh.display());
    info!("  单元: {}", mesh.n_cells);
    info!("  面:   {} (内部 {})", mesh.n_faces(), mesh.n_interior_faces);
    info!("  顶点: {}", mesh.vertices.len());

    let v_min = mesh.cell_volume.iter().cloned().fold(f64::MAX, f64::min);
    let v_max = mesh.cell_volume.iter().cloned().fold(0.0_f64, f64::max);
    let v_total: f64 = mesh.cell_volume.iter().sum();
    info!("  体积: 总 {:.6e}, 最小 {:.3e}, 最大 {:.3e}", v_total, v_min, v_max);

    info!("  面片:");
    for p in &mesh.patches {
        info!(
            "    {} ({:?}): {} 面{}",
            p.name,
            p.kind,
            p.count,
            if p.is_wall_named() { " [壁面]" } else { "" }
        );
    }
    Ok(())
}

// crates/nf_solvers/src/checkpoint.rs

//! 检查点读写
//!
//! 驱动共用的场读写与 VTK 写出。初始读取失败是致命错误；
//! 写出失败记警告后继续（见顶层错误策略）。

use nf_core::field::bc::update_explicit_bcs;
use nf_core::field::Field;
use nf_core::Context;
use nf_foundation::{Scalar, Vector};
use nf_io::{fields, VtkField, VtkWriter};
use std::path::Path;

use crate::SolverResult;

/// 一次检查点涉及的场集合
pub struct FieldSet<'a> {
    /// 标量场
    pub scalars: Vec<&'a Field<Scalar>>,
    /// 向量场
    pub vectors: Vec<&'a Field<Vector>>,
}

/// 写出检查点（场文件 + VTK）
///
/// 只写 `access.is_write()` 的场；任何写失败降级为警告。
pub fn write_step(ctx: &Context, dir: &Path, case_name: &str, step: usize, set: &FieldSet<'_>) {
    for f in &set.scalars {
        if f.access.is_write() {
            if let Err(e) = fields::write_field(*f, dir, step) {
                log::warn!("场 {} 写出失败: {}", f.name, e);
            }
        }
    }
    for f in &set.vectors {
        if f.access.is_write() {
            if let Err(e) = fields::write_field(*f, dir, step) {
                log::warn!("场 {} 写出失败: {}", f.name, e);
            }
        }
    }

    let vtk = VtkWriter::new(dir, case_name, ctx.comm.rank(), ctx.comm.size());
    let mut vf: Vec<VtkField<'_>> = Vec::new();
    for f in &set.scalars {
        if f.access.is_write() {
            vf.push(VtkField::Scalar(f));
        }
    }
    for f in &set.vectors {
        if f.access.is_write() {
            vf.push(VtkField::Vector(f));
        }
    }
    if let Err(e) = vtk.write(&ctx.mesh, step, &vf) {
        log::warn!("VTK 写出失败 (步 {}): {}", step, e);
    }
}

/// 读取初始标量场（存在即读；`is_read` 的场文件缺失为致命）
pub fn read_initial_scalar(
    ctx: &Context,
    dir: &Path,
    step: usize,
    field: &mut Field<Scalar>,
) -> SolverResult<()> {
    read_initial(ctx, dir, step, field)
}

/// 读取初始向量场
pub fn read_initial_vector(
    ctx: &Context,
    dir: &Path,
    step: usize,
    field: &mut Field<Vector>,
) -> SolverResult<()> {
    read_initial(ctx, dir, step, field)
}

fn read_initial<T: nf_core::FieldElem>(
    ctx: &Context,
    dir: &Path,
    step: usize,
    field: &mut Field<T>,
) -> SolverResult<()> {
    if !field.access.is_read() {
        return Ok(());
    }
    fields::read_field(field, dir, step)?;
    update_explicit_bcs(field, &ctx.mesh)?;
    Ok(())
}

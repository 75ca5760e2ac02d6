// crates/nf_io/src/fields.rs

//! 场文件读写
//!
//! 每时间步每场一个文本文件 `<name>.<step>`，内容为内部数组
//! 后接分面片边界条件块：
//!
//! ```text
//! 100
//! {
//! 1.000000000000000e0
//! ...
//! }
//! boundary
//! {
//! xmin DIRICHLET 0.000000000000000e0 ;
//! xmax NEUMANN 0.000000000000000e0 ;
//! }
//! ```
//!
//! 幽灵值不持久化；读入后由调用方刷新边界。值以 `{:.15e}` 打印，
//! 读 → 写 → 读 在打印精度内逐位一致。

use crate::error::{IoError, IoResult};
use nf_core::field::bc::{BCondition, BcKind};
use nf_core::field::{Field, FieldElem};
use nf_foundation::Scalar;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// 场文件路径 `<dir>/<name>.<step>`
pub fn field_path(dir: &Path, name: &str, step: usize) -> PathBuf {
    dir.join(format!("{}.{}", name, step))
}

/// 写出场（内部数组 + BC 块）
pub fn write_field<T: FieldElem>(field: &Field<T>, dir: &Path, step: usize) -> IoResult<()> {
    let path = field_path(dir, &field.name, step);
    let mut out = String::new();

    let n = field.n_cells();
    writeln!(out, "{}", n).ok();
    out.push_str("{\n");
    for c in 0..n {
        let v = field[c];
        for i in 0..T::N_COMPONENTS {
            if i > 0 {
                out.push(' ');
            }
            write!(out, "{:.15e}", v.component(i)).ok();
        }
        out.push('\n');
    }
    out.push_str("}\n");

    out.push_str("boundary\n{\n");
    for bc in &field.bcs {
        write!(out, "{} {}", bc.patch, bc.kind.name()).ok();
        for i in 0..T::N_COMPONENTS {
            write!(out, " {:.15e}", bc.value.component(i)).ok();
        }
        for i in 0..T::N_COMPONENTS {
            write!(out, " {:.15e}", bc.gradient.component(i)).ok();
        }
        writeln!(out, " {:.15e} ;", bc.robin_alpha).ok();
    }
    out.push_str("}\n");

    fs::write(&path, out).map_err(|e| IoError::io(&path, e))
}

/// 读入场：覆盖内部数组并重建 BC 列表
///
/// 读入后幽灵值未定义，调用方须执行一次边界刷新。
pub fn read_field<T: FieldElem>(field: &mut Field<T>, dir: &Path, step: usize) -> IoResult<()> {
    let path = field_path(dir, &field.name, step);
    let text = fs::read_to_string(&path).map_err(|e| IoError::io(&path, e))?;

    let bad = |reason: &str| IoError::BadFieldFile {
        path: path.clone(),
        reason: reason.to_string(),
    };

    let mut tokens = text
        .split_whitespace()
        .filter(|t| *t != "{" && *t != "}")
        .peekable();

    let n: usize = tokens
        .next()
        .ok_or_else(|| bad("空文件"))?
        .parse()
        .map_err(|_| bad("数组长度不可解析"))?;
    if n != field.n_cells() {
        return Err(IoError::SizeMismatch {
            name: field.name.clone(),
            file_len: n,
            expected: field.n_cells(),
        });
    }

    let mut comps = vec![0.0; T::N_COMPONENTS];
    for c in 0..n {
        for comp in comps.iter_mut() {
            *comp = tokens
                .next()
                .ok_or_else(|| bad("数组提前结束"))?
                .parse()
                .map_err(|_| bad("数值不可解析"))?;
        }
        field.data[c] = T::from_components(&comps);
    }

    match tokens.next() {
        Some("boundary") => {}
        _ => return Err(bad("缺少 boundary 段")),
    }

    field.bcs.clear();
    while let Some(patch) = tokens.next() {
        let kind_tok = tokens.next().ok_or_else(|| bad("BC 记录缺少类型"))?;
        let kind = BcKind::parse(kind_tok)
            .ok_or_else(|| bad(&format!("未知边界条件类型: {}", kind_tok)))?;
        let mut elems = [T::zero(); 2];
        for elem in elems.iter_mut() {
            for comp in comps.iter_mut() {
                let tok = tokens.next().ok_or_else(|| bad("BC 记录提前结束"))?;
                *comp = tok.parse::<Scalar>().map_err(|_| bad("BC 数值不可解析"))?;
            }
            *elem = T::from_components(&comps);
        }
        let (value, gradient) = (elems[0], elems[1]);
        let alpha: Scalar = tokens
            .next()
            .ok_or_else(|| bad("BC 记录缺少 α"))?
            .parse()
            .map_err(|_| bad("α 不可解析"))?;
        match tokens.next() {
            Some(";") => {}
            _ => return Err(bad("BC 记录缺少 ';'")),
        }

        let mut bc = BCondition::dirichlet(patch, value);
        bc.kind = kind;
        bc.gradient = gradient;
        bc.robin_alpha = alpha;
        field.bcs.push(bc);
    }

    log::debug!("读取场 {} (步 {}): {} 单元, {} 个 BC", field.name, step, n, field.bcs.len());
    Ok(())
}

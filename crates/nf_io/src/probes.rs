// crates/nf_io/src/probes.rs

//! 探针输出
//!
//! 每个被探测的场一个追加文件（`Ui`、`pi`），每步一行：
//! 步号后接各探针位置的场值分量。

use crate::error::{IoError, IoResult};
use nf_core::field::{Field, FieldElem};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// 探针写出器
#[derive(Debug)]
pub struct ProbeWriter {
    path: PathBuf,
    /// 探针所在单元（启动时最近邻定位）
    cells: Vec<usize>,
}

impl ProbeWriter {
    /// 创建写出器并清空旧文件
    pub fn create(dir: &Path, file_name: &str, cells: Vec<usize>) -> IoResult<Self> {
        let path = dir.join(file_name);
        std::fs::write(&path, "").map_err(|e| IoError::io(&path, e))?;
        Ok(Self { path, cells })
    }

    /// 追加一步
    pub fn append<T: FieldElem>(&self, step: usize, field: &Field<T>) -> IoResult<()> {
        let mut line = String::new();
        write!(line, "{}", step).ok();
        for &c in &self.cells {
            let v = field[c];
            for i in 0..T::N_COMPONENTS {
                write!(line, " {:.9e}", v.component(i)).ok();
            }
        }
        line.push('\n');

        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| IoError::io(&self.path, e))?;
        f.write_all(line.as_bytes())
            .map_err(|e| IoError::io(&self.path, e))
    }
}

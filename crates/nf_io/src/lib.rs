// crates/nf_io/src/lib.rs

//! NaviFlow IO 层
//!
//! - [`fields`]: 按时间步的场文本文件（内部数组 + 分面片 BC 块）
//! - [`vtk`]: legacy ASCII VTK 非结构网格导出（每进程每写步一个文件）
//! - [`probes`]: 逐步追加的探针文件
//!
//! 写出失败为警告后继续；初始状态读取失败为致命错误（调用方裁决）。

#![warn(clippy::all)]

pub mod error;
pub mod fields;
pub mod probes;
pub mod vtk;

pub use error::{IoError, IoResult};
pub use probes::ProbeWriter;
pub use vtk::{VtkField, VtkWriter};

// crates/nf_mesh/src/error.rs

//! 网格错误类型
//!
//! 网格完整性错误在加载期即为致命错误（见顶层错误策略）。

use std::path::PathBuf;
use thiserror::Error;

/// 网格模块结果类型别名
pub type MeshResult<T> = Result<T, MeshError>;

/// 网格错误枚举
#[derive(Error, Debug)]
pub enum MeshError {
    /// 网格文件读取失败
    #[error("网格文件读取失败 ({path}): {reason}")]
    ReadFailed {
        /// 文件路径
        path: PathBuf,
        /// 失败原因
        reason: String,
    },

    /// 网格文件语法错误
    #[error("网格文件格式错误 ({path}, 第 {line} 行): {reason}")]
    ParseFailed {
        /// 文件路径
        path: PathBuf,
        /// 行号（从 1 起）
        line: usize,
        /// 失败原因
        reason: String,
    },

    /// 单元不封闭（有向面积矢量和不为零）
    #[error("单元 {cell} 不封闭: |Σ S_f| = {magnitude:.3e} 超出容差 {tolerance:.3e}")]
    CellNotClosed {
        /// 单元索引
        cell: usize,
        /// 面积矢量和的模
        magnitude: f64,
        /// 允许容差
        tolerance: f64,
    },

    /// owner/neighbor 邻接不一致
    #[error("面 {face} 邻接不一致: {reason}")]
    BadAdjacency {
        /// 面索引
        face: usize,
        /// 说明
        reason: String,
    },

    /// 分区面片重复或未覆盖边界
    #[error("分区面片错误: {0}")]
    BadPatch(String),

    /// 几何退化（零体积单元、零面积面）
    #[error("几何退化: {0}")]
    Degenerate(String),
}

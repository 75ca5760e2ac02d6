// crates/nf_foundation/src/error.rs

//! 基础错误类型
//!
//! 仅包含与基础设施相关的错误；网格、配置、求解等高层错误
//! 由各自 crate 定义并在边界处转换。

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型别名
pub type FoundationResult<T> = Result<T, FoundationError>;

/// 基础错误枚举
#[derive(Error, Debug)]
pub enum FoundationError {
    /// 无效输入
    #[error("无效输入: {0}")]
    InvalidInput(String),

    /// 索引越界
    #[error("索引越界: {index} 超出 {len} (上下文: {context})")]
    IndexOutOfBounds {
        /// 访问的索引
        index: usize,
        /// 容器长度
        len: usize,
        /// 出错位置说明
        context: &'static str,
    },

    /// IO 错误
    #[error("IO 错误 ({path}): {source}")]
    Io {
        /// 相关路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 内部不变量被破坏
    #[error("内部错误: {0}")]
    Internal(String),
}

impl FoundationError {
    /// 便捷构造：无效输入
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// 便捷构造：IO 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

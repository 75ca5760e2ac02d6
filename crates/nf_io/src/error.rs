// crates/nf_io/src/error.rs

//! IO 错误类型

use std::path::PathBuf;
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 底层读写失败
    #[error("文件操作失败 ({path}): {source}")]
    Io {
        /// 路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 场文件格式错误
    #[error("场文件格式错误 ({path}): {reason}")]
    BadFieldFile {
        /// 路径
        path: PathBuf,
        /// 原因
        reason: String,
    },

    /// 尺寸与网格不符
    #[error("场 {name} 尺寸不符: 文件 {file_len}, 网格 {expected}")]
    SizeMismatch {
        /// 场名
        name: String,
        /// 文件中的数组长度
        file_len: usize,
        /// 网格内部单元数
        expected: usize,
    },
}

impl IoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

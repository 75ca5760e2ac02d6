// crates/nf_config/src/error.rs

//! 配置错误类型
//!
//! 所有配置错误在解析期即为致命错误：单行诊断后进程退出码 1。

use thiserror::Error;

/// 配置模块结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 配置错误枚举
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取失败
    #[error("算例文件读取失败 ({path}): {reason}")]
    Io {
        /// 路径
        path: String,
        /// 原因
        reason: String,
    },

    /// 语法错误
    #[error("算例文件语法错误 (第 {line} 行): {reason}")]
    Syntax {
        /// 行号
        line: usize,
        /// 原因
        reason: String,
    },

    /// 未知键
    #[error("块 {block} 含未知键: {key}")]
    UnknownKey {
        /// 块名
        block: String,
        /// 键名
        key: String,
    },

    /// 缺失必需键
    #[error("块 {block} 缺少必需键: {key}")]
    MissingKey {
        /// 块名
        block: String,
        /// 键名
        key: String,
    },

    /// 值不可解析或越界
    #[error("块 {block} 键 {key} 的值无效: {reason}")]
    BadValue {
        /// 块名
        block: String,
        /// 键名
        key: String,
        /// 原因
        reason: String,
    },
}

// crates/nf_solvers/src/error.rs

//! 驱动层错误类型
//!
//! 数值发散在驱动层落地：写出最终检查点后以非零码终止；
//! 线性求解未收敛只是警告，不在此建模。

use thiserror::Error;

/// 驱动层结果类型别名
pub type SolverResult<T> = Result<T, SolverError>;

/// 驱动层错误枚举
#[derive(Error, Debug)]
pub enum SolverError {
    /// 残差出现 NaN/Inf 或失控增长
    #[error("数值发散: 场 {field}, 第 {step} 步 (残差 {residual:.3e})")]
    NumericalDivergence {
        /// 发散的场
        field: String,
        /// 外迭代步号
        step: usize,
        /// 残差
        residual: f64,
    },

    /// 边界条件缺失等场级错误
    #[error(transparent)]
    Field(#[from] nf_core::FieldError),

    /// IO 错误（初始读取为致命；写出失败由驱动降级为警告）
    #[error(transparent)]
    Io(#[from] nf_io::IoError),
}

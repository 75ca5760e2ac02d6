// crates/nf_foundation/src/lib.rs

//! NaviFlow Foundation Layer
//!
//! 零业务依赖的基础层，提供整个求解器的基础抽象。
//!
//! # 模块概览
//!
//! - [`scalar`]: 标量类型与数值守护常数
//! - [`tensor`]: 向量 / 对称张量 / 张量值类型及其逐点代数
//! - [`error`]: 统一基础错误类型
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 glam、serde 和 thiserror
//! 2. **值语义**: 所有张量类型均为 `Copy` 的 SoA 友好结构
//! 3. **无全局状态**: 一切通过参数注入

#![warn(clippy::all)]

pub mod error;
pub mod scalar;
pub mod tensor;

pub use error::{FoundationError, FoundationResult};
pub use scalar::{approx_eq, Scalar, GREAT, SMALL, VSMALL};
pub use tensor::{SymTensor, Tensor, Vector};

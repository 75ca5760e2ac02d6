// crates/nf_core/src/lib.rs

//! NaviFlow 求解核心
//!
//! 有限体积离散的核心代数层：
//! - [`field`]: 单元场 / 面场与边界条件（幽灵值求解）
//! - [`matrix`]: 面邻接稀疏算子 [`matrix::MeshMatrix`] 及其代数
//! - [`ops`]: 微分算子（梯度、散度、拉普拉斯、时间导数、通量）
//! - [`solver`]: 无矩阵预条件 Krylov 迭代（CG / BiCGStab）
//! - [`comm`]: 分区间交换与归约抽象（串行实现内置）
//! - [`controls`]: 运行时控制参数与格式选择器
//! - [`context`]: 进程级状态的显式化（网格 / 控制 / 物性 / 通信）
//!
//! # 体积分约定
//!
//! 矩阵携带的方程为体积分形式 `A·φ = su`；显式算子（如 [`ops::div`]）
//! 返回单位体积量，经 [`solver::Equation`] 移入源项时乘以单元体积。

#![warn(clippy::all)]

pub mod comm;
pub mod context;
pub mod controls;
pub mod field;
pub mod matrix;
pub mod ops;
pub mod solver;

pub use comm::Communicator;
pub use context::{Context, Properties};
pub use controls::{Controls, ConvectionScheme, Limiter, PreconditionerKind, TimeState};
pub use field::{
    bc::{add_default_bcs, update_explicit_bcs, BCondition, BcKind},
    Access, FaceField, Field, FieldElem, FieldError,
};
pub use matrix::{MatrixShape, MeshMatrix};
pub use solver::{solve, Equation, SolveOutcome, SolveStatus};

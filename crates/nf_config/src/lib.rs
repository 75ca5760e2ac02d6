// crates/nf_config/src/lib.rs

//! NaviFlow 算例文件层
//!
//! 文本算例文件由一串命名块组成：
//!
//! ```text
//! general {
//!     solver piso;
//!     mesh cavity/grid;
//!     rho 1.0;
//!     viscosity 1e-3;
//! }
//! piso {
//!     velocity_UR 0.8;
//!     pressure_UR 0.5;
//!     n_PISO 2;
//!     turbulence_model NONE;
//! }
//! controls {
//!     state STEADY;
//!     end_step 500;
//!     write_interval 100;
//!     tolerance 1e-8;
//! }
//! ```
//!
//! [`parse`] 负责词法与块结构；[`case`] 把块装配为类型化的
//! [`case::CaseFile`]。枚举值大小写不敏感；未知键、缺失必需键、
//! 越界枚举都是解析期致命错误（进程以退出码 1 终止）。

#![warn(clippy::all)]

pub mod case;
pub mod error;
pub mod parse;

pub use case::{CaseFile, GeneralBlock, PisoBlock, PotentialBlock, ScalarBlock, SolverKind, TurbulenceKind};
pub use error::{ConfigError, ConfigResult};
pub use parse::{Block, CaseText};

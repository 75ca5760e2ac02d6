// crates/nf_mesh/src/lib.rs

//! NaviFlow 非结构网格层
//!
//! 提供求解器核心所需的只读几何视图：
//! - [`mesh`]: SoA 布局的网格（owner/neighbor 面邻接、分区面片、幽灵编址）
//! - [`geometry`]: 面/单元几何量预计算（有向面积、形心、体积）
//! - [`io`]: vertices / faces / patches 文本格式读取（支持按进程号分目录）
//! - [`generation`]: 结构化长方体网格生成（测试与演示用）
//!
//! # 面排序约定
//!
//! 内部面在前 `[0, n_interior)`，边界面在后；边界面 f 对应的幽灵单元
//! 编号为 `n_cells + (f - n_interior)`。该约定贯穿字段存储与矩阵组装。

#![warn(clippy::all)]

pub mod error;
pub mod generation;
pub mod geometry;
pub mod io;
pub mod mesh;

pub use error::{MeshError, MeshResult};
pub use generation::BoxMesh;
pub use mesh::{Mesh, Patch, PatchKind};

// crates/nf_core/src/context.rs

//! 进程级状态的显式化
//!
//! 网格、控制参数、物性与通信器在启动时构建为一个 [`Context`]，
//! 随后以只读引用贯穿所有算子与驱动。配置解析完成后不再变更，
//! 无全局量，亦无退出钩子。

use crate::comm::Communicator;
use crate::controls::Controls;
use nf_foundation::{Scalar, Vector};
use nf_mesh::Mesh;
use std::sync::Arc;

/// 通用物性
#[derive(Debug, Clone)]
pub struct Properties {
    /// 密度 ρ [kg/m³]
    pub rho: Scalar,
    /// 运动黏度 ν [m²/s]
    pub viscosity: Scalar,
    /// 热导率（标量输运的默认扩散系数来源）
    pub conductivity: Scalar,
    /// 重力加速度
    pub gravity: Vector,
}

impl Default for Properties {
    fn default() -> Self {
        Self {
            rho: 1.0,
            viscosity: 1e-5,
            conductivity: 1e-4,
            gravity: Vector::new(0.0, 0.0, -9.81),
        }
    }
}

/// 进程级上下文
#[derive(Debug, Clone)]
pub struct Context {
    /// 只读网格
    pub mesh: Arc<Mesh>,
    /// 运行时控制
    pub controls: Controls,
    /// 通用物性
    pub props: Properties,
    /// 通信器
    pub comm: Communicator,
}

impl Context {
    /// 以默认控制与物性构建（测试用）
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh,
            controls: Controls::default(),
            props: Properties::default(),
            comm: Communicator::Serial,
        }
    }
}

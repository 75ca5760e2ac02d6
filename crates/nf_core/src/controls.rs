// crates/nf_core/src/controls.rs

//! 运行时控制参数
//!
//! 对应算例文件的 `controls` 块：步进区间、时间格式、线性求解器
//! 容差与按场的对流格式选择。进程级只读状态，配置解析后不再修改。

use nf_foundation::Scalar;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 时间推进状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimeState {
    /// 稳态（外迭代 + 欠松弛）
    #[default]
    Steady,
    /// 瞬态（时间导数 + 可选 Crank-Nicolson）
    Transient,
}

impl TimeState {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "STEADY" => Some(Self::Steady),
            "TRANSIENT" => Some(Self::Transient),
            _ => None,
        }
    }
}

/// TVD 限制器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Limiter {
    /// Minmod（最耗散）
    Minmod,
    /// Van Leer
    VanLeer,
    /// Superbee（最锐利）
    Superbee,
}

impl Limiter {
    /// 限制函数 ψ(r)
    #[inline]
    pub fn psi(&self, r: Scalar) -> Scalar {
        match self {
            Self::Minmod => r.min(1.0).max(0.0),
            Self::VanLeer => {
                if r <= 0.0 {
                    0.0
                } else {
                    (r + r.abs()) / (1.0 + r.abs())
                }
            }
            Self::Superbee => (2.0 * r).min(1.0).max(r.min(2.0)).max(0.0),
        }
    }
}

/// 对流格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConvectionScheme {
    /// 一阶迎风（隐式，无条件有界）
    #[default]
    Upwind,
    /// 线性中心（隐式，二阶）
    Central,
    /// TVD：迎风隐式 + 限制器高阶部分延迟修正入源项
    Tvd(Limiter),
}

impl ConvectionScheme {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "UPWIND" | "UDS" => Some(Self::Upwind),
            "CENTRAL" | "CDS" => Some(Self::Central),
            "MINMOD" => Some(Self::Tvd(Limiter::Minmod)),
            "VANLEER" | "VAN_LEER" => Some(Self::Tvd(Limiter::VanLeer)),
            "SUPERBEE" => Some(Self::Tvd(Limiter::Superbee)),
            _ => None,
        }
    }
}

/// 预条件器选择
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PreconditionerKind {
    /// 对角（始终可用）
    #[default]
    Jacobi,
    /// 对称逐次超松弛扫掠
    Sor,
}

impl PreconditionerKind {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "JACOBI" | "DIAGONAL" => Some(Self::Jacobi),
            "SOR" | "SSOR" => Some(Self::Sor),
            _ => None,
        }
    }
}

/// 运行时控制参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Controls {
    /// 起始步
    pub start_step: usize,
    /// 结束步
    pub end_step: usize,
    /// 写出间隔（步）
    pub write_interval: usize,
    /// 时间步长 [s]
    pub dt: Scalar,
    /// 稳态 / 瞬态
    pub state: TimeState,
    /// 时间格式因子 θ（1 = 全隐式，0.5 = Crank-Nicolson）
    pub time_scheme_factor: Scalar,
    /// 线性求解器收敛容差（缩放残差）
    pub tolerance: Scalar,
    /// 线性求解器最大迭代次数
    pub max_iterations: usize,
    /// 预条件器
    pub preconditioner: PreconditionerKind,
    /// 按场名的对流格式覆盖
    pub schemes: HashMap<String, ConvectionScheme>,
    /// 默认对流格式
    pub default_scheme: ConvectionScheme,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            start_step: 0,
            end_step: 1,
            write_interval: 1,
            dt: 1.0,
            state: TimeState::Steady,
            time_scheme_factor: 1.0,
            tolerance: 1e-8,
            max_iterations: 1000,
            preconditioner: PreconditionerKind::Jacobi,
            schemes: HashMap::new(),
            default_scheme: ConvectionScheme::Upwind,
        }
    }
}

impl Controls {
    /// 场的对流格式（无覆盖时取默认值）
    pub fn scheme_for(&self, field_name: &str) -> ConvectionScheme {
        self.schemes
            .get(field_name)
            .copied()
            .unwrap_or(self.default_scheme)
    }

    /// 是否稳态
    #[inline]
    pub fn is_steady(&self) -> bool {
        self.state == TimeState::Steady
    }
}

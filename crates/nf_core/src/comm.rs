// crates/nf_core/src/comm.rs

//! 分区间通信抽象
//!
//! 核心只依赖三种集合操作：
//! 1. `exchange` —— 近邻阻塞式 halo 交换（Krylov 每次 SpMV 之前调用）
//! 2. `allreduce_*` —— 全局归约（内积、范数、残差）
//! 3. `rank` / `size` / `is_root` —— 进程谓词
//!
//! 采用带标签的枚举做显式分派：串行实现内置；分布式实现
//! （消息传递协作者）作为新变体接入，核心代码无需改动。
//! 串行实现下 `exchange` 为恒等操作，归约为本地值。

use crate::field::FieldElem;
use nf_foundation::Scalar;

/// 归约操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// 求和
    Sum,
    /// 最小值
    Min,
    /// 最大值
    Max,
}

/// 通信器（显式分派的标签变体）
#[derive(Debug, Clone, Default)]
pub enum Communicator {
    /// 单进程：交换为恒等，归约为本地值
    #[default]
    Serial,
}

impl Communicator {
    /// 近邻 halo 交换
    ///
    /// 分布式实现将分区边界 owner 值写入对端幽灵槽；
    /// 串行实现无事可做。
    #[inline]
    pub fn exchange<T: FieldElem>(&self, _data: &mut [T]) {
        match self {
            Self::Serial => {}
        }
    }

    /// 标量全局归约
    #[inline]
    pub fn allreduce(&self, local: Scalar, _op: ReduceOp) -> Scalar {
        match self {
            Self::Serial => local,
        }
    }

    /// 求和归约的便捷入口
    #[inline]
    pub fn allreduce_sum(&self, local: Scalar) -> Scalar {
        self.allreduce(local, ReduceOp::Sum)
    }

    /// 本进程序号
    #[inline]
    pub fn rank(&self) -> usize {
        match self {
            Self::Serial => 0,
        }
    }

    /// 进程总数
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            Self::Serial => 1,
        }
    }

    /// 是否为根进程（日志与探针输出的守卫）
    #[inline]
    pub fn is_root(&self) -> bool {
        self.rank() == 0
    }
}

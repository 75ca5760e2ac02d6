// crates/nf_core/src/solver/mod.rs

//! 线性求解入口
//!
//! `M == rhs` 的源码惯用法在此成为显式的 [`Equation`] 值：
//! 右端项按规范符号乘以单元体积移入源项，随后按矩阵形状
//! 选择 CG（对称）或 BiCGStab（其余），按控制参数选择预条件器。
//!
//! 求解前做符号归一：若对角平均为负（直接以 `lap` 形式给出的
//! 压力泊松方程），整个方程乘以 −1，保证 CG 的正定性约定。
//! 未收敛记警告后继续；残差非有限由驱动决定中止。

mod krylov;
mod precond;

pub use krylov::{bicgstab, cg, KrylovConfig, SolveOutcome, SolveStatus};
pub use precond::Precond;

use crate::context::Context;
use crate::controls::PreconditionerKind;
use crate::field::{Field, FieldElem};
use crate::matrix::{MatrixShape, MeshMatrix};

/// 待求解方程 `A·φ = su`
pub struct Equation<T: FieldElem> {
    matrix: MeshMatrix<T>,
}

impl<T: FieldElem> Equation<T> {
    /// 由矩阵构造（源项已含右端）
    pub fn new(matrix: MeshMatrix<T>) -> Self {
        Self { matrix }
    }

    /// 右端项移入源项（按单元体积积分）
    pub fn with_rhs(mut self, rhs: &Field<T>) -> Self {
        self.matrix.add_su_vol(rhs);
        self
    }

    /// 求解并把解写回场的内部单元
    pub fn solve(mut self, phi: &mut Field<T>, ctx: &Context) -> SolveOutcome {
        // 符号归一
        let diag_mean: f64 = self.matrix.ap.iter().sum::<f64>() / self.matrix.ap.len() as f64;
        if diag_mean < 0.0 {
            self.matrix.scale(-1.0);
        }

        let cfg = KrylovConfig {
            tol: ctx.controls.tolerance,
            max_iter: ctx.controls.max_iterations,
        };
        let b = self.matrix.su.clone();
        let m = &self.matrix;
        let x = phi.internal_mut();

        let outcome = match (m.shape, ctx.controls.preconditioner) {
            (MatrixShape::Symmetric, PreconditionerKind::Jacobi) => {
                cg(m, &b, x, &Precond::jacobi(m), &ctx.comm, cfg)
            }
            (MatrixShape::Symmetric, PreconditionerKind::Sor) => {
                cg(m, &b, x, &Precond::sor(m), &ctx.comm, cfg)
            }
            (_, PreconditionerKind::Jacobi) => {
                bicgstab(m, &b, x, &Precond::jacobi(m), &ctx.comm, cfg)
            }
            (_, PreconditionerKind::Sor) => {
                bicgstab(m, &b, x, &Precond::sor(m), &ctx.comm, cfg)
            }
        };

        match outcome.status {
            SolveStatus::Converged => {
                log::debug!(
                    "{}: {} 次迭代收敛, 残差 {:.3e}",
                    phi.name,
                    outcome.iterations,
                    outcome.residual
                );
            }
            SolveStatus::MaxIterations | SolveStatus::Stagnated => {
                log::warn!(
                    "{}: 线性求解未达容差 ({:?}, {} 次迭代, 残差 {:.3e})",
                    phi.name,
                    outcome.status,
                    outcome.iterations,
                    outcome.residual
                );
            }
            SolveStatus::Diverged => {
                log::error!(
                    "{}: 线性求解发散 (残差 {:.3e})",
                    phi.name,
                    outcome.residual
                );
            }
        }

        outcome
    }
}

/// 便捷入口：`solve(M == 0)` 形式（右端已在源项中）
pub fn solve<T: FieldElem>(
    phi: &mut Field<T>,
    matrix: MeshMatrix<T>,
    ctx: &Context,
) -> SolveOutcome {
    Equation::new(matrix).solve(phi, ctx)
}

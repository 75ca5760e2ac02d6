// crates/nf_core/src/solver/krylov.rs

//! 无矩阵 Krylov 迭代
//!
//! 直接作用于面邻接矩阵的 CG 与 BiCGStab。收敛判据为缩放残差
//! `‖r‖ / ‖b‖ < tol`；全部内积经通信器归约，每次 SpMV 前对
//! 迭代向量做 halo 交换。
//!
//! 解分量可以是任意场元素（标量 / 向量）：同一系数矩阵对各
//! 分量共用，内积对分量求和。

use super::precond::Precond;
use crate::comm::Communicator;
use crate::field::FieldElem;
use crate::matrix::MeshMatrix;
use nf_foundation::{Scalar, SMALL};

/// 求解状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    /// 达到容差
    Converged,
    /// 迭代上限
    MaxIterations,
    /// 分母塌缩（停滞）
    Stagnated,
    /// 残差增长失控或出现非有限值
    Diverged,
}

/// 求解结果
#[derive(Debug, Clone, Copy)]
pub struct SolveOutcome {
    /// 状态
    pub status: SolveStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终缩放残差
    pub residual: Scalar,
    /// 初始缩放残差
    pub initial_residual: Scalar,
}

impl SolveOutcome {
    /// 是否收敛
    #[inline]
    pub fn converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    /// 是否发散（残差非有限或失控）
    #[inline]
    pub fn diverged(&self) -> bool {
        self.status == SolveStatus::Diverged
    }
}

/// 迭代参数
#[derive(Debug, Clone, Copy)]
pub struct KrylovConfig {
    /// 缩放残差容差
    pub tol: Scalar,
    /// 最大迭代次数
    pub max_iter: usize,
}

#[inline]
fn dot_g<T: FieldElem>(a: &[T], b: &[T], comm: &Communicator) -> Scalar {
    let local: Scalar = a.iter().zip(b.iter()).map(|(&x, &y)| x.dot(y)).sum();
    comm.allreduce_sum(local)
}

#[inline]
fn norm_g<T: FieldElem>(a: &[T], comm: &Communicator) -> Scalar {
    dot_g(a, a, comm).sqrt()
}

/// 共轭梯度（对称矩阵）
pub fn cg<T: FieldElem>(
    m: &MeshMatrix<T>,
    b: &[T],
    x: &mut [T],
    precond: &Precond<'_, T>,
    comm: &Communicator,
    cfg: KrylovConfig,
) -> SolveOutcome {
    let n = b.len();
    let scale = norm_g(b, comm).max(SMALL);

    comm.exchange(x);
    let ax = m.apply(x);
    let mut r: Vec<T> = b.iter().zip(ax.iter()).map(|(&bi, &ai)| bi - ai).collect();

    let initial = norm_g(&r, comm) / scale;
    if initial < cfg.tol {
        return SolveOutcome {
            status: SolveStatus::Converged,
            iterations: 0,
            residual: initial,
            initial_residual: initial,
        };
    }

    let mut z = vec![T::zero(); n];
    precond.apply(&r, &mut z);
    let mut p = z.clone();
    let mut rz = dot_g(&r, &z, comm);

    for iter in 0..cfg.max_iter {
        comm.exchange(&mut p);
        let ap = m.apply(&p);
        let pap = dot_g(&p, &ap, comm);
        if pap.abs() < 1e-300 {
            return SolveOutcome {
                status: SolveStatus::Stagnated,
                iterations: iter,
                residual: norm_g(&r, comm) / scale,
                initial_residual: initial,
            };
        }

        let alpha = rz / pap;
        for c in 0..n {
            x[c] += p[c] * alpha;
            r[c] -= ap[c] * alpha;
        }

        let res = norm_g(&r, comm) / scale;
        if !res.is_finite() {
            return SolveOutcome {
                status: SolveStatus::Diverged,
                iterations: iter + 1,
                residual: res,
                initial_residual: initial,
            };
        }
        log::trace!("CG 迭代 {}: 残差 = {:.6e}", iter + 1, res);
        if res < cfg.tol {
            return SolveOutcome {
                status: SolveStatus::Converged,
                iterations: iter + 1,
                residual: res,
                initial_residual: initial,
            };
        }

        precond.apply(&r, &mut z);
        let rz_new = dot_g(&r, &z, comm);
        let beta = rz_new / rz;
        rz = rz_new;
        for c in 0..n {
            p[c] = z[c] + p[c] * beta;
        }
    }

    SolveOutcome {
        status: SolveStatus::MaxIterations,
        iterations: cfg.max_iter,
        residual: norm_g(&r, comm) / scale,
        initial_residual: initial,
    }
}

/// 预条件 BiCGStab（非对称矩阵）
pub fn bicgstab<T: FieldElem>(
    m: &MeshMatrix<T>,
    b: &[T],
    x: &mut [T],
    precond: &Precond<'_, T>,
    comm: &Communicator,
    cfg: KrylovConfig,
) -> SolveOutcome {
    let n = b.len();
    let scale = norm_g(b, comm).max(SMALL);

    comm.exchange(x);
    let ax = m.apply(x);
    let mut r: Vec<T> = b.iter().zip(ax.iter()).map(|(&bi, &ai)| bi - ai).collect();

    let initial = norm_g(&r, comm) / scale;
    if initial < cfg.tol {
        return SolveOutcome {
            status: SolveStatus::Converged,
            iterations: 0,
            residual: initial,
            initial_residual: initial,
        };
    }

    // 影子残差固定为初始残差
    let r0 = r.clone();
    let mut rho_old: Scalar = 1.0;
    let mut alpha: Scalar = 1.0;
    let mut omega: Scalar = 1.0;
    let mut p = vec![T::zero(); n];
    let mut v = vec![T::zero(); n];
    let mut z = vec![T::zero(); n];

    for iter in 0..cfg.max_iter {
        let rho = dot_g(&r0, &r, comm);
        if rho.abs() < 1e-300 {
            return SolveOutcome {
                status: SolveStatus::Stagnated,
                iterations: iter,
                residual: norm_g(&r, comm) / scale,
                initial_residual: initial,
            };
        }

        let beta = if iter == 0 {
            0.0
        } else {
            (rho / rho_old) * (alpha / omega)
        };
        rho_old = rho;

        for c in 0..n {
            p[c] = r[c] + (p[c] - v[c] * omega) * beta;
        }

        precond.apply(&p, &mut z);
        comm.exchange(&mut z);
        v = m.apply(&z);

        let r0v = dot_g(&r0, &v, comm);
        if r0v.abs() < 1e-300 {
            return SolveOutcome {
                status: SolveStatus::Stagnated,
                iterations: iter,
                residual: norm_g(&r, comm) / scale,
                initial_residual: initial,
            };
        }
        alpha = rho / r0v;

        // x 的第一半步
        for c in 0..n {
            x[c] += z[c] * alpha;
        }
        let s: Vec<T> = r.iter().zip(v.iter()).map(|(&ri, &vi)| ri - vi * alpha).collect();
        let s_norm = norm_g(&s, comm) / scale;
        if s_norm < cfg.tol {
            return SolveOutcome {
                status: SolveStatus::Converged,
                iterations: iter + 1,
                residual: s_norm,
                initial_residual: initial,
            };
        }

        precond.apply(&s, &mut z);
        comm.exchange(&mut z);
        let t = m.apply(&z);
        let tt = dot_g(&t, &t, comm);
        omega = if tt.abs() < 1e-300 {
            1.0
        } else {
            dot_g(&t, &s, comm) / tt
        };

        for c in 0..n {
            x[c] += z[c] * omega;
            r[c] = s[c] - t[c] * omega;
        }

        let res = norm_g(&r, comm) / scale;
        if !res.is_finite() || res > initial * 1e6 {
            return SolveOutcome {
                status: SolveStatus::Diverged,
                iterations: iter + 1,
                residual: res,
                initial_residual: initial,
            };
        }
        log::trace!("BiCGStab 迭代 {}: 残差 = {:.6e}", iter + 1, res);
        if res < cfg.tol {
            return SolveOutcome {
                status: SolveStatus::Converged,
                iterations: iter + 1,
                residual: res,
                initial_residual: initial,
            };
        }
    }

    SolveOutcome {
        status: SolveStatus::MaxIterations,
        iterations: cfg.max_iter,
        residual: norm_g(&r, comm) / scale,
        initial_residual: initial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixShape;
    use nf_mesh::BoxMesh;
    use std::sync::Arc;

    /// 1 维链上的对称正定测试矩阵 (2, -1) 三对角 + 对角增强
    fn spd_chain(n: usize) -> MeshMatrix<Scalar> {
        let mesh = Arc::new(
            BoxMesh::new(n, 1, 1).with_extent(n as f64, 1.0, 1.0).build().unwrap(),
        );
        let mut m = MeshMatrix::<Scalar>::zero(mesh.clone(), MatrixShape::Symmetric);
        for c in 0..n {
            m.ap[c] = 3.0;
        }
        for f in 0..mesh.n_interior_faces {
            m.an_owner[f] = 1.0;
            m.an_neigh[f] = 1.0;
        }
        m
    }

    fn exact_solve_check(m: &MeshMatrix<Scalar>, x_star: &[Scalar], use_cg: bool) {
        let b = m.apply(x_star);
        let mut x = vec![0.0; x_star.len()];
        let comm = Communicator::Serial;
        let p = Precond::jacobi(m);
        let cfg = KrylovConfig {
            tol: 1e-12,
            max_iter: 500,
        };
        let out = if use_cg {
            cg(m, &b, &mut x, &p, &comm, cfg)
        } else {
            bicgstab(m, &b, &mut x, &p, &comm, cfg)
        };
        assert!(out.converged(), "未收敛: {:?}", out.status);
        for c in 0..x.len() {
            assert!((x[c] - x_star[c]).abs() < 1e-9, "x[{}] = {}", c, x[c]);
        }
    }

    #[test]
    fn test_cg_solves_spd_system() {
        let m = spd_chain(10);
        let x_star: Vec<Scalar> = (0..10).map(|i| (i as Scalar * 0.7).sin()).collect();
        exact_solve_check(&m, &x_star, true);
    }

    #[test]
    fn test_bicgstab_solves_asymmetric_system() {
        let mut m = spd_chain(10);
        // 打破对称：模拟迎风对流
        for f in 0..m.an_owner.len() {
            m.an_owner[f] = 0.5;
            m.an_neigh[f] = 1.5;
        }
        m.shape = MatrixShape::Asymmetric;
        let x_star: Vec<Scalar> = (0..10).map(|i| 1.0 + i as Scalar).collect();
        exact_solve_check(&m, &x_star, false);
    }

    #[test]
    fn test_already_converged_returns_zero_iterations() {
        let m = spd_chain(5);
        let x_star = vec![0.25; 5];
        let b = m.apply(&x_star);
        let mut x = x_star.clone();
        let comm = Communicator::Serial;
        let p = Precond::jacobi(&m);
        let out = cg(
            &m,
            &b,
            &mut x,
            &p,
            &comm,
            KrylovConfig {
                tol: 1e-10,
                max_iter: 100,
            },
        );
        assert!(out.converged());
        assert_eq!(out.iterations, 0);
    }

    #[test]
    fn test_sor_preconditioner_accelerates() {
        let m = spd_chain(40);
        let x_star: Vec<Scalar> = (0..40).map(|i| (i as Scalar).cos()).collect();
        let b = m.apply(&x_star);
        let comm = Communicator::Serial;
        let cfg = KrylovConfig {
            tol: 1e-12,
            max_iter: 500,
        };

        let mut x1 = vec![0.0; 40];
        let out_j = cg(&m, &b, &mut x1, &Precond::jacobi(&m), &comm, cfg);
        let mut x2 = vec![0.0; 40];
        let out_s = cg(&m, &b, &mut x2, &Precond::sor(&m), &comm, cfg);

        assert!(out_j.converged() && out_s.converged());
        assert!(out_s.iterations <= out_j.iterations);
    }

    #[test]
    fn test_vector_unknowns_share_coefficients() {
        use nf_foundation::Vector;
        let m_s = spd_chain(8);
        // 同一矩阵求解向量未知量，各分量独立成立
        let mesh = m_s.mesh.clone();
        let mut m = MeshMatrix::<Vector>::zero(mesh, MatrixShape::Symmetric);
        m.ap = m_s.ap.clone();
        m.an_owner = m_s.an_owner.clone();
        m.an_neigh = m_s.an_neigh.clone();

        let x_star: Vec<Vector> = (0..8)
            .map(|i| Vector::new(i as Scalar, -(i as Scalar), 0.5))
            .collect();
        let b = m.apply(&x_star);
        let mut x = vec![Vector::ZERO; 8];
        let comm = Communicator::Serial;
        let p = Precond::jacobi(&m);
        let out = cg(
            &m,
            &b,
            &mut x,
            &p,
            &comm,
            KrylovConfig {
                tol: 1e-12,
                max_iter: 200,
            },
        );
        assert!(out.converged());
        for c in 0..8 {
            assert!((x[c] - x_star[c]).length() < 1e-9);
        }
    }
}

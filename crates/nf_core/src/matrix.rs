// crates/nf_core/src/matrix.rs

//! 网格矩阵
//!
//! 以面邻接组织的稀疏算子，表示体积分方程 `A·φ = su`：
//! - `ap`: 对角，每单元一个标量
//! - `an_owner` / `an_neigh`: 每个内部面一对非对角系数
//! - `su`: 显式源（体积分形式）
//!
//! 符号约定：`apply(φ)[c] = ap[c]·φ[c] − Σ_f an·φ[对侧]`。
//! 边界面的系数在组装期折入 `ap`/`su`，求解器只作用于内部块。
//!
//! 守恒不变量：无边界源的纯扩散算子行和为零（`ap[c] = Σ an`）。
//! 矩阵由算子创建，表达式组合完成后随即被求解消耗。

use crate::field::{Field, FieldElem};
use nf_foundation::Scalar;
use nf_mesh::Mesh;
use std::ops::{AddAssign, MulAssign};
use std::sync::Arc;

/// 矩阵形状标志
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixShape {
    /// 数值对称（an_owner == an_neigh），可用 CG
    Symmetric,
    /// 结构对称但数值不对称
    SymmetricStructure,
    /// 非对称（含对流）
    Asymmetric,
}

impl MatrixShape {
    /// 两算子相加后的形状
    pub fn combine(self, other: Self) -> Self {
        use MatrixShape::*;
        match (self, other) {
            (Symmetric, Symmetric) => Symmetric,
            (Asymmetric, _) | (_, Asymmetric) => Asymmetric,
            _ => SymmetricStructure,
        }
    }
}

/// 面邻接稀疏矩阵
#[derive(Debug, Clone)]
pub struct MeshMatrix<T: FieldElem> {
    /// 网格句柄
    pub mesh: Arc<Mesh>,
    /// 对角系数
    pub ap: Vec<Scalar>,
    /// owner 行对 neighbor 值的系数（按内部面）
    pub an_owner: Vec<Scalar>,
    /// neighbor 行对 owner 值的系数（按内部面）
    pub an_neigh: Vec<Scalar>,
    /// 显式源（体积分）
    pub su: Vec<T>,
    /// 形状标志
    pub shape: MatrixShape,
}

impl<T: FieldElem> MeshMatrix<T> {
    /// 零矩阵
    pub fn zero(mesh: Arc<Mesh>, shape: MatrixShape) -> Self {
        let n_cells = mesh.n_cells;
        let n_interior = mesh.n_interior_faces;
        Self {
            mesh,
            ap: vec![0.0; n_cells],
            an_owner: vec![0.0; n_interior],
            an_neigh: vec![0.0; n_interior],
            su: vec![T::zero(); n_cells],
            shape,
        }
    }

    /// 无矩阵乘法 `A·φ`（不含 su）
    ///
    /// `phi` 为内部单元切片（长度 n_cells）。
    pub fn apply(&self, phi: &[T]) -> Vec<T> {
        debug_assert_eq!(phi.len(), self.ap.len());
        let mut out: Vec<T> = self
            .ap
            .iter()
            .zip(phi.iter())
            .map(|(&a, &v)| v * a)
            .collect();
        for f in 0..self.an_owner.len() {
            let o = self.mesh.owner(f);
            let n = self.mesh.neighbor(f).expect("内部面必有邻居");
            out[o] -= phi[n] * self.an_owner[f];
            out[n] -= phi[o] * self.an_neigh[f];
        }
        out
    }

    /// H 算子：`su + Σ an·φ[对侧]`（非对角贡献加显式源）
    ///
    /// PISO 校正步中 `H(U)/ap` 的分子。
    pub fn rhs_of(&self, phi: &[T]) -> Vec<T> {
        debug_assert_eq!(phi.len(), self.ap.len());
        let mut out = self.su.clone();
        for f in 0..self.an_owner.len() {
            let o = self.mesh.owner(f);
            let n = self.mesh.neighbor(f).expect("内部面必有邻居");
            out[o] += phi[n] * self.an_owner[f];
            out[n] += phi[o] * self.an_neigh[f];
        }
        out
    }

    /// 隐式欠松弛
    ///
    /// 对角除以 α，`(1−α)/α·ap·φ` 计入源项；方程不动点不变。
    pub fn relax(&mut self, alpha: Scalar, phi: &[T]) {
        debug_assert!(alpha > 0.0 && alpha <= 1.0, "欠松弛因子必须在 (0,1]");
        let factor = (1.0 - alpha) / alpha;
        for c in 0..self.ap.len() {
            self.su[c] += phi[c] * (self.ap[c] * factor);
            self.ap[c] /= alpha;
        }
    }

    /// 整体缩放（ap、an、su 同乘）
    pub fn scale(&mut self, s: Scalar) {
        for a in &mut self.ap {
            *a *= s;
        }
        for a in &mut self.an_owner {
            *a *= s;
        }
        for a in &mut self.an_neigh {
            *a *= s;
        }
        for v in &mut self.su {
            *v = *v * s;
        }
    }

    /// Crank–Nicolson 改写
    ///
    /// `M ← θ·M; su ← su − (1−θ)·(A·φⁿ)`，θ = 时间格式因子。
    pub fn crank_nicolson(&mut self, theta: Scalar, phi_old: &[T]) {
        let po = self.apply(phi_old);
        self.scale(theta);
        for c in 0..self.su.len() {
            self.su[c] -= po[c] * (1.0 - theta);
        }
    }

    /// 对角倒数（PISO 的 1/ap）
    pub fn inverse_diag(&self) -> Vec<Scalar> {
        self.ap.iter().map(|&a| 1.0 / a).collect()
    }

    /// 源项加上体积分后的场值：`su[c] += rhs[c]·V_c`
    ///
    /// 显式算子按单位体积返回，移入源项时在此积分。
    pub fn add_su_vol(&mut self, rhs: &Field<T>) {
        for c in 0..self.su.len() {
            self.su[c] += rhs[c] * self.mesh.cell_volume[c];
        }
    }

    /// 行和（对角减非对角），守恒性测试用
    pub fn row_sums(&self) -> Vec<Scalar> {
        let mut sums = self.ap.clone();
        for f in 0..self.an_owner.len() {
            let o = self.mesh.owner(f);
            let n = self.mesh.neighbor(f).expect("内部面必有邻居");
            sums[o] -= self.an_owner[f];
            sums[n] -= self.an_neigh[f];
        }
        sums
    }
}

impl<T: FieldElem> AddAssign<MeshMatrix<T>> for MeshMatrix<T> {
    fn add_assign(&mut self, o: MeshMatrix<T>) {
        debug_assert_eq!(self.ap.len(), o.ap.len());
        for (a, b) in self.ap.iter_mut().zip(o.ap.iter()) {
            *a += b;
        }
        for (a, b) in self.an_owner.iter_mut().zip(o.an_owner.iter()) {
            *a += b;
        }
        for (a, b) in self.an_neigh.iter_mut().zip(o.an_neigh.iter()) {
            *a += b;
        }
        for (a, &b) in self.su.iter_mut().zip(o.su.iter()) {
            *a += b;
        }
        self.shape = self.shape.combine(o.shape);
    }
}

impl<T: FieldElem> MulAssign<Scalar> for MeshMatrix<T> {
    fn mul_assign(&mut self, s: Scalar) {
        self.scale(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_mesh::BoxMesh;

    /// 1 维三单元链上的手工扩散矩阵
    fn chain_matrix() -> MeshMatrix<Scalar> {
        let mesh = Arc::new(
            BoxMesh::new(3, 1, 1).with_extent(3.0, 1.0, 1.0).build().unwrap(),
        );
        let mut m = MeshMatrix::<Scalar>::zero(mesh.clone(), MatrixShape::Symmetric);
        // 面 0: 单元 0-1，面 1: 单元 1-2，D = 1
        for f in 0..mesh.n_interior_faces {
            let o = mesh.owner(f);
            let n = mesh.neighbor(f).unwrap();
            m.ap[o] += 1.0;
            m.ap[n] += 1.0;
            m.an_owner[f] += 1.0;
            m.an_neigh[f] += 1.0;
        }
        m
    }

    #[test]
    fn test_apply_matches_stencil() {
        let m = chain_matrix();
        let phi = vec![1.0, 2.0, 4.0];
        let y = m.apply(&phi);
        // 行 0: 1*1 − 1*2 = −1; 行 1: 2*2 − 1 − 4 = −1; 行 2: 1*4 − 2 = 2
        assert_eq!(y, vec![-1.0, -1.0, 2.0]);
    }

    #[test]
    fn test_conservative_row_sums() {
        let m = chain_matrix();
        for s in m.row_sums() {
            assert!(s.abs() < 1e-14, "纯扩散行和必须为零");
        }
    }

    #[test]
    fn test_rhs_is_h_operator() {
        let mut m = chain_matrix();
        m.su = vec![1.0, 1.0, 1.0];
        let phi = vec![1.0, 2.0, 4.0];
        let h = m.rhs_of(&phi);
        // H[0] = 1 + 1*2 = 3; H[1] = 1 + 1 + 4 = 6; H[2] = 1 + 2 = 3
        assert_eq!(h, vec![3.0, 6.0, 3.0]);
    }

    #[test]
    fn test_relax_preserves_fixed_point() {
        let mut m = chain_matrix();
        // 加对角占优与源，构造方程 A·φ* = su 的一个不动点
        for a in &mut m.ap {
            *a += 2.0;
        }
        let phi_star = vec![1.0, 2.0, 3.0];
        m.su = m.apply(&phi_star);

        let residual_before: Scalar = m
            .apply(&phi_star)
            .iter()
            .zip(m.su.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(residual_before < 1e-14);

        m.relax(0.7, &phi_star);
        let residual_after: Scalar = m
            .apply(&phi_star)
            .iter()
            .zip(m.su.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(residual_after < 1e-12, "欠松弛改变了不动点");
    }

    #[test]
    fn test_shape_combine() {
        use MatrixShape::*;
        assert_eq!(Symmetric.combine(Symmetric), Symmetric);
        assert_eq!(Symmetric.combine(Asymmetric), Asymmetric);
        assert_eq!(SymmetricStructure.combine(Symmetric), SymmetricStructure);
    }

    #[test]
    fn test_crank_nicolson_rewrite() {
        let mut m = chain_matrix();
        for a in &mut m.ap {
            *a += 1.0;
        }
        m.su = vec![1.0, 1.0, 1.0];
        let phi_old = vec![1.0, 1.0, 1.0];
        let po = m.apply(&phi_old);
        let theta = 0.5;

        let mut cn = m.clone();
        cn.crank_nicolson(theta, &phi_old);
        for c in 0..3 {
            assert!((cn.ap[c] - theta * m.ap[c]).abs() < 1e-14);
            let expect = m.su[c] * theta - (1.0 - theta) * po[c];
            assert!((cn.su[c] - expect).abs() < 1e-14);
        }
    }
}

// crates/nf_solvers/src/turbulence/kx.rs

//! k-ε / k-ω 两方程族
//!
//! 一套共享的两方程核心覆盖四个变体（系数集 + 可选附加项）：
//!
//! | 变体 | 第二方程 | 涡黏 |
//! |------|---------|------|
//! | 标准 k-ε | ε | μ_t = ρ·C_μ·k²/ε |
//! | RNG k-ε | ε（C₁ 含应变修正） | 同上 |
//! | Realizable k-ε | ε（产生项 ∝ S·ε） | 同上 |
//! | k-ω | ω | μ_t = ρ·k/ω |
//!
//! 两个输运方程都用核心的算子代数组装
//! （`div(φ,F,μ_eff) + 源项线性化 + ddt / 欠松弛`），
//! 近壁单元以 Launder–Spalding 壁面函数定值（矩阵行固定）。

use crate::turbulence::strain_rate_sq;
use crate::SolverResult;
use nf_core::field::bc::{add_default_bcs, update_explicit_bcs, BCondition};
use nf_core::field::{FaceField, Field};
use nf_core::ops;
use nf_core::{solve, Access, Context, ConvectionScheme, MeshMatrix};
use nf_foundation::{Scalar, Vector, SMALL};
use nf_mesh::Mesh;
use serde::{Deserialize, Serialize};

/// k 下限
const K_MIN: Scalar = 1e-10;
/// ε/ω 下限
const X_MIN: Scalar = 1e-10;
/// 涡黏上限
const MU_T_MAX: Scalar = 1e3;

/// 族内变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KxVariant {
    /// 标准 k-ε（Launder–Spalding）
    KEpsilon,
    /// RNG k-ε
    RngKEpsilon,
    /// Realizable k-ε
    RealizableKEpsilon,
    /// Wilcox k-ω
    KOmega,
}

/// 模型系数集
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KxCoeffs {
    /// C_μ（k-ω 中为 β*）
    pub c_mu: Scalar,
    /// 产生项系数（k-ε 的 C₁；k-ω 的 α）
    pub c1: Scalar,
    /// 耗散项系数（k-ε 的 C₂；k-ω 的 β）
    pub c2: Scalar,
    /// k 方程湍流 Prandtl 数
    pub sigma_k: Scalar,
    /// 第二方程湍流 Prandtl 数
    pub sigma_x: Scalar,
    /// von Kármán 常数
    pub kappa: Scalar,
    /// RNG 附加项参数 η₀
    pub eta0: Scalar,
    /// RNG 附加项参数 β
    pub beta_rng: Scalar,
}

impl KxCoeffs {
    /// 变体的标准系数
    pub fn for_variant(v: KxVariant) -> Self {
        match v {
            KxVariant::KEpsilon => Self {
                c_mu: 0.09,
                c1: 1.44,
                c2: 1.92,
                sigma_k: 1.0,
                sigma_x: 1.3,
                kappa: 0.41,
                eta0: 0.0,
                beta_rng: 0.0,
            },
            KxVariant::RngKEpsilon => Self {
                c_mu: 0.0845,
                c1: 1.42,
                c2: 1.68,
                sigma_k: 0.7194,
                sigma_x: 0.7194,
                kappa: 0.41,
                eta0: 4.38,
                beta_rng: 0.012,
            },
            KxVariant::RealizableKEpsilon => Self {
                c_mu: 0.09,
                c1: 1.44,
                c2: 1.9,
                sigma_k: 1.0,
                sigma_x: 1.2,
                kappa: 0.41,
                eta0: 0.0,
                beta_rng: 0.0,
            },
            KxVariant::KOmega => Self {
                c_mu: 0.09, // β*
                c1: 5.0 / 9.0,
                c2: 3.0 / 40.0,
                sigma_k: 2.0,
                sigma_x: 2.0,
                kappa: 0.41,
                eta0: 0.0,
                beta_rng: 0.0,
            },
        }
    }
}

/// 两方程模型状态
pub struct KxModel {
    /// 变体
    pub variant: KxVariant,
    /// 系数
    pub coeffs: KxCoeffs,
    /// 湍动能
    pub k: Field<Scalar>,
    /// ε 或 ω
    pub x: Field<Scalar>,
    /// 涡黏 μ_t
    pub mu_t: Field<Scalar>,
    /// 输运方程欠松弛因子（稳态）
    pub relax: Scalar,
}

impl KxModel {
    /// 以默认初值与零梯度边界构建
    pub fn new(mesh: &Mesh, variant: KxVariant) -> Self {
        let x_name = match variant {
            KxVariant::KOmega => "omega",
            _ => "epsilon",
        };
        let x0 = match variant {
            KxVariant::KOmega => 1.0,
            _ => 1e-4,
        };
        let mut k = Field::<Scalar>::uniform(mesh, "k", Access::ReadWrite, 1e-3);
        let mut x = Field::<Scalar>::uniform(mesh, x_name, Access::ReadWrite, x0);
        add_default_bcs(&mut k, mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));
        add_default_bcs(&mut x, mesh, |n| BCondition::zero_gradient(n), |n| BCondition::zero_gradient(n));

        let mut model = Self {
            variant,
            coeffs: KxCoeffs::for_variant(variant),
            k,
            x,
            mu_t: Field::<Scalar>::uniform(mesh, "mut", Access::Write, 0.0),
            relax: 0.7,
        };
        model.update_eddy_viscosity(mesh, 1.0);
        model
    }

    /// 推进 k 与 ε/ω 输运方程
    pub fn solve(
        &mut self,
        ctx: &Context,
        u: &Field<Vector>,
        flux: &FaceField<Scalar>,
    ) -> SolverResult<()> {
        let mesh = &ctx.mesh;
        let rho = ctx.props.rho;
        let mu_lam = rho * ctx.props.viscosity;
        let steady = ctx.controls.is_steady();
        let co = self.coeffs;

        update_explicit_bcs(&mut self.k, mesh)?;
        update_explicit_bcs(&mut self.x, mesh)?;

        let s2 = strain_rate_sq(mesh, u);
        let wall_cells = wall_adjacent_cells(mesh);

        // ---- k 方程 ----
        let mu_k = effective_diffusivity(mesh, &self.mu_t, mu_lam, co.sigma_k);
        let mut mk = ops::div_matrix(
            ctx.mesh.clone(),
            &self.k,
            flux,
            &mu_k,
            ConvectionScheme::Upwind,
        );
        for c in 0..mesh.n_cells {
            let vol = mesh.cell_volume[c];
            let prod = self.mu_t[c] * s2[c];
            mk.su[c] += prod * vol;
            // 耗散汇的隐式线性化
            let sink = match self.variant {
                KxVariant::KOmega => co.c_mu * rho * self.x[c],
                _ => rho * self.x[c] / self.k[c].max(K_MIN),
            };
            mk.ap[c] += sink * vol;
        }
        if steady {
            mk.relax(self.relax, self.k.internal());
        } else {
            mk += ops::ddt(ctx.mesh.clone(), &self.k, rho, ctx.controls.dt);
        }
        let out_k = solve(&mut self.k, mk, ctx);
        if !out_k.residual.is_finite() {
            log::warn!("k 方程残差非有限");
        }
        clamp_min(&mut self.k, K_MIN);
        update_explicit_bcs(&mut self.k, mesh)?;

        // ---- ε / ω 方程 ----
        let mu_x = effective_diffusivity(mesh, &self.mu_t, mu_lam, co.sigma_x);
        let mut mx = ops::div_matrix(
            ctx.mesh.clone(),
            &self.x,
            flux,
            &mu_x,
            ConvectionScheme::Upwind,
        );
        for c in 0..mesh.n_cells {
            let vol = mesh.cell_volume[c];
            let k_c = self.k[c].max(K_MIN);
            let x_c = self.x[c].max(X_MIN);
            let prod = self.mu_t[c] * s2[c];
            match self.variant {
                KxVariant::KEpsilon => {
                    mx.su[c] += co.c1 * x_c / k_c * prod * vol;
                    mx.ap[c] += co.c2 * rho * x_c / k_c * vol;
                }
                KxVariant::RngKEpsilon => {
                    // C₁ 的应变修正
                    let eta = s2[c].sqrt() * k_c / x_c;
                    let c1_eff = co.c1
                        - eta * (1.0 - eta / co.eta0)
                            / (1.0 + co.beta_rng * eta * eta * eta);
                    mx.su[c] += c1_eff * x_c / k_c * prod * vol;
                    mx.ap[c] += co.c2 * rho * x_c / k_c * vol;
                }
                KxVariant::RealizableKEpsilon => {
                    // 产生项 ∝ S·ε，耗散分母含 √(νε)
                    let s_mag = s2[c].sqrt();
                    let eta = s_mag * k_c / x_c;
                    let c1r = (eta / (eta + 5.0)).max(0.43);
                    mx.su[c] += c1r * rho * s_mag * x_c * vol;
                    let denom = k_c + (ctx.props.viscosity * x_c).sqrt();
                    mx.ap[c] += co.c2 * rho * x_c / denom.max(SMALL) * vol;
                }
                KxVariant::KOmega => {
                    mx.su[c] += co.c1 * x_c / k_c * prod * vol;
                    mx.ap[c] += co.c2 * rho * x_c * vol;
                }
            }
        }

        // 壁面函数：近壁单元的 ε/ω 定值
        for &c in &wall_cells {
            let y = wall_cell_distance(mesh, c);
            let k_c = self.k[c].max(K_MIN);
            let value = match self.variant {
                KxVariant::KOmega => {
                    k_c.sqrt() / (co.c_mu.powf(0.25) * co.kappa * y.max(SMALL))
                }
                _ => co.c_mu.powf(0.75) * k_c.powf(1.5) / (co.kappa * y.max(SMALL)),
            };
            fix_cell(&mut mx, mesh, c, value);
        }

        if steady {
            mx.relax(self.relax, self.x.internal());
        } else {
            mx += ops::ddt(ctx.mesh.clone(), &self.x, rho, ctx.controls.dt);
        }
        let out_x = solve(&mut self.x, mx, ctx);
        if !out_x.residual.is_finite() {
            log::warn!("{} 方程残差非有限", self.x.name);
        }
        clamp_min(&mut self.x, X_MIN);
        update_explicit_bcs(&mut self.x, mesh)?;

        self.update_eddy_viscosity(mesh, rho);
        Ok(())
    }

    /// 由 k 与 x 刷新涡黏
    fn update_eddy_viscosity(&mut self, mesh: &Mesh, rho: Scalar) {
        for c in 0..mesh.n_cells {
            let k_c = self.k[c].max(K_MIN);
            let x_c = self.x[c].max(X_MIN);
            let mu = match self.variant {
                KxVariant::KOmega => rho * k_c / x_c,
                _ => rho * self.coeffs.c_mu * k_c * k_c / x_c,
            };
            self.mu_t[c] = mu.clamp(0.0, MU_T_MAX);
        }
        self.mu_t.fill_boundary(mesh);
    }
}

/// 有效扩散系数面场：(μ_lam + μ_t/σ) 插值
fn effective_diffusivity(
    mesh: &Mesh,
    mu_t: &Field<Scalar>,
    mu_lam: Scalar,
    sigma: Scalar,
) -> FaceField<Scalar> {
    let eff = mu_t.map(|m| mu_lam + m / sigma);
    ops::face_interpolate(mesh, &eff)
}

/// 近壁单元（WALL 面片的 owner）
fn wall_adjacent_cells(mesh: &Mesh) -> Vec<usize> {
    let mut cells = Vec::new();
    for patch in &mesh.patches {
        if patch.is_wall_named() {
            for f in patch.faces() {
                cells.push(mesh.owner(f));
            }
        }
    }
    cells.sort_unstable();
    cells.dedup();
    cells
}

/// 单元到所属壁面的法向距离（取该单元壁面面的最小面心距）
fn wall_cell_distance(mesh: &Mesh, c: usize) -> Scalar {
    let mut best = Scalar::MAX;
    for &f in mesh.cell_faces(c) {
        let f = f as usize;
        if mesh.is_interior(f) {
            continue;
        }
        let d = (mesh.face_centroid[f] - mesh.cell_centroid[c]).length();
        best = best.min(d);
    }
    best
}

/// 矩阵行定值：清除该行耦合后 ap=1, su=value
fn fix_cell(m: &mut MeshMatrix<Scalar>, mesh: &Mesh, c: usize, value: Scalar) {
    for &f in mesh.cell_faces(c) {
        let f = f as usize;
        if !mesh.is_interior(f) {
            continue;
        }
        if mesh.owner(f) == c {
            m.an_owner[f] = 0.0;
        } else {
            m.an_neigh[f] = 0.0;
        }
    }
    m.ap[c] = 1.0;
    m.su[c] = value;
}

fn clamp_min(f: &mut Field<Scalar>, min: Scalar) {
    for v in f.data.iter_mut() {
        if *v < min {
            *v = min;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nf_core::MatrixShape;
    use nf_mesh::BoxMesh;
    use std::sync::Arc;

    #[test]
    fn test_coeffs_standard_ke() {
        let c = KxCoeffs::for_variant(KxVariant::KEpsilon);
        assert_eq!(c.c_mu, 0.09);
        assert_eq!(c.c1, 1.44);
        assert_eq!(c.c2, 1.92);
        assert_eq!(c.sigma_x, 1.3);
    }

    #[test]
    fn test_eddy_viscosity_formula() {
        let mesh = BoxMesh::new(2, 2, 1).build().unwrap();
        let mut m = KxModel::new(&mesh, KxVariant::KEpsilon);
        m.k.set_internal(0.01);
        m.x.set_internal(0.001);
        m.update_eddy_viscosity(&mesh, 1.2);
        // μ_t = ρ·Cμ·k²/ε = 1.2·0.09·1e-4/1e-3
        let expect = 1.2 * 0.09 * 1e-4 / 1e-3;
        assert!((m.mu_t[0] - expect).abs() < 1e-12);
    }

    #[test]
    fn test_komega_eddy_viscosity() {
        let mesh = BoxMesh::new(2, 1, 1).build().unwrap();
        let mut m = KxModel::new(&mesh, KxVariant::KOmega);
        m.k.set_internal(0.04);
        m.x.set_internal(2.0);
        m.update_eddy_viscosity(&mesh, 1.0);
        assert!((m.mu_t[0] - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_fix_cell_row() {
        let mesh = Arc::new(BoxMesh::new(3, 1, 1).build().unwrap());
        let mut m = MeshMatrix::<Scalar>::zero(mesh.clone(), MatrixShape::Asymmetric);
        for f in 0..mesh.n_interior_faces {
            m.an_owner[f] = 1.0;
            m.an_neigh[f] = 1.0;
        }
        m.ap = vec![2.0; 3];
        fix_cell(&mut m, &mesh, 1, 5.0);

        let phi = vec![9.0, 5.0, 9.0];
        let y = m.apply(&phi);
        // 固定行满足 φ = su
        assert!((y[1] - m.su[1]).abs() < 1e-14);
        assert_eq!(m.su[1], 5.0);
    }

    #[test]
    fn test_solve_keeps_positivity_on_still_flow() {
        let mesh = Arc::new(BoxMesh::new(3, 3, 1)
            .with_patch_names(["in", "out", "botWALL", "topWALL", "front", "back"])
            .build()
            .unwrap());
        let ctx = Context::new(mesh.clone());
        let mut model = KxModel::new(&mesh, KxVariant::KEpsilon);

        let mut u = Field::<Vector>::new(&mesh, "U", Access::None);
        add_default_bcs(
            &mut u,
            &mesh,
            |p| BCondition::wall(p, Vector::ZERO),
            |p| BCondition::zero_gradient(p),
        );
        update_explicit_bcs(&mut u, &mesh).unwrap();
        let flux = FaceField::uniform(&mesh, 0.0);

        model.solve(&ctx, &u, &flux).unwrap();
        for c in 0..mesh.n_cells {
            assert!(model.k[c] >= K_MIN);
            assert!(model.x[c] >= X_MIN);
            assert!(model.mu_t[c] >= 0.0);
        }
    }
}

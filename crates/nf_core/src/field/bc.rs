// crates/nf_core/src/field/bc.rs

//! 边界条件与幽灵值求解
//!
//! 每个边界条件绑定一个分区面片，负责由内部值与面片数据重建
//! 幽灵槽。任何改写内部单元的操作之后、任何经边界面读取邻值的
//! 表达式之前，必须调用 [`update_explicit_bcs`]。
//!
//! # 幽灵几何约定
//!
//! 幽灵"单元"位于边界面形心处（见 `nf_mesh::Mesh::delta`），因此
//! Dirichlet 幽灵值即面值本身，定梯度按 φ_c + g·|d| 外推。

use super::{Field, FieldElem, FieldError};
use nf_foundation::Scalar;
use nf_mesh::{Mesh, Patch};

/// 边界条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BcKind {
    /// 定值
    Dirichlet,
    /// 定法向梯度
    Neumann,
    /// Dirichlet 与 Neumann 的线性混合
    Robin,
    /// 对称面（镜像）
    Symmetry,
    /// 周期（与配对面片互换）
    Cyclic,
    /// 壁面：动量为无滑移定值，标量退化为零梯度由驱动配置
    Wall,
}

impl BcKind {
    /// 大小写不敏感解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "DIRICHLET" => Some(Self::Dirichlet),
            "NEUMANN" => Some(Self::Neumann),
            "ROBIN" => Some(Self::Robin),
            "SYMMETRY" => Some(Self::Symmetry),
            "CYCLIC" => Some(Self::Cyclic),
            "WALL" => Some(Self::Wall),
            _ => None,
        }
    }

    /// 类型名（字段文件写出用）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dirichlet => "DIRICHLET",
            Self::Neumann => "NEUMANN",
            Self::Robin => "ROBIN",
            Self::Symmetry => "SYMMETRY",
            Self::Cyclic => "CYCLIC",
            Self::Wall => "WALL",
        }
    }
}

/// 单个面片上的边界条件
#[derive(Debug, Clone)]
pub struct BCondition<T: FieldElem> {
    /// 面片名
    pub patch: String,
    /// 类型
    pub kind: BcKind,
    /// 定值（Dirichlet / Wall / Robin）
    pub value: T,
    /// 法向梯度（Neumann / Robin）
    pub gradient: T,
    /// Robin 混合系数 α ∈ [0,1]（1 = 纯 Dirichlet）
    pub robin_alpha: Scalar,
    /// 缓存的面索引区间（绑定网格时填充）
    pub faces: std::ops::Range<usize>,
}

impl<T: FieldElem> BCondition<T> {
    /// 定值边界
    pub fn dirichlet(patch: impl Into<String>, value: T) -> Self {
        Self {
            patch: patch.into(),
            kind: BcKind::Dirichlet,
            value,
            gradient: T::zero(),
            robin_alpha: 1.0,
            faces: 0..0,
        }
    }

    /// 定梯度边界
    pub fn neumann(patch: impl Into<String>, gradient: T) -> Self {
        Self {
            patch: patch.into(),
            kind: BcKind::Neumann,
            value: T::zero(),
            gradient,
            robin_alpha: 0.0,
            faces: 0..0,
        }
    }

    /// 零梯度边界
    pub fn zero_gradient(patch: impl Into<String>) -> Self {
        Self::neumann(patch, T::zero())
    }

    /// Robin 混合边界
    pub fn robin(patch: impl Into<String>, value: T, gradient: T, alpha: Scalar) -> Self {
        Self {
            patch: patch.into(),
            kind: BcKind::Robin,
            value,
            gradient,
            robin_alpha: alpha.clamp(0.0, 1.0),
            faces: 0..0,
        }
    }

    /// 对称面
    pub fn symmetry(patch: impl Into<String>) -> Self {
        Self {
            patch: patch.into(),
            kind: BcKind::Symmetry,
            value: T::zero(),
            gradient: T::zero(),
            robin_alpha: 0.0,
            faces: 0..0,
        }
    }

    /// 周期边界
    pub fn cyclic(patch: impl Into<String>) -> Self {
        Self {
            patch: patch.into(),
            kind: BcKind::Cyclic,
            value: T::zero(),
            gradient: T::zero(),
            robin_alpha: 0.0,
            faces: 0..0,
        }
    }

    /// 壁面（动量无滑移，value 为壁面速度）
    pub fn wall(patch: impl Into<String>, value: T) -> Self {
        Self {
            patch: patch.into(),
            kind: BcKind::Wall,
            value,
            gradient: T::zero(),
            robin_alpha: 1.0,
            faces: 0..0,
        }
    }

    /// 将面索引区间绑定到网格面片
    pub fn bind(&mut self, patch: &Patch) {
        self.faces = patch.faces();
    }
}

/// 重建场的全部幽灵值
///
/// 场引用的每个边界面片都必须有边界条件描述子，缺失即致命错误。
pub fn update_explicit_bcs<T: FieldElem>(
    field: &mut Field<T>,
    mesh: &Mesh,
) -> Result<(), FieldError> {
    // 绑定缓存 + 覆盖检查
    for patch in &mesh.patches {
        match field.bcs.iter_mut().find(|bc| bc.patch == patch.name) {
            Some(bc) => bc.bind(patch),
            None => {
                return Err(FieldError::BcMissing {
                    field: field.name.clone(),
                    patch: patch.name.clone(),
                })
            }
        }
    }

    let bcs = field.bcs.clone();
    for bc in &bcs {
        apply_one(field, mesh, bc)?;
    }
    Ok(())
}

fn apply_one<T: FieldElem>(
    field: &mut Field<T>,
    mesh: &Mesh,
    bc: &BCondition<T>,
) -> Result<(), FieldError> {
    match bc.kind {
        BcKind::Dirichlet | BcKind::Wall => {
            for f in bc.faces.clone() {
                field.data[mesh.ghost_index(f)] = bc.value;
            }
        }
        BcKind::Neumann => {
            for f in bc.faces.clone() {
                let d = mesh.delta(f).length();
                let inner = field.data[mesh.owner(f)];
                field.data[mesh.ghost_index(f)] = inner + bc.gradient * d;
            }
        }
        BcKind::Robin => {
            let a = bc.robin_alpha;
            for f in bc.faces.clone() {
                let d = mesh.delta(f).length();
                let inner = field.data[mesh.owner(f)];
                let extrap = inner + bc.gradient * d;
                field.data[mesh.ghost_index(f)] = bc.value * a + extrap * (1.0 - a);
            }
        }
        BcKind::Symmetry => {
            for f in bc.faces.clone() {
                let n = mesh.unit_normal(f);
                let inner = field.data[mesh.owner(f)];
                field.data[mesh.ghost_index(f)] = inner.mirror(n);
            }
        }
        BcKind::Cyclic => {
            let patch = mesh
                .patch(&bc.patch)
                .expect("bind 之后面片必然存在");
            let partner_name = patch.cyclic_partner.as_ref().ok_or_else(|| {
                FieldError::CyclicMismatch {
                    patch: bc.patch.clone(),
                    reason: "未指定配对面片".to_string(),
                }
            })?;
            let partner = mesh.patch(partner_name).ok_or_else(|| {
                FieldError::CyclicMismatch {
                    patch: bc.patch.clone(),
                    reason: format!("配对面片 {} 不存在", partner_name),
                }
            })?;
            if partner.count != patch.count {
                return Err(FieldError::CyclicMismatch {
                    patch: bc.patch.clone(),
                    reason: format!(
                        "面数不一致: {} vs {}",
                        patch.count, partner.count
                    ),
                });
            }
            for (local, f) in patch.faces().enumerate() {
                let pf = partner.start + local;
                field.data[mesh.ghost_index(f)] = field.data[mesh.owner(pf)];
            }
        }
    }
    Ok(())
}

/// 为场补齐默认边界条件
///
/// 名称含 WALL 的面片取 `wall_bc`，其余取 `other_bc`；
/// 已有显式描述子的面片不受影响。
pub fn add_default_bcs<T: FieldElem>(
    field: &mut Field<T>,
    mesh: &Mesh,
    wall_bc: impl Fn(&str) -> BCondition<T>,
    other_bc: impl Fn(&str) -> BCondition<T>,
) {
    for patch in &mesh.patches {
        if field.bcs.iter().any(|bc| bc.patch == patch.name) {
            continue;
        }
        let bc = if patch.is_wall_named() {
            wall_bc(&patch.name)
        } else {
            other_bc(&patch.name)
        };
        field.add_bc(bc);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Access;
    use nf_foundation::Vector;
    use nf_mesh::BoxMesh;

    fn mesh_1d(n: usize) -> nf_mesh::Mesh {
        BoxMesh::new(n, 1, 1).with_extent(n as f64, 1.0, 1.0).build().unwrap()
    }

    #[test]
    fn test_missing_bc_is_fatal() {
        let mesh = mesh_1d(2);
        let mut f = Field::<Scalar>::new(&mesh, "T", Access::None);
        f.add_bc(BCondition::dirichlet("xmin", 1.0));
        let err = update_explicit_bcs(&mut f, &mesh).unwrap_err();
        assert!(matches!(err, FieldError::BcMissing { .. }));
    }

    #[test]
    fn test_dirichlet_and_neumann_ghosts() {
        let mesh = mesh_1d(2);
        let mut f = Field::<Scalar>::uniform(&mesh, "T", Access::None, 5.0);
        f.add_bc(BCondition::dirichlet("xmin", 1.0));
        f.add_bc(BCondition::neumann("xmax", 2.0));
        for p in ["ymin", "ymax", "zmin", "zmax"] {
            f.add_bc(BCondition::zero_gradient(p));
        }
        update_explicit_bcs(&mut f, &mesh).unwrap();

        let xmin = mesh.patch("xmin").unwrap().start;
        let xmax = mesh.patch("xmax").unwrap().start;
        assert_eq!(f.data[mesh.ghost_index(xmin)], 1.0);
        // 定梯度: φ_c + g·|d|，|d| = 0.5（单元中心到面心）
        assert!((f.data[mesh.ghost_index(xmax)] - (5.0 + 2.0 * 0.5)).abs() < 1e-12);
        let zmin = mesh.patch("zmin").unwrap().start;
        assert_eq!(f.data[mesh.ghost_index(zmin)], 5.0);
    }

    #[test]
    fn test_symmetry_mirrors_vector() {
        let mesh = mesh_1d(1);
        let mut u = Field::<Vector>::uniform(&mesh, "U", Access::None, Vector::new(1.0, 2.0, 3.0));
        for p in ["xmin", "xmax", "ymin", "ymax", "zmin", "zmax"] {
            u.add_bc(BCondition::symmetry(p));
        }
        update_explicit_bcs(&mut u, &mesh).unwrap();
        // xmin 外法向 (-1,0,0)：x 分量反号
        let f = mesh.patch("xmin").unwrap().start;
        let g = u.data[mesh.ghost_index(f)];
        assert!((g - Vector::new(-1.0, 2.0, 3.0)).length() < 1e-12);
    }

    #[test]
    fn test_cyclic_pairing() {
        let mut mesh = BoxMesh::new(4, 1, 1).with_extent(4.0, 1.0, 1.0).build().unwrap();
        // 手工配对 xmin/xmax
        for p in mesh.patches.iter_mut() {
            if p.name == "xmin" {
                p.cyclic_partner = Some("xmax".to_string());
            }
            if p.name == "xmax" {
                p.cyclic_partner = Some("xmin".to_string());
            }
        }
        let mut f = Field::<Scalar>::new(&mesh, "T", Access::None);
        for (c, v) in f.internal_mut().iter_mut().enumerate() {
            *v = c as Scalar;
        }
        f.add_bc(BCondition::cyclic("xmin"));
        f.add_bc(BCondition::cyclic("xmax"));
        for p in ["ymin", "ymax", "zmin", "zmax"] {
            f.add_bc(BCondition::zero_gradient(p));
        }
        update_explicit_bcs(&mut f, &mesh).unwrap();

        let xmin = mesh.patch("xmin").unwrap().start;
        let xmax = mesh.patch("xmax").unwrap().start;
        // xmin 幽灵取 xmax 侧 owner（单元 3），反之取单元 0
        assert_eq!(f.data[mesh.ghost_index(xmin)], 3.0);
        assert_eq!(f.data[mesh.ghost_index(xmax)], 0.0);
    }

    #[test]
    fn test_default_bcs_wall_naming() {
        let mesh = BoxMesh::new(2, 1, 1)
            .with_patch_names(["in", "out", "sideWALL", "sideWALL2", "zlo", "zhi"])
            .build()
            .unwrap();
        let mut u = Field::<Vector>::new(&mesh, "U", Access::None);
        add_default_bcs(
            &mut u,
            &mesh,
            |p| BCondition::wall(p, Vector::ZERO),
            |p| BCondition::zero_gradient(p),
        );
        assert_eq!(u.bcs.len(), 6);
        let wall = u.bcs.iter().find(|b| b.patch == "sideWALL").unwrap();
        assert_eq!(wall.kind, BcKind::Wall);
        let inlet = u.bcs.iter().find(|b| b.patch == "in").unwrap();
        assert_eq!(inlet.kind, BcKind::Neumann);
    }
}

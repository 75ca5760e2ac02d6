// crates/nf_core/src/field/mod.rs

//! 单元场与面场
//!
//! 场是普通值类型：内部单元数组后接幽灵槽（每个边界面一个），
//! 幽灵值由边界条件求值器导出，绝不作为独立状态。
//! 算子为自由函数，经显式传入的网格句柄读取几何与邻接。
//!
//! # 元素类型
//!
//! [`FieldElem`] 把四种元素（标量、向量、对称张量、张量）统一为
//! 一组逐点运算 + 分量访问 + 对称面镜像，场与矩阵的实现据此泛化。

pub mod bc;

use crate::comm::{Communicator, ReduceOp};
use bc::BCondition;
use nf_foundation::{Scalar, SymTensor, Tensor, Vector};
use nf_mesh::Mesh;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, IndexMut, Mul, Neg, Sub, SubAssign};

/// 场元素的统一能力集
pub trait FieldElem:
    Copy
    + Default
    + Send
    + Sync
    + PartialEq
    + fmt::Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + Mul<Scalar, Output = Self>
    + Div<Scalar, Output = Self>
    + 'static
{
    /// 分量数（标量 1，向量 3，对称张量 6，张量 9）
    const N_COMPONENTS: usize;
    /// 类型名（IO 与 VTK 用）
    const TYPE_NAME: &'static str;

    /// 零元素
    fn zero() -> Self {
        Self::default()
    }

    /// 分量内积（标量为乘积，向量/张量为分量积之和）
    fn dot(self, other: Self) -> Scalar;

    /// 模
    #[inline]
    fn mag(self) -> Scalar {
        self.dot(self).sqrt()
    }

    /// 以单位法向 n 做对称面镜像（R = I − 2nnᵀ）
    fn mirror(self, n: Vector) -> Self;

    /// 第 i 个分量
    fn component(self, i: usize) -> Scalar;

    /// 由分量数组构造
    fn from_components(c: &[Scalar]) -> Self;
}

impl FieldElem for Scalar {
    const N_COMPONENTS: usize = 1;
    const TYPE_NAME: &'static str = "scalar";

    #[inline]
    fn dot(self, other: Self) -> Scalar {
        self * other
    }

    #[inline]
    fn mirror(self, _n: Vector) -> Self {
        self
    }

    #[inline]
    fn component(self, _i: usize) -> Scalar {
        self
    }

    #[inline]
    fn from_components(c: &[Scalar]) -> Self {
        c[0]
    }
}

impl FieldElem for Vector {
    const N_COMPONENTS: usize = 3;
    const TYPE_NAME: &'static str = "vector";

    #[inline]
    fn dot(self, other: Self) -> Scalar {
        glam::DVec3::dot(self, other)
    }

    #[inline]
    fn mirror(self, n: Vector) -> Self {
        self - 2.0 * self.dot(n) * n
    }

    #[inline]
    fn component(self, i: usize) -> Scalar {
        self[i]
    }

    #[inline]
    fn from_components(c: &[Scalar]) -> Self {
        Vector::new(c[0], c[1], c[2])
    }
}

impl FieldElem for SymTensor {
    const N_COMPONENTS: usize = 6;
    const TYPE_NAME: &'static str = "symtensor";

    #[inline]
    fn dot(self, other: Self) -> Scalar {
        self.xx * other.xx
            + self.yy * other.yy
            + self.zz * other.zz
            + 2.0 * (self.xy * other.xy + self.xz * other.xz + self.yz * other.yz)
    }

    fn mirror(self, n: Vector) -> Self {
        // R S R = S − 2n⊗(Sn) − 2(Sn)⊗n + 4(n·Sn)n⊗n，结果仍对称
        let sn = self.dot_vec(n);
        let nsn = n.dot(sn);
        let t = Tensor::outer(n, sn) + Tensor::outer(sn, n);
        let nn = Tensor::outer(n, n);
        (tensor_to_full(self) - t * 2.0 + nn * (4.0 * nsn)).symm()
    }

    #[inline]
    fn component(self, i: usize) -> Scalar {
        [self.xx, self.xy, self.xz, self.yy, self.yz, self.zz][i]
    }

    #[inline]
    fn from_components(c: &[Scalar]) -> Self {
        SymTensor::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }
}

impl FieldElem for Tensor {
    const N_COMPONENTS: usize = 9;
    const TYPE_NAME: &'static str = "tensor";

    #[inline]
    fn dot(self, other: Self) -> Scalar {
        self.row(0).dot(other.row(0)) + self.row(1).dot(other.row(1)) + self.row(2).dot(other.row(2))
    }

    fn mirror(self, n: Vector) -> Self {
        let tn = self.dot_vec(n);
        let ttn = self.transpose().dot_vec(n);
        let ntn = n.dot(tn);
        self - Tensor::outer(n, ttn) * 2.0 - Tensor::outer(tn, n) * 2.0
            + Tensor::outer(n, n) * (4.0 * ntn)
    }

    #[inline]
    fn component(self, i: usize) -> Scalar {
        [
            self.xx, self.xy, self.xz, self.yx, self.yy, self.yz, self.zx, self.zy, self.zz,
        ][i]
    }

    #[inline]
    fn from_components(c: &[Scalar]) -> Self {
        Tensor {
            xx: c[0],
            xy: c[1],
            xz: c[2],
            yx: c[3],
            yy: c[4],
            yz: c[5],
            zx: c[6],
            zy: c[7],
            zz: c[8],
        }
    }
}

#[inline]
fn tensor_to_full(s: SymTensor) -> Tensor {
    Tensor {
        xx: s.xx,
        xy: s.xy,
        xz: s.xz,
        yx: s.xy,
        yy: s.yy,
        yz: s.yz,
        zx: s.xz,
        zy: s.yz,
        zz: s.zz,
    }
}

/// 场访问模式（决定初始读取与检查点写出）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    /// 不读不写（内部中间量）
    #[default]
    None,
    /// 启动时读取
    Read,
    /// 检查点写出
    Write,
    /// 读取并写出
    ReadWrite,
}

impl Access {
    /// 是否参与初始读取
    #[inline]
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read | Self::ReadWrite)
    }

    /// 是否参与检查点写出
    #[inline]
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write | Self::ReadWrite)
    }
}

/// 场模块错误
#[derive(Debug, Clone)]
pub enum FieldError {
    /// 场引用的面片没有边界条件描述子
    BcMissing {
        /// 场名
        field: String,
        /// 面片名
        patch: String,
    },
    /// 周期边界配对失败
    CyclicMismatch {
        /// 面片名
        patch: String,
        /// 说明
        reason: String,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BcMissing { field, patch } => {
                write!(f, "场 {} 的面片 {} 缺少边界条件描述子", field, patch)
            }
            Self::CyclicMismatch { patch, reason } => {
                write!(f, "周期面片 {} 配对失败: {}", patch, reason)
            }
        }
    }
}

impl std::error::Error for FieldError {}

// ============================================================
// 单元场
// ============================================================

/// 单元场：长度 n_cells + n_boundary_faces（内部在前，幽灵在后）
#[derive(Debug, Clone)]
pub struct Field<T: FieldElem> {
    /// 符号名
    pub name: String,
    /// 访问模式
    pub access: Access,
    /// 数据（内部 + 幽灵）
    pub data: Vec<T>,
    /// 内部单元数
    n_cells: usize,
    /// 边界条件（按面片）
    pub bcs: Vec<BCondition<T>>,
}

impl<T: FieldElem> Field<T> {
    /// 创建零值场
    pub fn new(mesh: &Mesh, name: impl Into<String>, access: Access) -> Self {
        Self::uniform(mesh, name, access, T::zero())
    }

    /// 创建均匀值场
    pub fn uniform(mesh: &Mesh, name: impl Into<String>, access: Access, value: T) -> Self {
        Self {
            name: name.into(),
            access,
            data: vec![value; mesh.n_cells_total()],
            n_cells: mesh.n_cells,
            bcs: Vec::new(),
        }
    }

    /// 无名中间场
    pub fn work(mesh: &Mesh) -> Self {
        Self::new(mesh, "", Access::None)
    }

    /// 内部单元数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 内部切片
    #[inline]
    pub fn internal(&self) -> &[T] {
        &self.data[..self.n_cells]
    }

    /// 内部可变切片
    #[inline]
    pub fn internal_mut(&mut self) -> &mut [T] {
        &mut self.data[..self.n_cells]
    }

    /// 设置内部值为常量
    pub fn set_internal(&mut self, value: T) {
        for v in self.internal_mut() {
            *v = value;
        }
    }

    /// 添加边界条件
    pub fn add_bc(&mut self, bc: BCondition<T>) {
        self.bcs.push(bc);
    }

    /// 幽灵值置为 owner 内部值（零阶外推）
    pub fn fill_boundary(&mut self, mesh: &Mesh) {
        for f in mesh.n_interior_faces..mesh.n_faces() {
            self.data[mesh.ghost_index(f)] = self.data[mesh.owner(f)];
        }
    }

    /// 显式欠松弛：self = old + α·(self − old)
    pub fn relax_explicit(&mut self, old: &Self, alpha: Scalar) {
        debug_assert_eq!(self.data.len(), old.data.len());
        for (v, &o) in self.data.iter_mut().zip(old.data.iter()) {
            *v = o + (*v - o) * alpha;
        }
    }

    /// 逐元素最大模（跨进程归约）
    pub fn max_mag(&self, comm: &Communicator) -> Scalar {
        let local = self
            .internal()
            .iter()
            .map(|v| v.mag())
            .fold(0.0_f64, Scalar::max);
        comm.allreduce(local, ReduceOp::Max)
    }

    /// 内部值平方和开方（跨进程归约）
    pub fn norm2(&self, comm: &Communicator) -> Scalar {
        let local: Scalar = self.internal().iter().map(|v| v.dot(*v)).sum();
        comm.allreduce_sum(local).sqrt()
    }

    /// 逐元素二元组合（结果为无名中间场）
    fn zip_with(&self, other: &Self, f: impl Fn(T, T) -> T) -> Self {
        debug_assert_eq!(self.data.len(), other.data.len(), "场长度不匹配");
        Self {
            name: String::new(),
            access: Access::None,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            n_cells: self.n_cells,
            bcs: Vec::new(),
        }
    }

    /// 逐元素映射（结果为无名中间场）
    pub fn map(&self, f: impl Fn(T) -> T) -> Self {
        Self {
            name: String::new(),
            access: Access::None,
            data: self.data.iter().map(|&a| f(a)).collect(),
            n_cells: self.n_cells,
            bcs: Vec::new(),
        }
    }

    /// 以标量场逐元素缩放
    pub fn scale_by(&self, s: &Field<Scalar>) -> Self {
        debug_assert_eq!(self.data.len(), s.data.len(), "场长度不匹配");
        Self {
            name: String::new(),
            access: Access::None,
            data: self
                .data
                .iter()
                .zip(s.data.iter())
                .map(|(&a, &b)| a * b)
                .collect(),
            n_cells: self.n_cells,
            bcs: Vec::new(),
        }
    }
}

impl<T: FieldElem> Index<usize> for Field<T> {
    type Output = T;
    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T: FieldElem> IndexMut<usize> for Field<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T: FieldElem> Add for &Field<T> {
    type Output = Field<T>;
    fn add(self, o: Self) -> Field<T> {
        self.zip_with(o, |a, b| a + b)
    }
}

impl<T: FieldElem> Sub for &Field<T> {
    type Output = Field<T>;
    fn sub(self, o: Self) -> Field<T> {
        self.zip_with(o, |a, b| a - b)
    }
}

impl<T: FieldElem> Mul<Scalar> for &Field<T> {
    type Output = Field<T>;
    fn mul(self, s: Scalar) -> Field<T> {
        self.map(|a| a * s)
    }
}

impl<T: FieldElem> Div<Scalar> for &Field<T> {
    type Output = Field<T>;
    fn div(self, s: Scalar) -> Field<T> {
        self.map(|a| a / s)
    }
}

impl<T: FieldElem> Neg for &Field<T> {
    type Output = Field<T>;
    fn neg(self) -> Field<T> {
        self.map(|a| -a)
    }
}

impl<T: FieldElem> AddAssign<&Field<T>> for Field<T> {
    fn add_assign(&mut self, o: &Field<T>) {
        debug_assert_eq!(self.data.len(), o.data.len());
        for (a, &b) in self.data.iter_mut().zip(o.data.iter()) {
            *a += b;
        }
    }
}

impl<T: FieldElem> SubAssign<&Field<T>> for Field<T> {
    fn sub_assign(&mut self, o: &Field<T>) {
        debug_assert_eq!(self.data.len(), o.data.len());
        for (a, &b) in self.data.iter_mut().zip(o.data.iter()) {
            *a -= b;
        }
    }
}

// ============================================================
// 面场
// ============================================================

/// 面场：每面一个值（内部面在前，与网格面排序一致）
#[derive(Debug, Clone)]
pub struct FaceField<T: FieldElem> {
    /// 数据
    pub data: Vec<T>,
}

impl<T: FieldElem> FaceField<T> {
    /// 零值面场
    pub fn new(mesh: &Mesh) -> Self {
        Self::uniform(mesh, T::zero())
    }

    /// 均匀值面场
    pub fn uniform(mesh: &Mesh, value: T) -> Self {
        Self {
            data: vec![value; mesh.n_faces()],
        }
    }

    /// 面数
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<T: FieldElem> Index<usize> for FaceField<T> {
    type Output = T;
    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T: FieldElem> IndexMut<usize> for FaceField<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T: FieldElem> Mul<Scalar> for &FaceField<T> {
    type Output = FaceField<T>;
    fn mul(self, s: Scalar) -> FaceField<T> {
        FaceField {
            data: self.data.iter().map(|&a| a * s).collect(),
        }
    }
}

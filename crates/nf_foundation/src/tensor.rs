// crates/nf_foundation/src/tensor.rs

//! 向量 / 张量值类型
//!
//! 有限体积场的四种元素类型：标量 (`Scalar`)、向量 (`Vector`)、
//! 对称张量 (`SymTensor`)、张量 (`Tensor`)。向量直接采用 `glam::DVec3`，
//! 两种张量为本地值类型，按分量展开存储以便 SoA 布局。
//!
//! # 约定
//!
//! 张量按行主序解释：`Tensor::row(i)` 为第 i 行。
//! 速度梯度 `∇U` 的分量为 `g[i][j] = ∂U_j/∂x_i`。

use crate::scalar::Scalar;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

/// 三维向量，直接使用 glam 的双精度向量
pub type Vector = glam::DVec3;

// ============================================================
// 对称张量
// ============================================================

/// 对称二阶张量（6 个独立分量）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SymTensor {
    /// xx 分量
    pub xx: Scalar,
    /// xy 分量
    pub xy: Scalar,
    /// xz 分量
    pub xz: Scalar,
    /// yy 分量
    pub yy: Scalar,
    /// yz 分量
    pub yz: Scalar,
    /// zz 分量
    pub zz: Scalar,
}

impl SymTensor {
    /// 零张量
    pub const ZERO: Self = Self {
        xx: 0.0,
        xy: 0.0,
        xz: 0.0,
        yy: 0.0,
        yz: 0.0,
        zz: 0.0,
    };

    /// 单位张量
    pub const IDENTITY: Self = Self {
        xx: 1.0,
        xy: 0.0,
        xz: 0.0,
        yy: 1.0,
        yz: 0.0,
        zz: 1.0,
    };

    /// 由分量构造
    pub fn new(xx: Scalar, xy: Scalar, xz: Scalar, yy: Scalar, yz: Scalar, zz: Scalar) -> Self {
        Self {
            xx,
            xy,
            xz,
            yy,
            yz,
            zz,
        }
    }

    /// 迹 tr(T)
    #[inline]
    pub fn trace(&self) -> Scalar {
        self.xx + self.yy + self.zz
    }

    /// 张量-向量乘积 T·v
    #[inline]
    pub fn dot_vec(&self, v: Vector) -> Vector {
        Vector::new(
            self.xx * v.x + self.xy * v.y + self.xz * v.z,
            self.xy * v.x + self.yy * v.y + self.yz * v.z,
            self.xz * v.x + self.yz * v.y + self.zz * v.z,
        )
    }

    /// 双点积 T:T
    #[inline]
    pub fn double_dot(&self) -> Scalar {
        self.xx * self.xx
            + self.yy * self.yy
            + self.zz * self.zz
            + 2.0 * (self.xy * self.xy + self.xz * self.xz + self.yz * self.yz)
    }

    /// 模 |T| = sqrt(T:T)
    #[inline]
    pub fn mag(&self) -> Scalar {
        self.double_dot().sqrt()
    }
}

impl Add for SymTensor {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Self::new(
            self.xx + o.xx,
            self.xy + o.xy,
            self.xz + o.xz,
            self.yy + o.yy,
            self.yz + o.yz,
            self.zz + o.zz,
        )
    }
}

impl Sub for SymTensor {
    type Output = Self;
    #[inline]
    fn sub(self, o: Self) -> Self {
        Self::new(
            self.xx - o.xx,
            self.xy - o.xy,
            self.xz - o.xz,
            self.yy - o.yy,
            self.yz - o.yz,
            self.zz - o.zz,
        )
    }
}

impl AddAssign for SymTensor {
    #[inline]
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl SubAssign for SymTensor {
    #[inline]
    fn sub_assign(&mut self, o: Self) {
        *self = *self - o;
    }
}

impl Neg for SymTensor {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self * -1.0
    }
}

impl Mul<Scalar> for SymTensor {
    type Output = Self;
    #[inline]
    fn mul(self, s: Scalar) -> Self {
        Self::new(
            self.xx * s,
            self.xy * s,
            self.xz * s,
            self.yy * s,
            self.yz * s,
            self.zz * s,
        )
    }
}

impl Div<Scalar> for SymTensor {
    type Output = Self;
    #[inline]
    fn div(self, s: Scalar) -> Self {
        self * (1.0 / s)
    }
}

// ============================================================
// 一般张量
// ============================================================

/// 一般二阶张量（9 分量，行主序）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tensor {
    /// xx 分量
    pub xx: Scalar,
    /// xy 分量
    pub xy: Scalar,
    /// xz 分量
    pub xz: Scalar,
    /// yx 分量
    pub yx: Scalar,
    /// yy 分量
    pub yy: Scalar,
    /// yz 分量
    pub yz: Scalar,
    /// zx 分量
    pub zx: Scalar,
    /// zy 分量
    pub zy: Scalar,
    /// zz 分量
    pub zz: Scalar,
}

impl Tensor {
    /// 零张量
    pub const ZERO: Self = Self {
        xx: 0.0,
        xy: 0.0,
        xz: 0.0,
        yx: 0.0,
        yy: 0.0,
        yz: 0.0,
        zx: 0.0,
        zy: 0.0,
        zz: 0.0,
    };

    /// 由三个行向量构造
    pub fn from_rows(r0: Vector, r1: Vector, r2: Vector) -> Self {
        Self {
            xx: r0.x,
            xy: r0.y,
            xz: r0.z,
            yx: r1.x,
            yy: r1.y,
            yz: r1.z,
            zx: r2.x,
            zy: r2.y,
            zz: r2.z,
        }
    }

    /// 两向量外积 a ⊗ b
    pub fn outer(a: Vector, b: Vector) -> Self {
        Self::from_rows(a.x * b, a.y * b, a.z * b)
    }

    /// 第 i 行（i ∈ 0..3）
    #[inline]
    pub fn row(&self, i: usize) -> Vector {
        match i {
            0 => Vector::new(self.xx, self.xy, self.xz),
            1 => Vector::new(self.yx, self.yy, self.yz),
            _ => Vector::new(self.zx, self.zy, self.zz),
        }
    }

    /// 转置
    #[inline]
    pub fn transpose(&self) -> Self {
        Self {
            xx: self.xx,
            xy: self.yx,
            xz: self.zx,
            yx: self.xy,
            yy: self.yy,
            yz: self.zy,
            zx: self.xz,
            zy: self.yz,
            zz: self.zz,
        }
    }

    /// 对称部分 0.5·(T + Tᵀ)
    #[inline]
    pub fn symm(&self) -> SymTensor {
        SymTensor::new(
            self.xx,
            0.5 * (self.xy + self.yx),
            0.5 * (self.xz + self.zx),
            self.yy,
            0.5 * (self.yz + self.zy),
            self.zz,
        )
    }

    /// 迹 tr(T)
    #[inline]
    pub fn trace(&self) -> Scalar {
        self.xx + self.yy + self.zz
    }

    /// 张量-向量乘积 T·v
    #[inline]
    pub fn dot_vec(&self, v: Vector) -> Vector {
        Vector::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }

    /// 双点积 T:T
    #[inline]
    pub fn double_dot(&self) -> Scalar {
        self.row(0).length_squared() + self.row(1).length_squared() + self.row(2).length_squared()
    }

    /// 模 |T|
    #[inline]
    pub fn mag(&self) -> Scalar {
        self.double_dot().sqrt()
    }
}

impl Add for Tensor {
    type Output = Self;
    #[inline]
    fn add(self, o: Self) -> Self {
        Self::from_rows(
            self.row(0) + o.row(0),
            self.row(1) + o.row(1),
            self.row(2) + o.row(2),
        )
    }
}

impl Sub for Tensor {
    type Output = Self;
    #[inline]
    fn sub(self, o: Self) -> Self {
        Self::from_rows(
            self.row(0) - o.row(0),
            self.row(1) - o.row(1),
            self.row(2) - o.row(2),
        )
    }
}

impl AddAssign for Tensor {
    #[inline]
    fn add_assign(&mut self, o: Self) {
        *self = *self + o;
    }
}

impl SubAssign for Tensor {
    #[inline]
    fn sub_assign(&mut self, o: Self) {
        *self = *self - o;
    }
}

impl Neg for Tensor {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        self * -1.0
    }
}

impl Mul<Scalar> for Tensor {
    type Output = Self;
    #[inline]
    fn mul(self, s: Scalar) -> Self {
        Self::from_rows(self.row(0) * s, self.row(1) * s, self.row(2) * s)
    }
}

impl Div<Scalar> for Tensor {
    type Output = Self;
    #[inline]
    fn div(self, s: Scalar) -> Self {
        self * (1.0 / s)
    }
}

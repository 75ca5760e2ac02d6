// crates/nf_foundation/src/scalar.rs

//! 标量类型与数值守护常数
//!
//! 全项目统一使用 f64；不提供泛型精度切换。

/// 全局标量类型
pub type Scalar = f64;

/// 小量守护值，用于安全除法与分母钳制
pub const SMALL: Scalar = 1e-15;

/// 更严格的小量，用于几何退化检测
pub const VSMALL: Scalar = 1e-300;

/// 大量守护值，用于初始化最小值扫描等
pub const GREAT: Scalar = 1e30;

/// 近似相等判断
///
/// 使用绝对 + 相对混合容差，适合量级未知的数值比较。
#[inline]
pub fn approx_eq(a: Scalar, b: Scalar, tol: Scalar) -> bool {
    let diff = (a - b).abs();
    diff <= tol || diff <= tol * a.abs().max(b.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approx_eq_absolute() {
        assert!(approx_eq(1.0, 1.0 + 1e-12, 1e-10));
        assert!(!approx_eq(1.0, 1.1, 1e-10));
    }

    #[test]
    fn test_approx_eq_relative() {
        // 大量级下依赖相对容差
        assert!(approx_eq(1e12, 1e12 * (1.0 + 1e-12), 1e-10));
    }
}

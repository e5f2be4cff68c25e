// crates/tc_foundation/src/scalar.rs

//! 标量类型与数值保护常量
//!
//! 湍流闭合中大量出现 `k/ω`、`1/|S|²` 一类的比值，分母在静止流或远场中
//! 可能趋于零。这里集中定义分母下限，保证各模块使用同一套阈值。

/// 项目统一标量类型
pub type Scalar = f64;

/// 小量，用作场变量的默认下限（对应 k、ω 的 floor）
pub const SMALL: Scalar = 1e-15;

/// 极小量，用作除法分母保护
pub const VSMALL: Scalar = 1e-300;

/// `VSMALL` 的平方根，用于平方量的分母保护
pub const ROOT_VSMALL: Scalar = 1e-150;

/// 安全除法：分母绝对值低于 `floor` 时用带符号的 `floor` 替代
#[inline]
pub fn guarded_div(num: Scalar, den: Scalar, floor: Scalar) -> Scalar {
    if den.abs() < floor {
        num / floor.copysign(den)
    } else {
        num / den
    }
}

/// 检查切片是否全部为有限值
#[inline]
pub fn all_finite(values: &[Scalar]) -> bool {
    values.iter().all(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guarded_div_normal() {
        assert!((guarded_div(1.0, 4.0, 1e-12) - 0.25).abs() < 1e-15);
    }

    #[test]
    fn test_guarded_div_keeps_sign() {
        let pos = guarded_div(1.0, 0.0, 1e-6);
        let neg = guarded_div(1.0, -1e-20, 1e-6);
        assert!((pos - 1e6).abs() < 1e-3);
        assert!((neg + 1e6).abs() < 1e-3);
    }

    #[test]
    fn test_all_finite() {
        assert!(all_finite(&[0.0, 1.0, -2.0]));
        assert!(!all_finite(&[0.0, f64::NAN]));
        assert!(!all_finite(&[f64::INFINITY]));
    }
}

// crates/vg_foundation/src/float.rs

//! 数值常量与安全浮点工具
//!
//! 提供碳库计算中使用的容差常量、安全除法以及 Kahan 求和。
//!
//! # 示例
//!
//! ```
//! use vg_foundation::float::KahanSum;
//!
//! let total = KahanSum::sum_iter([0.25, 0.25, 0.5]);
//! assert_eq!(total, 1.0);
//! ```

// ============================================================================
// 数值常量
// ============================================================================

/// 安全除法的最小分母阈值
const SAFE_DIV_EPSILON: f64 = 1e-14;

/// 质量守恒检验的默认相对容差
pub const MASS_BALANCE_TOL: f64 = 1e-6;

/// 碳库可忽略的质量阈值 [kgC]
pub const NEGLIGIBLE_CMASS: f64 = 1e-12;

// ============================================================================
// 辅助函数
// ============================================================================

/// 安全除法（分母过小或结果非有限时返回 `fallback`）
#[inline]
pub fn safe_div(a: f64, b: f64, fallback: f64) -> f64 {
    if b.abs() < SAFE_DIV_EPSILON {
        fallback
    } else {
        let result = a / b;
        if result.is_finite() {
            result
        } else {
            fallback
        }
    }
}

// ============================================================================
// Kahan 求和算法
// ============================================================================

/// Kahan 求和器
///
/// 通过补偿项跟踪累加过程中丢失的低位精度，用于碳收支核算。
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanSum {
    /// 累加和
    sum: f64,
    /// 补偿项（低位精度损失）
    compensation: f64,
}

impl KahanSum {
    /// 创建新的 Kahan 求和器
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一个值
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// 获取当前求和值
    #[inline]
    pub fn value(&self) -> f64 {
        self.sum
    }

    /// 从迭代器求和
    pub fn sum_iter<I: IntoIterator<Item = f64>>(iter: I) -> f64 {
        iter.into_iter().sum::<KahanSum>().value()
    }
}

impl std::iter::Sum<f64> for KahanSum {
    fn sum<I: Iterator<Item = f64>>(iter: I) -> Self {
        let mut kahan = KahanSum::new();
        for v in iter {
            kahan.add(v);
        }
        kahan
    }
}

// ============================================================================
// 测试
// ============================================================================

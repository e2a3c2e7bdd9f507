// crates/vg_foundation/src/validation.rs

//! 运行时验证工具
//!
//! 提供验证报告和错误/警告类型。与 `VgError` 的"遇错即返回"不同，
//! 验证报告会收集全部问题，供命令行 `validate` 子命令一次性输出。
//!
//! # 示例
//!
//! ```
//! use vg_foundation::validation::{check_range, ValidationReport};
//!
//! let mut report = ValidationReport::new();
//! check_range(&mut report, "cmass_leaf", 0, -1.0, 0.0, f64::MAX);
//! assert!(report.has_errors());
//! ```

use std::fmt;

/// 验证报告
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// 错误列表
    pub errors: Vec<ValidationError>,
    /// 警告列表
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// 创建空的验证报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加错误
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 是否有警告
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// 错误数量
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 警告数量
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// 是否通过（无错误）
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// 严格模式下是否通过（无错误且无警告）
    pub fn is_valid_strict(&self) -> bool {
        !self.has_errors() && !self.has_warnings()
    }

    /// 合并另一个报告
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "验证报告:")?;
        writeln!(f, "  错误: {} 个", self.error_count())?;
        writeln!(f, "  警告: {} 个", self.warning_count())?;

        if self.has_errors() {
            writeln!(f, "\n错误详情:")?;
            for (i, err) in self.errors.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, err)?;
            }
        }

        if self.has_warnings() {
            writeln!(f, "\n警告详情:")?;
            for (i, warn) in self.warnings.iter().enumerate() {
                writeln!(f, "  {}. {}", i + 1, warn)?;
            }
        }

        Ok(())
    }
}

/// 验证错误类型
///
/// `item` 为批量输入中的条目序号，单条输入时为 0。
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// 非有限值
    NonFinite {
        /// 字段名称
        field: &'static str,
        /// 条目序号
        item: usize,
        /// 非有限的数值
        value: f64,
    },
    /// 数据超出范围
    OutOfRange {
        /// 字段名称
        field: &'static str,
        /// 条目序号
        item: usize,
        /// 实际值
        value: f64,
        /// 下界
        min: f64,
        /// 上界
        max: f64,
    },
    /// 一致性错误（字段之间的约束）
    ConsistencyError {
        /// 错误描述
        message: String,
        /// 条目序号
        item: usize,
    },
    /// 自定义错误
    Custom {
        /// 自定义消息
        message: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { field, item, value } => {
                write!(f, "条目{}: 字段{}={} (非有限值)", item, field, value)
            }
            Self::OutOfRange {
                field,
                item,
                value,
                min,
                max,
            } => {
                write!(
                    f,
                    "条目{}: 字段{}={} 超出范围[{}, {}]",
                    item, field, value, min, max
                )
            }
            Self::ConsistencyError { message, item } => {
                write!(f, "条目{}: 一致性错误: {}", item, message)
            }
            Self::Custom { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// 验证警告类型
#[derive(Debug, Clone)]
pub enum ValidationWarning {
    /// 高数值
    HighValue {
        /// 字段名称
        field: &'static str,
        /// 条目序号
        item: usize,
        /// 实际值
        value: f64,
        /// 阈值
        threshold: f64,
    },
    /// 自定义警告
    Custom {
        /// 自定义消息
        message: String,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HighValue {
                field,
                item,
                value,
                threshold,
            } => {
                write!(f, "条目{}: 字段{}={} 超过阈值{}", item, field, value, threshold)
            }
            Self::Custom { message } => write!(f, "{}", message),
        }
    }
}

// ============================================================================
// 验证辅助函数
// ============================================================================

/// 检查值是否有限
pub fn check_finite(
    report: &mut ValidationReport,
    field: &'static str,
    item: usize,
    value: f64,
) -> bool {
    if !value.is_finite() {
        report.add_error(ValidationError::NonFinite { field, item, value });
        false
    } else {
        true
    }
}

/// 检查值是否有限且在闭区间内
pub fn check_range(
    report: &mut ValidationReport,
    field: &'static str,
    item: usize,
    value: f64,
    min: f64,
    max: f64,
) -> bool {
    if !check_finite(report, field, item, value) {
        return false;
    }
    if value < min || value > max {
        report.add_error(ValidationError::OutOfRange {
            field,
            item,
            value,
            min,
            max,
        });
        false
    } else {
        true
    }
}

/// 检查值是否有限且严格为正
pub fn check_positive(
    report: &mut ValidationReport,
    field: &'static str,
    item: usize,
    value: f64,
) -> bool {
    if !check_finite(report, field, item, value) {
        return false;
    }
    if value <= 0.0 {
        report.add_error(ValidationError::OutOfRange {
            field,
            item,
            value,
            min: f64::MIN_POSITIVE,
            max: f64::MAX,
        });
        false
    } else {
        true
    }
}

/// 检查值是否超过阈值并添加警告
pub fn warn_if_high(
    report: &mut ValidationReport,
    field: &'static str,
    item: usize,
    value: f64,
    threshold: f64,
) -> bool {
    if value > threshold {
        report.add_warning(ValidationWarning::HighValue {
            field,
            item,
            value,
            threshold,
        });
        true
    } else {
        false
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_report_new() {
        let report = ValidationReport::new();
        assert!(report.is_valid());
        assert!(report.is_valid_strict());
        assert_eq!(report.error_count(), 0);
    }

    #[test]
    fn test_check_range_collects_errors() {
        let mut report = ValidationReport::new();
        assert!(check_range(&mut report, "cmass_leaf", 0, 1.0, 0.0, 10.0));
        assert!(!check_range(&mut report, "cmass_root", 1, -1.0, 0.0, 10.0));
        assert!(!check_range(&mut report, "cmass_sap", 2, f64::NAN, 0.0, 10.0));
        assert_eq!(report.error_count(), 2);
        assert!(matches!(report.errors[1], ValidationError::NonFinite { item: 2, .. }));
    }

    #[test]
    fn test_check_positive() {
        let mut report = ValidationReport::new();
        assert!(check_positive(&mut report, "sla", 0, 20.0));
        assert!(!check_positive(&mut report, "sla", 0, 0.0));
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_warnings_and_strict() {
        let mut report = ValidationReport::new();
        assert!(warn_if_high(&mut report, "height", 0, 150.0, 100.0));
        assert!(report.is_valid());
        assert!(!report.is_valid_strict());
    }

    #[test]
    fn test_merge() {
        let mut a = ValidationReport::new();
        a.add_error(ValidationError::Custom { message: "a".into() });
        let mut b = ValidationReport::new();
        b.add_warning(ValidationWarning::Custom { message: "b".into() });
        a.merge(b);
        assert_eq!(a.error_count(), 1);
        assert_eq!(a.warning_count(), 1);
    }

    #[test]
    fn test_report_display() {
        let mut report = ValidationReport::new();
        report.add_error(ValidationError::ConsistencyError {
            message: "cmass_debt > cmass_sap + cmass_heart".into(),
            item: 3,
        });
        let text = report.to_string();
        assert!(text.contains("错误: 1 个"));
        assert!(text.contains("条目3"));
    }
}

// crates/vg_growth/src/error.rs

//! 分配核心错误类型

use vg_foundation::validation::ValidationError;

use crate::numerics::SolverStatus;
use crate::types::AllocationResult;

/// 分配错误
#[derive(Debug, Clone, thiserror::Error)]
pub enum AllocationError {
    /// 输入违反前置条件
    #[error("参数 {field} 无效: {value} ({reason})")]
    InvalidParameter {
        /// 参数名称
        field: &'static str,
        /// 实际值
        value: f64,
        /// 原因
        reason: String,
    },

    /// 求根器未能在限制内找到满足异速约束的解
    #[error("分配求解未收敛: {status:?}, 迭代 {iterations} 次, 残差 {residual:.3e}")]
    ConvergenceFailure {
        /// 求解器最终状态
        status: SolverStatus,
        /// 已用迭代次数
        iterations: usize,
        /// 最终残差 [m]
        residual: f64,
        /// 尽力而为的守恒结果（未分配部分计入 `exceeds_cmass`）
        fallback: AllocationResult,
    },
}

impl AllocationError {
    /// 构造无效参数错误
    pub fn invalid(field: &'static str, value: f64, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            value,
            reason: reason.into(),
        }
    }

    /// 由验证错误转换
    pub fn from_validation(err: ValidationError) -> Self {
        match err {
            ValidationError::NonFinite { field, value, .. } => {
                Self::invalid(field, value, "非有限值")
            }
            ValidationError::OutOfRange {
                field,
                value,
                min,
                max,
                ..
            } => Self::invalid(field, value, format!("超出范围 [{}, {}]", min, max)),
            ValidationError::ConsistencyError { message, .. } => {
                Self::invalid("input", f64::NAN, message)
            }
            ValidationError::Custom { message } => Self::invalid("input", f64::NAN, message),
        }
    }

    /// 未收敛时的回退结果
    pub fn fallback(&self) -> Option<&AllocationResult> {
        match self {
            Self::ConvergenceFailure { fallback, .. } => Some(fallback),
            Self::InvalidParameter { .. } => None,
        }
    }

    /// 是否为未收敛错误
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, Self::ConvergenceFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_out_of_range() {
        let err = AllocationError::from_validation(ValidationError::OutOfRange {
            field: "sla",
            item: 0,
            value: -1.0,
            min: 0.0,
            max: 10.0,
        });
        assert!(matches!(
            err,
            AllocationError::InvalidParameter { field: "sla", value, .. } if value == -1.0
        ));
        assert!(err.to_string().contains("sla"));
        assert!(err.fallback().is_none());
    }

    #[test]
    fn test_convergence_failure_carries_fallback() {
        let fallback = AllocationResult {
            exceeds_cmass: 1.0,
            ..Default::default()
        };
        let err = AllocationError::ConvergenceFailure {
            status: SolverStatus::NoSignChange,
            iterations: 0,
            residual: f64::NAN,
            fallback,
        };
        assert!(err.is_convergence_failure());
        assert_eq!(err.fallback().map(|r| r.exceeds_cmass), Some(1.0));
    }
}

// crates/vg_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `VgError` 枚举和 `VgResult` 类型别名。
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层只定义通用错误，分配计算相关错误在 `vg_growth` 中定义
//! 2. **易用性**: 提供便捷的构造方法和 `ensure!` / `require!` 宏
//! 3. **可追溯**: 支持错误链
//!
//! # 示例
//!
//! ```
//! use vg_foundation::error::{VgError, VgResult};
//!
//! fn load_table() -> VgResult<()> {
//!     Err(VgError::invalid_input("PFT 表为空"))
//! }
//! assert!(load_table().is_err());
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// 统一结果类型
pub type VgResult<T> = Result<T, VgError>;

/// VegGrowth 错误类型
#[derive(Error, Debug)]
pub enum VgError {
    /// IO 错误
    #[error("IO错误: {message}")]
    Io {
        /// 描述性错误信息
        message: String,
        #[source]
        /// 可选的底层 IO 错误
        source: Option<std::io::Error>,
    },

    /// 文件不存在
    #[error("文件不存在: {path}")]
    FileNotFound {
        /// 未找到的路径
        path: PathBuf,
    },

    /// 文件解析错误
    #[error("文件解析错误: {file} 第{line}行: {message}")]
    ParseError {
        /// 文件路径
        file: PathBuf,
        /// 行号
        line: usize,
        /// 错误信息
        message: String,
    },

    /// 无效输入
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明无效原因
        message: String,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },

    /// 非有限值（NaN 或 Inf）
    #[error("非有限值: {field}={value}")]
    NonFinite {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 序列化失败原因
        message: String,
    },

    /// 验证失败
    #[error("验证失败: {0}")]
    Validation(String),

    /// 资源未找到
    #[error("资源未找到: {resource}")]
    NotFound {
        /// 资源名称
        resource: String,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl VgError {
    /// 从描述创建 IO 错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 从描述创建 IO 错误（带源）
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 文件不存在
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// 解析错误
    pub fn parse(file: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            file: file.into(),
            line,
            message: message.into(),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 非有限值
    pub fn non_finite(field: &'static str, value: f64) -> Self {
        Self::NonFinite { field, value }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 验证失败
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// 资源未找到
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl VgError {
    #[inline]
    fn check_finite(field: &'static str, value: f64) -> VgResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(Self::non_finite(field, value))
        }
    }

    /// 检查值是否在闭区间内
    #[inline]
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> VgResult<()> {
        Self::check_finite(field, value)?;
        if value < min || value > max {
            Err(Self::out_of_range(field, value, min, max))
        } else {
            Ok(())
        }
    }

    /// 检查值是否严格为正
    #[inline]
    pub fn check_positive(field: &'static str, value: f64) -> VgResult<()> {
        Self::check_finite(field, value)?;
        if value > 0.0 {
            Ok(())
        } else {
            Err(Self::out_of_range(field, value, f64::MIN_POSITIVE, f64::MAX))
        }
    }
}

// ========================================================================
// 标准库错误转换
// ========================================================================

impl From<std::io::Error> for VgError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 宏
// ========================================================================

/// 条件不满足时提前返回错误
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err($err.into());
        }
    };
}

/// 解包 `Option`，为 `None` 时提前返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr $(,)?) => {
        match $opt {
            Some(v) => v,
            None => return Err($err.into()),
        }
    };
}

// ========================================================================
// 测试
// ========================================================================

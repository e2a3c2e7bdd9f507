// crates/vg_foundation/src/lib.rs

//! VegGrowth Foundation Layer
//!
//! 基础层，提供整个项目共享的错误类型、浮点工具和验证报告。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `VgError` / `VgResult`
//! - [`float`]: 数值常量、安全浮点运算与 Kahan 求和
//! - [`validation`]: 输入验证报告
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 thiserror
//! 2. **无领域概念**: 不包含任何植被或碳库相关类型
//!
//! # 示例
//!
//! ```
//! use vg_foundation::{ensure, error::{VgError, VgResult}};
//!
//! fn check_mass(mass: f64) -> VgResult<f64> {
//!     ensure!(mass >= 0.0, VgError::out_of_range("mass", mass, 0.0, f64::MAX));
//!     Ok(mass)
//! }
//!
//! assert!(check_mass(1.0).is_ok());
//! assert!(check_mass(-1.0).is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod float;
pub mod validation;

pub use error::{VgError, VgResult};
pub use float::KahanSum;
pub use validation::{ValidationError, ValidationReport, ValidationWarning};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{VgError, VgResult};
    pub use crate::float::{safe_div, KahanSum};
    pub use crate::validation::{ValidationError, ValidationReport, ValidationWarning};
    pub use crate::{ensure, require};
}

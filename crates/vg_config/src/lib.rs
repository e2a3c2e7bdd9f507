// crates/vg_config/src/lib.rs

//! VegGrowth Config Layer (Layer 2)
//!
//! 配置层，提供分配核心的数值求解设置和批处理设置。
//! 本层不包含任何植被领域类型，所有数值使用 f64 / usize 以便 JSON 序列化。
//!
//! # 模块概览
//!
//! - [`alloc_config`]: `AllocationConfig` 及其子配置
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: vg_cli        ─> 读取配置文件，构建 AllocationKernel
//! Layer 4: vg_ffi        ─> 使用默认配置
//! Layer 3: vg_growth     ─> 消费 AllocationConfig
//! Layer 2: vg_config     ─> AllocationConfig (本层)
//! Layer 1: vg_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alloc_config;
pub mod error;

/// 层级标识
pub const LAYER: u8 = 2;

pub use alloc_config::{AllocationConfig, BatchSettings, RootMethod, SolverSettings};
pub use error::ConfigError;

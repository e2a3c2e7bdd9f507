// crates/vg_growth/src/lib.rs

//! VegGrowth 生物量分配层 (Layer 3)
//!
//! 给定个体当前碳库与异速/生理参数，计算本步碳增量在叶、细根、边材、
//! 心材之间的分配，以及周转与脱落产生的凋落物。
//!
//! # 模块概览
//!
//! - [`types`]: 碳库、参数与结果记录
//! - [`allocation`]: 分配核心 [`AllocationKernel`]
//! - [`allometry`]: 株高、胸径、管道模型与冠幅
//! - [`turnover`]: 组织周转
//! - [`numerics`]: 一维区间求根
//! - [`pft`]: 植物功能型参数表
//! - [`batch`]: rayon 批量分配
//! - [`error`]: 分配错误
//!
//! # 示例
//!
//! ```
//! use vg_growth::{allocate, AllocationParams, Lifeform, PlantPools, TurnoverRates};
//!
//! let pools = PlantPools {
//!     cmass_leaf: 2.0,
//!     cmass_root: 1.0,
//!     cmass_sap: 5.0,
//!     cmass_debt: 0.0,
//!     cmass_heart: 10.0,
//! };
//! let params = AllocationParams {
//!     bminc: 1.0,
//!     ltor: 1.0,
//!     height: 3.0,
//!     sla: 20.0,
//!     wooddens: 300.0,
//!     lifeform: Lifeform::Tree,
//!     k_latosa: 6000.0,
//!     k_allom2: 40.0,
//!     k_allom3: 0.67,
//!     turnover: TurnoverRates::default(),
//! };
//!
//! let result = allocate(&pools, &params).unwrap();
//! assert!((result.total() - 1.0).abs() < 1e-9);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod allocation;
pub mod allometry;
pub mod batch;
pub mod error;
pub mod numerics;
pub mod pft;
pub mod turnover;
pub mod types;

/// 层级标识
pub const LAYER: u8 = 3;

pub use allocation::{allocate, AllocationBranch, AllocationDiagnostics, AllocationKernel};
pub use allometry::{allometric_height, pipe_model_height, stem_diameter, Allometry};
pub use batch::{allocate_batch, BatchItem, BatchSummary};
pub use error::AllocationError;
pub use pft::{PftParameters, PftTable};
pub use types::{
    AllocationInput, AllocationParams, AllocationResult, Lifeform, PlantPools, TurnoverRates,
};

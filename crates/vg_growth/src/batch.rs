// crates/vg_growth/src/batch.rs

//! 批量分配
//!
//! 各个体相互独立；条目数达到 `batch.parallel_threshold` 时用 rayon 并行，
//! 结果顺序与输入一致。

use rayon::prelude::*;
use serde::Serialize;
use vg_foundation::float::KahanSum;

use crate::allocation::AllocationKernel;
use crate::error::AllocationError;
use crate::types::{AllocationInput, AllocationResult};

/// 单条分配结果
pub type BatchItem = Result<AllocationResult, AllocationError>;

/// 批量计算分配
pub fn allocate_batch(kernel: &AllocationKernel, inputs: &[AllocationInput]) -> Vec<BatchItem> {
    let parallel = inputs.len() >= kernel.config().batch.parallel_threshold;
    log::debug!("批量分配 {} 条, 并行: {}", inputs.len(), parallel);

    let run = |input: &AllocationInput| kernel.allocate(&input.pools, &input.params);
    if parallel {
        inputs.par_iter().map(run).collect()
    } else {
        inputs.iter().map(run).collect()
    }
}

/// 批量结果统计
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    /// 总条目数
    pub total: usize,
    /// 成功条目数
    pub succeeded: usize,
    /// 未收敛条目数
    pub convergence_failures: usize,
    /// 输入无效条目数
    pub invalid: usize,
    /// 守恒误差超过容差的条目数
    pub imbalanced: usize,
    /// 输入增量合计 [kgC]
    pub total_bminc: f64,
    /// 未分配碳合计（含未收敛条目的回退结果）[kgC]
    pub total_exceeds: f64,
}

impl BatchSummary {
    /// 汇总批量结果
    pub fn from_results(inputs: &[AllocationInput], results: &[BatchItem], tol: f64) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };
        let mut bminc = KahanSum::new();
        let mut exceeds = KahanSum::new();

        for (input, result) in inputs.iter().zip(results) {
            bminc.add(input.params.bminc);
            match result {
                Ok(r) => {
                    summary.succeeded += 1;
                    exceeds.add(r.exceeds_cmass);
                    if r.mass_balance_error(input.params.bminc) > tol {
                        summary.imbalanced += 1;
                    }
                }
                Err(err @ AllocationError::ConvergenceFailure { .. }) => {
                    summary.convergence_failures += 1;
                    if let Some(fallback) = err.fallback() {
                        exceeds.add(fallback.exceeds_cmass);
                    }
                }
                Err(AllocationError::InvalidParameter { .. }) => summary.invalid += 1,
            }
        }

        summary.total_bminc = bminc.value();
        summary.total_exceeds = exceeds.value();
        summary
    }

    /// 是否全部成功
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

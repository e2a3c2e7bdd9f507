// apps/vg_cli/src/commands/batch.rs

//! 批量分配命令
//!
//! 读取 `AllocationInput` 的 JSON 数组，按输入顺序输出结果数组。

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};
use vg_growth::{allocate_batch, AllocationError, AllocationInput, AllocationKernel, AllocationResult, BatchSummary};

use super::{load_config, read_json, write_json};

/// 批量分配参数
#[derive(Args)]
pub struct BatchArgs {
    /// 输入 JSON 文件（AllocationInput 数组）
    #[arg(short, long)]
    pub input: PathBuf,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出文件（缺省打印到 stdout）
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// 单条输出
#[derive(Serialize)]
struct BatchEntry {
    index: usize,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<AllocationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchEntry {
    fn new(index: usize, outcome: &Result<AllocationResult, AllocationError>) -> Self {
        match outcome {
            Ok(result) => Self {
                index,
                status: "ok",
                result: Some(*result),
                error: None,
            },
            Err(err) => Self {
                index,
                status: if err.is_convergence_failure() {
                    "convergence_failure"
                } else {
                    "invalid"
                },
                result: err.fallback().copied(),
                error: Some(err.to_string()),
            },
        }
    }
}

/// 执行批量命令
pub fn execute(args: BatchArgs) -> Result<()> {
    info!("=== VegGrowth 批量分配 ===");

    let config = load_config(args.config.as_deref())?;
    let tol = config.mass_balance_tol;
    let kernel = AllocationKernel::new(config);

    let inputs: Vec<AllocationInput> = read_json(&args.input)?;
    info!("读取 {} 条输入: {}", inputs.len(), args.input.display());

    let start = Instant::now();
    let results = allocate_batch(&kernel, &inputs);
    let elapsed = start.elapsed();

    let summary = BatchSummary::from_results(&inputs, &results, tol);
    info!(
        "完成 {} 条 ({:.3} ms): 成功 {}, 未收敛 {}, 无效 {}",
        summary.total,
        elapsed.as_secs_f64() * 1000.0,
        summary.succeeded,
        summary.convergence_failures,
        summary.invalid
    );
    info!(
        "碳增量合计 {:.6} kgC, 未分配合计 {:.6} kgC",
        summary.total_bminc, summary.total_exceeds
    );
    if summary.imbalanced > 0 {
        warn!("{} 条结果守恒误差超过 {:.1e}", summary.imbalanced, tol);
    }

    for (i, outcome) in results.iter().enumerate() {
        if let Err(err) = outcome {
            warn!("条目 {}: {}", i, err);
        }
    }

    let entries: Vec<BatchEntry> = results
        .iter()
        .enumerate()
        .map(|(i, outcome)| BatchEntry::new(i, outcome))
        .collect();

    write_json(
        &json!({ "summary": summary, "results": entries }),
        args.output.as_deref(),
    )
}

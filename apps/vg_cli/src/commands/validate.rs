// apps/vg_cli/src/commands/validate.rs

//! 验证命令
//!
//! 验证配置文件、分配输入文件与 PFT 参数文件，报告全部问题。

use anyhow::{bail, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use vg_config::AllocationConfig;
use vg_foundation::validation::{ValidationError, ValidationReport};
use vg_growth::{AllocationInput, PftTable};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 分配输入文件（单条或数组）
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// PFT 参数文件
    #[arg(long)]
    pub pft_file: Option<PathBuf>,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== VegGrowth 验证 ===");

    if args.config.is_none() && args.input.is_none() && args.pft_file.is_none() {
        println!("用法: vg_cli validate [--config <配置文件>] [--input <输入文件>] [--pft-file <PFT 文件>]");
        return Ok(());
    }

    let mut report = ValidationReport::new();

    if let Some(path) = &args.config {
        validate_config(path, &mut report);
    }

    if let Some(path) = &args.input {
        validate_inputs(path, &mut report);
    }

    if let Some(path) = &args.pft_file {
        validate_pft_file(path, &mut report);
    }

    print_validation_result(&report, args.strict)
}

fn custom(message: String) -> ValidationError {
    ValidationError::Custom { message }
}

fn validate_config(path: &Path, report: &mut ValidationReport) {
    println!("\n检查配置文件: {}", path.display());

    match AllocationConfig::from_file(path) {
        Ok(_) => println!("  ✓ 配置有效"),
        Err(e) => report.add_error(custom(format!("{}: {}", path.display(), e))),
    }
}

fn validate_inputs(path: &Path, report: &mut ValidationReport) {
    println!("\n检查输入文件: {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            report.add_error(custom(format!("无法读取 {}: {}", path.display(), e)));
            return;
        }
    };

    // 同时接受单条输入与数组
    let inputs: Vec<AllocationInput> = match serde_json::from_str::<Vec<AllocationInput>>(&content) {
        Ok(list) => list,
        Err(_) => match serde_json::from_str::<AllocationInput>(&content) {
            Ok(single) => vec![single],
            Err(e) => {
                report.add_error(custom(format!("JSON 解析错误: {}", e)));
                return;
            }
        },
    };

    let mut local = ValidationReport::new();
    for (i, input) in inputs.iter().enumerate() {
        input.validate(&mut local, i);
    }
    if local.is_valid() {
        println!("  ✓ {} 条输入有效", inputs.len());
    }
    report.merge(local);
}

fn validate_pft_file(path: &Path, report: &mut ValidationReport) {
    println!("\n检查 PFT 文件: {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            report.add_error(custom(format!("无法读取 {}: {}", path.display(), e)));
            return;
        }
    };

    match serde_json::from_str::<PftTable>(&content) {
        Ok(table) => {
            let mut local = ValidationReport::new();
            table.validate_into(&mut local);
            if local.is_valid() {
                println!("  ✓ {} 个 PFT: {}", table.pfts.len(), table.names().join(", "));
            }
            report.merge(local);
        }
        Err(e) => report.add_error(custom(format!("JSON 解析错误: {}", e))),
    }
}

fn print_validation_result(report: &ValidationReport, strict: bool) -> Result<()> {
    println!("\n=== 验证结果 ===");

    for err in &report.errors {
        error!("{}", err);
        println!("  ✗ {}", err);
    }
    for w in &report.warnings {
        warn!("{}", w);
        println!("  ⚠ {}", w);
    }

    println!(
        "\n错误: {}, 警告: {}",
        report.error_count(),
        report.warning_count()
    );

    let ok = if strict {
        report.is_valid_strict()
    } else {
        report.is_valid()
    };

    if !ok {
        bail!("验证失败");
    }

    println!("✓ 验证通过");
    Ok(())
}

// apps/vg_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示默认配置与 PFT 参数表。

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use tracing::info;
use vg_config::AllocationConfig;

use super::load_pft_table;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 显示默认配置
    #[arg(long)]
    pub defaults: bool,

    /// 显示 PFT 参数表
    #[arg(long)]
    pub pfts: bool,

    /// PFT 参数文件（缺省为内置表）
    #[arg(long)]
    pub pft_file: Option<PathBuf>,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== VegGrowth 信息 ===");

    let show_all = !args.defaults && !args.pfts;

    if args.defaults || show_all {
        print_default_config()?;
    }

    if args.pfts || show_all {
        if show_all {
            println!();
        }
        print_pft_table(&args)?;
    }

    Ok(())
}

fn print_default_config() -> Result<()> {
    println!("=== 默认配置 ===");
    println!("VegGrowth CLI 版本: {}", env!("CARGO_PKG_VERSION"));

    let config = AllocationConfig::default();
    println!("求根方法: {:?}", config.solver.method);
    println!("扫描分段: {}", config.solver.segments);
    println!("最大迭代: {}", config.solver.max_iterations);
    println!("xacc / yacc: {:e} / {:e}", config.solver.xacc, config.solver.yacc);
    println!("守恒容差: {:e}", config.mass_balance_tol);
    println!("并行阈值: {}", config.batch.parallel_threshold);

    println!("\nJSON:");
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn print_pft_table(args: &InfoArgs) -> Result<()> {
    println!("=== PFT 参数 ===");

    let table = load_pft_table(args.pft_file.as_deref())?;
    println!(
        "{:<8} {:<6} {:>7} {:>8} {:>8} {:>7} {:>7} {:>8}",
        "name", "life", "sla", "wooddens", "k_latosa", "k_allom2", "k_allom3", "ltor_max"
    );
    for pft in &table.pfts {
        println!(
            "{:<8} {:<6} {:>7.2} {:>8.1} {:>8.0} {:>7.1} {:>7.2} {:>8.2}",
            pft.name,
            format!("{:?}", pft.lifeform),
            pft.sla,
            pft.wooddens,
            pft.k_latosa,
            pft.k_allom2,
            pft.k_allom3,
            pft.ltor_max
        );
    }
    Ok(())
}

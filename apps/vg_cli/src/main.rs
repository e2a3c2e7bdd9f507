// apps/vg_cli/src/main.rs

//! VegGrowth 命令行界面
//!
//! 提供生物量分配核心的命令行工具。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 5: Application**：
//! - 读取 JSON 配置、PFT 表与分配输入
//! - 构建 `AllocationKernel` 并输出 JSON 结果

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// VegGrowth 生物量分配命令行工具
#[derive(Parser)]
#[command(name = "vg_cli")]
#[command(author = "VegGrowth Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "VegGrowth biomass allocation kernel", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 单个个体分配
    Run(commands::run::RunArgs),
    /// 批量分配
    Batch(commands::batch::BatchArgs),
    /// 验证配置与输入
    Validate(commands::validate::ValidateArgs),
    /// 显示信息
    Info(commands::info::InfoArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // 日志写到 stderr，stdout 只输出 JSON 结果；库中的 log 记录一并转发
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {}", e))?;

    // 执行命令
    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Batch(args) => commands::batch::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
        Commands::Info(args) => commands::info::execute(args),
    }
}

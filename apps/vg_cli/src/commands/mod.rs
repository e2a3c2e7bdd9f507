// apps/vg_cli/src/commands/mod.rs

//! 子命令实现

pub mod batch;
pub mod info;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::info;
use vg_config::AllocationConfig;
use vg_growth::PftTable;

/// 加载分配配置，未指定路径时使用默认配置
pub fn load_config(path: Option<&Path>) -> Result<AllocationConfig> {
    match path {
        Some(path) => {
            let config = AllocationConfig::from_file(path)
                .with_context(|| format!("无法加载配置文件: {}", path.display()))?;
            info!("配置: {}", path.display());
            Ok(config)
        }
        None => Ok(AllocationConfig::default()),
    }
}

/// 加载 PFT 表，未指定路径时使用内置表
pub fn load_pft_table(path: Option<&Path>) -> Result<PftTable> {
    match path {
        Some(path) => PftTable::from_file(path)
            .with_context(|| format!("无法加载 PFT 文件: {}", path.display())),
        None => Ok(PftTable::builtin()),
    }
}

/// 读取并解析 JSON 文件
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("无法读取文件: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("JSON 解析错误: {}", path.display()))
}

/// 写出 JSON：指定路径时写文件，否则打印到 stdout
pub fn write_json(value: &serde_json::Value, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("无法写入文件: {}", path.display()))?;
            info!("结果已写入: {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

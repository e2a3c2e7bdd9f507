// apps/vg_cli/src/commands/run.rs

//! 单个个体分配命令
//!
//! 输入来源（优先级从高到低）：
//! 1. `--input` 指定的 JSON `AllocationInput`
//! 2. `--pft` 指定的 PFT 参数 + 命令行碳库
//! 3. 命令行参数（默认值为参考情景）

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};
use vg_growth::{
    allometric_height, AllocationError, AllocationInput, AllocationKernel, AllocationParams,
    Allometry, Lifeform, PlantPools, TurnoverRates,
};

use super::{load_config, load_pft_table, read_json, write_json};

/// 生活型参数
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LifeformArg {
    /// 乔木
    Tree,
    /// 草本
    Grass,
}

impl From<LifeformArg> for Lifeform {
    fn from(arg: LifeformArg) -> Self {
        match arg {
            LifeformArg::Tree => Lifeform::Tree,
            LifeformArg::Grass => Lifeform::Grass,
        }
    }
}

/// 单个个体分配参数
#[derive(Args)]
pub struct RunArgs {
    /// 分配输入 JSON 文件
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 使用指定 PFT 的生理参数
    #[arg(long)]
    pub pft: Option<String>,

    /// PFT 参数文件（缺省为内置表）
    #[arg(long)]
    pub pft_file: Option<PathBuf>,

    /// 水分胁迫系数 (0, 1]，仅与 --pft 一起使用
    #[arg(long, default_value = "1.0")]
    pub wscal: f64,

    /// 输出文件（缺省打印到 stdout）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 未收敛时输出回退结果而不是报错
    #[arg(long)]
    pub accept_fallback: bool,

    /// 本步碳增量 [kgC]
    #[arg(long, default_value = "1.0")]
    pub bminc: f64,

    /// 叶碳 [kgC]
    #[arg(long, default_value = "2.0")]
    pub leaf: f64,

    /// 细根碳 [kgC]
    #[arg(long, default_value = "1.0")]
    pub root: f64,

    /// 边材碳 [kgC]
    #[arg(long, default_value = "5.0")]
    pub sap: f64,

    /// 碳债务 [kgC]
    #[arg(long, default_value = "0.0")]
    pub debt: f64,

    /// 心材碳 [kgC]
    #[arg(long, default_value = "10.0")]
    pub heart: f64,

    /// 株高 [m]（缺省由异速关系推算）
    #[arg(long)]
    pub height: Option<f64>,

    /// 叶根比
    #[arg(long, default_value = "1.0")]
    pub ltor: f64,

    /// 比叶面积 [m²/kgC]
    #[arg(long, default_value = "20.0")]
    pub sla: f64,

    /// 木材密度 [kgC/m³]
    #[arg(long, default_value = "300.0")]
    pub wooddens: f64,

    /// 生活型
    #[arg(long, value_enum, default_value = "tree")]
    pub lifeform: LifeformArg,

    /// 管道模型常数
    #[arg(long, default_value = "6000.0")]
    pub k_latosa: f64,

    /// 异速系数
    #[arg(long, default_value = "40.0")]
    pub k_allom2: f64,

    /// 异速指数
    #[arg(long, default_value = "0.67")]
    pub k_allom3: f64,

    /// 叶周转率
    #[arg(long, default_value = "0.0")]
    pub turnover_leaf: f64,

    /// 细根周转率
    #[arg(long, default_value = "0.0")]
    pub turnover_root: f64,

    /// 边材周转率
    #[arg(long, default_value = "0.0")]
    pub turnover_sap: f64,
}

impl RunArgs {
    fn pools(&self) -> PlantPools {
        PlantPools {
            cmass_leaf: self.leaf,
            cmass_root: self.root,
            cmass_sap: self.sap,
            cmass_debt: self.debt,
            cmass_heart: self.heart,
        }
    }

    /// 组装分配输入
    fn build_input(&self) -> Result<AllocationInput> {
        if let Some(path) = &self.input {
            info!("输入: {}", path.display());
            return read_json(path);
        }

        let pools = self.pools();

        if let Some(name) = &self.pft {
            let table = load_pft_table(self.pft_file.as_deref())?;
            let pft = table.get(name).context("PFT 查找失败")?;
            let height = match self.height {
                Some(h) => h,
                None => Allometry::from_pools(&pools, pft)?.height,
            };
            info!("PFT: {} ({:?}), 株高 {:.3} m", pft.name, pft.lifeform, height);
            let params = pft
                .allocation_params(self.bminc, height, self.wscal)
                .context("无法组装 PFT 分配参数")?;
            return Ok(AllocationInput::new(pools, params));
        }

        let lifeform = Lifeform::from(self.lifeform);
        let height = match (self.height, lifeform) {
            (Some(h), _) => h,
            (None, Lifeform::Tree) => {
                allometric_height(pools.wood_mass(), self.wooddens, self.k_allom2, self.k_allom3)
            }
            (None, Lifeform::Grass) => 0.0,
        };

        let params = AllocationParams {
            bminc: self.bminc,
            ltor: self.ltor,
            height,
            sla: self.sla,
            wooddens: self.wooddens,
            lifeform,
            k_latosa: self.k_latosa,
            k_allom2: self.k_allom2,
            k_allom3: self.k_allom3,
            turnover: TurnoverRates {
                leaf: self.turnover_leaf,
                root: self.turnover_root,
                sap: self.turnover_sap,
            },
        };
        Ok(AllocationInput::new(pools, params))
    }
}

/// 执行分配命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== VegGrowth 分配 ===");

    let config = load_config(args.config.as_deref())?;
    let kernel = AllocationKernel::new(config);
    let input = args.build_input()?;

    info!(
        "bminc={} kgC, 生活型={:?}, 叶/根/边材/心材 = {}/{}/{}/{}",
        input.params.bminc,
        input.params.lifeform,
        input.pools.cmass_leaf,
        input.pools.cmass_root,
        input.pools.cmass_sap,
        input.pools.cmass_heart
    );

    let output = match kernel.allocate_with_diagnostics(&input.pools, &input.params) {
        Ok((result, diag)) => {
            info!(
                "分支: {:?}, 求解器: {}, 迭代 {} 次, 残差 {:.3e}",
                diag.branch, diag.solver, diag.iterations, diag.residual
            );
            info!(
                "守恒误差: {:.3e}, 未分配: {:.6} kgC",
                result.mass_balance_error(input.params.bminc),
                result.exceeds_cmass
            );
            json!({
                "status": "ok",
                "result": result,
                "post_pools": result.apply(&input.pools),
                "diagnostics": diag,
            })
        }
        Err(AllocationError::ConvergenceFailure {
            status,
            iterations,
            residual,
            fallback,
        }) if args.accept_fallback => {
            warn!(
                "未收敛 ({:?}, {} 次迭代, 残差 {:.3e})，输出回退结果",
                status, iterations, residual
            );
            json!({
                "status": "convergence_failure",
                "result": fallback,
                "post_pools": fallback.apply(&input.pools),
            })
        }
        Err(err) => bail!("分配失败: {}", err),
    };

    write_json(&output, args.output.as_deref())?;

    info!("=== 完成 ===");
    Ok(())
}

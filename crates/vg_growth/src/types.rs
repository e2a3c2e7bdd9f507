// crates/vg_growth/src/types.rs

//! 分配核心的输入输出类型
//!
//! 所有类型都是按值传递的瞬态记录：调用时创建，返回后丢弃。
//! 质量单位均为 kgC/ind。

use serde::{Deserialize, Serialize};
use vg_foundation::float::KahanSum;
use vg_foundation::validation::{check_positive, check_range, warn_if_high, ValidationReport};

use crate::error::AllocationError;

/// 生活型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lifeform {
    /// 乔木：叶、细根、边材、心材
    Tree,
    /// 草本：仅叶和细根
    Grass,
}

impl Lifeform {
    /// 从整数编码转换（1 = 乔木，2 = 草本）
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Tree),
            2 => Some(Self::Grass),
            _ => None,
        }
    }

    /// 整数编码
    pub fn code(self) -> i32 {
        match self {
            Self::Tree => 1,
            Self::Grass => 2,
        }
    }

    /// 是否具有木质部
    pub fn is_woody(self) -> bool {
        matches!(self, Self::Tree)
    }
}

/// 当前各组织碳库 [kgC/ind]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlantPools {
    /// 叶碳
    pub cmass_leaf: f64,
    /// 细根碳
    pub cmass_root: f64,
    /// 边材碳
    pub cmass_sap: f64,
    /// 碳债务（从木质部借出、尚未偿还的碳）
    #[serde(default)]
    pub cmass_debt: f64,
    /// 心材碳
    pub cmass_heart: f64,
}

impl PlantPools {
    /// 立木质量：边材 + 心材 - 碳债务
    #[inline]
    pub fn wood_mass(&self) -> f64 {
        self.cmass_sap + self.cmass_heart - self.cmass_debt
    }

    /// 植株总碳（债务作为负债计入）
    pub fn total_cmass(&self) -> f64 {
        KahanSum::sum_iter([
            self.cmass_leaf,
            self.cmass_root,
            self.cmass_sap,
            self.cmass_heart,
            -self.cmass_debt,
        ])
    }
}

/// 组织周转率（每步转出比例，取值 [0, 1]）
///
/// 叶和细根的周转进入凋落物；边材周转转化为心材。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TurnoverRates {
    /// 叶周转率
    #[serde(default)]
    pub leaf: f64,
    /// 细根周转率
    #[serde(default)]
    pub root: f64,
    /// 边材向心材的转化率
    #[serde(default)]
    pub sap: f64,
}

/// 分配参数：本步碳增量与异速生长/生理常数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationParams {
    /// 本步可分配的生物量增量 [kgC/ind]
    pub bminc: f64,
    /// 目标叶根质量比
    pub ltor: f64,
    /// 当前株高 [m]
    pub height: f64,
    /// 比叶面积 [m²/kgC]
    pub sla: f64,
    /// 木材密度 [kgC/m³]
    pub wooddens: f64,
    /// 生活型
    pub lifeform: Lifeform,
    /// 叶面积与边材截面积之比（管道模型常数）
    pub k_latosa: f64,
    /// 高度-胸径异速方程系数
    pub k_allom2: f64,
    /// 高度-胸径异速方程指数
    pub k_allom3: f64,
    /// 组织周转率
    #[serde(default)]
    pub turnover: TurnoverRates,
}

/// 分配结果：本步各碳库净变化量与凋落物通量 [kgC/ind]
///
/// 守恒关系：所有 `*_inc` 之和加上凋落物与 `exceeds_cmass` 等于 `bminc`。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AllocationResult {
    /// 叶碳变化（可为负：周转或脱落）
    pub cmass_leaf_inc: f64,
    /// 细根碳变化（可为负）
    pub cmass_root_inc: f64,
    /// 边材碳变化（可为负：转化为心材）
    pub cmass_sap_inc: f64,
    /// 碳债务变化
    pub cmass_debt_inc: f64,
    /// 心材碳变化
    pub cmass_heart_inc: f64,
    /// 叶凋落物增量
    pub litter_leaf_inc: f64,
    /// 细根凋落物增量
    pub litter_root_inc: f64,
    /// 受异速约束无法分配的碳
    pub exceeds_cmass: f64,
}

impl AllocationResult {
    /// 所有分量之和（应等于 `bminc`）
    pub fn total(&self) -> f64 {
        KahanSum::sum_iter([
            self.cmass_leaf_inc,
            self.cmass_root_inc,
            self.cmass_sap_inc,
            self.cmass_debt_inc,
            self.cmass_heart_inc,
            self.litter_leaf_inc,
            self.litter_root_inc,
            self.exceeds_cmass,
        ])
    }

    /// 实际分配的碳（不含 `exceeds_cmass`）
    pub fn allocated(&self) -> f64 {
        self.total() - self.exceeds_cmass
    }

    /// 相对质量守恒误差 `|total - bminc| / max(1, bminc)`
    pub fn mass_balance_error(&self, bminc: f64) -> f64 {
        (self.total() - bminc).abs() / bminc.abs().max(1.0)
    }

    /// 将增量作用于碳库，得到分配后的碳库
    pub fn apply(&self, pools: &PlantPools) -> PlantPools {
        PlantPools {
            cmass_leaf: pools.cmass_leaf + self.cmass_leaf_inc,
            cmass_root: pools.cmass_root + self.cmass_root_inc,
            cmass_sap: pools.cmass_sap + self.cmass_sap_inc,
            cmass_debt: pools.cmass_debt + self.cmass_debt_inc,
            cmass_heart: pools.cmass_heart + self.cmass_heart_inc,
        }
    }
}

/// 单个个体的完整分配输入（批处理与 JSON 文件使用）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationInput {
    /// 当前碳库
    pub pools: PlantPools,
    /// 分配参数
    pub params: AllocationParams,
}

/// 超过该株高时给出警告 [m]
const HEIGHT_WARNING: f64 = 150.0;

impl AllocationInput {
    /// 构造输入
    pub fn new(pools: PlantPools, params: AllocationParams) -> Self {
        Self { pools, params }
    }

    /// 收集全部前置条件问题到验证报告
    pub fn validate(&self, report: &mut ValidationReport, item: usize) {
        let pools = &self.pools;
        let params = &self.params;

        let masses = [
            ("cmass_leaf", pools.cmass_leaf),
            ("cmass_root", pools.cmass_root),
            ("cmass_sap", pools.cmass_sap),
            ("cmass_heart", pools.cmass_heart),
            ("bminc", params.bminc),
            ("height", params.height),
        ];
        for (field, value) in masses {
            check_range(report, field, item, value, 0.0, f64::MAX);
        }

        let constants = [
            ("ltor", params.ltor),
            ("sla", params.sla),
            ("wooddens", params.wooddens),
            ("k_latosa", params.k_latosa),
            ("k_allom2", params.k_allom2),
            ("k_allom3", params.k_allom3),
        ];
        for (field, value) in constants {
            check_positive(report, field, item, value);
        }

        let rates = [
            ("turnover.leaf", params.turnover.leaf),
            ("turnover.root", params.turnover.root),
            ("turnover.sap", params.turnover.sap),
        ];
        for (field, value) in rates {
            check_range(report, field, item, value, 0.0, 1.0);
        }

        // 债务不能超过可抵押的木质部
        let wood = pools.cmass_sap + pools.cmass_heart;
        let debt_max = if wood.is_finite() { wood.max(0.0) } else { f64::MAX };
        check_range(report, "cmass_debt", item, pools.cmass_debt, 0.0, debt_max);

        warn_if_high(report, "height", item, params.height, HEIGHT_WARNING);
    }

    /// 检查前置条件，返回第一个违反项
    pub fn check(&self) -> Result<(), AllocationError> {
        let mut report = ValidationReport::new();
        self.validate(&mut report, 0);
        match report.errors.into_iter().next() {
            None => Ok(()),
            Some(err) => Err(AllocationError::from_validation(err)),
        }
    }
}

// crates/vg_growth/src/turnover.rs

//! 组织周转
//!
//! 在分配之前执行：叶和细根按比例进入凋落物，乔木边材按比例转化为心材。
//! 周转不消耗也不产生碳，只在库之间移动。

use crate::types::{AllocationResult, Lifeform, PlantPools, TurnoverRates};

/// 周转通量 [kgC/ind]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TurnoverFluxes {
    /// 叶 -> 叶凋落物
    pub leaf_litter: f64,
    /// 细根 -> 根凋落物
    pub root_litter: f64,
    /// 边材 -> 心材
    pub sap_to_heart: f64,
}

impl TurnoverFluxes {
    /// 将周转通量叠加到生长分配结果上，得到本步净变化
    pub fn combine(&self, growth: &AllocationResult) -> AllocationResult {
        AllocationResult {
            cmass_leaf_inc: growth.cmass_leaf_inc - self.leaf_litter,
            cmass_root_inc: growth.cmass_root_inc - self.root_litter,
            cmass_sap_inc: growth.cmass_sap_inc - self.sap_to_heart,
            cmass_heart_inc: growth.cmass_heart_inc + self.sap_to_heart,
            litter_leaf_inc: growth.litter_leaf_inc + self.leaf_litter,
            litter_root_inc: growth.litter_root_inc + self.root_litter,
            ..*growth
        }
    }
}

/// 计算周转通量并返回周转后的碳库
pub fn apply_turnover(
    pools: &PlantPools,
    lifeform: Lifeform,
    rates: &TurnoverRates,
) -> (PlantPools, TurnoverFluxes) {
    let fluxes = TurnoverFluxes {
        leaf_litter: pools.cmass_leaf * rates.leaf,
        root_litter: pools.cmass_root * rates.root,
        sap_to_heart: if lifeform.is_woody() {
            pools.cmass_sap * rates.sap
        } else {
            0.0
        },
    };

    let after = PlantPools {
        cmass_leaf: pools.cmass_leaf - fluxes.leaf_litter,
        cmass_root: pools.cmass_root - fluxes.root_litter,
        cmass_sap: pools.cmass_sap - fluxes.sap_to_heart,
        cmass_heart: pools.cmass_heart + fluxes.sap_to_heart,
        ..*pools
    };

    (after, fluxes)
}

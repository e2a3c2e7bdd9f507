// crates/vg_growth/src/allometry.rs

//! 异速生长关系
//!
//! 乔木几何形态完全由碳库决定：
//!
//! ```text
//! 立木质量   W = sap + heart - debt
//! 胸径       D = (4W / (π · wooddens · k_allom2))^(1 / (2 + k_allom3))
//! 异速株高   H = k_allom2 · D^k_allom3
//! 管道株高   H = sap · k_latosa / (leaf · sla · wooddens)
//! 冠幅面积   A = min(k_allom1 · D^k_rp, crownarea_max)
//! ```
//!
//! 分配求解就是令异速株高与管道株高相等。

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use vg_foundation::float::safe_div;
use vg_foundation::VgResult;

use crate::pft::PftParameters;
use crate::types::{Lifeform, PlantPools};

/// 由立木质量计算胸径 [m]，质量非正时为 0
#[inline]
pub fn stem_diameter(wood_mass: f64, wooddens: f64, k_allom2: f64, k_allom3: f64) -> f64 {
    if wood_mass <= 0.0 {
        return 0.0;
    }
    (4.0 * wood_mass / (PI * wooddens * k_allom2)).powf(1.0 / (2.0 + k_allom3))
}

/// 由立木质量计算异速株高 [m]，质量非正时为 0
#[inline]
pub fn allometric_height(wood_mass: f64, wooddens: f64, k_allom2: f64, k_allom3: f64) -> f64 {
    if wood_mass <= 0.0 {
        return 0.0;
    }
    k_allom2 * stem_diameter(wood_mass, wooddens, k_allom2, k_allom3).powf(k_allom3)
}

/// 管道模型株高 [m]
///
/// 叶碳为零时结果为无穷（或 NaN，若边材也为零），由调用方处理。
#[inline]
pub fn pipe_model_height(cmass_sap: f64, cmass_leaf: f64, sla: f64, wooddens: f64, k_latosa: f64) -> f64 {
    cmass_sap * k_latosa / (cmass_leaf * sla * wooddens)
}

/// 给定叶碳与株高时管道模型要求的边材碳
#[inline]
pub fn sapwood_for_leaf(cmass_leaf: f64, height: f64, sla: f64, wooddens: f64, k_latosa: f64) -> f64 {
    cmass_leaf * sla * wooddens * height / k_latosa
}

/// 个体几何形态
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Allometry {
    /// 株高 [m]
    pub height: f64,
    /// 胸径 [m]
    pub diameter: f64,
    /// 叶面积 [m²]
    pub leaf_area: f64,
    /// 边材截面积 [m²]
    pub sapwood_area: f64,
    /// 冠幅面积 [m²]
    pub crown_area: f64,
    /// 冠层内叶面积指数
    pub lai_crown: f64,
}

impl Allometry {
    /// 由碳库与 PFT 参数计算几何形态
    ///
    /// 草本无木质部：株高、胸径和边材面积为零，冠幅按单位面积 1 m² 计。
    pub fn from_pools(pools: &PlantPools, pft: &PftParameters) -> VgResult<Self> {
        pft.validate()?;

        let leaf_area = pools.cmass_leaf * pft.sla;
        if pft.lifeform == Lifeform::Grass {
            return Ok(Self {
                leaf_area,
                crown_area: 1.0,
                lai_crown: leaf_area,
                ..Default::default()
            });
        }

        let wood = pools.wood_mass();
        let diameter = stem_diameter(wood, pft.wooddens, pft.k_allom2, pft.k_allom3);
        let height = allometric_height(wood, pft.wooddens, pft.k_allom2, pft.k_allom3);
        let sapwood_area = safe_div(pools.cmass_sap, pft.wooddens * height, 0.0);
        let crown_area = (pft.k_allom1 * diameter.powf(pft.k_rp)).min(pft.crownarea_max);

        Ok(Self {
            height,
            diameter,
            leaf_area,
            sapwood_area,
            crown_area,
            lai_crown: safe_div(leaf_area, crown_area, 0.0),
        })
    }

    /// 叶面积与边材面积之比（满足管道模型时等于 `k_latosa`）
    pub fn leaf_to_sapwood_area(&self) -> f64 {
        safe_div(self.leaf_area, self.sapwood_area, f64::INFINITY)
    }
}

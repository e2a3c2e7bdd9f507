// crates/vg_growth/src/pft.rs

//! 植物功能型（PFT）参数
//!
//! 每个 PFT 提供一组异速生长与周转常数。[`PftTable`] 可从 JSON 文件加载，
//! 也提供三个内置类型：北方常绿针叶树 `BNE`、温带落叶阔叶树 `TeBS`
//! 与 C3 草本 `C3G`。

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use vg_foundation::validation::{check_positive, check_range, ValidationError, ValidationReport};
use vg_foundation::{require, VgError, VgResult};

use crate::types::{AllocationParams, Lifeform, TurnoverRates};

/// 单个 PFT 的参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PftParameters {
    /// 名称
    pub name: String,
    /// 生活型
    pub lifeform: Lifeform,
    /// 比叶面积 [m²/kgC]
    pub sla: f64,
    /// 木材密度 [kgC/m³]
    pub wooddens: f64,
    /// 叶面积/边材截面积比
    pub k_latosa: f64,
    /// 冠幅-胸径系数
    pub k_allom1: f64,
    /// 高度-胸径系数
    pub k_allom2: f64,
    /// 高度-胸径指数
    pub k_allom3: f64,
    /// 冠幅-胸径指数
    pub k_rp: f64,
    /// 最大冠幅 [m²]
    pub crownarea_max: f64,
    /// 无水分胁迫时的叶根比
    pub ltor_max: f64,
    /// 组织周转率
    #[serde(default)]
    pub turnover: TurnoverRates,
}

impl PftParameters {
    /// 收集参数问题到验证报告
    pub fn validate_into(&self, report: &mut ValidationReport, item: usize) {
        let positives = [
            ("sla", self.sla),
            ("wooddens", self.wooddens),
            ("k_latosa", self.k_latosa),
            ("k_allom1", self.k_allom1),
            ("k_allom2", self.k_allom2),
            ("k_allom3", self.k_allom3),
            ("k_rp", self.k_rp),
            ("crownarea_max", self.crownarea_max),
            ("ltor_max", self.ltor_max),
        ];
        for (field, value) in positives {
            check_positive(report, field, item, value);
        }
        check_range(report, "turnover.leaf", item, self.turnover.leaf, 0.0, 1.0);
        check_range(report, "turnover.root", item, self.turnover.root, 0.0, 1.0);
        check_range(report, "turnover.sap", item, self.turnover.sap, 0.0, 1.0);
    }

    /// 检查参数有效性
    pub fn validate(&self) -> VgResult<()> {
        let mut report = ValidationReport::new();
        self.validate_into(&mut report, 0);
        if report.has_errors() {
            return Err(VgError::validation(format!("PFT {}: {}", self.name, report)));
        }
        Ok(())
    }

    /// 组装单步分配参数
    ///
    /// 叶根比随水分胁迫下调：`ltor = ltor_max · wscal`，`wscal ∈ (0, 1]`。
    pub fn allocation_params(&self, bminc: f64, height: f64, wscal: f64) -> VgResult<AllocationParams> {
        VgError::check_positive("wscal", wscal)?;
        VgError::check_range("wscal", wscal, 0.0, 1.0)?;

        Ok(AllocationParams {
            bminc,
            ltor: self.ltor_max * wscal,
            height,
            sla: self.sla,
            wooddens: self.wooddens,
            lifeform: self.lifeform,
            k_latosa: self.k_latosa,
            k_allom2: self.k_allom2,
            k_allom3: self.k_allom3,
            turnover: self.turnover,
        })
    }
}

/// PFT 参数表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PftTable {
    /// PFT 列表
    pub pfts: Vec<PftParameters>,
}

impl PftTable {
    /// 内置参数表
    pub fn builtin() -> Self {
        Self {
            pfts: vec![
                PftParameters {
                    name: "BNE".into(),
                    lifeform: Lifeform::Tree,
                    sla: 9.3,
                    wooddens: 200.0,
                    k_latosa: 5000.0,
                    k_allom1: 150.0,
                    k_allom2: 60.0,
                    k_allom3: 0.67,
                    k_rp: 1.6,
                    crownarea_max: 50.0,
                    ltor_max: 1.0,
                    turnover: TurnoverRates { leaf: 0.33, root: 0.7, sap: 0.05 },
                },
                PftParameters {
                    name: "TeBS".into(),
                    lifeform: Lifeform::Tree,
                    sla: 24.3,
                    wooddens: 200.0,
                    k_latosa: 6000.0,
                    k_allom1: 250.0,
                    k_allom2: 60.0,
                    k_allom3: 0.67,
                    k_rp: 1.6,
                    crownarea_max: 50.0,
                    ltor_max: 1.0,
                    turnover: TurnoverRates { leaf: 1.0, root: 0.7, sap: 0.05 },
                },
                PftParameters {
                    name: "C3G".into(),
                    lifeform: Lifeform::Grass,
                    sla: 32.4,
                    wooddens: 200.0,
                    k_latosa: 6000.0,
                    k_allom1: 100.0,
                    k_allom2: 40.0,
                    k_allom3: 0.67,
                    k_rp: 1.6,
                    crownarea_max: 1.0,
                    ltor_max: 0.5,
                    turnover: TurnoverRates { leaf: 0.5, root: 0.5, sap: 0.0 },
                },
            ],
        }
    }

    /// 从 JSON 文件加载并验证
    pub fn from_file<P: AsRef<Path>>(path: P) -> VgResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(VgError::file_not_found(path));
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| VgError::io_with_source(format!("读取 {}", path.display()), e))?;
        let table: PftTable = serde_json::from_str(&content)
            .map_err(|e| VgError::parse(path, e.line(), e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// 从 JSON 字符串解析并验证
    pub fn from_json(content: &str) -> VgResult<Self> {
        let table: PftTable =
            serde_json::from_str(content).map_err(|e| VgError::serialization(e.to_string()))?;
        table.validate()?;
        Ok(table)
    }

    /// 按名称查找
    pub fn get(&self, name: &str) -> VgResult<&PftParameters> {
        let pft = require!(
            self.pfts.iter().find(|p| p.name == name),
            VgError::not_found(format!("PFT '{}'", name))
        );
        Ok(pft)
    }

    /// 全部名称
    pub fn names(&self) -> Vec<&str> {
        self.pfts.iter().map(|p| p.name.as_str()).collect()
    }

    /// 收集整表问题（含重名检查）
    pub fn validate_into(&self, report: &mut ValidationReport) {
        let mut seen = HashSet::new();
        for (i, pft) in self.pfts.iter().enumerate() {
            pft.validate_into(report, i);
            if !seen.insert(pft.name.as_str()) {
                report.add_error(ValidationError::ConsistencyError {
                    message: format!("PFT 名称重复: {}", pft.name),
                    item: i,
                });
            }
        }
    }

    /// 检查整表有效性
    pub fn validate(&self) -> VgResult<()> {
        let mut report = ValidationReport::new();
        self.validate_into(&mut report);
        if report.has_errors() {
            return Err(VgError::validation(report.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_valid() {
        let table = PftTable::builtin();
        assert!(table.validate().is_ok());
        assert_eq!(table.names(), vec!["BNE", "TeBS", "C3G"]);
    }

    #[test]
    fn test_get_missing() {
        let table = PftTable::builtin();
        assert!(matches!(table.get("TrBE"), Err(VgError::NotFound { .. })));
    }

    #[test]
    fn test_allocation_params_water_stress() {
        let table = PftTable::builtin();
        let pft = table.get("BNE").unwrap();
        let params = pft.allocation_params(0.4, 12.0, 0.5).unwrap();
        assert_eq!(params.ltor, 0.5);
        assert_eq!(params.lifeform, Lifeform::Tree);
        assert_eq!(params.turnover, pft.turnover);

        assert!(pft.allocation_params(0.4, 12.0, 0.0).is_err());
        assert!(pft.allocation_params(0.4, 12.0, 1.5).is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut table = PftTable::builtin();
        let dup = table.pfts[0].clone();
        table.pfts.push(dup);
        assert!(table.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_with_default_turnover() {
        let json = r#"{ "pfts": [ {
            "name": "TeNE", "lifeform": "tree", "sla": 9.0, "wooddens": 200.0,
            "k_latosa": 5000.0, "k_allom1": 150.0, "k_allom2": 60.0, "k_allom3": 0.67,
            "k_rp": 1.6, "crownarea_max": 50.0, "ltor_max": 1.0
        } ] }"#;
        let table = PftTable::from_json(json).unwrap();
        assert_eq!(table.pfts[0].turnover, TurnoverRates::default());
    }

    #[test]
    fn test_invalid_json_values_rejected() {
        let json = r#"{ "pfts": [ {
            "name": "Bad", "lifeform": "grass", "sla": -1.0, "wooddens": 200.0,
            "k_latosa": 5000.0, "k_allom1": 150.0, "k_allom2": 60.0, "k_allom3": 0.67,
            "k_rp": 1.6, "crownarea_max": 50.0, "ltor_max": 1.0
        } ] }"#;
        assert!(matches!(PftTable::from_json(json), Err(VgError::Validation(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = PftTable::from_file("/nonexistent/pfts.json");
        assert!(matches!(result, Err(VgError::FileNotFound { .. })));
    }
}

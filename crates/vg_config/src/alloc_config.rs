// crates/vg_config/src/alloc_config.rs

//! AllocationConfig - 分配核心配置
//!
//! 定义求根器设置、质量守恒容差与批处理设置。所有字段都带有
//! `#[serde(default)]`，配置文件只需写出需要覆盖的键。

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// 分配核心配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationConfig {
    /// 求根器设置
    #[serde(default)]
    pub solver: SolverSettings,

    /// 质量守恒检验的相对容差
    #[serde(default = "default_mass_balance_tol")]
    pub mass_balance_tol: f64,

    /// 批处理设置
    #[serde(default)]
    pub batch: BatchSettings,
}

fn default_mass_balance_tol() -> f64 { 1e-6 }

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            solver: SolverSettings::default(),
            mass_balance_tol: default_mass_balance_tol(),
            batch: BatchSettings::default(),
        }
    }
}

/// 区间求根方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RootMethod {
    /// 二分法（稳健，线性收敛）
    #[default]
    Bisection,
    /// Illinois 修正的试位法（超线性收敛）
    Illinois,
}

/// 求根器设置
///
/// 收敛判据：`|f(x)| <= yacc` 或区间半宽 `<= xacc * max(1, |x|)`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// 求根方法
    #[serde(default)]
    pub method: RootMethod,

    /// 搜索变号区间时的分段数
    #[serde(default = "default_segments")]
    pub segments: usize,

    /// 最大迭代次数
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// x 方向（叶碳增量）收敛容差 [kgC]
    #[serde(default = "default_xacc")]
    pub xacc: f64,

    /// y 方向（高度残差）收敛容差 [m]
    #[serde(default = "default_yacc")]
    pub yacc: f64,

    /// 是否输出迭代跟踪日志
    #[serde(default)]
    pub verbose: bool,
}

fn default_segments() -> usize { 20 }
fn default_max_iterations() -> usize { 64 }
fn default_xacc() -> f64 { 1e-10 }
fn default_yacc() -> f64 { 1e-10 }

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            method: RootMethod::default(),
            segments: default_segments(),
            max_iterations: default_max_iterations(),
            xacc: default_xacc(),
            yacc: default_yacc(),
            verbose: false,
        }
    }
}

impl SolverSettings {
    /// 放宽容差的设置（用于调用方在不收敛时重试）
    pub fn relaxed(&self) -> Self {
        Self {
            xacc: self.xacc * 1e4,
            yacc: self.yacc * 1e4,
            max_iterations: self.max_iterations * 2,
            ..self.clone()
        }
    }
}

/// 批处理设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// 超过该条目数时启用 rayon 并行
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_parallel_threshold() -> usize { 256 }

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl AllocationConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析配置
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: AllocationConfig =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let solver = &self.solver;

        if solver.segments == 0 {
            return Err(ConfigError::invalid_value(
                "solver.segments",
                solver.segments,
                "分段数必须至少为 1",
            ));
        }

        if solver.max_iterations == 0 {
            return Err(ConfigError::invalid_value(
                "solver.max_iterations",
                solver.max_iterations,
                "最大迭代次数必须至少为 1",
            ));
        }

        if !(solver.xacc.is_finite() && solver.xacc > 0.0) {
            return Err(ConfigError::invalid_value(
                "solver.xacc",
                solver.xacc,
                "xacc 必须为有限正数",
            ));
        }

        if !(solver.yacc.is_finite() && solver.yacc > 0.0) {
            return Err(ConfigError::invalid_value(
                "solver.yacc",
                solver.yacc,
                "yacc 必须为有限正数",
            ));
        }

        if !(self.mass_balance_tol.is_finite() && self.mass_balance_tol > 0.0) {
            return Err(ConfigError::invalid_value(
                "mass_balance_tol",
                self.mass_balance_tol,
                "质量守恒容差必须为有限正数",
            ));
        }

        Ok(())
    }

    /// 保存配置到 JSON 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AllocationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.solver.method, RootMethod::Bisection);
        assert_eq!(config.solver.segments, 20);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AllocationConfig::from_json(r#"{ "solver": { "method": "illinois" } }"#)
            .unwrap();
        assert_eq!(config.solver.method, RootMethod::Illinois);
        assert_eq!(config.solver.max_iterations, 64);
        assert_eq!(config.batch.parallel_threshold, 256);
    }

    #[test]
    fn test_invalid_xacc() {
        let mut config = AllocationConfig::default();
        config.solver.xacc = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "solver.xacc"
        ));
    }

    #[test]
    fn test_invalid_segments_rejected_on_parse() {
        let result = AllocationConfig::from_json(r#"{ "solver": { "segments": 0 } }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_method_is_parse_error() {
        let result = AllocationConfig::from_json(r#"{ "solver": { "method": "newton" } }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_relaxed_settings() {
        let settings = SolverSettings::default();
        let relaxed = settings.relaxed();
        assert!(relaxed.xacc > settings.xacc);
        assert!(relaxed.max_iterations > settings.max_iterations);
        assert_eq!(relaxed.method, settings.method);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = AllocationConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = AllocationConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!(
            "vg_config_roundtrip_{}.json",
            std::process::id()
        ));
        let mut config = AllocationConfig::default();
        config.solver.segments = 40;
        config.save_to_file(&path).unwrap();
        let loaded = AllocationConfig::from_file(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded.solver.segments, 40);
    }
}

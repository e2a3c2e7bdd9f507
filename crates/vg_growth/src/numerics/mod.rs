// crates/vg_growth/src/numerics/mod.rs

//! 数值方法模块
//!
//! 包含：
//! - root_finding - 一维区间求根（区间扫描、二分法、Illinois 试位法）

pub mod root_finding;

pub use root_finding::{
    scan_for_sign_change, solve_bracketed, Bisection, Bracket, BracketingSolver, Illinois,
    RootFinderConfig, RootResult, ScanOutcome, SolverStatus,
};

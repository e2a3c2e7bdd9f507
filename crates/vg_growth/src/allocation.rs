// crates/vg_growth/src/allocation.rs

//! 生物量分配核心
//!
//! 将本步碳增量 `bminc` 分配到叶、细根、边材与心材，使分配后的个体满足：
//!
//! - 叶根比等于 `ltor`
//! - 管道模型：叶面积 = `k_latosa` × 边材截面积
//! - 株高-胸径异速关系与木材密度一致
//!
//! 乔木的三个约束通过唯一自由变量（叶碳变化量 `x`）耦合：
//!
//! ```text
//! leaf' = leaf + x,  root' = leaf' / ltor
//! g(x)  = max(x, 0) + max(root' - root, 0)        生长消耗
//! sap'  = sap + bminc - g(x)
//! f(x)  = H_allom(sap' + heart - debt) - H_pipe(sap', leaf')
//! ```
//!
//! `f` 在 `x → -leaf` 时趋于负无穷，因此只要上界 `x_hi` 处残差为正，
//! 区间扫描总能找到变号。

use serde::Serialize;
use vg_config::AllocationConfig;
use vg_foundation::float::NEGLIGIBLE_CMASS;

use crate::allometry::{allometric_height, pipe_model_height, sapwood_for_leaf};
use crate::error::AllocationError;
use crate::numerics::{
    scan_for_sign_change, solve_bracketed, RootFinderConfig, ScanOutcome, SolverStatus,
};
use crate::turnover::apply_turnover;
use crate::types::{AllocationInput, AllocationParams, AllocationResult, Lifeform, PlantPools};

/// 下界处保留的叶碳比例，避免管道株高除零
const LEAF_FLOOR_FRACTION: f64 = 1e-9;

/// 分配分支
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AllocationBranch {
    /// 草本：仅叶根分配
    Grass,
    /// 增量为零：仅周转
    ZeroIncrement,
    /// 正常分支：求根满足全部约束
    Normal,
    /// 边材过剩：增量全部给叶根，多余边材转心材
    SapwoodSurplus,
}

/// 分配诊断信息
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AllocationDiagnostics {
    /// 所走分支
    pub branch: AllocationBranch,
    /// 求根迭代次数（不含区间扫描）
    pub iterations: usize,
    /// 最终高度残差 [m]
    pub residual: f64,
    /// 求解器名称
    pub solver: &'static str,
}

impl AllocationDiagnostics {
    fn direct(branch: AllocationBranch, residual: f64) -> Self {
        Self {
            branch,
            iterations: 0,
            residual,
            solver: "none",
        }
    }
}

// ============================================================================
// 叶根分配
// ============================================================================

/// 叶根比约束下的叶、根变化量
#[derive(Debug, Clone, Copy, PartialEq)]
struct LeafRootSplit {
    leaf_change: f64,
    root_change: f64,
}

impl LeafRootSplit {
    /// 以叶碳变化量 `x` 为自变量，根按叶根比跟随
    fn from_leaf_change(leaf: f64, root: f64, ltor: f64, x: f64) -> Self {
        Self {
            leaf_change: x,
            root_change: (leaf + x) / ltor - root,
        }
    }

    /// 将 `bminc` 全部用于叶根，使分配后叶根比为 `ltor`
    ///
    /// 若某一器官已超出比例，增量全部给另一器官，超出部分脱落。
    fn full_increment(leaf: f64, root: f64, ltor: f64, bminc: f64) -> Self {
        if ltor * (root + bminc) < leaf {
            // 根不足以支撑现有叶量：叶脱落
            Self {
                leaf_change: ltor * (root + bminc) - leaf,
                root_change: bminc,
            }
        } else if leaf + bminc < ltor * root {
            // 叶不足以匹配现有根量：根脱落
            Self {
                leaf_change: bminc,
                root_change: (leaf + bminc) / ltor - root,
            }
        } else {
            let leaf_change = (bminc - leaf / ltor + root) / (1.0 + 1.0 / ltor);
            Self {
                leaf_change,
                root_change: bminc - leaf_change,
            }
        }
    }

    /// 生长消耗的碳
    fn growth(&self) -> f64 {
        self.leaf_change.max(0.0) + self.root_change.max(0.0)
    }

    /// 写入叶根相关字段，负变化计入凋落物
    fn write_into(&self, result: &mut AllocationResult) {
        result.cmass_leaf_inc = self.leaf_change;
        result.cmass_root_inc = self.root_change;
        result.litter_leaf_inc = (-self.leaf_change).max(0.0);
        result.litter_root_inc = (-self.root_change).max(0.0);
    }
}

// ============================================================================
// 乔木残差
// ============================================================================

/// 乔木分配问题（周转后的碳库）
struct TreeProblem<'a> {
    pools: &'a PlantPools,
    params: &'a AllocationParams,
}

impl TreeProblem<'_> {
    fn split(&self, x: f64) -> LeafRootSplit {
        LeafRootSplit::from_leaf_change(self.pools.cmass_leaf, self.pools.cmass_root, self.params.ltor, x)
    }

    fn sapwood(&self, split: &LeafRootSplit) -> f64 {
        self.pools.cmass_sap + self.params.bminc - split.growth()
    }

    /// 高度残差 `H_allom - H_pipe`
    fn residual(&self, x: f64) -> f64 {
        let p = self.params;
        let split = self.split(x);
        let sap = self.sapwood(&split);
        let wood = sap + self.pools.cmass_heart - self.pools.cmass_debt;
        allometric_height(wood, p.wooddens, p.k_allom2, p.k_allom3)
            - pipe_model_height(sap, self.pools.cmass_leaf + x, p.sla, p.wooddens, p.k_latosa)
    }

    /// 在 `x` 处分配叶根，剩余碳进入边材
    fn result_at(&self, x: f64) -> AllocationResult {
        let split = self.split(x);
        let mut result = AllocationResult::default();
        split.write_into(&mut result);
        result.cmass_sap_inc = self.params.bminc - split.growth();
        result
    }

    /// 回退结果：叶根按 `x` 分配，本应进入边材的碳计入 `exceeds_cmass`
    fn fallback_at(&self, x: f64) -> AllocationResult {
        let mut result = self.result_at(x);
        result.exceeds_cmass = result.cmass_sap_inc.max(0.0);
        result.cmass_sap_inc = 0.0;
        result
    }
}

fn no_growth(bminc: f64) -> AllocationResult {
    AllocationResult {
        exceeds_cmass: bminc,
        ..Default::default()
    }
}

// ============================================================================
// 分配核心
// ============================================================================

/// 分配核心
///
/// 无内部可变状态，可在多线程间共享。
#[derive(Debug, Clone, Default)]
pub struct AllocationKernel {
    config: AllocationConfig,
}

impl AllocationKernel {
    /// 使用给定配置创建
    pub fn new(config: AllocationConfig) -> Self {
        Self { config }
    }

    /// 当前配置
    pub fn config(&self) -> &AllocationConfig {
        &self.config
    }

    /// 计算本步分配
    pub fn allocate(
        &self,
        pools: &PlantPools,
        params: &AllocationParams,
    ) -> Result<AllocationResult, AllocationError> {
        self.allocate_with_diagnostics(pools, params)
            .map(|(result, _)| result)
    }

    /// 计算本步分配并返回诊断信息
    pub fn allocate_with_diagnostics(
        &self,
        pools: &PlantPools,
        params: &AllocationParams,
    ) -> Result<(AllocationResult, AllocationDiagnostics), AllocationError> {
        AllocationInput::new(*pools, *params).check()?;

        let (after, fluxes) = apply_turnover(pools, params.lifeform, &params.turnover);

        let growth = if params.bminc == 0.0 {
            Ok((
                AllocationResult::default(),
                AllocationDiagnostics::direct(AllocationBranch::ZeroIncrement, 0.0),
            ))
        } else {
            match params.lifeform {
                Lifeform::Grass => Ok(Self::allocate_grass(&after, params)),
                Lifeform::Tree => self.allocate_tree(&after, params),
            }
        };

        let (growth, diagnostics) = match growth {
            Ok(ok) => ok,
            Err(AllocationError::ConvergenceFailure {
                status,
                iterations,
                residual,
                fallback,
            }) => {
                return Err(AllocationError::ConvergenceFailure {
                    status,
                    iterations,
                    residual,
                    fallback: fluxes.combine(&fallback),
                });
            }
            Err(err) => return Err(err),
        };

        let result = fluxes.combine(&growth);
        check_post_pools(pools, &result)?;
        debug_assert!(result.mass_balance_error(params.bminc) <= self.config.mass_balance_tol);

        Ok((result, diagnostics))
    }

    fn allocate_grass(
        pools: &PlantPools,
        params: &AllocationParams,
    ) -> (AllocationResult, AllocationDiagnostics) {
        let split = LeafRootSplit::full_increment(
            pools.cmass_leaf,
            pools.cmass_root,
            params.ltor,
            params.bminc,
        );
        let mut result = AllocationResult::default();
        split.write_into(&mut result);
        (result, AllocationDiagnostics::direct(AllocationBranch::Grass, 0.0))
    }

    fn allocate_tree(
        &self,
        pools: &PlantPools,
        params: &AllocationParams,
    ) -> Result<(AllocationResult, AllocationDiagnostics), AllocationError> {
        let settings = &self.config.solver;
        let problem = TreeProblem { pools, params };

        let upper = LeafRootSplit::full_increment(
            pools.cmass_leaf,
            pools.cmass_root,
            params.ltor,
            params.bminc,
        );
        let x_hi = upper.leaf_change;
        let f_hi = problem.residual(x_hi);

        if !f_hi.is_finite() {
            return Err(AllocationError::ConvergenceFailure {
                status: SolverStatus::NonFinite,
                iterations: 0,
                residual: f_hi,
                fallback: no_growth(params.bminc),
            });
        }

        if f_hi < -settings.yacc {
            return Ok(Self::sapwood_surplus(pools, params, upper, f_hi));
        }

        if f_hi <= settings.yacc && problem.sapwood(&upper) + pools.cmass_heart > NEGLIGIBLE_CMASS {
            return Ok((
                problem.result_at(x_hi),
                AllocationDiagnostics::direct(AllocationBranch::Normal, f_hi),
            ));
        }

        let leaf_hi = pools.cmass_leaf + x_hi;
        let x_lo = -pools.cmass_leaf + LEAF_FLOOR_FRACTION * leaf_hi;
        let mut f = |x: f64| problem.residual(x);

        let bracket = match scan_for_sign_change(&mut f, x_hi, x_lo, settings.segments) {
            ScanOutcome::Bracketed(bracket) => bracket,
            ScanOutcome::NoSignChange => {
                return Err(AllocationError::ConvergenceFailure {
                    status: SolverStatus::NoSignChange,
                    iterations: 0,
                    residual: f_hi,
                    fallback: problem.fallback_at(x_hi),
                });
            }
            ScanOutcome::NonFinite { x } => {
                return Err(AllocationError::ConvergenceFailure {
                    status: SolverStatus::NonFinite,
                    iterations: 0,
                    residual: f(x),
                    fallback: no_growth(params.bminc),
                });
            }
        };

        let (root, solver) = solve_bracketed(
            settings.method,
            RootFinderConfig::from(settings),
            &mut f,
            bracket,
        );

        match root.status {
            SolverStatus::Converged => Ok((
                problem.result_at(root.root),
                AllocationDiagnostics {
                    branch: AllocationBranch::Normal,
                    iterations: root.iterations,
                    residual: root.residual,
                    solver,
                },
            )),
            SolverStatus::MaxIterationsReached => {
                log::warn!(
                    "{} 未在 {} 次迭代内收敛, 残差 {:.3e}",
                    solver,
                    root.iterations,
                    root.residual
                );
                Err(AllocationError::ConvergenceFailure {
                    status: root.status,
                    iterations: root.iterations,
                    residual: root.residual,
                    fallback: problem.fallback_at(root.root),
                })
            }
            status => Err(AllocationError::ConvergenceFailure {
                status,
                iterations: root.iterations,
                residual: root.residual,
                fallback: no_growth(params.bminc),
            }),
        }
    }

    /// 边材过剩：增量全部给叶根，超出管道模型的边材转为心材
    ///
    /// 边材转心材不改变木质碳总量，异速株高保持不变；
    /// 按该株高求管道模型所需边材，使转化后残差为零。
    fn sapwood_surplus(
        pools: &PlantPools,
        params: &AllocationParams,
        split: LeafRootSplit,
        residual: f64,
    ) -> (AllocationResult, AllocationDiagnostics) {
        let leaf_new = pools.cmass_leaf + split.leaf_change;
        let reference_height =
            allometric_height(pools.wood_mass(), params.wooddens, params.k_allom2, params.k_allom3);
        let sap_target = sapwood_for_leaf(
            leaf_new,
            reference_height,
            params.sla,
            params.wooddens,
            params.k_latosa,
        );
        let conversion = (pools.cmass_sap - sap_target).max(0.0);

        let mut result = AllocationResult::default();
        split.write_into(&mut result);
        result.cmass_sap_inc = -conversion;
        result.cmass_heart_inc = conversion;

        (
            result,
            AllocationDiagnostics::direct(AllocationBranch::SapwoodSurplus, residual),
        )
    }
}

/// 分配后任一碳库为负（超出舍入误差）即报错，不做截断
fn check_post_pools(pools: &PlantPools, result: &AllocationResult) -> Result<(), AllocationError> {
    let post = result.apply(pools);
    let checks = [
        ("cmass_leaf", pools.cmass_leaf, result.cmass_leaf_inc, post.cmass_leaf),
        ("cmass_root", pools.cmass_root, result.cmass_root_inc, post.cmass_root),
        ("cmass_sap", pools.cmass_sap, result.cmass_sap_inc, post.cmass_sap),
        ("cmass_debt", pools.cmass_debt, result.cmass_debt_inc, post.cmass_debt),
        ("cmass_heart", pools.cmass_heart, result.cmass_heart_inc, post.cmass_heart),
    ];
    for (field, before, inc, after) in checks {
        let scale = before.max(inc.abs()).max(1.0);
        // NaN 同样视为失败
        if !(after >= -NEGLIGIBLE_CMASS * scale) {
            return Err(AllocationError::invalid(field, after, "分配后碳库为负"));
        }
    }
    Ok(())
}

/// 使用默认配置计算本步分配
pub fn allocate(
    pools: &PlantPools,
    params: &AllocationParams,
) -> Result<AllocationResult, AllocationError> {
    AllocationKernel::default().allocate(pools, params)
}

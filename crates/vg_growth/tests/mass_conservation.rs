// crates/vg_growth/tests/mass_conservation.rs

//! 质量守恒验证测试
//!
//! # 测试覆盖
//!
//! - 随机输入下的碳守恒（成功结果与未收敛回退结果）
//! - 周转与分配叠加后的守恒
//! - 分配后碳库非负
//! - 批量并行与串行一致

use rand::prelude::*;
use vg_config::{AllocationConfig, RootMethod};
use vg_foundation::float::MASS_BALANCE_TOL;
use vg_growth::{
    allocate_batch, AllocationError, AllocationInput, AllocationKernel, AllocationParams,
    AllocationResult, BatchSummary, Lifeform, PlantPools, TurnoverRates,
};

// ============================================================================
// 测试辅助函数
// ============================================================================

/// 在物理合理范围内生成随机输入
fn random_input(rng: &mut impl Rng, lifeform: Lifeform) -> AllocationInput {
    let cmass_sap = rng.gen_range(0.1..50.0);
    let cmass_heart = rng.gen_range(0.0..200.0);
    let pools = PlantPools {
        cmass_leaf: rng.gen_range(0.01..5.0),
        cmass_root: rng.gen_range(0.01..5.0),
        cmass_sap,
        cmass_debt: rng.gen_range(0.0..0.5) * (cmass_sap + cmass_heart),
        cmass_heart,
    };
    let params = AllocationParams {
        bminc: rng.gen_range(0.0..3.0),
        ltor: rng.gen_range(0.2..2.0),
        height: rng.gen_range(0.0..30.0),
        sla: rng.gen_range(5.0..40.0),
        wooddens: rng.gen_range(150.0..400.0),
        lifeform,
        k_latosa: rng.gen_range(3000.0..8000.0),
        k_allom2: rng.gen_range(20.0..80.0),
        k_allom3: rng.gen_range(0.5..0.8),
        turnover: TurnoverRates {
            leaf: rng.gen_range(0.0..0.5),
            root: rng.gen_range(0.0..0.5),
            sap: rng.gen_range(0.0..0.1),
        },
    };
    AllocationInput::new(pools, params)
}

/// 取成功结果或未收敛回退结果
fn result_or_fallback(outcome: &Result<AllocationResult, AllocationError>) -> AllocationResult {
    match outcome {
        Ok(result) => *result,
        Err(err) => *err
            .fallback()
            .unwrap_or_else(|| panic!("随机输入不应无效: {}", err)),
    }
}

fn assert_pools_non_negative(post: &PlantPools) {
    for (name, value) in [
        ("leaf", post.cmass_leaf),
        ("root", post.cmass_root),
        ("sap", post.cmass_sap),
        ("debt", post.cmass_debt),
        ("heart", post.cmass_heart),
    ] {
        assert!(value >= -1e-9, "{} 碳库为负: {}", name, value);
    }
}

// ============================================================================
// 守恒测试
// ============================================================================

#[test]
fn test_random_tree_inputs_conserve_mass() {
    let mut rng = thread_rng();
    let kernel = AllocationKernel::default();

    for _ in 0..500 {
        let input = random_input(&mut rng, Lifeform::Tree);
        let outcome = kernel.allocate(&input.pools, &input.params);
        let result = result_or_fallback(&outcome);

        let err = result.mass_balance_error(input.params.bminc);
        assert!(err < MASS_BALANCE_TOL, "守恒误差 {:.3e}, 输入 {:?}", err, input);
        assert!(result.exceeds_cmass >= 0.0);
        assert!(result.litter_leaf_inc >= 0.0);
        assert!(result.litter_root_inc >= 0.0);
        assert_eq!(result.cmass_debt_inc, 0.0);
        assert_pools_non_negative(&result.apply(&input.pools));
    }
}

#[test]
fn test_random_grass_inputs_conserve_mass() {
    let mut rng = thread_rng();
    let kernel = AllocationKernel::default();

    for _ in 0..500 {
        let mut input = random_input(&mut rng, Lifeform::Grass);
        input.pools.cmass_sap = 0.0;
        input.pools.cmass_heart = 0.0;
        input.pools.cmass_debt = 0.0;

        let result = kernel.allocate(&input.pools, &input.params).unwrap();
        assert!(result.mass_balance_error(input.params.bminc) < MASS_BALANCE_TOL);
        assert_eq!(result.cmass_sap_inc, 0.0);
        assert_eq!(result.cmass_heart_inc, 0.0);
        assert_eq!(result.exceeds_cmass, 0.0);
        assert_pools_non_negative(&result.apply(&input.pools));
    }
}

#[test]
fn test_illinois_conserves_mass() {
    let mut rng = thread_rng();
    let mut config = AllocationConfig::default();
    config.solver.method = RootMethod::Illinois;
    let kernel = AllocationKernel::new(config);

    for _ in 0..200 {
        let input = random_input(&mut rng, Lifeform::Tree);
        let result = result_or_fallback(&kernel.allocate(&input.pools, &input.params));
        assert!(result.mass_balance_error(input.params.bminc) < MASS_BALANCE_TOL);
    }
}

#[test]
fn test_turnover_litter_accounted() {
    let pools = PlantPools {
        cmass_leaf: 2.0,
        cmass_root: 1.0,
        cmass_sap: 5.0,
        cmass_debt: 0.0,
        cmass_heart: 10.0,
    };
    let params = AllocationParams {
        bminc: 1.0,
        ltor: 1.0,
        height: 3.0,
        sla: 20.0,
        wooddens: 300.0,
        lifeform: Lifeform::Tree,
        k_latosa: 6000.0,
        k_allom2: 40.0,
        k_allom3: 0.67,
        turnover: TurnoverRates {
            leaf: 0.5,
            root: 0.5,
            sap: 0.1,
        },
    };

    let result = vg_growth::allocate(&pools, &params).unwrap();
    // 周转至少贡献 leaf·0.5 与 root·0.5 的凋落物
    assert!(result.litter_leaf_inc >= 1.0 - 1e-12);
    assert!(result.litter_root_inc >= 0.5 - 1e-12);
    assert!(result.cmass_heart_inc >= 0.5 - 1e-12);
    assert!(result.mass_balance_error(params.bminc) < MASS_BALANCE_TOL);

    // 植株总碳变化 = bminc - 凋落物 - 未分配
    let before = pools.total_cmass();
    let after = result.apply(&pools).total_cmass();
    let expected = params.bminc - result.litter_leaf_inc - result.litter_root_inc - result.exceeds_cmass;
    assert!((after - before - expected).abs() < 1e-9);
}

#[test]
fn test_batch_conserves_mass_in_parallel() {
    let mut rng = thread_rng();
    let inputs: Vec<_> = (0..1000)
        .map(|i| {
            let lifeform = if i % 4 == 0 { Lifeform::Grass } else { Lifeform::Tree };
            random_input(&mut rng, lifeform)
        })
        .collect();

    let kernel = AllocationKernel::default();
    let results = allocate_batch(&kernel, &inputs);
    assert_eq!(results.len(), inputs.len());

    for (input, outcome) in inputs.iter().zip(&results) {
        let result = result_or_fallback(outcome);
        assert!(result.mass_balance_error(input.params.bminc) < MASS_BALANCE_TOL);
    }

    let summary = BatchSummary::from_results(&inputs, &results, MASS_BALANCE_TOL);
    assert_eq!(summary.invalid, 0);
    assert_eq!(summary.imbalanced, 0);
    assert_eq!(summary.succeeded + summary.convergence_failures, summary.total);
}

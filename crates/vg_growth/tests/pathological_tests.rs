// crates/vg_growth/tests/pathological_tests.rs

//! 病态边缘情况与鲁棒性验证测试
//!
//! 覆盖：
//! - 近零木材密度（不可行情景）
//! - NaN/Inf 输入阻断
//! - 空碳库、极端增量与极端叶根比
//! - 多线程并发调用一致性

use rand::prelude::*;
use rayon::prelude::*;
use vg_growth::numerics::SolverStatus;
use vg_growth::{
    AllocationError, AllocationKernel, AllocationParams, AllocationResult, Lifeform, PlantPools,
    TurnoverRates,
};

// ============================================================
// 测试辅助设施
// ============================================================

fn scenario() -> (PlantPools, AllocationParams) {
    (
        PlantPools {
            cmass_leaf: 2.0,
            cmass_root: 1.0,
            cmass_sap: 5.0,
            cmass_debt: 0.0,
            cmass_heart: 10.0,
        },
        AllocationParams {
            bminc: 1.0,
            ltor: 1.0,
            height: 3.0,
            sla: 20.0,
            wooddens: 300.0,
            lifeform: Lifeform::Tree,
            k_latosa: 6000.0,
            k_allom2: 40.0,
            k_allom3: 0.67,
            turnover: TurnoverRates::default(),
        },
    )
}

/// 成功或未收敛时检查结果守恒且碳库非负
fn assert_safe(pools: &PlantPools, params: &AllocationParams, outcome: &Result<AllocationResult, AllocationError>) {
    let result = match outcome {
        Ok(r) => *r,
        Err(AllocationError::ConvergenceFailure { fallback, .. }) => *fallback,
        Err(e) => panic!("意外错误: {}", e),
    };
    assert!(result.mass_balance_error(params.bminc) < 1e-6);
    assert!(result.exceeds_cmass >= 0.0);

    let post = result.apply(pools);
    for value in [post.cmass_leaf, post.cmass_root, post.cmass_sap, post.cmass_heart] {
        assert!(value >= -1e-9, "碳库为负: {:?}", post);
    }
}

// ============================================================
// 不可行情景
// ============================================================

#[test]
fn test_near_zero_wooddens_fails_to_converge() {
    let (pools, mut params) = scenario();
    params.wooddens = f64::MIN_POSITIVE;

    let outcome = vg_growth::allocate(&pools, &params);
    match &outcome {
        Err(AllocationError::ConvergenceFailure { status, fallback, .. }) => {
            assert_eq!(*status, SolverStatus::NonFinite);
            assert_eq!(fallback.exceeds_cmass, params.bminc);
        }
        other => panic!("期望未收敛, 实际 {:?}", other),
    }
    assert_safe(&pools, &params, &outcome);
}

#[test]
fn test_small_wooddens_never_negative_pool() {
    let (pools, mut params) = scenario();
    for wooddens in [1e-3, 1e-6, 1e-9, 1e-12, 1e-200] {
        params.wooddens = wooddens;
        let outcome = vg_growth::allocate(&pools, &params);
        assert_safe(&pools, &params, &outcome);
    }
}

// ============================================================
// 无效输入
// ============================================================

#[test]
fn test_non_finite_inputs_rejected() {
    let (pools, params) = scenario();

    let mut p = params;
    p.bminc = f64::NAN;
    assert!(matches!(
        vg_growth::allocate(&pools, &p),
        Err(AllocationError::InvalidParameter { field: "bminc", .. })
    ));

    let mut p = params;
    p.k_allom3 = f64::INFINITY;
    assert!(matches!(
        vg_growth::allocate(&pools, &p),
        Err(AllocationError::InvalidParameter { field: "k_allom3", .. })
    ));

    let mut q = pools;
    q.cmass_heart = f64::NEG_INFINITY;
    assert!(matches!(
        vg_growth::allocate(&q, &params),
        Err(AllocationError::InvalidParameter { field: "cmass_heart", .. })
    ));
}

#[test]
fn test_negative_and_zero_parameters_rejected() {
    let (pools, params) = scenario();
    let cases: [(&str, fn(&mut AllocationParams)); 5] = [
        ("bminc", |p| p.bminc = -0.1),
        ("ltor", |p| p.ltor = 0.0),
        ("height", |p| p.height = -1.0),
        ("k_latosa", |p| p.k_latosa = -6000.0),
        ("turnover.sap", |p| p.turnover.sap = 1.5),
    ];
    for (field, mutate) in cases {
        let mut p = params;
        mutate(&mut p);
        match vg_growth::allocate(&pools, &p) {
            Err(AllocationError::InvalidParameter { field: f, .. }) => assert_eq!(f, field),
            other => panic!("{}: 期望 InvalidParameter, 实际 {:?}", field, other),
        }
    }
}

#[test]
fn test_debt_larger_than_wood_rejected() {
    let (mut pools, params) = scenario();
    pools.cmass_debt = 15.5;
    assert!(matches!(
        vg_growth::allocate(&pools, &params),
        Err(AllocationError::InvalidParameter { field: "cmass_debt", .. })
    ));

    // 恰好等于木质部时允许
    pools.cmass_debt = 15.0;
    assert_safe(&pools, &params, &vg_growth::allocate(&pools, &params));
}

// ============================================================
// 极端但有效的输入
// ============================================================

#[test]
fn test_empty_sapling() {
    let (_, mut params) = scenario();
    params.bminc = 0.5;
    let pools = PlantPools::default();
    assert_safe(&pools, &params, &vg_growth::allocate(&pools, &params));
}

#[test]
fn test_huge_increment() {
    let (pools, mut params) = scenario();
    params.bminc = 1e6;
    assert_safe(&pools, &params, &vg_growth::allocate(&pools, &params));
}

#[test]
fn test_extreme_ltor() {
    let (pools, mut params) = scenario();
    for ltor in [1e-6, 1e-3, 1e3, 1e6] {
        params.ltor = ltor;
        assert_safe(&pools, &params, &vg_growth::allocate(&pools, &params));
    }
}

#[test]
fn test_full_turnover() {
    let (pools, mut params) = scenario();
    params.turnover = TurnoverRates {
        leaf: 1.0,
        root: 1.0,
        sap: 1.0,
    };
    let outcome = vg_growth::allocate(&pools, &params);
    assert_safe(&pools, &params, &outcome);

    if let Ok(result) = outcome {
        assert!(result.litter_leaf_inc >= pools.cmass_leaf - 1e-12);
        assert!(result.litter_root_inc >= pools.cmass_root - 1e-12);
    }
}

#[test]
fn test_random_extreme_magnitudes() {
    let mut rng = thread_rng();
    let kernel = AllocationKernel::default();

    for _ in 0..300 {
        let scale = 10f64.powi(rng.gen_range(-6..6));
        let pools = PlantPools {
            cmass_leaf: rng.gen_range(0.0..1.0) * scale,
            cmass_root: rng.gen_range(0.0..1.0) * scale,
            cmass_sap: rng.gen_range(0.0..10.0) * scale,
            cmass_debt: 0.0,
            cmass_heart: rng.gen_range(0.0..20.0) * scale,
        };
        let (_, mut params) = scenario();
        params.bminc = rng.gen_range(0.0..1.0) * scale;
        params.ltor = rng.gen_range(0.05..5.0);
        params.height = rng.gen_range(0.0..50.0);

        let outcome = kernel.allocate(&pools, &params);
        assert_safe(&pools, &params, &outcome);
    }
}

// ============================================================
// 并发
// ============================================================

#[test]
fn test_concurrent_calls_are_deterministic() {
    let (pools, params) = scenario();
    let kernel = AllocationKernel::default();
    let reference = kernel.allocate(&pools, &params).unwrap();

    let results: Vec<_> = (0..256)
        .into_par_iter()
        .map(|_| kernel.allocate(&pools, &params).unwrap())
        .collect();

    assert!(results.iter().all(|r| *r == reference));
}

// crates/vg_ffi/src/lib.rs

//! # VegGrowth FFI (Layer 4)
//!
//! 分配核心的 C ABI 导出，供其他语言的宿主模型直接调用。
//! 所有函数遵循以下约定：
//!
//! - 返回 `VgStatus` 状态码
//! - 通过输出参数写回结果
//! - 对所有指针做 NULL 检查
//! - panic 不跨越 FFI 边界
//!
//! 未收敛时返回 `VgErrConvergence`，输出参数仍写入回退结果，
//! 调用方可选择接受。
//!
//! ## 线程安全
//!
//! 所有函数无共享状态，可从任意线程并发调用。

use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};

use vg_growth::{
    allocate, AllocationError, AllocationParams, AllocationResult, Lifeform, PlantPools,
    TurnoverRates,
};

/// 状态码
///
/// `VgOk` (0) 表示成功，其余为失败。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VgStatus {
    /// 成功
    VgOk = 0,
    /// 必需的指针为 NULL
    VgErrNullPointer = 1,
    /// 输入违反前置条件（含未知生活型编码）
    VgErrInvalidParameter = 2,
    /// 求根未收敛（输出为回退结果）
    VgErrConvergence = 3,
    /// 内部错误
    VgErrInternal = 4,
}

/// 完整分配输入
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VgAllocationInput {
    /// 本步碳增量
    pub bminc: f64,
    /// 叶碳
    pub cmass_leaf: f64,
    /// 细根碳
    pub cmass_root: f64,
    /// 边材碳
    pub cmass_sap: f64,
    /// 碳债务
    pub cmass_debt: f64,
    /// 心材碳
    pub cmass_heart: f64,
    /// 叶根比
    pub ltor: f64,
    /// 株高
    pub height: f64,
    /// 比叶面积
    pub sla: f64,
    /// 木材密度
    pub wooddens: f64,
    /// 生活型（1 = 乔木，2 = 草本）
    pub lifeform: c_int,
    /// 管道模型常数
    pub k_latosa: f64,
    /// 异速系数
    pub k_allom2: f64,
    /// 异速指数
    pub k_allom3: f64,
    /// 叶周转率
    pub turnover_leaf: f64,
    /// 细根周转率
    pub turnover_root: f64,
    /// 边材周转率
    pub turnover_sap: f64,
}

/// 分配结果
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VgAllocationResult {
    /// 叶碳变化
    pub cmass_leaf_inc: f64,
    /// 细根碳变化
    pub cmass_root_inc: f64,
    /// 边材碳变化
    pub cmass_sap_inc: f64,
    /// 碳债务变化
    pub cmass_debt_inc: f64,
    /// 心材碳变化
    pub cmass_heart_inc: f64,
    /// 叶凋落物
    pub litter_leaf_inc: f64,
    /// 根凋落物
    pub litter_root_inc: f64,
    /// 未分配碳
    pub exceeds_cmass: f64,
}

impl From<AllocationResult> for VgAllocationResult {
    fn from(r: AllocationResult) -> Self {
        Self {
            cmass_leaf_inc: r.cmass_leaf_inc,
            cmass_root_inc: r.cmass_root_inc,
            cmass_sap_inc: r.cmass_sap_inc,
            cmass_debt_inc: r.cmass_debt_inc,
            cmass_heart_inc: r.cmass_heart_inc,
            litter_leaf_inc: r.litter_leaf_inc,
            litter_root_inc: r.litter_root_inc,
            exceeds_cmass: r.exceeds_cmass,
        }
    }
}

impl VgAllocationInput {
    fn to_kernel(self) -> Option<(PlantPools, AllocationParams)> {
        let lifeform = Lifeform::from_code(self.lifeform)?;
        let pools = PlantPools {
            cmass_leaf: self.cmass_leaf,
            cmass_root: self.cmass_root,
            cmass_sap: self.cmass_sap,
            cmass_debt: self.cmass_debt,
            cmass_heart: self.cmass_heart,
        };
        let params = AllocationParams {
            bminc: self.bminc,
            ltor: self.ltor,
            height: self.height,
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
        Some((pools, params))
    }
}

/// 运行分配核心，返回状态码与要写出的结果
fn run_kernel(input: VgAllocationInput) -> (VgStatus, Option<VgAllocationResult>) {
    let Some((pools, params)) = input.to_kernel() else {
        return (VgStatus::VgErrInvalidParameter, None);
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| allocate(&pools, &params)));
    match outcome {
        Ok(Ok(result)) => (VgStatus::VgOk, Some(result.into())),
        Ok(Err(AllocationError::ConvergenceFailure { fallback, .. })) => {
            (VgStatus::VgErrConvergence, Some(fallback.into()))
        }
        Ok(Err(AllocationError::InvalidParameter { .. })) => {
            (VgStatus::VgErrInvalidParameter, None)
        }
        Err(_) => (VgStatus::VgErrInternal, None),
    }
}

/// 计算本步分配（标量参数版本）
///
/// 参数顺序与宿主模型原有的分配例程一致。
///
/// # Returns
/// - `VgOk`: 成功，输出已写入
/// - `VgErrConvergence`: 未收敛，输出为回退结果
/// - `VgErrInvalidParameter`: 输入无效，输出未修改
/// - `VgErrNullPointer`: 任一输出指针为 NULL，输出未修改
///
/// # Safety
/// - 所有输出指针必须非 NULL 且指向可写的 `f64`
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn vg_allocation(
    bminc: f64,
    cmass_leaf: f64,
    cmass_root: f64,
    cmass_sap: f64,
    cmass_debt: f64,
    cmass_heart: f64,
    ltor: f64,
    height: f64,
    sla: f64,
    wooddens: f64,
    lifeform: c_int,
    k_latosa: f64,
    k_allom2: f64,
    k_allom3: f64,
    cmass_leaf_inc_out: *mut f64,
    cmass_root_inc_out: *mut f64,
    cmass_sap_inc_out: *mut f64,
    cmass_debt_inc_out: *mut f64,
    cmass_heart_inc_out: *mut f64,
    litter_leaf_inc_out: *mut f64,
    litter_root_inc_out: *mut f64,
    exceeds_cmass_out: *mut f64,
) -> VgStatus {
    let outputs = [
        cmass_leaf_inc_out,
        cmass_root_inc_out,
        cmass_sap_inc_out,
        cmass_debt_inc_out,
        cmass_heart_inc_out,
        litter_leaf_inc_out,
        litter_root_inc_out,
        exceeds_cmass_out,
    ];
    if outputs.iter().any(|p| p.is_null()) {
        return VgStatus::VgErrNullPointer;
    }

    let input = VgAllocationInput {
        bminc,
        cmass_leaf,
        cmass_root,
        cmass_sap,
        cmass_debt,
        cmass_heart,
        ltor,
        height,
        sla,
        wooddens,
        lifeform,
        k_latosa,
        k_allom2,
        k_allom3,
        ..Default::default()
    };

    let (status, result) = run_kernel(input);
    if let Some(r) = result {
        let values = [
            r.cmass_leaf_inc,
            r.cmass_root_inc,
            r.cmass_sap_inc,
            r.cmass_debt_inc,
            r.cmass_heart_inc,
            r.litter_leaf_inc,
            r.litter_root_inc,
            r.exceeds_cmass,
        ];
        for (ptr, value) in outputs.into_iter().zip(values) {
            *ptr = value;
        }
    }
    status
}

/// 计算本步分配（结构体版本，含周转率）
///
/// # Safety
/// - `input` 必须指向有效的 `VgAllocationInput`
/// - `result_out` 必须指向可写的 `VgAllocationResult`
#[no_mangle]
pub unsafe extern "C" fn vg_allocation_result(
    input: *const VgAllocationInput,
    result_out: *mut VgAllocationResult,
) -> VgStatus {
    if input.is_null() || result_out.is_null() {
        return VgStatus::VgErrNullPointer;
    }

    let (status, result) = run_kernel(*input);
    if let Some(r) = result {
        *result_out = r;
    }
    status
}

/// 状态码对应的描述
///
/// # Safety
/// - 总是安全
/// - 返回的字符串在程序生命周期内有效
#[no_mangle]
pub unsafe extern "C" fn vg_status_message(status: VgStatus) -> *const c_char {
    let msg = match status {
        VgStatus::VgOk => "Success\0",
        VgStatus::VgErrNullPointer => "NULL pointer argument\0",
        VgStatus::VgErrInvalidParameter => "Invalid allocation parameter\0",
        VgStatus::VgErrConvergence => "Allocation solver did not converge\0",
        VgStatus::VgErrInternal => "Internal error\0",
    };

    msg.as_ptr() as *const c_char
}

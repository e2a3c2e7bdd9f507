// crates/vg_growth/src/numerics/root_finding.rs
//! 一维区间求根
//!
//! 在已知变号区间 `[lo, hi]` 内求解 `f(x) = 0`，支持泛型标量 `S: Float`。
//!
//! # 求解器类型
//!
//! - [`Bisection`]: 二分法，每步区间减半，稳健
//! - [`Illinois`]: Illinois 修正试位法，超线性收敛
//!
//! 区间由 [`scan_for_sign_change`] 在粗网格上逐段扫描得到。
//!
//! # 使用示例
//!
//! ```
//! use vg_growth::numerics::{scan_for_sign_change, Bisection, BracketingSolver, RootFinderConfig, ScanOutcome};
//!
//! let mut f = |x: f64| x * x - 2.0;
//! let bracket = match scan_for_sign_change(&mut f, 0.0, 2.0, 4) {
//!     ScanOutcome::Bracketed(b) => b,
//!     _ => unreachable!(),
//! };
//! let result = Bisection::new(RootFinderConfig::default()).solve(&mut f, bracket);
//! assert!(result.is_converged());
//! assert!((result.root - 2f64.sqrt()).abs() < 1e-8);
//! ```

use num_traits::Float;
use serde::{Deserialize, Serialize};
use vg_config::{RootMethod, SolverSettings};

// ============================================================================
// 配置
// ============================================================================

/// 求根器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootFinderConfig {
    /// x 方向容差（相对于 `max(1, |x|)`）
    pub xacc: f64,
    /// 残差绝对容差
    pub yacc: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 是否打印迭代信息
    pub verbose: bool,
}

impl Default for RootFinderConfig {
    fn default() -> Self {
        Self {
            xacc: 1e-10,
            yacc: 1e-10,
            max_iter: 64,
            verbose: false,
        }
    }
}

impl RootFinderConfig {
    /// 创建配置
    pub fn new(xacc: f64, yacc: f64, max_iter: usize) -> Self {
        Self {
            xacc,
            yacc,
            max_iter,
            verbose: false,
        }
    }
}

impl From<&SolverSettings> for RootFinderConfig {
    fn from(settings: &SolverSettings) -> Self {
        Self {
            xacc: settings.xacc,
            yacc: settings.yacc,
            max_iter: settings.max_iterations,
            verbose: settings.verbose,
        }
    }
}

// ============================================================================
// 结果
// ============================================================================

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 区间两端同号
    NoSignChange,
    /// 残差出现 NaN 或无穷
    NonFinite,
}

/// 求根结果
#[derive(Debug, Clone, Copy)]
pub struct RootResult<S: Float> {
    /// 求解状态
    pub status: SolverStatus,
    /// 根（未收敛时为残差最小的迭代点）
    pub root: S,
    /// `f(root)`
    pub residual: S,
    /// 迭代次数
    pub iterations: usize,
}

impl<S: Float> RootResult<S> {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    fn converged(root: S, residual: S, iterations: usize) -> Self {
        Self {
            status: SolverStatus::Converged,
            root,
            residual,
            iterations,
        }
    }
}

/// 变号区间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bracket<S: Float> {
    /// 左端点
    pub lo: S,
    /// `f(lo)`
    pub f_lo: S,
    /// 右端点
    pub hi: S,
    /// `f(hi)`
    pub f_hi: S,
}

impl<S: Float> Bracket<S> {
    /// 由任意顺序的两点构造，保证 `lo <= hi`
    pub fn new(a: S, fa: S, b: S, fb: S) -> Self {
        if a <= b {
            Self { lo: a, f_lo: fa, hi: b, f_hi: fb }
        } else {
            Self { lo: b, f_lo: fb, hi: a, f_hi: fa }
        }
    }

    /// 端点函数值是否异号（或任一端点恰为根）
    pub fn has_sign_change(&self) -> bool {
        opposite_signs(self.f_lo, self.f_hi) || self.f_lo == S::zero() || self.f_hi == S::zero()
    }

    /// 区间宽度
    pub fn width(&self) -> S {
        self.hi - self.lo
    }
}

#[inline]
fn opposite_signs<S: Float>(a: S, b: S) -> bool {
    (a < S::zero() && b > S::zero()) || (a > S::zero() && b < S::zero())
}

#[inline]
fn cast<S: Float>(value: f64) -> S {
    S::from(value).unwrap_or_else(S::epsilon)
}

#[inline]
fn x_tolerance<S: Float>(xacc: S, x: S) -> S {
    xacc * x.abs().max(S::one())
}

// ============================================================================
// 区间扫描
// ============================================================================

/// 区间扫描结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScanOutcome<S: Float> {
    /// 找到变号区间
    Bracketed(Bracket<S>),
    /// 整个扫描范围内未变号
    NoSignChange,
    /// 在 `x` 处函数值非有限
    NonFinite {
        /// 出现非有限值的位置
        x: S,
    },
}

/// 从 `from` 向 `to` 等分 `segments` 段扫描，返回第一个变号子区间
///
/// 起点处恰为零的函数值不视为变号，以便跳过平凡端点。
pub fn scan_for_sign_change<S, F>(f: &mut F, from: S, to: S, segments: usize) -> ScanOutcome<S>
where
    S: Float,
    F: FnMut(S) -> S,
{
    let segments = segments.max(1);
    let step = (to - from) / cast::<S>(segments as f64);

    let mut x_prev = from;
    let mut f_prev = f(from);
    if !f_prev.is_finite() {
        return ScanOutcome::NonFinite { x: from };
    }

    for k in 1..=segments {
        let x = if k == segments {
            to
        } else {
            from + step * cast::<S>(k as f64)
        };
        let fx = f(x);
        if !fx.is_finite() {
            return ScanOutcome::NonFinite { x };
        }
        if opposite_signs(f_prev, fx) || fx == S::zero() {
            return ScanOutcome::Bracketed(Bracket::new(x_prev, f_prev, x, fx));
        }
        x_prev = x;
        f_prev = fx;
    }

    ScanOutcome::NoSignChange
}

// ============================================================================
// 求解器接口
// ============================================================================

/// 区间求根器接口
pub trait BracketingSolver<S: Float> {
    /// 在变号区间内求根
    ///
    /// # 参数
    ///
    /// - `f`: 目标函数
    /// - `bracket`: 变号区间（端点函数值已求出）
    fn solve<F: FnMut(S) -> S>(&self, f: &mut F, bracket: Bracket<S>) -> RootResult<S>;

    /// 获取求解器名称
    fn name(&self) -> &'static str;
}

/// 端点检查：恰为根或不变号时直接返回
fn check_endpoints<S: Float>(bracket: &Bracket<S>, yacc: S) -> Option<RootResult<S>> {
    if bracket.f_lo.abs() <= yacc {
        return Some(RootResult::converged(bracket.lo, bracket.f_lo, 0));
    }
    if bracket.f_hi.abs() <= yacc {
        return Some(RootResult::converged(bracket.hi, bracket.f_hi, 0));
    }
    if !bracket.has_sign_change() {
        let (root, residual) = best_of(bracket.lo, bracket.f_lo, bracket.hi, bracket.f_hi);
        return Some(RootResult {
            status: SolverStatus::NoSignChange,
            root,
            residual,
            iterations: 0,
        });
    }
    None
}

#[inline]
fn best_of<S: Float>(a: S, fa: S, b: S, fb: S) -> (S, S) {
    if fa.abs() <= fb.abs() {
        (a, fa)
    } else {
        (b, fb)
    }
}

// ============================================================================
// 二分法
// ============================================================================

/// 二分法求解器
#[derive(Debug, Clone, Default)]
pub struct Bisection {
    config: RootFinderConfig,
}

impl Bisection {
    /// 创建求解器
    pub fn new(config: RootFinderConfig) -> Self {
        Self { config }
    }
}

impl<S: Float> BracketingSolver<S> for Bisection {
    fn solve<F: FnMut(S) -> S>(&self, f: &mut F, bracket: Bracket<S>) -> RootResult<S> {
        let xacc: S = cast(self.config.xacc);
        let yacc: S = cast(self.config.yacc);
        if let Some(done) = check_endpoints(&bracket, yacc) {
            return done;
        }

        let half = cast::<S>(0.5);
        let (mut a, mut fa) = (bracket.lo, bracket.f_lo);
        let (mut b, mut fb) = (bracket.hi, bracket.f_hi);

        for iter in 1..=self.config.max_iter {
            let mid = a + (b - a) * half;
            let fm = f(mid);

            if !fm.is_finite() {
                return RootResult {
                    status: SolverStatus::NonFinite,
                    root: mid,
                    residual: fm,
                    iterations: iter,
                };
            }

            if self.config.verbose {
                if let (Some(x), Some(r)) = (mid.to_f64(), fm.to_f64()) {
                    log::trace!("Bisection iter {}: x = {:.6e}, f = {:.6e}", iter, x, r);
                }
            }

            if fm.abs() <= yacc || (b - a) * half <= x_tolerance(xacc, mid) {
                return RootResult::converged(mid, fm, iter);
            }

            if opposite_signs(fa, fm) {
                b = mid;
                fb = fm;
            } else {
                a = mid;
                fa = fm;
            }
        }

        let (root, residual) = best_of(a, fa, b, fb);
        RootResult {
            status: SolverStatus::MaxIterationsReached,
            root,
            residual,
            iterations: self.config.max_iter,
        }
    }

    fn name(&self) -> &'static str {
        "Bisection"
    }
}

// ============================================================================
// Illinois 试位法
// ============================================================================

/// Illinois 修正试位法求解器
///
/// 当同一端点连续两次保留时将其函数值减半，避免经典试位法的单侧停滞。
#[derive(Debug, Clone, Default)]
pub struct Illinois {
    config: RootFinderConfig,
}

impl Illinois {
    /// 创建求解器
    pub fn new(config: RootFinderConfig) -> Self {
        Self { config }
    }
}

impl<S: Float> BracketingSolver<S> for Illinois {
    fn solve<F: FnMut(S) -> S>(&self, f: &mut F, bracket: Bracket<S>) -> RootResult<S> {
        let xacc: S = cast(self.config.xacc);
        let yacc: S = cast(self.config.yacc);
        if let Some(done) = check_endpoints(&bracket, yacc) {
            return done;
        }

        let half = cast::<S>(0.5);
        let (mut s, mut fs) = (bracket.lo, bracket.f_lo);
        let (mut t, mut ft) = (bracket.hi, bracket.f_hi);
        // -1: 上次保留了 s 端；1: 上次保留了 t 端
        let mut side = 0i8;
        let mut best = best_of(s, fs, t, ft);

        for iter in 1..=self.config.max_iter {
            let denom = ft - fs;
            let mut r = if denom == S::zero() {
                s + (t - s) * half
            } else {
                (s * ft - t * fs) / denom
            };
            // 舍入可能把插值点推出区间
            if !(r > s.min(t) && r < s.max(t)) {
                r = s + (t - s) * half;
            }
            let fr = f(r);

            if !fr.is_finite() {
                return RootResult {
                    status: SolverStatus::NonFinite,
                    root: r,
                    residual: fr,
                    iterations: iter,
                };
            }

            if self.config.verbose {
                if let (Some(x), Some(res)) = (r.to_f64(), fr.to_f64()) {
                    log::trace!("Illinois iter {}: x = {:.6e}, f = {:.6e}", iter, x, res);
                }
            }

            if fr.abs() < best.1.abs() {
                best = (r, fr);
            }

            if fr.abs() <= yacc {
                return RootResult::converged(r, fr, iter);
            }

            if opposite_signs(fr, fs) {
                t = r;
                ft = fr;
                if side == -1 {
                    fs = fs * half;
                }
                side = -1;
            } else {
                s = r;
                fs = fr;
                if side == 1 {
                    ft = ft * half;
                }
                side = 1;
            }

            if (t - s).abs() * half <= x_tolerance(xacc, r) {
                return RootResult::converged(best.0, best.1, iter);
            }
        }

        RootResult {
            status: SolverStatus::MaxIterationsReached,
            root: best.0,
            residual: best.1,
            iterations: self.config.max_iter,
        }
    }

    fn name(&self) -> &'static str {
        "Illinois"
    }
}

// ============================================================================
// 按配置分派
// ============================================================================

/// 按 [`RootMethod`] 选择求解器并求根，返回结果与求解器名称
pub fn solve_bracketed<S, F>(
    method: RootMethod,
    config: RootFinderConfig,
    f: &mut F,
    bracket: Bracket<S>,
) -> (RootResult<S>, &'static str)
where
    S: Float,
    F: FnMut(S) -> S,
{
    match method {
        RootMethod::Bisection => {
            let solver = Bisection::new(config);
            (solver.solve(f, bracket), BracketingSolver::<S>::name(&solver))
        }
        RootMethod::Illinois => {
            let solver = Illinois::new(config);
            (solver.solve(f, bracket), BracketingSolver::<S>::name(&solver))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic(x: f64) -> f64 {
        x * x * x - x - 2.0
    }

    fn bracket_of(f: fn(f64) -> f64, a: f64, b: f64) -> Bracket<f64> {
        Bracket::new(a, f(a), b, f(b))
    }

    #[test]
    fn test_bracket_orders_endpoints() {
        let b = Bracket::new(2.0, 1.0, 1.0, -1.0);
        assert_eq!(b.lo, 1.0);
        assert_eq!(b.f_lo, -1.0);
        assert!(b.has_sign_change());
        assert_eq!(b.width(), 1.0);
    }

    #[test]
    fn test_bisection_cubic() {
        let solver = Bisection::new(RootFinderConfig::default());
        let result = solver.solve(&mut cubic, bracket_of(cubic, 1.0, 2.0));
        assert!(result.is_converged());
        assert!((result.root - 1.521_379_706_804_567_6).abs() < 1e-8);
    }

    #[test]
    fn test_illinois_converges_faster() {
        let config = RootFinderConfig::default();
        let bracket = bracket_of(cubic, 1.0, 2.0);
        let bis = Bisection::new(config.clone()).solve(&mut cubic, bracket);
        let ill = Illinois::new(config).solve(&mut cubic, bracket);
        assert!(ill.is_converged());
        assert!((ill.root - bis.root).abs() < 1e-8);
        assert!(ill.iterations < bis.iterations);
    }

    #[test]
    fn test_max_iterations_reported() {
        let config = RootFinderConfig::new(1e-300, 1e-300, 3);
        let result = Bisection::new(config).solve(&mut cubic, bracket_of(cubic, 1.0, 2.0));
        assert_eq!(result.status, SolverStatus::MaxIterationsReached);
        assert_eq!(result.iterations, 3);
        assert!(result.root > 1.0 && result.root < 2.0);
    }

    #[test]
    fn test_no_sign_change() {
        let mut f = |x: f64| x * x + 1.0;
        let bracket = Bracket::new(-1.0, 2.0, 1.0, 2.0);
        let result = Illinois::default().solve(&mut f, bracket);
        assert_eq!(result.status, SolverStatus::NoSignChange);
    }

    #[test]
    fn test_endpoint_root() {
        let mut f = |x: f64| x - 1.0;
        let result = Bisection::default().solve(&mut f, Bracket::new(1.0, 0.0, 3.0, 2.0));
        assert!(result.is_converged());
        assert_eq!(result.iterations, 0);
        assert_eq!(result.root, 1.0);
    }

    #[test]
    fn test_non_finite_residual() {
        let mut f = |x: f64| if x > 0.4 && x < 0.6 { f64::NAN } else { x - 0.5 };
        let result = Bisection::default().solve(&mut f, Bracket::new(0.0, -0.5, 1.0, 0.5));
        assert_eq!(result.status, SolverStatus::NonFinite);
    }

    #[test]
    fn test_scan_descending() {
        let mut f = |x: f64| x - 0.35;
        match scan_for_sign_change(&mut f, 1.0, 0.0, 10) {
            ScanOutcome::Bracketed(b) => {
                assert!(b.lo <= 0.35 && b.hi >= 0.35);
                assert!(b.width() <= 0.1 + 1e-12);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scan_skips_zero_start() {
        let mut f = |x: f64| x * (x - 0.5);
        match scan_for_sign_change(&mut f, 0.0, 1.0, 4) {
            ScanOutcome::Bracketed(b) => assert!(b.lo >= 0.25 && b.hi <= 0.5),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_scan_outcomes() {
        let mut positive = |x: f64| x * x + 1.0;
        assert_eq!(
            scan_for_sign_change(&mut positive, -1.0, 1.0, 8),
            ScanOutcome::NoSignChange
        );
        let mut nan = |_: f64| f64::NAN;
        assert!(matches!(
            scan_for_sign_change(&mut nan, 0.0, 1.0, 8),
            ScanOutcome::NonFinite { .. }
        ));
    }

    #[test]
    fn test_generic_f32() {
        let mut f = |x: f32| x * x - 4.0;
        let config = RootFinderConfig::new(1e-6, 1e-6, 64);
        let (result, name) = solve_bracketed(
            RootMethod::Illinois,
            config,
            &mut f,
            Bracket::new(0.0f32, -4.0, 3.0, 5.0),
        );
        assert_eq!(name, "Illinois");
        assert!((result.root - 2.0).abs() < 1e-4);
    }
}

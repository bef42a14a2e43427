//! Row reduction kernels for `C = A·Bᵗ`.
//!
//! Every output element is the dot product of one row of A with one row of B.
//! How that dot product is computed is a [`ReductionKernel`]: the plain
//! element-by-element loop ([`BasicKernel`]) or the 8-wide unrolled loop with
//! per-remainder tails ([`UnrolledKernel`]). A kernel is resolved once per call
//! into a [`DotFn`], so the remainder is looked at once and never inside the
//! reduction.
//!
//! All arithmetic wraps on overflow, which keeps the two kernels bit-identical
//! for every input.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use num::traits::AsPrimitive;

use crate::error::{config_error, TransmulError};
use crate::matrix::MatRef;
use crate::simd::{I8x4, SimdLoad, SumDotProduct};

pub mod tail;

pub use tail::{dot_unrolled, tail_table, GROUP};

/// Dot product of two equally long rows, accumulated in `i32`.
pub type DotFn<T> = fn(&[T], &[T]) -> i32;

/// Matrix element types the kernels accept.
pub trait Element: AsPrimitive<i32> + Copy + Send + Sync + 'static {
    /// Returns `acc + Σ a[l] * b[l]` over the first four elements.
    fn dot4(a: &[Self], b: &[Self], acc: i32) -> i32;
}

impl Element for i8 {
    #[inline(always)]
    fn dot4(a: &[i8], b: &[i8], acc: i32) -> i32 {
        I8x4::load(a).sum_dot_p(I8x4::load(b), acc)
    }
}

impl Element for i32 {
    #[inline(always)]
    fn dot4(a: &[i32], b: &[i32], acc: i32) -> i32 {
        a[..4]
            .iter()
            .zip(&b[..4])
            .fold(acc, |sum, (&x, &y)| sum.wrapping_add(x.wrapping_mul(y)))
    }
}

/// Scalar multiply-accumulate in `i32`.
#[inline(always)]
pub(crate) fn mac<T: Element>(acc: i32, a: T, b: T) -> i32 {
    acc.wrapping_add(a.as_().wrapping_mul(b.as_()))
}

/// Plain O(n) dot product.
#[inline]
pub fn dot_basic<T: Element>(a: &[T], b: &[T]) -> i32 {
    a.iter().zip(b).fold(0i32, |sum, (&x, &y)| mac(sum, x, y))
}

/// A way of reducing one row of A against one row of B.
pub trait ReductionKernel<T: Element>: Send + Sync {
    /// Picks the dot routine for rows of length `n`.
    fn resolve(&self, n: usize) -> DotFn<T>;
}

/// Element-by-element reduction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicKernel;

/// 8-wide reduction with two accumulators and a tail specialized for `n % 8`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnrolledKernel;

impl<T: Element> ReductionKernel<T> for BasicKernel {
    fn resolve(&self, _n: usize) -> DotFn<T> {
        dot_basic::<T>
    }
}

impl<T: Element> ReductionKernel<T> for UnrolledKernel {
    fn resolve(&self, n: usize) -> DotFn<T> {
        tail_table::<T>()[n % GROUP]
    }
}

/// Which [`ReductionKernel`] a [`TransMul`](crate::TransMul) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// [`BasicKernel`].
    Basic,
    /// [`UnrolledKernel`].
    Unrolled,
}

impl Strategy {
    /// Strategy chosen when the crate was built (`TRANSMUL_KERNEL`).
    pub const BUILD_DEFAULT: Strategy = if cfg!(transmul_kernel = "basic") {
        Strategy::Basic
    } else {
        Strategy::Unrolled
    };

    /// Resolves the strategy into the dot routine for rows of length `n`.
    pub fn resolve<T: Element>(self, n: usize) -> DotFn<T> {
        match self {
            Strategy::Basic => ReductionKernel::<T>::resolve(&BasicKernel, n),
            Strategy::Unrolled => ReductionKernel::<T>::resolve(&UnrolledKernel, n),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Basic => "basic",
            Strategy::Unrolled => "unrolled",
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::BUILD_DEFAULT
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = TransmulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Strategy::Basic),
            "unrolled" | "optimized" => Ok(Strategy::Unrolled),
            other => Err(config_error(format!(
                "unknown reduction strategy `{other}` (expected `basic` or `unrolled`)"
            ))),
        }
    }
}

/// Writes rows `rows` of `C = A·Bᵗ` into `out`, which holds exactly those rows.
///
/// Every element of `out` is overwritten; nothing is accumulated.
pub(crate) fn reduce_rows<T: Element>(
    a: MatRef<'_, T>,
    b: MatRef<'_, T>,
    rows: Range<usize>,
    out: &mut [i32],
    dot: DotFn<T>,
) {
    let o = b.rows();
    debug_assert_eq!(out.len(), rows.len() * o);

    // chunks_exact_mut(0) panics; with no columns there is nothing to write
    if o == 0 {
        return;
    }

    for (i, c_row) in rows.zip(out.chunks_exact_mut(o)) {
        let a_row = a.row(i);
        for (k, c) in c_row.iter_mut().enumerate() {
            *c = dot(a_row, b.row(k));
        }
    }
}

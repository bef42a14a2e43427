//! Packed 4-lane signed 8-bit vector.
//!
//! `I8x4` models the 32-bit packed `v4s` register of DSP-extended RISC-V
//! cores: four `i8` lanes in one word, consumed by a single sum-of-dot-product
//! instruction. The portable implementation below keeps the lanes in a
//! 4-byte array, which LLVM lowers to widening multiply-adds (`pmaddubsw`/
//! `pmaddwd` on x86, `sdot`/`smlal` on AArch64) when the surrounding loop
//! allows it.
//!
//! # Supported Operations
//!
//! - `load()` via [`SimdLoad`]
//! - `dot_p()`, `sum_dot_p()` via [`SumDotProduct`]

use crate::simd::traits::{SimdLoad, SumDotProduct};

/// Number of `i8` lanes in one packed word.
pub const LANE_COUNT: usize = 4;

/// Four packed `i8` lanes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct I8x4 {
    /// Lane values, lane 0 first.
    pub elements: [i8; LANE_COUNT],
}

impl I8x4 {
    /// Builds a vector from explicit lane values.
    #[inline(always)]
    pub const fn new(elements: [i8; LANE_COUNT]) -> Self {
        Self { elements }
    }
}

impl SimdLoad<i8> for I8x4 {
    #[inline(always)]
    fn load(slice: &[i8]) -> Self {
        Self::new([slice[0], slice[1], slice[2], slice[3]])
    }
}

impl SumDotProduct for I8x4 {
    #[inline(always)]
    fn dot_p(self, rhs: Self) -> i32 {
        // |Σ| <= 4 * 128 * 128, no overflow possible
        self.elements
            .iter()
            .zip(rhs.elements.iter())
            .map(|(&a, &b)| i32::from(a) * i32::from(b))
            .sum()
    }

    #[inline(always)]
    fn sum_dot_p(self, rhs: Self, acc: i32) -> i32 {
        acc.wrapping_add(self.dot_p(rhs))
    }
}

//! Packed-integer SIMD building blocks.
//!
//! The reduction kernels only need one primitive: a 4-lane `i8` dot product
//! accumulated into an `i32`. It is expressed through the [`SimdLoad`] and
//! [`SumDotProduct`] traits so the kernels stay independent of how the lanes
//! are held.

pub mod i8x4;

pub mod traits;

pub use i8x4::I8x4;
pub use traits::{SimdLoad, SumDotProduct};

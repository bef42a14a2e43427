//! # transmul
//!
//! Transposed integer matrix multiplication, `C = A·Bᵗ`, for 8-bit and 32-bit
//! operands with 32-bit accumulation.
//!
//! The right operand is stored transposed, so every output element is the dot
//! product of two contiguous rows. Two reduction strategies are provided:
//!
//! - [`BasicKernel`]: one multiply-accumulate per element.
//! - [`UnrolledKernel`]: 8 elements per step, split over two accumulators as
//!   two packed 4-lane dot products, with a tail specialized for `N mod 8`.
//!
//! The parallel entry points split the rows of C statically over a team of
//! units forked on an [`ExecutionEnv`]; [`RayonTeam`] is the hosted
//! implementation.
//!
//! ```rust
//! use transmul::{mat_mult_trans_i8_parallel, RayonTeam};
//!
//! let team = RayonTeam::new(4).unwrap();
//! let a = [1i8, 2, 3, 4];
//! let b = [5i8, 6, 7, 8];
//! let mut c = [0i32; 4];
//!
//! let report = mat_mult_trans_i8_parallel(&team, &a, &b, 2, 2, 2, 4, &mut c).unwrap();
//! assert_eq!(c, [17, 23, 39, 53]);
//! assert_eq!(report.arrived, 4);
//! ```
//!
//! ## Build-time strategy
//!
//! `TRANSMUL_KERNEL=basic cargo build` makes [`BasicKernel`] the default of
//! [`Strategy::BUILD_DEFAULT`]; anything else keeps the unrolled kernel.

pub mod config;
pub mod error;
pub mod kernel;
pub mod matmul;
pub mod matrix;
pub mod partition;
pub mod simd;
pub mod team;

pub use config::KernelConfig;
pub use error::{Result, TransmulError};
pub use kernel::{BasicKernel, DotFn, Element, ReductionKernel, Strategy, UnrolledKernel};
pub use matmul::{
    mat_mult_trans_i32, mat_mult_trans_i32_parallel, mat_mult_trans_i8,
    mat_mult_trans_i8_parallel, mat_mult_trans_unit, KernelArgs, TransMul,
};
pub use matrix::{MatMut, MatRef};
pub use partition::RowPartition;
pub use team::{Domain, ExecutionEnv, ForkReport, RayonTeam, UnitCtx};

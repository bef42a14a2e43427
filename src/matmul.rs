//! Transposed matrix multiplication `C = A·Bᵗ`.
//!
//! A is `M x N`, B is stored transposed as `O x N` (row `k` of B is column `k`
//! of the logical right operand) and C is `M x O`, all row-major. Each output
//! element is
//!
//! ```text
//! C[i][k] = A[i][0]*B[k][0] + A[i][1]*B[k][1] + ... + A[i][N-1]*B[k][N-1]
//! ```
//!
//! accumulated in `i32` with wrapping on overflow. C is always fully
//! overwritten.
//!
//! # Parallel execution
//!
//! The parallel entry points fork one unit per granted team member. Every unit
//! reads the same immutable [`KernelArgs`], derives its row range from its
//! index and the team size with [`RowPartition`], and writes only its own
//! slice of C. The fork returns once all units have arrived, so C is complete
//! when the call returns.
//!
//! # Example
//!
//! ```rust
//! use transmul::mat_mult_trans_i8;
//!
//! let a = [1i8, 2, 3, 4]; // 2 x 2
//! let b = [5i8, 6, 7, 8]; // 2 x 2, transposed
//! let mut c = [0i32; 4];
//!
//! mat_mult_trans_i8(&a, &b, 2, 2, 2, &mut c).unwrap();
//! assert_eq!(c, [17, 23, 39, 53]);
//! ```

use std::fmt;

use tracing::{debug, trace, warn};

use crate::config::KernelConfig;
use crate::error::{dimension_mismatch, Result, TransmulError};
use crate::kernel::{reduce_rows, DotFn, Element, Strategy};
use crate::matrix::{MatMut, MatRef};
use crate::partition::RowPartition;
use crate::team::{Domain, ExecutionEnv, ForkReport, UnitCtx};

/// Arguments shared by every unit of one parallel call.
///
/// Built once before the fork and only ever borrowed immutably by the units.
/// C is not part of it: each unit receives its own disjoint slice of C.
#[derive(Clone, Copy)]
pub struct KernelArgs<'a, T> {
    /// `M x N` left operand.
    pub a: MatRef<'a, T>,
    /// `O x N` transposed right operand.
    pub b: MatRef<'a, T>,
    /// Units requested by the caller.
    pub n_pe: usize,
    /// Dot routine resolved for this call's `N`.
    pub dot: DotFn<T>,
}

impl<T: Element> KernelArgs<'_, T> {
    #[inline]
    pub fn m(&self) -> usize {
        self.a.rows()
    }

    #[inline]
    pub fn n(&self) -> usize {
        self.a.cols()
    }

    #[inline]
    pub fn o(&self) -> usize {
        self.b.rows()
    }
}

impl<T: fmt::Debug> fmt::Debug for KernelArgs<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelArgs")
            .field("a", &self.a)
            .field("b", &self.b)
            .field("n_pe", &self.n_pe)
            .finish_non_exhaustive()
    }
}

fn ensure_cluster<E: ExecutionEnv>(env: &E) -> Result<()> {
    let domain = env.domain();
    if domain != Domain::Cluster {
        warn!(%domain, "parallel processing supported only for cluster side");
        return Err(TransmulError::WrongDomain { domain });
    }
    Ok(())
}

fn check_shapes<T>(a: &MatRef<'_, T>, b: &MatRef<'_, T>, c: &MatMut<'_>) -> Result<()> {
    if b.cols() != a.cols() {
        return Err(dimension_mismatch("B columns", a.cols(), b.cols()));
    }
    if c.rows() != a.rows() {
        return Err(dimension_mismatch("C rows", a.rows(), c.rows()));
    }
    if c.cols() != b.rows() {
        return Err(dimension_mismatch("C columns", b.rows(), c.cols()));
    }
    Ok(())
}

/// Body run by every unit of a parallel call.
///
/// `out` holds exactly the rows the unit owns. A unit without rows returns
/// straight away and still counts as arrived.
pub fn mat_mult_trans_unit<T: Element>(
    args: &KernelArgs<'_, T>,
    ctx: UnitCtx,
    out: &mut [i32],
) {
    // Partitioned by the team actually running, which may be smaller than n_pe
    let rows = match RowPartition::new(args.m(), ctx.team_size) {
        Ok(partition) => partition.range(ctx.index),
        Err(_) => return,
    };
    trace!(
        unit = ctx.index,
        team = ctx.team_size,
        start = rows.start,
        end = rows.end,
        "unit rows"
    );
    reduce_rows(args.a, args.b, rows, out, args.dot);
}

/// Multiplies with a chosen strategy on a chosen host.
///
/// ```rust
/// use transmul::{KernelConfig, MatMut, MatRef, RayonTeam, Strategy, TransMul};
///
/// let engine = TransMul::new(
///     RayonTeam::new(2).unwrap(),
///     KernelConfig::default().with_strategy(Strategy::Basic).with_units(2),
/// );
///
/// let a = [1i32, 2, 3, 4, 5, 6]; // 3 x 2
/// let b = [1i32, 0, 0, 1];       // 2 x 2 identity
/// let mut c = [0i32; 6];
/// engine
///     .parallel(
///         MatRef::new(&a, 3, 2).unwrap(),
///         MatRef::new(&b, 2, 2).unwrap(),
///         MatMut::new(&mut c, 3, 2).unwrap(),
///     )
///     .unwrap();
/// assert_eq!(c, a);
/// ```
#[derive(Debug)]
pub struct TransMul<E> {
    env: E,
    config: KernelConfig,
}

impl<E: ExecutionEnv> TransMul<E> {
    pub fn new(env: E, config: KernelConfig) -> Self {
        Self { env, config }
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Single-unit `C = A·Bᵗ`. Runs on any domain.
    pub fn sequential<T: Element>(
        &self,
        a: MatRef<'_, T>,
        b: MatRef<'_, T>,
        mut c: MatMut<'_>,
    ) -> Result<()> {
        check_shapes(&a, &b, &c)?;
        let dot = self.config.strategy.resolve::<T>(a.cols());
        reduce_rows(a, b, 0..a.rows(), c.as_mut_slice(), dot);
        Ok(())
    }

    /// `C = A·Bᵗ` on a team of `config.units` units.
    pub fn parallel<T: Element>(
        &self,
        a: MatRef<'_, T>,
        b: MatRef<'_, T>,
        c: MatMut<'_>,
    ) -> Result<ForkReport> {
        self.parallel_with_units(a, b, c, self.config.units)
    }

    /// `C = A·Bᵗ` on a team of `n_pe` requested units.
    ///
    /// # Errors
    ///
    /// - [`TransmulError::WrongDomain`] when called off the cluster; the
    ///   diagnostic is logged and no buffer is touched.
    /// - [`TransmulError::DimensionMismatch`] for inconsistent shapes.
    /// - [`TransmulError::InvalidUnits`] for `n_pe == 0`.
    pub fn parallel_with_units<T: Element>(
        &self,
        a: MatRef<'_, T>,
        b: MatRef<'_, T>,
        mut c: MatMut<'_>,
        n_pe: usize,
    ) -> Result<ForkReport> {
        ensure_cluster(&self.env)?;
        check_shapes(&a, &b, &c)?;
        if n_pe == 0 {
            return Err(TransmulError::InvalidUnits(n_pe));
        }

        let granted = self.env.granted_units(n_pe);
        if granted < n_pe {
            warn!(requested = n_pe, granted, "host granted a smaller team");
        }
        let partition = RowPartition::new(a.rows(), granted)?;

        let args = KernelArgs {
            a,
            b,
            n_pe,
            dot: self.config.strategy.resolve::<T>(a.cols()),
        };
        debug!(
            m = args.m(),
            n = args.n(),
            o = args.o(),
            strategy = %self.config.strategy,
            units = granted,
            step = partition.step(),
            "forking transposed matmul"
        );

        let o = args.o();
        let work = partition.split_rows_mut(c.as_mut_slice(), o);
        let report = self
            .env
            .fork(work, |ctx, out| mat_mult_trans_unit(&args, ctx, out));

        debug_assert_eq!(report.arrived, report.team_size);
        Ok(report)
    }
}

fn sequential<T: Element>(
    a: &[T],
    b: &[T],
    m: usize,
    n: usize,
    o: usize,
    c: &mut [i32],
) -> Result<()> {
    let a = MatRef::new(a, m, n)?;
    let b = MatRef::new(b, o, n)?;
    let mut c = MatMut::new(c, m, o)?;
    let dot = Strategy::BUILD_DEFAULT.resolve::<T>(n);
    reduce_rows(a, b, 0..m, c.as_mut_slice(), dot);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn parallel<T: Element, E: ExecutionEnv>(
    env: &E,
    a: &[T],
    b: &[T],
    m: usize,
    n: usize,
    o: usize,
    n_pe: usize,
    c: &mut [i32],
) -> Result<ForkReport> {
    // Reject before looking at the buffers
    ensure_cluster(env)?;

    let engine = TransMul {
        env,
        config: KernelConfig {
            strategy: Strategy::BUILD_DEFAULT,
            units: n_pe,
        },
    };
    engine.parallel(
        MatRef::new(a, m, n)?,
        MatRef::new(b, o, n)?,
        MatMut::new(c, m, o)?,
    )
}

/// Sequential `C = A·Bᵗ` for 8-bit matrices using packed 4-lane dot products.
///
/// `a` is `m x n`, `b` is `o x n`, `c` holds at least `m x o` elements.
pub fn mat_mult_trans_i8(
    a: &[i8],
    b: &[i8],
    m: usize,
    n: usize,
    o: usize,
    c: &mut [i32],
) -> Result<()> {
    sequential(a, b, m, n, o, c)
}

/// Sequential `C = A·Bᵗ` for 32-bit matrices.
pub fn mat_mult_trans_i32(
    a: &[i32],
    b: &[i32],
    m: usize,
    n: usize,
    o: usize,
    c: &mut [i32],
) -> Result<()> {
    sequential(a, b, m, n, o, c)
}

/// Parallel `C = A·Bᵗ` for 8-bit matrices on `n_pe` units of `env`.
///
/// Must be called from the cluster domain; elsewhere it logs
/// `parallel processing supported only for cluster side` and returns
/// [`TransmulError::WrongDomain`] without touching `c`.
#[allow(clippy::too_many_arguments)]
pub fn mat_mult_trans_i8_parallel<E: ExecutionEnv>(
    env: &E,
    a: &[i8],
    b: &[i8],
    m: usize,
    n: usize,
    o: usize,
    n_pe: usize,
    c: &mut [i32],
) -> Result<ForkReport> {
    parallel(env, a, b, m, n, o, n_pe, c)
}

/// Parallel `C = A·Bᵗ` for 32-bit matrices on `n_pe` units of `env`.
#[allow(clippy::too_many_arguments)]
pub fn mat_mult_trans_i32_parallel<E: ExecutionEnv>(
    env: &E,
    a: &[i32],
    b: &[i32],
    m: usize,
    n: usize,
    o: usize,
    n_pe: usize,
    c: &mut [i32],
) -> Result<ForkReport> {
    parallel(env, a, b, m, n, o, n_pe, c)
}

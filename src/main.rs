//! Driver for the transposed matmul kernels.
//!
//! Generates seeded random operands, runs the sequential and the parallel
//! kernel on them and checks that both agree.
//!
//! ```bash
//! transmul --m 256 --n 100 --o 64 --units 4 --strategy basic -v
//! RUST_LOG=transmul=trace transmul --precision i32
//! ```

use std::time::Instant;

use clap::{Parser, ValueEnum};
use rand::distr::uniform::SampleUniform;
use rand::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use transmul::{Element, KernelConfig, MatMut, MatRef, RayonTeam, Strategy, TransMul};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Precision {
    I8,
    I32,
}

/// Transposed integer matrix multiplication, C = A·Bᵗ
#[derive(Debug, Parser)]
#[command(name = "transmul")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Rows of A and C
    #[arg(long, default_value_t = 128)]
    m: usize,

    /// Shared inner dimension
    #[arg(long, default_value_t = 100)]
    n: usize,

    /// Rows of B, columns of C
    #[arg(long, default_value_t = 64)]
    o: usize,

    /// Units requested for the parallel run [env: TRANSMUL_UNITS]
    #[arg(short, long)]
    units: Option<usize>,

    /// Reduction strategy, `basic` or `unrolled` [env: TRANSMUL_STRATEGY]
    #[arg(short, long)]
    strategy: Option<Strategy>,

    /// Element type of A and B
    #[arg(short, long, value_enum, default_value_t = Precision::I8)]
    precision: Precision,

    /// Seed for the random operands
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn random_matrix<T>(rows: usize, cols: usize, lo: T, hi: T, rng: &mut StdRng) -> Vec<T>
where
    T: SampleUniform + Copy + PartialOrd,
{
    (0..rows * cols).map(|_| rng.random_range(lo..=hi)).collect()
}

fn run<T: Element>(
    engine: &TransMul<RayonTeam>,
    cli: &Cli,
    a: &[T],
    b: &[T],
) -> transmul::Result<bool> {
    let (m, n, o) = (cli.m, cli.n, cli.o);
    let mut c_seq = vec![0i32; m * o];
    let mut c_par = vec![0i32; m * o];

    let start = Instant::now();
    engine.sequential(
        MatRef::new(a, m, n)?,
        MatRef::new(b, o, n)?,
        MatMut::new(&mut c_seq, m, o)?,
    )?;
    let sequential = start.elapsed();

    let start = Instant::now();
    let report = engine.parallel(
        MatRef::new(a, m, n)?,
        MatRef::new(b, o, n)?,
        MatMut::new(&mut c_par, m, o)?,
    )?;
    let parallel = start.elapsed();

    info!(?sequential, "sequential run");
    info!(
        ?parallel,
        units = report.team_size,
        arrived = report.arrived,
        "parallel run"
    );

    Ok(c_seq == c_par)
}

fn main() -> transmul::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = KernelConfig::from_env()?;
    if let Some(strategy) = cli.strategy {
        config = config.with_strategy(strategy);
    }
    if let Some(units) = cli.units {
        config = config.with_units(units);
    }

    let team = RayonTeam::new(config.units.max(1))?;
    let engine = TransMul::new(team, config);
    info!(
        m = cli.m,
        n = cli.n,
        o = cli.o,
        precision = ?cli.precision,
        strategy = %config.strategy,
        units = config.units,
        "multiplying"
    );

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let agree = match cli.precision {
        Precision::I8 => {
            let a = random_matrix(cli.m, cli.n, i8::MIN, i8::MAX, &mut rng);
            let b = random_matrix(cli.o, cli.n, i8::MIN, i8::MAX, &mut rng);
            run(&engine, &cli, &a, &b)?
        }
        Precision::I32 => {
            let a = random_matrix(cli.m, cli.n, -1000i32, 1000, &mut rng);
            let b = random_matrix(cli.o, cli.n, -1000i32, 1000, &mut rng);
            run(&engine, &cli, &a, &b)?
        }
    };

    if agree {
        info!("sequential and parallel results agree");
    } else {
        error!("sequential and parallel results differ");
        std::process::exit(1);
    }
    Ok(())
}

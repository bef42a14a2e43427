use std::sync::atomic::{AtomicUsize, Ordering};

use rand::prelude::*;
use transmul::{
    mat_mult_trans_i32, mat_mult_trans_i32_parallel, mat_mult_trans_i8,
    mat_mult_trans_i8_parallel, Domain, ExecutionEnv, ForkReport, KernelConfig, MatMut, MatRef,
    RayonTeam, Strategy, TransMul, TransmulError, UnitCtx,
};

fn random_i8(len: usize, rng: &mut StdRng) -> Vec<i8> {
    (0..len).map(|_| rng.random::<i8>()).collect()
}

fn random_i32(len: usize, rng: &mut StdRng) -> Vec<i32> {
    (0..len).map(|_| rng.random_range(-5000..5000)).collect()
}

/// Wraps a team and records every unit that ran.
struct CountingEnv {
    inner: RayonTeam,
    entered: AtomicUsize,
}

impl ExecutionEnv for CountingEnv {
    fn domain(&self) -> Domain {
        self.inner.domain()
    }

    fn granted_units(&self, requested: usize) -> usize {
        self.inner.granted_units(requested)
    }

    fn fork<W, I, F>(&self, work: I, entry: F) -> ForkReport
    where
        W: Send,
        I: IntoIterator<Item = W>,
        I::IntoIter: ExactSizeIterator + Send,
        F: Fn(UnitCtx, W) + Sync,
    {
        self.inner.fork(work, |ctx, item| {
            self.entered.fetch_add(1, Ordering::Relaxed);
            entry(ctx, item)
        })
    }
}

#[test]
fn test_i8_parallel_matches_sequential_for_many_team_sizes() {
    let team = RayonTeam::new(8).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let (m, n, o) = (10, 37, 6);
    let a = random_i8(m * n, &mut rng);
    let b = random_i8(o * n, &mut rng);

    let mut expected = vec![0i32; m * o];
    mat_mult_trans_i8(&a, &b, m, n, o, &mut expected).unwrap();

    // 3 does not divide 10, 8 leaves trailing units with few rows
    for n_pe in [1, 2, 3, 4, 8] {
        let mut c = vec![i32::MIN; m * o];
        let report = mat_mult_trans_i8_parallel(&team, &a, &b, m, n, o, n_pe, &mut c).unwrap();
        assert_eq!(report.team_size, n_pe);
        assert_eq!(c, expected, "n_pe = {n_pe}");
    }
}

#[test]
fn test_i32_parallel_matches_sequential() {
    let team = RayonTeam::new(3).unwrap();
    let mut rng = StdRng::seed_from_u64(2);
    let (m, n, o) = (7, 12, 5);
    let a = random_i32(m * n, &mut rng);
    let b = random_i32(o * n, &mut rng);

    let mut expected = vec![0i32; m * o];
    mat_mult_trans_i32(&a, &b, m, n, o, &mut expected).unwrap();

    for n_pe in 1..=3 {
        let mut c = vec![-1i32; m * o];
        mat_mult_trans_i32_parallel(&team, &a, &b, m, n, o, n_pe, &mut c).unwrap();
        assert_eq!(c, expected, "n_pe = {n_pe}");
    }
}

#[test]
fn test_more_units_than_rows() {
    let team = RayonTeam::new(6).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    let (m, n, o) = (2, 9, 3);
    let a = random_i8(m * n, &mut rng);
    let b = random_i8(o * n, &mut rng);

    let mut expected = vec![0i32; m * o];
    mat_mult_trans_i8(&a, &b, m, n, o, &mut expected).unwrap();

    let mut c = vec![0i32; m * o];
    let report = mat_mult_trans_i8_parallel(&team, &a, &b, m, n, o, 6, &mut c).unwrap();
    assert_eq!(report, ForkReport { team_size: 6, arrived: 6 });
    assert_eq!(c, expected);
}

#[test]
fn test_units_without_rows_still_arrive() {
    let env = CountingEnv {
        inner: RayonTeam::new(4).unwrap(),
        entered: AtomicUsize::new(0),
    };
    let mut c = [5i32; 3];
    let report = mat_mult_trans_i8_parallel(&env, &[], &[1, 2, 3], 0, 1, 3, 4, &mut c).unwrap();

    assert_eq!(report, ForkReport { team_size: 4, arrived: 4 });
    assert_eq!(env.entered.load(Ordering::Relaxed), 4);
    assert_eq!(c, [5; 3]);
}

#[test]
fn test_smaller_granted_team_still_covers_every_row() {
    let team = RayonTeam::new(2).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let (m, n, o) = (9, 16, 4);
    let a = random_i8(m * n, &mut rng);
    let b = random_i8(o * n, &mut rng);

    let mut expected = vec![0i32; m * o];
    mat_mult_trans_i8(&a, &b, m, n, o, &mut expected).unwrap();

    let mut c = vec![i32::MAX; m * o];
    let report = mat_mult_trans_i8_parallel(&team, &a, &b, m, n, o, 5, &mut c).unwrap();
    assert_eq!(report.team_size, 2);
    assert_eq!(c, expected);
}

#[test]
fn test_zero_operand_overwrites_sentinel_in_parallel() {
    let team = RayonTeam::new(4).unwrap();
    let (m, n, o) = (9, 11, 3);
    let a = vec![0i8; m * n];
    let mut rng = StdRng::seed_from_u64(5);
    let b = random_i8(o * n, &mut rng);

    for n_pe in [1, 3, 4] {
        let mut c = vec![i32::MIN; m * o];
        mat_mult_trans_i8_parallel(&team, &a, &b, m, n, o, n_pe, &mut c).unwrap();
        assert!(c.iter().all(|&x| x == 0), "n_pe = {n_pe}");
    }
}

#[test]
fn test_strategies_agree_in_parallel() {
    let mut rng = StdRng::seed_from_u64(6);
    let (m, n, o) = (13, 45, 7);
    let a = random_i8(m * n, &mut rng);
    let b = random_i8(o * n, &mut rng);

    let mut results = Vec::new();
    for strategy in [Strategy::Basic, Strategy::Unrolled] {
        let engine = TransMul::new(
            RayonTeam::new(3).unwrap(),
            KernelConfig::default().with_strategy(strategy).with_units(3),
        );
        let mut c = vec![0i32; m * o];
        engine
            .parallel(
                MatRef::new(&a, m, n).unwrap(),
                MatRef::new(&b, o, n).unwrap(),
                MatMut::new(&mut c, m, o).unwrap(),
            )
            .unwrap();
        results.push(c);
    }
    assert_eq!(results[0], results[1]);
}

#[test]
fn test_fabric_controller_is_rejected() {
    let team = RayonTeam::new(2)
        .unwrap()
        .with_domain(Domain::FabricController);
    let mut c = [3i32; 4];

    let err = mat_mult_trans_i32_parallel(&team, &[1, 2, 3, 4], &[5, 6, 7, 8], 2, 2, 2, 2, &mut c)
        .unwrap_err();
    assert!(matches!(
        err,
        TransmulError::WrongDomain {
            domain: Domain::FabricController
        }
    ));
    assert!(err.to_string().contains("supported only for cluster side"));
    assert_eq!(c, [3; 4]);

    // Sequential entry points run anywhere
    let engine = TransMul::new(team, KernelConfig::default());
    let a = [1i8, 2, 3, 4];
    let b = [5i8, 6, 7, 8];
    engine
        .sequential(
            MatRef::new(&a, 2, 2).unwrap(),
            MatRef::new(&b, 2, 2).unwrap(),
            MatMut::new(&mut c, 2, 2).unwrap(),
        )
        .unwrap();
    assert_eq!(c, [17, 23, 39, 53]);
}

#[test]
fn test_wrong_domain_checked_before_shapes() {
    let team = RayonTeam::new(1)
        .unwrap()
        .with_domain(Domain::FabricController);
    let mut c = [0i32; 1];
    assert!(matches!(
        mat_mult_trans_i8_parallel(&team, &[1, 2, 3], &[1], 4, 4, 4, 1, &mut c),
        Err(TransmulError::WrongDomain { .. })
    ));
}

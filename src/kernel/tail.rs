//! 8-wide unrolled dot products with per-remainder tails.
//!
//! A reduction of length `n` is split into `n / 8` full groups and a tail of
//! `n % 8` elements. Each group feeds two independent accumulators, one per
//! packed half, so consecutive groups do not wait on each other. The tail is
//! folded into the first accumulator by code specialized for its exact length;
//! `R` is a const generic, so every tail is unrolled and branch-free and the
//! group loop never looks at the remainder.
//!
//! | `R` | tail treatment                              |
//! |-----|---------------------------------------------|
//! | 0   | nothing                                     |
//! | 1-3 | scalar multiply-adds                        |
//! | 4   | one packed 4-lane dot product               |
//! | 5-7 | one packed dot product, then 1-3 scalar MACs |

use super::{mac, DotFn, Element};

/// Elements consumed per unrolled step.
pub const GROUP: usize = 8;

const HALF: usize = GROUP / 2;

#[inline(always)]
fn finish_tail<T: Element, const R: usize>(a: &[T], b: &[T], acc: i32) -> i32 {
    debug_assert_eq!(a.len(), R);
    debug_assert_eq!(b.len(), R);

    if R >= HALF {
        let acc = T::dot4(&a[..HALF], &b[..HALF], acc);
        a[HALF..]
            .iter()
            .zip(&b[HALF..])
            .fold(acc, |sum, (&x, &y)| mac(sum, x, y))
    } else {
        a.iter().zip(b).fold(acc, |sum, (&x, &y)| mac(sum, x, y))
    }
}

/// Dot product of two rows whose common length `n` satisfies `n % 8 == R`.
///
/// Only the trailing `R` elements are read by the tail, so rows shorter than a
/// full group are handled without touching memory past their end.
#[inline]
pub fn dot_unrolled<T: Element, const R: usize>(a: &[T], b: &[T]) -> i32 {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len() % GROUP, R);

    let body = a.len() - R;
    let (a_body, a_tail) = a.split_at(body);
    let (b_body, b_tail) = b.split_at(body);

    let mut sum1 = 0i32;
    let mut sum2 = 0i32;
    for (ga, gb) in a_body.chunks_exact(GROUP).zip(b_body.chunks_exact(GROUP)) {
        sum1 = T::dot4(&ga[..HALF], &gb[..HALF], sum1);
        sum2 = T::dot4(&ga[HALF..], &gb[HALF..], sum2);
    }

    let sum1 = finish_tail::<T, R>(a_tail, b_tail, sum1);
    sum1.wrapping_add(sum2)
}

/// One unrolled dot routine per remainder, indexed by `n % GROUP`.
pub fn tail_table<T: Element>() -> [DotFn<T>; GROUP] {
    [
        dot_unrolled::<T, 0>,
        dot_unrolled::<T, 1>,
        dot_unrolled::<T, 2>,
        dot_unrolled::<T, 3>,
        dot_unrolled::<T, 4>,
        dot_unrolled::<T, 5>,
        dot_unrolled::<T, 6>,
        dot_unrolled::<T, 7>,
    ]
}

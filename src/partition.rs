//! Static row partitioning across a team of units.
//!
//! Rows are handed out in chunks of `step = ceil(rows / units)`; unit `u` owns
//! `[step * u, step * (u + 1))` clamped to the matrix, and the last unit always
//! runs to the final row. The ranges are contiguous, ascending and disjoint,
//! and their union is `[0, rows)`. When there are fewer rows than units, the
//! trailing units get empty ranges.

use std::ops::Range;

use crate::error::{Result, TransmulError};

/// Split of `rows` output rows over `units` cooperating units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPartition {
    rows: usize,
    units: usize,
    step: usize,
}

impl RowPartition {
    /// # Errors
    ///
    /// Returns [`TransmulError::InvalidUnits`] when `units == 0`.
    pub fn new(rows: usize, units: usize) -> Result<Self> {
        if units == 0 {
            return Err(TransmulError::InvalidUnits(units));
        }
        Ok(Self {
            rows,
            units,
            step: rows.div_ceil(units),
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Rows per unit for every unit except possibly the last.
    #[inline]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Row range owned by `unit`.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if `unit >= units`.
    #[inline]
    pub fn range(&self, unit: usize) -> Range<usize> {
        debug_assert!(unit < self.units, "unit {unit} outside team of {}", self.units);

        let start = (self.step * unit).min(self.rows);
        let end = if unit + 1 == self.units {
            self.rows
        } else {
            (start + self.step).min(self.rows)
        };
        start..end
    }

    /// Every unit's range, in unit order.
    pub fn ranges(&self) -> impl ExactSizeIterator<Item = Range<usize>> + '_ {
        (0..self.units).map(move |unit| self.range(unit))
    }

    /// Splits a row-major buffer of `row_len`-wide rows into one slice per unit.
    ///
    /// Always yields exactly `units` slices, empty ones included, so every unit
    /// of a team receives its share even when it has no rows.
    ///
    /// # Panics
    ///
    /// Panics if `out` is shorter than `rows * row_len`.
    pub fn split_rows_mut<'c, E>(
        &self,
        out: &'c mut [E],
        row_len: usize,
    ) -> impl ExactSizeIterator<Item = &'c mut [E]> + Send + 'c
    where
        E: Send,
    {
        let partition = *self;
        let mut rest = out;
        (0..partition.units).map(move |unit| {
            let len = partition.range(unit).len() * row_len;
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(len);
            rest = tail;
            head
        })
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn assert_covers(p: &RowPartition) {
        let mut next = 0;
        for r in p.ranges() {
            assert_eq!(r.start, next, "gap or overlap in {p:?}");
            assert!(r.start <= r.end);
            next = r.end;
        }
        assert_eq!(next, p.rows(), "rows left uncovered in {p:?}");
    }

    #[test]
    fn test_zero_units_rejected() {
        assert!(matches!(
            RowPartition::new(10, 0),
            Err(TransmulError::InvalidUnits(0))
        ));
    }

    #[test]
    fn test_even_split() {
        let p = RowPartition::new(8, 4).unwrap();
        assert_eq!(p.ranges().collect::<Vec<_>>(), vec![0..2, 2..4, 4..6, 6..8]);
    }

    #[test]
    fn test_uneven_split_last_unit_is_short() {
        let p = RowPartition::new(10, 3).unwrap();
        assert_eq!(p.step(), 4);
        assert_eq!(p.ranges().collect::<Vec<_>>(), vec![0..4, 4..8, 8..10]);
    }

    #[test]
    fn test_more_units_than_rows() {
        let p = RowPartition::new(5, 4).unwrap();
        assert_eq!(p.ranges().collect::<Vec<_>>(), vec![0..2, 2..4, 4..5, 5..5]);

        let p = RowPartition::new(2, 8).unwrap();
        let ranges: Vec<_> = p.ranges().collect();
        assert_eq!(ranges[..2], [0..1, 1..2]);
        assert!(ranges[2..].iter().all(|r| r.is_empty()));
        assert_covers(&p);
    }

    #[test]
    fn test_no_rows() {
        let p = RowPartition::new(0, 3).unwrap();
        assert!(p.ranges().all(|r| r.is_empty()));
    }

    #[test]
    fn test_split_rows_mut_follows_ranges() {
        let p = RowPartition::new(5, 4).unwrap();
        let mut out = [0u8; 15];
        let lens: Vec<usize> = p.split_rows_mut(&mut out, 3).map(|s| s.len()).collect();
        assert_eq!(lens, vec![6, 6, 3, 0]);
    }

    #[test]
    fn test_split_rows_mut_zero_width() {
        let p = RowPartition::new(4, 2).unwrap();
        let mut out: [u8; 0] = [];
        assert_eq!(p.split_rows_mut(&mut out, 0).count(), 2);
    }

    #[test]
    fn test_split_rows_mut_slices_are_disjoint() {
        let p = RowPartition::new(7, 3).unwrap();
        let mut out = [0usize; 14];
        for (unit, slice) in p.split_rows_mut(&mut out, 2).enumerate() {
            slice.fill(unit + 1);
        }
        assert_eq!(out, [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2, 2, 3, 3]);
    }

    proptest! {
        #[test]
        fn prop_ranges_partition_rows(rows in 0usize..500, units in 1usize..40) {
            let p = RowPartition::new(rows, units).unwrap();
            prop_assert_eq!(p.ranges().len(), units);

            let mut next = 0;
            for r in p.ranges() {
                prop_assert_eq!(r.start, next);
                prop_assert!(r.len() <= p.step());
                next = r.end;
            }
            prop_assert_eq!(next, rows);
        }
    }
}

//! Single-pass traversal primitives over a flat buffer.
//!
//! Every range pulls values through a caller supplied accessor
//! (`offset -> value`) and knows nothing about geometry. Bounds are half-open:
//! `end` is never read, `start == end` yields nothing, and once a range
//! reports `None` the accessor is not called again.

use std::iter::FusedIterator;

/// `start, start + increment, ...` while below `end`.
pub struct SimpleRange<F> {
    accessor: F,
    next: usize,
    end: usize,
    increment: usize,
}

impl<F> SimpleRange<F> {
    pub fn new(accessor: F, start: usize, end: usize, increment: usize) -> Self {
        Self {
            accessor,
            next: start,
            end,
            increment: increment.max(1),
        }
    }
}

impl<F: FnMut(usize) -> V, V> Iterator for SimpleRange<F> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        if self.next >= self.end {
            return None;
        }
        let value = (self.accessor)(self.next);
        self.next = self.next.saturating_add(self.increment);
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next).div_ceil(self.increment);
        (remaining, Some(remaining))
    }
}

impl<F: FnMut(usize) -> V, V> FusedIterator for SimpleRange<F> {}

/// A nested two dimensional loop flattened into stride arithmetic.
///
/// The inner loop takes `count_max` steps of `increment`; the outer loop then
/// moves the cursor to `count_increment` past the start of the previous inner
/// run. `reverse_outer` walks the outer loop from `end` back to `start`,
/// `reverse_inner` walks every inner run backwards. With the right strides
/// this covers every transposition/mirroring of a 2D plane inside a 3D
/// buffer.
///
/// The number of outer runs is derived from `end`, a partial last run
/// included, since a transposed walk revisits offsets below `end` long before
/// it is done. Positions outside `[start, end)` are stepped over without a
/// read.
pub struct CountedRange<F> {
    accessor: F,
    next: i64,
    start: i64,
    end: i64,
    increment: i64,
    final_count_increment: i64,
    count: usize,
    count_max: usize,
    remaining: usize,
}

impl<F> CountedRange<F> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accessor: F,
        start: usize,
        end: usize,
        increment: usize,
        count_max: usize,
        count_increment: usize,
        reverse_outer: bool,
        reverse_inner: bool,
    ) -> Self {
        let count_max = count_max.max(1);
        let (start, end) = (start as i64, end as i64);
        let mut increment = increment as i64;
        let mut count_increment = count_increment as i64;
        let inner_span = (count_max as i64 - 1) * increment;

        let span = end - 1 - start;
        let runs = if span < 0 {
            0
        } else if span <= inner_span || count_increment == 0 {
            1
        } else {
            (span - inner_span + count_increment - 1) / count_increment + 1
        };

        let mut next = start;
        if reverse_outer {
            let last_run = start + (runs - 1).max(0) * count_increment;
            count_increment = -count_increment;
            if reverse_inner {
                next = last_run + inner_span;
                increment = -increment;
            } else {
                next = last_run;
            }
        } else if reverse_inner {
            next = start + inner_span;
            increment = -increment;
        }
        let final_count_increment = count_increment - count_max as i64 * increment;

        Self {
            accessor,
            next,
            start,
            end,
            increment,
            final_count_increment,
            count: 0,
            count_max,
            remaining: runs as usize * count_max,
        }
    }
}

impl<F: FnMut(usize) -> V, V> Iterator for CountedRange<F> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        while self.remaining > 0 {
            let position = self.next;
            self.remaining -= 1;
            self.next += self.increment;
            self.count += 1;
            if self.count == self.count_max {
                self.count = 0;
                self.next += self.final_count_increment;
            }
            if (self.start..self.end).contains(&position) {
                return Some((self.accessor)(position as usize));
            }
        }
        None
    }
}

impl<F: FnMut(usize) -> V, V> FusedIterator for CountedRange<F> {}

/// Walks one rectangular window of a row-major buffer: after every
/// `region_size` values the cursor skips `region_offset` extra units.
pub struct RegionRange<F> {
    accessor: F,
    next: usize,
    end: usize,
    increment: usize,
    region_size: usize,
    region_offset: usize,
    region_count: usize,
}

impl<F> RegionRange<F> {
    pub fn new(
        accessor: F,
        start: usize,
        end: usize,
        increment: usize,
        region_size: usize,
        region_offset: usize,
    ) -> Self {
        Self {
            accessor,
            next: start,
            end,
            increment,
            region_size: region_size.max(1),
            region_offset,
            region_count: 0,
        }
    }
}

impl<F: FnMut(usize) -> V, V> Iterator for RegionRange<F> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        if self.next >= self.end {
            return None;
        }
        let value = (self.accessor)(self.next);
        self.next += self.increment;
        self.region_count += 1;
        if self.region_count == self.region_size {
            self.region_count = 0;
            self.next += self.region_offset;
        }
        Some(value)
    }
}

impl<F: FnMut(usize) -> V, V> FusedIterator for RegionRange<F> {}

/// One output row of a [`MultiRegionRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegionSpan {
    /// Offset applied when entering this row (ignored for the first row,
    /// which starts at the range start).
    pub lead: usize,
    /// Number of values emitted for this row.
    pub size: usize,
    /// Offset applied when leaving this row.
    pub trail: usize,
}

impl RegionSpan {
    pub fn new(lead: usize, size: usize, trail: usize) -> Self {
        Self { lead, size, trail }
    }
}

/// Like [`RegionRange`] but every row has its own bounds.
pub struct MultiRegionRange<F> {
    accessor: F,
    next: usize,
    end: usize,
    increment: usize,
    regions: Vec<RegionSpan>,
    region: usize,
    region_count: usize,
}

impl<F> MultiRegionRange<F> {
    pub fn new(
        accessor: F,
        start: usize,
        end: usize,
        increment: usize,
        regions: Vec<RegionSpan>,
    ) -> Self {
        let mut range = Self {
            accessor,
            next: start,
            end,
            increment,
            regions,
            region: 0,
            region_count: 0,
        };
        range.skip_empty_regions();
        range
    }

    /// Crosses rows that emit nothing, trail and following lead included.
    fn skip_empty_regions(&mut self) {
        while let Some(current) = self.regions.get(self.region) {
            if current.size != 0 {
                break;
            }
            self.next += current.trail;
            self.region += 1;
            if let Some(following) = self.regions.get(self.region) {
                self.next += following.lead;
            }
        }
    }
}

impl<F: FnMut(usize) -> V, V> Iterator for MultiRegionRange<F> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        if self.next >= self.end {
            return None;
        }
        let value = (self.accessor)(self.next);
        self.next += self.increment;
        self.region_count += 1;
        if let Some(current) = self.regions.get(self.region) {
            if self.region_count == current.size {
                self.region_count = 0;
                self.next += current.trail;
                self.region += 1;
                // start of the next row, if any
                if let Some(following) = self.regions.get(self.region) {
                    self.next += following.lead;
                }
                self.skip_empty_regions();
            }
        }
        Some(value)
    }
}

impl<F: FnMut(usize) -> V, V> FusedIterator for MultiRegionRange<F> {}

/// Three component range: emits `[c0, c1, c2]` per step.
///
/// Interleaved buffers keep the components adjacent and step by
/// `3 * increment`; planar buffers hold three equally sized component blocks
/// between `start` and `end` and step inside the first block. A trailing
/// partial triple is never read.
pub struct Vector3Range<F> {
    accessor: F,
    next: usize,
    end: usize,
    increment: usize,
    component_stride: usize,
}

impl<F> Vector3Range<F> {
    pub fn new(accessor: F, start: usize, end: usize, increment: usize, planar: bool) -> Self {
        let increment = increment.max(1);
        let (end, increment, component_stride) = if planar {
            let stride = end.saturating_sub(start) / 3;
            (start + stride, increment, stride)
        } else {
            let whole = end.saturating_sub(start) / 3 * 3;
            (start + whole, increment * 3, 1)
        };
        Self {
            accessor,
            next: start,
            end,
            increment,
            component_stride,
        }
    }
}

impl<F: FnMut(usize) -> V, V> Iterator for Vector3Range<F> {
    type Item = [V; 3];

    fn next(&mut self) -> Option<[V; 3]> {
        if self.next >= self.end {
            return None;
        }
        let value = [
            (self.accessor)(self.next),
            (self.accessor)(self.next + self.component_stride),
            (self.accessor)(self.next + 2 * self.component_stride),
        ];
        self.next += self.increment;
        Some(value)
    }
}

impl<F: FnMut(usize) -> V, V> FusedIterator for Vector3Range<F> {}

/// The scalar ranges behind a single type.
pub enum ScalarRange<F> {
    Simple(SimpleRange<F>),
    Counted(CountedRange<F>),
    Region(RegionRange<F>),
    MultiRegion(MultiRegionRange<F>),
}

impl<F: FnMut(usize) -> V, V> Iterator for ScalarRange<F> {
    type Item = V;

    fn next(&mut self) -> Option<V> {
        match self {
            ScalarRange::Simple(range) => range.next(),
            ScalarRange::Counted(range) => range.next(),
            ScalarRange::Region(range) => range.next(),
            ScalarRange::MultiRegion(range) => range.next(),
        }
    }
}

impl<F: FnMut(usize) -> V, V> FusedIterator for ScalarRange<F> {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn identity(offset: usize) -> usize {
        offset
    }

    #[test]
    fn simple_range_steps_by_increment() {
        let values: Vec<_> = SimpleRange::new(identity, 2, 9, 3).collect();
        assert_eq!(values, vec![2, 5, 8]);
        assert_eq!(SimpleRange::new(identity, 4, 4, 1).count(), 0);
    }

    #[test]
    fn exhausted_range_does_not_read_again() {
        let calls = Cell::new(0);
        let mut range = SimpleRange::new(
            |offset: usize| {
                calls.set(calls.get() + 1);
                offset
            },
            0,
            2,
            1,
        );
        assert_eq!(range.next(), Some(0));
        assert_eq!(range.next(), Some(1));
        assert_eq!(range.next(), None);
        assert_eq!(range.next(), None);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn counted_range_transposes() {
        // 3 columns x 2 rows, walked column by column
        let values: Vec<_> = CountedRange::new(identity, 0, 6, 3, 2, 1, false, false).collect();
        assert_eq!(values, vec![0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn counted_range_reversals() {
        let walk = |reverse_outer, reverse_inner| -> Vec<usize> {
            CountedRange::new(identity, 0, 6, 1, 3, 3, reverse_outer, reverse_inner).collect()
        };
        assert_eq!(walk(false, false), vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(walk(true, false), vec![3, 4, 5, 0, 1, 2]);
        assert_eq!(walk(false, true), vec![2, 1, 0, 5, 4, 3]);
        assert_eq!(walk(true, true), vec![5, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn counted_range_inside_a_larger_buffer() {
        // rows of a 4x3 slice at slice 1 of a 4x3x2 volume, outer step = slice
        // size: a sagittal-like walk over column 1 of both slices
        let values: Vec<_> = CountedRange::new(identity, 1, 1 + 12 + 8 + 1, 4, 3, 12, true, false)
            .collect();
        assert_eq!(values, vec![13, 17, 21, 1, 5, 9]);
    }

    #[test]
    fn counted_range_keeps_a_partial_last_run() {
        let buffer: Vec<usize> = (0..10).collect();
        let walk = |reverse_outer| -> Vec<usize> {
            CountedRange::new(|o: usize| buffer[o], 0, 10, 1, 3, 4, reverse_outer, false).collect()
        };
        assert_eq!(walk(false), vec![0, 1, 2, 4, 5, 6, 8, 9]);
        assert_eq!(walk(true), vec![8, 9, 4, 5, 6, 0, 1, 2]);
    }

    #[test]
    fn empty_counted_range() {
        for (reverse_outer, reverse_inner) in [(false, false), (true, false), (false, true), (true, true)] {
            let mut range = CountedRange::new(identity, 5, 5, 1, 3, 3, reverse_outer, reverse_inner);
            assert_eq!(range.next(), None);
        }
    }

    #[test]
    fn region_range_skips_after_each_region() {
        let values: Vec<_> = RegionRange::new(identity, 0, 9, 1, 3, 1).collect();
        assert_eq!(values, vec![0, 1, 2, 4, 5, 6, 8]);
    }

    #[test]
    fn multi_region_range_follows_row_bounds() {
        // 5 columns: row 0 -> [1, 3), row 1 -> [0, 4), row 2 -> [2, 3)
        let regions = vec![
            RegionSpan::new(1, 2, 5 - 3),
            RegionSpan::new(0, 4, 5 - 4),
            RegionSpan::new(2, 1, 5 - 3),
        ];
        let values: Vec<_> = MultiRegionRange::new(identity, 1, 13, 1, regions).collect();
        assert_eq!(values, vec![1, 2, 5, 6, 7, 8, 12]);
    }

    #[test]
    fn multi_region_range_crosses_empty_rows() {
        let regions = vec![RegionSpan::new(0, 0, 2), RegionSpan::new(1, 2, 0)];
        let values: Vec<_> = MultiRegionRange::new(identity, 0, 5, 1, regions).collect();
        assert_eq!(values, vec![3, 4]);

        // an empty row in the middle
        let regions = vec![
            RegionSpan::new(0, 1, 1),
            RegionSpan::new(0, 0, 1),
            RegionSpan::new(0, 1, 0),
        ];
        let values: Vec<_> = MultiRegionRange::new(identity, 0, 4, 1, regions).collect();
        assert_eq!(values, vec![0, 3]);
    }

    #[test]
    fn vector3_interleaved() {
        let buffer = ['r', 'g', 'b', 'R', 'G', 'B'];
        let values: Vec<_> = Vector3Range::new(|o: usize| buffer[o], 0, 6, 1, false).collect();
        assert_eq!(values, vec![['r', 'g', 'b'], ['R', 'G', 'B']]);
    }

    #[test]
    fn vector3_interleaved_ignores_a_partial_triple() {
        let highest = Cell::new(0);
        let values: Vec<_> = Vector3Range::new(
            |offset: usize| {
                highest.set(highest.get().max(offset));
                offset
            },
            0,
            7,
            1,
            false,
        )
        .collect();
        assert_eq!(values, vec![[0, 1, 2], [3, 4, 5]]);
        assert_eq!(highest.get(), 5);
    }

    #[test]
    fn vector3_planar() {
        let buffer = ['r', 'R', 'g', 'G', 'b', 'B'];
        let values: Vec<_> = Vector3Range::new(|o: usize| buffer[o], 0, 6, 1, true).collect();
        assert_eq!(values, vec![['r', 'g', 'b'], ['R', 'G', 'B']]);
    }

    #[test]
    fn scalar_range_delegates() {
        let range = ScalarRange::Region(RegionRange::new(identity, 0, 6, 1, 2, 1));
        assert_eq!(range.collect::<Vec<_>>(), vec![0, 1, 3, 4]);
    }
}

//! Value ranges and histogram of an image, computed lazily and cached until
//! the buffer or the rescale state changes.

use std::collections::BTreeMap;

use log::debug;
use web_time::Instant;

use crate::image::Image;
use crate::image::Sample;
use crate::rsi::RsiState;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataRange {
    pub min: f64,
    pub max: f64,
}

impl DataRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn empty() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn include(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    fn or_zero(self) -> Self {
        if self.min > self.max {
            Self::new(0.0, 0.0)
        } else {
            self
        }
    }
}

/// Sample counts per bucket; the bucket of a value is `floor(rescaled)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Histogram(BTreeMap<i64, usize>);

impl Histogram {
    fn add(&mut self, value: f64) {
        *self.0.entry(value.floor() as i64).or_insert(0) += 1;
    }

    /// Count of the bucket holding `value`.
    pub fn count(&self, value: f64) -> usize {
        self.0.get(&(value.floor() as i64)).copied().unwrap_or(0)
    }

    /// Non-empty buckets in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i64, usize)> + '_ {
        self.0.iter().map(|(&bucket, &count)| (bucket, count))
    }

    /// Number of non-empty buckets.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn to_vec(&self) -> Vec<(i64, usize)> {
        self.iter().collect()
    }

    /// Every bucket from the lowest to the highest one, empty ones included.
    pub fn dense(&self) -> Vec<(i64, usize)> {
        let (Some((&first, _)), Some((&last, _))) =
            (self.0.first_key_value(), self.0.last_key_value())
        else {
            return Vec::new();
        };
        (first..=last)
            .map(|bucket| (bucket, self.0.get(&bucket).copied().unwrap_or(0)))
            .collect()
    }
}

impl<T: Sample> Image<T> {
    /// Number of samples in the first time frame.
    fn first_frame_len(&self) -> usize {
        let size = self.geometry.size();
        let len = size.dim_size(3) * self.number_of_components;
        len.min(self.buffer.len())
    }

    /// Raw minimum and maximum. Only the first time frame is scanned.
    pub fn data_range(&self) -> DataRange {
        if let Some(range) = self.data_range.get() {
            return range;
        }
        let mut range = DataRange::empty();
        for value in &self.buffer[..self.first_frame_len()] {
            range.include(value.to_f64_lossy());
        }
        let range = range.or_zero();
        self.data_range.set(Some(range));
        range
    }

    /// Rescaled minimum and maximum, over the first time frame like
    /// [`Image::data_range`].
    pub fn rescaled_data_range(&self) -> DataRange {
        if let Some(range) = self.rescaled_data_range.get() {
            return range;
        }
        let range = if self.is_identity_rsi {
            self.data_range()
        } else if let RsiState::Constant(rsi) = &self.rsi {
            // a negative slope swaps the bounds
            let raw = self.data_range();
            let (a, b) = (rsi.apply(raw.min), rsi.apply(raw.max));
            DataRange::new(a.min(b), a.max(b))
        } else {
            let mut range = DataRange::empty();
            for offset in 0..self.first_frame_len() {
                range.include(self.rescaled_value_at_offset(offset));
            }
            range.or_zero()
        };
        self.rescaled_data_range.set(Some(range));
        range
    }

    /// Histogram of the rescaled values of the whole buffer.
    ///
    /// The scan also yields the raw and rescaled ranges of the whole buffer,
    /// which replace the cached first-frame ranges.
    pub fn histogram(&self) -> &Histogram {
        self.histogram.get_or_init(|| {
            let started = Instant::now();
            let mut histogram = Histogram::default();
            let mut raw = DataRange::empty();
            let mut rescaled = DataRange::empty();
            for (offset, value) in self.buffer.iter().enumerate() {
                raw.include(value.to_f64_lossy());
                let value = self.rescaled_value_at_offset(offset);
                rescaled.include(value);
                histogram.add(value);
            }
            self.data_range.set(Some(raw.or_zero()));
            self.rescaled_data_range.set(Some(rescaled.or_zero()));
            debug!(
                "histogram: {} buckets over {} samples in {:?}",
                histogram.len(),
                self.buffer.len(),
                started.elapsed()
            );
            histogram
        })
    }
}

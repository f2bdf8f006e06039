//! Plans traversals of an image's buffer for display and measurement.
//!
//! The planners turn an image, a cursor position and an optional view
//! orientation into one of the primitives of [`crate::iterators`], so that
//! draining the result yields values row by row from the top-left pixel of the
//! requested plane.

use log::debug;
use log::warn;

use crate::error::ImageError;
use crate::geometry::Index;
use crate::geometry::Size;
use crate::geometry::ViewOrientation;
use crate::image::Image;
use crate::image::Sample;
use crate::iterators::CountedRange;
use crate::iterators::MultiRegionRange;
use crate::iterators::RegionRange;
use crate::iterators::RegionSpan;
use crate::iterators::ScalarRange;
use crate::iterators::SimpleRange;
use crate::iterators::Vector3Range;

/// Offset to value function bound to an image.
pub type Accessor<'a> = Box<dyn Fn(usize) -> f64 + 'a>;

/// A single value pulled from a [`SliceValues`] traversal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SliceValue {
    Scalar(f64),
    Vector([f64; 3]),
}

/// Traversal over one plane: scalar for single component images, triples for
/// three component images.
pub enum SliceValues<'a> {
    Scalar(ScalarRange<Accessor<'a>>),
    Vector(Vector3Range<Accessor<'a>>),
}

impl SliceValues<'_> {
    pub fn is_vector(&self) -> bool {
        matches!(self, SliceValues::Vector(_))
    }
}

impl Iterator for SliceValues<'_> {
    type Item = SliceValue;

    fn next(&mut self) -> Option<SliceValue> {
        match self {
            SliceValues::Scalar(range) => range.next().map(SliceValue::Scalar),
            SliceValues::Vector(range) => range.next().map(SliceValue::Vector),
        }
    }
}

/// Row bounds of an irregular region: columns `[min, max)` of `row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RowBounds {
    pub row: usize,
    pub min: usize,
    pub max: usize,
}

impl RowBounds {
    pub fn new(row: usize, min: usize, max: usize) -> Self {
        Self { row, min, max }
    }
}

/// Strides of a plane walk, see [`CountedRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StridePlan {
    pub increment: usize,
    /// Number of values per output row.
    pub count_max: usize,
    pub count_increment: usize,
    /// Number of output rows.
    pub rows: usize,
    pub reverse_outer: bool,
    pub reverse_inner: bool,
}

impl StridePlan {
    /// Stride set for `view` over a buffer of `size`.
    ///
    /// The view matrix holds the screen directions as columns: column 0 points
    /// right, column 1 points down and column 2 through the plane, all in
    /// storage axes. Column 0 drives the inner loop and column 1 the outer
    /// loop. Each loop runs backwards when its column's dominant cosine is
    /// negative, so a view whose down direction is `-z` (as in the standard
    /// coronal and sagittal views) starts at the highest slice, and one whose
    /// down direction is `+z` starts at the lowest.
    pub fn new(size: &Size, view: &ViewOrientation) -> Result<Self, ImageError> {
        let ncols = size.get(0);
        let nrows = size.get(1);
        let nslices = size.get(2);
        let slice_size = size.dim_size(2);

        let through_plane = view.storage_axis(2)?;
        let horizontal = view.storage_axis(0)?;
        let (increment, count_max, count_increment, rows) = match (through_plane, horizontal) {
            // axial
            (2, 0) => (1, ncols, ncols, nrows),
            (2, _) => (ncols, nrows, 1, ncols),
            // sagittal
            (0, 1) => (ncols, nrows, slice_size, nslices),
            (0, _) => (slice_size, nslices, ncols, nrows),
            // coronal
            (1, 0) => (1, ncols, slice_size, nslices),
            (1, _) => (slice_size, nslices, 1, ncols),
            (other, _) => return Err(ImageError::UnknownDominantAxis(other)),
        };

        Ok(Self {
            increment,
            count_max,
            count_increment,
            rows,
            reverse_outer: view.dominant_axis(1).value < 0.0,
            reverse_inner: view.dominant_axis(0).value < 0.0,
        })
    }

    /// One past the largest offset visited from `start`.
    pub fn end(&self, start: usize) -> usize {
        if self.rows == 0 || self.count_max == 0 {
            return start;
        }
        start
            + (self.rows - 1) * self.count_increment
            + (self.count_max - 1) * self.increment
            + 1
    }

    /// Whether the plan visits the buffer in storage order.
    pub fn is_storage_order(&self) -> bool {
        self.increment == 1 && !self.reverse_outer && !self.reverse_inner
    }
}

/// `(rows, columns)` of the plane shown by `view`; storage order without one.
pub fn view_shape(size: &Size, view: Option<&ViewOrientation>) -> Result<(usize, usize), ImageError> {
    match view {
        Some(view) => {
            let plan = StridePlan::new(size, view)?;
            Ok((plan.rows, plan.count_max))
        }
        None => Ok((size.get(1), size.get(0))),
    }
}

fn accessor<T: Sample>(image: &Image<T>, rescaled: bool) -> Accessor<'_> {
    if rescaled {
        Box::new(move |offset| image.rescaled_value_at_offset(offset))
    } else {
        Box::new(move |offset| image.value_at_offset(offset).to_f64_lossy())
    }
}

/// Traversal of the plane through `position`.
///
/// Without `view` the slice is walked in storage order. With one, the stride
/// set is picked from the storage axes that dominate the view axes. Three
/// component images only support storage order.
pub fn slice_iterator<'a, T: Sample>(
    image: &'a Image<T>,
    position: &Index,
    rescaled: bool,
    view: Option<&ViewOrientation>,
) -> Result<SliceValues<'a>, ImageError> {
    let size = image.geometry().size();
    let components = image.number_of_components();

    let through_plane = match view {
        Some(view) => view.storage_axis(2)?,
        None => 2,
    };
    let start = size.index_to_offset(&position.keep_spatial(through_plane), 0);
    let slice_size = size.dim_size(2);
    let accessor = accessor(image, rescaled);

    match components {
        1 => match view {
            None => {
                debug!("slice iterator: storage order from offset {start}");
                Ok(SliceValues::Scalar(ScalarRange::Simple(SimpleRange::new(
                    accessor,
                    start,
                    start + slice_size,
                    1,
                ))))
            }
            Some(view) => {
                let plan = StridePlan::new(size, view)?;
                debug!(
                    "slice iterator: through-plane axis {through_plane}, strides ({}, {}, {}), reverse ({}, {})",
                    plan.increment,
                    plan.count_max,
                    plan.count_increment,
                    plan.reverse_outer,
                    plan.reverse_inner
                );
                Ok(SliceValues::Scalar(ScalarRange::Counted(CountedRange::new(
                    accessor,
                    start,
                    plan.end(start),
                    plan.increment,
                    plan.count_max,
                    plan.count_increment,
                    plan.reverse_outer,
                    plan.reverse_inner,
                ))))
            }
        },
        3 => {
            if let Some(view) = view {
                if !StridePlan::new(size, view)?.is_storage_order() || through_plane != 2 {
                    return Err(ImageError::UnsupportedOrientation { components });
                }
            }
            let start = start * 3;
            let end = start + slice_size * 3;
            let planar = image.planar_configuration().is_planar();
            debug!("slice iterator: 3 components from offset {start}, planar {planar}");
            Ok(SliceValues::Vector(Vector3Range::new(
                accessor, start, end, 1, planar,
            )))
        }
        other => Err(ImageError::UnsupportedComponents(other)),
    }
}

/// Traversal of a rectangle of the slice through `position`.
///
/// Corners are `(column, row)`. The maximum row is exclusive while the
/// maximum column only bounds the end offset; every row emits
/// `max column - min column` values, at least one. The default corners are
/// `(0, 0)` and `(columns - 1, rows)`.
pub fn region_slice_iterator<'a, T: Sample>(
    image: &'a Image<T>,
    position: &Index,
    rescaled: bool,
    min: Option<(usize, usize)>,
    max: Option<(usize, usize)>,
) -> Result<ScalarRange<Accessor<'a>>, ImageError> {
    let components = image.number_of_components();
    if components != 1 {
        return Err(ImageError::UnsupportedComponents(components));
    }
    let size = image.geometry().size();
    let ncols = size.get(0);
    let (min_col, min_row) = min.unwrap_or((0, 0));
    let (max_col, max_row) = max.unwrap_or((ncols.saturating_sub(1), size.get(1)));

    let start = size.index_to_offset(&position.with_new_2d(min_col, min_row), 0);
    let end = size.index_to_offset(&position.with_new_2d(max_col, max_row.saturating_sub(1)), 0);
    let width = max_col.saturating_sub(min_col).max(1);
    let row_increment = ncols.saturating_sub(width);

    debug!("region iterator: offsets [{start}, {}], width {width}", end);
    Ok(ScalarRange::Region(RegionRange::new(
        accessor(image, rescaled),
        start,
        end + 1,
        1,
        width,
        row_increment,
    )))
}

/// Traversal of an irregular region given as per-row column bounds, sorted by
/// row. Rows without width are dropped; `None` when no row is left.
pub fn variable_region_slice_iterator<'a, T: Sample>(
    image: &'a Image<T>,
    position: &Index,
    rescaled: bool,
    rows: &[RowBounds],
) -> Result<Option<ScalarRange<Accessor<'a>>>, ImageError> {
    let components = image.number_of_components();
    if components != 1 {
        return Err(ImageError::UnsupportedComponents(components));
    }
    let size = image.geometry().size();
    let ncols = size.get(0);

    let mut spans = Vec::with_capacity(rows.len());
    let mut first: Option<&RowBounds> = None;
    let mut last: Option<&RowBounds> = None;
    for bounds in rows {
        let width = bounds.max.saturating_sub(bounds.min);
        if width == 0 {
            continue;
        }
        // skipped rows are crossed when entering this one
        let lead = match last {
            Some(previous) => {
                bounds.min + bounds.row.saturating_sub(previous.row + 1) * ncols
            }
            None => bounds.min,
        };
        spans.push(RegionSpan::new(lead, width, ncols.saturating_sub(bounds.max)));
        first.get_or_insert(bounds);
        last = Some(bounds);
    }

    let (Some(first), Some(last)) = (first, last) else {
        warn!("variable region iterator: no row with a width, nothing to iterate");
        return Ok(None);
    };
    let start = size.index_to_offset(&position.with_new_2d(first.min, first.row), 0);
    let end = size.index_to_offset(&position.with_new_2d(last.max, last.row), 0);

    debug!("variable region iterator: {} rows, offsets [{start}, {end})", spans.len());
    Ok(Some(ScalarRange::MultiRegion(MultiRegionRange::new(
        accessor(image, rescaled),
        start,
        end,
        1,
        spans,
    ))))
}

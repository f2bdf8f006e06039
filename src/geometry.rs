//! Image geometry: dimension sizes, index/offset conversion, slice origins
//! and orientation.
//!
//! Dimensions are ordered `(columns, rows, slices, frames, ...)`. Offsets are
//! voxel offsets; multi-component images multiply them by the component count
//! to address their sample buffer.

use nalgebra::Matrix3;
use nalgebra::Point3;
use nalgebra::Vector3;

use crate::enums::Orientation;
use crate::error::ImageError;

const ORIGIN_EPSILON: f64 = 1e-4;

/// Multi-dimensional integer position, one coordinate per dimension.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Index(Vec<usize>);

impl Index {
    pub fn new(values: Vec<usize>) -> Self {
        Self(values)
    }

    /// Coordinate along `dim`, 0 when the index has fewer dimensions.
    pub fn get(&self, dim: usize) -> usize {
        self.0.get(dim).copied().unwrap_or(0)
    }

    pub fn values(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this index with new column and row coordinates.
    pub fn with_new_2d(&self, column: usize, row: usize) -> Index {
        let mut values = self.0.clone();
        if values.len() < 2 {
            values.resize(2, 0);
        }
        values[0] = column;
        values[1] = row;
        Index(values)
    }

    /// Zeroes the three spatial coordinates except `dim`; coordinates above
    /// the slice dimension (time, ...) are kept.
    pub(crate) fn keep_spatial(&self, dim: usize) -> Index {
        Index(
            self.0
                .iter()
                .enumerate()
                .map(|(d, &v)| if d == dim || d > 2 { v } else { 0 })
                .collect(),
        )
    }
}

impl From<Vec<usize>> for Index {
    fn from(values: Vec<usize>) -> Self {
        Index(values)
    }
}

impl<const N: usize> From<[usize; N]> for Index {
    fn from(values: [usize; N]) -> Self {
        Index(values.to_vec())
    }
}

/// Per-dimension sizes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Size(Vec<usize>);

impl Size {
    pub fn new(values: Vec<usize>) -> Self {
        Self(values)
    }

    /// Size of `dim`; dimensions beyond [`Size::len`] have size 1.
    pub fn get(&self, dim: usize) -> usize {
        self.0.get(dim).copied().unwrap_or(1)
    }

    pub fn values(&self) -> &[usize] {
        &self.0
    }

    /// Number of dimensions.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Product of the sizes of the dimensions below `dim`.
    pub fn dim_size(&self, dim: usize) -> usize {
        self.dim_size_from(dim, 0)
    }

    fn dim_size_from(&self, dim: usize, from_dim: usize) -> usize {
        (from_dim..dim).map(|d| self.get(d)).product()
    }

    /// Product of the sizes of the dimensions at or above `from_dim`.
    pub fn total_size(&self, from_dim: usize) -> usize {
        (from_dim..self.len()).map(|d| self.get(d)).product()
    }

    pub fn index_to_offset(&self, index: &Index, from_dim: usize) -> usize {
        (from_dim..self.len().max(index.len()))
            .map(|d| index.get(d) * self.dim_size_from(d, from_dim))
            .sum()
    }

    pub fn offset_to_index(&self, offset: usize) -> Index {
        let mut remainder = offset;
        let mut values = Vec::with_capacity(self.len());
        for d in (0..self.len()).rev() {
            let dim_size = self.dim_size(d);
            values.push(remainder / dim_size);
            remainder %= dim_size;
        }
        values.reverse();
        Index(values)
    }

    pub fn is_in_bounds(&self, index: &Index) -> bool {
        (0..self.len().max(index.len())).all(|d| index.get(d) < self.get(d))
    }

    /// Flat index over the dimensions at or above the slice dimension.
    pub fn secondary_offset(&self, index: &Index) -> usize {
        self.index_to_offset(index, 2)
    }

    /// Whether scrolling through `view`'s through-plane axis is possible.
    pub fn can_scroll(&self, view: &ViewOrientation) -> bool {
        self.get(view.dominant_axis(2).index) != 1
    }

    fn grow(&mut self, dim: usize) {
        if self.0.len() <= dim {
            self.0.resize(dim + 1, 1);
        }
        self.0[dim] += 1;
    }
}

/// Geometry of an image: size, spacing, orientation and the spatial origin of
/// each slice of the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Geometry {
    origins: Vec<Point3<f64>>,
    size: Size,
    spacing: Vector3<f64>,
    orientation: Matrix3<f64>,
}

impl Geometry {
    /// Creates a geometry whose slice origins are spaced along the slice
    /// normal, starting at `origin`.
    pub fn new(
        origin: Point3<f64>,
        size: Size,
        spacing: Vector3<f64>,
        orientation: Matrix3<f64>,
    ) -> Self {
        let normal = orientation.column(2).into_owned();
        let origins = (0..size.get(2))
            .map(|k| origin + normal * (k as f64 * spacing.z))
            .collect();
        Self {
            origins,
            size,
            spacing,
            orientation,
        }
    }

    /// Axis-aligned geometry with unit spacing, handy for synthetic data.
    pub fn from_size(size: Size) -> Self {
        Self::new(
            Point3::origin(),
            size,
            Vector3::new(1.0, 1.0, 1.0),
            Matrix3::identity(),
        )
    }

    pub fn size(&self) -> &Size {
        &self.size
    }

    pub fn spacing(&self) -> &Vector3<f64> {
        &self.spacing
    }

    pub fn orientation(&self) -> &Matrix3<f64> {
        &self.orientation
    }

    /// Origin of the first slice.
    pub fn origin(&self) -> Point3<f64> {
        self.origins.first().copied().unwrap_or_else(Point3::origin)
    }

    pub fn origins(&self) -> &[Point3<f64>] {
        &self.origins
    }

    pub fn slice_count(&self) -> usize {
        self.size.get(2)
    }

    pub fn frame_count(&self) -> usize {
        self.size.get(3)
    }

    pub fn index_to_offset(&self, index: &Index) -> usize {
        self.size.index_to_offset(index, 0)
    }

    pub fn offset_to_index(&self, offset: usize) -> Index {
        self.size.offset_to_index(offset)
    }

    pub fn can_scroll(&self, view: &ViewOrientation) -> bool {
        self.size.can_scroll(view)
    }

    pub fn is_orientation_equal(&self, other: &Matrix3<f64>, tolerance: f64) -> bool {
        self.orientation
            .iter()
            .zip(other.iter())
            .all(|(a, b)| (a - b).abs() < tolerance)
    }

    /// Position at which a slice with `origin` belongs in the (sorted) origin
    /// list. An origin equal to an existing one resolves to that slice.
    pub fn slice_index(&self, origin: &Point3<f64>) -> usize {
        let normal = self.orientation.column(2).into_owned();
        let first = self.origin();
        let distance = (*origin - first).dot(&normal);
        self.origins
            .iter()
            .filter(|o| (**o - first).dot(&normal) < distance - ORIGIN_EPSILON)
            .count()
    }

    /// Inserts a slice origin and grows the slice dimension by one.
    pub fn append_origin(&mut self, origin: Point3<f64>, slice_index: usize) {
        let at = slice_index.min(self.origins.len());
        self.origins.insert(at, origin);
        self.size.grow(2);
    }

    /// Grows the frame dimension by one.
    pub fn append_frame(&mut self) {
        self.size.grow(3);
    }
}

/// Axis of the storage space that best matches a view axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DominantAxis {
    pub index: usize,
    /// Signed direction cosine of the storage axis.
    pub value: f64,
}

/// Direction cosines of a viewing plane expressed in storage axes: column `k`
/// is view axis `k` (0 = columns, 1 = rows, 2 = through-plane).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewOrientation(Matrix3<f64>);

impl ViewOrientation {
    pub fn new(matrix: Matrix3<f64>) -> Self {
        Self(matrix)
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Storage axis with the largest absolute cosine for `view_axis`.
    pub fn dominant_axis(&self, view_axis: usize) -> DominantAxis {
        let column = self.0.column(view_axis);
        let index = column.iamax();
        DominantAxis {
            index,
            value: column[index],
        }
    }

    pub(crate) fn storage_axis(&self, view_axis: usize) -> Result<usize, ImageError> {
        match self.dominant_axis(view_axis).index {
            index @ 0..=2 => Ok(index),
            other => Err(ImageError::UnknownDominantAxis(other)),
        }
    }
}

impl From<Orientation> for ViewOrientation {
    fn from(orientation: Orientation) -> Self {
        let matrix = match orientation {
            Orientation::Axial => Matrix3::identity(),
            Orientation::Coronal => {
                Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0)
            }
            Orientation::Sagittal => {
                Matrix3::new(0.0, 0.0, -1.0, 1.0, 0.0, 0.0, 0.0, -1.0, 0.0)
            }
        };
        ViewOrientation(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_and_total_sizes() {
        let size = Size::new(vec![4, 3, 2, 5]);
        assert_eq!(size.dim_size(0), 1);
        assert_eq!(size.dim_size(2), 12);
        assert_eq!(size.dim_size(3), 24);
        assert_eq!(size.total_size(0), 120);
        assert_eq!(size.total_size(2), 10);
        assert_eq!(size.get(7), 1);
    }

    #[test]
    fn offsets_from_a_start_dimension() {
        let size = Size::new(vec![4, 3, 2, 5]);
        let index = Index::from([1, 2, 1, 3]);
        assert_eq!(size.index_to_offset(&index, 0), 1 + 2 * 4 + 12 + 3 * 24);
        assert_eq!(size.secondary_offset(&index), 1 + 3 * 2);
        assert_eq!(size.offset_to_index(93), index);
    }

    #[test]
    fn keep_spatial_zeroes_other_axes() {
        let index = Index::from([3, 2, 1, 4]);
        assert_eq!(index.keep_spatial(1), Index::from([0, 2, 0, 4]));
        assert_eq!(index.keep_spatial(2), Index::from([0, 0, 1, 4]));
    }

    #[test]
    fn dominant_axes_of_standard_views() {
        let coronal = ViewOrientation::from(Orientation::Coronal);
        assert_eq!(coronal.dominant_axis(0).index, 0);
        assert_eq!(coronal.dominant_axis(1), DominantAxis { index: 2, value: -1.0 });
        assert_eq!(coronal.dominant_axis(2).index, 1);

        let sagittal = ViewOrientation::from(Orientation::Sagittal);
        assert_eq!(sagittal.dominant_axis(0).index, 1);
        assert_eq!(sagittal.dominant_axis(1).index, 2);
        assert_eq!(sagittal.dominant_axis(2).index, 0);
    }

    #[test]
    fn slice_index_orders_by_normal_distance() {
        let geometry = Geometry::from_size(Size::new(vec![2, 2, 3]));
        assert_eq!(geometry.slice_index(&Point3::new(0.0, 0.0, -1.0)), 0);
        assert_eq!(geometry.slice_index(&Point3::new(0.0, 0.0, 1.0)), 1);
        assert_eq!(geometry.slice_index(&Point3::new(0.0, 0.0, 1.5)), 2);
        assert_eq!(geometry.slice_index(&Point3::new(0.0, 0.0, 7.0)), 3);
    }

    #[test]
    fn append_origin_and_frame_grow_size() {
        let mut geometry = Geometry::from_size(Size::new(vec![2, 2, 1]));
        geometry.append_origin(Point3::new(0.0, 0.0, 1.0), 1);
        assert_eq!(geometry.slice_count(), 2);
        assert_eq!(geometry.origins().len(), 2);
        assert_eq!(geometry.frame_count(), 1);
        geometry.append_frame();
        assert_eq!(geometry.size().values(), &[2, 2, 2, 2]);
    }

    #[test]
    fn can_scroll_needs_more_than_one_position() {
        let size = Size::new(vec![4, 3, 1]);
        assert!(!size.can_scroll(&ViewOrientation::from(Orientation::Axial)));
        assert!(size.can_scroll(&ViewOrientation::from(Orientation::Coronal)));
    }
}

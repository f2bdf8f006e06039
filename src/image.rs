//! The image: a flat sample buffer with its geometry, rescale state and meta
//! data.
//!
//! Raw accessors index the buffer directly. Offsets must be in range: there
//! is no checked variant and an out of range offset panics like any slice
//! index.

use std::cell::Cell;
use std::cell::OnceCell;
use std::fmt::Debug;

use bytemuck::Pod;
use ndarray::Array2;
use num_traits::Bounded;
use num_traits::NumCast;
use num_traits::ToPrimitive;
use num_traits::Zero;

use crate::enums::ImageEventType;
use crate::enums::Orientation;
use crate::enums::PlanarConfiguration;
use crate::error::ImageError;
use crate::events::EventListeners;
use crate::events::ImageEvent;
use crate::events::ListenerId;
use crate::geometry::Geometry;
use crate::geometry::Index;
use crate::geometry::ViewOrientation;
use crate::histogram::DataRange;
use crate::histogram::Histogram;
use crate::meta::ImageMeta;
use crate::rsi::RescaleSlopeAndIntercept;
use crate::rsi::RsiState;
use crate::slice_iterator::SliceValue;
use crate::slice_iterator::slice_iterator;
use crate::slice_iterator::view_shape;

pub const DEFAULT_PHOTOMETRIC_INTERPRETATION: &str = "MONOCHROME2";

/// Numeric sample type of an image buffer.
///
/// Implemented for every primitive integer and float type and for
/// [`half::f16`].
pub trait Sample:
    Copy + Debug + PartialOrd + NumCast + Bounded + Zero + Pod + Send + Sync + 'static
{
    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }

    /// Converts back into the sample type, clamping to its bounds.
    #[inline]
    fn from_f64_saturating(value: f64) -> Self {
        <Self as NumCast>::from(value).unwrap_or_else(|| {
            if value.is_sign_negative() {
                Self::min_value()
            } else {
                Self::max_value()
            }
        })
    }
}

impl<T> Sample for T where
    T: Copy + Debug + PartialOrd + NumCast + Bounded + Zero + Pod + Send + Sync + 'static
{
}

#[derive(Debug)]
pub struct Image<T: Sample> {
    pub(crate) geometry: Geometry,
    pub(crate) buffer: Vec<T>,
    pub(crate) number_of_components: usize,
    pub(crate) image_uids: Vec<String>,
    pub(crate) rsi: RsiState,
    pub(crate) is_identity_rsi: bool,
    pub(crate) photometric_interpretation: String,
    pub(crate) planar_configuration: PlanarConfiguration,
    pub(crate) meta: ImageMeta,
    pub(crate) data_range: Cell<Option<DataRange>>,
    pub(crate) rescaled_data_range: Cell<Option<DataRange>>,
    pub(crate) histogram: OnceCell<Histogram>,
    pub(crate) listeners: EventListeners,
}

impl<T: Sample> Image<T> {
    /// Creates an image over `buffer`. The number of components is the
    /// buffer length divided by the voxel count; `image_uids` holds one UID
    /// for all slices or one per slice/frame.
    pub fn new(
        geometry: Geometry,
        buffer: Vec<T>,
        image_uids: Vec<String>,
    ) -> Result<Self, ImageError> {
        let voxels = geometry.size().total_size(0);
        if voxels == 0 || buffer.len() % voxels != 0 {
            return Err(ImageError::BufferSize {
                buffer: buffer.len(),
                voxels,
            });
        }
        let number_of_components = buffer.len() / voxels;
        if number_of_components != 1 && number_of_components != 3 {
            return Err(ImageError::UnsupportedComponents(number_of_components));
        }
        let secondary_max = geometry.size().total_size(2);
        if image_uids.len() != 1 && image_uids.len() != secondary_max {
            return Err(ImageError::ImageUidCount {
                expected: secondary_max,
                found: image_uids.len(),
            });
        }

        Ok(Self {
            geometry,
            buffer,
            number_of_components,
            image_uids,
            rsi: RsiState::default(),
            is_identity_rsi: true,
            photometric_interpretation: DEFAULT_PHOTOMETRIC_INTERPRETATION.to_string(),
            planar_configuration: PlanarConfiguration::default(),
            meta: ImageMeta::default(),
            data_range: Cell::new(None),
            rescaled_data_range: Cell::new(None),
            histogram: OnceCell::new(),
            listeners: EventListeners::default(),
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn buffer(&self) -> &[T] {
        &self.buffer
    }

    /// Mutable buffer access; drops the cached ranges and histogram.
    pub fn buffer_mut(&mut self) -> &mut [T] {
        self.invalidate_caches();
        &mut self.buffer
    }

    /// The buffer as raw bytes, e.g. for a texture upload.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.buffer)
    }

    pub fn number_of_components(&self) -> usize {
        self.number_of_components
    }

    pub fn photometric_interpretation(&self) -> &str {
        &self.photometric_interpretation
    }

    pub fn set_photometric_interpretation(&mut self, interpretation: impl Into<String>) {
        self.photometric_interpretation = interpretation.into();
    }

    /// Whether window/level applies, i.e. the image is monochrome.
    pub fn is_monochrome(&self) -> bool {
        self.photometric_interpretation.starts_with("MONOCHROME")
    }

    pub fn planar_configuration(&self) -> PlanarConfiguration {
        self.planar_configuration
    }

    pub fn set_planar_configuration(&mut self, configuration: PlanarConfiguration) {
        self.planar_configuration = configuration;
    }

    pub fn meta(&self) -> &ImageMeta {
        &self.meta
    }

    pub fn meta_mut(&mut self) -> &mut ImageMeta {
        &mut self.meta
    }

    pub fn set_meta(&mut self, meta: ImageMeta) {
        self.meta = meta;
    }

    pub fn image_uids(&self) -> &[String] {
        &self.image_uids
    }

    /// UID of the slice at `index`; the shared UID when there is only one.
    pub fn image_uid(&self, index: Option<&Index>) -> Option<&str> {
        if self.image_uids.len() == 1 {
            return self.image_uids.first().map(String::as_str);
        }
        let index = index?;
        let secondary = self.geometry.size().secondary_offset(index);
        self.image_uids.get(secondary).map(String::as_str)
    }

    #[inline]
    pub fn value_at_offset(&self, offset: usize) -> T {
        self.buffer[offset]
    }

    pub fn value_at_index(&self, index: &Index) -> T {
        self.value_at_offset(self.geometry.index_to_offset(index))
    }

    /// Value at column `i`, row `j`, slice `k` and frame `f`.
    pub fn value(&self, i: usize, j: usize, k: usize, f: usize) -> T {
        self.value_at_index(&Index::from([i, j, k, f]))
    }

    pub fn set_value_at_offset(&mut self, offset: usize, value: T) {
        self.buffer[offset] = value;
        self.invalidate_caches();
    }

    #[inline]
    pub fn rescaled_value_at_offset(&self, offset: usize) -> f64 {
        let value = self.value_at_offset(offset).to_f64_lossy();
        if self.is_identity_rsi {
            return value;
        }
        match &self.rsi {
            RsiState::Constant(rsi) => rsi.apply(value),
            RsiState::PerOffset(rsis) => rsis[self.secondary_offset_of(offset)].apply(value),
        }
    }

    pub fn rescaled_value_at_index(&self, index: &Index) -> f64 {
        self.rescaled_value_at_offset(self.geometry.index_to_offset(index))
    }

    pub fn rescaled_value(&self, i: usize, j: usize, k: usize, f: usize) -> f64 {
        self.rescaled_value_at_index(&Index::from([i, j, k, f]))
    }

    /// Slice/frame a buffer offset belongs to.
    pub(crate) fn secondary_offset_of(&self, offset: usize) -> usize {
        offset / (self.number_of_components * self.geometry.size().dim_size(2))
    }

    pub fn rsi_state(&self) -> &RsiState {
        &self.rsi
    }

    pub fn is_constant_rsi(&self) -> bool {
        self.rsi.is_constant()
    }

    pub fn is_identity_rsi(&self) -> bool {
        self.is_identity_rsi
    }

    /// Rescale slope and intercept applying at `index`. Per-slice state needs
    /// an index to pick the slice.
    pub fn rescale_slope_and_intercept(
        &self,
        index: Option<&Index>,
    ) -> Result<RescaleSlopeAndIntercept, ImageError> {
        match &self.rsi {
            RsiState::Constant(rsi) => Ok(*rsi),
            RsiState::PerOffset(rsis) => {
                let index = index.ok_or(ImageError::MissingRescaleIndex)?;
                let secondary = self.geometry.size().secondary_offset(index);
                Ok(rsis[secondary])
            }
        }
    }

    /// Stores a rescale slope and intercept.
    ///
    /// Without `offset` the constant value is replaced. With one, a value
    /// differing from the constant one switches the image to per-slice mode
    /// for good; in that mode the value is inserted at `offset`.
    pub fn set_rescale_slope_and_intercept(
        &mut self,
        rsi: RescaleSlopeAndIntercept,
        offset: Option<usize>,
    ) -> Result<(), ImageError> {
        let count = self.geometry.size().total_size(2);
        self.rsi.insert(rsi, offset, count)?;
        self.on_rsi_changed();
        Ok(())
    }

    pub(crate) fn on_rsi_changed(&mut self) {
        self.is_identity_rsi = self.rsi.is_identity();
        self.rescaled_data_range.set(None);
        self.histogram = OnceCell::new();
    }

    pub(crate) fn invalidate_caches(&mut self) {
        self.data_range.set(None);
        self.rescaled_data_range.set(None);
        self.histogram = OnceCell::new();
    }

    pub fn add_event_listener(
        &mut self,
        event_type: ImageEventType,
        callback: impl FnMut(&ImageEvent) + Send + 'static,
    ) -> ListenerId {
        self.listeners.add(event_type, callback)
    }

    pub fn remove_event_listener(&mut self, event_type: ImageEventType, id: ListenerId) -> bool {
        self.listeners.remove(event_type, id)
    }

    pub(crate) fn fire_event(&mut self, event: ImageEvent) {
        self.listeners.fire(&event);
    }

    /// Whether `index` is a valid through-plane position for `orientation`.
    pub fn is_valid_index(&self, index: usize, orientation: Orientation) -> bool {
        let size = self.geometry.size();
        let max_index = match orientation {
            Orientation::Axial => size.get(2),
            Orientation::Coronal => size.get(1),
            Orientation::Sagittal => size.get(0),
        };
        index < max_index
    }

    /// Collects the plane through `position` as `(rows, columns)`, top-left
    /// first. Single component images only.
    pub fn slice_array(
        &self,
        position: &Index,
        orientation: Option<Orientation>,
        rescaled: bool,
    ) -> Result<Array2<f64>, ImageError> {
        let view = orientation.map(ViewOrientation::from);
        let (rows, columns) = view_shape(self.geometry.size(), view.as_ref())?;
        let values = slice_iterator(self, position, rescaled, view.as_ref())?;
        if values.is_vector() {
            return Err(ImageError::UnsupportedComponents(self.number_of_components));
        }
        let data: Vec<f64> = values
            .filter_map(|value| match value {
                SliceValue::Scalar(v) => Some(v),
                SliceValue::Vector(_) => None,
            })
            .collect();
        let length = data.len();
        Array2::from_shape_vec((rows, columns), data).map_err(|_| ImageError::BufferSize {
            buffer: length,
            voxels: rows * columns,
        })
    }

    /// Copy with every sample replaced by `operator(sample)`, on raw values.
    pub fn transform<F: Fn(f64) -> f64>(&self, operator: F) -> Image<T> {
        let mut image = self.clone();
        for value in image.buffer.iter_mut() {
            *value = T::from_f64_saturating(operator(value.to_f64_lossy()));
        }
        image
    }

    /// Copy with every sample replaced by `floor(operator(this, other))`, on
    /// raw values. Both buffers are expected to have the same length.
    pub fn compose<F: Fn(f64, f64) -> f64>(&self, other: &Image<T>, operator: F) -> Image<T> {
        debug_assert_eq!(self.buffer.len(), other.buffer.len());
        let mut image = self.clone();
        for ((value, lhs), rhs) in image
            .buffer
            .iter_mut()
            .zip(&self.buffer)
            .zip(&other.buffer)
        {
            *value = T::from_f64_saturating(operator(lhs.to_f64_lossy(), rhs.to_f64_lossy()).floor());
        }
        image
    }
}

/// Deep copy of the buffer, geometry, rescale state and meta data. Caches
/// start empty and listeners are not carried over.
impl<T: Sample> Clone for Image<T> {
    fn clone(&self) -> Self {
        Self {
            geometry: self.geometry.clone(),
            buffer: self.buffer.clone(),
            number_of_components: self.number_of_components,
            image_uids: self.image_uids.clone(),
            rsi: self.rsi.clone(),
            is_identity_rsi: self.is_identity_rsi,
            photometric_interpretation: self.photometric_interpretation.clone(),
            planar_configuration: self.planar_configuration,
            meta: self.meta.clone(),
            data_range: Cell::new(None),
            rescaled_data_range: Cell::new(None),
            histogram: OnceCell::new(),
            listeners: EventListeners::default(),
        }
    }
}

//! # Voxel buffer library
//!
//! This crate holds medical image data as one flat sample buffer and walks
//! it in the order a viewer needs it.
//!
//! An [`Image`] owns the buffer together with its [`Geometry`] (sizes, slice
//! origins, orientation), the rescale slope and intercept used to turn raw
//! samples into physical values, and a few tags (photometric interpretation,
//! planar configuration, meta data). Images can be built slice by slice or
//! frame by frame while data streams in.
//!
//! The planners in [`slice_iterator`] turn an image, a position and a view
//! orientation into a lazy traversal that yields values row by row from the
//! top-left pixel of the requested plane. The three medical planes are
//! supported for single component images:
//!  - Axial
//!  - Coronal
//!  - Sagittal
//!
//! Three component (RGB) images are walked in storage order, interleaved or
//! planar.
//!
//! Everything is single threaded and synchronous. The library only logs
//! through the `log` facade; install a logger to see planner decisions and
//! scan timings.
//!
//! # Examples
//!
//! ## Reading a coronal plane
//!
//! ```
//! # use voxel_buffer::{Geometry, Image, Index, Orientation, Size};
//! let geometry = Geometry::from_size(Size::new(vec![4, 3, 2]));
//! let buffer: Vec<u16> = (0..24).collect();
//! let image = Image::new(geometry, buffer, vec!["1.2.3".to_string()])
//!     .expect("should have created the image");
//!
//! let plane = image
//!     .slice_array(&Index::from([0, 1, 0]), Some(Orientation::Coronal), true)
//!     .expect("should have walked the coronal plane");
//! // the last slice comes first
//! assert_eq!(plane.row(0).to_vec(), vec![16.0, 17.0, 18.0, 19.0]);
//! ```

mod append;
mod convolution;
pub mod enums;
pub mod error;
pub mod events;
pub mod geometry;
pub mod histogram;
pub mod image;
pub mod iterators;
pub mod meta;
pub mod rsi;
pub mod slice_iterator;

/// Half precision float, usable as a [`Sample`].
pub use half::f16;

pub use enums::{ImageEventType, Orientation, PlanarConfiguration};
pub use error::ImageError;
pub use events::{ImageEvent, ListenerId};
pub use geometry::{DominantAxis, Geometry, Index, Size, ViewOrientation};
pub use histogram::{DataRange, Histogram};
pub use image::{Image, Sample};
pub use meta::{ImageMeta, WindowLevel, WindowPreset};
pub use rsi::{RescaleSlopeAndIntercept, RsiState};
pub use slice_iterator::{
    RowBounds, SliceValue, SliceValues, region_slice_iterator, slice_iterator,
    variable_region_slice_iterator,
};

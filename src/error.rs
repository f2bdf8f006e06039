use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ImageError {
    #[error("Unsupported number of components: {0}")]
    UnsupportedComponents(usize),

    #[error("Unknown dominant storage axis: {0}")]
    UnknownDominantAxis(usize),

    #[error("The convolution kernel does not have a length of 9; it has {0}")]
    InvalidKernelSize(usize),

    #[error("Unsupported view orientation for an image with {components} components")]
    UnsupportedOrientation { components: usize },

    #[error("Invalid planar configuration: {0}")]
    InvalidPlanarConfiguration(u8),

    #[error("Buffer of length {buffer} does not fit {voxels} voxels")]
    BufferSize { buffer: usize, voxels: usize },

    #[error("Expected 1 or {expected} image UIDs, found {found}")]
    ImageUidCount { expected: usize, found: usize },

    #[error("Cannot append an image with {0} slices, expected a single slice")]
    NotASingleSlice(usize),

    #[error("Cannot append a slice with a different {property}: expected {expected}, found {found}")]
    SliceMismatch {
        property: String,
        expected: String,
        found: String,
    },

    #[error("Cannot append a slice without the meta field '{0}'")]
    MissingMeta(String),

    #[error("Cannot resolve a per-slice rescale slope and intercept without an index")]
    MissingRescaleIndex,

    #[error("Missing number of files for buffer manipulation")]
    MissingNumberOfFiles,

    #[error("Frame index {index} is out of range (number of frames: {count})")]
    FrameIndexOutOfRange { index: usize, count: usize },

    #[error("Slice index {index} is out of range (number of slices: {count})")]
    SliceIndexOutOfRange { index: usize, count: usize },

    #[error("Time index {index} is out of range (number of frames: {count})")]
    TimeIndexOutOfRange { index: usize, count: usize },
}

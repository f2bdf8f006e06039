use crate::error::ImageError;

/// Standard viewing planes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Axial,
    Coronal,
    Sagittal,
}

/// Memory layout of multi-component samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlanarConfiguration {
    /// Components of one voxel are adjacent (`r0 g0 b0 r1 g1 b1 ...`).
    #[default]
    Interleaved = 0,
    /// Each component fills its own block per slice (`r0 r1 ... g0 g1 ... b0 b1 ...`).
    Planar = 1,
}

impl PlanarConfiguration {
    pub fn is_planar(self) -> bool {
        matches!(self, PlanarConfiguration::Planar)
    }
}

impl TryFrom<u8> for PlanarConfiguration {
    type Error = ImageError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlanarConfiguration::Interleaved),
            1 => Ok(PlanarConfiguration::Planar),
            other => Err(ImageError::InvalidPlanarConfiguration(other)),
        }
    }
}

/// Events an [`Image`](crate::image::Image) can notify listeners about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageEventType {
    AppendFrame,
}

impl ImageEventType {
    pub fn name(self) -> &'static str {
        match self {
            ImageEventType::AppendFrame => "appendframe",
        }
    }
}

use serde::Deserialize;
use serde::Serialize;

use crate::error::ImageError;

const EPSILON: f64 = 1e-6;

/// Rescale slope and intercept, converting stored values into physical units.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RescaleSlopeAndIntercept {
    slope: f64,
    intercept: f64,
}

impl RescaleSlopeAndIntercept {
    pub fn new(slope: f64, intercept: f64) -> Self {
        Self { slope, intercept }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0)
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        value * self.slope + self.intercept
    }

    pub fn is_identity(&self) -> bool {
        self.slope == 1.0 && self.intercept == 0.0
    }
}

impl Default for RescaleSlopeAndIntercept {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for RescaleSlopeAndIntercept {
    fn eq(&self, other: &Self) -> bool {
        (self.slope - other.slope).abs() < EPSILON
            && (self.intercept - other.intercept).abs() < EPSILON
    }
}

/// Rescale state of an image: one value for the whole buffer, or one per
/// secondary offset (slice/frame). The switch to `PerOffset` is one-way.
#[derive(Clone, Debug, PartialEq)]
pub enum RsiState {
    Constant(RescaleSlopeAndIntercept),
    PerOffset(Vec<RescaleSlopeAndIntercept>),
}

impl Default for RsiState {
    fn default() -> Self {
        RsiState::Constant(RescaleSlopeAndIntercept::identity())
    }
}

impl RsiState {
    pub fn is_constant(&self) -> bool {
        matches!(self, RsiState::Constant(_))
    }

    pub fn is_identity(&self) -> bool {
        match self {
            RsiState::Constant(rsi) => rsi.is_identity(),
            RsiState::PerOffset(rsis) => rsis.iter().all(RescaleSlopeAndIntercept::is_identity),
        }
    }

    /// Inserts `rsi` following the append rules: a constant state equal to
    /// `rsi` is left untouched, a differing value with an offset switches to
    /// per-offset mode with `count` copies of the previous value.
    pub(crate) fn insert(
        &mut self,
        rsi: RescaleSlopeAndIntercept,
        offset: Option<usize>,
        count: usize,
    ) -> Result<(), ImageError> {
        match self {
            RsiState::Constant(current) => {
                if *current == rsi {
                    return Ok(());
                }
                match offset {
                    None => *current = rsi,
                    Some(offset) => {
                        let mut rsis = vec![*current; count];
                        rsis.insert(offset.min(count), rsi);
                        *self = RsiState::PerOffset(rsis);
                    }
                }
                Ok(())
            }
            RsiState::PerOffset(rsis) => match offset {
                Some(offset) => {
                    let at = offset.min(rsis.len());
                    rsis.insert(at, rsi);
                    Ok(())
                }
                None => Err(ImageError::MissingRescaleIndex),
            },
        }
    }

    /// Overwrites the value at `offset`, switching to per-offset mode if needed.
    pub(crate) fn replace(&mut self, rsi: RescaleSlopeAndIntercept, offset: usize, count: usize) {
        match self {
            RsiState::Constant(current) => {
                if *current == rsi {
                    return;
                }
                let mut rsis = vec![*current; count];
                if let Some(slot) = rsis.get_mut(offset) {
                    *slot = rsi;
                }
                *self = RsiState::PerOffset(rsis);
            }
            RsiState::PerOffset(rsis) => {
                if let Some(slot) = rsis.get_mut(offset) {
                    *slot = rsi;
                }
            }
        }
    }

    /// Repeats the first `block` values so per-offset state covers a new frame.
    pub(crate) fn extend_frame(&mut self, block: usize) {
        if let RsiState::PerOffset(rsis) = self {
            let copy: Vec<_> = rsis.iter().take(block).copied().collect();
            rsis.extend(copy);
        }
    }
}

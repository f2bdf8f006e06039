//! Incremental loading: slices and time frames appended to an existing image.

use std::iter;

use log::debug;

use crate::enums::ImageEventType;
use crate::error::ImageError;
use crate::events::ImageEvent;
use crate::image::Image;
use crate::image::Sample;
use crate::rsi::RescaleSlopeAndIntercept;
use crate::rsi::RsiState;

const ORIENTATION_TOLERANCE: f64 = 1e-4;

fn mismatch(property: &str, expected: impl ToString, found: impl ToString) -> ImageError {
    ImageError::SliceMismatch {
        property: property.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

impl<T: Sample> Image<T> {
    /// Samples per slice.
    fn slice_len(&self) -> usize {
        self.geometry.size().dim_size(2) * self.number_of_components
    }

    /// Samples per time frame.
    fn frame_len(&self) -> usize {
        self.geometry.size().dim_size(3) * self.number_of_components
    }

    /// Rescale slope and intercept of a single slice image.
    fn slice_rsi(&self) -> RescaleSlopeAndIntercept {
        match &self.rsi {
            RsiState::Constant(rsi) => *rsi,
            RsiState::PerOffset(rsis) => rsis.first().copied().unwrap_or_default(),
        }
    }

    /// Checks that `other` can be appended as a slice of time frame `time_id`.
    fn check_appendable(&self, other: &Image<T>, time_id: usize) -> Result<(), ImageError> {
        let size = self.geometry.size();
        let other_size = other.geometry.size();

        let slices = other_size.total_size(2);
        if slices != 1 {
            return Err(ImageError::NotASingleSlice(slices));
        }
        if size.get(0) != other_size.get(0) {
            return Err(mismatch("number of columns", size.get(0), other_size.get(0)));
        }
        if size.get(1) != other_size.get(1) {
            return Err(mismatch("number of rows", size.get(1), other_size.get(1)));
        }
        if !self
            .geometry
            .is_orientation_equal(other.geometry.orientation(), ORIENTATION_TOLERANCE)
        {
            return Err(mismatch(
                "orientation",
                format!("{:?}", self.geometry.orientation().as_slice()),
                format!("{:?}", other.geometry.orientation().as_slice()),
            ));
        }
        if self.photometric_interpretation != other.photometric_interpretation {
            return Err(mismatch(
                "photometric interpretation",
                &self.photometric_interpretation,
                &other.photometric_interpretation,
            ));
        }
        if self.number_of_components != other.number_of_components {
            return Err(mismatch(
                "number of components",
                self.number_of_components,
                other.number_of_components,
            ));
        }
        self.meta.check_consistency(&other.meta)?;

        let frames = self.geometry.frame_count();
        if time_id >= frames {
            return Err(ImageError::TimeIndexOutOfRange {
                index: time_id,
                count: frames,
            });
        }
        Ok(())
    }

    /// Appends the single slice image `other` at the position its origin
    /// takes along the slice normal.
    ///
    /// For the first time frame the slice is inserted: existing slices behind
    /// it move up in every frame, and the rescale state, UIDs, window presets
    /// and geometry grow accordingly. For a later time frame the slice fills
    /// the slot reserved by [`Image::append_frame`].
    ///
    /// Nothing is modified when the slice does not match this image.
    pub fn append_slice(&mut self, other: &Image<T>, time_id: usize) -> Result<(), ImageError> {
        self.check_appendable(other, time_id)?;

        let slice_index = self.geometry.slice_index(&other.geometry.origin());
        let slice_len = self.slice_len();
        let slices = self.geometry.slice_count();
        let frames = self.geometry.frame_count();
        let rsi = other.slice_rsi();
        let uid = other.image_uids.first().cloned().unwrap_or_default();

        if time_id == 0 {
            if let Some(files) = self.meta.number_of_files {
                let target = files * slice_len * frames;
                if target > self.buffer.capacity() {
                    debug!("append slice: growing buffer to {target} samples");
                    self.buffer.reserve_exact(target - self.buffer.len());
                }
            }
            // last frame first so earlier insert positions stay valid
            for frame in (0..frames).rev() {
                let at = (frame * slices + slice_index) * slice_len;
                if frame == 0 {
                    self.buffer
                        .splice(at..at, other.buffer[..slice_len].iter().copied());
                } else {
                    self.buffer
                        .splice(at..at, iter::repeat_n(T::zero(), slice_len));
                }
            }

            let secondary_count = slices * frames;
            for frame in 0..frames {
                let offset = frame * (slices + 1) + slice_index;
                self.rsi.insert(rsi, Some(offset), secondary_count)?;
                if self.expand_image_uids(&uid, secondary_count) {
                    self.image_uids.insert(offset, uid.clone());
                }
            }

            if let Some(presets) = &other.meta.window_presets {
                self.meta.merge_window_presets(presets, slice_index, slices);
            }
            self.geometry
                .append_origin(other.geometry.origin(), slice_index);
            debug!("append slice: inserted slice at index {slice_index} of {}", slices + 1);
        } else {
            if slice_index >= slices {
                return Err(ImageError::SliceIndexOutOfRange {
                    index: slice_index,
                    count: slices,
                });
            }
            let secondary = time_id * slices + slice_index;
            let at = secondary * slice_len;
            self.buffer[at..at + slice_len].copy_from_slice(&other.buffer[..slice_len]);

            let secondary_count = slices * frames;
            self.rsi.replace(rsi, secondary, secondary_count);
            if self.expand_image_uids(&uid, secondary_count) {
                self.image_uids[secondary] = uid;
            }
            debug!("append slice: filled slice {slice_index} of frame {time_id}");
        }

        self.on_rsi_changed();
        self.invalidate_caches();
        Ok(())
    }

    /// Switches a shared UID differing from `uid` to one UID per slice.
    /// Returns whether the UIDs are per slice.
    fn expand_image_uids(&mut self, uid: &str, count: usize) -> bool {
        if let [shared] = self.image_uids.as_slice() {
            if shared == uid {
                return false;
            }
            self.image_uids = vec![shared.clone(); count];
        }
        true
    }

    /// Writes the samples of frame `frame_index`, reserving storage for the
    /// declared number of frames (`numberOfFiles`) and the frames up to
    /// `frame_index` when needed. Fires [`ImageEventType::AppendFrame`].
    pub fn append_frame_buffer(
        &mut self,
        frame: &[T],
        frame_index: usize,
    ) -> Result<(), ImageError> {
        let declared = self
            .meta
            .number_of_files
            .ok_or(ImageError::MissingNumberOfFiles)?;
        if frame_index >= declared {
            return Err(ImageError::FrameIndexOutOfRange {
                index: frame_index,
                count: declared,
            });
        }
        let frame_len = self.frame_len();
        if frame.len() != frame_len {
            return Err(ImageError::BufferSize {
                buffer: frame.len(),
                voxels: self.geometry.size().dim_size(3),
            });
        }

        let target = declared * frame_len;
        if target > self.buffer.capacity() {
            debug!("append frame: growing buffer to {target} samples");
            self.buffer.reserve_exact(target - self.buffer.len());
        }
        while self.geometry.frame_count() <= frame_index {
            self.grow_frame();
        }

        let at = frame_index * frame_len;
        self.buffer[at..at + frame_len].copy_from_slice(frame);
        self.invalidate_caches();

        self.fire_event(ImageEvent {
            event_type: ImageEventType::AppendFrame,
            frame_index,
        });
        Ok(())
    }

    /// Reserves one zero-filled time frame at the end of the buffer, to be
    /// filled slice by slice with [`Image::append_slice`].
    pub fn append_frame(&mut self) {
        self.grow_frame();
        let frame_index = self.geometry.frame_count() - 1;
        self.fire_event(ImageEvent {
            event_type: ImageEventType::AppendFrame,
            frame_index,
        });
    }

    fn grow_frame(&mut self) {
        let frame_len = self.frame_len();
        let slices = self.geometry.slice_count();
        self.buffer.extend(iter::repeat_n(T::zero(), frame_len));
        self.rsi.extend_frame(slices);
        if self.image_uids.len() > 1 {
            let copy: Vec<_> = self.image_uids.iter().take(slices).cloned().collect();
            self.image_uids.extend(copy);
        }
        self.geometry.append_frame();
        self.invalidate_caches();
    }
}

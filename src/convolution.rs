use log::debug;
use web_time::Instant;

use crate::error::ImageError;
use crate::image::Image;
use crate::image::Sample;

/// Neighbour offsets of a 3x3 kernel, in kernel order, for one border class.
type OffsetTable = [isize; 9];

/// Builds the 9 offset tables, indexed by `row_class * 3 + column_class`
/// with class 0 = first, 1 = inner, 2 = last. Neighbours outside the slice
/// are replaced by the nearest pixel of the slice.
fn offset_tables(columns: usize, rows: usize, factor: usize) -> [OffsetTable; 9] {
    let mut tables = [[0; 9]; 9];
    for row_class in 0..3 {
        for column_class in 0..3 {
            let table = &mut tables[row_class * 3 + column_class];
            for (k, offset) in table.iter_mut().enumerate() {
                let dy = clamp_step(k as isize / 3 - 1, row_class, rows);
                let dx = clamp_step(k as isize % 3 - 1, column_class, columns);
                *offset = (dy * columns as isize + dx) * factor as isize;
            }
        }
    }
    tables
}

fn clamp_step(step: isize, class: usize, length: usize) -> isize {
    let at_start = class == 0;
    let at_end = class == 2 || (class == 0 && length == 1);
    if (step < 0 && at_start) || (step > 0 && at_end) {
        0
    } else {
        step
    }
}

fn border_class(position: usize, length: usize) -> usize {
    if position == 0 {
        0
    } else if position + 1 == length {
        2
    } else {
        1
    }
}

impl<T: Sample> Image<T> {
    /// Applies the 3x3 kernel `weights` (row-major) to every 2D slice of a
    /// copy of this image, on raw values. Border pixels replicate the edge.
    /// Multi-component images are convolved per component.
    pub fn convolute_2d(&self, weights: &[f64]) -> Result<Image<T>, ImageError> {
        if weights.len() != 9 {
            return Err(ImageError::InvalidKernelSize(weights.len()));
        }
        let started = Instant::now();
        let mut output = self.clone();

        let size = self.geometry.size();
        let columns = size.get(0);
        let rows = size.get(1);
        let slice_voxels = size.dim_size(2);
        let components = self.number_of_components;
        let (factor, component_offset) = if components == 1 {
            (1, 0)
        } else if self.planar_configuration.is_planar() {
            (1, slice_voxels)
        } else {
            (components, 1)
        };
        let tables = offset_tables(columns, rows, factor);

        for slice in 0..size.total_size(2) {
            let slice_start = slice * slice_voxels * components;
            for component in 0..components {
                let base = slice_start + component * component_offset;
                for j in 0..rows {
                    let row_class = border_class(j, rows);
                    for i in 0..columns {
                        let table = &tables[row_class * 3 + border_class(i, columns)];
                        let position = base + (j * columns + i) * factor;
                        let sum: f64 = table
                            .iter()
                            .zip(weights)
                            .map(|(offset, weight)| {
                                let neighbour = position.wrapping_add_signed(*offset);
                                weight * self.buffer[neighbour].to_f64_lossy()
                            })
                            .sum();
                        output.buffer[position] = T::from_f64_saturating(sum);
                    }
                }
            }
        }

        debug!(
            "convolute 2d: {} slices of {columns}x{rows} in {:?}",
            size.total_size(2),
            started.elapsed()
        );
        Ok(output)
    }
}

use nalgebra::Matrix3;
use nalgebra::Point3;
use nalgebra::Vector3;
use voxel_buffer::Geometry;
use voxel_buffer::Image;
use voxel_buffer::Sample;
use voxel_buffer::Size;

/// Volume whose samples hold their own buffer offset.
pub fn ramp_volume<T: Sample>(size: &[usize]) -> Image<T> {
    let geometry = Geometry::from_size(Size::new(size.to_vec()));
    let count = geometry.size().total_size(0);
    let buffer = (0..count).map(|o| T::from_f64_saturating(o as f64)).collect();
    Image::new(geometry, buffer, vec!["1.2.840.1".to_string()])
        .expect("ramp volume should be valid")
}

/// Single axial slice at height `z`, filled with `value`.
pub fn axial_slice<T: Sample>(columns: usize, rows: usize, z: f64, value: T, uid: &str) -> Image<T> {
    let geometry = Geometry::new(
        Point3::new(0.0, 0.0, z),
        Size::new(vec![columns, rows, 1]),
        Vector3::new(0.5, 0.5, 1.0),
        Matrix3::identity(),
    );
    Image::new(geometry, vec![value; columns * rows], vec![uid.to_string()])
        .expect("slice should be valid")
}

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use common::synthetic_volume::axial_slice;
use nalgebra::Matrix3;
use nalgebra::Point3;
use nalgebra::Vector3;
use voxel_buffer::Geometry;
use voxel_buffer::Image;
use voxel_buffer::ImageError;
use voxel_buffer::ImageEventType;
use voxel_buffer::ImageMeta;
use voxel_buffer::Index;
use voxel_buffer::RescaleSlopeAndIntercept;
use voxel_buffer::Size;
use voxel_buffer::WindowLevel;
use voxel_buffer::WindowPreset;

fn ct_meta() -> ImageMeta {
    ImageMeta::from_json(r#"{"Modality": "CT", "BitsStored": 12}"#).expect("meta json")
}

fn with_meta(mut image: Image<i16>, meta: ImageMeta) -> Image<i16> {
    image.set_meta(meta);
    image
}

#[test]
fn slices_stream_in_any_order() {
    let mut volume = with_meta(axial_slice(3, 2, 10.0, 1i16, "s1"), ct_meta());
    for (z, value, uid) in [(12.5, 3, "s3"), (11.0, 2, "s2"), (9.0, 0, "s0")] {
        let slice = with_meta(axial_slice(3, 2, z, value, uid), ct_meta());
        volume.append_slice(&slice, 0).expect("slice should append");
    }

    assert_eq!(volume.geometry().size().values(), &[3, 2, 4]);
    assert_eq!(volume.image_uids(), &["s0", "s1", "s2", "s3"]);
    for k in 0..4 {
        assert_eq!(volume.value(2, 1, k, 0), k as i16);
    }
    let uid = volume.image_uid(Some(&Index::from([0, 0, 2])));
    assert_eq!(uid, Some("s2"));
}

#[test]
fn missing_meta_aborts_the_append() {
    let mut volume = with_meta(axial_slice(3, 2, 0.0, 1i16, "a"), ct_meta());
    let mut meta = ImageMeta::default();
    meta.insert("Modality", "CT");
    let slice = with_meta(axial_slice(3, 2, 1.0, 2i16, "b"), meta);

    assert_eq!(
        volume.append_slice(&slice, 0),
        Err(ImageError::MissingMeta("BitsStored".to_string()))
    );
    assert_eq!(volume.buffer().len(), 6);
    assert_eq!(volume.image_uids(), &["a"]);
}

#[test]
fn geometry_mismatches_name_the_property() {
    let mut volume = axial_slice(3, 2, 0.0, 1i16, "a");

    let narrow = axial_slice(2, 2, 1.0, 2i16, "b");
    assert!(matches!(
        volume.append_slice(&narrow, 0),
        Err(ImageError::SliceMismatch { property, .. }) if property == "number of columns"
    ));

    let tilted = Image::new(
        Geometry::new(
            Point3::new(0.0, 0.0, 1.0),
            Size::new(vec![3, 2, 1]),
            Vector3::new(0.5, 0.5, 1.0),
            Matrix3::new(1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, -1.0, 0.0),
        ),
        vec![2i16; 6],
        vec!["c".into()],
    )
    .expect("tilted slice");
    assert!(matches!(
        volume.append_slice(&tilted, 0),
        Err(ImageError::SliceMismatch { property, .. }) if property == "orientation"
    ));

    let stack = Image::new(
        Geometry::from_size(Size::new(vec![3, 2, 2])),
        vec![0i16; 12],
        vec!["d".into()],
    )
    .expect("two slices");
    assert_eq!(volume.append_slice(&stack, 0), Err(ImageError::NotASingleSlice(2)));
    assert_eq!(volume.geometry().slice_count(), 1);
}

#[test]
fn window_presets_become_per_slice() {
    let shared = WindowLevel::new(40.0, 400.0);
    let other = WindowLevel::new(60.0, 300.0);
    let presets = |wl| BTreeMap::from([("soft".to_string(), WindowPreset::new("soft", wl))]);
    let meta = |wl| ImageMeta {
        window_presets: Some(presets(wl)),
        ..Default::default()
    };

    let mut volume = with_meta(axial_slice(2, 2, 0.0, 0i16, "a"), meta(shared));
    volume
        .append_slice(&with_meta(axial_slice(2, 2, 2.0, 0i16, "c"), meta(shared)), 0)
        .expect("same preset");
    assert!(!volume.meta().window_presets.as_ref().expect("presets")["soft"].perslice);

    volume
        .append_slice(&with_meta(axial_slice(2, 2, 1.0, 0i16, "b"), meta(other)), 0)
        .expect("other preset");
    let preset = &volume.meta().window_presets.as_ref().expect("presets")["soft"];
    assert!(preset.perslice);
    assert_eq!(preset.wl, vec![shared, other, shared]);
}

#[test]
fn rescale_values_follow_their_slice() {
    let mut volume = axial_slice(2, 2, 0.0, 10i16, "a");
    let mut slice = axial_slice(2, 2, -1.0, 10i16, "b");
    slice
        .set_rescale_slope_and_intercept(RescaleSlopeAndIntercept::new(1.0, -5.0), None)
        .expect("constant rsi");
    volume.append_slice(&slice, 0).expect("append");

    // the new slice went in front
    assert_eq!(volume.rescaled_value(0, 0, 0, 0), 5.0);
    assert_eq!(volume.rescaled_value(0, 0, 1, 0), 10.0);
    assert_eq!(
        volume.rescale_slope_and_intercept(Some(&Index::from([0, 0, 0]))),
        Ok(RescaleSlopeAndIntercept::new(1.0, -5.0))
    );
}

#[test]
fn frames_stream_in_with_notifications() {
    let mut volume = axial_slice(2, 2, 0.0, 1u8, "a");
    volume.meta_mut().number_of_files = Some(3);

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);
    let listener = volume.add_event_listener(ImageEventType::AppendFrame, move |event| {
        sink.lock().expect("listener lock").push(event.frame_index);
    });

    volume.append_frame_buffer(&[2; 4], 1).expect("frame 1");
    volume.append_frame_buffer(&[3; 4], 2).expect("frame 2");
    assert_eq!(volume.geometry().frame_count(), 3);
    assert_eq!(volume.value(1, 1, 0, 2), 3);
    assert_eq!(
        volume.append_frame_buffer(&[4; 4], 3),
        Err(ImageError::FrameIndexOutOfRange { index: 3, count: 3 })
    );

    assert!(volume.remove_event_listener(ImageEventType::AppendFrame, listener));
    volume.append_frame();
    assert_eq!(*received.lock().expect("listener lock"), vec![1, 2]);

    // clones do not notify
    let copy = volume.clone();
    assert_eq!(copy.geometry().frame_count(), 4);
}

#[test]
fn later_frames_are_filled_slice_by_slice() {
    let mut volume = axial_slice(2, 1, 0.0, 1u8, "a0");
    volume
        .append_slice(&axial_slice(2, 1, 1.0, 2u8, "b0"), 0)
        .expect("second slice");
    volume.append_frame();
    volume
        .append_slice(&axial_slice(2, 1, 1.0, 4u8, "b1"), 1)
        .expect("frame 1 slice 1");
    volume
        .append_slice(&axial_slice(2, 1, 0.0, 3u8, "a1"), 1)
        .expect("frame 1 slice 0");

    assert_eq!(volume.buffer(), &[1, 1, 2, 2, 3, 3, 4, 4]);
    assert_eq!(volume.image_uids(), &["a0", "b0", "a1", "b1"]);
    assert_eq!(volume.geometry().origins().len(), 2);
}

#[test]
fn meta_round_trips_through_json() {
    let mut meta = ct_meta();
    meta.number_of_files = Some(120);
    let json = meta.to_json().expect("serialize");
    assert_eq!(ImageMeta::from_json(&json).expect("deserialize"), meta);
}

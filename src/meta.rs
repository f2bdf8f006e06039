use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::error::ImageError;

/// Window center and width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowLevel {
    pub center: f64,
    pub width: f64,
}

impl WindowLevel {
    pub fn new(center: f64, width: f64) -> Self {
        Self { center, width }
    }
}

/// A named window preset. `wl` holds one value for all slices, or one per
/// slice once `perslice` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindowPreset {
    pub wl: Vec<WindowLevel>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub perslice: bool,
}

impl WindowPreset {
    pub fn new(name: impl Into<String>, wl: WindowLevel) -> Self {
        Self {
            wl: vec![wl],
            name: name.into(),
            perslice: false,
        }
    }

    /// Window level for `slice`, falling back to the shared value.
    pub fn window_level(&self, slice: usize) -> Option<&WindowLevel> {
        if self.perslice {
            self.wl.get(slice)
        } else {
            self.wl.first()
        }
    }
}

/// Image meta data: an open key/value mapping plus the two keys that are
/// allowed to differ between appended slices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_presets: Option<BTreeMap<String, WindowPreset>>,
    /// Declared number of slices/frames, used to size the buffer up front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_files: Option<usize>,
    #[serde(flatten)]
    pub values: BTreeMap<String, Value>,
}

impl ImageMeta {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Checks that `other` carries every key of this meta with the same value.
    pub fn check_consistency(&self, other: &ImageMeta) -> Result<(), ImageError> {
        for (key, value) in &self.values {
            match other.values.get(key) {
                None => return Err(ImageError::MissingMeta(key.clone())),
                Some(found) if found != value => {
                    return Err(ImageError::SliceMismatch {
                        property: key.clone(),
                        expected: value.to_string(),
                        found: found.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Merges the presets of a slice inserted at `slice_index` into an image
    /// that held `number_of_images` slices. A preset whose value differs from
    /// the shared one becomes per-slice, back-filled with the shared value.
    pub(crate) fn merge_window_presets(
        &mut self,
        incoming: &BTreeMap<String, WindowPreset>,
        slice_index: usize,
        number_of_images: usize,
    ) {
        let Some(presets) = self.window_presets.as_mut() else {
            return;
        };
        for (key, incoming_preset) in incoming {
            let Some(preset) = presets.get_mut(key) else {
                presets.insert(key.clone(), incoming_preset.clone());
                continue;
            };
            let Some(incoming_wl) = incoming_preset.wl.first().copied() else {
                continue;
            };
            if !preset.perslice && preset.wl.first() != Some(&incoming_wl) {
                preset.perslice = true;
                if let Some(shared) = preset.wl.first().copied() {
                    preset.wl.resize(number_of_images.max(1), shared);
                }
            }
            if preset.perslice {
                let at = slice_index.min(preset.wl.len());
                preset.wl.insert(at, incoming_wl);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn excluded_keys_are_typed() {
        let meta = ImageMeta::from_json(
            r#"{
                "Modality": "CT",
                "numberOfFiles": 12,
                "windowPresets": {"soft": {"wl": [{"center": 40, "width": 400}], "name": "soft"}}
            }"#,
        )
        .unwrap();
        assert_eq!(meta.number_of_files, Some(12));
        assert_eq!(meta.get("Modality"), Some(&json!("CT")));
        assert!(meta.get("numberOfFiles").is_none());
        let presets = meta.window_presets.as_ref().unwrap();
        assert_eq!(presets["soft"].wl, vec![WindowLevel::new(40.0, 400.0)]);
        assert!(!presets["soft"].perslice);
    }

    #[test]
    fn consistency_names_the_property() {
        let mut meta = ImageMeta::default();
        meta.insert("Modality", "CT");
        meta.insert("BitsStored", 12);

        let mut other = meta.clone();
        other.number_of_files = Some(3);
        assert!(meta.check_consistency(&other).is_ok());

        other.insert("BitsStored", 16);
        assert_eq!(
            meta.check_consistency(&other),
            Err(ImageError::SliceMismatch {
                property: "BitsStored".to_string(),
                expected: "12".to_string(),
                found: "16".to_string(),
            })
        );

        other.values.remove("Modality");
        assert_eq!(
            meta.check_consistency(&other),
            Err(ImageError::MissingMeta("Modality".to_string()))
        );
    }

    #[test]
    fn differing_preset_becomes_per_slice() {
        let shared = WindowLevel::new(40.0, 400.0);
        let mut meta = ImageMeta {
            window_presets: Some(BTreeMap::from([(
                "soft".to_string(),
                WindowPreset::new("soft", shared),
            )])),
            ..Default::default()
        };

        // same value: stays shared
        let same = BTreeMap::from([("soft".to_string(), WindowPreset::new("soft", shared))]);
        meta.merge_window_presets(&same, 1, 1);
        let preset = &meta.window_presets.as_ref().unwrap()["soft"];
        assert!(!preset.perslice);
        assert_eq!(preset.wl.len(), 1);

        let other = WindowLevel::new(50.0, 350.0);
        let incoming = BTreeMap::from([("soft".to_string(), WindowPreset::new("soft", other))]);
        meta.merge_window_presets(&incoming, 1, 3);
        let preset = &meta.window_presets.as_ref().unwrap()["soft"];
        assert!(preset.perslice);
        assert_eq!(preset.wl, vec![shared, other, shared, shared]);
        assert_eq!(preset.window_level(1), Some(&other));
    }
}

//! Device listing returned by `/available_webcams`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CameraError, CameraResult};

/// Identifier of the camera a client drives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CameraIndex {
    Number(u64),
    Name(String),
}

impl fmt::Display for CameraIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraIndex::Number(n) => write!(f, "{}", n),
            CameraIndex::Name(name) => f.write_str(name),
        }
    }
}

impl From<u64> for CameraIndex {
    fn from(value: u64) -> Self {
        CameraIndex::Number(value)
    }
}

impl From<u32> for CameraIndex {
    fn from(value: u32) -> Self {
        CameraIndex::Number(u64::from(value))
    }
}

impl From<&str> for CameraIndex {
    fn from(value: &str) -> Self {
        CameraIndex::Name(value.to_string())
    }
}

impl From<String> for CameraIndex {
    fn from(value: String) -> Self {
        CameraIndex::Name(value)
    }
}

impl CameraIndex {
    /// Parses a CLI/env value; decimal strings become numbers.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<u64>() {
            Ok(n) => CameraIndex::Number(n),
            Err(_) => CameraIndex::Name(trimmed.to_string()),
        }
    }
}

/// One entry of the advertised device list. Only `id` is interpreted; every
/// other field the service sends is kept untyped in `extra`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeviceInfo {
    pub id: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeviceInfo {
    /// The advertised `name`, when the service sends one as a string.
    pub fn name(&self) -> Option<&str> {
        self.extra.get("name").and_then(serde_json::Value::as_str)
    }

    /// Numeric ids match numeric indexes, string ids match string indexes.
    /// `0` and `"0"` are different devices.
    pub fn matches(&self, index: &CameraIndex) -> bool {
        match (&self.id, index) {
            (serde_json::Value::Number(id), CameraIndex::Number(n)) => id.as_u64() == Some(*n),
            (serde_json::Value::String(id), CameraIndex::Name(name)) => id == name,
            _ => false,
        }
    }
}

/// Parses the `/available_webcams` body. The body must be a JSON array;
/// entries that are not objects with an `id` are skipped with a warning.
pub fn parse_device_list(bytes: &[u8]) -> CameraResult<Vec<DeviceInfo>> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_slice(bytes).map_err(|e| CameraError::InvalidDeviceList(e.to_string()))?;

    let mut devices = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let has_id = entry.as_object().is_some_and(|obj| obj.contains_key("id"));
        if !has_id {
            log::warn!("skipping device entry {} without id: {}", position, entry);
            continue;
        }
        match serde_json::from_value::<DeviceInfo>(entry) {
            Ok(device) => devices.push(device),
            Err(err) => log::warn!("skipping device entry {}: {}", position, err),
        }
    }
    Ok(devices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_list_with_extra_fields() {
        let devices = parse_device_list(
            br#"[{"id": 0, "name": "Integrated", "resolution": [640, 480]}, {"id": "usb-2"}]"#,
        )
        .expect("parse");
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].name(), Some("Integrated"));
        assert!(devices[0].extra.contains_key("resolution"));
        assert!(devices[1].name().is_none());
    }

    #[test]
    fn non_string_name_does_not_break_the_list() {
        let devices = parse_device_list(br#"[{"id": 0, "name": 7}]"#).expect("parse");
        assert_eq!(devices.len(), 1);
        assert!(devices[0].name().is_none());
        assert_eq!(devices[0].extra.get("name"), Some(&serde_json::json!(7)));
        assert!(devices[0].matches(&CameraIndex::from(0u32)));
    }

    #[test]
    fn entries_without_id_are_skipped() {
        let devices =
            parse_device_list(br#"[{"id": 0}, {"label": "virtual"}, "loose", {"id": 2}]"#)
                .expect("parse");
        let ids: Vec<_> = devices.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec![serde_json::json!(0), serde_json::json!(2)]);

        let devices = parse_device_list(br#"[{"name": "no id"}]"#).expect("parse");
        assert!(devices.is_empty());
    }

    #[test]
    fn non_array_body_is_rejected() {
        assert!(parse_device_list(b"<html>down</html>").is_err());
        assert!(parse_device_list(br#"{"id": 0}"#).is_err());
    }

    #[test]
    fn ids_match_only_within_their_json_type() {
        let devices =
            parse_device_list(br#"[{"id": 3}, {"id": "front"}, {"id": "3"}]"#).expect("parse");
        assert!(devices[0].matches(&CameraIndex::from(3u32)));
        assert!(!devices[0].matches(&CameraIndex::from("3")));
        assert!(!devices[2].matches(&CameraIndex::from(3u32)));
        assert!(devices[2].matches(&CameraIndex::from("3")));
        assert!(!devices[0].matches(&CameraIndex::from(4u32)));
        assert!(devices[1].matches(&CameraIndex::from("front")));
        assert!(!devices[1].matches(&CameraIndex::from("back")));
    }

    #[test]
    fn negative_or_fractional_ids_never_match_numbers() {
        let devices = parse_device_list(br#"[{"id": -1}, {"id": 1.5}, {"id": null}]"#)
            .expect("parse");
        for device in &devices {
            assert!(!device.matches(&CameraIndex::from(1u32)));
        }
    }

    #[test]
    fn index_parse_prefers_numbers() {
        assert_eq!(CameraIndex::parse(" 2 "), CameraIndex::Number(2));
        assert_eq!(CameraIndex::parse("cam-a"), CameraIndex::Name("cam-a".into()));
        assert_eq!(CameraIndex::Number(7).to_string(), "7");
    }
}

//! Patient record types shared across the core.

use crate::constants::TIME_FIELD;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One vital point: an open field-map of measurement name to value.
///
/// The dataset stores numeric, string, or boolean values here. No schema is
/// enforced beyond the `time` field, which the service overwrites on every
/// response.
pub type Vital = serde_json::Map<String, serde_json::Value>;

/// Descriptive fields of one patient, without any vitals.
///
/// Loaded once per process and never mutated afterwards. Field names match
/// the dataset's wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientMetadata {
    #[serde(rename = "Identifier")]
    pub identifier: u64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Bed")]
    pub bed: String,
    #[serde(rename = "Gender")]
    pub gender: String,
    #[serde(rename = "Age")]
    pub age: u32,
}

/// The externally visible composite: one patient's metadata plus exactly one
/// vital point. Constructed fresh per response, never persisted beyond the
/// snapshot store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientVitals {
    #[serde(flatten)]
    pub patient: PatientMetadata,
    #[serde(rename = "Vital")]
    pub vital: Vital,
}

/// Overwrite the `time` field of every vital point with `at`, RFC 3339.
pub fn stamp_time(vitals: &mut [PatientVitals], at: DateTime<Utc>) {
    let stamp = serde_json::Value::String(at.to_rfc3339());
    for entry in vitals {
        entry
            .vital
            .insert(TIME_FIELD.to_owned(), stamp.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_view() -> PatientVitals {
        let mut vital = Vital::new();
        vital.insert("heart_rate".into(), serde_json::json!(72));
        vital.insert("time".into(), serde_json::json!("2020-01-01T00:00:00Z"));
        PatientVitals {
            patient: PatientMetadata {
                identifier: 7,
                name: "Ada Lovelace".into(),
                bed: "ICU-3".into(),
                gender: "F".into(),
                age: 36,
            },
            vital,
        }
    }

    #[test]
    fn test_stamp_time_overwrites_historical_timestamp() {
        let mut views = vec![sample_view()];
        let at = "2024-06-01T12:00:00Z".parse::<DateTime<Utc>>().unwrap();

        stamp_time(&mut views, at);

        assert_eq!(
            views[0].vital.get("time").and_then(|v| v.as_str()),
            Some(at.to_rfc3339().as_str())
        );
        // Other measurements pass through unchanged.
        assert_eq!(
            views[0].vital.get("heart_rate"),
            Some(&serde_json::json!(72))
        );
    }

    #[test]
    fn test_view_serialises_with_wire_field_names() {
        let view = sample_view();
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["Identifier"], serde_json::json!(7));
        assert_eq!(json["Name"], serde_json::json!("Ada Lovelace"));
        assert_eq!(json["Bed"], serde_json::json!("ICU-3"));
        assert_eq!(json["Gender"], serde_json::json!("F"));
        assert_eq!(json["Age"], serde_json::json!(36));
        assert_eq!(json["Vital"]["heart_rate"], serde_json::json!(72));
    }
}

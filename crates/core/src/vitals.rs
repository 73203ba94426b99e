//! Positional vital reads.
//!
//! Every call performs a fresh forward pass over the dataset. For each
//! record the pass decodes exactly one vital point, the one at the requested
//! index, and ignores everything else, so memory stays bounded by a single
//! record no matter how large the dataset grows. Metadata is paired by
//! arrival order from the already-loaded roster, never re-decoded.
//!
//! The decoding is driven by two `DeserializeSeed` implementations rather
//! than an implicit callback chain, so each transition (walking the record's
//! fields, skipping to the target index, draining the remainder) is a small
//! unit that can be tested on its own.

use crate::constants::VITALS_FIELD;
use crate::error::{VitalsError, VitalsResult};
use crate::patient::{PatientVitals, Vital};
use crate::roster::PatientRoster;
use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Walks one record object and extracts the vital point at `index` from its
/// `Vitals` field. Every other field is ignored.
struct RecordVital {
    index: usize,
}

impl<'de> DeserializeSeed<'de> for RecordVital {
    type Value = Option<Vital>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(self)
    }
}

impl<'de> Visitor<'de> for RecordVital {
    type Value = Option<Vital>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("a patient record object")
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut vital = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == VITALS_FIELD {
                vital = map.next_value_seed(NthVital { index: self.index })?;
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(vital)
    }
}

/// Skips `index` elements of the vital array, decodes the next one, then
/// drains the rest without retaining anything. Returns `None` when the array
/// is too short.
struct NthVital {
    index: usize,
}

impl<'de> DeserializeSeed<'de> for NthVital {
    type Value = Option<Vital>;

    fn deserialize<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for NthVital {
    type Value = Option<Vital>;

    fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("an array of vital points")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut skipped = 0;
        while skipped < self.index {
            if seq.next_element::<IgnoredAny>()?.is_none() {
                return Ok(None);
            }
            skipped += 1;
        }

        let vital = seq.next_element::<Vital>()?;

        // The record must parse to the end of its array either way.
        while seq.next_element::<IgnoredAny>()?.is_some() {}

        Ok(vital)
    }
}

fn vital_at(line: &str, index: usize) -> Result<Option<Vital>, serde_json::Error> {
    let mut deserializer = serde_json::Deserializer::from_str(line);
    let vital = RecordVital { index }.deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(vital)
}

/// Read the vital point at `index` for every patient in the roster.
///
/// A pure read: the dataset is streamed once and no state is touched. The
/// pass stops pulling lines as soon as every roster entry has its pair, so
/// records appended after the roster was loaded are never decoded.
///
/// # Errors
/// - `InvalidIndex` if `index` is outside the roster's vitals range, checked
///   before any I/O
/// - `MissingVital` if a record's vital array has shrunk below `index + 1`
///   since the roster was loaded
/// - `MissingRecord` if the dataset now has fewer records than the roster
/// - `DatasetRead` / `RecordParse` if the pass itself fails
pub fn vitals_at_index(
    path: &Path,
    roster: &PatientRoster,
    index: usize,
) -> VitalsResult<Vec<PatientVitals>> {
    if index >= roster.vitals_len() {
        return Err(VitalsError::InvalidIndex {
            index,
            total: roster.vitals_len(),
        });
    }

    let file = File::open(path).map_err(VitalsError::DatasetRead)?;
    let reader = BufReader::new(file);

    let expected = roster.patient_count();
    let mut views: Vec<PatientVitals> = Vec::with_capacity(expected);
    let mut lines = reader.lines().enumerate();

    while views.len() < expected {
        let Some((number, line)) = lines.next() else {
            break;
        };
        let line = line.map_err(VitalsError::DatasetRead)?;
        if line.trim().is_empty() {
            continue;
        }

        let patient = &roster.patients()[views.len()];
        let vital = vital_at(&line, index).map_err(|source| VitalsError::RecordParse {
            line: number + 1,
            source,
        })?;

        match vital {
            Some(vital) => views.push(PatientVitals {
                patient: patient.clone(),
                vital,
            }),
            None => {
                return Err(VitalsError::MissingVital {
                    identifier: patient.identifier,
                    index,
                })
            }
        }
    }

    if views.len() < expected {
        // The dataset lost records since the roster was loaded.
        return Err(VitalsError::MissingRecord {
            identifier: roster.patients()[views.len()].identifier,
        });
    }

    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn record(identifier: u64, vitals: usize) -> String {
        let points: Vec<String> = (0..vitals)
            .map(|i| {
                format!(
                    r#"{{"heart_rate": {}, "spo2": 9{i}, "time": "2020-01-01T00:0{i}:00Z"}}"#,
                    60 + identifier * 10 + i as u64
                )
            })
            .collect();
        format!(
            r#"{{"Identifier": {identifier}, "Name": "Patient {identifier}", "Bed": "B-{identifier}", "Gender": "M", "Age": 51, "Vitals": [{}]}}"#,
            points.join(", ")
        )
    }

    fn write_lines(dir: &TempDir, lines: &[String]) -> std::path::PathBuf {
        let path = dir.path().join("patients.jsonl");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    fn loaded(dir: &TempDir, lines: &[String]) -> (std::path::PathBuf, PatientRoster) {
        let path = write_lines(dir, lines);
        let roster = PatientRoster::load(&path).unwrap();
        (path, roster)
    }

    #[test]
    fn test_fetch_pairs_every_patient_once() {
        let temp = TempDir::new().unwrap();
        let (path, roster) = loaded(&temp, &[record(1, 4), record(2, 4), record(3, 4)]);

        for index in 0..roster.vitals_len() {
            let views = vitals_at_index(&path, &roster, index).unwrap();
            assert_eq!(views.len(), 3);
            let mut ids: Vec<u64> = views.iter().map(|v| v.patient.identifier).collect();
            ids.dedup();
            assert_eq!(ids, vec![1, 2, 3]);
        }
    }

    #[test]
    fn test_fetch_selects_the_requested_index() {
        let temp = TempDir::new().unwrap();
        let (path, roster) = loaded(&temp, &[record(1, 3)]);

        let views = vitals_at_index(&path, &roster, 2).unwrap();
        // Patient 1, point 2: heart_rate = 60 + 10 + 2.
        assert_eq!(
            views[0].vital.get("heart_rate"),
            Some(&serde_json::json!(72))
        );
        assert_eq!(views[0].vital.get("spo2"), Some(&serde_json::json!(92)));
    }

    #[test]
    fn test_fetch_out_of_range_index_fails_before_io() {
        let temp = TempDir::new().unwrap();
        let (path, roster) = loaded(&temp, &[record(1, 4)]);

        // Delete the file: the range check must come first.
        std::fs::remove_file(&path).unwrap();

        match vitals_at_index(&path, &roster, 4) {
            Err(VitalsError::InvalidIndex { index, total }) => {
                assert_eq!(index, 4);
                assert_eq!(total, 4);
            }
            other => panic!("expected InvalidIndex, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_reports_vital_lost_since_load() {
        let temp = TempDir::new().unwrap();
        let (path, roster) = loaded(&temp, &[record(1, 4), record(2, 4)]);

        // Rewrite patient 2 with a shorter vitals array after the load.
        std::fs::write(&path, format!("{}\n{}\n", record(1, 4), record(2, 2))).unwrap();

        match vitals_at_index(&path, &roster, 3) {
            Err(VitalsError::MissingVital { identifier, index }) => {
                assert_eq!(identifier, 2);
                assert_eq!(index, 3);
            }
            other => panic!("expected MissingVital, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_reports_record_lost_since_load() {
        let temp = TempDir::new().unwrap();
        let (path, roster) = loaded(&temp, &[record(1, 2), record(2, 2)]);

        std::fs::write(&path, format!("{}\n", record(1, 2))).unwrap();

        match vitals_at_index(&path, &roster, 0) {
            Err(VitalsError::MissingRecord { identifier }) => assert_eq!(identifier, 2),
            other => panic!("expected MissingRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_ignores_records_appended_after_load() {
        let temp = TempDir::new().unwrap();
        let (path, roster) = loaded(&temp, &[record(1, 2), record(2, 2)]);

        // Append a record that is not even valid JSON: the pass must stop
        // before reaching it once the roster is satisfied.
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "this line must never be decoded").unwrap();

        let views = vitals_at_index(&path, &roster, 1).unwrap();
        assert_eq!(views.len(), 2);
    }

    #[test]
    fn test_fetch_is_a_pure_read() {
        let temp = TempDir::new().unwrap();
        let (path, roster) = loaded(&temp, &[record(1, 3), record(2, 3)]);

        let first = vitals_at_index(&path, &roster, 1).unwrap();
        let second = vitals_at_index(&path, &roster, 1).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nth_vital_seed_short_array_yields_none() {
        let vital = vital_at(r#"{"Vitals": [{"a": 1}, {"a": 2}]}"#, 5).unwrap();
        assert!(vital.is_none());
    }

    #[test]
    fn test_record_seed_ignores_field_order() {
        // Vitals before the metadata fields.
        let vital = vital_at(
            r#"{"Vitals": [{"a": 1}, {"a": 2}], "Identifier": 1, "Name": "n"}"#,
            1,
        )
        .unwrap()
        .unwrap();
        assert_eq!(vital.get("a"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn test_record_seed_without_vitals_field_yields_none() {
        let vital = vital_at(r#"{"Identifier": 1}"#, 0).unwrap();
        assert!(vital.is_none());
    }
}

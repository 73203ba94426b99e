//! One-pass roster loading.
//!
//! The roster is the ordered list of patient metadata plus the number of
//! vital points every patient is expected to carry. It is built from a
//! single forward pass over the dataset; vital values are counted but never
//! retained, so loading a dataset with millions of vital points costs the
//! same memory as loading its metadata alone.

use crate::error::{VitalsError, VitalsResult};
use crate::patient::PatientMetadata;
use serde::de::{Deserializer, IgnoredAny, SeqAccess, Visitor};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// The immutable outcome of the metadata pass.
///
/// Safe for unsynchronised concurrent reads once loaded: nothing mutates a
/// roster for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct PatientRoster {
    patients: Vec<PatientMetadata>,
    vitals_len: usize,
}

/// One dataset line, with the `Vitals` array reduced to its length.
#[derive(Debug, Deserialize)]
struct MetadataRow {
    #[serde(rename = "Identifier")]
    identifier: u64,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Bed")]
    bed: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Age")]
    age: u32,
    #[serde(rename = "Vitals", deserialize_with = "vital_count")]
    vitals_len: usize,
}

/// Count the elements of the `Vitals` array without keeping any of them.
///
/// Each element is decoded as `IgnoredAny`, so only the array boundaries are
/// observed; no vital value survives the pass.
fn vital_count<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    struct CountVitals;

    impl<'de> Visitor<'de> for CountVitals {
        type Value = usize;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("an array of vital points")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut count = 0;
            while seq.next_element::<IgnoredAny>()?.is_some() {
                count += 1;
            }
            Ok(count)
        }
    }

    deserializer.deserialize_seq(CountVitals)
}

impl PatientRoster {
    /// Load the roster from the dataset at `path`.
    ///
    /// A single streaming pass visits every record: the full metadata list is
    /// needed, so the pass never stops early, but it holds only the record
    /// currently being decoded. The first record fixes the dataset-wide
    /// vitals length; later records must carry at least that many vital
    /// points (extra trailing points are tolerated but never addressable).
    ///
    /// # Errors
    /// - `DatasetRead` if the file cannot be opened or read
    /// - `RecordParse` if a line is not a valid patient record
    /// - `EmptyDataset` if no records are found
    /// - `MissingVital` if the first record has no vital points, or a later
    ///   record has fewer than the first
    pub fn load(path: &Path) -> VitalsResult<Self> {
        let file = File::open(path).map_err(VitalsError::DatasetRead)?;
        let reader = BufReader::new(file);

        let mut patients: Vec<PatientMetadata> = Vec::new();
        let mut vitals_len: Option<usize> = None;

        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(VitalsError::DatasetRead)?;
            if line.trim().is_empty() {
                continue;
            }

            let row: MetadataRow = serde_json::from_str(&line).map_err(|source| {
                VitalsError::RecordParse {
                    line: number + 1,
                    source,
                }
            })?;

            match vitals_len {
                None => {
                    if row.vitals_len == 0 {
                        return Err(VitalsError::MissingVital {
                            identifier: row.identifier,
                            index: 0,
                        });
                    }
                    vitals_len = Some(row.vitals_len);
                }
                Some(expected) if row.vitals_len < expected => {
                    // First index this record cannot serve.
                    return Err(VitalsError::MissingVital {
                        identifier: row.identifier,
                        index: row.vitals_len,
                    });
                }
                Some(_) => {}
            }

            patients.push(PatientMetadata {
                identifier: row.identifier,
                name: row.name,
                bed: row.bed,
                gender: row.gender,
                age: row.age,
            });
        }

        match vitals_len {
            Some(vitals_len) => Ok(Self {
                patients,
                vitals_len,
            }),
            None => Err(VitalsError::EmptyDataset),
        }
    }

    pub fn patients(&self) -> &[PatientMetadata] {
        &self.patients
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// Vital points per patient, fixed by the first record at load time.
    pub fn vitals_len(&self) -> usize {
        self.vitals_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_dataset(dir: &TempDir, lines: &[&str]) -> std::path::PathBuf {
        let path = dir.path().join("patients.jsonl");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    fn record(identifier: u64, vitals: usize) -> String {
        let points: Vec<String> = (0..vitals)
            .map(|i| format!(r#"{{"heart_rate": {}, "time": "2020-01-01T00:0{i}:00Z"}}"#, 60 + i))
            .collect();
        format!(
            r#"{{"Identifier": {identifier}, "Name": "Patient {identifier}", "Bed": "B-{identifier}", "Gender": "F", "Age": 40, "Vitals": [{}]}}"#,
            points.join(", ")
        )
    }

    #[test]
    fn test_load_builds_ordered_roster() {
        let temp = TempDir::new().unwrap();
        let lines = [record(1, 4), record(2, 4), record(3, 4)];
        let path = write_dataset(&temp, &[&lines[0], &lines[1], &lines[2]]);

        let roster = PatientRoster::load(&path).unwrap();

        assert_eq!(roster.patient_count(), 3);
        assert_eq!(roster.vitals_len(), 4);
        let ids: Vec<u64> = roster.patients().iter().map(|p| p.identifier).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(roster.patients()[0].name, "Patient 1");
        assert_eq!(roster.patients()[2].bed, "B-3");
    }

    #[test]
    fn test_load_skips_blank_lines() {
        let temp = TempDir::new().unwrap();
        let lines = [record(1, 2), String::new(), record(2, 2)];
        let path = write_dataset(&temp, &[&lines[0], &lines[1], &lines[2]]);

        let roster = PatientRoster::load(&path).unwrap();
        assert_eq!(roster.patient_count(), 2);
    }

    #[test]
    fn test_load_empty_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = write_dataset(&temp, &[]);

        let roster = PatientRoster::load(&path);
        assert!(matches!(roster, Err(VitalsError::EmptyDataset)));
    }

    #[test]
    fn test_load_malformed_line_reports_line_number() {
        let temp = TempDir::new().unwrap();
        let lines = [record(1, 2), "not json".to_string()];
        let path = write_dataset(&temp, &[&lines[0], &lines[1]]);

        match PatientRoster::load(&path) {
            Err(VitalsError::RecordParse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected RecordParse, got {other:?}"),
        }
    }

    #[test]
    fn test_load_first_record_without_vitals_fails() {
        let temp = TempDir::new().unwrap();
        let lines = [record(9, 0)];
        let path = write_dataset(&temp, &[&lines[0]]);

        match PatientRoster::load(&path) {
            Err(VitalsError::MissingVital { identifier, index }) => {
                assert_eq!(identifier, 9);
                assert_eq!(index, 0);
            }
            other => panic!("expected MissingVital, got {other:?}"),
        }
    }

    #[test]
    fn test_load_shorter_later_record_fails() {
        let temp = TempDir::new().unwrap();
        let lines = [record(1, 4), record(2, 3)];
        let path = write_dataset(&temp, &[&lines[0], &lines[1]]);

        match PatientRoster::load(&path) {
            Err(VitalsError::MissingVital { identifier, index }) => {
                assert_eq!(identifier, 2);
                assert_eq!(index, 3);
            }
            other => panic!("expected MissingVital, got {other:?}"),
        }
    }

    #[test]
    fn test_load_tolerates_longer_later_record() {
        let temp = TempDir::new().unwrap();
        let lines = [record(1, 2), record(2, 5)];
        let path = write_dataset(&temp, &[&lines[0], &lines[1]]);

        let roster = PatientRoster::load(&path).unwrap();
        // The first record fixes the addressable range.
        assert_eq!(roster.vitals_len(), 2);
    }
}

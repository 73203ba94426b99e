//! The single-slot snapshot store.

use crate::error::{VitalsError, VitalsResult};
use crate::patient::PatientVitals;
use chrono::{DateTime, Utc};

/// A frozen copy of the vitals set at one position.
///
/// The patient list length equals the roster length at the time of the save
/// that produced it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub id: u64,
    pub captured_at: DateTime<Utc>,
    pub patients: Vec<PatientVitals>,
}

/// Holds at most one snapshot plus a monotonically increasing identifier.
///
/// Identifiers start at 0 and grow by exactly 1 per save; they are never
/// reused, even though each save fully replaces the stored snapshot.
/// Decoupled from the live cursor: later cursor movement never touches a
/// stored snapshot.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    last_id: u64,
    saved: Option<Snapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `patients` as the new snapshot, replacing any previous one, and
    /// return the freshly minted identifier.
    pub fn save(&mut self, patients: Vec<PatientVitals>, captured_at: DateTime<Utc>) -> u64 {
        self.last_id += 1;
        self.saved = Some(Snapshot {
            id: self.last_id,
            captured_at,
            patients,
        });
        self.last_id
    }

    /// The stored identifier and a copy of the patient views.
    ///
    /// # Errors
    /// `NoSnapshot` if no save has ever occurred.
    pub fn read(&self) -> VitalsResult<(u64, Vec<PatientVitals>)> {
        match &self.saved {
            Some(snapshot) => Ok((snapshot.id, snapshot.patients.clone())),
            None => Err(VitalsError::NoSnapshot),
        }
    }

    /// The stored identifier and patient count, without copying the views.
    ///
    /// # Errors
    /// `NoSnapshot` if no save has ever occurred.
    pub fn info(&self) -> VitalsResult<(u64, usize)> {
        match &self.saved {
            Some(snapshot) => Ok((snapshot.id, snapshot.patients.len())),
            None => Err(VitalsError::NoSnapshot),
        }
    }

    pub fn current_id(&self) -> Option<u64> {
        self.saved.as_ref().map(|snapshot| snapshot.id)
    }
}

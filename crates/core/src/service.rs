//! The vitals service: composition root for the core.
//!
//! Owns the loaded roster, the rotating cursor, and the snapshot store, and
//! exposes the operations consumed by the transport layer. Cursor and
//! snapshot state live behind one mutex: an `advance` followed by a save
//! that reads `current` must observe a consistent pair, and two concurrent
//! advances must not read the same `current`. The roster itself is immutable
//! after `initialise`, so it is read without synchronisation, and every
//! positional read opens its own pass over the dataset.

use crate::config::CoreConfig;
use crate::cursor::RotatingCursor;
use crate::error::VitalsResult;
use crate::patient::{stamp_time, PatientVitals};
use crate::roster::PatientRoster;
use crate::snapshot::SnapshotStore;
use crate::vitals;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// Cursor and snapshot registers: the single mutual-exclusion domain.
#[derive(Debug)]
struct SharedState {
    cursor: RotatingCursor,
    snapshots: SnapshotStore,
}

/// Everything `status()` reports.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub current_index: usize,
    pub previous_index: usize,
    pub total_vitals: usize,
    pub total_patients: usize,
    pub has_snapshot: bool,
    pub current_snapshot_id: Option<u64>,
}

/// Outcome of one cursor advance.
#[derive(Debug, Clone, Copy)]
pub struct CursorAdvance {
    pub new_index: usize,
    pub total_vitals: usize,
}

/// Receipt handed back by a snapshot save.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotReceipt {
    pub snapshot_id: u64,
    pub captured_at: DateTime<Utc>,
    pub patient_count: usize,
}

/// A full snapshot read, with `time` restamped at the read instant.
#[derive(Debug)]
pub struct SnapshotView {
    pub snapshot_id: u64,
    pub patients: Vec<PatientVitals>,
}

/// Snapshot identifier and size, without the views.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotInfo {
    pub snapshot_id: u64,
    pub patient_count: usize,
}

/// Pure vitals operations - no API concerns.
#[derive(Debug)]
pub struct VitalsService {
    cfg: Arc<CoreConfig>,
    roster: PatientRoster,
    state: Mutex<SharedState>,
}

impl VitalsService {
    /// Load the roster and build a ready service.
    ///
    /// Runs the one-pass metadata load; until it succeeds no other operation
    /// exists, which is what keeps a half-loaded service from ever serving.
    ///
    /// # Errors
    /// Any roster load failure (`EmptyDataset`, `DatasetRead`,
    /// `RecordParse`, `MissingVital`) is fatal and surfaced to the caller.
    pub fn initialise(cfg: Arc<CoreConfig>) -> VitalsResult<Self> {
        let started = Instant::now();
        let roster = PatientRoster::load(cfg.data_file())?;
        tracing::info!(
            patients = roster.patient_count(),
            vitals = roster.vitals_len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded patient roster"
        );

        let cursor = RotatingCursor::new(roster.vitals_len());
        Ok(Self {
            cfg,
            roster,
            state: Mutex::new(SharedState {
                cursor,
                snapshots: SnapshotStore::new(),
            }),
        })
    }

    fn state(&self) -> MutexGuard<'_, SharedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cursor position, totals, and snapshot presence. Always succeeds.
    pub fn status(&self) -> StatusReport {
        let state = self.state();
        StatusReport {
            current_index: state.cursor.current(),
            previous_index: state.cursor.previous(),
            total_vitals: self.roster.vitals_len(),
            total_patients: self.roster.patient_count(),
            has_snapshot: state.snapshots.current_id().is_some(),
            current_snapshot_id: state.snapshots.current_id(),
        }
    }

    /// The vital point at the cursor's current index for every patient.
    pub fn current(&self) -> VitalsResult<Vec<PatientVitals>> {
        let index = self.state().cursor.current();
        self.at_index(index)
    }

    /// The vital point at the cursor's previous index for every patient.
    pub fn previous(&self) -> VitalsResult<Vec<PatientVitals>> {
        let index = self.state().cursor.previous();
        self.at_index(index)
    }

    /// Stream the dataset and return the vital point at `index` for every
    /// patient, each stamped with the call instant.
    ///
    /// # Errors
    /// `InvalidIndex` for an out-of-range index; `MissingVital` or
    /// `MissingRecord` when the dataset has drifted since the roster load.
    /// Neither mutates cursor or snapshot state.
    pub fn at_index(&self, index: usize) -> VitalsResult<Vec<PatientVitals>> {
        let mut views = vitals::vitals_at_index(self.cfg.data_file(), &self.roster, index)?;
        stamp_time(&mut views, Utc::now());
        Ok(views)
    }

    /// Advance the cursor, wrapping at the end of the vitals range.
    pub fn advance(&self) -> CursorAdvance {
        let mut state = self.state();
        let new_index = state.cursor.advance();
        tracing::debug!(new_index, "advanced vitals cursor");
        CursorAdvance {
            new_index,
            total_vitals: self.roster.vitals_len(),
        }
    }

    /// Freeze the current vitals set into the snapshot store.
    ///
    /// The position is read under the lock; the scan runs outside it, so
    /// concurrent advances are never blocked on dataset I/O. The captured
    /// views are stamped with the capture instant before storing.
    pub fn save_snapshot(&self) -> VitalsResult<SnapshotReceipt> {
        let index = self.state().cursor.current();
        let mut views = vitals::vitals_at_index(self.cfg.data_file(), &self.roster, index)?;

        let captured_at = Utc::now();
        stamp_time(&mut views, captured_at);
        let patient_count = views.len();

        let snapshot_id = self.state().snapshots.save(views, captured_at);
        tracing::debug!(snapshot_id, index, "saved vitals snapshot");

        Ok(SnapshotReceipt {
            snapshot_id,
            captured_at,
            patient_count,
        })
    }

    /// The saved snapshot, with every `time` rewritten to the read instant.
    ///
    /// # Errors
    /// `NoSnapshot` if nothing has been saved.
    pub fn snapshot(&self) -> VitalsResult<SnapshotView> {
        let (snapshot_id, mut patients) = self.state().snapshots.read()?;
        stamp_time(&mut patients, Utc::now());
        Ok(SnapshotView {
            snapshot_id,
            patients,
        })
    }

    /// Snapshot identifier and patient count, without the views.
    ///
    /// # Errors
    /// `NoSnapshot` if nothing has been saved.
    pub fn snapshot_info(&self) -> VitalsResult<SnapshotInfo> {
        let (snapshot_id, patient_count) = self.state().snapshots.info()?;
        Ok(SnapshotInfo {
            snapshot_id,
            patient_count,
        })
    }
}

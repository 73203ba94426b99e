//! # Vitals Core
//!
//! Core business logic for the patient vitals rotation service.
//!
//! This crate contains pure data operations over a line-oriented patient
//! dataset:
//! - One-pass roster loading (patient metadata and the shared vitals length,
//!   no vital values retained)
//! - Positional vital reads that stream the dataset and hold at most one
//!   record's vital point in memory at a time
//! - The rotating cursor and snapshot store shared by all requests
//!
//! **No API concerns**: HTTP servers, OpenAPI schemas, or request routing
//! belong in `api-rest`.

pub mod config;
pub mod constants;
pub mod cursor;
pub mod error;
pub mod patient;
pub mod roster;
pub mod service;
pub mod snapshot;
pub mod vitals;

pub use config::CoreConfig;
pub use cursor::RotatingCursor;
pub use error::{VitalsError, VitalsResult};
pub use patient::{PatientMetadata, PatientVitals, Vital};
pub use roster::PatientRoster;
pub use service::{
    CursorAdvance, SnapshotInfo, SnapshotReceipt, SnapshotView, StatusReport, VitalsService,
};
pub use snapshot::{Snapshot, SnapshotStore};

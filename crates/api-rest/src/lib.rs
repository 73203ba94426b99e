//! # API REST
//!
//! REST surface for the patient vitals rotation service.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, status mapping)
//!
//! All data access goes through `vitals-core`; this crate only converts
//! between core results and wire responses.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use vitals_core::{PatientVitals, VitalsError, VitalsService};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    vitals: Arc<VitalsService>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        root,
        health,
        current_vitals,
        previous_vitals,
        increment_index,
        vitals_status,
        save_vitals,
        saved_snapshot,
        snapshot_info,
    ),
    components(schemas(
        RootRes,
        HealthRes,
        PatientVitalsRes,
        IncrementRes,
        StatusRes,
        SaveSnapshotRes,
        SnapshotRes,
        SnapshotInfoRes,
    ))
)]
pub struct ApiDoc;

/// One patient with exactly one vital point, as served to clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct PatientVitalsRes {
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
    /// Open field-map of measurement name to value; `time` is always the
    /// response instant.
    #[serde(rename = "Vital")]
    #[schema(value_type = Object)]
    pub vital: serde_json::Map<String, serde_json::Value>,
}

impl From<PatientVitals> for PatientVitalsRes {
    fn from(view: PatientVitals) -> Self {
        Self {
            identifier: view.patient.identifier,
            name: view.patient.name,
            bed: view.patient.bed,
            gender: view.patient.gender,
            age: view.patient.age,
            vital: view.vital,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RootRes {
    pub message: String,
    pub current_index: usize,
    pub total_vitals: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IncrementRes {
    pub message: String,
    pub new_index: usize,
    pub total_vitals: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusRes {
    pub current_index: usize,
    pub previous_index: usize,
    pub total_vitals: usize,
    pub total_patients: usize,
    pub has_snapshot: bool,
    pub current_snapshot_id: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveSnapshotRes {
    pub message: String,
    pub snapshot_id: u64,
    pub timestamp: String,
    pub patients_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotRes {
    pub identifier: u64,
    pub patients: Vec<PatientVitalsRes>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SnapshotInfoRes {
    pub snapshot_id: u64,
    pub patients_count: usize,
    pub has_snapshot: bool,
}

/// Map a core error to the wire: recoverable caller errors keep a specific
/// status, everything else is logged and reported as a bare 500.
fn error_response(err: &VitalsError) -> (StatusCode, &'static str) {
    match err {
        VitalsError::InvalidIndex { .. } => (StatusCode::BAD_REQUEST, "Invalid index"),
        VitalsError::NoSnapshot => (StatusCode::NOT_FOUND, "No snapshot saved yet"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error"),
    }
}

/// Build the vitals router over a ready service.
///
/// The service is already initialised: a failed roster load never reaches
/// this point, so every route below can assume loaded metadata.
pub fn router(vitals: Arc<VitalsService>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/vitals/current", get(current_vitals))
        .route("/vitals/previous", get(previous_vitals))
        .route("/vitals/increment", get(increment_index))
        .route("/vitals/status", get(vitals_status))
        .route("/vitals/save", get(save_vitals))
        .route("/vitals/snapshot", get(saved_snapshot))
        .route("/vitals/snapshot/info", get(snapshot_info))
        .layer(CorsLayer::permissive())
        .with_state(AppState { vitals })
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = RootRes)
    )
)]
/// Service banner with the live cursor position.
#[axum::debug_handler]
async fn root(State(state): State<AppState>) -> Json<RootRes> {
    let status = state.vitals.status();
    Json(RootRes {
        message: "Patient Vitals API".into(),
        current_index: status.current_index,
        total_vitals: status.total_vitals,
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API.
///
/// Used for monitoring and load balancer health checks; reachable only once
/// the roster load has succeeded.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Patient Vitals API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/vitals/current",
    responses(
        (status = 200, description = "Vital point at the current index for every patient", body = [PatientVitalsRes]),
        (status = 400, description = "Invalid index"),
        (status = 500, description = "Internal server error")
    )
)]
/// The current vital point for every patient.
///
/// Streams the dataset once and stamps each returned vital with the
/// response instant.
#[axum::debug_handler]
async fn current_vitals(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientVitalsRes>>, (StatusCode, &'static str)> {
    match state.vitals.current() {
        Ok(views) => Ok(Json(views.into_iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Current vitals error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/vitals/previous",
    responses(
        (status = 200, description = "Vital point at the previous index for every patient", body = [PatientVitalsRes]),
        (status = 400, description = "Invalid index"),
        (status = 500, description = "Internal server error")
    )
)]
/// The vital point that was current before the last increment.
#[axum::debug_handler]
async fn previous_vitals(
    State(state): State<AppState>,
) -> Result<Json<Vec<PatientVitalsRes>>, (StatusCode, &'static str)> {
    match state.vitals.previous() {
        Ok(views) => Ok(Json(views.into_iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Previous vitals error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/vitals/increment",
    responses(
        (status = 200, description = "Cursor advanced", body = IncrementRes)
    )
)]
/// Advance the shared cursor, wrapping at the end of the vitals range.
#[axum::debug_handler]
async fn increment_index(State(state): State<AppState>) -> Json<IncrementRes> {
    let advance = state.vitals.advance();
    Json(IncrementRes {
        message: "Index incremented successfully".into(),
        new_index: advance.new_index,
        total_vitals: advance.total_vitals,
    })
}

#[utoipa::path(
    get,
    path = "/vitals/status",
    responses(
        (status = 200, description = "Cursor and snapshot status", body = StatusRes)
    )
)]
/// Current cursor positions, dataset totals, and snapshot presence.
#[axum::debug_handler]
async fn vitals_status(State(state): State<AppState>) -> Json<StatusRes> {
    let status = state.vitals.status();
    Json(StatusRes {
        current_index: status.current_index,
        previous_index: status.previous_index,
        total_vitals: status.total_vitals,
        total_patients: status.total_patients,
        has_snapshot: status.has_snapshot,
        current_snapshot_id: status.current_snapshot_id,
    })
}

#[utoipa::path(
    get,
    path = "/vitals/save",
    responses(
        (status = 200, description = "Current vitals saved as a snapshot", body = SaveSnapshotRes),
        (status = 400, description = "Invalid index"),
        (status = 500, description = "Internal server error")
    )
)]
/// Freeze the current vitals set into the snapshot store.
#[axum::debug_handler]
async fn save_vitals(
    State(state): State<AppState>,
) -> Result<Json<SaveSnapshotRes>, (StatusCode, &'static str)> {
    match state.vitals.save_snapshot() {
        Ok(receipt) => Ok(Json(SaveSnapshotRes {
            message: "Current vitals saved as snapshot".into(),
            snapshot_id: receipt.snapshot_id,
            timestamp: receipt.captured_at.to_rfc3339(),
            patients_count: receipt.patient_count,
        })),
        Err(e) => {
            tracing::error!("Save snapshot error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/vitals/snapshot",
    responses(
        (status = 200, description = "The saved snapshot", body = SnapshotRes),
        (status = 404, description = "No snapshot saved yet")
    )
)]
/// The saved snapshot, with each vital's `time` set to the read instant.
#[axum::debug_handler]
async fn saved_snapshot(
    State(state): State<AppState>,
) -> Result<Json<SnapshotRes>, (StatusCode, &'static str)> {
    match state.vitals.snapshot() {
        Ok(snapshot) => Ok(Json(SnapshotRes {
            identifier: snapshot.snapshot_id,
            patients: snapshot.patients.into_iter().map(Into::into).collect(),
        })),
        Err(e) => {
            tracing::error!("Read snapshot error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

#[utoipa::path(
    get,
    path = "/vitals/snapshot/info",
    responses(
        (status = 200, description = "Snapshot identifier and size", body = SnapshotInfoRes),
        (status = 404, description = "No snapshot saved yet")
    )
)]
/// Snapshot identifier and patient count, without materialising the views.
#[axum::debug_handler]
async fn snapshot_info(
    State(state): State<AppState>,
) -> Result<Json<SnapshotInfoRes>, (StatusCode, &'static str)> {
    match state.vitals.snapshot_info() {
        Ok(info) => Ok(Json(SnapshotInfoRes {
            snapshot_id: info.snapshot_id,
            patients_count: info.patient_count,
            has_snapshot: true,
        })),
        Err(e) => {
            tracing::error!("Snapshot info error: {:?}", e);
            Err(error_response(&e))
        }
    }
}

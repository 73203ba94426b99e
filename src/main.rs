use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_rest::ApiDoc;
use vitals_core::constants::DEFAULT_DATA_FILE;
use vitals_core::{CoreConfig, VitalsService};

/// Main entry point for the patient vitals service.
///
/// Loads the patient roster from the configured dataset, then serves the
/// REST API. A failed roster load aborts startup before the listener is
/// bound, so a half-loaded service never accepts requests.
///
/// # Environment Variables
/// - `VITALS_REST_ADDR`: server address (default: "0.0.0.0:8009")
/// - `VITALS_DATA_FILE`: patient dataset, one JSON record per line
///   (default: "patients_data.jsonl")
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If loading or serving fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vitals_run=info".parse()?)
                .add_directive("vitals_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("VITALS_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:8009".into());
    let data_file =
        std::env::var("VITALS_DATA_FILE").unwrap_or_else(|_| DEFAULT_DATA_FILE.into());

    tracing::info!("++ Starting Patient Vitals REST API on {}", addr);
    tracing::info!("++ Patient dataset: {}", data_file);

    let cfg = Arc::new(CoreConfig::new(PathBuf::from(data_file))?);
    let vitals = Arc::new(VitalsService::initialise(cfg)?);

    let app = api_rest::router(vitals)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

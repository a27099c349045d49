use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::error::FeedbackError;
use crate::export;
use crate::mailer::Mailer;
use crate::record::SubmissionRecord;
use crate::schema::{FeedbackCategory, schema_for};
use crate::service::FeedbackService;
use crate::store::open_store;

pub struct AppState {
    service: FeedbackService,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    status: String,
    submitted_at: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: Option<String>,
}

#[derive(Deserialize)]
struct ExportQuery {
    format: Option<String>,
}

/// Build the HTTP routes over a feedback service
pub fn router(service: FeedbackService) -> Router {
    let app_state = Arc::new(AppState { service });

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/schema/:category", get(get_schema))
        .route("/api/feedback/:category", post(submit_feedback))
        .route("/api/feedback/:category/rows", get(get_rows))
        .route("/api/feedback/:category/export", get(export_rows))
        .layer(cors)
        .with_state(app_state)
}

/// Start the feedback server
///
/// Opens the configured row store, enables confirmation mails when SMTP is
/// configured, and serves until Ctrl+C or SIGTERM.
///
/// # Arguments
/// * `config` - Process configuration loaded at startup
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or the startup failure
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(&config.store)?;
    let mut service = FeedbackService::new(store, config.header_row);

    if let Some(mail) = &config.mail {
        match Mailer::new(mail) {
            Ok(mailer) => service = service.with_notifier(Arc::new(mailer)),
            Err(e) => log::warn!("Confirmation mails disabled, SMTP setup failed: {e}"),
        }
    }

    let app = router(service);

    let listener = TcpListener::bind(&config.bind_address).await?;
    log::info!("Listening on http://{}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
        log::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn get_dashboard(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.dashboard().await)
}

async fn get_schema(Path(category): Path<String>) -> Result<impl IntoResponse, FeedbackError> {
    let category: FeedbackCategory = category.parse()?;
    Ok(Json(schema_for(category)))
}

async fn submit_feedback(
    Path(category): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(record): Json<SubmissionRecord>,
) -> Result<impl IntoResponse, FeedbackError> {
    let category: FeedbackCategory = category.parse()?;
    let receipt = state.service.submit(category, record).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            status: "ok".to_string(),
            submitted_at: receipt.submitted_at,
        }),
    ))
}

async fn get_rows(
    Path(category): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, FeedbackError> {
    let category: FeedbackCategory = category.parse()?;
    Ok(Json(state.service.fetch_rows(category).await?))
}

async fn export_rows(
    Path(category): Path<String>,
    Query(params): Query<ExportQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, FeedbackError> {
    let category: FeedbackCategory = category.parse()?;
    let rows = state.service.fetch_rows(category).await?;

    let response = match params.format.as_deref().unwrap_or("csv") {
        "csv" => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, attachment(category, "csv")),
            ],
            export::to_csv(category, &rows),
        )
            .into_response(),
        "xlsx" => match export::to_xlsx(category, &rows) {
            Ok(buffer) => (
                [
                    (
                        header::CONTENT_TYPE,
                        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
                    ),
                    (header::CONTENT_DISPOSITION, attachment(category, "xlsx")),
                ],
                buffer,
            )
                .into_response(),
            Err(e) => {
                log::error!("XLSX export of {category} failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        status: "error".to_string(),
                        message: Some("Export failed".to_string()),
                    }),
                )
                    .into_response()
            }
        },
        other => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                status: "error".to_string(),
                message: Some(format!("Unsupported export format: {other}")),
            }),
        )
            .into_response(),
    };

    Ok(response)
}

fn attachment(category: FeedbackCategory, extension: &str) -> String {
    format!("attachment; filename=\"{}-feedback.{extension}\"", category.as_str())
}

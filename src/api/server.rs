//! axum-based HTTP server exposing the task API.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderValue, Method, StatusCode},
    routing::{get, put},
};
use chrono::{Duration, NaiveTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Database;
use crate::error::{ApiError, ApiResult};
use crate::types::{NewTask, Task};

/// API server state shared across handlers.
#[derive(Clone)]
pub struct ApiServer {
    /// Reference to the task database.
    db: Arc<Database>,
}

impl ApiServer {
    /// Create a new API server instance.
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Get the database reference.
    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Confirmation body for deletions.
#[derive(serde::Serialize)]
struct DeleteResponse {
    message: &'static str,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /api/tasks` - every task in store order.
async fn list_tasks(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Task>>> {
    let tasks = state.db().list_tasks().map_err(ApiError::database)?;
    Ok(Json(tasks))
}

/// `GET /api/tasks/today` - tasks due in the current UTC day.
///
/// The window is half-open: a task due at today's midnight is included,
/// one due at tomorrow's midnight is not.
async fn list_tasks_today(State(state): State<ApiServer>) -> ApiResult<Json<Vec<Task>>> {
    let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    let end = start + Duration::days(1);
    let tasks = state
        .db()
        .list_tasks_due_between(start, end)
        .map_err(ApiError::database)?;
    Ok(Json(tasks))
}

/// `GET /api/tasks/{id}` - a single task, or 404.
async fn get_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = state.db().get_task(task_id).map_err(ApiError::database)?;
    task.map(Json).ok_or_else(ApiError::task_not_found)
}

/// `POST /api/tasks` - create a pending task; status and interval are
/// server-assigned.
async fn create_task(
    State(state): State<ApiServer>,
    Json(new): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    if new.title.trim().is_empty() {
        return Err(ApiError::invalid_value("title", "title must not be empty"));
    }

    let task = state.db().create_task(&new).map_err(ApiError::database)?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PUT /api/tasks/{id}/complete` - mark a task completed. A follow-up row
/// may be created server-side when the interval progression continues.
async fn complete_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let completed = state
        .db()
        .complete_task(task_id, Utc::now())
        .map_err(ApiError::database)?;
    completed.map(Json).ok_or_else(ApiError::task_not_found)
}

/// `DELETE /api/tasks/{id}` - remove a task, or 404.
async fn delete_task(
    State(state): State<ApiServer>,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = state.db().delete_task(task_id).map_err(ApiError::database)?;
    if !removed {
        return Err(ApiError::task_not_found());
    }
    Ok(Json(DeleteResponse {
        message: "Task deleted successfully",
    }))
}

/// Build the CORS layer from the configured origin allow-list.
///
/// Credentials are allowed, which rules out wildcards: origins are an
/// explicit list, methods are enumerated, and request headers are mirrored.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the router with all routes.
pub fn build_router(state: ApiServer, config: &Config) -> Router {
    let cors = cors_layer(&config.allowed_origins);

    Router::new()
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/today", get(list_tasks_today))
        .route("/api/tasks/{task_id}", get(get_task).delete(delete_task))
        .route("/api/tasks/{task_id}/complete", put(complete_task))
        .route("/api/health", get(health))
        // Add middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the configured port, bound to all interfaces.
///
/// Returns a oneshot sender that can be used to signal shutdown,
/// and the actual address the server is bound to.
pub async fn start_server(
    db: Arc<Database>,
    config: &Config,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let state = ApiServer::new(db);
    let app = build_router(state, config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Task API listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Task API shutting down");
            })
            .await
        {
            tracing::error!("Task API server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serialization() {
        let response = HealthResponse {
            status: "healthy",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("0.1.0"));
    }

    #[test]
    fn delete_response_carries_fixed_message() {
        let response = DeleteResponse {
            message: "Task deleted successfully",
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"message":"Task deleted successfully"}"#);
    }

    #[test]
    fn cors_layer_skips_unparseable_origins() {
        // Building the layer must not panic on garbage input
        let _ = cors_layer(&["http://localhost:9000".to_string(), "\u{0}bad".to_string()]);
    }
}

//! HTTP server for the expense API.
//!
//! Four operations, each a direct mapping from an HTTP verb and path to one
//! store call: request, validate, one database call, response.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use outlay_core::{Error, Result};

use crate::api::{CreateExpenseRequest, UpdateExpenseRequest};
use crate::store::ExpenseStore;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub addr: SocketAddr,
    /// Origins allowed by the CORS policy, with credentials permitted.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:5000".parse().expect("valid default address"),
            allowed_origins: vec!["http://localhost:5173".to_string()],
        }
    }
}

impl ServerConfig {
    /// Creates a new server config builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    addr: Option<SocketAddr>,
    allowed_origins: Option<Vec<String>>,
}

impl ServerConfigBuilder {
    /// Sets the listen address.
    pub fn addr(mut self, addr: SocketAddr) -> Self {
        self.addr = Some(addr);
        self
    }

    /// Sets the CORS origin allow-list.
    pub fn allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = Some(origins);
        self
    }

    /// Builds the server config.
    pub fn build(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            addr: self.addr.unwrap_or(defaults.addr),
            allowed_origins: self.allowed_origins.unwrap_or(defaults.allowed_origins),
        }
    }
}

/// Shared application state: the store handle injected into every handler.
pub struct AppState {
    /// The expense store.
    pub store: Arc<dyn ExpenseStore>,
}

/// The HTTP server.
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl Server {
    /// Creates a new server over the given store.
    pub fn new(config: ServerConfig, store: Arc<dyn ExpenseStore>) -> Self {
        let state = Arc::new(AppState { store });
        Self { config, state }
    }

    /// Creates the router.
    fn router(&self) -> Router {
        Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .route("/expenses", get(list_expenses).post(create_expense))
            .route("/expenses/{id}", patch(update_expense).delete(delete_expense))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(CatchPanicLayer::new())
            .layer(cors_layer(&self.config.allowed_origins))
    }

    /// Runs the server until SIGINT/SIGTERM, then closes the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot bind its listen address.
    pub async fn run(self) -> Result<()> {
        let router = self.router();

        tracing::info!(addr = %self.config.addr, "Starting Outlay server");

        let listener = tokio::net::TcpListener::bind(self.config.addr)
            .await
            .map_err(Error::Io)?;

        let shutdown_signal = async {
            let ctrl_c = async {
                tokio::signal::ctrl_c()
                    .await
                    .expect("Failed to install Ctrl+C handler");
            };

            #[cfg(unix)]
            let terminate = async {
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to install signal handler")
                    .recv()
                    .await;
            };

            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                () = ctrl_c => {
                    tracing::info!("Received Ctrl+C, shutting down gracefully");
                },
                () = terminate => {
                    tracing::info!("Received SIGTERM, shutting down gracefully");
                },
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| Error::internal(e.to_string()))?;

        self.state.store.close().await;
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

/// Builds the CORS layer from the configured origin allow-list.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

// === Error Response ===

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: String,
}

impl ErrorResponse {
    fn new(message: impl Into<String>, error_type: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type: error_type.into(),
            },
        }
    }
}

fn error_response(status: StatusCode, message: &str, error_type: &str) -> Response {
    let body = Json(ErrorResponse::new(message, error_type));
    (status, body).into_response()
}

/// Maps an operation failure to an HTTP response.
///
/// Client faults surface their message; store and internal failures are
/// logged and surfaced as a generic server error without internal detail.
fn failure_response(err: Error) -> Response {
    match &err {
        Error::Validation { .. } => error_response(
            StatusCode::BAD_REQUEST,
            &err.to_string(),
            "invalid_request_error",
        ),
        Error::NotFound { .. } => {
            error_response(StatusCode::NOT_FOUND, &err.to_string(), "not_found_error")
        },
        _ => {
            tracing::error!(error = %err, "Expense operation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error",
                "server_error",
            )
        },
    }
}

// === Handlers ===

async fn root() -> &'static str {
    "Outlay expense API running"
}

async fn health() -> &'static str {
    "OK"
}

/// Unwraps a JSON body, mapping extractor rejections (malformed JSON,
/// type-mismatched fields) to the same 400 shape as validation failures.
/// The deserializer detail stays out of the response.
fn json_body<T>(
    body: std::result::Result<Json<T>, JsonRejection>,
) -> std::result::Result<T, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected request body");
            Err(error_response(
                StatusCode::BAD_REQUEST,
                "request body must be valid JSON with correctly typed fields",
                "invalid_request_error",
            ))
        },
    }
}

async fn create_expense(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<CreateExpenseRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(body) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let expense = match req.into_expense() {
        Ok(expense) => expense,
        Err(e) => return failure_response(e),
    };

    match state.store.insert(expense).await {
        Ok(created) => {
            tracing::debug!(id = created.id.as_deref().unwrap_or(""), "Expense created");
            (StatusCode::CREATED, Json(created)).into_response()
        },
        Err(e) => failure_response(e),
    }
}

async fn list_expenses(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list().await {
        Ok(expenses) => Json(expenses).into_response(),
        Err(e) => failure_response(e),
    }
}

async fn update_expense(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<UpdateExpenseRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(body) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let update = match req.into_update() {
        Ok(update) => update,
        Err(e) => return failure_response(e),
    };

    match state.store.update(&id, update).await {
        Ok(()) => {
            tracing::debug!(id = %id, "Expense updated");
            Json(serde_json::json!({ "status": "updated", "id": id })).into_response()
        },
        Err(e) => failure_response(e),
    }
}

async fn delete_expense(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.store.delete(&id).await {
        Ok(()) => {
            tracing::debug!(id = %id, "Expense deleted");
            Json(serde_json::json!({ "status": "deleted", "id": id })).into_response()
        },
        Err(e) => failure_response(e),
    }
}

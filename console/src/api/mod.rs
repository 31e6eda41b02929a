use axum::{
    Router,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use dashmap::DashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::response::SetResponseHeaderLayer;

use crate::backend::{MetricsApi, SchemaApi};
use crate::page::chart::ChartSession;
use crate::page::databases::DatabasesPage;
use crate::page::table::TablePage;

pub mod chart_handlers;
pub mod dto;
pub mod schema_handlers;

// ---------- shared state ----------

#[derive(Clone)]
pub struct AppState {
    pub schema: Arc<dyn SchemaApi>,
    pub metrics: Arc<dyn MetricsApi>,
    pub databases: Arc<DatabasesPage>,
    tables: Arc<DashMap<(String, String), Arc<TablePage>>>,
    charts: Arc<DashMap<String, Arc<ChartSession>>>,
    ui_dir: String,
}

impl AppState {
    pub fn new(
        schema: Arc<dyn SchemaApi>,
        metrics: Arc<dyn MetricsApi>,
        ui_dir: impl Into<String>,
    ) -> Self {
        Self {
            schema,
            metrics,
            databases: Arc::new(DatabasesPage::new()),
            tables: Arc::new(DashMap::new()),
            charts: Arc::new(DashMap::new()),
            ui_dir: ui_dir.into(),
        }
    }

    /// Page state for (db, table), created on first touch.
    pub fn table_page(&self, db: &str, table: &str) -> Arc<TablePage> {
        self.tables
            .entry((db.to_string(), table.to_string()))
            .or_insert_with(|| Arc::new(TablePage::new(db, table)))
            .clone()
    }

    pub fn chart(&self, id: &str) -> Option<Arc<ChartSession>> {
        self.charts.get(id).map(|entry| entry.clone())
    }

    pub fn chart_or_create(&self, id: &str) -> Arc<ChartSession> {
        self.charts
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(ChartSession::new()))
            .clone()
    }
}

// ---------- error type ----------

/// A JSON error response: `{"error": "..."}` with an HTTP status.
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self(status, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, msg.into())
    }

    /// Page-load fetch against the backend failed.
    pub fn bad_gateway(e: impl std::fmt::Display) -> Self {
        Self(StatusCode::BAD_GATEWAY, e.to_string())
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

// ---------- router ----------

pub fn router(state: AppState) -> Router {
    let allowed_origins: Vec<HeaderValue> = std::env::var("SC_CORS_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = if allowed_origins.is_empty() {
        CorsLayer::new() // no origins allowed = same-origin only
    } else {
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true)
    };

    Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .nest("/api/v1", api_v1())
        .fallback_service(ServeDir::new(state.ui_dir.clone()))
        .layer(cors)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .with_state(state)
}

fn api_v1() -> Router<AppState> {
    Router::new()
        // databases
        .route(
            "/databases",
            get(schema_handlers::list_databases).post(schema_handlers::create_database),
        )
        .route("/databases/{name}", delete(schema_handlers::drop_database))
        // table structure (navigation via ?db=..&table=..)
        .route("/structure", get(schema_handlers::get_structure))
        .route(
            "/structure/field-types",
            get(schema_handlers::list_field_types),
        )
        .route(
            "/structure/index-columns",
            get(schema_handlers::index_columns),
        )
        .route("/structure/columns", post(schema_handlers::add_column))
        .route(
            "/structure/columns/{name}",
            delete(schema_handlers::drop_column),
        )
        .route("/structure/indexes", post(schema_handlers::add_index))
        .route(
            "/structure/indexes/{name}",
            delete(schema_handlers::drop_index),
        )
        .route(
            "/structure/partitions/{name}",
            delete(schema_handlers::drop_partition),
        )
        // metric charts
        .route("/charts/{id}", get(chart_handlers::get_chart))
        .route("/charts/{id}/refresh", post(chart_handlers::refresh_chart))
        .route("/charts/{id}/tooltip", get(chart_handlers::chart_tooltip))
}

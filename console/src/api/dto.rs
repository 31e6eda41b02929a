use serde::{Deserialize, Serialize};

use crate::backend::ColumnPosition;
use crate::metrics::TooltipLine;
use crate::page::table::ColumnDraft;

// ---------- query params ----------

/// Navigation parameters, mirrored from the UI's URL query string.
#[derive(Debug, Deserialize)]
pub struct TableParams {
    pub db: String,
    pub table: String,
}

#[derive(Debug, Deserialize)]
pub struct IndexColumnsQuery {
    pub db: String,
    pub table: String,
    /// Comma-separated column names already chosen in other builder rows.
    #[serde(default)]
    pub chosen: String,
}

#[derive(Debug, Deserialize)]
pub struct TooltipQuery {
    /// Axis timestamp in unix milliseconds.
    pub ts: i64,
}

// ---------- requests ----------

#[derive(Debug, Deserialize)]
pub struct CreateDatabaseRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddColumnRequest {
    pub column: ColumnDraft,
    pub position: ColumnPosition,
}

// ---------- responses ----------

#[derive(Debug, Serialize)]
pub struct FieldTypesResponse {
    pub field_types: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct IndexColumnsResponse {
    pub columns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TooltipResponse {
    pub title: String,
    pub lines: Vec<TooltipLine>,
}

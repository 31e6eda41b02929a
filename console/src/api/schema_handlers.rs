use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::page::databases::{DatabasesAction, DatabasesPage, DatabasesView};
use crate::page::table::{self, IndexDraft, StructureAction, StructureView};

use super::dto::{
    AddColumnRequest, CreateDatabaseRequest, FieldTypesResponse, IndexColumnsQuery,
    IndexColumnsResponse, TableParams,
};
use super::{ApiErr, AppState};

// ---------- GET /databases ----------

pub async fn list_databases(
    State(state): State<AppState>,
) -> Result<Json<DatabasesView>, ApiErr> {
    let view = state
        .databases
        .load(state.schema.as_ref())
        .await
        .map_err(ApiErr::bad_gateway)?;
    Ok(Json(view))
}

// ---------- POST /databases ----------

pub async fn create_database(
    State(state): State<AppState>,
    Json(body): Json<CreateDatabaseRequest>,
) -> Json<DatabasesAction> {
    Json(state.databases.create(state.schema.as_ref(), &body.name).await)
}

// ---------- DELETE /databases/{name} ----------

pub async fn drop_database(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<DatabasesAction> {
    Json(DatabasesPage::drop(&state.databases, state.schema.as_ref(), &name).await)
}

// ---------- GET /structure ----------

pub async fn get_structure(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
) -> Result<Json<StructureView>, ApiErr> {
    let page = state.table_page(&params.db, &params.table);
    let view = page
        .load(state.schema.as_ref())
        .await
        .map_err(ApiErr::bad_gateway)?;
    Ok(Json(view))
}

// ---------- GET /structure/field-types ----------

pub async fn list_field_types() -> Json<FieldTypesResponse> {
    Json(FieldTypesResponse {
        field_types: table::FIELD_TYPES.to_vec(),
    })
}

// ---------- GET /structure/index-columns ----------

pub async fn index_columns(
    State(state): State<AppState>,
    Query(query): Query<IndexColumnsQuery>,
) -> Result<Json<IndexColumnsResponse>, ApiErr> {
    let page = state.table_page(&query.db, &query.table);

    // The builder works off the page snapshot; fetch once if this page was
    // never loaded.
    let info = match page.snapshot().await {
        Some(info) => info,
        None => {
            page.load(state.schema.as_ref())
                .await
                .map_err(ApiErr::bad_gateway)?;
            page.snapshot()
                .await
                .ok_or_else(|| ApiErr::bad_gateway("table info unavailable"))?
        }
    };

    let chosen: Vec<String> = query
        .chosen
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    Ok(Json(IndexColumnsResponse {
        columns: table::available_index_columns(&info, &chosen),
    }))
}

// ---------- POST /structure/columns ----------

pub async fn add_column(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
    Json(body): Json<AddColumnRequest>,
) -> Json<StructureAction> {
    let page = state.table_page(&params.db, &params.table);
    Json(
        page.add_column(state.schema.as_ref(), &body.column, &body.position)
            .await,
    )
}

// ---------- DELETE /structure/columns/{name} ----------

pub async fn drop_column(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<TableParams>,
) -> Json<StructureAction> {
    let page = state.table_page(&params.db, &params.table);
    Json(page.drop_column(state.schema.as_ref(), &name).await)
}

// ---------- POST /structure/indexes ----------

pub async fn add_index(
    State(state): State<AppState>,
    Query(params): Query<TableParams>,
    Json(body): Json<IndexDraft>,
) -> Json<StructureAction> {
    let page = state.table_page(&params.db, &params.table);
    Json(page.add_index(state.schema.as_ref(), &body).await)
}

// ---------- DELETE /structure/indexes/{name} ----------

pub async fn drop_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<TableParams>,
) -> Json<StructureAction> {
    let page = state.table_page(&params.db, &params.table);
    Json(page.drop_index(state.schema.as_ref(), &name).await)
}

// ---------- DELETE /structure/partitions/{name} ----------

pub async fn drop_partition(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<TableParams>,
) -> Json<StructureAction> {
    let page = state.table_page(&params.db, &params.table);
    Json(page.drop_partition(state.schema.as_ref(), &name).await)
}

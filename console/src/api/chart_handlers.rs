use axum::{
    extract::{Path, Query, State},
    response::Json,
};

use crate::metrics::{self, ChartSpec};
use crate::page::chart::ChartView;

use super::dto::{TooltipQuery, TooltipResponse};
use super::{ApiErr, AppState};

// ---------- POST /charts/{id}/refresh ----------

/// (Re)configure a chart session and run one refresh round: one backend
/// request per configured query, in parallel, joined before the response.
pub async fn refresh_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(spec): Json<ChartSpec>,
) -> Json<ChartView> {
    let session = state.chart_or_create(&id);
    session.refresh(state.metrics.as_ref(), &spec).await;
    Json(session.render().await)
}

// ---------- GET /charts/{id} ----------

pub async fn get_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ChartView>, ApiErr> {
    let session = state
        .chart(&id)
        .ok_or_else(|| ApiErr::not_found("Chart not found"))?;
    Ok(Json(session.render().await))
}

// ---------- GET /charts/{id}/tooltip ----------

pub async fn chart_tooltip(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<TooltipQuery>,
) -> Result<Json<TooltipResponse>, ApiErr> {
    let session = state
        .chart(&id)
        .ok_or_else(|| ApiErr::not_found("Chart not found"))?;

    match session.render().await {
        ChartView::Ready { chart } => Ok(Json(TooltipResponse {
            title: metrics::tooltip_title(query.ts),
            lines: metrics::tooltip_at(&chart, query.ts),
        })),
        _ => Err(ApiErr::not_found("Chart has no data")),
    }
}

use serde::Serialize;
use tokio::sync::Mutex;

use crate::backend::MetricsApi;
use crate::metrics::{self, ChartData, ChartSpec, QueryOutcome, RoundOutcome};

use super::FetchGate;

/// Rendered chart state, in UI terms.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChartView {
    /// A refresh is pending (or none was ever started) and no prior data
    /// exists.
    Loading,
    /// Every request of the latest completed round failed or returned a
    /// non-success status.
    Error { errors: Vec<String> },
    Ready { chart: ChartData },
}

#[derive(Default)]
struct Inner {
    in_flight: u32,
    chart: Option<ChartData>,
    /// Set when the latest completed round failed entirely.
    errors: Option<Vec<String>>,
}

/// State for one metric chart. A refresh issues one request per configured
/// query concurrently and joins on all of them before computing derived
/// data; the commit is token-guarded so a stale refresh never overwrites a
/// newer one.
pub struct ChartSession {
    gate: FetchGate,
    inner: Mutex<Inner>,
}

impl Default for ChartSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartSession {
    pub fn new() -> Self {
        Self {
            gate: FetchGate::new(),
            inner: Mutex::new(Inner::default()),
        }
    }

    pub async fn refresh(&self, api: &dyn MetricsApi, spec: &ChartSpec) {
        let token = self.gate.begin();
        {
            self.inner.lock().await.in_flight += 1;
        }

        let results = fetch_all(api, spec).await;
        let outcome = metrics::assemble(spec, &results);

        let mut inner = self.inner.lock().await;
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if !self.gate.is_latest(token) {
            return;
        }
        match outcome {
            RoundOutcome::Ready(chart) => {
                inner.chart = Some(chart);
                inner.errors = None;
            }
            RoundOutcome::Failed(errors) => {
                inner.errors = Some(errors);
            }
        }
    }

    pub async fn render(&self) -> ChartView {
        let inner = self.inner.lock().await;
        if let Some(errors) = &inner.errors {
            return ChartView::Error {
                errors: errors.clone(),
            };
        }
        match &inner.chart {
            Some(chart) => ChartView::Ready {
                chart: chart.clone(),
            },
            None => ChartView::Loading,
        }
    }
}

/// One request per configured series, in parallel; resolves once all are
/// done. In-flight requests are never cancelled; staleness is handled at
/// commit time instead.
async fn fetch_all(api: &dyn MetricsApi, spec: &ChartSpec) -> Vec<QueryOutcome> {
    let requests = spec.series.iter().map(|tpl| {
        api.query_range(
            &tpl.query,
            spec.begin_time_sec,
            spec.end_time_sec,
            spec.step_sec,
        )
    });
    futures::future::join_all(requests).await
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::{BackendError, QueryStatus};

pub mod format;
pub mod template;

// ---------- chart spec ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphKind {
    Bar,
    Line,
}

/// One query template: the query plus a name pattern interpolated with the
/// label set of every series the query returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesTemplate {
    pub query: String,
    pub name: String,
}

fn default_step() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub series: Vec<SeriesTemplate>,
    pub begin_time_sec: i64,
    pub end_time_sec: i64,
    pub unit: String,
    pub kind: GraphKind,
    #[serde(default)]
    pub hide_zero: bool,
    #[serde(default = "default_step")]
    pub step_sec: u32,
}

// ---------- chart data ----------

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub title: String,
    pub kind: GraphKind,
    pub unit: String,
    pub x_axis: TimeAxis,
    pub series: Vec<RenderedSeries>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeAxis {
    /// Window bounds in unix milliseconds.
    pub min: i64,
    pub max: i64,
    pub split_number: u32,
    /// Interior tick labels; the window endpoints are not labeled.
    pub ticks: Vec<Tick>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Tick {
    pub at: i64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedSeries {
    pub name: String,
    /// Bar series stack into a single group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<&'static str>,
    /// Line series draw without point symbols.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_symbol: Option<bool>,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Point {
    /// Unix milliseconds.
    pub ts: i64,
    pub value: f64,
    /// Value through the unit formatter, for tooltips and labels.
    pub display: String,
}

// ---------- assembly ----------

pub type QueryOutcome = Result<crate::backend::QueryResponse, BackendError>;

#[derive(Debug)]
pub enum RoundOutcome {
    Ready(ChartData),
    /// Every request failed or returned a non-success status; carries one
    /// message per request (empty when no queries were configured).
    Failed(Vec<String>),
}

pub fn assemble(spec: &ChartSpec, results: &[QueryOutcome]) -> RoundOutcome {
    let all_failed = results.iter().all(|r| match r {
        Ok(resp) => resp.status != QueryStatus::Success,
        Err(_) => true,
    });
    if all_failed {
        let errors = results
            .iter()
            .map(|r| match r {
                Ok(resp) => resp
                    .error
                    .clone()
                    .unwrap_or_else(|| "query returned a non-success status".to_string()),
                Err(e) => e.to_string(),
            })
            .collect();
        return RoundOutcome::Failed(errors);
    }

    RoundOutcome::Ready(ChartData {
        title: spec.title.clone(),
        kind: spec.kind,
        unit: spec.unit.clone(),
        x_axis: time_axis(spec.begin_time_sec, spec.end_time_sec),
        series: build_series(spec, results),
    })
}

/// Expand per-template results into rendered series: one rendered series per
/// label set the query returned, named by interpolating the label set into
/// the template name. Failed templates contribute nothing.
pub fn build_series(spec: &ChartSpec, results: &[QueryOutcome]) -> Vec<RenderedSeries> {
    let mut out = Vec::new();
    for (idx, result) in results.iter().enumerate() {
        let Ok(resp) = result else { continue };
        if resp.status != QueryStatus::Success {
            continue;
        }
        let Some(data) = &resp.data else { continue };
        let Some(tpl) = spec.series.get(idx) else {
            continue;
        };

        for series in &data.result {
            if spec.hide_zero && series.values.iter().all(|(_, v)| *v == 0.0) {
                continue;
            }
            out.push(RenderedSeries {
                name: template::interpolate(&tpl.name, &series.metric),
                stack: matches!(spec.kind, GraphKind::Bar).then_some("bar_stack"),
                show_symbol: matches!(spec.kind, GraphKind::Line).then_some(false),
                points: series
                    .values
                    .iter()
                    .map(|(ts, value)| Point {
                        ts: (*ts * 1000.0) as i64,
                        value: *value,
                        display: format::format_value(&spec.unit, *value, 1),
                    })
                    .collect(),
            });
        }
    }
    out
}

/// Axis scaled to the requested window, split into ten intervals with
/// "HH:mm" labels on the interior ticks only.
pub fn time_axis(begin_time_sec: i64, end_time_sec: i64) -> TimeAxis {
    const SPLIT_NUMBER: u32 = 10;

    let min = begin_time_sec * 1000;
    let max = end_time_sec * 1000;
    let mut ticks = Vec::new();
    if max > min {
        let step = (max - min) / i64::from(SPLIT_NUMBER);
        for i in 1..SPLIT_NUMBER {
            let at = min + step * i64::from(i);
            ticks.push(Tick {
                at,
                label: axis_label(at),
            });
        }
    }
    TimeAxis {
        min,
        max,
        split_number: SPLIT_NUMBER,
        ticks,
    }
}

fn axis_label(ts_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ts_ms) {
        Some(t) => t.format("%H:%M").to_string(),
        None => String::new(),
    }
}

// ---------- tooltips ----------

#[derive(Debug, Clone, Serialize)]
pub struct TooltipLine {
    pub series: String,
    pub display: String,
}

/// Tooltip header for one axis timestamp.
pub fn tooltip_title(ts_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ts_ms) {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// One tooltip row per series that has a sample at `ts_ms`.
pub fn tooltip_at(chart: &ChartData, ts_ms: i64) -> Vec<TooltipLine> {
    chart
        .series
        .iter()
        .filter_map(|s| {
            s.points.iter().find(|p| p.ts == ts_ms).map(|p| TooltipLine {
                series: s.name.clone(),
                display: p.display.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{QueryData, QueryResponse, SeriesData};
    use std::collections::HashMap;

    fn labels(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn success(result: Vec<SeriesData>) -> QueryOutcome {
        Ok(QueryResponse {
            status: QueryStatus::Success,
            error: None,
            data: Some(QueryData { result }),
        })
    }

    fn spec(series: Vec<SeriesTemplate>) -> ChartSpec {
        ChartSpec {
            title: "QPS".to_string(),
            series,
            begin_time_sec: 1_700_000_000,
            end_time_sec: 1_700_003_600,
            unit: "short".to_string(),
            kind: GraphKind::Line,
            hide_zero: false,
            step_sec: 10,
        }
    }

    fn tpl(query: &str, name: &str) -> SeriesTemplate {
        SeriesTemplate {
            query: query.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_fan_out_one_series_per_label_set() {
        let spec = spec(vec![tpl("q_total", "total"), tpl("q_by_type", "qps-{type}")]);
        let results = vec![
            success(vec![SeriesData {
                metric: labels(&[]),
                values: vec![(1_700_000_000.0, 1.0)],
            }]),
            success(vec![
                SeriesData {
                    metric: labels(&[("type", "select")]),
                    values: vec![(1_700_000_000.0, 2.0)],
                },
                SeriesData {
                    metric: labels(&[("type", "insert")]),
                    values: vec![(1_700_000_000.0, 3.0)],
                },
            ]),
        ];

        let rendered = build_series(&spec, &results);
        let names: Vec<&str> = rendered.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["total", "qps-select", "qps-insert"]);
    }

    #[test]
    fn test_hide_zero_drops_all_zero_series_only() {
        let mut spec = spec(vec![tpl("q", "{type}")]);
        spec.hide_zero = true;
        let results = vec![success(vec![
            SeriesData {
                metric: labels(&[("type", "idle")]),
                values: vec![(1.0, 0.0), (2.0, 0.0)],
            },
            SeriesData {
                metric: labels(&[("type", "busy")]),
                values: vec![(1.0, 0.0), (2.0, 5.0)],
            },
        ])];

        let rendered = build_series(&spec, &results);
        assert_eq!(rendered.len(), 1, "All-zero series must be dropped");
        assert_eq!(rendered[0].name, "busy");
        assert_eq!(
            rendered[0].points.len(),
            2,
            "Retained series keeps its zero samples"
        );
    }

    #[test]
    fn test_points_convert_seconds_to_millis() {
        let spec = spec(vec![tpl("q", "n")]);
        let results = vec![success(vec![SeriesData {
            metric: labels(&[]),
            values: vec![(1_700_000_000.0, 1.5)],
        }])];

        let rendered = build_series(&spec, &results);
        assert_eq!(rendered[0].points[0].ts, 1_700_000_000_000);
        assert_eq!(rendered[0].points[0].display, "1.5");
    }

    #[test]
    fn test_failed_template_contributes_nothing() {
        let spec = spec(vec![tpl("bad", "a"), tpl("good", "b")]);
        let results = vec![
            Err(BackendError::Api("boom".to_string())),
            success(vec![SeriesData {
                metric: labels(&[]),
                values: vec![(1.0, 1.0)],
            }]),
        ];

        let rendered = build_series(&spec, &results);
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].name, "b");
    }

    #[test]
    fn test_assemble_all_failed_collects_messages() {
        let spec = spec(vec![tpl("a", "a"), tpl("b", "b")]);
        let results = vec![
            Err(BackendError::Api("boom".to_string())),
            Ok(QueryResponse {
                status: QueryStatus::Error,
                error: Some("bad query".to_string()),
                data: None,
            }),
        ];

        match assemble(&spec, &results) {
            RoundOutcome::Failed(errors) => {
                assert_eq!(errors, vec!["boom".to_string(), "bad query".to_string()])
            }
            RoundOutcome::Ready(_) => panic!("Expected a failed round"),
        }
    }

    #[test]
    fn test_assemble_partial_failure_is_ready() {
        let spec = spec(vec![tpl("a", "a"), tpl("b", "b")]);
        let results = vec![
            Err(BackendError::Api("boom".to_string())),
            success(vec![SeriesData {
                metric: labels(&[]),
                values: vec![(1.0, 1.0)],
            }]),
        ];

        match assemble(&spec, &results) {
            RoundOutcome::Ready(chart) => assert_eq!(chart.series.len(), 1),
            RoundOutcome::Failed(errors) => panic!("Expected ready, got failure {errors:?}"),
        }
    }

    #[test]
    fn test_bar_and_line_presentation_props() {
        let mut spec = spec(vec![tpl("q", "n")]);
        let results = vec![success(vec![SeriesData {
            metric: labels(&[]),
            values: vec![(1.0, 1.0)],
        }])];

        let line = build_series(&spec, &results);
        assert_eq!(line[0].stack, None);
        assert_eq!(line[0].show_symbol, Some(false));

        spec.kind = GraphKind::Bar;
        let bar = build_series(&spec, &results);
        assert_eq!(bar[0].stack, Some("bar_stack"));
        assert_eq!(bar[0].show_symbol, None);
    }

    #[test]
    fn test_time_axis_has_interior_ticks_only() {
        let axis = time_axis(0, 3600);
        assert_eq!(axis.min, 0);
        assert_eq!(axis.max, 3_600_000);
        assert_eq!(axis.ticks.len(), 9, "Ten splits label nine interior ticks");
        assert_eq!(axis.ticks[0].at, 360_000);
        assert_eq!(axis.ticks[0].label, "00:06");
        assert_eq!(axis.ticks[8].label, "00:54");
    }

    #[test]
    fn test_tooltip_title_and_rows() {
        assert_eq!(tooltip_title(0), "1970-01-01 00:00:00");

        let spec = spec(vec![tpl("q", "{type}")]);
        let results = vec![success(vec![
            SeriesData {
                metric: labels(&[("type", "select")]),
                values: vec![(10.0, 1.0), (20.0, 2.0)],
            },
            SeriesData {
                metric: labels(&[("type", "insert")]),
                values: vec![(20.0, 4.0)],
            },
        ])];
        let chart = match assemble(&spec, &results) {
            RoundOutcome::Ready(chart) => chart,
            RoundOutcome::Failed(e) => panic!("Unexpected failure {e:?}"),
        };

        let lines = tooltip_at(&chart, 20_000);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].series, "select");
        assert_eq!(lines[0].display, "2.0");
        assert_eq!(lines[1].series, "insert");

        let only_first = tooltip_at(&chart, 10_000);
        assert_eq!(only_first.len(), 1, "Series without a sample contribute no row");
    }
}

use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

use super::{
    BackendError, ColumnPosition, NewColumn, NewIndex, MetricsApi, QueryResponse, SchemaApi,
    TableInfo,
};

/// HTTP implementation of the backend API.
///
/// Timeouts live here (one per request, from the constructor); there is no
/// retry. Failures carry the backend's error message so pages can surface it
/// verbatim.
pub struct HttpApi {
    client: Client,
    schema_base: Url,
    metrics_base: Url,
}

impl HttpApi {
    pub fn new(
        schema_base: &str,
        metrics_base: &str,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            schema_base: parse_base(schema_base)?,
            metrics_base: parse_base(metrics_base)?,
        })
    }

    fn url(&self, segments: &[&str]) -> Url {
        join_segments(&self.schema_base, segments)
    }

    async fn send_ok(&self, req: reqwest::RequestBuilder) -> Result<(), BackendError> {
        let resp = req.send().await.map_err(transport)?;
        check(resp).await?;
        Ok(())
    }
}

fn transport(e: reqwest::Error) -> BackendError {
    BackendError::Transport(e.to_string())
}

fn parse_base(raw: &str) -> Result<Url, BackendError> {
    let url = Url::parse(raw)
        .map_err(|e| BackendError::Transport(format!("invalid base URL {raw:?}: {e}")))?;
    if url.cannot_be_a_base() {
        return Err(BackendError::Transport(format!(
            "invalid base URL {raw:?}: not a base"
        )));
    }
    Ok(url)
}

/// Append path segments with percent-encoding (database/table names may
/// contain characters that are not path-safe).
fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    {
        // parse_base rejected cannot-be-a-base URLs
        let mut path = url.path_segments_mut().expect("base URL validated");
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    url
}

async fn check(resp: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::Api(extract_error_message(status, &body)))
}

/// Pull the message out of the backend's `{"error": "..."}` envelope, falling
/// back to the raw body, then to the status line.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(msg) = value.get("error").and_then(|v| v.as_str())
    {
        return msg.to_string();
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status.to_string()
}

#[async_trait::async_trait]
impl SchemaApi for HttpApi {
    async fn databases(&self) -> Result<Vec<String>, BackendError> {
        #[derive(serde::Deserialize)]
        struct DatabasesResponse {
            databases: Vec<String>,
        }

        let resp = self
            .client
            .get(self.url(&["databases"]))
            .send()
            .await
            .map_err(transport)?;
        let resp = check(resp).await?;
        let body: DatabasesResponse = resp
            .json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        Ok(body.databases)
    }

    async fn create_database(&self, name: &str) -> Result<(), BackendError> {
        self.send_ok(
            self.client
                .post(self.url(&["databases"]))
                .json(&serde_json::json!({ "name": name })),
        )
        .await
    }

    async fn drop_database(&self, name: &str) -> Result<(), BackendError> {
        self.send_ok(self.client.delete(self.url(&["databases", name])))
            .await
    }

    async fn table_info(&self, db: &str, table: &str) -> Result<TableInfo, BackendError> {
        let resp = self
            .client
            .get(self.url(&["databases", db, "tables", table]))
            .send()
            .await
            .map_err(transport)?;
        let resp = check(resp).await?;
        resp.json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn add_column(
        &self,
        db: &str,
        table: &str,
        column: &NewColumn,
        position: &ColumnPosition,
    ) -> Result<(), BackendError> {
        self.send_ok(
            self.client
                .post(self.url(&["databases", db, "tables", table, "columns"]))
                .json(&serde_json::json!({ "column": column, "position": position })),
        )
        .await
    }

    async fn drop_column(&self, db: &str, table: &str, column: &str) -> Result<(), BackendError> {
        self.send_ok(
            self.client
                .delete(self.url(&["databases", db, "tables", table, "columns", column])),
        )
        .await
    }

    async fn add_index(&self, db: &str, table: &str, index: &NewIndex) -> Result<(), BackendError> {
        self.send_ok(
            self.client
                .post(self.url(&["databases", db, "tables", table, "indexes"]))
                .json(index),
        )
        .await
    }

    async fn drop_index(&self, db: &str, table: &str, index: &str) -> Result<(), BackendError> {
        self.send_ok(
            self.client
                .delete(self.url(&["databases", db, "tables", table, "indexes", index])),
        )
        .await
    }

    async fn drop_partition(
        &self,
        db: &str,
        table: &str,
        partition: &str,
    ) -> Result<(), BackendError> {
        self.send_ok(
            self.client
                .delete(self.url(&["databases", db, "tables", table, "partitions", partition])),
        )
        .await
    }
}

#[async_trait::async_trait]
impl MetricsApi for HttpApi {
    async fn query_range(
        &self,
        query: &str,
        start_time_sec: i64,
        end_time_sec: i64,
        step_sec: u32,
    ) -> Result<QueryResponse, BackendError> {
        let mut url = join_segments(&self.metrics_base, &["metrics", "query"]);
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("start_time", &start_time_sec.to_string())
            .append_pair("end_time", &end_time_sec.to_string())
            .append_pair("step", &step_sec.to_string());

        let resp = self.client.get(url).send().await.map_err(transport)?;
        let resp = check(resp).await?;
        resp.json()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

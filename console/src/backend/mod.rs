use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub mod http;

// ---------- schema objects ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TableKind {
    Table,
    View,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Full type string as reported by the backend (e.g. "VARCHAR(100)").
    pub field_type: String,
    #[serde(default)]
    pub is_not_null: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Primary,
    Unique,
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexColumn {
    pub column_name: String,
    /// Prefix length for string columns, when set.
    #[serde(default)]
    pub key_length: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub kind: IndexKind,
    pub columns: Vec<IndexColumn>,
    /// Primary indexes come back with this unset; the view gates the drop
    /// action on it.
    #[serde(default)]
    pub is_deletable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartitionInfo {
    Range {
        expr: String,
        partitions: Vec<RangePartition>,
    },
    List {
        expr: String,
        partitions: Vec<ListPartition>,
    },
    Hash {
        expr: String,
        count: u32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangePartition {
    pub name: String,
    /// None means the partition is unbounded.
    #[serde(default)]
    pub boundary_value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPartition {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub kind: TableKind,
    #[serde(default)]
    pub view_definition: Option<String>,
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub indexes: Vec<IndexInfo>,
    #[serde(default)]
    pub partition: Option<PartitionInfo>,
}

// ---------- mutation requests ----------

/// Where a new column lands. Column order is owned by the server; this is a
/// request parameter, not a client-maintained invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnPosition {
    Head,
    Tail,
    After { column: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewColumn {
    pub name: String,
    pub field_type: String,
    pub is_not_null: bool,
    pub default_value: Option<String>,
    pub comment: Option<String>,
}

/// Index kinds that can be created through the console. Primary is
/// deliberately not expressible here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewIndexKind {
    Unique,
    Normal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIndex {
    pub name: String,
    pub kind: NewIndexKind,
    pub columns: Vec<IndexColumn>,
}

// ---------- metrics query ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub status: QueryStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<QueryData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryData {
    #[serde(default)]
    pub result: Vec<SeriesData>,
}

/// One backend time series: a label set plus (unix seconds, value) samples
/// in time order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesData {
    #[serde(default)]
    pub metric: HashMap<String, String>,
    #[serde(default)]
    pub values: Vec<(f64, f64)>,
}

// ---------- errors ----------

#[derive(Debug)]
pub enum BackendError {
    /// The request never produced a response (connect failure, timeout).
    Transport(String),
    /// The backend answered with an error; the message is shown verbatim in
    /// dialogs.
    Api(String),
    Decode(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "Connection error: {msg}"),
            BackendError::Api(msg) => write!(f, "{msg}"),
            BackendError::Decode(msg) => write!(f, "Invalid response: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

// ---------- traits ----------

#[async_trait::async_trait]
pub trait SchemaApi: Send + Sync {
    async fn databases(&self) -> Result<Vec<String>, BackendError>;

    async fn create_database(&self, name: &str) -> Result<(), BackendError>;

    async fn drop_database(&self, name: &str) -> Result<(), BackendError>;

    async fn table_info(&self, db: &str, table: &str) -> Result<TableInfo, BackendError>;

    async fn add_column(
        &self,
        db: &str,
        table: &str,
        column: &NewColumn,
        position: &ColumnPosition,
    ) -> Result<(), BackendError>;

    async fn drop_column(&self, db: &str, table: &str, column: &str) -> Result<(), BackendError>;

    async fn add_index(&self, db: &str, table: &str, index: &NewIndex) -> Result<(), BackendError>;

    async fn drop_index(&self, db: &str, table: &str, index: &str) -> Result<(), BackendError>;

    async fn drop_partition(
        &self,
        db: &str,
        table: &str,
        partition: &str,
    ) -> Result<(), BackendError>;
}

#[async_trait::async_trait]
pub trait MetricsApi: Send + Sync {
    /// One range query; `start_time_sec`/`end_time_sec` are unix seconds.
    async fn query_range(
        &self,
        query: &str,
        start_time_sec: i64,
        end_time_sec: i64,
        step_sec: u32,
    ) -> Result<QueryResponse, BackendError>;
}

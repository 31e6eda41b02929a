use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::backend::{
    BackendError, ColumnPosition, IndexColumn, IndexKind, NewColumn, NewIndex, PartitionInfo,
    SchemaApi, TableInfo, TableKind,
};

use super::{Dialog, FetchGate};

// ---------- field-type registry ----------

/// Field types offered by the column form.
pub const FIELD_TYPES: &[&str] = &[
    "BIT", "TINYINT", "BOOL", "SMALLINT", "MEDIUMINT", "INT", "BIGINT", "DECIMAL", "FLOAT",
    "DOUBLE", "DATE", "DATETIME", "TIMESTAMP", "TIME", "YEAR", "CHAR", "VARCHAR", "BINARY",
    "VARBINARY", "TINYBLOB", "BLOB", "MEDIUMBLOB", "LONGBLOB", "TINYTEXT", "TEXT", "MEDIUMTEXT",
    "LONGTEXT", "ENUM", "SET", "JSON",
];

// ---------- form drafts ----------

/// Column form values as submitted by the UI.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDraft {
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub is_unsigned: bool,
    #[serde(default)]
    pub is_not_null: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ColumnDraft {
    /// Compose the backend field-type string: "VARCHAR(100)",
    /// "DECIMAL(10,2) UNSIGNED". Decimals only apply together with a length.
    pub fn render_field_type(&self) -> String {
        let mut out = self.type_name.trim().to_uppercase();
        match (self.length, self.decimals) {
            (Some(len), Some(dec)) => out.push_str(&format!("({len},{dec})")),
            (Some(len), None) => out.push_str(&format!("({len})")),
            (None, _) => {}
        }
        if self.is_unsigned {
            out.push_str(" UNSIGNED");
        }
        out
    }

    fn to_new_column(&self) -> NewColumn {
        NewColumn {
            name: self.name.trim().to_string(),
            field_type: self.render_field_type(),
            is_not_null: self.is_not_null,
            default_value: self.default_value.clone().filter(|v| !v.is_empty()),
            comment: self.comment.clone().filter(|v| !v.is_empty()),
        }
    }
}

/// Index form values. The kind cannot express Primary.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexDraft {
    pub name: String,
    pub kind: crate::backend::NewIndexKind,
    #[serde(default)]
    pub columns: Vec<IndexColumn>,
}

// ---------- view model ----------

#[derive(Debug, Clone, Serialize)]
pub struct StructureView {
    pub name: String,
    pub kind: TableKind,
    /// Edit actions are offered only for base tables.
    pub editable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_definition: Option<String>,
    pub columns: Vec<ColumnRow>,
    /// Absent for views: the index card is not shown at all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<IndexRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<PartitionCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnRow {
    pub name: String,
    pub field_type: String,
    pub not_null: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct IndexRow {
    pub name: String,
    /// "col_a, col_b(10)"
    pub columns: String,
    pub kind: IndexKind,
    pub deletable: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "partition_type", rename_all = "UPPERCASE")]
pub enum PartitionCard {
    Range {
        expr: String,
        partitions: Vec<RangeRow>,
    },
    List {
        expr: String,
        partitions: Vec<ListRow>,
    },
    Hash {
        expr: String,
        partition_count: u32,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RangeRow {
    pub name: String,
    pub boundary_value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListRow {
    pub name: String,
    pub values: String,
}

#[derive(Debug, Serialize)]
pub struct StructureAction {
    pub dialog: Dialog,
    /// Present only after a successful mutation (the post-action refetch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structure: Option<StructureView>,
}

pub fn structure_view(info: &TableInfo) -> StructureView {
    let editable = info.kind == TableKind::Table;
    StructureView {
        name: info.name.clone(),
        kind: info.kind,
        editable,
        view_definition: info.view_definition.clone(),
        columns: info
            .columns
            .iter()
            .map(|c| ColumnRow {
                name: c.name.clone(),
                field_type: c.field_type.clone(),
                not_null: c.is_not_null,
                default_value: c.default_value.clone(),
                comment: c.comment.clone(),
            })
            .collect(),
        indexes: (info.kind != TableKind::View).then(|| {
            info.indexes
                .iter()
                .map(|idx| IndexRow {
                    name: idx.name.clone(),
                    columns: index_columns_label(&idx.columns),
                    kind: idx.kind,
                    deletable: idx.is_deletable,
                })
                .collect()
        }),
        partition: info.partition.as_ref().map(partition_card),
    }
}

fn index_columns_label(columns: &[IndexColumn]) -> String {
    columns
        .iter()
        .map(|c| match c.key_length {
            Some(len) => format!("{}({len})", c.column_name),
            None => c.column_name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn partition_card(partition: &PartitionInfo) -> PartitionCard {
    match partition {
        PartitionInfo::Range { expr, partitions } => PartitionCard::Range {
            expr: expr.clone(),
            partitions: partitions
                .iter()
                .map(|p| RangeRow {
                    name: p.name.clone(),
                    boundary_value: p
                        .boundary_value
                        .clone()
                        .unwrap_or_else(|| "MAXVALUE".to_string()),
                })
                .collect(),
        },
        PartitionInfo::List { expr, partitions } => PartitionCard::List {
            expr: expr.clone(),
            partitions: partitions
                .iter()
                .map(|p| ListRow {
                    name: p.name.clone(),
                    values: p.values.join(", "),
                })
                .collect(),
        },
        PartitionInfo::Hash { expr, count } => PartitionCard::Hash {
            expr: expr.clone(),
            partition_count: *count,
        },
    }
}

// ---------- index builder ----------

/// Columns still selectable in an index-builder row: the table's columns
/// minus those already chosen in the other rows of the same form.
pub fn available_index_columns(info: &TableInfo, chosen: &[String]) -> Vec<String> {
    info.columns
        .iter()
        .map(|c| c.name.clone())
        .filter(|name| !chosen.contains(name))
        .collect()
}

// ---------- page state ----------

/// State for one table structure page, keyed by (db, table). The snapshot is
/// replaced only by a successful, still-latest fetch; mutations go through
/// the backend and then refetch, never patching the snapshot directly.
pub struct TablePage {
    db: String,
    table: String,
    gate: FetchGate,
    snapshot: Mutex<Option<TableInfo>>,
    /// One in-flight mutation at a time, like the blocking modal it mirrors.
    mutation: Mutex<()>,
}

impl TablePage {
    pub fn new(db: &str, table: &str) -> Self {
        Self {
            db: db.to_string(),
            table: table.to_string(),
            gate: FetchGate::new(),
            snapshot: Mutex::new(None),
            mutation: Mutex::new(()),
        }
    }

    pub async fn load(&self, api: &dyn SchemaApi) -> Result<StructureView, BackendError> {
        let token = self.gate.begin();
        let info = api.table_info(&self.db, &self.table).await?;
        let view = structure_view(&info);
        let mut snapshot = self.snapshot.lock().await;
        if self.gate.is_latest(token) {
            *snapshot = Some(info);
        }
        Ok(view)
    }

    pub async fn snapshot(&self) -> Option<TableInfo> {
        self.snapshot.lock().await.clone()
    }

    pub async fn add_column(
        &self,
        api: &dyn SchemaApi,
        draft: &ColumnDraft,
        position: &ColumnPosition,
    ) -> StructureAction {
        let _serialized = self.mutation.lock().await;

        if draft.name.trim().is_empty() {
            return failed(Dialog::input_required("name"));
        }
        if draft.type_name.trim().is_empty() {
            return failed(Dialog::input_required("field type"));
        }

        let column = draft.to_new_column();
        match api.add_column(&self.db, &self.table, &column, position).await {
            Ok(()) => self.refetch_with_success(api, "Created successfully").await,
            Err(e) => failed(Dialog::error("Create failed", e.to_string())),
        }
    }

    pub async fn drop_column(&self, api: &dyn SchemaApi, name: &str) -> StructureAction {
        let _serialized = self.mutation.lock().await;

        match api.drop_column(&self.db, &self.table, name).await {
            Ok(()) => self.refetch_with_success(api, "Deleted successfully").await,
            Err(e) => failed(Dialog::error("Delete failed", e.to_string())),
        }
    }

    pub async fn add_index(&self, api: &dyn SchemaApi, draft: &IndexDraft) -> StructureAction {
        let _serialized = self.mutation.lock().await;

        if draft.name.trim().is_empty() {
            return failed(Dialog::input_required("name"));
        }
        if draft.columns.is_empty() {
            return failed(Dialog::input_required("columns"));
        }

        let index = NewIndex {
            name: draft.name.trim().to_string(),
            kind: draft.kind,
            columns: draft.columns.clone(),
        };
        match api.add_index(&self.db, &self.table, &index).await {
            Ok(()) => self.refetch_with_success(api, "Created successfully").await,
            Err(e) => failed(Dialog::error("Create failed", e.to_string())),
        }
    }

    pub async fn drop_index(&self, api: &dyn SchemaApi, name: &str) -> StructureAction {
        let _serialized = self.mutation.lock().await;

        match api.drop_index(&self.db, &self.table, name).await {
            Ok(()) => self.refetch_with_success(api, "Deleted successfully").await,
            Err(e) => failed(Dialog::error("Delete failed", e.to_string())),
        }
    }

    pub async fn drop_partition(&self, api: &dyn SchemaApi, name: &str) -> StructureAction {
        let _serialized = self.mutation.lock().await;

        match api.drop_partition(&self.db, &self.table, name).await {
            Ok(()) => self.refetch_with_success(api, "Deleted successfully").await,
            Err(e) => failed(Dialog::error("Delete failed", e.to_string())),
        }
    }

    /// The mutation already landed; a failed refetch keeps the success dialog
    /// but returns no fresh structure.
    async fn refetch_with_success(&self, api: &dyn SchemaApi, message: &str) -> StructureAction {
        let dialog = Dialog::success(message);
        match self.load(api).await {
            Ok(view) => StructureAction {
                dialog,
                structure: Some(view),
            },
            Err(e) => {
                tracing::warn!(
                    db = %self.db,
                    table = %self.table,
                    error = %e,
                    "structure refetch after mutation failed"
                );
                StructureAction {
                    dialog,
                    structure: None,
                }
            }
        }
    }
}

fn failed(dialog: Dialog) -> StructureAction {
    StructureAction {
        dialog,
        structure: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ColumnInfo, IndexInfo, ListPartition, RangePartition};

    fn column(name: &str) -> ColumnInfo {
        ColumnInfo {
            name: name.to_string(),
            field_type: "INT".to_string(),
            is_not_null: false,
            default_value: None,
            comment: String::new(),
        }
    }

    fn table(kind: TableKind, columns: Vec<ColumnInfo>) -> TableInfo {
        TableInfo {
            name: "users".to_string(),
            kind,
            view_definition: None,
            columns,
            indexes: vec![],
            partition: None,
        }
    }

    #[test]
    fn test_structure_view_renders_columns_in_fetch_order() {
        let info = table(
            TableKind::Table,
            vec![column("id"), column("name"), column("city")],
        );
        let view = structure_view(&info);
        let names: Vec<&str> = view.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "city"]);
    }

    #[test]
    fn test_structure_view_for_view_kind_hides_indexes_and_editing() {
        let mut info = table(TableKind::View, vec![column("id")]);
        info.view_definition = Some("SELECT `id` FROM `t`".to_string());

        let view = structure_view(&info);
        assert!(!view.editable, "Views must not be editable");
        assert!(view.indexes.is_none(), "Index card must be hidden for views");
        assert_eq!(view.view_definition.as_deref(), Some("SELECT `id` FROM `t`"));
    }

    #[test]
    fn test_index_rows_join_columns_with_key_lengths() {
        let mut info = table(TableKind::Table, vec![column("a"), column("b")]);
        info.indexes = vec![IndexInfo {
            name: "idx_ab".to_string(),
            kind: IndexKind::Normal,
            columns: vec![
                IndexColumn {
                    column_name: "a".to_string(),
                    key_length: None,
                },
                IndexColumn {
                    column_name: "b".to_string(),
                    key_length: Some(10),
                },
            ],
            is_deletable: true,
        }];

        let view = structure_view(&info);
        let rows = view.indexes.expect("table kind keeps the index card");
        assert_eq!(rows[0].columns, "a, b(10)");
        assert!(rows[0].deletable);
    }

    #[test]
    fn test_partition_card_range_substitutes_maxvalue() {
        let mut info = table(TableKind::Table, vec![column("id")]);
        info.partition = Some(PartitionInfo::Range {
            expr: "`id`".to_string(),
            partitions: vec![
                RangePartition {
                    name: "p0".to_string(),
                    boundary_value: Some("100".to_string()),
                },
                RangePartition {
                    name: "p1".to_string(),
                    boundary_value: None,
                },
            ],
        });

        match structure_view(&info).partition {
            Some(PartitionCard::Range { partitions, .. }) => {
                assert_eq!(partitions[0].boundary_value, "100");
                assert_eq!(partitions[1].boundary_value, "MAXVALUE");
            }
            other => panic!("Expected range card, got {other:?}"),
        }
    }

    #[test]
    fn test_partition_card_list_joins_values() {
        let mut info = table(TableKind::Table, vec![column("id")]);
        info.partition = Some(PartitionInfo::List {
            expr: "`region`".to_string(),
            partitions: vec![ListPartition {
                name: "p_eu".to_string(),
                values: vec!["1".to_string(), "3".to_string()],
            }],
        });

        match structure_view(&info).partition {
            Some(PartitionCard::List { partitions, .. }) => {
                assert_eq!(partitions[0].values, "1, 3");
            }
            other => panic!("Expected list card, got {other:?}"),
        }
    }

    #[test]
    fn test_partition_card_hash_carries_count_only() {
        let mut info = table(TableKind::Table, vec![column("id")]);
        info.partition = Some(PartitionInfo::Hash {
            expr: "`id`".to_string(),
            count: 8,
        });

        match structure_view(&info).partition {
            Some(PartitionCard::Hash {
                partition_count, ..
            }) => assert_eq!(partition_count, 8),
            other => panic!("Expected hash card, got {other:?}"),
        }
    }

    #[test]
    fn test_available_index_columns_subtracts_chosen() {
        let info = table(
            TableKind::Table,
            vec![column("a"), column("b"), column("c")],
        );
        let chosen = vec!["b".to_string()];
        assert_eq!(available_index_columns(&info, &chosen), vec!["a", "c"]);
        assert_eq!(
            available_index_columns(&info, &[]),
            vec!["a", "b", "c"],
            "Nothing chosen leaves every column selectable"
        );
    }

    #[test]
    fn test_render_field_type_variants() {
        let mut draft = ColumnDraft {
            name: "price".to_string(),
            type_name: "decimal".to_string(),
            length: Some(10),
            decimals: Some(2),
            is_unsigned: true,
            is_not_null: false,
            default_value: None,
            comment: None,
        };
        assert_eq!(draft.render_field_type(), "DECIMAL(10,2) UNSIGNED");

        draft.decimals = None;
        draft.is_unsigned = false;
        assert_eq!(draft.render_field_type(), "DECIMAL(10)");

        draft.length = None;
        draft.decimals = Some(2);
        assert_eq!(
            draft.render_field_type(),
            "DECIMAL",
            "Decimals without a length are ignored"
        );
    }

    #[test]
    fn test_field_type_registry_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for t in FIELD_TYPES {
            assert!(seen.insert(t), "Duplicate field type {t}");
        }
        assert!(FIELD_TYPES.contains(&"VARCHAR"));
    }
}

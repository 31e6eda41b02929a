use serde::Serialize;
use tokio::sync::Mutex;

use crate::backend::{BackendError, SchemaApi};

use super::{Dialog, FetchGate};

// ---------- views ----------

#[derive(Debug, Clone, Serialize)]
pub struct DatabasesView {
    pub databases: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DatabasesAction {
    pub dialog: Dialog,
    /// Present only after a successful mutation (the post-action refetch).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub databases: Option<Vec<String>>,
}

// ---------- page state ----------

/// State for the database list page. The snapshot is replaced only by a
/// successful, still-latest fetch; mutations never patch it in place.
pub struct DatabasesPage {
    gate: FetchGate,
    snapshot: Mutex<Option<Vec<String>>>,
    /// One in-flight mutation at a time, like the blocking modal it mirrors.
    mutation: Mutex<()>,
}

impl Default for DatabasesPage {
    fn default() -> Self {
        Self::new()
    }
}

impl DatabasesPage {
    pub fn new() -> Self {
        Self {
            gate: FetchGate::new(),
            snapshot: Mutex::new(None),
            mutation: Mutex::new(()),
        }
    }

    pub async fn load(&self, api: &dyn SchemaApi) -> Result<DatabasesView, BackendError> {
        let token = self.gate.begin();
        let databases = api.databases().await?;
        let mut snapshot = self.snapshot.lock().await;
        if self.gate.is_latest(token) {
            *snapshot = Some(databases.clone());
        }
        Ok(DatabasesView { databases })
    }

    pub async fn create(&self, api: &dyn SchemaApi, name: &str) -> DatabasesAction {
        let _serialized = self.mutation.lock().await;

        let name = name.trim();
        if name.is_empty() {
            return DatabasesAction {
                dialog: Dialog::input_required("database name"),
                databases: None,
            };
        }

        match api.create_database(name).await {
            Ok(()) => self.refetch_with_success(api, "Created successfully").await,
            Err(e) => DatabasesAction {
                dialog: Dialog::error("Create failed", e.to_string()),
                databases: None,
            },
        }
    }

    pub async fn drop(&self, api: &dyn SchemaApi, name: &str) -> DatabasesAction {
        let _serialized = self.mutation.lock().await;

        match api.drop_database(name).await {
            Ok(()) => self.refetch_with_success(api, "Deleted successfully").await,
            Err(e) => DatabasesAction {
                dialog: Dialog::error("Delete failed", e.to_string()),
                databases: None,
            },
        }
    }

    /// The mutation already landed; a failed refetch keeps the success dialog
    /// but returns no fresh list.
    async fn refetch_with_success(&self, api: &dyn SchemaApi, message: &str) -> DatabasesAction {
        let dialog = Dialog::success(message);
        match self.load(api).await {
            Ok(view) => DatabasesAction {
                dialog,
                databases: Some(view.databases),
            },
            Err(e) => {
                tracing::warn!(error = %e, "database list refetch after mutation failed");
                DatabasesAction {
                    dialog,
                    databases: None,
                }
            }
        }
    }
}

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod chart;
pub mod databases;
pub mod table;

// ---------- dialogs ----------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    Success,
    Error,
}

/// Outcome of a user action, rendered by the UI as a blocking dialog.
#[derive(Debug, Clone, Serialize)]
pub struct Dialog {
    pub kind: DialogKind,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    pub message: String,
}

impl Dialog {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Success,
            title: String::new(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: DialogKind::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Validation dialog shown before any request is issued.
    pub fn input_required(what: &str) -> Self {
        Self::error("Input required", format!("Please input {what}"))
    }
}

// ---------- request tokens ----------

/// Monotonically increasing fetch tokens. A response may only update page
/// state while its token is still the latest issued one, so a stale fetch
/// completing late never overwrites newer data.
#[derive(Debug, Default)]
pub struct FetchGate {
    seq: AtomicU64,
    latest: AtomicU64,
}

impl FetchGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fetch: issue a token and mark it as the latest.
    pub fn begin(&self) -> u64 {
        let token = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        // fetch_max instead of store: concurrent begins may reach this line
        // out of token order.
        self.latest.fetch_max(token, Ordering::SeqCst);
        token
    }

    /// True while no newer fetch has been started.
    pub fn is_latest(&self, token: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == token
    }
}

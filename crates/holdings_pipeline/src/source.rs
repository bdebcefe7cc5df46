use models::RawTable;

use crate::error::Result;

/// Collaborator that delivers the raw holdings table.
///
/// Implementations own all I/O (files, HTTP) and report any failure as
/// [`HoldingsError::SourceUnavailable`](crate::HoldingsError::SourceUnavailable).
/// Fetching is blocking; async callers should run it on a blocking thread.
pub trait HoldingsSource: Send + Sync {
    /// Short human-readable origin, e.g. a file path or sheet id.
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<RawTable>;
}

/// Serves a fixed table. Used for embedding and tests.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    label: String,
    table: RawTable,
}

impl InMemorySource {
    pub fn new(label: impl Into<String>, table: RawTable) -> Self {
        Self {
            label: label.into(),
            table,
        }
    }
}

impl HoldingsSource for InMemorySource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn fetch(&self) -> Result<RawTable> {
        Ok(self.table.clone())
    }
}

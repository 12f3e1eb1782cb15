use async_trait::async_trait;

use crate::error::Result;
use crate::record::CodeRecord;

/// Whole-collection access to the remote record store.
///
/// There is deliberately no partial update: `replace_all` overwrites the
/// entire document, so a caller must have fetched the latest collection
/// immediately beforehand or it discards other writers' changes.
#[async_trait]
pub trait CodeStore: Send + Sync {
    async fn fetch_all(&self) -> Result<Vec<CodeRecord>>;

    async fn replace_all(&self, records: &[CodeRecord]) -> Result<()>;
}

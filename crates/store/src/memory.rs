use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::gateway::CodeStore;
use crate::record::CodeRecord;

/// In-process document with the same whole-replace semantics as the remote
/// store, for tests.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<CodeRecord>>,
    unavailable: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<CodeRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Self::default()
        }
    }

    pub async fn snapshot(&self) -> Vec<CodeRecord> {
        self.records.read().await.clone()
    }

    /// Makes every subsequent call fail with `StoreError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CodeStore for MemoryStore {
    async fn fetch_all(&self) -> Result<Vec<CodeRecord>> {
        self.check_available()?;
        Ok(self.records.read().await.clone())
    }

    async fn replace_all(&self, records: &[CodeRecord]) -> Result<()> {
        self.check_available()?;
        *self.records.write().await = records.to_vec();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

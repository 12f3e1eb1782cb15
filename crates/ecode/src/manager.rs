use std::sync::Arc;

use chrono::Utc;
use ecode_store::{CodeRecord, CodeStore, HttpStore, StoreConfig, DEFAULT_TIMEOUT_SECS};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::LifecycleConfig;
use crate::error::{CodeError, Result};
use crate::generator::{CodeSource, RandomCodes};
use crate::lifecycle::{self, CodeSummary, CodeUpdate, NewCode};

/// Owns the code state machine on top of a whole-document store.
///
/// Every mutation runs fetch, transform, replace while holding `write_lock`,
/// so two mutations issued through the same manager never build on the same
/// snapshot. Other processes writing the same document are not covered.
pub struct CodeManager {
    store: Arc<dyn CodeStore>,
    config: LifecycleConfig,
    codes: Box<dyn CodeSource>,
    write_lock: Mutex<()>,
}

impl CodeManager {
    /// Talks to the remote document named in `config`.
    pub fn connect(config: LifecycleConfig) -> Result<Self> {
        Self::connect_with_timeout(config, DEFAULT_TIMEOUT_SECS)
    }

    pub fn connect_with_timeout(config: LifecycleConfig, timeout_secs: u64) -> Result<Self> {
        let store_config = StoreConfig::new(&config.store_endpoint, &config.store_credential)
            .with_timeout(timeout_secs);
        let store = HttpStore::new(store_config)?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    pub fn with_store(config: LifecycleConfig, store: Arc<dyn CodeStore>) -> Self {
        Self {
            store,
            config,
            codes: Box::new(RandomCodes),
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_code_source(mut self, source: impl CodeSource + 'static) -> Self {
        self.codes = Box::new(source);
        self
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Issues a new code and returns it.
    pub async fn generate(&self, request: NewCode) -> Result<String> {
        lifecycle::validate_new(&request)?;

        let _guard = self.write_lock.lock().await;
        let mut records = self.store.fetch_all().await?;

        let code = self.unique_code(&records)?;
        let record = lifecycle::new_record(
            code.clone(),
            &request,
            self.config.default_expiry_hours,
            Utc::now(),
        )?;
        info!(
            "Generated code {} for {} {} (${}), expires {}",
            record.code, record.amount, record.crypto, record.usd, record.expires_at
        );
        records.push(record);

        self.store.replace_all(&records).await?;
        Ok(code)
    }

    fn unique_code(&self, records: &[CodeRecord]) -> Result<String> {
        let attempts = self.config.max_generation_attempts;
        for attempt in 1..=attempts {
            let candidate = self.codes.next_code();
            if lifecycle::position(records, &candidate).is_none() {
                return Ok(candidate);
            }
            debug!("Code collision on attempt {}, drawing again", attempt);
        }
        Err(CodeError::GenerationExhausted(attempts))
    }

    /// Read-only validation.
    pub async fn check(&self, code: &str) -> Result<CodeSummary> {
        let records = self.store.fetch_all().await?;
        let summary = lifecycle::check(&records, code, Utc::now())?;
        debug!("Code {} is usable", code);
        Ok(summary)
    }

    /// Consumes the code. Returns the updated record as a receipt.
    pub async fn redeem(&self, code: &str) -> Result<CodeRecord> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.store.fetch_all().await?;

        let receipt = lifecycle::redeem(&mut records, code, Utc::now())?;
        self.store.replace_all(&records).await?;

        info!(
            "Redeemed code {} ({} {})",
            receipt.code, receipt.amount, receipt.crypto
        );
        Ok(receipt)
    }

    pub async fn update(&self, code: &str, changes: CodeUpdate) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.store.fetch_all().await?;

        lifecycle::update(&mut records, code, &changes)?;
        self.store.replace_all(&records).await?;

        info!("Updated code {}", code);
        Ok(())
    }

    pub async fn revoke(&self, code: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.store.fetch_all().await?;

        lifecycle::revoke(&mut records, code)?;
        self.store.replace_all(&records).await?;

        info!("Revoked code {}", code);
        Ok(())
    }

    /// Whole collection, for operators.
    pub async fn list(&self) -> Result<Vec<CodeRecord>> {
        Ok(self.store.fetch_all().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::is_well_formed;
    use crate::input::Field;
    use chrono::Duration;
    use ecode_store::{MemoryStore, StoreError};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn btc() -> NewCode {
        NewCode {
            crypto: Field::Given("BTC".into()),
            usd: Field::Given(100.0),
            amount: Field::Given(0.002),
            expires_at: Field::Missing,
        }
    }

    fn manager() -> (CodeManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let manager = CodeManager::with_store(LifecycleConfig::default(), store.clone());
        (manager, store)
    }

    /// Replays a fixed list of codes, then repeats the last one.
    struct Scripted {
        codes: Vec<&'static str>,
        next: AtomicUsize,
    }

    impl Scripted {
        fn new(codes: Vec<&'static str>) -> Self {
            Self {
                codes,
                next: AtomicUsize::new(0),
            }
        }
    }

    impl CodeSource for Scripted {
        fn next_code(&self) -> String {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            self.codes[i.min(self.codes.len() - 1)].to_string()
        }
    }

    #[tokio::test]
    async fn test_generate_check_redeem_flow() {
        let (manager, store) = manager();

        let code = manager.generate(btc()).await.unwrap();
        assert!(is_well_formed(&code));

        let summary = manager.check(&code).await.unwrap();
        assert_eq!(summary.code, code);
        assert_eq!(summary.crypto, "BTC");
        assert_eq!(summary.usd, 100.0);
        assert_eq!(summary.amount, 0.002);

        let receipt = manager.redeem(&code).await.unwrap();
        assert!(receipt.redeemed);
        assert!(receipt.redeemed_at.is_some());

        assert!(matches!(
            manager.redeem(&code).await,
            Err(CodeError::Unavailable)
        ));
        assert!(matches!(
            manager.check(&code).await,
            Err(CodeError::AlreadyRedeemed)
        ));

        let stored = store.snapshot().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0], receipt);
    }

    #[tokio::test]
    async fn test_generate_without_usd_writes_nothing() {
        let (manager, store) = manager();
        manager.generate(btc()).await.unwrap();

        let request = NewCode { usd: Field::Missing, ..btc() };
        assert!(matches!(
            manager.generate(request).await,
            Err(CodeError::Validation(_))
        ));
        assert_eq!(store.snapshot().await.len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_uses_configured_default_expiry() {
        let store = Arc::new(MemoryStore::new());
        let config = LifecycleConfig::default().with_default_expiry_hours(2);
        let manager = CodeManager::with_store(config, store.clone());

        let before = Utc::now();
        manager.generate(btc()).await.unwrap();
        let after = Utc::now();

        let record = &store.snapshot().await[0];
        assert!(record.expires_at >= before + Duration::hours(2));
        assert!(record.expires_at <= after + Duration::hours(2));
        assert!(record.created_at >= before && record.created_at <= after);
    }

    #[tokio::test]
    async fn test_generated_codes_are_unique() {
        let (manager, store) = manager();
        for _ in 0..50 {
            manager.generate(btc()).await.unwrap();
        }

        let records = store.snapshot().await;
        let codes: HashSet<&str> = records.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes.len(), 50);
        assert!(codes.iter().all(|c| is_well_formed(c)));
    }

    #[tokio::test]
    async fn test_generate_retries_on_collision() {
        let (manager, store) = manager();
        let manager = manager.with_code_source(Scripted::new(vec![
            "AAAA-AAAA-AAAA-AAAA",
            "AAAA-AAAA-AAAA-AAAA",
            "BBBB-BBBB-BBBB-BBBB",
        ]));

        let first = manager.generate(btc()).await.unwrap();
        let second = manager.generate(btc()).await.unwrap();
        assert_eq!(first, "AAAA-AAAA-AAAA-AAAA");
        assert_eq!(second, "BBBB-BBBB-BBBB-BBBB");
        assert_eq!(store.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn test_generate_gives_up_after_max_attempts() {
        let store = Arc::new(MemoryStore::new());
        let config = LifecycleConfig::default().with_max_generation_attempts(3);
        let manager = CodeManager::with_store(config, store.clone())
            .with_code_source(Scripted::new(vec!["AAAA-AAAA-AAAA-AAAA"]));

        manager.generate(btc()).await.unwrap();
        assert!(matches!(
            manager.generate(btc()).await,
            Err(CodeError::GenerationExhausted(3))
        ));
        assert_eq!(store.snapshot().await.len(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_expired_code_fails_check_and_redeem() {
        let (manager, _store) = manager();
        let request = NewCode {
            expires_at: Field::Given(Utc::now() - Duration::minutes(1)),
            ..btc()
        };
        let code = manager.generate(request).await.unwrap();

        assert!(matches!(manager.check(&code).await, Err(CodeError::Expired)));
        assert!(matches!(manager.redeem(&code).await, Err(CodeError::Expired)));
    }

    #[tokio::test]
    async fn test_update_then_extend_expiry() {
        let (manager, store) = manager();
        let request = NewCode {
            expires_at: Field::Given(Utc::now() - Duration::minutes(1)),
            ..btc()
        };
        let code = manager.generate(request).await.unwrap();

        let changes = CodeUpdate {
            usd: Field::Given(150.0),
            expires_at: Field::Given(Utc::now() + Duration::hours(1)),
            ..CodeUpdate::default()
        };
        manager.update(&code, changes).await.unwrap();

        let record = &store.snapshot().await[0];
        assert_eq!(record.crypto, "BTC");
        assert_eq!(record.usd, 150.0);
        assert_eq!(record.amount, 0.002);
        assert!(manager.check(&code).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_twice_and_unknown() {
        let (manager, store) = manager();
        let code = manager.generate(btc()).await.unwrap();

        manager.revoke(&code).await.unwrap();
        manager.revoke(&code).await.unwrap();
        assert!(store.snapshot().await[0].revoked);
        assert!(matches!(manager.check(&code).await, Err(CodeError::Revoked)));
        assert!(matches!(
            manager.redeem(&code).await,
            Err(CodeError::Unavailable)
        ));

        assert!(matches!(
            manager.revoke("ZZZZ-ZZZZ-ZZZZ-ZZZZ").await,
            Err(CodeError::NotFound)
        ));
        assert!(matches!(
            manager.update("ZZZZ-ZZZZ-ZZZZ-ZZZZ", CodeUpdate::default()).await,
            Err(CodeError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_list_returns_everything() {
        let (manager, _store) = manager();
        let a = manager.generate(btc()).await.unwrap();
        let b = manager.generate(btc()).await.unwrap();
        manager.redeem(&a).await.unwrap();

        let all = manager.list().await.unwrap();
        let codes: Vec<&str> = all.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec![a.as_str(), b.as_str()]);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let (manager, store) = manager();
        let code = manager.generate(btc()).await.unwrap();

        store.set_unavailable(true);
        assert!(matches!(
            manager.redeem(&code).await,
            Err(CodeError::Store(StoreError::Unavailable(_)))
        ));
        assert!(matches!(
            manager.generate(btc()).await,
            Err(CodeError::Store(_))
        ));

        store.set_unavailable(false);
        assert!(manager.check(&code).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_redeems_succeed_once() {
        let (manager, store) = manager();
        let manager = Arc::new(manager);
        let code = manager.generate(btc()).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = manager.clone();
                let code = code.clone();
                tokio::spawn(async move { manager.redeem(&code).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert!(matches!(e, CodeError::Unavailable)),
            }
        }
        assert_eq!(successes, 1);
        assert!(store.snapshot().await[0].redeemed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_generates_keep_every_code() {
        let (manager, store) = manager();
        let manager = Arc::new(manager);

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.generate(btc()).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.snapshot().await.len(), 20);
    }

    #[tokio::test]
    async fn test_foreign_writer_with_stale_snapshot_loses_redemption() {
        // Another process sharing the document is outside the write lock.
        let (manager, store) = manager();
        let code = manager.generate(btc()).await.unwrap();

        let stale = store.fetch_all().await.unwrap();
        manager.redeem(&code).await.unwrap();
        store.replace_all(&stale).await.unwrap();

        assert!(!store.snapshot().await[0].redeemed);
        assert!(manager.check(&code).await.is_ok());
    }
}

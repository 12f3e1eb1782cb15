//! Gateway to the remote document holding every issued exchange code.
//!
//! The store only knows two operations: read the whole collection and replace
//! the whole collection. Business rules live in `ecode-core`.
//!
//! ```rust,no_run
//! use ecode_store::{CodeStore, HttpStore, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> ecode_store::Result<()> {
//!     let config = StoreConfig::new("https://api.jsonbin.io/v3/b/<bin-id>", "<master-key>");
//!     let store = HttpStore::new(config)?;
//!
//!     let records = store.fetch_all().await?;
//!     println!("{} codes issued", records.len());
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod http_store;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod record;

pub use config::{StoreConfig, CREDENTIAL_HEADER, DEFAULT_TIMEOUT_SECS};
pub use error::{Result, StoreError};
pub use gateway::CodeStore;
pub use http_store::HttpStore;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryStore;
pub use record::CodeRecord;

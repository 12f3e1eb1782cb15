//! Exchange code lifecycle: issue, check, redeem, update, revoke.
//!
//! ```rust,no_run
//! use ecode_core::{CodeManager, Field, LifecycleConfig, NewCode};
//!
//! #[tokio::main]
//! async fn main() -> ecode_core::Result<()> {
//!     let config = LifecycleConfig::new("https://api.jsonbin.io/v3/b/<bin-id>", "<master-key>");
//!     let manager = CodeManager::connect(config)?;
//!
//!     let code = manager
//!         .generate(NewCode {
//!             crypto: Field::Given("BTC".into()),
//!             usd: Field::Given(100.0),
//!             amount: Field::Given(0.002),
//!             expires_at: Field::Missing,
//!         })
//!         .await?;
//!     let receipt = manager.redeem(&code).await?;
//!     println!("redeemed at {:?}", receipt.redeemed_at);
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod input;
pub mod lifecycle;
pub mod manager;

pub use config::{
    LifecycleConfig, DEFAULT_EXPIRY_HOURS, DEFAULT_MAX_GENERATION_ATTEMPTS, MAX_EXPIRY_HOURS,
};
pub use ecode_store::{CodeRecord, CodeStore, StoreError};
pub use error::{CodeError, Result};
pub use generator::{CodeSource, RandomCodes};
pub use input::Field;
pub use lifecycle::{CodeStatus, CodeSummary, CodeUpdate, NewCode};
pub use manager::CodeManager;

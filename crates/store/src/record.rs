use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One issued exchange code as persisted in the remote document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRecord {
    pub code: String,
    pub crypto: String,
    pub usd: f64,
    pub amount: f64,
    pub expires_at: DateTime<Utc>,
    pub redeemed: bool,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
    pub redeemed_at: Option<DateTime<Utc>>,
}

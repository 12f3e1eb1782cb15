//! Pure state transitions over a fetched collection.
//!
//! Nothing here touches the store; `CodeManager` wraps each function in a
//! fetch and, for mutations, a replace.

use chrono::{DateTime, Duration, Utc};
use ecode_store::CodeRecord;
use serde::{Deserialize, Serialize};

use crate::error::{CodeError, Result};
use crate::input::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeStatus {
    Active,
    /// Derived from the clock, never stored.
    Expired,
    Redeemed,
    Revoked,
}

/// Input to `generate`. A missing, falsy or malformed field surfaces as
/// `CodeError::Validation` rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCode {
    pub crypto: Field<String>,
    pub usd: Field<f64>,
    pub amount: Field<f64>,
    pub expires_at: Field<DateTime<Utc>>,
}

/// Administrative overwrite. Only supplied, truthy fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CodeUpdate {
    pub crypto: Field<String>,
    pub usd: Field<f64>,
    pub amount: Field<f64>,
    pub expires_at: Field<DateTime<Utc>>,
}

/// Public view returned by `check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSummary {
    pub code: String,
    pub crypto: String,
    pub amount: f64,
    pub usd: f64,
    pub expires_at: DateTime<Utc>,
}

impl From<&CodeRecord> for CodeSummary {
    fn from(record: &CodeRecord) -> Self {
        Self {
            code: record.code.clone(),
            crypto: record.crypto.clone(),
            amount: record.amount,
            usd: record.usd,
            expires_at: record.expires_at,
        }
    }
}

fn truthy_text<'a>(field: &'a Field<String>, name: &str) -> Result<Option<&'a str>> {
    Ok(field
        .resolve(name)?
        .map(String::as_str)
        .filter(|s| !s.is_empty()))
}

fn truthy_number(field: &Field<f64>, name: &str) -> Result<Option<f64>> {
    Ok(field
        .resolve(name)?
        .copied()
        .filter(|v| *v != 0.0 && !v.is_nan()))
}

/// `now + hours`, or a validation error when that instant is unrepresentable.
pub fn expiry_after(now: DateTime<Utc>, hours: i64) -> Result<DateTime<Utc>> {
    Duration::try_hours(hours)
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| CodeError::Validation(format!("expiry of {} hours is out of range", hours)))
}

pub fn is_expired(record: &CodeRecord, now: DateTime<Utc>) -> bool {
    now > record.expires_at
}

pub fn status(record: &CodeRecord, now: DateTime<Utc>) -> CodeStatus {
    if record.revoked {
        CodeStatus::Revoked
    } else if record.redeemed {
        CodeStatus::Redeemed
    } else if is_expired(record, now) {
        CodeStatus::Expired
    } else {
        CodeStatus::Active
    }
}

/// Index of the first record carrying `code`.
pub fn position(records: &[CodeRecord], code: &str) -> Option<usize> {
    records.iter().position(|r| r.code == code)
}

/// Checks the fields `generate` requires: non-empty `crypto`, non-zero `usd`
/// and `amount`.
pub fn validate_new(request: &NewCode) -> Result<(&str, f64, f64)> {
    let crypto = truthy_text(&request.crypto, "crypto")?
        .ok_or_else(|| CodeError::Validation("crypto is required".into()))?;
    let usd = truthy_number(&request.usd, "usd")?
        .ok_or_else(|| CodeError::Validation("usd is required".into()))?;
    let amount = truthy_number(&request.amount, "amount")?
        .ok_or_else(|| CodeError::Validation("amount is required".into()))?;
    request.expires_at.resolve("expiresAt")?;
    Ok((crypto, usd, amount))
}

pub fn new_record(
    code: String,
    request: &NewCode,
    default_expiry_hours: i64,
    now: DateTime<Utc>,
) -> Result<CodeRecord> {
    let (crypto, usd, amount) = validate_new(request)?;
    let expires_at = match request.expires_at.resolve("expiresAt")? {
        Some(at) => *at,
        None => expiry_after(now, default_expiry_hours)?,
    };

    Ok(CodeRecord {
        code,
        crypto: crypto.to_string(),
        usd,
        amount,
        expires_at,
        redeemed: false,
        revoked: false,
        created_at: now,
        redeemed_at: None,
    })
}

pub fn check(records: &[CodeRecord], code: &str, now: DateTime<Utc>) -> Result<CodeSummary> {
    let record = position(records, code)
        .map(|i| &records[i])
        .ok_or(CodeError::NotFound)?;

    match status(record, now) {
        CodeStatus::Revoked => Err(CodeError::Revoked),
        CodeStatus::Redeemed => Err(CodeError::AlreadyRedeemed),
        CodeStatus::Expired => Err(CodeError::Expired),
        CodeStatus::Active => Ok(CodeSummary::from(record)),
    }
}

/// Marks the code redeemed and returns the updated record as a receipt.
pub fn redeem(records: &mut [CodeRecord], code: &str, now: DateTime<Utc>) -> Result<CodeRecord> {
    let i = position(records, code).ok_or(CodeError::NotFound)?;
    let record = &mut records[i];

    if record.redeemed || record.revoked {
        return Err(CodeError::Unavailable);
    }
    if is_expired(record, now) {
        return Err(CodeError::Expired);
    }

    record.redeemed = true;
    record.redeemed_at = Some(now);
    Ok(record.clone())
}

pub fn update(records: &mut [CodeRecord], code: &str, changes: &CodeUpdate) -> Result<()> {
    let i = position(records, code).ok_or(CodeError::NotFound)?;

    // Resolve everything first so a bad field leaves the record untouched.
    let crypto = truthy_text(&changes.crypto, "crypto")?;
    let usd = truthy_number(&changes.usd, "usd")?;
    let amount = truthy_number(&changes.amount, "amount")?;
    let expires_at = changes.expires_at.resolve("expiresAt")?.copied();

    let record = &mut records[i];
    if let Some(crypto) = crypto {
        record.crypto = crypto.to_string();
    }
    if let Some(usd) = usd {
        record.usd = usd;
    }
    if let Some(amount) = amount {
        record.amount = amount;
    }
    if let Some(expires_at) = expires_at {
        record.expires_at = expires_at;
    }
    Ok(())
}

/// Idempotent.
pub fn revoke(records: &mut [CodeRecord], code: &str) -> Result<()> {
    let i = position(records, code).ok_or(CodeError::NotFound)?;
    records[i].revoked = true;
    Ok(())
}

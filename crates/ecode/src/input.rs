//! Request fields with loose, truthiness-based decoding.
//!
//! Callers send whatever JSON they like. `null`, `false`, `""` and `0` count
//! as "not supplied"; anything else must decode as `T` or it is carried as
//! `Field::Invalid` and reported as a validation error by the lifecycle.

use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde_json::Value;

use crate::error::{CodeError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Field<T> {
    Missing,
    Given(T),
    /// Truthy value of the wrong shape, with the decode error.
    Invalid(String),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Missing
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Field::Missing, Field::Given)
    }
}

impl<T> Field<T> {
    /// `Ok(None)` when not supplied, `Err` when supplied but unusable.
    pub fn resolve(&self, name: &str) -> Result<Option<&T>> {
        match self {
            Field::Missing => Ok(None),
            Field::Given(value) => Ok(Some(value)),
            Field::Invalid(reason) => Err(CodeError::Validation(format!("{}: {}", name, reason))),
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Number(n) => n.as_f64().map_or(false, |v| v == 0.0),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if is_falsy(&value) {
            return Ok(Field::Missing);
        }
        Ok(match serde_json::from_value(value) {
            Ok(parsed) => Field::Given(parsed),
            Err(e) => Field::Invalid(e.to_string()),
        })
    }
}

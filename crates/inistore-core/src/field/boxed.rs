//! Dynamically typed field values for the RPC layer.
//!
//! An RPC or IPC front end reads and writes individual fields by name without
//! knowing the settings struct.  It exchanges [`BoxedValue`]s; converting a
//! boxed value back into a field yields an [`UnboxResult`] that the front end
//! maps onto its own reply codes.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tagged, dynamically typed field value.
///
/// Serializes as `{"type": "unsigned", "value": 8080}` so it can travel over
/// JSON-based RPC surfaces unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum BoxedValue {
    Bool(bool),
    Unsigned(u64),
    Text(String),
}

impl BoxedValue {
    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            BoxedValue::Bool(_) => "bool",
            BoxedValue::Unsigned(_) => "unsigned",
            BoxedValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for BoxedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxedValue::Bool(b) => write!(f, "{b}"),
            BoxedValue::Unsigned(n) => write!(f, "{n}"),
            BoxedValue::Text(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for BoxedValue {
    fn from(value: bool) -> Self {
        BoxedValue::Bool(value)
    }
}

impl From<u64> for BoxedValue {
    fn from(value: u64) -> Self {
        BoxedValue::Unsigned(value)
    }
}

impl From<String> for BoxedValue {
    fn from(value: String) -> Self {
        BoxedValue::Text(value)
    }
}

impl From<&str> for BoxedValue {
    fn from(value: &str) -> Self {
        BoxedValue::Text(value.to_string())
    }
}

/// Why a boxed value could not be converted into a field's native type.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum UnboxError {
    /// The boxed variant does not match the field type.
    #[error("boxed value has the wrong type for this field")]
    TypeMismatch,

    /// The variant matches but the value does not fit the field.
    #[error("boxed value is out of range for this field")]
    OutOfRange,
}

/// Outcome of writing a boxed value into a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnboxResult {
    /// The field now holds a different value.
    Updated,
    /// The value was accepted but equal to the current one.
    Unchanged,
    /// No field has the requested name.
    KeyUnknown,
    /// The boxed variant does not match the field type.
    ValueTypeInvalid,
    /// The value does not fit the field (range or capacity).
    ValueInvalid,
    /// The field is read-only for boxed access.
    PermissionDenied,
}

impl UnboxResult {
    /// Returns `true` for [`UnboxResult::Updated`] and
    /// [`UnboxResult::Unchanged`].
    pub fn is_accepted(self) -> bool {
        matches!(self, UnboxResult::Updated | UnboxResult::Unchanged)
    }
}

impl From<UnboxError> for UnboxResult {
    fn from(error: UnboxError) -> Self {
        match error {
            UnboxError::TypeMismatch => UnboxResult::ValueTypeInvalid,
            UnboxError::OutOfRange => UnboxResult::ValueInvalid,
        }
    }
}

impl fmt::Display for UnboxResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnboxResult::Updated => "updated",
            UnboxResult::Unchanged => "unchanged",
            UnboxResult::KeyUnknown => "unknown key",
            UnboxResult::ValueTypeInvalid => "invalid value type",
            UnboxResult::ValueInvalid => "invalid value",
            UnboxResult::PermissionDenied => "permission denied",
        };
        f.write_str(text)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

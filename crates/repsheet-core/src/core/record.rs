// crates/repsheet-core/src/core/record.rs
// ============================================================================
// Module: Repsheet Record Model
// Description: Raw rows, typed record binding, and row decode/encode helpers.
// Purpose: Convert untrusted backend rows into strongly typed records.
// Dependencies: crate::core::identifiers, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The backing store speaks JSON objects with no enforced schema. This module
//! is the parse-don't-validate boundary: every row crossing into the typed
//! world is decoded through [`TableRecord`], and malformed rows are rejected
//! with a [`RowShapeError`] instead of leaking optional-field guesswork into
//! callers.
//!
//! Security posture: backend rows are untrusted input and must never be
//! consumed without passing through this boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::core::identifiers::RecordId;
use crate::core::identifiers::TableId;
use crate::core::identifiers::TenantId;

// ============================================================================
// SECTION: Raw Rows
// ============================================================================

/// Raw backend row: field name to JSON value, as received on the wire.
pub type RawRow = serde_json::Map<String, Value>;

/// Row shape violation raised when a row cannot cross the typed boundary.
///
/// # Invariants
/// - `table` names the collection whose row failed to decode or encode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row in table {table} violates expected shape: {detail}")]
pub struct RowShapeError {
    /// Table whose row failed the shape check.
    pub table: TableId,
    /// Human-readable description of the violation.
    pub detail: String,
}

// ============================================================================
// SECTION: Typed Record Binding
// ============================================================================

/// Binding between a typed record and its backing table.
///
/// Implementations declare which table their rows live in, which column
/// carries the owning tenant id, and how to read the record's identity.
pub trait TableRecord: Serialize + DeserializeOwned {
    /// Table this record type is stored in.
    fn table() -> TableId;

    /// Column holding the owning tenant id within rows of this table.
    fn owner_column() -> &'static str;

    /// Opaque record identifier, unique within table and tenant scope.
    fn record_id(&self) -> RecordId;

    /// Owning tenant id embedded in the record.
    fn tenant_id(&self) -> TenantId;
}

// ============================================================================
// SECTION: Row Conversion
// ============================================================================

/// Decodes one raw backend row into a typed record.
///
/// # Errors
///
/// Returns [`RowShapeError`] when the row does not match the record shape.
pub fn decode_row<T: TableRecord>(row: RawRow) -> Result<T, RowShapeError> {
    serde_json::from_value(Value::Object(row)).map_err(|err| RowShapeError {
        table: T::table(),
        detail: err.to_string(),
    })
}

/// Decodes a sequence of raw rows, failing on the first malformed row.
///
/// # Errors
///
/// Returns [`RowShapeError`] for the first row that does not match the
/// record shape.
pub fn decode_rows<T: TableRecord>(rows: Vec<RawRow>) -> Result<Vec<T>, RowShapeError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(decode_row(row)?);
    }
    Ok(out)
}

/// Encodes a typed record into the raw row form the backend accepts.
///
/// # Errors
///
/// Returns [`RowShapeError`] when the record does not serialize to a JSON
/// object.
pub fn encode_row<T: TableRecord>(record: &T) -> Result<RawRow, RowShapeError> {
    let value = serde_json::to_value(record).map_err(|err| RowShapeError {
        table: T::table(),
        detail: err.to_string(),
    })?;
    match value {
        Value::Object(row) => Ok(row),
        other => Err(RowShapeError {
            table: T::table(),
            detail: format!("record serialized to non-object value of type {}", json_type(&other)),
        }),
    }
}

/// Returns a stable name for a JSON value's type, for error messages.
fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// SECTION: Row Patches
// ============================================================================

/// Partial-row update merged into rows matched by an equality filter.
///
/// # Invariants
/// - Columns not named by the patch are left untouched by an update.
/// - An empty patch is a no-op at the store level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPatch {
    /// Column values to merge into matching rows.
    columns: BTreeMap<String, Value>,
}

impl RowPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one column value in the patch.
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    /// Returns true when the patch names no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the patched value for a column, when present.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Renders the patch as a raw row for wire transfer.
    #[must_use]
    pub fn to_row(&self) -> RawRow {
        self.columns.iter().map(|(key, value)| (key.clone(), value.clone())).collect()
    }

    /// Merges the patch into an existing raw row in place.
    pub fn apply(&self, row: &mut RawRow) {
        for (column, value) in &self.columns {
            row.insert(column.clone(), value.clone());
        }
    }
}

// crates/repsheet-core/src/core/query.rs
// ============================================================================
// Module: Repsheet Query Model
// Description: Equality filters, ordering, and deterministic value comparison.
// Purpose: Give select operations database-like filter and sort semantics.
// Dependencies: crate::core::record, serde, serde_json, bigdecimal, time
// ============================================================================

//! ## Overview
//! Select operations carry at most one equality filter and one ordering
//! directive. Value comparison is deterministic: numeric columns order by
//! decimal value (never by float rounding), RFC3339 strings order as
//! instants, other strings lexicographically, and mixed types by a fixed
//! rank. Missing columns compare as JSON null.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use serde_json::Value;
use time::Date;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::core::record::RawRow;

// ============================================================================
// SECTION: Filters and Ordering
// ============================================================================

/// Equality filter matching rows whose column equals a value.
///
/// # Invariants
/// - A row without the named column matches only a null filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqFilter {
    /// Column the filter applies to.
    pub column: String,
    /// Value the column must equal.
    pub value: Value,
}

impl EqFilter {
    /// Creates an equality filter.
    #[must_use]
    pub fn new(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Returns true when the row satisfies the filter.
    #[must_use]
    pub fn matches(&self, row: &RawRow) -> bool {
        let cell = row.get(&self.column).unwrap_or(&Value::Null);
        values_equal(cell, &self.value)
    }
}

/// Ordering directive for select results.
///
/// # Invariants
/// - Sorting is stable: rows comparing equal keep their backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column supplying the sort key.
    pub column: String,
    /// True for non-decreasing order, false for non-increasing.
    pub ascending: bool,
}

impl OrderBy {
    /// Creates an ordering directive.
    #[must_use]
    pub fn new(column: impl Into<String>, ascending: bool) -> Self {
        Self {
            column: column.into(),
            ascending,
        }
    }

    /// Creates a non-decreasing ordering on the column.
    #[must_use]
    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new(column, true)
    }

    /// Creates a non-increasing ordering on the column.
    #[must_use]
    pub fn descending(column: impl Into<String>) -> Self {
        Self::new(column, false)
    }
}

/// Select constraints: optional equality filter plus optional ordering.
///
/// # Invariants
/// - An empty query selects the full table for the addressed tenant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    /// Equality filter, when constrained.
    pub filter: Option<EqFilter>,
    /// Ordering directive, when ordered.
    pub order: Option<OrderBy>,
}

impl SelectQuery {
    /// Creates an unconstrained query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint to the query.
    #[must_use]
    pub fn with_eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(EqFilter::new(column, value));
        self
    }

    /// Adds an ordering directive to the query.
    #[must_use]
    pub fn with_order(mut self, column: impl Into<String>, ascending: bool) -> Self {
        self.order = Some(OrderBy::new(column, ascending));
        self
    }

    /// Returns true when the row satisfies the filter, if any.
    #[must_use]
    pub fn matches(&self, row: &RawRow) -> bool {
        self.filter.as_ref().is_none_or(|filter| filter.matches(row))
    }

    /// Applies the filter and ordering to a row set.
    #[must_use]
    pub fn apply(&self, rows: Vec<RawRow>) -> Vec<RawRow> {
        let mut kept: Vec<RawRow> = rows.into_iter().filter(|row| self.matches(row)).collect();
        if let Some(order) = &self.order {
            kept.sort_by(|left, right| {
                let left_cell = left.get(&order.column).unwrap_or(&Value::Null);
                let right_cell = right.get(&order.column).unwrap_or(&Value::Null);
                let ordering = order_values(left_cell, right_cell);
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        kept
    }
}

// ============================================================================
// SECTION: Value Comparison
// ============================================================================

/// Compares JSON values for equality, with decimal-aware numeric handling.
#[must_use]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(left_num), Value::Number(right_num)) => {
            match decimal_cmp(left_num, right_num) {
                Some(ordering) => ordering.is_eq(),
                None => left == right,
            }
        }
        _ => left == right,
    }
}

/// Totally orders two JSON values for deterministic sorting.
///
/// Different value types order by a fixed rank (null, bool, number, string,
/// array, object). Numbers order by decimal value; strings temporally when
/// both parse as RFC3339 instants or dates, lexicographically otherwise;
/// arrays and objects by their rendered JSON form.
#[must_use]
pub fn order_values(left: &Value, right: &Value) -> Ordering {
    let rank = value_rank(left).cmp(&value_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }
    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(left_flag), Value::Bool(right_flag)) => left_flag.cmp(right_flag),
        (Value::Number(left_num), Value::Number(right_num)) => {
            decimal_cmp(left_num, right_num)
                .unwrap_or_else(|| left_num.to_string().cmp(&right_num.to_string()))
        }
        (Value::String(left_text), Value::String(right_text)) => {
            temporal_cmp(left_text, right_text).unwrap_or_else(|| left_text.cmp(right_text))
        }
        _ => left.to_string().cmp(&right.to_string()),
    }
}

/// Fixed cross-type rank used when ordering mixed-type columns.
const fn value_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Orders numeric JSON values using decimal-aware comparison.
fn decimal_cmp(left: &Number, right: &Number) -> Option<Ordering> {
    let left = decimal_from_number(left)?;
    let right = decimal_from_number(right)?;
    Some(left.cmp(&right))
}

/// Parses a JSON number into `BigDecimal` with a stable string representation.
fn decimal_from_number(number: &Number) -> Option<BigDecimal> {
    let rendered = number.to_string();
    BigDecimal::from_str(&rendered).ok()
}

/// Compares RFC3339 date-time or date-only strings.
fn temporal_cmp(left: &str, right: &str) -> Option<Ordering> {
    if let (Ok(left), Ok(right)) =
        (OffsetDateTime::parse(left, &Rfc3339), OffsetDateTime::parse(right, &Rfc3339))
    {
        return Some(left.cmp(&right));
    }
    let left = parse_rfc3339_date(left)?;
    let right = parse_rfc3339_date(right)?;
    Some(left.cmp(&right))
}

/// Parses an RFC3339 date-only value (YYYY-MM-DD).
fn parse_rfc3339_date(value: &str) -> Option<Date> {
    let mut parts = value.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u8 = parts.next()?.parse().ok()?;
    let day: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let month = time::Month::try_from(month).ok()?;
    Date::from_calendar_date(year, month, day).ok()
}

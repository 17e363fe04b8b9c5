// crates/repsheet-core/src/core/time.rs
// ============================================================================
// Module: Repsheet Time Model
// Description: Caller-supplied timestamp representation for records.
// Purpose: Keep record timestamps deterministic and host-controlled.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Repsheet embeds explicit time values in records to keep store behavior
//! deterministic and replayable. The core never reads wall-clock time; hosts
//! supply timestamps when constructing samples.
//!
//! On the wire a [`Timestamp`] is the value a sheet column actually holds:
//! unix-millisecond instants render as RFC 3339 strings and logical counters
//! as plain numbers. Both forms order correctly under the row comparator, so
//! a timestamp column can serve as a sort key without a schema annotation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use serde::de::Visitor;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Canonical timestamp carried by history records.
///
/// # Invariants
/// - Values are explicitly provided by callers; the core never reads
///   wall-clock time.
/// - No validation is performed; monotonicity is a caller responsibility.
/// - Serialized form is an RFC 3339 string for instants and a number for
///   logical counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Timestamp {
    /// Unix epoch milliseconds.
    UnixMillis(i64),
    /// Monotonic logical time value.
    Logical(u64),
}

impl Timestamp {
    /// Returns the timestamp as unix milliseconds when available.
    #[must_use]
    pub const fn as_unix_millis(&self) -> Option<i64> {
        match self {
            Self::UnixMillis(value) => Some(*value),
            Self::Logical(_) => None,
        }
    }

    /// Returns the timestamp as logical time when available.
    #[must_use]
    pub const fn as_logical(&self) -> Option<u64> {
        match self {
            Self::UnixMillis(_) => None,
            Self::Logical(value) => Some(*value),
        }
    }

    /// Parses an RFC 3339 date-time string into a unix-millisecond timestamp.
    ///
    /// Returns `None` when the value is not a valid RFC 3339 date-time or the
    /// instant does not fit in signed 64-bit milliseconds.
    #[must_use]
    pub fn parse_rfc3339(value: &str) -> Option<Self> {
        let parsed = OffsetDateTime::parse(value, &Rfc3339).ok()?;
        let millis = parsed.unix_timestamp_nanos() / 1_000_000;
        i64::try_from(millis).ok().map(Self::UnixMillis)
    }

    /// Renders a unix-millisecond timestamp as an RFC 3339 string.
    ///
    /// Returns `None` for logical timestamps and for instants `time` cannot
    /// represent.
    #[must_use]
    pub fn to_rfc3339(&self) -> Option<String> {
        let millis = self.as_unix_millis()?;
        let nanos = i128::from(millis).checked_mul(1_000_000)?;
        let instant = OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?;
        instant.format(&Rfc3339).ok()
    }
}

// ============================================================================
// SECTION: Wire Encoding
// ============================================================================

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::UnixMillis(_) => match self.to_rfc3339() {
                Some(text) => serializer.serialize_str(&text),
                None => Err(serde::ser::Error::custom(
                    "unix-millisecond timestamp outside the representable range",
                )),
            },
            Self::Logical(counter) => serializer.serialize_u64(*counter),
        }
    }
}

/// Visitor accepting the two wire shapes of a timestamp column.
struct TimestampVisitor;

impl Visitor<'_> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an RFC 3339 date-time string or a logical counter")
    }

    fn visit_str<E: DeError>(self, value: &str) -> Result<Self::Value, E> {
        Timestamp::parse_rfc3339(value)
            .ok_or_else(|| E::custom("timestamp string is not a valid RFC 3339 date-time"))
    }

    fn visit_u64<E: DeError>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Timestamp::Logical(value))
    }

    fn visit_i64<E: DeError>(self, value: i64) -> Result<Self::Value, E> {
        u64::try_from(value)
            .map(Timestamp::Logical)
            .map_err(|_| E::custom("logical timestamp counter must be non-negative"))
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

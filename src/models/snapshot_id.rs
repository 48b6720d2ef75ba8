//! Snapshot identifiers
//!
//! A snapshot is named after the moment it was taken, as an ISO-8601 date or
//! date-time string (`2015-11-21`, `2017-02-07T11:14:47.630489`). Every
//! identifier starts with the fixed-width `YYYY-MM-DD` prefix, so lexical
//! order equals chronological order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;

use crate::error::BtrarchError;

/// Length of the `YYYY-MM-DD` prefix every identifier starts with
const DATE_PREFIX_LEN: usize = 10;

/// Name of a snapshot directory, ordered lexically
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SnapshotId(String);

impl SnapshotId {
    /// Parse an identifier, accepting only names with a `YYYY-MM-DD` prefix
    pub fn parse(s: &str) -> Option<Self> {
        if has_date_prefix(s) {
            Some(Self(s.to_string()))
        } else {
            None
        }
    }

    /// Identifier for a snapshot taken at the given local time
    ///
    /// Uses microsecond precision, e.g. `2017-02-07T19:24:14.231990`.
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self(at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string())
    }

    /// Identifier for the current local time
    pub fn now() -> Self {
        Self::from_datetime(chrono::Local::now().naive_local())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Check for the `[0-9]{4}-[0-9]{2}-[0-9]{2}` prefix
fn has_date_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < DATE_PREFIX_LEN {
        return false;
    }

    bytes[..DATE_PREFIX_LEN]
        .iter()
        .enumerate()
        .all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SnapshotId {
    type Err = BtrarchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            BtrarchError::Validation(format!("not a snapshot identifier: {}", s))
        })
    }
}

impl TryFrom<String> for SnapshotId {
    type Error = BtrarchError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if has_date_prefix(&s) {
            Ok(Self(s))
        } else {
            Err(BtrarchError::Validation(format!(
                "not a snapshot identifier: {}",
                s
            )))
        }
    }
}

impl From<SnapshotId> for String {
    fn from(id: SnapshotId) -> Self {
        id.0
    }
}

impl AsRef<str> for SnapshotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

//! Topic, partition and offset identifiers.
//!
//! These are the addressing units of a partitioned log: a topic names the
//! log, a partition selects one ordered sub-log, and an offset is a position
//! inside that sub-log. Negative offsets address from the tail (-1 is the
//! last record), mirroring the broker's own convention.

use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::service::{AppError, AppResult};

/// Validated topic name. Non-empty, restricted to `[a-zA-Z0-9._-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub fn parse(value: &str) -> AppResult<Topic> {
        if value.is_empty() {
            return Err(AppError::InvalidParameter("topic must not be empty".into()));
        }
        let valid = value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
        if !valid {
            return Err(AppError::InvalidParameter(format!(
                "topic contains invalid characters: {}",
                value
            )));
        }
        Ok(Topic(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Topic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partition id, always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Partition(i32);

impl Partition {
    pub fn new(value: i32) -> Partition {
        Partition(value)
    }

    pub fn parse(value: &str) -> AppResult<Partition> {
        let parsed: i32 = value
            .parse()
            .map_err(|_| AppError::InvalidParameter(format!("invalid partition: {}", value)))?;
        if parsed < 0 {
            return Err(AppError::InvalidParameter(format!(
                "partition must not be negative: {}",
                parsed
            )));
        }
        Ok(Partition(parsed))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position within a partition. Non-negative values are absolute; negative
/// values are tail-relative and resolved against a high-water-mark snapshot
/// before subscribing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Offset(i64);

impl Offset {
    pub fn new(value: i64) -> Offset {
        Offset(value)
    }

    pub fn parse(value: &str) -> AppResult<Offset> {
        let parsed: i64 = value
            .parse()
            .map_err(|_| AppError::InvalidParameter(format!("invalid offset: {}", value)))?;
        Ok(Offset(parsed))
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_tail_relative(&self) -> bool {
        self.0 < 0
    }

    /// One past this offset.
    pub fn next(&self) -> Offset {
        Offset(self.0 + 1)
    }
}

impl Display for Offset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

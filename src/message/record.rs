//! Raw consumed messages and the decoded records served to HTTP callers.

use bytes::Bytes;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::{Offset, Partition, Topic};

/// A message as delivered by the message source, before filtering and
/// decoding. Key and value are raw bytes; either may be empty.
#[derive(Debug, Clone)]
pub struct SourceMessage {
    pub topic: Topic,
    pub partition: Partition,
    pub offset: Offset,
    pub key: Bytes,
    pub value: Bytes,
    pub headers: Vec<(String, String)>,
}

/// Message headers as an ordered string map. Serialized as a JSON object
/// preserving delivery order; keys are case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header(Vec<(String, String)>);

impl Header {
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Header {
        Header(pairs)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl Serialize for Header {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One decoded record. Immutable once constructed; the value is either the
/// decoded JSON payload or a bounded diagnostic object for payloads that
/// failed to decode.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub key: String,
    pub value: serde_json::Value,
    pub offset: Offset,
    pub partition: Partition,
    pub topic: Topic,
    pub header: Header,
}

/// The response page for one bounded read.
///
/// `next_offset` is one past the last returned record, or the originally
/// requested offset when no records came back, so a caller can resume from
/// where this page ended.
#[derive(Debug, Serialize)]
pub struct Page {
    pub records: Vec<Record>,
    #[serde(rename = "nextOffset", skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<Offset>,
}

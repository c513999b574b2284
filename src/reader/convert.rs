use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::debug;

use crate::message::{Header, Record, SourceMessage};

/// Decodes raw message payloads into [`Record`]s. Never fails: a payload
/// that is not valid JSON becomes a bounded diagnostic value instead of an
/// error, so one malformed message cannot abort a whole read.
#[derive(Debug, Clone)]
pub struct Converter {
    preview_limit: i64,
}

impl Converter {
    /// `preview_limit` caps the number of payload bytes echoed back in
    /// decode-failure diagnostics; -1 previews the entire payload.
    pub fn new(preview_limit: i64) -> Converter {
        Converter { preview_limit }
    }

    pub fn convert(&self, msg: &SourceMessage) -> Record {
        let value = if msg.value.is_empty() {
            Value::Null
        } else {
            match serde_json::from_slice(&msg.value) {
                Ok(value) => value,
                Err(err) => {
                    debug!(offset = %msg.offset, %err, "decode value as JSON failed");
                    self.diagnostic(&msg.value, &err)
                }
            }
        };
        Record {
            key: String::from_utf8_lossy(&msg.key).into_owned(),
            value,
            offset: msg.offset,
            partition: msg.partition,
            topic: msg.topic.clone(),
            header: Header::from_pairs(msg.headers.clone()),
        }
    }

    fn diagnostic(&self, value: &[u8], err: &serde_json::Error) -> Value {
        let preview_len = if self.preview_limit < 0 {
            value.len()
        } else {
            (self.preview_limit as usize).min(value.len())
        };
        let preview = &value[..preview_len];
        json!({
            "error": format!("decode value as JSON failed: {err}"),
            "valueLength": value.len(),
            "previewBase64": STANDARD.encode(preview),
            "previewHex": hex::encode(preview),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Offset, Partition, Topic};
    use bytes::Bytes;

    fn message(value: &[u8]) -> SourceMessage {
        SourceMessage {
            topic: Topic::parse("orders").unwrap(),
            partition: Partition::new(0),
            offset: Offset::new(5),
            key: Bytes::from_static(b"k"),
            value: Bytes::copy_from_slice(value),
            headers: vec![("trace".to_string(), "abc".to_string())],
        }
    }

    #[test]
    fn test_valid_json_round_trips() {
        let payload = br#"{"a":[1,2.5,"x"],"b":{"c":null},"d":true}"#;
        let record = Converter::new(100).convert(&message(payload));
        let reencoded = serde_json::to_vec(&record.value).unwrap();
        let original: Value = serde_json::from_slice(payload).unwrap();
        let round_tripped: Value = serde_json::from_slice(&reencoded).unwrap();
        assert_eq!(original, round_tripped);
    }

    #[test]
    fn test_scalar_json_payloads() {
        for payload in [&b"42"[..], b"\"hi\"", b"true", b"null", b"[1,2]"] {
            let record = Converter::new(100).convert(&message(payload));
            let expected: Value = serde_json::from_slice(payload).unwrap();
            assert_eq!(record.value, expected);
        }
    }

    #[test]
    fn test_empty_payload_becomes_null() {
        let record = Converter::new(100).convert(&message(b""));
        assert_eq!(record.value, Value::Null);
    }

    #[test]
    fn test_invalid_json_banana_diagnostic() {
        let record = Converter::new(100).convert(&message(b"banana"));
        let diagnostic = record.value.as_object().unwrap();
        assert_eq!(diagnostic["valueLength"], json!(6));
        assert_eq!(diagnostic["previewBase64"], json!("YmFuYW5h"));
        assert_eq!(diagnostic["previewHex"], json!("62616e616e61"));
        assert!(diagnostic["error"]
            .as_str()
            .unwrap()
            .starts_with("decode value as JSON failed"));
    }

    #[test]
    fn test_preview_is_bounded() {
        let payload = vec![b'x'; 500];
        let record = Converter::new(100).convert(&message(&payload));
        let diagnostic = record.value.as_object().unwrap();
        assert_eq!(diagnostic["valueLength"], json!(500));
        assert_eq!(diagnostic["previewHex"].as_str().unwrap().len(), 2 * 100);
    }

    #[test]
    fn test_preview_shorter_payload_uses_full_length() {
        let record = Converter::new(100).convert(&message(b"nope"));
        let diagnostic = record.value.as_object().unwrap();
        assert_eq!(diagnostic["previewHex"].as_str().unwrap().len(), 2 * 4);
    }

    #[test]
    fn test_negative_preview_limit_is_unlimited() {
        let payload = vec![b'x'; 500];
        let record = Converter::new(-1).convert(&message(&payload));
        let diagnostic = record.value.as_object().unwrap();
        assert_eq!(diagnostic["previewHex"].as_str().unwrap().len(), 2 * 500);
    }

    #[test]
    fn test_headers_and_key_carried_over() {
        let record = Converter::new(100).convert(&message(b"{}"));
        assert_eq!(record.key, "k");
        assert_eq!(record.header.get("trace"), Some("abc"));
        assert_eq!(record.offset, Offset::new(5));
        assert_eq!(record.partition, Partition::new(0));
    }
}

//! The `GET /read` request handler.
//!
//! Parameter policy follows the endpoint contract exactly: `topic`,
//! `offset` and `partition` are required and validated, an unparseable
//! `limit` silently falls back to the configured default, and `filter` is
//! capped at 1024 bytes. The whole read runs under a fixed 15 second
//! deadline, with a single automatic retry from the oldest retained offset
//! when the requested offset has fallen out of the partition's retention
//! window.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::message::{Offset, Page, Partition, Record, Topic};
use crate::service::{AppError, AppResult};
use crate::source::MessageSource;

use super::AppState;

const READ_DEADLINE: Duration = Duration::from_secs(15);
const MAX_FILTER_BYTES: usize = 1024;

#[derive(Debug, Default, Deserialize)]
pub struct ReadParams {
    pub topic: Option<String>,
    pub offset: Option<String>,
    pub partition: Option<String>,
    pub limit: Option<String>,
    pub filter: Option<String>,
}

#[derive(Debug)]
pub struct ReadRequest {
    pub topic: Topic,
    pub partition: Partition,
    pub offset: Offset,
    pub limit: u64,
    pub filter: Bytes,
}

fn parse_read_params(params: ReadParams, default_limit: u64) -> AppResult<ReadRequest> {
    let topic = Topic::parse(params.topic.as_deref().unwrap_or(""))?;
    let offset = Offset::parse(params.offset.as_deref().ok_or_else(|| {
        AppError::InvalidParameter("parameter offset missing".into())
    })?)?;
    let partition = Partition::parse(params.partition.as_deref().ok_or_else(|| {
        AppError::InvalidParameter("parameter partition missing".into())
    })?)?;
    // a missing or unparseable limit is not an error
    let limit = params
        .limit
        .as_deref()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default_limit);
    let filter = params.filter.unwrap_or_default();
    if filter.len() > MAX_FILTER_BYTES {
        return Err(AppError::InvalidParameter(format!(
            "filter parameter exceeds maximum length of {} bytes",
            MAX_FILTER_BYTES
        )));
    }
    Ok(ReadRequest {
        topic,
        partition,
        offset,
        limit,
        filter: Bytes::from(filter),
    })
}

pub async fn handle_read<S: MessageSource + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<ReadParams>,
) -> Result<Json<Page>, AppError> {
    let request = parse_read_params(params, state.read.default_limit)?;
    info!(
        topic = %request.topic,
        partition = %request.partition,
        offset = %request.offset,
        limit = request.limit,
        "read started"
    );
    let page = timeout(READ_DEADLINE, read_page(&state, &request))
        .await
        .map_err(|_| AppError::Timeout)??;
    info!(
        topic = %request.topic,
        partition = %request.partition,
        offset = %request.offset,
        count = page.records.len(),
        "read completed"
    );
    Ok(Json(page))
}

/// Runs one bounded read with the single out-of-range retry and builds the
/// page. `next_offset` is one past the last returned record, falling back
/// to the originally requested offset when nothing came back.
pub async fn read_page<S: MessageSource>(
    state: &AppState<S>,
    request: &ReadRequest,
) -> AppResult<Page> {
    let records = match run_read(state, request, request.offset).await {
        Err(err) if err.is_offset_out_of_range() => {
            debug!(error = %err, "offset out of range, falling back to oldest");
            let oldest = state
                .source
                .oldest_offset(&request.topic, request.partition)
                .await
                .map_err(AppError::Source)?;
            run_read(state, request, oldest).await?
        }
        other => other?,
    };
    let next_offset = records
        .last()
        .map(|record| record.offset.next())
        .unwrap_or(request.offset);
    Ok(Page {
        records,
        next_offset: Some(next_offset),
    })
}

async fn run_read<S: MessageSource>(
    state: &AppState<S>,
    request: &ReadRequest,
    start: Offset,
) -> AppResult<Vec<Record>> {
    state
        .reader
        .read(
            &request.topic,
            request.partition,
            start,
            request.limit,
            request.filter.clone(),
            &state.shutdown,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(
        topic: Option<&str>,
        offset: Option<&str>,
        partition: Option<&str>,
    ) -> ReadParams {
        ReadParams {
            topic: topic.map(String::from),
            offset: offset.map(String::from),
            partition: partition.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_valid_params() {
        let request = parse_read_params(
            ReadParams {
                limit: Some("5".to_string()),
                filter: Some("banana".to_string()),
                ..params(Some("orders"), Some("-1"), Some("2"))
            },
            100,
        )
        .unwrap();
        assert_eq!(request.topic.as_str(), "orders");
        assert_eq!(request.offset, Offset::new(-1));
        assert_eq!(request.partition, Partition::new(2));
        assert_eq!(request.limit, 5);
        assert_eq!(&request.filter[..], b"banana");
    }

    #[test]
    fn test_missing_required_params_rejected() {
        assert!(parse_read_params(params(None, Some("0"), Some("0")), 100).is_err());
        assert!(parse_read_params(params(Some("orders"), None, Some("0")), 100).is_err());
        assert!(parse_read_params(params(Some("orders"), Some("0"), None), 100).is_err());
    }

    #[test]
    fn test_invalid_limit_silently_defaults() {
        for limit in [None, Some("abc"), Some("-5"), Some("1.5")] {
            let request = parse_read_params(
                ReadParams {
                    limit: limit.map(String::from),
                    ..params(Some("orders"), Some("0"), Some("0"))
                },
                100,
            )
            .unwrap();
            assert_eq!(request.limit, 100, "limit {limit:?} should default");
        }
    }

    #[test]
    fn test_oversized_filter_rejected() {
        let request = parse_read_params(
            ReadParams {
                filter: Some("x".repeat(1024)),
                ..params(Some("orders"), Some("0"), Some("0"))
            },
            100,
        );
        assert!(request.is_ok());

        let request = parse_read_params(
            ReadParams {
                filter: Some("x".repeat(1025)),
                ..params(Some("orders"), Some("0"), Some("0"))
            },
            100,
        );
        assert!(request.is_err());
    }

    #[test]
    fn test_negative_partition_rejected() {
        assert!(parse_read_params(params(Some("orders"), Some("0"), Some("-1")), 100).is_err());
    }
}

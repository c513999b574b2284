//! rdkafka-backed [`MessageSource`].
//!
//! The subscription never joins a consumer group: each subscribe call
//! creates a throwaway stream consumer, manually assigns the one requested
//! partition at the resolved start offset and reads forward. The group id
//! is only there because librdkafka insists on having one.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer, StreamConsumer};
use rdkafka::error::KafkaError;
use rdkafka::message::{BorrowedMessage, Headers, Message};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::{Offset as KafkaOffset, TopicPartitionList};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::message::{Offset, Partition, SourceMessage, Topic};
use crate::reader::ReadHandler;
use crate::service::KafkaConfig;

use super::{MessageSource, SourceError};

pub struct KafkaSource {
    brokers: String,
    watermark_timeout: Duration,
}

impl KafkaSource {
    pub fn new(config: &KafkaConfig) -> KafkaSource {
        KafkaSource {
            brokers: config.brokers.clone(),
            watermark_timeout: Duration::from_millis(config.watermark_timeout_ms),
        }
    }

    fn client_config(&self) -> ClientConfig {
        // unique group id per consumer, no uuid needed
        let group_id = format!(
            "topic-reader-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_micros()
        );
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("enable.partition.eof", "false")
            // surface out-of-range assignments as errors instead of
            // silently resetting, so the retry policy stays in our hands
            .set("auto.offset.reset", "error");
        config
    }

    async fn fetch_watermarks(
        &self,
        topic: &Topic,
        partition: Partition,
    ) -> Result<(i64, i64), SourceError> {
        let consumer: BaseConsumer = self.client_config().create()?;
        let topic = topic.clone();
        let timeout = self.watermark_timeout;
        // fetch_watermarks is a blocking librdkafka call
        tokio::task::spawn_blocking(move || {
            consumer.fetch_watermarks(topic.as_str(), partition.value(), timeout)
        })
        .await
        .map_err(|err| SourceError::Broker(format!("watermark task failed: {err}")))?
        .map_err(SourceError::Kafka)
    }

    fn to_source_message(topic: &Topic, msg: &BorrowedMessage<'_>) -> SourceMessage {
        let headers = msg
            .headers()
            .map(|headers| {
                (0..headers.count())
                    .map(|i| {
                        let header = headers.get(i);
                        let value = header
                            .value
                            .map(|v| String::from_utf8_lossy(v).into_owned())
                            .unwrap_or_default();
                        (header.key.to_string(), value)
                    })
                    .collect()
            })
            .unwrap_or_default();
        SourceMessage {
            topic: topic.clone(),
            partition: Partition::new(msg.partition()),
            offset: Offset::new(msg.offset()),
            key: msg
                .key()
                .map(Bytes::copy_from_slice)
                .unwrap_or_else(Bytes::new),
            value: msg
                .payload()
                .map(Bytes::copy_from_slice)
                .unwrap_or_else(Bytes::new),
            headers,
        }
    }

    fn map_consume_error(
        topic: &Topic,
        partition: Partition,
        start: Offset,
        err: KafkaError,
    ) -> SourceError {
        match err {
            // with reset policy "error", librdkafka reports an
            // out-of-range fetch as an AutoOffsetReset consume event
            // rather than a broker-side OffsetOutOfRange
            KafkaError::MessageConsumption(RDKafkaErrorCode::OffsetOutOfRange)
            | KafkaError::MessageConsumption(RDKafkaErrorCode::AutoOffsetReset) => {
                SourceError::OffsetOutOfRange {
                    topic: topic.clone(),
                    partition,
                    offset: start,
                }
            }
            other => SourceError::Kafka(other),
        }
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn high_water_mark(
        &self,
        topic: &Topic,
        partition: Partition,
    ) -> Result<Offset, SourceError> {
        let (_, high) = self.fetch_watermarks(topic, partition).await?;
        trace!(%topic, %partition, high, "fetched high water mark");
        Ok(Offset::new(high))
    }

    async fn oldest_offset(
        &self,
        topic: &Topic,
        partition: Partition,
    ) -> Result<Offset, SourceError> {
        let (low, _) = self.fetch_watermarks(topic, partition).await?;
        trace!(%topic, %partition, low, "fetched oldest offset");
        Ok(Offset::new(low))
    }

    async fn subscribe(
        &self,
        topic: &Topic,
        partition: Partition,
        start: Offset,
        handlers: &mut [ReadHandler],
        cancel: CancellationToken,
    ) -> Result<(), SourceError> {
        // a tail-relative start that resolved below zero can never be
        // assigned; report it the same way the broker would
        if start.value() < 0 {
            return Err(SourceError::OffsetOutOfRange {
                topic: topic.clone(),
                partition,
                offset: start,
            });
        }

        let consumer: StreamConsumer = self.client_config().create()?;
        let mut assignment = TopicPartitionList::new();
        assignment.add_partition_offset(
            topic.as_str(),
            partition.value(),
            KafkaOffset::Offset(start.value()),
        )?;
        consumer.assign(&assignment)?;
        debug!(%topic, %partition, %start, "subscription assigned");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(%topic, %partition, "subscription cancelled");
                    return Err(SourceError::Cancelled);
                }
                next = consumer.recv() => {
                    let borrowed = next
                        .map_err(|err| Self::map_consume_error(topic, partition, start, err))?;
                    let msg = Self::to_source_message(topic, &borrowed);
                    for handler in handlers.iter_mut() {
                        handler.handle(&msg).await?;
                    }
                }
            }
        }
    }
}

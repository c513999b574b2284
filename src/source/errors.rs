use crate::message::{Offset, Partition, Topic};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The requested start offset is no longer (or not yet) available in
    /// the partition. Recoverable: the request handler retries once from
    /// the oldest retained offset.
    #[error("offset {offset} out of range for {topic}-{partition}")]
    OffsetOutOfRange {
        topic: Topic,
        partition: Partition,
        offset: Offset,
    },

    /// Clean-stop marker. Raised when the subscription is torn down via the
    /// cancellation token; never surfaced to HTTP callers directly.
    #[error("subscription cancelled")]
    Cancelled,

    #[error("kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),

    #[error("broker error: {0}")]
    Broker(String),
}

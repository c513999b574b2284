//! The message source boundary.
//!
//! Everything the reader needs from the broker client is behind
//! [`MessageSource`]: a tail snapshot, the oldest retained offset, and a
//! push subscription that invokes a handler chain per message until a
//! handler stops it or the cancellation token fires. Tests substitute
//! in-memory sources; production wires in [`KafkaSource`].

pub use errors::SourceError;
pub use kafka::KafkaSource;

mod errors;
mod kafka;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::message::{Offset, Partition, Topic};
use crate::reader::ReadHandler;

#[async_trait]
pub trait MessageSource: Send + Sync {
    /// One past the newest record currently in the partition. A snapshot;
    /// the reader takes it exactly once per read.
    async fn high_water_mark(
        &self,
        topic: &Topic,
        partition: Partition,
    ) -> Result<Offset, SourceError>;

    /// The oldest offset still retained in the partition.
    async fn oldest_offset(
        &self,
        topic: &Topic,
        partition: Partition,
    ) -> Result<Offset, SourceError>;

    /// Deliver messages from `start` in offset order, invoking every
    /// handler in order for each message, until a handler returns an error
    /// ([`SourceError::Cancelled`] stops cleanly) or `cancel` fires.
    async fn subscribe(
        &self,
        topic: &Topic,
        partition: Partition,
        start: Offset,
        handlers: &mut [ReadHandler],
        cancel: CancellationToken,
    ) -> Result<(), SourceError>;
}

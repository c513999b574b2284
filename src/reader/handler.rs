//! The per-message handler chain of a bounded read.
//!
//! A subscription invokes every handler in order for each consumed
//! message. The chain is a closed set of two variants: the [`Collector`]
//! filters, converts and emits records until the limit is reached, and the
//! [`TailWatcher`] observes raw consumed offsets to detect when the
//! consumer has caught up with the high-water-mark snapshot. Each fires
//! the shared [`Trigger`] for its own termination condition.

use std::collections::HashMap;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::message::{Offset, Partition, Record, SourceMessage};
use crate::source::SourceError;

use super::{matches_filter, Converter, Trigger};

pub enum ReadHandler {
    Collector(Collector),
    TailWatcher(TailWatcher),
}

impl ReadHandler {
    /// `Ok(())` continues the subscription, `Err(SourceError::Cancelled)`
    /// stops it cleanly, any other error aborts it.
    pub async fn handle(&mut self, msg: &SourceMessage) -> Result<(), SourceError> {
        match self {
            ReadHandler::Collector(collector) => collector.handle(msg).await,
            ReadHandler::TailWatcher(watcher) => watcher.handle(msg).await,
        }
    }
}

/// Filters, converts and emits records on the bounded channel, counting
/// emitted records against the limit.
pub struct Collector {
    filter: Bytes,
    converter: Converter,
    tx: mpsc::Sender<Record>,
    limit: u64,
    collected: u64,
    trigger: Trigger,
    cancel: CancellationToken,
}

impl Collector {
    pub fn new(
        filter: Bytes,
        converter: Converter,
        tx: mpsc::Sender<Record>,
        limit: u64,
        trigger: Trigger,
        cancel: CancellationToken,
    ) -> Collector {
        Collector {
            filter,
            converter,
            tx,
            limit,
            collected: 0,
            trigger,
            cancel,
        }
    }

    async fn handle(&mut self, msg: &SourceMessage) -> Result<(), SourceError> {
        // filter rejections never advance the counter
        if !matches_filter(&msg.value, &self.filter) {
            return Ok(());
        }

        let record = self.converter.convert(msg);
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => {
                return Err(SourceError::Cancelled);
            }
            sent = self.tx.send(record) => {
                if sent.is_err() {
                    // collector side is gone, nothing left to emit to
                    return Err(SourceError::Cancelled);
                }
            }
        }

        self.collected += 1;
        if self.collected == self.limit {
            debug!(collected = self.collected, "limit reached, firing trigger");
            self.trigger.fire();
            // hold the subscription here until the watcher tears it down,
            // so no message past the limit gets processed
            self.cancel.cancelled().await;
            return Err(SourceError::Cancelled);
        }
        Ok(())
    }
}

/// Fires the trigger once the raw consumed offset reaches the high-water
/// mark snapshot. Operates on every consumed message regardless of
/// filtering: tail detection is about stream progress, not content.
pub struct TailWatcher {
    targets: HashMap<Partition, Offset>,
    trigger: Trigger,
}

impl TailWatcher {
    /// `targets` maps each partition to its last live offset
    /// (high water mark - 1).
    pub fn new(targets: HashMap<Partition, Offset>, trigger: Trigger) -> TailWatcher {
        TailWatcher { targets, trigger }
    }

    async fn handle(&mut self, msg: &SourceMessage) -> Result<(), SourceError> {
        if let Some(target) = self.targets.get(&msg.partition) {
            if msg.offset >= *target {
                debug!(
                    partition = %msg.partition,
                    offset = %msg.offset,
                    target = %target,
                    "tail reached, firing trigger"
                );
                self.trigger.fire();
            }
        }
        Ok(())
    }
}

//! Bounded Partition Reader
//!
//! Converts the unbounded, push-based partition stream into one finite,
//! terminating pull. A read snapshots the partition's high water mark,
//! resolves the (possibly tail-relative) start offset, subscribes a
//! consumer with a two-handler chain and races two independent termination
//! conditions against each other through a shared one-shot [`Trigger`]:
//!
//! - the [`Collector`] fires once `limit` filtered records were emitted,
//! - the [`TailWatcher`] fires once the consumer has caught up with the
//!   snapshot, which guarantees termination when the partition holds fewer
//!   live records than `limit`.
//!
//! A watcher task turns the first trigger fire into cancellation of the
//! subscription; that cancellation is the expected, successful outcome of
//! a read and is folded into `Ok`, unlike cancellation initiated by the
//! caller.

pub use convert::Converter;
pub use filter::matches_filter;
pub use handler::{Collector, ReadHandler, TailWatcher};
pub use trigger::Trigger;

mod convert;
mod filter;
mod handler;
mod trigger;

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::message::{Offset, Partition, Record, Topic};
use crate::service::{AppError, AppResult};
use crate::source::{MessageSource, SourceError};

pub struct BoundedReader<S> {
    source: Arc<S>,
    converter: Converter,
    /// Capacity of the record channel between the subscription and the
    /// drain loop; backpressure point for a slow collector.
    channel_capacity: usize,
}

impl<S: MessageSource> BoundedReader<S> {
    pub fn new(source: Arc<S>, converter: Converter) -> BoundedReader<S> {
        BoundedReader {
            source,
            converter,
            channel_capacity: num_cpus::get(),
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// One bounded read: at most `limit` records matching `filter`,
    /// starting at `start_offset`, never waiting for records beyond the
    /// tail snapshot taken at the start of the call.
    ///
    /// Records come back in consumption order (ascending offset). The
    /// result may be shorter than `limit` when the partition ran out of
    /// matching records; that is a successful read, not an error.
    pub async fn read(
        &self,
        topic: &Topic,
        partition: Partition,
        start_offset: Offset,
        limit: u64,
        filter: Bytes,
        parent: &CancellationToken,
    ) -> AppResult<Vec<Record>> {
        // degenerate case, resolved explicitly instead of through the
        // collector's counter comparison
        if limit == 0 {
            return Ok(Vec::new());
        }

        let high_water_mark = self.source.high_water_mark(topic, partition).await?;
        let start = resolve_start_offset(start_offset, high_water_mark);

        // nothing between the start and the snapshot tail; subscribing
        // would wait on records this read must not wait for
        if start.value() >= 0 && start >= high_water_mark {
            debug!(%topic, %partition, %start, %high_water_mark, "start at or past tail snapshot");
            return Ok(Vec::new());
        }

        let trigger = Trigger::new();
        let cancel = parent.child_token();
        // tears the subscription down if this future is dropped mid-read
        let _teardown = cancel.clone().drop_guard();

        // the watcher is the single teardown path: first trigger fire
        // cancels the subscription
        {
            let trigger = trigger.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = trigger.fired() => cancel.cancel(),
                }
            });
        }

        let (tx, mut rx) = mpsc::channel(self.channel_capacity);

        let produce = {
            let source = Arc::clone(&self.source);
            let topic = topic.clone();
            let trigger = trigger.clone();
            let cancel = cancel.clone();
            let mut handlers = [
                ReadHandler::Collector(Collector::new(
                    filter,
                    self.converter.clone(),
                    tx,
                    limit,
                    trigger.clone(),
                    cancel.clone(),
                )),
                ReadHandler::TailWatcher(TailWatcher::new(
                    HashMap::from([(partition, Offset::new(high_water_mark.value() - 1))]),
                    trigger.clone(),
                )),
            ];
            async move {
                let result = source
                    .subscribe(&topic, partition, start, &mut handlers, cancel)
                    .await;
                // dropping the handlers closes the record channel, which
                // ends the drain loop
                drop(handlers);
                match result {
                    Err(SourceError::Cancelled) if trigger.is_fired() => Ok(()),
                    other => other,
                }
            }
        };

        let collect = async {
            let mut records = Vec::new();
            loop {
                tokio::select! {
                    biased;

                    maybe = rx.recv() => match maybe {
                        Some(record) => records.push(record),
                        None => break,
                    },
                    _ = cancel.cancelled() => {
                        // take what the subscription already emitted
                        while let Ok(record) = rx.try_recv() {
                            records.push(record);
                        }
                        break;
                    }
                }
            }
            Ok::<_, SourceError>(records)
        };

        let (_, records) = tokio::try_join!(produce, collect).map_err(AppError::Source)?;
        debug!(%topic, %partition, %start, count = records.len(), "bounded read finished");
        Ok(records)
    }
}

/// Tail-relative start offsets are resolved against the high-water-mark
/// snapshot: start -10 means "the last 10 records".
fn resolve_start_offset(start: Offset, high_water_mark: Offset) -> Offset {
    if start.is_tail_relative() {
        let resolved = Offset::new(start.value() + high_water_mark.value());
        debug!(%start, %high_water_mark, %resolved, "resolved tail-relative start offset");
        resolved
    } else {
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_start_offset() {
        assert_eq!(
            resolve_start_offset(Offset::new(-1), Offset::new(100)),
            Offset::new(99)
        );
        assert_eq!(
            resolve_start_offset(Offset::new(-10), Offset::new(100)),
            Offset::new(90)
        );
        assert_eq!(
            resolve_start_offset(Offset::new(5), Offset::new(100)),
            Offset::new(5)
        );
        // underflow stays negative; the source reports it as out of range
        assert_eq!(
            resolve_start_offset(Offset::new(-10), Offset::new(5)),
            Offset::new(-5)
        );
    }
}

pub use record::{Header, Page, Record, SourceMessage};
pub use topic_partition::{Offset, Partition, Topic};

mod record;
mod topic_partition;

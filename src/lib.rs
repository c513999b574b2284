mod api;
mod message;
mod reader;
mod service;
mod source;

pub use api::{handle_read, read_page, run_server, AppState, ReadParams, ReadRequest};
pub use message::{Header, Offset, Page, Partition, Record, SourceMessage, Topic};
pub use reader::{BoundedReader, Collector, Converter, ReadHandler, TailWatcher, Trigger};
pub use reader::matches_filter;
pub use service::{
    setup_local_tracing, setup_tracing, AppError, AppResult, KafkaConfig, NetworkConfig,
    ReadConfig, ReaderConfig,
};
pub use source::{KafkaSource, MessageSource, SourceError};

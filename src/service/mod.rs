pub use app_error::{AppError, AppResult};
pub use config::{KafkaConfig, NetworkConfig, ReadConfig, ReaderConfig};
pub use tracing_config::{setup_local_tracing, setup_tracing};

mod app_error;
mod config;
mod tracing_config;

// Copyright 2025 topic-reader authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AppError, AppResult};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub ip: String,
    pub port: u16,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    /// Comma separated list of bootstrap brokers.
    pub brokers: String,
    /// Timeout for watermark/metadata queries against the broker.
    pub watermark_timeout_ms: u64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReadConfig {
    /// Record count used when the limit parameter is missing or unparseable.
    pub default_limit: u64,
    /// Max preview bytes in decode-failure diagnostics; -1 previews the
    /// whole payload.
    pub preview_limit: i64,
}

/// Process-wide configuration. Constructed once in main and passed down by
/// reference so tests can substitute their own values.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    pub network: NetworkConfig,
    pub kafka: KafkaConfig,
    pub read: ReadConfig,
}

impl ReaderConfig {
    pub fn set_up_config<P: AsRef<Path>>(path: P) -> AppResult<ReaderConfig> {
        let path_str = path
            .as_ref()
            .to_str()
            .ok_or(AppError::InvalidValue(format!(
                "config file path: {}",
                path.as_ref().to_string_lossy()
            )))?;
        let config = config::Config::builder()
            .add_source(config::File::with_name(path_str))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_toml() {
        let config = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                [network]
                ip = "0.0.0.0"
                port = 8080

                [kafka]
                brokers = "localhost:9092"
                watermark_timeout_ms = 5000

                [read]
                default_limit = 100
                preview_limit = 100
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: ReaderConfig = config.try_deserialize().unwrap();
        assert_eq!(config.network.port, 8080);
        assert_eq!(config.kafka.brokers, "localhost:9092");
        assert_eq!(config.read.default_limit, 100);
        assert_eq!(config.read.preview_limit, 100);
    }
}

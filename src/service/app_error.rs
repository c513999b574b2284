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

use crate::source::SourceError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// request parameter errors, surfaced before a read starts
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// message source failures, wrapped with context
    #[error("message source error: {0}")]
    Source(#[from] SourceError),

    /// the per-request read deadline fired
    #[error("read deadline exceeded")]
    Timeout,

    /// startup errors
    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("config file error: {0}")]
    ConfigFileError(#[from] config::ConfigError),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    /// True when the underlying cause is the recoverable "requested offset
    /// no longer exists" broker condition, which drives the single
    /// retry-from-oldest in the request handler.
    pub fn is_offset_out_of_range(&self) -> bool {
        matches!(
            self,
            AppError::Source(SourceError::OffsetOutOfRange { .. })
        )
    }
}

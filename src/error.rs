// Copyright 2025 Fernando Borretti
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

use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;

/// A generic error carrying a human-readable message.
#[derive(Debug)]
pub struct ErrorReport {
    message: String,
    engine: Option<EngineError>,
}

impl ErrorReport {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            engine: None,
        }
    }

    /// The domain error this report was raised from, if any.
    pub fn engine_error(&self) -> Option<&EngineError> {
        self.engine.as_ref()
    }
}

impl Display for ErrorReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "error: {}", self.message)
    }
}

impl Error for ErrorReport {}

impl From<std::io::Error> for ErrorReport {
    fn from(value: std::io::Error) -> Self {
        ErrorReport::new(format!("I/O error: {value}"))
    }
}

impl From<rusqlite::Error> for ErrorReport {
    fn from(value: rusqlite::Error) -> Self {
        ErrorReport::new(format!("database error: {value}"))
    }
}

impl From<serde_json::Error> for ErrorReport {
    fn from(value: serde_json::Error) -> Self {
        ErrorReport::new(format!("JSON error: {value}"))
    }
}

impl From<toml::de::Error> for ErrorReport {
    fn from(value: toml::de::Error) -> Self {
        ErrorReport::new(format!("TOML error: {value}"))
    }
}

impl From<EngineError> for ErrorReport {
    fn from(value: EngineError) -> Self {
        Self {
            message: value.to_string(),
            engine: Some(value),
        }
    }
}

pub type Fallible<T> = Result<T, ErrorReport>;

pub fn fail<T>(message: impl Into<String>) -> Fallible<T> {
    Err(ErrorReport::new(message))
}

/// Domain errors raised by the selection engine.
///
/// These are caller-facing conditions, not faults: a transport layer maps
/// them onto its own status codes through [`EngineError::is_not_found`] and
/// [`EngineError::is_client_error`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The policy name did not resolve to a known policy.
    InvalidPolicy(String),
    /// The policy is valid but no card passed its filters.
    NoCandidates,
    /// The session size limit was zero.
    InvalidLimit,
    /// The accuracy threshold was outside `[0, 1]`.
    InvalidThreshold(f64),
}

impl EngineError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NoCandidates)
    }

    pub fn is_client_error(&self) -> bool {
        !self.is_not_found()
    }
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::InvalidPolicy(name) => write!(f, "invalid policy: {name}"),
            EngineError::NoCandidates => {
                write!(f, "no cards found for the specified criteria")
            }
            EngineError::InvalidLimit => write!(f, "session limit must be positive"),
            EngineError::InvalidThreshold(t) => {
                write!(f, "threshold must be between 0 and 1, got {t}")
            }
        }
    }
}

impl Error for EngineError {}

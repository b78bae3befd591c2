// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Error taxonomy for the monitor.
///
/// Workers treat `Storage` and `Rpc` as retryable and everything else as
/// terminal for the offending log or startup step.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("event handler registered for an event missing from the ABI: {0}")]
    IncompatibleAbi(String),

    #[error("log has no topics, cannot match an event")]
    InvalidEvent,

    #[error("wrong argument type for {name}: expected {expected}")]
    WrongArgumentType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("failed to decode {event} log: {reason}")]
    AbiDecode { event: String, reason: String },

    #[error("message decode error: {0}")]
    Decode(#[from] MessageDecodeError),

    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("postgres returned an unexpected result: {0}")]
    InvalidPostgresResult(String),

    #[error("not found")]
    NotFound,
}

/// Typed decode failures for canonical message payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageDecodeError {
    #[error("message payload too short: {0} bytes")]
    TooShort(usize),

    #[error("unexpected message version prefix: {0:#010x}")]
    UnexpectedVersion(u32),

    #[error("legacy message with unsupported data type {0}")]
    UnsupportedDataType(u8),

    #[error("malformed call payload")]
    MalformedCallData,
}

impl MonitorError {
    /// Whether a worker loop should retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MonitorError::Rpc(_) | MonitorError::Storage(_))
    }

    /// Short stable string for metrics labels.
    pub fn error_type(&self) -> &'static str {
        match self {
            MonitorError::Configuration(_) => "configuration",
            MonitorError::IncompatibleAbi(_) => "incompatible_abi",
            MonitorError::InvalidEvent => "invalid_event",
            MonitorError::WrongArgumentType { .. } => "wrong_argument_type",
            MonitorError::AbiDecode { .. } => "abi_decode",
            MonitorError::Decode(_) => "decode",
            MonitorError::Rpc(_) => "rpc",
            MonitorError::Storage(_) => "storage",
            MonitorError::InvalidPostgresResult(_) => "invalid_postgres_result",
            MonitorError::NotFound => "not_found",
        }
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;

/// Clears `NotFound` for paths where a missing row is benign, e.g. validator
/// removal replay or presenter lookups.
pub fn ignore_not_found<T>(res: MonitorResult<T>) -> MonitorResult<Option<T>> {
    match res {
        Ok(v) => Ok(Some(v)),
        Err(MonitorError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

impl From<diesel::result::Error> for MonitorError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => MonitorError::NotFound,
            other => MonitorError::Storage(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(MonitorError::Rpc("boom".into()).is_retryable());
        assert!(MonitorError::Storage("boom".into()).is_retryable());
        assert!(!MonitorError::NotFound.is_retryable());
        assert!(!MonitorError::InvalidEvent.is_retryable());
        assert!(!MonitorError::Decode(MessageDecodeError::UnsupportedDataType(1)).is_retryable());
    }

    #[test]
    fn test_ignore_not_found() {
        let hit: MonitorResult<u32> = Ok(7);
        assert_eq!(ignore_not_found(hit).unwrap(), Some(7));

        let miss: MonitorResult<u32> = Err(MonitorError::NotFound);
        assert_eq!(ignore_not_found(miss).unwrap(), None);

        let err: MonitorResult<u32> = Err(MonitorError::Storage("down".into()));
        assert!(ignore_not_found(err).is_err());
    }

    #[test]
    fn test_error_type_labels_are_stable() {
        assert_eq!(
            MonitorError::Configuration("x".into()).error_type(),
            "configuration"
        );
        assert_eq!(
            MonitorError::IncompatibleAbi("x".into()).error_type(),
            "incompatible_abi"
        );
        assert_eq!(MonitorError::NotFound.error_type(), "not_found");
    }

    #[test]
    fn test_diesel_not_found_maps_to_sentinel() {
        let err: MonitorError = diesel::result::Error::NotFound.into();
        assert!(matches!(err, MonitorError::NotFound));
    }
}

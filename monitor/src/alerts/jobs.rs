// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The closed table of alert kinds with their cadences and gauge label sets.

use std::time::Duration;

use crate::error::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertKind {
    UnknownMessageConfirmation,
    UnknownMessageExecution,
    StuckMessageConfirmation,
    FailedMessageExecution,
    UnknownInformationSignature,
    UnknownInformationExecution,
    StuckInformationRequest,
    FailedInformationRequest,
    DifferentInformationSignatures,
    UnknownErcToNativeMessageConfirmation,
    UnknownErcToNativeMessageExecution,
    StuckErcToNativeMessageConfirmation,
    LastValidatorActivity,
}

pub const ALL_ALERT_KINDS: &[AlertKind] = &[
    AlertKind::UnknownMessageConfirmation,
    AlertKind::UnknownMessageExecution,
    AlertKind::StuckMessageConfirmation,
    AlertKind::FailedMessageExecution,
    AlertKind::UnknownInformationSignature,
    AlertKind::UnknownInformationExecution,
    AlertKind::StuckInformationRequest,
    AlertKind::FailedInformationRequest,
    AlertKind::DifferentInformationSignatures,
    AlertKind::UnknownErcToNativeMessageConfirmation,
    AlertKind::UnknownErcToNativeMessageExecution,
    AlertKind::StuckErcToNativeMessageConfirmation,
    AlertKind::LastValidatorActivity,
];

impl AlertKind {
    /// Any string not in the table is a configuration error.
    pub fn parse(s: &str) -> Result<Self, MonitorError> {
        ALL_ALERT_KINDS
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| MonitorError::Configuration(format!("unknown alert kind {}", s)))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::UnknownMessageConfirmation => "unknown_message_confirmation",
            AlertKind::UnknownMessageExecution => "unknown_message_execution",
            AlertKind::StuckMessageConfirmation => "stuck_message_confirmation",
            AlertKind::FailedMessageExecution => "failed_message_execution",
            AlertKind::UnknownInformationSignature => "unknown_information_signature",
            AlertKind::UnknownInformationExecution => "unknown_information_execution",
            AlertKind::StuckInformationRequest => "stuck_information_request",
            AlertKind::FailedInformationRequest => "failed_information_request",
            AlertKind::DifferentInformationSignatures => "different_information_signatures",
            AlertKind::UnknownErcToNativeMessageConfirmation => {
                "unknown_erc_to_native_message_confirmation"
            }
            AlertKind::UnknownErcToNativeMessageExecution => {
                "unknown_erc_to_native_message_execution"
            }
            AlertKind::StuckErcToNativeMessageConfirmation => {
                "stuck_erc_to_native_message_confirmation"
            }
            AlertKind::LastValidatorActivity => "last_validator_activity",
        }
    }

    pub fn interval(&self) -> Duration {
        match self {
            AlertKind::UnknownMessageConfirmation
            | AlertKind::UnknownMessageExecution
            | AlertKind::UnknownInformationSignature
            | AlertKind::UnknownInformationExecution
            | AlertKind::UnknownErcToNativeMessageConfirmation
            | AlertKind::UnknownErcToNativeMessageExecution => Duration::from_secs(60),
            AlertKind::StuckMessageConfirmation
            | AlertKind::FailedMessageExecution
            | AlertKind::StuckInformationRequest
            | AlertKind::FailedInformationRequest
            | AlertKind::DifferentInformationSignatures
            | AlertKind::StuckErcToNativeMessageConfirmation => Duration::from_secs(300),
            AlertKind::LastValidatorActivity => Duration::from_secs(600),
        }
    }

    pub fn timeout(&self) -> Duration {
        match self {
            AlertKind::UnknownMessageConfirmation
            | AlertKind::UnknownMessageExecution
            | AlertKind::UnknownInformationSignature
            | AlertKind::UnknownInformationExecution
            | AlertKind::DifferentInformationSignatures
            | AlertKind::UnknownErcToNativeMessageConfirmation
            | AlertKind::UnknownErcToNativeMessageExecution => Duration::from_secs(10),
            AlertKind::StuckMessageConfirmation
            | AlertKind::FailedMessageExecution
            | AlertKind::StuckInformationRequest
            | AlertKind::FailedInformationRequest
            | AlertKind::StuckErcToNativeMessageConfirmation
            | AlertKind::LastValidatorActivity => Duration::from_secs(20),
        }
    }

    /// Gauge label names; every result row must provide exactly these fields
    /// plus `_value`.
    pub fn label_names(&self) -> &'static [&'static str] {
        match self {
            AlertKind::UnknownMessageConfirmation
            | AlertKind::UnknownErcToNativeMessageConfirmation => {
                &["chain_id", "block_number", "tx_hash", "signer", "msg_hash"]
            }
            AlertKind::UnknownMessageExecution
            | AlertKind::UnknownErcToNativeMessageExecution => {
                &["chain_id", "block_number", "tx_hash", "message_id"]
            }
            AlertKind::StuckMessageConfirmation => {
                &["chain_id", "block_number", "tx_hash", "msg_hash"]
            }
            AlertKind::FailedMessageExecution => {
                &["chain_id", "block_number", "tx_hash", "sender", "executor"]
            }
            AlertKind::UnknownInformationSignature => {
                &["chain_id", "block_number", "tx_hash", "signer", "message_id"]
            }
            AlertKind::UnknownInformationExecution | AlertKind::StuckInformationRequest => {
                &["chain_id", "block_number", "tx_hash", "message_id"]
            }
            AlertKind::FailedInformationRequest => {
                &["chain_id", "block_number", "tx_hash", "sender", "message_id"]
            }
            AlertKind::DifferentInformationSignatures => {
                &["chain_id", "block_number", "tx_hash", "message_id", "count"]
            }
            AlertKind::StuckErcToNativeMessageConfirmation => {
                &["chain_id", "block_number", "tx_hash", "msg_hash", "sender", "value"]
            }
            AlertKind::LastValidatorActivity => &["chain_id", "address"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for kind in ALL_ALERT_KINDS {
            assert_eq!(AlertKind::parse(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn test_parse_unknown_kind_is_configuration_error() {
        assert!(matches!(
            AlertKind::parse("no_such_alert"),
            Err(MonitorError::Configuration(_))
        ));
    }

    #[test]
    fn test_cadences_match_the_job_table() {
        assert_eq!(
            AlertKind::UnknownMessageConfirmation.interval(),
            Duration::from_secs(60)
        );
        assert_eq!(
            AlertKind::UnknownMessageConfirmation.timeout(),
            Duration::from_secs(10)
        );
        assert_eq!(
            AlertKind::StuckMessageConfirmation.interval(),
            Duration::from_secs(300)
        );
        assert_eq!(
            AlertKind::StuckMessageConfirmation.timeout(),
            Duration::from_secs(20)
        );
        assert_eq!(
            AlertKind::DifferentInformationSignatures.timeout(),
            Duration::from_secs(10)
        );
        assert_eq!(
            AlertKind::LastValidatorActivity.interval(),
            Duration::from_secs(600)
        );
    }

    #[test]
    fn test_label_names_exclude_value() {
        for kind in ALL_ALERT_KINDS {
            assert!(!kind.label_names().contains(&"_value"));
            assert!(!kind.label_names().is_empty());
        }
    }
}

//! F1AP Error Types

use ogs_asn1c::f1ap::cause::{Cause, CauseMisc, CauseProtocol};
use ogs_asn1c::f1ap::pdu::MessageKind;
use ogs_asn1c::f1ap::types::Criticality;
use ogs_asn1c::PerError;
use thiserror::Error;

/// Errors that can occur during F1AP message processing
#[derive(Error, Debug)]
pub enum F1apError {
    /// ASN.1 encoding/decoding error
    #[error("ASN.1 codec error: {0}")]
    Asn1(#[from] PerError),

    /// Missing mandatory IE
    #[error("Missing mandatory IE: {ie_name} (id={ie_id})")]
    MissingMandatoryIe { ie_name: &'static str, ie_id: u16 },

    /// IE present with a criticality other than the one the procedure fixes
    #[error("Criticality mismatch for {ie_name} (id={ie_id}): expected {expected:?}, got {got:?}")]
    CriticalityMismatch {
        ie_name: &'static str,
        ie_id: u16,
        expected: Criticality,
        got: Criticality,
    },

    /// IE identifier not in the recognized set of the procedure
    #[error("Unsupported IE id={ie_id} in {procedure}")]
    UnsupportedIe { procedure: &'static str, ie_id: u16 },

    /// Unexpected message type
    #[error("Unexpected message type: expected {expected}, got {got}")]
    UnexpectedMessageType {
        expected: MessageKind,
        got: MessageKind,
    },

    /// Unexpected procedure code
    #[error("Unexpected procedure code: expected {expected}, got {got}")]
    UnexpectedProcedureCode { expected: u8, got: u8 },

    /// Message-level criticality differs from the procedure's
    #[error("Unexpected criticality for {procedure}: expected {expected:?}, got {got:?}")]
    UnexpectedCriticality {
        procedure: &'static str,
        expected: Criticality,
        got: Criticality,
    },

    /// Invalid IE value
    #[error("Invalid IE value for {ie_name}: {reason}")]
    InvalidIeValue {
        ie_name: &'static str,
        reason: String,
    },

    /// A per-cell extension that may appear once appeared more than once
    #[error("Extension {ie_name} present more than once in one cell item")]
    DuplicateCellExtension { ie_name: &'static str },

    /// Reset of part of the F1 interface
    #[error("Reset of part of F1 interface ({connections} connections) is not supported")]
    UnsupportedResetScope { connections: usize },

    /// F1 Setup Response activating cells with system information
    #[error("F1 Setup Response carries system information for {cells} cell(s)")]
    SystemInformationNotSupported { cells: usize },

    /// Local configuration cannot be expressed on the wire
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The byte encoder rejected the IE tree
    #[error("Encoding failed: {0}")]
    EncodeFailed(String),

    /// Recognized procedure whose handling is not built
    #[error("Procedure not implemented: {procedure} ({kind})")]
    UnimplementedProcedure {
        procedure: &'static str,
        kind: MessageKind,
    },

    /// Response or failure for a transaction that is not in flight
    #[error("Unknown transaction id {0}")]
    UnknownTransactionId(u8),

    /// All 256 transaction ids are in flight
    #[error("No free transaction id")]
    TransactionIdsExhausted,
}

pub type F1apResult<T> = Result<T, F1apError>;

/// Error classification used by the procedure handler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or contract-violating peer message
    StructuralViolation,
    /// Local data that cannot be encoded
    ConfigurationError,
    /// Byte encoder failure on an outbound PDU
    EncodeFailure,
    /// Recognized but unbuilt procedure
    UnimplementedProcedure,
    /// Transaction id allocation or lookup failure
    Correlation,
}

impl F1apError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            F1apError::Asn1(_)
            | F1apError::MissingMandatoryIe { .. }
            | F1apError::CriticalityMismatch { .. }
            | F1apError::UnsupportedIe { .. }
            | F1apError::UnexpectedMessageType { .. }
            | F1apError::UnexpectedProcedureCode { .. }
            | F1apError::UnexpectedCriticality { .. }
            | F1apError::InvalidIeValue { .. }
            | F1apError::DuplicateCellExtension { .. }
            | F1apError::UnsupportedResetScope { .. }
            | F1apError::SystemInformationNotSupported { .. } => ErrorKind::StructuralViolation,
            F1apError::Configuration(_) => ErrorKind::ConfigurationError,
            F1apError::EncodeFailed(_) => ErrorKind::EncodeFailure,
            F1apError::UnimplementedProcedure { .. } => ErrorKind::UnimplementedProcedure,
            F1apError::UnknownTransactionId(_) | F1apError::TransactionIdsExhausted => {
                ErrorKind::Correlation
            }
        }
    }

    /// Cause reported to the peer when this error aborts an inbound procedure
    pub fn protocol_cause(&self) -> Cause {
        let protocol = match self {
            F1apError::Asn1(_) => CauseProtocol::TransferSyntaxError,
            F1apError::MissingMandatoryIe { .. } => {
                CauseProtocol::AbstractSyntaxErrorFalselyConstructedMessage
            }
            F1apError::CriticalityMismatch { .. }
            | F1apError::UnsupportedIe { .. }
            | F1apError::DuplicateCellExtension { .. } => CauseProtocol::AbstractSyntaxErrorReject,
            F1apError::UnexpectedMessageType { .. }
            | F1apError::UnexpectedProcedureCode { .. }
            | F1apError::UnexpectedCriticality { .. }
            | F1apError::UnknownTransactionId(_) => {
                CauseProtocol::MessageNotCompatibleWithReceiverState
            }
            F1apError::InvalidIeValue { .. }
            | F1apError::UnsupportedResetScope { .. }
            | F1apError::SystemInformationNotSupported { .. } => CauseProtocol::SemanticError,
            F1apError::Configuration(_)
            | F1apError::EncodeFailed(_)
            | F1apError::UnimplementedProcedure { .. }
            | F1apError::TransactionIdsExhausted => return Cause::Misc(CauseMisc::Unspecified),
        };
        Cause::Protocol(protocol)
    }

    /// Re-tag a codec error raised while building an outbound PDU
    pub(crate) fn into_encode_failure(self) -> Self {
        match self {
            F1apError::Asn1(e) => F1apError::EncodeFailed(e.to_string()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_classification() {
        let missing = F1apError::MissingMandatoryIe {
            ie_name: "TransactionID",
            ie_id: 78,
        };
        assert_eq!(missing.kind(), ErrorKind::StructuralViolation);
        assert_eq!(
            F1apError::Configuration("nrb".into()).kind(),
            ErrorKind::ConfigurationError
        );
        assert_eq!(
            F1apError::UnimplementedProcedure {
                procedure: "ErrorIndication",
                kind: MessageKind::InitiatingMessage,
            }
            .kind(),
            ErrorKind::UnimplementedProcedure
        );
        assert_eq!(F1apError::TransactionIdsExhausted.kind(), ErrorKind::Correlation);
    }

    #[test]
    fn test_protocol_cause_mapping() {
        let err = F1apError::UnsupportedIe {
            procedure: "F1SetupResponse",
            ie_id: 999,
        };
        assert_eq!(
            err.protocol_cause(),
            Cause::Protocol(CauseProtocol::AbstractSyntaxErrorReject)
        );
        assert_eq!(
            F1apError::UnknownTransactionId(4).protocol_cause(),
            Cause::Protocol(CauseProtocol::MessageNotCompatibleWithReceiverState)
        );
    }

    #[test]
    fn test_encode_failure_retag() {
        let err = F1apError::from(PerError::InvalidLength { length: 20000 }).into_encode_failure();
        assert!(matches!(err, F1apError::EncodeFailed(_)));
        assert_eq!(err.kind(), ErrorKind::EncodeFailure);
    }

    #[test]
    fn test_display() {
        let err = F1apError::MissingMandatoryIe {
            ie_name: "Cause",
            ie_id: 0,
        };
        assert_eq!(err.to_string(), "Missing mandatory IE: Cause (id=0)");
    }
}

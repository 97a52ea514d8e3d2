//! F1AP Procedure Contracts and IE Extraction
//!
//! Each DU-side message has a fixed set of recognized IEs, each with a fixed
//! criticality and presence. Inbound messages are checked against these
//! tables either by targeted [`extract`] or by a full-list walk through
//! [`ProcedureContract::classify`]; outbound IEs take their criticality from
//! the same tables.

use ogs_asn1c::f1ap::ies::{ProtocolIeContainer, ProtocolIeField};
use ogs_asn1c::f1ap::pdu::{Message, MessageKind};
use ogs_asn1c::f1ap::types::Criticality::{Ignore, Reject};
use ogs_asn1c::f1ap::types::{Criticality, Presence, ProcedureCode, ProtocolIeId};

use crate::error::{F1apError, F1apResult};

/// Contract entry for one IE of one message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IeSpec {
    pub id: ProtocolIeId,
    pub name: &'static str,
    pub criticality: Criticality,
    pub presence: Presence,
}

impl IeSpec {
    pub const fn mandatory(id: ProtocolIeId, name: &'static str, criticality: Criticality) -> Self {
        Self {
            id,
            name,
            criticality,
            presence: Presence::Mandatory,
        }
    }

    pub const fn optional(id: ProtocolIeId, name: &'static str, criticality: Criticality) -> Self {
        Self {
            id,
            name,
            criticality,
            presence: Presence::Optional,
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.presence == Presence::Mandatory
    }

    /// Same IE, required to be present
    pub const fn as_mandatory(self) -> Self {
        Self {
            presence: Presence::Mandatory,
            ..self
        }
    }

    pub fn missing(&self) -> F1apError {
        F1apError::MissingMandatoryIe {
            ie_name: self.name,
            ie_id: self.id.0,
        }
    }

    /// Verify a field carrying this IE has the contracted criticality
    pub fn check_criticality(&self, field: &ProtocolIeField) -> F1apResult<()> {
        if field.criticality != self.criticality {
            return Err(F1apError::CriticalityMismatch {
                ie_name: self.name,
                ie_id: self.id.0,
                expected: self.criticality,
                got: field.criticality,
            });
        }
        Ok(())
    }
}

/// Locate an IE by identifier and validate it against `spec`.
///
/// The first field with a matching id wins. A missing optional IE yields
/// `Ok(None)`.
pub fn extract<'a>(
    ies: &'a ProtocolIeContainer,
    spec: &IeSpec,
) -> F1apResult<Option<&'a ProtocolIeField>> {
    match ies.find(spec.id) {
        Some(field) => {
            spec.check_criticality(field)?;
            Ok(Some(field))
        }
        None if spec.is_mandatory() => Err(spec.missing()),
        None => Ok(None),
    }
}

/// [`extract`] for an IE that must be present regardless of its contract
pub fn require<'a>(ies: &'a ProtocolIeContainer, spec: &IeSpec) -> F1apResult<&'a ProtocolIeField> {
    extract(ies, &spec.as_mandatory())?.ok_or_else(|| spec.missing())
}

/// Unwrap a value collected during a full-list walk
pub fn required<T>(value: Option<T>, spec: &IeSpec) -> F1apResult<T> {
    value.ok_or_else(|| spec.missing())
}

/// Message header and IE table of one procedure message
#[derive(Debug, Clone, Copy)]
pub struct ProcedureContract {
    pub name: &'static str,
    pub procedure_code: ProcedureCode,
    pub kind: MessageKind,
    pub criticality: Criticality,
    pub ies: &'static [IeSpec],
}

impl ProcedureContract {
    /// Validate message kind, procedure code and message criticality
    pub fn check_header(&self, kind: MessageKind, msg: &Message) -> F1apResult<()> {
        if kind != self.kind {
            return Err(F1apError::UnexpectedMessageType {
                expected: self.kind,
                got: kind,
            });
        }
        if msg.procedure_code != self.procedure_code {
            return Err(F1apError::UnexpectedProcedureCode {
                expected: self.procedure_code.0,
                got: msg.procedure_code.0,
            });
        }
        if msg.criticality != self.criticality {
            return Err(F1apError::UnexpectedCriticality {
                procedure: self.name,
                expected: self.criticality,
                got: msg.criticality,
            });
        }
        Ok(())
    }

    pub fn spec(&self, id: ProtocolIeId) -> Option<&'static IeSpec> {
        self.ies.iter().find(|spec| spec.id == id)
    }

    /// Full-list dispatch step: an unrecognized id is fatal
    pub fn classify(&self, field: &ProtocolIeField) -> F1apResult<&'static IeSpec> {
        let spec = self.spec(field.id).ok_or(F1apError::UnsupportedIe {
            procedure: self.name,
            ie_id: field.id.0,
        })?;
        spec.check_criticality(field)?;
        Ok(spec)
    }
}

// ============================================================================
// IE contract entries
// ============================================================================

pub mod ie {
    use super::IeSpec;
    use ogs_asn1c::f1ap::types::{Criticality::*, ProtocolIeId as Id};

    pub const TRANSACTION_ID: IeSpec =
        IeSpec::mandatory(Id::TRANSACTION_ID, "TransactionID", Reject);
    pub const CAUSE: IeSpec = IeSpec::mandatory(Id::CAUSE, "Cause", Ignore);
    /// Cause as carried by Error Indication
    pub const CAUSE_OPTIONAL: IeSpec = IeSpec::optional(Id::CAUSE, "Cause", Ignore);
    pub const RESET_TYPE: IeSpec = IeSpec::mandatory(Id::RESET_TYPE, "ResetType", Reject);
    pub const TIME_TO_WAIT: IeSpec = IeSpec::optional(Id::TIME_TO_WAIT, "TimeToWait", Ignore);
    pub const CRITICALITY_DIAGNOSTICS: IeSpec =
        IeSpec::optional(Id::CRITICALITY_DIAGNOSTICS, "CriticalityDiagnostics", Ignore);

    pub const GNB_DU_ID: IeSpec = IeSpec::mandatory(Id::GNB_DU_ID, "gNB-DU-ID", Reject);
    /// gNB-DU-ID as carried by gNB-DU Configuration Update
    pub const GNB_DU_ID_OPTIONAL: IeSpec = IeSpec::optional(Id::GNB_DU_ID, "gNB-DU-ID", Reject);
    pub const GNB_DU_NAME: IeSpec = IeSpec::optional(Id::GNB_DU_NAME, "gNB-DU-Name", Ignore);
    pub const GNB_DU_SERVED_CELLS_LIST: IeSpec =
        IeSpec::optional(Id::GNB_DU_SERVED_CELLS_LIST, "gNB-DU-Served-Cells-List", Reject);
    pub const GNB_DU_RRC_VERSION: IeSpec =
        IeSpec::mandatory(Id::GNB_DU_RRC_VERSION, "GNB-DU-RRC-Version", Reject);

    pub const GNB_CU_NAME: IeSpec = IeSpec::optional(Id::GNB_CU_NAME, "gNB-CU-Name", Ignore);
    pub const CELLS_TO_BE_ACTIVATED_LIST: IeSpec =
        IeSpec::mandatory(Id::CELLS_TO_BE_ACTIVATED_LIST, "Cells-to-be-Activated-List", Reject);
    pub const GNB_CU_RRC_VERSION: IeSpec =
        IeSpec::optional(Id::GNB_CU_RRC_VERSION, "GNB-CU-RRC-Version", Reject);

    pub const SERVED_CELLS_TO_ADD_LIST: IeSpec =
        IeSpec::optional(Id::SERVED_CELLS_TO_ADD_LIST, "Served-Cells-To-Add-List", Reject);
    pub const SERVED_CELLS_TO_MODIFY_LIST: IeSpec =
        IeSpec::optional(Id::SERVED_CELLS_TO_MODIFY_LIST, "Served-Cells-To-Modify-List", Reject);
    pub const SERVED_CELLS_TO_DELETE_LIST: IeSpec =
        IeSpec::optional(Id::SERVED_CELLS_TO_DELETE_LIST, "Served-Cells-To-Delete-List", Reject);
    pub const CELLS_FAILED_TO_BE_ACTIVATED_LIST: IeSpec = IeSpec::optional(
        Id::CELLS_FAILED_TO_BE_ACTIVATED_LIST,
        "Cells-Failed-to-be-Activated-List",
        Reject,
    );

    // List items (ProtocolIE-SingleContainer)
    pub const GNB_DU_SERVED_CELLS_ITEM: IeSpec =
        IeSpec::mandatory(Id::GNB_DU_SERVED_CELLS_ITEM, "GNB-DU-Served-Cells-Item", Reject);
    pub const CELLS_TO_BE_ACTIVATED_ITEM: IeSpec = IeSpec::mandatory(
        Id::CELLS_TO_BE_ACTIVATED_LIST_ITEM,
        "Cells-to-be-Activated-List-Item",
        Reject,
    );
    pub const SERVED_CELLS_TO_ADD_ITEM: IeSpec =
        IeSpec::mandatory(Id::SERVED_CELLS_TO_ADD_ITEM, "Served-Cells-To-Add-Item", Reject);
    pub const SERVED_CELLS_TO_MODIFY_ITEM: IeSpec =
        IeSpec::mandatory(Id::SERVED_CELLS_TO_MODIFY_ITEM, "Served-Cells-To-Modify-Item", Reject);
    pub const SERVED_CELLS_TO_DELETE_ITEM: IeSpec =
        IeSpec::mandatory(Id::SERVED_CELLS_TO_DELETE_ITEM, "Served-Cells-To-Delete-Item", Reject);
    pub const CELLS_FAILED_TO_BE_ACTIVATED_ITEM: IeSpec = IeSpec::mandatory(
        Id::CELLS_FAILED_TO_BE_ACTIVATED_LIST_ITEM,
        "Cells-Failed-to-be-Activated-List-Item",
        Reject,
    );
    pub const UE_ASSOCIATED_LOGICAL_F1_CONNECTION_ITEM: IeSpec = IeSpec::mandatory(
        Id::UE_ASSOCIATED_LOGICAL_F1_CONNECTION_ITEM,
        "UE-associatedLogicalF1-ConnectionItem",
        Reject,
    );

    // Extensions
    pub const GNB_CU_SYSTEM_INFORMATION: IeSpec =
        IeSpec::optional(Id::GNB_CU_SYSTEM_INFORMATION, "gNB-CUSystemInformation", Reject);
    pub const TAI_SLICE_SUPPORT_LIST: IeSpec =
        IeSpec::optional(Id::TAI_SLICE_SUPPORT_LIST, "TAISliceSupportList", Ignore);
    pub const LATEST_RRC_VERSION_ENHANCED: IeSpec =
        IeSpec::optional(Id::LATEST_RRC_VERSION_ENHANCED, "latest-RRC-Version-Enhanced", Ignore);
}

// ============================================================================
// Procedure message contracts
// ============================================================================

pub const RESET: ProcedureContract = ProcedureContract {
    name: "Reset",
    procedure_code: ProcedureCode::RESET,
    kind: MessageKind::InitiatingMessage,
    criticality: Reject,
    ies: &[ie::TRANSACTION_ID, ie::CAUSE, ie::RESET_TYPE],
};

pub const RESET_ACKNOWLEDGE: ProcedureContract = ProcedureContract {
    name: "ResetAcknowledge",
    procedure_code: ProcedureCode::RESET,
    kind: MessageKind::SuccessfulOutcome,
    criticality: Reject,
    ies: &[ie::TRANSACTION_ID, ie::CRITICALITY_DIAGNOSTICS],
};

pub const F1_SETUP_REQUEST: ProcedureContract = ProcedureContract {
    name: "F1SetupRequest",
    procedure_code: ProcedureCode::F1_SETUP,
    kind: MessageKind::InitiatingMessage,
    criticality: Reject,
    ies: &[
        ie::TRANSACTION_ID,
        ie::GNB_DU_ID,
        ie::GNB_DU_NAME,
        ie::GNB_DU_SERVED_CELLS_LIST,
        ie::GNB_DU_RRC_VERSION,
    ],
};

pub const F1_SETUP_RESPONSE: ProcedureContract = ProcedureContract {
    name: "F1SetupResponse",
    procedure_code: ProcedureCode::F1_SETUP,
    kind: MessageKind::SuccessfulOutcome,
    criticality: Reject,
    ies: &[
        ie::TRANSACTION_ID,
        ie::GNB_CU_NAME,
        ie::CELLS_TO_BE_ACTIVATED_LIST,
        ie::GNB_CU_RRC_VERSION,
    ],
};

pub const F1_SETUP_FAILURE: ProcedureContract = ProcedureContract {
    name: "F1SetupFailure",
    procedure_code: ProcedureCode::F1_SETUP,
    kind: MessageKind::UnsuccessfulOutcome,
    criticality: Reject,
    ies: &[
        ie::TRANSACTION_ID,
        ie::CAUSE,
        ie::TIME_TO_WAIT,
        ie::CRITICALITY_DIAGNOSTICS,
    ],
};

pub const GNB_DU_CONFIGURATION_UPDATE: ProcedureContract = ProcedureContract {
    name: "GNBDUConfigurationUpdate",
    procedure_code: ProcedureCode::GNB_DU_CONFIGURATION_UPDATE,
    kind: MessageKind::InitiatingMessage,
    criticality: Reject,
    ies: &[
        ie::TRANSACTION_ID,
        ie::SERVED_CELLS_TO_ADD_LIST,
        ie::SERVED_CELLS_TO_MODIFY_LIST,
        ie::SERVED_CELLS_TO_DELETE_LIST,
        ie::GNB_DU_ID_OPTIONAL,
    ],
};

pub const GNB_CU_CONFIGURATION_UPDATE: ProcedureContract = ProcedureContract {
    name: "GNBCUConfigurationUpdate",
    procedure_code: ProcedureCode::GNB_CU_CONFIGURATION_UPDATE,
    kind: MessageKind::InitiatingMessage,
    criticality: Reject,
    ies: &[ie::TRANSACTION_ID, ie::CELLS_TO_BE_ACTIVATED_LIST],
};

pub const GNB_CU_CONFIGURATION_UPDATE_ACKNOWLEDGE: ProcedureContract = ProcedureContract {
    name: "GNBCUConfigurationUpdateAcknowledge",
    procedure_code: ProcedureCode::GNB_CU_CONFIGURATION_UPDATE,
    kind: MessageKind::SuccessfulOutcome,
    criticality: Reject,
    ies: &[ie::TRANSACTION_ID, ie::CELLS_FAILED_TO_BE_ACTIVATED_LIST],
};

pub const GNB_CU_CONFIGURATION_UPDATE_FAILURE: ProcedureContract = ProcedureContract {
    name: "GNBCUConfigurationUpdateFailure",
    procedure_code: ProcedureCode::GNB_CU_CONFIGURATION_UPDATE,
    kind: MessageKind::UnsuccessfulOutcome,
    criticality: Reject,
    ies: &[ie::TRANSACTION_ID, ie::CAUSE, ie::TIME_TO_WAIT],
};

pub const ERROR_INDICATION: ProcedureContract = ProcedureContract {
    name: "ErrorIndication",
    procedure_code: ProcedureCode::ERROR_INDICATION,
    kind: MessageKind::InitiatingMessage,
    criticality: Ignore,
    ies: &[
        ie::TRANSACTION_ID,
        ie::CAUSE_OPTIONAL,
        ie::CRITICALITY_DIAGNOSTICS,
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: ProtocolIeId, criticality: Criticality) -> ProtocolIeField {
        ProtocolIeField {
            id,
            criticality,
            value: vec![0x00, 0x01],
        }
    }

    #[test]
    fn test_extract_mandatory_missing() {
        let ies = ProtocolIeContainer::new();
        let err = extract(&ies, &ie::TRANSACTION_ID).unwrap_err();
        assert!(matches!(
            err,
            F1apError::MissingMandatoryIe {
                ie_name: "TransactionID",
                ie_id: 78
            }
        ));
    }

    #[test]
    fn test_extract_optional_missing() {
        let ies = ProtocolIeContainer::new();
        assert!(extract(&ies, &ie::TIME_TO_WAIT).unwrap().is_none());
    }

    #[test]
    fn test_extract_criticality_mismatch() {
        let mut ies = ProtocolIeContainer::new();
        ies.push(field(ProtocolIeId::TRANSACTION_ID, Criticality::Ignore));
        let err = extract(&ies, &ie::TRANSACTION_ID).unwrap_err();
        assert!(matches!(
            err,
            F1apError::CriticalityMismatch {
                expected: Criticality::Reject,
                got: Criticality::Ignore,
                ..
            }
        ));
    }

    #[test]
    fn test_extract_first_match_wins() {
        let mut ies = ProtocolIeContainer::new();
        ies.push(field(ProtocolIeId::TRANSACTION_ID, Criticality::Reject));
        ies.push(field(ProtocolIeId::TRANSACTION_ID, Criticality::Ignore));
        assert!(extract(&ies, &ie::TRANSACTION_ID).unwrap().is_some());
    }

    #[test]
    fn test_require_optional_spec() {
        let ies = ProtocolIeContainer::new();
        assert!(matches!(
            require(&ies, &ie::GNB_CU_NAME),
            Err(F1apError::MissingMandatoryIe { ie_id: 82, .. })
        ));
    }

    #[test]
    fn test_classify_unknown_ie() {
        let err = F1_SETUP_RESPONSE
            .classify(&field(ProtocolIeId(9999), Criticality::Ignore))
            .unwrap_err();
        assert!(matches!(
            err,
            F1apError::UnsupportedIe {
                procedure: "F1SetupResponse",
                ie_id: 9999
            }
        ));
    }

    #[test]
    fn test_required() {
        assert_eq!(required(Some(3u8), &ie::TRANSACTION_ID).unwrap(), 3);
        assert!(matches!(
            required::<u8>(None, &ie::CELLS_TO_BE_ACTIVATED_LIST),
            Err(F1apError::MissingMandatoryIe { ie_id: 3, .. })
        ));
    }

    #[test]
    fn test_check_header() {
        let msg = Message {
            procedure_code: ProcedureCode::RESET,
            criticality: Criticality::Reject,
            value: ProtocolIeContainer::new(),
        };
        assert!(RESET.check_header(MessageKind::InitiatingMessage, &msg).is_ok());
        assert!(matches!(
            RESET.check_header(MessageKind::SuccessfulOutcome, &msg),
            Err(F1apError::UnexpectedMessageType { .. })
        ));
        assert!(matches!(
            F1_SETUP_RESPONSE.check_header(MessageKind::SuccessfulOutcome, &msg),
            Err(F1apError::UnexpectedProcedureCode {
                expected: 1,
                got: 0
            })
        ));

        let ignored = Message {
            criticality: Criticality::Ignore,
            ..msg
        };
        assert!(matches!(
            RESET.check_header(MessageKind::InitiatingMessage, &ignored),
            Err(F1apError::UnexpectedCriticality { .. })
        ));
    }
}

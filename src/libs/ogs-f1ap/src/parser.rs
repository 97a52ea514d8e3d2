//! F1AP Message Parsers
//!
//! Functions for decoding F1AP PDUs into high-level types. Each parser checks
//! the message header against its procedure contract, then maps the IEs to
//! their strongly-typed representations. The first structural violation
//! aborts the whole message.
//!
//! F1 Setup Response and gNB-CU Configuration Update walk the full IE list
//! and reject any IE outside the contract; the other messages pick their IEs
//! by targeted extraction.

use ogs_asn1c::f1ap::ies::ProtocolIeContainer;
use ogs_asn1c::f1ap::pdu::{F1apPdu, Message, MessageKind};
use ogs_asn1c::f1ap::types::{ProcedureCode, ProtocolIeId};

use crate::codec::{AperCodec, PduCodec};
use crate::contract::{self, extract, require, required, ProcedureContract};
use crate::error::{F1apError, F1apResult};
use crate::ie;
use crate::types::*;

/// Decoded F1AP message
#[derive(Debug, Clone, PartialEq)]
pub enum F1apMessage {
    Reset(Reset),
    ResetAcknowledge(ResetAcknowledge),
    F1SetupRequest(F1SetupRequest),
    F1SetupResponse(F1SetupResponse),
    F1SetupFailure(F1SetupFailure),
    GnbDuConfigurationUpdate(GnbDuConfigurationUpdate),
    GnbCuConfigurationUpdate(GnbCuConfigurationUpdate),
    GnbCuConfigurationUpdateAcknowledge(GnbCuConfigurationUpdateAcknowledge),
    GnbCuConfigurationUpdateFailure(GnbCuConfigurationUpdateFailure),
    ErrorIndication(ErrorIndication),
}

impl F1apMessage {
    pub fn transaction_id(&self) -> TransactionId {
        match self {
            F1apMessage::Reset(m) => m.transaction_id,
            F1apMessage::ResetAcknowledge(m) => m.transaction_id,
            F1apMessage::F1SetupRequest(m) => m.transaction_id,
            F1apMessage::F1SetupResponse(m) => m.transaction_id,
            F1apMessage::F1SetupFailure(m) => m.transaction_id,
            F1apMessage::GnbDuConfigurationUpdate(m) => m.transaction_id,
            F1apMessage::GnbCuConfigurationUpdate(m) => m.transaction_id,
            F1apMessage::GnbCuConfigurationUpdateAcknowledge(m) => m.transaction_id,
            F1apMessage::GnbCuConfigurationUpdateFailure(m) => m.transaction_id,
            F1apMessage::ErrorIndication(m) => m.transaction_id,
        }
    }
}

/// Decode an F1AP PDU from APER bytes into a high-level F1apMessage
pub fn decode_f1ap_pdu(data: &[u8]) -> F1apResult<F1apMessage> {
    let pdu = AperCodec.decode(data)?;
    parse_pdu(&pdu)
}

/// Dispatch an already decoded PDU on its alternative and procedure code
pub fn parse_pdu(pdu: &F1apPdu) -> F1apResult<F1apMessage> {
    let code = pdu.procedure_code();
    let message = match (pdu.kind(), code) {
        (MessageKind::InitiatingMessage, ProcedureCode::RESET) => {
            F1apMessage::Reset(parse_reset(pdu)?)
        }
        (MessageKind::SuccessfulOutcome, ProcedureCode::RESET) => {
            F1apMessage::ResetAcknowledge(parse_reset_acknowledge(pdu)?)
        }
        (MessageKind::InitiatingMessage, ProcedureCode::F1_SETUP) => {
            F1apMessage::F1SetupRequest(parse_f1_setup_request(pdu)?)
        }
        (MessageKind::SuccessfulOutcome, ProcedureCode::F1_SETUP) => {
            F1apMessage::F1SetupResponse(parse_f1_setup_response(pdu)?)
        }
        (MessageKind::UnsuccessfulOutcome, ProcedureCode::F1_SETUP) => {
            F1apMessage::F1SetupFailure(parse_f1_setup_failure(pdu)?)
        }
        (MessageKind::InitiatingMessage, ProcedureCode::GNB_DU_CONFIGURATION_UPDATE) => {
            F1apMessage::GnbDuConfigurationUpdate(parse_gnb_du_configuration_update(pdu)?)
        }
        (MessageKind::InitiatingMessage, ProcedureCode::GNB_CU_CONFIGURATION_UPDATE) => {
            F1apMessage::GnbCuConfigurationUpdate(parse_gnb_cu_configuration_update(pdu)?)
        }
        (MessageKind::SuccessfulOutcome, ProcedureCode::GNB_CU_CONFIGURATION_UPDATE) => {
            F1apMessage::GnbCuConfigurationUpdateAcknowledge(
                parse_gnb_cu_configuration_update_acknowledge(pdu)?,
            )
        }
        (MessageKind::UnsuccessfulOutcome, ProcedureCode::GNB_CU_CONFIGURATION_UPDATE) => {
            F1apMessage::GnbCuConfigurationUpdateFailure(
                parse_gnb_cu_configuration_update_failure(pdu)?,
            )
        }
        (MessageKind::InitiatingMessage, ProcedureCode::ERROR_INDICATION) => {
            F1apMessage::ErrorIndication(parse_error_indication(pdu)?)
        }
        (kind, code) => return Err(unimplemented(kind, code)),
    };
    Ok(message)
}

/// Error for a procedure and alternative with no parser
pub fn unimplemented(kind: MessageKind, code: ProcedureCode) -> F1apError {
    F1apError::UnimplementedProcedure {
        procedure: code.name(),
        kind,
    }
}

/// Best-effort read of the TransactionID, used when answering a message
/// that failed to parse
pub fn peek_transaction_id(msg: &Message) -> Option<TransactionId> {
    msg.value
        .find(ProtocolIeId::TRANSACTION_ID)
        .and_then(|field| ie::decode_transaction_id(field).ok())
}

/// Header check shared by every parser
fn open<'a>(contract: &ProcedureContract, pdu: &'a F1apPdu) -> F1apResult<&'a ProtocolIeContainer> {
    let msg = pdu.message();
    contract.check_header(pdu.kind(), msg)?;
    Ok(&msg.value)
}

fn log_duplicate(contract: &ProcedureContract, id: ProtocolIeId) {
    log::debug!("[{}] Repeated IE id={} ignored", contract.name, id.0);
}

// ============================================================================
// Reset
// ============================================================================

/// Parse a Reset; reset of part of the F1 interface is rejected
pub fn parse_reset(pdu: &F1apPdu) -> F1apResult<Reset> {
    let ies = open(&contract::RESET, pdu)?;

    let transaction_id = ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?;
    let cause = ie::decode_cause(require(ies, &contract::ie::CAUSE)?)?;
    let scope = ie::decode_reset_type(require(ies, &contract::ie::RESET_TYPE)?)?;

    if let ResetScope::PartOfF1Interface(ref connections) = scope {
        return Err(F1apError::UnsupportedResetScope {
            connections: connections.len(),
        });
    }

    log::debug!("[Reset] Transaction {transaction_id} cause {cause:?}");
    Ok(Reset {
        transaction_id,
        cause,
        scope,
    })
}

pub fn parse_reset_acknowledge(pdu: &F1apPdu) -> F1apResult<ResetAcknowledge> {
    let ies = open(&contract::RESET_ACKNOWLEDGE, pdu)?;
    let transaction_id = ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?;
    Ok(ResetAcknowledge { transaction_id })
}

// ============================================================================
// F1 Setup
// ============================================================================

pub fn parse_f1_setup_request(pdu: &F1apPdu) -> F1apResult<F1SetupRequest> {
    let ies = open(&contract::F1_SETUP_REQUEST, pdu)?;

    let transaction_id = ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?;
    let gnb_du_id = ie::decode_gnb_du_id(require(ies, &contract::ie::GNB_DU_ID)?)?;
    let gnb_du_name = extract(ies, &contract::ie::GNB_DU_NAME)?
        .map(ie::decode_gnb_du_name)
        .transpose()?;
    let served_cells = extract(ies, &contract::ie::GNB_DU_SERVED_CELLS_LIST)?
        .map(ie::decode_served_cells_list)
        .transpose()?
        .unwrap_or_default();
    let rrc_version =
        ie::decode_gnb_du_rrc_version(require(ies, &contract::ie::GNB_DU_RRC_VERSION)?)?;

    Ok(F1SetupRequest {
        transaction_id,
        gnb_du_id,
        gnb_du_name,
        served_cells,
        rrc_version,
        bandwidth_policy: BandwidthPolicy::default(),
    })
}

/// Parse an F1 Setup Response.
///
/// Activated cells carrying system information are refused with
/// [`F1apError::SystemInformationNotSupported`].
pub fn parse_f1_setup_response(pdu: &F1apPdu) -> F1apResult<F1SetupResponse> {
    let contract = &contract::F1_SETUP_RESPONSE;
    let ies = open(contract, pdu)?;

    let mut transaction_id = None;
    let mut gnb_cu_name = None;
    let mut cells_to_activate = None;
    let mut gnb_cu_rrc_version = None;

    for field in &ies.ies {
        let spec = contract.classify(field)?;
        match spec.id {
            ProtocolIeId::TRANSACTION_ID if transaction_id.is_none() => {
                transaction_id = Some(ie::decode_transaction_id(field)?);
            }
            ProtocolIeId::GNB_CU_NAME if gnb_cu_name.is_none() => {
                gnb_cu_name = Some(ie::decode_gnb_cu_name(field)?);
            }
            ProtocolIeId::CELLS_TO_BE_ACTIVATED_LIST if cells_to_activate.is_none() => {
                cells_to_activate = Some(ie::decode_cells_to_activate_list(
                    field,
                    ProcedureCode::F1_SETUP,
                )?);
            }
            ProtocolIeId::GNB_CU_RRC_VERSION if gnb_cu_rrc_version.is_none() => {
                gnb_cu_rrc_version = Some(ie::decode_gnb_cu_rrc_version(field)?);
            }
            id => log_duplicate(contract, id),
        }
    }

    let transaction_id = required(transaction_id, &contract::ie::TRANSACTION_ID)?;
    let cells_to_activate = required(cells_to_activate, &contract::ie::CELLS_TO_BE_ACTIVATED_LIST)?;

    let cells_with_si = cells_to_activate.iter().filter(|cell| cell.num_si() > 0).count();
    if cells_with_si > 0 {
        return Err(F1apError::SystemInformationNotSupported {
            cells: cells_with_si,
        });
    }

    log::debug!(
        "[F1SetupResponse] Transaction {transaction_id}, {} cell(s) to activate",
        cells_to_activate.len()
    );
    Ok(F1SetupResponse {
        transaction_id,
        gnb_cu_name,
        cells_to_activate,
        gnb_cu_rrc_version: gnb_cu_rrc_version.unwrap_or_default(),
    })
}

pub fn parse_f1_setup_failure(pdu: &F1apPdu) -> F1apResult<F1SetupFailure> {
    let ies = open(&contract::F1_SETUP_FAILURE, pdu)?;

    let transaction_id = ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?;
    let cause = ie::decode_cause(require(ies, &contract::ie::CAUSE)?)?;
    let time_to_wait = extract(ies, &contract::ie::TIME_TO_WAIT)?
        .map(ie::decode_time_to_wait)
        .transpose()?;

    Ok(F1SetupFailure {
        transaction_id,
        cause,
        time_to_wait,
    })
}

// ============================================================================
// gNB-DU Configuration Update
// ============================================================================

pub fn parse_gnb_du_configuration_update(pdu: &F1apPdu) -> F1apResult<GnbDuConfigurationUpdate> {
    let ies = open(&contract::GNB_DU_CONFIGURATION_UPDATE, pdu)?;

    let transaction_id = ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?;
    let cells_to_add = extract(ies, &contract::ie::SERVED_CELLS_TO_ADD_LIST)?
        .map(ie::decode_served_cells_to_add_list)
        .transpose()?
        .unwrap_or_default();
    let cells_to_modify = extract(ies, &contract::ie::SERVED_CELLS_TO_MODIFY_LIST)?
        .map(ie::decode_served_cells_to_modify_list)
        .transpose()?
        .unwrap_or_default();
    let cells_to_delete = extract(ies, &contract::ie::SERVED_CELLS_TO_DELETE_LIST)?
        .map(ie::decode_served_cells_to_delete_list)
        .transpose()?
        .unwrap_or_default();

    let gnb_du_id = extract(ies, &contract::ie::GNB_DU_ID_OPTIONAL)?
        .map(ie::decode_gnb_du_id)
        .transpose()?;

    Ok(GnbDuConfigurationUpdate {
        transaction_id,
        cells_to_add,
        cells_to_modify,
        cells_to_delete,
        gnb_du_id,
        bandwidth_policy: BandwidthPolicy::default(),
    })
}

// ============================================================================
// gNB-CU Configuration Update
// ============================================================================

pub fn parse_gnb_cu_configuration_update(pdu: &F1apPdu) -> F1apResult<GnbCuConfigurationUpdate> {
    let contract = &contract::GNB_CU_CONFIGURATION_UPDATE;
    let ies = open(contract, pdu)?;

    let mut transaction_id = None;
    let mut cells_to_activate = None;

    for field in &ies.ies {
        let spec = contract.classify(field)?;
        match spec.id {
            ProtocolIeId::TRANSACTION_ID if transaction_id.is_none() => {
                transaction_id = Some(ie::decode_transaction_id(field)?);
            }
            ProtocolIeId::CELLS_TO_BE_ACTIVATED_LIST if cells_to_activate.is_none() => {
                cells_to_activate = Some(ie::decode_cells_to_activate_list(
                    field,
                    ProcedureCode::GNB_CU_CONFIGURATION_UPDATE,
                )?);
            }
            id => log_duplicate(contract, id),
        }
    }

    Ok(GnbCuConfigurationUpdate {
        transaction_id: required(transaction_id, &contract::ie::TRANSACTION_ID)?,
        cells_to_activate: required(cells_to_activate, &contract::ie::CELLS_TO_BE_ACTIVATED_LIST)?,
    })
}

pub fn parse_gnb_cu_configuration_update_acknowledge(
    pdu: &F1apPdu,
) -> F1apResult<GnbCuConfigurationUpdateAcknowledge> {
    let ies = open(&contract::GNB_CU_CONFIGURATION_UPDATE_ACKNOWLEDGE, pdu)?;

    let transaction_id = ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?;
    let cells_failed_to_activate =
        extract(ies, &contract::ie::CELLS_FAILED_TO_BE_ACTIVATED_LIST)?
            .map(ie::decode_cells_failed_to_activate_list)
            .transpose()?
            .unwrap_or_default();

    Ok(GnbCuConfigurationUpdateAcknowledge {
        transaction_id,
        cells_failed_to_activate,
    })
}

pub fn parse_gnb_cu_configuration_update_failure(
    pdu: &F1apPdu,
) -> F1apResult<GnbCuConfigurationUpdateFailure> {
    let ies = open(&contract::GNB_CU_CONFIGURATION_UPDATE_FAILURE, pdu)?;

    Ok(GnbCuConfigurationUpdateFailure {
        transaction_id: ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?,
        cause: ie::decode_cause(require(ies, &contract::ie::CAUSE)?)?,
        time_to_wait: extract(ies, &contract::ie::TIME_TO_WAIT)?
            .map(ie::decode_time_to_wait)
            .transpose()?,
    })
}

// ============================================================================
// Error Indication
// ============================================================================

pub fn parse_error_indication(pdu: &F1apPdu) -> F1apResult<ErrorIndication> {
    let ies = open(&contract::ERROR_INDICATION, pdu)?;

    let transaction_id = ie::decode_transaction_id(require(ies, &contract::ie::TRANSACTION_ID)?)?;
    let cause = extract(ies, &contract::ie::CAUSE_OPTIONAL)?
        .map(ie::decode_cause)
        .transpose()?;

    Ok(ErrorIndication {
        transaction_id,
        cause,
    })
}

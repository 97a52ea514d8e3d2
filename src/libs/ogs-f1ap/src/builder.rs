//! F1AP Message Builders
//!
//! Functions for building F1AP PDUs from high-level types. Each function
//! fills the IE container in the procedure's mandatory-then-optional order
//! and wraps it in the PDU alternative, procedure code and criticality fixed
//! by the procedure contract. Byte serialization is left to a
//! [`PduCodec`](crate::codec::PduCodec).

use ogs_asn1c::f1ap::ies::ProtocolIeContainer;
use ogs_asn1c::f1ap::pdu::F1apPdu;

use crate::contract::{self, ProcedureContract};
use crate::error::{F1apError, F1apResult};
use crate::ie;
use crate::types::*;

/// Fill a fresh container and wrap it as `contract` prescribes
fn build(
    contract: &ProcedureContract,
    fill: impl FnOnce(&mut ProtocolIeContainer) -> F1apResult<()>,
) -> F1apResult<F1apPdu> {
    let mut container = ProtocolIeContainer::new();
    fill(&mut container).map_err(F1apError::into_encode_failure)?;
    log::debug!("[{}] Built with {} IEs", contract.name, container.len());
    Ok(F1apPdu::new(
        contract.kind,
        contract.procedure_code,
        contract.criticality,
        container,
    ))
}

// ============================================================================
// Reset
// ============================================================================

/// Build a Reset PDU
pub fn build_reset(msg: &Reset) -> F1apResult<F1apPdu> {
    build(&contract::RESET, |container| {
        // IE: TransactionID (mandatory)
        ie::encode_transaction_id(container, msg.transaction_id)?;
        // IE: Cause (mandatory)
        ie::encode_cause(container, &msg.cause)?;
        // IE: ResetType (mandatory)
        ie::encode_reset_type(container, &msg.scope)
    })
}

/// Build a Reset Acknowledge PDU echoing the Reset's transaction id
pub fn build_reset_acknowledge(msg: &ResetAcknowledge) -> F1apResult<F1apPdu> {
    build(&contract::RESET_ACKNOWLEDGE, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)
    })
}

// ============================================================================
// F1 Setup
// ============================================================================

/// Build an F1 Setup Request PDU
pub fn build_f1_setup_request(msg: &F1SetupRequest) -> F1apResult<F1apPdu> {
    build(&contract::F1_SETUP_REQUEST, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;
        ie::encode_gnb_du_id(container, msg.gnb_du_id)?;

        // IE: gNB-DU-Name (optional)
        if let Some(ref name) = msg.gnb_du_name {
            ie::encode_gnb_du_name(container, name)?;
        }

        // IE: gNB-DU-Served-Cells-List (optional, SIZE(1..) so omitted when empty)
        if !msg.served_cells.is_empty() {
            ie::encode_served_cells_list(container, &msg.served_cells, msg.bandwidth_policy)?;
        }

        ie::encode_gnb_du_rrc_version(container, &msg.rrc_version)
    })
}

/// Build an F1 Setup Response PDU (CU side)
pub fn build_f1_setup_response(msg: &F1SetupResponse) -> F1apResult<F1apPdu> {
    build(&contract::F1_SETUP_RESPONSE, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;
        if let Some(ref name) = msg.gnb_cu_name {
            ie::encode_gnb_cu_name(container, name)?;
        }
        ie::encode_cells_to_activate_list(container, &msg.cells_to_activate)?;
        ie::encode_gnb_cu_rrc_version(container, &msg.gnb_cu_rrc_version)
    })
}

/// Build an F1 Setup Failure PDU (CU side)
pub fn build_f1_setup_failure(msg: &F1SetupFailure) -> F1apResult<F1apPdu> {
    build(&contract::F1_SETUP_FAILURE, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;
        ie::encode_cause(container, &msg.cause)?;
        if let Some(ttw) = msg.time_to_wait {
            ie::encode_time_to_wait(container, ttw)?;
        }
        Ok(())
    })
}

// ============================================================================
// gNB-DU Configuration Update
// ============================================================================

/// Build a gNB-DU Configuration Update PDU
///
/// Each served-cell list is optional and only present when non-empty.
pub fn build_gnb_du_configuration_update(msg: &GnbDuConfigurationUpdate) -> F1apResult<F1apPdu> {
    build(&contract::GNB_DU_CONFIGURATION_UPDATE, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;

        if !msg.cells_to_add.is_empty() {
            ie::encode_served_cells_to_add_list(
                container,
                &msg.cells_to_add,
                msg.bandwidth_policy,
            )?;
        }
        if !msg.cells_to_modify.is_empty() {
            ie::encode_served_cells_to_modify_list(
                container,
                &msg.cells_to_modify,
                msg.bandwidth_policy,
            )?;
        }
        if !msg.cells_to_delete.is_empty() {
            ie::encode_served_cells_to_delete_list(container, &msg.cells_to_delete)?;
        }

        if let Some(id) = msg.gnb_du_id {
            ie::encode_gnb_du_id(container, id)?;
        }
        Ok(())
    })
}

// ============================================================================
// gNB-CU Configuration Update
// ============================================================================

/// Build a gNB-CU Configuration Update PDU (CU side)
pub fn build_gnb_cu_configuration_update(msg: &GnbCuConfigurationUpdate) -> F1apResult<F1apPdu> {
    build(&contract::GNB_CU_CONFIGURATION_UPDATE, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;
        ie::encode_cells_to_activate_list(container, &msg.cells_to_activate)
    })
}

/// Build a gNB-CU Configuration Update Acknowledge PDU
pub fn build_gnb_cu_configuration_update_acknowledge(
    msg: &GnbCuConfigurationUpdateAcknowledge,
) -> F1apResult<F1apPdu> {
    build(&contract::GNB_CU_CONFIGURATION_UPDATE_ACKNOWLEDGE, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;
        if !msg.cells_failed_to_activate.is_empty() {
            ie::encode_cells_failed_to_activate_list(container, &msg.cells_failed_to_activate)?;
        }
        Ok(())
    })
}

/// Build a gNB-CU Configuration Update Failure PDU
pub fn build_gnb_cu_configuration_update_failure(
    msg: &GnbCuConfigurationUpdateFailure,
) -> F1apResult<F1apPdu> {
    build(&contract::GNB_CU_CONFIGURATION_UPDATE_FAILURE, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;
        ie::encode_cause(container, &msg.cause)?;
        if let Some(ttw) = msg.time_to_wait {
            ie::encode_time_to_wait(container, ttw)?;
        }
        Ok(())
    })
}

// ============================================================================
// Error Indication
// ============================================================================

/// Build an Error Indication PDU
pub fn build_error_indication(msg: &ErrorIndication) -> F1apResult<F1apPdu> {
    build(&contract::ERROR_INDICATION, |container| {
        ie::encode_transaction_id(container, msg.transaction_id)?;
        if let Some(ref cause) = msg.cause {
            ie::encode_cause(container, cause)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{AperCodec, PduCodec};
    use ogs_asn1c::f1ap::pdu::MessageKind;
    use ogs_asn1c::f1ap::types::{Criticality, ProcedureCode, ProtocolIeId};

    fn ids(pdu: &F1apPdu) -> Vec<u16> {
        pdu.message().value.ies.iter().map(|f| f.id.0).collect()
    }

    #[test]
    fn test_reset_acknowledge_bytes() {
        let pdu = build_reset_acknowledge(&ResetAcknowledge { transaction_id: 3 }).unwrap();
        let bytes = AperCodec.encode(&pdu).unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0x20, 0x00, 0x00, 0x09, 0x00, 0x00, 0x01, 0x00, 0x4E, 0x00, 0x02, 0x00, 0x03]
        );
    }

    #[test]
    fn test_reset_header_and_order() {
        let pdu = build_reset(&Reset {
            transaction_id: 1,
            cause: Cause::RadioNetwork(CauseRadioNetwork::RlFailureRlc),
            scope: ResetScope::F1Interface,
        })
        .unwrap();
        assert_eq!(pdu.kind(), MessageKind::InitiatingMessage);
        assert_eq!(pdu.procedure_code(), ProcedureCode::RESET);
        assert_eq!(pdu.message().criticality, Criticality::Reject);
        assert_eq!(ids(&pdu), vec![78, 0, 48]);
    }

    #[test]
    fn test_setup_request_without_cells() {
        let pdu = build_f1_setup_request(&F1SetupRequest {
            transaction_id: 0,
            gnb_du_id: 0x0E00,
            gnb_du_name: Some("OAI-DU".to_string()),
            served_cells: vec![],
            rrc_version: RrcVersion([16, 6, 0]),
            bandwidth_policy: BandwidthPolicy::Strict,
        })
        .unwrap();
        assert_eq!(ids(&pdu), vec![78, 42, 45, 171]);
        let name = pdu.message().value.find(ProtocolIeId::GNB_DU_NAME).unwrap();
        assert_eq!(name.criticality, Criticality::Ignore);
    }

    #[test]
    fn test_configuration_error_is_not_encode_failure() {
        let err = build_f1_setup_request(&F1SetupRequest {
            transaction_id: 0,
            gnb_du_id: 1 << 40,
            gnb_du_name: None,
            served_cells: vec![],
            rrc_version: RrcVersion::default(),
            bandwidth_policy: BandwidthPolicy::Strict,
        })
        .unwrap_err();
        assert!(matches!(err, F1apError::Configuration(_)));
    }

    #[test]
    fn test_du_configuration_update_optional_lists() {
        let pdu = build_gnb_du_configuration_update(&GnbDuConfigurationUpdate {
            transaction_id: 9,
            cells_to_delete: vec![NrCgi {
                plmn: PlmnId::new(208, 93, 2),
                nr_cellid: 1,
            }],
            gnb_du_id: Some(7),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(ids(&pdu), vec![78, 60, 42]);
        assert_eq!(pdu.procedure_code(), ProcedureCode::GNB_DU_CONFIGURATION_UPDATE);
    }

    #[test]
    fn test_error_indication_criticality() {
        let pdu = build_error_indication(&ErrorIndication {
            transaction_id: 4,
            cause: None,
        })
        .unwrap();
        assert_eq!(pdu.message().criticality, Criticality::Ignore);
        assert_eq!(ids(&pdu), vec![78]);
    }

    #[test]
    fn test_cu_update_ack_without_failed_cells() {
        let pdu = build_gnb_cu_configuration_update_acknowledge(
            &GnbCuConfigurationUpdateAcknowledge {
                transaction_id: 2,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(pdu.kind(), MessageKind::SuccessfulOutcome);
        assert_eq!(ids(&pdu), vec![78]);
    }
}

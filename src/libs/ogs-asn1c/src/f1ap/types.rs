//! F1AP Basic Types
//!
//! Basic types from F1AP-CommonDataTypes and F1AP-Constants (3GPP TS 38.473)

use crate::per::{AperDecode, AperDecoder, AperEncode, AperEncoder, Constraint, PerError, PerResult};

/// Criticality - indicates how to handle unrecognized IEs
/// ASN.1: Criticality ::= ENUMERATED { reject, ignore, notify }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Criticality {
    Reject = 0,
    Ignore = 1,
    Notify = 2,
}

impl Criticality {
    pub const CONSTRAINT: Constraint = Constraint::new(0, 2);
}

impl AperEncode for Criticality {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(*self as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for Criticality {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        match decoder.decode_enumerated(&Self::CONSTRAINT)? {
            0 => Ok(Criticality::Reject),
            1 => Ok(Criticality::Ignore),
            2 => Ok(Criticality::Notify),
            value => Err(PerError::DecodeError(format!(
                "Invalid Criticality value: {value}"
            ))),
        }
    }
}

/// Presence - whether an IE is optional, conditional, or mandatory
/// ASN.1: Presence ::= ENUMERATED { optional, conditional, mandatory }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Presence {
    Optional = 0,
    Conditional = 1,
    Mandatory = 2,
}

/// ProcedureCode - identifies the F1AP elementary procedure
/// ASN.1: ProcedureCode ::= INTEGER (0..255)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcedureCode(pub u8);

impl ProcedureCode {
    pub const CONSTRAINT: Constraint = Constraint::new(0, 255);

    // Interface management procedure codes from 3GPP TS 38.473
    pub const RESET: Self = Self(0);
    pub const F1_SETUP: Self = Self(1);
    pub const ERROR_INDICATION: Self = Self(2);
    pub const GNB_DU_CONFIGURATION_UPDATE: Self = Self(3);
    pub const GNB_CU_CONFIGURATION_UPDATE: Self = Self(4);
    pub const GNB_DU_RESOURCE_COORDINATION: Self = Self(16);

    pub fn name(&self) -> &'static str {
        match *self {
            Self::RESET => "Reset",
            Self::F1_SETUP => "F1Setup",
            Self::ERROR_INDICATION => "ErrorIndication",
            Self::GNB_DU_CONFIGURATION_UPDATE => "gNBDUConfigurationUpdate",
            Self::GNB_CU_CONFIGURATION_UPDATE => "gNBCUConfigurationUpdate",
            Self::GNB_DU_RESOURCE_COORDINATION => "GNBDUResourceCoordination",
            _ => "Unknown",
        }
    }
}

impl AperEncode for ProcedureCode {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_constrained_whole_number(self.0 as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for ProcedureCode {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_constrained_whole_number(&Self::CONSTRAINT)?;
        Ok(ProcedureCode(value as u8))
    }
}

/// ProtocolIE-ID - identifies the Information Element
/// ASN.1: ProtocolIE-ID ::= INTEGER (0..65535)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProtocolIeId(pub u16);

impl ProtocolIeId {
    pub const CONSTRAINT: Constraint = Constraint::new(0, 65535);

    // IE IDs from 3GPP TS 38.473 F1AP-Constants
    pub const CAUSE: Self = Self(0);
    pub const CELLS_FAILED_TO_BE_ACTIVATED_LIST: Self = Self(1);
    pub const CELLS_FAILED_TO_BE_ACTIVATED_LIST_ITEM: Self = Self(2);
    pub const CELLS_TO_BE_ACTIVATED_LIST: Self = Self(3);
    pub const CELLS_TO_BE_ACTIVATED_LIST_ITEM: Self = Self(4);
    pub const CRITICALITY_DIAGNOSTICS: Self = Self(7);
    pub const GNB_DU_ID: Self = Self(42);
    pub const GNB_DU_SERVED_CELLS_ITEM: Self = Self(43);
    pub const GNB_DU_SERVED_CELLS_LIST: Self = Self(44);
    pub const GNB_DU_NAME: Self = Self(45);
    pub const RESET_TYPE: Self = Self(48);
    pub const SERVED_CELLS_TO_ADD_ITEM: Self = Self(57);
    pub const SERVED_CELLS_TO_ADD_LIST: Self = Self(58);
    pub const SERVED_CELLS_TO_DELETE_ITEM: Self = Self(59);
    pub const SERVED_CELLS_TO_DELETE_LIST: Self = Self(60);
    pub const SERVED_CELLS_TO_MODIFY_ITEM: Self = Self(61);
    pub const SERVED_CELLS_TO_MODIFY_LIST: Self = Self(62);
    pub const TIME_TO_WAIT: Self = Self(77);
    pub const TRANSACTION_ID: Self = Self(78);
    pub const UE_ASSOCIATED_LOGICAL_F1_CONNECTION_ITEM: Self = Self(80);
    pub const GNB_CU_NAME: Self = Self(82);
    pub const GNB_CU_SYSTEM_INFORMATION: Self = Self(118);
    pub const TAI_SLICE_SUPPORT_LIST: Self = Self(131);
    pub const GNB_CU_RRC_VERSION: Self = Self(170);
    pub const GNB_DU_RRC_VERSION: Self = Self(171);
    pub const AVAILABLE_PLMN_LIST: Self = Self(179);
    pub const EXTENDED_AVAILABLE_PLMN_LIST: Self = Self(289);
    pub const IAB_INFO_IAB_DONOR_CU: Self = Self(291);
    pub const AVAILABLE_SNPN_ID_LIST: Self = Self(386);
    pub const LATEST_RRC_VERSION_ENHANCED: Self = Self(428);
}

impl AperEncode for ProtocolIeId {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_constrained_whole_number(self.0 as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for ProtocolIeId {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_constrained_whole_number(&Self::CONSTRAINT)?;
        Ok(ProtocolIeId(value as u16))
    }
}

/// Size bounds from F1AP-Constants
pub mod max {
    /// maxProtocolIEs / maxProtocolExtensions
    pub const PROTOCOL_IES: usize = 65535;
    /// maxCellingNBDU
    pub const CELLS_IN_GNB_DU: usize = 512;
    /// maxnoofBPLMNs
    pub const BPLMNS: usize = 6;
    /// maxnoofSliceItems
    pub const SLICE_ITEMS: usize = 1024;
    /// maxnoofNrCellBands
    pub const NR_CELL_BANDS: usize = 32;
    /// maxnoofSIBTypes
    pub const SIB_TYPES: usize = 32;
    /// maxnoofIndividualF1ConnectionsToReset
    pub const INDIVIDUAL_F1_CONNECTIONS_TO_RESET: usize = 65536;
    /// maxNRARFCN
    pub const NR_ARFCN: i64 = 3_279_165;
}

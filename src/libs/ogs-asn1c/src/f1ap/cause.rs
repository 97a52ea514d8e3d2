//! F1AP Cause Types
//!
//! Cause types from F1AP-IEs (3GPP TS 38.473)

use crate::per::{AperDecode, AperDecoder, AperEncode, AperEncoder, Constraint, PerError, PerResult};

/// CauseRadioNetwork - Radio network layer cause values
/// ASN.1: CauseRadioNetwork ::= ENUMERATED { unspecified, ..., normal-release, ..., <extensions> }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CauseRadioNetwork {
    Unspecified = 0,
    RlFailureRlc = 1,
    UnknownOrAlreadyAllocatedGnbCuUeF1apId = 2,
    UnknownOrAlreadyAllocatedGnbDuUeF1apId = 3,
    UnknownOrInconsistentPairOfUeF1apId = 4,
    InteractionWithOtherProcedure = 5,
    NotSupportedQciValue = 6,
    ActionDesirableForRadioReasons = 7,
    NoRadioResourcesAvailable = 8,
    ProcedureCancelled = 9,
    NormalRelease = 10,
    // Extension values
    CellNotAvailable = 11,
    RlFailureOthers = 12,
    UeRejection = 13,
    ResourcesNotAvailableForTheSlice = 14,
    AmfInitiatedAbnormalRelease = 15,
    ReleaseDueToPreEmption = 16,
    PlmnNotServedByTheGnbCu = 17,
    MultipleDrbIdInstances = 18,
    UnknownDrbId = 19,
    MultipleBhRlcChIdInstances = 20,
    UnknownBhRlcChId = 21,
    ChoCpcResourcesToBeChanged = 22,
}

impl CauseRadioNetwork {
    // Root enumeration has 11 values (0-10), extensible
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 10);

    const ALL: [CauseRadioNetwork; 23] = [
        Self::Unspecified,
        Self::RlFailureRlc,
        Self::UnknownOrAlreadyAllocatedGnbCuUeF1apId,
        Self::UnknownOrAlreadyAllocatedGnbDuUeF1apId,
        Self::UnknownOrInconsistentPairOfUeF1apId,
        Self::InteractionWithOtherProcedure,
        Self::NotSupportedQciValue,
        Self::ActionDesirableForRadioReasons,
        Self::NoRadioResourcesAvailable,
        Self::ProcedureCancelled,
        Self::NormalRelease,
        Self::CellNotAvailable,
        Self::RlFailureOthers,
        Self::UeRejection,
        Self::ResourcesNotAvailableForTheSlice,
        Self::AmfInitiatedAbnormalRelease,
        Self::ReleaseDueToPreEmption,
        Self::PlmnNotServedByTheGnbCu,
        Self::MultipleDrbIdInstances,
        Self::UnknownDrbId,
        Self::MultipleBhRlcChIdInstances,
        Self::UnknownBhRlcChId,
        Self::ChoCpcResourcesToBeChanged,
    ];

    pub fn from_value(value: i64) -> Option<Self> {
        usize::try_from(value).ok().and_then(|i| Self::ALL.get(i).copied())
    }
}

impl AperEncode for CauseRadioNetwork {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(*self as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for CauseRadioNetwork {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_enumerated(&Self::CONSTRAINT)?;
        Self::from_value(value).ok_or_else(|| {
            PerError::DecodeError(format!("Unknown CauseRadioNetwork value: {value}"))
        })
    }
}

/// CauseTransport - Transport layer cause values
/// ASN.1: CauseTransport ::= ENUMERATED { unspecified, transport-resource-unavailable, ... }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CauseTransport {
    Unspecified = 0,
    TransportResourceUnavailable = 1,
    // Extension values
    UnknownTnlAddressForIab = 2,
    UnknownUpTnlInformationForIab = 3,
}

impl CauseTransport {
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 1);
}

impl AperEncode for CauseTransport {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(*self as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for CauseTransport {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        match decoder.decode_enumerated(&Self::CONSTRAINT)? {
            0 => Ok(CauseTransport::Unspecified),
            1 => Ok(CauseTransport::TransportResourceUnavailable),
            2 => Ok(CauseTransport::UnknownTnlAddressForIab),
            3 => Ok(CauseTransport::UnknownUpTnlInformationForIab),
            value => Err(PerError::DecodeError(format!(
                "Unknown CauseTransport value: {value}"
            ))),
        }
    }
}

/// CauseProtocol - Protocol cause values
/// ASN.1: CauseProtocol ::= ENUMERATED { transfer-syntax-error, ..., unspecified, ... }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CauseProtocol {
    TransferSyntaxError = 0,
    AbstractSyntaxErrorReject = 1,
    AbstractSyntaxErrorIgnoreAndNotify = 2,
    MessageNotCompatibleWithReceiverState = 3,
    SemanticError = 4,
    AbstractSyntaxErrorFalselyConstructedMessage = 5,
    Unspecified = 6,
}

impl CauseProtocol {
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 6);
}

impl AperEncode for CauseProtocol {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(*self as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for CauseProtocol {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        match decoder.decode_enumerated(&Self::CONSTRAINT)? {
            0 => Ok(CauseProtocol::TransferSyntaxError),
            1 => Ok(CauseProtocol::AbstractSyntaxErrorReject),
            2 => Ok(CauseProtocol::AbstractSyntaxErrorIgnoreAndNotify),
            3 => Ok(CauseProtocol::MessageNotCompatibleWithReceiverState),
            4 => Ok(CauseProtocol::SemanticError),
            5 => Ok(CauseProtocol::AbstractSyntaxErrorFalselyConstructedMessage),
            6 => Ok(CauseProtocol::Unspecified),
            value => Err(PerError::DecodeError(format!(
                "Unknown CauseProtocol value: {value}"
            ))),
        }
    }
}

/// CauseMisc - Miscellaneous cause values
/// ASN.1: CauseMisc ::= ENUMERATED { control-processing-overload, ..., unspecified, ... }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CauseMisc {
    ControlProcessingOverload = 0,
    NotEnoughUserPlaneProcessingResources = 1,
    HardwareFailure = 2,
    OmIntervention = 3,
    Unspecified = 4,
}

impl CauseMisc {
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 4);
}

impl AperEncode for CauseMisc {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(*self as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for CauseMisc {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        match decoder.decode_enumerated(&Self::CONSTRAINT)? {
            0 => Ok(CauseMisc::ControlProcessingOverload),
            1 => Ok(CauseMisc::NotEnoughUserPlaneProcessingResources),
            2 => Ok(CauseMisc::HardwareFailure),
            3 => Ok(CauseMisc::OmIntervention),
            4 => Ok(CauseMisc::Unspecified),
            value => Err(PerError::DecodeError(format!(
                "Unknown CauseMisc value: {value}"
            ))),
        }
    }
}

/// Cause - CHOICE of cause group
/// ASN.1: Cause ::= CHOICE { radioNetwork, transport, protocol, misc, choice-extension }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cause {
    RadioNetwork(CauseRadioNetwork),
    Transport(CauseTransport),
    Protocol(CauseProtocol),
    Misc(CauseMisc),
}

impl Cause {
    // choice-extension is the fifth root alternative
    pub const NUM_ALTERNATIVES: usize = 5;
}

impl AperEncode for Cause {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        match self {
            Cause::RadioNetwork(c) => {
                encoder.encode_choice_index(0, Self::NUM_ALTERNATIVES, false)?;
                c.encode_aper(encoder)
            }
            Cause::Transport(c) => {
                encoder.encode_choice_index(1, Self::NUM_ALTERNATIVES, false)?;
                c.encode_aper(encoder)
            }
            Cause::Protocol(c) => {
                encoder.encode_choice_index(2, Self::NUM_ALTERNATIVES, false)?;
                c.encode_aper(encoder)
            }
            Cause::Misc(c) => {
                encoder.encode_choice_index(3, Self::NUM_ALTERNATIVES, false)?;
                c.encode_aper(encoder)
            }
        }
    }
}

impl AperDecode for Cause {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        match decoder.decode_choice_index(Self::NUM_ALTERNATIVES, false)? {
            0 => Ok(Cause::RadioNetwork(CauseRadioNetwork::decode_aper(decoder)?)),
            1 => Ok(Cause::Transport(CauseTransport::decode_aper(decoder)?)),
            2 => Ok(Cause::Protocol(CauseProtocol::decode_aper(decoder)?)),
            3 => Ok(Cause::Misc(CauseMisc::decode_aper(decoder)?)),
            _ => Err(PerError::UnsupportedExtension),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(cause: Cause) -> Cause {
        let mut encoder = AperEncoder::new();
        cause.encode_aper(&mut encoder).unwrap();
        let bytes = encoder.into_bytes();
        let mut decoder = AperDecoder::new(&bytes);
        Cause::decode_aper(&mut decoder).unwrap()
    }

    #[test]
    fn test_cause_radio_network_wire_value() {
        let mut encoder = AperEncoder::new();
        Cause::RadioNetwork(CauseRadioNetwork::RlFailureRlc)
            .encode_aper(&mut encoder)
            .unwrap();
        // choice index 0 (3 bits), extension bit 0, value 1 (4 bits)
        assert_eq!(encoder.into_bytes().as_ref(), &[0b0000_0001]);
    }

    #[test]
    fn test_cause_groups_roundtrip() {
        for cause in [
            Cause::RadioNetwork(CauseRadioNetwork::NormalRelease),
            Cause::RadioNetwork(CauseRadioNetwork::PlmnNotServedByTheGnbCu),
            Cause::Transport(CauseTransport::TransportResourceUnavailable),
            Cause::Protocol(CauseProtocol::SemanticError),
            Cause::Misc(CauseMisc::OmIntervention),
        ] {
            assert_eq!(roundtrip(cause), cause);
        }
    }

    #[test]
    fn test_choice_extension_rejected() {
        // index 4 = choice-extension
        let mut decoder = AperDecoder::new(&[0b1000_0000]);
        assert_eq!(Cause::decode_aper(&mut decoder), Err(PerError::UnsupportedExtension));
    }
}

//! F1AP PDU Types
//!
//! Top-level PDU structures from F1AP-PDU-Descriptions (3GPP TS 38.473)

use crate::per::{AperDecode, AperDecoder, AperEncode, AperEncoder, PerError, PerResult};
use super::ies::ProtocolIeContainer;
use super::types::{Criticality, ProcedureCode};

/// F1AP-PDU - Top-level PDU for all F1AP messages
/// ASN.1: F1AP-PDU ::= CHOICE { initiatingMessage, successfulOutcome, unsuccessfulOutcome, ... }
#[derive(Debug, Clone, PartialEq)]
pub enum F1apPdu {
    InitiatingMessage(InitiatingMessage),
    SuccessfulOutcome(SuccessfulOutcome),
    UnsuccessfulOutcome(UnsuccessfulOutcome),
}

/// Which of the three PDU alternatives a message travels in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    InitiatingMessage,
    SuccessfulOutcome,
    UnsuccessfulOutcome,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::InitiatingMessage => "InitiatingMessage",
            MessageKind::SuccessfulOutcome => "SuccessfulOutcome",
            MessageKind::UnsuccessfulOutcome => "UnsuccessfulOutcome",
        }
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl F1apPdu {
    pub const NUM_ALTERNATIVES: usize = 3;
    pub const EXTENSIBLE: bool = true;

    pub fn new(
        kind: MessageKind,
        procedure_code: ProcedureCode,
        criticality: Criticality,
        value: ProtocolIeContainer,
    ) -> Self {
        let message = Message {
            procedure_code,
            criticality,
            value,
        };
        match kind {
            MessageKind::InitiatingMessage => F1apPdu::InitiatingMessage(message),
            MessageKind::SuccessfulOutcome => F1apPdu::SuccessfulOutcome(message),
            MessageKind::UnsuccessfulOutcome => F1apPdu::UnsuccessfulOutcome(message),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            F1apPdu::InitiatingMessage(_) => MessageKind::InitiatingMessage,
            F1apPdu::SuccessfulOutcome(_) => MessageKind::SuccessfulOutcome,
            F1apPdu::UnsuccessfulOutcome(_) => MessageKind::UnsuccessfulOutcome,
        }
    }

    pub fn message(&self) -> &Message {
        match self {
            F1apPdu::InitiatingMessage(msg)
            | F1apPdu::SuccessfulOutcome(msg)
            | F1apPdu::UnsuccessfulOutcome(msg) => msg,
        }
    }

    pub fn into_message(self) -> Message {
        match self {
            F1apPdu::InitiatingMessage(msg)
            | F1apPdu::SuccessfulOutcome(msg)
            | F1apPdu::UnsuccessfulOutcome(msg) => msg,
        }
    }

    pub fn procedure_code(&self) -> ProcedureCode {
        self.message().procedure_code
    }
}

impl AperEncode for F1apPdu {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        let index = match self {
            F1apPdu::InitiatingMessage(_) => 0,
            F1apPdu::SuccessfulOutcome(_) => 1,
            F1apPdu::UnsuccessfulOutcome(_) => 2,
        };
        encoder.encode_choice_index(index, Self::NUM_ALTERNATIVES, Self::EXTENSIBLE)?;
        self.message().encode_aper(encoder)
    }
}

impl AperDecode for F1apPdu {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let index = decoder.decode_choice_index(Self::NUM_ALTERNATIVES, Self::EXTENSIBLE)?;
        match index {
            0 => Ok(F1apPdu::InitiatingMessage(Message::decode_aper(decoder)?)),
            1 => Ok(F1apPdu::SuccessfulOutcome(Message::decode_aper(decoder)?)),
            2 => Ok(F1apPdu::UnsuccessfulOutcome(Message::decode_aper(decoder)?)),
            _ => Err(PerError::UnsupportedExtension),
        }
    }
}

/// InitiatingMessage / SuccessfulOutcome / UnsuccessfulOutcome body
/// ASN.1: SEQUENCE { procedureCode, criticality, value }
///
/// Every interface-management message value is
/// `SEQUENCE { protocolIEs ProtocolIE-Container, ... }`, so the value is
/// held as the IE container itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub procedure_code: ProcedureCode,
    pub criticality: Criticality,
    pub value: ProtocolIeContainer,
}

pub type InitiatingMessage = Message;
pub type SuccessfulOutcome = Message;
pub type UnsuccessfulOutcome = Message;

/// Message value wrapper: extensible SEQUENCE holding the IE container
struct MessageValue<'a>(&'a ProtocolIeContainer);

impl AperEncode for MessageValue<'_> {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_sequence_preamble(true, &[]);
        self.0.encode_aper(encoder)
    }
}

impl AperEncode for Message {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        self.procedure_code.encode_aper(encoder)?;
        self.criticality.encode_aper(encoder)?;
        encoder.encode_open_type(&MessageValue(&self.value))
    }
}

impl AperDecode for Message {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let procedure_code = ProcedureCode::decode_aper(decoder)?;
        let criticality = Criticality::decode_aper(decoder)?;

        let value_bytes = decoder.decode_open_type_bytes()?;
        let mut value_decoder = AperDecoder::new(&value_bytes);
        value_decoder.decode_sequence_preamble(true, 0)?;
        let value = ProtocolIeContainer::decode_aper(&mut value_decoder)?;

        Ok(Message {
            procedure_code,
            criticality,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::f1ap::ies::{ProtocolIeField, TransactionId};
    use crate::f1ap::types::ProtocolIeId;

    fn reset_ack() -> F1apPdu {
        let mut tid = AperEncoder::new();
        TransactionId(3).encode_aper(&mut tid).unwrap();
        let mut container = ProtocolIeContainer::new();
        container.push(ProtocolIeField {
            id: ProtocolIeId::TRANSACTION_ID,
            criticality: Criticality::Reject,
            value: tid.into_bytes().to_vec(),
        });
        F1apPdu::new(
            MessageKind::SuccessfulOutcome,
            ProcedureCode::RESET,
            Criticality::Reject,
            container,
        )
    }

    #[test]
    fn test_reset_acknowledge_wire_format() {
        let mut encoder = AperEncoder::new();
        reset_ack().encode_aper(&mut encoder).unwrap();
        let bytes = encoder.into_bytes();
        assert_eq!(
            bytes.as_ref(),
            &[
                0x20, // successfulOutcome
                0x00, // procedureCode 0
                0x00, // criticality reject
                0x09, // open type length
                0x00, // extension bit
                0x00, 0x01, // one IE
                0x00, 0x4E, 0x00, 0x02, 0x00, 0x03, // TransactionID = 3
            ]
        );
    }

    #[test]
    fn test_pdu_roundtrip() {
        let pdu = reset_ack();
        let mut encoder = AperEncoder::new();
        pdu.encode_aper(&mut encoder).unwrap();
        let bytes = encoder.into_bytes();

        let mut decoder = AperDecoder::new(&bytes);
        let decoded = F1apPdu::decode_aper(&mut decoder).unwrap();
        assert_eq!(decoded.kind(), MessageKind::SuccessfulOutcome);
        assert_eq!(decoded.procedure_code(), ProcedureCode::RESET);
        assert_eq!(decoded, pdu);
    }

    #[test]
    fn test_choice_extension_rejected() {
        // extension bit set, first extension alternative
        let mut decoder = AperDecoder::new(&[0x80]);
        assert_eq!(
            F1apPdu::decode_aper(&mut decoder),
            Err(PerError::UnsupportedExtension)
        );
    }
}

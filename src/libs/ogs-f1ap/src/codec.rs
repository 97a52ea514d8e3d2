//! F1AP byte codec seam
//!
//! The procedure layer builds and reads IE trees; turning them into bytes is
//! delegated to a [`PduCodec`]. [`AperCodec`] is the Aligned-PER codec from
//! `ogs-asn1c`.

use bytes::Bytes;
use ogs_asn1c::f1ap::pdu::F1apPdu;
use ogs_asn1c::per::{AperDecode, AperDecoder, AperEncode, AperEncoder};

use crate::error::{F1apError, F1apResult};

pub trait PduCodec: Send + Sync {
    /// Serialize a PDU; a rejected tree is [`F1apError::EncodeFailed`]
    fn encode(&self, pdu: &F1apPdu) -> F1apResult<Bytes>;

    fn decode(&self, data: &[u8]) -> F1apResult<F1apPdu>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AperCodec;

impl PduCodec for AperCodec {
    fn encode(&self, pdu: &F1apPdu) -> F1apResult<Bytes> {
        let mut encoder = AperEncoder::new();
        pdu.encode_aper(&mut encoder)
            .map_err(|e| F1apError::EncodeFailed(e.to_string()))?;
        Ok(encoder.into_bytes())
    }

    fn decode(&self, data: &[u8]) -> F1apResult<F1apPdu> {
        let mut decoder = AperDecoder::new(data);
        Ok(F1apPdu::decode_aper(&mut decoder)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ogs_asn1c::f1ap::{
        Criticality, MessageKind, ProcedureCode, ProtocolIeContainer, ProtocolIeField,
        ProtocolIeId,
    };

    #[test]
    fn test_oversized_value_is_encode_failure() {
        let mut container = ProtocolIeContainer::new();
        container.push(ProtocolIeField {
            id: ProtocolIeId::GNB_DU_SERVED_CELLS_LIST,
            criticality: Criticality::Reject,
            value: vec![0u8; 20_000],
        });
        let pdu = F1apPdu::new(
            MessageKind::InitiatingMessage,
            ProcedureCode::F1_SETUP,
            Criticality::Reject,
            container,
        );
        assert!(matches!(AperCodec.encode(&pdu), Err(F1apError::EncodeFailed(_))));
    }

    #[test]
    fn test_decode_garbage() {
        assert!(matches!(AperCodec.decode(&[]), Err(F1apError::Asn1(_))));
        assert!(AperCodec.decode(&[0x00, 0x01]).is_err());
    }
}

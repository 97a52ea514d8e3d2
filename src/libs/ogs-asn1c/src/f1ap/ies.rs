//! F1AP Information Elements
//!
//! Protocol IE containers and scalar IEs from F1AP-Containers and F1AP-IEs
//! (3GPP TS 38.473)

use crate::per::{AperDecode, AperDecoder, AperEncode, AperEncoder, Constraint, PerError, PerResult};
use super::types::{max, Criticality, ProtocolIeId};

/// ProtocolIE-Field - Single IE with ID, criticality, and value
/// ASN.1: ProtocolIE-Field ::= SEQUENCE { id, criticality, value }
///
/// The same layout is used for ProtocolExtensionField and for the items of
/// ProtocolIE-SingleContainer lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtocolIeField {
    pub id: ProtocolIeId,
    pub criticality: Criticality,
    pub value: Vec<u8>, // Raw APER-encoded value
}

impl AperEncode for ProtocolIeField {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        self.id.encode_aper(encoder)?;
        self.criticality.encode_aper(encoder)?;
        encoder.encode_open_type_bytes(&self.value)
    }
}

impl AperDecode for ProtocolIeField {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let id = ProtocolIeId::decode_aper(decoder)?;
        let criticality = Criticality::decode_aper(decoder)?;
        let value = decoder.decode_open_type_bytes()?;

        Ok(ProtocolIeField {
            id,
            criticality,
            value,
        })
    }
}

/// ProtocolIE-Container - Sequence of IEs
/// ASN.1: ProtocolIE-Container ::= SEQUENCE (SIZE (0..maxProtocolIEs)) OF ProtocolIE-Field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProtocolIeContainer {
    pub ies: Vec<ProtocolIeField>,
}

impl ProtocolIeContainer {
    pub fn new() -> Self {
        Self { ies: Vec::new() }
    }

    pub fn push(&mut self, ie: ProtocolIeField) {
        self.ies.push(ie);
    }

    pub fn len(&self) -> usize {
        self.ies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ies.is_empty()
    }

    /// First IE with the given ID
    pub fn find(&self, id: ProtocolIeId) -> Option<&ProtocolIeField> {
        self.ies.iter().find(|ie| ie.id == id)
    }
}

impl AperEncode for ProtocolIeContainer {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_constrained_length(self.ies.len(), 0, max::PROTOCOL_IES)?;
        for ie in &self.ies {
            ie.encode_aper(encoder)?;
        }
        Ok(())
    }
}

impl AperDecode for ProtocolIeContainer {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let count = decoder.decode_constrained_length(0, max::PROTOCOL_IES)?;
        let ies = (0..count)
            .map(|_| ProtocolIeField::decode_aper(decoder))
            .collect::<PerResult<Vec<_>>>()?;
        Ok(ProtocolIeContainer { ies })
    }
}

/// ProtocolExtensionContainer - iE-Extensions of a SEQUENCE
/// ASN.1: ProtocolExtensionContainer ::= SEQUENCE (SIZE (1..maxProtocolExtensions)) OF ProtocolExtensionField
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProtocolExtensionContainer {
    pub extensions: Vec<ProtocolIeField>,
}

impl ProtocolExtensionContainer {
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl AperEncode for ProtocolExtensionContainer {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_constrained_length(self.extensions.len(), 1, max::PROTOCOL_IES)?;
        for ext in &self.extensions {
            ext.encode_aper(encoder)?;
        }
        Ok(())
    }
}

impl AperDecode for ProtocolExtensionContainer {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let count = decoder.decode_constrained_length(1, max::PROTOCOL_IES)?;
        let extensions = (0..count)
            .map(|_| ProtocolIeField::decode_aper(decoder))
            .collect::<PerResult<Vec<_>>>()?;
        Ok(ProtocolExtensionContainer { extensions })
    }
}

/// TransactionID
/// ASN.1: TransactionID ::= INTEGER (0..255, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransactionId(pub u8);

impl TransactionId {
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 255);
}

impl AperEncode for TransactionId {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_integer(self.0 as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for TransactionId {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_integer(&Self::CONSTRAINT)?;
        u8::try_from(value)
            .map(TransactionId)
            .map_err(|_| PerError::ConstraintViolation {
                value,
                min: 0,
                max: 255,
            })
    }
}

/// GNB-DU-ID
/// ASN.1: GNB-DU-ID ::= INTEGER (0..68719476735)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GnbDuId(pub u64);

impl GnbDuId {
    pub const CONSTRAINT: Constraint = Constraint::new(0, 68_719_476_735);
}

impl AperEncode for GnbDuId {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_constrained_whole_number(self.0 as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for GnbDuId {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_constrained_whole_number(&Self::CONSTRAINT)?;
        Ok(GnbDuId(value as u64))
    }
}

/// NRPCI
/// ASN.1: NRPCI ::= INTEGER (0..1007)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NrPci(pub u16);

impl NrPci {
    pub const CONSTRAINT: Constraint = Constraint::new(0, 1007);
}

impl AperEncode for NrPci {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_constrained_whole_number(self.0 as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for NrPci {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_constrained_whole_number(&Self::CONSTRAINT)?;
        Ok(NrPci(value as u16))
    }
}

/// TimeToWait - Time to wait before retrying
/// ASN.1: TimeToWait ::= ENUMERATED { v1s, v2s, v5s, v10s, v20s, v60s, ... }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimeToWait {
    V1s = 0,
    V2s = 1,
    V5s = 2,
    V10s = 3,
    V20s = 4,
    V60s = 5,
}

impl TimeToWait {
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 5);

    pub fn seconds(&self) -> u32 {
        match self {
            TimeToWait::V1s => 1,
            TimeToWait::V2s => 2,
            TimeToWait::V5s => 5,
            TimeToWait::V10s => 10,
            TimeToWait::V20s => 20,
            TimeToWait::V60s => 60,
        }
    }
}

impl AperEncode for TimeToWait {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(*self as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for TimeToWait {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        match decoder.decode_enumerated(&Self::CONSTRAINT)? {
            0 => Ok(TimeToWait::V1s),
            1 => Ok(TimeToWait::V2s),
            2 => Ok(TimeToWait::V5s),
            3 => Ok(TimeToWait::V10s),
            4 => Ok(TimeToWait::V20s),
            5 => Ok(TimeToWait::V60s),
            value => Err(PerError::DecodeError(format!(
                "Unknown TimeToWait value: {value}"
            ))),
        }
    }
}

/// NRSCS - subcarrier spacing
/// ASN.1: NRSCS ::= ENUMERATED { scs15, scs30, scs60, scs120, ... }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NrScs {
    Scs15 = 0,
    Scs30 = 1,
    Scs60 = 2,
    Scs120 = 3,
}

impl NrScs {
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 3);

    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(NrScs::Scs15),
            1 => Some(NrScs::Scs30),
            2 => Some(NrScs::Scs60),
            3 => Some(NrScs::Scs120),
            _ => None,
        }
    }
}

impl AperEncode for NrScs {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(*self as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for NrScs {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_enumerated(&Self::CONSTRAINT)?;
        NrScs::from_index(value)
            .ok_or_else(|| PerError::DecodeError(format!("Unknown NRSCS value: {value}")))
    }
}

/// NRNRB - index into the transmission bandwidth table
/// ASN.1: NRNRB ::= ENUMERATED { nrb11, nrb18, ..., nrb273, ... }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NrNrbIndex(pub u8);

impl NrNrbIndex {
    /// 29 root values
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 28);
}

impl AperEncode for NrNrbIndex {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(self.0 as i64, &Self::CONSTRAINT)
    }
}

impl AperDecode for NrNrbIndex {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        let value = decoder.decode_enumerated(&Self::CONSTRAINT)?;
        if value > Self::CONSTRAINT.max {
            return Err(PerError::DecodeError(format!("Unknown NRNRB value: {value}")));
        }
        Ok(NrNrbIndex(value as u8))
    }
}

/// ResetAll
/// ASN.1: ResetAll ::= ENUMERATED { reset-all, ... }
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResetAll;

impl ResetAll {
    pub const CONSTRAINT: Constraint = Constraint::extensible(0, 0);
}

impl AperEncode for ResetAll {
    fn encode_aper(&self, encoder: &mut AperEncoder) -> PerResult<()> {
        encoder.encode_enumerated(0, &Self::CONSTRAINT)
    }
}

impl AperDecode for ResetAll {
    fn decode_aper(decoder: &mut AperDecoder) -> PerResult<Self> {
        match decoder.decode_enumerated(&Self::CONSTRAINT)? {
            0 => Ok(ResetAll),
            value => Err(PerError::DecodeError(format!("Unknown ResetAll value: {value}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode<T: AperEncode>(value: &T) -> Vec<u8> {
        let mut encoder = AperEncoder::new();
        value.encode_aper(&mut encoder).unwrap();
        encoder.into_bytes().to_vec()
    }

    #[test]
    fn test_transaction_id_encoding() {
        assert_eq!(encode(&TransactionId(5)), vec![0x00, 0x05]);
        let mut decoder = AperDecoder::new(&[0x00, 0xFF]);
        assert_eq!(TransactionId::decode_aper(&mut decoder).unwrap(), TransactionId(255));
    }

    #[test]
    fn test_ie_field_open_type() {
        let field = ProtocolIeField {
            id: ProtocolIeId::TRANSACTION_ID,
            criticality: Criticality::Reject,
            value: encode(&TransactionId(1)),
        };
        let bytes = encode(&field);
        // id (2 octets), criticality (2 bits, padded), length, value
        assert_eq!(bytes, vec![0x00, 0x4E, 0x00, 0x02, 0x00, 0x01]);

        let mut decoder = AperDecoder::new(&bytes);
        assert_eq!(ProtocolIeField::decode_aper(&mut decoder).unwrap(), field);
    }

    #[test]
    fn test_container_find_first_match() {
        let mut container = ProtocolIeContainer::new();
        for value in [1u8, 2] {
            container.push(ProtocolIeField {
                id: ProtocolIeId::TRANSACTION_ID,
                criticality: Criticality::Reject,
                value: vec![0, value],
            });
        }
        assert_eq!(container.len(), 2);
        assert_eq!(
            container.find(ProtocolIeId::TRANSACTION_ID).map(|f| f.value[1]),
            Some(1)
        );
        assert!(container.find(ProtocolIeId::CAUSE).is_none());
    }

    #[test]
    fn test_extension_container_rejects_empty() {
        let mut encoder = AperEncoder::new();
        assert!(ProtocolExtensionContainer::default()
            .encode_aper(&mut encoder)
            .is_err());
    }

    #[test]
    fn test_gnb_du_id_full_range() {
        for id in [0u64, 1, 0xF_FFFF_FFFF] {
            let bytes = encode(&GnbDuId(id));
            let mut decoder = AperDecoder::new(&bytes);
            assert_eq!(GnbDuId::decode_aper(&mut decoder).unwrap(), GnbDuId(id));
        }
    }

    #[test]
    fn test_nrnrb_extension_value_rejected() {
        // extension bit set, normally small index 0
        let mut decoder = AperDecoder::new(&[0x80]);
        assert!(NrNrbIndex::decode_aper(&mut decoder).is_err());
    }
}

//! Property-Based Tests for the F1AP APER Codec
//!
//! - Encoding round-trip of the scalar F1AP types and IE containers
//! - Error behaviour on truncated or malformed input

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use crate::per::{AperDecode, AperDecoder, AperEncode, AperEncoder, Constraint, PerError};

    fn roundtrip<T: AperEncode + AperDecode>(value: &T) -> T {
        let mut encoder = AperEncoder::new();
        value.encode_aper(&mut encoder).unwrap();
        let bytes = encoder.into_bytes();
        let mut decoder = AperDecoder::new(&bytes);
        T::decode_aper(&mut decoder).unwrap()
    }

    // ========================================================================
    // F1AP Round-Trip
    // ========================================================================

    mod f1ap_roundtrip {
        use super::*;
        use crate::f1ap::cause::*;
        use crate::f1ap::ies::*;
        use crate::f1ap::pdu::*;
        use crate::f1ap::types::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn prop_f1ap_procedure_code_roundtrip(value in 0u8..=255) {
                prop_assert_eq!(roundtrip(&ProcedureCode(value)), ProcedureCode(value));
            }

            #[test]
            fn prop_f1ap_protocol_ie_id_roundtrip(value in 0u16..=65535) {
                prop_assert_eq!(roundtrip(&ProtocolIeId(value)), ProtocolIeId(value));
            }

            #[test]
            fn prop_f1ap_transaction_id_roundtrip(value in any::<u8>()) {
                prop_assert_eq!(roundtrip(&TransactionId(value)), TransactionId(value));
            }

            #[test]
            fn prop_f1ap_gnb_du_id_roundtrip(value in 0u64..=68_719_476_735u64) {
                prop_assert_eq!(roundtrip(&GnbDuId(value)), GnbDuId(value));
            }

            #[test]
            fn prop_f1ap_nr_pci_roundtrip(value in 0u16..=1007) {
                prop_assert_eq!(roundtrip(&NrPci(value)), NrPci(value));
            }

            #[test]
            fn prop_f1ap_nrnrb_roundtrip(value in 0u8..=28) {
                prop_assert_eq!(roundtrip(&NrNrbIndex(value)), NrNrbIndex(value));
            }

            #[test]
            fn prop_f1ap_cause_radio_network_roundtrip(value in 0i64..=22) {
                let cause = Cause::RadioNetwork(CauseRadioNetwork::from_value(value).unwrap());
                prop_assert_eq!(roundtrip(&cause), cause);
            }

            #[test]
            fn prop_f1ap_protocol_ie_field_roundtrip(
                id in 0u16..=65535,
                crit in 0u8..3,
                value in prop::collection::vec(any::<u8>(), 1..300),
            ) {
                let criticality = match crit {
                    0 => Criticality::Reject,
                    1 => Criticality::Ignore,
                    _ => Criticality::Notify,
                };
                let field = ProtocolIeField { id: ProtocolIeId(id), criticality, value };
                prop_assert_eq!(roundtrip(&field), field);
            }

            #[test]
            fn prop_f1ap_pdu_roundtrip(
                kind in 0u8..3,
                code in 0u8..=255,
                num_ies in 0usize..6,
            ) {
                let mut container = ProtocolIeContainer::new();
                for i in 0..num_ies {
                    container.push(ProtocolIeField {
                        id: ProtocolIeId(i as u16),
                        criticality: Criticality::Ignore,
                        value: vec![i as u8; i + 1],
                    });
                }
                let kind = match kind {
                    0 => MessageKind::InitiatingMessage,
                    1 => MessageKind::SuccessfulOutcome,
                    _ => MessageKind::UnsuccessfulOutcome,
                };
                let pdu = F1apPdu::new(kind, ProcedureCode(code), Criticality::Reject, container);
                prop_assert_eq!(roundtrip(&pdu), pdu);
            }
        }
    }

    // ========================================================================
    // Error handling
    // ========================================================================

    mod error_handling {
        use super::*;
        use crate::f1ap::pdu::F1apPdu;
        use crate::f1ap::types::Criticality;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn prop_empty_buffer_error(_seed in any::<u64>()) {
                let mut decoder = AperDecoder::new(&[]);
                match Criticality::decode_aper(&mut decoder) {
                    Err(PerError::BufferUnderflow { .. }) => (),
                    other => prop_assert!(false, "Expected BufferUnderflow, got {:?}", other),
                }
            }

            #[test]
            fn prop_fragmented_length_rejected(first_byte in 0xC0u8..=0xFF) {
                let data = [first_byte, 0x00];
                let mut decoder = AperDecoder::new(&data);
                prop_assert!(decoder.decode_length_determinant().is_err());
            }

            #[test]
            fn prop_truncated_pdu_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
                let mut decoder = AperDecoder::new(&data);
                let _ = F1apPdu::decode_aper(&mut decoder);
            }

            #[test]
            fn prop_out_of_range_rejected(value in 1008i64..100_000) {
                let mut encoder = AperEncoder::new();
                let result = encoder.encode_constrained_whole_number(value, &Constraint::new(0, 1007));
                prop_assert_eq!(
                    result,
                    Err(PerError::ConstraintViolation { value, min: 0, max: 1007 })
                );
            }
        }
    }
}

//! Property-based tests for the F1AP domain value codec and transactions

#[cfg(test)]
mod tests {
    use bitvec::prelude::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    use crate::builder;
    use crate::codec::{AperCodec, PduCodec};
    use crate::ie::*;
    use crate::parser::{decode_f1ap_pdu, F1apMessage};
    use crate::transaction::TransactionCorrelator;
    use crate::types::*;
    use ogs_asn1c::f1ap::ies::NrNrbIndex;
    use ogs_asn1c::f1ap::types::ProcedureCode;

    fn plmn_strategy() -> impl Strategy<Value = PlmnId> {
        prop_oneof![
            (0u16..=999, 0u16..=99).prop_map(|(mcc, mnc)| PlmnId::new(mcc, mnc, 2)),
            (0u16..=999, 0u16..=999).prop_map(|(mcc, mnc)| PlmnId::new(mcc, mnc, 3)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_plmn_roundtrip(plmn in plmn_strategy()) {
            let bytes = plmn_to_bytes(&plmn).unwrap();
            prop_assert_eq!(plmn_from_bytes(&bytes).unwrap(), plmn);
        }

        #[test]
        fn prop_cell_identity_roundtrip(nr_cellid in 0u64..=NR_CELL_IDENTITY_MAX) {
            let bytes = nr_cell_identity_to_bytes(nr_cellid).unwrap();
            prop_assert_eq!(bytes[4] & 0x0F, 0);
            let bits = bytes.view_bits::<Msb0>();
            prop_assert_eq!(
                nr_cell_identity_from_bits(&bits[..NR_CELL_IDENTITY_BITS]),
                nr_cellid
            );
        }

        #[test]
        fn prop_cell_identity_over_36_bits_rejected(nr_cellid in (NR_CELL_IDENTITY_MAX + 1)..) {
            prop_assert!(nr_cell_identity_to_bytes(nr_cellid).is_err());
        }

        #[test]
        fn prop_tac_roundtrip(tac in 0u32..=0xFF_FFFF) {
            prop_assert_eq!(tac_from_bytes(&tac_to_bytes(tac).unwrap()).unwrap(), tac);
        }

        #[test]
        fn prop_nrb_table_bijection(index in 0usize..NRB_TABLE.len()) {
            let nrb = NRB_TABLE[index];
            let encoded = nrb_to_index(nrb, BandwidthPolicy::Strict).unwrap();
            prop_assert_eq!(encoded, NrNrbIndex(index as u8));
            prop_assert_eq!(nrb_from_index(encoded).unwrap(), nrb);
        }

        #[test]
        fn prop_nrb_outside_table(nrb in any::<u16>()) {
            prop_assume!(!NRB_TABLE.contains(&nrb));
            prop_assert!(nrb_to_index(nrb, BandwidthPolicy::Strict).is_err());
            prop_assert_eq!(
                nrb_to_index(nrb, BandwidthPolicy::FallbackToFirst).unwrap(),
                NrNrbIndex(0)
            );
        }

        #[test]
        fn prop_transaction_ids_unique_until_completed(n in 1usize..=256) {
            let correlator = TransactionCorrelator::new();
            let ids: Vec<_> = (0..n)
                .map(|_| correlator.allocate(ProcedureCode::F1_SETUP).unwrap())
                .collect();
            let unique: HashSet<_> = ids.iter().copied().collect();
            prop_assert_eq!(unique.len(), n);

            let first = ids[0];
            correlator.complete(first, ProcedureCode::F1_SETUP).unwrap();
            prop_assert!(!correlator.is_in_flight(first));
            prop_assert_eq!(correlator.in_flight(), n - 1);
        }

        #[test]
        fn prop_setup_request_header_roundtrip(
            transaction_id in any::<u8>(),
            gnb_du_id in 0u64..=NR_CELL_IDENTITY_MAX,
            rrc in any::<[u8; 3]>(),
        ) {
            let request = F1SetupRequest {
                transaction_id,
                gnb_du_id,
                gnb_du_name: None,
                served_cells: vec![],
                rrc_version: RrcVersion(rrc),
                bandwidth_policy: BandwidthPolicy::Strict,
            };
            let pdu = builder::build_f1_setup_request(&request).unwrap();
            let bytes = AperCodec.encode(&pdu).unwrap();
            match decode_f1ap_pdu(&bytes).unwrap() {
                F1apMessage::F1SetupRequest(decoded) => prop_assert_eq!(decoded, request),
                other => prop_assert!(false, "unexpected {:?}", other),
            }
        }
    }
}

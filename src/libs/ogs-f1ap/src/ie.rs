//! F1AP IE Encoding/Decoding Helpers
//!
//! Functions for encoding individual Information Elements into raw APER bytes
//! suitable for ProtocolIeField values, and decoding them back. Also holds the
//! domain sub-encodings the DU owns: TBCD PLMN packing, the 36-bit cell
//! identity, the truncated TAC and the NRB bandwidth table.

use bitvec::prelude::*;
use bytes::Bytes;
use ogs_asn1c::f1ap::ies::{
    self as asn, NrNrbIndex, NrPci, ProtocolExtensionContainer, ProtocolIeContainer,
    ProtocolIeField, ResetAll,
};
use ogs_asn1c::f1ap::types::{max, ProcedureCode, ProtocolIeId};
use ogs_asn1c::per::{AperDecode, AperDecoder, AperEncode, AperEncoder, Constraint, PerError};

use crate::contract::{ie, IeSpec};
use crate::error::{F1apError, F1apResult};
use crate::types::*;

// ============================================================================
// IE Encoding Helpers
// ============================================================================

/// Encode a value to raw APER bytes for use in ProtocolIeField.value
fn encode_ie_value<T: AperEncode>(value: &T) -> F1apResult<Vec<u8>> {
    let mut encoder = AperEncoder::new();
    value.encode_aper(&mut encoder)?;
    Ok(encoder.into_bytes().to_vec())
}

/// Create a ProtocolIeField carrying `value` under the contract of `spec`
fn make_ie_field<T: AperEncode>(spec: &IeSpec, value: &T) -> F1apResult<ProtocolIeField> {
    Ok(ProtocolIeField {
        id: spec.id,
        criticality: spec.criticality,
        value: encode_ie_value(value)?,
    })
}

/// Close an inline encoding into a ProtocolIeField
fn finish_ie_field(spec: &IeSpec, encoder: AperEncoder) -> ProtocolIeField {
    ProtocolIeField {
        id: spec.id,
        criticality: spec.criticality,
        value: encoder.into_bytes().to_vec(),
    }
}

/// Decode a value from raw APER bytes in a ProtocolIeField.value
fn decode_ie_value<T: AperDecode>(raw: &[u8]) -> F1apResult<T> {
    let mut decoder = AperDecoder::new(raw);
    Ok(T::decode_aper(&mut decoder)?)
}

fn invalid(ie_name: &'static str, reason: impl Into<String>) -> F1apError {
    F1apError::InvalidIeValue {
        ie_name,
        reason: reason.into(),
    }
}

/// Read and drop an iE-Extensions container nobody here interprets
fn skip_extensions(decoder: &mut AperDecoder, present: bool) -> F1apResult<()> {
    if present {
        ProtocolExtensionContainer::decode_aper(decoder)?;
    }
    Ok(())
}

/// Encode `items` as SEQUENCE (SIZE (1..max)) OF ProtocolIE-SingleContainer
fn encode_single_container_list<T>(
    encoder: &mut AperEncoder,
    items: &[T],
    max: usize,
    item: &IeSpec,
    mut encode_item: impl FnMut(&mut AperEncoder, &T) -> F1apResult<()>,
) -> F1apResult<()> {
    encoder.encode_constrained_length(items.len(), 1, max)?;
    for value in items {
        let mut inner = AperEncoder::new();
        encode_item(&mut inner, value)?;
        finish_ie_field(item, inner).encode_aper(encoder)?;
    }
    Ok(())
}

fn decode_single_container_list<T>(
    decoder: &mut AperDecoder,
    max: usize,
    item: &IeSpec,
    mut decode_item: impl FnMut(&mut AperDecoder) -> F1apResult<T>,
) -> F1apResult<Vec<T>> {
    let count = decoder.decode_constrained_length(1, max)?;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let field = ProtocolIeField::decode_aper(decoder)?;
        if field.id != item.id {
            return Err(invalid(
                item.name,
                format!("unexpected list item id {}", field.id.0),
            ));
        }
        item.check_criticality(&field)?;
        let mut inner = AperDecoder::new(&field.value);
        out.push(decode_item(&mut inner)?);
    }
    Ok(out)
}

// ============================================================================
// Domain values: PLMN
// ============================================================================

/// Pack a PLMN into the 3-octet TBCD form
pub fn plmn_to_bytes(plmn: &PlmnId) -> F1apResult<[u8; 3]> {
    let mnc_max = match plmn.mnc_digit_length {
        2 => 99,
        3 => 999,
        len => {
            return Err(F1apError::Configuration(format!(
                "MNC digit length {len} for PLMN {plmn}"
            )))
        }
    };
    if plmn.mcc > 999 || plmn.mnc > mnc_max {
        return Err(F1apError::Configuration(format!("PLMN {plmn} out of range")));
    }

    let mcc = [plmn.mcc / 100, (plmn.mcc / 10) % 10, plmn.mcc % 10].map(|d| d as u8);
    let (mnc1, mnc2, mnc3) = if plmn.mnc_digit_length == 3 {
        (plmn.mnc / 100, (plmn.mnc / 10) % 10, plmn.mnc % 10)
    } else {
        (plmn.mnc / 10, plmn.mnc % 10, 0xF)
    };

    Ok([
        (mcc[1] << 4) | mcc[0],
        ((mnc3 as u8) << 4) | mcc[2],
        ((mnc2 as u8) << 4) | mnc1 as u8,
    ])
}

/// Unpack a TBCD PLMN; a filler high nibble in the middle octet means a
/// two-digit MNC
pub fn plmn_from_bytes(bytes: &[u8]) -> F1apResult<PlmnId> {
    let [b0, b1, b2] = <[u8; 3]>::try_from(bytes)
        .map_err(|_| invalid("PLMN-Identity", format!("{} octets", bytes.len())))?;

    let digit = |nibble: u8| -> F1apResult<u16> {
        if nibble > 9 {
            return Err(invalid("PLMN-Identity", format!("non-decimal digit {nibble:#x}")));
        }
        Ok(nibble as u16)
    };

    let mcc = digit(b0 & 0x0F)? * 100 + digit(b0 >> 4)? * 10 + digit(b1 & 0x0F)?;
    let (mnc1, mnc2) = (digit(b2 & 0x0F)?, digit(b2 >> 4)?);
    if b1 >> 4 == 0x0F {
        Ok(PlmnId::new(mcc, mnc1 * 10 + mnc2, 2))
    } else {
        let mnc3 = digit(b1 >> 4)?;
        Ok(PlmnId::new(mcc, mnc1 * 100 + mnc2 * 10 + mnc3, 3))
    }
}

// ============================================================================
// Domain values: NR cell identity, TAC
// ============================================================================

/// NRCellIdentity ::= BIT STRING (SIZE(36))
pub const NR_CELL_IDENTITY_BITS: usize = 36;
pub const NR_CELL_IDENTITY_MAX: u64 = (1 << NR_CELL_IDENTITY_BITS) - 1;

/// Left-justify a 36-bit cell identity into five octets (4 unused bits)
pub fn nr_cell_identity_to_bytes(nr_cellid: u64) -> F1apResult<[u8; 5]> {
    if nr_cellid > NR_CELL_IDENTITY_MAX {
        return Err(F1apError::Configuration(format!(
            "NR cell identity {nr_cellid:#x} exceeds 36 bits"
        )));
    }
    let raw = (nr_cellid << 4).to_be_bytes();
    Ok([raw[3], raw[4], raw[5], raw[6], raw[7]])
}

pub fn nr_cell_identity_from_bits(bits: &BitSlice<u8, Msb0>) -> u64 {
    bits.iter().fold(0u64, |acc, bit| (acc << 1) | (*bit as u64))
}

/// Network-order TAC with the top octet stripped
pub fn tac_to_bytes(tac: u32) -> F1apResult<[u8; 3]> {
    if tac > 0xFF_FFFF {
        return Err(F1apError::Configuration(format!("TAC {tac:#x} exceeds 24 bits")));
    }
    let [_, b1, b2, b3] = tac.to_be_bytes();
    Ok([b1, b2, b3])
}

pub fn tac_from_bytes(bytes: &[u8]) -> F1apResult<u32> {
    let [b1, b2, b3] = <[u8; 3]>::try_from(bytes)
        .map_err(|_| invalid("FiveGS-TAC", format!("{} octets", bytes.len())))?;
    Ok(u32::from_be_bytes([0, b1, b2, b3]))
}

// ============================================================================
// Domain values: bandwidth
// ============================================================================

/// Resource-block counts in NRNRB enumeration order
pub const NRB_TABLE: [u16; 29] = [
    11, 18, 24, 25, 31, 32, 38, 51, 52, 65, 66, 78, 79, 93, 106, 107, 121, 132, 133, 135, 160,
    162, 189, 216, 217, 245, 264, 270, 273,
];

pub fn nrb_to_index(nrb: u16, policy: BandwidthPolicy) -> F1apResult<NrNrbIndex> {
    match NRB_TABLE.iter().position(|&n| n == nrb) {
        Some(index) => Ok(NrNrbIndex(index as u8)),
        None if policy == BandwidthPolicy::FallbackToFirst => {
            log::warn!("NRB {nrb} not in bandwidth table, using nrb{}", NRB_TABLE[0]);
            Ok(NrNrbIndex(0))
        }
        None => Err(F1apError::Configuration(format!(
            "NRB {nrb} not in bandwidth table"
        ))),
    }
}

pub fn nrb_from_index(index: NrNrbIndex) -> F1apResult<u16> {
    NRB_TABLE
        .get(index.0 as usize)
        .copied()
        .ok_or_else(|| invalid("NRNRB", format!("index {}", index.0)))
}

// ============================================================================
// Inline structures
// ============================================================================

/// NRCGI SEQUENCE { nRCellIdentity... }
fn encode_nr_cgi_inline(encoder: &mut AperEncoder, cgi: &NrCgi) -> F1apResult<()> {
    encoder.encode_sequence_preamble(true, &[false]);
    encoder.encode_octet_string(&plmn_to_bytes(&cgi.plmn)?, Some(3), Some(3))?;
    let cell = nr_cell_identity_to_bytes(cgi.nr_cellid)?;
    encoder.encode_bit_string(
        &cell.view_bits::<Msb0>()[..NR_CELL_IDENTITY_BITS],
        Some(NR_CELL_IDENTITY_BITS),
        Some(NR_CELL_IDENTITY_BITS),
    )?;
    Ok(())
}

fn decode_nr_cgi_inline(decoder: &mut AperDecoder) -> F1apResult<NrCgi> {
    let opts = decoder.decode_sequence_preamble(true, 1)?;
    let plmn = plmn_from_bytes(&decoder.decode_octet_string(Some(3), Some(3))?)?;
    let bits = decoder.decode_bit_string(Some(NR_CELL_IDENTITY_BITS), Some(NR_CELL_IDENTITY_BITS))?;
    skip_extensions(decoder, opts[0])?;
    Ok(NrCgi {
        plmn,
        nr_cellid: nr_cell_identity_from_bits(&bits),
    })
}

/// SNSSAI SEQUENCE { sST, sD OPTIONAL, iE-Extensions OPTIONAL }
fn encode_snssai_inline(encoder: &mut AperEncoder, nssai: &Nssai) -> F1apResult<()> {
    let has_sd = nssai.sd != Nssai::NO_SD;
    encoder.encode_sequence_preamble(true, &[has_sd, false]);
    encoder.encode_octet_string(&[nssai.sst], Some(1), Some(1))?;
    if has_sd {
        let [_, sd @ ..] = nssai.sd.to_be_bytes();
        encoder.encode_octet_string(&sd, Some(3), Some(3))?;
    }
    Ok(())
}

fn decode_snssai_inline(decoder: &mut AperDecoder) -> F1apResult<Nssai> {
    let opts = decoder.decode_sequence_preamble(true, 2)?;
    let sst = decoder.decode_octet_string(Some(1), Some(1))?[0];
    let sd = if opts[0] {
        let sd = decoder.decode_octet_string(Some(3), Some(3))?;
        u32::from_be_bytes([0, sd[0], sd[1], sd[2]])
    } else {
        Nssai::NO_SD
    };
    skip_extensions(decoder, opts[1])?;
    Ok(Nssai { sst, sd })
}

/// SliceSupportList, carried in the TAISliceSupportList extension
fn encode_slice_support_list(slices: &[Nssai]) -> F1apResult<Vec<u8>> {
    let mut encoder = AperEncoder::new();
    encoder.encode_constrained_length(slices.len(), 1, max::SLICE_ITEMS)?;
    for nssai in slices {
        // SliceSupportItem SEQUENCE { sNSSAI, iE-Extensions OPTIONAL }
        encoder.encode_sequence_preamble(true, &[false]);
        encode_snssai_inline(&mut encoder, nssai)?;
    }
    Ok(encoder.into_bytes().to_vec())
}

fn decode_slice_support_list(raw: &[u8]) -> F1apResult<Vec<Nssai>> {
    let mut decoder = AperDecoder::new(raw);
    let count = decoder.decode_constrained_length(1, max::SLICE_ITEMS)?;
    (0..count)
        .map(|_| {
            let opts = decoder.decode_sequence_preamble(true, 1)?;
            let nssai = decode_snssai_inline(&mut decoder)?;
            skip_extensions(&mut decoder, opts[0])?;
            Ok(nssai)
        })
        .collect()
}

/// ServedPLMNs-List holding the cell's single PLMN
fn encode_served_plmns_inline(
    encoder: &mut AperEncoder,
    plmn: &PlmnId,
    slices: &[Nssai],
) -> F1apResult<()> {
    encoder.encode_constrained_length(1, 1, max::BPLMNS)?;
    // ServedPLMNs-Item SEQUENCE { pLMN-Identity, iE-Extensions OPTIONAL }
    encoder.encode_sequence_preamble(true, &[!slices.is_empty()]);
    encoder.encode_octet_string(&plmn_to_bytes(plmn)?, Some(3), Some(3))?;
    if !slices.is_empty() {
        let extensions = ProtocolExtensionContainer {
            extensions: vec![ProtocolIeField {
                id: ie::TAI_SLICE_SUPPORT_LIST.id,
                criticality: ie::TAI_SLICE_SUPPORT_LIST.criticality,
                value: encode_slice_support_list(slices)?,
            }],
        };
        extensions.encode_aper(encoder)?;
    }
    Ok(())
}

fn decode_served_plmns_inline(decoder: &mut AperDecoder) -> F1apResult<(PlmnId, Vec<Nssai>)> {
    let count = decoder.decode_constrained_length(1, max::BPLMNS)?;
    if count != 1 {
        return Err(invalid("ServedPLMNs-List", format!("{count} PLMNs, expected 1")));
    }
    let opts = decoder.decode_sequence_preamble(true, 1)?;
    let plmn = plmn_from_bytes(&decoder.decode_octet_string(Some(3), Some(3))?)?;
    let mut slices = Vec::new();
    if opts[0] {
        let container = ProtocolExtensionContainer::decode_aper(decoder)?;
        for ext in &container.extensions {
            if ext.id == ie::TAI_SLICE_SUPPORT_LIST.id {
                slices = decode_slice_support_list(&ext.value)?;
            }
        }
    }
    Ok((plmn, slices))
}

/// NRFreqInfo with a single FreqBandNrItem and no SUL
fn encode_freq_info_inline(encoder: &mut AperEncoder, freq: &FreqInfo) -> F1apResult<()> {
    encoder.encode_sequence_preamble(true, &[false, false]);
    encoder.encode_constrained_whole_number(
        freq.nr_arfcn as i64,
        &Constraint::new(0, max::NR_ARFCN),
    )?;
    encoder.encode_constrained_length(1, 1, max::NR_CELL_BANDS)?;
    // FreqBandNrItem SEQUENCE { freqBandIndicatorNr, supportedSULBandList, iE-Extensions OPTIONAL }
    encoder.encode_sequence_preamble(true, &[false]);
    encoder.encode_integer(freq.band as i64, &Constraint::extensible(1, 1024))?;
    encoder.encode_constrained_length(0, 0, max::NR_CELL_BANDS)?;
    Ok(())
}

fn decode_freq_info_inline(decoder: &mut AperDecoder) -> F1apResult<FreqInfo> {
    let opts = decoder.decode_sequence_preamble(true, 2)?;
    let nr_arfcn = decoder.decode_constrained_whole_number(&Constraint::new(0, max::NR_ARFCN))?;
    if opts[0] {
        return Err(invalid("NRFreqInfo", "sUL-Information not supported"));
    }

    let bands = decoder.decode_constrained_length(1, max::NR_CELL_BANDS)?;
    if bands != 1 {
        return Err(invalid("freqBandListNr", format!("{bands} bands, expected 1")));
    }
    let band_opts = decoder.decode_sequence_preamble(true, 1)?;
    let band = decoder.decode_integer(&Constraint::extensible(1, 1024))?;
    let band = u16::try_from(band).map_err(|_| invalid("freqBandIndicatorNr", band.to_string()))?;
    // SupportedSULFreqBandItem entries are read and dropped
    let sul_bands = decoder.decode_constrained_length(0, max::NR_CELL_BANDS)?;
    for _ in 0..sul_bands {
        let sul_opts = decoder.decode_sequence_preamble(true, 1)?;
        decoder.decode_integer(&Constraint::extensible(1, 1024))?;
        skip_extensions(decoder, sul_opts[0])?;
    }
    skip_extensions(decoder, band_opts[0])?;
    skip_extensions(decoder, opts[1])?;

    Ok(FreqInfo {
        nr_arfcn: nr_arfcn as u32,
        band,
    })
}

/// Transmission-Bandwidth SEQUENCE { nRSCS, nRNRB, iE-Extensions OPTIONAL }
fn encode_bandwidth_inline(
    encoder: &mut AperEncoder,
    bandwidth: &TransmissionBandwidth,
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    let nrb = nrb_to_index(bandwidth.nrb, policy)?;
    encoder.encode_sequence_preamble(true, &[false]);
    bandwidth.scs.encode_aper(encoder)?;
    nrb.encode_aper(encoder)?;
    Ok(())
}

fn decode_bandwidth_inline(decoder: &mut AperDecoder) -> F1apResult<TransmissionBandwidth> {
    let opts = decoder.decode_sequence_preamble(true, 1)?;
    let scs = NrScs::decode_aper(decoder)?;
    let nrb = nrb_from_index(NrNrbIndex::decode_aper(decoder)?)?;
    skip_extensions(decoder, opts[0])?;
    Ok(TransmissionBandwidth { scs, nrb })
}

/// NR-Mode-Info CHOICE { fDD, tDD, choice-extension }
fn encode_mode_info_inline(
    encoder: &mut AperEncoder,
    mode: &NrModeInfo,
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    match mode {
        NrModeInfo::Fdd {
            ul_freq,
            dl_freq,
            ul_bandwidth,
            dl_bandwidth,
        } => {
            encoder.encode_choice_index(0, 3, false)?;
            encoder.encode_sequence_preamble(true, &[false]);
            encode_freq_info_inline(encoder, ul_freq)?;
            encode_freq_info_inline(encoder, dl_freq)?;
            encode_bandwidth_inline(encoder, ul_bandwidth, policy)?;
            encode_bandwidth_inline(encoder, dl_bandwidth, policy)?;
        }
        NrModeInfo::Tdd { freq, bandwidth } => {
            encoder.encode_choice_index(1, 3, false)?;
            encoder.encode_sequence_preamble(true, &[false]);
            encode_freq_info_inline(encoder, freq)?;
            encode_bandwidth_inline(encoder, bandwidth, policy)?;
        }
    }
    Ok(())
}

fn decode_mode_info_inline(decoder: &mut AperDecoder) -> F1apResult<NrModeInfo> {
    match decoder.decode_choice_index(3, false)? {
        0 => {
            let opts = decoder.decode_sequence_preamble(true, 1)?;
            let ul_freq = decode_freq_info_inline(decoder)?;
            let dl_freq = decode_freq_info_inline(decoder)?;
            let ul_bandwidth = decode_bandwidth_inline(decoder)?;
            let dl_bandwidth = decode_bandwidth_inline(decoder)?;
            skip_extensions(decoder, opts[0])?;
            Ok(NrModeInfo::Fdd {
                ul_freq,
                dl_freq,
                ul_bandwidth,
                dl_bandwidth,
            })
        }
        1 => {
            let opts = decoder.decode_sequence_preamble(true, 1)?;
            let freq = decode_freq_info_inline(decoder)?;
            let bandwidth = decode_bandwidth_inline(decoder)?;
            skip_extensions(decoder, opts[0])?;
            Ok(NrModeInfo::Tdd { freq, bandwidth })
        }
        _ => Err(PerError::UnsupportedExtension.into()),
    }
}

/// Served-Cell-Information
fn encode_served_cell_info_inline(
    encoder: &mut AperEncoder,
    info: &ServedCellInfo,
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    // fiveGS-TAC, configured-EPS-TAC, iE-Extensions
    encoder.encode_sequence_preamble(true, &[info.tac.is_some(), false, false]);
    encode_nr_cgi_inline(encoder, &info.nr_cgi)?;
    NrPci(info.nr_pci).encode_aper(encoder)?;
    if let Some(tac) = info.tac {
        encoder.encode_octet_string(&tac_to_bytes(tac)?, Some(3), Some(3))?;
    }
    encode_served_plmns_inline(encoder, &info.nr_cgi.plmn, &info.slices)?;
    encode_mode_info_inline(encoder, &info.mode, policy)?;
    encoder.encode_octet_string(&info.measurement_timing_config, None, None)?;
    Ok(())
}

fn decode_served_cell_info_inline(decoder: &mut AperDecoder) -> F1apResult<ServedCellInfo> {
    let opts = decoder.decode_sequence_preamble(true, 3)?;
    let nr_cgi = decode_nr_cgi_inline(decoder)?;
    let nr_pci = NrPci::decode_aper(decoder)?.0;
    let tac = if opts[0] {
        Some(tac_from_bytes(&decoder.decode_octet_string(Some(3), Some(3))?)?)
    } else {
        None
    };
    if opts[1] {
        // configured-EPS-TAC
        decoder.decode_octet_string(Some(2), Some(2))?;
    }
    let (served_plmn, slices) = decode_served_plmns_inline(decoder)?;
    if served_plmn != nr_cgi.plmn {
        log::debug!("Served PLMN {served_plmn} differs from NRCGI PLMN {}", nr_cgi.plmn);
    }
    let mode = decode_mode_info_inline(decoder)?;
    let measurement_timing_config = Bytes::from(decoder.decode_octet_string(None, None)?);
    skip_extensions(decoder, opts[2])?;

    Ok(ServedCellInfo {
        nr_cgi,
        nr_pci,
        tac,
        slices,
        mode,
        measurement_timing_config,
    })
}

/// GNB-DU-System-Information SEQUENCE { mIB-message, sIB1-message, iE-Extensions OPTIONAL }
fn encode_du_system_information_inline(
    encoder: &mut AperEncoder,
    si: &SystemInformation,
) -> F1apResult<()> {
    if si.mib.is_empty() || si.sib1.is_empty() {
        return Err(F1apError::Configuration(
            "gNB-DU system information needs both MIB and SIB1".to_string(),
        ));
    }
    encoder.encode_sequence_preamble(true, &[false]);
    encoder.encode_octet_string(&si.mib, None, None)?;
    encoder.encode_octet_string(&si.sib1, None, None)?;
    Ok(())
}

fn decode_du_system_information_inline(decoder: &mut AperDecoder) -> F1apResult<SystemInformation> {
    let opts = decoder.decode_sequence_preamble(true, 1)?;
    let mib = Bytes::from(decoder.decode_octet_string(None, None)?);
    let sib1 = Bytes::from(decoder.decode_octet_string(None, None)?);
    skip_extensions(decoder, opts[0])?;
    if mib.is_empty() || sib1.is_empty() {
        return Err(invalid("GNB-DU-System-Information", "empty MIB or SIB1"));
    }
    Ok(SystemInformation { mib, sib1 })
}

/// GNB-DU-Served-Cells-Item and Served-Cells-To-Add-Item
fn encode_served_cell_item(
    encoder: &mut AperEncoder,
    cell: &ServedCell,
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    encoder.encode_sequence_preamble(true, &[cell.system_information.is_some(), false]);
    encode_served_cell_info_inline(encoder, &cell.info, policy)?;
    if let Some(si) = &cell.system_information {
        encode_du_system_information_inline(encoder, si)?;
    }
    Ok(())
}

fn decode_served_cell_item(decoder: &mut AperDecoder) -> F1apResult<ServedCell> {
    let opts = decoder.decode_sequence_preamble(true, 2)?;
    let info = decode_served_cell_info_inline(decoder)?;
    let system_information = if opts[0] {
        Some(decode_du_system_information_inline(decoder)?)
    } else {
        None
    };
    skip_extensions(decoder, opts[1])?;
    Ok(ServedCell {
        info,
        system_information,
    })
}

// ============================================================================
// TransactionID IE
// ============================================================================

pub fn encode_transaction_id(
    container: &mut ProtocolIeContainer,
    id: TransactionId,
) -> F1apResult<()> {
    container.push(make_ie_field(&ie::TRANSACTION_ID, &asn::TransactionId(id))?);
    Ok(())
}

pub fn decode_transaction_id(field: &ProtocolIeField) -> F1apResult<TransactionId> {
    let id: asn::TransactionId = decode_ie_value(&field.value)?;
    Ok(id.0)
}

// ============================================================================
// Cause IE
// ============================================================================

pub fn encode_cause(container: &mut ProtocolIeContainer, cause: &Cause) -> F1apResult<()> {
    container.push(make_ie_field(&ie::CAUSE, cause)?);
    Ok(())
}

pub fn decode_cause(field: &ProtocolIeField) -> F1apResult<Cause> {
    decode_ie_value(&field.value)
}

// ============================================================================
// TimeToWait IE
// ============================================================================

pub fn encode_time_to_wait(container: &mut ProtocolIeContainer, ttw: TimeToWait) -> F1apResult<()> {
    container.push(make_ie_field(&ie::TIME_TO_WAIT, &ttw)?);
    Ok(())
}

pub fn decode_time_to_wait(field: &ProtocolIeField) -> F1apResult<TimeToWait> {
    decode_ie_value(&field.value)
}

// ============================================================================
// gNB-DU-ID IE
// ============================================================================

pub fn encode_gnb_du_id(container: &mut ProtocolIeContainer, id: u64) -> F1apResult<()> {
    if id > asn::GnbDuId::CONSTRAINT.max as u64 {
        return Err(F1apError::Configuration(format!("gNB-DU-ID {id} exceeds 36 bits")));
    }
    container.push(make_ie_field(&ie::GNB_DU_ID, &asn::GnbDuId(id))?);
    Ok(())
}

pub fn decode_gnb_du_id(field: &ProtocolIeField) -> F1apResult<u64> {
    let id: asn::GnbDuId = decode_ie_value(&field.value)?;
    Ok(id.0)
}

// ============================================================================
// gNB-DU-Name / gNB-CU-Name IEs
// PrintableString (SIZE(1..150, ...))
// ============================================================================

pub(crate) const NAME_MAX_LEN: usize = 150;

pub(crate) fn is_printable(c: char) -> bool {
    c.is_ascii_alphanumeric() || " '()+,-./:=?".contains(c)
}

fn encode_name(container: &mut ProtocolIeContainer, spec: &IeSpec, name: &str) -> F1apResult<()> {
    if name.is_empty() || name.len() > NAME_MAX_LEN || !name.chars().all(is_printable) {
        return Err(F1apError::Configuration(format!(
            "{} {name:?} is not a PrintableString of 1..{NAME_MAX_LEN} characters",
            spec.name
        )));
    }
    let mut encoder = AperEncoder::new();
    encoder.write_bit(false);
    encoder.encode_octet_string(name.as_bytes(), Some(1), Some(NAME_MAX_LEN))?;
    container.push(finish_ie_field(spec, encoder));
    Ok(())
}

fn decode_name(field: &ProtocolIeField, ie_name: &'static str) -> F1apResult<String> {
    let mut decoder = AperDecoder::new(&field.value);
    if decoder.read_bit()? {
        return Err(PerError::UnsupportedExtension.into());
    }
    let bytes = decoder.decode_octet_string(Some(1), Some(NAME_MAX_LEN))?;
    let name = String::from_utf8(bytes).map_err(|e| invalid(ie_name, e.to_string()))?;
    if !name.chars().all(is_printable) {
        return Err(invalid(ie_name, "not a PrintableString"));
    }
    Ok(name)
}

pub fn encode_gnb_du_name(container: &mut ProtocolIeContainer, name: &str) -> F1apResult<()> {
    encode_name(container, &ie::GNB_DU_NAME, name)
}

pub fn decode_gnb_du_name(field: &ProtocolIeField) -> F1apResult<String> {
    decode_name(field, ie::GNB_DU_NAME.name)
}

pub fn encode_gnb_cu_name(container: &mut ProtocolIeContainer, name: &str) -> F1apResult<()> {
    encode_name(container, &ie::GNB_CU_NAME, name)
}

pub fn decode_gnb_cu_name(field: &ProtocolIeField) -> F1apResult<String> {
    decode_name(field, ie::GNB_CU_NAME.name)
}

// ============================================================================
// RRC-Version IEs
// ============================================================================

fn encode_rrc_version(
    container: &mut ProtocolIeContainer,
    spec: &IeSpec,
    version: &RrcVersion,
) -> F1apResult<()> {
    let mut enhanced = AperEncoder::new();
    enhanced.encode_octet_string(&version.0, Some(3), Some(3))?;

    let mut encoder = AperEncoder::new();
    encoder.encode_sequence_preamble(true, &[true]);
    let bitmap: BitVec<u8, Msb0> = version.latest_bitmap().into_iter().collect();
    encoder.encode_bit_string(&bitmap, Some(3), Some(3))?;
    ProtocolExtensionContainer {
        extensions: vec![finish_ie_field(&ie::LATEST_RRC_VERSION_ENHANCED, enhanced)],
    }
    .encode_aper(&mut encoder)?;

    container.push(finish_ie_field(spec, encoder));
    Ok(())
}

/// The enhanced triple when present, otherwise all zero
fn decode_rrc_version(field: &ProtocolIeField) -> F1apResult<RrcVersion> {
    let mut decoder = AperDecoder::new(&field.value);
    let opts = decoder.decode_sequence_preamble(true, 1)?;
    decoder.decode_bit_string(Some(3), Some(3))?;

    let mut version = RrcVersion::default();
    if opts[0] {
        let container = ProtocolExtensionContainer::decode_aper(&mut decoder)?;
        if let Some(ext) = container
            .extensions
            .iter()
            .find(|ext| ext.id == ie::LATEST_RRC_VERSION_ENHANCED.id)
        {
            let mut inner = AperDecoder::new(&ext.value);
            let raw = inner.decode_octet_string(Some(3), Some(3))?;
            version.0.copy_from_slice(&raw);
        }
    }
    Ok(version)
}

pub fn encode_gnb_du_rrc_version(
    container: &mut ProtocolIeContainer,
    version: &RrcVersion,
) -> F1apResult<()> {
    encode_rrc_version(container, &ie::GNB_DU_RRC_VERSION, version)
}

pub fn decode_gnb_du_rrc_version(field: &ProtocolIeField) -> F1apResult<RrcVersion> {
    decode_rrc_version(field)
}

pub fn encode_gnb_cu_rrc_version(
    container: &mut ProtocolIeContainer,
    version: &RrcVersion,
) -> F1apResult<()> {
    encode_rrc_version(container, &ie::GNB_CU_RRC_VERSION, version)
}

pub fn decode_gnb_cu_rrc_version(field: &ProtocolIeField) -> F1apResult<RrcVersion> {
    decode_rrc_version(field)
}

// ============================================================================
// ResetType IE
// ============================================================================

pub fn encode_reset_type(
    container: &mut ProtocolIeContainer,
    scope: &ResetScope,
) -> F1apResult<()> {
    let mut encoder = AperEncoder::new();
    match scope {
        ResetScope::F1Interface => {
            encoder.encode_choice_index(0, 3, false)?;
            ResetAll.encode_aper(&mut encoder)?;
        }
        ResetScope::PartOfF1Interface(connections) => {
            encoder.encode_choice_index(1, 3, false)?;
            let id_constraint = Constraint::new(0, u32::MAX as i64);
            encode_single_container_list(
                &mut encoder,
                connections,
                max::INDIVIDUAL_F1_CONNECTIONS_TO_RESET,
                &ie::UE_ASSOCIATED_LOGICAL_F1_CONNECTION_ITEM,
                |enc, conn| {
                    enc.encode_sequence_preamble(
                        true,
                        &[
                            conn.gnb_cu_ue_f1ap_id.is_some(),
                            conn.gnb_du_ue_f1ap_id.is_some(),
                            false,
                        ],
                    );
                    for id in [conn.gnb_cu_ue_f1ap_id, conn.gnb_du_ue_f1ap_id]
                        .into_iter()
                        .flatten()
                    {
                        enc.encode_constrained_whole_number(id as i64, &id_constraint)?;
                    }
                    Ok(())
                },
            )?;
        }
    }
    container.push(finish_ie_field(&ie::RESET_TYPE, encoder));
    Ok(())
}

pub fn decode_reset_type(field: &ProtocolIeField) -> F1apResult<ResetScope> {
    let mut decoder = AperDecoder::new(&field.value);
    match decoder.decode_choice_index(3, false)? {
        0 => {
            ResetAll::decode_aper(&mut decoder)?;
            Ok(ResetScope::F1Interface)
        }
        1 => {
            let id_constraint = Constraint::new(0, u32::MAX as i64);
            let connections = decode_single_container_list(
                &mut decoder,
                max::INDIVIDUAL_F1_CONNECTIONS_TO_RESET,
                &ie::UE_ASSOCIATED_LOGICAL_F1_CONNECTION_ITEM,
                |dec| {
                    let opts = dec.decode_sequence_preamble(true, 3)?;
                    let mut read_id = |present: bool| -> F1apResult<Option<u32>> {
                        if !present {
                            return Ok(None);
                        }
                        Ok(Some(dec.decode_constrained_whole_number(&id_constraint)? as u32))
                    };
                    let gnb_cu_ue_f1ap_id = read_id(opts[0])?;
                    let gnb_du_ue_f1ap_id = read_id(opts[1])?;
                    skip_extensions(dec, opts[2])?;
                    Ok(UeAssociatedConnection {
                        gnb_cu_ue_f1ap_id,
                        gnb_du_ue_f1ap_id,
                    })
                },
            )?;
            Ok(ResetScope::PartOfF1Interface(connections))
        }
        _ => Err(PerError::UnsupportedExtension.into()),
    }
}

// ============================================================================
// gNB-DU-Served-Cells-List / Served-Cells-To-Add/Modify/Delete-List IEs
// ============================================================================

pub fn encode_served_cells_list(
    container: &mut ProtocolIeContainer,
    cells: &[ServedCell],
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    encode_served_cells(
        container,
        &ie::GNB_DU_SERVED_CELLS_LIST,
        &ie::GNB_DU_SERVED_CELLS_ITEM,
        cells,
        policy,
    )
}

pub fn decode_served_cells_list(field: &ProtocolIeField) -> F1apResult<Vec<ServedCell>> {
    decode_served_cells(field, &ie::GNB_DU_SERVED_CELLS_ITEM)
}

pub fn encode_served_cells_to_add_list(
    container: &mut ProtocolIeContainer,
    cells: &[ServedCell],
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    encode_served_cells(
        container,
        &ie::SERVED_CELLS_TO_ADD_LIST,
        &ie::SERVED_CELLS_TO_ADD_ITEM,
        cells,
        policy,
    )
}

pub fn decode_served_cells_to_add_list(field: &ProtocolIeField) -> F1apResult<Vec<ServedCell>> {
    decode_served_cells(field, &ie::SERVED_CELLS_TO_ADD_ITEM)
}

fn encode_served_cells(
    container: &mut ProtocolIeContainer,
    list: &IeSpec,
    item: &IeSpec,
    cells: &[ServedCell],
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    let mut encoder = AperEncoder::new();
    encode_single_container_list(&mut encoder, cells, max::CELLS_IN_GNB_DU, item, |enc, cell| {
        encode_served_cell_item(enc, cell, policy)
    })?;
    container.push(finish_ie_field(list, encoder));
    Ok(())
}

fn decode_served_cells(field: &ProtocolIeField, item: &IeSpec) -> F1apResult<Vec<ServedCell>> {
    let mut decoder = AperDecoder::new(&field.value);
    decode_single_container_list(&mut decoder, max::CELLS_IN_GNB_DU, item, decode_served_cell_item)
}

pub fn encode_served_cells_to_modify_list(
    container: &mut ProtocolIeContainer,
    cells: &[ModifiedCell],
    policy: BandwidthPolicy,
) -> F1apResult<()> {
    let mut encoder = AperEncoder::new();
    encode_single_container_list(
        &mut encoder,
        cells,
        max::CELLS_IN_GNB_DU,
        &ie::SERVED_CELLS_TO_MODIFY_ITEM,
        |enc, modified| {
            // Served-Cells-To-Modify-Item { oldNRCGI, served-Cell-Information,
            //   gNB-DU-System-Information OPTIONAL, iE-Extensions OPTIONAL }
            let si = &modified.cell.system_information;
            enc.encode_sequence_preamble(true, &[si.is_some(), false]);
            encode_nr_cgi_inline(enc, &modified.old_nr_cgi)?;
            encode_served_cell_info_inline(enc, &modified.cell.info, policy)?;
            if let Some(si) = si {
                encode_du_system_information_inline(enc, si)?;
            }
            Ok(())
        },
    )?;
    container.push(finish_ie_field(&ie::SERVED_CELLS_TO_MODIFY_LIST, encoder));
    Ok(())
}

pub fn decode_served_cells_to_modify_list(
    field: &ProtocolIeField,
) -> F1apResult<Vec<ModifiedCell>> {
    let mut decoder = AperDecoder::new(&field.value);
    decode_single_container_list(
        &mut decoder,
        max::CELLS_IN_GNB_DU,
        &ie::SERVED_CELLS_TO_MODIFY_ITEM,
        |dec| {
            let opts = dec.decode_sequence_preamble(true, 2)?;
            let old_nr_cgi = decode_nr_cgi_inline(dec)?;
            let info = decode_served_cell_info_inline(dec)?;
            let system_information = if opts[0] {
                Some(decode_du_system_information_inline(dec)?)
            } else {
                None
            };
            skip_extensions(dec, opts[1])?;
            Ok(ModifiedCell {
                old_nr_cgi,
                cell: ServedCell {
                    info,
                    system_information,
                },
            })
        },
    )
}

pub fn encode_served_cells_to_delete_list(
    container: &mut ProtocolIeContainer,
    cells: &[NrCgi],
) -> F1apResult<()> {
    let mut encoder = AperEncoder::new();
    encode_single_container_list(
        &mut encoder,
        cells,
        max::CELLS_IN_GNB_DU,
        &ie::SERVED_CELLS_TO_DELETE_ITEM,
        |enc, cgi| {
            enc.encode_sequence_preamble(true, &[false]);
            encode_nr_cgi_inline(enc, cgi)
        },
    )?;
    container.push(finish_ie_field(&ie::SERVED_CELLS_TO_DELETE_LIST, encoder));
    Ok(())
}

pub fn decode_served_cells_to_delete_list(field: &ProtocolIeField) -> F1apResult<Vec<NrCgi>> {
    let mut decoder = AperDecoder::new(&field.value);
    decode_single_container_list(
        &mut decoder,
        max::CELLS_IN_GNB_DU,
        &ie::SERVED_CELLS_TO_DELETE_ITEM,
        |dec| {
            let opts = dec.decode_sequence_preamble(true, 1)?;
            let cgi = decode_nr_cgi_inline(dec)?;
            skip_extensions(dec, opts[0])?;
            Ok(cgi)
        },
    )
}

// ============================================================================
// Cells-to-be-Activated-List IE
// ============================================================================

const SIB_TYPE: Constraint = Constraint::extensible(2, 32);
const VALUE_TAG: Constraint = Constraint::extensible(0, 31);

/// GNB-CUSystemInformation SEQUENCE { sibtypetobeupdatedlist, iE-Extensions OPTIONAL }
fn encode_cu_system_information(sibs: &[SibMessage]) -> F1apResult<Vec<u8>> {
    let mut encoder = AperEncoder::new();
    encoder.encode_sequence_preamble(true, &[false]);
    encoder.encode_constrained_length(sibs.len(), 1, max::SIB_TYPES)?;
    for sib in sibs {
        encoder.encode_sequence_preamble(true, &[false]);
        encoder.encode_integer(sib.sib_type as i64, &SIB_TYPE)?;
        encoder.encode_octet_string(&sib.message, None, None)?;
        encoder.encode_integer(sib.value_tag as i64, &VALUE_TAG)?;
    }
    Ok(encoder.into_bytes().to_vec())
}

fn decode_cu_system_information(raw: &[u8]) -> F1apResult<Vec<SibMessage>> {
    let mut decoder = AperDecoder::new(raw);
    let opts = decoder.decode_sequence_preamble(true, 1)?;
    let count = decoder.decode_constrained_length(1, max::SIB_TYPES)?;
    let mut sibs = Vec::with_capacity(count);
    for _ in 0..count {
        let item_opts = decoder.decode_sequence_preamble(true, 1)?;
        let sib_type = decoder.decode_integer(&SIB_TYPE)?;
        let message = Bytes::from(decoder.decode_octet_string(None, None)?);
        let value_tag = decoder.decode_integer(&VALUE_TAG)?;
        skip_extensions(&mut decoder, item_opts[0])?;
        if !SIB_TYPE.contains(sib_type) || !VALUE_TAG.contains(value_tag) {
            return Err(invalid(
                ie::GNB_CU_SYSTEM_INFORMATION.name,
                format!("sIBtype {sib_type} valueTag {value_tag}"),
            ));
        }
        sibs.push(SibMessage {
            sib_type: sib_type as u8,
            message,
            value_tag: value_tag as u8,
        });
    }
    skip_extensions(&mut decoder, opts[0])?;
    Ok(sibs)
}

pub fn encode_cells_to_activate_list(
    container: &mut ProtocolIeContainer,
    cells: &[CellToActivate],
) -> F1apResult<()> {
    let mut encoder = AperEncoder::new();
    encode_single_container_list(
        &mut encoder,
        cells,
        max::CELLS_IN_GNB_DU,
        &ie::CELLS_TO_BE_ACTIVATED_ITEM,
        |enc, cell| {
            let has_si = !cell.system_information.is_empty();
            enc.encode_sequence_preamble(true, &[cell.nr_pci.is_some(), has_si]);
            encode_nr_cgi_inline(enc, &cell.nr_cgi)?;
            if let Some(pci) = cell.nr_pci {
                NrPci(pci).encode_aper(enc)?;
            }
            if has_si {
                ProtocolExtensionContainer {
                    extensions: vec![ProtocolIeField {
                        id: ie::GNB_CU_SYSTEM_INFORMATION.id,
                        criticality: ie::GNB_CU_SYSTEM_INFORMATION.criticality,
                        value: encode_cu_system_information(&cell.system_information)?,
                    }],
                }
                .encode_aper(enc)?;
            }
            Ok(())
        },
    )?;
    container.push(finish_ie_field(&ie::CELLS_TO_BE_ACTIVATED_LIST, encoder));
    Ok(())
}

/// Per-cell decode shared by F1 Setup Response and gNB-CU Configuration
/// Update; `procedure` names the message in errors.
///
/// At most one gNB-CUSystemInformation extension per cell; any other cell
/// extension aborts the decode.
pub fn decode_cells_to_activate_list(
    field: &ProtocolIeField,
    procedure: ProcedureCode,
) -> F1apResult<Vec<CellToActivate>> {
    let mut decoder = AperDecoder::new(&field.value);
    decode_single_container_list(
        &mut decoder,
        max::CELLS_IN_GNB_DU,
        &ie::CELLS_TO_BE_ACTIVATED_ITEM,
        |dec| {
            let opts = dec.decode_sequence_preamble(true, 2)?;
            let nr_cgi = decode_nr_cgi_inline(dec)?;
            let nr_pci = if opts[0] {
                Some(NrPci::decode_aper(dec)?.0)
            } else {
                None
            };

            let mut system_information = None;
            if opts[1] {
                let container = ProtocolExtensionContainer::decode_aper(dec)?;
                for ext in &container.extensions {
                    match ext.id {
                        ProtocolIeId::GNB_CU_SYSTEM_INFORMATION => {
                            if system_information.is_some() {
                                return Err(F1apError::DuplicateCellExtension {
                                    ie_name: ie::GNB_CU_SYSTEM_INFORMATION.name,
                                });
                            }
                            ie::GNB_CU_SYSTEM_INFORMATION.check_criticality(ext)?;
                            system_information = Some(decode_cu_system_information(&ext.value)?);
                        }
                        ProtocolIeId::AVAILABLE_PLMN_LIST
                        | ProtocolIeId::EXTENDED_AVAILABLE_PLMN_LIST
                        | ProtocolIeId::IAB_INFO_IAB_DONOR_CU
                        | ProtocolIeId::AVAILABLE_SNPN_ID_LIST => {
                            log::warn!(
                                "[{}] Cell {} extension id={} not handled",
                                procedure.name(),
                                nr_cgi.plmn,
                                ext.id.0
                            );
                            return Err(F1apError::UnsupportedIe {
                                procedure: procedure.name(),
                                ie_id: ext.id.0,
                            });
                        }
                        other => {
                            return Err(F1apError::UnsupportedIe {
                                procedure: procedure.name(),
                                ie_id: other.0,
                            })
                        }
                    }
                }
            }

            Ok(CellToActivate {
                nr_cgi,
                nr_pci,
                system_information: system_information.unwrap_or_default(),
            })
        },
    )
}

// ============================================================================
// Cells-Failed-to-be-Activated-List IE
// ============================================================================

pub fn encode_cells_failed_to_activate_list(
    container: &mut ProtocolIeContainer,
    cells: &[FailedCell],
) -> F1apResult<()> {
    let mut encoder = AperEncoder::new();
    encode_single_container_list(
        &mut encoder,
        cells,
        max::CELLS_IN_GNB_DU,
        &ie::CELLS_FAILED_TO_BE_ACTIVATED_ITEM,
        |enc, failed| {
            enc.encode_sequence_preamble(true, &[false]);
            encode_nr_cgi_inline(enc, &failed.nr_cgi)?;
            failed.cause.encode_aper(enc)?;
            Ok(())
        },
    )?;
    container.push(finish_ie_field(&ie::CELLS_FAILED_TO_BE_ACTIVATED_LIST, encoder));
    Ok(())
}

pub fn decode_cells_failed_to_activate_list(
    field: &ProtocolIeField,
) -> F1apResult<Vec<FailedCell>> {
    let mut decoder = AperDecoder::new(&field.value);
    decode_single_container_list(
        &mut decoder,
        max::CELLS_IN_GNB_DU,
        &ie::CELLS_FAILED_TO_BE_ACTIVATED_ITEM,
        |dec| {
            let opts = dec.decode_sequence_preamble(true, 1)?;
            let nr_cgi = decode_nr_cgi_inline(dec)?;
            let cause = Cause::decode_aper(dec)?;
            skip_extensions(dec, opts[0])?;
            Ok(FailedCell { nr_cgi, cause })
        },
    )
}

//! F1AP Message Types
//!
//! High-level representations of the DU-side interface-management messages
//! and the served-cell data they carry.

use bytes::Bytes;

pub use ogs_asn1c::f1ap::cause::{
    Cause, CauseMisc, CauseProtocol, CauseRadioNetwork, CauseTransport,
};
pub use ogs_asn1c::f1ap::ies::{NrScs, TimeToWait};

/// Transaction identifier echoed between request and response
pub type TransactionId = u8;

// ============================================================================
// Cell identity
// ============================================================================

/// PLMN identity (MCC + MNC with explicit MNC length)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlmnId {
    pub mcc: u16,
    pub mnc: u16,
    /// 2 or 3
    pub mnc_digit_length: u8,
}

impl PlmnId {
    pub fn new(mcc: u16, mnc: u16, mnc_digit_length: u8) -> Self {
        Self {
            mcc,
            mnc,
            mnc_digit_length,
        }
    }
}

impl std::fmt::Display for PlmnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.mnc_digit_length == 3 {
            write!(f, "{:03}.{:03}", self.mcc, self.mnc)
        } else {
            write!(f, "{:03}.{:02}", self.mcc, self.mnc)
        }
    }
}

/// NR Cell Global Identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NrCgi {
    pub plmn: PlmnId,
    /// 36-bit NR cell identity
    pub nr_cellid: u64,
}

// ============================================================================
// Served cell information
// ============================================================================

/// S-NSSAI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nssai {
    pub sst: u8,
    /// 24-bit slice differentiator, `NO_SD` when absent
    pub sd: u32,
}

impl Nssai {
    pub const NO_SD: u32 = 0xFF_FFFF;
}

/// NR ARFCN with its single operating band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FreqInfo {
    pub nr_arfcn: u32,
    pub band: u16,
}

/// Subcarrier spacing plus resource-block count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransmissionBandwidth {
    pub scs: NrScs,
    pub nrb: u16,
}

/// Duplex-mode specific frequency configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NrModeInfo {
    Fdd {
        ul_freq: FreqInfo,
        dl_freq: FreqInfo,
        ul_bandwidth: TransmissionBandwidth,
        dl_bandwidth: TransmissionBandwidth,
    },
    Tdd {
        freq: FreqInfo,
        bandwidth: TransmissionBandwidth,
    },
}

/// How an NRB count absent from the bandwidth table is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BandwidthPolicy {
    /// Unknown counts are a configuration error
    #[default]
    Strict,
    /// No NR RAN context yet: unknown counts encode as the first table entry
    FallbackToFirst,
}

/// Served-Cell-Information
#[derive(Debug, Clone, PartialEq)]
pub struct ServedCellInfo {
    pub nr_cgi: NrCgi,
    pub nr_pci: u16,
    /// 24-bit 5GS TAC
    pub tac: Option<u32>,
    pub slices: Vec<Nssai>,
    pub mode: NrModeInfo,
    pub measurement_timing_config: Bytes,
}

/// gNB-DU System Information (MIB and SIB1 both required)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemInformation {
    pub mib: Bytes,
    pub sib1: Bytes,
}

/// A served cell together with its optional DU system information
#[derive(Debug, Clone, PartialEq)]
pub struct ServedCell {
    pub info: ServedCellInfo,
    pub system_information: Option<SystemInformation>,
}

/// Served-Cells-To-Modify item
#[derive(Debug, Clone, PartialEq)]
pub struct ModifiedCell {
    pub old_nr_cgi: NrCgi,
    pub cell: ServedCell,
}

/// SIB delivered by the CU for broadcast by an activated cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SibMessage {
    /// 2..=32
    pub sib_type: u8,
    pub message: Bytes,
    /// 0..=31
    pub value_tag: u8,
}

/// Cells-to-be-Activated-List item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellToActivate {
    pub nr_cgi: NrCgi,
    pub nr_pci: Option<u16>,
    pub system_information: Vec<SibMessage>,
}

impl CellToActivate {
    pub fn num_si(&self) -> usize {
        self.system_information.len()
    }
}

/// Cells-Failed-to-be-Activated-List item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailedCell {
    pub nr_cgi: NrCgi,
    pub cause: Cause,
}

/// RRC version triple (major, minor, revision)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RrcVersion(pub [u8; 3]);

impl RrcVersion {
    /// latest-RRC-Version: one bit per non-zero version byte
    pub fn latest_bitmap(&self) -> [bool; 3] {
        self.0.map(|b| b != 0)
    }
}

// ============================================================================
// Reset
// ============================================================================

/// UE-associatedLogicalF1-ConnectionItem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UeAssociatedConnection {
    pub gnb_cu_ue_f1ap_id: Option<u32>,
    pub gnb_du_ue_f1ap_id: Option<u32>,
}

/// ResetType
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    F1Interface,
    PartOfF1Interface(Vec<UeAssociatedConnection>),
}

/// Reset (either direction)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reset {
    pub transaction_id: TransactionId,
    pub cause: Cause,
    pub scope: ResetScope,
}

/// Reset Acknowledge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetAcknowledge {
    pub transaction_id: TransactionId,
}

// ============================================================================
// F1 Setup
// ============================================================================

/// F1 Setup Request
#[derive(Debug, Clone, PartialEq)]
pub struct F1SetupRequest {
    pub transaction_id: TransactionId,
    /// 36-bit gNB-DU ID
    pub gnb_du_id: u64,
    pub gnb_du_name: Option<String>,
    pub served_cells: Vec<ServedCell>,
    pub rrc_version: RrcVersion,
    pub bandwidth_policy: BandwidthPolicy,
}

/// F1 Setup Response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct F1SetupResponse {
    pub transaction_id: TransactionId,
    pub gnb_cu_name: Option<String>,
    pub cells_to_activate: Vec<CellToActivate>,
    /// All zero when the CU sent no enhanced version
    pub gnb_cu_rrc_version: RrcVersion,
}

/// F1 Setup Failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct F1SetupFailure {
    pub transaction_id: TransactionId,
    pub cause: Cause,
    pub time_to_wait: Option<TimeToWait>,
}

// ============================================================================
// Configuration Update
// ============================================================================

/// gNB-DU Configuration Update
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GnbDuConfigurationUpdate {
    pub transaction_id: TransactionId,
    pub cells_to_add: Vec<ServedCell>,
    pub cells_to_modify: Vec<ModifiedCell>,
    pub cells_to_delete: Vec<NrCgi>,
    pub gnb_du_id: Option<u64>,
    pub bandwidth_policy: BandwidthPolicy,
}

/// gNB-CU Configuration Update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GnbCuConfigurationUpdate {
    pub transaction_id: TransactionId,
    pub cells_to_activate: Vec<CellToActivate>,
}

/// gNB-CU Configuration Update Acknowledge
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GnbCuConfigurationUpdateAcknowledge {
    pub transaction_id: TransactionId,
    pub cells_failed_to_activate: Vec<FailedCell>,
}

/// gNB-CU Configuration Update Failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GnbCuConfigurationUpdateFailure {
    pub transaction_id: TransactionId,
    pub cause: Cause,
    pub time_to_wait: Option<TimeToWait>,
}

// ============================================================================
// Error Indication
// ============================================================================

/// Error Indication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorIndication {
    pub transaction_id: TransactionId,
    pub cause: Option<Cause>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plmn_display() {
        assert_eq!(PlmnId::new(1, 1, 2).to_string(), "001.01");
        assert_eq!(PlmnId::new(310, 410, 3).to_string(), "310.410");
    }

    #[test]
    fn test_rrc_version_bitmap() {
        assert_eq!(RrcVersion([16, 0, 3]).latest_bitmap(), [true, false, true]);
        assert_eq!(RrcVersion::default().latest_bitmap(), [false; 3]);
    }
}

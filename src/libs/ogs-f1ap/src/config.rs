//! gNB-DU F1AP configuration
//!
//! Loaded from the `du:` section of a YAML file:
//!
//! ```yaml
//! du:
//!   gnb_du_id: 3584
//!   name: du-rfsim
//!   rrc_version: [16, 6, 0]
//!   transaction_timeout_ms: 5000
//!   cells:
//!     - plmn: { mcc: 1, mnc: 1, mnc_length: 2 }
//!       nr_cellid: 12345678
//!       pci: 0
//!       tac: 1
//!       slices: [{ sst: 1 }]
//!       tdd: { arfcn: 641280, band: 78, scs: 30, nrb: 106 }
//!       measurement_timing_config: [1, 2, 3]
//! ```

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ie;
use crate::types::*;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

const MAX_PCI: u16 = 1007;
const MAX_CELLS: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlmnConf {
    pub mcc: u16,
    pub mnc: u16,
    #[serde(default = "default_mnc_length")]
    pub mnc_length: u8,
}

fn default_mnc_length() -> u8 {
    2
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceConf {
    pub sst: u8,
    pub sd: Option<u32>,
}

/// One direction (or the TDD carrier): ARFCN, band, SCS in kHz, NRB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierConf {
    pub arfcn: u32,
    pub band: u16,
    pub scs: u16,
    pub nrb: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FddConf {
    pub ul: CarrierConf,
    pub dl: CarrierConf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellConf {
    pub plmn: PlmnConf,
    pub nr_cellid: u64,
    pub pci: u16,
    pub tac: Option<u32>,
    #[serde(default)]
    pub slices: Vec<SliceConf>,
    pub tdd: Option<CarrierConf>,
    pub fdd: Option<FddConf>,
    #[serde(default)]
    pub measurement_timing_config: Vec<u8>,
    pub mib: Option<Vec<u8>>,
    pub sib1: Option<Vec<u8>>,
}

/// `du:` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct F1apDuConfig {
    pub gnb_du_id: u64,
    pub name: Option<String>,
    #[serde(default)]
    pub rrc_version: [u8; 3],
    /// Encode NRB counts outside the bandwidth table as the first entry
    #[serde(default)]
    pub nrb_fallback: bool,
    pub transaction_timeout_ms: Option<u64>,
    #[serde(default)]
    pub cells: Vec<CellConf>,
}

#[derive(Debug, Deserialize)]
struct Root {
    du: F1apDuConfig,
}

fn invalid(reason: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(reason.into())
}

fn scs_from_khz(khz: u16) -> Result<NrScs, ConfigError> {
    match khz {
        15 => Ok(NrScs::Scs15),
        30 => Ok(NrScs::Scs30),
        60 => Ok(NrScs::Scs60),
        120 => Ok(NrScs::Scs120),
        other => Err(invalid(format!("subcarrier spacing {other} kHz"))),
    }
}

impl CarrierConf {
    fn freq(&self) -> FreqInfo {
        FreqInfo {
            nr_arfcn: self.arfcn,
            band: self.band,
        }
    }

    fn bandwidth(&self) -> Result<TransmissionBandwidth, ConfigError> {
        Ok(TransmissionBandwidth {
            scs: scs_from_khz(self.scs)?,
            nrb: self.nrb,
        })
    }
}

impl CellConf {
    fn mode(&self) -> Result<NrModeInfo, ConfigError> {
        match (&self.tdd, &self.fdd) {
            (Some(tdd), None) => Ok(NrModeInfo::Tdd {
                freq: tdd.freq(),
                bandwidth: tdd.bandwidth()?,
            }),
            (None, Some(fdd)) => Ok(NrModeInfo::Fdd {
                ul_freq: fdd.ul.freq(),
                dl_freq: fdd.dl.freq(),
                ul_bandwidth: fdd.ul.bandwidth()?,
                dl_bandwidth: fdd.dl.bandwidth()?,
            }),
            _ => Err(invalid(format!(
                "cell {} needs exactly one of tdd/fdd",
                self.nr_cellid
            ))),
        }
    }

    fn system_information(&self) -> Result<Option<SystemInformation>, ConfigError> {
        match (&self.mib, &self.sib1) {
            (None, None) => Ok(None),
            (Some(mib), Some(sib1)) if !mib.is_empty() && !sib1.is_empty() => {
                Ok(Some(SystemInformation {
                    mib: Bytes::from(mib.clone()),
                    sib1: Bytes::from(sib1.clone()),
                }))
            }
            _ => Err(invalid(format!(
                "cell {} needs both MIB and SIB1, non-empty",
                self.nr_cellid
            ))),
        }
    }

    fn to_served_cell(&self) -> Result<ServedCell, ConfigError> {
        let plmn = PlmnId::new(self.plmn.mcc, self.plmn.mnc, self.plmn.mnc_length);
        Ok(ServedCell {
            info: ServedCellInfo {
                nr_cgi: NrCgi {
                    plmn,
                    nr_cellid: self.nr_cellid,
                },
                nr_pci: self.pci,
                tac: self.tac,
                slices: self
                    .slices
                    .iter()
                    .map(|s| Nssai {
                        sst: s.sst,
                        sd: s.sd.unwrap_or(Nssai::NO_SD),
                    })
                    .collect(),
                mode: self.mode()?,
                measurement_timing_config: Bytes::from(self.measurement_timing_config.clone()),
            },
            system_information: self.system_information()?,
        })
    }
}

impl F1apDuConfig {
    /// Parse the `du:` section of a YAML document and validate it
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let root: Root =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        root.du.validate()?;
        Ok(root.du)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn bandwidth_policy(&self) -> BandwidthPolicy {
        if self.nrb_fallback {
            BandwidthPolicy::FallbackToFirst
        } else {
            BandwidthPolicy::Strict
        }
    }

    pub fn transaction_timeout(&self) -> Option<Duration> {
        self.transaction_timeout_ms.map(Duration::from_millis)
    }

    /// Check every value against what F1 Setup can carry
    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |result: crate::error::F1apResult<()>| {
            result.map_err(|e| ConfigError::ValidationError(e.to_string()))
        };

        if self.gnb_du_id > (1 << 36) - 1 {
            return Err(invalid(format!("gnb_du_id {} exceeds 36 bits", self.gnb_du_id)));
        }
        if let Some(ref name) = self.name {
            let printable = name.chars().all(ie::is_printable);
            if name.is_empty() || name.len() > ie::NAME_MAX_LEN || !printable {
                return Err(invalid(format!("name {name:?} is not a PrintableString")));
            }
        }
        if self.cells.len() > MAX_CELLS {
            return Err(invalid(format!("{} cells, at most {MAX_CELLS}", self.cells.len())));
        }

        let policy = self.bandwidth_policy();
        for cell in &self.cells {
            let served = cell.to_served_cell()?;
            let info = &served.info;
            check(ie::plmn_to_bytes(&info.nr_cgi.plmn).map(drop))?;
            check(ie::nr_cell_identity_to_bytes(info.nr_cgi.nr_cellid).map(drop))?;
            if let Some(tac) = info.tac {
                check(ie::tac_to_bytes(tac).map(drop))?;
            }
            if info.nr_pci > MAX_PCI {
                return Err(invalid(format!("pci {} exceeds {MAX_PCI}", info.nr_pci)));
            }
            let bandwidths = match info.mode {
                NrModeInfo::Tdd { bandwidth, .. } => vec![bandwidth],
                NrModeInfo::Fdd {
                    ul_bandwidth,
                    dl_bandwidth,
                    ..
                } => vec![ul_bandwidth, dl_bandwidth],
            };
            for bandwidth in bandwidths {
                check(ie::nrb_to_index(bandwidth.nrb, policy).map(drop))?;
            }
        }
        Ok(())
    }

    /// F1 Setup Request for this DU; the transaction id is assigned on send
    pub fn to_setup_request(&self) -> Result<F1SetupRequest, ConfigError> {
        Ok(F1SetupRequest {
            transaction_id: 0,
            gnb_du_id: self.gnb_du_id,
            gnb_du_name: self.name.clone(),
            served_cells: self
                .cells
                .iter()
                .map(CellConf::to_served_cell)
                .collect::<Result<_, _>>()?,
            rrc_version: RrcVersion(self.rrc_version),
            bandwidth_policy: self.bandwidth_policy(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
logger:
  level: info
du:
  gnb_du_id: 3584
  name: du-rfsim
  rrc_version: [16, 6, 0]
  transaction_timeout_ms: 5000
  cells:
    - plmn: { mcc: 1, mnc: 1 }
      nr_cellid: 12345678
      pci: 0
      tac: 1
      slices: [{ sst: 1 }, { sst: 1, sd: 1 }]
      tdd: { arfcn: 641280, band: 78, scs: 30, nrb: 106 }
      measurement_timing_config: [1, 2, 3]
      mib: [0x01, 0x02, 0x03]
      sib1: [0x04]
    - plmn: { mcc: 310, mnc: 410, mnc_length: 3 }
      nr_cellid: 2
      pci: 1007
      fdd:
        ul: { arfcn: 384000, band: 1, scs: 15, nrb: 52 }
        dl: { arfcn: 396000, band: 1, scs: 15, nrb: 52 }
"#;

    #[test]
    fn test_parse_sample() {
        let config = F1apDuConfig::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(config.gnb_du_id, 3584);
        assert_eq!(config.transaction_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.bandwidth_policy(), BandwidthPolicy::Strict);

        let request = config.to_setup_request().unwrap();
        assert_eq!(request.gnb_du_name.as_deref(), Some("du-rfsim"));
        assert_eq!(request.rrc_version, RrcVersion([16, 6, 0]));
        assert_eq!(request.served_cells.len(), 2);

        let tdd = &request.served_cells[0];
        assert_eq!(tdd.info.nr_cgi.plmn, PlmnId::new(1, 1, 2));
        assert_eq!(tdd.info.slices[0].sd, Nssai::NO_SD);
        assert_eq!(tdd.info.slices[1].sd, 1);
        assert!(tdd.system_information.is_some());
        assert!(matches!(
            request.served_cells[1].info.mode,
            NrModeInfo::Fdd { .. }
        ));
    }

    #[test]
    fn test_setup_request_from_config_builds() {
        let config = F1apDuConfig::from_yaml_str(SAMPLE).unwrap();
        let request = config.to_setup_request().unwrap();
        assert!(crate::builder::build_f1_setup_request(&request).is_ok());
    }

    #[test]
    fn test_missing_du_section() {
        assert!(matches!(
            F1apDuConfig::from_yaml_str("amf:\n  name: x\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_unknown_nrb_needs_fallback() {
        let yaml = r#"
du:
  gnb_du_id: 1
  cells:
    - plmn: { mcc: 1, mnc: 1 }
      nr_cellid: 1
      pci: 1
      tdd: { arfcn: 641280, band: 78, scs: 30, nrb: 100 }
"#;
        assert!(matches!(
            F1apDuConfig::from_yaml_str(yaml),
            Err(ConfigError::ValidationError(_))
        ));

        let with_fallback = yaml.replace("gnb_du_id: 1", "gnb_du_id: 1\n  nrb_fallback: true");
        let config = F1apDuConfig::from_yaml_str(&with_fallback).unwrap();
        assert_eq!(config.bandwidth_policy(), BandwidthPolicy::FallbackToFirst);
    }

    #[test]
    fn test_invalid_values() {
        let base = r#"
du:
  gnb_du_id: 1
  cells:
    - plmn: { mcc: 1, mnc: 1 }
      nr_cellid: 1
      pci: 1
      tdd: { arfcn: 641280, band: 78, scs: 30, nrb: 106 }
"#;
        assert!(F1apDuConfig::from_yaml_str(base).is_ok());
        for (from, to) in [
            ("pci: 1", "pci: 1008"),
            ("scs: 30", "scs: 25"),
            ("nr_cellid: 1", "nr_cellid: 68719476736"),
            ("mnc: 1 }", "mnc: 1, mnc_length: 4 }"),
            ("gnb_du_id: 1", "gnb_du_id: 68719476736"),
            ("pci: 1\n", "pci: 1\n      mib: [1]\n"),
        ] {
            let yaml = base.replacen(from, to, 1);
            assert!(
                matches!(
                    F1apDuConfig::from_yaml_str(&yaml),
                    Err(ConfigError::ValidationError(_))
                ),
                "{to} should be rejected"
            );
        }
    }
}

//! NextGCore F1AP gNB-DU Library
//!
//! DU-side interface-management procedures of the F1 Application Protocol
//! (3GPP TS 38.473) between a gNB-DU and its gNB-CU.
//!
//! # Architecture
//!
//! The library is layered on top of `ogs-asn1c`, which provides the APER
//! codec and the F1AP PDU / IE container model. This crate adds:
//!
//! - **Strongly-typed message types** (`types`) for each procedure
//! - **Domain value codec and IE helpers** (`ie`): PLMN, cell identity, TAC,
//!   bandwidth table, served cells and cells to activate
//! - **Procedure contracts** (`contract`) with the IE extractor
//! - **Builder functions** (`builder`) producing F1AP PDUs
//! - **Parser functions** (`parser`) decoding PDUs into typed messages
//! - **Transaction correlator** (`transaction`)
//! - **DU procedure handler** (`handler`) tying codec, transport and the
//!   upper-layer event channel together
//! - **Configuration** (`config`) loaded from YAML
//!
//! # Supported Procedures
//!
//! - **Reset**: Reset (both directions), Reset Acknowledge
//! - **F1 Setup**: Request, Response, Failure
//! - **gNB-DU Configuration Update**: Request
//! - **gNB-CU Configuration Update**: Request, Acknowledge, Failure
//! - **Error Indication**
//!
//! # Example
//!
//! ```no_run
//! use ogs_f1ap::handler::{ChannelTransport, F1apDu};
//! use ogs_f1ap::types::*;
//!
//! let (transport, _outbound) = ChannelTransport::new();
//! let (events, _inbound_events) = tokio::sync::mpsc::unbounded_channel();
//! let du = F1apDu::new(transport, events);
//!
//! let request = F1SetupRequest {
//!     transaction_id: 0,
//!     gnb_du_id: 3584,
//!     gnb_du_name: Some("du-rfsim".to_string()),
//!     served_cells: vec![],
//!     rrc_version: RrcVersion([16, 6, 0]),
//!     bandwidth_policy: BandwidthPolicy::Strict,
//! };
//! let transaction_id = du.send_setup_request(1, request).unwrap();
//! ```

pub mod error;
pub mod types;
pub mod ie;
pub mod contract;
pub mod transaction;
pub mod codec;
pub mod builder;
pub mod parser;
pub mod handler;
pub mod config;

#[cfg(test)]
mod property_tests;

// Re-export key types for convenience
pub use codec::{AperCodec, PduCodec};
pub use config::{ConfigError, F1apDuConfig};
pub use error::{ErrorKind, F1apError, F1apResult};
pub use handler::{F1Transport, F1apDu, F1apDuEvent, F1apDuRequest};
pub use parser::F1apMessage;
pub use transaction::TransactionCorrelator;
pub use types::*;

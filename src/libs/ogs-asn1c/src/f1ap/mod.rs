//! F1AP codec - gNB-CU / gNB-DU interface (3GPP TS 38.473)
//!
//! Interface-management subset: Reset, F1 Setup, Error Indication,
//! gNB-DU/gNB-CU Configuration Update and gNB-DU Resource Coordination.

pub mod cause;
pub mod ies;
pub mod pdu;
pub mod types;

pub use cause::{Cause, CauseMisc, CauseProtocol, CauseRadioNetwork, CauseTransport};
pub use ies::{ProtocolExtensionContainer, ProtocolIeContainer, ProtocolIeField, TransactionId};
pub use pdu::{F1apPdu, Message, MessageKind};
pub use types::{Criticality, Presence, ProcedureCode, ProtocolIeId};

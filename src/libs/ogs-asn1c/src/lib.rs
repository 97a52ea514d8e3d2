//! NextGCore ASN.1 Codec Library
//!
//! This crate provides ASN.1 APER encoding/decoding for the F1 Application
//! Protocol used between a gNB-CU and a gNB-DU.
//!
//! # Modules
//!
//! - `per` - Packed Encoding Rules (APER) encoder/decoder
//! - `f1ap` - F1AP PDU, IE container and cause types (3GPP TS 38.473)

pub mod per;    // Packed Encoding Rules
pub mod f1ap;   // F1AP codec - CU-DU (TS 38.473)

#[cfg(test)]
mod property_tests;

// Re-export commonly used types
pub use per::{AperEncoder, AperDecoder, AperEncode, AperDecode, PerError, PerResult};

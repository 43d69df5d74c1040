//! # Cross-Chain Bridge
//!
//! Encoding of native recipients for remote-chain deposits.

pub mod deposit;
pub mod recipient;

pub use deposit::*;
pub use recipient::*;

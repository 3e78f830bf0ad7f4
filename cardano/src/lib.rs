//! Ledger-facing calculations over built transactions: UTxO selection, witness injection,
//! fee and collateral estimation

pub mod collateral;
pub mod fees;
pub mod selection;
pub mod witness;

//! Cairn transaction builder
//!
//! Accumulates a [`TxBuilderBody`](cairn_common::TxBuilderBody) one entry at a time, hands it
//! to a [`LedgerEngine`] for serialization with an exact fee and collateral, and parses
//! transactions back into bodies.

pub mod accumulator;
pub mod engine;
pub mod parser;
pub mod serializer;

pub use accumulator::{ScriptReference, TxBuilder, UtxoSelection};
pub use engine::LedgerEngine;
pub use parser::TxParser;
pub use serializer::{BuiltTransaction, TxSerializer};

//! Seam to the ledger rules engine that owns the CBOR layout of a transaction

use cairn_common::{BuilderData, BuilderError, BuilderResult, ProtocolParams, UTxO};
use serde_json::Value;

/// Serialization and parsing the builder delegates. Errors are plain messages; callers surface
/// them verbatim as [`BuilderError::ExternalEngine`].
pub trait LedgerEngine {
    /// Unsigned transaction hex for a wire body
    fn serialize_body(&self, body: &Value, params: &ProtocolParams) -> Result<String, String>;

    /// Wire body of a transaction, with `utxos` resolving what its inputs spend
    fn parse_tx(&self, tx_hex: &str, utxos: &[UTxO]) -> Result<Value, String>;

    /// CBOR hex of a datum or redeemer given in any accepted form
    fn normalize_data(&self, data: &BuilderData) -> Result<String, String>;
}

impl<E: LedgerEngine + ?Sized> LedgerEngine for &E {
    fn serialize_body(&self, body: &Value, params: &ProtocolParams) -> Result<String, String> {
        (**self).serialize_body(body, params)
    }

    fn parse_tx(&self, tx_hex: &str, utxos: &[UTxO]) -> Result<Value, String> {
        (**self).parse_tx(tx_hex, utxos)
    }

    fn normalize_data(&self, data: &BuilderData) -> Result<String, String> {
        (**self).normalize_data(data)
    }
}

pub(crate) fn engine_error(message: String) -> BuilderError {
    BuilderError::ExternalEngine(message)
}

pub(crate) fn decode_tx_hex(tx_hex: &str) -> BuilderResult<Vec<u8>> {
    hex::decode(tx_hex.trim())
        .map_err(|e| BuilderError::ExternalEngine(format!("transaction is not hex: {e}")))
}

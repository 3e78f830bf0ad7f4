//! Reconstruction of a builder body from serialized transaction bytes

use std::collections::HashMap;

use cairn_codec::tx_builder_body_from_obj;
use cairn_common::{BuilderResult, TxBuilderBody, TxHash, TxInParameter, UTxO};
use tracing::debug;

use crate::engine::{engine_error, LedgerEngine};

pub struct TxParser<E> {
    engine: E,
}

impl<E: LedgerEngine> TxParser<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    /// Parse `tx_hex`. Inputs and collaterals found in `utxos` get their amount, address and
    /// reference script size filled in where the engine left them unknown.
    pub fn parse(&self, tx_hex: &str, utxos: &[UTxO]) -> BuilderResult<TxBuilderBody> {
        let wire = self.engine.parse_tx(tx_hex, utxos).map_err(engine_error)?;
        let mut body = tx_builder_body_from_obj(&wire)?;

        let resolved: HashMap<(TxHash, u32), &UTxO> = utxos
            .iter()
            .map(|utxo| ((utxo.input.tx_hash, utxo.input.tx_index), utxo))
            .collect();
        let inputs = body.inputs.iter_mut().chain(body.collaterals.iter_mut());
        for tx_in in inputs.map(|input| input.tx_in_mut()) {
            if let Some(utxo) = resolved.get(&tx_in.key()) {
                resolve(tx_in, utxo);
            }
        }

        debug!(
            "Parsed transaction with {} inputs, {} outputs",
            body.inputs.len(),
            body.outputs.len()
        );
        Ok(body)
    }
}

fn resolve(tx_in: &mut TxInParameter, utxo: &UTxO) {
    let known = TxInParameter::from(utxo);
    tx_in.amount = tx_in.amount.take().or(known.amount);
    tx_in.address = tx_in.address.take().or(known.address);
    tx_in.script_size = tx_in.script_size.or(known.script_size);
}

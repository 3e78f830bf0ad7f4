//! Serialization of a finished body into a balanced, signed transaction

use cairn_cardano::{
    collateral::{fill_min_ada, plan_collateral, settle_collateral},
    fees::{estimate_fee, FeeEstimate},
    selection::add_selected_inputs,
    witness::{sign_transaction, transaction_hash},
};
use cairn_codec::tx_builder_body_to_obj;
use cairn_common::{
    configuration::BuilderConfig, BuilderData, BuilderResult, Coin, TxBuilderBody, TxHash,
};
use tracing::{debug, info};

use crate::{
    accumulator::UtxoSelection,
    engine::{decode_tx_hex, engine_error, LedgerEngine},
    TxBuilder,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltTransaction {
    pub unsigned_hex: String,

    /// Identical to `unsigned_hex` when there are no signing keys
    pub signed_hex: String,

    pub fee: Coin,
    pub tx_hash: TxHash,

    /// The body as finally serialized, after selection, min-ADA and canonical ordering
    pub body: TxBuilderBody,
}

pub struct TxSerializer<E> {
    engine: E,
    config: BuilderConfig,
}

impl<E: LedgerEngine> TxSerializer<E> {
    pub fn new(engine: E, config: BuilderConfig) -> Self {
        Self { engine, config }
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Flush `builder` and serialize the result, running any selection it asked for
    pub fn complete(&self, builder: TxBuilder) -> BuilderResult<BuiltTransaction> {
        let (body, selection) = builder.build()?;
        self.serialize_with_selection(body, selection.as_ref())
    }

    pub fn serialize(&self, body: TxBuilderBody) -> BuilderResult<BuiltTransaction> {
        self.serialize_with_selection(body, None)
    }

    pub fn serialize_with_selection(
        &self,
        mut body: TxBuilderBody,
        selection: Option<&UtxoSelection>,
    ) -> BuilderResult<BuiltTransaction> {
        let params = &self.config.protocol_params;

        if let Some(selection) = selection {
            add_selected_inputs(&mut body, &selection.pool, &selection.threshold)?;
        }
        for output in &body.outputs {
            output.check_value()?;
        }
        self.normalize(&mut body)?;
        for output in &mut body.outputs {
            fill_min_ada(output, params)?;
        }
        canonicalize(&mut body);

        let (tx, fee) = match body.fee.clone() {
            Some(fee) => (self.serialize_unsigned(&body)?, fee),
            None => self.balance(&mut body)?,
        };

        let signed = sign_transaction(&tx, &body.signing_keys)?;
        let tx_hash = transaction_hash(&tx)?;
        info!(
            "Built transaction {tx_hash}: {} bytes, fee {fee}, {} inputs, {} outputs",
            tx.len(),
            body.inputs.len(),
            body.outputs.len()
        );

        Ok(BuiltTransaction {
            unsigned_hex: hex::encode(&tx),
            signed_hex: hex::encode(signed),
            fee,
            tx_hash,
            body,
        })
    }

    /// Replace every datum and redeemer with its CBOR form
    fn normalize(&self, body: &mut TxBuilderBody) -> BuilderResult<()> {
        body.try_for_each_data_mut(|data| {
            if !data.is_normalized() {
                let cbor = self.engine.normalize_data(data).map_err(engine_error)?;
                *data = BuilderData::cbor(cbor);
            }
            Ok(())
        })
    }

    fn serialize_unsigned(&self, body: &TxBuilderBody) -> BuilderResult<Vec<u8>> {
        let wire = tx_builder_body_to_obj(body)?;
        let tx_hex = self
            .engine
            .serialize_body(&wire, &self.config.protocol_params)
            .map_err(engine_error)?;
        decode_tx_hex(&tx_hex)
    }

    fn estimate(
        &self,
        body: &mut TxBuilderBody,
        fee: &Coin,
    ) -> BuilderResult<(Vec<u8>, FeeEstimate)> {
        body.fee = Some(fee.clone());
        let tx = self.serialize_unsigned(body)?;
        let estimate = estimate_fee(&tx, body, &self.config.protocol_params)?;
        Ok((tx, estimate))
    }

    /// Size collateral against a first estimate, raise the fee until it covers the
    /// transaction it is part of, then settle the collateral against that fee
    fn balance(&self, body: &mut TxBuilderBody) -> BuilderResult<(Vec<u8>, Coin)> {
        let params = &self.config.protocol_params;
        let (_, first) = self.estimate(body, &Coin::ZERO)?;

        let mut returns_collateral = false;
        if body.total_collateral.is_none() {
            let margin = &self.config.collateral_safety_margin;
            if let Some(plan) = plan_collateral(body, &first.fee, margin, params)? {
                plan.apply(body);
                returns_collateral = true;
            }
        }

        let mut fee = first.fee;
        let mut round = 0;
        let mut tx = loop {
            round += 1;
            let (tx, estimate) = self.estimate(body, &fee)?;
            debug!(
                "Fee round {round}: {} bytes need {}, body carries {fee}",
                estimate.size, estimate.fee
            );
            if estimate.fee <= fee {
                break tx;
            }
            fee = estimate.fee;
            if round >= self.config.max_fee_rounds {
                body.fee = Some(fee.clone());
                break self.serialize_unsigned(body)?;
            }
        };

        if returns_collateral {
            settle_collateral(body, &fee, params)?.apply(body);
            tx = self.serialize_unsigned(body)?;
        }
        Ok((tx, fee))
    }
}

/// Inputs by `(txHash, txIndex)`, mints by policy and withdrawals by reward address. Sorts are
/// stable, and certificates and votes keep insertion order.
pub fn canonicalize(body: &mut TxBuilderBody) {
    body.inputs.sort_by_key(|input| input.tx_in().key());
    body.mints.sort_by_key(|mint| mint.mint().policy_id);
    body.withdrawals.sort_by(|a, b| a.address().cmp(b.address()));
}

//! Minimum-ADA and collateral return planning

use cairn_common::{
    address::address_bytes,
    rational_number::ceil_div,
    BuilderError, BuilderResult, Coin, DatumKind, LanguageVersion, Output, OutputScript,
    ProtocolParams, Quantity, TxBuilderBody, Value,
};
use pallas::codec::minicbor::{data::Tag, Encoder};
use tracing::debug;

/// Fixed per-output overhead the ledger adds to the serialized size
const OUTPUT_OVERHEAD: u64 = 160;

const ENCODED_CBOR_TAG: u64 = 24;

fn cbor_error(e: impl std::fmt::Display) -> BuilderError {
    BuilderError::Cbor(e.to_string())
}

fn to_u64(quantity: &Quantity, field: &str) -> BuilderResult<u64> {
    u64::try_from(quantity).map_err(|_| {
        BuilderError::invalid_field("Output", field, format!("{quantity} out of range"))
    })
}

fn decode_hex(text: &str, field: &str) -> BuilderResult<Vec<u8>> {
    hex::decode(text).map_err(|e| BuilderError::invalid_field("Output", field, e.to_string()))
}

fn encode_value(encoder: &mut Encoder<Vec<u8>>, value: &Value) -> BuilderResult<()> {
    let coin = to_u64(&value.lovelace, "amount")?;
    if !value.has_assets() {
        encoder.u64(coin).map_err(cbor_error)?;
        return Ok(());
    }
    encoder.array(2).and_then(|e| e.u64(coin)).map_err(cbor_error)?;
    encoder.map(value.multiasset.len() as u64).map_err(cbor_error)?;
    for (policy, names) in &value.multiasset {
        encoder.bytes(policy.as_ref()).map_err(cbor_error)?;
        encoder.map(names.len() as u64).map_err(cbor_error)?;
        for (name, quantity) in names {
            encoder.bytes(&decode_hex(name, "amount")?).map_err(cbor_error)?;
            encoder.u64(to_u64(quantity, "amount")?).map_err(cbor_error)?;
        }
    }
    Ok(())
}

/// Length of the output serialized as a post-Alonzo output map
pub fn output_cbor_size(output: &Output) -> BuilderResult<u64> {
    let entries = 2 + output.datum.is_some() as u64 + output.reference_script.is_some() as u64;
    let mut encoder = Encoder::new(Vec::new());
    encoder.map(entries).map_err(cbor_error)?;

    encoder.u8(0).map_err(cbor_error)?;
    encoder.bytes(&address_bytes(&output.address)?).map_err(cbor_error)?;
    encoder.u8(1).map_err(cbor_error)?;
    encode_value(&mut encoder, &output.value()?)?;

    if let Some(datum) = &output.datum {
        let cbor = datum.data.as_cbor().ok_or(BuilderError::UnnormalizedData)?;
        encoder.u8(2).and_then(|e| e.array(2)).map_err(cbor_error)?;
        match datum.kind {
            DatumKind::Inline => {
                let payload = decode_hex(cbor, "datum")?;
                encoder
                    .u8(1)
                    .and_then(|e| e.tag(Tag::new(ENCODED_CBOR_TAG)))
                    .and_then(|e| e.bytes(&payload))
                    .map_err(cbor_error)?;
            }
            DatumKind::Hash | DatumKind::Embedded => {
                encoder.u8(0).and_then(|e| e.bytes(&[0u8; 32])).map_err(cbor_error)?;
            }
        }
    }

    if let Some(script) = &output.reference_script {
        let (tag, code) = match script {
            OutputScript::Native { code } => (0u8, decode_hex(code, "referenceScript")?),
            OutputScript::Plutus { code, version } => {
                let tag = match version {
                    LanguageVersion::V1 => 1,
                    LanguageVersion::V2 => 2,
                    LanguageVersion::V3 => 3,
                };
                (tag, decode_hex(code, "referenceScript")?)
            }
        };
        let mut inner = Encoder::new(Vec::new());
        inner
            .array(2)
            .and_then(|e| e.u8(tag))
            .and_then(|e| e.bytes(&code))
            .map_err(cbor_error)?;
        encoder
            .u8(3)
            .and_then(|e| e.tag(Tag::new(ENCODED_CBOR_TAG)))
            .and_then(|e| e.bytes(&inner.into_writer()))
            .map_err(cbor_error)?;
    }

    Ok(encoder.into_writer().len() as u64)
}

/// Least lovelace `output` must carry: `(160 + size) * coinsPerUtxoSize`, where the size
/// already includes that lovelace amount
pub fn min_ada(output: &Output, params: &ProtocolParams) -> BuilderResult<Coin> {
    let mut sized = output.clone();
    let mut value = output.value()?;
    let mut required = Coin::ZERO;
    loop {
        value.lovelace = required.clone();
        sized.amount = value.to_assets();
        let size = output_cbor_size(&sized)?;
        let next = Coin::from(OUTPUT_OVERHEAD + size) * Coin::from(params.coins_per_utxo_size);
        if next <= required {
            return Ok(required);
        }
        required = next;
    }
}

/// Raise the lovelace of an output to its minimum when it carries none
pub fn fill_min_ada(output: &mut Output, params: &ProtocolParams) -> BuilderResult<()> {
    let mut value = output.value()?;
    if value.lovelace != Coin::ZERO {
        return Ok(());
    }
    value.lovelace = min_ada(output, params)?;
    debug!("Filled {} lovelace into output at {}", value.lovelace, output.address);
    output.amount = value.to_assets();
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollateralPlan {
    pub total_collateral: Coin,
    pub collateral_return: Output,
}

impl CollateralPlan {
    pub fn apply(self, body: &mut TxBuilderBody) {
        body.total_collateral = Some(self.total_collateral);
        body.collateral_return = Some(self.collateral_return);
    }
}

fn collateral_value(body: &TxBuilderBody) -> BuilderResult<Value> {
    let mut total = Value::new();
    for collateral in &body.collaterals {
        total += &collateral.tx_in().value()?;
    }
    Ok(total)
}

fn percent_of(params: &ProtocolParams, amount: &Coin) -> Coin {
    ceil_div(&(Coin::from(params.collateral_percent) * amount), &Coin::from(100))
}

/// First pass, before the fee is known. Returns a plan only when the collateral exceeds the
/// estimated requirement by more than an output at the change address needs; the plan returns
/// everything so the sized transaction is never smaller than the final one.
pub fn plan_collateral(
    body: &TxBuilderBody,
    min_fee: &Coin,
    safety_margin: &Coin,
    params: &ProtocolParams,
) -> BuilderResult<Option<CollateralPlan>> {
    if body.collaterals.is_empty() || body.change_address.is_empty() {
        return Ok(None);
    }
    let estimate = percent_of(params, &(min_fee + safety_margin));
    let total = collateral_value(body)?;
    let excess = &total.lovelace - &estimate;
    if excess <= Coin::ZERO {
        return Ok(None);
    }

    let estimate_output =
        Output::new(body.change_address.clone(), Value::from_lovelace(estimate).to_assets());
    let threshold = min_ada(&estimate_output, params)?;
    if excess <= threshold {
        debug!("Collateral excess {excess} below min-ADA {threshold}, no return");
        return Ok(None);
    }

    Ok(Some(CollateralPlan {
        total_collateral: total.lovelace.clone(),
        collateral_return: Output::new(body.change_address.clone(), total.to_assets()),
    }))
}

/// Final pass: total collateral is `ceil(collateralPercent * fee / 100)` and the rest of the
/// collateral inputs goes back to the change address
pub fn settle_collateral(
    body: &TxBuilderBody,
    fee: &Coin,
    params: &ProtocolParams,
) -> BuilderResult<CollateralPlan> {
    let total_collateral = percent_of(params, fee);
    let mut remainder = collateral_value(body)?;
    remainder.lovelace -= &total_collateral;
    Ok(CollateralPlan {
        total_collateral,
        collateral_return: Output::new(body.change_address.clone(), remainder.to_assets()),
    })
}

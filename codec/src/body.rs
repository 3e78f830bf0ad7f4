use cairn_common::{BuilderError, BuilderResult, TxBuilderBody, ValidityRange};
use serde_json::{Value, json};

use crate::{
    certificate::*, metadata::*, mint::*, network::*, output::*, tx_in::*, utils::*,
    vote::*, withdrawal::*,
};

fn list_to_obj<T>(items: &[T], f: impl Fn(&T) -> BuilderResult<Value>) -> BuilderResult<Value> {
    items.iter().map(f).collect::<BuilderResult<Vec<_>>>().map(Value::Array)
}

fn list_from_obj<T>(
    obj: &Obj,
    name: &str,
    f: impl Fn(&Value) -> BuilderResult<T>,
) -> BuilderResult<Vec<T>> {
    match opt_field(obj, name) {
        Some(items) => as_array(items, "TxBuilderBody", name)?.iter().map(f).collect(),
        None => Ok(Vec::new()),
    }
}

/// The whole body as the engine consumes it
pub fn tx_builder_body_to_obj(body: &TxBuilderBody) -> BuilderResult<Value> {
    Ok(json!({
        "inputs": list_to_obj(&body.inputs, tx_in_to_obj)?,
        "outputs": list_to_obj(&body.outputs, checked_output_to_obj)?,
        "collaterals": body.collaterals.iter().map(collateral_to_obj).collect::<Vec<_>>(),
        "referenceInputs": body
            .reference_inputs
            .iter()
            .map(reference_input_to_obj)
            .collect::<Vec<_>>(),
        "mints": list_to_obj(&body.mints, mint_item_to_obj)?,
        "certificates": list_to_obj(&body.certificates, certificate_to_obj)?,
        "withdrawals": list_to_obj(&body.withdrawals, withdrawal_to_obj)?,
        "votes": list_to_obj(&body.votes, vote_to_obj)?,
        "validityRange": {
            "invalidBefore": body.validity_range.invalid_before,
            "invalidHereafter": body.validity_range.invalid_hereafter,
        },
        "metadata": metadata_to_obj(&body.metadata),
        "requiredSignatures": body
            .required_signatures
            .iter()
            .map(|hash| hash.to_string())
            .collect::<Vec<_>>(),
        "changeAddress": body.change_address,
        "changeDatum": match &body.change_datum {
            Some(datum) => output_datum_to_obj(datum)?,
            None => Value::Null,
        },
        "signingKey": body.signing_keys,
        "network": network_to_obj(&body.network),
        "fee": opt_to_json(body.fee.as_ref(), bigint_to_json),
        "totalCollateral": opt_to_json(body.total_collateral.as_ref(), bigint_to_json),
        "collateralReturn": match &body.collateral_return {
            Some(output) => output_to_obj(output)?,
            None => Value::Null,
        },
        "expectedNumberKeyWitnesses": body.expected_key_witnesses,
        "expectedByronAddressWitnesses": body.bootstrap_witnesses,
    }))
}

pub fn tx_builder_body_from_obj(value: &Value) -> BuilderResult<TxBuilderBody> {
    const ENTITY: &str = "TxBuilderBody";
    let obj = as_object(value, ENTITY)?;

    let validity_range = match opt_field(obj, "validityRange") {
        Some(range) => {
            let range = as_object(range, "ValidityRange")?;
            ValidityRange {
                invalid_before: opt_u64_field(range, "ValidityRange", "invalidBefore")?,
                invalid_hereafter: opt_u64_field(range, "ValidityRange", "invalidHereafter")?,
            }
        }
        None => ValidityRange::default(),
    };

    let strings = |name: &str| {
        list_from_obj(obj, name, |item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| BuilderError::invalid_field(ENTITY, name, "expected strings"))
        })
    };

    Ok(TxBuilderBody {
        inputs: list_from_obj(obj, "inputs", tx_in_from_obj)?,
        outputs: list_from_obj(obj, "outputs", output_from_obj)?,
        collaterals: list_from_obj(obj, "collaterals", collateral_from_obj)?,
        reference_inputs: list_from_obj(obj, "referenceInputs", reference_input_from_obj)?,
        mints: list_from_obj(obj, "mints", mint_item_from_obj)?,
        certificates: list_from_obj(obj, "certificates", certificate_from_obj)?,
        withdrawals: list_from_obj(obj, "withdrawals", withdrawal_from_obj)?,
        votes: list_from_obj(obj, "votes", vote_from_obj)?,
        validity_range,
        metadata: match opt_field(obj, "metadata") {
            Some(metadata) => metadata_from_obj(metadata)?,
            None => Vec::new(),
        },
        required_signatures: strings("requiredSignatures")?
            .iter()
            .map(|hash| {
                hash.parse().map_err(|e: hex::FromHexError| {
                    BuilderError::invalid_field(ENTITY, "requiredSignatures", e.to_string())
                })
            })
            .collect::<BuilderResult<Vec<_>>>()?,
        change_address: opt_str_field(obj, ENTITY, "changeAddress")?.unwrap_or_default(),
        change_datum: opt_field(obj, "changeDatum").map(output_datum_from_obj).transpose()?,
        signing_keys: strings("signingKey")?,
        network: match opt_field(obj, "network") {
            Some(network) => network_from_obj(network)?,
            None => Default::default(),
        },
        fee: opt_field(obj, "fee")
            .map(|fee| bigint_from_json(fee, ENTITY, "fee"))
            .transpose()?,
        total_collateral: opt_field(obj, "totalCollateral")
            .map(|total| bigint_from_json(total, ENTITY, "totalCollateral"))
            .transpose()?,
        collateral_return: opt_field(obj, "collateralReturn").map(output_from_obj).transpose()?,
        expected_key_witnesses: opt_u64_field(obj, ENTITY, "expectedNumberKeyWitnesses")?
            .map(|n| n as usize),
        bootstrap_witnesses: strings("expectedByronAddressWitnesses")?,
    })
}

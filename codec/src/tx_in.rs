use cairn_common::{
    BuilderResult, EntryKind, ReferenceInput, ScriptTxIn, ScriptTxInWitness, SimpleScriptTxIn,
    TxIn, TxInParameter,
};
use serde_json::{Value, json};

use crate::{output::*, script::*, utils::*};

pub fn tx_in_parameter_to_obj(tx_in: &TxInParameter) -> Value {
    let mut obj = json!({
        "txHash": tx_in.tx_hash.to_string(),
        "txIndex": tx_in.tx_index,
        "amount": opt_to_json(tx_in.amount.as_deref(), assets_to_obj),
        "address": tx_in.address,
    });
    if let Some(size) = tx_in.script_size {
        obj["scriptSize"] = json!(size);
    }
    obj
}

pub fn tx_in_parameter_from_obj(value: &Value) -> BuilderResult<TxInParameter> {
    const ENTITY: &str = "TxIn";
    let obj = as_object(value, ENTITY)?;
    Ok(TxInParameter {
        tx_hash: hash_field(obj, ENTITY, "txHash")?,
        tx_index: u32_field(obj, ENTITY, "txIndex")?,
        amount: opt_field(obj, "amount")
            .map(|amount| assets_from_obj(amount, ENTITY))
            .transpose()?,
        address: opt_str_field(obj, ENTITY, "address")?,
        script_size: opt_u64_field(obj, ENTITY, "scriptSize")?,
    })
}

fn script_witness_to_obj(witness: &ScriptTxInWitness) -> BuilderResult<Value> {
    Ok(json!({
        "scriptSource": opt_to_json(witness.script_source.as_ref(), script_source_to_obj),
        "datumSource": match &witness.datum_source {
            Some(source) => datum_source_to_obj(source)?,
            None => Value::Null,
        },
        "redeemer": match &witness.redeemer {
            Some(redeemer) => redeemer_to_obj(redeemer)?,
            None => Value::Null,
        },
    }))
}

fn script_witness_from_obj(value: &Value) -> BuilderResult<ScriptTxInWitness> {
    let obj = as_object(value, "ScriptTxInWitness")?;
    Ok(ScriptTxInWitness {
        script_source: opt_field(obj, "scriptSource").map(script_source_from_obj).transpose()?,
        datum_source: opt_field(obj, "datumSource").map(datum_source_from_obj).transpose()?,
        redeemer: opt_field(obj, "redeemer").map(redeemer_from_obj).transpose()?,
    })
}

/// Incomplete script inputs are refused, matching the accumulator's flush checks
pub fn tx_in_to_obj(tx_in: &TxIn) -> BuilderResult<Value> {
    tx_in.check_complete(EntryKind::Input)?;
    Ok(match tx_in {
        TxIn::PubKey(tx_in) => tagged("pubKeyTxIn", json!({"txIn": tx_in_parameter_to_obj(tx_in)})),
        TxIn::Script(script) => tagged(
            "scriptTxIn",
            json!({
                "txIn": tx_in_parameter_to_obj(&script.tx_in),
                "scriptTxIn": script_witness_to_obj(&script.script_tx_in)?,
            }),
        ),
        TxIn::SimpleScript(simple) => tagged(
            "simpleScriptTxIn",
            json!({
                "txIn": tx_in_parameter_to_obj(&simple.tx_in),
                "simpleScriptTxIn": opt_to_json(
                    simple.simple_script_tx_in.as_ref(),
                    simple_script_source_to_obj,
                ),
            }),
        ),
    })
}

pub fn tx_in_from_obj(value: &Value) -> BuilderResult<TxIn> {
    const ENTITY: &str = "TxIn";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    let tx_in = tx_in_parameter_from_obj(field(obj, ENTITY, "txIn")?)?;
    match key {
        "pubKeyTxIn" => Ok(TxIn::PubKey(tx_in)),
        "scriptTxIn" => Ok(TxIn::Script(ScriptTxIn {
            tx_in,
            script_tx_in: script_witness_from_obj(field(obj, ENTITY, "scriptTxIn")?)?,
        })),
        "simpleScriptTxIn" => Ok(TxIn::SimpleScript(SimpleScriptTxIn {
            tx_in,
            simple_script_tx_in: opt_field(obj, "simpleScriptTxIn")
                .map(simple_script_source_from_obj)
                .transpose()?,
        })),
        _ => Err(unknown(ENTITY, value)),
    }
}

/// Collateral is always key-locked, so the wire form carries only the input itself
pub fn collateral_to_obj(collateral: &TxIn) -> Value {
    json!({"txIn": tx_in_parameter_to_obj(collateral.tx_in())})
}

pub fn collateral_from_obj(value: &Value) -> BuilderResult<TxIn> {
    let obj = as_object(value, "Collateral")?;
    Ok(TxIn::PubKey(tx_in_parameter_from_obj(field(obj, "Collateral", "txIn")?)?))
}

pub fn reference_input_to_obj(input: &ReferenceInput) -> Value {
    let mut obj = json!({
        "txHash": input.tx_hash.to_string(),
        "txIndex": input.tx_index,
    });
    if let Some(size) = input.script_size {
        obj["scriptSize"] = json!(size);
    }
    obj
}

pub fn reference_input_from_obj(value: &Value) -> BuilderResult<ReferenceInput> {
    const ENTITY: &str = "ReferenceInput";
    let obj = as_object(value, ENTITY)?;
    Ok(ReferenceInput {
        tx_hash: hash_field(obj, ENTITY, "txHash")?,
        tx_index: u32_field(obj, ENTITY, "txIndex")?,
        script_size: opt_u64_field(obj, ENTITY, "scriptSize")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;
    use cairn_common::{Asset, BuilderError, DatumSource, SimpleScriptSource};

    fn param() -> TxInParameter {
        TxInParameter {
            amount: Some(vec![Asset::lovelace(10_000_000u64)]),
            address: Some(ADDRESS.to_string()),
            ..TxInParameter::new(tx_hash(), 1)
        }
    }

    #[test]
    fn pub_key_input_wire_shape() {
        let obj = tx_in_to_obj(&TxIn::PubKey(TxInParameter::new(tx_hash(), 4))).unwrap();
        assert_eq!(
            obj,
            json!({"pubKeyTxIn": {"txIn": {
                "txHash": TX_HASH,
                "txIndex": 4,
                "amount": null,
                "address": null,
            }}})
        );
    }

    #[test]
    fn every_input_variant_round_trips() {
        let inputs = vec![
            TxIn::PubKey(param()),
            TxIn::PubKey(TxInParameter {
                script_size: Some(512),
                ..param()
            }),
            TxIn::Script(ScriptTxIn {
                tx_in: param(),
                script_tx_in: ScriptTxInWitness {
                    script_source: Some(provided_script()),
                    datum_source: Some(DatumSource::Inline {
                        tx_hash: tx_hash(),
                        tx_index: 1,
                    }),
                    redeemer: Some(redeemer()),
                },
            }),
            TxIn::SimpleScript(SimpleScriptTxIn {
                tx_in: param(),
                simple_script_tx_in: Some(SimpleScriptSource::Provided {
                    code: SCRIPT_CBOR.to_string(),
                }),
            }),
        ];
        for input in inputs {
            let obj = tx_in_to_obj(&input).unwrap();
            assert_eq!(tx_in_from_obj(&obj).unwrap(), input);
        }
    }

    #[test]
    fn incomplete_script_input_is_refused() {
        let input = TxIn::Script(ScriptTxIn {
            tx_in: param(),
            script_tx_in: ScriptTxInWitness {
                script_source: Some(provided_script()),
                datum_source: None,
                redeemer: Some(redeemer()),
            },
        });
        assert_eq!(
            tx_in_to_obj(&input),
            Err(BuilderError::missing(EntryKind::Input, "datumSource"))
        );
    }

    #[test]
    fn collateral_and_reference_inputs_round_trip() {
        let collateral = TxIn::PubKey(param());
        assert_eq!(collateral_from_obj(&collateral_to_obj(&collateral)).unwrap(), collateral);

        for script_size in [None, Some(2_048)] {
            let reference = ReferenceInput {
                tx_hash: tx_hash(),
                tx_index: 0,
                script_size,
            };
            let obj = reference_input_to_obj(&reference);
            assert_eq!(reference_input_from_obj(&obj).unwrap(), reference);
        }
    }

    #[test]
    fn unknown_input_variant() {
        let obj = json!({"magicTxIn": {"txIn": {"txHash": TX_HASH, "txIndex": 0}}});
        assert_eq!(
            tx_in_from_obj(&obj),
            Err(BuilderError::unknown_variant("TxIn", vec!["magicTxIn".into()]))
        );
    }
}

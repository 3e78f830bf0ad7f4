use cairn_common::{BuilderResult, RefTxIn, UTxO, UtxoOutput};
use serde_json::{Value, json};

use crate::{output::*, utils::*};

pub fn utxo_to_obj(utxo: &UTxO) -> Value {
    let output = &utxo.output;
    json!({
        "input": {
            "txHash": utxo.input.tx_hash.to_string(),
            "outputIndex": utxo.input.tx_index,
        },
        "output": {
            "address": output.address,
            "amount": assets_to_obj(&output.amount),
            "dataHash": output.data_hash,
            "plutusData": output.plutus_data,
            "scriptRef": output.script_ref,
            "scriptHash": output.script_hash.map(|hash| hash.to_string()),
        },
    })
}

pub fn utxo_from_obj(value: &Value) -> BuilderResult<UTxO> {
    const ENTITY: &str = "UTxO";
    let obj = as_object(value, ENTITY)?;
    let input = as_object(field(obj, ENTITY, "input")?, ENTITY)?;
    let output = as_object(field(obj, ENTITY, "output")?, ENTITY)?;
    Ok(UTxO {
        input: RefTxIn {
            tx_hash: hash_field(input, ENTITY, "txHash")?,
            tx_index: u32_field(input, ENTITY, "outputIndex")?,
        },
        output: UtxoOutput {
            address: str_field(output, ENTITY, "address")?,
            amount: assets_from_obj(field(output, ENTITY, "amount")?, ENTITY)?,
            data_hash: opt_str_field(output, ENTITY, "dataHash")?,
            plutus_data: opt_str_field(output, ENTITY, "plutusData")?,
            script_ref: opt_str_field(output, ENTITY, "scriptRef")?,
            script_hash: match opt_field(output, "scriptHash") {
                Some(_) => Some(hash_field(output, ENTITY, "scriptHash")?),
                None => None,
            },
        },
    })
}

pub fn utxos_from_obj(value: &Value) -> BuilderResult<Vec<UTxO>> {
    as_array(value, "UTxO", "utxos")?.iter().map(utxo_from_obj).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::*;
    use cairn_common::Asset;

    #[test]
    fn utxo_round_trips() {
        let utxo = UTxO {
            input: RefTxIn::new(tx_hash(), 7),
            output: UtxoOutput {
                address: ADDRESS.to_string(),
                amount: vec![Asset::lovelace(3_000_000u64), Asset::new(asset_unit(), 60u64)],
                data_hash: None,
                plutus_data: Some("d87980".to_string()),
                script_ref: Some(SCRIPT_CBOR.to_string()),
                script_hash: Some(script_hash()),
            },
        };
        let obj = utxo_to_obj(&utxo);
        assert_eq!(obj["input"]["outputIndex"], json!(7));
        assert_eq!(utxo_from_obj(&obj).unwrap(), utxo);
        assert_eq!(utxos_from_obj(&json!([obj])).unwrap(), vec![utxo]);
    }
}

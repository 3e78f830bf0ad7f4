use cairn_common::{BuilderResult, MintItem, MintParameter, NativeMint, PlutusMint};
use serde_json::{Value, json};

use crate::{script::*, utils::*};

fn mint_parameter_to_obj(mint: &MintParameter) -> Value {
    json!({
        "policyId": mint.policy_id.to_string(),
        "assetName": mint.asset_name,
        "amount": bigint_to_json(&mint.amount),
    })
}

fn mint_parameter_from_obj(value: &Value) -> BuilderResult<MintParameter> {
    const ENTITY: &str = "Mint";
    let obj = as_object(value, ENTITY)?;
    Ok(MintParameter {
        policy_id: hash_field(obj, ENTITY, "policyId")?,
        asset_name: str_field(obj, ENTITY, "assetName")?,
        amount: bigint_field(obj, ENTITY, "amount")?,
    })
}

pub fn mint_item_to_obj(item: &MintItem) -> BuilderResult<Value> {
    item.check_complete()?;
    Ok(match item {
        MintItem::Plutus(plutus) => tagged(
            "scriptMint",
            json!({
                "mint": mint_parameter_to_obj(&plutus.mint),
                "scriptSource": opt_to_json(plutus.script_source.as_ref(), script_source_to_obj),
                "redeemer": match &plutus.redeemer {
                    Some(redeemer) => redeemer_to_obj(redeemer)?,
                    None => Value::Null,
                },
            }),
        ),
        MintItem::Native(native) => tagged(
            "simpleScriptMint",
            json!({
                "mint": mint_parameter_to_obj(&native.mint),
                "scriptSource": opt_to_json(
                    native.script_source.as_ref(),
                    simple_script_source_to_obj,
                ),
            }),
        ),
    })
}

pub fn mint_item_from_obj(value: &Value) -> BuilderResult<MintItem> {
    const ENTITY: &str = "MintItem";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    let mint = mint_parameter_from_obj(field(obj, ENTITY, "mint")?)?;
    match key {
        "scriptMint" => Ok(MintItem::Plutus(PlutusMint {
            mint,
            script_source: opt_field(obj, "scriptSource").map(script_source_from_obj).transpose()?,
            redeemer: opt_field(obj, "redeemer").map(redeemer_from_obj).transpose()?,
        })),
        "simpleScriptMint" => Ok(MintItem::Native(NativeMint {
            mint,
            script_source: opt_field(obj, "scriptSource")
                .map(simple_script_source_from_obj)
                .transpose()?,
        })),
        _ => Err(unknown(ENTITY, value)),
    }
}

use cairn_common::{
    BuilderResult, PubKeyWithdrawal, ScriptWithdrawal, SimpleScriptWithdrawal, Withdrawal,
};
use serde_json::{Value, json};

use crate::{script::*, utils::*};

pub fn withdrawal_to_obj(withdrawal: &Withdrawal) -> BuilderResult<Value> {
    withdrawal.check_complete()?;
    Ok(match withdrawal {
        Withdrawal::PubKey(w) => tagged(
            "pubKeyWithdrawal",
            json!({"address": w.address, "coin": bigint_to_json(&w.coin)}),
        ),
        Withdrawal::Script(w) => tagged(
            "plutusScriptWithdrawal",
            json!({
                "address": w.address,
                "coin": bigint_to_json(&w.coin),
                "scriptSource": opt_to_json(w.script_source.as_ref(), script_source_to_obj),
                "redeemer": match &w.redeemer {
                    Some(redeemer) => redeemer_to_obj(redeemer)?,
                    None => Value::Null,
                },
            }),
        ),
        Withdrawal::SimpleScript(w) => tagged(
            "simpleScriptWithdrawal",
            json!({
                "address": w.address,
                "coin": bigint_to_json(&w.coin),
                "scriptSource": opt_to_json(w.script_source.as_ref(), simple_script_source_to_obj),
            }),
        ),
    })
}

pub fn withdrawal_from_obj(value: &Value) -> BuilderResult<Withdrawal> {
    const ENTITY: &str = "Withdrawal";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    let address = str_field(obj, ENTITY, "address")?;
    let coin = bigint_field(obj, ENTITY, "coin")?;
    match key {
        "pubKeyWithdrawal" => Ok(Withdrawal::PubKey(PubKeyWithdrawal { address, coin })),
        "plutusScriptWithdrawal" => Ok(Withdrawal::Script(ScriptWithdrawal {
            address,
            coin,
            script_source: opt_field(obj, "scriptSource").map(script_source_from_obj).transpose()?,
            redeemer: opt_field(obj, "redeemer").map(redeemer_from_obj).transpose()?,
        })),
        "simpleScriptWithdrawal" => Ok(Withdrawal::SimpleScript(SimpleScriptWithdrawal {
            address,
            coin,
            script_source: opt_field(obj, "scriptSource")
                .map(simple_script_source_from_obj)
                .transpose()?,
        })),
        _ => Err(unknown(ENTITY, value)),
    }
}

//! Script, datum and redeemer sources

use cairn_common::{
    BuilderData, BuilderError, BuilderResult, DatumSource, ExUnits, LanguageVersion, OutputScript,
    Redeemer, RefTxIn, ScriptSource, SimpleScriptSource,
};
use serde_json::{Value, json};

use crate::utils::*;

/// Plutus data must already be CBOR; the serializer normalizes it before conversion
pub fn builder_data_to_obj(data: &BuilderData) -> BuilderResult<Value> {
    data.as_cbor().map(|hex| Value::String(hex.to_string())).ok_or(BuilderError::UnnormalizedData)
}

pub fn builder_data_from_obj(value: &Value, entity: &str) -> BuilderResult<BuilderData> {
    value
        .as_str()
        .map(BuilderData::cbor)
        .ok_or_else(|| BuilderError::invalid_field(entity, "data", "expected CBOR hex"))
}

pub fn language_version_from_obj(obj: &Obj, entity: &str) -> BuilderResult<LanguageVersion> {
    str_field(obj, entity, "languageVersion")?
        .parse()
        .map_err(|e: String| BuilderError::invalid_field(entity, "languageVersion", e))
}

pub fn ref_tx_in_to_obj(ref_tx_in: &RefTxIn) -> Value {
    json!({
        "txHash": ref_tx_in.tx_hash.to_string(),
        "txIndex": ref_tx_in.tx_index,
    })
}

pub fn ref_tx_in_from_obj(value: &Value, entity: &str) -> BuilderResult<RefTxIn> {
    let obj = as_object(value, entity)?;
    Ok(RefTxIn {
        tx_hash: hash_field(obj, entity, "txHash")?,
        tx_index: u32_field(obj, entity, "txIndex")?,
    })
}

pub fn redeemer_to_obj(redeemer: &Redeemer) -> BuilderResult<Value> {
    Ok(json!({
        "data": builder_data_to_obj(&redeemer.data)?,
        "exUnits": {
            "mem": redeemer.ex_units.mem,
            "steps": redeemer.ex_units.steps,
        },
    }))
}

pub fn redeemer_from_obj(value: &Value) -> BuilderResult<Redeemer> {
    let obj = as_object(value, "Redeemer")?;
    let ex_units = as_object(field(obj, "Redeemer", "exUnits")?, "ExUnits")?;
    Ok(Redeemer {
        data: builder_data_from_obj(field(obj, "Redeemer", "data")?, "Redeemer")?,
        ex_units: ExUnits {
            mem: u64_field(ex_units, "ExUnits", "mem")?,
            steps: u64_field(ex_units, "ExUnits", "steps")?,
        },
    })
}

pub fn script_source_to_obj(source: &ScriptSource) -> Value {
    match source {
        ScriptSource::Provided { code, version } => tagged(
            "providedScriptSource",
            json!({
                "scriptCbor": code,
                "languageVersion": version.to_string(),
            }),
        ),
        ScriptSource::ReferenceScript {
            tx_hash,
            tx_index,
            script_hash,
            script_size,
            version,
        } => tagged(
            "inlineScriptSource",
            json!({
                "refTxIn": {"txHash": tx_hash.to_string(), "txIndex": tx_index},
                "scriptHash": script_hash.to_string(),
                "languageVersion": version.to_string(),
                "scriptSize": script_size,
            }),
        ),
        ScriptSource::ByHash {
            script_hash,
            version,
        } => tagged(
            "scriptHashSource",
            json!({
                "scriptHash": script_hash.to_string(),
                "languageVersion": version.to_string(),
            }),
        ),
    }
}

pub fn script_source_from_obj(value: &Value) -> BuilderResult<ScriptSource> {
    const ENTITY: &str = "ScriptSource";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    match key {
        "providedScriptSource" => Ok(ScriptSource::Provided {
            code: str_field(obj, ENTITY, "scriptCbor")?,
            version: language_version_from_obj(obj, ENTITY)?,
        }),
        "inlineScriptSource" => {
            let ref_tx_in = ref_tx_in_from_obj(field(obj, ENTITY, "refTxIn")?, ENTITY)?;
            Ok(ScriptSource::ReferenceScript {
                tx_hash: ref_tx_in.tx_hash,
                tx_index: ref_tx_in.tx_index,
                script_hash: hash_field(obj, ENTITY, "scriptHash")?,
                script_size: u64_field(obj, ENTITY, "scriptSize")?,
                version: language_version_from_obj(obj, ENTITY)?,
            })
        }
        "scriptHashSource" => Ok(ScriptSource::ByHash {
            script_hash: hash_field(obj, ENTITY, "scriptHash")?,
            version: language_version_from_obj(obj, ENTITY)?,
        }),
        _ => Err(unknown(ENTITY, value)),
    }
}

pub fn simple_script_source_to_obj(source: &SimpleScriptSource) -> Value {
    match source {
        SimpleScriptSource::Provided { code } => {
            tagged("providedSimpleScriptSource", json!({"scriptCbor": code}))
        }
        SimpleScriptSource::ReferenceScript {
            tx_hash,
            tx_index,
            script_hash,
            script_size,
        } => tagged(
            "inlineSimpleScriptSource",
            json!({
                "refTxIn": {"txHash": tx_hash.to_string(), "txIndex": tx_index},
                "simpleScriptHash": script_hash.to_string(),
                "scriptSize": script_size,
            }),
        ),
    }
}

pub fn simple_script_source_from_obj(value: &Value) -> BuilderResult<SimpleScriptSource> {
    const ENTITY: &str = "SimpleScriptSource";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    match key {
        "providedSimpleScriptSource" => Ok(SimpleScriptSource::Provided {
            code: str_field(obj, ENTITY, "scriptCbor")?,
        }),
        "inlineSimpleScriptSource" => {
            let ref_tx_in = ref_tx_in_from_obj(field(obj, ENTITY, "refTxIn")?, ENTITY)?;
            Ok(SimpleScriptSource::ReferenceScript {
                tx_hash: ref_tx_in.tx_hash,
                tx_index: ref_tx_in.tx_index,
                script_hash: hash_field(obj, ENTITY, "simpleScriptHash")?,
                script_size: u64_field(obj, ENTITY, "scriptSize")?,
            })
        }
        _ => Err(unknown(ENTITY, value)),
    }
}

pub fn datum_source_to_obj(source: &DatumSource) -> BuilderResult<Value> {
    Ok(match source {
        DatumSource::Provided { data } => {
            tagged("providedDatumSource", json!({"data": builder_data_to_obj(data)?}))
        }
        DatumSource::Inline { tx_hash, tx_index } => tagged(
            "inlineDatumSource",
            json!({"txHash": tx_hash.to_string(), "txIndex": tx_index}),
        ),
    })
}

pub fn datum_source_from_obj(value: &Value) -> BuilderResult<DatumSource> {
    const ENTITY: &str = "DatumSource";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    match key {
        "providedDatumSource" => Ok(DatumSource::Provided {
            data: builder_data_from_obj(field(obj, ENTITY, "data")?, ENTITY)?,
        }),
        "inlineDatumSource" => Ok(DatumSource::Inline {
            tx_hash: hash_field(obj, ENTITY, "txHash")?,
            tx_index: u32_field(obj, ENTITY, "txIndex")?,
        }),
        _ => Err(unknown(ENTITY, value)),
    }
}

pub fn output_script_to_obj(script: &OutputScript) -> Value {
    match script {
        OutputScript::Plutus { code, version } => tagged(
            "providedScriptSource",
            json!({"scriptCbor": code, "languageVersion": version.to_string()}),
        ),
        OutputScript::Native { code } => {
            tagged("providedSimpleScriptSource", json!({"scriptCbor": code}))
        }
    }
}

pub fn output_script_from_obj(value: &Value) -> BuilderResult<OutputScript> {
    const ENTITY: &str = "ReferenceScript";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    match key {
        "providedScriptSource" => Ok(OutputScript::Plutus {
            code: str_field(obj, ENTITY, "scriptCbor")?,
            version: language_version_from_obj(obj, ENTITY)?,
        }),
        "providedSimpleScriptSource" => Ok(OutputScript::Native {
            code: str_field(obj, ENTITY, "scriptCbor")?,
        }),
        _ => Err(unknown(ENTITY, value)),
    }
}

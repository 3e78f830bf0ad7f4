use cairn_common::{BuilderError, BuilderResult, Metadatum, TxMetadata};
use serde_json::{Value, json};

use crate::utils::*;

pub fn metadatum_to_obj(metadatum: &Metadatum) -> Value {
    match metadatum {
        Metadatum::Int(n) => tagged("int", bigint_to_json(n)),
        Metadatum::Bytes(bytes) => tagged("bytes", Value::String(hex::encode(bytes))),
        Metadatum::Text(text) => tagged("string", Value::String(text.clone())),
        Metadatum::Array(items) => {
            tagged("list", Value::Array(items.iter().map(metadatum_to_obj).collect()))
        }
        Metadatum::Map(entries) => tagged(
            "map",
            Value::Array(
                entries
                    .iter()
                    .map(|(k, v)| json!({"k": metadatum_to_obj(k), "v": metadatum_to_obj(v)}))
                    .collect(),
            ),
        ),
    }
}

pub fn metadatum_from_obj(value: &Value) -> BuilderResult<Metadatum> {
    const ENTITY: &str = "Metadatum";
    let (key, inner) = variant(value, ENTITY)?;
    match key {
        "int" => Ok(Metadatum::Int(bigint_from_json(inner, ENTITY, "int")?)),
        "bytes" => {
            let hex = inner
                .as_str()
                .ok_or_else(|| BuilderError::invalid_field(ENTITY, "bytes", "expected hex"))?;
            hex::decode(hex)
                .map(Metadatum::Bytes)
                .map_err(|e| BuilderError::invalid_field(ENTITY, "bytes", e.to_string()))
        }
        "string" => inner
            .as_str()
            .map(|text| Metadatum::Text(text.to_string()))
            .ok_or_else(|| BuilderError::invalid_field(ENTITY, "string", "expected text")),
        "list" => as_array(inner, ENTITY, "list")?
            .iter()
            .map(metadatum_from_obj)
            .collect::<BuilderResult<Vec<_>>>()
            .map(Metadatum::Array),
        "map" => as_array(inner, ENTITY, "map")?
            .iter()
            .map(|entry| {
                let entry = as_object(entry, ENTITY)?;
                Ok((
                    metadatum_from_obj(field(entry, ENTITY, "k")?)?,
                    metadatum_from_obj(field(entry, ENTITY, "v")?)?,
                ))
            })
            .collect::<BuilderResult<Vec<_>>>()
            .map(Metadatum::Map),
        _ => Err(unknown(ENTITY, value)),
    }
}

/// Labels travel as decimal strings, like the quantities in asset lists
pub fn metadata_to_obj(metadata: &[TxMetadata]) -> Value {
    Value::Array(
        metadata
            .iter()
            .map(|entry| {
                json!({
                    "tag": entry.tag.to_string(),
                    "metadata": metadatum_to_obj(&entry.value),
                })
            })
            .collect(),
    )
}

pub fn metadata_from_obj(value: &Value) -> BuilderResult<Vec<TxMetadata>> {
    const ENTITY: &str = "Metadata";
    as_array(value, ENTITY, "metadata")?
        .iter()
        .map(|entry| {
            let obj = as_object(entry, ENTITY)?;
            Ok(TxMetadata {
                tag: u64_field(obj, ENTITY, "tag")?,
                value: metadatum_from_obj(field(obj, ENTITY, "metadata")?)?,
            })
        })
        .collect()
}

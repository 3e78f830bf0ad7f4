use cairn_common::{Asset, BuilderResult, DatumKind, Output, OutputDatum};
use serde_json::{Value, json};

use crate::{script::*, utils::*};

/// Asset lists carry quantities as decimal strings
pub fn assets_to_obj(assets: &[Asset]) -> Value {
    Value::Array(
        assets
            .iter()
            .map(|asset| json!({"unit": asset.unit, "quantity": asset.quantity.to_string()}))
            .collect(),
    )
}

pub fn assets_from_obj(value: &Value, entity: &str) -> BuilderResult<Vec<Asset>> {
    as_array(value, entity, "amount")?
        .iter()
        .map(|item| {
            let obj = as_object(item, "Asset")?;
            Ok(Asset {
                unit: str_field(obj, "Asset", "unit")?,
                quantity: bigint_field(obj, "Asset", "quantity")?,
            })
        })
        .collect()
}

pub fn output_datum_to_obj(datum: &OutputDatum) -> BuilderResult<Value> {
    let key = match datum.kind {
        DatumKind::Hash => "hash",
        DatumKind::Inline => "inline",
        DatumKind::Embedded => "embedded",
    };
    Ok(tagged(key, builder_data_to_obj(&datum.data)?))
}

pub fn output_datum_from_obj(value: &Value) -> BuilderResult<OutputDatum> {
    const ENTITY: &str = "Datum";
    let (key, inner) = variant(value, ENTITY)?;
    let kind = match key {
        "hash" => DatumKind::Hash,
        "inline" => DatumKind::Inline,
        "embedded" => DatumKind::Embedded,
        _ => return Err(unknown(ENTITY, value)),
    };
    Ok(OutputDatum {
        kind,
        data: builder_data_from_obj(inner, ENTITY)?,
    })
}

pub fn output_to_obj(output: &Output) -> BuilderResult<Value> {
    Ok(json!({
        "address": output.address,
        "amount": assets_to_obj(&output.amount),
        "datum": match &output.datum {
            Some(datum) => output_datum_to_obj(datum)?,
            None => Value::Null,
        },
        "referenceScript": opt_to_json(output.reference_script.as_ref(), output_script_to_obj),
    }))
}

pub fn output_from_obj(value: &Value) -> BuilderResult<Output> {
    const ENTITY: &str = "Output";
    let obj = as_object(value, ENTITY)?;
    Ok(Output {
        address: str_field(obj, ENTITY, "address")?,
        amount: match opt_field(obj, "amount") {
            Some(amount) => assets_from_obj(amount, ENTITY)?,
            None => Vec::new(),
        },
        datum: opt_field(obj, "datum").map(output_datum_from_obj).transpose()?,
        reference_script: opt_field(obj, "referenceScript")
            .map(output_script_from_obj)
            .transpose()?,
    })
}

/// Outputs are checked for value on the way out, so an empty one never reaches the engine
pub fn checked_output_to_obj(output: &Output) -> BuilderResult<Value> {
    output.check_value()?;
    output_to_obj(output)
}

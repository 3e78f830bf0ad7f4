use cairn_common::{BuilderError, BuilderResult, hash::Hash};
use dashu_int::IBig;
use serde_json::{Map, Number, Value};

pub type Obj = Map<String, Value>;

/// Wrap `inner` in a single-key object naming the variant
pub fn tagged(key: &str, inner: Value) -> Value {
    let mut obj = Obj::new();
    obj.insert(key.to_string(), inner);
    Value::Object(obj)
}

/// Split a single-key wrapper object into its key and payload
pub fn variant<'a>(value: &'a Value, entity: &str) -> BuilderResult<(&'a str, &'a Value)> {
    match value {
        Value::Object(obj) if obj.len() == 1 => {
            let (key, inner) = obj.iter().next().ok_or_else(|| unknown(entity, value))?;
            Ok((key.as_str(), inner))
        }
        _ => Err(unknown(entity, value)),
    }
}

/// `UnknownVariant` carrying whatever keys the object had
pub fn unknown(entity: &str, value: &Value) -> BuilderError {
    let keys = match value {
        Value::Object(obj) => obj.keys().cloned().collect(),
        _ => Vec::new(),
    };
    BuilderError::unknown_variant(entity, keys)
}

pub fn as_object<'a>(value: &'a Value, entity: &str) -> BuilderResult<&'a Obj> {
    value
        .as_object()
        .ok_or_else(|| BuilderError::invalid_field(entity, "", "expected an object"))
}

pub fn as_array<'a>(value: &'a Value, entity: &str, name: &str) -> BuilderResult<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| BuilderError::invalid_field(entity, name, "expected an array"))
}

/// A present, non-null field
pub fn field<'a>(obj: &'a Obj, entity: &str, name: &str) -> BuilderResult<&'a Value> {
    opt_field(obj, name).ok_or_else(|| BuilderError::invalid_field(entity, name, "missing"))
}

/// A field that may be absent or null
pub fn opt_field<'a>(obj: &'a Obj, name: &str) -> Option<&'a Value> {
    obj.get(name).filter(|value| !value.is_null())
}

pub fn str_field(obj: &Obj, entity: &str, name: &str) -> BuilderResult<String> {
    field(obj, entity, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| BuilderError::invalid_field(entity, name, "expected a string"))
}

pub fn opt_str_field(obj: &Obj, entity: &str, name: &str) -> BuilderResult<Option<String>> {
    match opt_field(obj, name) {
        Some(_) => str_field(obj, entity, name).map(Some),
        None => Ok(None),
    }
}

pub fn u64_field(obj: &Obj, entity: &str, name: &str) -> BuilderResult<u64> {
    let value = field(obj, entity, name)?;
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| BuilderError::invalid_field(entity, name, "expected an unsigned integer"))
}

pub fn opt_u64_field(obj: &Obj, entity: &str, name: &str) -> BuilderResult<Option<u64>> {
    match opt_field(obj, name) {
        Some(_) => u64_field(obj, entity, name).map(Some),
        None => Ok(None),
    }
}

pub fn u32_field(obj: &Obj, entity: &str, name: &str) -> BuilderResult<u32> {
    u32::try_from(u64_field(obj, entity, name)?)
        .map_err(|_| BuilderError::invalid_field(entity, name, "out of range"))
}

pub fn hash_field<const N: usize>(obj: &Obj, entity: &str, name: &str) -> BuilderResult<Hash<N>> {
    str_field(obj, entity, name)?
        .parse()
        .map_err(|e: hex::FromHexError| BuilderError::invalid_field(entity, name, e.to_string()))
}

pub fn hex_field(obj: &Obj, entity: &str, name: &str) -> BuilderResult<Vec<u8>> {
    hex::decode(str_field(obj, entity, name)?)
        .map_err(|e| BuilderError::invalid_field(entity, name, e.to_string()))
}

/// Emit an unbounded integer as a JSON number carrying its exact digits
pub fn bigint_to_json(n: &IBig) -> Value {
    let digits = n.to_string();
    match digits.parse::<Number>() {
        Ok(number) => Value::Number(number),
        Err(_) => Value::String(digits),
    }
}

/// Read an unbounded integer from a JSON number or decimal string, never via floating point
pub fn bigint_from_json(value: &Value, entity: &str, name: &str) -> BuilderResult<IBig> {
    let digits = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => return Err(BuilderError::invalid_field(entity, name, "expected an integer")),
    };
    digits.parse().map_err(|_| {
        BuilderError::invalid_field(entity, name, format!("'{digits}' is not an integer"))
    })
}

pub fn bigint_field(obj: &Obj, entity: &str, name: &str) -> BuilderResult<IBig> {
    bigint_from_json(field(obj, entity, name)?, entity, name)
}

pub fn opt_to_json<T>(value: Option<T>, f: impl FnOnce(T) -> Value) -> Value {
    value.map(f).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn variant_requires_exactly_one_key() {
        let value = json!({"pubKeyTxIn": {}});
        assert_eq!(variant(&value, "TxIn").unwrap().0, "pubKeyTxIn");

        let value = json!({"a": 1, "b": 2});
        assert_eq!(
            variant(&value, "TxIn"),
            Err(BuilderError::unknown_variant("TxIn", vec!["a".into(), "b".into()]))
        );
        assert!(variant(&json!("x"), "TxIn").is_err());
    }

    #[test]
    fn bigints_keep_every_digit() {
        let big: IBig = "123456789012345678901234567890".parse().unwrap();
        let value = bigint_to_json(&big);
        assert!(value.is_number());
        assert_eq!(value.to_string(), "123456789012345678901234567890");
        assert_eq!(bigint_from_json(&value, "X", "n").unwrap(), big);

        let negative: IBig = "-98765432109876543210".parse().unwrap();
        assert_eq!(bigint_from_json(&bigint_to_json(&negative), "X", "n").unwrap(), negative);
    }

    #[test]
    fn bigints_parse_from_strings_and_reject_fractions() {
        assert_eq!(bigint_from_json(&json!("42"), "X", "n").unwrap(), IBig::from(42));
        assert!(bigint_from_json(&json!(1.5), "X", "n").is_err());
        assert!(bigint_from_json(&json!(true), "X", "n").is_err());
    }

    #[test]
    fn null_fields_count_as_absent() {
        let obj = json!({"address": null, "txIndex": "3"});
        let obj = obj.as_object().unwrap();
        assert_eq!(opt_str_field(obj, "TxIn", "address").unwrap(), None);
        assert_eq!(u32_field(obj, "TxIn", "txIndex").unwrap(), 3);
        assert!(str_field(obj, "TxIn", "txHash").is_err());
    }
}

use cairn_common::{BuilderError, BuilderResult, Network};
use serde_json::Value;

/// Named networks travel as strings, custom ones as the bare cost model rows
pub fn network_to_obj(network: &Network) -> Value {
    match network {
        Network::Custom(rows) => Value::Array(
            rows.iter()
                .map(|row| Value::Array(row.iter().map(|n| Value::from(*n)).collect()))
                .collect(),
        ),
        named => Value::String(named.name().unwrap_or("mainnet").to_string()),
    }
}

pub fn network_from_obj(value: &Value) -> BuilderResult<Network> {
    match value {
        Value::String(name) => name
            .parse()
            .map_err(|e: String| BuilderError::invalid_field("Network", "network", e)),
        Value::Array(rows) => rows
            .iter()
            .map(|row| {
                row.as_array()
                    .and_then(|row| row.iter().map(Value::as_i64).collect::<Option<Vec<_>>>())
                    .ok_or_else(|| {
                        BuilderError::invalid_field("Network", "custom", "expected integer rows")
                    })
            })
            .collect::<BuilderResult<Vec<_>>>()
            .map(Network::Custom),
        _ => Err(crate::utils::unknown("Network", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn named_network_round_trips() {
        let obj = network_to_obj(&Network::Mainnet);
        assert_eq!(obj, json!("mainnet"));
        assert_eq!(network_from_obj(&obj).unwrap(), Network::Mainnet);
        assert_eq!(network_from_obj(&json!("preprod")).unwrap(), Network::Preprod);
    }

    #[test]
    fn custom_network_round_trips() {
        let network = Network::Custom(vec![vec![1, 2], vec![3, 4]]);
        let obj = network_to_obj(&network);
        assert_eq!(obj, json!([[1, 2], [3, 4]]));
        assert_eq!(network_from_obj(&obj).unwrap(), network);
    }

    #[test]
    fn empty_custom_network_round_trips() {
        let network = Network::Custom(vec![]);
        assert_eq!(network_from_obj(&network_to_obj(&network)).unwrap(), network);
    }

    #[test]
    fn malformed_networks_are_rejected() {
        assert!(network_from_obj(&json!("atlantis")).is_err());
        assert!(network_from_obj(&json!([[1, "x"]])).is_err());
        assert!(network_from_obj(&json!(7)).is_err());
    }
}

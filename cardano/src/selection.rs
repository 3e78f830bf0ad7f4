//! Greedy UTxO selection covering a body's value deficit

use std::collections::BTreeSet;

use cairn_common::{
    check_unit, merge_unit, BuilderError, BuilderResult, Coin, Deficit, TxBuilderBody, TxIn,
    TxInParameter, UTxO, Value, LOVELACE,
};
use tracing::debug;

/// Outputs minus what the inputs already bring minus what is minted. Burns count as
/// requirements. Negative entries are surplus.
pub fn required_value(body: &TxBuilderBody) -> BuilderResult<Value> {
    let mut required = Value::new();
    for output in &body.outputs {
        required += &output.value()?;
    }
    for input in &body.inputs {
        required -= &input.tx_in().value()?;
    }
    for mint in &body.mints {
        let mint = mint.mint();
        let unit = merge_unit(&mint.policy_id, &mint.asset_name);
        check_unit(&unit)?;
        required.sub_unit(&unit, &mint.amount);
    }
    Ok(required)
}

/// Walk `pool` in order, taking every UTxO that holds a unit still in deficit, until the
/// requirement plus `threshold` lovelace is covered
pub fn select_utxos(pool: &[UTxO], required: &Value, threshold: &Coin) -> BuilderResult<Vec<UTxO>> {
    let mut remaining = required.clone();
    remaining.add_unit(LOVELACE, threshold);

    let mut selected = Vec::new();
    for utxo in pool {
        if !remaining.has_positive() {
            break;
        }
        let value = Value::try_from_assets(&utxo.output.amount)?;
        let covers_deficit = value
            .units()
            .iter()
            .any(|(unit, quantity)| *quantity > Coin::ZERO && remaining.get(unit) > Coin::ZERO);
        if covers_deficit {
            remaining -= &value;
            selected.push(utxo.clone());
        }
    }

    if remaining.has_positive() {
        let deficit = remaining.positive_part().units().into_iter().collect();
        return Err(BuilderError::InsufficientFunds(Deficit(deficit)));
    }
    Ok(selected)
}

/// Select from `pool` for `body` and append the picks as key inputs. UTxOs the body already
/// spends are never picked twice.
pub fn add_selected_inputs(
    body: &mut TxBuilderBody,
    pool: &[UTxO],
    threshold: &Coin,
) -> BuilderResult<usize> {
    let spent: BTreeSet<_> = body.inputs.iter().map(|input| input.tx_in().key()).collect();
    let available: Vec<UTxO> = pool
        .iter()
        .filter(|utxo| !spent.contains(&(utxo.input.tx_hash, utxo.input.tx_index)))
        .cloned()
        .collect();

    let selected = select_utxos(&available, &required_value(body)?, threshold)?;
    for utxo in &selected {
        debug!("Selected {}", utxo.input);
        body.inputs.push(TxIn::PubKey(TxInParameter::from(utxo)));
    }
    Ok(selected.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_common::{
        Asset, MintItem, MintParameter, NativeMint, Output, Quantity, RefTxIn, TxHash, UtxoOutput,
    };

    const ADDRESS: &str = "addr_test1qpvx0sacufuypa2k4sngk7q40zc5c4npl337uusdh64kv0uafhxhu32dys6pvn6wlw8dav6cmp4pmtv7cc3yel9uu0nq93swx9";
    const POLICY_A: &str = "d441227553a0f1a965fee7d60a0f724b368dd1bddbc208730fccebcf";

    fn utxo(index: u32, amount: Vec<Asset>) -> UTxO {
        UTxO {
            input: RefTxIn::new(TxHash::default(), index),
            output: UtxoOutput {
                address: ADDRESS.to_string(),
                amount,
                ..Default::default()
            },
        }
    }

    fn token(quantity: u64) -> Asset {
        Asset::new(format!("{POLICY_A}01"), quantity)
    }

    #[test]
    fn asset_deficit_takes_exactly_the_holder() {
        let required = Value::from_assets(&[token(50)]);
        let pool = vec![
            utxo(0, vec![Asset::lovelace(9_000_000u64)]),
            utxo(1, vec![Asset::lovelace(2_000_000u64), token(60)]),
        ];
        let selected = select_utxos(&pool, &required, &Coin::ZERO).unwrap();
        assert_eq!(selected, vec![pool[1].clone()]);
    }

    #[test]
    fn threshold_is_added_to_lovelace() {
        let required = Value::from_lovelace(1_000_000u64);
        let pool = vec![
            utxo(0, vec![Asset::lovelace(3_000_000u64)]),
            utxo(1, vec![Asset::lovelace(4_000_000u64)]),
            utxo(2, vec![Asset::lovelace(5_000_000u64)]),
        ];
        let selected = select_utxos(&pool, &required, &Coin::from(5_000_000)).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn exhausted_pool_reports_remaining_deficit() {
        let required = Value::from_assets(&[Asset::lovelace(1_000_000u64), token(50)]);
        let pool = vec![utxo(0, vec![Asset::lovelace(2_000_000u64), token(20)])];
        let Err(BuilderError::InsufficientFunds(Deficit(deficit))) =
            select_utxos(&pool, &required, &Coin::ZERO)
        else {
            panic!("expected insufficient funds");
        };
        assert_eq!(deficit.len(), 1);
        assert_eq!(deficit[&format!("{POLICY_A}01")], Quantity::from(30));
    }

    #[test]
    fn malformed_pool_unit_is_rejected() {
        let required = Value::from_lovelace(1_000_000u64);
        let pool = vec![utxo(0, vec![Asset::lovelace(3_000_000u64), Asset::new("xyz", 5u64)])];
        assert!(matches!(
            select_utxos(&pool, &required, &Coin::ZERO),
            Err(BuilderError::InvalidField { ref entity, .. }) if entity == "Asset"
        ));
    }

    #[test]
    fn required_value_nets_inputs_and_mints() {
        let mut body = TxBuilderBody::new();
        body.outputs.push(Output::new(ADDRESS, vec![Asset::lovelace(2_000_000u64), token(10)]));
        body.inputs.push(TxIn::PubKey(TxInParameter::from(&utxo(
            0,
            vec![Asset::lovelace(500_000u64)],
        ))));
        body.mints.push(MintItem::Native(NativeMint {
            mint: MintParameter {
                policy_id: POLICY_A.parse().unwrap(),
                asset_name: "01".to_string(),
                amount: Quantity::from(10),
            },
            script_source: None,
        }));
        assert_eq!(required_value(&body), Ok(Value::from_lovelace(1_500_000u64)));
    }

    #[test]
    fn already_spent_utxos_are_skipped() {
        let mut body = TxBuilderBody::new();
        let pool = vec![
            utxo(0, vec![Asset::lovelace(3_000_000u64)]),
            utxo(1, vec![Asset::lovelace(3_000_000u64)]),
        ];
        body.inputs.push(TxIn::PubKey(TxInParameter::new(TxHash::default(), 0)));
        body.outputs.push(Output::new(ADDRESS, vec![Asset::lovelace(1_000_000u64)]));

        let added = add_selected_inputs(&mut body, &pool, &Coin::ZERO).unwrap();
        assert_eq!(added, 1);
        assert_eq!(body.inputs[1], TxIn::PubKey(TxInParameter::from(&pool[1])));
    }
}

//! Fee estimation against placeholder witnesses

use std::collections::BTreeSet;

use cairn_common::{
    address::{byron_attributes, is_byron, signing_key_hash},
    rational_number::ceil_of_sum,
    BuilderResult, Coin, KeyHash, ProtocolParams, TxBuilderBody, TxIn, Withdrawal,
};
use tracing::debug;

use crate::witness::{add_witnesses, BootstrapWitness, VKeyWitness};

/// Who is expected to sign a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedSigners {
    pub vkeys: usize,

    /// Byron addresses, one bootstrap witness each
    pub bootstraps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimate {
    /// Size in bytes of the transaction with placeholder witnesses
    pub size: u64,
    pub fee: Coin,
}

fn input_addresses(body: &TxBuilderBody) -> impl Iterator<Item = &str> {
    body.inputs
        .iter()
        .chain(&body.collaterals)
        .filter(|input| matches!(input, TxIn::PubKey(_)))
        .filter_map(|input| input.tx_in().address.as_deref())
}

pub fn expected_signers(body: &TxBuilderBody) -> ExpectedSigners {
    let vkeys = match body.expected_key_witnesses {
        Some(count) => count,
        None => {
            let mut hashes: BTreeSet<KeyHash> =
                input_addresses(body).filter_map(signing_key_hash).collect();
            hashes.extend(body.required_signatures.iter().copied());
            hashes.extend(
                body.withdrawals
                    .iter()
                    .filter(|w| matches!(w, Withdrawal::PubKey(_)))
                    .filter_map(|w| signing_key_hash(w.address())),
            );
            hashes.len().max(body.signing_keys.len())
        }
    };

    let mut bootstraps: Vec<String> = Vec::new();
    let byron = input_addresses(body).filter(|address| is_byron(address)).map(str::to_string);
    for address in byron.chain(body.bootstrap_witnesses.iter().cloned()) {
        if !bootstraps.contains(&address) {
            bootstraps.push(address);
        }
    }

    ExpectedSigners { vkeys, bootstraps }
}

/// The unsigned transaction with one placeholder witness per expected signer
pub fn mock_witnessed(tx: &[u8], signers: &ExpectedSigners) -> BuilderResult<Vec<u8>> {
    let vkeys: Vec<_> = (0..signers.vkeys).map(VKeyWitness::placeholder).collect();
    let bootstraps = signers
        .bootstraps
        .iter()
        .enumerate()
        .map(|(index, address)| {
            Ok(BootstrapWitness::placeholder(index, byron_attributes(address)?))
        })
        .collect::<BuilderResult<Vec<_>>>()?;
    add_witnesses(tx, &vkeys, &bootstraps)
}

/// `ceil(Σ priceMem*mem + priceStep*steps)` over every redeemer in the body
pub fn script_execution_cost(body: &TxBuilderBody, params: &ProtocolParams) -> Coin {
    let terms = body.redeemers().into_iter().flat_map(|redeemer| {
        [
            (params.price_mem, redeemer.ex_units.mem),
            (params.price_step, redeemer.ex_units.steps),
        ]
    });
    ceil_of_sum(terms)
}

pub fn reference_script_cost(body: &TxBuilderBody, params: &ProtocolParams) -> Coin {
    Coin::from(params.min_fee_ref_script_cost_per_byte) * Coin::from(body.referenced_script_bytes())
}

/// Minimum fee for a transaction of `size` bytes carrying `body`'s scripts
pub fn min_fee(size: u64, body: &TxBuilderBody, params: &ProtocolParams) -> Coin {
    let linear = Coin::from(params.min_fee_a) * Coin::from(size) + Coin::from(params.min_fee_b);
    linear + script_execution_cost(body, params) + reference_script_cost(body, params)
}

/// Size and minimum fee of `tx` once every expected signer has witnessed it
pub fn estimate_fee(
    tx: &[u8],
    body: &TxBuilderBody,
    params: &ProtocolParams,
) -> BuilderResult<FeeEstimate> {
    let signers = expected_signers(body);
    let size = mock_witnessed(tx, &signers)?.len() as u64;
    let fee = min_fee(size, body, params);
    debug!(
        "Fee estimate {fee} for {size} bytes, {} key and {} bootstrap signers",
        signers.vkeys,
        signers.bootstraps.len()
    );
    Ok(FeeEstimate { size, fee })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::witness::tests::unsigned_tx;
    use cairn_common::{
        Asset, BuilderData, ExUnits, PubKeyWithdrawal, Redeemer, ReferenceInput, TxHash,
        TxInParameter,
    };

    const SHELLEY: &str = "addr_test1qpvx0sacufuypa2k4sngk7q40zc5c4npl337uusdh64kv0uafhxhu32dys6pvn6wlw8dav6cmp4pmtv7cc3yel9uu0nq93swx9";
    const STAKE: &str = "stake_test1ur5affkzhze7ru98chv78vh35rya3elk5k6v85hp7z5m33ck3l9w3";
    const BYRON: &str = "Ae2tdPwUPEZ4YjgvykNpoFeYUxoyhNj2kg8KfKWN2FizsSpLUPv68MpTVDo";

    fn input(index: u32, address: &str) -> TxIn {
        TxIn::PubKey(TxInParameter {
            amount: Some(vec![Asset::lovelace(2_000_000u64)]),
            address: Some(address.to_string()),
            ..TxInParameter::new(TxHash::default(), index)
        })
    }

    #[test]
    fn signers_are_distinct_key_hashes() {
        let mut body = TxBuilderBody::new();
        body.inputs = vec![input(0, SHELLEY), input(1, SHELLEY)];
        body.collaterals = vec![input(2, SHELLEY)];
        assert_eq!(expected_signers(&body).vkeys, 1);

        body.withdrawals.push(Withdrawal::PubKey(PubKeyWithdrawal {
            address: STAKE.to_string(),
            coin: Coin::ZERO,
        }));
        body.required_signatures.push(KeyHash::default());
        assert_eq!(expected_signers(&body).vkeys, 3);
    }

    #[test]
    fn signing_keys_bound_and_override_wins() {
        let mut body = TxBuilderBody::new();
        body.inputs = vec![input(0, SHELLEY)];
        body.signing_keys = vec!["a".into(), "b".into()];
        assert_eq!(expected_signers(&body).vkeys, 2);

        body.expected_key_witnesses = Some(5);
        assert_eq!(expected_signers(&body).vkeys, 5);
    }

    #[test]
    fn byron_inputs_need_bootstrap_witnesses() {
        let mut body = TxBuilderBody::new();
        body.inputs = vec![input(0, BYRON), input(1, BYRON)];
        body.bootstrap_witnesses = vec![BYRON.to_string()];
        let signers = expected_signers(&body);
        assert_eq!(signers.vkeys, 0);
        assert_eq!(signers.bootstraps, vec![BYRON.to_string()]);

        let tx = unsigned_tx();
        let mocked = mock_witnessed(&tx, &signers).unwrap();
        assert_eq!(mocked.len(), tx.len() + 2 + 137);
    }

    #[test]
    fn each_extra_signer_costs_101_bytes() {
        let params = ProtocolParams::default();
        let tx = unsigned_tx();
        let mut body = TxBuilderBody::new();

        let mut previous: Option<FeeEstimate> = None;
        for signers in 1..6 {
            body.expected_key_witnesses = Some(signers);
            let estimate = estimate_fee(&tx, &body, &params).unwrap();
            if let Some(previous) = previous {
                assert_eq!(estimate.size, previous.size + 101);
                assert_eq!(estimate.fee.clone() - &previous.fee, Coin::from(44 * 101));
            }
            previous = Some(estimate);
        }
    }

    #[test]
    fn fee_adds_execution_and_reference_script_costs() {
        let params = ProtocolParams::default();
        let mut body = TxBuilderBody::new();
        let base = min_fee(200, &body, &params);
        assert_eq!(base, Coin::from(44 * 200 + 155_381));

        body.mints.push(cairn_common::MintItem::Plutus(cairn_common::PlutusMint {
            mint: cairn_common::MintParameter {
                policy_id: Default::default(),
                asset_name: String::new(),
                amount: 1.into(),
            },
            script_source: None,
            redeemer: Some(Redeemer {
                data: BuilderData::cbor("d87980"),
                ex_units: ExUnits::new(1_000_000, 500_000_000),
            }),
        }));
        body.reference_inputs.push(ReferenceInput {
            tx_hash: TxHash::default(),
            tx_index: 0,
            script_size: Some(1_000),
        });
        assert_eq!(
            min_fee(200, &body, &params),
            base + Coin::from(93_750) + Coin::from(15_000)
        );
    }
}

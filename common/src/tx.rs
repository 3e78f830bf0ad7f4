//! The transaction body under construction and its entry types

use crate::{
    asset::{Asset, Value},
    certificate::Certificate,
    error::{BuilderError, BuilderResult, EntryKind},
    hash::{KeyHash, PolicyId, TxHash},
    metadata::TxMetadata,
    script::{BuilderData, DatumSource, OutputScript, Redeemer, ScriptSource, SimpleScriptSource},
    types::{Coin, Network, Quantity, ReferenceInput, Slot, UTxO},
    vote::Vote,
};

// === Inputs ===

/// Fields shared by every kind of input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxInParameter {
    pub tx_hash: TxHash,
    pub tx_index: u32,

    /// Value held by the spent output, when known
    pub amount: Option<Vec<Asset>>,

    /// Address of the spent output, when known
    pub address: Option<String>,

    /// Size of a reference script held by the spent output
    pub script_size: Option<u64>,
}

impl TxInParameter {
    pub fn new(tx_hash: TxHash, tx_index: u32) -> Self {
        Self {
            tx_hash,
            tx_index,
            amount: None,
            address: None,
            script_size: None,
        }
    }

    pub fn key(&self) -> (TxHash, u32) {
        (self.tx_hash, self.tx_index)
    }

    /// Value of the resolved amount, empty while the amount is unknown
    pub fn value(&self) -> BuilderResult<Value> {
        match self.amount.as_deref() {
            Some(amount) => Value::try_from_assets(amount),
            None => Ok(Value::default()),
        }
    }
}

impl From<&UTxO> for TxInParameter {
    fn from(utxo: &UTxO) -> Self {
        Self {
            tx_hash: utxo.input.tx_hash,
            tx_index: utxo.input.tx_index,
            amount: Some(utxo.output.amount.clone()),
            address: Some(utxo.output.address.clone()),
            script_size: utxo.script_size(),
        }
    }
}

/// Everything needed to spend a Plutus-locked output
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ScriptTxInWitness {
    pub script_source: Option<ScriptSource>,
    pub datum_source: Option<DatumSource>,
    pub redeemer: Option<Redeemer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTxIn {
    pub tx_in: TxInParameter,
    pub script_tx_in: ScriptTxInWitness,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleScriptTxIn {
    pub tx_in: TxInParameter,
    pub simple_script_tx_in: Option<SimpleScriptSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxIn {
    PubKey(TxInParameter),
    Script(ScriptTxIn),
    SimpleScript(SimpleScriptTxIn),
}

impl TxIn {
    pub fn tx_in(&self) -> &TxInParameter {
        match self {
            TxIn::PubKey(tx_in) => tx_in,
            TxIn::Script(script) => &script.tx_in,
            TxIn::SimpleScript(simple) => &simple.tx_in,
        }
    }

    pub fn tx_in_mut(&mut self) -> &mut TxInParameter {
        match self {
            TxIn::PubKey(tx_in) => tx_in,
            TxIn::Script(script) => &mut script.tx_in,
            TxIn::SimpleScript(simple) => &mut simple.tx_in,
        }
    }

    pub fn check_complete(&self, kind: EntryKind) -> BuilderResult<()> {
        match self {
            TxIn::PubKey(_) => Ok(()),
            TxIn::Script(script) => {
                let witness = &script.script_tx_in;
                if witness.script_source.is_none() {
                    return Err(BuilderError::missing(kind, "scriptSource"));
                }
                if witness.datum_source.is_none() {
                    return Err(BuilderError::missing(kind, "datumSource"));
                }
                if witness.redeemer.is_none() {
                    return Err(BuilderError::missing(kind, "redeemer"));
                }
                Ok(())
            }
            TxIn::SimpleScript(simple) => match simple.simple_script_tx_in {
                Some(_) => Ok(()),
                None => Err(BuilderError::missing(kind, "simpleScriptSource")),
            },
        }
    }
}

// === Outputs ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatumKind {
    Hash,
    Inline,
    Embedded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDatum {
    pub kind: DatumKind,
    pub data: BuilderData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub address: String,
    pub amount: Vec<Asset>,
    pub datum: Option<OutputDatum>,
    pub reference_script: Option<OutputScript>,
}

impl Output {
    pub fn new(address: impl Into<String>, amount: Vec<Asset>) -> Self {
        Self {
            address: address.into(),
            amount,
            datum: None,
            reference_script: None,
        }
    }

    pub fn value(&self) -> BuilderResult<Value> {
        Value::try_from_assets(&self.amount)
    }

    /// An output must carry some positive quantity of lovelace or of an asset
    pub fn check_value(&self) -> BuilderResult<()> {
        if self.value()?.has_positive() {
            Ok(())
        } else {
            Err(BuilderError::InvalidOutputValue {
                address: self.address.clone(),
            })
        }
    }
}

// === Mints ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintParameter {
    pub policy_id: PolicyId,
    pub asset_name: String,

    /// Negative amounts burn
    pub amount: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlutusMint {
    pub mint: MintParameter,
    pub script_source: Option<ScriptSource>,
    pub redeemer: Option<Redeemer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMint {
    pub mint: MintParameter,
    pub script_source: Option<SimpleScriptSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintItem {
    Plutus(PlutusMint),
    Native(NativeMint),
}

impl MintItem {
    pub fn mint(&self) -> &MintParameter {
        match self {
            MintItem::Plutus(plutus) => &plutus.mint,
            MintItem::Native(native) => &native.mint,
        }
    }

    pub fn check_complete(&self) -> BuilderResult<()> {
        match self {
            MintItem::Plutus(plutus) => {
                if plutus.script_source.is_none() {
                    return Err(BuilderError::missing(EntryKind::Mint, "scriptSource"));
                }
                if plutus.redeemer.is_none() {
                    return Err(BuilderError::missing(EntryKind::Mint, "redeemer"));
                }
                Ok(())
            }
            MintItem::Native(native) => match native.script_source {
                Some(_) => Ok(()),
                None => Err(BuilderError::missing(EntryKind::Mint, "scriptSource")),
            },
        }
    }
}

// === Withdrawals ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubKeyWithdrawal {
    pub address: String,
    pub coin: Coin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptWithdrawal {
    pub address: String,
    pub coin: Coin,
    pub script_source: Option<ScriptSource>,
    pub redeemer: Option<Redeemer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleScriptWithdrawal {
    pub address: String,
    pub coin: Coin,
    pub script_source: Option<SimpleScriptSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Withdrawal {
    PubKey(PubKeyWithdrawal),
    Script(ScriptWithdrawal),
    SimpleScript(SimpleScriptWithdrawal),
}

impl Withdrawal {
    pub fn address(&self) -> &str {
        match self {
            Withdrawal::PubKey(w) => &w.address,
            Withdrawal::Script(w) => &w.address,
            Withdrawal::SimpleScript(w) => &w.address,
        }
    }

    pub fn coin(&self) -> &Coin {
        match self {
            Withdrawal::PubKey(w) => &w.coin,
            Withdrawal::Script(w) => &w.coin,
            Withdrawal::SimpleScript(w) => &w.coin,
        }
    }

    pub fn check_complete(&self) -> BuilderResult<()> {
        match self {
            Withdrawal::PubKey(_) => Ok(()),
            Withdrawal::Script(w) => {
                if w.script_source.is_none() {
                    return Err(BuilderError::missing(EntryKind::Withdrawal, "scriptSource"));
                }
                if w.redeemer.is_none() {
                    return Err(BuilderError::missing(EntryKind::Withdrawal, "redeemer"));
                }
                Ok(())
            }
            Withdrawal::SimpleScript(w) => match w.script_source {
                Some(_) => Ok(()),
                None => Err(BuilderError::missing(EntryKind::Withdrawal, "scriptSource")),
            },
        }
    }
}

// === Body ===

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidityRange {
    pub invalid_before: Option<Slot>,
    pub invalid_hereafter: Option<Slot>,
}

/// The transaction under construction. Created empty, filled by the accumulator and
/// consumed by the serializer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxBuilderBody {
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<Output>,
    pub collaterals: Vec<TxIn>,
    pub reference_inputs: Vec<ReferenceInput>,
    pub mints: Vec<MintItem>,
    pub certificates: Vec<Certificate>,
    pub withdrawals: Vec<Withdrawal>,
    pub votes: Vec<Vote>,
    pub validity_range: ValidityRange,
    pub metadata: Vec<TxMetadata>,
    pub required_signatures: Vec<KeyHash>,
    pub change_address: String,
    pub change_datum: Option<OutputDatum>,
    pub signing_keys: Vec<String>,
    pub network: Network,
    pub fee: Option<Coin>,
    pub total_collateral: Option<Coin>,
    pub collateral_return: Option<Output>,

    /// Overrides the number of key witnesses the fee estimate assumes
    pub expected_key_witnesses: Option<usize>,

    /// Byron addresses expected to provide bootstrap witnesses
    pub bootstrap_witnesses: Vec<String>,
}

impl TxBuilderBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every redeemer in the body, in entry order
    pub fn redeemers(&self) -> Vec<&Redeemer> {
        let mut redeemers = Vec::new();
        for input in &self.inputs {
            if let TxIn::Script(script) = input {
                redeemers.extend(script.script_tx_in.redeemer.as_ref());
            }
        }
        for mint in &self.mints {
            if let MintItem::Plutus(plutus) = mint {
                redeemers.extend(plutus.redeemer.as_ref());
            }
        }
        for cert in &self.certificates {
            if let Certificate::Script(script) = cert {
                redeemers.extend(script.redeemer.as_ref());
            }
        }
        for withdrawal in &self.withdrawals {
            if let Withdrawal::Script(script) = withdrawal {
                redeemers.extend(script.redeemer.as_ref());
            }
        }
        for vote in &self.votes {
            if let Vote::Script(script) = vote {
                redeemers.extend(script.redeemer.as_ref());
            }
        }
        redeemers
    }

    /// Total bytes of reference scripts the transaction touches
    pub fn referenced_script_bytes(&self) -> u64 {
        let inputs: u64 = self.inputs.iter().filter_map(|i| i.tx_in().script_size).sum();
        let references: u64 = self.reference_inputs.iter().filter_map(|r| r.script_size).sum();
        inputs + references
    }

    /// Visit every piece of Plutus data in the body, stopping at the first error
    pub fn try_for_each_data_mut<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&mut BuilderData) -> Result<(), E>,
    {
        let outputs = self.outputs.iter_mut().chain(self.collateral_return.as_mut());
        for output in outputs {
            if let Some(datum) = output.datum.as_mut() {
                f(&mut datum.data)?;
            }
        }
        if let Some(datum) = self.change_datum.as_mut() {
            f(&mut datum.data)?;
        }
        for input in &mut self.inputs {
            if let TxIn::Script(script) = input {
                let datum_source = script.script_tx_in.datum_source.as_mut();
                if let Some(DatumSource::Provided { data }) = datum_source {
                    f(data)?;
                }
                if let Some(redeemer) = script.script_tx_in.redeemer.as_mut() {
                    f(&mut redeemer.data)?;
                }
            }
        }
        for mint in &mut self.mints {
            if let MintItem::Plutus(PlutusMint {
                redeemer: Some(redeemer),
                ..
            }) = mint
            {
                f(&mut redeemer.data)?;
            }
        }
        for cert in &mut self.certificates {
            if let Certificate::Script(script) = cert {
                if let Some(redeemer) = script.redeemer.as_mut() {
                    f(&mut redeemer.data)?;
                }
            }
        }
        for withdrawal in &mut self.withdrawals {
            if let Withdrawal::Script(script) = withdrawal {
                if let Some(redeemer) = script.redeemer.as_mut() {
                    f(&mut redeemer.data)?;
                }
            }
        }
        for vote in &mut self.votes {
            if let Vote::Script(script) = vote {
                if let Some(redeemer) = script.redeemer.as_mut() {
                    f(&mut redeemer.data)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExUnits, LanguageVersion};

    const TX_HASH: &str = "0d8d00cdd4657ac84d82f0a56067634a7adfdf43da41cb534bcaa45060973d21";

    fn script_input(redeemer: Option<Redeemer>) -> TxIn {
        TxIn::Script(ScriptTxIn {
            tx_in: TxInParameter::new(TX_HASH.parse().unwrap(), 0),
            script_tx_in: ScriptTxInWitness {
                script_source: Some(ScriptSource::Provided {
                    code: "4e4d01000033222220051200120011".to_string(),
                    version: LanguageVersion::V2,
                }),
                datum_source: Some(DatumSource::Inline {
                    tx_hash: TX_HASH.parse().unwrap(),
                    tx_index: 0,
                }),
                redeemer,
            },
        })
    }

    fn redeemer() -> Redeemer {
        Redeemer {
            data: BuilderData::cbor("d87980"),
            ex_units: ExUnits::new(7_000_000, 3_000_000_000),
        }
    }

    #[test]
    fn script_input_requires_redeemer() {
        assert_eq!(
            script_input(None).check_complete(EntryKind::Input),
            Err(BuilderError::missing(EntryKind::Input, "redeemer"))
        );
        assert!(script_input(Some(redeemer())).check_complete(EntryKind::Input).is_ok());
    }

    #[test]
    fn output_value_validity() {
        let empty = Output::new("addr_test1", vec![]);
        assert!(matches!(empty.check_value(), Err(BuilderError::InvalidOutputValue { .. })));

        let zero = Output::new("addr_test1", vec![Asset::lovelace(0u64)]);
        assert!(matches!(zero.check_value(), Err(BuilderError::InvalidOutputValue { .. })));

        let positive = Output::new("addr_test1", vec![Asset::lovelace(1u64)]);
        assert!(positive.check_value().is_ok());
    }

    #[test]
    fn output_with_malformed_unit_is_rejected() {
        let output = Output::new(
            "addr_test1",
            vec![Asset::new("xyz", 5u64), Asset::lovelace(2_000_000u64)],
        );
        assert!(matches!(
            output.check_value(),
            Err(BuilderError::InvalidField { ref entity, ref field, .. })
                if entity == "Asset" && field == "unit"
        ));
    }

    #[test]
    fn input_value_checks_known_amount() {
        let mut tx_in = TxInParameter::new(TX_HASH.parse().unwrap(), 0);
        assert_eq!(tx_in.value(), Ok(Value::default()));
        tx_in.amount = Some(vec![Asset::new("xyz", 5u64)]);
        assert!(tx_in.value().is_err());
    }

    #[test]
    fn plutus_mint_requires_redeemer() {
        let mint = MintItem::Plutus(PlutusMint {
            mint: MintParameter {
                policy_id: PolicyId::default(),
                asset_name: "4d657368".to_string(),
                amount: Quantity::from(1u8),
            },
            script_source: Some(ScriptSource::ByHash {
                script_hash: Default::default(),
                version: LanguageVersion::V3,
            }),
            redeemer: None,
        });
        assert_eq!(
            mint.check_complete(),
            Err(BuilderError::missing(EntryKind::Mint, "redeemer"))
        );
    }

    #[test]
    fn collects_redeemers_and_data() {
        let mut body = TxBuilderBody::new();
        body.inputs.push(script_input(Some(redeemer())));
        body.outputs.push(Output {
            datum: Some(OutputDatum {
                kind: DatumKind::Inline,
                data: BuilderData::Structured(serde_json::json!({"alternative": 0, "fields": []})),
            }),
            ..Output::new("addr_test1", vec![Asset::lovelace(2_000_000u64)])
        });
        assert_eq!(body.redeemers().len(), 1);

        let mut seen = 0;
        body.try_for_each_data_mut(|data| {
            seen += 1;
            *data = BuilderData::cbor("d87980");
            Ok::<(), ()>(())
        })
        .unwrap();
        assert_eq!(seen, 2);
        assert_eq!(body.outputs[0].datum.as_ref().unwrap().data, BuilderData::cbor("d87980"));
    }
}

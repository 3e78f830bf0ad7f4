//! Queue-then-flush accumulation of a transaction body
//!
//! Each `open` call (`tx_in`, `tx_out`, `mint`, ...) starts a new entry of its kind and flushes
//! the previous one. Modifiers attach witnessing data to the entry currently open.

use std::collections::BTreeSet;

use cairn_common::{
    Anchor, Asset, BuilderData, BuilderError, BuilderResult, Certificate, CertificateType, Coin,
    DRep, DatumKind, DatumSource, EntryKind, Epoch, KeyHash, LanguageVersion, Metadatum,
    MetadatumLabel, MintItem, MintParameter, NativeMint, Network, Output, OutputDatum, OutputScript,
    PlutusMint, PolicyId, PoolParams, PubKeyWithdrawal, Quantity, Redeemer, RefTxIn, ReferenceInput,
    ScriptCertificate, ScriptHash, ScriptSource, ScriptTxIn, ScriptTxInWitness, ScriptVote,
    ScriptWithdrawal, SimpleScriptCertificate, SimpleScriptSource, SimpleScriptTxIn,
    SimpleScriptVote, SimpleScriptWithdrawal, Slot, TxBuilderBody, TxHash, TxIn, TxInParameter,
    TxMetadata, UTxO, Vote, VoteType, Voter, VotingProcedure, Withdrawal,
};
use tracing::debug;

/// UTxOs to draw extra inputs from when the body is serialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoSelection {
    pub pool: Vec<UTxO>,
    pub threshold: Coin,
}

#[derive(Debug, Clone)]
struct OpenEntry<T> {
    entry: T,

    /// Plutus version announced before the entry was opened
    version: Option<LanguageVersion>,
}

/// A reference script location, shared by every `*_tx_in_reference` modifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptReference {
    pub tx_hash: TxHash,
    pub tx_index: u32,
    pub script_hash: ScriptHash,
    pub script_size: u64,
}

impl ScriptReference {
    fn plutus(&self, version: LanguageVersion) -> ScriptSource {
        ScriptSource::ReferenceScript {
            tx_hash: self.tx_hash,
            tx_index: self.tx_index,
            script_hash: self.script_hash,
            script_size: self.script_size,
            version,
        }
    }

    fn simple(&self) -> SimpleScriptSource {
        SimpleScriptSource::ReferenceScript {
            tx_hash: self.tx_hash,
            tx_index: self.tx_index,
            script_hash: self.script_hash,
            script_size: self.script_size,
        }
    }
}

fn unexpected(kind: EntryKind, field: &'static str) -> BuilderError {
    BuilderError::UnexpectedWitnessData { kind, field }
}

#[derive(Debug, Default)]
pub struct TxBuilder {
    body: TxBuilderBody,

    input: Option<OpenEntry<TxIn>>,
    collateral: Option<TxIn>,
    output: Option<Output>,
    mint: Option<OpenEntry<MintItem>>,
    certificate: Option<Certificate>,
    withdrawal: Option<OpenEntry<Withdrawal>>,
    vote: Option<OpenEntry<Vote>>,

    spending_version: Option<LanguageVersion>,
    minting_version: Option<LanguageVersion>,
    withdrawal_version: Option<LanguageVersion>,
    vote_version: Option<LanguageVersion>,

    selection: Option<UtxoSelection>,
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_network(network: Network) -> Self {
        let mut builder = Self::default();
        builder.body.network = network;
        builder
    }

    // === Inputs ===

    /// Mark the next `tx_in` as spending a Plutus-locked output
    pub fn spending_plutus_script(&mut self, version: LanguageVersion) -> &mut Self {
        self.spending_version = Some(version);
        self
    }

    pub fn tx_in(
        &mut self,
        tx_hash: TxHash,
        tx_index: u32,
        amount: Option<Vec<Asset>>,
        address: Option<String>,
    ) -> BuilderResult<&mut Self> {
        self.queue_input()?;
        let tx_in = TxInParameter {
            amount,
            address,
            ..TxInParameter::new(tx_hash, tx_index)
        };
        let version = self.spending_version.take();
        let entry = match version {
            Some(_) => TxIn::Script(ScriptTxIn {
                tx_in,
                script_tx_in: ScriptTxInWitness::default(),
            }),
            None => TxIn::PubKey(tx_in),
        };
        self.input = Some(OpenEntry { entry, version });
        Ok(self)
    }

    fn open_input(&mut self) -> BuilderResult<&mut OpenEntry<TxIn>> {
        self.input.as_mut().ok_or(BuilderError::NoOpenEntry(EntryKind::Input))
    }

    /// Attach script bytes. A key input becomes a native-script input.
    pub fn tx_in_script(&mut self, code: &str) -> BuilderResult<&mut Self> {
        let open = self.open_input()?;
        match (&mut open.entry, open.version) {
            (TxIn::Script(script), Some(version)) => {
                script.script_tx_in.script_source = Some(ScriptSource::Provided {
                    code: code.to_string(),
                    version,
                });
            }
            (entry, _) => {
                *entry = TxIn::SimpleScript(SimpleScriptTxIn {
                    tx_in: entry.tx_in().clone(),
                    simple_script_tx_in: Some(SimpleScriptSource::Provided {
                        code: code.to_string(),
                    }),
                });
            }
        }
        Ok(self)
    }

    /// Point the open input at a reference script instead of carrying the bytes
    pub fn spending_tx_in_reference(
        &mut self,
        reference: ScriptReference,
    ) -> BuilderResult<&mut Self> {
        let open = self.open_input()?;
        match (&mut open.entry, open.version) {
            (TxIn::Script(script), Some(version)) => {
                script.script_tx_in.script_source = Some(reference.plutus(version));
            }
            (entry, _) => {
                *entry = TxIn::SimpleScript(SimpleScriptTxIn {
                    tx_in: entry.tx_in().clone(),
                    simple_script_tx_in: Some(reference.simple()),
                });
            }
        }
        Ok(self)
    }

    fn open_script_input(&mut self, field: &'static str) -> BuilderResult<&mut ScriptTxIn> {
        match &mut self.open_input()?.entry {
            TxIn::Script(script) => Ok(script),
            _ => Err(unexpected(EntryKind::Input, field)),
        }
    }

    pub fn tx_in_datum_value(&mut self, data: BuilderData) -> BuilderResult<&mut Self> {
        let script = self.open_script_input("datumSource")?;
        script.script_tx_in.datum_source = Some(DatumSource::Provided { data });
        Ok(self)
    }

    /// The datum is inlined in the output being spent
    pub fn tx_in_inline_datum_present(&mut self) -> BuilderResult<&mut Self> {
        let script = self.open_script_input("datumSource")?;
        script.script_tx_in.datum_source = Some(DatumSource::Inline {
            tx_hash: script.tx_in.tx_hash,
            tx_index: script.tx_in.tx_index,
        });
        Ok(self)
    }

    pub fn tx_in_redeemer_value(&mut self, redeemer: Redeemer) -> BuilderResult<&mut Self> {
        let script = self.open_script_input("redeemer")?;
        script.script_tx_in.redeemer = Some(redeemer);
        Ok(self)
    }

    fn queue_input(&mut self) -> BuilderResult<()> {
        if let Some(open) = self.input.take() {
            open.entry.check_complete(EntryKind::Input)?;
            debug!("Queued input {}#{}", open.entry.tx_in().tx_hash, open.entry.tx_in().tx_index);
            self.body.inputs.push(open.entry);
        }
        Ok(())
    }

    // === Collateral and reference inputs ===

    pub fn tx_in_collateral(
        &mut self,
        tx_hash: TxHash,
        tx_index: u32,
        amount: Option<Vec<Asset>>,
        address: Option<String>,
    ) -> BuilderResult<&mut Self> {
        self.queue_collateral();
        self.collateral = Some(TxIn::PubKey(TxInParameter {
            amount,
            address,
            ..TxInParameter::new(tx_hash, tx_index)
        }));
        Ok(self)
    }

    fn queue_collateral(&mut self) {
        if let Some(collateral) = self.collateral.take() {
            self.body.collaterals.push(collateral);
        }
    }

    pub fn read_only_tx_in_reference(
        &mut self,
        tx_hash: TxHash,
        tx_index: u32,
        script_size: Option<u64>,
    ) -> &mut Self {
        self.body.reference_inputs.push(ReferenceInput {
            tx_hash,
            tx_index,
            script_size,
        });
        self
    }

    // === Outputs ===

    pub fn tx_out(&mut self, address: &str, amount: Vec<Asset>) -> BuilderResult<&mut Self> {
        self.queue_output()?;
        self.output = Some(Output::new(address, amount));
        Ok(self)
    }

    fn open_output(&mut self) -> BuilderResult<&mut Output> {
        self.output.as_mut().ok_or(BuilderError::NoOpenEntry(EntryKind::Output))
    }

    fn set_output_datum(&mut self, kind: DatumKind, data: BuilderData) -> BuilderResult<&mut Self> {
        self.open_output()?.datum = Some(OutputDatum { kind, data });
        Ok(self)
    }

    pub fn tx_out_datum_hash_value(&mut self, data: BuilderData) -> BuilderResult<&mut Self> {
        self.set_output_datum(DatumKind::Hash, data)
    }

    pub fn tx_out_inline_datum_value(&mut self, data: BuilderData) -> BuilderResult<&mut Self> {
        self.set_output_datum(DatumKind::Inline, data)
    }

    pub fn tx_out_datum_embed_value(&mut self, data: BuilderData) -> BuilderResult<&mut Self> {
        self.set_output_datum(DatumKind::Embedded, data)
    }

    /// Attach a reference script; `None` for a native script
    pub fn tx_out_reference_script(
        &mut self,
        code: &str,
        version: Option<LanguageVersion>,
    ) -> BuilderResult<&mut Self> {
        let code = code.to_string();
        self.open_output()?.reference_script = Some(match version {
            Some(version) => OutputScript::Plutus { code, version },
            None => OutputScript::Native { code },
        });
        Ok(self)
    }

    fn queue_output(&mut self) -> BuilderResult<()> {
        if let Some(output) = self.output.take() {
            output.check_value()?;
            self.body.outputs.push(output);
        }
        Ok(())
    }

    // === Mints ===

    pub fn mint_plutus_script(&mut self, version: LanguageVersion) -> &mut Self {
        self.minting_version = Some(version);
        self
    }

    /// Mint (or burn, when negative) `quantity` of `policy_id` + `asset_name`
    pub fn mint(
        &mut self,
        quantity: impl Into<Quantity>,
        policy_id: PolicyId,
        asset_name: &str,
    ) -> BuilderResult<&mut Self> {
        self.queue_mint()?;
        let mint = MintParameter {
            policy_id,
            asset_name: asset_name.to_lowercase(),
            amount: quantity.into(),
        };
        let version = self.minting_version.take();
        let entry = match version {
            Some(_) => MintItem::Plutus(PlutusMint {
                mint,
                script_source: None,
                redeemer: None,
            }),
            None => MintItem::Native(NativeMint {
                mint,
                script_source: None,
            }),
        };
        self.mint = Some(OpenEntry { entry, version });
        Ok(self)
    }

    fn open_mint(&mut self) -> BuilderResult<&mut OpenEntry<MintItem>> {
        self.mint.as_mut().ok_or(BuilderError::NoOpenEntry(EntryKind::Mint))
    }

    pub fn minting_script(&mut self, code: &str) -> BuilderResult<&mut Self> {
        let open = self.open_mint()?;
        let code = code.to_string();
        match (&mut open.entry, open.version) {
            (MintItem::Plutus(plutus), Some(version)) => {
                plutus.script_source = Some(ScriptSource::Provided { code, version });
            }
            (MintItem::Native(native), _) => {
                native.script_source = Some(SimpleScriptSource::Provided { code });
            }
            (MintItem::Plutus(_), None) => return Err(unexpected(EntryKind::Mint, "scriptSource")),
        }
        Ok(self)
    }

    pub fn mint_tx_in_reference(&mut self, reference: ScriptReference) -> BuilderResult<&mut Self> {
        let open = self.open_mint()?;
        match (&mut open.entry, open.version) {
            (MintItem::Plutus(plutus), Some(version)) => {
                plutus.script_source = Some(reference.plutus(version));
            }
            (MintItem::Native(native), _) => native.script_source = Some(reference.simple()),
            (MintItem::Plutus(_), None) => return Err(unexpected(EntryKind::Mint, "scriptSource")),
        }
        Ok(self)
    }

    pub fn mint_redeemer_value(&mut self, redeemer: Redeemer) -> BuilderResult<&mut Self> {
        match &mut self.open_mint()?.entry {
            MintItem::Plutus(plutus) => plutus.redeemer = Some(redeemer),
            MintItem::Native(_) => return Err(unexpected(EntryKind::Mint, "redeemer")),
        }
        Ok(self)
    }

    fn queue_mint(&mut self) -> BuilderResult<()> {
        if let Some(open) = self.mint.take() {
            open.entry.check_complete()?;
            self.body.mints.push(open.entry);
        }
        Ok(())
    }

    // === Certificates ===

    pub fn certificate(&mut self, cert: CertificateType) -> BuilderResult<&mut Self> {
        self.queue_certificate()?;
        self.certificate = Some(Certificate::Basic(cert));
        Ok(self)
    }

    fn open_certificate(&mut self) -> BuilderResult<&mut Certificate> {
        self.certificate.as_mut().ok_or(BuilderError::NoOpenEntry(EntryKind::Certificate))
    }

    /// Witness the open certificate with a script: Plutus when `version` is given, native
    /// otherwise
    pub fn certificate_script(
        &mut self,
        code: &str,
        version: Option<LanguageVersion>,
    ) -> BuilderResult<&mut Self> {
        let code = code.to_string();
        let certificate = self.open_certificate()?;
        *certificate = match (certificate.clone(), version) {
            (Certificate::Script(script), Some(version)) => Certificate::Script(ScriptCertificate {
                script_source: Some(ScriptSource::Provided { code, version }),
                ..script
            }),
            (other, Some(version)) => Certificate::Script(ScriptCertificate {
                cert: other.cert().clone(),
                redeemer: None,
                script_source: Some(ScriptSource::Provided { code, version }),
            }),
            (other, None) => Certificate::SimpleScript(SimpleScriptCertificate {
                cert: other.cert().clone(),
                simple_script_source: Some(SimpleScriptSource::Provided { code }),
            }),
        };
        Ok(self)
    }

    pub fn certificate_tx_in_reference(
        &mut self,
        reference: ScriptReference,
        version: Option<LanguageVersion>,
    ) -> BuilderResult<&mut Self> {
        let certificate = self.open_certificate()?;
        *certificate = match (certificate.clone(), version) {
            (Certificate::Script(script), Some(version)) => Certificate::Script(ScriptCertificate {
                script_source: Some(reference.plutus(version)),
                ..script
            }),
            (other, Some(version)) => Certificate::Script(ScriptCertificate {
                cert: other.cert().clone(),
                redeemer: None,
                script_source: Some(reference.plutus(version)),
            }),
            (other, None) => Certificate::SimpleScript(SimpleScriptCertificate {
                cert: other.cert().clone(),
                simple_script_source: Some(reference.simple()),
            }),
        };
        Ok(self)
    }

    pub fn certificate_redeemer_value(&mut self, redeemer: Redeemer) -> BuilderResult<&mut Self> {
        match self.open_certificate()? {
            Certificate::Script(script) => script.redeemer = Some(redeemer),
            _ => return Err(unexpected(EntryKind::Certificate, "redeemer")),
        }
        Ok(self)
    }

    fn queue_certificate(&mut self) -> BuilderResult<()> {
        if let Some(certificate) = self.certificate.take() {
            certificate.check_complete()?;
            self.body.certificates.push(certificate);
        }
        Ok(())
    }

    pub fn register_pool_certificate(
        &mut self,
        pool_params: PoolParams,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::RegisterPool { pool_params })
    }

    pub fn register_stake_certificate(
        &mut self,
        stake_key_address: &str,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::RegisterStake {
            stake_key_address: stake_key_address.to_string(),
        })
    }

    pub fn delegate_stake_certificate(
        &mut self,
        stake_key_address: &str,
        pool_id: &str,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::DelegateStake {
            stake_key_address: stake_key_address.to_string(),
            pool_id: pool_id.to_string(),
        })
    }

    pub fn deregister_stake_certificate(
        &mut self,
        stake_key_address: &str,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::DeregisterStake {
            stake_key_address: stake_key_address.to_string(),
        })
    }

    pub fn retire_pool_certificate(
        &mut self,
        pool_id: &str,
        epoch: Epoch,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::RetirePool {
            pool_id: pool_id.to_string(),
            epoch,
        })
    }

    pub fn vote_delegation_certificate(
        &mut self,
        stake_key_address: &str,
        drep: DRep,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::VoteDelegation {
            stake_key_address: stake_key_address.to_string(),
            drep,
        })
    }

    pub fn stake_and_vote_delegation_certificate(
        &mut self,
        stake_key_address: &str,
        pool_key_hash: &str,
        drep: DRep,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::StakeAndVoteDelegation {
            stake_key_address: stake_key_address.to_string(),
            pool_key_hash: pool_key_hash.to_string(),
            drep,
        })
    }

    pub fn stake_registration_and_delegation_certificate(
        &mut self,
        stake_key_address: &str,
        pool_key_hash: &str,
        coin: Coin,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::StakeRegistrationAndDelegation {
            stake_key_address: stake_key_address.to_string(),
            pool_key_hash: pool_key_hash.to_string(),
            coin,
        })
    }

    pub fn vote_registration_and_delegation_certificate(
        &mut self,
        stake_key_address: &str,
        drep: DRep,
        coin: Coin,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::VoteRegistrationAndDelegation {
            stake_key_address: stake_key_address.to_string(),
            drep,
            coin,
        })
    }

    pub fn stake_vote_registration_and_delegation_certificate(
        &mut self,
        stake_key_address: &str,
        pool_key_hash: &str,
        drep: DRep,
        coin: Coin,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::StakeVoteRegistrationAndDelegation {
            stake_key_address: stake_key_address.to_string(),
            pool_key_hash: pool_key_hash.to_string(),
            drep,
            coin,
        })
    }

    pub fn committee_hot_auth_certificate(
        &mut self,
        committee_cold_key_address: &str,
        committee_hot_key_address: &str,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::CommitteeHotAuth {
            committee_cold_key_address: committee_cold_key_address.to_string(),
            committee_hot_key_address: committee_hot_key_address.to_string(),
        })
    }

    pub fn committee_cold_resign_certificate(
        &mut self,
        committee_cold_key_address: &str,
        anchor: Option<Anchor>,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::CommitteeColdResign {
            committee_cold_key_address: committee_cold_key_address.to_string(),
            anchor,
        })
    }

    pub fn drep_registration_certificate(
        &mut self,
        drep_id: &str,
        coin: Coin,
        anchor: Option<Anchor>,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::DRepRegistration {
            drep_id: drep_id.to_string(),
            coin,
            anchor,
        })
    }

    pub fn drep_deregistration_certificate(
        &mut self,
        drep_id: &str,
        coin: Coin,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::DRepDeregistration {
            drep_id: drep_id.to_string(),
            coin,
        })
    }

    pub fn drep_update_certificate(
        &mut self,
        drep_id: &str,
        anchor: Option<Anchor>,
    ) -> BuilderResult<&mut Self> {
        self.certificate(CertificateType::DRepUpdate {
            drep_id: drep_id.to_string(),
            anchor,
        })
    }

    // === Withdrawals ===

    pub fn withdrawal_plutus_script(&mut self, version: LanguageVersion) -> &mut Self {
        self.withdrawal_version = Some(version);
        self
    }

    pub fn withdrawal(&mut self, address: &str, coin: impl Into<Coin>) -> BuilderResult<&mut Self> {
        self.queue_withdrawal()?;
        let (address, coin) = (address.to_string(), coin.into());
        let version = self.withdrawal_version.take();
        let entry = match version {
            Some(_) => Withdrawal::Script(ScriptWithdrawal {
                address,
                coin,
                script_source: None,
                redeemer: None,
            }),
            None => Withdrawal::PubKey(PubKeyWithdrawal { address, coin }),
        };
        self.withdrawal = Some(OpenEntry { entry, version });
        Ok(self)
    }

    fn open_withdrawal(&mut self) -> BuilderResult<&mut OpenEntry<Withdrawal>> {
        self.withdrawal.as_mut().ok_or(BuilderError::NoOpenEntry(EntryKind::Withdrawal))
    }

    fn set_withdrawal_source(
        &mut self,
        plutus: impl FnOnce(LanguageVersion) -> ScriptSource,
        simple: SimpleScriptSource,
    ) -> BuilderResult<&mut Self> {
        let open = self.open_withdrawal()?;
        match (&mut open.entry, open.version) {
            (Withdrawal::Script(script), Some(version)) => {
                script.script_source = Some(plutus(version));
            }
            (entry, _) => {
                *entry = Withdrawal::SimpleScript(SimpleScriptWithdrawal {
                    address: entry.address().to_string(),
                    coin: entry.coin().clone(),
                    script_source: Some(simple),
                });
            }
        }
        Ok(self)
    }

    pub fn withdrawal_script(&mut self, code: &str) -> BuilderResult<&mut Self> {
        let code = code.to_string();
        let simple = SimpleScriptSource::Provided { code: code.clone() };
        self.set_withdrawal_source(|version| ScriptSource::Provided { code, version }, simple)
    }

    pub fn withdrawal_tx_in_reference(
        &mut self,
        reference: ScriptReference,
    ) -> BuilderResult<&mut Self> {
        let simple = reference.simple();
        self.set_withdrawal_source(|version| reference.plutus(version), simple)
    }

    pub fn withdrawal_redeemer_value(&mut self, redeemer: Redeemer) -> BuilderResult<&mut Self> {
        match &mut self.open_withdrawal()?.entry {
            Withdrawal::Script(script) => script.redeemer = Some(redeemer),
            _ => return Err(unexpected(EntryKind::Withdrawal, "redeemer")),
        }
        Ok(self)
    }

    fn queue_withdrawal(&mut self) -> BuilderResult<()> {
        if let Some(open) = self.withdrawal.take() {
            open.entry.check_complete()?;
            self.body.withdrawals.push(open.entry);
        }
        Ok(())
    }

    // === Votes ===

    pub fn vote_plutus_script(&mut self, version: LanguageVersion) -> &mut Self {
        self.vote_version = Some(version);
        self
    }

    pub fn vote(
        &mut self,
        voter: Voter,
        gov_action_id: RefTxIn,
        voting_procedure: VotingProcedure,
    ) -> BuilderResult<&mut Self> {
        self.queue_vote()?;
        let vote = VoteType {
            voter,
            voting_procedure,
            gov_action_id,
        };
        let version = self.vote_version.take();
        let entry = match version {
            Some(_) => Vote::Script(ScriptVote {
                vote,
                script_source: None,
                redeemer: None,
            }),
            None => Vote::Basic(vote),
        };
        self.vote = Some(OpenEntry { entry, version });
        Ok(self)
    }

    fn open_vote(&mut self) -> BuilderResult<&mut OpenEntry<Vote>> {
        self.vote.as_mut().ok_or(BuilderError::NoOpenEntry(EntryKind::Vote))
    }

    fn set_vote_source(
        &mut self,
        plutus: impl FnOnce(LanguageVersion) -> ScriptSource,
        simple: SimpleScriptSource,
    ) -> BuilderResult<&mut Self> {
        let open = self.open_vote()?;
        match (&mut open.entry, open.version) {
            (Vote::Script(script), Some(version)) => {
                script.script_source = Some(plutus(version));
            }
            (entry, _) => {
                *entry = Vote::SimpleScript(SimpleScriptVote {
                    vote: entry.vote().clone(),
                    simple_script_source: Some(simple),
                });
            }
        }
        Ok(self)
    }

    pub fn vote_script(&mut self, code: &str) -> BuilderResult<&mut Self> {
        let code = code.to_string();
        let simple = SimpleScriptSource::Provided { code: code.clone() };
        self.set_vote_source(|version| ScriptSource::Provided { code, version }, simple)
    }

    pub fn vote_tx_in_reference(&mut self, reference: ScriptReference) -> BuilderResult<&mut Self> {
        let simple = reference.simple();
        self.set_vote_source(|version| reference.plutus(version), simple)
    }

    pub fn vote_redeemer_value(&mut self, redeemer: Redeemer) -> BuilderResult<&mut Self> {
        match &mut self.open_vote()?.entry {
            Vote::Script(script) => script.redeemer = Some(redeemer),
            _ => return Err(unexpected(EntryKind::Vote, "redeemer")),
        }
        Ok(self)
    }

    fn queue_vote(&mut self) -> BuilderResult<()> {
        if let Some(open) = self.vote.take() {
            open.entry.check_complete()?;
            self.body.votes.push(open.entry);
        }
        Ok(())
    }

    // === Body-wide settings ===

    pub fn required_signer_hash(&mut self, hash: KeyHash) -> &mut Self {
        self.body.required_signatures.push(hash);
        self
    }

    pub fn change_address(&mut self, address: &str, datum: Option<OutputDatum>) -> &mut Self {
        self.body.change_address = address.to_string();
        self.body.change_datum = datum;
        self
    }

    pub fn invalid_before(&mut self, slot: Slot) -> &mut Self {
        self.body.validity_range.invalid_before = Some(slot);
        self
    }

    pub fn invalid_hereafter(&mut self, slot: Slot) -> &mut Self {
        self.body.validity_range.invalid_hereafter = Some(slot);
        self
    }

    pub fn metadata_value(&mut self, tag: MetadatumLabel, value: Metadatum) -> &mut Self {
        self.body.metadata.push(TxMetadata { tag, value });
        self
    }

    pub fn signing_key(&mut self, secret_key: &str) -> &mut Self {
        self.body.signing_keys.push(secret_key.to_string());
        self
    }

    pub fn network(&mut self, network: Network) -> &mut Self {
        self.body.network = network;
        self
    }

    pub fn set_fee(&mut self, fee: impl Into<Coin>) -> &mut Self {
        self.body.fee = Some(fee.into());
        self
    }

    pub fn set_total_collateral(&mut self, total: impl Into<Coin>) -> &mut Self {
        self.body.total_collateral = Some(total.into());
        self
    }

    /// Override the number of key witnesses fee estimation assumes
    pub fn expected_key_witnesses(&mut self, count: usize) -> &mut Self {
        self.body.expected_key_witnesses = Some(count);
        self
    }

    pub fn expected_bootstrap_witness(&mut self, byron_address: &str) -> &mut Self {
        self.body.bootstrap_witnesses.push(byron_address.to_string());
        self
    }

    /// Cover any value deficit from `pool` when the body is serialized
    pub fn select_utxos_from(&mut self, pool: Vec<UTxO>, threshold: impl Into<Coin>) -> &mut Self {
        self.selection = Some(UtxoSelection {
            pool,
            threshold: threshold.into(),
        });
        self
    }

    pub fn selection(&self) -> Option<&UtxoSelection> {
        self.selection.as_ref()
    }

    // === Flushing ===

    /// Validate and append every open entry
    pub fn queue_all_last_item(&mut self) -> BuilderResult<&mut Self> {
        self.queue_input()?;
        self.queue_collateral();
        self.queue_output()?;
        self.queue_mint()?;
        self.queue_certificate()?;
        self.queue_withdrawal()?;
        self.queue_vote()?;
        Ok(self)
    }

    /// Flush everything and hand over the body, dropping inputs that repeat an earlier
    /// `(txHash, txIndex)`
    pub fn build(mut self) -> BuilderResult<(TxBuilderBody, Option<UtxoSelection>)> {
        self.queue_all_last_item()?;
        let mut body = self.body;
        let mut seen = BTreeSet::new();
        body.inputs.retain(|input| {
            let key = input.tx_in().key();
            let first = seen.insert(key);
            if !first {
                debug!("Dropped duplicate input {}#{}", key.0, key.1);
            }
            first
        });
        Ok((body, self.selection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_common::ExUnits;

    const ADDRESS: &str = "addr_test1qpvx0sacufuypa2k4sngk7q40zc5c4npl337uusdh64kv0uafhxhu32dys6pvn6wlw8dav6cmp4pmtv7cc3yel9uu0nq93swx9";
    const SCRIPT: &str = "4e4d01000033222220051200120011";

    fn tx_hash(byte: u8) -> TxHash {
        TxHash::new([byte; 32])
    }

    fn redeemer() -> Redeemer {
        Redeemer {
            data: BuilderData::cbor("d87980"),
            ex_units: ExUnits::new(7_000_000, 3_000_000_000),
        }
    }

    fn lovelace(amount: u64) -> Vec<Asset> {
        vec![Asset::lovelace(amount)]
    }

    #[test]
    fn duplicate_inputs_keep_the_first() {
        let mut builder = TxBuilder::new();
        builder
            .tx_in(tx_hash(1), 0, Some(lovelace(1_000_000)), Some(ADDRESS.into()))
            .unwrap()
            .tx_in(tx_hash(2), 0, None, None)
            .unwrap()
            .tx_in(tx_hash(1), 0, Some(lovelace(9)), None)
            .unwrap();
        let (body, _) = builder.build().unwrap();
        assert_eq!(body.inputs.len(), 2);
        assert_eq!(body.inputs[0].tx_in().amount, Some(lovelace(1_000_000)));
        assert_eq!(body.inputs[1].tx_in().tx_hash, tx_hash(2));
    }

    #[test]
    fn script_input_without_redeemer_is_rejected() {
        let mut builder = TxBuilder::new();
        builder
            .spending_plutus_script(LanguageVersion::V2)
            .tx_in(tx_hash(1), 0, None, None)
            .unwrap()
            .tx_in_script(SCRIPT)
            .unwrap()
            .tx_in_inline_datum_present()
            .unwrap();
        assert_eq!(
            builder.build().unwrap_err(),
            BuilderError::MissingWitnessData {
                kind: EntryKind::Input,
                field: "redeemer"
            }
        );
    }

    #[test]
    fn complete_script_input_is_accepted() {
        let mut builder = TxBuilder::new();
        builder
            .spending_plutus_script(LanguageVersion::V3)
            .tx_in(tx_hash(1), 0, None, None)
            .unwrap()
            .tx_in_script(SCRIPT)
            .unwrap()
            .tx_in_datum_value(BuilderData::cbor("00"))
            .unwrap()
            .tx_in_redeemer_value(redeemer())
            .unwrap();
        let (body, _) = builder.build().unwrap();
        let TxIn::Script(script) = &body.inputs[0] else {
            panic!("expected a script input");
        };
        assert_eq!(
            script.script_tx_in.script_source,
            Some(ScriptSource::Provided {
                code: SCRIPT.to_string(),
                version: LanguageVersion::V3
            })
        );
    }

    #[test]
    fn opening_flushes_the_previous_entry() {
        let mut builder = TxBuilder::new();
        builder
            .spending_plutus_script(LanguageVersion::V2)
            .tx_in(tx_hash(1), 0, None, None)
            .unwrap();
        let result = builder.tx_in(tx_hash(2), 0, None, None);
        assert!(matches!(result, Err(BuilderError::MissingWitnessData { .. })));
    }

    #[test]
    fn version_applies_to_the_next_input_only() {
        let mut builder = TxBuilder::new();
        builder.spending_plutus_script(LanguageVersion::V2);
        builder.tx_in(tx_hash(1), 0, None, None).unwrap();
        builder.tx_in_script(SCRIPT).unwrap();
        builder.tx_in_inline_datum_present().unwrap();
        builder.tx_in_redeemer_value(redeemer()).unwrap();
        builder.tx_in(tx_hash(2), 0, None, None).unwrap();
        let (body, _) = builder.build().unwrap();
        assert!(matches!(body.inputs[0], TxIn::Script(_)));
        assert!(matches!(body.inputs[1], TxIn::PubKey(_)));
    }

    #[test]
    fn key_input_with_script_becomes_native() {
        let mut builder = TxBuilder::new();
        builder.tx_in(tx_hash(1), 0, None, None).unwrap().tx_in_script(SCRIPT).unwrap();
        let (body, _) = builder.build().unwrap();
        assert!(matches!(body.inputs[0], TxIn::SimpleScript(_)));
    }

    #[test]
    fn modifiers_need_an_open_entry() {
        let mut builder = TxBuilder::new();
        assert_eq!(
            builder.tx_in_redeemer_value(redeemer()).err(),
            Some(BuilderError::NoOpenEntry(EntryKind::Input))
        );
        assert_eq!(
            builder.mint_redeemer_value(redeemer()).err(),
            Some(BuilderError::NoOpenEntry(EntryKind::Mint))
        );
        assert_eq!(
            builder.tx_out_inline_datum_value(BuilderData::cbor("00")).err(),
            Some(BuilderError::NoOpenEntry(EntryKind::Output))
        );
    }

    #[test]
    fn native_mint_rejects_redeemer() {
        let mut builder = TxBuilder::new();
        builder.mint(1, PolicyId::new([7; 28]), "ABCD").unwrap();
        assert_eq!(
            builder.mint_redeemer_value(redeemer()).err(),
            Some(BuilderError::UnexpectedWitnessData {
                kind: EntryKind::Mint,
                field: "redeemer"
            })
        );
    }

    #[test]
    fn plutus_mint_is_assembled() {
        let mut builder = TxBuilder::new();
        builder
            .mint_plutus_script(LanguageVersion::V2)
            .mint(-5, PolicyId::new([7; 28]), "ABCD")
            .unwrap()
            .minting_script(SCRIPT)
            .unwrap()
            .mint_redeemer_value(redeemer())
            .unwrap();
        let (body, _) = builder.build().unwrap();
        assert_eq!(body.mints[0].mint().asset_name, "abcd");
        assert_eq!(body.mints[0].mint().amount, Quantity::from(-5));
        assert!(body.mints[0].check_complete().is_ok());
    }

    #[test]
    fn empty_output_is_rejected_at_flush() {
        let mut builder = TxBuilder::new();
        builder.tx_out(ADDRESS, vec![]).unwrap();
        assert!(matches!(builder.build(), Err(BuilderError::InvalidOutputValue { .. })));

        let mut builder = TxBuilder::new();
        builder.tx_out(ADDRESS, lovelace(0)).unwrap();
        assert!(matches!(
            builder.queue_all_last_item().err(),
            Some(BuilderError::InvalidOutputValue { .. })
        ));
    }

    #[test]
    fn script_certificate_needs_redeemer() {
        let mut builder = TxBuilder::new();
        builder
            .register_stake_certificate("stake_test1ur5affkzhze7ru98chv78vh35rya3elk5k6v85hp7z5m33ck3l9w3")
            .unwrap()
            .certificate_script(SCRIPT, Some(LanguageVersion::V2))
            .unwrap();
        assert!(matches!(
            builder.queue_all_last_item().err(),
            Some(BuilderError::MissingWitnessData {
                kind: EntryKind::Certificate,
                ..
            })
        ));
    }

    #[test]
    fn native_witnessed_entries_complete_without_redeemer() {
        let stake = "stake_test1ur5affkzhze7ru98chv78vh35rya3elk5k6v85hp7z5m33ck3l9w3";
        let mut builder = TxBuilder::new();
        builder
            .deregister_stake_certificate(stake)
            .unwrap()
            .certificate_script(SCRIPT, None)
            .unwrap()
            .withdrawal(stake, 0)
            .unwrap()
            .withdrawal_script(SCRIPT)
            .unwrap();
        let (body, _) = builder.build().unwrap();
        assert!(matches!(body.certificates[0], Certificate::SimpleScript(_)));
        assert!(matches!(body.withdrawals[0], Withdrawal::SimpleScript(_)));
    }

    #[test]
    fn selection_is_carried_to_the_serializer() {
        let mut builder = TxBuilder::new();
        builder.select_utxos_from(vec![], 1_000_000u64).change_address(ADDRESS, None);
        let (body, selection) = builder.build().unwrap();
        assert_eq!(body.change_address, ADDRESS);
        assert_eq!(selection.unwrap().threshold, Coin::from(1_000_000u64));
    }
}

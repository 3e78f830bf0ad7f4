use crate::{
    drep::{Anchor, DRep},
    error::{BuilderError, BuilderResult, EntryKind},
    hash::{DataHash, KeyHash, VrfKeyHash},
    script::{Redeemer, ScriptSource, SimpleScriptSource},
    types::{Coin, Epoch},
};

// === Pool registration parameters ===

/// Pool relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relay {
    SingleHostAddr {
        ipv4: Option<String>,
        ipv6: Option<String>,
        port: Option<u16>,
    },
    SingleHostName {
        domain_name: String,
        port: Option<u16>,
    },
    MultiHostName {
        domain_name: String,
    },
}

/// Pool metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolMetadata {
    /// Metadata URL
    pub url: String,

    /// Metadata hash
    pub hash: DataHash,
}

/// Pool registration data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolParams {
    /// Operator key hash, which is also the pool id
    pub operator: KeyHash,

    /// VRF key hash
    pub vrf_key_hash: VrfKeyHash,

    /// Pledged Ada
    pub pledge: Coin,

    /// Fixed cost
    pub cost: Coin,

    /// Marginal cost as `(numerator, denominator)`
    pub margin: (u64, u64),

    /// Bech32 reward account
    pub reward_address: String,

    /// Pool owners by their key hash
    pub owners: Vec<KeyHash>,

    pub relays: Vec<Relay>,

    pub metadata: Option<PoolMetadata>,
}

// === Certificate kinds ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateType {
    RegisterPool {
        pool_params: PoolParams,
    },
    RegisterStake {
        stake_key_address: String,
    },
    DelegateStake {
        stake_key_address: String,
        pool_id: String,
    },
    DeregisterStake {
        stake_key_address: String,
    },
    RetirePool {
        pool_id: String,
        epoch: Epoch,
    },
    VoteDelegation {
        stake_key_address: String,
        drep: DRep,
    },
    StakeAndVoteDelegation {
        stake_key_address: String,
        pool_key_hash: String,
        drep: DRep,
    },
    StakeRegistrationAndDelegation {
        stake_key_address: String,
        pool_key_hash: String,
        coin: Coin,
    },
    VoteRegistrationAndDelegation {
        stake_key_address: String,
        drep: DRep,
        coin: Coin,
    },
    StakeVoteRegistrationAndDelegation {
        stake_key_address: String,
        pool_key_hash: String,
        drep: DRep,
        coin: Coin,
    },
    CommitteeHotAuth {
        committee_cold_key_address: String,
        committee_hot_key_address: String,
    },
    CommitteeColdResign {
        committee_cold_key_address: String,
        anchor: Option<Anchor>,
    },
    DRepRegistration {
        drep_id: String,
        coin: Coin,
        anchor: Option<Anchor>,
    },
    DRepDeregistration {
        drep_id: String,
        coin: Coin,
    },
    DRepUpdate {
        drep_id: String,
        anchor: Option<Anchor>,
    },
}

// === Witnessing wrappers ===

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptCertificate {
    pub cert: CertificateType,
    pub redeemer: Option<Redeemer>,
    pub script_source: Option<ScriptSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleScriptCertificate {
    pub cert: CertificateType,
    pub simple_script_source: Option<SimpleScriptSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Certificate {
    Basic(CertificateType),
    Script(ScriptCertificate),
    SimpleScript(SimpleScriptCertificate),
}

impl Certificate {
    pub fn cert(&self) -> &CertificateType {
        match self {
            Certificate::Basic(cert) => cert,
            Certificate::Script(script) => &script.cert,
            Certificate::SimpleScript(simple) => &simple.cert,
        }
    }

    pub fn check_complete(&self) -> BuilderResult<()> {
        match self {
            Certificate::Basic(_) => Ok(()),
            Certificate::Script(script) => {
                if script.script_source.is_none() {
                    return Err(BuilderError::missing(EntryKind::Certificate, "scriptSource"));
                }
                if script.redeemer.is_none() {
                    return Err(BuilderError::missing(EntryKind::Certificate, "redeemer"));
                }
                Ok(())
            }
            Certificate::SimpleScript(simple) => match simple.simple_script_source {
                Some(_) => Ok(()),
                None => Err(BuilderError::missing(
                    EntryKind::Certificate,
                    "simpleScriptSource",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_certificate_needs_redeemer() {
        let cert = Certificate::Script(ScriptCertificate {
            cert: CertificateType::RegisterStake {
                stake_key_address: "stake_test1uzx0ksy9f4qnj2mzfdncqyjy84sszh64w43853nug5pedjgytgke9"
                    .to_string(),
            },
            redeemer: None,
            script_source: Some(ScriptSource::Provided {
                code: "4e4d01000033222220051200120011".to_string(),
                version: crate::LanguageVersion::V2,
            }),
        });
        assert_eq!(
            cert.check_complete(),
            Err(BuilderError::missing(EntryKind::Certificate, "redeemer"))
        );
    }

    #[test]
    fn basic_certificate_is_always_complete() {
        let cert = Certificate::Basic(CertificateType::RetirePool {
            pool_id: "pool1mhww3q6d7qssj5j2add05r7cyr7znyswe2g6vd23anpx5sh6z8d".to_string(),
            epoch: 512,
        });
        assert!(cert.check_complete().is_ok());
        assert!(matches!(cert.cert(), CertificateType::RetirePool { epoch: 512, .. }));
    }
}

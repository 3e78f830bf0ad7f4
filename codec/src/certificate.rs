//! Certificates: the three witnessing wrappers and the fifteen certificate kinds

use cairn_common::{
    BuilderError, BuilderResult, Certificate, CertificateType, DRep, PoolMetadata, PoolParams,
    Relay, ScriptCertificate, SimpleScriptCertificate,
};
use serde_json::{Value, json};

use crate::{script::*, utils::*, vote::*};

// === DReps, relays and pool parameters ===

pub fn drep_to_obj(drep: &DRep) -> Value {
    match drep {
        DRep::KeyHash(hash) => json!({"keyHash": hash.to_string()}),
        DRep::ScriptHash(hash) => json!({"scriptHash": hash.to_string()}),
        DRep::AlwaysAbstain => json!({"alwaysAbstain": {}}),
        DRep::AlwaysNoConfidence => json!({"alwaysNoConfidence": {}}),
    }
}

pub fn drep_from_obj(value: &Value) -> BuilderResult<DRep> {
    const ENTITY: &str = "DRep";
    let (key, _) = variant(value, ENTITY)?;
    let obj = as_object(value, ENTITY)?;
    match key {
        "keyHash" => Ok(DRep::KeyHash(hash_field(obj, ENTITY, "keyHash")?)),
        "scriptHash" => Ok(DRep::ScriptHash(hash_field(obj, ENTITY, "scriptHash")?)),
        "alwaysAbstain" => Ok(DRep::AlwaysAbstain),
        "alwaysNoConfidence" => Ok(DRep::AlwaysNoConfidence),
        _ => Err(unknown(ENTITY, value)),
    }
}

pub fn relay_to_obj(relay: &Relay) -> Value {
    match relay {
        Relay::SingleHostAddr { ipv4, ipv6, port } => tagged(
            "singleHostAddr",
            json!({"ipv4": ipv4, "ipv6": ipv6, "port": port}),
        ),
        Relay::SingleHostName { domain_name, port } => tagged(
            "singleHostName",
            json!({"domainName": domain_name, "port": port}),
        ),
        Relay::MultiHostName { domain_name } => {
            tagged("multiHostName", json!({"domainName": domain_name}))
        }
    }
}

fn port_field(obj: &Obj, entity: &str) -> BuilderResult<Option<u16>> {
    opt_u64_field(obj, entity, "port")?
        .map(|port| {
            u16::try_from(port)
                .map_err(|_| BuilderError::invalid_field(entity, "port", "out of range"))
        })
        .transpose()
}

pub fn relay_from_obj(value: &Value) -> BuilderResult<Relay> {
    const ENTITY: &str = "Relay";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    match key {
        "singleHostAddr" => Ok(Relay::SingleHostAddr {
            ipv4: opt_str_field(obj, ENTITY, "ipv4")?,
            ipv6: opt_str_field(obj, ENTITY, "ipv6")?,
            port: port_field(obj, ENTITY)?,
        }),
        "singleHostName" => Ok(Relay::SingleHostName {
            domain_name: str_field(obj, ENTITY, "domainName")?,
            port: port_field(obj, ENTITY)?,
        }),
        "multiHostName" => Ok(Relay::MultiHostName {
            domain_name: str_field(obj, ENTITY, "domainName")?,
        }),
        _ => Err(unknown(ENTITY, value)),
    }
}

pub fn pool_params_to_obj(params: &PoolParams) -> Value {
    json!({
        "vrfKeyHash": params.vrf_key_hash.to_string(),
        "operator": params.operator.to_string(),
        "pledge": bigint_to_json(&params.pledge),
        "cost": bigint_to_json(&params.cost),
        "margin": [params.margin.0, params.margin.1],
        "relays": params.relays.iter().map(relay_to_obj).collect::<Vec<_>>(),
        "owners": params.owners.iter().map(|owner| owner.to_string()).collect::<Vec<_>>(),
        "rewardAddress": params.reward_address,
        "metadata": params.metadata.as_ref().map(|metadata| json!({
            "url": metadata.url,
            "hash": metadata.hash.to_string(),
        })),
    })
}

pub fn pool_params_from_obj(value: &Value) -> BuilderResult<PoolParams> {
    const ENTITY: &str = "PoolParams";
    let obj = as_object(value, ENTITY)?;

    let margin = as_array(field(obj, ENTITY, "margin")?, ENTITY, "margin")?;
    let margin = match margin.as_slice() {
        [numerator, denominator] => (
            numerator.as_u64(),
            denominator.as_u64().filter(|denominator| *denominator != 0),
        ),
        _ => (None, None),
    };
    let margin = match margin {
        (Some(numerator), Some(denominator)) => (numerator, denominator),
        _ => {
            return Err(BuilderError::invalid_field(
                ENTITY,
                "margin",
                "expected [numerator, denominator]",
            ));
        }
    };

    let owners = as_array(field(obj, ENTITY, "owners")?, ENTITY, "owners")?
        .iter()
        .map(|owner| {
            owner
                .as_str()
                .and_then(|owner| owner.parse().ok())
                .ok_or_else(|| BuilderError::invalid_field(ENTITY, "owners", "expected key hashes"))
        })
        .collect::<BuilderResult<Vec<_>>>()?;

    let metadata = opt_field(obj, "metadata")
        .map(|metadata| {
            let metadata = as_object(metadata, "PoolMetadata")?;
            Ok::<_, BuilderError>(PoolMetadata {
                url: str_field(metadata, "PoolMetadata", "url")?,
                hash: hash_field(metadata, "PoolMetadata", "hash")?,
            })
        })
        .transpose()?;

    Ok(PoolParams {
        operator: hash_field(obj, ENTITY, "operator")?,
        vrf_key_hash: hash_field(obj, ENTITY, "vrfKeyHash")?,
        pledge: bigint_field(obj, ENTITY, "pledge")?,
        cost: bigint_field(obj, ENTITY, "cost")?,
        margin,
        reward_address: str_field(obj, ENTITY, "rewardAddress")?,
        owners,
        relays: as_array(field(obj, ENTITY, "relays")?, ENTITY, "relays")?
            .iter()
            .map(relay_from_obj)
            .collect::<BuilderResult<Vec<_>>>()?,
        metadata,
    })
}

// === Certificate kinds ===

pub fn certificate_type_to_obj(cert: &CertificateType) -> Value {
    match cert {
        CertificateType::RegisterPool { pool_params } => {
            tagged("registerPool", json!({"poolParams": pool_params_to_obj(pool_params)}))
        }
        CertificateType::RegisterStake { stake_key_address } => {
            tagged("registerStake", json!({"stakeKeyAddress": stake_key_address}))
        }
        CertificateType::DelegateStake {
            stake_key_address,
            pool_id,
        } => tagged(
            "delegateStake",
            json!({"stakeKeyAddress": stake_key_address, "poolId": pool_id}),
        ),
        CertificateType::DeregisterStake { stake_key_address } => {
            tagged("deregisterStake", json!({"stakeKeyAddress": stake_key_address}))
        }
        CertificateType::RetirePool { pool_id, epoch } => {
            tagged("retirePool", json!({"poolId": pool_id, "epoch": epoch}))
        }
        CertificateType::VoteDelegation {
            stake_key_address,
            drep,
        } => tagged(
            "voteDelegation",
            json!({"stakeKeyAddress": stake_key_address, "drep": drep_to_obj(drep)}),
        ),
        CertificateType::StakeAndVoteDelegation {
            stake_key_address,
            pool_key_hash,
            drep,
        } => tagged(
            "stakeAndVoteDelegation",
            json!({
                "stakeKeyAddress": stake_key_address,
                "poolKeyHash": pool_key_hash,
                "drep": drep_to_obj(drep),
            }),
        ),
        CertificateType::StakeRegistrationAndDelegation {
            stake_key_address,
            pool_key_hash,
            coin,
        } => tagged(
            "stakeRegistrationAndDelegation",
            json!({
                "stakeKeyAddress": stake_key_address,
                "poolKeyHash": pool_key_hash,
                "coin": bigint_to_json(coin),
            }),
        ),
        CertificateType::VoteRegistrationAndDelegation {
            stake_key_address,
            drep,
            coin,
        } => tagged(
            "voteRegistrationAndDelegation",
            json!({
                "stakeKeyAddress": stake_key_address,
                "drep": drep_to_obj(drep),
                "coin": bigint_to_json(coin),
            }),
        ),
        CertificateType::StakeVoteRegistrationAndDelegation {
            stake_key_address,
            pool_key_hash,
            drep,
            coin,
        } => tagged(
            "stakeVoteRegistrationAndDelegation",
            json!({
                "stakeKeyAddress": stake_key_address,
                "poolKeyHash": pool_key_hash,
                "drep": drep_to_obj(drep),
                "coin": bigint_to_json(coin),
            }),
        ),
        CertificateType::CommitteeHotAuth {
            committee_cold_key_address,
            committee_hot_key_address,
        } => tagged(
            "committeeHotAuth",
            json!({
                "committeeColdKeyAddress": committee_cold_key_address,
                "committeeHotKeyAddress": committee_hot_key_address,
            }),
        ),
        CertificateType::CommitteeColdResign {
            committee_cold_key_address,
            anchor,
        } => tagged(
            "committeeColdResign",
            json!({
                "committeeColdKeyAddress": committee_cold_key_address,
                "anchor": opt_to_json(anchor.as_ref(), anchor_to_obj),
            }),
        ),
        CertificateType::DRepRegistration {
            drep_id,
            coin,
            anchor,
        } => tagged(
            "dRepRegistration",
            json!({
                "drepId": drep_id,
                "coin": bigint_to_json(coin),
                "anchor": opt_to_json(anchor.as_ref(), anchor_to_obj),
            }),
        ),
        CertificateType::DRepDeregistration { drep_id, coin } => tagged(
            "dRepDeregistration",
            json!({"drepId": drep_id, "coin": bigint_to_json(coin)}),
        ),
        CertificateType::DRepUpdate { drep_id, anchor } => tagged(
            "dRepUpdate",
            json!({
                "drepId": drep_id,
                "anchor": opt_to_json(anchor.as_ref(), anchor_to_obj),
            }),
        ),
    }
}

pub fn certificate_type_from_obj(value: &Value) -> BuilderResult<CertificateType> {
    const ENTITY: &str = "Certificate";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(inner, ENTITY)?;
    let stake = || str_field(obj, ENTITY, "stakeKeyAddress");
    let drep = || drep_from_obj(field(obj, ENTITY, "drep")?);
    let coin = || bigint_field(obj, ENTITY, "coin");
    let anchor = || opt_field(obj, "anchor").map(anchor_from_obj).transpose();
    let pool_key_hash = || str_field(obj, ENTITY, "poolKeyHash");
    let drep_id = || str_field(obj, ENTITY, "drepId");

    match key {
        "registerPool" => Ok(CertificateType::RegisterPool {
            pool_params: pool_params_from_obj(field(obj, ENTITY, "poolParams")?)?,
        }),
        "registerStake" => Ok(CertificateType::RegisterStake {
            stake_key_address: stake()?,
        }),
        "delegateStake" => Ok(CertificateType::DelegateStake {
            stake_key_address: stake()?,
            pool_id: str_field(obj, ENTITY, "poolId")?,
        }),
        "deregisterStake" => Ok(CertificateType::DeregisterStake {
            stake_key_address: stake()?,
        }),
        "retirePool" => Ok(CertificateType::RetirePool {
            pool_id: str_field(obj, ENTITY, "poolId")?,
            epoch: u64_field(obj, ENTITY, "epoch")?,
        }),
        "voteDelegation" => Ok(CertificateType::VoteDelegation {
            stake_key_address: stake()?,
            drep: drep()?,
        }),
        "stakeAndVoteDelegation" => Ok(CertificateType::StakeAndVoteDelegation {
            stake_key_address: stake()?,
            pool_key_hash: pool_key_hash()?,
            drep: drep()?,
        }),
        "stakeRegistrationAndDelegation" => Ok(CertificateType::StakeRegistrationAndDelegation {
            stake_key_address: stake()?,
            pool_key_hash: pool_key_hash()?,
            coin: coin()?,
        }),
        "voteRegistrationAndDelegation" => Ok(CertificateType::VoteRegistrationAndDelegation {
            stake_key_address: stake()?,
            drep: drep()?,
            coin: coin()?,
        }),
        "stakeVoteRegistrationAndDelegation" => {
            Ok(CertificateType::StakeVoteRegistrationAndDelegation {
                stake_key_address: stake()?,
                pool_key_hash: pool_key_hash()?,
                drep: drep()?,
                coin: coin()?,
            })
        }
        "committeeHotAuth" => Ok(CertificateType::CommitteeHotAuth {
            committee_cold_key_address: str_field(obj, ENTITY, "committeeColdKeyAddress")?,
            committee_hot_key_address: str_field(obj, ENTITY, "committeeHotKeyAddress")?,
        }),
        "committeeColdResign" => Ok(CertificateType::CommitteeColdResign {
            committee_cold_key_address: str_field(obj, ENTITY, "committeeColdKeyAddress")?,
            anchor: anchor()?,
        }),
        "dRepRegistration" => Ok(CertificateType::DRepRegistration {
            drep_id: drep_id()?,
            coin: coin()?,
            anchor: anchor()?,
        }),
        "dRepDeregistration" => Ok(CertificateType::DRepDeregistration {
            drep_id: drep_id()?,
            coin: coin()?,
        }),
        "dRepUpdate" => Ok(CertificateType::DRepUpdate {
            drep_id: drep_id()?,
            anchor: anchor()?,
        }),
        _ => Err(unknown(ENTITY, value)),
    }
}

// === Witnessing wrappers ===

pub fn certificate_to_obj(cert: &Certificate) -> BuilderResult<Value> {
    cert.check_complete()?;
    Ok(match cert {
        Certificate::Basic(cert) => tagged("basicCertificate", certificate_type_to_obj(cert)),
        Certificate::Script(script) => tagged(
            "scriptCertificate",
            json!({
                "cert": certificate_type_to_obj(&script.cert),
                "redeemer": match &script.redeemer {
                    Some(redeemer) => redeemer_to_obj(redeemer)?,
                    None => Value::Null,
                },
                "scriptSource": opt_to_json(script.script_source.as_ref(), script_source_to_obj),
            }),
        ),
        Certificate::SimpleScript(simple) => tagged(
            "simpleScriptCertificate",
            json!({
                "cert": certificate_type_to_obj(&simple.cert),
                "simpleScriptSource": opt_to_json(
                    simple.simple_script_source.as_ref(),
                    simple_script_source_to_obj,
                ),
            }),
        ),
    })
}

pub fn certificate_from_obj(value: &Value) -> BuilderResult<Certificate> {
    const ENTITY: &str = "CertificateWrapper";
    let (key, inner) = variant(value, ENTITY)?;
    match key {
        "basicCertificate" => Ok(Certificate::Basic(certificate_type_from_obj(inner)?)),
        "scriptCertificate" => {
            let obj = as_object(inner, ENTITY)?;
            Ok(Certificate::Script(ScriptCertificate {
                cert: certificate_type_from_obj(field(obj, ENTITY, "cert")?)?,
                redeemer: opt_field(obj, "redeemer").map(redeemer_from_obj).transpose()?,
                script_source: opt_field(obj, "scriptSource")
                    .map(script_source_from_obj)
                    .transpose()?,
            }))
        }
        "simpleScriptCertificate" => {
            let obj = as_object(inner, ENTITY)?;
            Ok(Certificate::SimpleScript(SimpleScriptCertificate {
                cert: certificate_type_from_obj(field(obj, ENTITY, "cert")?)?,
                simple_script_source: opt_field(obj, "simpleScriptSource")
                    .map(simple_script_source_from_obj)
                    .transpose()?,
            }))
        }
        _ => Err(unknown(ENTITY, value)),
    }
}

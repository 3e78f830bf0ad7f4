use cairn_common::{
    Anchor, BuilderResult, Credential, ScriptVote, SimpleScriptVote, Vote, VoteKind, VoteType,
    Voter, VotingProcedure,
};
use serde_json::{Value, json};

use crate::{script::*, utils::*};

pub fn anchor_to_obj(anchor: &Anchor) -> Value {
    json!({
        "anchorUrl": anchor.url,
        "anchorDataHash": anchor.data_hash.to_string(),
    })
}

pub fn anchor_from_obj(value: &Value) -> BuilderResult<Anchor> {
    const ENTITY: &str = "Anchor";
    let obj = as_object(value, ENTITY)?;
    Ok(Anchor {
        url: str_field(obj, ENTITY, "anchorUrl")?,
        data_hash: hash_field(obj, ENTITY, "anchorDataHash")?,
    })
}

pub fn credential_to_obj(credential: &Credential) -> Value {
    match credential {
        Credential::KeyHash(hash) => json!({"keyHash": hash.to_string()}),
        Credential::ScriptHash(hash) => json!({"scriptHash": hash.to_string()}),
    }
}

pub fn credential_from_obj(value: &Value) -> BuilderResult<Credential> {
    const ENTITY: &str = "Credential";
    let (key, _) = variant(value, ENTITY)?;
    let obj = as_object(value, ENTITY)?;
    match key {
        "keyHash" => Ok(Credential::KeyHash(hash_field(obj, ENTITY, "keyHash")?)),
        "scriptHash" => Ok(Credential::ScriptHash(hash_field(obj, ENTITY, "scriptHash")?)),
        _ => Err(unknown(ENTITY, value)),
    }
}

pub fn voter_to_obj(voter: &Voter) -> Value {
    match voter {
        Voter::ConstitutionalCommittee { hot_cred } => {
            json!({"constitutionalCommitteeHotCred": credential_to_obj(hot_cred)})
        }
        Voter::DRep { drep_id } => json!({"dRepId": drep_id}),
        Voter::StakingPool { key_hash } => json!({"stakingPoolKeyHash": key_hash.to_string()}),
    }
}

pub fn voter_from_obj(value: &Value) -> BuilderResult<Voter> {
    const ENTITY: &str = "Voter";
    let (key, inner) = variant(value, ENTITY)?;
    let obj = as_object(value, ENTITY)?;
    match key {
        "constitutionalCommitteeHotCred" => Ok(Voter::ConstitutionalCommittee {
            hot_cred: credential_from_obj(inner)?,
        }),
        "dRepId" => Ok(Voter::DRep {
            drep_id: str_field(obj, ENTITY, "dRepId")?,
        }),
        "stakingPoolKeyHash" => Ok(Voter::StakingPool {
            key_hash: hash_field(obj, ENTITY, "stakingPoolKeyHash")?,
        }),
        _ => Err(unknown(ENTITY, value)),
    }
}

fn vote_kind_name(kind: VoteKind) -> &'static str {
    match kind {
        VoteKind::Yes => "yes",
        VoteKind::No => "no",
        VoteKind::Abstain => "abstain",
    }
}

fn voting_procedure_from_obj(value: &Value) -> BuilderResult<VotingProcedure> {
    const ENTITY: &str = "VotingProcedure";
    let obj = as_object(value, ENTITY)?;
    let vote_kind = match str_field(obj, ENTITY, "voteKind")?.as_str() {
        "yes" => VoteKind::Yes,
        "no" => VoteKind::No,
        "abstain" => VoteKind::Abstain,
        other => {
            return Err(cairn_common::BuilderError::invalid_field(
                ENTITY,
                "voteKind",
                format!("unknown vote kind '{other}'"),
            ));
        }
    };
    Ok(VotingProcedure {
        vote_kind,
        anchor: opt_field(obj, "anchor").map(anchor_from_obj).transpose()?,
    })
}

fn vote_type_to_obj(vote: &VoteType) -> Value {
    json!({
        "voter": voter_to_obj(&vote.voter),
        "votingProcedure": {
            "voteKind": vote_kind_name(vote.voting_procedure.vote_kind),
            "anchor": opt_to_json(vote.voting_procedure.anchor.as_ref(), anchor_to_obj),
        },
        "govActionId": ref_tx_in_to_obj(&vote.gov_action_id),
    })
}

fn vote_type_from_obj(value: &Value) -> BuilderResult<VoteType> {
    const ENTITY: &str = "Vote";
    let obj = as_object(value, ENTITY)?;
    Ok(VoteType {
        voter: voter_from_obj(field(obj, ENTITY, "voter")?)?,
        voting_procedure: voting_procedure_from_obj(field(obj, ENTITY, "votingProcedure")?)?,
        gov_action_id: ref_tx_in_from_obj(field(obj, ENTITY, "govActionId")?, ENTITY)?,
    })
}

pub fn vote_to_obj(vote: &Vote) -> BuilderResult<Value> {
    vote.check_complete()?;
    Ok(match vote {
        Vote::Basic(vote) => tagged("basicVote", vote_type_to_obj(vote)),
        Vote::Script(script) => tagged(
            "scriptVote",
            json!({
                "vote": vote_type_to_obj(&script.vote),
                "redeemer": match &script.redeemer {
                    Some(redeemer) => redeemer_to_obj(redeemer)?,
                    None => Value::Null,
                },
                "scriptSource": opt_to_json(script.script_source.as_ref(), script_source_to_obj),
            }),
        ),
        Vote::SimpleScript(simple) => tagged(
            "simpleScriptVote",
            json!({
                "vote": vote_type_to_obj(&simple.vote),
                "simpleScriptSource": opt_to_json(
                    simple.simple_script_source.as_ref(),
                    simple_script_source_to_obj,
                ),
            }),
        ),
    })
}

pub fn vote_from_obj(value: &Value) -> BuilderResult<Vote> {
    const ENTITY: &str = "Vote";
    let (key, inner) = variant(value, ENTITY)?;
    match key {
        "basicVote" => Ok(Vote::Basic(vote_type_from_obj(inner)?)),
        "scriptVote" => {
            let obj = as_object(inner, ENTITY)?;
            Ok(Vote::Script(ScriptVote {
                vote: vote_type_from_obj(field(obj, ENTITY, "vote")?)?,
                script_source: opt_field(obj, "scriptSource")
                    .map(script_source_from_obj)
                    .transpose()?,
                redeemer: opt_field(obj, "redeemer").map(redeemer_from_obj).transpose()?,
            }))
        }
        "simpleScriptVote" => {
            let obj = as_object(inner, ENTITY)?;
            Ok(Vote::SimpleScript(SimpleScriptVote {
                vote: vote_type_from_obj(field(obj, ENTITY, "vote")?)?,
                simple_script_source: opt_field(obj, "simpleScriptSource")
                    .map(simple_script_source_from_obj)
                    .transpose()?,
            }))
        }
        _ => Err(unknown(ENTITY, value)),
    }
}

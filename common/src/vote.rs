//! Governance votes cast by the transaction

use crate::{
    drep::{Anchor, Credential},
    error::{BuilderError, BuilderResult, EntryKind},
    hash::KeyHash,
    script::{Redeemer, ScriptSource, SimpleScriptSource},
    types::RefTxIn,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Yes,
    No,
    Abstain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Voter {
    ConstitutionalCommittee { hot_cred: Credential },

    /// Bech32 DRep id
    DRep { drep_id: String },

    StakingPool { key_hash: KeyHash },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VotingProcedure {
    pub vote_kind: VoteKind,
    pub anchor: Option<Anchor>,
}

/// The vote itself, independent of how it is witnessed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteType {
    pub voter: Voter,
    pub voting_procedure: VotingProcedure,
    pub gov_action_id: RefTxIn,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptVote {
    pub vote: VoteType,
    pub script_source: Option<ScriptSource>,
    pub redeemer: Option<Redeemer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleScriptVote {
    pub vote: VoteType,
    pub simple_script_source: Option<SimpleScriptSource>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Vote {
    Basic(VoteType),
    Script(ScriptVote),
    SimpleScript(SimpleScriptVote),
}

impl Vote {
    pub fn vote(&self) -> &VoteType {
        match self {
            Vote::Basic(vote) => vote,
            Vote::Script(script) => &script.vote,
            Vote::SimpleScript(simple) => &simple.vote,
        }
    }

    pub fn check_complete(&self) -> BuilderResult<()> {
        match self {
            Vote::Basic(_) => Ok(()),
            Vote::Script(script) => {
                if script.script_source.is_none() {
                    return Err(BuilderError::missing(EntryKind::Vote, "scriptSource"));
                }
                if script.redeemer.is_none() {
                    return Err(BuilderError::missing(EntryKind::Vote, "redeemer"));
                }
                Ok(())
            }
            Vote::SimpleScript(simple) => match simple.simple_script_source {
                Some(_) => Ok(()),
                None => Err(BuilderError::missing(EntryKind::Vote, "simpleScriptSource")),
            },
        }
    }
}

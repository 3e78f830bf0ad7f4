use crate::hash::{DataHash, KeyHash, ScriptHash};

/// Off-chain document reference attached to governance certificates and votes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Metadata URL
    pub url: String,

    /// Blake2b-256 of the document
    pub data_hash: DataHash,
}

/// Key or script credential
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Credential {
    KeyHash(KeyHash),
    ScriptHash(ScriptHash),
}

/// Delegation target for voting power
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DRep {
    KeyHash(KeyHash),
    ScriptHash(ScriptHash),
    AlwaysAbstain,
    AlwaysNoConfidence,
}

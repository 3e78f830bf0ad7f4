//! Script, datum and redeemer sources attached to script-witnessed entries

use crate::{
    hash::{ScriptHash, TxHash},
    types::{ExUnits, LanguageVersion},
};

/// One Plutus data value in one of three interchangeable source encodings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderData {
    /// Constructor/fields shaped JSON (`{"alternative": 0, "fields": [...]}`)
    Structured(serde_json::Value),

    /// CBOR hex, the canonical form
    RawBinary(String),

    /// Detailed-schema JSON (`{"constructor": 0, "fields": [...]}`)
    RawTextSchema(serde_json::Value),
}

impl BuilderData {
    pub fn cbor(hex: impl Into<String>) -> Self {
        BuilderData::RawBinary(hex.into())
    }

    /// CBOR hex when already normalized
    pub fn as_cbor(&self) -> Option<&str> {
        match self {
            BuilderData::RawBinary(hex) => Some(hex),
            _ => None,
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self, BuilderData::RawBinary(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redeemer {
    pub data: BuilderData,
    pub ex_units: ExUnits,
}

/// Where a Plutus script comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Script bytes carried in the witness set
    Provided { code: String, version: LanguageVersion },

    /// Script held as a reference script at an existing output
    ReferenceScript {
        tx_hash: TxHash,
        tx_index: u32,
        script_hash: ScriptHash,
        script_size: u64,
        version: LanguageVersion,
    },

    /// Script known only by hash, supplied elsewhere
    ByHash { script_hash: ScriptHash, version: LanguageVersion },
}

impl ScriptSource {
    pub fn version(&self) -> LanguageVersion {
        match self {
            ScriptSource::Provided { version, .. }
            | ScriptSource::ReferenceScript { version, .. }
            | ScriptSource::ByHash { version, .. } => *version,
        }
    }

    /// Bytes of script referenced from an output, which attract the reference script fee
    pub fn referenced_size(&self) -> u64 {
        match self {
            ScriptSource::ReferenceScript { script_size, .. } => *script_size,
            _ => 0,
        }
    }
}

/// Where a native (simple) script comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleScriptSource {
    Provided {
        code: String,
    },
    ReferenceScript {
        tx_hash: TxHash,
        tx_index: u32,
        script_hash: ScriptHash,
        script_size: u64,
    },
}

impl SimpleScriptSource {
    pub fn referenced_size(&self) -> u64 {
        match self {
            SimpleScriptSource::ReferenceScript { script_size, .. } => *script_size,
            SimpleScriptSource::Provided { .. } => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatumSource {
    /// Datum value supplied in the witness set
    Provided { data: BuilderData },

    /// Datum inlined in the spent output
    Inline { tx_hash: TxHash, tx_index: u32 },
}

/// Script attached to an output as a reference script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputScript {
    Plutus { code: String, version: LanguageVersion },
    Native { code: String },
}

use std::{collections::BTreeMap, fmt};

use crate::Quantity;

/// The kinds of entry the accumulator queues, used to label errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Input,
    Collateral,
    ReferenceInput,
    Output,
    Mint,
    Certificate,
    Withdrawal,
    Vote,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryKind::Input => "input",
            EntryKind::Collateral => "collateral",
            EntryKind::ReferenceInput => "reference input",
            EntryKind::Output => "output",
            EntryKind::Mint => "mint",
            EntryKind::Certificate => "certificate",
            EntryKind::Withdrawal => "withdrawal",
            EntryKind::Vote => "vote",
        };
        f.write_str(name)
    }
}

/// Deficits still uncovered after a selection pass, keyed by asset unit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Deficit(pub BTreeMap<String, Quantity>);

impl fmt::Display for Deficit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(unit, q)| format!("{unit}: {q}")).collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// Errors raised while building, converting or estimating a transaction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    /// A script-witnessed entry was flushed without a required field
    #[error("{kind} is missing required witness data: {field}")]
    MissingWitnessData { kind: EntryKind, field: &'static str },

    /// Witness data was attached to an entry that cannot carry it
    #[error("{kind} cannot carry {field}")]
    UnexpectedWitnessData { kind: EntryKind, field: &'static str },

    /// A modifier was called with no entry of that kind open
    #[error("no {0} is currently open")]
    NoOpenEntry(EntryKind),

    /// A wire object carried none of the known discriminator keys
    #[error("unknown {entity} variant, keys: {keys:?}")]
    UnknownVariant { entity: String, keys: Vec<String> },

    /// A wire object field was absent or had the wrong shape
    #[error("invalid {entity}.{field}: {reason}")]
    InvalidField { entity: String, field: String, reason: String },

    /// Plutus data reached the adaptor before being normalized to CBOR
    #[error("plutus data must be normalized to CBOR before conversion")]
    UnnormalizedData,

    /// The selection pool cannot cover the required value
    #[error("insufficient funds, remaining deficit {0}")]
    InsufficientFunds(Deficit),

    /// An output carries no positive quantity
    #[error("output to {address} has no value")]
    InvalidOutputValue { address: String },

    /// Opaque failure reported by the ledger engine
    #[error("ledger engine error: {0}")]
    ExternalEngine(String),

    /// A protocol parameter could not be read
    #[error("missing protocol parameter: {0}")]
    MissingProtocolParameters(String),

    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("malformed transaction CBOR: {0}")]
    Cbor(String),
}

impl BuilderError {
    pub fn unknown_variant(entity: &str, keys: Vec<String>) -> Self {
        Self::UnknownVariant {
            entity: entity.to_string(),
            keys,
        }
    }

    pub fn invalid_field(entity: &str, field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            entity: entity.to_string(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(kind: EntryKind, field: &'static str) -> Self {
        Self::MissingWitnessData { kind, field }
    }
}

pub type BuilderResult<T> = Result<T, BuilderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entry_and_field() {
        let err = BuilderError::missing(EntryKind::Input, "redeemer");
        assert_eq!(err.to_string(), "input is missing required witness data: redeemer");

        let err = BuilderError::invalid_field("Output", "address", "expected a string");
        assert_eq!(err.to_string(), "invalid Output.address: expected a string");
    }

    #[test]
    fn deficit_display_lists_units() {
        let mut remaining = BTreeMap::new();
        remaining.insert("lovelace".to_string(), Quantity::from(42u8));
        let err = BuilderError::InsufficientFunds(Deficit(remaining));
        assert_eq!(err.to_string(), "insufficient funds, remaining deficit {lovelace: 42}");
    }
}

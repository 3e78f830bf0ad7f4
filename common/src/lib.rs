// Cairn common library - main library exports

pub mod address;
pub mod asset;
pub mod certificate;
pub mod configuration;
pub mod drep;
pub mod error;
pub mod hash;
pub mod metadata;
pub mod protocol_params;
pub mod rational_number;
pub mod script;
pub mod tx;
pub mod types;
pub mod vote;

// Flattened re-exports
pub use self::asset::{check_unit, merge_unit, split_unit, Asset, Value, LOVELACE};
pub use self::certificate::*;
pub use self::drep::*;
pub use self::error::{BuilderError, BuilderResult, Deficit, EntryKind};
pub use self::hash::*;
pub use self::metadata::*;
pub use self::protocol_params::ProtocolParams;
pub use self::script::*;
pub use self::tx::*;
pub use self::types::*;
pub use self::vote::*;

//! Conversion between builder entities and the JSON object model the ledger engine consumes

mod body;
mod certificate;
mod metadata;
mod mint;
mod network;
mod output;
mod script;
mod tx_in;
mod utils;
mod utxo;
mod vote;
mod withdrawal;

#[cfg(test)]
mod test_fixtures;

pub use body::*;
pub use certificate::*;
pub use metadata::*;
pub use mint::*;
pub use network::*;
pub use output::*;
pub use script::*;
pub use tx_in::*;
pub use utils::*;
pub use utxo::*;
pub use vote::*;
pub use withdrawal::*;

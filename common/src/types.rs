//! Core scalar types and small records shared across the builder

use std::fmt;
use std::str::FromStr;

use crate::{asset::Asset, hash::TxHash, ScriptHash};

/// Arbitrary-precision signed quantity; mints may be negative
pub type Quantity = dashu_int::IBig;

/// Amount of lovelace
pub type Coin = dashu_int::IBig;

/// Absolute slot number
pub type Slot = u64;

/// Epoch number
pub type Epoch = u64;

/// Pointer to an output of an earlier transaction
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RefTxIn {
    pub tx_hash: TxHash,
    pub tx_index: u32,
}

impl RefTxIn {
    pub fn new(tx_hash: TxHash, tx_index: u32) -> Self {
        Self { tx_hash, tx_index }
    }
}

impl fmt::Display for RefTxIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.tx_index)
    }
}

/// A reference input, optionally noting the size of a script held at that output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceInput {
    pub tx_hash: TxHash,
    pub tx_index: u32,
    pub script_size: Option<u64>,
}

/// Execution budget claimed by a redeemer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ExUnits {
    pub mem: u64,
    pub steps: u64,
}

impl ExUnits {
    pub fn new(mem: u64, steps: u64) -> Self {
        Self { mem, steps }
    }
}

/// Plutus language version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LanguageVersion {
    V1,
    V2,
    V3,
}

impl fmt::Display for LanguageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageVersion::V1 => write!(f, "v1"),
            LanguageVersion::V2 => write!(f, "v2"),
            LanguageVersion::V3 => write!(f, "v3"),
        }
    }
}

impl FromStr for LanguageVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" => Ok(LanguageVersion::V1),
            "v2" => Ok(LanguageVersion::V2),
            "v3" => Ok(LanguageVersion::V3),
            other => Err(format!("unknown language version '{other}'")),
        }
    }
}

/// Network the transaction targets. `Custom` carries cost model rows for a private network.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Preview,
    Preprod,
    Custom(Vec<Vec<i64>>),
}

impl Network {
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("mainnet"),
            Network::Testnet => Some("testnet"),
            Network::Preview => Some("preview"),
            Network::Preprod => Some("preprod"),
            Network::Custom(_) => None,
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "preview" => Ok(Network::Preview),
            "preprod" => Ok(Network::Preprod),
            other => Err(format!("unknown network '{other}'")),
        }
    }
}

/// The output half of a UTxO as reported by a chain provider
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UtxoOutput {
    pub address: String,
    pub amount: Vec<Asset>,
    pub data_hash: Option<String>,
    pub plutus_data: Option<String>,
    pub script_ref: Option<String>,
    pub script_hash: Option<ScriptHash>,
}

/// An unspent output: where it lives and what it holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UTxO {
    pub input: RefTxIn,
    pub output: UtxoOutput,
}

impl UTxO {
    /// Size in bytes of an attached reference script, if any
    pub fn script_size(&self) -> Option<u64> {
        self.output.script_ref.as_ref().map(|s| (s.len() / 2) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_version_parses_case_insensitively() {
        assert_eq!("V2".parse::<LanguageVersion>(), Ok(LanguageVersion::V2));
        assert_eq!(LanguageVersion::V3.to_string(), "v3");
        assert!("v4".parse::<LanguageVersion>().is_err());
    }

    #[test]
    fn named_networks_round_trip_through_names() {
        for network in [Network::Mainnet, Network::Testnet, Network::Preview, Network::Preprod] {
            let name = network.name().unwrap();
            assert_eq!(name.parse::<Network>().unwrap(), network);
        }
        assert_eq!(Network::Custom(vec![]).name(), None);
    }

    #[test]
    fn ref_tx_in_displays_as_pointer() {
        let tx_hash: TxHash =
            "0d8d00cdd4657ac84d82f0a56067634a7adfdf43da41cb534bcaa45060973d21".parse().unwrap();
        assert_eq!(
            RefTxIn::new(tx_hash, 3).to_string(),
            "0d8d00cdd4657ac84d82f0a56067634a7adfdf43da41cb534bcaa45060973d21#3"
        );
    }
}

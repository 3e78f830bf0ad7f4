use config::{Config, ConfigError};
use serde_with::{serde_as, DisplayFromStr};
use tracing::warn;

use crate::{
    error::{BuilderError, BuilderResult},
    rational_number::RationalNumber,
    types::Epoch,
};

pub const CONFIG_KEY_PROTOCOL_PARAMS: &str = "protocol-params";

/// Protocol parameters consumed read-only by fee estimation and serialization.
///
/// Every field has a default, so a partial `[protocol-params]` table fills the rest from
/// [`ProtocolParams::default`].
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProtocolParams {
    pub epoch: Epoch,

    /// Fee per byte of transaction
    pub min_fee_a: u64,

    /// Constant fee per transaction
    pub min_fee_b: u64,

    pub max_block_size: u64,
    pub max_tx_size: u64,
    pub max_block_header_size: u64,
    pub key_deposit: u64,
    pub pool_deposit: u64,
    pub decentralisation: u64,
    pub min_pool_cost: u64,

    /// Lovelace per memory unit
    #[serde_as(as = "DisplayFromStr")]
    pub price_mem: RationalNumber,

    /// Lovelace per CPU step
    #[serde_as(as = "DisplayFromStr")]
    pub price_step: RationalNumber,

    pub max_tx_ex_mem: u64,
    pub max_tx_ex_steps: u64,
    pub max_block_ex_mem: u64,
    pub max_block_ex_steps: u64,
    pub max_val_size: u64,

    /// Collateral required as a percentage of the fee
    pub collateral_percent: u64,

    pub max_collateral_inputs: u64,
    pub coins_per_utxo_size: u64,
    pub min_fee_ref_script_cost_per_byte: u64,
}

impl Default for ProtocolParams {
    fn default() -> Self {
        Self {
            epoch: 0,
            min_fee_a: 44,
            min_fee_b: 155_381,
            max_block_size: 98_304,
            max_tx_size: 16_384,
            max_block_header_size: 1_100,
            key_deposit: 2_000_000,
            pool_deposit: 500_000_000,
            decentralisation: 0,
            min_pool_cost: 340_000_000,
            price_mem: RationalNumber::new(577, 10_000),
            price_step: RationalNumber::new(721, 10_000_000),
            max_tx_ex_mem: 16_000_000,
            max_tx_ex_steps: 10_000_000_000,
            max_block_ex_mem: 80_000_000,
            max_block_ex_steps: 40_000_000_000,
            max_val_size: 5_000,
            collateral_percent: 150,
            max_collateral_inputs: 3,
            coins_per_utxo_size: 4_310,
            min_fee_ref_script_cost_per_byte: 15,
        }
    }
}

impl ProtocolParams {
    /// Read the `protocol-params` table, failing if it is absent or malformed
    pub fn try_from_config(config: &Config) -> BuilderResult<Self> {
        config.get::<ProtocolParams>(CONFIG_KEY_PROTOCOL_PARAMS).map_err(|e| match e {
            ConfigError::NotFound(key) => BuilderError::MissingProtocolParameters(key),
            e => BuilderError::invalid_field(
                "ProtocolParams",
                CONFIG_KEY_PROTOCOL_PARAMS,
                e.to_string(),
            ),
        })
    }

    /// Read the `protocol-params` table. Only an absent table falls back to the defaults, with a
    /// warning; a malformed one is an error.
    pub fn from_config(config: &Config) -> BuilderResult<Self> {
        match Self::try_from_config(config) {
            Err(BuilderError::MissingProtocolParameters(key)) => {
                warn!("No {key} table, using default protocol parameters");
                Ok(Self::default())
            }
            result => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn missing_table_falls_back_to_defaults() {
        let config = Config::builder().build().unwrap();
        assert!(matches!(
            ProtocolParams::try_from_config(&config),
            Err(BuilderError::MissingProtocolParameters(_))
        ));
        assert_eq!(ProtocolParams::from_config(&config), Ok(ProtocolParams::default()));
    }

    #[test]
    fn malformed_table_is_an_error() {
        let config = Config::builder()
            .add_source(File::from_str(
                "[protocol-params]\nmin-fee-a = 45\nprice-mem = \"0.0577\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        assert!(matches!(
            ProtocolParams::from_config(&config),
            Err(BuilderError::InvalidField { ref entity, ref field, .. })
                if entity == "ProtocolParams" && field == CONFIG_KEY_PROTOCOL_PARAMS
        ));
    }

    #[test]
    fn partial_table_overrides_named_fields() {
        let config = Config::builder()
            .add_source(File::from_str(
                "[protocol-params]\nmin-fee-a = 45\nmin-fee-b = 200000\nprice-mem = \"1/2\"\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let params = ProtocolParams::from_config(&config).unwrap();
        assert_eq!(params.min_fee_a, 45);
        assert_eq!(params.min_fee_b, 200_000);
        assert_eq!(params.price_mem, RationalNumber::new(1, 2));
        assert_eq!(params.max_tx_size, 16_384);
    }
}

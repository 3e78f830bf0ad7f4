use config::{Config, ConfigError};
use serde::de::DeserializeOwned;

use crate::{
    error::{BuilderError, BuilderResult},
    protocol_params::ProtocolParams,
    types::Network,
    Coin,
};

pub const CONFIG_KEY_SELECTION_THRESHOLD: &str = "selection-threshold";
pub const CONFIG_KEY_COLLATERAL_SAFETY_MARGIN: &str = "collateral-safety-margin";
pub const CONFIG_KEY_MAX_FEE_ROUNDS: &str = "max-fee-rounds";
pub const CONFIG_KEY_NETWORK: &str = "network";

pub const DEFAULT_SELECTION_THRESHOLD: u64 = 5_000_000;
pub const DEFAULT_COLLATERAL_SAFETY_MARGIN: u64 = 10_000;
pub const DEFAULT_MAX_FEE_ROUNDS: usize = 4;

/// Settings for a build, injected explicitly rather than read from globals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    pub protocol_params: ProtocolParams,

    /// Surplus lovelace UTxO selection leaves as headroom for fees
    pub selection_threshold: Coin,

    /// Added to the fee before the collateral percentage is applied
    pub collateral_safety_margin: Coin,

    /// Upper bound on fee re-estimation rounds
    pub max_fee_rounds: usize,

    pub network: Network,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            protocol_params: ProtocolParams::default(),
            selection_threshold: Coin::from(DEFAULT_SELECTION_THRESHOLD),
            collateral_safety_margin: Coin::from(DEFAULT_COLLATERAL_SAFETY_MARGIN),
            max_fee_rounds: DEFAULT_MAX_FEE_ROUNDS,
            network: Network::Mainnet,
        }
    }
}

/// Value at `key`, or `default` when the key is absent. A present but malformed value is an error.
fn get_or<T: DeserializeOwned>(config: &Config, key: &str, default: T) -> BuilderResult<T> {
    match config.get::<T>(key) {
        Ok(value) => Ok(value),
        Err(ConfigError::NotFound(_)) => Ok(default),
        Err(e) => Err(BuilderError::invalid_field("BuilderConfig", key, e.to_string())),
    }
}

impl BuilderConfig {
    pub fn from_config(config: &Config) -> BuilderResult<Self> {
        let network = match get_or::<Option<String>>(config, CONFIG_KEY_NETWORK, None)? {
            Some(name) => name
                .parse()
                .map_err(|e| BuilderError::invalid_field("BuilderConfig", CONFIG_KEY_NETWORK, e))?,
            None => Network::default(),
        };
        Ok(Self {
            protocol_params: ProtocolParams::from_config(config)?,
            selection_threshold: Coin::from(get_or(
                config,
                CONFIG_KEY_SELECTION_THRESHOLD,
                DEFAULT_SELECTION_THRESHOLD,
            )?),
            collateral_safety_margin: Coin::from(get_or(
                config,
                CONFIG_KEY_COLLATERAL_SAFETY_MARGIN,
                DEFAULT_COLLATERAL_SAFETY_MARGIN,
            )?),
            max_fee_rounds: get_or(config, CONFIG_KEY_MAX_FEE_ROUNDS, DEFAULT_MAX_FEE_ROUNDS)?,
            network,
        })
    }
}

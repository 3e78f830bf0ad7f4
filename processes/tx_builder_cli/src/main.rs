use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use cairn_cardano::{
    collateral::fill_min_ada,
    fees::estimate_fee,
    selection::{add_selected_inputs, required_value},
    witness::{sign_transaction, transaction_hash},
};
use cairn_codec::{tx_builder_body_from_obj, tx_builder_body_to_obj, utxos_from_obj};
use cairn_common::{configuration::BuilderConfig, Coin, EntryKind, Network, TxBuilderBody};
use cairn_module_tx_builder::serializer::canonicalize;
use clap::{Parser, Subcommand};
use config::{Config, File};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer as _, Registry, filter, fmt, layer::SubscriberExt as _,
    util::SubscriberInitExt as _,
};

fn default_config_path() -> PathBuf {
    PathBuf::from(option_env!("CAIRN_TX_BUILDER_DEFAULT_CONFIG").unwrap_or("tx-builder.toml"))
}

#[derive(clap::Parser)]
struct Args {
    /// Path to configuration.
    #[arg(long, default_value = default_config_path().into_os_string())]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a body wire object, fill min-ADA and print it in canonical order.
    Canonicalize {
        /// File containing the body wire object.
        body_file: PathBuf,
    },
    /// Add inputs from a UTxO list until the body's outputs are covered.
    Select {
        /// File containing the body wire object.
        body_file: PathBuf,
        /// File containing a JSON array of UTxOs.
        utxos_file: PathBuf,
        /// Lovelace to keep on top of the requirement, overriding the configured threshold.
        #[arg(long)]
        threshold: Option<u64>,
    },
    /// Size and minimum fee of an unsigned transaction once it is witnessed.
    EstimateFee {
        /// File containing the transaction hex.
        tx_file: PathBuf,
        /// Body wire object supplying redeemers, reference scripts and signers.
        #[arg(long)]
        body: Option<PathBuf>,
        /// Number of key witnesses to assume.
        #[arg(long)]
        signers: Option<usize>,
        /// Byron address expected to add a bootstrap witness.
        #[arg(long)]
        bootstrap: Vec<String>,
    },
    /// Add a key witness per signing key.
    Sign {
        /// File containing the transaction hex.
        tx_file: PathBuf,
        /// Hex Ed25519 secret key.
        #[arg(long = "key", required = true)]
        keys: Vec<String>,
    },
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let text = read_text(path)?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// A wire body without a `network` key targets the configured network
fn body_from_wire(wire: &Value, network: &Network) -> Result<TxBuilderBody> {
    let mut body = tx_builder_body_from_obj(wire)?;
    if wire.get("network").is_none_or(Value::is_null) {
        body.network = network.clone();
    }
    Ok(body)
}

fn read_body(path: &Path, network: &Network) -> Result<TxBuilderBody> {
    body_from_wire(&read_json(path)?, network)
}

fn read_tx(path: &Path) -> Result<Vec<u8>> {
    let text = read_text(path)?;
    hex::decode(text.trim()).with_context(|| format!("{} is not hex", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn check_entries(body: &TxBuilderBody) -> Result<()> {
    for input in &body.inputs {
        input.check_complete(EntryKind::Input)?;
    }
    for output in &body.outputs {
        output.check_value()?;
    }
    for mint in &body.mints {
        mint.check_complete()?;
    }
    for certificate in &body.certificates {
        certificate.check_complete()?;
    }
    for withdrawal in &body.withdrawals {
        withdrawal.check_complete()?;
    }
    for vote in &body.votes {
        vote.check_complete()?;
    }
    Ok(())
}

fn run(command: Command, config: &BuilderConfig) -> Result<()> {
    let params = &config.protocol_params;
    let network = &config.network;
    match command {
        Command::Canonicalize { body_file } => {
            let mut body = read_body(&body_file, network)?;
            check_entries(&body)?;
            for output in &mut body.outputs {
                fill_min_ada(output, params)?;
            }
            canonicalize(&mut body);
            print_json(&tx_builder_body_to_obj(&body)?)
        }
        Command::Select {
            body_file,
            utxos_file,
            threshold,
        } => {
            let mut body = read_body(&body_file, network)?;
            let pool = utxos_from_obj(&read_json(&utxos_file)?)?;
            let threshold = threshold.map(Coin::from).unwrap_or(config.selection_threshold.clone());
            let added = add_selected_inputs(&mut body, &pool, &threshold)?;
            info!("Selected {added} of {} UTxOs", pool.len());
            let surplus = -required_value(&body)?.lovelace;
            info!("Lovelace surplus after selection: {surplus}");
            print_json(&tx_builder_body_to_obj(&body)?)
        }
        Command::EstimateFee {
            tx_file,
            body,
            signers,
            bootstrap,
        } => {
            let tx = read_tx(&tx_file)?;
            let mut body = match body {
                Some(path) => read_body(&path, network)?,
                None => TxBuilderBody::new(),
            };
            if signers.is_some() {
                body.expected_key_witnesses = signers;
            }
            body.bootstrap_witnesses.extend(bootstrap);
            let estimate = estimate_fee(&tx, &body, params)?;
            print_json(&json!({
                "size": estimate.size,
                "fee": estimate.fee.to_string(),
            }))
        }
        Command::Sign { tx_file, keys } => {
            let tx = read_tx(&tx_file)?;
            let signed = sign_transaction(&tx, &keys)?;
            print_json(&json!({
                "txHash": transaction_hash(&signed)?.to_string(),
                "signedTx": hex::encode(signed),
            }))
        }
    }
}

pub fn main() -> Result<()> {
    let args = Args::try_parse()?;

    // Standard logging using RUST_LOG for log levels default to INFO for events only
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_default_env().add_directive(filter::LevelFilter::INFO.into()))
        .with_filter(filter::filter_fn(|meta| meta.is_event()));
    Registry::default().with(fmt_layer).init();

    let config = Config::builder()
        .add_source(File::from(args.config.as_path()).required(false))
        .build()?;
    let config = BuilderConfig::from_config(&config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    info!("Using network {:?}", config.network);

    run(args.command, &config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_without_network() -> Value {
        let mut wire = tx_builder_body_to_obj(&TxBuilderBody::new()).unwrap();
        wire.as_object_mut().unwrap().remove("network");
        wire
    }

    #[test]
    fn configured_network_fills_an_unset_body() {
        let body = body_from_wire(&wire_without_network(), &Network::Preprod).unwrap();
        assert_eq!(body.network, Network::Preprod);
    }

    #[test]
    fn body_network_wins_over_configuration() {
        let mut wire = wire_without_network();
        wire["network"] = json!("preview");
        let body = body_from_wire(&wire, &Network::Preprod).unwrap();
        assert_eq!(body.network, Network::Preview);
    }
}
